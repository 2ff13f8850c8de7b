use std::collections::HashMap;
use std::ops::{Deref, DerefMut};

use tagread_wire::{ByteCursor, ByteOrder, Scalar, ViewMark, WireError};

use crate::error::DecodeError;
use crate::options::{DecodeMode, DecodeOptions};

/// State of one top-level decode call.
///
/// Owns the cursor for the duration of the call and is handed, read-only,
/// to every resolver, condition and hook so they can see where the decode
/// is and what the outermost record looked like so far.
///
/// ```text
///   decode(Outer)                      depth 1, root = "Outer"
///   ├── version: u16     ─ publish ─►  outer["version"]
///   └── body: Inner                    depth 2
///       └── data (size = "len()")      resolver reads ctx.outer("version")
/// ```
///
/// Values of primitive fields of the outermost record are published as
/// soon as each one is decoded. Nested records read them with
/// [`outer`](Self::outer); the outer record itself is still being filled
/// and is not otherwise reachable.
pub struct DecodeContext<'c, 's> {
    cursor: &'c mut ByteCursor<'s>,
    options: DecodeOptions,
    depth: usize,
    root: Option<&'static str>,
    outer: HashMap<&'static str, Scalar>,
}

impl<'c, 's> DecodeContext<'c, 's> {
    pub(crate) fn new(cursor: &'c mut ByteCursor<'s>, options: DecodeOptions) -> Self {
        Self {
            cursor,
            options,
            depth: 0,
            root: None,
            outer: HashMap::new(),
        }
    }

    /// Bytes consumed from the cursor so far, counting from its creation.
    pub fn offset(&self) -> u64 {
        self.cursor.offset()
    }

    /// Bytes left in the innermost bounded view, `None` when unbounded.
    pub fn remaining(&self) -> Option<u64> {
        self.cursor.remaining()
    }

    /// Nesting level of the record being decoded; the outermost is 1.
    pub fn depth(&self) -> usize {
        self.depth
    }

    pub fn byte_order(&self) -> ByteOrder {
        self.options.byte_order
    }

    pub fn mode(&self) -> DecodeMode {
        self.options.mode
    }

    pub fn options(&self) -> &DecodeOptions {
        &self.options
    }

    /// Type name of the outermost record.
    pub fn root(&self) -> Option<&'static str> {
        self.root
    }

    /// Value of a primitive field of the outermost record, once decoded.
    pub fn outer(&self, field: &str) -> Option<Scalar> {
        self.outer.get(field).copied()
    }

    pub(crate) fn cursor(&mut self) -> &mut ByteCursor<'s> {
        self.cursor
    }

    /// Step into a record. The first record entered becomes the root.
    pub(crate) fn enter(&mut self, record: &'static str) -> Result<(), DecodeError> {
        if self.depth >= self.options.max_depth {
            return Err(DecodeError::DepthExceeded {
                record,
                limit: self.options.max_depth,
            });
        }
        self.depth += 1;
        self.root.get_or_insert(record);
        Ok(())
    }

    pub(crate) fn leave(&mut self) {
        self.depth = self.depth.saturating_sub(1);
    }

    /// Record a root-level field value. Ignored below the root.
    pub(crate) fn publish(&mut self, field: &'static str, value: Scalar) {
        if self.depth == 1 {
            self.outer.insert(field, value);
        }
    }

    /// Limit reads to `n` bytes until the scope is finished or dropped.
    pub(crate) fn bounded(&mut self, n: u64) -> Scope<'_, 'c, 's> {
        let mark = self.cursor.push_limit(n);
        Scope {
            ctx: self,
            mark: Some(mark),
        }
    }

    /// Read `n` bytes (all remaining for `None`, up to `max_region`) ahead
    /// into a region and serve reads from it until the scope ends.
    pub(crate) fn region(&mut self, n: Option<usize>) -> Result<Scope<'_, 'c, 's>, WireError> {
        let mark = match n {
            Some(n) => self.cursor.push_region(Some(n))?,
            None => self.cursor.push_region_within(self.options.max_region)?,
        };
        Ok(Scope {
            ctx: self,
            mark: Some(mark),
        })
    }
}

impl std::fmt::Debug for DecodeContext<'_, '_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DecodeContext")
            .field("offset", &self.offset())
            .field("depth", &self.depth)
            .field("root", &self.root)
            .field("byte_order", &self.options.byte_order)
            .finish_non_exhaustive()
    }
}

/// A bounded view or region pushed on the context's cursor. The parent
/// view is restored when the scope is dropped, on every path.
pub(crate) struct Scope<'a, 'c, 's> {
    ctx: &'a mut DecodeContext<'c, 's>,
    mark: Option<ViewMark>,
}

impl Scope<'_, '_, '_> {
    /// Pop the view, requiring it to have been consumed exactly.
    pub(crate) fn finish(mut self) -> Result<(), WireError> {
        match self.mark.take() {
            Some(mark) => self.ctx.cursor.release(mark),
            None => Ok(()),
        }
    }
}

impl<'c, 's> Deref for Scope<'_, 'c, 's> {
    type Target = DecodeContext<'c, 's>;

    fn deref(&self) -> &Self::Target {
        self.ctx
    }
}

impl DerefMut for Scope<'_, '_, '_> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        self.ctx
    }
}

impl Drop for Scope<'_, '_, '_> {
    fn drop(&mut self) {
        if let Some(mark) = self.mark.take() {
            self.ctx.cursor.abandon(mark);
        }
    }
}
