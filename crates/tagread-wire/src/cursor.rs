use std::io::{ErrorKind, Read};
use std::ops::{Deref, DerefMut};

use crate::error::WireError;

/// Scratch size used when discarding bytes (padding, unwanted regions).
const SKIP_CHUNK: usize = 512;

/// A restriction layered over the byte source.
///
/// Views form a stack. Reads are served by the topmost `Region` if there
/// is one, otherwise by the source itself; every `Limit` above the
/// serving layer is charged for the bytes read.
///
/// ```text
///   ┌──────────────────────────┐  top
///   │ Limit { remaining: 4 }   │  ← charged
///   │ Region { bytes, pos }    │  ← serves the read
///   │ Limit { remaining: 20 }  │  ← untouched (paid when the region was taken)
///   └──────────────────────────┘  bottom → source
/// ```
#[derive(Debug)]
enum View {
    Limit { declared: u64, remaining: u64 },
    Region { bytes: Vec<u8>, pos: usize },
}

impl View {
    fn remaining(&self) -> u64 {
        match self {
            Self::Limit { remaining, .. } => *remaining,
            Self::Region { bytes, pos } => (bytes.len() - pos) as u64,
        }
    }

    fn declared(&self) -> u64 {
        match self {
            Self::Limit { declared, .. } => *declared,
            Self::Region { bytes, .. } => bytes.len() as u64,
        }
    }
}

/// Position in the view stack returned when a view is pushed.
///
/// Handing it back to [`ByteCursor::release`] or [`ByteCursor::abandon`]
/// pops that view and anything pushed after it.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[must_use]
pub struct ViewMark(usize);

/// Sequential, forward-only reader over any [`Read`] source.
///
/// Tracks the cumulative number of bytes consumed (the offset) and
/// supports nested bounded views and in-memory regions. The cursor never
/// seeks; it only needs "read exactly n bytes" and "read until
/// exhausted" from its source.
///
/// # Example
///
/// ```rust
/// use tagread_wire::ByteCursor;
///
/// let data = [0x0A, 0x00, 0x01, 0x00, b'a', b'b'];
/// let mut cursor = ByteCursor::new(&data[..]);
///
/// assert_eq!(cursor.read_exact(2)?, vec![0x0A, 0x00]);
/// {
///     let mut view = cursor.bounded(2);
///     view.read_exact(2)?;
///     view.finish()?;
/// }
/// assert_eq!(cursor.read_to_end()?, b"ab");
/// assert_eq!(cursor.offset(), 6);
/// # Ok::<(), tagread_wire::WireError>(())
/// ```
pub struct ByteCursor<'s> {
    source: Box<dyn Read + 's>,
    offset: u64,
    views: Vec<View>,
}

impl<'s> ByteCursor<'s> {
    pub fn new(source: impl Read + 's) -> Self {
        Self {
            source: Box::new(source),
            offset: 0,
            views: Vec::new(),
        }
    }

    /// Cumulative bytes consumed since the cursor was created.
    pub fn offset(&self) -> u64 {
        self.offset
    }

    /// Bytes left in the innermost view, or `None` when reading straight
    /// from the unbounded source.
    pub fn remaining(&self) -> Option<u64> {
        let mut least: Option<u64> = None;
        for view in self.views.iter().rev() {
            let r = view.remaining();
            least = Some(least.map_or(r, |l| l.min(r)));
            if matches!(view, View::Region { .. }) {
                break;
            }
        }
        least
    }

    /// Number of views currently stacked over the source.
    pub fn view_depth(&self) -> usize {
        self.views.len()
    }

    /// Read exactly `n` bytes, advancing the offset by `n`.
    ///
    /// # Errors
    ///
    /// - [`WireError::Truncated`] if the source or the active view has
    ///   fewer than `n` bytes left.
    /// - [`WireError::Io`] for any other source failure.
    pub fn read_exact(&mut self, n: usize) -> Result<Vec<u8>, WireError> {
        let mut buf = vec![0u8; n];
        self.fill(&mut buf)?;
        self.offset += n as u64;
        Ok(buf)
    }

    /// Read exactly `buf.len()` bytes into `buf`, advancing the offset.
    ///
    /// # Errors
    ///
    /// Same as [`read_exact`](Self::read_exact).
    pub fn read_into(&mut self, buf: &mut [u8]) -> Result<(), WireError> {
        self.fill(buf)?;
        self.offset += buf.len() as u64;
        Ok(())
    }

    /// Read every remaining byte of the active view (or the source),
    /// advancing the offset by however many were read. May return an
    /// empty vector.
    ///
    /// # Errors
    ///
    /// Returns [`WireError::Io`] if the source fails.
    pub fn read_to_end(&mut self) -> Result<Vec<u8>, WireError> {
        self.read_to_end_within(u64::MAX)
    }

    /// [`read_to_end`](Self::read_to_end) that refuses to buffer more than
    /// `limit` bytes.
    ///
    /// # Errors
    ///
    /// - [`WireError::Overlong`] if more than `limit` bytes remain. Bytes
    ///   pulled from the source before the limit was hit are lost.
    /// - [`WireError::Io`] if the source fails.
    pub fn read_to_end_within(&mut self, limit: u64) -> Result<Vec<u8>, WireError> {
        let bytes = self.take_to_end(limit)?;
        self.offset += bytes.len() as u64;
        Ok(bytes)
    }

    /// Discard `n` bytes without allocating proportionally to `n`.
    ///
    /// # Errors
    ///
    /// Same as [`read_exact`](Self::read_exact).
    pub fn skip(&mut self, n: u64) -> Result<(), WireError> {
        let mut scratch = [0u8; SKIP_CHUNK];
        let mut left = n;
        while left > 0 {
            #[allow(clippy::cast_possible_truncation)]
            let step = left.min(SKIP_CHUNK as u64) as usize;
            self.read_into(&mut scratch[..step])?;
            left -= step as u64;
        }
        Ok(())
    }

    /// Restrict reads to at most `n` further bytes until the returned
    /// guard is finished or dropped.
    pub fn bounded(&mut self, n: u64) -> Bounded<'_, 's> {
        let mark = self.push_limit(n);
        Bounded {
            cursor: self,
            mark,
            released: false,
        }
    }

    /// Push a byte limit. Prefer [`bounded`](Self::bounded) unless the
    /// caller needs to hold the cursor through another owner.
    pub fn push_limit(&mut self, n: u64) -> ViewMark {
        let mark = ViewMark(self.views.len());
        self.views.push(View::Limit {
            declared: n,
            remaining: n,
        });
        mark
    }

    /// Take the next `n` bytes (or everything left when `n` is `None`)
    /// and make them the active view. The offset only advances as the
    /// region is read back.
    ///
    /// # Errors
    ///
    /// [`WireError::Truncated`] if fewer than `n` bytes are available.
    pub fn push_region(&mut self, n: Option<usize>) -> Result<ViewMark, WireError> {
        let bytes = match n {
            Some(n) => {
                let mut buf = vec![0u8; n];
                self.fill(&mut buf)?;
                buf
            }
            None => self.take_to_end(u64::MAX)?,
        };
        Ok(self.push_region_bytes(bytes))
    }

    /// Region over everything left, as long as that is at most `limit`
    /// bytes.
    ///
    /// # Errors
    ///
    /// Same as [`read_to_end_within`](Self::read_to_end_within).
    pub fn push_region_within(&mut self, limit: u64) -> Result<ViewMark, WireError> {
        let bytes = self.take_to_end(limit)?;
        Ok(self.push_region_bytes(bytes))
    }

    fn push_region_bytes(&mut self, bytes: Vec<u8>) -> ViewMark {
        let mark = ViewMark(self.views.len());
        self.views.push(View::Region { bytes, pos: 0 });
        mark
    }

    /// Region version of [`bounded`](Self::bounded).
    ///
    /// # Errors
    ///
    /// Same as [`push_region`](Self::push_region).
    pub fn region(&mut self, n: Option<usize>) -> Result<Region<'_, 's>, WireError> {
        let mark = self.push_region(n)?;
        Ok(Region { cursor: self, mark })
    }

    /// Pop the view at `mark` (and anything above it), verifying it was
    /// consumed exactly.
    ///
    /// # Errors
    ///
    /// [`WireError::Unconsumed`] if bytes were left over. The view is
    /// popped either way.
    pub fn release(&mut self, mark: ViewMark) -> Result<(), WireError> {
        let outcome = match self.views.get(mark.0) {
            Some(view) if view.remaining() != 0 => Err(WireError::Unconsumed {
                offset: self.offset,
                declared: view.declared(),
                consumed: view.declared() - view.remaining(),
            }),
            _ => Ok(()),
        };
        self.abandon(mark);
        outcome
    }

    /// Pop the view at `mark` (and anything above it) without checks.
    pub fn abandon(&mut self, mark: ViewMark) {
        self.views.truncate(mark.0);
    }

    /// Fill `buf` from the serving layer and charge the limits above it.
    /// Does not touch the offset.
    fn fill(&mut self, buf: &mut [u8]) -> Result<(), WireError> {
        let n = buf.len();
        if let Some(available) = self.remaining()
            && (n as u64) > available
        {
            return Err(WireError::Truncated {
                offset: self.offset,
                expected: n,
                available: usize::try_from(available).unwrap_or(usize::MAX),
            });
        }

        let serving = self
            .views
            .iter()
            .rposition(|v| matches!(v, View::Region { .. }));

        match serving {
            Some(index) => {
                if let View::Region { bytes, pos } = &mut self.views[index] {
                    buf.copy_from_slice(&bytes[*pos..*pos + n]);
                    *pos += n;
                }
            }
            None => self.fill_from_source(buf)?,
        }

        let first_charged = serving.map_or(0, |i| i + 1);
        for view in &mut self.views[first_charged..] {
            if let View::Limit { remaining, .. } = view {
                *remaining -= n as u64;
            }
        }
        Ok(())
    }

    fn fill_from_source(&mut self, buf: &mut [u8]) -> Result<(), WireError> {
        let mut got = 0;
        while got < buf.len() {
            match self.source.read(&mut buf[got..]) {
                Ok(0) => {
                    return Err(WireError::Truncated {
                        offset: self.offset,
                        expected: buf.len(),
                        available: got,
                    });
                }
                Ok(k) => got += k,
                Err(e) if e.kind() == ErrorKind::Interrupted => {}
                Err(source) => {
                    return Err(WireError::Io {
                        offset: self.offset,
                        source,
                    });
                }
            }
        }
        Ok(())
    }

    /// Everything left in the active view, uncounted. At most `limit`
    /// bytes are accepted.
    fn take_to_end(&mut self, limit: u64) -> Result<Vec<u8>, WireError> {
        let overlong = |offset| WireError::Overlong { offset, limit };
        if let Some(left) = self.remaining() {
            if left > limit {
                return Err(overlong(self.offset));
            }
            #[allow(clippy::cast_possible_truncation)]
            let mut buf = vec![0u8; left as usize];
            self.fill(&mut buf)?;
            return Ok(buf);
        }
        let mut buf = Vec::new();
        (&mut self.source)
            .take(limit.saturating_add(1))
            .read_to_end(&mut buf)
            .map_err(|source| WireError::Io {
                offset: self.offset,
                source,
            })?;
        if buf.len() as u64 > limit {
            return Err(overlong(self.offset));
        }
        Ok(buf)
    }
}

impl std::fmt::Debug for ByteCursor<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ByteCursor")
            .field("offset", &self.offset)
            .field("views", &self.views.len())
            .field("remaining", &self.remaining())
            .finish_non_exhaustive()
    }
}

/// Scope guard for a bounded view. Dropping it without
/// [`finish`](Self::finish) restores the parent view without checking
/// consumption (the error path).
pub struct Bounded<'c, 's> {
    cursor: &'c mut ByteCursor<'s>,
    mark: ViewMark,
    released: bool,
}

impl Bounded<'_, '_> {
    /// Release the view, requiring it to have been consumed exactly.
    ///
    /// # Errors
    ///
    /// [`WireError::Unconsumed`] if bytes were left over.
    pub fn finish(mut self) -> Result<(), WireError> {
        self.released = true;
        self.cursor.release(self.mark)
    }
}

impl<'s> Deref for Bounded<'_, 's> {
    type Target = ByteCursor<'s>;

    fn deref(&self) -> &Self::Target {
        self.cursor
    }
}

impl DerefMut for Bounded<'_, '_> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        self.cursor
    }
}

impl Drop for Bounded<'_, '_> {
    fn drop(&mut self) {
        if !self.released {
            self.cursor.abandon(self.mark);
        }
    }
}

/// Scope guard for an in-memory region. Dropping it restores the parent
/// view.
pub struct Region<'c, 's> {
    cursor: &'c mut ByteCursor<'s>,
    mark: ViewMark,
}

impl<'s> Deref for Region<'_, 's> {
    type Target = ByteCursor<'s>;

    fn deref(&self) -> &Self::Target {
        self.cursor
    }
}

impl DerefMut for Region<'_, '_> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        self.cursor
    }
}

impl Drop for Region<'_, '_> {
    fn drop(&mut self) {
        self.cursor.abandon(self.mark);
    }
}
