//! Typed field accessors behind the schema's object-safe slot traits.
//!
//! Each registration on the builder produces one of these. They are the
//! only code that knows the concrete type of a field; the walker sees the
//! traits.

use std::any::Any;

use tagread_wire::{ByteOrder, Primitive, Scalar, primitive::read_slice};

use crate::context::DecodeContext;
use crate::error::DecodeError;
use crate::fixed;
use crate::schema::{Record, Site};
use crate::walker;

/// A field with a compile-time width.
pub(crate) trait FixedSlot<T>: Send + Sync {
    fn type_name(&self) -> &'static str;
    fn size(&self) -> usize;
    fn read(&self, rec: &mut T, bytes: &[u8], order: ByteOrder);
    fn scalar(&self, rec: &mut T) -> Option<Scalar>;
}

/// A `Vec` field.
pub(crate) trait SequenceSlot<T>: Send + Sync {
    fn type_name(&self) -> &'static str;
    /// Encoded element width when every element has the same one.
    fn element_size(&self) -> Option<usize>;
    fn is_raw_bytes(&self) -> bool;
    /// Replace the sequence with a fresh empty one.
    fn reset(&self, rec: &mut T, capacity: usize);
    fn assign_bytes(&self, rec: &mut T, bytes: Vec<u8>);
    /// Decode `bytes` as consecutive fixed-width elements.
    fn fill_fixed(
        &self,
        rec: &mut T,
        bytes: &[u8],
        ctx: &DecodeContext<'_, '_>,
    ) -> Result<(), DecodeError>;
    fn push_default(&self, rec: &mut T);
    /// Decode one element from the cursor and append it.
    fn push_decoded(
        &self,
        rec: &mut T,
        ctx: &mut DecodeContext<'_, '_>,
        site: Site,
    ) -> Result<(), DecodeError>;
}

/// A nested record field.
pub(crate) trait RecordSlot<T>: Send + Sync {
    fn type_name(&self) -> &'static str;
    fn static_size(&self) -> Option<usize>;
    /// Fixed-layout read of the whole nested record, then `verify` on it
    /// and everything nested inside it.
    fn read_fixed(
        &self,
        rec: &mut T,
        bytes: &[u8],
        ctx: &DecodeContext<'_, '_>,
    ) -> Result<(), DecodeError>;
    /// Distribute bytes only. Used when the enclosing record is itself
    /// read through the fixed-layout path.
    fn distribute(&self, rec: &mut T, bytes: &[u8], order: ByteOrder);
    /// `verify` on the already distributed nested record, innermost first.
    fn verify_fixed(&self, rec: &mut T, ctx: &DecodeContext<'_, '_>) -> Result<(), DecodeError>;
    fn walk(&self, rec: &mut T, ctx: &mut DecodeContext<'_, '_>) -> Result<(), DecodeError>;
}

// ── Fixed ───────────────────────────────────────────────────────────────

pub(crate) struct PrimitiveSlot<T, P> {
    pub(crate) access: fn(&mut T) -> &mut P,
}

impl<T: 'static, P: Primitive> FixedSlot<T> for PrimitiveSlot<T, P> {
    fn type_name(&self) -> &'static str {
        P::NAME
    }

    fn size(&self) -> usize {
        P::WIDTH
    }

    fn read(&self, rec: &mut T, bytes: &[u8], order: ByteOrder) {
        *(self.access)(rec) = P::from_bytes(bytes, order);
    }

    fn scalar(&self, rec: &mut T) -> Option<Scalar> {
        Some((self.access)(rec).to_scalar())
    }
}

pub(crate) struct ArraySlot<T, P, const N: usize> {
    pub(crate) access: fn(&mut T) -> &mut [P; N],
}

impl<T: 'static, P: Primitive, const N: usize> FixedSlot<T> for ArraySlot<T, P, N> {
    fn type_name(&self) -> &'static str {
        std::any::type_name::<[P; N]>()
    }

    fn size(&self) -> usize {
        N * P::WIDTH
    }

    fn read(&self, rec: &mut T, bytes: &[u8], order: ByteOrder) {
        read_slice(bytes, order, (self.access)(rec));
    }

    fn scalar(&self, _rec: &mut T) -> Option<Scalar> {
        None
    }
}

// ── Sequences ───────────────────────────────────────────────────────────

pub(crate) struct PrimitiveSeqSlot<T, P> {
    pub(crate) access: fn(&mut T) -> &mut Vec<P>,
}

impl<T: 'static, P: Primitive> SequenceSlot<T> for PrimitiveSeqSlot<T, P> {
    fn type_name(&self) -> &'static str {
        std::any::type_name::<Vec<P>>()
    }

    fn element_size(&self) -> Option<usize> {
        Some(P::WIDTH)
    }

    fn is_raw_bytes(&self) -> bool {
        P::RAW_BYTE
    }

    fn reset(&self, rec: &mut T, capacity: usize) {
        *(self.access)(rec) = Vec::with_capacity(capacity);
    }

    fn assign_bytes(&self, rec: &mut T, bytes: Vec<u8>) {
        let target: &mut dyn Any = (self.access)(rec);
        if let Some(vec) = target.downcast_mut::<Vec<u8>>() {
            *vec = bytes;
        }
    }

    fn fill_fixed(
        &self,
        rec: &mut T,
        bytes: &[u8],
        ctx: &DecodeContext<'_, '_>,
    ) -> Result<(), DecodeError> {
        let mut values = vec![P::default(); bytes.len() / P::WIDTH];
        read_slice(bytes, ctx.byte_order(), &mut values);
        *(self.access)(rec) = values;
        Ok(())
    }

    fn push_default(&self, rec: &mut T) {
        (self.access)(rec).push(P::default());
    }

    fn push_decoded(
        &self,
        rec: &mut T,
        ctx: &mut DecodeContext<'_, '_>,
        site: Site,
    ) -> Result<(), DecodeError> {
        let bytes = fixed::read_bytes(ctx, site, P::NAME, P::WIDTH)?;
        (self.access)(rec).push(P::from_bytes(&bytes, ctx.byte_order()));
        Ok(())
    }
}

pub(crate) struct RecordSeqSlot<T, R> {
    pub(crate) access: fn(&mut T) -> &mut Vec<R>,
}

impl<T: 'static, R: Record> SequenceSlot<T> for RecordSeqSlot<T, R> {
    fn type_name(&self) -> &'static str {
        std::any::type_name::<Vec<R>>()
    }

    fn element_size(&self) -> Option<usize> {
        R::schema().static_size().filter(|&size| size > 0)
    }

    fn is_raw_bytes(&self) -> bool {
        false
    }

    fn reset(&self, rec: &mut T, capacity: usize) {
        *(self.access)(rec) = Vec::with_capacity(capacity);
    }

    fn assign_bytes(&self, _rec: &mut T, _bytes: Vec<u8>) {}

    fn fill_fixed(
        &self,
        rec: &mut T,
        bytes: &[u8],
        ctx: &DecodeContext<'_, '_>,
    ) -> Result<(), DecodeError> {
        let schema = R::schema();
        let Some(width) = schema.static_size().filter(|&size| size > 0) else {
            return Ok(());
        };
        let mut values = Vec::with_capacity(bytes.len() / width);
        for chunk in bytes.chunks_exact(width) {
            let mut element = R::default();
            schema.distribute(&mut element, chunk, ctx.byte_order());
            schema.verify_nested(&mut element, ctx)?;
            walker::verify(&element, ctx)?;
            values.push(element);
        }
        *(self.access)(rec) = values;
        Ok(())
    }

    fn push_default(&self, rec: &mut T) {
        (self.access)(rec).push(R::default());
    }

    fn push_decoded(
        &self,
        rec: &mut T,
        ctx: &mut DecodeContext<'_, '_>,
        _site: Site,
    ) -> Result<(), DecodeError> {
        let mut element = R::default();
        walker::walk(&mut element, ctx)?;
        (self.access)(rec).push(element);
        Ok(())
    }
}

// ── Nested records ──────────────────────────────────────────────────────

pub(crate) struct NestedSlot<T, R> {
    pub(crate) access: fn(&mut T) -> &mut R,
}

impl<T: 'static, R: Record> RecordSlot<T> for NestedSlot<T, R> {
    fn type_name(&self) -> &'static str {
        std::any::type_name::<R>()
    }

    fn static_size(&self) -> Option<usize> {
        R::schema().static_size()
    }

    fn read_fixed(
        &self,
        rec: &mut T,
        bytes: &[u8],
        ctx: &DecodeContext<'_, '_>,
    ) -> Result<(), DecodeError> {
        R::schema().distribute((self.access)(rec), bytes, ctx.byte_order());
        self.verify_fixed(rec, ctx)
    }

    fn distribute(&self, rec: &mut T, bytes: &[u8], order: ByteOrder) {
        R::schema().distribute((self.access)(rec), bytes, order);
    }

    fn verify_fixed(&self, rec: &mut T, ctx: &DecodeContext<'_, '_>) -> Result<(), DecodeError> {
        let target = (self.access)(rec);
        R::schema().verify_nested(target, ctx)?;
        walker::verify(target, ctx)
    }

    fn walk(&self, rec: &mut T, ctx: &mut DecodeContext<'_, '_>) -> Result<(), DecodeError> {
        walker::walk((self.access)(rec), ctx)
    }
}
