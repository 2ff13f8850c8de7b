//! Fixed-layout codec: one read for a value whose encoded size is known
//! from its type alone, distributed across fields in declaration order.
//!
//! ```text
//!   Header { magic: [u8; 4], version: u16, flags: u16 }   static size 8
//!
//!   read_exact(8) ─► │ 4 magic │ 2 version │ 2 flags │
//!                      ▼          ▼            ▼
//!                    magic      version      flags      (byte order applied)
//! ```

use tagread_wire::{ByteCursor, ByteOrder};

use crate::context::DecodeContext;
use crate::error::DecodeError;
use crate::schema::{Record, Schema, Site, Slot};

impl<T: Record> Schema<T> {
    /// Split `bytes` across the fields. `bytes.len()` must equal
    /// [`static_size`](Self::static_size).
    pub(crate) fn distribute(&self, rec: &mut T, bytes: &[u8], order: ByteOrder) {
        let mut at = 0;
        for field in self.fields() {
            match field.slot() {
                Slot::Primitive(slot) | Slot::FixedArray(slot) => {
                    let end = at + slot.size();
                    slot.read(rec, &bytes[at..end], order);
                    at = end;
                }
                Slot::Record(slot) => {
                    let end = at + slot.static_size().unwrap_or(0);
                    slot.distribute(rec, &bytes[at..end], order);
                    at = end;
                }
                Slot::Sequence(_) | Slot::Ignored | Slot::Unsupported(_) => {}
            }
        }
    }

    /// Run [`Record::verify`] on every nested record of a value filled by
    /// [`distribute`](Self::distribute), innermost first. `rec`'s own check
    /// is left to the caller.
    pub(crate) fn verify_nested(
        &self,
        rec: &mut T,
        ctx: &DecodeContext<'_, '_>,
    ) -> Result<(), DecodeError> {
        for field in self.fields() {
            if let Slot::Record(slot) = field.slot() {
                slot.verify_fixed(rec, ctx)?;
            }
        }
        Ok(())
    }
}

/// Read `rec` in one pass when its schema is entirely fixed-size.
///
/// Returns `Ok(false)`, consuming nothing, when the record contains a
/// sequence, an annotated field or anything else without a static size;
/// the caller then has to walk it field by field. Whole-record
/// verification is not run here.
///
/// # Errors
///
/// [`DecodeError::Read`] if the cursor cannot supply the record's size
/// or the source fails.
pub fn read_fixed<T: Record>(
    rec: &mut T,
    cursor: &mut ByteCursor<'_>,
    order: ByteOrder,
) -> Result<bool, DecodeError> {
    let schema = T::schema();
    let Some(size) = schema.static_size() else {
        return Ok(false);
    };
    let bytes = cursor.read_exact(size).map_err(|source| {
        DecodeError::read(schema.name(), "*", std::any::type_name::<T>(), size, source)
    })?;
    schema.distribute(rec, &bytes, order);
    Ok(true)
}

/// Exact read for one fixed-size field, with its context attached to any
/// failure.
pub(crate) fn read_bytes(
    ctx: &mut DecodeContext<'_, '_>,
    site: Site,
    type_name: &'static str,
    size: usize,
) -> Result<Vec<u8>, DecodeError> {
    ctx.cursor()
        .read_exact(size)
        .map_err(|source| DecodeError::read(site.record, site.field, type_name, size, source))
}
