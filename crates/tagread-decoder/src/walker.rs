//! The struct walker: interprets a record's schema field by field against
//! the cursor.
//!
//! Per field, left to right, no backtracking:
//!
//! ```text
//!   unsupported? ──► SchemaError
//!   condition    ──► false: skip, nothing consumed
//!   visibility   ──► private: skip (lenient) / SchemaError (strict)
//!   annotations  ──► inconsistent: SchemaError, nothing consumed
//!   dispatch     ──► fixed read │ nested walk │ sequence
//!   padding      ──► skip up to the next multiple of pad_to
//!   after-hook   ──► Err: Verification
//!   publish      ──► root-level scalar becomes ctx.outer(name)
//! ```
//!
//! After the last field the record's own [`Record::verify`] runs.

use crate::annotation::{Annotation, CountSource, SizeSource};
use crate::context::DecodeContext;
use crate::error::{DecodeError, SchemaError};
use crate::fixed;
use crate::resolve;
use crate::schema::{Field, FieldKind, Record, Schema, Site, Slot, Visibility};
use crate::slot::{RecordSlot, SequenceSlot};

/// Decode every field of `rec`, then verify it.
pub(crate) fn walk<T: Record>(
    rec: &mut T,
    ctx: &mut DecodeContext<'_, '_>,
) -> Result<(), DecodeError> {
    let schema = T::schema();
    ctx.enter(schema.name())?;
    for field in schema.fields() {
        walk_field(schema, field, rec, ctx)?;
    }
    verify(rec, ctx)?;
    ctx.leave();
    Ok(())
}

/// Run the whole-record check.
pub(crate) fn verify<T: Record>(rec: &T, ctx: &DecodeContext<'_, '_>) -> Result<(), DecodeError> {
    rec.verify(ctx).map_err(|source| DecodeError::Verification {
        record: T::schema().name(),
        hook: "verify",
        source,
    })
}

fn walk_field<T: Record>(
    schema: &Schema<T>,
    field: &Field<T>,
    rec: &mut T,
    ctx: &mut DecodeContext<'_, '_>,
) -> Result<(), DecodeError> {
    let site = Site {
        record: schema.name(),
        field: field.name(),
    };
    let annotations = field.annotations();

    if let Slot::Unsupported(kind) = field.slot() {
        return Err(SchemaError::UnsupportedField {
            record: site.record,
            field: site.field,
            kind: *kind,
        }
        .into());
    }

    if let Some(cond) = annotations.condition
        && !resolve::condition(schema, site, cond, rec, ctx)?
    {
        tracing::trace!(record = site.record, field = site.field, "condition false, skipped");
        return Ok(());
    }

    if field.visibility() == Visibility::Private && !ctx.mode().includes_private() {
        if ctx.mode().is_strict() {
            return Err(SchemaError::PrivateField {
                record: site.record,
                field: site.field,
            }
            .into());
        }
        tracing::trace!(record = site.record, field = site.field, "private, skipped");
        return Ok(());
    }

    check_annotations(field, site)?;

    let start = ctx.offset();
    tracing::trace!(
        depth = ctx.depth(),
        record = site.record,
        field = site.field,
        ty = field.type_name(),
        offset = start,
        "field"
    );

    match field.slot() {
        Slot::Primitive(slot) | Slot::FixedArray(slot) => {
            let bytes = fixed::read_bytes(ctx, site, slot.type_name(), slot.size())?;
            slot.read(rec, &bytes, ctx.byte_order());
        }
        Slot::Record(slot) => nested(schema, site, field, slot.as_ref(), rec, ctx)?,
        Slot::Sequence(slot) => sequence(schema, site, field, slot.as_ref(), rec, ctx)?,
        Slot::Ignored | Slot::Unsupported(_) => {}
    }

    if let Some(modulus) = annotations.pad_to {
        let rem = (ctx.offset() - start) % modulus;
        if rem != 0 {
            tracing::trace!(field = site.field, pad = modulus - rem, "padding");
            ctx.cursor()
                .skip(modulus - rem)
                .map_err(|err| DecodeError::wire(site.record, site.field, err))?;
        }
    }

    if let Some(hook) = annotations.after {
        resolve::after_hook(schema, site, hook, rec, ctx)?;
    }

    if let Ok(value) = field.slot().scalar(rec) {
        ctx.publish(site.field, value);
    }
    Ok(())
}

/// Reject annotation sets the field's kind cannot honor.
fn check_annotations<T>(field: &Field<T>, site: Site) -> Result<(), SchemaError> {
    let ann = field.annotations();
    if ann.length.is_some() && ann.size.is_some() {
        return Err(SchemaError::ConflictingAnnotations {
            record: site.record,
            field: site.field,
        });
    }
    if ann.pad_to == Some(0) {
        return Err(SchemaError::InvalidPadding {
            record: site.record,
            field: site.field,
        });
    }

    let kind = field.kind();
    let misplaced = match kind {
        FieldKind::Primitive | FieldKind::FixedArray => [
            ann.length.map(|_| Annotation::Length),
            ann.size.map(|_| Annotation::Size),
            ann.element_size.map(|_| Annotation::ElementSize),
        ]
        .into_iter()
        .flatten()
        .next(),
        FieldKind::NestedRecord => {
            if ann.size == Some(SizeSource::ToEnd) {
                return Err(SchemaError::ReadToEndOnRecord {
                    record: site.record,
                    field: site.field,
                });
            }
            [
                ann.length.map(|_| Annotation::Length),
                ann.element_size.map(|_| Annotation::ElementSize),
            ]
            .into_iter()
            .flatten()
            .next()
        }
        FieldKind::Sequence => {
            if ann.length.is_none() && ann.size.is_none() {
                return Err(SchemaError::UnsizedSequence {
                    record: site.record,
                    field: site.field,
                });
            }
            (ann.element_size.is_some() && ann.length.is_none()).then_some(Annotation::ElementSize)
        }
        FieldKind::Ignored | FieldKind::Unsupported => None,
    };

    match misplaced {
        Some(annotation) => Err(SchemaError::MisplacedAnnotation {
            record: site.record,
            field: site.field,
            annotation,
            kind,
        }),
        None => Ok(()),
    }
}

fn nested<T: Record>(
    schema: &Schema<T>,
    site: Site,
    field: &Field<T>,
    slot: &dyn RecordSlot<T>,
    rec: &mut T,
    ctx: &mut DecodeContext<'_, '_>,
) -> Result<(), DecodeError> {
    let Some(SizeSource::Count(source)) = field.annotations().size else {
        // Unbounded: one fixed read when possible, otherwise recurse.
        if let Some(size) = slot.static_size() {
            let bytes = fixed::read_bytes(ctx, site, slot.type_name(), size)?;
            return slot.read_fixed(rec, &bytes, ctx);
        }
        return slot.walk(rec, ctx);
    };

    let size = resolve::count(schema, site, Annotation::Size, source, rec, ctx, None)?;
    if size == 0 {
        tracing::trace!(field = site.field, "zero-sized record, left as is");
        return Ok(());
    }
    check_region(ctx, site, size)?;

    let mut view = ctx.bounded(size);
    slot.walk(rec, &mut view)?;
    view.finish()
        .map_err(|err| DecodeError::wire(site.record, site.field, err))
}

fn sequence<T: Record>(
    schema: &Schema<T>,
    site: Site,
    field: &Field<T>,
    slot: &dyn SequenceSlot<T>,
    rec: &mut T,
    ctx: &mut DecodeContext<'_, '_>,
) -> Result<(), DecodeError> {
    let ann = field.annotations();
    match (ann.length, ann.size) {
        (Some(length), None) => {
            counted_sequence(schema, site, length, ann.element_size, slot, rec, ctx)
        }
        (None, Some(size)) => sized_sequence(schema, site, size, slot, rec, ctx),
        // Both or neither were rejected by check_annotations.
        _ => Ok(()),
    }
}

/// `length`-driven sequence: exactly `n` elements.
fn counted_sequence<T: Record>(
    schema: &Schema<T>,
    site: Site,
    length: CountSource,
    element_size: Option<CountSource>,
    slot: &dyn SequenceSlot<T>,
    rec: &mut T,
    ctx: &mut DecodeContext<'_, '_>,
) -> Result<(), DecodeError> {
    let n = resolve::count(schema, site, Annotation::Length, length, rec, ctx, None)?;
    check_region(ctx, site, n)?;
    let n = to_usize(ctx, site, n)?;
    if n == 0 {
        slot.reset(rec, 0);
        return Ok(());
    }

    if let Some(source) = element_size {
        slot.reset(rec, 0);
        for index in 0..n {
            let size = resolve::count(
                schema,
                site,
                Annotation::ElementSize,
                source,
                rec,
                ctx,
                Some(index),
            )?;
            if size == 0 {
                slot.push_default(rec);
                continue;
            }
            check_region(ctx, site, size)?;
            let mut view = ctx.bounded(size);
            slot.push_decoded(rec, &mut view, site)?;
            view.finish()
                .map_err(|err| DecodeError::wire(site.record, site.field, err))?;
        }
        return Ok(());
    }

    if let Some(width) = slot.element_size() {
        let total = n
            .checked_mul(width)
            .ok_or_else(|| region_too_large(ctx, site, u64::MAX))?;
        check_region(ctx, site, total as u64)?;
        let bytes = fixed::read_bytes(ctx, site, slot.type_name(), total)?;
        return slot.fill_fixed(rec, &bytes, ctx);
    }

    slot.reset(rec, 0);
    for _ in 0..n {
        slot.push_decoded(rec, ctx, site)?;
    }
    Ok(())
}

/// `size`-driven sequence: as many elements as fill the declared bytes.
fn sized_sequence<T: Record>(
    schema: &Schema<T>,
    site: Site,
    size: SizeSource,
    slot: &dyn SequenceSlot<T>,
    rec: &mut T,
    ctx: &mut DecodeContext<'_, '_>,
) -> Result<(), DecodeError> {
    let extent = match size {
        SizeSource::Count(source) => {
            let m = resolve::count(schema, site, Annotation::Size, source, rec, ctx, None)?;
            check_region(ctx, site, m)?;
            Some(to_usize(ctx, site, m)?)
        }
        SizeSource::ToEnd => None,
    };
    slot.reset(rec, 0);
    if extent == Some(0) {
        return Ok(());
    }

    if slot.is_raw_bytes() {
        let max_region = ctx.options().max_region;
        let bytes = match extent {
            Some(m) => ctx.cursor().read_exact(m),
            None => ctx.cursor().read_to_end_within(max_region),
        }
        .map_err(|err| DecodeError::wire(site.record, site.field, err))?;
        slot.assign_bytes(rec, bytes);
        return Ok(());
    }

    let mut region = ctx
        .region(extent)
        .map_err(|err| DecodeError::wire(site.record, site.field, err))?;
    let declared = region.remaining().unwrap_or(0);

    if let Some(width) = slot.element_size() {
        let width = width as u64;
        if declared % width != 0 {
            return Err(DecodeError::SizeMismatch {
                record: site.record,
                field: site.field,
                declared,
                consumed: declared - declared % width,
            });
        }
        let bytes = region
            .cursor()
            .read_to_end()
            .map_err(|err| DecodeError::wire(site.record, site.field, err))?;
        slot.fill_fixed(rec, &bytes, &region)?;
    } else {
        while let Some(left) = region.remaining().filter(|&left| left > 0) {
            let before = region.offset();
            if let Err(err) = slot.push_decoded(rec, &mut region, site) {
                let now = region.remaining().unwrap_or(0);
                return Err(overrun_as_mismatch(err, site, declared, left, now));
            }
            if region.offset() == before {
                return Err(DecodeError::SizeMismatch {
                    record: site.record,
                    field: site.field,
                    declared,
                    consumed: declared - left,
                });
            }
        }
    }

    region
        .finish()
        .map_err(|err| DecodeError::wire(site.record, site.field, err))
}

/// An element that ran out of region bytes means the region does not
/// hold a whole number of elements. `left` is what the region held when
/// the element started, `now` what it holds after the failure.
fn overrun_as_mismatch(
    err: DecodeError,
    site: Site,
    declared: u64,
    left: u64,
    now: u64,
) -> DecodeError {
    let available = match &err {
        DecodeError::TruncatedInput { available, .. }
        | DecodeError::Read {
            source: tagread_wire::WireError::Truncated { available, .. },
            ..
        } => *available,
        _ => return err,
    };
    if available as u64 == now {
        DecodeError::SizeMismatch {
            record: site.record,
            field: site.field,
            declared,
            consumed: declared - left,
        }
    } else {
        err
    }
}

fn check_region(ctx: &DecodeContext<'_, '_>, site: Site, size: u64) -> Result<(), DecodeError> {
    if size > ctx.options().max_region {
        return Err(region_too_large(ctx, site, size));
    }
    Ok(())
}

fn region_too_large(ctx: &DecodeContext<'_, '_>, site: Site, size: u64) -> DecodeError {
    DecodeError::RegionTooLarge {
        record: site.record,
        field: site.field,
        size,
        limit: ctx.options().max_region,
    }
}

fn to_usize(ctx: &DecodeContext<'_, '_>, site: Site, value: u64) -> Result<usize, DecodeError> {
    usize::try_from(value).map_err(|_| region_too_large(ctx, site, value))
}
