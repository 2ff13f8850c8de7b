//! Tag interpreter: turns bound annotations into counts, booleans and
//! hook outcomes against the record being decoded.

use tagread_wire::Scalar;

use crate::annotation::{Annotation, Binding, ConditionRef, CountSource, RefText};
use crate::context::DecodeContext;
use crate::error::{DecodeError, SchemaError};
use crate::schema::{Record, Resolver, Schema, Site};

/// Resolve a count or byte size.
///
/// `index` is the element index when resolving `element_size`; only then
/// may the source be an indexed resolver.
pub(crate) fn count<T: Record>(
    schema: &Schema<T>,
    site: Site,
    annotation: Annotation,
    source: CountSource,
    rec: &mut T,
    ctx: &DecodeContext<'_, '_>,
    index: Option<usize>,
) -> Result<u64, DecodeError> {
    let value = match source {
        CountSource::Field(i) => schema.fields()[i].slot().scalar(rec).map_err(|found| {
            SchemaError::NotAnInteger {
                record: site.record,
                field: site.field,
                annotation,
                found,
            }
        })?,
        CountSource::Resolver(i) => {
            let &(name, ref resolver) = schema.resolver(i);
            match (resolver, index) {
                (Resolver::Scalar(f), _) => f(&*rec, ctx),
                (Resolver::Indexed(f), Some(index)) => f(&*rec, ctx, index),
                (Resolver::Indexed(_), None) => {
                    return Err(SchemaError::ResolverSignature {
                        record: site.record,
                        field: site.field,
                        annotation,
                        name,
                    }
                    .into());
                }
            }
        }
        CountSource::Unbound(RefText::Field(name)) => {
            return Err(SchemaError::UnknownField {
                record: site.record,
                field: site.field,
                annotation,
                name,
            }
            .into());
        }
        CountSource::Unbound(RefText::Resolver(name)) => {
            return Err(SchemaError::UnknownResolver {
                record: site.record,
                field: site.field,
                annotation,
                name,
            }
            .into());
        }
    };
    coerce(site, annotation, value)
}

/// Accept any integer representation; reject floats and negatives.
fn coerce(site: Site, annotation: Annotation, value: Scalar) -> Result<u64, DecodeError> {
    match value {
        Scalar::Unsigned(v) => Ok(v),
        Scalar::Signed(v) => u64::try_from(v).map_err(|_| DecodeError::NegativeCount {
            record: site.record,
            field: site.field,
            annotation,
            value: v,
        }),
        Scalar::Float(_) => Err(SchemaError::NotAnInteger {
            record: site.record,
            field: site.field,
            annotation,
            found: value.kind_name(),
        }
        .into()),
    }
}

/// Evaluate a field's condition, applying its negation.
pub(crate) fn condition<T: Record>(
    schema: &Schema<T>,
    site: Site,
    cond: ConditionRef,
    rec: &T,
    ctx: &DecodeContext<'_, '_>,
) -> Result<bool, DecodeError> {
    match cond.source {
        Binding::Bound(i) => {
            let (_, f) = schema.condition(i);
            Ok(f(rec, ctx) != cond.negate)
        }
        Binding::Unbound(name) => Err(SchemaError::UnknownResolver {
            record: site.record,
            field: site.field,
            annotation: Annotation::Condition,
            name,
        }
        .into()),
    }
}

/// Run a field's after-hook.
pub(crate) fn after_hook<T: Record>(
    schema: &Schema<T>,
    site: Site,
    hook: Binding,
    rec: &T,
    ctx: &DecodeContext<'_, '_>,
) -> Result<(), DecodeError> {
    match hook {
        Binding::Bound(i) => {
            let &(name, ref f) = schema.hook(i);
            tracing::trace!(record = site.record, field = site.field, hook = name, "after-hook");
            f(rec, ctx).map_err(|source| DecodeError::Verification {
                record: site.record,
                hook: name,
                source,
            })
        }
        Binding::Unbound(name) => Err(SchemaError::UnknownHook {
            record: site.record,
            field: site.field,
            name,
        }
        .into()),
    }
}
