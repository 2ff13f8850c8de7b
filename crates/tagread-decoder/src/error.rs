use tagread_wire::WireError;

use crate::annotation::Annotation;
use crate::schema::{FieldKind, UnsupportedKind};

/// Error type returned by resolvers, after-hooks and
/// [`Record::verify`](crate::Record::verify).
///
/// Any error type converts into it with `?` or `.into()`, and a plain
/// string works too: `Err("checksum mismatch".into())`.
pub type HookError = Box<dyn std::error::Error + Send + Sync>;

/// The schema (or an annotation on it) is self-inconsistent or names
/// something that does not exist.
///
/// Every variant names the record type and field it was detected on.
/// None of them depend on the input bytes: a schema error surfaces the
/// first time the offending field is reached, before any of its bytes are
/// consumed.
///
/// ```text
///   SchemaError
///   ├── ConflictingAnnotations ← both length and size on one field
///   ├── UnknownField           ← reference to a sibling that does not exist
///   ├── UnknownResolver        ← "name()" / condition never registered
///   ├── UnknownHook            ← after-hook never registered
///   ├── ResolverSignature      ← indexed resolver used without an index
///   ├── NotAnInteger           ← count source is not an integer
///   ├── UnsupportedField       ← pointer / bool / string / map member
///   ├── PrivateField           ← private member in strict mode
///   ├── UnsizedSequence        ← Vec with neither length nor size
///   ├── MisplacedAnnotation    ← annotation the field kind can't honor
///   ├── ReadToEndOnRecord      ← size_to_end on a nested record
///   └── InvalidPadding         ← pad_to(0)
/// ```
#[derive(Debug, thiserror::Error)]
pub enum SchemaError {
    #[error("{record}.{field} declares both a length and a size")]
    ConflictingAnnotations {
        record: &'static str,
        field: &'static str,
    },

    /// A `"name"` reference did not match any field registered on the
    /// same record.
    #[error("{annotation} annotation of {record}.{field} names field '{name}', which does not exist")]
    UnknownField {
        record: &'static str,
        field: &'static str,
        annotation: Annotation,
        name: &'static str,
    },

    #[error("{annotation} annotation of {record}.{field} names resolver '{name}', which is not registered")]
    UnknownResolver {
        record: &'static str,
        field: &'static str,
        annotation: Annotation,
        name: &'static str,
    },

    #[error("after-hook '{name}' of {record}.{field} is not registered")]
    UnknownHook {
        record: &'static str,
        field: &'static str,
        name: &'static str,
    },

    /// An indexed resolver was referenced from an annotation that has no
    /// element index to give it (anything but `element_size`).
    #[error("resolver '{name}' takes an element index and cannot serve the {annotation} annotation of {record}.{field}")]
    ResolverSignature {
        record: &'static str,
        field: &'static str,
        annotation: Annotation,
        name: &'static str,
    },

    #[error("{annotation} annotation of {record}.{field} resolved to a {found}, expected an integer")]
    NotAnInteger {
        record: &'static str,
        field: &'static str,
        annotation: Annotation,
        found: &'static str,
    },

    #[error("{record}.{field}: {kind} members are not supported")]
    UnsupportedField {
        record: &'static str,
        field: &'static str,
        kind: UnsupportedKind,
    },

    /// Only raised in strict mode; lenient mode skips the field.
    #[error("{record}.{field} is private (decode with DecodeMode::INCLUDE_PRIVATE to fill it)")]
    PrivateField {
        record: &'static str,
        field: &'static str,
    },

    #[error("sequence {record}.{field} has neither a length nor a size annotation")]
    UnsizedSequence {
        record: &'static str,
        field: &'static str,
    },

    #[error("{annotation} annotation is not valid on {kind} field {record}.{field}")]
    MisplacedAnnotation {
        record: &'static str,
        field: &'static str,
        annotation: Annotation,
        kind: FieldKind,
    },

    #[error("{record}.{field}: only sequences may read to the end of input")]
    ReadToEndOnRecord {
        record: &'static str,
        field: &'static str,
    },

    #[error("{record}.{field}: padding modulus must be non-zero")]
    InvalidPadding {
        record: &'static str,
        field: &'static str,
    },
}

/// Errors that abort a decode call.
///
/// Whatever the depth at which a failure happens, it unwinds every
/// recursion level and is returned from the single top-level entry point
/// (or turned into a panic there, in fail-hard mode). The destination
/// record is left partially populated and must not be trusted.
///
/// ```text
///   DecodeError
///   ├── Schema(SchemaError)  ← the record layout itself is wrong
///   ├── TruncatedInput       ← source ran dry during an exact-size read
///   ├── SizeMismatch         ← bounded region not consumed exactly
///   ├── Read                 ← fixed-layout read failed (with field context)
///   ├── Io                   ← byte source fault outside a fixed read
///   ├── Verification         ← after-hook or Record::verify rejected
///   ├── NegativeCount        ← signed count source was negative
///   ├── DepthExceeded        ← nesting deeper than DecodeOptions::max_depth
///   └── RegionTooLarge       ← declared extent over DecodeOptions::max_region
/// ```
#[derive(Debug, thiserror::Error)]
pub enum DecodeError {
    #[error(transparent)]
    Schema(#[from] SchemaError),

    #[error("truncated input at offset {offset}: needed {expected} bytes, {available} available")]
    TruncatedInput {
        offset: u64,
        expected: usize,
        available: usize,
    },

    /// A `size` annotation declared `declared` bytes but the field's
    /// contents consumed `consumed` of them (or a region could not be
    /// split into whole elements).
    #[error("size mismatch in {record}.{field}: declared {declared} bytes, consumed {consumed}")]
    SizeMismatch {
        record: &'static str,
        field: &'static str,
        declared: u64,
        consumed: u64,
    },

    /// A fixed-layout read of `size` bytes for one field failed.
    #[error("reading {size} bytes for {record}.{field} ({type_name}): {source}")]
    Read {
        record: &'static str,
        field: &'static str,
        type_name: &'static str,
        size: usize,
        #[source]
        source: WireError,
    },

    #[error("i/o error at offset {offset}: {source}")]
    Io {
        offset: u64,
        #[source]
        source: std::io::Error,
    },

    /// `hook` is the after-hook name, or `"verify"` for the whole-record
    /// check.
    #[error("verification '{hook}' failed on {record}: {source}")]
    Verification {
        record: &'static str,
        hook: &'static str,
        #[source]
        source: HookError,
    },

    #[error("{annotation} annotation of {record}.{field} resolved to a negative count ({value})")]
    NegativeCount {
        record: &'static str,
        field: &'static str,
        annotation: Annotation,
        value: i64,
    },

    #[error("record nesting exceeded {limit} levels at {record}")]
    DepthExceeded { record: &'static str, limit: usize },

    /// For a read to the end of an unbounded source, `size` is the first
    /// byte count past the limit; the source was not drained further.
    #[error("{record}.{field} declares {size} bytes, over the {limit}-byte limit")]
    RegionTooLarge {
        record: &'static str,
        field: &'static str,
        size: u64,
        limit: u64,
    },
}

impl DecodeError {
    /// True when the failure came from the schema rather than the input.
    pub fn is_schema(&self) -> bool {
        matches!(self, Self::Schema(_))
    }

    /// True when the input ran out, whether during a fixed-layout read or
    /// any other exact-size read.
    pub fn is_truncated(&self) -> bool {
        match self {
            Self::TruncatedInput { .. } => true,
            Self::Read { source, .. } => source.is_truncated(),
            _ => false,
        }
    }

    /// Wrap a cursor failure from a fixed-layout read with the field it
    /// was reading.
    pub(crate) fn read(
        record: &'static str,
        field: &'static str,
        type_name: &'static str,
        size: usize,
        source: WireError,
    ) -> Self {
        Self::Read {
            record,
            field,
            type_name,
            size,
            source,
        }
    }

    /// Map a cursor failure onto the field whose read raised it.
    ///
    /// An unconsumed view becomes a size mismatch and an overlong
    /// read-to-end becomes [`RegionTooLarge`](Self::RegionTooLarge).
    pub(crate) fn wire(record: &'static str, field: &'static str, err: WireError) -> Self {
        match err {
            WireError::Truncated {
                offset,
                expected,
                available,
            } => Self::TruncatedInput {
                offset,
                expected,
                available,
            },
            WireError::Unconsumed {
                declared, consumed, ..
            } => Self::SizeMismatch {
                record,
                field,
                declared,
                consumed,
            },
            WireError::Overlong { limit, .. } => Self::RegionTooLarge {
                record,
                field,
                size: limit.saturating_add(1),
                limit,
            },
            WireError::Io { offset, source } => Self::Io { offset, source },
        }
    }
}
