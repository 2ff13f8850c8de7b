//! Record metadata: the field list the walker interprets.
//!
//! A record type describes itself once through [`Schema::builder`]. Each
//! registration names a field, says what kind of value it holds and gives
//! an accessor into the destination; annotation setters that follow apply
//! to the field registered last.
//!
//! ```rust
//! use std::sync::OnceLock;
//! use tagread_decoder::{Record, Schema};
//!
//! #[derive(Debug, Default)]
//! struct Frame {
//!     length: u16,
//!     data: Vec<u8>,
//! }
//!
//! impl Record for Frame {
//!     fn schema() -> &'static Schema<Self> {
//!         static SCHEMA: OnceLock<Schema<Frame>> = OnceLock::new();
//!         SCHEMA.get_or_init(|| {
//!             Schema::<Frame>::builder("Frame")
//!                 .primitive("length", |r| &mut r.length)
//!                 .sequence("data", |r| &mut r.data)
//!                 .length("length")
//!                 .build()
//!         })
//!     }
//! }
//!
//! let bytes = [0x02, 0x00, b'h', b'i'];
//! let (frame, consumed) = tagread_decoder::Decoder::default().decode_slice::<Frame>(&bytes)?;
//! assert_eq!(frame.data, b"hi");
//! assert_eq!(consumed, 4);
//! # Ok::<(), tagread_decoder::DecodeError>(())
//! ```

use std::fmt;
use std::sync::OnceLock;

use tagread_wire::{Primitive, Scalar};

use crate::annotation::{
    Annotations, Binding, ConditionRef, CountSource, PendingAnnotations, PendingSize, RefText,
    SizeSource,
};
use crate::context::DecodeContext;
use crate::error::HookError;
use crate::slot::{
    ArraySlot, FixedSlot, NestedSlot, PrimitiveSeqSlot, PrimitiveSlot, RecordSeqSlot, RecordSlot,
    SequenceSlot,
};

/// A type the walker can decode into.
///
/// `Default` supplies the starting value of every sequence element and
/// nested record the walker materializes.
pub trait Record: Default + 'static {
    /// The record's layout. Built once; callers usually keep it in a
    /// `static OnceLock`.
    fn schema() -> &'static Schema<Self>;

    /// Whole-record check, run after the last field has been decoded
    /// (including records read through the fixed-layout fast path).
    ///
    /// # Errors
    ///
    /// Any error aborts the decode as
    /// [`DecodeError::Verification`](crate::DecodeError::Verification).
    fn verify(&self, ctx: &DecodeContext<'_, '_>) -> Result<(), HookError> {
        let _ = ctx;
        Ok(())
    }
}

/// What a field holds, as far as the walker is concerned.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FieldKind {
    Primitive,
    FixedArray,
    Sequence,
    NestedRecord,
    Ignored,
    Unsupported,
}

impl fmt::Display for FieldKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Primitive => "primitive",
            Self::FixedArray => "fixed array",
            Self::Sequence => "sequence",
            Self::NestedRecord => "nested record",
            Self::Ignored => "ignored",
            Self::Unsupported => "unsupported",
        })
    }
}

/// Members a record may carry that have no wire form.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum UnsupportedKind {
    Pointer,
    Bool,
    String,
    Map,
    Other(&'static str),
}

impl fmt::Display for UnsupportedKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Pointer => f.write_str("pointer"),
            Self::Bool => f.write_str("bool"),
            Self::String => f.write_str("string"),
            Self::Map => f.write_str("map"),
            Self::Other(name) => f.write_str(name),
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Visibility {
    #[default]
    Public,
    /// Skipped in lenient mode, rejected in strict mode, decoded under
    /// [`DecodeMode::INCLUDE_PRIVATE`](crate::DecodeMode::INCLUDE_PRIVATE).
    Private,
}

/// Record and field a diagnostic refers to.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) struct Site {
    pub(crate) record: &'static str,
    pub(crate) field: &'static str,
}

pub(crate) enum Slot<T> {
    Primitive(Box<dyn FixedSlot<T>>),
    FixedArray(Box<dyn FixedSlot<T>>),
    Sequence(Box<dyn SequenceSlot<T>>),
    Record(Box<dyn RecordSlot<T>>),
    Ignored,
    Unsupported(UnsupportedKind),
}

impl<T> Slot<T> {
    fn kind(&self) -> FieldKind {
        match self {
            Self::Primitive(_) => FieldKind::Primitive,
            Self::FixedArray(_) => FieldKind::FixedArray,
            Self::Sequence(_) => FieldKind::Sequence,
            Self::Record(_) => FieldKind::NestedRecord,
            Self::Ignored => FieldKind::Ignored,
            Self::Unsupported(_) => FieldKind::Unsupported,
        }
    }

    fn type_name(&self) -> &'static str {
        match self {
            Self::Primitive(slot) | Self::FixedArray(slot) => slot.type_name(),
            Self::Sequence(slot) => slot.type_name(),
            Self::Record(slot) => slot.type_name(),
            Self::Ignored => "()",
            Self::Unsupported(_) => "?",
        }
    }

    /// Current value as a count source. Non-primitive fields report their
    /// kind instead.
    pub(crate) fn scalar(&self, rec: &mut T) -> Result<Scalar, &'static str> {
        match self {
            Self::Primitive(slot) => slot.scalar(rec).ok_or("fixed array"),
            Self::FixedArray(_) => Err("fixed array"),
            Self::Sequence(_) => Err("sequence"),
            Self::Record(_) => Err("nested record"),
            Self::Ignored => Err("ignored field"),
            Self::Unsupported(_) => Err("unsupported field"),
        }
    }
}

/// One field of a [`Schema`].
pub struct Field<T> {
    name: &'static str,
    visibility: Visibility,
    slot: Slot<T>,
    annotations: Annotations,
}

impl<T> Field<T> {
    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn kind(&self) -> FieldKind {
        self.slot.kind()
    }

    pub fn visibility(&self) -> Visibility {
        self.visibility
    }

    /// Rust type name of the field's value, for diagnostics.
    pub fn type_name(&self) -> &'static str {
        self.slot.type_name()
    }

    /// True when no annotation is attached.
    pub fn is_plain(&self) -> bool {
        self.annotations.is_empty()
    }

    pub(crate) fn slot(&self) -> &Slot<T> {
        &self.slot
    }

    pub(crate) fn annotations(&self) -> &Annotations {
        &self.annotations
    }
}

impl<T> fmt::Debug for Field<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Field")
            .field("name", &self.name)
            .field("kind", &self.kind())
            .field("type", &self.type_name())
            .field("visibility", &self.visibility)
            .field("annotations", &self.annotations)
            .finish()
    }
}

pub(crate) type ScalarFn<T> = Box<dyn Fn(&T, &DecodeContext<'_, '_>) -> Scalar + Send + Sync>;
pub(crate) type IndexedFn<T> =
    Box<dyn Fn(&T, &DecodeContext<'_, '_>, usize) -> Scalar + Send + Sync>;
pub(crate) type ConditionFn<T> = Box<dyn Fn(&T, &DecodeContext<'_, '_>) -> bool + Send + Sync>;
pub(crate) type HookFn<T> =
    Box<dyn Fn(&T, &DecodeContext<'_, '_>) -> Result<(), HookError> + Send + Sync>;

pub(crate) enum Resolver<T> {
    Scalar(ScalarFn<T>),
    /// Receives the element index; only usable from `element_size`.
    Indexed(IndexedFn<T>),
}

/// The decode layout of one record type.
pub struct Schema<T> {
    name: &'static str,
    fields: Vec<Field<T>>,
    resolvers: Vec<(&'static str, Resolver<T>)>,
    conditions: Vec<(&'static str, ConditionFn<T>)>,
    hooks: Vec<(&'static str, HookFn<T>)>,
    static_size: OnceLock<Option<usize>>,
}

impl<T: Record> Schema<T> {
    pub fn builder(name: &'static str) -> SchemaBuilder<T> {
        SchemaBuilder {
            name,
            fields: Vec::new(),
            resolvers: Vec::new(),
            conditions: Vec::new(),
            hooks: Vec::new(),
        }
    }

    /// Encoded size when every field is fixed-size, public and carries no
    /// annotation; `None` otherwise. Computed on first use.
    pub fn static_size(&self) -> Option<usize> {
        *self.static_size.get_or_init(|| {
            self.fields.iter().try_fold(0usize, |total, field| {
                if field.visibility == Visibility::Private || !field.annotations.is_empty() {
                    return None;
                }
                let width = match &field.slot {
                    Slot::Primitive(slot) | Slot::FixedArray(slot) => slot.size(),
                    Slot::Record(slot) => slot.static_size()?,
                    Slot::Ignored => 0,
                    Slot::Sequence(_) | Slot::Unsupported(_) => return None,
                };
                total.checked_add(width)
            })
        })
    }
}

impl<T> Schema<T> {
    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn fields(&self) -> &[Field<T>] {
        &self.fields
    }

    pub fn field(&self, name: &str) -> Option<&Field<T>> {
        self.fields.iter().find(|f| f.name == name)
    }

    pub(crate) fn resolver(&self, index: usize) -> &(&'static str, Resolver<T>) {
        &self.resolvers[index]
    }

    pub(crate) fn condition(&self, index: usize) -> &(&'static str, ConditionFn<T>) {
        &self.conditions[index]
    }

    pub(crate) fn hook(&self, index: usize) -> &(&'static str, HookFn<T>) {
        &self.hooks[index]
    }
}

impl<T> fmt::Debug for Schema<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Schema")
            .field("name", &self.name)
            .field("fields", &self.fields)
            .finish_non_exhaustive()
    }
}

struct PendingField<T> {
    name: &'static str,
    visibility: Visibility,
    slot: Slot<T>,
    annotations: PendingAnnotations,
}

/// Builder returned by [`Schema::builder`].
///
/// Fields are decoded in registration order. Annotation setters
/// (`length`, `size`, `when`, `pad_to`, ...) modify the field registered
/// most recently.
pub struct SchemaBuilder<T> {
    name: &'static str,
    fields: Vec<PendingField<T>>,
    resolvers: Vec<(&'static str, Resolver<T>)>,
    conditions: Vec<(&'static str, ConditionFn<T>)>,
    hooks: Vec<(&'static str, HookFn<T>)>,
}

impl<T: Record> SchemaBuilder<T> {
    // ── Fields ──────────────────────────────────────────────────────────

    /// A single numeric value.
    #[must_use]
    pub fn primitive<P: Primitive>(self, name: &'static str, access: fn(&mut T) -> &mut P) -> Self {
        self.push(name, Slot::Primitive(Box::new(PrimitiveSlot { access })))
    }

    /// A fixed-size array of numeric values, `[P; N]`.
    #[must_use]
    pub fn array<P: Primitive, const N: usize>(
        self,
        name: &'static str,
        access: fn(&mut T) -> &mut [P; N],
    ) -> Self {
        self.push(name, Slot::FixedArray(Box::new(ArraySlot { access })))
    }

    /// A `Vec` of numeric values. Needs `length` or `size`.
    #[must_use]
    pub fn sequence<P: Primitive>(self, name: &'static str, access: fn(&mut T) -> &mut Vec<P>) -> Self {
        self.push(name, Slot::Sequence(Box::new(PrimitiveSeqSlot { access })))
    }

    /// A `Vec` of records. Needs `length` or `size`.
    #[must_use]
    pub fn records<R: Record>(self, name: &'static str, access: fn(&mut T) -> &mut Vec<R>) -> Self {
        self.push(name, Slot::Sequence(Box::new(RecordSeqSlot { access })))
    }

    /// A nested record, walked recursively.
    #[must_use]
    pub fn record<R: Record>(self, name: &'static str, access: fn(&mut T) -> &mut R) -> Self {
        self.push(name, Slot::Record(Box::new(NestedSlot { access })))
    }

    /// A member with no wire representation. Consumes nothing.
    #[must_use]
    pub fn ignored(self, name: &'static str) -> Self {
        self.push(name, Slot::Ignored)
    }

    /// A member the decoder cannot fill. Reaching it is a
    /// [`SchemaError::UnsupportedField`](crate::SchemaError::UnsupportedField).
    #[must_use]
    pub fn unsupported(self, name: &'static str, kind: UnsupportedKind) -> Self {
        self.push(name, Slot::Unsupported(kind))
    }

    fn push(mut self, name: &'static str, slot: Slot<T>) -> Self {
        self.fields.push(PendingField {
            name,
            visibility: Visibility::Public,
            slot,
            annotations: PendingAnnotations::default(),
        });
        self
    }

    // ── Annotations on the last field ───────────────────────────────────

    /// Element count of a sequence: a sibling field name or `"resolver()"`.
    ///
    /// # Panics
    ///
    /// Panics if no field has been registered yet. The same holds for
    /// every other annotation setter.
    #[must_use]
    pub fn length(mut self, reference: &'static str) -> Self {
        self.last("length").annotations.length = Some(reference);
        self
    }

    /// Byte extent of a sequence or nested record.
    #[must_use]
    pub fn size(mut self, reference: &'static str) -> Self {
        self.last("size").annotations.size = Some(PendingSize::Ref(reference));
        self
    }

    /// The sequence extends to the end of the enclosing view (or input).
    #[must_use]
    pub fn size_to_end(mut self) -> Self {
        self.last("size_to_end").annotations.size = Some(PendingSize::ToEnd);
        self
    }

    /// Byte size of each element of a `length`-driven sequence. An
    /// indexed resolver receives the element index.
    #[must_use]
    pub fn element_size(mut self, reference: &'static str) -> Self {
        self.last("element_size").annotations.element_size = Some(reference);
        self
    }

    /// Decode the field only when the named condition holds. A leading
    /// `!` inverts it.
    #[must_use]
    pub fn when(mut self, condition: &'static str) -> Self {
        self.last("when").annotations.condition = Some(condition);
        self
    }

    /// Skip bytes after the field until its consumed size is a multiple
    /// of `modulus`.
    #[must_use]
    pub fn pad_to(mut self, modulus: u64) -> Self {
        self.last("pad_to").annotations.pad_to = Some(modulus);
        self
    }

    /// Run the named hook after the field (and its padding).
    #[must_use]
    pub fn after(mut self, hook: &'static str) -> Self {
        self.last("after").annotations.after = Some(hook);
        self
    }

    #[must_use]
    pub fn private(mut self) -> Self {
        self.last("private").visibility = Visibility::Private;
        self
    }

    fn last(&mut self, setter: &str) -> &mut PendingField<T> {
        let record = self.name;
        self.fields
            .last_mut()
            .unwrap_or_else(|| panic!("{record}: {setter} called before any field was registered"))
    }

    // ── Resolvers, conditions, hooks ────────────────────────────────────

    /// Count source computed from the record, referenced as `"name()"`.
    #[must_use]
    pub fn resolver<F, V>(mut self, name: &'static str, f: F) -> Self
    where
        F: Fn(&T) -> V + Send + Sync + 'static,
        V: Into<Scalar>,
    {
        let f = move |rec: &T, _: &DecodeContext<'_, '_>| f(rec).into();
        self.resolvers.push((name, Resolver::Scalar(Box::new(f))));
        self
    }

    /// Like [`resolver`](Self::resolver), with access to the decode
    /// context (offset, outer-record values).
    #[must_use]
    pub fn resolver_ctx<F, V>(mut self, name: &'static str, f: F) -> Self
    where
        F: Fn(&T, &DecodeContext<'_, '_>) -> V + Send + Sync + 'static,
        V: Into<Scalar>,
    {
        let f = move |rec: &T, ctx: &DecodeContext<'_, '_>| f(rec, ctx).into();
        self.resolvers.push((name, Resolver::Scalar(Box::new(f))));
        self
    }

    /// Per-element size source for `element_size`, given the element
    /// index.
    #[must_use]
    pub fn indexed_resolver<F, V>(mut self, name: &'static str, f: F) -> Self
    where
        F: Fn(&T, &DecodeContext<'_, '_>, usize) -> V + Send + Sync + 'static,
        V: Into<Scalar>,
    {
        let f = move |rec: &T, ctx: &DecodeContext<'_, '_>, index: usize| f(rec, ctx, index).into();
        self.resolvers.push((name, Resolver::Indexed(Box::new(f))));
        self
    }

    #[must_use]
    pub fn condition<F>(mut self, name: &'static str, f: F) -> Self
    where
        F: Fn(&T) -> bool + Send + Sync + 'static,
    {
        let f = move |rec: &T, _: &DecodeContext<'_, '_>| f(rec);
        self.conditions.push((name, Box::new(f)));
        self
    }

    #[must_use]
    pub fn condition_ctx<F>(mut self, name: &'static str, f: F) -> Self
    where
        F: Fn(&T, &DecodeContext<'_, '_>) -> bool + Send + Sync + 'static,
    {
        self.conditions.push((name, Box::new(f)));
        self
    }

    /// Verification hook for [`after`](Self::after).
    #[must_use]
    pub fn hook<F>(mut self, name: &'static str, f: F) -> Self
    where
        F: Fn(&T, &DecodeContext<'_, '_>) -> Result<(), HookError> + Send + Sync + 'static,
    {
        self.hooks.push((name, Box::new(f)));
        self
    }

    /// Parse every annotation and bind names to fields, resolvers,
    /// conditions and hooks. Names that match nothing stay unbound and
    /// fail when their field is decoded.
    pub fn build(self) -> Schema<T> {
        let names: Vec<&'static str> = self.fields.iter().map(|f| f.name).collect();
        let resolver_names: Vec<&'static str> = self.resolvers.iter().map(|(n, _)| *n).collect();
        let condition_names: Vec<&'static str> = self.conditions.iter().map(|(n, _)| *n).collect();
        let hook_names: Vec<&'static str> = self.hooks.iter().map(|(n, _)| *n).collect();

        let count = |text: &'static str| match RefText::parse(text) {
            RefText::Field(name) => position(&names, name)
                .map_or(CountSource::Unbound(RefText::Field(name)), CountSource::Field),
            RefText::Resolver(name) => position(&resolver_names, name)
                .map_or(CountSource::Unbound(RefText::Resolver(name)), CountSource::Resolver),
        };

        let fields = self
            .fields
            .into_iter()
            .map(|pending| {
                let raw = pending.annotations;
                let annotations = Annotations {
                    length: raw.length.map(count),
                    size: raw.size.map(|size| match size {
                        PendingSize::Ref(text) => SizeSource::Count(count(text)),
                        PendingSize::ToEnd => SizeSource::ToEnd,
                    }),
                    element_size: raw.element_size.map(count),
                    condition: raw.condition.map(|text| {
                        let (negate, name) = ConditionRef::parse(text);
                        let name = name.strip_suffix("()").unwrap_or(name);
                        ConditionRef {
                            negate,
                            source: bind(&condition_names, name),
                        }
                    }),
                    pad_to: raw.pad_to,
                    after: raw.after.map(|name| bind(&hook_names, name)),
                };
                Field {
                    name: pending.name,
                    visibility: pending.visibility,
                    slot: pending.slot,
                    annotations,
                }
            })
            .collect();

        Schema {
            name: self.name,
            fields,
            resolvers: self.resolvers,
            conditions: self.conditions,
            hooks: self.hooks,
            static_size: OnceLock::new(),
        }
    }
}

fn position(names: &[&'static str], name: &str) -> Option<usize> {
    names.iter().position(|n| *n == name)
}

fn bind(names: &[&'static str], name: &'static str) -> Binding {
    position(names, name).map_or(Binding::Unbound(name), Binding::Bound)
}
