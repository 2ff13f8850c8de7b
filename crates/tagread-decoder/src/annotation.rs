//! Typed annotations.
//!
//! Reference strings are parsed exactly once, when a schema is built, into
//! the types below. Names are bound to field or resolver indices at the
//! same time; decode time only follows indices.
//!
//! ```text
//!   "count"      → sibling field `count`
//!   "count()"    → resolver registered as `count`
//!   "!present"   → condition `present`, negated
//! ```

use std::fmt;

/// Which annotation a diagnostic is about.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Annotation {
    Length,
    Size,
    ElementSize,
    Condition,
    PadTo,
    After,
}

impl fmt::Display for Annotation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Length => "length",
            Self::Size => "size",
            Self::ElementSize => "element_size",
            Self::Condition => "condition",
            Self::PadTo => "pad_to",
            Self::After => "after",
        })
    }
}

/// A count or size reference as written, before binding.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum RefText {
    Field(&'static str),
    Resolver(&'static str),
}

impl RefText {
    pub(crate) fn parse(text: &'static str) -> Self {
        match text.strip_suffix("()") {
            Some(name) => Self::Resolver(name),
            None => Self::Field(text),
        }
    }
}

/// Where a count comes from once bound.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum CountSource {
    /// Index into the record's fields.
    Field(usize),
    /// Index into the record's resolvers.
    Resolver(usize),
    /// Nothing matched at build time; reported when the field is reached.
    Unbound(RefText),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum SizeSource {
    Count(CountSource),
    ToEnd,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) struct ConditionRef {
    pub(crate) negate: bool,
    pub(crate) source: Binding,
}

impl ConditionRef {
    pub(crate) fn parse(text: &'static str) -> (bool, &'static str) {
        match text.strip_prefix('!') {
            Some(name) => (true, name),
            None => (false, text),
        }
    }
}

/// A name bound to an index in one of the schema's tables, or left
/// dangling.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum Binding {
    Bound(usize),
    Unbound(&'static str),
}

/// Raw annotation text as registered on the builder.
#[derive(Clone, Debug, Default)]
pub(crate) struct PendingAnnotations {
    pub(crate) length: Option<&'static str>,
    pub(crate) size: Option<PendingSize>,
    pub(crate) element_size: Option<&'static str>,
    pub(crate) condition: Option<&'static str>,
    pub(crate) pad_to: Option<u64>,
    pub(crate) after: Option<&'static str>,
}

#[derive(Clone, Copy, Debug)]
pub(crate) enum PendingSize {
    Ref(&'static str),
    ToEnd,
}

/// The bound annotation set of one field.
#[derive(Clone, Debug, Default)]
pub(crate) struct Annotations {
    pub(crate) length: Option<CountSource>,
    pub(crate) size: Option<SizeSource>,
    pub(crate) element_size: Option<CountSource>,
    pub(crate) condition: Option<ConditionRef>,
    pub(crate) pad_to: Option<u64>,
    pub(crate) after: Option<Binding>,
}

impl Annotations {
    /// No annotation of any kind.
    pub(crate) fn is_empty(&self) -> bool {
        self.length.is_none()
            && self.size.is_none()
            && self.element_size.is_none()
            && self.condition.is_none()
            && self.pad_to.is_none()
            && self.after.is_none()
    }
}
