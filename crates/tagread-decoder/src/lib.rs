#![warn(clippy::pedantic)]

pub mod annotation;
pub mod context;
pub mod decoder;
pub mod error;
pub mod fixed;
pub mod options;
pub mod schema;

mod resolve;
mod slot;
mod walker;

pub use annotation::Annotation;
pub use context::DecodeContext;
pub use decoder::{Decoder, decode};
pub use error::{DecodeError, HookError, SchemaError};
pub use fixed::read_fixed;
pub use options::{DecodeMode, DecodeOptions};
pub use schema::{
    Field, FieldKind, Record, Schema, SchemaBuilder, UnsupportedKind, Visibility,
};
