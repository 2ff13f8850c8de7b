#![warn(clippy::pedantic)]

pub mod cursor;
pub mod error;
pub mod order;
pub mod primitive;

pub use cursor::{Bounded, ByteCursor, Region, ViewMark};
pub use error::WireError;
pub use order::ByteOrder;
pub use primitive::{Primitive, Scalar};
