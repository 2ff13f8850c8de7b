//! Sample record formats used by the integration tests, the benches and
//! the fuzz targets.
//!
//! ```text
//! ┌───────────┬────────────────────────────────────────────────────────┐
//! │ Module    │ Exercises                                              │
//! ├───────────┼────────────────────────────────────────────────────────┤
//! │ resource  │ size-driven block list, nested padded strings, hooks   │
//! │ frame     │ conditions, outer-record state, verify, read-to-end    │
//! │ table     │ per-element sizes (field and indexed resolver)         │
//! │ fixtures  │ byte builders for all of the above                     │
//! └───────────┴────────────────────────────────────────────────────────┘
//! ```

pub mod fixtures;
pub mod frame;
pub mod resource;
pub mod table;
