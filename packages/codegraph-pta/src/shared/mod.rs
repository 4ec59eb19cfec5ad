//! Shared module - Program model and utilities
//!
//! Everything the analysis consumes from a front end lives here: types,
//! the class hierarchy, per-method IR and the `Program` session object.

#[macro_use]
pub mod macros;
pub mod models;

pub use models::*;
