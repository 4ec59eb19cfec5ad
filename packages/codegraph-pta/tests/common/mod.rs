//! Common test utilities for codegraph-pta
//!
//! Program fixtures built with `ProgramBuilder` plus assertions over
//! analysis results.

#![allow(dead_code)]

mod assertions;
mod fixtures;

// Not every test binary uses every helper
#[allow(unused_imports)]
pub use assertions::*;
#[allow(unused_imports)]
pub use fixtures::*;
