//! Taint analysis on top of the pointer analysis
//!
//! - `domain`: index references, resolved config, flows
//! - `infrastructure`: config loading and the per-concern handlers
//! - `application`: the `taint` plugin

pub mod application;
pub mod domain;
pub mod infrastructure;

pub use application::TaintAnalysis;
pub use domain::{
    Index, IndexKind, IndexRef, ParamSanitizer, Sink, SinkPoint, Source, SourcePoint, TaintConfig,
    TaintFlow, TaintTransfer,
};
pub use infrastructure::load_taint_config;
