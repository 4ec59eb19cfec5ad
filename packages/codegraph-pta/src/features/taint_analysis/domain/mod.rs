//! Taint domain: index references, resolved configuration and flows

pub mod index_ref;
pub mod taint_config;
pub mod taint_flow;

pub use index_ref::{index_type, Index, IndexKind, IndexRef};
pub use taint_config::{ParamSanitizer, Sink, Source, TaintConfig, TaintTransfer};
pub use taint_flow::{SinkPoint, SourcePoint, TaintFlow};
