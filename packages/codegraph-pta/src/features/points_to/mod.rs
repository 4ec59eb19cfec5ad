//! Context-sensitive pointer analysis
//!
//! - `domain`: abstract objects, contexts, CS elements, flow and call edges
//! - `infrastructure`: points-to sets, interning, PFG, call graph, selectors,
//!   the worklist solver
//! - `plugin`: the plugin chain and built-in plugins
//! - `application`: driver, pre-analyses, result facade
//! - `client`: analyses over a finished result

pub mod application;
pub mod client;
pub mod domain;
pub mod infrastructure;
pub mod plugin;

pub use application::{PointerAnalysis, PointerAnalysisResult};
