/*
 * Codegraph PTA - Context-Sensitive Pointer Analysis
 *
 * Feature-First Architecture:
 * - shared/      : Program model (types, class hierarchy, IR, builder)
 * - config/      : Analysis options and configuration errors
 * - features/    : Vertical slices (points_to → taint_analysis)
 *
 * The solver is a single-threaded worklist fixed point coupling
 * inclusion-based propagation with on-the-fly call graph construction.
 * Plugins observe it through callbacks and feed constraints back as
 * queued commands.
 */

#![allow(clippy::type_complexity)] // Interning tables keyed by tuples
#![allow(clippy::new_without_default)] // Default impl not always needed

/// Program model consumed from a front end
pub mod shared;

pub mod config;
pub mod errors;
pub mod features;

pub use config::{AdvancedAnalysis, ConfigError, ContextSpec, PtaConfig};
pub use errors::{PtaError, Result};
pub use features::points_to::client::may_fail_casts;
pub use features::points_to::domain::{EXCEPTION, SOUNDNESS_WARNINGS, TAINT_FLOWS};
pub use features::points_to::plugin::{Plugin, PluginRegistry};
pub use features::points_to::{PointerAnalysis, PointerAnalysisResult};
pub use features::taint_analysis::{TaintAnalysis, TaintFlow};
