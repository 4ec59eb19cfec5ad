//! Error types for codegraph-pta
//!
//! Configuration problems and plugin setup failures are fatal and surface
//! before propagation starts. Unsound-but-recoverable situations
//! (unresolved calls, unknown reflective targets) are never errors; they
//! are collected as soundness warnings.

use crate::config::ConfigError;
use thiserror::Error;

/// Main error type for analysis runs
#[derive(Debug, Error)]
pub enum PtaError {
    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// A plugin factory failed
    #[error("Failed to construct plugin '{id}': {reason}")]
    PluginConstruction { id: String, reason: String },

    /// Analysis error
    #[error("Analysis error: {0}")]
    Analysis(String),
}

impl PtaError {
    pub fn plugin(id: impl Into<String>, reason: impl Into<String>) -> Self {
        PtaError::PluginConstruction {
            id: id.into(),
            reason: reason.into(),
        }
    }

    pub fn analysis(msg: impl Into<String>) -> Self {
        PtaError::Analysis(msg.into())
    }
}

/// Result type alias for analysis operations
pub type Result<T> = std::result::Result<T, PtaError>;
