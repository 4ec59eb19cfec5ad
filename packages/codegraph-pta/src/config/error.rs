//! Configuration error types

use std::path::PathBuf;
use thiserror::Error;

/// Configuration error type
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Unknown context selector name
    #[error("Unknown context sensitivity '{0}'. Valid values: ci, <k>-call, <k>-cfa, <k>-obj, <k>-type")]
    UnknownSelector(String),

    /// Unknown advanced pre-analysis name
    #[error("Unknown advanced analysis '{0}'. Valid values: collection, scaler, zipper")]
    UnknownAdvanced(String),

    /// Plugin id not present in the registry
    #[error("Unknown plugin '{id}'. Registered plugins: {}", .registered.join(", "))]
    UnknownPlugin { id: String, registered: Vec<String> },

    /// Malformed index reference in a taint config entry
    #[error("Invalid index reference '{value}' for {method}: {reason}")]
    InvalidIndexRef {
        value: String,
        method: String,
        reason: String,
    },

    /// Unknown type name in a taint config entry
    #[error("Unknown type '{0}'")]
    UnknownType(String),

    /// Required entry field missing
    #[error("Missing field '{field}' in {section} entry")]
    MissingField {
        section: &'static str,
        field: &'static str,
    },

    /// IO error with the offending path
    #[error("IO error reading {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// YAML parsing error
    #[error("YAML parsing error in {}: {source}", .path.display())]
    Yaml {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    /// JSON parsing error
    #[error("JSON parsing error in {}: {source}", .path.display())]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    /// Error resolving an entry of a config file
    #[error("Invalid entry in {}: {source}", .path.display())]
    InFile {
        path: PathBuf,
        #[source]
        source: Box<ConfigError>,
    },

    /// Config path does not exist
    #[error("Configuration path not found: {}", .0.display())]
    NotFound(PathBuf),

    /// Validation error
    #[error("Validation error: {0}")]
    Validation(String),
}

impl ConfigError {
    /// Attach the file the error came from
    pub fn in_file(self, path: impl Into<PathBuf>) -> Self {
        match self {
            ConfigError::Io { .. } | ConfigError::Yaml { .. } | ConfigError::Json { .. } => self,
            other => ConfigError::InFile {
                path: path.into(),
                source: Box::new(other),
            },
        }
    }
}

/// Configuration result type
pub type ConfigResult<T> = Result<T, ConfigError>;
