//! Taint config documents
//!
//! ```yaml
//! sources:
//!   - { kind: call, method: "<Test: java.lang.String getInput()>", index: result }
//!   - { kind: param, method: "<Servlet: void doGet(Request)>", index: 0 }
//!   - { kind: field, field: "<Config: java.lang.String secret>" }
//! sinks:
//!   - { method: "<Test: void exec(java.lang.String)>", index: 0 }
//! transfers:
//!   - { method: "<java.lang.StringBuilder: java.lang.StringBuilder append(java.lang.String)>",
//!       from: 0, to: base }
//! sanitizers:
//!   - { kind: param, method: "<Test: void exec(java.lang.String)>", index: 0 }
//! call-site-mode: false
//! ```
//!
//! A path may name one file or a directory; in a directory every `.yml`,
//! `.yaml` and `.json` file is loaded in sorted path order and merged.
//! Entries naming methods or fields absent from the program are skipped
//! with a warning. Malformed documents and bad index references are errors.

use crate::config::{ConfigError, ConfigResult};
use crate::features::taint_analysis::domain::{
    IndexRef, ParamSanitizer, Sink, Source, TaintConfig, TaintTransfer,
};
use crate::shared::models::{MethodId, Program, Type};
use serde::Deserialize;
use std::fmt;
use std::path::{Path, PathBuf};
use tracing::{info, warn};
use walkdir::WalkDir;

/// One taint config file as written
#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct TaintDocument {
    pub sources: Vec<RawSource>,
    pub sinks: Vec<RawSink>,
    pub transfers: Vec<RawTransfer>,
    pub sanitizers: Vec<RawSanitizer>,
    pub call_site_mode: bool,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum RawSource {
    Call {
        method: String,
        index: RawIndex,
        #[serde(default, rename = "type")]
        ty: Option<String>,
    },
    Param {
        method: String,
        index: RawIndex,
        #[serde(default, rename = "type")]
        ty: Option<String>,
    },
    Field {
        field: String,
        #[serde(default, rename = "type")]
        ty: Option<String>,
    },
}

#[derive(Debug, Clone, Deserialize)]
pub struct RawSink {
    pub method: String,
    pub index: RawIndex,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RawTransfer {
    pub method: String,
    pub from: RawIndex,
    pub to: RawIndex,
    #[serde(default, rename = "type")]
    pub ty: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RawSanitizer {
    #[serde(default)]
    pub kind: Option<String>,
    pub method: String,
    pub index: RawIndex,
}

/// Index written as a bare integer or a string
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum RawIndex {
    Int(u64),
    Text(String),
}

impl fmt::Display for RawIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RawIndex::Int(i) => write!(f, "{i}"),
            RawIndex::Text(s) => write!(f, "{s}"),
        }
    }
}

/// Load and resolve a taint config file or directory
pub fn load_taint_config(program: &Program, path: &Path) -> ConfigResult<TaintConfig> {
    if !path.exists() {
        return Err(ConfigError::NotFound(path.to_path_buf()));
    }
    info!(path = %path.display(), "loading taint config");
    let files = if path.is_dir() {
        config_files(path)?
    } else {
        vec![path.to_path_buf()]
    };
    files.iter().try_fold(TaintConfig::default(), |merged, file| {
        let doc = read_document(file)?;
        let config = resolve_document(program, &doc).map_err(|e| e.in_file(file))?;
        Ok(merged.merge(config))
    })
}

fn config_files(dir: &Path) -> ConfigResult<Vec<PathBuf>> {
    let mut files = Vec::new();
    for entry in WalkDir::new(dir).sort_by_file_name() {
        let entry = entry.map_err(|e| ConfigError::Io {
            path: e.path().map_or_else(|| dir.to_path_buf(), Path::to_path_buf),
            source: e
                .into_io_error()
                .unwrap_or_else(|| std::io::Error::other("directory walk failed")),
        })?;
        if entry.file_type().is_file() && is_config_file(entry.path()) {
            files.push(entry.into_path());
        }
    }
    files.sort();
    Ok(files)
}

fn is_config_file(path: &Path) -> bool {
    matches!(
        path.extension().and_then(|e| e.to_str()),
        Some("yml" | "yaml" | "json")
    )
}

/// Parse one file; JSON by extension, YAML otherwise
pub fn read_document(path: &Path) -> ConfigResult<TaintDocument> {
    let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    parse_document(path, &text)
}

pub fn parse_document(path: &Path, text: &str) -> ConfigResult<TaintDocument> {
    if text.trim().is_empty() {
        return Ok(TaintDocument::default());
    }
    if path.extension().and_then(|e| e.to_str()) == Some("json") {
        serde_json::from_str(text).map_err(|source| ConfigError::Json {
            path: path.to_path_buf(),
            source,
        })
    } else {
        serde_yaml::from_str(text).map_err(|source| ConfigError::Yaml {
            path: path.to_path_buf(),
            source,
        })
    }
}

/// Resolve signatures and index references of one document
pub fn resolve_document(program: &Program, doc: &TaintDocument) -> ConfigResult<TaintConfig> {
    let mut config = TaintConfig {
        call_site_mode: doc.call_site_mode,
        ..TaintConfig::default()
    };
    for raw in &doc.sources {
        let source = match raw {
            RawSource::Call { method, index, ty } => {
                let Some(m) = find_method(program, "source", method) else {
                    continue;
                };
                let index = IndexRef::parse(program, m, &index.to_string())?;
                let ty = entry_type(program, ty.as_deref(), || index.value_type(program, m))?;
                Source::Call { method: m, index, ty }
            }
            RawSource::Param { method, index, ty } => {
                let Some(m) = find_method(program, "source", method) else {
                    continue;
                };
                let index = IndexRef::parse(program, m, &index.to_string())?;
                let ty = entry_type(program, ty.as_deref(), || index.value_type(program, m))?;
                Source::Param { method: m, index, ty }
            }
            RawSource::Field { field, ty } => {
                let Some(f) = program.field_by_signature(field) else {
                    warn!(field = %field, "source field not found, skipped");
                    continue;
                };
                let ty = entry_type(program, ty.as_deref(), || program.field(f).ty.clone())?;
                Source::Field { field: f, ty }
            }
        };
        config.sources.push(source);
    }
    for raw in &doc.sinks {
        if let Some(m) = find_method(program, "sink", &raw.method) {
            let index = IndexRef::parse(program, m, &raw.index.to_string())?;
            config.sinks.push(Sink { method: m, index });
        }
    }
    for raw in &doc.transfers {
        if let Some(m) = find_method(program, "transfer", &raw.method) {
            let from = IndexRef::parse(program, m, &raw.from.to_string())?;
            let to = IndexRef::parse(program, m, &raw.to.to_string())?;
            let ty = entry_type(program, raw.ty.as_deref(), || to.value_type(program, m))?;
            config.transfers.push(TaintTransfer {
                method: m,
                from,
                to,
                ty,
            });
        }
    }
    for raw in &doc.sanitizers {
        if let Some(kind) = raw.kind.as_deref().filter(|k| *k != "param") {
            warn!(kind = %kind, method = %raw.method, "unsupported sanitizer kind, skipped");
            continue;
        }
        if let Some(m) = find_method(program, "sanitizer", &raw.method) {
            let index = IndexRef::parse(program, m, &raw.index.to_string())?;
            config.sanitizers.push(ParamSanitizer {
                method: m,
                index: index.index,
            });
        }
    }
    Ok(config)
}

fn find_method(program: &Program, role: &str, signature: &str) -> Option<MethodId> {
    let method = program.method_by_signature(signature);
    if method.is_none() {
        warn!(role, signature = %signature, "taint config method not found, skipped");
    }
    method
}

fn entry_type(
    program: &Program,
    written: Option<&str>,
    default: impl FnOnce() -> Type,
) -> ConfigResult<Type> {
    match written {
        Some(name) => program
            .type_by_name(name)
            .ok_or_else(|| ConfigError::UnknownType(name.to_string())),
        None => Ok(default()),
    }
}
