//! Analysis configuration
//!
//! ```text
//! let config = PtaConfig::default()
//!     .with_cs("2-obj")
//!     .with_taint_config("taint/")
//!     .with_plugin("null-handler");
//! config.validate()?;
//! ```
//!
//! Options can also be loaded from YAML:
//!
//! ```yaml
//! cs: 2-type
//! advanced: zipper
//! reflection: true
//! taint-config: config/taint
//! ```

pub mod error;

pub use error::{ConfigError, ConfigResult};

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

/// Options of one pointer analysis run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields, rename_all = "kebab-case")]
pub struct PtaConfig {
    /// Context sensitivity variant (`ci`, `<k>-call`, `<k>-obj`, `<k>-type`)
    pub cs: String,
    /// Optional pre-analysis (`collection`, `scaler`, `zipper`)
    pub advanced: Option<String>,
    /// Extra plugin ids, appended before the result processor
    pub plugins: Vec<String>,
    /// Taint config file or directory; enables the taint plugin
    pub taint_config: Option<PathBuf>,
    /// Model JVM bootstrap (thread groups, main thread, system init)
    pub implicit_entries: bool,
    /// Enable the reflection plugin
    pub reflection: bool,
    /// Merge `new String`/`StringBuilder`/`StringBuffer` allocations per type
    pub merge_string_objects: bool,
    /// Entry method signatures; empty means the program's `main`
    pub entry_methods: Vec<String>,
    /// Force taint call-site mode regardless of the taint documents
    pub call_site_mode: bool,
}

impl Default for PtaConfig {
    fn default() -> Self {
        Self {
            cs: "ci".to_string(),
            advanced: None,
            plugins: Vec::new(),
            taint_config: None,
            implicit_entries: true,
            reflection: false,
            merge_string_objects: true,
            entry_methods: Vec::new(),
            call_site_mode: false,
        }
    }
}

impl PtaConfig {
    pub fn from_yaml(path: impl AsRef<Path>) -> ConfigResult<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        serde_yaml::from_str(&text).map_err(|source| ConfigError::Yaml {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn from_yaml_str(text: &str) -> ConfigResult<Self> {
        serde_yaml::from_str(text).map_err(|source| ConfigError::Yaml {
            path: PathBuf::from("<inline>"),
            source,
        })
    }

    pub fn with_cs(mut self, cs: impl Into<String>) -> Self {
        self.cs = cs.into();
        self
    }

    pub fn with_advanced(mut self, advanced: impl Into<String>) -> Self {
        self.advanced = Some(advanced.into());
        self
    }

    pub fn with_plugin(mut self, id: impl Into<String>) -> Self {
        self.plugins.push(id.into());
        self
    }

    pub fn with_taint_config(mut self, path: impl Into<PathBuf>) -> Self {
        self.taint_config = Some(path.into());
        self
    }

    pub fn with_implicit_entries(mut self, enabled: bool) -> Self {
        self.implicit_entries = enabled;
        self
    }

    pub fn with_reflection(mut self, enabled: bool) -> Self {
        self.reflection = enabled;
        self
    }

    pub fn with_merge_string_objects(mut self, enabled: bool) -> Self {
        self.merge_string_objects = enabled;
        self
    }

    pub fn with_entry_method(mut self, signature: impl Into<String>) -> Self {
        self.entry_methods.push(signature.into());
        self
    }

    pub fn with_call_site_mode(mut self, enabled: bool) -> Self {
        self.call_site_mode = enabled;
        self
    }

    pub fn context_spec(&self) -> ConfigResult<ContextSpec> {
        self.cs.parse()
    }

    pub fn advanced_analysis(&self) -> ConfigResult<Option<AdvancedAnalysis>> {
        self.advanced.as_deref().map(str::parse).transpose()
    }

    /// Check option values that do not need the program
    pub fn validate(&self) -> ConfigResult<()> {
        self.context_spec()?;
        self.advanced_analysis()?;
        if let Some(dup) = first_duplicate(&self.plugins) {
            return Err(ConfigError::Validation(format!(
                "plugin '{dup}' listed more than once"
            )));
        }
        Ok(())
    }
}

fn first_duplicate(items: &[String]) -> Option<&str> {
    items
        .iter()
        .enumerate()
        .find(|(i, item)| items[..*i].contains(item))
        .map(|(_, item)| item.as_str())
}

/// Parsed context sensitivity variant
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ContextSpec {
    Insensitive,
    CallSite(usize),
    Object(usize),
    Type(usize),
}

impl ContextSpec {
    /// Maximum context length produced for methods
    pub fn limit(self) -> usize {
        match self {
            ContextSpec::Insensitive => 0,
            ContextSpec::CallSite(k) | ContextSpec::Object(k) | ContextSpec::Type(k) => k,
        }
    }
}

impl FromStr for ContextSpec {
    type Err = ConfigError;

    fn from_str(s: &str) -> ConfigResult<Self> {
        let unknown = || ConfigError::UnknownSelector(s.to_string());
        if s == "ci" {
            return Ok(ContextSpec::Insensitive);
        }
        let (k, kind) = s.split_once('-').ok_or_else(unknown)?;
        let k: usize = k.parse().map_err(|_| unknown())?;
        if k == 0 {
            return Ok(ContextSpec::Insensitive);
        }
        match kind {
            "call" | "cfa" => Ok(ContextSpec::CallSite(k)),
            "obj" => Ok(ContextSpec::Object(k)),
            "type" => Ok(ContextSpec::Type(k)),
            _ => Err(unknown()),
        }
    }
}

impl fmt::Display for ContextSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ContextSpec::Insensitive => write!(f, "ci"),
            ContextSpec::CallSite(k) => write!(f, "{k}-call"),
            ContextSpec::Object(k) => write!(f, "{k}-obj"),
            ContextSpec::Type(k) => write!(f, "{k}-type"),
        }
    }
}

/// Pre-analysis refining the main run's selector
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AdvancedAnalysis {
    /// Context sensitivity only for collection/map library methods
    Collection,
    /// Per-method variant chosen by a points-to volume cost model
    Scaler,
    /// Context sensitivity only for precision-critical methods
    Zipper,
}

impl FromStr for AdvancedAnalysis {
    type Err = ConfigError;

    fn from_str(s: &str) -> ConfigResult<Self> {
        match s {
            "collection" => Ok(AdvancedAnalysis::Collection),
            "scaler" => Ok(AdvancedAnalysis::Scaler),
            "zipper" => Ok(AdvancedAnalysis::Zipper),
            _ => Err(ConfigError::UnknownAdvanced(s.to_string())),
        }
    }
}
