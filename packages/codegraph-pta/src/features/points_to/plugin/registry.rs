//! Plugin registry
//!
//! Maps plugin ids to factories and assembles the chain in its fixed
//! order. Unknown ids surface as [`ConfigError::UnknownPlugin`] before the
//! solve starts.

use super::class_initializer::ClassInitializer;
use super::entry_point::EntryPointHandler;
use super::exception::ExceptionModeler;
use super::literal::{NullHandler, NumberLiteralHandler};
use super::native::NativeModeler;
use super::reflection::ReflectionModeler;
use super::result_processor::ResultProcessor;
use super::thread::ThreadHandler;
use super::timer::AnalysisTimer;
use super::{CompositePlugin, Plugin};
use crate::config::{ConfigError, PtaConfig};
use crate::errors::Result;
use crate::features::taint_analysis::TaintAnalysis;
use crate::shared::models::Program;
use std::collections::BTreeMap;
use tracing::debug;

/// What a factory may look at while constructing its plugin
#[derive(Clone, Copy)]
pub struct PluginSetup<'p> {
    pub program: &'p Program,
    pub config: &'p PtaConfig,
}

pub type PluginFactory = fn(&PluginSetup<'_>) -> Result<Box<dyn Plugin>>;

#[derive(Clone)]
pub struct PluginRegistry {
    factories: BTreeMap<String, PluginFactory>,
}

impl Default for PluginRegistry {
    fn default() -> Self {
        Self::with_builtins()
    }
}

impl PluginRegistry {
    /// Registry without any factories
    pub fn empty() -> Self {
        Self {
            factories: BTreeMap::new(),
        }
    }

    /// Registry with the optional built-ins that can be requested by id
    pub fn with_builtins() -> Self {
        let mut registry = Self::empty();
        registry.register(NullHandler::ID, |_| Ok(Box::new(NullHandler::default())));
        registry.register(NumberLiteralHandler::ID, |_| {
            Ok(Box::new(NumberLiteralHandler::default()))
        });
        registry
    }

    pub fn register(&mut self, id: impl Into<String>, factory: PluginFactory) {
        self.factories.insert(id.into(), factory);
    }

    pub fn contains(&self, id: &str) -> bool {
        self.factories.contains_key(id)
    }

    pub fn ids(&self) -> impl Iterator<Item = &str> + '_ {
        self.factories.keys().map(String::as_str)
    }

    pub fn create(&self, id: &str, setup: &PluginSetup<'_>) -> Result<Box<dyn Plugin>> {
        let factory = self.factories.get(id).ok_or_else(|| ConfigError::UnknownPlugin {
            id: id.to_string(),
            registered: self.factories.keys().cloned().collect(),
        })?;
        debug!(plugin = %id, "constructing plugin");
        factory(setup)
    }

    /// Assemble the full chain for one run
    pub fn build_chain(&self, setup: &PluginSetup<'_>) -> Result<CompositePlugin> {
        let program = setup.program;
        let config = setup.config;
        let mut chain = CompositePlugin::new();
        chain.add(Box::new(AnalysisTimer::default()));
        chain.add(Box::new(EntryPointHandler::new(program, config)));
        chain.add(Box::new(ClassInitializer::default()));
        chain.add(Box::new(ThreadHandler::new(program)));
        chain.add(Box::new(NativeModeler::new(program)));
        chain.add(Box::new(ExceptionModeler::default()));
        if config.reflection {
            chain.add(Box::new(ReflectionModeler::new(program)));
        }
        if config.taint_config.is_some() {
            chain.add(Box::new(TaintAnalysis::from_config(program, config)?));
        }
        for id in &config.plugins {
            chain.add(self.create(id, setup)?);
        }
        chain.add(Box::new(ResultProcessor::default()));
        Ok(chain)
    }
}
