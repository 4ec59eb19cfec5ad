//! Pointer analysis driver
//!
//! # Usage
//! ```text
//! use codegraph_pta::{PointerAnalysis, PtaConfig};
//!
//! let config = PtaConfig::default().with_cs("2-obj");
//! let result = PointerAnalysis::new(&program, config).analyze()?;
//! let objs = result.points_to_set(var);
//! ```
//!
//! Every run is hermetic: heap model, contexts, interning tables and
//! plugins are rebuilt from scratch, including for pre-analyses.

use super::pre_analysis::{collection_methods, scaler_choices, zipper_methods, SCALER_BUDGET};
use super::result::PointerAnalysisResult;
use crate::config::{AdvancedAnalysis, ContextSpec, PtaConfig};
use crate::errors::Result;
use crate::features::points_to::domain::HeapModel;
use crate::features::points_to::infrastructure::{
    make_selector, ContextSelector, GuidedSelector, SelectiveSelector, Solver,
};
use crate::features::points_to::plugin::{PluginRegistry, PluginSetup};
use crate::shared::models::Program;
use tracing::info;

pub struct PointerAnalysis<'p> {
    program: &'p Program,
    config: PtaConfig,
    registry: PluginRegistry,
}

impl<'p> PointerAnalysis<'p> {
    pub fn new(program: &'p Program, config: PtaConfig) -> Self {
        Self {
            program,
            config,
            registry: PluginRegistry::with_builtins(),
        }
    }

    /// Replace the registry extra plugin ids are looked up in
    pub fn with_registry(mut self, registry: PluginRegistry) -> Self {
        self.registry = registry;
        self
    }

    pub fn config(&self) -> &PtaConfig {
        &self.config
    }

    pub fn analyze(&self) -> Result<PointerAnalysisResult<'p>> {
        self.config.validate()?;
        let spec = self.config.context_spec()?;
        let advanced = self.config.advanced_analysis()?;
        info!(
            cs = %spec,
            advanced = ?advanced,
            plugins = ?self.config.plugins,
            "starting pointer analysis"
        );
        let selector: Box<dyn ContextSelector> = match advanced {
            None => make_selector(spec),
            Some(AdvancedAnalysis::Collection) => Box::new(SelectiveSelector::new(
                make_selector(spec),
                collection_methods(self.program),
            )),
            Some(AdvancedAnalysis::Scaler) => {
                let ci = self.pre_analysis()?;
                Box::new(GuidedSelector::new(
                    scaler_choices(self.program, &ci, SCALER_BUDGET),
                    ContextSpec::Insensitive,
                ))
            }
            Some(AdvancedAnalysis::Zipper) => {
                let ci = self.pre_analysis()?;
                Box::new(SelectiveSelector::new(
                    make_selector(spec),
                    zipper_methods(self.program, &ci),
                ))
            }
        };
        self.solve(&self.config, selector)
    }

    /// Context-insensitive run without taint or pre-analysis
    fn pre_analysis(&self) -> Result<PointerAnalysisResult<'p>> {
        let config = PtaConfig {
            cs: ContextSpec::Insensitive.to_string(),
            advanced: None,
            taint_config: None,
            ..self.config.clone()
        };
        info!("running context-insensitive pre-analysis");
        self.solve(&config, make_selector(ContextSpec::Insensitive))
    }

    fn solve(
        &self,
        config: &PtaConfig,
        selector: Box<dyn ContextSelector>,
    ) -> Result<PointerAnalysisResult<'p>> {
        let setup = PluginSetup {
            program: self.program,
            config,
        };
        let plugin = self.registry.build_chain(&setup)?;
        let heap = HeapModel::new(self.program, config.merge_string_objects);
        Ok(Solver::new(self.program, config.clone(), heap, selector, plugin).solve())
    }
}
