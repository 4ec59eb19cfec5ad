//! Taint analysis as a solver plugin
//!
//! Taint objects are ordinary mock objects, so they ride the pointer flow
//! graph like any allocation. The plugin only decides where they are born
//! (sources), how they cross library calls (transfers), where they are
//! dropped (sanitizers) and, after the fixed point, where they end up
//! (sinks).
//!
//! Results land under [`TAINT_FLOWS`] as a `BTreeSet<TaintFlow>`.

use crate::config::PtaConfig;
use crate::errors::Result;
use crate::features::points_to::domain::{CallEdge, CsMethodId, NamedResults, PointerId, TAINT_FLOWS};
use crate::features::points_to::infrastructure::{PointsToSet, SolverView};
use crate::features::points_to::plugin::{Commands, Plugin};
use crate::features::taint_analysis::domain::TaintConfig;
use crate::features::taint_analysis::infrastructure::{
    load_taint_config, SanitizerHandler, SinkHandler, SourceHandler, TaintManager,
    TransferHandler,
};
use crate::shared::models::{Program, StmtRef};
use tracing::{info, warn};

pub struct TaintAnalysis {
    manager: TaintManager,
    sources: SourceHandler,
    transfers: TransferHandler,
    sanitizers: SanitizerHandler,
    sinks: SinkHandler,
}

impl TaintAnalysis {
    pub const ID: &'static str = "taint";

    pub fn new(config: TaintConfig) -> Self {
        Self {
            manager: TaintManager::new(),
            sources: SourceHandler::new(&config.sources),
            transfers: TransferHandler::new(&config.transfers),
            sanitizers: SanitizerHandler::new(&config.sanitizers),
            sinks: SinkHandler::new(&config),
        }
    }

    /// Load the taint config named by `config`; the analysis-level
    /// call-site mode switch is ORed into the loaded one
    pub fn from_config(program: &Program, config: &PtaConfig) -> Result<Self> {
        let mut taint = match &config.taint_config {
            Some(path) => load_taint_config(program, path)?,
            None => TaintConfig::default(),
        };
        taint.call_site_mode |= config.call_site_mode;
        if taint.is_empty() {
            warn!("taint config has no sources, sinks, transfers or sanitizers");
        }
        info!(
            sources = taint.sources.len(),
            sinks = taint.sinks.len(),
            transfers = taint.transfers.len(),
            sanitizers = taint.sanitizers.len(),
            call_site_mode = taint.call_site_mode,
            "taint config loaded"
        );
        Ok(Self::new(taint))
    }
}

impl Plugin for TaintAnalysis {
    fn name(&self) -> &str {
        Self::ID
    }

    fn on_new_stmt(&mut self, view: &SolverView<'_>, stmt: StmtRef, _out: &mut Commands) {
        self.sources.on_new_stmt(view, stmt);
    }

    fn on_new_cs_method(&mut self, view: &SolverView<'_>, method: CsMethodId, out: &mut Commands) {
        self.sources.on_new_cs_method(view, &mut self.manager, method, out);
        self.sanitizers.on_new_cs_method(view, method, out);
    }

    fn on_new_call_edge(&mut self, view: &SolverView<'_>, edge: &CallEdge, out: &mut Commands) {
        self.sources.on_new_call_edge(view, &mut self.manager, edge, out);
        self.transfers.on_new_call_edge(view, edge, out);
    }

    fn on_new_points_to_set(
        &mut self,
        view: &SolverView<'_>,
        pointer: PointerId,
        diff: &PointsToSet,
        out: &mut Commands,
    ) {
        self.sources.on_new_points_to_set(view, pointer, diff, out);
        self.transfers.on_new_points_to_set(view, pointer, diff, out);
    }

    fn on_finish(&mut self, view: &SolverView<'_>, results: &mut NamedResults) {
        let flows = self.sinks.collect(view, &self.manager);
        info!(
            taint_objects = self.manager.source_count(),
            flows = flows.len(),
            "taint analysis finished"
        );
        results.insert(TAINT_FLOWS, flows);
    }
}
