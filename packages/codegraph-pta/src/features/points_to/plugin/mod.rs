//! Plugin chain
//!
//! Plugins observe the solve through callbacks (all default no-ops) and
//! feed constraints back as [`Commands`]. [`CompositePlugin`] fans every
//! callback out in registration order.
//!
//! Built-in order:
//! 1. `analysis-timer` (first, so it times everything else)
//! 2. `entry-point`
//! 3. `class-initializer`
//! 4. `thread`
//! 5. `native`
//! 6. `exception`
//! 7. `reflection` (optional)
//! 8. `taint` (optional)
//! 9. extra plugins by id (`null-handler`, `number-literal`, ...)
//! 10. `result-processor` (always last)

pub mod class_initializer;
pub mod command;
pub mod entry_point;
pub mod exception;
pub mod invoke_model;
pub mod literal;
pub mod native;
pub mod reflection;
pub mod registry;
pub mod result_processor;
pub mod thread;
pub mod timer;

pub use command::{Commands, CsObjRef, PointerRef, SolverCommand};
pub use registry::{PluginFactory, PluginRegistry, PluginSetup};

use crate::features::points_to::domain::{
    CallEdge, ContextId, CsMethodId, CsObjId, NamedResults, PointerId,
};
use crate::features::points_to::infrastructure::points_to_set::PointsToSet;
use crate::features::points_to::infrastructure::solver_view::{PhaseScope, SolverView};
use crate::shared::models::{MethodId, StmtRef};

pub trait Plugin {
    /// Registry id
    fn name(&self) -> &str;

    fn on_start(&mut self, _view: &SolverView<'_>, _out: &mut Commands) {}

    /// `diff` just arrived at `pointer`
    fn on_new_points_to_set(
        &mut self,
        _view: &SolverView<'_>,
        _pointer: PointerId,
        _diff: &PointsToSet,
        _out: &mut Commands,
    ) {
    }

    /// `method` became reachable for the first time (in any context)
    fn on_new_method(&mut self, _view: &SolverView<'_>, _method: MethodId, _out: &mut Commands) {}

    /// A statement of a newly reachable method
    fn on_new_stmt(&mut self, _view: &SolverView<'_>, _stmt: StmtRef, _out: &mut Commands) {}

    fn on_new_cs_method(
        &mut self,
        _view: &SolverView<'_>,
        _method: CsMethodId,
        _out: &mut Commands,
    ) {
    }

    /// Dispatch at `call_site` found no target (`recv` is `None` for
    /// static calls)
    fn on_unresolved_call(
        &mut self,
        _view: &SolverView<'_>,
        _recv: Option<CsObjId>,
        _context: ContextId,
        _call_site: StmtRef,
        _out: &mut Commands,
    ) {
    }

    fn on_new_call_edge(&mut self, _view: &SolverView<'_>, _edge: &CallEdge, _out: &mut Commands) {}

    /// The worklist drained; the only point where points-to sets may shrink
    fn on_phase_finish(&mut self, _scope: &mut PhaseScope<'_>, _out: &mut Commands) {}

    fn on_finish(&mut self, _view: &SolverView<'_>, _results: &mut NamedResults) {}
}

/// Ordered fan-out over plugins
#[derive(Default)]
pub struct CompositePlugin {
    plugins: Vec<Box<dyn Plugin>>,
}

impl CompositePlugin {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, plugin: Box<dyn Plugin>) {
        self.plugins.push(plugin);
    }

    pub fn ids(&self) -> Vec<&str> {
        self.plugins.iter().map(|p| p.name()).collect()
    }

    pub fn len(&self) -> usize {
        self.plugins.len()
    }

    pub fn is_empty(&self) -> bool {
        self.plugins.is_empty()
    }
}

impl Plugin for CompositePlugin {
    fn name(&self) -> &str {
        "composite"
    }

    fn on_start(&mut self, view: &SolverView<'_>, out: &mut Commands) {
        for p in &mut self.plugins {
            p.on_start(view, out);
        }
    }

    fn on_new_points_to_set(
        &mut self,
        view: &SolverView<'_>,
        pointer: PointerId,
        diff: &PointsToSet,
        out: &mut Commands,
    ) {
        for p in &mut self.plugins {
            p.on_new_points_to_set(view, pointer, diff, out);
        }
    }

    fn on_new_method(&mut self, view: &SolverView<'_>, method: MethodId, out: &mut Commands) {
        for p in &mut self.plugins {
            p.on_new_method(view, method, out);
        }
    }

    fn on_new_stmt(&mut self, view: &SolverView<'_>, stmt: StmtRef, out: &mut Commands) {
        for p in &mut self.plugins {
            p.on_new_stmt(view, stmt, out);
        }
    }

    fn on_new_cs_method(&mut self, view: &SolverView<'_>, method: CsMethodId, out: &mut Commands) {
        for p in &mut self.plugins {
            p.on_new_cs_method(view, method, out);
        }
    }

    fn on_unresolved_call(
        &mut self,
        view: &SolverView<'_>,
        recv: Option<CsObjId>,
        context: ContextId,
        call_site: StmtRef,
        out: &mut Commands,
    ) {
        for p in &mut self.plugins {
            p.on_unresolved_call(view, recv, context, call_site, out);
        }
    }

    fn on_new_call_edge(&mut self, view: &SolverView<'_>, edge: &CallEdge, out: &mut Commands) {
        for p in &mut self.plugins {
            p.on_new_call_edge(view, edge, out);
        }
    }

    fn on_phase_finish(&mut self, scope: &mut PhaseScope<'_>, out: &mut Commands) {
        for p in &mut self.plugins {
            p.on_phase_finish(scope, out);
        }
    }

    fn on_finish(&mut self, view: &SolverView<'_>, results: &mut NamedResults) {
        for p in &mut self.plugins {
            p.on_finish(view, results);
        }
    }
}
