//! Wall-clock timing of the whole solve

use super::{Commands, Plugin};
use crate::features::points_to::domain::NamedResults;
use crate::features::points_to::infrastructure::solver_view::SolverView;
use std::time::Instant;
use tracing::info;

#[derive(Debug, Default)]
pub struct AnalysisTimer {
    started: Option<Instant>,
}

impl AnalysisTimer {
    pub const ID: &'static str = "analysis-timer";
}

impl Plugin for AnalysisTimer {
    fn name(&self) -> &str {
        Self::ID
    }

    fn on_start(&mut self, _view: &SolverView<'_>, _out: &mut Commands) {
        self.started = Some(Instant::now());
    }

    fn on_finish(&mut self, _view: &SolverView<'_>, _results: &mut NamedResults) {
        if let Some(started) = self.started.take() {
            let elapsed = started.elapsed();
            info!(elapsed_ms = elapsed.as_millis() as u64, "pointer analysis elapsed time");
        }
    }
}
