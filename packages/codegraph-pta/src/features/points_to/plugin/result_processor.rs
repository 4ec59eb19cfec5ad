//! Soundness warnings and final statistics

use super::{Commands, Plugin};
use crate::features::points_to::domain::{ContextId, CsObjId, NamedResults, SOUNDNESS_WARNINGS};
use crate::features::points_to::infrastructure::solver_view::SolverView;
use crate::shared::models::StmtRef;
use serde::Serialize;
use std::collections::BTreeSet;
use tracing::{info, warn};

/// A call site whose target could not be resolved
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct SoundnessWarning {
    pub call_site: StmtRef,
    /// Signature of the method the call site names
    pub callee: String,
    /// Runtime type of the receiver, `None` for static calls
    pub receiver_type: Option<String>,
}

#[derive(Debug, Default)]
pub struct ResultProcessor {
    warnings: BTreeSet<SoundnessWarning>,
}

impl ResultProcessor {
    pub const ID: &'static str = "result-processor";
}

impl Plugin for ResultProcessor {
    fn name(&self) -> &str {
        Self::ID
    }

    fn on_unresolved_call(
        &mut self,
        view: &SolverView<'_>,
        recv: Option<CsObjId>,
        _context: ContextId,
        call_site: StmtRef,
        _out: &mut Commands,
    ) {
        let program = view.program();
        let Some(invoke) = program.stmt(call_site).and_then(|s| s.as_invoke()) else {
            return;
        };
        let mref = &invoke.method_ref;
        let callee = format!("<{}: {}>", program.class(mref.class).name, mref.subsignature);
        let receiver_type = recv.map(|o| program.type_name(&view.obj(o).ty));
        self.warnings.insert(SoundnessWarning {
            call_site,
            callee,
            receiver_type,
        });
    }

    fn on_finish(&mut self, view: &SolverView<'_>, results: &mut NamedResults) {
        if !self.warnings.is_empty() {
            warn!(
                count = self.warnings.len(),
                "unresolved call sites; results may be unsound there"
            );
        }
        let cs = view.cs();
        info!(
            reachable_methods = view.call_graph().reachable_count(),
            call_edges = view.call_graph().edge_count(),
            cs_objects = cs.obj_count(),
            pointers = cs.pointer_count(),
            pfg_edges = view.pfg().len(),
            "pointer analysis statistics"
        );
        let warnings: Vec<SoundnessWarning> = std::mem::take(&mut self.warnings).into_iter().collect();
        results.insert(SOUNDNESS_WARNINGS, warnings);
    }
}
