//! Casts that may throw `ClassCastException`

use crate::features::points_to::application::PointerAnalysisResult;
use crate::shared::models::{Program, Stmt, StmtRef};
use tracing::info;

/// Reachable casts whose source variable may point to an object that is
/// not a subtype of the cast type, sorted
pub fn may_fail_casts(program: &Program, result: &PointerAnalysisResult<'_>) -> Vec<StmtRef> {
    let mut casts = Vec::new();
    let mut total = 0usize;
    for method in result.reachable_methods() {
        let Some(ir) = program.ir(method) else {
            continue;
        };
        for (index, stmt) in ir.stmts.iter().enumerate() {
            let Stmt::Cast { rhs, ty, .. } = stmt else {
                continue;
            };
            total += 1;
            let fails = result
                .points_to_set(*rhs)
                .into_iter()
                .any(|obj| !program.is_subtype(&result.obj(obj).ty, ty));
            if fails {
                casts.push(StmtRef::new(method, index));
            }
        }
    }
    casts.sort();
    info!(casts = total, may_fail = casts.len(), "may-fail-cast finished");
    casts
}
