//! Domain-specific assertions over analysis results

use codegraph_pta::shared::models::{MethodId, StmtRef, VarId};
use codegraph_pta::PointerAnalysisResult;

pub fn assert_points_to_count(result: &PointerAnalysisResult<'_>, var: VarId, expected: usize) {
    let pts = result.points_to_set(var);
    assert_eq!(
        pts.len(),
        expected,
        "Expected |pts({var})| = {expected}, got {}: {:?}",
        pts.len(),
        pts.iter()
            .map(|o| result.obj(*o).describe(result.program()))
            .collect::<Vec<_>>()
    );
}

/// Callees at `site`, sorted
pub fn callees_at(result: &PointerAnalysisResult<'_>, site: StmtRef) -> Vec<MethodId> {
    result.method_call_graph().callees_at(site)
}

pub fn assert_reachable(result: &PointerAnalysisResult<'_>, method: MethodId) {
    assert!(
        result.is_reachable(method),
        "Expected {} to be reachable",
        result.program().method_signature(method)
    );
}

pub fn assert_unreachable(result: &PointerAnalysisResult<'_>, method: MethodId) {
    assert!(
        !result.is_reachable(method),
        "Expected {} to be unreachable",
        result.program().method_signature(method)
    );
}
