//! Taint sources
//!
//! - call sources taint the value at their index of every call edge into
//!   the source method
//! - parameter sources taint a parameter of every context of the method
//! - field sources taint the result of every reachable load of the field
//!
//! Array (`[*]`) and field (`.f`) indexes taint the elements or field of
//! each object the indexed variable points to, as those objects arrive.

use super::taint_manager::TaintManager;
use crate::features::points_to::domain::{
    CallEdge, CallKind, ContextId, CsMethodId, ObjId, PointerId, PointerKind,
};
use crate::features::points_to::infrastructure::{PointsToSet, SolverView};
use crate::features::points_to::plugin::{Commands, CsObjRef, PointerRef};
use crate::features::taint_analysis::domain::{IndexKind, IndexRef, Source, SourcePoint};
use crate::shared::models::{FieldId, MethodId, Stmt, StmtRef, Type, VarId};
use rustc_hash::FxHashMap;

#[derive(Debug, Default)]
pub struct SourceHandler {
    call_sources: FxHashMap<MethodId, Vec<(IndexRef, Type)>>,
    param_sources: FxHashMap<MethodId, Vec<(IndexRef, Type)>>,
    field_sources: FxHashMap<FieldId, Type>,
    /// Field loads of source fields, per containing method
    source_loads: FxHashMap<MethodId, Vec<(StmtRef, VarId, FieldId)>>,
    /// Taint waiting for the objects of a variable: (kind, taint object)
    pending: FxHashMap<(ContextId, VarId), Vec<(IndexKind, ObjId)>>,
}

impl SourceHandler {
    pub fn new(sources: &[Source]) -> Self {
        let mut handler = Self::default();
        for source in sources {
            match source {
                Source::Call { method, index, ty } => handler
                    .call_sources
                    .entry(*method)
                    .or_default()
                    .push((*index, ty.clone())),
                Source::Param { method, index, ty } => handler
                    .param_sources
                    .entry(*method)
                    .or_default()
                    .push((*index, ty.clone())),
                Source::Field { field, ty } => {
                    handler.field_sources.insert(*field, ty.clone());
                }
            }
        }
        handler
    }

    pub fn on_new_stmt(&mut self, view: &SolverView<'_>, stmt: StmtRef) {
        if self.field_sources.is_empty() {
            return;
        }
        if let Some(Stmt::LoadField { lhs, field, .. }) = view.program().stmt(stmt) {
            if self.field_sources.contains_key(field) {
                self.source_loads
                    .entry(stmt.method)
                    .or_default()
                    .push((stmt, *lhs, *field));
            }
        }
    }

    pub fn on_new_call_edge(
        &mut self,
        view: &SolverView<'_>,
        manager: &mut TaintManager,
        edge: &CallEdge,
        out: &mut Commands,
    ) {
        if edge.kind == CallKind::Other {
            return;
        }
        let (_, callee) = view.cs_method(edge.callee);
        let Some(sources) = self.call_sources.get(&callee).cloned() else {
            return;
        };
        let (context, site) = view.cs().cs_call_site(edge.call_site);
        let Some(invoke) = view.program().stmt(site).and_then(|s| s.as_invoke()) else {
            return;
        };
        for (index, ty) in sources {
            let Some(var) = index.index.call_var(invoke) else {
                continue;
            };
            let point = SourcePoint::Call {
                call_site: site,
                index,
            };
            let taint = manager.make_taint(view.heap(), point, ty);
            self.taint(view, context, var, index.kind, taint, out);
        }
    }

    pub fn on_new_cs_method(
        &mut self,
        view: &SolverView<'_>,
        manager: &mut TaintManager,
        method: CsMethodId,
        out: &mut Commands,
    ) {
        let (context, method) = view.cs_method(method);
        if let Some(sources) = self.param_sources.get(&method).cloned() {
            if let Some(ir) = view.program().ir(method) {
                for (index, ty) in sources {
                    let Some(var) = index.index.param_var(ir) else {
                        continue;
                    };
                    let point = SourcePoint::Param { method, index };
                    let taint = manager.make_taint(view.heap(), point, ty);
                    self.taint(view, context, var, index.kind, taint, out);
                }
            }
        }
        if let Some(loads) = self.source_loads.get(&method) {
            for &(load, lhs, field) in loads {
                let Some(ty) = self.field_sources.get(&field).cloned() else {
                    continue;
                };
                let taint = manager.make_taint(view.heap(), SourcePoint::Field { load, field }, ty);
                out.add_var_obj(context, lhs, taint);
            }
        }
    }

    pub fn on_new_points_to_set(
        &mut self,
        view: &SolverView<'_>,
        pointer: PointerId,
        diff: &PointsToSet,
        out: &mut Commands,
    ) {
        if self.pending.is_empty() {
            return;
        }
        let PointerKind::Var { context, var } = view.cs().pointer(pointer) else {
            return;
        };
        if let Some(pending) = self.pending.get(&(context, var)) {
            for &(kind, taint) in pending {
                taint_objects(diff, kind, taint, out);
            }
        }
    }

    fn taint(
        &mut self,
        view: &SolverView<'_>,
        context: ContextId,
        var: VarId,
        kind: IndexKind,
        taint: ObjId,
        out: &mut Commands,
    ) {
        if kind == IndexKind::Var {
            out.add_var_obj(context, var, taint);
            return;
        }
        let pending = self.pending.entry((context, var)).or_default();
        if pending.contains(&(kind, taint)) {
            return;
        }
        pending.push((kind, taint));
        if let Some(pts) = view.var_points_to(context, var) {
            taint_objects(pts, kind, taint, out);
        }
    }
}

/// Put `taint` into the elements or field of each object of `objs`
fn taint_objects(objs: &PointsToSet, kind: IndexKind, taint: ObjId, out: &mut Commands) {
    for o in objs {
        let pointer = match kind {
            IndexKind::Var => continue,
            IndexKind::Array => PointerRef::ArrayIndex {
                array: CsObjRef::Cs(o),
            },
            IndexKind::Field(field) => PointerRef::InstanceField {
                base: CsObjRef::Cs(o),
                field,
            },
        };
        out.add_points_to(pointer, vec![CsObjRef::empty(taint)]);
    }
}
