//! Explicit exception propagation
//!
//! Objects reaching the operand of a `throw` are thrown at that statement.
//! A thrown object is delivered to the innermost handler whose catch type
//! admits it; otherwise it escapes the method and is re-thrown at every
//! call site of it, in the caller's context.

use super::{Commands, CsObjRef, Plugin};
use crate::features::points_to::domain::{
    CallEdge, CsMethodId, CsObjId, NamedResults, ObjId, PointerId, PointerKind, EXCEPTION,
};
use crate::features::points_to::infrastructure::points_to_set::PointsToSet;
use crate::features::points_to::infrastructure::solver_view::SolverView;
use crate::shared::models::{MethodId, Stmt, StmtRef, VarId};
use rustc_hash::FxHashMap;
use std::collections::{BTreeMap, BTreeSet};

/// Context-insensitive view of the exceptions found by the analysis
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ThrowResult {
    thrown: BTreeMap<StmtRef, BTreeSet<ObjId>>,
    uncaught: BTreeMap<MethodId, BTreeSet<ObjId>>,
}

impl ThrowResult {
    /// Objects thrown at `stmt` (a `throw` or an invoke whose callee
    /// lets them escape)
    pub fn thrown_at(&self, stmt: StmtRef) -> Vec<ObjId> {
        self.thrown.get(&stmt).map_or_else(Vec::new, |s| s.iter().copied().collect())
    }

    /// Objects escaping `method`
    pub fn uncaught_of(&self, method: MethodId) -> Vec<ObjId> {
        self.uncaught
            .get(&method)
            .map_or_else(Vec::new, |s| s.iter().copied().collect())
    }

    pub fn methods_with_uncaught(&self) -> impl Iterator<Item = MethodId> + '_ {
        self.uncaught.keys().copied()
    }
}

#[derive(Debug, Default)]
pub struct ExceptionModeler {
    throw_sites: FxHashMap<VarId, Vec<StmtRef>>,
    thrown: FxHashMap<(CsMethodId, StmtRef), PointsToSet>,
    uncaught: FxHashMap<CsMethodId, PointsToSet>,
}

impl ExceptionModeler {
    pub const ID: &'static str = "exception";

    /// Throw `objs` at `stmt` of `method` and follow them through
    /// handlers and call edges until nothing new escapes
    fn throw(
        &mut self,
        view: &SolverView<'_>,
        method: CsMethodId,
        stmt: StmtRef,
        objs: PointsToSet,
        out: &mut Commands,
    ) {
        let program = view.program();
        let mut work = vec![(method, stmt, objs)];
        while let Some((method, stmt, objs)) = work.pop() {
            let objs = self.thrown.entry((method, stmt)).or_default().add_all_diff(&objs);
            if objs.is_empty() {
                continue;
            }
            let (context, m) = view.cs_method(method);
            let mut escaping = PointsToSet::new();
            let handlers: Vec<_> = program
                .ir(m)
                .map(|ir| ir.handlers_of(stmt.index).collect())
                .unwrap_or_default();
            let mut caught: FxHashMap<VarId, Vec<CsObjRef>> = FxHashMap::default();
            for o in &objs {
                let ty = view.obj(o).ty.clone();
                let handler = handlers.iter().find(|h| {
                    h.catch_type
                        .as_ref()
                        .map_or(true, |catch| program.is_subtype(&ty, catch))
                });
                match handler {
                    Some(h) => caught.entry(h.var).or_default().push(CsObjRef::Cs(o)),
                    None => {
                        escaping.add(o);
                    }
                }
            }
            for (var, objs) in caught {
                out.add_var_points_to(context, var, objs);
            }
            let escaped = self.uncaught.entry(method).or_default().add_all_diff(&escaping);
            if escaped.is_empty() {
                continue;
            }
            for edge in view.call_graph().edges_into(method) {
                let (caller_ctx, site) = view.cs().cs_call_site(edge.call_site);
                if let Some(caller) = view.cs().find_method(caller_ctx, site.method) {
                    work.push((caller, site, escaped.clone()));
                }
            }
        }
    }
}

impl Plugin for ExceptionModeler {
    fn name(&self) -> &str {
        Self::ID
    }

    fn on_new_stmt(&mut self, view: &SolverView<'_>, stmt: StmtRef, _out: &mut Commands) {
        if let Some(Stmt::Throw { value }) = view.program().stmt(stmt) {
            self.throw_sites.entry(*value).or_default().push(stmt);
        }
    }

    fn on_new_points_to_set(
        &mut self,
        view: &SolverView<'_>,
        pointer: PointerId,
        diff: &PointsToSet,
        out: &mut Commands,
    ) {
        let PointerKind::Var { context, var } = view.cs().pointer(pointer) else {
            return;
        };
        let Some(sites) = self.throw_sites.get(&var).cloned() else {
            return;
        };
        for site in sites {
            if let Some(method) = view.cs().find_method(context, site.method) {
                self.throw(view, method, site, diff.clone(), out);
            }
        }
    }

    fn on_new_call_edge(&mut self, view: &SolverView<'_>, edge: &CallEdge, out: &mut Commands) {
        let Some(escaped) = self.uncaught.get(&edge.callee).filter(|s| !s.is_empty()).cloned() else {
            return;
        };
        let (caller_ctx, site) = view.cs().cs_call_site(edge.call_site);
        if let Some(caller) = view.cs().find_method(caller_ctx, site.method) {
            self.throw(view, caller, site, escaped, out);
        }
    }

    fn on_finish(&mut self, view: &SolverView<'_>, results: &mut NamedResults) {
        let project = |set: &PointsToSet| -> BTreeSet<ObjId> {
            set.iter().map(|o: CsObjId| view.cs_obj(o).1).collect()
        };
        let mut result = ThrowResult::default();
        for ((_, stmt), objs) in &self.thrown {
            result.thrown.entry(*stmt).or_default().extend(project(objs));
        }
        for (method, objs) in &self.uncaught {
            if objs.is_empty() {
                continue;
            }
            let (_, m) = view.cs_method(*method);
            result.uncaught.entry(m).or_default().extend(project(objs));
        }
        results.insert(EXCEPTION, result);
    }
}
