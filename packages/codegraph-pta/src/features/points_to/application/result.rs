//! Read-only view of a finished pointer analysis
//!
//! Owns everything the solver built (heap, contexts, interning tables,
//! PFG, call graphs) plus the named sub-results plugins stored in
//! `on_finish`. Context-insensitive queries project CS facts onto plain
//! variables and objects.

use crate::features::points_to::domain::{
    ContextId, ContextTable, CsObjId, HeapModel, NamedResults, Obj, ObjId, PointerKind,
};
use crate::features::points_to::infrastructure::{
    CsCallGraph, CsManager, MethodCallGraph, PointerFlowGraph, PointsToSet, SolverStats,
};
use crate::shared::models::{FieldId, MethodId, Program, VarId};
use std::any::Any;
use std::collections::BTreeSet;
use std::fmt;
use std::rc::Rc;

pub struct PointerAnalysisResult<'p> {
    program: &'p Program,
    heap: HeapModel,
    contexts: ContextTable,
    cs: CsManager,
    pfg: PointerFlowGraph,
    call_graph: CsCallGraph,
    method_call_graph: MethodCallGraph,
    results: NamedResults,
    selector: String,
    stats: SolverStats,
}

impl<'p> PointerAnalysisResult<'p> {
    #[allow(clippy::too_many_arguments)]
    pub(crate) fn new(
        program: &'p Program,
        heap: HeapModel,
        contexts: ContextTable,
        cs: CsManager,
        pfg: PointerFlowGraph,
        call_graph: CsCallGraph,
        method_call_graph: MethodCallGraph,
        results: NamedResults,
        selector: String,
        stats: SolverStats,
    ) -> Self {
        Self {
            program,
            heap,
            contexts,
            cs,
            pfg,
            call_graph,
            method_call_graph,
            results,
            selector,
            stats,
        }
    }

    pub fn program(&self) -> &'p Program {
        self.program
    }

    pub fn heap(&self) -> &HeapModel {
        &self.heap
    }

    pub fn contexts(&self) -> &ContextTable {
        &self.contexts
    }

    pub fn cs(&self) -> &CsManager {
        &self.cs
    }

    pub fn pfg(&self) -> &PointerFlowGraph {
        &self.pfg
    }

    pub fn stats(&self) -> &SolverStats {
        &self.stats
    }

    /// Name of the context selector the main run used
    pub fn selector_name(&self) -> &str {
        &self.selector
    }

    pub fn obj(&self, id: ObjId) -> Rc<Obj> {
        self.heap.obj(id)
    }

    // ═══════════════════════════════════════════════════════════════════════
    // Points-to queries
    // ═══════════════════════════════════════════════════════════════════════

    /// Objects `var` may point to in any context, sorted
    pub fn points_to_set(&self, var: VarId) -> Vec<ObjId> {
        let sets = self
            .cs
            .vars_of(var)
            .iter()
            .filter_map(|p| self.cs.points_to(*p));
        self.project(sets)
    }

    pub fn var_points_to(&self, context: ContextId, var: VarId) -> Option<&PointsToSet> {
        self.cs
            .find_var(context, var)
            .and_then(|p| self.cs.points_to(p))
    }

    pub fn static_field_points_to(&self, field: FieldId) -> Vec<ObjId> {
        let set = self
            .cs
            .find_pointer(&PointerKind::StaticField { field })
            .and_then(|p| self.cs.points_to(p));
        self.project(set)
    }

    /// `obj.field` over every heap context of `obj`
    pub fn instance_field_points_to(&self, obj: ObjId, field: FieldId) -> Vec<ObjId> {
        let sets = self.contexts_of(obj).filter_map(|base| {
            self.cs
                .find_pointer(&PointerKind::InstanceField { base, field })
                .and_then(|p| self.cs.points_to(p))
        });
        self.project(sets)
    }

    /// Elements of array `obj` over every heap context of `obj`
    pub fn array_points_to(&self, obj: ObjId) -> Vec<ObjId> {
        let sets = self.contexts_of(obj).filter_map(|array| {
            self.cs
                .find_pointer(&PointerKind::ArrayIndex { array })
                .and_then(|p| self.cs.points_to(p))
        });
        self.project(sets)
    }

    /// Whether two variables may reference a common object
    pub fn may_alias(&self, a: VarId, b: VarId) -> bool {
        let pts_a: BTreeSet<ObjId> = self.points_to_set(a).into_iter().collect();
        self.points_to_set(b).iter().any(|o| pts_a.contains(o))
    }

    /// CS variables with a points-to set
    pub fn cs_vars(&self) -> impl Iterator<Item = (ContextId, VarId)> + '_ {
        self.cs.cs_vars().filter_map(|p| self.cs.pointer(p).as_var())
    }

    pub fn cs_objects(&self) -> impl Iterator<Item = (ContextId, ObjId)> + '_ {
        self.cs.cs_objects().map(|o| self.cs.cs_obj(o))
    }

    /// Variables with a non-empty points-to set in some context
    pub fn vars(&self) -> Vec<VarId> {
        let vars: BTreeSet<VarId> = self.cs_vars().map(|(_, v)| v).collect();
        vars.into_iter().collect()
    }

    fn contexts_of(&self, obj: ObjId) -> impl Iterator<Item = CsObjId> + '_ {
        self.cs
            .cs_objects()
            .filter(move |o| self.cs.cs_obj(*o).1 == obj)
    }

    fn project<'a>(&self, sets: impl IntoIterator<Item = &'a PointsToSet>) -> Vec<ObjId> {
        let objs: BTreeSet<ObjId> = sets
            .into_iter()
            .flat_map(|set| set.iter())
            .map(|o| self.cs.cs_obj(o).1)
            .collect();
        objs.into_iter().collect()
    }

    // ═══════════════════════════════════════════════════════════════════════
    // Call graph
    // ═══════════════════════════════════════════════════════════════════════

    pub fn call_graph(&self) -> &CsCallGraph {
        &self.call_graph
    }

    /// Context-insensitive projection of the call graph
    pub fn method_call_graph(&self) -> &MethodCallGraph {
        &self.method_call_graph
    }

    /// Reachable methods, sorted
    pub fn reachable_methods(&self) -> Vec<MethodId> {
        let mut methods: Vec<MethodId> = self.method_call_graph.reachable_methods().collect();
        methods.sort();
        methods
    }

    pub fn is_reachable(&self, method: MethodId) -> bool {
        self.method_call_graph.contains(method)
    }

    // ═══════════════════════════════════════════════════════════════════════
    // Named results
    // ═══════════════════════════════════════════════════════════════════════

    /// Plugin result stored under `key`; `None` if absent or of another type
    pub fn get_result<T: Any>(&self, key: &str) -> Option<&T> {
        self.results.get(key)
    }

    pub fn has_result(&self, key: &str) -> bool {
        self.results.contains(key)
    }

    pub fn result_keys(&self) -> impl Iterator<Item = &str> + '_ {
        self.results.keys()
    }
}

impl fmt::Debug for PointerAnalysisResult<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PointerAnalysisResult")
            .field("selector", &self.selector)
            .field("objects", &self.heap.len())
            .field("contexts", &self.contexts.len())
            .field("reachable_methods", &self.method_call_graph.method_count())
            .field("call_edges", &self.call_graph.edge_count())
            .field("results", &self.results)
            .finish()
    }
}
