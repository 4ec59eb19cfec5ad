//! Worklist solver
//!
//! Inclusion-based propagation with an on-the-fly call graph:
//! - **Init**: plugins seed entry points (`on_start`)
//! - **Propagate**: drain the worklist; points-to deltas flow along PFG
//!   edges, new receiver objects trigger dispatch, new call edges make
//!   callees reachable and add their statements to the PFG
//! - **Phase boundary**: when the worklist drains, pending retroactive
//!   filters are applied and plugins get `on_phase_finish`; the loop
//!   repeats until a pass injects no new work
//! - **Finish**: `on_finish`, then the state is frozen into a
//!   [`PointerAnalysisResult`]
//!
//! Plugin commands are queued and applied before the next worklist poll,
//! so the worklist stays the only serialization point.
//!
//! # References
//! - Andersen, L. O. "Program Analysis and Specialization for C" (PhD 1994)
//! - Lhoták & Hendren "Scaling Java Points-to Analysis using Spark" (CC 2003)
//! - Tan et al. "Tai-e: A Developer-Friendly Static Analysis Framework for Java" (ISSTA 2023)

use super::call_graph::{CsCallGraph, MethodCallGraph};
use super::context_selector::{ContextSelector, SelectorCx};
use super::cs_manager::CsManager;
use super::points_to_set::PointsToSet;
use super::pointer_flow_graph::PointerFlowGraph;
use super::solver_view::{PhaseScope, SolverView};
use super::worklist::{Entry, WorkList};
use crate::config::PtaConfig;
use crate::features::points_to::application::result::PointerAnalysisResult;
use crate::features::points_to::domain::{
    CallEdge, CallKind, ContextId, ContextTable, CsMethodId, CsObjId, EdgeId, EntryPoint,
    FlowKind, HeapModel, NamedResults, ObjId, PointerFlowEdge, PointerId, PointerKind,
};
use crate::features::points_to::plugin::{
    Commands, CompositePlugin, CsObjRef, Plugin, PointerRef, SolverCommand,
};
use crate::shared::models::{
    FieldId, Invoke, InvokeKind, Literal, MethodId, Program, Stmt, StmtRef, Type, VarId,
};
use rustc_hash::{FxHashMap, FxHashSet};
use std::collections::VecDeque;
use std::time::{Duration, Instant};
use tracing::{debug, info};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Init,
    Propagate,
    Finish,
}

/// Solver statistics
#[derive(Debug, Clone, Default)]
pub struct SolverStats {
    pub iterations: usize,
    pub phases: usize,
    pub commands: usize,
    pub filtered_out: usize,
    pub elapsed: Duration,
}

/// Statements of one variable that depend on its points-to set
#[derive(Debug, Clone, Default)]
struct VarFacts {
    /// `lhs = var.field`
    loads: Vec<(VarId, FieldId)>,
    /// `var.field = rhs`
    stores: Vec<(FieldId, VarId)>,
    /// `lhs = var[*]`
    array_loads: Vec<VarId>,
    /// `var[*] = rhs`
    array_stores: Vec<VarId>,
    /// Instance invokes with `var` as receiver
    invokes: Vec<StmtRef>,
}

pub struct Solver<'p> {
    program: &'p Program,
    config: PtaConfig,
    heap: HeapModel,
    contexts: ContextTable,
    selector: Box<dyn ContextSelector>,
    cs: CsManager,
    pfg: PointerFlowGraph,
    call_graph: CsCallGraph,
    worklist: WorkList,
    plugin: CompositePlugin,
    commands: VecDeque<SolverCommand>,
    seen_methods: FxHashSet<MethodId>,
    var_facts: FxHashMap<VarId, VarFacts>,
    /// Pointers that received a filter while already holding objects
    pending_filters: FxHashSet<PointerId>,
    phase: Phase,
    stats: SolverStats,
}

impl<'p> Solver<'p> {
    pub fn new(
        program: &'p Program,
        config: PtaConfig,
        heap: HeapModel,
        selector: Box<dyn ContextSelector>,
        plugin: CompositePlugin,
    ) -> Self {
        Self {
            program,
            config,
            heap,
            contexts: ContextTable::new(),
            selector,
            cs: CsManager::new(),
            pfg: PointerFlowGraph::new(),
            call_graph: CsCallGraph::new(),
            worklist: WorkList::default(),
            plugin,
            commands: VecDeque::new(),
            seen_methods: FxHashSet::default(),
            var_facts: FxHashMap::default(),
            pending_filters: FxHashSet::default(),
            phase: Phase::Init,
            stats: SolverStats::default(),
        }
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    /// Run Init → Propagate → Finish and freeze the result
    pub fn solve(mut self) -> PointerAnalysisResult<'p> {
        let start = Instant::now();
        info!(
            selector = %self.selector.name(),
            plugins = ?self.plugin.ids(),
            "pointer analysis started"
        );
        self.notify(|p, view, out| p.on_start(view, out));

        self.phase = Phase::Propagate;
        loop {
            self.analyze();
            self.stats.phases += 1;
            self.finish_phase();
            if self.worklist.is_empty() && self.commands.is_empty() {
                break;
            }
            debug!(phase = self.stats.phases, "plugins injected work at phase boundary");
        }

        self.phase = Phase::Finish;
        let mut results = NamedResults::default();
        {
            let view = SolverView {
                program: self.program,
                config: &self.config,
                heap: &self.heap,
                contexts: &self.contexts,
                cs: &self.cs,
                pfg: &self.pfg,
                call_graph: &self.call_graph,
            };
            self.plugin.on_finish(&view, &mut results);
        }
        self.stats.elapsed = start.elapsed();
        info!(
            iterations = self.stats.iterations,
            phases = self.stats.phases,
            reachable = self.call_graph.reachable_count(),
            call_edges = self.call_graph.edge_count(),
            pfg_edges = self.pfg.len(),
            pointers = self.cs.pointer_count(),
            objects = self.heap.len(),
            contexts = self.contexts.len(),
            elapsed_ms = self.stats.elapsed.as_millis() as u64,
            "pointer analysis finished"
        );
        let ci_call_graph = MethodCallGraph::project(&self.call_graph, &self.cs);
        PointerAnalysisResult::new(
            self.program,
            self.heap,
            self.contexts,
            self.cs,
            self.pfg,
            self.call_graph,
            ci_call_graph,
            results,
            self.selector.name(),
            self.stats,
        )
    }

    // ═══════════════════════════════════════════════════════════════════════
    // Main loop
    // ═══════════════════════════════════════════════════════════════════════

    fn analyze(&mut self) {
        loop {
            self.apply_commands();
            match self.worklist.poll() {
                Some(Entry::Call(edge)) => self.process_call_edge(edge),
                Some(Entry::Points(pointer, pts)) => self.process_points(pointer, pts),
                None if self.commands.is_empty() => break,
                None => {}
            }
            self.stats.iterations += 1;
        }
    }

    fn process_points(&mut self, pointer: PointerId, pts: PointsToSet) {
        let diff = self.propagate(pointer, &pts);
        if diff.is_empty() {
            return;
        }
        if let PointerKind::Var { context, var } = self.cs.pointer(pointer) {
            if let Some(facts) = self.var_facts.get(&var).cloned() {
                self.process_var_facts(context, pointer, &facts, &diff);
            }
        }
        self.notify(|p, view, out| p.on_new_points_to_set(view, pointer, &diff, out));
    }

    /// Union `pts` (after filters) into `pointer` and send the delta over
    /// its out edges
    fn propagate(&mut self, pointer: PointerId, pts: &PointsToSet) -> PointsToSet {
        let admitted = self.apply_filters(pointer, pts);
        let diff = self.cs.pts_mut(pointer).add_all_diff(&admitted);
        if !diff.is_empty() {
            #[cfg(feature = "trace")]
            tracing::trace!(pointer = %pointer, new = diff.len(), "propagate");
            let out_edges = self.pfg.out_edges(pointer).to_vec();
            for edge in out_edges {
                let flow = self.flow_over(edge, &diff);
                let target = self.pfg.edge(edge).target;
                self.worklist.push_points(target, flow);
            }
        }
        diff
    }

    fn apply_filters(&mut self, pointer: PointerId, pts: &PointsToSet) -> PointsToSet {
        let filters = self.cs.filters(pointer);
        if filters.is_empty() {
            return pts.clone();
        }
        let kept: PointsToSet = pts
            .iter()
            .filter(|o| {
                let obj = self.heap.obj(self.cs.cs_obj(*o).1);
                filters.iter().all(|keep| keep(obj.as_ref()))
            })
            .collect();
        self.stats.filtered_out += pts.len() - kept.len();
        kept
    }

    /// Objects of `pts` that cross `edge`
    fn flow_over(&mut self, edge: EdgeId, pts: &PointsToSet) -> PointsToSet {
        let e = self.pfg.edge(edge);
        match e.kind {
            FlowKind::Cast => {
                let Some(ty) = e.cast_type.clone() else {
                    return pts.clone();
                };
                pts.iter()
                    .filter(|o| {
                        let obj = self.heap.obj(self.cs.cs_obj(*o).1);
                        self.program.is_subtype(&obj.ty, &ty)
                    })
                    .collect()
            }
            FlowKind::ThisPassing => pts
                .iter()
                .filter(|o| self.pfg.admits_receiver(edge, *o))
                .collect(),
            FlowKind::Other => {
                let Some(transfer) = e.info.as_ref().and_then(|i| i.transfer.clone()) else {
                    return pts.clone();
                };
                let mut out = PointsToSet::new();
                for o in pts {
                    let (context, obj) = self.cs.cs_obj(o);
                    if let Some((ctx, obj)) = transfer.transfer(&self.heap, context, obj) {
                        out.add(self.cs.intern_obj(ctx, obj));
                    }
                }
                out
            }
            _ => pts.clone(),
        }
    }

    fn add_pfg_edge(&mut self, edge: PointerFlowEdge) {
        let Some(id) = self.pfg.add_edge(edge) else {
            return;
        };
        let source = self.pfg.edge(id).source;
        let Some(pts) = self.cs.points_to(source).filter(|s| !s.is_empty()).cloned() else {
            return;
        };
        let flow = self.flow_over(id, &pts);
        let target = self.pfg.edge(id).target;
        self.worklist.push_points(target, flow);
    }

    // ═══════════════════════════════════════════════════════════════════════
    // Instance fields, arrays and dispatch
    // ═══════════════════════════════════════════════════════════════════════

    fn process_var_facts(
        &mut self,
        context: ContextId,
        base: PointerId,
        facts: &VarFacts,
        diff: &PointsToSet,
    ) {
        for obj in diff {
            for &(lhs, field) in &facts.loads {
                let source = self.cs.instance_field(obj, field);
                let target = self.cs.var(context, lhs);
                self.add_pfg_edge(PointerFlowEdge::new(FlowKind::InstanceLoad, source, target));
            }
            for &(field, rhs) in &facts.stores {
                let source = self.cs.var(context, rhs);
                let target = self.cs.instance_field(obj, field);
                self.add_pfg_edge(PointerFlowEdge::new(FlowKind::InstanceStore, source, target));
            }
            for &lhs in &facts.array_loads {
                let source = self.cs.array_index(obj);
                let target = self.cs.var(context, lhs);
                self.add_pfg_edge(PointerFlowEdge::new(FlowKind::ArrayLoad, source, target));
            }
            for &rhs in &facts.array_stores {
                let source = self.cs.var(context, rhs);
                let target = self.cs.array_index(obj);
                self.add_pfg_edge(PointerFlowEdge::new(FlowKind::ArrayStore, source, target));
            }
        }
        for &site in &facts.invokes {
            self.process_instance_call(context, base, site, diff);
        }
    }

    fn process_instance_call(
        &mut self,
        context: ContextId,
        base: PointerId,
        site: StmtRef,
        diff: &PointsToSet,
    ) {
        let program = self.program;
        let Some(Stmt::Invoke(invoke)) = program.stmt(site) else {
            return;
        };
        let cs_site = self.cs.intern_call_site(context, site);
        for recv in diff {
            let (heap_ctx, obj_id) = self.cs.cs_obj(recv);
            let obj = self.heap.obj(obj_id);
            // a null receiver never enters a callee, whatever the invoke kind
            if obj.ty == Type::Null {
                continue;
            }
            let callee = match invoke.kind {
                InvokeKind::Virtual | InvokeKind::Interface => program
                    .dispatch_class(&obj.ty)
                    .and_then(|c| program.dispatch(c, &invoke.method_ref.subsignature)),
                InvokeKind::Special | InvokeKind::Static | InvokeKind::Dynamic => {
                    program.resolve_method_ref(&invoke.method_ref)
                }
            };
            let Some(callee) = callee else {
                self.notify(|p, view, out| {
                    p.on_unresolved_call(view, Some(recv), context, site, out)
                });
                continue;
            };
            let callee_ctx =
                self.select_context((context, site), Some((heap_ctx, obj_id)), callee);
            let cs_callee = self.cs.intern_method(callee_ctx, callee);
            self.worklist
                .push_call_edge(CallEdge::new(invoke.kind.into(), cs_site, cs_callee));
            if let Some(this) = program.ir(callee).and_then(|ir| ir.this) {
                let this_ptr = self.cs.var(callee_ctx, this);
                self.pass_receiver(base, this_ptr, recv);
            }
        }
    }

    /// Receiver-guarded THIS_PASSING: only objects dispatched to the
    /// callee reach its `this`
    fn pass_receiver(&mut self, base: PointerId, this: PointerId, recv: CsObjId) {
        let edge = PointerFlowEdge::new(FlowKind::ThisPassing, base, this);
        let id = match self.pfg.add_edge(edge) {
            Some(id) => id,
            None => match self.pfg.find_edge(FlowKind::ThisPassing, base, this) {
                Some(id) => id,
                None => return,
            },
        };
        if self.pfg.admit_receiver(id, recv) {
            self.worklist.push_points(this, PointsToSet::singleton(recv));
        }
    }

    fn select_context(
        &mut self,
        call_site: (ContextId, StmtRef),
        recv: Option<(ContextId, ObjId)>,
        callee: MethodId,
    ) -> ContextId {
        let mut cx = SelectorCx {
            program: self.program,
            heap: &self.heap,
            contexts: &mut self.contexts,
        };
        self.selector.select_context(&mut cx, call_site, recv, callee)
    }

    fn select_heap_context(&mut self, method: (ContextId, MethodId), obj: ObjId) -> ContextId {
        let mut cx = SelectorCx {
            program: self.program,
            heap: &self.heap,
            contexts: &mut self.contexts,
        };
        self.selector.select_heap_context(&mut cx, method, obj)
    }

    // ═══════════════════════════════════════════════════════════════════════
    // Call edges and reachability
    // ═══════════════════════════════════════════════════════════════════════

    fn process_call_edge(&mut self, edge: CallEdge) {
        if !self.call_graph.add_edge(edge) {
            return;
        }
        self.add_cs_method(edge.callee);
        if edge.kind != CallKind::Other {
            let program = self.program;
            let (caller_ctx, site) = self.cs.cs_call_site(edge.call_site);
            let (callee_ctx, callee) = self.cs.cs_method(edge.callee);
            if let (Some(Stmt::Invoke(invoke)), Some(ir)) = (program.stmt(site), program.ir(callee)) {
                for (arg, param) in invoke.args.iter().zip(&ir.params) {
                    let source = self.cs.var(caller_ctx, *arg);
                    let target = self.cs.var(callee_ctx, *param);
                    self.add_pfg_edge(PointerFlowEdge::new(FlowKind::ParameterPassing, source, target));
                }
                if let Some(result) = invoke.result {
                    for ret in &ir.return_vars {
                        let source = self.cs.var(callee_ctx, *ret);
                        let target = self.cs.var(caller_ctx, result);
                        self.add_pfg_edge(PointerFlowEdge::new(FlowKind::Return, source, target));
                    }
                }
            }
        }
        self.notify(|p, view, out| p.on_new_call_edge(view, &edge, out));
    }

    fn add_cs_method(&mut self, cs_method: CsMethodId) {
        if !self.call_graph.add_reachable(cs_method) {
            return;
        }
        let (context, method) = self.cs.cs_method(cs_method);
        if self.seen_methods.insert(method) {
            self.process_new_method(method);
        }
        self.process_cs_stmts(context, method);
        self.notify(|p, view, out| p.on_new_cs_method(view, cs_method, out));
    }

    /// Context-independent bookkeeping for a method reached the first time
    fn process_new_method(&mut self, method: MethodId) {
        debug!(method = %self.program.method_signature(method), "new reachable method");
        let program = self.program;
        let Some(ir) = program.ir(method) else {
            self.notify(|p, view, out| p.on_new_method(view, method, out));
            return;
        };
        for (index, stmt) in ir.stmts.iter().enumerate() {
            match stmt {
                Stmt::LoadField {
                    lhs,
                    base: Some(base),
                    field,
                } => self.facts(*base).loads.push((*lhs, *field)),
                Stmt::StoreField {
                    base: Some(base),
                    field,
                    rhs,
                } => self.facts(*base).stores.push((*field, *rhs)),
                Stmt::LoadArray { lhs, base } => self.facts(*base).array_loads.push(*lhs),
                Stmt::StoreArray { base, rhs } => self.facts(*base).array_stores.push(*rhs),
                Stmt::Invoke(Invoke {
                    base: Some(base), ..
                }) => self
                    .facts(*base)
                    .invokes
                    .push(StmtRef::new(method, index)),
                _ => {}
            }
        }
        self.notify(|p, view, out| p.on_new_method(view, method, out));
        for index in 0..ir.stmts.len() {
            let stmt = StmtRef::new(method, index);
            self.notify(|p, view, out| p.on_new_stmt(view, stmt, out));
        }
    }

    fn facts(&mut self, var: VarId) -> &mut VarFacts {
        self.var_facts.entry(var).or_default()
    }

    /// Statements whose effect depends only on the method's context
    fn process_cs_stmts(&mut self, context: ContextId, method: MethodId) {
        let program = self.program;
        let Some(ir) = program.ir(method) else {
            return;
        };
        for (index, stmt) in ir.stmts.iter().enumerate() {
            let site = StmtRef::new(method, index);
            match stmt {
                Stmt::New { lhs, ty } => {
                    let obj = self.heap.alloc_obj(site, ty);
                    let heap_ctx = self.select_heap_context((context, method), obj);
                    let cs_obj = self.cs.intern_obj(heap_ctx, obj);
                    let target = self.cs.var(context, *lhs);
                    self.worklist.push_points(target, PointsToSet::singleton(cs_obj));
                }
                Stmt::AssignLiteral { lhs, literal } => match literal {
                    Literal::String(_) | Literal::Class(_) => {
                        let obj = self.heap.constant_obj(literal.clone());
                        let cs_obj = self.cs.intern_obj(ContextId::EMPTY, obj);
                        let target = self.cs.var(context, *lhs);
                        self.worklist.push_points(target, PointsToSet::singleton(cs_obj));
                    }
                    // null and numbers are left to the literal plugins
                    Literal::Null | Literal::Int(_) | Literal::Float(_) => {}
                },
                Stmt::Copy { lhs, rhs } => {
                    let source = self.cs.var(context, *rhs);
                    let target = self.cs.var(context, *lhs);
                    self.add_pfg_edge(PointerFlowEdge::new(FlowKind::LocalAssign, source, target));
                }
                Stmt::Cast { lhs, rhs, ty } => {
                    let source = self.cs.var(context, *rhs);
                    let target = self.cs.var(context, *lhs);
                    self.add_pfg_edge(PointerFlowEdge::cast(source, target, ty.clone()));
                }
                Stmt::LoadField {
                    lhs,
                    base: None,
                    field,
                } => {
                    let source = self.cs.static_field(*field);
                    let target = self.cs.var(context, *lhs);
                    self.add_pfg_edge(PointerFlowEdge::new(FlowKind::StaticLoad, source, target));
                }
                Stmt::StoreField {
                    base: None,
                    field,
                    rhs,
                } => {
                    let source = self.cs.var(context, *rhs);
                    let target = self.cs.static_field(*field);
                    self.add_pfg_edge(PointerFlowEdge::new(FlowKind::StaticStore, source, target));
                }
                Stmt::Invoke(invoke) if invoke.base.is_none() => {
                    self.process_static_call(context, site, invoke);
                }
                Stmt::LoadField { .. }
                | Stmt::StoreField { .. }
                | Stmt::LoadArray { .. }
                | Stmt::StoreArray { .. }
                | Stmt::Invoke(_)
                | Stmt::Return { .. }
                | Stmt::Throw { .. }
                | Stmt::Catch { .. }
                | Stmt::Nop => {}
            }
        }
    }

    fn process_static_call(&mut self, context: ContextId, site: StmtRef, invoke: &Invoke) {
        let Some(callee) = self.program.resolve_method_ref(&invoke.method_ref) else {
            self.notify(|p, view, out| p.on_unresolved_call(view, None, context, site, out));
            return;
        };
        let callee_ctx = self.select_context((context, site), None, callee);
        let cs_site = self.cs.intern_call_site(context, site);
        let cs_callee = self.cs.intern_method(callee_ctx, callee);
        self.worklist
            .push_call_edge(CallEdge::new(invoke.kind.into(), cs_site, cs_callee));
    }

    // ═══════════════════════════════════════════════════════════════════════
    // Plugin dispatch and commands
    // ═══════════════════════════════════════════════════════════════════════

    fn notify(&mut self, f: impl FnOnce(&mut CompositePlugin, &SolverView<'_>, &mut Commands)) {
        let mut out = Commands::new();
        let view = SolverView {
            program: self.program,
            config: &self.config,
            heap: &self.heap,
            contexts: &self.contexts,
            cs: &self.cs,
            pfg: &self.pfg,
            call_graph: &self.call_graph,
        };
        f(&mut self.plugin, &view, &mut out);
        self.commands.extend(out.into_commands());
    }

    fn apply_commands(&mut self) {
        while let Some(command) = self.commands.pop_front() {
            self.stats.commands += 1;
            self.apply(command);
        }
    }

    fn apply(&mut self, command: SolverCommand) {
        match command {
            SolverCommand::AddPointsTo { pointer, objs } => {
                let pointer = self.resolve_pointer(pointer);
                let pts: PointsToSet = objs.into_iter().map(|o| self.resolve_obj(o)).collect();
                self.worklist.push_points(pointer, pts);
            }
            SolverCommand::AddEntryPoint(entry) => self.add_entry_point(entry),
            SolverCommand::AddPointerFilter { pointer, filter } => {
                let pointer = self.resolve_pointer(pointer);
                self.cs.add_filter(pointer, filter);
                if self.cs.points_to(pointer).is_some_and(|s| !s.is_empty()) {
                    self.pending_filters.insert(pointer);
                }
            }
            SolverCommand::AddFlowEdge {
                kind,
                source,
                target,
                info,
            } => {
                let source = self.resolve_pointer(source);
                let target = self.resolve_pointer(target);
                let mut edge = PointerFlowEdge::new(kind, source, target);
                edge.info = info;
                self.add_pfg_edge(edge);
            }
            SolverCommand::AddCallEdge {
                kind,
                call_site,
                callee,
                receiver,
            } => {
                let receiver = receiver.map(|r| self.resolve_obj(r));
                let recv = receiver.map(|r| self.cs.cs_obj(r));
                let callee_ctx = self.select_context(call_site, recv, callee);
                let cs_site = self.cs.intern_call_site(call_site.0, call_site.1);
                let cs_callee = self.cs.intern_method(callee_ctx, callee);
                self.worklist
                    .push_call_edge(CallEdge::new(kind, cs_site, cs_callee));
                if let (Some(recv), Some(this)) =
                    (receiver, self.program.ir(callee).and_then(|ir| ir.this))
                {
                    let this_ptr = self.cs.var(callee_ctx, this);
                    self.worklist.push_points(this_ptr, PointsToSet::singleton(recv));
                }
            }
            SolverCommand::Propagate(pointer) => {
                let pointer = self.resolve_pointer(pointer);
                if let Some(pts) = self.cs.points_to(pointer).cloned() {
                    let out_edges = self.pfg.out_edges(pointer).to_vec();
                    for edge in out_edges {
                        let flow = self.flow_over(edge, &pts);
                        let target = self.pfg.edge(edge).target;
                        self.worklist.push_points(target, flow);
                    }
                }
            }
        }
    }

    fn add_entry_point(&mut self, entry: EntryPoint) {
        let program = self.program;
        let cs_method = self.cs.intern_method(ContextId::EMPTY, entry.method);
        self.call_graph.add_entry_method(cs_method);
        self.add_cs_method(cs_method);
        let Some(ir) = program.ir(entry.method) else {
            return;
        };
        let params = entry.params;
        if let Some(this) = ir.this {
            let pointer = self.cs.var(ContextId::EMPTY, this);
            let pts: PointsToSet = params
                .this_objs
                .iter()
                .map(|o| self.cs.intern_obj(ContextId::EMPTY, *o))
                .collect();
            self.worklist.push_points(pointer, pts);
        }
        for (index, obj) in params.param_objs {
            if let Some(param) = ir.params.get(index) {
                let pointer = self.cs.var(ContextId::EMPTY, *param);
                let cs_obj = self.cs.intern_obj(ContextId::EMPTY, obj);
                self.worklist.push_points(pointer, PointsToSet::singleton(cs_obj));
            }
        }
        for (base, field, obj) in params.field_objs {
            let base = self.cs.intern_obj(ContextId::EMPTY, base);
            let pointer = self.cs.instance_field(base, field);
            let cs_obj = self.cs.intern_obj(ContextId::EMPTY, obj);
            self.worklist.push_points(pointer, PointsToSet::singleton(cs_obj));
        }
        for (array, elem) in params.array_objs {
            let array = self.cs.intern_obj(ContextId::EMPTY, array);
            let pointer = self.cs.array_index(array);
            let cs_obj = self.cs.intern_obj(ContextId::EMPTY, elem);
            self.worklist.push_points(pointer, PointsToSet::singleton(cs_obj));
        }
    }

    fn resolve_obj(&mut self, obj: CsObjRef) -> CsObjId {
        match obj {
            CsObjRef::Cs(id) => id,
            CsObjRef::Obj { context, obj } => self.cs.intern_obj(context, obj),
        }
    }

    fn resolve_pointer(&mut self, pointer: PointerRef) -> PointerId {
        match pointer {
            PointerRef::Pointer(id) => id,
            PointerRef::Var { context, var } => self.cs.var(context, var),
            PointerRef::InstanceField { base, field } => {
                let base = self.resolve_obj(base);
                self.cs.instance_field(base, field)
            }
            PointerRef::ArrayIndex { array } => {
                let array = self.resolve_obj(array);
                self.cs.array_index(array)
            }
            PointerRef::StaticField { field } => self.cs.static_field(field),
        }
    }

    // ═══════════════════════════════════════════════════════════════════════
    // Phase boundary
    // ═══════════════════════════════════════════════════════════════════════

    fn finish_phase(&mut self) {
        let mut pending: Vec<PointerId> = self.pending_filters.drain().collect();
        pending.sort();
        let mut out = Commands::new();
        let removed = {
            let mut scope = PhaseScope {
                program: self.program,
                config: &self.config,
                heap: &self.heap,
                contexts: &self.contexts,
                cs: &mut self.cs,
                pfg: &self.pfg,
                call_graph: &self.call_graph,
                removed: 0,
            };
            for pointer in pending {
                let filters = scope.cs.filters(pointer).to_vec();
                scope.remove_if(pointer, |obj| !filters.iter().all(|keep| keep(obj)));
            }
            self.plugin.on_phase_finish(&mut scope, &mut out);
            scope.removed
        };
        if removed > 0 {
            debug!(removed, "objects removed at phase boundary");
        }
        self.stats.filtered_out += removed;
        self.commands.extend(out.into_commands());
    }
}
