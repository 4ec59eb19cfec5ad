//! What plugins see of the solver
//!
//! [`SolverView`] is a read-only snapshot handed to every callback.
//! [`PhaseScope`] additionally allows removing objects from points-to
//! sets; the solver only constructs it at a phase boundary, so removal
//! during propagation cannot be expressed.

use super::call_graph::CsCallGraph;
use super::cs_manager::CsManager;
use super::points_to_set::PointsToSet;
use super::pointer_flow_graph::PointerFlowGraph;
use crate::config::PtaConfig;
use crate::features::points_to::domain::{
    ContextId, ContextTable, CsMethodId, CsObjId, HeapModel, Obj, ObjId, PointerId,
};
use crate::shared::models::{MethodId, Program, VarId};
use rustc_hash::FxHashSet;
use std::rc::Rc;

#[derive(Clone, Copy)]
pub struct SolverView<'a> {
    pub(crate) program: &'a Program,
    pub(crate) config: &'a PtaConfig,
    pub(crate) heap: &'a HeapModel,
    pub(crate) contexts: &'a ContextTable,
    pub(crate) cs: &'a CsManager,
    pub(crate) pfg: &'a PointerFlowGraph,
    pub(crate) call_graph: &'a CsCallGraph,
}

impl<'a> SolverView<'a> {
    pub fn program(&self) -> &'a Program {
        self.program
    }

    pub fn config(&self) -> &'a PtaConfig {
        self.config
    }

    pub fn heap(&self) -> &'a HeapModel {
        self.heap
    }

    pub fn contexts(&self) -> &'a ContextTable {
        self.contexts
    }

    pub fn cs(&self) -> &'a CsManager {
        self.cs
    }

    pub fn pfg(&self) -> &'a PointerFlowGraph {
        self.pfg
    }

    pub fn call_graph(&self) -> &'a CsCallGraph {
        self.call_graph
    }

    pub fn points_to(&self, pointer: PointerId) -> Option<&'a PointsToSet> {
        self.cs.points_to(pointer)
    }

    pub fn var_points_to(&self, context: ContextId, var: VarId) -> Option<&'a PointsToSet> {
        self.cs.points_to(self.cs.find_var(context, var)?)
    }

    /// Abstract object behind a CS object
    pub fn obj(&self, cs_obj: CsObjId) -> Rc<Obj> {
        self.heap.obj(self.cs.cs_obj(cs_obj).1)
    }

    pub fn cs_obj(&self, cs_obj: CsObjId) -> (ContextId, ObjId) {
        self.cs.cs_obj(cs_obj)
    }

    pub fn cs_method(&self, method: CsMethodId) -> (ContextId, MethodId) {
        self.cs.cs_method(method)
    }

    pub fn make_points_to_set(&self) -> PointsToSet {
        PointsToSet::new()
    }
}

/// Phase-boundary capability: read access plus points-to removal
pub struct PhaseScope<'a> {
    pub(crate) program: &'a Program,
    pub(crate) config: &'a PtaConfig,
    pub(crate) heap: &'a HeapModel,
    pub(crate) contexts: &'a ContextTable,
    pub(crate) cs: &'a mut CsManager,
    pub(crate) pfg: &'a PointerFlowGraph,
    pub(crate) call_graph: &'a CsCallGraph,
    pub(crate) removed: usize,
}

impl<'a> PhaseScope<'a> {
    pub fn view(&self) -> SolverView<'_> {
        SolverView {
            program: self.program,
            config: self.config,
            heap: self.heap,
            contexts: self.contexts,
            cs: &*self.cs,
            pfg: self.pfg,
            call_graph: self.call_graph,
        }
    }

    /// Remove the objects of `pointer` matching `pred`; returns how many
    pub fn remove_if(&mut self, pointer: PointerId, mut pred: impl FnMut(&Obj) -> bool) -> usize {
        let Some(pts) = self.cs.points_to(pointer) else {
            return 0;
        };
        let doomed: FxHashSet<CsObjId> = pts
            .iter()
            .filter(|o| pred(self.heap.obj(self.cs.cs_obj(*o).1).as_ref()))
            .collect();
        if doomed.is_empty() {
            return 0;
        }
        let removed = self.cs.pts_mut(pointer).remove_if(|o| doomed.contains(&o));
        self.removed += removed;
        removed
    }

    /// Objects removed through this scope so far
    pub fn removed(&self) -> usize {
        self.removed
    }
}
