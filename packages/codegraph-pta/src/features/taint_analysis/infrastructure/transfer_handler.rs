//! Taint transfers
//!
//! At each call edge into a transfer method, taint at `from` flows to `to`
//! through an OTHER edge whose transfer converts taint objects to the
//! transfer type and drops everything else. Array and field indexes are
//! expanded per object of the indexed variable as objects arrive.

use super::taint_manager::convert_taint;
use crate::features::points_to::domain::{
    CallEdge, CallKind, ContextId, CsObjId, EdgeInfo, FlowTransfer, HeapModel, ObjId, PointerId,
    PointerKind,
};
use crate::features::points_to::infrastructure::{PointsToSet, SolverView};
use crate::features::points_to::plugin::{Commands, CsObjRef, PointerRef};
use crate::features::taint_analysis::domain::{IndexKind, TaintTransfer};
use crate::shared::models::{MethodId, Type, VarId};
use rustc_hash::FxHashMap;
use std::rc::Rc;

const ORIGIN: &str = "taint-transfer";

/// Converts taint objects to the transfer type
#[derive(Debug)]
pub struct TaintTypeTransfer {
    ty: Type,
}

impl FlowTransfer for TaintTypeTransfer {
    fn transfer(&self, heap: &HeapModel, _context: ContextId, obj: ObjId) -> Option<(ContextId, ObjId)> {
        convert_taint(heap, &heap.obj(obj), self.ty.clone()).map(|t| (ContextId::EMPTY, t))
    }
}

/// One transfer instantiated at a call site
#[derive(Debug, Clone)]
struct TransferSite {
    id: usize,
    context: ContextId,
    from: (VarId, IndexKind),
    to: (VarId, IndexKind),
}

#[derive(Default)]
pub struct TransferHandler {
    transfers: FxHashMap<MethodId, Vec<(usize, TaintTransfer)>>,
    converters: Vec<Rc<TaintTypeTransfer>>,
    /// Sites waiting for the objects of a variable
    pending: FxHashMap<(ContextId, VarId), Vec<TransferSite>>,
}

impl TransferHandler {
    pub fn new(transfers: &[TaintTransfer]) -> Self {
        let mut handler = Self::default();
        for (id, transfer) in transfers.iter().enumerate() {
            handler
                .transfers
                .entry(transfer.method)
                .or_default()
                .push((id, transfer.clone()));
            handler.converters.push(Rc::new(TaintTypeTransfer {
                ty: transfer.ty.clone(),
            }));
        }
        handler
    }

    fn info(&self, id: usize) -> EdgeInfo {
        let info = EdgeInfo::new(ORIGIN, id as u64);
        match self.converters.get(id) {
            Some(converter) => info.with_transfer(converter.clone()),
            None => info,
        }
    }

    pub fn on_new_call_edge(&mut self, view: &SolverView<'_>, edge: &CallEdge, out: &mut Commands) {
        if edge.kind == CallKind::Other {
            return;
        }
        let (_, callee) = view.cs_method(edge.callee);
        let Some(transfers) = self.transfers.get(&callee).cloned() else {
            return;
        };
        let (context, site) = view.cs().cs_call_site(edge.call_site);
        let Some(invoke) = view.program().stmt(site).and_then(|s| s.as_invoke()) else {
            return;
        };
        for (id, transfer) in transfers {
            let (Some(from), Some(to)) = (
                transfer.from.index.call_var(invoke),
                transfer.to.index.call_var(invoke),
            ) else {
                continue;
            };
            let site = TransferSite {
                id,
                context,
                from: (from, transfer.from.kind),
                to: (to, transfer.to.kind),
            };
            if site.from.1 == IndexKind::Var && site.to.1 == IndexKind::Var {
                out.add_other_edge(
                    PointerRef::Var { context, var: from },
                    PointerRef::Var { context, var: to },
                    self.info(id),
                );
                continue;
            }
            for (var, kind) in [site.from, site.to] {
                if kind == IndexKind::Var {
                    continue;
                }
                if let Some(pts) = view.var_points_to(context, var) {
                    self.expand(view, &site, var, pts, out);
                }
                self.pending.entry((context, var)).or_default().push(site.clone());
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
        let Some(sites) = self.pending.get(&(context, var)).cloned() else {
            return;
        };
        for site in &sites {
            self.expand(view, site, var, diff, out);
        }
    }

    /// Edges for the new objects `objs` of `var`, an indexed end of `site`
    fn expand(
        &self,
        view: &SolverView<'_>,
        site: &TransferSite,
        var: VarId,
        objs: &PointsToSet,
        out: &mut Commands,
    ) {
        let context = site.context;
        let (from_var, from_kind) = site.from;
        let (to_var, to_kind) = site.to;
        // pointers at `kind` of every current object of `v`, or `v` itself
        let ends = |v: VarId, kind: IndexKind| -> Vec<PointerRef> {
            if kind == IndexKind::Var {
                return vec![PointerRef::Var { context, var: v }];
            }
            view.var_points_to(context, v)
                .map(|pts| pts.iter().filter_map(|o| indexed(kind, o)).collect())
                .unwrap_or_default()
        };
        if var == from_var && from_kind != IndexKind::Var {
            let targets = ends(to_var, to_kind);
            for source in objs.iter().filter_map(|o| indexed(from_kind, o)) {
                for target in &targets {
                    out.add_other_edge(source, *target, self.info(site.id));
                }
            }
        }
        if var == to_var && to_kind != IndexKind::Var {
            let sources = ends(from_var, from_kind);
            for target in objs.iter().filter_map(|o| indexed(to_kind, o)) {
                for source in &sources {
                    out.add_other_edge(*source, target, self.info(site.id));
                }
            }
        }
    }
}

/// Array elements or field of `obj`
fn indexed(kind: IndexKind, obj: CsObjId) -> Option<PointerRef> {
    match kind {
        IndexKind::Var => None,
        IndexKind::Array => Some(PointerRef::ArrayIndex {
            array: CsObjRef::Cs(obj),
        }),
        IndexKind::Field(field) => Some(PointerRef::InstanceField {
            base: CsObjRef::Cs(obj),
            field,
        }),
    }
}
