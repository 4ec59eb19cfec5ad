//! Pointer Flow Graph
//!
//! Directed graph over pointers, built incrementally as methods and
//! statements become reachable. Non-OTHER edges are idempotent on
//! (kind, source, target); cast edges additionally on their cast type.
//! OTHER edges are distinct per (source, target, info).

use crate::features::points_to::domain::{
    CsObjId, EdgeId, EdgeInfo, FlowKind, PointerFlowEdge, PointerId,
};
use crate::shared::models::Type;
use rustc_hash::{FxHashMap, FxHashSet};

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
enum EdgeKey {
    Plain(FlowKind, PointerId, PointerId),
    Cast(PointerId, PointerId, Type),
    Other(PointerId, PointerId, &'static str, u64),
}

impl EdgeKey {
    fn of(edge: &PointerFlowEdge) -> Self {
        match (edge.kind, &edge.cast_type, &edge.info) {
            (FlowKind::Cast, Some(ty), _) => EdgeKey::Cast(edge.source, edge.target, ty.clone()),
            (FlowKind::Other, _, Some(EdgeInfo { origin, key, .. })) => {
                EdgeKey::Other(edge.source, edge.target, *origin, *key)
            }
            (kind, _, _) => EdgeKey::Plain(kind, edge.source, edge.target),
        }
    }
}

#[derive(Debug, Default)]
pub struct PointerFlowGraph {
    edges: Vec<PointerFlowEdge>,
    keys: FxHashMap<EdgeKey, EdgeId>,
    out_edges: FxHashMap<PointerId, Vec<EdgeId>>,
    in_edges: FxHashMap<PointerId, Vec<EdgeId>>,
    /// Receivers admitted over each THIS_PASSING edge
    receivers: FxHashMap<EdgeId, FxHashSet<CsObjId>>,
}

impl PointerFlowGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an edge.
    ///
    /// Returns the new edge id; `None` if an equivalent non-OTHER edge
    /// already exists; the existing id for a repeated OTHER edge with the
    /// same info, so the caller can still propagate over it.
    pub fn add_edge(&mut self, edge: PointerFlowEdge) -> Option<EdgeId> {
        let key = EdgeKey::of(&edge);
        if let Some(existing) = self.keys.get(&key) {
            return (edge.kind == FlowKind::Other).then_some(*existing);
        }
        let id = EdgeId::new(self.edges.len());
        self.out_edges.entry(edge.source).or_default().push(id);
        self.in_edges.entry(edge.target).or_default().push(id);
        self.keys.insert(key, id);
        self.edges.push(edge);
        Some(id)
    }

    /// Existing non-OTHER edge between two pointers
    pub fn find_edge(&self, kind: FlowKind, source: PointerId, target: PointerId) -> Option<EdgeId> {
        self.keys
            .get(&EdgeKey::Plain(kind, source, target))
            .copied()
    }

    pub fn edge(&self, id: EdgeId) -> &PointerFlowEdge {
        &self.edges[id.index()]
    }

    pub fn out_edges(&self, pointer: PointerId) -> &[EdgeId] {
        self.out_edges.get(&pointer).map(Vec::as_slice).unwrap_or_default()
    }

    pub fn in_edges(&self, pointer: PointerId) -> &[EdgeId] {
        self.in_edges.get(&pointer).map(Vec::as_slice).unwrap_or_default()
    }

    pub fn edges(&self) -> impl Iterator<Item = (EdgeId, &PointerFlowEdge)> + '_ {
        self.edges
            .iter()
            .enumerate()
            .map(|(i, e)| (EdgeId::new(i), e))
    }

    pub fn len(&self) -> usize {
        self.edges.len()
    }

    pub fn is_empty(&self) -> bool {
        self.edges.is_empty()
    }

    /// Admit `recv` over a THIS_PASSING edge; true if newly admitted
    pub(crate) fn admit_receiver(&mut self, edge: EdgeId, recv: CsObjId) -> bool {
        self.receivers.entry(edge).or_default().insert(recv)
    }

    pub fn admits_receiver(&self, edge: EdgeId, recv: CsObjId) -> bool {
        self.receivers
            .get(&edge)
            .is_some_and(|set| set.contains(&recv))
    }
}
