//! Call graphs
//!
//! [`CsCallGraph`] grows on the fly during the solve: reachable CS
//! methods plus CS call edges. [`MethodCallGraph`] is its
//! context-insensitive projection, backed by a petgraph `DiGraphMap`.

use super::cs_manager::CsManager;
use crate::features::points_to::domain::{CallEdge, CallKind, CsCallSiteId, CsMethodId};
use crate::shared::models::{MethodId, StmtRef};
use petgraph::graphmap::DiGraphMap;
use petgraph::visit::Dfs;
use petgraph::Direction;
use rustc_hash::{FxHashMap, FxHashSet};
use std::collections::BTreeSet;

#[derive(Debug, Default)]
pub struct CsCallGraph {
    entry_methods: Vec<CsMethodId>,
    reachable: FxHashSet<CsMethodId>,
    reachable_order: Vec<CsMethodId>,
    edges: Vec<CallEdge>,
    edge_set: FxHashSet<CallEdge>,
    out_of_site: FxHashMap<CsCallSiteId, Vec<usize>>,
    into_method: FxHashMap<CsMethodId, Vec<usize>>,
}

impl CsCallGraph {
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn add_entry_method(&mut self, method: CsMethodId) {
        if !self.entry_methods.contains(&method) {
            self.entry_methods.push(method);
        }
    }

    /// Mark `method` reachable; true if it was not already
    pub(crate) fn add_reachable(&mut self, method: CsMethodId) -> bool {
        if self.reachable.insert(method) {
            self.reachable_order.push(method);
            true
        } else {
            false
        }
    }

    /// Record `edge`; true if new
    pub(crate) fn add_edge(&mut self, edge: CallEdge) -> bool {
        if !self.edge_set.insert(edge) {
            return false;
        }
        let index = self.edges.len();
        self.edges.push(edge);
        self.out_of_site.entry(edge.call_site).or_default().push(index);
        self.into_method.entry(edge.callee).or_default().push(index);
        true
    }

    pub fn entry_methods(&self) -> &[CsMethodId] {
        &self.entry_methods
    }

    pub fn contains(&self, method: CsMethodId) -> bool {
        self.reachable.contains(&method)
    }

    /// Reachable CS methods in discovery order
    pub fn reachable_methods(&self) -> &[CsMethodId] {
        &self.reachable_order
    }

    pub fn edges(&self) -> &[CallEdge] {
        &self.edges
    }

    pub fn edges_out_of(&self, site: CsCallSiteId) -> impl Iterator<Item = &CallEdge> + '_ {
        self.out_of_site
            .get(&site)
            .into_iter()
            .flatten()
            .map(|i| &self.edges[*i])
    }

    pub fn edges_into(&self, method: CsMethodId) -> impl Iterator<Item = &CallEdge> + '_ {
        self.into_method
            .get(&method)
            .into_iter()
            .flatten()
            .map(|i| &self.edges[*i])
    }

    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    pub fn reachable_count(&self) -> usize {
        self.reachable.len()
    }
}

/// A context-insensitive call edge
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct MethodCallEdge {
    pub kind: CallKind,
    pub call_site: StmtRef,
    pub callee: MethodId,
}

/// Context-insensitive projection of a [`CsCallGraph`]
#[derive(Debug, Default)]
pub struct MethodCallGraph {
    graph: DiGraphMap<MethodId, ()>,
    entries: Vec<MethodId>,
    edges: BTreeSet<MethodCallEdge>,
}

impl MethodCallGraph {
    pub fn project(cs_graph: &CsCallGraph, cs: &CsManager) -> Self {
        let mut graph = DiGraphMap::new();
        let mut entries = Vec::new();
        for m in cs_graph.entry_methods() {
            let (_, method) = cs.cs_method(*m);
            if !entries.contains(&method) {
                entries.push(method);
            }
        }
        for m in cs_graph.reachable_methods() {
            graph.add_node(cs.cs_method(*m).1);
        }
        let mut edges = BTreeSet::new();
        for edge in cs_graph.edges() {
            let (_, site) = cs.cs_call_site(edge.call_site);
            let (_, callee) = cs.cs_method(edge.callee);
            graph.add_edge(site.method, callee, ());
            edges.insert(MethodCallEdge {
                kind: edge.kind,
                call_site: site,
                callee,
            });
        }
        Self {
            graph,
            entries,
            edges,
        }
    }

    pub fn entry_methods(&self) -> &[MethodId] {
        &self.entries
    }

    pub fn contains(&self, method: MethodId) -> bool {
        self.graph.contains_node(method)
    }

    pub fn reachable_methods(&self) -> impl Iterator<Item = MethodId> + '_ {
        self.graph.nodes()
    }

    pub fn method_count(&self) -> usize {
        self.graph.node_count()
    }

    pub fn edges(&self) -> impl Iterator<Item = &MethodCallEdge> + '_ {
        self.edges.iter()
    }

    pub fn callees_of(&self, method: MethodId) -> Vec<MethodId> {
        let mut out: Vec<MethodId> = self
            .graph
            .neighbors_directed(method, Direction::Outgoing)
            .collect();
        out.sort();
        out
    }

    pub fn callers_of(&self, method: MethodId) -> Vec<MethodId> {
        let mut out: Vec<MethodId> = self
            .graph
            .neighbors_directed(method, Direction::Incoming)
            .collect();
        out.sort();
        out
    }

    /// Callees resolved at one call statement
    pub fn callees_at(&self, site: StmtRef) -> Vec<MethodId> {
        let mut out: Vec<MethodId> = self
            .edges
            .iter()
            .filter(|e| e.call_site == site)
            .map(|e| e.callee)
            .collect();
        out.sort();
        out.dedup();
        out
    }

    /// Whether `to` is transitively callable from `from`
    pub fn is_reachable_from(&self, from: MethodId, to: MethodId) -> bool {
        if !self.graph.contains_node(from) {
            return false;
        }
        let mut dfs = Dfs::new(&self.graph, from);
        while let Some(m) = dfs.next(&self.graph) {
            if m == to {
                return true;
            }
        }
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::points_to::domain::ContextId;

    #[test]
    fn test_edges_and_reachability_grow_only() {
        let mut cs = CsManager::new();
        let main = cs.intern_method(ContextId::EMPTY, MethodId(0));
        let callee = cs.intern_method(ContextId::EMPTY, MethodId(1));
        let site = cs.intern_call_site(ContextId::EMPTY, StmtRef::new(MethodId(0), 2));

        let mut cg = CsCallGraph::new();
        cg.add_entry_method(main);
        assert!(cg.add_reachable(main));
        assert!(!cg.add_reachable(main));
        let edge = CallEdge::new(CallKind::Static, site, callee);
        assert!(cg.add_edge(edge));
        assert!(!cg.add_edge(edge));
        assert!(cg.add_reachable(callee));
        assert_eq!(cg.edges_out_of(site).count(), 1);
        assert_eq!(cg.edges_into(callee).count(), 1);
        assert_eq!(cg.edges_into(main).count(), 0);

        let ci = MethodCallGraph::project(&cg, &cs);
        assert_eq!(ci.entry_methods(), &[MethodId(0)]);
        assert_eq!(ci.callees_of(MethodId(0)), vec![MethodId(1)]);
        assert_eq!(ci.callers_of(MethodId(1)), vec![MethodId(0)]);
        assert_eq!(ci.callees_at(StmtRef::new(MethodId(0), 2)), vec![MethodId(1)]);
        assert!(ci.is_reachable_from(MethodId(0), MethodId(1)));
        assert!(!ci.is_reachable_from(MethodId(1), MethodId(0)));
        assert!(!ci.contains(MethodId(7)));
    }
}
