//! Solver infrastructure: CS element interning, points-to sets, the
//! pointer flow graph, the call graph and the worklist solver.

pub mod call_graph;
pub mod context_selector;
pub mod cs_manager;
pub mod pointer_flow_graph;
pub mod points_to_set;
pub mod solver;
pub mod solver_view;
pub mod worklist;

pub use call_graph::{CsCallGraph, MethodCallEdge, MethodCallGraph};
pub use context_selector::{
    make_selector, ContextSelector, GuidedSelector, KLimitingSelector, SelectiveSelector,
    SelectorCx,
};
pub use cs_manager::{CsManager, PointerFilter};
pub use pointer_flow_graph::PointerFlowGraph;
pub use points_to_set::PointsToSet;
pub use solver::{Phase, Solver, SolverStats};
pub use solver_view::{PhaseScope, SolverView};
