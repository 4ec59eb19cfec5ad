//! Domain model of the pointer analysis: objects, contexts, CS elements,
//! flow and call edges.

pub mod call_edge;
pub mod context;
pub mod cs_element;
pub mod entry_point;
pub mod flow_edge;
pub mod heap_model;
pub mod named_results;

pub use call_edge::{CallEdge, CallKind};
pub use context::{ContextElem, ContextId, ContextTable};
pub use cs_element::{CsCallSiteId, CsMethodId, CsObjId, PointerId, PointerKind};
pub use entry_point::{EntryPoint, ParamProvider};
pub use flow_edge::{EdgeId, EdgeInfo, FlowKind, FlowTransfer, PointerFlowEdge};
pub use heap_model::{Descriptor, HeapModel, MockKey, Obj, ObjId, ObjKind};
pub use named_results::{NamedResults, EXCEPTION, SOUNDNESS_WARNINGS, TAINT_FLOWS};
