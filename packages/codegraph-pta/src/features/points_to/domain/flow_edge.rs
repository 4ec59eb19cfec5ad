//! Pointer flow graph edges

use super::context::ContextId;
use super::cs_element::PointerId;
use super::heap_model::{HeapModel, ObjId};
use crate::shared::models::Type;
use std::fmt;
use std::rc::Rc;

crate::index_id! {
    /// Handle of a PFG edge
    pub struct EdgeId;
}

/// Edge kinds (closed)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum FlowKind {
    LocalAssign,
    /// Local assign admitting only subtypes of the cast type
    Cast,
    InstanceLoad,
    InstanceStore,
    ArrayLoad,
    ArrayStore,
    StaticLoad,
    StaticStore,
    ParameterPassing,
    Return,
    /// Receiver passing; admits only the receivers dispatched through it
    ThisPassing,
    /// Plugin-specific flow carrying [`EdgeInfo`]
    Other,
}

/// Maps objects arriving over an OTHER edge to the objects delivered at
/// its target. Objects mapped to `None` do not flow.
pub trait FlowTransfer {
    fn transfer(&self, heap: &HeapModel, context: ContextId, obj: ObjId) -> Option<(ContextId, ObjId)>;
}

/// Per-plugin payload of an OTHER edge. Identity is `(origin, key)`.
#[derive(Clone)]
pub struct EdgeInfo {
    pub origin: &'static str,
    pub key: u64,
    pub transfer: Option<Rc<dyn FlowTransfer>>,
}

impl EdgeInfo {
    pub fn new(origin: &'static str, key: u64) -> Self {
        Self {
            origin,
            key,
            transfer: None,
        }
    }

    pub fn with_transfer(mut self, transfer: Rc<dyn FlowTransfer>) -> Self {
        self.transfer = Some(transfer);
        self
    }
}

impl PartialEq for EdgeInfo {
    fn eq(&self, other: &Self) -> bool {
        self.origin == other.origin && self.key == other.key
    }
}

impl Eq for EdgeInfo {}

impl fmt::Debug for EdgeInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EdgeInfo")
            .field("origin", &self.origin)
            .field("key", &self.key)
            .field("transfer", &self.transfer.is_some())
            .finish()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PointerFlowEdge {
    pub kind: FlowKind,
    pub source: PointerId,
    pub target: PointerId,
    /// Set for [`FlowKind::Cast`]
    pub cast_type: Option<Type>,
    /// Set for [`FlowKind::Other`]
    pub info: Option<EdgeInfo>,
}

impl PointerFlowEdge {
    pub fn new(kind: FlowKind, source: PointerId, target: PointerId) -> Self {
        Self {
            kind,
            source,
            target,
            cast_type: None,
            info: None,
        }
    }

    pub fn cast(source: PointerId, target: PointerId, ty: Type) -> Self {
        Self {
            cast_type: Some(ty),
            ..Self::new(FlowKind::Cast, source, target)
        }
    }

    pub fn other(source: PointerId, target: PointerId, info: EdgeInfo) -> Self {
        Self {
            info: Some(info),
            ..Self::new(FlowKind::Other, source, target)
        }
    }
}
