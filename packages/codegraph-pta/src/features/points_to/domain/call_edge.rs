//! Call graph edges

use super::cs_element::{CsCallSiteId, CsMethodId};
use crate::shared::models::InvokeKind;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum CallKind {
    Virtual,
    Interface,
    Special,
    Static,
    Dynamic,
    /// Plugin-introduced edge (e.g. reflective constructor call); no
    /// parameter or return passing
    Other,
}

impl From<InvokeKind> for CallKind {
    fn from(kind: InvokeKind) -> Self {
        match kind {
            InvokeKind::Virtual => CallKind::Virtual,
            InvokeKind::Interface => CallKind::Interface,
            InvokeKind::Special => CallKind::Special,
            InvokeKind::Static => CallKind::Static,
            InvokeKind::Dynamic => CallKind::Dynamic,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CallEdge {
    pub kind: CallKind,
    pub call_site: CsCallSiteId,
    pub callee: CsMethodId,
}

impl CallEdge {
    pub fn new(kind: CallKind, call_site: CsCallSiteId, callee: CsMethodId) -> Self {
        Self {
            kind,
            call_site,
            callee,
        }
    }
}
