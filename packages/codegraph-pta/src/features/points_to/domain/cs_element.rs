//! Context-sensitive elements and pointers
//!
//! Every (context, entity) pair is interned once per run by the CS
//! manager; the handles below are indices into its tables.

use super::context::ContextId;
use crate::shared::models::{FieldId, VarId};

crate::index_id! {
    /// (heap context, abstract object)
    pub struct CsObjId;
}

crate::index_id! {
    /// (context, call statement)
    pub struct CsCallSiteId;
}

crate::index_id! {
    /// (context, method)
    pub struct CsMethodId;
}

crate::index_id! {
    /// A pointer: CS variable, instance field, array index or static field
    pub struct PointerId;
}

/// What a [`PointerId`] denotes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum PointerKind {
    Var { context: ContextId, var: VarId },
    InstanceField { base: CsObjId, field: FieldId },
    ArrayIndex { array: CsObjId },
    StaticField { field: FieldId },
}

impl PointerKind {
    pub fn as_var(&self) -> Option<(ContextId, VarId)> {
        match self {
            PointerKind::Var { context, var } => Some((*context, *var)),
            _ => None,
        }
    }

    pub fn is_var(&self) -> bool {
        matches!(self, PointerKind::Var { .. })
    }
}
