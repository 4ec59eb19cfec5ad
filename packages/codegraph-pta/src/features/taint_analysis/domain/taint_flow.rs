//! Reported flows

use super::index_ref::IndexRef;
use crate::shared::models::{FieldId, MethodId, Program, StmtRef};
use serde::Serialize;
use std::fmt;

/// Where a taint object was introduced
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub enum SourcePoint {
    /// Value at `index` of the call at `call_site`
    Call { call_site: StmtRef, index: IndexRef },
    /// Parameter of a source method on entry
    Param { method: MethodId, index: IndexRef },
    /// Load of a source field
    Field { load: StmtRef, field: FieldId },
}

/// Argument of a sink call that received taint
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct SinkPoint {
    pub call_site: StmtRef,
    pub index: IndexRef,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct TaintFlow {
    pub source: SourcePoint,
    pub sink: SinkPoint,
}

impl TaintFlow {
    /// Human-readable form using program signatures
    pub fn describe(&self, program: &Program) -> String {
        let at = |s: StmtRef| format!("{}[{}]", program.method_signature(s.method), s.index);
        let source = match self.source {
            SourcePoint::Call { call_site, index } => format!("{}/{}", at(call_site), index),
            SourcePoint::Param { method, index } => {
                format!("{}/{}", program.method_signature(method), index)
            }
            SourcePoint::Field { load, field } => {
                format!("{}/{}", at(load), program.field_signature(field))
            }
        };
        format!("{source} -> {}/{}", at(self.sink.call_site), self.sink.index)
    }
}

impl fmt::Display for SinkPoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}/{}", self.call_site, self.index)
    }
}
