//! Solver commands
//!
//! Plugins never mutate solver state directly. Each callback receives a
//! [`Commands`] buffer; the solver drains it after the callback returns
//! and applies the commands before polling the next worklist entry.

use crate::features::points_to::domain::{
    CallKind, ContextId, CsObjId, EdgeInfo, EntryPoint, FlowKind, ObjId, PointerId,
};
use crate::features::points_to::infrastructure::cs_manager::PointerFilter;
use crate::shared::models::{FieldId, MethodId, StmtRef, VarId};
use std::fmt;

/// A CS object, either already interned or (heap context, object)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CsObjRef {
    Cs(CsObjId),
    Obj { context: ContextId, obj: ObjId },
}

impl CsObjRef {
    /// `obj` in the empty heap context
    pub fn empty(obj: ObjId) -> Self {
        CsObjRef::Obj {
            context: ContextId::EMPTY,
            obj,
        }
    }
}

impl From<CsObjId> for CsObjRef {
    fn from(id: CsObjId) -> Self {
        CsObjRef::Cs(id)
    }
}

/// A pointer, interned on application if needed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PointerRef {
    Pointer(PointerId),
    Var { context: ContextId, var: VarId },
    InstanceField { base: CsObjRef, field: FieldId },
    ArrayIndex { array: CsObjRef },
    StaticField { field: FieldId },
}

impl From<PointerId> for PointerRef {
    fn from(id: PointerId) -> Self {
        PointerRef::Pointer(id)
    }
}

pub enum SolverCommand {
    AddPointsTo {
        pointer: PointerRef,
        objs: Vec<CsObjRef>,
    },
    AddEntryPoint(EntryPoint),
    AddPointerFilter {
        pointer: PointerRef,
        filter: PointerFilter,
    },
    AddFlowEdge {
        kind: FlowKind,
        source: PointerRef,
        target: PointerRef,
        info: Option<EdgeInfo>,
    },
    /// Call edge introduced by a plugin. The callee context comes from the
    /// selector; `receiver`, if any, is passed to the callee's `this`.
    AddCallEdge {
        kind: CallKind,
        call_site: (ContextId, StmtRef),
        callee: MethodId,
        receiver: Option<CsObjRef>,
    },
    /// Re-send the pointer's current objects over its out edges
    Propagate(PointerRef),
}

impl fmt::Debug for SolverCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SolverCommand::AddPointsTo { pointer, objs } => f
                .debug_struct("AddPointsTo")
                .field("pointer", pointer)
                .field("objs", objs)
                .finish(),
            SolverCommand::AddEntryPoint(ep) => f.debug_tuple("AddEntryPoint").field(ep).finish(),
            SolverCommand::AddPointerFilter { pointer, .. } => f
                .debug_struct("AddPointerFilter")
                .field("pointer", pointer)
                .finish_non_exhaustive(),
            SolverCommand::AddFlowEdge {
                kind,
                source,
                target,
                info,
            } => f
                .debug_struct("AddFlowEdge")
                .field("kind", kind)
                .field("source", source)
                .field("target", target)
                .field("info", info)
                .finish(),
            SolverCommand::AddCallEdge {
                kind,
                call_site,
                callee,
                receiver,
            } => f
                .debug_struct("AddCallEdge")
                .field("kind", kind)
                .field("call_site", call_site)
                .field("callee", callee)
                .field("receiver", receiver)
                .finish(),
            SolverCommand::Propagate(pointer) => f.debug_tuple("Propagate").field(pointer).finish(),
        }
    }
}

/// Command buffer handed to plugin callbacks
#[derive(Debug, Default)]
pub struct Commands {
    queue: Vec<SolverCommand>,
}

impl Commands {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, command: SolverCommand) {
        self.queue.push(command);
    }

    pub fn add_points_to(&mut self, pointer: impl Into<PointerRef>, objs: Vec<CsObjRef>) {
        if !objs.is_empty() {
            self.push(SolverCommand::AddPointsTo {
                pointer: pointer.into(),
                objs,
            });
        }
    }

    pub fn add_var_points_to(&mut self, context: ContextId, var: VarId, objs: Vec<CsObjRef>) {
        self.add_points_to(PointerRef::Var { context, var }, objs);
    }

    /// `obj` (empty heap context) flows into `var` under `context`
    pub fn add_var_obj(&mut self, context: ContextId, var: VarId, obj: ObjId) {
        self.add_var_points_to(context, var, vec![CsObjRef::empty(obj)]);
    }

    pub fn add_entry_point(&mut self, entry: EntryPoint) {
        self.push(SolverCommand::AddEntryPoint(entry));
    }

    pub fn add_pointer_filter(&mut self, pointer: impl Into<PointerRef>, filter: PointerFilter) {
        self.push(SolverCommand::AddPointerFilter {
            pointer: pointer.into(),
            filter,
        });
    }

    pub fn add_flow_edge(&mut self, kind: FlowKind, source: PointerRef, target: PointerRef) {
        self.push(SolverCommand::AddFlowEdge {
            kind,
            source,
            target,
            info: None,
        });
    }

    pub fn add_other_edge(&mut self, source: PointerRef, target: PointerRef, info: EdgeInfo) {
        self.push(SolverCommand::AddFlowEdge {
            kind: FlowKind::Other,
            source,
            target,
            info: Some(info),
        });
    }

    pub fn add_call_edge(
        &mut self,
        kind: CallKind,
        call_site: (ContextId, StmtRef),
        callee: MethodId,
        receiver: Option<CsObjRef>,
    ) {
        self.push(SolverCommand::AddCallEdge {
            kind,
            call_site,
            callee,
            receiver,
        });
    }

    pub fn propagate(&mut self, pointer: impl Into<PointerRef>) {
        self.push(SolverCommand::Propagate(pointer.into()));
    }

    pub fn len(&self) -> usize {
        self.queue.len()
    }

    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &SolverCommand> + '_ {
        self.queue.iter()
    }

    pub(crate) fn into_commands(self) -> Vec<SolverCommand> {
        self.queue
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_points_to_is_dropped() {
        let mut out = Commands::new();
        out.add_var_points_to(ContextId::EMPTY, VarId(0), Vec::new());
        assert!(out.is_empty());
        out.add_var_obj(ContextId::EMPTY, VarId(0), ObjId(3));
        assert_eq!(out.len(), 1);
        assert!(matches!(
            out.iter().next(),
            Some(SolverCommand::AddPointsTo {
                pointer: PointerRef::Var { .. },
                ..
            })
        ));
    }
}
