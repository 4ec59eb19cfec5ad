//! Per-method intermediate representation
//!
//! A method body is an ordered list of [`Stmt`]s over method-local
//! variables. Statements form a closed enumeration; every consumer
//! matches on it exhaustively.

use super::types::{ClassId, Type};
use serde::{Deserialize, Serialize};
use std::ops::Range;

crate::index_id! {
    /// Handle of a method in the program arena
    pub struct MethodId;
}

crate::index_id! {
    /// Handle of a field in the program arena
    pub struct FieldId;
}

crate::index_id! {
    /// Handle of a variable; unique across the whole program
    pub struct VarId;
}

/// Location of a statement: containing method + index into its body
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct StmtRef {
    pub method: MethodId,
    pub index: u32,
}

impl StmtRef {
    pub fn new(method: MethodId, index: usize) -> Self {
        Self {
            method,
            index: index as u32,
        }
    }
}

/// A method-local variable
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Var {
    pub name: String,
    pub ty: Type,
    pub method: MethodId,
}

/// Constant operand of an [`Stmt::AssignLiteral`]
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Literal {
    Null,
    Int(i64),
    /// IEEE-754 bit pattern of a floating point constant
    Float(u64),
    String(String),
    /// `Foo.class`
    Class(Type),
}

impl Literal {
    pub fn float(value: f64) -> Self {
        Literal::Float(value.to_bits())
    }

    pub fn is_number(&self) -> bool {
        matches!(self, Literal::Int(_) | Literal::Float(_))
    }
}

/// Symbolic reference to a method as written at a call site
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct MethodRef {
    pub class: ClassId,
    /// `R name(P1,P2)`
    pub subsignature: String,
}

impl MethodRef {
    pub fn new(class: ClassId, subsignature: impl Into<String>) -> Self {
        Self {
            class,
            subsignature: subsignature.into(),
        }
    }
}

/// Dispatch kind of an invocation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum InvokeKind {
    Virtual,
    Interface,
    Special,
    Static,
    /// `invokedynamic`; `method_ref` names the statically recorded bootstrap target
    Dynamic,
}

impl InvokeKind {
    /// Whether the callee is selected from the receiver's runtime type
    pub fn is_dispatched(self) -> bool {
        matches!(self, InvokeKind::Virtual | InvokeKind::Interface)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Invoke {
    pub kind: InvokeKind,
    pub method_ref: MethodRef,
    /// Receiver; `None` for static and dynamic invocations
    pub base: Option<VarId>,
    pub args: Vec<VarId>,
    pub result: Option<VarId>,
}

impl Invoke {
    pub fn is_static(&self) -> bool {
        self.base.is_none()
    }
}

/// IR statement
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Stmt {
    /// `lhs = new T` (class or array type)
    New { lhs: VarId, ty: Type },
    /// `lhs = <literal>`
    AssignLiteral { lhs: VarId, literal: Literal },
    /// `lhs = rhs`
    Copy { lhs: VarId, rhs: VarId },
    /// `lhs = (T) rhs`
    Cast { lhs: VarId, rhs: VarId, ty: Type },
    /// `lhs = base.field`, or `lhs = C.field` when `base` is `None`
    LoadField {
        lhs: VarId,
        base: Option<VarId>,
        field: FieldId,
    },
    /// `base.field = rhs`, or `C.field = rhs` when `base` is `None`
    StoreField {
        base: Option<VarId>,
        field: FieldId,
        rhs: VarId,
    },
    /// `lhs = base[*]`
    LoadArray { lhs: VarId, base: VarId },
    /// `base[*] = rhs`
    StoreArray { base: VarId, rhs: VarId },
    Invoke(Invoke),
    Return { value: Option<VarId> },
    Throw { value: VarId },
    /// Exception handler entry: `lhs = <caught exception>`
    Catch { lhs: VarId },
    Nop,
}

impl Stmt {
    /// Variable defined by this statement, if any
    pub fn def(&self) -> Option<VarId> {
        match self {
            Stmt::New { lhs, .. }
            | Stmt::AssignLiteral { lhs, .. }
            | Stmt::Copy { lhs, .. }
            | Stmt::Cast { lhs, .. }
            | Stmt::LoadField { lhs, .. }
            | Stmt::LoadArray { lhs, .. }
            | Stmt::Catch { lhs } => Some(*lhs),
            Stmt::Invoke(invoke) => invoke.result,
            Stmt::StoreField { .. }
            | Stmt::StoreArray { .. }
            | Stmt::Return { .. }
            | Stmt::Throw { .. }
            | Stmt::Nop => None,
        }
    }

    /// Variables read by this statement
    pub fn uses(&self) -> Vec<VarId> {
        match self {
            Stmt::New { .. } | Stmt::AssignLiteral { .. } | Stmt::Catch { .. } | Stmt::Nop => {
                Vec::new()
            }
            Stmt::Copy { rhs, .. } | Stmt::Cast { rhs, .. } => vec![*rhs],
            Stmt::LoadField { base, .. } => base.iter().copied().collect(),
            Stmt::StoreField { base, rhs, .. } => base.iter().copied().chain([*rhs]).collect(),
            Stmt::LoadArray { base, .. } => vec![*base],
            Stmt::StoreArray { base, rhs } => vec![*base, *rhs],
            Stmt::Invoke(invoke) => invoke
                .base
                .iter()
                .copied()
                .chain(invoke.args.iter().copied())
                .collect(),
            Stmt::Return { value } => value.iter().copied().collect(),
            Stmt::Throw { value } => vec![*value],
        }
    }

    pub fn as_invoke(&self) -> Option<&Invoke> {
        match self {
            Stmt::Invoke(invoke) => Some(invoke),
            _ => None,
        }
    }
}

/// Exception table entry: statements in `range` are protected by the
/// handler whose `Catch` statement defines `var`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatchHandler {
    pub range: Range<u32>,
    /// Declared catch type; `None` catches everything (`finally`)
    pub catch_type: Option<Type>,
    pub var: VarId,
}

impl CatchHandler {
    pub fn protects(&self, index: u32) -> bool {
        self.range.contains(&index)
    }
}

/// Body of a concrete method
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MethodIr {
    pub this: Option<VarId>,
    pub params: Vec<VarId>,
    pub vars: Vec<VarId>,
    pub stmts: Vec<Stmt>,
    pub return_vars: Vec<VarId>,
    pub handlers: Vec<CatchHandler>,
}

impl MethodIr {
    pub fn stmt(&self, index: u32) -> Option<&Stmt> {
        self.stmts.get(index as usize)
    }

    /// Handlers protecting statement `index`, innermost first
    pub fn handlers_of(&self, index: u32) -> impl Iterator<Item = &CatchHandler> + '_ {
        self.handlers.iter().filter(move |h| h.protects(index))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_def_use() {
        let (a, b, c) = (VarId(0), VarId(1), VarId(2));
        let store = Stmt::StoreField {
            base: Some(a),
            field: FieldId(0),
            rhs: b,
        };
        assert_eq!(store.def(), None);
        assert_eq!(store.uses(), vec![a, b]);

        let call = Stmt::Invoke(Invoke {
            kind: InvokeKind::Virtual,
            method_ref: MethodRef::new(ClassId(0), "void f(java.lang.Object)"),
            base: Some(a),
            args: vec![b],
            result: Some(c),
        });
        assert_eq!(call.def(), Some(c));
        assert_eq!(call.uses(), vec![a, b]);
    }

    #[test]
    fn test_handler_ranges() {
        let ir = MethodIr {
            handlers: vec![CatchHandler {
                range: 1..3,
                catch_type: None,
                var: VarId(9),
            }],
            ..Default::default()
        };
        assert_eq!(ir.handlers_of(0).count(), 0);
        assert_eq!(ir.handlers_of(2).count(), 1);
        assert_eq!(ir.handlers_of(3).count(), 0);
    }
}
