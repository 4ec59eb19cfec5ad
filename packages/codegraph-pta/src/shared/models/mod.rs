//! Program model shared by every analysis feature

pub mod builder;
pub mod class_hierarchy;
pub mod ir;
pub mod program;
pub mod types;

pub use builder::{BodyBuilder, ProgramBuilder};
pub use class_hierarchy::{JClass, JField, JMethod, MethodFlags, CLINIT_NAME, INIT_NAME, OBJECT_CLASS};
pub use ir::{
    CatchHandler, FieldId, Invoke, InvokeKind, Literal, MethodId, MethodIr, MethodRef, Stmt,
    StmtRef, Var, VarId,
};
pub use program::Program;
pub use types::{ClassId, PrimitiveType, Type};
