//! Classes, fields and methods of the analyzed program

use super::ir::{FieldId, MethodId, MethodIr};
use super::types::{ClassId, Type};
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};

pub const OBJECT_CLASS: &str = "java.lang.Object";
pub const INIT_NAME: &str = "<init>";
pub const CLINIT_NAME: &str = "<clinit>";

/// A class or interface
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JClass {
    pub name: String,
    pub super_class: Option<ClassId>,
    pub interfaces: Vec<ClassId>,
    pub is_interface: bool,
    pub is_abstract: bool,
    /// Application class (as opposed to library/JRE)
    pub is_application: bool,
    pub methods: Vec<MethodId>,
    pub fields: Vec<FieldId>,
    /// Declared methods by subsignature
    #[serde(skip)]
    pub(crate) declared: FxHashMap<String, MethodId>,
}

impl JClass {
    pub fn declared_method(&self, subsignature: &str) -> Option<MethodId> {
        self.declared.get(subsignature).copied()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JField {
    pub name: String,
    pub declaring_class: ClassId,
    pub ty: Type,
    pub is_static: bool,
}

/// Method modifiers relevant to the analysis
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MethodFlags {
    pub is_static: bool,
    pub is_abstract: bool,
    pub is_native: bool,
}

impl MethodFlags {
    pub fn instance() -> Self {
        Self::default()
    }

    pub fn static_() -> Self {
        Self {
            is_static: true,
            ..Self::default()
        }
    }

    pub fn abstract_() -> Self {
        Self {
            is_abstract: true,
            ..Self::default()
        }
    }

    pub fn native() -> Self {
        Self {
            is_native: true,
            ..Self::default()
        }
    }

    pub fn with_static(mut self) -> Self {
        self.is_static = true;
        self
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JMethod {
    pub name: String,
    pub declaring_class: ClassId,
    pub param_types: Vec<Type>,
    pub return_type: Type,
    pub flags: MethodFlags,
    /// `R name(P1,P2)`
    pub subsignature: String,
    /// `None` for abstract and native methods
    pub ir: Option<MethodIr>,
}

impl JMethod {
    pub fn is_static(&self) -> bool {
        self.flags.is_static
    }

    pub fn is_abstract(&self) -> bool {
        self.flags.is_abstract
    }

    pub fn is_native(&self) -> bool {
        self.flags.is_native
    }

    pub fn is_constructor(&self) -> bool {
        self.name == INIT_NAME
    }

    pub fn is_class_initializer(&self) -> bool {
        self.name == CLINIT_NAME
    }
}
