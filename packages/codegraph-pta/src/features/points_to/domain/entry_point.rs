//! Entry points and their parameter objects

use super::heap_model::ObjId;
use crate::shared::models::{FieldId, MethodId};

/// Objects an entry method starts with; all live in the empty heap context
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParamProvider {
    pub this_objs: Vec<ObjId>,
    /// (parameter index, object)
    pub param_objs: Vec<(usize, ObjId)>,
    /// (base object, field, object stored in the field)
    pub field_objs: Vec<(ObjId, FieldId, ObjId)>,
    /// (array object, element object)
    pub array_objs: Vec<(ObjId, ObjId)>,
}

impl ParamProvider {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn with_this(mut self, obj: ObjId) -> Self {
        self.this_objs.push(obj);
        self
    }

    pub fn with_param(mut self, index: usize, obj: ObjId) -> Self {
        self.param_objs.push((index, obj));
        self
    }

    pub fn with_array_element(mut self, array: ObjId, element: ObjId) -> Self {
        self.array_objs.push((array, element));
        self
    }
}

/// A method analyzed in the empty context with externally supplied objects
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntryPoint {
    pub method: MethodId,
    pub params: ParamProvider,
}

impl EntryPoint {
    pub fn new(method: MethodId, params: ParamProvider) -> Self {
        Self { method, params }
    }

    pub fn without_params(method: MethodId) -> Self {
        Self::new(method, ParamProvider::empty())
    }
}
