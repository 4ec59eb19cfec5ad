//! Resolved taint configuration

use super::index_ref::{Index, IndexRef};
use crate::shared::models::{FieldId, MethodId, Type};

/// Where taint objects come from
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Source {
    /// Value at `index` of every call to `method`
    Call {
        method: MethodId,
        index: IndexRef,
        ty: Type,
    },
    /// Parameter of `method` on entry
    Param {
        method: MethodId,
        index: IndexRef,
        ty: Type,
    },
    /// Every load of `field`
    Field { field: FieldId, ty: Type },
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Sink {
    pub method: MethodId,
    pub index: IndexRef,
}

/// Taint at `from` of a call to `method` also taints `to`, as an object
/// of type `ty`
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TaintTransfer {
    pub method: MethodId,
    pub from: IndexRef,
    pub to: IndexRef,
    pub ty: Type,
}

/// Taint never reaches parameter `index` inside `method`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ParamSanitizer {
    pub method: MethodId,
    pub index: Index,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TaintConfig {
    pub sources: Vec<Source>,
    pub sinks: Vec<Sink>,
    pub transfers: Vec<TaintTransfer>,
    pub sanitizers: Vec<ParamSanitizer>,
    /// Also scan reachable call sites whose declared target is a sink
    pub call_site_mode: bool,
}

impl TaintConfig {
    /// Concatenate lists without duplicates; call-site mode is ORed
    pub fn merge(mut self, other: TaintConfig) -> TaintConfig {
        concat_distinct(&mut self.sources, other.sources);
        concat_distinct(&mut self.sinks, other.sinks);
        concat_distinct(&mut self.transfers, other.transfers);
        concat_distinct(&mut self.sanitizers, other.sanitizers);
        self.call_site_mode |= other.call_site_mode;
        self
    }

    pub fn is_empty(&self) -> bool {
        self.sources.is_empty()
            && self.sinks.is_empty()
            && self.transfers.is_empty()
            && self.sanitizers.is_empty()
    }

    pub fn is_sanitized(&self, method: MethodId, index: Index) -> bool {
        self.sanitizers
            .iter()
            .any(|s| s.method == method && s.index == index)
    }
}

fn concat_distinct<T: PartialEq>(into: &mut Vec<T>, from: Vec<T>) {
    for item in from {
        if !into.contains(&item) {
            into.push(item);
        }
    }
}
