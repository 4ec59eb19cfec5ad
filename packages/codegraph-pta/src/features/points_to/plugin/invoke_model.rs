//! Per-signature API models
//!
//! An [`InvokeModels`] table maps library method signatures to a model key.
//! Reachable call sites whose declared target resolves to a modeled method
//! are recorded; plugins then react when the enclosing method becomes
//! reachable in a context ([`InvokeModels::sites_in`]) or when one of the
//! call's base/argument variables receives new objects
//! ([`InvokeModels::watching`]).

use crate::shared::models::{Invoke, MethodId, Program, Stmt, StmtRef, VarId};
use rustc_hash::FxHashMap;
use tracing::debug;

/// A call site matched to a model
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModeledCall<K> {
    pub site: StmtRef,
    pub key: K,
    pub invoke: Invoke,
}

#[derive(Debug)]
pub struct InvokeModels<K> {
    by_method: FxHashMap<MethodId, K>,
    sites: FxHashMap<MethodId, Vec<ModeledCall<K>>>,
    watched: FxHashMap<VarId, Vec<ModeledCall<K>>>,
}

impl<K> Default for InvokeModels<K> {
    fn default() -> Self {
        Self {
            by_method: FxHashMap::default(),
            sites: FxHashMap::default(),
            watched: FxHashMap::default(),
        }
    }
}

impl<K: Copy + std::fmt::Debug> InvokeModels<K> {
    /// Resolve each signature; signatures absent from the program are skipped
    pub fn new(program: &Program, models: &[(&str, K)]) -> Self {
        let mut table = Self::default();
        for (signature, key) in models {
            match program.method_by_signature(signature) {
                Some(method) => {
                    table.by_method.insert(method, *key);
                }
                None => debug!(signature = %signature, "modeled method absent from program"),
            }
        }
        table
    }

    pub fn is_empty(&self) -> bool {
        self.by_method.is_empty()
    }

    pub fn model_of(&self, method: MethodId) -> Option<K> {
        self.by_method.get(&method).copied()
    }

    /// Record `stmt` if it calls a modeled method; returns the model key
    pub fn record(&mut self, program: &Program, stmt: StmtRef) -> Option<K> {
        if self.by_method.is_empty() {
            return None;
        }
        let Some(Stmt::Invoke(invoke)) = program.stmt(stmt) else {
            return None;
        };
        let key = program
            .resolve_method_ref(&invoke.method_ref)
            .and_then(|m| self.model_of(m))?;
        let call = ModeledCall {
            site: stmt,
            key,
            invoke: invoke.clone(),
        };
        for var in invoke.base.iter().chain(&invoke.args) {
            let watchers = self.watched.entry(*var).or_default();
            if !watchers.iter().any(|c| c.site == stmt) {
                watchers.push(call.clone());
            }
        }
        self.sites.entry(stmt.method).or_default().push(call);
        Some(key)
    }

    /// Modeled calls inside `method`
    pub fn sites_in(&self, method: MethodId) -> &[ModeledCall<K>] {
        self.sites.get(&method).map(Vec::as_slice).unwrap_or_default()
    }

    /// Modeled calls that use `var` as base or argument
    pub fn watching(&self, var: VarId) -> &[ModeledCall<K>] {
        self.watched.get(&var).map(Vec::as_slice).unwrap_or_default()
    }
}
