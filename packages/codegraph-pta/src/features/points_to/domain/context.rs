//! Contexts
//!
//! A context is an interned sequence of [`ContextElem`]s, most recent
//! last. Structural equality holds by construction: equal sequences map to
//! the same [`ContextId`]. Only context selectors derive new contexts.

use super::heap_model::ObjId;
use crate::shared::models::{ClassId, StmtRef};
use rustc_hash::FxHashMap;

crate::index_id! {
    /// Handle of an interned context
    pub struct ContextId;
}

impl ContextId {
    /// The distinguished initial context
    pub const EMPTY: ContextId = ContextId(0);
}

/// One element of a context string
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ContextElem {
    CallSite(StmtRef),
    Object(ObjId),
    Type(ClassId),
}

#[derive(Debug)]
pub struct ContextTable {
    contexts: Vec<Box<[ContextElem]>>,
    index: FxHashMap<Box<[ContextElem]>, ContextId>,
}

impl Default for ContextTable {
    fn default() -> Self {
        Self::new()
    }
}

impl ContextTable {
    pub fn new() -> Self {
        let empty: Box<[ContextElem]> = Box::new([]);
        let mut index = FxHashMap::default();
        index.insert(empty.clone(), ContextId::EMPTY);
        Self {
            contexts: vec![empty],
            index,
        }
    }

    pub(crate) fn intern(&mut self, elems: &[ContextElem]) -> ContextId {
        if let Some(id) = self.index.get(elems) {
            return *id;
        }
        let id = ContextId::new(self.contexts.len());
        let boxed: Box<[ContextElem]> = elems.into();
        self.contexts.push(boxed.clone());
        self.index.insert(boxed, id);
        id
    }

    pub fn elems(&self, id: ContextId) -> &[ContextElem] {
        &self.contexts[id.index()]
    }

    pub fn depth(&self, id: ContextId) -> usize {
        self.contexts[id.index()].len()
    }

    /// `context ++ [elem]`, keeping the most recent `limit` elements
    pub fn append(&mut self, context: ContextId, elem: ContextElem, limit: usize) -> ContextId {
        if limit == 0 {
            return ContextId::EMPTY;
        }
        let mut elems: Vec<ContextElem> = self.elems(context).to_vec();
        elems.push(elem);
        let skip = elems.len().saturating_sub(limit);
        self.intern(&elems[skip..])
    }

    /// Keep the most recent `limit` elements of `context`
    pub fn truncate(&mut self, context: ContextId, limit: usize) -> ContextId {
        let elems = self.elems(context);
        if elems.len() <= limit {
            return context;
        }
        let tail: Vec<ContextElem> = elems[elems.len() - limit..].to_vec();
        self.intern(&tail)
    }

    pub fn len(&self) -> usize {
        self.contexts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.contexts.is_empty()
    }

    /// Longest interned context
    pub fn max_depth(&self) -> usize {
        self.contexts.iter().map(|c| c.len()).max().unwrap_or(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shared::models::MethodId;

    fn site(i: usize) -> ContextElem {
        ContextElem::CallSite(StmtRef::new(MethodId(0), i))
    }

    #[test]
    fn test_empty_context_is_preinterned() {
        let mut table = ContextTable::new();
        assert_eq!(table.intern(&[]), ContextId::EMPTY);
        assert_eq!(table.depth(ContextId::EMPTY), 0);
    }

    #[test]
    fn test_append_keeps_most_recent() {
        let mut table = ContextTable::new();
        let c1 = table.append(ContextId::EMPTY, site(1), 2);
        let c2 = table.append(c1, site(2), 2);
        let c3 = table.append(c2, site(3), 2);
        assert_eq!(table.elems(c3), &[site(2), site(3)]);
        // structural equality through interning
        let prefix = table.append(ContextId::EMPTY, site(2), 2);
        let again = table.append(prefix, site(3), 2);
        assert_eq!(c3, again);
        assert_eq!(table.max_depth(), 2);
    }

    #[test]
    fn test_truncate_and_zero_limit() {
        let mut table = ContextTable::new();
        let c1 = table.append(ContextId::EMPTY, site(1), 3);
        let c2 = table.append(c1, site(2), 3);
        let last = table.append(ContextId::EMPTY, site(2), 1);
        assert_eq!(table.truncate(c2, 1), last);
        assert_eq!(table.truncate(c2, 0), ContextId::EMPTY);
        assert_eq!(table.append(c2, site(9), 0), ContextId::EMPTY);
        assert_eq!(table.truncate(c1, 5), c1);
    }
}
