//! CS element manager
//!
//! Interns (context, entity) pairs into dense handles and owns every
//! pointer's points-to set and filter list. One manager per solver run.

use super::points_to_set::PointsToSet;
use crate::features::points_to::domain::{
    ContextId, CsCallSiteId, CsMethodId, CsObjId, Obj, ObjId, PointerId, PointerKind,
};
use crate::shared::macros::ArenaId;
use crate::shared::models::{FieldId, MethodId, StmtRef, VarId};
use rustc_hash::FxHashMap;
use std::fmt;
use std::hash::Hash;
use std::rc::Rc;

/// Keep-predicate attached to a pointer: objects for which it returns
/// false never enter the pointer's points-to set.
pub type PointerFilter = Rc<dyn Fn(&Obj) -> bool>;

/// Bidirectional map between keys and dense ids
struct Interner<K, I> {
    items: Vec<K>,
    index: FxHashMap<K, I>,
}

impl<K: Clone + Eq + Hash, I: ArenaId> Interner<K, I> {
    fn new() -> Self {
        Self {
            items: Vec::new(),
            index: FxHashMap::default(),
        }
    }

    fn intern(&mut self, key: K) -> (I, bool) {
        if let Some(id) = self.index.get(&key) {
            return (*id, false);
        }
        let id = I::from_index(self.items.len());
        self.items.push(key.clone());
        self.index.insert(key, id);
        (id, true)
    }

    fn get(&self, key: &K) -> Option<I> {
        self.index.get(key).copied()
    }

    fn resolve(&self, id: I) -> &K {
        &self.items[id.to_index()]
    }

    fn len(&self) -> usize {
        self.items.len()
    }

    fn ids(&self) -> impl Iterator<Item = I> + '_ {
        (0..self.items.len()).map(I::from_index)
    }
}

#[derive(Default)]
struct PointerSlot {
    pts: Option<PointsToSet>,
    filters: Vec<PointerFilter>,
}

pub struct CsManager {
    objs: Interner<(ContextId, ObjId), CsObjId>,
    call_sites: Interner<(ContextId, StmtRef), CsCallSiteId>,
    methods: Interner<(ContextId, MethodId), CsMethodId>,
    pointers: Interner<PointerKind, PointerId>,
    slots: Vec<PointerSlot>,
    vars_of: FxHashMap<VarId, Vec<PointerId>>,
}

impl Default for CsManager {
    fn default() -> Self {
        Self::new()
    }
}

impl CsManager {
    pub fn new() -> Self {
        Self {
            objs: Interner::new(),
            call_sites: Interner::new(),
            methods: Interner::new(),
            pointers: Interner::new(),
            slots: Vec::new(),
            vars_of: FxHashMap::default(),
        }
    }

    // ═══════════════════════════════════════════════════════════════════════
    // Interning (solver only)
    // ═══════════════════════════════════════════════════════════════════════

    pub(crate) fn intern_obj(&mut self, context: ContextId, obj: ObjId) -> CsObjId {
        self.objs.intern((context, obj)).0
    }

    pub(crate) fn intern_call_site(&mut self, context: ContextId, site: StmtRef) -> CsCallSiteId {
        self.call_sites.intern((context, site)).0
    }

    pub(crate) fn intern_method(&mut self, context: ContextId, method: MethodId) -> CsMethodId {
        self.methods.intern((context, method)).0
    }

    pub(crate) fn intern_pointer(&mut self, kind: PointerKind) -> PointerId {
        let (id, fresh) = self.pointers.intern(kind);
        if fresh {
            self.slots.push(PointerSlot::default());
            if let PointerKind::Var { var, .. } = kind {
                self.vars_of.entry(var).or_default().push(id);
            }
        }
        id
    }

    pub(crate) fn var(&mut self, context: ContextId, var: VarId) -> PointerId {
        self.intern_pointer(PointerKind::Var { context, var })
    }

    pub(crate) fn instance_field(&mut self, base: CsObjId, field: FieldId) -> PointerId {
        self.intern_pointer(PointerKind::InstanceField { base, field })
    }

    pub(crate) fn array_index(&mut self, array: CsObjId) -> PointerId {
        self.intern_pointer(PointerKind::ArrayIndex { array })
    }

    pub(crate) fn static_field(&mut self, field: FieldId) -> PointerId {
        self.intern_pointer(PointerKind::StaticField { field })
    }

    /// Points-to set of `pointer`, created on first use
    pub(crate) fn pts_mut(&mut self, pointer: PointerId) -> &mut PointsToSet {
        self.slots[pointer.index()]
            .pts
            .get_or_insert_with(PointsToSet::new)
    }

    pub(crate) fn add_filter(&mut self, pointer: PointerId, filter: PointerFilter) {
        self.slots[pointer.index()].filters.push(filter);
    }

    // ═══════════════════════════════════════════════════════════════════════
    // Queries
    // ═══════════════════════════════════════════════════════════════════════

    pub fn cs_obj(&self, id: CsObjId) -> (ContextId, ObjId) {
        *self.objs.resolve(id)
    }

    pub fn find_obj(&self, context: ContextId, obj: ObjId) -> Option<CsObjId> {
        self.objs.get(&(context, obj))
    }

    pub fn cs_call_site(&self, id: CsCallSiteId) -> (ContextId, StmtRef) {
        *self.call_sites.resolve(id)
    }

    pub fn find_call_site(&self, context: ContextId, site: StmtRef) -> Option<CsCallSiteId> {
        self.call_sites.get(&(context, site))
    }

    pub fn cs_method(&self, id: CsMethodId) -> (ContextId, MethodId) {
        *self.methods.resolve(id)
    }

    pub fn find_method(&self, context: ContextId, method: MethodId) -> Option<CsMethodId> {
        self.methods.get(&(context, method))
    }

    pub fn pointer(&self, id: PointerId) -> PointerKind {
        *self.pointers.resolve(id)
    }

    pub fn find_pointer(&self, kind: &PointerKind) -> Option<PointerId> {
        self.pointers.get(kind)
    }

    pub fn find_var(&self, context: ContextId, var: VarId) -> Option<PointerId> {
        self.find_pointer(&PointerKind::Var { context, var })
    }

    pub fn points_to(&self, pointer: PointerId) -> Option<&PointsToSet> {
        self.slots.get(pointer.index())?.pts.as_ref()
    }

    pub fn filters(&self, pointer: PointerId) -> &[PointerFilter] {
        &self.slots[pointer.index()].filters
    }

    /// Every CS variable of `var`, one per context it was reached in
    pub fn vars_of(&self, var: VarId) -> &[PointerId] {
        self.vars_of.get(&var).map(Vec::as_slice).unwrap_or_default()
    }

    pub fn pointers(&self) -> impl Iterator<Item = (PointerId, PointerKind)> + '_ {
        self.pointers.ids().map(|id| (id, self.pointer(id)))
    }

    pub fn cs_vars(&self) -> impl Iterator<Item = PointerId> + '_ {
        self.pointers().filter(|(_, k)| k.is_var()).map(|(id, _)| id)
    }

    pub fn cs_objects(&self) -> impl Iterator<Item = CsObjId> + '_ {
        self.objs.ids()
    }

    pub fn cs_methods(&self) -> impl Iterator<Item = CsMethodId> + '_ {
        self.methods.ids()
    }

    pub fn obj_count(&self) -> usize {
        self.objs.len()
    }

    pub fn pointer_count(&self) -> usize {
        self.pointers.len()
    }

    pub fn method_count(&self) -> usize {
        self.methods.len()
    }
}

impl fmt::Debug for CsManager {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CsManager")
            .field("objs", &self.objs.len())
            .field("call_sites", &self.call_sites.len())
            .field("methods", &self.methods.len())
            .field("pointers", &self.pointers.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_interning_is_canonical() {
        let mut cs = CsManager::new();
        let v = VarId(4);
        let p1 = cs.var(ContextId::EMPTY, v);
        let p2 = cs.var(ContextId::EMPTY, v);
        let p3 = cs.var(ContextId(1), v);
        assert_eq!(p1, p2);
        assert_ne!(p1, p3);
        assert_eq!(cs.vars_of(v), &[p1, p3]);
        assert_eq!(cs.find_var(ContextId(1), v), Some(p3));
        assert_eq!(cs.find_var(ContextId(2), v), None);

        let o = cs.intern_obj(ContextId::EMPTY, ObjId(0));
        assert_eq!(cs.intern_obj(ContextId::EMPTY, ObjId(0)), o);
        assert_eq!(cs.cs_obj(o), (ContextId::EMPTY, ObjId(0)));
        let f = cs.instance_field(o, FieldId(1));
        assert_eq!(
            cs.pointer(f),
            PointerKind::InstanceField {
                base: o,
                field: FieldId(1)
            }
        );
    }

    #[test]
    fn test_points_to_set_created_lazily() {
        let mut cs = CsManager::new();
        let p = cs.static_field(FieldId(0));
        assert!(cs.points_to(p).is_none());
        cs.pts_mut(p).add(CsObjId(0));
        assert_eq!(cs.points_to(p).map(|s| s.len()), Some(1));
        assert_eq!(cs.cs_vars().count(), 0);
    }
}
