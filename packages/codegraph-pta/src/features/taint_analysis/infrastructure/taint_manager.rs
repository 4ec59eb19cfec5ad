//! Taint objects
//!
//! A taint object is a mock object whose key is the index of its source
//! point, so objects converted by transfers keep their origin.

use crate::features::points_to::domain::{Descriptor, HeapModel, MockKey, Obj, ObjId};
use crate::features::taint_analysis::domain::SourcePoint;
use crate::shared::models::Type;
use rustc_hash::FxHashMap;

#[derive(Debug, Default)]
pub struct TaintManager {
    points: Vec<SourcePoint>,
    index: FxHashMap<SourcePoint, u32>,
}

impl TaintManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Taint object of type `ty` for `point`
    pub fn make_taint(&mut self, heap: &HeapModel, point: SourcePoint, ty: Type) -> ObjId {
        let next = self.points.len() as u32;
        let index = *self.index.entry(point).or_insert_with(|| {
            self.points.push(point);
            next
        });
        heap.mock_obj(Descriptor::Taint, MockKey::Index(index), ty)
    }

    /// Source point of a taint object made by this manager
    pub fn source_point(&self, obj: &Obj) -> Option<SourcePoint> {
        match obj.mock_key() {
            Some(MockKey::Index(i)) if obj.is_taint() => self.points.get(*i as usize).copied(),
            _ => None,
        }
    }

    pub fn source_count(&self) -> usize {
        self.points.len()
    }
}

/// Same taint, different type
pub fn convert_taint(heap: &HeapModel, obj: &Obj, ty: Type) -> Option<ObjId> {
    if !obj.is_taint() {
        return None;
    }
    let key = obj.mock_key()?.clone();
    Some(heap.mock_obj(Descriptor::Taint, key, ty))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::taint_analysis::domain::{Index, IndexRef};
    use crate::shared::models::{MethodId, ProgramBuilder, StmtRef};

    #[test]
    fn test_conversion_keeps_source_point() {
        let mut b = ProgramBuilder::new();
        let object = b.add_class("java.lang.Object", None);
        let string = b.add_class("java.lang.String", Some(object));
        let program = b.build();
        let heap = HeapModel::new(&program, true);
        let mut manager = TaintManager::new();

        let point = SourcePoint::Call {
            call_site: StmtRef::new(MethodId(0), 3),
            index: IndexRef::var(Index::Result),
        };
        let taint = manager.make_taint(&heap, point, Type::Class(string));
        assert_eq!(manager.make_taint(&heap, point, Type::Class(string)), taint);

        let converted = convert_taint(&heap, &heap.obj(taint), Type::Class(object)).unwrap();
        assert_ne!(converted, taint);
        assert_eq!(manager.source_point(&heap.obj(converted)), Some(point));
        assert_eq!(manager.source_count(), 1);
    }
}
