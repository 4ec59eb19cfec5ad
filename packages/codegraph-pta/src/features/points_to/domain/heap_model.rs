//! Heap abstraction
//!
//! Concrete allocations collapse to abstract objects identified by their
//! allocation site (or mock descriptor + key) and static type. Interning
//! is interior-mutable so plugins holding only a read-only solver view can
//! still create mock objects.

use crate::shared::models::{ClassId, Literal, MethodId, PrimitiveType, Program, StmtRef, Type};
use rustc_hash::{FxHashMap, FxHashSet};
use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

crate::index_id! {
    /// Handle of an abstract object
    pub struct ObjId;
}

/// Tag of a synthetic object; objects with different descriptors never merge
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Descriptor {
    Null,
    Number,
    EntryPoint,
    Reflective,
    UnknownReflective,
    Taint,
    Native,
    MergedString,
    Thread,
}

impl Descriptor {
    pub fn name(self) -> &'static str {
        match self {
            Descriptor::Null => "NullObj",
            Descriptor::Number => "NumberObj",
            Descriptor::EntryPoint => "EntryPointObj",
            Descriptor::Reflective => "ReflectiveObj",
            Descriptor::UnknownReflective => "UnknownReflectiveObj",
            Descriptor::Taint => "TaintObj",
            Descriptor::Native => "NativeObj",
            Descriptor::MergedString => "MergedObj",
            Descriptor::Thread => "ThreadObj",
        }
    }
}

/// Distinguishes mock objects sharing a descriptor
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum MockKey {
    Name(String),
    Stmt(StmtRef),
    Param(MethodId, u32),
    Literal(Literal),
    Type(Type),
    Index(u32),
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ObjKind {
    /// `new T` at a statement
    Alloc { site: StmtRef },
    /// String or class literal
    Constant(Literal),
    Mock {
        descriptor: Descriptor,
        key: MockKey,
        /// Allocation container for distinguishable mocks
        container: Option<MethodId>,
    },
}

/// Abstract object
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Obj {
    pub kind: ObjKind,
    pub ty: Type,
}

impl Obj {
    pub fn descriptor(&self) -> Option<Descriptor> {
        match &self.kind {
            ObjKind::Mock { descriptor, .. } => Some(*descriptor),
            _ => None,
        }
    }

    pub fn alloc_site(&self) -> Option<StmtRef> {
        match &self.kind {
            ObjKind::Alloc { site } => Some(*site),
            _ => None,
        }
    }

    pub fn mock_key(&self) -> Option<&MockKey> {
        match &self.kind {
            ObjKind::Mock { key, .. } => Some(key),
            _ => None,
        }
    }

    /// Method in which the object is (notionally) allocated
    pub fn container_method(&self) -> Option<MethodId> {
        match &self.kind {
            ObjKind::Alloc { site } => Some(site.method),
            ObjKind::Mock { container, .. } => *container,
            ObjKind::Constant(_) => None,
        }
    }

    pub fn is_taint(&self) -> bool {
        self.descriptor() == Some(Descriptor::Taint)
    }

    pub fn constant(&self) -> Option<&Literal> {
        match &self.kind {
            ObjKind::Constant(lit) => Some(lit),
            _ => None,
        }
    }

    pub fn describe(&self, program: &Program) -> String {
        let ty = program.type_name(&self.ty);
        match &self.kind {
            ObjKind::Alloc { site } => format!(
                "NewObj{{{}[{}]@new {}}}",
                program.method_signature(site.method),
                site.index,
                ty
            ),
            ObjKind::Constant(lit) => format!("ConstantObj{{{ty}: {lit:?}}}"),
            ObjKind::Mock {
                descriptor, key, ..
            } => format!("MockObj{{<{}>: {:?}, {}}}", descriptor.name(), key, ty),
        }
    }
}

/// Interning table of abstract objects
pub struct HeapModel {
    merge_string_objects: bool,
    merged_classes: FxHashSet<ClassId>,
    string_type: Type,
    class_type: Type,
    inner: RefCell<HeapInner>,
}

#[derive(Default)]
struct HeapInner {
    objs: Vec<Rc<Obj>>,
    index: FxHashMap<Rc<Obj>, ObjId>,
}

impl HeapModel {
    pub fn new(program: &Program, merge_string_objects: bool) -> Self {
        let merged_classes = [
            "java.lang.String",
            "java.lang.StringBuilder",
            "java.lang.StringBuffer",
        ]
        .iter()
        .filter_map(|name| program.class_by_name(name))
        .collect();
        let class_or_null = |name: &str| program.class_by_name(name).map_or(Type::Null, Type::Class);
        Self {
            merge_string_objects,
            merged_classes,
            string_type: class_or_null("java.lang.String"),
            class_type: class_or_null("java.lang.Class"),
            inner: RefCell::new(HeapInner::default()),
        }
    }

    fn intern(&self, obj: Obj) -> ObjId {
        let mut inner = self.inner.borrow_mut();
        if let Some(id) = inner.index.get(&obj) {
            return *id;
        }
        let id = ObjId::new(inner.objs.len());
        let obj = Rc::new(obj);
        inner.objs.push(Rc::clone(&obj));
        inner.index.insert(obj, id);
        id
    }

    /// Abstract object of the allocation at `site`
    pub fn alloc_obj(&self, site: StmtRef, ty: &Type) -> ObjId {
        if self.merge_string_objects {
            if let Type::Class(c) = ty {
                if self.merged_classes.contains(c) {
                    return self.mock_obj(Descriptor::MergedString, MockKey::Type(ty.clone()), ty.clone());
                }
            }
        }
        self.intern(Obj {
            kind: ObjKind::Alloc { site },
            ty: ty.clone(),
        })
    }

    pub fn mock_obj(&self, descriptor: Descriptor, key: MockKey, ty: Type) -> ObjId {
        self.intern(Obj {
            kind: ObjKind::Mock {
                descriptor,
                key,
                container: None,
            },
            ty,
        })
    }

    /// Mock object additionally keyed by its allocation container
    pub fn mock_obj_in(
        &self,
        descriptor: Descriptor,
        key: MockKey,
        ty: Type,
        container: MethodId,
    ) -> ObjId {
        self.intern(Obj {
            kind: ObjKind::Mock {
                descriptor,
                key,
                container: Some(container),
            },
            ty,
        })
    }

    /// Object of a string or class literal
    pub fn constant_obj(&self, literal: Literal) -> ObjId {
        let ty = self.literal_type(&literal);
        self.intern(Obj {
            kind: ObjKind::Constant(literal),
            ty,
        })
    }

    pub fn literal_type(&self, literal: &Literal) -> Type {
        match literal {
            Literal::String(_) => self.string_type.clone(),
            Literal::Class(_) => self.class_type.clone(),
            Literal::Int(_) => Type::Primitive(PrimitiveType::Int),
            Literal::Float(_) => Type::Primitive(PrimitiveType::Double),
            Literal::Null => Type::Null,
        }
    }

    pub fn obj(&self, id: ObjId) -> Rc<Obj> {
        Rc::clone(&self.inner.borrow().objs[id.index()])
    }

    pub fn len(&self) -> usize {
        self.inner.borrow().objs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn objects(&self) -> Vec<(ObjId, Rc<Obj>)> {
        self.inner
            .borrow()
            .objs
            .iter()
            .enumerate()
            .map(|(i, o)| (ObjId::new(i), Rc::clone(o)))
            .collect()
    }
}

impl fmt::Debug for HeapModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HeapModel")
            .field("objects", &self.len())
            .field("merge_string_objects", &self.merge_string_objects)
            .finish()
    }
}
