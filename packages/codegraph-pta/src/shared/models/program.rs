//! `Program` - the analysis session object
//!
//! Owns the class hierarchy, type system and per-method IR, and answers
//! the hierarchy queries the solver needs (subtyping, dispatch, signature
//! lookup). Every analysis component receives `&Program` explicitly.

use super::class_hierarchy::{JClass, JField, JMethod, OBJECT_CLASS};
use super::ir::{FieldId, MethodId, MethodIr, MethodRef, Stmt, StmtRef, Var, VarId};
use super::types::{ClassId, PrimitiveType, Type};
use rustc_hash::{FxHashMap, FxHashSet};

#[derive(Debug, Clone, Default)]
pub struct Program {
    pub(crate) classes: Vec<JClass>,
    pub(crate) fields: Vec<JField>,
    pub(crate) methods: Vec<JMethod>,
    pub(crate) vars: Vec<Var>,
    pub(crate) class_index: FxHashMap<String, ClassId>,
    pub(crate) method_index: FxHashMap<String, MethodId>,
    pub(crate) field_index: FxHashMap<String, FieldId>,
    pub(crate) main_method: Option<MethodId>,
}

impl Program {
    // ═══════════════════════════════════════════════════════════════════════
    // Arena access
    // ═══════════════════════════════════════════════════════════════════════

    pub fn class(&self, id: ClassId) -> &JClass {
        &self.classes[id.index()]
    }

    pub fn field(&self, id: FieldId) -> &JField {
        &self.fields[id.index()]
    }

    pub fn method(&self, id: MethodId) -> &JMethod {
        &self.methods[id.index()]
    }

    pub fn var(&self, id: VarId) -> &Var {
        &self.vars[id.index()]
    }

    pub fn ir(&self, id: MethodId) -> Option<&MethodIr> {
        self.method(id).ir.as_ref()
    }

    pub fn stmt(&self, at: StmtRef) -> Option<&Stmt> {
        self.ir(at.method)?.stmt(at.index)
    }

    pub fn classes(&self) -> impl Iterator<Item = (ClassId, &JClass)> + '_ {
        self.classes
            .iter()
            .enumerate()
            .map(|(i, c)| (ClassId::new(i), c))
    }

    pub fn methods(&self) -> impl Iterator<Item = (MethodId, &JMethod)> + '_ {
        self.methods
            .iter()
            .enumerate()
            .map(|(i, m)| (MethodId::new(i), m))
    }

    pub fn class_count(&self) -> usize {
        self.classes.len()
    }

    pub fn method_count(&self) -> usize {
        self.methods.len()
    }

    pub fn var_count(&self) -> usize {
        self.vars.len()
    }

    /// The program's `main` method, if the front end designated one
    pub fn main_method(&self) -> Option<MethodId> {
        self.main_method
    }

    // ═══════════════════════════════════════════════════════════════════════
    // Lookup by name / signature
    // ═══════════════════════════════════════════════════════════════════════

    pub fn class_by_name(&self, name: &str) -> Option<ClassId> {
        self.class_index.get(name).copied()
    }

    /// Look up a method by `<C: R name(P1,P2)>`
    pub fn method_by_signature(&self, signature: &str) -> Option<MethodId> {
        self.method_index
            .get(&normalize_signature(signature))
            .copied()
    }

    /// Look up a field by `<C: T name>`
    pub fn field_by_signature(&self, signature: &str) -> Option<FieldId> {
        self.field_index
            .get(&normalize_signature(signature))
            .copied()
    }

    pub fn method_signature(&self, id: MethodId) -> String {
        let m = self.method(id);
        format!("<{}: {}>", self.class(m.declaring_class).name, m.subsignature)
    }

    pub fn field_signature(&self, id: FieldId) -> String {
        let f = self.field(id);
        format!(
            "<{}: {} {}>",
            self.class(f.declaring_class).name,
            self.type_name(&f.ty),
            f.name
        )
    }

    pub fn type_name(&self, ty: &Type) -> String {
        type_name(&self.classes, ty)
    }

    /// Parse a type name (`int`, `java.lang.String`, `A[][]`)
    pub fn type_by_name(&self, name: &str) -> Option<Type> {
        let name = name.trim();
        if let Some(element) = name.strip_suffix("[]") {
            return self.type_by_name(element).map(Type::array_of);
        }
        match name {
            "void" => Some(Type::Void),
            "null" => Some(Type::Null),
            _ => PrimitiveType::from_name(name)
                .map(Type::Primitive)
                .or_else(|| self.class_by_name(name).map(Type::Class)),
        }
    }

    pub fn object_class(&self) -> Option<ClassId> {
        self.class_by_name(OBJECT_CLASS)
    }

    // ═══════════════════════════════════════════════════════════════════════
    // Hierarchy queries
    // ═══════════════════════════════════════════════════════════════════════

    /// `class`, then its superclasses up to the root
    pub fn super_classes(&self, class: ClassId) -> impl Iterator<Item = ClassId> + '_ {
        std::iter::successors(Some(class), move |c| self.class(*c).super_class)
    }

    /// All supertypes of `class` (superclasses and interfaces, transitively),
    /// including `class` itself
    pub fn all_supertypes(&self, class: ClassId) -> FxHashSet<ClassId> {
        let mut seen = FxHashSet::default();
        let mut stack = vec![class];
        while let Some(c) = stack.pop() {
            if !seen.insert(c) {
                continue;
            }
            let jc = self.class(c);
            stack.extend(jc.super_class);
            stack.extend(jc.interfaces.iter().copied());
        }
        seen
    }

    pub fn is_subclass(&self, sub: ClassId, sup: ClassId) -> bool {
        if sub == sup {
            return true;
        }
        let jc = self.class(sub);
        jc.super_class.is_some_and(|s| self.is_subclass(s, sup))
            || jc.interfaces.iter().any(|i| self.is_subclass(*i, sup))
    }

    pub fn is_subtype(&self, sub: &Type, sup: &Type) -> bool {
        match (sub, sup) {
            (Type::Null, t) => t.is_reference(),
            (Type::Class(a), Type::Class(b)) => self.is_subclass(*a, *b),
            (Type::Array(_), Type::Class(b)) => matches!(
                self.class(*b).name.as_str(),
                OBJECT_CLASS | "java.lang.Cloneable" | "java.io.Serializable"
            ),
            (Type::Array(a), Type::Array(b)) => {
                if a.is_reference() && b.is_reference() {
                    self.is_subtype(a, b)
                } else {
                    a == b
                }
            }
            (a, b) => a == b,
        }
    }

    /// Resolve a call-site method reference to its declaration, searching
    /// the named class, its superclasses, then its superinterfaces.
    pub fn resolve_method_ref(&self, method_ref: &MethodRef) -> Option<MethodId> {
        let subsig = method_ref.subsignature.as_str();
        self.super_classes(method_ref.class)
            .find_map(|c| self.class(c).declared_method(subsig))
            .or_else(|| self.default_method(method_ref.class, subsig, false))
    }

    /// Virtual dispatch: the concrete method `class` executes for `subsignature`
    pub fn dispatch(&self, class: ClassId, subsignature: &str) -> Option<MethodId> {
        self.super_classes(class)
            .filter_map(|c| self.class(c).declared_method(subsignature))
            .find(|m| !self.method(*m).is_abstract())
            .or_else(|| self.default_method(class, subsignature, true))
    }

    fn default_method(&self, class: ClassId, subsig: &str, concrete: bool) -> Option<MethodId> {
        let mut supertypes: Vec<ClassId> = self
            .all_supertypes(class)
            .into_iter()
            .filter(|c| self.class(*c).is_interface)
            .collect();
        supertypes.sort();
        supertypes
            .into_iter()
            .filter_map(|i| self.class(i).declared_method(subsig))
            .find(|m| !concrete || !self.method(*m).is_abstract())
    }

    /// Find field `name` declared in `class` or one of its superclasses
    pub fn lookup_field(&self, class: ClassId, name: &str) -> Option<FieldId> {
        self.super_classes(class).find_map(|c| {
            self.class(c)
                .fields
                .iter()
                .copied()
                .find(|f| self.field(*f).name == name)
        })
    }

    /// The class whose runtime instances of `ty` dispatch through
    pub fn dispatch_class(&self, ty: &Type) -> Option<ClassId> {
        match ty {
            Type::Class(c) => Some(*c),
            Type::Array(_) => self.object_class(),
            _ => None,
        }
    }
}

/// Canonical signature spelling: no blanks after commas
pub(crate) fn normalize_signature(signature: &str) -> String {
    signature.trim().replace(", ", ",")
}

pub(crate) fn type_name(classes: &[JClass], ty: &Type) -> String {
    match ty {
        Type::Primitive(p) => p.name().to_string(),
        Type::Class(c) => classes[c.index()].name.clone(),
        Type::Array(elem) => format!("{}[]", type_name(classes, elem)),
        Type::Null => "null".to_string(),
        Type::Void => "void".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shared::models::builder::ProgramBuilder;
    use crate::shared::models::class_hierarchy::MethodFlags;

    fn hierarchy() -> (Program, ClassId, ClassId, ClassId, ClassId) {
        let mut b = ProgramBuilder::new();
        let object = b.add_class(OBJECT_CLASS, None);
        let runnable = b.add_interface("java.lang.Runnable", &[]);
        let a = b.add_class("A", Some(object));
        let sub = b.add_class("B", Some(a));
        b.add_interfaces(sub, &[runnable]);
        b.add_method(a, "f", vec![], Type::Void, MethodFlags::instance());
        b.add_method(sub, "f", vec![], Type::Void, MethodFlags::instance());
        b.add_method(runnable, "run", vec![], Type::Void, MethodFlags::abstract_());
        b.add_field(a, "next", Type::Class(a), false);
        (b.build(), object, runnable, a, sub)
    }

    #[test]
    fn test_subtyping() {
        let (p, object, runnable, a, b) = hierarchy();
        assert!(p.is_subclass(b, a));
        assert!(p.is_subclass(b, object));
        assert!(p.is_subclass(b, runnable));
        assert!(!p.is_subclass(a, b));
        assert!(p.is_subtype(&Type::Null, &Type::Class(a)));
        assert!(p.is_subtype(&Type::array_of(Type::Class(b)), &Type::array_of(Type::Class(a))));
        assert!(p.is_subtype(&Type::array_of(Type::Class(a)), &Type::Class(object)));
        assert!(!p.is_subtype(
            &Type::array_of(Type::Primitive(PrimitiveType::Int)),
            &Type::array_of(Type::Primitive(PrimitiveType::Long))
        ));
    }

    #[test]
    fn test_dispatch_prefers_override() {
        let (p, _, runnable, a, b) = hierarchy();
        let b_f = p.method_by_signature("<B: void f()>").unwrap();
        let a_f = p.method_by_signature("<A: void f()>").unwrap();
        assert_eq!(p.dispatch(b, "void f()"), Some(b_f));
        assert_eq!(p.dispatch(a, "void f()"), Some(a_f));
        // abstract interface method is never a dispatch target
        assert_eq!(p.dispatch(b, "void run()"), None);
        let mref = MethodRef::new(runnable, "void run()");
        assert!(p.resolve_method_ref(&mref).is_some());
    }

    #[test]
    fn test_field_lookup_walks_superclasses() {
        let (p, _, _, _, b) = hierarchy();
        let next = p.lookup_field(b, "next").unwrap();
        assert_eq!(p.field_signature(next), "<A: A next>");
        assert_eq!(p.lookup_field(b, "missing"), None);
    }

    #[test]
    fn test_type_by_name() {
        let (p, _, _, a, _) = hierarchy();
        assert_eq!(p.type_by_name("A[][]"), Some(Type::array_of(Type::array_of(Type::Class(a)))));
        assert_eq!(p.type_by_name("int"), Some(Type::Primitive(PrimitiveType::Int)));
        assert_eq!(p.type_by_name("Nope"), None);
    }

    #[test]
    fn test_signature_normalization() {
        assert_eq!(normalize_signature(" <A: void f(int, long)> "), "<A: void f(int,long)>");
    }
}
