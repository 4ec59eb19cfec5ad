//! `ProgramBuilder` - assembles a [`Program`] for front ends and tests

use super::class_hierarchy::{JClass, JField, JMethod, MethodFlags};
use super::ir::{
    CatchHandler, FieldId, Invoke, InvokeKind, Literal, MethodId, MethodIr, MethodRef, Stmt, Var,
    VarId,
};
use super::program::{type_name, Program};
use super::types::{ClassId, Type};
use rustc_hash::FxHashMap;

#[derive(Debug, Default)]
pub struct ProgramBuilder {
    classes: Vec<JClass>,
    fields: Vec<JField>,
    methods: Vec<JMethod>,
    vars: Vec<Var>,
    main_method: Option<MethodId>,
}

impl ProgramBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_class(&mut self, name: impl Into<String>, super_class: Option<ClassId>) -> ClassId {
        let id = ClassId::new(self.classes.len());
        self.classes.push(JClass {
            name: name.into(),
            super_class,
            interfaces: Vec::new(),
            is_interface: false,
            is_abstract: false,
            is_application: true,
            methods: Vec::new(),
            fields: Vec::new(),
            declared: FxHashMap::default(),
        });
        id
    }

    pub fn add_interface(&mut self, name: impl Into<String>, extends: &[ClassId]) -> ClassId {
        let id = self.add_class(name, None);
        let class = &mut self.classes[id.index()];
        class.is_interface = true;
        class.is_abstract = true;
        class.interfaces = extends.to_vec();
        id
    }

    pub fn add_interfaces(&mut self, class: ClassId, interfaces: &[ClassId]) {
        self.classes[class.index()]
            .interfaces
            .extend_from_slice(interfaces);
    }

    pub fn set_abstract(&mut self, class: ClassId) {
        self.classes[class.index()].is_abstract = true;
    }

    /// Mark a class as library (non-application) code
    pub fn set_library(&mut self, class: ClassId) {
        self.classes[class.index()].is_application = false;
    }

    pub fn add_field(
        &mut self,
        class: ClassId,
        name: impl Into<String>,
        ty: Type,
        is_static: bool,
    ) -> FieldId {
        let id = FieldId::new(self.fields.len());
        self.fields.push(JField {
            name: name.into(),
            declaring_class: class,
            ty,
            is_static,
        });
        self.classes[class.index()].fields.push(id);
        id
    }

    /// Declare a method; give it a body with [`ProgramBuilder::body`]
    pub fn add_method(
        &mut self,
        class: ClassId,
        name: impl Into<String>,
        param_types: Vec<Type>,
        return_type: Type,
        flags: MethodFlags,
    ) -> MethodId {
        let name = name.into();
        let params: Vec<String> = param_types
            .iter()
            .map(|t| type_name(&self.classes, t))
            .collect();
        let subsignature = format!(
            "{} {}({})",
            type_name(&self.classes, &return_type),
            name,
            params.join(",")
        );
        let id = MethodId::new(self.methods.len());
        let jc = &mut self.classes[class.index()];
        jc.methods.push(id);
        jc.declared.insert(subsignature.clone(), id);
        self.methods.push(JMethod {
            name,
            declaring_class: class,
            param_types,
            return_type,
            flags,
            subsignature,
            ir: None,
        });
        id
    }

    pub fn set_main(&mut self, method: MethodId) {
        self.main_method = Some(method);
    }

    /// Reference to `method` as a call site would spell it
    pub fn method_ref(&self, method: MethodId) -> MethodRef {
        let m = &self.methods[method.index()];
        MethodRef::new(m.declaring_class, m.subsignature.clone())
    }

    pub fn method_subsignature(&self, method: MethodId) -> &str {
        &self.methods[method.index()].subsignature
    }

    /// Start the body of `method`; `this` and parameter variables are
    /// created up front.
    pub fn body(&mut self, method: MethodId) -> BodyBuilder<'_> {
        let (is_static, param_types) = {
            let m = &self.methods[method.index()];
            (m.is_static(), m.param_types.clone())
        };
        let class = self.methods[method.index()].declaring_class;
        let mut body = BodyBuilder {
            pb: self,
            method,
            ir: MethodIr::default(),
        };
        if !is_static {
            let this = body.var("this", Type::Class(class));
            body.ir.this = Some(this);
        }
        for (i, ty) in param_types.into_iter().enumerate() {
            let p = body.var(format!("p{i}"), ty);
            body.ir.params.push(p);
        }
        body
    }

    pub fn build(self) -> Program {
        let class_index = self
            .classes
            .iter()
            .enumerate()
            .map(|(i, c)| (c.name.clone(), ClassId::new(i)))
            .collect();
        let method_index = self
            .methods
            .iter()
            .enumerate()
            .map(|(i, m)| {
                let class = &self.classes[m.declaring_class.index()].name;
                (format!("<{}: {}>", class, m.subsignature), MethodId::new(i))
            })
            .collect();
        let field_index = self
            .fields
            .iter()
            .enumerate()
            .map(|(i, f)| {
                let class = &self.classes[f.declaring_class.index()].name;
                let sig = format!("<{}: {} {}>", class, type_name(&self.classes, &f.ty), f.name);
                (sig, FieldId::new(i))
            })
            .collect();
        Program {
            classes: self.classes,
            fields: self.fields,
            methods: self.methods,
            vars: self.vars,
            class_index,
            method_index,
            field_index,
            main_method: self.main_method,
        }
    }
}

/// Appends statements to one method body
pub struct BodyBuilder<'b> {
    pb: &'b mut ProgramBuilder,
    method: MethodId,
    ir: MethodIr,
}

impl BodyBuilder<'_> {
    pub fn method(&self) -> MethodId {
        self.method
    }

    pub fn this(&self) -> Option<VarId> {
        self.ir.this
    }

    pub fn param(&self, index: usize) -> VarId {
        self.ir.params[index]
    }

    pub fn var(&mut self, name: impl Into<String>, ty: Type) -> VarId {
        let id = VarId::new(self.pb.vars.len());
        self.pb.vars.push(Var {
            name: name.into(),
            ty,
            method: self.method,
        });
        self.ir.vars.push(id);
        id
    }

    /// Append a statement, returning its index
    pub fn push(&mut self, stmt: Stmt) -> u32 {
        if let Stmt::Return { value: Some(v) } = &stmt {
            if !self.ir.return_vars.contains(v) {
                self.ir.return_vars.push(*v);
            }
        }
        self.ir.stmts.push(stmt);
        (self.ir.stmts.len() - 1) as u32
    }

    pub fn new_obj(&mut self, lhs: VarId, ty: Type) -> u32 {
        self.push(Stmt::New { lhs, ty })
    }

    pub fn literal(&mut self, lhs: VarId, literal: Literal) -> u32 {
        self.push(Stmt::AssignLiteral { lhs, literal })
    }

    pub fn copy(&mut self, lhs: VarId, rhs: VarId) -> u32 {
        self.push(Stmt::Copy { lhs, rhs })
    }

    pub fn cast(&mut self, lhs: VarId, rhs: VarId, ty: Type) -> u32 {
        self.push(Stmt::Cast { lhs, rhs, ty })
    }

    pub fn load_field(&mut self, lhs: VarId, base: VarId, field: FieldId) -> u32 {
        self.push(Stmt::LoadField {
            lhs,
            base: Some(base),
            field,
        })
    }

    pub fn store_field(&mut self, base: VarId, field: FieldId, rhs: VarId) -> u32 {
        self.push(Stmt::StoreField {
            base: Some(base),
            field,
            rhs,
        })
    }

    pub fn load_static(&mut self, lhs: VarId, field: FieldId) -> u32 {
        self.push(Stmt::LoadField {
            lhs,
            base: None,
            field,
        })
    }

    pub fn store_static(&mut self, field: FieldId, rhs: VarId) -> u32 {
        self.push(Stmt::StoreField {
            base: None,
            field,
            rhs,
        })
    }

    pub fn load_array(&mut self, lhs: VarId, base: VarId) -> u32 {
        self.push(Stmt::LoadArray { lhs, base })
    }

    pub fn store_array(&mut self, base: VarId, rhs: VarId) -> u32 {
        self.push(Stmt::StoreArray { base, rhs })
    }

    pub fn invoke(
        &mut self,
        kind: InvokeKind,
        method_ref: MethodRef,
        base: Option<VarId>,
        args: Vec<VarId>,
        result: Option<VarId>,
    ) -> u32 {
        self.push(Stmt::Invoke(Invoke {
            kind,
            method_ref,
            base,
            args,
            result,
        }))
    }

    pub fn invoke_virtual(
        &mut self,
        base: VarId,
        callee: MethodId,
        args: Vec<VarId>,
        result: Option<VarId>,
    ) -> u32 {
        let mref = self.pb.method_ref(callee);
        self.invoke(InvokeKind::Virtual, mref, Some(base), args, result)
    }

    pub fn invoke_special(
        &mut self,
        base: VarId,
        callee: MethodId,
        args: Vec<VarId>,
        result: Option<VarId>,
    ) -> u32 {
        let mref = self.pb.method_ref(callee);
        self.invoke(InvokeKind::Special, mref, Some(base), args, result)
    }

    pub fn invoke_static(
        &mut self,
        callee: MethodId,
        args: Vec<VarId>,
        result: Option<VarId>,
    ) -> u32 {
        let mref = self.pb.method_ref(callee);
        self.invoke(InvokeKind::Static, mref, None, args, result)
    }

    pub fn ret(&mut self, value: Option<VarId>) -> u32 {
        self.push(Stmt::Return { value })
    }

    pub fn throw(&mut self, value: VarId) -> u32 {
        self.push(Stmt::Throw { value })
    }

    pub fn catch(&mut self, lhs: VarId) -> u32 {
        self.push(Stmt::Catch { lhs })
    }

    /// Protect statements `start..end` with the handler defining `var`
    pub fn handler(&mut self, start: u32, end: u32, catch_type: Option<Type>, var: VarId) {
        self.ir.handlers.push(CatchHandler {
            range: start..end,
            catch_type,
            var,
        });
    }

    /// Attach the body to its method
    pub fn finish(self) -> MethodId {
        self.pb.methods[self.method.index()].ir = Some(self.ir);
        self.method
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_body_creates_this_and_params() {
        let mut b = ProgramBuilder::new();
        let object = b.add_class("java.lang.Object", None);
        let string = b.add_class("java.lang.String", Some(object));
        let m = b.add_method(
            object,
            "equals",
            vec![Type::Class(string)],
            Type::Primitive(crate::shared::models::types::PrimitiveType::Boolean),
            MethodFlags::instance(),
        );
        let mut body = b.body(m);
        let this = body.this().unwrap();
        let p0 = body.param(0);
        body.ret(Some(p0));
        body.finish();
        let program = b.build();

        assert_eq!(program.var(this).name, "this");
        assert_eq!(program.var(p0).ty, Type::Class(string));
        assert_eq!(program.ir(m).unwrap().return_vars, vec![p0]);
        assert_eq!(
            program.method_signature(m),
            "<java.lang.Object: boolean equals(java.lang.String)>"
        );
    }
}
