//! Small programs exercising one analysis feature each

use codegraph_pta::shared::models::{
    ClassId, FieldId, MethodFlags, MethodId, Program, ProgramBuilder, StmtRef, Type, VarId,
};
use codegraph_pta::PtaConfig;
use std::path::Path;

/// Options used by most tests: no JVM bootstrap entries
pub fn test_config() -> PtaConfig {
    PtaConfig::default().with_implicit_entries(false)
}

/// `java.lang.Object` and `java.lang.String`
pub struct Core {
    pub object: ClassId,
    pub string: ClassId,
}

pub fn add_core(b: &mut ProgramBuilder) -> Core {
    let object = b.add_class("java.lang.Object", None);
    let string = b.add_class("java.lang.String", Some(object));
    b.set_library(object);
    b.set_library(string);
    Core { object, string }
}

/// Static `void name()` in `class`
pub fn add_static_void(b: &mut ProgramBuilder, class: ClassId, name: &str) -> MethodId {
    b.add_method(class, name, vec![], Type::Void, MethodFlags::static_())
}

/// Instance `void name()` whose body only returns
pub fn add_empty_instance_method(b: &mut ProgramBuilder, class: ClassId, name: &str) -> MethodId {
    let m = b.add_method(class, name, vec![], Type::Void, MethodFlags::instance());
    let mut body = b.body(m);
    body.ret(None);
    body.finish();
    m
}

// ═══════════════════════════════════════════════════════════════════════════
// Virtual dispatch
// ═══════════════════════════════════════════════════════════════════════════

pub struct DispatchFixture {
    pub program: Program,
    pub main: MethodId,
    pub a_f: MethodId,
    pub b_f: MethodId,
    pub unused: MethodId,
    pub x: VarId,
    pub call: StmtRef,
    /// Variable of `unused` (never reachable)
    pub unused_var: VarId,
}

/// ```text
/// class A { void f() {} }
/// class B extends A { void f() {} }
/// static void main() { A x; x = new B(); [x = new A();] x.f(); }
/// static void unused() { A y = new A(); y.f(); }
/// ```
pub fn dispatch_program(alloc_a: bool) -> DispatchFixture {
    let mut b = ProgramBuilder::new();
    let core = add_core(&mut b);
    let a = b.add_class("A", Some(core.object));
    let sub = b.add_class("B", Some(a));
    let main_class = b.add_class("Main", Some(core.object));
    let a_f = add_empty_instance_method(&mut b, a, "f");
    let b_f = add_empty_instance_method(&mut b, sub, "f");

    let unused = add_static_void(&mut b, main_class, "unused");
    let mut body = b.body(unused);
    let unused_var = body.var("y", Type::Class(a));
    body.new_obj(unused_var, Type::Class(a));
    body.invoke_virtual(unused_var, a_f, vec![], None);
    body.ret(None);
    body.finish();

    let main = add_static_void(&mut b, main_class, "main");
    let mut body = b.body(main);
    let x = body.var("x", Type::Class(a));
    body.new_obj(x, Type::Class(sub));
    if alloc_a {
        body.new_obj(x, Type::Class(a));
    }
    let call = body.invoke_virtual(x, a_f, vec![], None);
    body.ret(None);
    body.finish();
    b.set_main(main);

    DispatchFixture {
        program: b.build(),
        main,
        a_f,
        b_f,
        unused,
        x,
        call: StmtRef::new(main, call as usize),
        unused_var,
    }
}

// ═══════════════════════════════════════════════════════════════════════════
// Static fields
// ═══════════════════════════════════════════════════════════════════════════

pub struct StaticFieldFixture {
    pub program: Program,
    pub field: FieldId,
    pub writer: MethodId,
    pub reader: MethodId,
    /// Object stored by the writer
    pub stored: VarId,
    /// Variable the reader loads into
    pub loaded: VarId,
}

/// ```text
/// class C { static Object f; }
/// static void write() { Object o = new Object(); C.f = o; }
/// static void read() { Object r = C.f; }
/// static void main() { [write();] [read();] }
/// ```
pub fn static_field_program(call_writer: bool, call_reader: bool) -> StaticFieldFixture {
    let mut b = ProgramBuilder::new();
    let core = add_core(&mut b);
    let holder = b.add_class("C", Some(core.object));
    let field = b.add_field(holder, "f", Type::Class(core.object), true);
    let main_class = b.add_class("Main", Some(core.object));

    let writer = add_static_void(&mut b, main_class, "write");
    let mut body = b.body(writer);
    let stored = body.var("o", Type::Class(core.object));
    body.new_obj(stored, Type::Class(core.object));
    body.store_static(field, stored);
    body.ret(None);
    body.finish();

    let reader = add_static_void(&mut b, main_class, "read");
    let mut body = b.body(reader);
    let loaded = body.var("r", Type::Class(core.object));
    body.load_static(loaded, field);
    body.ret(None);
    body.finish();

    let main = add_static_void(&mut b, main_class, "main");
    let mut body = b.body(main);
    if call_writer {
        body.invoke_static(writer, vec![], None);
    }
    if call_reader {
        body.invoke_static(reader, vec![], None);
    }
    body.ret(None);
    body.finish();
    b.set_main(main);

    StaticFieldFixture {
        program: b.build(),
        field,
        writer,
        reader,
        stored,
        loaded,
    }
}

// ═══════════════════════════════════════════════════════════════════════════
// Context sensitivity
// ═══════════════════════════════════════════════════════════════════════════

pub struct IdentityFixture {
    pub program: Program,
    pub id: MethodId,
    pub r1: VarId,
    pub r2: VarId,
    pub o1: VarId,
    pub o2: VarId,
}

/// ```text
/// static Object id(Object p) { return p; }
/// static void main() {
///     Object o1 = new Object(); Object o2 = new Object();
///     Object r1 = id(o1); Object r2 = id(o2);
/// }
/// ```
pub fn identity_program() -> IdentityFixture {
    let mut b = ProgramBuilder::new();
    let core = add_core(&mut b);
    let obj_ty = Type::Class(core.object);
    let main_class = b.add_class("Main", Some(core.object));
    let id = b.add_method(
        main_class,
        "id",
        vec![obj_ty.clone()],
        obj_ty.clone(),
        MethodFlags::static_(),
    );
    let mut body = b.body(id);
    let p = body.param(0);
    body.ret(Some(p));
    body.finish();

    let main = add_static_void(&mut b, main_class, "main");
    let mut body = b.body(main);
    let o1 = body.var("o1", obj_ty.clone());
    let o2 = body.var("o2", obj_ty.clone());
    let r1 = body.var("r1", obj_ty.clone());
    let r2 = body.var("r2", obj_ty);
    body.new_obj(o1, Type::Class(core.object));
    body.new_obj(o2, Type::Class(core.object));
    body.invoke_static(id, vec![o1], Some(r1));
    body.invoke_static(id, vec![o2], Some(r2));
    body.ret(None);
    body.finish();
    b.set_main(main);

    IdentityFixture {
        program: b.build(),
        id,
        r1,
        r2,
        o1,
        o2,
    }
}

/// `main` calls `m0`, `m{i}` calls `m{i+1}` at two sites, up to `m{depth}`
pub fn call_chain_program(depth: usize) -> (Program, Vec<MethodId>) {
    let mut b = ProgramBuilder::new();
    let core = add_core(&mut b);
    let main_class = b.add_class("Main", Some(core.object));
    let methods: Vec<MethodId> = (0..=depth)
        .map(|i| add_static_void(&mut b, main_class, &format!("m{i}")))
        .collect();
    for pair in methods.windows(2) {
        let mut body = b.body(pair[0]);
        body.invoke_static(pair[1], vec![], None);
        body.invoke_static(pair[1], vec![], None);
        body.ret(None);
        body.finish();
    }
    if let Some(last) = methods.last() {
        let mut body = b.body(*last);
        body.ret(None);
        body.finish();
    }
    let main = add_static_void(&mut b, main_class, "main");
    let mut body = b.body(main);
    body.invoke_static(methods[0], vec![], None);
    body.ret(None);
    body.finish();
    b.set_main(main);
    (b.build(), methods)
}

// ═══════════════════════════════════════════════════════════════════════════
// Taint
// ═══════════════════════════════════════════════════════════════════════════

pub struct TaintFixture {
    pub program: Program,
    pub get_input: MethodId,
    pub exec: MethodId,
    pub exec_call: StmtRef,
    pub s: VarId,
}

pub const SOURCE_SIG: &str = "<Test: java.lang.String getInput()>";
pub const SINK_SIG: &str = "<Test: void exec(java.lang.String)>";

/// ```text
/// class Test {
///     static String getInput() { return new String(); }
///     static void exec(String cmd) {}
///     static void main() { String s = getInput(); exec(s); }
/// }
/// ```
pub fn taint_program() -> TaintFixture {
    let mut b = ProgramBuilder::new();
    let core = add_core(&mut b);
    let string_ty = Type::Class(core.string);
    let test = b.add_class("Test", Some(core.object));

    let get_input = b.add_method(
        test,
        "getInput",
        vec![],
        string_ty.clone(),
        MethodFlags::static_(),
    );
    let mut body = b.body(get_input);
    let v = body.var("v", string_ty.clone());
    body.new_obj(v, string_ty.clone());
    body.ret(Some(v));
    body.finish();

    let exec = b.add_method(
        test,
        "exec",
        vec![string_ty.clone()],
        Type::Void,
        MethodFlags::static_(),
    );
    let mut body = b.body(exec);
    body.ret(None);
    body.finish();

    let main = add_static_void(&mut b, test, "main");
    let mut body = b.body(main);
    let s = body.var("s", string_ty);
    body.invoke_static(get_input, vec![], Some(s));
    let exec_call = body.invoke_static(exec, vec![s], None);
    body.ret(None);
    body.finish();
    b.set_main(main);

    TaintFixture {
        program: b.build(),
        get_input,
        exec,
        exec_call: StmtRef::new(main, exec_call as usize),
        s,
    }
}

/// Taint document with the `getInput` source and the `exec` sink
pub fn taint_yaml(sanitize_exec: bool) -> String {
    let mut doc = format!(
        "sources:\n  - {{ kind: call, method: \"{SOURCE_SIG}\", index: result }}\n\
         sinks:\n  - {{ method: \"{SINK_SIG}\", index: 0 }}\n"
    );
    if sanitize_exec {
        doc.push_str(&format!(
            "sanitizers:\n  - {{ kind: param, method: \"{SINK_SIG}\", index: 0 }}\n"
        ));
    }
    doc
}

pub fn write_file(dir: &Path, name: &str, contents: &str) -> std::path::PathBuf {
    let path = dir.join(name);
    std::fs::write(&path, contents).expect("write fixture file");
    path
}
