//! Built-in and custom plugins observed through full analyses

mod common;

use codegraph_pta::features::points_to::domain::{ContextId, Descriptor, NamedResults, Obj, PointerId};
use codegraph_pta::features::points_to::infrastructure::{PhaseScope, PointsToSet, SolverView};
use codegraph_pta::features::points_to::plugin::exception::ThrowResult;
use codegraph_pta::features::points_to::plugin::result_processor::SoundnessWarning;
use codegraph_pta::features::points_to::plugin::{
    Commands, Plugin, PluginRegistry, PluginSetup, PointerRef,
};
use codegraph_pta::shared::models::{
    ClassId, InvokeKind, Literal, MethodFlags, MethodRef, PrimitiveType, ProgramBuilder, StmtRef,
    Type, VarId, CLINIT_NAME, INIT_NAME,
};
use codegraph_pta::{PointerAnalysis, EXCEPTION, SOUNDNESS_WARNINGS};
use common::*;
use pretty_assertions::assert_eq;
use std::collections::HashMap;
use std::rc::Rc;

#[test]
fn test_thrown_object_reaches_caller_handler() {
    let mut b = ProgramBuilder::new();
    let core = add_core(&mut b);
    let exc = b.add_class("MyException", Some(core.object));
    let main_class = b.add_class("Main", Some(core.object));

    let thrower = add_static_void(&mut b, main_class, "thrower");
    let mut body = b.body(thrower);
    let e = body.var("e", Type::Class(exc));
    body.new_obj(e, Type::Class(exc));
    let throw = body.throw(e);
    body.finish();

    let main = add_static_void(&mut b, main_class, "main");
    let mut body = b.body(main);
    let caught = body.var("c", Type::Class(exc));
    let call = body.invoke_static(thrower, vec![], None);
    body.catch(caught);
    body.ret(None);
    body.handler(call, call + 1, Some(Type::Class(exc)), caught);
    body.finish();
    b.set_main(main);
    let program = b.build();

    let result = PointerAnalysis::new(&program, test_config()).analyze().unwrap();

    let thrown = result.points_to_set(e);
    assert_eq!(thrown.len(), 1);
    assert_eq!(result.points_to_set(caught), thrown);

    let throws = result.get_result::<ThrowResult>(EXCEPTION).unwrap();
    assert_eq!(throws.thrown_at(StmtRef::new(thrower, throw as usize)), thrown);
    assert_eq!(throws.thrown_at(StmtRef::new(main, call as usize)), thrown);
    assert_eq!(throws.uncaught_of(thrower), thrown);
    assert!(throws.uncaught_of(main).is_empty());
}

#[test]
fn test_null_handler_gives_null_object() {
    let mut b = ProgramBuilder::new();
    let core = add_core(&mut b);
    let main_class = b.add_class("Main", Some(core.object));
    let main = add_static_void(&mut b, main_class, "main");
    let mut body = b.body(main);
    let v = body.var("v", Type::Class(core.object));
    body.literal(v, Literal::Null);
    body.ret(None);
    body.finish();
    b.set_main(main);
    let program = b.build();

    let plain = PointerAnalysis::new(&program, test_config()).analyze().unwrap();
    assert!(plain.points_to_set(v).is_empty());

    let result = PointerAnalysis::new(&program, test_config().with_plugin("null-handler"))
        .analyze()
        .unwrap();
    let pts = result.points_to_set(v);
    assert_eq!(pts.len(), 1);
    let obj = result.obj(pts[0]);
    assert_eq!(obj.descriptor(), Some(Descriptor::Null));
    assert_eq!(obj.ty, Type::Null);
}

#[test]
fn test_null_receiver_never_enters_special_callee() {
    let mut b = ProgramBuilder::new();
    let core = add_core(&mut b);
    let a = b.add_class("A", Some(core.object));
    let init = add_empty_instance_method(&mut b, a, INIT_NAME);
    let main_class = b.add_class("Main", Some(core.object));
    let main = add_static_void(&mut b, main_class, "main");
    let mut body = b.body(main);
    let v = body.var("v", Type::Class(a));
    body.literal(v, Literal::Null);
    body.invoke_special(v, init, vec![], None);
    body.ret(None);
    body.finish();
    b.set_main(main);
    let program = b.build();

    let result = PointerAnalysis::new(&program, test_config().with_plugin("null-handler"))
        .analyze()
        .unwrap();

    assert_points_to_count(&result, v, 1);
    let this = program.ir(init).unwrap().this.unwrap();
    assert!(result.points_to_set(this).is_empty());
    assert_unreachable(&result, init);
}

#[test]
fn test_unresolved_dispatch_is_a_soundness_warning() {
    let mut b = ProgramBuilder::new();
    let core = add_core(&mut b);
    let a = b.add_class("A", Some(core.object));
    let main_class = b.add_class("Main", Some(core.object));
    let main = add_static_void(&mut b, main_class, "main");
    let mut body = b.body(main);
    let x = body.var("x", Type::Class(a));
    body.new_obj(x, Type::Class(a));
    let call = body.invoke(
        InvokeKind::Virtual,
        MethodRef::new(a, "void missing()"),
        Some(x),
        vec![],
        None,
    );
    body.ret(None);
    body.finish();
    b.set_main(main);
    let program = b.build();

    let result = PointerAnalysis::new(&program, test_config()).analyze().unwrap();

    let warnings = result
        .get_result::<Vec<SoundnessWarning>>(SOUNDNESS_WARNINGS)
        .unwrap();
    assert_eq!(
        warnings,
        &vec![SoundnessWarning {
            call_site: StmtRef::new(main, call as usize),
            callee: "<A: void missing()>".to_string(),
            receiver_type: Some("A".to_string()),
        }]
    );
}

#[test]
fn test_reflective_instantiation_of_constant_class_name() {
    let mut b = ProgramBuilder::new();
    let core = add_core(&mut b);
    let class = b.add_class("java.lang.Class", Some(core.object));
    b.set_library(class);
    let for_name = b.add_method(
        class,
        "forName",
        vec![Type::Class(core.string)],
        Type::Class(class),
        MethodFlags::native().with_static(),
    );
    let new_instance = b.add_method(
        class,
        "newInstance",
        vec![],
        Type::Class(core.object),
        MethodFlags::instance(),
    );

    let foo = b.add_class("Foo", Some(core.object));
    let init = b.add_method(foo, INIT_NAME, vec![], Type::Void, MethodFlags::instance());
    let mut body = b.body(init);
    body.ret(None);
    body.finish();
    let clinit = b.add_method(foo, CLINIT_NAME, vec![], Type::Void, MethodFlags::static_());
    let mut body = b.body(clinit);
    body.ret(None);
    body.finish();

    let main_class = b.add_class("Main", Some(core.object));
    let main = add_static_void(&mut b, main_class, "main");
    let mut body = b.body(main);
    let name = body.var("name", Type::Class(core.string));
    let c = body.var("c", Type::Class(class));
    let o = body.var("o", Type::Class(core.object));
    body.literal(name, Literal::String("Foo".to_string()));
    body.invoke_static(for_name, vec![name], Some(c));
    body.invoke_virtual(c, new_instance, vec![], Some(o));
    body.ret(None);
    body.finish();
    b.set_main(main);
    let program = b.build();

    let result = PointerAnalysis::new(&program, test_config().with_reflection(true))
        .analyze()
        .unwrap();

    let class_objs = result.points_to_set(c);
    assert_eq!(class_objs.len(), 1);
    assert_eq!(
        result.obj(class_objs[0]).constant(),
        Some(&Literal::Class(Type::Class(foo)))
    );

    let instances = result.points_to_set(o);
    assert_eq!(instances.len(), 1);
    let instance = result.obj(instances[0]);
    assert_eq!(instance.descriptor(), Some(Descriptor::Reflective));
    assert_eq!(instance.ty, Type::Class(foo));

    assert_reachable(&result, init);
    assert_reachable(&result, clinit);
    let this = program.ir(init).unwrap().this.unwrap();
    assert_eq!(result.points_to_set(this), instances);
}

#[test]
fn test_number_literals_share_one_object_per_value() {
    let mut b = ProgramBuilder::new();
    let core = add_core(&mut b);
    let main_class = b.add_class("Main", Some(core.object));
    let main = add_static_void(&mut b, main_class, "main");
    let int = Type::Primitive(PrimitiveType::Int);
    let mut body = b.body(main);
    let n1 = body.var("n1", int.clone());
    let n2 = body.var("n2", int.clone());
    let n3 = body.var("n3", int.clone());
    body.literal(n1, Literal::Int(42));
    body.literal(n2, Literal::Int(42));
    body.literal(n3, Literal::Int(7));
    body.ret(None);
    body.finish();
    b.set_main(main);
    let program = b.build();

    let result = PointerAnalysis::new(&program, test_config().with_plugin("number-literal"))
        .analyze()
        .unwrap();

    let forty_two = result.points_to_set(n1);
    assert_eq!(forty_two.len(), 1);
    assert_eq!(result.points_to_set(n2), forty_two);
    let seven = result.points_to_set(n3);
    assert_eq!(seven.len(), 1);
    assert_ne!(seven, forty_two);
    let obj = result.obj(forty_two[0]);
    assert_eq!(obj.descriptor(), Some(Descriptor::Number));
    assert_eq!(obj.ty, int);
}

#[test]
fn test_native_clone_and_arraycopy_models() {
    let mut b = ProgramBuilder::new();
    let core = add_core(&mut b);
    let object_ty = Type::Class(core.object);
    let int = Type::Primitive(PrimitiveType::Int);
    let clone = b.add_method(
        core.object,
        "clone",
        vec![],
        object_ty.clone(),
        MethodFlags::native(),
    );
    let system = b.add_class("java.lang.System", Some(core.object));
    b.set_library(system);
    let arraycopy = b.add_method(
        system,
        "arraycopy",
        vec![object_ty.clone(), int.clone(), object_ty.clone(), int.clone(), int.clone()],
        Type::Void,
        MethodFlags::native().with_static(),
    );
    let a = b.add_class("A", Some(core.object));
    let main_class = b.add_class("Main", Some(core.object));
    let main = add_static_void(&mut b, main_class, "main");
    let array_ty = Type::array_of(object_ty.clone());

    let mut body = b.body(main);
    let x = body.var("x", Type::Class(a));
    let copy = body.var("copy", object_ty.clone());
    let src = body.var("src", array_ty.clone());
    let dest = body.var("dest", array_ty.clone());
    let elem = body.var("elem", Type::Class(a));
    let out = body.var("out", object_ty.clone());
    let i = body.var("i", int.clone());
    body.new_obj(x, Type::Class(a));
    body.invoke_virtual(x, clone, vec![], Some(copy));
    body.new_obj(src, array_ty.clone());
    body.new_obj(elem, Type::Class(a));
    body.store_array(src, elem);
    body.new_obj(dest, array_ty);
    body.invoke_static(arraycopy, vec![src, i, dest, i, i], None);
    body.load_array(out, dest);
    body.ret(None);
    body.finish();
    b.set_main(main);
    let program = b.build();

    let result = PointerAnalysis::new(&program, test_config()).analyze().unwrap();

    assert_eq!(result.points_to_set(copy), result.points_to_set(x));
    assert_points_to_count(&result, out, 1);
    assert_eq!(result.points_to_set(out), result.points_to_set(elem));
}

#[test]
fn test_arrays_copy_of_returns_a_fresh_array() {
    let mut b = ProgramBuilder::new();
    let core = add_core(&mut b);
    let object_ty = Type::Class(core.object);
    let array_ty = Type::array_of(object_ty.clone());
    let int = Type::Primitive(PrimitiveType::Int);
    let arrays = b.add_class("java.util.Arrays", Some(core.object));
    b.set_library(arrays);
    let copy_of = b.add_method(
        arrays,
        "copyOf",
        vec![array_ty.clone(), int.clone()],
        array_ty.clone(),
        MethodFlags::native().with_static(),
    );
    let a = b.add_class("A", Some(core.object));
    let main_class = b.add_class("Main", Some(core.object));
    let main = add_static_void(&mut b, main_class, "main");

    // src[*] = elem; copy = Arrays.copyOf(src, i); out = copy[*];
    // copy[*] = other; back = src[*];
    let mut body = b.body(main);
    let src = body.var("src", array_ty.clone());
    let copy = body.var("copy", array_ty.clone());
    let elem = body.var("elem", Type::Class(a));
    let other = body.var("other", Type::Class(a));
    let out = body.var("out", object_ty.clone());
    let back = body.var("back", object_ty);
    let i = body.var("i", int);
    body.new_obj(src, array_ty);
    body.new_obj(elem, Type::Class(a));
    body.store_array(src, elem);
    body.invoke_static(copy_of, vec![src, i], Some(copy));
    body.load_array(out, copy);
    body.new_obj(other, Type::Class(a));
    body.store_array(copy, other);
    body.load_array(back, src);
    body.ret(None);
    body.finish();
    b.set_main(main);
    let program = b.build();

    let result = PointerAnalysis::new(&program, test_config()).analyze().unwrap();

    let copies = result.points_to_set(copy);
    assert_eq!(copies.len(), 1);
    assert_ne!(copies, result.points_to_set(src));
    assert_eq!(result.obj(copies[0]).descriptor(), Some(Descriptor::Native));
    let mut both = result.points_to_set(elem);
    both.extend(result.points_to_set(other));
    both.sort();
    assert_eq!(result.points_to_set(out), both);
    // writes into the copy stay out of the source array
    assert_eq!(result.points_to_set(back), result.points_to_set(elem));
}

#[test]
fn test_current_thread_sees_started_threads() {
    let mut b = ProgramBuilder::new();
    let core = add_core(&mut b);
    let thread = b.add_class("java.lang.Thread", Some(core.object));
    b.set_library(thread);
    let thread_ty = Type::Class(thread);
    let start = add_empty_instance_method(&mut b, thread, "start");
    let current = b.add_method(
        thread,
        "currentThread",
        vec![],
        thread_ty.clone(),
        MethodFlags::static_(),
    );
    let mut body = b.body(current);
    let running = body.var("running", thread_ty.clone());
    body.ret(Some(running));
    body.finish();

    let main_class = b.add_class("Main", Some(core.object));
    let main = add_static_void(&mut b, main_class, "main");
    let mut body = b.body(main);
    let t = body.var("t", thread_ty.clone());
    let cur = body.var("cur", thread_ty.clone());
    body.new_obj(t, thread_ty);
    body.invoke_virtual(t, start, vec![], None);
    body.invoke_static(current, vec![], Some(cur));
    body.ret(None);
    body.finish();
    b.set_main(main);
    let program = b.build();

    let result = PointerAnalysis::new(&program, test_config()).analyze().unwrap();

    // no implicit entries, so no main thread object
    assert_eq!(result.points_to_set(cur), result.points_to_set(t));
    assert_points_to_count(&result, cur, 1);
}

/// Checks every delta against the pointer's set as the solve runs
#[derive(Default)]
struct MonotonicityCheck {
    sizes: HashMap<PointerId, usize>,
    checks: usize,
}

impl Plugin for MonotonicityCheck {
    fn name(&self) -> &str {
        "monotonicity-check"
    }

    fn on_new_points_to_set(
        &mut self,
        view: &SolverView<'_>,
        pointer: PointerId,
        diff: &PointsToSet,
        _out: &mut Commands,
    ) {
        let current = view.points_to(pointer).expect("delta arrived at a set");
        assert!(diff.iter().all(|o| current.contains(o)));
        let before = self.sizes.insert(pointer, current.len()).unwrap_or(0);
        assert!(current.len() >= before + diff.len());
        self.checks += 1;
    }

    fn on_finish(&mut self, _view: &SolverView<'_>, results: &mut NamedResults) {
        results.insert("monotonicity-checks", self.checks);
    }
}

fn monotonicity_factory(_: &PluginSetup<'_>) -> codegraph_pta::Result<Box<dyn Plugin>> {
    Ok(Box::new(MonotonicityCheck::default()))
}

#[test]
fn test_points_to_sets_only_grow_during_propagation() {
    let mut registry = PluginRegistry::with_builtins();
    registry.register("monotonicity-check", monotonicity_factory);

    let fx = dispatch_program(true);
    for cs in ["ci", "1-call", "2-obj"] {
        let result = PointerAnalysis::new(
            &fx.program,
            test_config().with_cs(cs).with_plugin("monotonicity-check"),
        )
        .with_registry(registry.clone())
        .analyze()
        .unwrap();
        let checks = result.get_result::<usize>("monotonicity-checks").unwrap();
        assert!(*checks > 0, "{cs}");
    }
}

/// Drops `A` objects from `x` once the first phase settles
struct LateFilter {
    x: VarId,
    a: ClassId,
    added: bool,
    removed: usize,
}

impl Plugin for LateFilter {
    fn name(&self) -> &str {
        "late-filter"
    }

    fn on_phase_finish(&mut self, scope: &mut PhaseScope<'_>, out: &mut Commands) {
        self.removed += scope.removed();
        if self.added {
            return;
        }
        self.added = true;
        let a = self.a;
        out.add_pointer_filter(
            PointerRef::Var {
                context: ContextId::EMPTY,
                var: self.x,
            },
            Rc::new(move |obj: &Obj| obj.ty != Type::Class(a)),
        );
    }

    fn on_finish(&mut self, _view: &SolverView<'_>, results: &mut NamedResults) {
        results.insert("late-filter-removed", self.removed);
    }
}

fn late_filter_factory(setup: &PluginSetup<'_>) -> codegraph_pta::Result<Box<dyn Plugin>> {
    let program = setup.program;
    let main = program.main_method().expect("main method");
    let x = program
        .ir(main)
        .and_then(|ir| ir.vars.iter().copied().find(|v| program.var(*v).name == "x"))
        .expect("x in main");
    Ok(Box::new(LateFilter {
        x,
        a: program.class_by_name("A").expect("class A"),
        added: false,
        removed: 0,
    }))
}

#[test]
fn test_filter_added_at_phase_end_runs_another_phase() {
    let mut registry = PluginRegistry::with_builtins();
    registry.register("late-filter", late_filter_factory);
    let fx = dispatch_program(true);

    let result = PointerAnalysis::new(&fx.program, test_config().with_plugin("late-filter"))
        .with_registry(registry)
        .analyze()
        .unwrap();

    let left = result.points_to_set(fx.x);
    assert_eq!(left.len(), 1);
    let b = fx.program.class_by_name("B").unwrap();
    assert_eq!(result.obj(left[0]).ty, Type::Class(b));
    assert!(result.stats().phases >= 2);
    assert_eq!(result.stats().filtered_out, 1);
    assert_eq!(result.get_result::<usize>("late-filter-removed"), Some(&1));
}
