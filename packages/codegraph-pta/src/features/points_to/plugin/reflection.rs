//! Reflection modeling
//!
//! - `Class.forName(name)`: constant names yield the class literal object
//!   and initialize the class; other names yield an unknown-reflective
//!   class object for the call site
//! - `Class.newInstance()`: a reflective object of each known class, plus
//!   an OTHER call edge to its no-argument constructor
//! - `Object.getClass()`: the class literal object of the receiver's type
//! - `Method.invoke` and `Constructor.newInstance`: one unknown-reflective
//!   object per call site

use super::class_initializer::ClassInitTracker;
use super::invoke_model::{InvokeModels, ModeledCall};
use super::{Commands, CsObjRef, Plugin};
use crate::features::points_to::domain::{
    CallKind, ContextId, CsMethodId, Descriptor, MockKey, PointerId, PointerKind,
};
use crate::features::points_to::infrastructure::points_to_set::PointsToSet;
use crate::features::points_to::infrastructure::solver_view::SolverView;
use crate::shared::models::{Literal, MethodId, Program, StmtRef, Type, OBJECT_CLASS};
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReflectionModel {
    ForName,
    ClassNewInstance,
    GetClass,
    MethodInvoke,
    ConstructorNewInstance,
}

pub const REFLECTION_MODELS: &[(&str, ReflectionModel)] = &[
    (
        "<java.lang.Class: java.lang.Class forName(java.lang.String)>",
        ReflectionModel::ForName,
    ),
    (
        "<java.lang.Class: java.lang.Object newInstance()>",
        ReflectionModel::ClassNewInstance,
    ),
    (
        "<java.lang.Object: java.lang.Class getClass()>",
        ReflectionModel::GetClass,
    ),
    (
        "<java.lang.reflect.Method: java.lang.Object invoke(java.lang.Object,java.lang.Object[])>",
        ReflectionModel::MethodInvoke,
    ),
    (
        "<java.lang.reflect.Constructor: java.lang.Object newInstance(java.lang.Object[])>",
        ReflectionModel::ConstructorNewInstance,
    ),
];

const DEFAULT_INIT: &str = "void <init>()";

pub struct ReflectionModeler {
    models: InvokeModels<ReflectionModel>,
    classes: ClassInitTracker,
    class_type: Type,
    object_type: Type,
}

impl ReflectionModeler {
    pub const ID: &'static str = "reflection";

    pub fn new(program: &Program) -> Self {
        let class_or_null = |name: &str| program.class_by_name(name).map_or(Type::Null, Type::Class);
        Self {
            models: InvokeModels::new(program, REFLECTION_MODELS),
            classes: ClassInitTracker::default(),
            class_type: class_or_null("java.lang.Class"),
            object_type: class_or_null(OBJECT_CLASS),
        }
    }

    fn unknown(&self, view: &SolverView<'_>, site: StmtRef, ty: Type) -> CsObjRef {
        let obj = view
            .heap()
            .mock_obj(Descriptor::UnknownReflective, MockKey::Stmt(site), ty);
        CsObjRef::empty(obj)
    }

    fn for_name(
        &mut self,
        view: &SolverView<'_>,
        context: ContextId,
        call: &ModeledCall<ReflectionModel>,
        names: &PointsToSet,
        out: &mut Commands,
    ) {
        let Some(result) = call.invoke.result else {
            return;
        };
        let program = view.program();
        let mut objs = Vec::new();
        for o in names {
            let obj = view.obj(o);
            let class = match obj.constant() {
                Some(Literal::String(name)) => program.class_by_name(name),
                _ => None,
            };
            match class {
                Some(class) => {
                    self.classes.initialize(program, class, out);
                    let literal = Literal::Class(Type::Class(class));
                    objs.push(CsObjRef::empty(view.heap().constant_obj(literal)));
                }
                None => {
                    debug!(site = ?call.site, "Class.forName with unknown class name");
                    objs.push(self.unknown(view, call.site, self.class_type.clone()));
                }
            }
        }
        out.add_var_points_to(context, result, objs);
    }

    fn new_instance(
        &mut self,
        view: &SolverView<'_>,
        context: ContextId,
        call: &ModeledCall<ReflectionModel>,
        class_objs: &PointsToSet,
        out: &mut Commands,
    ) {
        let Some(result) = call.invoke.result else {
            return;
        };
        let program = view.program();
        for o in class_objs {
            let obj = view.obj(o);
            let Some(Literal::Class(Type::Class(class))) = obj.constant() else {
                continue;
            };
            let jc = program.class(*class);
            if jc.is_interface || jc.is_abstract {
                continue;
            }
            let target = view.heap().mock_obj_in(
                Descriptor::Reflective,
                MockKey::Stmt(call.site),
                Type::Class(*class),
                call.site.method,
            );
            let target = CsObjRef::empty(target);
            out.add_var_points_to(context, result, vec![target]);
            if let Some(init) = jc.declared_method(DEFAULT_INIT) {
                out.add_call_edge(CallKind::Other, (context, call.site), init, Some(target));
            }
        }
    }

    fn get_class(
        &self,
        view: &SolverView<'_>,
        context: ContextId,
        call: &ModeledCall<ReflectionModel>,
        receivers: &PointsToSet,
        out: &mut Commands,
    ) {
        let Some(result) = call.invoke.result else {
            return;
        };
        let objs = receivers
            .iter()
            .filter_map(|o| {
                let ty = view.obj(o).ty.clone();
                matches!(ty, Type::Class(_) | Type::Array(_))
                    .then(|| CsObjRef::empty(view.heap().constant_obj(Literal::Class(ty))))
            })
            .collect();
        out.add_var_points_to(context, result, objs);
    }
}

impl Plugin for ReflectionModeler {
    fn name(&self) -> &str {
        Self::ID
    }

    fn on_new_method(&mut self, view: &SolverView<'_>, method: MethodId, _out: &mut Commands) {
        if self.models.is_empty() {
            return;
        }
        let program = view.program();
        let count = program.ir(method).map_or(0, |ir| ir.stmts.len());
        for index in 0..count {
            self.models.record(program, StmtRef::new(method, index));
        }
    }

    fn on_new_cs_method(&mut self, view: &SolverView<'_>, method: CsMethodId, out: &mut Commands) {
        let (context, method) = view.cs_method(method);
        for call in self.models.sites_in(method) {
            if !matches!(
                call.key,
                ReflectionModel::MethodInvoke | ReflectionModel::ConstructorNewInstance
            ) {
                continue;
            }
            if let Some(result) = call.invoke.result {
                let obj = self.unknown(view, call.site, self.object_type.clone());
                out.add_var_points_to(context, result, vec![obj]);
            }
        }
    }

    fn on_new_points_to_set(
        &mut self,
        view: &SolverView<'_>,
        pointer: PointerId,
        diff: &PointsToSet,
        out: &mut Commands,
    ) {
        let PointerKind::Var { context, var } = view.cs().pointer(pointer) else {
            return;
        };
        let calls = self.models.watching(var).to_vec();
        for call in &calls {
            match call.key {
                ReflectionModel::ForName if call.invoke.args.first() == Some(&var) => {
                    self.for_name(view, context, call, diff, out)
                }
                ReflectionModel::ClassNewInstance if call.invoke.base == Some(var) => {
                    self.new_instance(view, context, call, diff, out)
                }
                ReflectionModel::GetClass if call.invoke.base == Some(var) => {
                    self.get_class(view, context, call, diff, out)
                }
                _ => {}
            }
        }
    }
}
