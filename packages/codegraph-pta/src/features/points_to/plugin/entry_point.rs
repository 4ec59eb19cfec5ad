//! Entry methods and their mock arguments
//!
//! Configured `entry_methods` (or the program's `main`) are analyzed in the
//! empty context. Reference-typed parameters receive one mock object each;
//! array parameters additionally get a mock element so `args[i]` is not
//! empty. With implicit entries enabled, JVM bootstrap methods present in
//! the program are added as entries without arguments.

use super::{Commands, Plugin};
use crate::config::PtaConfig;
use crate::features::points_to::domain::{
    Descriptor, EntryPoint, HeapModel, MockKey, ParamProvider,
};
use crate::features::points_to::infrastructure::solver_view::SolverView;
use crate::shared::models::{MethodId, Program, Type};
use tracing::{debug, warn};

/// Methods the JVM invokes before or around `main`
pub const IMPLICIT_ENTRIES: &[&str] = &[
    "<java.lang.System: void initializeSystemClass()>",
    "<java.lang.Thread: void exit()>",
    "<java.lang.ThreadGroup: void uncaughtException(java.lang.Thread,java.lang.Throwable)>",
    "<java.lang.ClassLoader: void <init>()>",
    "<java.lang.ClassLoader: java.lang.Class loadClassInternal(java.lang.String)>",
    "<java.lang.ClassLoader: void checkPackageAccess(java.lang.Class,java.security.ProtectionDomain)>",
    "<java.lang.ClassLoader: void addClass(java.lang.Class)>",
    "<java.lang.ClassLoader: long findNative(java.lang.ClassLoader,java.lang.String)>",
    "<java.security.PrivilegedActionException: void <init>(java.lang.Exception)>",
];

pub struct EntryPointHandler {
    entries: Vec<MethodId>,
    implicit: Vec<MethodId>,
}

impl EntryPointHandler {
    pub const ID: &'static str = "entry-point";

    pub fn new(program: &Program, config: &PtaConfig) -> Self {
        let entries = if config.entry_methods.is_empty() {
            program.main_method().into_iter().collect()
        } else {
            config
                .entry_methods
                .iter()
                .filter_map(|sig| {
                    let method = program.method_by_signature(sig);
                    if method.is_none() {
                        warn!(signature = %sig, "entry method not found, skipped");
                    }
                    method
                })
                .collect()
        };
        let implicit = if config.implicit_entries {
            IMPLICIT_ENTRIES
                .iter()
                .filter_map(|sig| program.method_by_signature(sig))
                .collect()
        } else {
            Vec::new()
        };
        Self { entries, implicit }
    }

    pub fn entries(&self) -> &[MethodId] {
        &self.entries
    }
}

/// Mock objects for the `this` and reference parameters of `method`
pub fn mock_params(program: &Program, heap: &HeapModel, method: MethodId) -> ParamProvider {
    let m = program.method(method);
    let mut params = ParamProvider::empty();
    if !m.is_static() {
        let this = heap.mock_obj_in(
            Descriptor::EntryPoint,
            MockKey::Name("this".to_string()),
            Type::Class(m.declaring_class),
            method,
        );
        params = params.with_this(this);
    }
    for (index, ty) in m.param_types.iter().enumerate() {
        if !ty.is_reference() {
            continue;
        }
        let obj = heap.mock_obj_in(
            Descriptor::EntryPoint,
            MockKey::Param(method, index as u32),
            ty.clone(),
            method,
        );
        params = params.with_param(index, obj);
        if let Some(elem_ty) = ty.element_type().filter(|t| t.is_reference()) {
            let elem = heap.mock_obj_in(
                Descriptor::EntryPoint,
                MockKey::Index(index as u32),
                elem_ty.clone(),
                method,
            );
            params = params.with_array_element(obj, elem);
        }
    }
    params
}

impl Plugin for EntryPointHandler {
    fn name(&self) -> &str {
        Self::ID
    }

    fn on_start(&mut self, view: &SolverView<'_>, out: &mut Commands) {
        let program = view.program();
        if self.entries.is_empty() {
            warn!("no entry method; nothing is reachable");
        }
        for &method in &self.entries {
            debug!(method = %program.method_signature(method), "entry method");
            let params = mock_params(program, view.heap(), method);
            out.add_entry_point(EntryPoint::new(method, params));
        }
        for &method in &self.implicit {
            out.add_entry_point(EntryPoint::without_params(method));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shared::models::{MethodFlags, ProgramBuilder};

    #[test]
    fn test_main_gets_string_array_with_element() {
        let mut b = ProgramBuilder::new();
        let object = b.add_class("java.lang.Object", None);
        let string = b.add_class("java.lang.String", Some(object));
        let main_class = b.add_class("Main", Some(object));
        let args = Type::array_of(Type::Class(string));
        let main = b.add_method(main_class, "main", vec![args], Type::Void, MethodFlags::static_());
        b.body(main).finish();
        b.set_main(main);
        let program = b.build();
        let heap = HeapModel::new(&program, true);

        let params = mock_params(&program, &heap, main);
        assert!(params.this_objs.is_empty());
        assert_eq!(params.param_objs.len(), 1);
        assert_eq!(params.array_objs.len(), 1);
        let (_, elem) = params.array_objs[0];
        assert_eq!(heap.obj(elem).ty, Type::Class(string));
    }

    #[test]
    fn test_configured_entry_overrides_main() {
        let mut b = ProgramBuilder::new();
        let object = b.add_class("java.lang.Object", None);
        let c = b.add_class("C", Some(object));
        let run = b.add_method(c, "run", vec![], Type::Void, MethodFlags::instance());
        b.body(run).finish();
        let program = b.build();
        let config = PtaConfig {
            entry_methods: vec!["<C: void run()>".to_string(), "<C: void missing()>".to_string()],
            ..PtaConfig::default()
        };
        let handler = EntryPointHandler::new(&program, &config);
        assert_eq!(handler.entries(), &[run]);
    }
}
