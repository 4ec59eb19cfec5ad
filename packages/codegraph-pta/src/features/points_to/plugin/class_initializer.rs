//! Static initializer triggering
//!
//! A class is initialized when one of its static methods or constructors
//! becomes reachable, or when reachable code allocates it, touches one of
//! its static fields, or calls one of its static methods. Superclasses are
//! initialized first; each `<clinit>` becomes an entry point.

use super::{Commands, Plugin};
use crate::features::points_to::domain::EntryPoint;
use crate::features::points_to::infrastructure::solver_view::SolverView;
use crate::shared::models::{ClassId, MethodId, Program, Stmt, Type};
use rustc_hash::FxHashSet;
use tracing::debug;

/// Subsignature of a static initializer
pub const CLINIT_SUBSIGNATURE: &str = "void <clinit>()";

/// `<clinit>` methods to run before `class` is usable, superclass first
pub fn clinit_chain(program: &Program, class: ClassId) -> Vec<(ClassId, Option<MethodId>)> {
    let mut chain: Vec<_> = program
        .super_classes(class)
        .map(|c| (c, program.class(c).declared_method(CLINIT_SUBSIGNATURE)))
        .collect();
    chain.reverse();
    chain
}

/// Tracks initialized classes and emits `<clinit>` entry points
#[derive(Debug, Default)]
pub struct ClassInitTracker {
    initialized: FxHashSet<ClassId>,
}

impl ClassInitTracker {
    pub fn initialize(&mut self, program: &Program, class: ClassId, out: &mut Commands) {
        if self.initialized.contains(&class) {
            return;
        }
        for (c, clinit) in clinit_chain(program, class) {
            if !self.initialized.insert(c) {
                continue;
            }
            if let Some(clinit) = clinit {
                debug!(class = %program.class(c).name, "class initialized");
                out.add_entry_point(EntryPoint::without_params(clinit));
            }
        }
    }

    pub fn is_initialized(&self, class: ClassId) -> bool {
        self.initialized.contains(&class)
    }
}

#[derive(Debug, Default)]
pub struct ClassInitializer {
    tracker: ClassInitTracker,
}

impl ClassInitializer {
    pub const ID: &'static str = "class-initializer";
}

impl Plugin for ClassInitializer {
    fn name(&self) -> &str {
        Self::ID
    }

    fn on_new_method(&mut self, view: &SolverView<'_>, method: MethodId, out: &mut Commands) {
        let program = view.program();
        let m = program.method(method);
        if m.is_static() || m.is_constructor() {
            self.tracker.initialize(program, m.declaring_class, out);
        }
        let Some(ir) = program.ir(method) else {
            return;
        };
        for stmt in &ir.stmts {
            let class = match stmt {
                Stmt::New { ty: Type::Class(c), .. } => Some(*c),
                Stmt::LoadField {
                    base: None, field, ..
                }
                | Stmt::StoreField {
                    base: None, field, ..
                } => Some(program.field(*field).declaring_class),
                Stmt::Invoke(invoke) if invoke.is_static() => program
                    .resolve_method_ref(&invoke.method_ref)
                    .map(|callee| program.method(callee).declaring_class),
                _ => None,
            };
            if let Some(class) = class {
                self.tracker.initialize(program, class, out);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::points_to::plugin::SolverCommand;
    use crate::shared::models::{MethodFlags, ProgramBuilder};

    #[test]
    fn test_superclass_initialized_first() {
        let mut b = ProgramBuilder::new();
        let object = b.add_class("java.lang.Object", None);
        let a = b.add_class("A", Some(object));
        let bb = b.add_class("B", Some(a));
        let a_clinit = b.add_method(a, "<clinit>", vec![], Type::Void, MethodFlags::static_());
        let b_clinit = b.add_method(bb, "<clinit>", vec![], Type::Void, MethodFlags::static_());
        let program = b.build();

        let chain: Vec<_> = clinit_chain(&program, bb).into_iter().filter_map(|(_, m)| m).collect();
        assert_eq!(chain, vec![a_clinit, b_clinit]);

        let mut tracker = ClassInitTracker::default();
        let mut out = Commands::new();
        tracker.initialize(&program, bb, &mut out);
        tracker.initialize(&program, a, &mut out);
        let entries: Vec<MethodId> = out
            .iter()
            .filter_map(|c| match c {
                SolverCommand::AddEntryPoint(ep) => Some(ep.method),
                _ => None,
            })
            .collect();
        assert_eq!(entries, vec![a_clinit, b_clinit]);
        assert!(tracker.is_initialized(object));
    }
}
