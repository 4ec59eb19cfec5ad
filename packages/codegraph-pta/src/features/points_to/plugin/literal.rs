//! Mock objects for `null` and numeric literals
//!
//! Off by default; requested by id (`null-handler`, `number-literal`).

use super::{Commands, Plugin};
use crate::features::points_to::domain::{CsMethodId, Descriptor, MockKey};
use crate::features::points_to::infrastructure::solver_view::SolverView;
use crate::shared::models::{Literal, MethodId, Stmt, StmtRef, Type, VarId};
use rustc_hash::FxHashMap;

/// Literal assignments per method, recorded once and replayed per context
#[derive(Debug, Default)]
struct LiteralAssigns {
    by_method: FxHashMap<MethodId, Vec<(VarId, Literal)>>,
}

impl LiteralAssigns {
    fn record(&mut self, view: &SolverView<'_>, stmt: StmtRef, accept: fn(&Literal) -> bool) {
        if let Some(Stmt::AssignLiteral { lhs, literal }) = view.program().stmt(stmt) {
            if accept(literal) {
                self.by_method
                    .entry(stmt.method)
                    .or_default()
                    .push((*lhs, literal.clone()));
            }
        }
    }

    fn of(&self, method: MethodId) -> &[(VarId, Literal)] {
        self.by_method.get(&method).map(Vec::as_slice).unwrap_or_default()
    }
}

/// `x = null` points `x` to a single null object
#[derive(Debug, Default)]
pub struct NullHandler {
    assigns: LiteralAssigns,
}

impl NullHandler {
    pub const ID: &'static str = "null-handler";
}

impl Plugin for NullHandler {
    fn name(&self) -> &str {
        Self::ID
    }

    fn on_new_stmt(&mut self, view: &SolverView<'_>, stmt: StmtRef, _out: &mut Commands) {
        self.assigns
            .record(view, stmt, |l| matches!(l, Literal::Null));
    }

    fn on_new_cs_method(&mut self, view: &SolverView<'_>, method: CsMethodId, out: &mut Commands) {
        let (context, method) = view.cs_method(method);
        let assigns = self.assigns.of(method);
        if assigns.is_empty() {
            return;
        }
        let null = view
            .heap()
            .mock_obj(Descriptor::Null, MockKey::Literal(Literal::Null), Type::Null);
        for (var, _) in assigns {
            out.add_var_obj(context, *var, null);
        }
    }
}

/// `x = 42` points `x` to a number object per distinct value and type
#[derive(Debug, Default)]
pub struct NumberLiteralHandler {
    assigns: LiteralAssigns,
}

impl NumberLiteralHandler {
    pub const ID: &'static str = "number-literal";
}

impl Plugin for NumberLiteralHandler {
    fn name(&self) -> &str {
        Self::ID
    }

    fn on_new_stmt(&mut self, view: &SolverView<'_>, stmt: StmtRef, _out: &mut Commands) {
        self.assigns.record(view, stmt, Literal::is_number);
    }

    fn on_new_cs_method(&mut self, view: &SolverView<'_>, method: CsMethodId, out: &mut Commands) {
        let (context, method) = view.cs_method(method);
        let program = view.program();
        for (var, literal) in self.assigns.of(method) {
            let ty = program.var(*var).ty.clone();
            let obj = view
                .heap()
                .mock_obj(Descriptor::Number, MockKey::Literal(literal.clone()), ty);
            out.add_var_obj(context, *var, obj);
        }
    }
}
