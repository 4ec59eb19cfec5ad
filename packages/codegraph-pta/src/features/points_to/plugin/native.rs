//! Models of native library methods without IR
//!
//! - `System.arraycopy(src, _, dest, _, _)`: elements of every `src` array
//!   flow into every `dest` array
//! - `Arrays.copyOf(array, _)`: the result is a fresh native array per call
//!   site holding the elements of every argument array
//! - `Object.clone()`: the result aliases the receiver

use super::invoke_model::{InvokeModels, ModeledCall};
use super::{Commands, CsObjRef, Plugin, PointerRef};
use crate::features::points_to::domain::{
    ContextId, CsMethodId, Descriptor, EdgeInfo, FlowKind, MockKey, ObjId, PointerId,
    PointerKind,
};
use crate::features::points_to::infrastructure::points_to_set::PointsToSet;
use crate::features::points_to::infrastructure::solver_view::SolverView;
use crate::shared::models::{MethodId, Program, StmtRef};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NativeModel {
    ArrayCopy,
    ArraysCopyOf,
    ObjectClone,
}

pub const NATIVE_MODELS: &[(&str, NativeModel)] = &[
    (
        "<java.lang.System: void arraycopy(java.lang.Object,int,java.lang.Object,int,int)>",
        NativeModel::ArrayCopy,
    ),
    (
        "<java.util.Arrays: java.lang.Object[] copyOf(java.lang.Object[],int)>",
        NativeModel::ArraysCopyOf,
    ),
    ("<java.lang.Object: java.lang.Object clone()>", NativeModel::ObjectClone),
];

const ARRAYCOPY_ORIGIN: &str = "native-arraycopy";
const COPY_OF_ORIGIN: &str = "native-copyof";

/// Edge key of a call site, unique per program
pub(crate) fn site_key(site: StmtRef) -> u64 {
    ((site.method.0 as u64) << 32) | site.index as u64
}

pub struct NativeModeler {
    models: InvokeModels<NativeModel>,
}

impl NativeModeler {
    pub const ID: &'static str = "native";

    pub fn new(program: &Program) -> Self {
        Self {
            models: InvokeModels::new(program, NATIVE_MODELS),
        }
    }

    /// The array `Arrays.copyOf` returns at `call`
    fn copy_of_array(view: &SolverView<'_>, call: &ModeledCall<NativeModel>) -> Option<ObjId> {
        let program = view.program();
        let ty = program
            .resolve_method_ref(&call.invoke.method_ref)
            .map(|m| program.method(m).return_type.clone())?;
        Some(view.heap().mock_obj_in(
            Descriptor::Native,
            MockKey::Stmt(call.site),
            ty,
            call.site.method,
        ))
    }

    /// Elements of each array in `srcs` flow into the copy made at `call`
    fn copy_of(
        view: &SolverView<'_>,
        call: &ModeledCall<NativeModel>,
        srcs: &PointsToSet,
        out: &mut Commands,
    ) {
        let Some(copy) = Self::copy_of_array(view, call) else {
            return;
        };
        for s in srcs {
            out.add_other_edge(
                PointerRef::ArrayIndex {
                    array: CsObjRef::Cs(s),
                },
                PointerRef::ArrayIndex {
                    array: CsObjRef::empty(copy),
                },
                EdgeInfo::new(COPY_OF_ORIGIN, site_key(call.site)),
            );
        }
    }

    fn array_copy(
        view: &SolverView<'_>,
        context: ContextId,
        call: &ModeledCall<NativeModel>,
        changed: (usize, &PointsToSet),
        out: &mut Commands,
    ) {
        let (Some(&src), Some(&dest)) = (call.invoke.args.first(), call.invoke.args.get(2)) else {
            return;
        };
        let full = |var| view.var_points_to(context, var).cloned().unwrap_or_default();
        let (srcs, dests) = match changed {
            (0, diff) => (diff.clone(), full(dest)),
            (_, diff) => (full(src), diff.clone()),
        };
        for s in &srcs {
            for d in &dests {
                out.add_other_edge(
                    PointerRef::ArrayIndex {
                        array: CsObjRef::Cs(s),
                    },
                    PointerRef::ArrayIndex {
                        array: CsObjRef::Cs(d),
                    },
                    EdgeInfo::new(ARRAYCOPY_ORIGIN, site_key(call.site)),
                );
            }
        }
    }
}

impl Plugin for NativeModeler {
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
            let Some(result) = call.invoke.result else {
                continue;
            };
            match call.key {
                NativeModel::ObjectClone => {
                    if let Some(base) = call.invoke.base {
                        out.add_flow_edge(
                            FlowKind::LocalAssign,
                            PointerRef::Var { context, var: base },
                            PointerRef::Var { context, var: result },
                        );
                    }
                }
                NativeModel::ArraysCopyOf => {
                    if let Some(copy) = Self::copy_of_array(view, call) {
                        out.add_var_obj(context, result, copy);
                    }
                    let current = call
                        .invoke
                        .args
                        .first()
                        .and_then(|arg| view.var_points_to(context, *arg));
                    if let Some(srcs) = current {
                        Self::copy_of(view, call, srcs, out);
                    }
                }
                NativeModel::ArrayCopy => {}
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
        for call in self.models.watching(var) {
            if call.key == NativeModel::ObjectClone {
                continue;
            }
            // only calls reachable in this context
            if view.cs().find_method(context, call.site.method).is_none() {
                continue;
            }
            for (position, arg) in call.invoke.args.iter().enumerate() {
                if *arg != var {
                    continue;
                }
                match (call.key, position) {
                    (NativeModel::ArrayCopy, 0 | 2) => {
                        Self::array_copy(view, context, call, (position, diff), out)
                    }
                    (NativeModel::ArraysCopyOf, 0) => Self::copy_of(view, call, diff, out),
                    _ => {}
                }
            }
        }
    }
}
