//! Sink collection after the fixed point
//!
//! Every non-OTHER call edge into a sink method is a sink call; in
//! call-site mode every reachable invoke whose declared target resolves to
//! a sink method is one as well. Taint objects reaching the sink index of
//! a sink call form a flow, unless the callee sanitizes that parameter.

use super::taint_manager::TaintManager;
use crate::features::points_to::domain::{CallKind, PointerKind};
use crate::features::points_to::infrastructure::SolverView;
use crate::features::taint_analysis::domain::{IndexKind, Sink, SinkPoint, TaintConfig, TaintFlow};
use crate::shared::models::{StmtRef, VarId};
use std::collections::BTreeSet;
use tracing::debug;

pub struct SinkHandler {
    sinks: Vec<Sink>,
    call_site_mode: bool,
}

impl SinkHandler {
    pub fn new(config: &TaintConfig) -> Self {
        let sinks = config
            .sinks
            .iter()
            .filter(|sink| {
                let sanitized = sink.index.kind == IndexKind::Var
                    && config.is_sanitized(sink.method, sink.index.index);
                if sanitized {
                    debug!(method = ?sink.method, index = %sink.index, "sink parameter sanitized");
                }
                !sanitized
            })
            .cloned()
            .collect();
        Self {
            sinks,
            call_site_mode: config.call_site_mode,
        }
    }

    pub fn collect(&self, view: &SolverView<'_>, manager: &TaintManager) -> BTreeSet<TaintFlow> {
        let program = view.program();
        let mut flows = BTreeSet::new();
        for sink in &self.sinks {
            let mut calls: BTreeSet<StmtRef> = BTreeSet::new();
            for edge in view.call_graph().edges() {
                if edge.kind == CallKind::Other || view.cs_method(edge.callee).1 != sink.method {
                    continue;
                }
                calls.insert(view.cs().cs_call_site(edge.call_site).1);
            }
            if self.call_site_mode {
                for &cs_method in view.call_graph().reachable_methods() {
                    let (_, method) = view.cs_method(cs_method);
                    let Some(ir) = program.ir(method) else {
                        continue;
                    };
                    for (i, stmt) in ir.stmts.iter().enumerate() {
                        let Some(invoke) = stmt.as_invoke() else {
                            continue;
                        };
                        if program.resolve_method_ref(&invoke.method_ref) == Some(sink.method) {
                            calls.insert(StmtRef::new(method, i));
                        }
                    }
                }
            }
            for call in calls {
                self.collect_at(view, manager, sink, call, &mut flows);
            }
        }
        flows
    }

    fn collect_at(
        &self,
        view: &SolverView<'_>,
        manager: &TaintManager,
        sink: &Sink,
        call: StmtRef,
        flows: &mut BTreeSet<TaintFlow>,
    ) {
        let Some(invoke) = view.program().stmt(call).and_then(|s| s.as_invoke()) else {
            return;
        };
        let Some(arg) = sink.index.index.call_var(invoke) else {
            return;
        };
        let sink_point = SinkPoint {
            call_site: call,
            index: sink.index,
        };
        for obj in objects_at(view, arg, sink.index.kind) {
            if let Some(source) = manager.source_point(&view.obj(obj)) {
                flows.insert(TaintFlow {
                    source,
                    sink: sink_point,
                });
            }
        }
    }
}

/// CS objects at `kind` of `var` across all its contexts
fn objects_at(
    view: &SolverView<'_>,
    var: VarId,
    kind: IndexKind,
) -> Vec<crate::features::points_to::domain::CsObjId> {
    let cs = view.cs();
    let mut objs = Vec::new();
    for &pointer in cs.vars_of(var) {
        let Some(pts) = cs.points_to(pointer) else {
            continue;
        };
        for o in pts {
            let inner = match kind {
                IndexKind::Var => {
                    objs.push(o);
                    continue;
                }
                IndexKind::Array => PointerKind::ArrayIndex { array: o },
                IndexKind::Field(field) => PointerKind::InstanceField { base: o, field },
            };
            if let Some(pts) = cs.find_pointer(&inner).and_then(|p| cs.points_to(p)) {
                objs.extend(pts.iter());
            }
        }
    }
    objs
}
