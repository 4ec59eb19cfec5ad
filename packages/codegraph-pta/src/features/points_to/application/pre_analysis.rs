//! Pre-analyses that pick where the main run spends context sensitivity
//!
//! - `collection`: collection and map library methods only, no pre-run
//! - `scaler`: per-method variant from a points-to volume cost model over
//!   a context-insensitive pre-run, under a total budget
//! - `zipper`: methods whose parameters mix objects of one type from
//!   different allocating methods and that let them escape
//!
//! # References
//! - Li et al. "Scalability-First Pointer Analysis with Self-Tuning Context-Sensitivity" (FSE 2018)
//! - Li et al. "Precision-Guided Context Sensitivity for Pointer Analysis" (OOPSLA 2018)

use super::result::PointerAnalysisResult;
use crate::config::ContextSpec;
use crate::features::points_to::domain::ObjId;
use crate::shared::models::{ClassId, MethodId, Program, Stmt};
use rustc_hash::{FxHashMap, FxHashSet};
use std::collections::BTreeSet;
use tracing::{debug, info};

/// Total cost the scaler may distribute over all methods
pub const SCALER_BUDGET: u64 = 30_000_000;

/// Variants the scaler chooses from, most precise first
const SCALER_VARIANTS: [ContextSpec; 4] = [
    ContextSpec::Object(2),
    ContextSpec::Type(2),
    ContextSpec::Type(1),
    ContextSpec::Insensitive,
];

const COLLECTION_ROOTS: [&str; 2] = ["java.util.Collection", "java.util.Map"];

/// Methods declared in subtypes of `Collection` or `Map`
pub fn collection_methods(program: &Program) -> FxHashSet<MethodId> {
    let roots: Vec<ClassId> = COLLECTION_ROOTS
        .iter()
        .filter_map(|name| program.class_by_name(name))
        .collect();
    let methods: FxHashSet<MethodId> = program
        .classes()
        .filter(|(id, _)| roots.iter().any(|root| program.is_subclass(*id, *root)))
        .flat_map(|(_, class)| class.methods.iter().copied())
        .collect();
    info!(methods = methods.len(), "collection methods selected");
    methods
}

/// Per-method cost of each scaler variant
struct MethodCosts {
    method: MethodId,
    costs: [u64; SCALER_VARIANTS.len()],
}

impl MethodCosts {
    /// Most precise variant within `threshold` (insensitive otherwise)
    fn choose(&self, threshold: u64) -> usize {
        self.costs
            .iter()
            .position(|cost| *cost <= threshold)
            .unwrap_or(SCALER_VARIANTS.len() - 1)
    }
}

/// Choose a context variant per reachable method so the summed cost stays
/// within `budget`
pub fn scaler_choices(
    program: &Program,
    ci: &PointerAnalysisResult<'_>,
    budget: u64,
) -> FxHashMap<MethodId, ContextSpec> {
    let costs: Vec<MethodCosts> = ci
        .reachable_methods()
        .into_iter()
        .map(|method| method_costs(program, ci, method))
        .collect();

    let total = |threshold: u64| -> u64 {
        costs
            .iter()
            .map(|m| m.costs[m.choose(threshold)])
            .fold(0u64, u64::saturating_add)
    };

    // total() grows with the threshold, so the best threshold is the
    // largest candidate that still fits
    let candidates: Vec<u64> = costs
        .iter()
        .flat_map(|m| m.costs.iter().copied())
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect();
    let fits = candidates.partition_point(|t| total(*t) <= budget);
    let threshold = if fits == 0 { 0 } else { candidates[fits - 1] };

    let choices: FxHashMap<MethodId, ContextSpec> = costs
        .iter()
        .map(|m| (m.method, SCALER_VARIANTS[m.choose(threshold)]))
        .collect();
    info!(
        methods = choices.len(),
        threshold,
        total_cost = total(threshold),
        "scaler choices computed"
    );
    choices
}

fn method_costs(program: &Program, ci: &PointerAnalysisResult<'_>, method: MethodId) -> MethodCosts {
    let volume: u64 = program
        .ir(method)
        .map(|ir| ir.vars.iter().map(|v| ci.points_to_set(*v).len() as u64).sum())
        .unwrap_or(0)
        .max(1);
    let class_of = |obj: ObjId| {
        ci.obj(obj)
            .container_method()
            .map(|m| program.method(m).declaring_class)
    };
    let mut two_obj: FxHashSet<(ObjId, Option<ObjId>)> = FxHashSet::default();
    let mut two_type: FxHashSet<(Option<ClassId>, Option<ClassId>)> = FxHashSet::default();
    let mut one_type: FxHashSet<Option<ClassId>> = FxHashSet::default();
    for recv in receivers(program, ci, method) {
        let outer = ci
            .obj(recv)
            .container_method()
            .map(|m| receivers(program, ci, m))
            .unwrap_or_default();
        one_type.insert(class_of(recv));
        if outer.is_empty() {
            two_obj.insert((recv, None));
            two_type.insert((class_of(recv), None));
        }
        for o in outer {
            two_obj.insert((recv, Some(o)));
            two_type.insert((class_of(recv), class_of(o)));
        }
    }
    let contexts = [two_obj.len(), two_type.len(), one_type.len(), 1];
    let mut costs = [0u64; SCALER_VARIANTS.len()];
    for (cost, count) in costs.iter_mut().zip(contexts) {
        *cost = volume.saturating_mul(count.max(1) as u64);
    }
    debug!(method = %program.method_signature(method), ?costs, "scaler cost");
    MethodCosts { method, costs }
}

/// Objects the method's `this` may point to; empty for static methods
fn receivers(program: &Program, ci: &PointerAnalysisResult<'_>, method: MethodId) -> Vec<ObjId> {
    program
        .ir(method)
        .and_then(|ir| ir.this)
        .map(|this| ci.points_to_set(this))
        .unwrap_or_default()
}

/// Methods that merge same-typed objects from different allocating
/// methods through a parameter (or `this`) and let them escape through the
/// return value or a heap store
pub fn zipper_methods(program: &Program, ci: &PointerAnalysisResult<'_>) -> FxHashSet<MethodId> {
    let mut selected = FxHashSet::default();
    for method in ci.reachable_methods() {
        let Some(ir) = program.ir(method) else {
            continue;
        };
        let escapes = program.method(method).return_type.is_reference()
            || ir.stmts.iter().any(|s| {
                matches!(
                    s,
                    Stmt::StoreField { base: Some(_), .. } | Stmt::StoreArray { .. }
                )
            });
        if !escapes {
            continue;
        }
        let mixes = ir.this.iter().chain(ir.params.iter()).any(|param| {
            let mut allocators: FxHashMap<_, FxHashSet<Option<MethodId>>> = FxHashMap::default();
            for obj in ci.points_to_set(*param) {
                let obj = ci.obj(obj);
                allocators
                    .entry(obj.ty.clone())
                    .or_default()
                    .insert(obj.container_method());
            }
            allocators.values().any(|from| from.len() > 1)
        });
        if mixes {
            selected.insert(method);
        }
    }
    info!(methods = selected.len(), "zipper precision-critical methods");
    selected
}
