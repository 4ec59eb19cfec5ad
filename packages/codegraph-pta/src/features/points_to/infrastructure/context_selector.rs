//! Context selectors
//!
//! The selector is the only component that derives new contexts:
//! - **Insensitive**: always the empty context
//! - **k-call-site**: the k most recent call sites
//! - **k-object**: the receiver object and its heap context
//! - **k-type**: the class containing the receiver's allocation site
//! - **Selective**: full sensitivity for a method subset only
//! - **Guided**: per-method variant chosen by a pre-analysis
//!
//! Heap contexts keep k-1 elements of the allocating method's context.
//!
//! # References
//! - Milanova et al. "Parameterized Object Sensitivity" (TOSEM 2005)
//! - Smaragdakis et al. "Pick Your Contexts Well" (POPL 2011)
//! - Li et al. "Scalability-First Pointer Analysis with Self-Tuning Context-Sensitivity" (FSE 2018)

use crate::config::ContextSpec;
use crate::features::points_to::domain::{ContextElem, ContextId, ContextTable, HeapModel, ObjId};
use crate::shared::models::{MethodId, Program, StmtRef};
use rustc_hash::{FxHashMap, FxHashSet};

/// What a selector may consult and mutate
pub struct SelectorCx<'a> {
    pub program: &'a Program,
    pub heap: &'a HeapModel,
    pub contexts: &'a mut ContextTable,
}

pub trait ContextSelector {
    fn name(&self) -> String;

    /// Callee context for a call from `call_site` (caller context +
    /// statement), with `recv` the (heap context, object) receiver of an
    /// instance call.
    fn select_context(
        &self,
        cx: &mut SelectorCx<'_>,
        call_site: (ContextId, StmtRef),
        recv: Option<(ContextId, ObjId)>,
        callee: MethodId,
    ) -> ContextId;

    /// Heap context of `obj` allocated in `method` under `context`
    fn select_heap_context(
        &self,
        cx: &mut SelectorCx<'_>,
        method: (ContextId, MethodId),
        obj: ObjId,
    ) -> ContextId;

    fn empty_context(&self) -> ContextId {
        ContextId::EMPTY
    }
}

/// Build the selector for a parsed variant
pub fn make_selector(spec: ContextSpec) -> Box<dyn ContextSelector> {
    Box::new(KLimitingSelector::new(spec))
}

// ═══════════════════════════════════════════════════════════════════════════
// k-limiting variants
// ═══════════════════════════════════════════════════════════════════════════

#[derive(Debug, Clone, Copy)]
pub struct KLimitingSelector {
    spec: ContextSpec,
}

impl KLimitingSelector {
    pub fn new(spec: ContextSpec) -> Self {
        Self { spec }
    }

    pub fn spec(&self) -> ContextSpec {
        self.spec
    }
}

fn type_elem(cx: &SelectorCx<'_>, obj: ObjId) -> Option<ContextElem> {
    let obj = cx.heap.obj(obj);
    obj.container_method()
        .map(|m| cx.program.method(m).declaring_class)
        .or_else(|| cx.program.dispatch_class(&obj.ty))
        .map(ContextElem::Type)
}

impl ContextSelector for KLimitingSelector {
    fn name(&self) -> String {
        self.spec.to_string()
    }

    fn select_context(
        &self,
        cx: &mut SelectorCx<'_>,
        (caller, site): (ContextId, StmtRef),
        recv: Option<(ContextId, ObjId)>,
        _callee: MethodId,
    ) -> ContextId {
        match (self.spec, recv) {
            (ContextSpec::Insensitive, _) => ContextId::EMPTY,
            (ContextSpec::CallSite(k), _) => {
                cx.contexts.append(caller, ContextElem::CallSite(site), k)
            }
            // static calls inherit the caller's context
            (ContextSpec::Object(k) | ContextSpec::Type(k), None) => {
                cx.contexts.truncate(caller, k)
            }
            (ContextSpec::Object(k), Some((heap_ctx, obj))) => {
                cx.contexts.append(heap_ctx, ContextElem::Object(obj), k)
            }
            (ContextSpec::Type(k), Some((heap_ctx, obj))) => match type_elem(cx, obj) {
                Some(elem) => cx.contexts.append(heap_ctx, elem, k),
                None => cx.contexts.truncate(heap_ctx, k),
            },
        }
    }

    fn select_heap_context(
        &self,
        cx: &mut SelectorCx<'_>,
        (context, _): (ContextId, MethodId),
        _obj: ObjId,
    ) -> ContextId {
        let limit = self.spec.limit().saturating_sub(1);
        cx.contexts.truncate(context, limit)
    }
}

// ═══════════════════════════════════════════════════════════════════════════
// Selective / guided
// ═══════════════════════════════════════════════════════════════════════════

/// Applies `inner` to a method subset; everything else is analyzed in the
/// empty context.
pub struct SelectiveSelector {
    inner: Box<dyn ContextSelector>,
    methods: FxHashSet<MethodId>,
}

impl SelectiveSelector {
    pub fn new(inner: Box<dyn ContextSelector>, methods: FxHashSet<MethodId>) -> Self {
        Self { inner, methods }
    }

    pub fn selected(&self) -> &FxHashSet<MethodId> {
        &self.methods
    }
}

impl ContextSelector for SelectiveSelector {
    fn name(&self) -> String {
        format!("selective({}, {} methods)", self.inner.name(), self.methods.len())
    }

    fn select_context(
        &self,
        cx: &mut SelectorCx<'_>,
        call_site: (ContextId, StmtRef),
        recv: Option<(ContextId, ObjId)>,
        callee: MethodId,
    ) -> ContextId {
        if self.methods.contains(&callee) {
            self.inner.select_context(cx, call_site, recv, callee)
        } else {
            ContextId::EMPTY
        }
    }

    fn select_heap_context(
        &self,
        cx: &mut SelectorCx<'_>,
        method: (ContextId, MethodId),
        obj: ObjId,
    ) -> ContextId {
        if self.methods.contains(&method.1) {
            self.inner.select_heap_context(cx, method, obj)
        } else {
            ContextId::EMPTY
        }
    }
}

/// Per-method variant; methods without a choice use `default`
pub struct GuidedSelector {
    choices: FxHashMap<MethodId, KLimitingSelector>,
    default: KLimitingSelector,
}

impl GuidedSelector {
    pub fn new(choices: FxHashMap<MethodId, ContextSpec>, default: ContextSpec) -> Self {
        Self {
            choices: choices
                .into_iter()
                .map(|(m, spec)| (m, KLimitingSelector::new(spec)))
                .collect(),
            default: KLimitingSelector::new(default),
        }
    }

    fn selector_for(&self, method: MethodId) -> &KLimitingSelector {
        self.choices.get(&method).unwrap_or(&self.default)
    }

    pub fn spec_for(&self, method: MethodId) -> ContextSpec {
        self.selector_for(method).spec()
    }
}

impl ContextSelector for GuidedSelector {
    fn name(&self) -> String {
        format!("guided({} methods, default {})", self.choices.len(), self.default.spec())
    }

    fn select_context(
        &self,
        cx: &mut SelectorCx<'_>,
        call_site: (ContextId, StmtRef),
        recv: Option<(ContextId, ObjId)>,
        callee: MethodId,
    ) -> ContextId {
        self.selector_for(callee)
            .select_context(cx, call_site, recv, callee)
    }

    fn select_heap_context(
        &self,
        cx: &mut SelectorCx<'_>,
        method: (ContextId, MethodId),
        obj: ObjId,
    ) -> ContextId {
        self.selector_for(method.1)
            .select_heap_context(cx, method, obj)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shared::models::{MethodFlags, ProgramBuilder, Type};

    struct Fixture {
        program: Program,
        heap: HeapModel,
        contexts: ContextTable,
        m: MethodId,
    }

    fn fixture() -> Fixture {
        let mut b = ProgramBuilder::new();
        let object = b.add_class("java.lang.Object", None);
        let m = b.add_method(object, "m", vec![], Type::Void, MethodFlags::instance());
        let program = b.build();
        let heap = HeapModel::new(&program, true);
        Fixture {
            program,
            heap,
            contexts: ContextTable::new(),
            m,
        }
    }

    #[test]
    fn test_call_site_contexts_are_bounded() {
        let mut f = fixture();
        let selector = KLimitingSelector::new(ContextSpec::CallSite(2));
        let mut cx = SelectorCx {
            program: &f.program,
            heap: &f.heap,
            contexts: &mut f.contexts,
        };
        let mut ctx = ContextId::EMPTY;
        for i in 0..10 {
            ctx = selector.select_context(&mut cx, (ctx, StmtRef::new(f.m, i)), None, f.m);
            assert!(cx.contexts.depth(ctx) <= 2);
        }
        let heap_ctx = selector.select_heap_context(&mut cx, (ctx, f.m), ObjId(0));
        assert_eq!(cx.contexts.depth(heap_ctx), 1);
        assert_eq!(f.contexts.max_depth(), 2);
    }

    #[test]
    fn test_object_sensitivity_uses_receiver() {
        let mut f = fixture();
        let ty = Type::Class(f.program.object_class().unwrap());
        let o1 = f.heap.alloc_obj(StmtRef::new(f.m, 0), &ty);
        let o2 = f.heap.alloc_obj(StmtRef::new(f.m, 1), &ty);
        let selector = KLimitingSelector::new(ContextSpec::Object(1));
        let mut cx = SelectorCx {
            program: &f.program,
            heap: &f.heap,
            contexts: &mut f.contexts,
        };
        let site = (ContextId::EMPTY, StmtRef::new(f.m, 5));
        let c1 = selector.select_context(&mut cx, site, Some((ContextId::EMPTY, o1)), f.m);
        let c2 = selector.select_context(&mut cx, site, Some((ContextId::EMPTY, o2)), f.m);
        let c1_again = selector.select_context(&mut cx, site, Some((ContextId::EMPTY, o1)), f.m);
        assert_ne!(c1, c2);
        assert_eq!(c1, c1_again);
        assert_eq!(cx.contexts.elems(c1), &[ContextElem::Object(o1)]);
        // static call keeps the caller context
        assert_eq!(selector.select_context(&mut cx, (c1, StmtRef::new(f.m, 6)), None, f.m), c1);
        // 1-obj heap contexts are empty
        assert_eq!(selector.select_heap_context(&mut cx, (c1, f.m), o2), ContextId::EMPTY);
    }

    #[test]
    fn test_type_sensitivity_merges_same_container() {
        let mut f = fixture();
        let ty = Type::Class(f.program.object_class().unwrap());
        let o1 = f.heap.alloc_obj(StmtRef::new(f.m, 0), &ty);
        let o2 = f.heap.alloc_obj(StmtRef::new(f.m, 1), &ty);
        let selector = KLimitingSelector::new(ContextSpec::Type(1));
        let mut cx = SelectorCx {
            program: &f.program,
            heap: &f.heap,
            contexts: &mut f.contexts,
        };
        let site = (ContextId::EMPTY, StmtRef::new(f.m, 5));
        let c1 = selector.select_context(&mut cx, site, Some((ContextId::EMPTY, o1)), f.m);
        let c2 = selector.select_context(&mut cx, site, Some((ContextId::EMPTY, o2)), f.m);
        assert_eq!(c1, c2);
        assert_ne!(c1, ContextId::EMPTY);
    }

    #[test]
    fn test_selective_only_refines_selected_methods() {
        let mut f = fixture();
        let other = MethodId(99);
        let selector = SelectiveSelector::new(
            make_selector(ContextSpec::CallSite(1)),
            [f.m].into_iter().collect(),
        );
        let mut cx = SelectorCx {
            program: &f.program,
            heap: &f.heap,
            contexts: &mut f.contexts,
        };
        let site = (ContextId::EMPTY, StmtRef::new(f.m, 0));
        assert_ne!(selector.select_context(&mut cx, site, None, f.m), ContextId::EMPTY);
        assert_eq!(selector.select_context(&mut cx, site, None, other), ContextId::EMPTY);
    }

    #[test]
    fn test_guided_uses_per_method_choice() {
        let mut f = fixture();
        let other = MethodId(42);
        let selector = GuidedSelector::new(
            [(f.m, ContextSpec::CallSite(2))].into_iter().collect(),
            ContextSpec::Insensitive,
        );
        assert_eq!(selector.spec_for(f.m), ContextSpec::CallSite(2));
        assert_eq!(selector.spec_for(other), ContextSpec::Insensitive);
        let mut cx = SelectorCx {
            program: &f.program,
            heap: &f.heap,
            contexts: &mut f.contexts,
        };
        let site = (ContextId::EMPTY, StmtRef::new(f.m, 0));
        assert_ne!(selector.select_context(&mut cx, site, None, f.m), ContextId::EMPTY);
        assert_eq!(selector.select_context(&mut cx, site, None, other), ContextId::EMPTY);
    }
}
