//! Thread modeling
//!
//! Seeds the system thread group, the main thread group and the main
//! thread as entry points, and answers `Thread.currentThread()` with every
//! thread that may be running: the main thread plus each receiver of a
//! reachable `Thread.start()`.

use super::{Commands, CsObjRef, Plugin};
use crate::features::points_to::domain::{
    ContextId, CsMethodId, Descriptor, EntryPoint, MockKey, ParamProvider, PointerId,
    PointerKind,
};
use crate::features::points_to::infrastructure::points_to_set::PointsToSet;
use crate::features::points_to::infrastructure::solver_view::SolverView;
use crate::shared::models::{Literal, MethodId, Program, Type, VarId};
use parking_lot::Mutex;
use rustc_hash::FxHashSet;
use tracing::debug;

const THREAD: &str = "java.lang.Thread";
const THREAD_GROUP: &str = "java.lang.ThreadGroup";
const THREAD_START: &str = "<java.lang.Thread: void start()>";
const CURRENT_THREAD: &str = "<java.lang.Thread: java.lang.Thread currentThread()>";
const THREAD_GROUP_INIT: &str = "<java.lang.ThreadGroup: void <init>()>";
const THREAD_GROUP_INIT2: &str =
    "<java.lang.ThreadGroup: void <init>(java.lang.ThreadGroup,java.lang.String)>";
const THREAD_INIT: &str = "<java.lang.Thread: void <init>(java.lang.ThreadGroup,java.lang.String)>";

#[derive(Debug, Default)]
struct RunningThreads {
    threads: PointsToSet,
    /// Main thread in the empty heap context; not interned until used
    main_thread: Option<CsObjRef>,
    /// Contexts in which `Thread.currentThread()` is reachable
    current_thread_contexts: FxHashSet<ContextId>,
}

impl RunningThreads {
    fn all(&self) -> Vec<CsObjRef> {
        self.main_thread
            .into_iter()
            .chain(self.threads.iter().map(CsObjRef::Cs))
            .collect()
    }
}

pub struct ThreadHandler {
    start_this: Option<VarId>,
    current_thread: Option<(MethodId, VarId)>,
    thread_group_init: Option<MethodId>,
    thread_group_init2: Option<MethodId>,
    thread_init: Option<MethodId>,
    state: Mutex<RunningThreads>,
}

impl ThreadHandler {
    pub const ID: &'static str = "thread";

    pub fn new(program: &Program) -> Self {
        let ir_of = |sig: &str| {
            program
                .method_by_signature(sig)
                .and_then(|m| program.ir(m).map(|ir| (m, ir)))
        };
        let start_this = ir_of(THREAD_START).and_then(|(_, ir)| ir.this);
        let current_thread =
            ir_of(CURRENT_THREAD).and_then(|(m, ir)| ir.return_vars.first().map(|v| (m, *v)));
        Self {
            start_this,
            current_thread,
            thread_group_init: program.method_by_signature(THREAD_GROUP_INIT),
            thread_group_init2: program.method_by_signature(THREAD_GROUP_INIT2),
            thread_init: program.method_by_signature(THREAD_INIT),
            state: Mutex::new(RunningThreads::default()),
        }
    }

    /// Number of thread objects known to be started (main thread excluded)
    pub fn started_count(&self) -> usize {
        self.state.lock().threads.len()
    }
}

impl Plugin for ThreadHandler {
    fn name(&self) -> &str {
        Self::ID
    }

    fn on_start(&mut self, view: &SolverView<'_>, out: &mut Commands) {
        if !view.config().implicit_entries {
            return;
        }
        let program = view.program();
        let heap = view.heap();
        let class_type = |name: &str| program.class_by_name(name).map_or(Type::Null, Type::Class);
        let group_type = class_type(THREAD_GROUP);
        let name = |s: &str| MockKey::Name(s.to_string());

        let system_group = heap.mock_obj(Descriptor::EntryPoint, name("<system-thread-group>"), group_type.clone());
        if let Some(init) = self.thread_group_init {
            out.add_entry_point(EntryPoint::new(init, ParamProvider::empty().with_this(system_group)));
        }

        let main_group = heap.mock_obj(Descriptor::EntryPoint, name("<main-thread-group>"), group_type);
        let main_name = heap.constant_obj(Literal::String("main".to_string()));
        if let Some(init) = self.thread_group_init2 {
            let params = ParamProvider::empty()
                .with_this(main_group)
                .with_param(0, system_group)
                .with_param(1, main_name);
            out.add_entry_point(EntryPoint::new(init, params));
        }

        let main_thread = heap.mock_obj(Descriptor::Thread, name("<main-thread>"), class_type(THREAD));
        if let Some(init) = self.thread_init {
            let params = ParamProvider::empty()
                .with_this(main_thread)
                .with_param(0, main_group)
                .with_param(1, main_name);
            out.add_entry_point(EntryPoint::new(init, params));
        }
        // the main thread is never started explicitly
        self.state.lock().main_thread = Some(CsObjRef::empty(main_thread));
    }

    fn on_new_points_to_set(
        &mut self,
        view: &SolverView<'_>,
        pointer: PointerId,
        diff: &PointsToSet,
        out: &mut Commands,
    ) {
        let Some(start_this) = self.start_this else {
            return;
        };
        let PointerKind::Var { var, .. } = view.cs().pointer(pointer) else {
            return;
        };
        if var != start_this {
            return;
        }
        let mut state = self.state.lock();
        let started = state.threads.add_all_diff(diff);
        if started.is_empty() {
            return;
        }
        debug!(count = started.len(), "new running threads");
        if let Some((_, ret)) = self.current_thread {
            let objs: Vec<CsObjRef> = started.iter().map(CsObjRef::Cs).collect();
            for &context in &state.current_thread_contexts {
                out.add_var_points_to(context, ret, objs.clone());
            }
        }
    }

    fn on_new_cs_method(&mut self, view: &SolverView<'_>, method: CsMethodId, out: &mut Commands) {
        let Some((current_thread, ret)) = self.current_thread else {
            return;
        };
        let (context, method) = view.cs_method(method);
        if method != current_thread {
            return;
        }
        let mut state = self.state.lock();
        state.current_thread_contexts.insert(context);
        out.add_var_points_to(context, ret, state.all());
    }
}
