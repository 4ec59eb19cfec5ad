//! Parameter sanitizers: taint objects never enter the sanitized
//! parameter of any context of the method

use crate::features::points_to::domain::{CsMethodId, Obj};
use crate::features::points_to::infrastructure::{PointerFilter, SolverView};
use crate::features::points_to::plugin::{Commands, PointerRef};
use crate::features::taint_analysis::domain::{Index, ParamSanitizer};
use crate::shared::models::MethodId;
use rustc_hash::FxHashMap;
use std::rc::Rc;

pub struct SanitizerHandler {
    sanitized: FxHashMap<MethodId, Vec<Index>>,
    filter: PointerFilter,
}

impl SanitizerHandler {
    pub fn new(sanitizers: &[ParamSanitizer]) -> Self {
        let mut sanitized: FxHashMap<MethodId, Vec<Index>> = FxHashMap::default();
        for s in sanitizers {
            sanitized.entry(s.method).or_default().push(s.index);
        }
        Self {
            sanitized,
            filter: Rc::new(|obj: &Obj| !obj.is_taint()),
        }
    }

    pub fn on_new_cs_method(&mut self, view: &SolverView<'_>, method: CsMethodId, out: &mut Commands) {
        let (context, method) = view.cs_method(method);
        let Some(indexes) = self.sanitized.get(&method) else {
            return;
        };
        let Some(ir) = view.program().ir(method) else {
            return;
        };
        for index in indexes {
            if let Some(param) = index.param_var(ir) {
                out.add_pointer_filter(PointerRef::Var { context, var: param }, self.filter.clone());
            }
        }
    }
}
