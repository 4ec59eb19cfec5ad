//! Solver worklist
//!
//! Pending points-to deltas are merged per pointer so a pointer is
//! processed once per batch of arrivals. Call edges are drained before
//! pointer entries.

use super::points_to_set::PointsToSet;
use crate::features::points_to::domain::{CallEdge, PointerId};
use rustc_hash::FxHashMap;
use std::collections::VecDeque;

pub(crate) enum Entry {
    Points(PointerId, PointsToSet),
    Call(CallEdge),
}

#[derive(Default)]
pub(crate) struct WorkList {
    pointer_order: VecDeque<PointerId>,
    pointer_entries: FxHashMap<PointerId, PointsToSet>,
    call_edges: VecDeque<CallEdge>,
}

impl WorkList {
    pub(crate) fn push_points(&mut self, pointer: PointerId, pts: PointsToSet) {
        if pts.is_empty() {
            return;
        }
        match self.pointer_entries.get_mut(&pointer) {
            Some(pending) => {
                pending.add_all_diff(&pts);
            }
            None => {
                self.pointer_entries.insert(pointer, pts);
                self.pointer_order.push_back(pointer);
            }
        }
    }

    pub(crate) fn push_call_edge(&mut self, edge: CallEdge) {
        self.call_edges.push_back(edge);
    }

    pub(crate) fn poll(&mut self) -> Option<Entry> {
        if let Some(edge) = self.call_edges.pop_front() {
            return Some(Entry::Call(edge));
        }
        while let Some(pointer) = self.pointer_order.pop_front() {
            if let Some(pts) = self.pointer_entries.remove(&pointer) {
                return Some(Entry::Points(pointer, pts));
            }
        }
        None
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.call_edges.is_empty() && self.pointer_entries.is_empty()
    }
}
