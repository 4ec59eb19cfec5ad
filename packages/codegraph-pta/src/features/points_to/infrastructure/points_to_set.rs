//! Points-to sets
//!
//! Hybrid representation over [`CsObjId`]s:
//! - **Sparse**: sorted `Vec<u32>` for small sets (binary-search membership)
//! - **Dense**: `u64` word bitmap once the set is large and compact
//!
//! Sets only grow during propagation. [`PointsToSet::add_all_diff`] is the
//! propagation primitive: it returns exactly the newly added objects.
//! Removal is crate-private and only reachable through the solver's
//! phase-boundary scope.

use crate::features::points_to::domain::CsObjId;
use std::fmt;

/// Switch to dense once the set holds more than this share of its universe
const DENSE_THRESHOLD_RATIO: f64 = 0.1;
/// Minimum elements before considering dense
const DENSE_MIN_ELEMENTS: usize = 64;

#[derive(Clone)]
enum Repr {
    Sparse(Vec<u32>),
    Dense { words: Vec<u64>, len: usize },
}

#[derive(Clone)]
pub struct PointsToSet {
    repr: Repr,
}

impl Default for PointsToSet {
    fn default() -> Self {
        Self::new()
    }
}

impl PointsToSet {
    #[inline]
    pub fn new() -> Self {
        Self {
            repr: Repr::Sparse(Vec::new()),
        }
    }

    #[inline]
    pub fn singleton(obj: CsObjId) -> Self {
        Self {
            repr: Repr::Sparse(vec![obj.0]),
        }
    }

    /// Add an object. Returns true if it was not present.
    pub fn add(&mut self, obj: CsObjId) -> bool {
        let added = match &mut self.repr {
            Repr::Sparse(elems) => match elems.binary_search(&obj.0) {
                Ok(_) => false,
                Err(pos) => {
                    elems.insert(pos, obj.0);
                    true
                }
            },
            Repr::Dense { words, len } => {
                let (w, bit) = split(obj.0);
                if w >= words.len() {
                    words.resize(w + 1, 0);
                }
                if words[w] & bit != 0 {
                    false
                } else {
                    words[w] |= bit;
                    *len += 1;
                    true
                }
            }
        };
        if added {
            self.maybe_densify();
        }
        added
    }

    /// Union `other` into `self`, returning the objects that were new
    pub fn add_all_diff(&mut self, other: &PointsToSet) -> PointsToSet {
        let mut diff = Vec::new();
        for obj in other.iter() {
            if !self.contains(obj) {
                diff.push(obj.0);
            }
        }
        if diff.is_empty() {
            return PointsToSet::new();
        }
        match &mut self.repr {
            Repr::Sparse(elems) => {
                elems.extend_from_slice(&diff);
                elems.sort_unstable();
            }
            Repr::Dense { words, len } => {
                for &raw in &diff {
                    let (w, bit) = split(raw);
                    if w >= words.len() {
                        words.resize(w + 1, 0);
                    }
                    words[w] |= bit;
                }
                *len += diff.len();
            }
        }
        self.maybe_densify();
        // `other.iter()` is ascending, so `diff` already is
        PointsToSet {
            repr: Repr::Sparse(diff),
        }
    }

    pub fn contains(&self, obj: CsObjId) -> bool {
        match &self.repr {
            Repr::Sparse(elems) => elems.binary_search(&obj.0).is_ok(),
            Repr::Dense { words, .. } => {
                let (w, bit) = split(obj.0);
                words.get(w).is_some_and(|word| word & bit != 0)
            }
        }
    }

    pub fn len(&self) -> usize {
        match &self.repr {
            Repr::Sparse(elems) => elems.len(),
            Repr::Dense { len, .. } => *len,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Objects in ascending id order
    pub fn iter(&self) -> Iter<'_> {
        match &self.repr {
            Repr::Sparse(elems) => Iter::Sparse(elems.iter()),
            Repr::Dense { words, .. } => Iter::Dense {
                words,
                word: 0,
                current: words.first().copied().unwrap_or(0),
            },
        }
    }

    pub fn is_dense(&self) -> bool {
        matches!(self.repr, Repr::Dense { .. })
    }

    /// Drop every object matching `pred`; returns how many were removed.
    pub(crate) fn remove_if(&mut self, mut pred: impl FnMut(CsObjId) -> bool) -> usize {
        match &mut self.repr {
            Repr::Sparse(elems) => {
                let before = elems.len();
                elems.retain(|raw| !pred(CsObjId(*raw)));
                before - elems.len()
            }
            Repr::Dense { words, len } => {
                let mut removed = 0;
                for (w, word) in words.iter_mut().enumerate() {
                    let mut bits = *word;
                    while bits != 0 {
                        let bit = bits.trailing_zeros();
                        bits &= bits - 1;
                        if pred(CsObjId((w as u32) * 64 + bit)) {
                            *word &= !(1u64 << bit);
                            removed += 1;
                        }
                    }
                }
                *len -= removed;
                removed
            }
        }
    }

    fn maybe_densify(&mut self) {
        if let Repr::Sparse(elems) = &self.repr {
            if elems.len() < DENSE_MIN_ELEMENTS {
                return;
            }
            let max = elems.last().copied().unwrap_or(0) as f64 + 1.0;
            if (elems.len() as f64) <= max * DENSE_THRESHOLD_RATIO {
                return;
            }
            let mut words = vec![0u64; (max as usize).div_ceil(64)];
            for &raw in elems {
                let (w, bit) = split(raw);
                words[w] |= bit;
            }
            let len = elems.len();
            self.repr = Repr::Dense { words, len };
        }
    }
}

#[inline]
fn split(raw: u32) -> (usize, u64) {
    ((raw / 64) as usize, 1u64 << (raw % 64))
}

pub enum Iter<'a> {
    Sparse(std::slice::Iter<'a, u32>),
    Dense {
        words: &'a [u64],
        word: usize,
        current: u64,
    },
}

impl Iterator for Iter<'_> {
    type Item = CsObjId;

    fn next(&mut self) -> Option<CsObjId> {
        match self {
            Iter::Sparse(it) => it.next().map(|raw| CsObjId(*raw)),
            Iter::Dense {
                words,
                word,
                current,
            } => loop {
                if *current != 0 {
                    let bit = current.trailing_zeros();
                    *current &= *current - 1;
                    return Some(CsObjId((*word as u32) * 64 + bit));
                }
                *word += 1;
                *current = *words.get(*word)?;
            },
        }
    }
}

impl<'a> IntoIterator for &'a PointsToSet {
    type Item = CsObjId;
    type IntoIter = Iter<'a>;

    fn into_iter(self) -> Iter<'a> {
        self.iter()
    }
}

impl FromIterator<CsObjId> for PointsToSet {
    fn from_iter<T: IntoIterator<Item = CsObjId>>(iter: T) -> Self {
        let mut elems: Vec<u32> = iter.into_iter().map(|o| o.0).collect();
        elems.sort_unstable();
        elems.dedup();
        let mut set = PointsToSet {
            repr: Repr::Sparse(elems),
        };
        set.maybe_densify();
        set
    }
}

impl PartialEq for PointsToSet {
    fn eq(&self, other: &Self) -> bool {
        self.len() == other.len() && self.iter().eq(other.iter())
    }
}

impl Eq for PointsToSet {}

impl fmt::Debug for PointsToSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.iter().map(|o| o.0)).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn set(ids: &[u32]) -> PointsToSet {
        ids.iter().map(|i| CsObjId(*i)).collect()
    }

    #[test]
    fn test_add_reports_change() {
        let mut pts = PointsToSet::new();
        assert!(pts.add(CsObjId(3)));
        assert!(!pts.add(CsObjId(3)));
        assert!(pts.add(CsObjId(1)));
        assert_eq!(pts.len(), 2);
        assert_eq!(pts.iter().collect::<Vec<_>>(), vec![CsObjId(1), CsObjId(3)]);
    }

    #[test]
    fn test_add_all_diff_returns_only_new() {
        let mut a = set(&[1, 2, 3]);
        let diff = a.add_all_diff(&set(&[2, 3, 4, 5]));
        assert_eq!(diff, set(&[4, 5]));
        assert_eq!(a, set(&[1, 2, 3, 4, 5]));
    }

    #[test]
    fn test_self_union_is_empty() {
        let mut a = set(&[7, 9, 100]);
        let copy = a.clone();
        assert!(a.add_all_diff(&copy).is_empty());
    }

    #[test]
    fn test_densifies_and_stays_equal() {
        let mut pts = PointsToSet::new();
        for i in 0..200 {
            pts.add(CsObjId(i));
        }
        assert!(pts.is_dense());
        assert_eq!(pts.len(), 200);
        assert!(pts.contains(CsObjId(199)));
        assert!(!pts.contains(CsObjId(200)));
        assert!(!pts.contains(CsObjId(100_000)));

        let sparse: PointsToSet = (0..200).map(CsObjId).collect();
        assert_eq!(pts, sparse);

        let diff = pts.add_all_diff(&set(&[5, 250, 251]));
        assert_eq!(diff, set(&[250, 251]));
        assert_eq!(pts.len(), 202);
        assert_eq!(pts.iter().last(), Some(CsObjId(251)));
    }

    #[test]
    fn test_sparse_universe_stays_sparse() {
        let pts: PointsToSet = (0..100).map(|i| CsObjId(i * 1000)).collect();
        assert!(!pts.is_dense());
    }

    #[test]
    fn test_remove_if_in_both_representations() {
        let mut sparse = set(&[1, 2, 3, 4]);
        assert_eq!(sparse.remove_if(|o| o.0 % 2 == 0), 2);
        assert_eq!(sparse, set(&[1, 3]));

        let mut dense: PointsToSet = (0..128).map(CsObjId).collect();
        assert!(dense.is_dense());
        assert_eq!(dense.remove_if(|o| o.0 >= 64), 64);
        assert_eq!(dense.len(), 64);
        assert!(!dense.contains(CsObjId(64)));
    }
}
