//! Property tests for points-to sets and context bounding

mod common;

use codegraph_pta::features::points_to::domain::CsObjId;
use codegraph_pta::features::points_to::infrastructure::PointsToSet;
use codegraph_pta::PointerAnalysis;
use common::*;
use proptest::prelude::*;
use std::collections::BTreeSet;

fn set_of(ids: &[u16]) -> PointsToSet {
    ids.iter().map(|i| CsObjId::new(*i as usize)).collect()
}

fn raw(set: &PointsToSet) -> BTreeSet<usize> {
    set.iter().map(|o| o.index()).collect()
}

proptest! {
    #[test]
    fn prop_add_all_diff_returns_exactly_the_new_objects(
        a in prop::collection::vec(0u16..2048, 0..300),
        b in prop::collection::vec(0u16..2048, 0..300),
    ) {
        let mut target = set_of(&a);
        let before = raw(&target);
        let incoming = set_of(&b);

        let diff = target.add_all_diff(&incoming);

        let expected: BTreeSet<usize> = raw(&incoming).difference(&before).copied().collect();
        prop_assert_eq!(raw(&diff), expected);
        let union: BTreeSet<usize> = before.union(&raw(&incoming)).copied().collect();
        prop_assert_eq!(raw(&target), union.clone());
        prop_assert_eq!(target.len(), union.len());

        // a second merge of the same objects adds nothing
        prop_assert!(target.add_all_diff(&incoming).is_empty());
    }

    #[test]
    fn prop_iteration_is_ascending(ids in prop::collection::vec(0u16..4096, 0..500)) {
        let set = set_of(&ids);
        let items: Vec<usize> = set.iter().map(|o| o.index()).collect();
        prop_assert!(items.windows(2).all(|w| w[0] < w[1]));
        let distinct: BTreeSet<u16> = ids.iter().copied().collect();
        prop_assert_eq!(items.len(), distinct.len());
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(24))]

    #[test]
    fn prop_call_site_contexts_never_exceed_k(depth in 1usize..6, k in 1usize..4) {
        let (program, methods) = call_chain_program(depth);
        let result = PointerAnalysis::new(&program, test_config().with_cs(format!("{k}-call")))
            .analyze()
            .unwrap();

        prop_assert!(result.contexts().max_depth() <= k);
        for (i, m) in methods.iter().enumerate() {
            let contexts = result
                .call_graph()
                .reachable_methods()
                .iter()
                .filter(|cm| result.cs().cs_method(**cm).1 == *m)
                .count();
            // the first level is entered from a single site in main
            prop_assert_eq!(contexts, 1 << i.min(k));
        }
    }
}
