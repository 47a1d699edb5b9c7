//! Property-based tests for point merging and cascade deletion.
//!
//! # Invariants tested
//!
//! - **Name reconciliation:** merging non-empty names yields `"{kept} / {removed}"`.
//! - **Length preservation:** merging never changes a route's length and
//!   leaves no stop pointing at the removed point.
//! - **Cascade delete:** deleting a point filters it from every route.
//! - **Idempotence:** a second delete of the same id changes nothing.
//! - **Referential integrity:** no route references a missing point afterwards.

use proptest::prelude::*;
use smartroute_core::{
    EntityStore, Point, Route,
    merge::{delete_point, merge_points},
};

const POINT_IDS: [&str; 4] = ["p0", "p1", "p2", "p3"];

fn point_id() -> impl Strategy<Value = String> {
    prop::sample::select(POINT_IDS.to_vec()).prop_map(str::to_owned)
}

fn routes() -> impl Strategy<Value = Vec<Vec<String>>> {
    prop::collection::vec(prop::collection::vec(point_id(), 0..8), 1..5)
}

fn build_store(names: &[String], stops: Vec<Vec<String>>) -> EntityStore {
    let points = POINT_IDS
        .iter()
        .zip(names)
        .map(|(id, name)| Point::named(*id, name.clone()));
    let routes = stops
        .into_iter()
        .enumerate()
        .map(|(index, ids)| Route::new(format!("r{index}"), ids));
    EntityStore::with_entities(points, routes)
}

fn names() -> impl Strategy<Value = Vec<String>> {
    prop::collection::vec("[a-zα-ω]{1,8}", POINT_IDS.len())
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(128))]

    /// Property: the kept point is renamed and the removed point disappears.
    #[test]
    fn merge_joins_names(names in names(), stops in routes()) {
        let mut store = build_store(&names, stops);
        merge_points(&mut store, "p0", "p1");

        let kept = store.point("p0").expect("kept point survives");
        prop_assert_eq!(&kept.name, &format!("{} / {}", names[0], names[1]));
        prop_assert!(store.point("p1").is_none());
    }

    /// Property: merging rewrites stops in place without changing lengths.
    #[test]
    fn merge_preserves_route_lengths(names in names(), stops in routes()) {
        let store_before = build_store(&names, stops);
        let mut store = store_before.clone();
        merge_points(&mut store, "p0", "p1");

        for before in store_before.routes() {
            let after = store.route(before.id()).expect("route survives merge");
            prop_assert_eq!(after.point_ids.len(), before.point_ids.len());
            for (old, new) in before.point_ids.iter().zip(&after.point_ids) {
                let expected = if old == "p1" { "p0" } else { old.as_str() };
                prop_assert_eq!(new.as_str(), expected);
            }
            prop_assert!(!after.visits("p1"));
        }
        prop_assert!(store.dangling_references().is_empty());
    }

    /// Property: deletion filters every occurrence and is idempotent.
    #[test]
    fn delete_cascades_and_is_idempotent(names in names(), stops in routes(), victim in point_id()) {
        let store_before = build_store(&names, stops);
        let mut store = store_before.clone();
        delete_point(&mut store, &victim);

        prop_assert!(store.point(&victim).is_none());
        for before in store_before.routes() {
            let after = store.route(before.id()).expect("route survives delete");
            let expected: Vec<&String> =
                before.point_ids.iter().filter(|id| **id != victim).collect();
            prop_assert_eq!(after.point_ids.iter().collect::<Vec<_>>(), expected);
        }

        let once = store.clone();
        delete_point(&mut store, &victim);
        prop_assert_eq!(store, once);
    }

    /// Property: operations on unknown ids leave the store unchanged.
    #[test]
    fn unknown_ids_are_no_ops(names in names(), stops in routes()) {
        let before = build_store(&names, stops);
        let mut store = before.clone();
        merge_points(&mut store, "p0", "ghost");
        merge_points(&mut store, "ghost", "p0");
        delete_point(&mut store, "ghost");
        prop_assert_eq!(store, before);
    }
}
