//! Merge and cascade-delete operations over an [`EntityStore`].
//!
//! Every operation here keeps routes consistent with the point table: once it
//! returns, no route references a point the operation removed. Missing ids
//! turn an operation into a no-op so that retries are harmless.

use log::{debug, info, warn};

use crate::EntityStore;

/// Result of a merge or cascade delete.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CascadeOutcome {
    /// The operation ran. `touched_routes` lists routes whose stops changed,
    /// in store order.
    Applied { touched_routes: Vec<String> },
    /// An id was missing; nothing changed.
    Skipped,
}

impl CascadeOutcome {
    /// Whether the store was modified.
    pub fn is_applied(&self) -> bool {
        matches!(self, Self::Applied { .. })
    }

    /// Routes whose stops changed. Empty when skipped.
    pub fn touched_routes(&self) -> &[String] {
        match self {
            Self::Applied { touched_routes } => touched_routes,
            Self::Skipped => &[],
        }
    }
}

/// Name shown for a point that absorbed `removed`.
///
/// # Examples
/// ```
/// use smartroute_core::merge::reconcile_name;
///
/// assert_eq!(reconcile_name("Α", "Β"), "Α / Β");
/// assert_eq!(reconcile_name("Α", ""), "Α");
/// ```
pub fn reconcile_name(kept: &str, removed: &str) -> String {
    if removed.is_empty() {
        kept.to_owned()
    } else {
        format!("{kept} / {removed}")
    }
}

/// Details of a point that absorbed `removed`: non-empty parts, one per line.
///
/// # Examples
/// ```
/// use smartroute_core::merge::reconcile_details;
///
/// assert_eq!(reconcile_details("a", "b"), "a\nb");
/// assert_eq!(reconcile_details("", "b"), "b");
/// assert_eq!(reconcile_details("", ""), "");
/// ```
pub fn reconcile_details(kept: &str, removed: &str) -> String {
    [kept, removed]
        .into_iter()
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}

/// Fold point `remove_id` into `keep_id`.
///
/// The kept point's name and details are reconciled with the removed point's,
/// every route stop equal to `remove_id` is rewritten to `keep_id` (route
/// lengths do not change and duplicates are kept), and the removed point is
/// deleted.
///
/// Returns [`CascadeOutcome::Skipped`] when either point is missing or both
/// ids are equal.
///
/// # Examples
/// ```
/// use smartroute_core::{EntityStore, Point, Route, merge::merge_points};
///
/// let mut store = EntityStore::with_entities(
///     [Point::named("1", "Σημείο Α"), Point::named("2", "Σημείο Β")],
///     [Route::new("r", ["1", "2"])],
/// );
///
/// merge_points(&mut store, "1", "2");
///
/// assert!(store.point("2").is_none());
/// assert_eq!(store.point("1").map(|p| p.name.as_str()), Some("Σημείο Α / Σημείο Β"));
/// assert_eq!(store.route("r").map(|r| r.point_ids.clone()), Some(vec!["1".into(), "1".into()]));
/// ```
pub fn merge_points(store: &mut EntityStore, keep_id: &str, remove_id: &str) -> CascadeOutcome {
    if keep_id == remove_id || store.point(keep_id).is_none() {
        debug!("merge of point {remove_id} into {keep_id} skipped");
        return CascadeOutcome::Skipped;
    }
    let Some(removed) = store.remove_point(remove_id) else {
        debug!("merge of point {remove_id} into {keep_id} skipped: nothing to remove");
        return CascadeOutcome::Skipped;
    };

    if let Some(kept) = store.point_mut(keep_id) {
        kept.name = reconcile_name(&kept.name, &removed.name);
        kept.details = reconcile_details(&kept.details, &removed.details);
    }

    let touched_routes: Vec<String> = store
        .routes_mut()
        .filter_map(|route| {
            route
                .replace_point(remove_id, keep_id)
                .then(|| route.id().to_owned())
        })
        .collect();

    info!(
        "merged point {remove_id} into {keep_id}; rewrote {} route(s)",
        touched_routes.len()
    );
    check_references(store);
    CascadeOutcome::Applied { touched_routes }
}

/// Delete a point and drop it from every route.
///
/// Routes shrink by the number of occurrences removed. Deleting a missing
/// point is a no-op, which makes repeated calls idempotent.
pub fn delete_point(store: &mut EntityStore, id: &str) -> CascadeOutcome {
    if store.remove_point(id).is_none() {
        debug!("delete of point {id} skipped: not present");
        return CascadeOutcome::Skipped;
    }

    let touched_routes: Vec<String> = store
        .routes_mut()
        .filter_map(|route| route.remove_point(id).then(|| route.id().to_owned()))
        .collect();

    info!(
        "deleted point {id}; filtered {} route(s)",
        touched_routes.len()
    );
    check_references(store);
    CascadeOutcome::Applied { touched_routes }
}

/// Drop route `remove_id` as a duplicate of `keep_id`.
///
/// The kept route is not modified. The returned outcome lists the removed
/// route so callers can clean up anything keyed by it.
pub fn merge_routes(store: &mut EntityStore, keep_id: &str, remove_id: &str) -> CascadeOutcome {
    if keep_id == remove_id || store.route(keep_id).is_none() {
        debug!("merge of route {remove_id} into {keep_id} skipped");
        return CascadeOutcome::Skipped;
    }
    match store.remove_route(remove_id) {
        Some(_) => {
            info!("merged route {remove_id} into {keep_id}");
            CascadeOutcome::Applied {
                touched_routes: vec![remove_id.to_owned()],
            }
        }
        None => {
            debug!("merge of route {remove_id} into {keep_id} skipped: nothing to remove");
            CascadeOutcome::Skipped
        }
    }
}

/// Log routes left pointing at missing points and return how many were found.
///
/// Only runs in debug builds, where it returns zero without looking. It never
/// panics.
pub(crate) fn check_references(store: &EntityStore) -> usize {
    if !cfg!(debug_assertions) {
        return 0;
    }
    let dangling = store.dangling_references();
    for (route_id, point_id) in &dangling {
        warn!("route {route_id} references missing point {point_id}");
    }
    dangling.len()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Point, Route};
    use rstest::{fixture, rstest};

    #[fixture]
    fn store() -> EntityStore {
        EntityStore::with_entities(
            [
                Point::new("1", "Α", "Λεπτομέρειες Α"),
                Point::new("2", "Β", "Λεπτομέρειες Β"),
                Point::named("3", "Γ"),
            ],
            [
                Route::new("r1", ["1", "2", "3", "2"]),
                Route::new("r2", ["3"]),
            ],
        )
    }

    #[rstest]
    fn reference_check_is_quiet_after_merges(mut store: EntityStore) {
        merge_points(&mut store, "1", "2");
        delete_point(&mut store, "3");
        assert_eq!(check_references(&store), 0);
    }

    #[test]
    fn reference_check_counts_dangling_stops_without_panicking() {
        let store = EntityStore::with_entities(
            [Point::named("1", "Α")],
            [Route::new("r", ["1", "ghost", "ghost"])],
        );
        let expected = if cfg!(debug_assertions) { 2 } else { 0 };
        assert_eq!(check_references(&store), expected);
    }

    #[rstest]
    fn merge_reconciles_name_and_details(mut store: EntityStore) {
        let outcome = merge_points(&mut store, "1", "2");

        let kept = store.point("1").expect("kept point");
        assert_eq!(kept.name, "Α / Β");
        assert_eq!(kept.details, "Λεπτομέρειες Α\nΛεπτομέρειες Β");
        assert!(store.point("2").is_none());
        assert_eq!(outcome.touched_routes(), ["r1".to_owned()]);
    }

    #[rstest]
    fn merge_rewrites_without_collapsing(mut store: EntityStore) {
        merge_points(&mut store, "1", "2");
        let route = store.route("r1").expect("route r1");
        assert_eq!(route.point_ids, vec!["1", "1", "3", "1"]);
    }

    #[rstest]
    #[case("Α", "", "Α")]
    #[case("Α", "Β", "Α / Β")]
    #[case("", "Β", " / Β")]
    fn name_reconciliation(#[case] kept: &str, #[case] removed: &str, #[case] expected: &str) {
        assert_eq!(reconcile_name(kept, removed), expected);
    }

    #[rstest]
    #[case("", "", "")]
    #[case("a", "", "a")]
    #[case("", "b", "b")]
    #[case("a", "b", "a\nb")]
    fn details_reconciliation(#[case] kept: &str, #[case] removed: &str, #[case] expected: &str) {
        assert_eq!(reconcile_details(kept, removed), expected);
    }

    #[rstest]
    #[case("1", "missing")]
    #[case("missing", "2")]
    #[case("1", "1")]
    fn merge_with_missing_or_equal_ids_is_a_no_op(
        mut store: EntityStore,
        #[case] keep: &str,
        #[case] remove: &str,
    ) {
        let before = store.clone();
        assert_eq!(merge_points(&mut store, keep, remove), CascadeOutcome::Skipped);
        assert_eq!(store, before);
    }

    #[rstest]
    fn repeated_merge_is_a_no_op(mut store: EntityStore) {
        merge_points(&mut store, "1", "2");
        let after_first = store.clone();
        assert!(!merge_points(&mut store, "1", "2").is_applied());
        assert_eq!(store, after_first);
    }

    #[rstest]
    fn delete_filters_routes(mut store: EntityStore) {
        let outcome = delete_point(&mut store, "3");
        assert!(store.point("3").is_none());
        assert_eq!(
            store.route("r1").map(|r| r.point_ids.clone()),
            Some(vec!["1".into(), "2".into(), "2".into()])
        );
        assert_eq!(store.route("r2").map(|r| r.point_ids.len()), Some(0));
        assert_eq!(
            outcome.touched_routes(),
            ["r1".to_owned(), "r2".to_owned()]
        );
    }

    #[rstest]
    fn delete_twice_matches_delete_once(mut store: EntityStore) {
        delete_point(&mut store, "2");
        let once = store.clone();
        assert_eq!(delete_point(&mut store, "2"), CascadeOutcome::Skipped);
        assert_eq!(store, once);
    }

    #[rstest]
    fn route_merge_leaves_kept_route_untouched(mut store: EntityStore) {
        let kept_before = store.route("r1").cloned();
        let outcome = merge_routes(&mut store, "r1", "r2");
        assert!(outcome.is_applied());
        assert!(store.route("r2").is_none());
        assert_eq!(store.route("r1").cloned(), kept_before);
        assert_eq!(store.point_count(), 3);
    }

    #[rstest]
    #[case("r1", "missing")]
    #[case("missing", "r2")]
    #[case("r1", "r1")]
    fn route_merge_with_missing_ids_is_a_no_op(
        mut store: EntityStore,
        #[case] keep: &str,
        #[case] remove: &str,
    ) {
        let before = store.clone();
        assert_eq!(merge_routes(&mut store, keep, remove), CascadeOutcome::Skipped);
        assert_eq!(store, before);
    }
}
