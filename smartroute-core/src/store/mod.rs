//! Keyed, order-preserving storage for points and routes.
//!
//! The [`EntityStore`] only performs CRUD. Operations that must keep routes
//! and points consistent with each other live in [`crate::merge`].
//!
//! Lookups never fail: a missing id yields `None` and mutations on a missing
//! id are no-ops.

use indexmap::IndexMap;

use crate::{Point, Route};

/// In-memory table of points and routes.
///
/// Enumeration follows insertion order. Overwriting an existing id keeps its
/// original position.
///
/// The store is not synchronised; mutation goes through `&mut self`.
///
/// # Examples
///
/// ```rust
/// use smartroute_core::{EntityStore, Point, Route};
///
/// let mut store = EntityStore::default();
/// store.add_point(Point::named("1", "Harbour"));
/// store.add_point(Point::named("2", "Castle"));
/// store.add_route(Route::new("r", ["1", "2"]));
///
/// assert_eq!(store.point_names(), vec!["Harbour", "Castle"]);
/// assert!(store.point("3").is_none());
/// ```
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EntityStore {
    points: IndexMap<String, Point>,
    routes: IndexMap<String, Route>,
}

impl EntityStore {
    /// Create a store seeded with points and routes.
    pub fn with_entities<P, R>(points: P, routes: R) -> Self
    where
        P: IntoIterator<Item = Point>,
        R: IntoIterator<Item = Route>,
    {
        let mut store = Self::default();
        points.into_iter().for_each(|point| store.add_point(point));
        routes.into_iter().for_each(|route| store.add_route(route));
        store
    }

    /// Insert `point`, replacing any entry with the same id.
    pub fn add_point(&mut self, point: Point) {
        self.points.insert(point.id().to_owned(), point);
    }

    /// Insert `route`, replacing any entry with the same id.
    pub fn add_route(&mut self, route: Route) {
        self.routes.insert(route.id().to_owned(), route);
    }

    /// Look up a point by id.
    pub fn point(&self, id: &str) -> Option<&Point> {
        self.points.get(id)
    }

    /// Look up a route by id.
    pub fn route(&self, id: &str) -> Option<&Route> {
        self.routes.get(id)
    }

    /// Snapshot of every point in insertion order.
    pub fn points(&self) -> Vec<Point> {
        self.points.values().cloned().collect()
    }

    /// Snapshot of every point name in insertion order.
    pub fn point_names(&self) -> Vec<String> {
        self.points.values().map(|p| p.name.clone()).collect()
    }

    /// Snapshot of every route in insertion order.
    pub fn routes(&self) -> Vec<Route> {
        self.routes.values().cloned().collect()
    }

    /// Number of stored points.
    pub fn point_count(&self) -> usize {
        self.points.len()
    }

    /// Number of stored routes.
    pub fn route_count(&self) -> usize {
        self.routes.len()
    }

    /// Replace the name and details of an existing point.
    ///
    /// Returns `false` without touching the store when `id` is unknown.
    pub fn update_point(&mut self, id: &str, name: &str, details: &str) -> bool {
        let Some(point) = self.points.get_mut(id) else {
            return false;
        };
        name.clone_into(&mut point.name);
        details.clone_into(&mut point.details);
        true
    }

    /// Remove a point without touching routes that reference it.
    ///
    /// Remaining entries keep their relative order.
    pub fn remove_point(&mut self, id: &str) -> Option<Point> {
        self.points.shift_remove(id)
    }

    /// Remove a route.
    ///
    /// Remaining entries keep their relative order.
    pub fn remove_route(&mut self, id: &str) -> Option<Route> {
        self.routes.shift_remove(id)
    }

    /// `(route_id, point_id)` pairs whose point is missing from the store.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use smartroute_core::{EntityStore, Point, Route};
    ///
    /// let store = EntityStore::with_entities(
    ///     [Point::named("1", "Harbour")],
    ///     [Route::new("r", ["1", "ghost"])],
    /// );
    /// assert_eq!(
    ///     store.dangling_references(),
    ///     vec![("r".to_string(), "ghost".to_string())],
    /// );
    /// ```
    pub fn dangling_references(&self) -> Vec<(String, String)> {
        self.routes
            .values()
            .flat_map(|route| {
                route
                    .point_ids
                    .iter()
                    .filter(|id| !self.points.contains_key(id.as_str()))
                    .map(|id| (route.id().to_owned(), id.clone()))
            })
            .collect()
    }

    pub(crate) fn point_mut(&mut self, id: &str) -> Option<&mut Point> {
        self.points.get_mut(id)
    }

    pub(crate) fn routes_mut(&mut self) -> impl Iterator<Item = &mut Route> {
        self.routes.values_mut()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::{fixture, rstest};

    #[fixture]
    fn store() -> EntityStore {
        EntityStore::with_entities(
            [Point::named("1", "Σημείο Α"), Point::named("2", "Σημείο Β")],
            [Route::new("r", ["1", "2"])],
        )
    }

    #[rstest]
    fn names_follow_insertion_order(store: EntityStore) {
        assert_eq!(store.point_names(), vec!["Σημείο Α", "Σημείο Β"]);
    }

    #[rstest]
    fn upsert_keeps_position(mut store: EntityStore) {
        store.add_point(Point::named("1", "Renamed"));
        assert_eq!(store.point_names(), vec!["Renamed", "Σημείο Β"]);
        assert_eq!(store.point_count(), 2);
    }

    #[rstest]
    fn update_changes_values(mut store: EntityStore) {
        assert!(store.update_point("1", "Νέο", "Νέα περιγραφή"));
        let point = store.point("1").expect("point 1 should exist");
        assert_eq!(point.name, "Νέο");
        assert_eq!(point.details, "Νέα περιγραφή");
    }

    #[rstest]
    fn update_on_missing_id_is_ignored(mut store: EntityStore) {
        let before = store.clone();
        assert!(!store.update_point("missing", "x", "y"));
        assert_eq!(store, before);
    }

    #[rstest]
    fn missing_lookups_return_none(store: EntityStore) {
        assert!(store.point("missing").is_none());
        assert!(store.route("missing").is_none());
    }

    #[rstest]
    fn remove_preserves_remaining_order() {
        let mut store = EntityStore::with_entities(
            [
                Point::named("a", "A"),
                Point::named("b", "B"),
                Point::named("c", "C"),
            ],
            [],
        );
        store.remove_point("a");
        assert_eq!(store.point_names(), vec!["B", "C"]);
    }

    #[rstest]
    fn consistent_store_has_no_dangling_references(store: EntityStore) {
        assert!(store.dangling_references().is_empty());
    }
}
