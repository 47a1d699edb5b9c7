//! Caller-facing facade over the entity store, merge engine and mirror.
//!
//! Local reads and writes are synchronous. Operations that must reach the
//! remote mirror are `async` and finish the remote leg before returning. A
//! remote failure is reported as an error while the local effect stands;
//! nothing is rolled back.

use std::{fmt, sync::Arc};

use log::{debug, warn};

use crate::{
    CascadeOutcome, EntityStore, Point, Route, merge,
    mirror::{
        DocumentChange, DocumentMirror, MirrorError, POIS_COLLECTION, ROUTES_COLLECTION,
        Subscription, from_fields, to_fields,
    },
};

/// Point and route repository with optional remote mirroring.
///
/// Dependencies are passed in explicitly; the repository holds no global
/// state.
///
/// # Examples
///
/// ```rust
/// use smartroute_core::{EntityStore, Point, PointRepository, Route};
///
/// # tokio::runtime::Builder::new_current_thread().build().unwrap().block_on(async {
/// let mut repo = PointRepository::new(EntityStore::default());
/// repo.add_point(Point::named("1", "Α"));
/// repo.add_point(Point::named("2", "Β"));
/// repo.add_route(Route::new("r", ["1", "2"]));
///
/// repo.merge_points("1", "2").await?;
///
/// assert_eq!(repo.all_point_names(), vec!["Α / Β"]);
/// # Ok::<(), smartroute_core::MirrorError>(())
/// # }).unwrap();
/// ```
pub struct PointRepository {
    store: EntityStore,
    mirror: Option<Arc<dyn DocumentMirror>>,
}

impl fmt::Debug for PointRepository {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PointRepository")
            .field("points", &self.store.point_count())
            .field("routes", &self.store.route_count())
            .field("mirrored", &self.mirror.is_some())
            .finish()
    }
}

impl PointRepository {
    /// Repository backed only by the local store.
    pub fn new(store: EntityStore) -> Self {
        Self {
            store,
            mirror: None,
        }
    }

    /// Repository that mirrors every write to `mirror`.
    pub fn with_mirror(store: EntityStore, mirror: Arc<dyn DocumentMirror>) -> Self {
        Self {
            store,
            mirror: Some(mirror),
        }
    }

    /// Read-only view of the local store.
    pub fn store(&self) -> &EntityStore {
        &self.store
    }

    /// Add or replace a point locally.
    pub fn add_point(&mut self, point: Point) {
        self.store.add_point(point);
    }

    /// Add or replace a route locally.
    pub fn add_route(&mut self, route: Route) {
        self.store.add_route(route);
    }

    /// Look up a point.
    pub fn point(&self, id: &str) -> Option<&Point> {
        self.store.point(id)
    }

    /// Look up a route.
    pub fn route(&self, id: &str) -> Option<&Route> {
        self.store.route(id)
    }

    /// Every point in store order.
    pub fn all_points(&self) -> Vec<Point> {
        self.store.points()
    }

    /// Every point name in store order.
    pub fn all_point_names(&self) -> Vec<String> {
        self.store.point_names()
    }

    /// Rename and re-describe a point, then mirror it.
    ///
    /// Unknown ids are ignored and return `Ok(false)`.
    pub async fn update_point(
        &mut self,
        id: &str,
        name: &str,
        details: &str,
    ) -> Result<bool, MirrorError> {
        if !self.store.update_point(id, name, details) {
            debug!("update of point {id} skipped: not present");
            return Ok(false);
        }
        self.push_point(id).await?;
        Ok(true)
    }

    /// Merge point `remove_id` into `keep_id`, then mirror the kept point,
    /// every rewritten route, and the removal.
    pub async fn merge_points(
        &mut self,
        keep_id: &str,
        remove_id: &str,
    ) -> Result<CascadeOutcome, MirrorError> {
        let outcome = merge::merge_points(&mut self.store, keep_id, remove_id);
        if outcome.is_applied() {
            self.push_point(keep_id).await?;
            self.push_routes(outcome.touched_routes()).await?;
            self.remove_remote(POIS_COLLECTION, remove_id).await?;
        }
        Ok(outcome)
    }

    /// Delete a point with cascade, then mirror the filtered routes and the
    /// removal.
    pub async fn delete_point(&mut self, id: &str) -> Result<CascadeOutcome, MirrorError> {
        let outcome = merge::delete_point(&mut self.store, id);
        if outcome.is_applied() {
            self.push_routes(outcome.touched_routes()).await?;
            self.remove_remote(POIS_COLLECTION, id).await?;
        }
        Ok(outcome)
    }

    /// Drop route `remove_id` as a duplicate of `keep_id`.
    ///
    /// The remote document is deleted first. If that fails the local store is
    /// left untouched so a retry can finish the job.
    pub async fn merge_routes(
        &mut self,
        keep_id: &str,
        remove_id: &str,
    ) -> Result<CascadeOutcome, MirrorError> {
        if keep_id == remove_id
            || self.store.route(keep_id).is_none()
            || self.store.route(remove_id).is_none()
        {
            debug!("merge of route {remove_id} into {keep_id} skipped");
            return Ok(CascadeOutcome::Skipped);
        }
        self.remove_remote(ROUTES_COLLECTION, remove_id).await?;
        Ok(merge::merge_routes(&mut self.store, keep_id, remove_id))
    }

    /// Apply every change queued on `subscription`, last writer wins.
    ///
    /// Upserts replace local entries; removals cascade like
    /// [`PointRepository::delete_point`] without being mirrored back.
    /// Undecodable documents are logged and skipped. Remote routes may name
    /// points this store has not seen; they are kept and reported by the
    /// debug-build reference check. Returns the number of changes applied.
    pub fn apply_remote_changes(&mut self, subscription: &mut Subscription) -> usize {
        let collection = subscription.collection().to_owned();
        let mut applied = 0;
        while let Some(change) = subscription.try_next() {
            if self.apply_change(&collection, change) {
                applied += 1;
            }
        }
        if applied > 0 {
            merge::check_references(&self.store);
        }
        applied
    }

    fn apply_change(&mut self, collection: &str, change: DocumentChange) -> bool {
        match (collection, change) {
            (POIS_COLLECTION, DocumentChange::Upserted { id, fields }) => {
                match from_fields::<Point>(fields) {
                    Ok(point) => {
                        self.store.add_point(point);
                        true
                    }
                    Err(err) => {
                        warn!("ignoring undecodable point document {id}: {err}");
                        false
                    }
                }
            }
            (POIS_COLLECTION, DocumentChange::Removed { id }) => {
                merge::delete_point(&mut self.store, &id).is_applied()
            }
            (ROUTES_COLLECTION, DocumentChange::Upserted { id, fields }) => {
                match from_fields::<Route>(fields) {
                    Ok(route) => {
                        self.store.add_route(route);
                        true
                    }
                    Err(err) => {
                        warn!("ignoring undecodable route document {id}: {err}");
                        false
                    }
                }
            }
            (ROUTES_COLLECTION, DocumentChange::Removed { id }) => {
                self.store.remove_route(&id).is_some()
            }
            (other, _) => {
                warn!("ignoring change for unknown collection {other}");
                false
            }
        }
    }

    async fn push_point(&self, id: &str) -> Result<(), MirrorError> {
        let (Some(mirror), Some(point)) = (&self.mirror, self.store.point(id)) else {
            return Ok(());
        };
        let fields = to_fields(id, point)?;
        mirror
            .put_document(POIS_COLLECTION, id, fields)
            .await
            .inspect_err(|err| warn!("failed to mirror point {id}: {err}"))
    }

    async fn push_routes(&self, ids: &[String]) -> Result<(), MirrorError> {
        let Some(mirror) = &self.mirror else {
            return Ok(());
        };
        for id in ids {
            let Some(route) = self.store.route(id) else {
                continue;
            };
            let fields = to_fields(id, route)?;
            mirror
                .put_document(ROUTES_COLLECTION, id, fields)
                .await
                .inspect_err(|err| warn!("failed to mirror route {id}: {err}"))?;
        }
        Ok(())
    }

    async fn remove_remote(&self, collection: &str, id: &str) -> Result<(), MirrorError> {
        let Some(mirror) = &self.mirror else {
            return Ok(());
        };
        mirror
            .delete_document(collection, id)
            .await
            .inspect_err(|err| warn!("failed to delete remote {collection}/{id}: {err}"))
    }
}
