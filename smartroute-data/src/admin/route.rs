//! Route maintenance: duplicate detection, edits and merges.

use std::{collections::HashSet, fmt, sync::Arc};

use log::{debug, info, warn};
use smartroute_core::{
    CascadeOutcome, DocumentMirror, RouteSideRecords,
    dedup::{group_duplicates, membership_changed},
    mirror::ROUTES_COLLECTION,
};

use super::AdminError;
use crate::catalogue::{RouteRecord, SqliteCatalogue, StopList, route_document};

/// Admin view of the routes in a [`SqliteCatalogue`].
pub struct AdminRouteRepository {
    catalogue: SqliteCatalogue,
    mirror: Option<Arc<dyn DocumentMirror>>,
}

impl fmt::Debug for AdminRouteRepository {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AdminRouteRepository")
            .field("catalogue", &self.catalogue)
            .field("mirrored", &self.mirror.is_some())
            .finish()
    }
}

impl AdminRouteRepository {
    /// Repository that only touches the local catalogue.
    pub fn new(catalogue: SqliteCatalogue) -> Self {
        Self {
            catalogue,
            mirror: None,
        }
    }

    /// Repository that mirrors every write to `mirror`.
    pub fn with_mirror(catalogue: SqliteCatalogue, mirror: Arc<dyn DocumentMirror>) -> Self {
        Self {
            catalogue,
            mirror: Some(mirror),
        }
    }

    /// Underlying catalogue.
    pub fn catalogue(&self) -> &SqliteCatalogue {
        &self.catalogue
    }

    /// Give the catalogue back.
    pub fn into_catalogue(self) -> SqliteCatalogue {
        self.catalogue
    }

    /// Groups of routes that look like duplicates of each other.
    ///
    /// Routes match when their trimmed names are equal or when they visit
    /// the same non-empty waypoint sequence. Name groups come first. Members
    /// are sorted by id and a group matched both ways is listed once.
    pub fn duplicate_routes(&self) -> Result<Vec<Vec<RouteRecord>>, AdminError> {
        let routes = self.catalogue.routes()?;
        let mut waypoints = self.catalogue.all_stops(StopList::Waypoints)?;

        let by_name = group_duplicates(routes.iter(), |route| route.name.trim().to_owned());
        let by_sequence = group_duplicates(
            routes
                .iter()
                .filter_map(|route| Some((route, waypoints.remove(&route.id)?))),
            |(_, sequence)| sequence.clone(),
        )
        .into_iter()
        .map(|group| group.into_iter().map(|(route, _)| route).collect::<Vec<_>>());

        let mut seen = HashSet::new();
        let mut groups = Vec::new();
        for group in by_name.into_iter().chain(by_sequence) {
            let mut group: Vec<RouteRecord> = group.into_iter().cloned().collect();
            group.sort_by(|left, right| left.id.cmp(&right.id));
            group.dedup_by(|left, right| left.id == right.id);
            let key: Vec<String> = group.iter().map(|route| route.id.clone()).collect();
            if seen.insert(key) {
                groups.push(group);
            }
        }
        Ok(groups)
    }

    /// Write `route` with its current stops remotely, then save the header
    /// locally.
    ///
    /// A start or end that is not in the catalogue is refused with
    /// [`AdminError::UnknownPoi`] before anything is written.
    pub async fn update_route(&self, route: &RouteRecord) -> Result<(), AdminError> {
        self.require_pois(&route.id, [&route.start_poi_id, &route.end_poi_id])?;
        if let Some(mirror) = self.mirror.as_deref() {
            let fields = route_document(
                route,
                &self.catalogue.stops(StopList::Waypoints, &route.id)?,
                &self.catalogue.stops(StopList::BusStations, &route.id)?,
            );
            mirror
                .put_document(ROUTES_COLLECTION, &route.id, fields)
                .await
                .inspect_err(|err| warn!("remote update of route {} failed: {err}", route.id))?;
        }
        self.catalogue.upsert_route(route)?;
        info!("updated route {}", route.id);
        Ok(())
    }

    /// Replace the waypoint list of `route_id`.
    ///
    /// Returns `false` without any I/O when the route is unknown or the list
    /// is unchanged, and fails with [`AdminError::UnknownPoi`] before any I/O
    /// when a waypoint is not in the catalogue. Otherwise the route document
    /// is written remotely with the new waypoints and then the local rows are
    /// replaced.
    pub async fn set_waypoints<S: AsRef<str>>(
        &mut self,
        route_id: &str,
        waypoints: &[S],
    ) -> Result<bool, AdminError> {
        let Some(route) = self.catalogue.route(route_id)? else {
            debug!("waypoint edit of unknown route {route_id} skipped");
            return Ok(false);
        };
        let current = self.catalogue.stops(StopList::Waypoints, route_id)?;
        let proposed: Vec<String> = waypoints
            .iter()
            .map(|id| id.as_ref().to_owned())
            .collect();
        if current == proposed {
            return Ok(false);
        }
        self.require_pois(route_id, &proposed)?;

        if let Some(mirror) = self.mirror.as_deref() {
            let fields = route_document(
                &route,
                &proposed,
                &self.catalogue.stops(StopList::BusStations, route_id)?,
            );
            mirror
                .put_document(ROUTES_COLLECTION, route_id, fields)
                .await
                .inspect_err(|err| warn!("remote waypoint edit of route {route_id} failed: {err}"))?;
        }
        self.catalogue
            .set_stops(StopList::Waypoints, route_id, &proposed)?;
        if membership_changed(&current, &proposed) {
            info!("route {route_id} now visits {} waypoints", proposed.len());
        } else {
            info!("reordered waypoints of route {route_id}");
        }
        Ok(true)
    }

    fn require_pois<I>(&self, route_id: &str, poi_ids: I) -> Result<(), AdminError>
    where
        I: IntoIterator,
        I::Item: AsRef<str>,
    {
        for poi_id in poi_ids {
            let poi_id = poi_id.as_ref();
            if self.catalogue.poi(poi_id)?.is_none() {
                warn!("route {route_id} edit names unknown POI {poi_id}");
                return Err(AdminError::UnknownPoi {
                    route_id: route_id.to_owned(),
                    poi_id: poi_id.to_owned(),
                });
            }
        }
        Ok(())
    }

    /// Drop route `remove_id` as a duplicate of `keep_id`.
    ///
    /// The remote document goes first, then the stop lists, then the route
    /// header. If the remote delete fails nothing local is touched. The kept
    /// route is never modified.
    pub async fn merge_routes(
        &mut self,
        keep_id: &str,
        remove_id: &str,
    ) -> Result<CascadeOutcome, AdminError> {
        if keep_id == remove_id
            || self.catalogue.route(keep_id)?.is_none()
            || self.catalogue.route(remove_id)?.is_none()
        {
            debug!("merge of route {remove_id} into {keep_id} skipped");
            return Ok(CascadeOutcome::Skipped);
        }

        if let Some(mirror) = self.mirror.as_deref() {
            mirror
                .delete_document(ROUTES_COLLECTION, remove_id)
                .await
                .inspect_err(|err| warn!("remote delete of route {remove_id} failed: {err}"))?;
        }
        self.catalogue.delete_side_records_for_route(remove_id)?;
        self.catalogue.remove_route(remove_id)?;
        info!("merged route {remove_id} into {keep_id}");
        Ok(CascadeOutcome::Applied {
            touched_routes: vec![remove_id.to_owned()],
        })
    }
}
