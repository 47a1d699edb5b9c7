//! POI maintenance: duplicate detection, edits, merges and deletes.

use std::{fmt, sync::Arc};

use log::{debug, info, warn};
use smartroute_core::{
    CascadeOutcome, DocumentMirror, Fields, MirrorError,
    dedup::{group_duplicates, normalise_name},
    merge::{reconcile_details, reconcile_name},
    mirror::{POIS_COLLECTION, ROUTES_COLLECTION},
};

use super::AdminError;
use crate::catalogue::{
    CatalogueError, PoiRecord, RouteRecord, SqliteCatalogue, StopList, poi_document,
    route_document,
};

/// Admin view of the POIs in a [`SqliteCatalogue`].
pub struct AdminPoiRepository {
    catalogue: SqliteCatalogue,
    mirror: Option<Arc<dyn DocumentMirror>>,
}

impl fmt::Debug for AdminPoiRepository {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AdminPoiRepository")
            .field("catalogue", &self.catalogue)
            .field("mirrored", &self.mirror.is_some())
            .finish()
    }
}

impl AdminPoiRepository {
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

    /// Every POI name, in insertion order.
    pub fn poi_names(&self) -> Result<Vec<String>, AdminError> {
        Ok(self
            .catalogue
            .pois()?
            .into_iter()
            .map(|poi| poi.name)
            .collect())
    }

    /// Every POI, in insertion order.
    pub fn all_pois(&self) -> Result<Vec<PoiRecord>, AdminError> {
        Ok(self.catalogue.pois()?)
    }

    /// Groups of POIs at exactly the same coordinates that carry more than
    /// one distinct name.
    pub fn pois_with_same_coordinates_different_name(
        &self,
    ) -> Result<Vec<Vec<PoiRecord>>, AdminError> {
        let groups = group_duplicates(self.catalogue.pois()?, |poi| {
            (poi.location.y.to_bits(), poi.location.x.to_bits())
        });
        Ok(groups
            .into_iter()
            .filter(|group| {
                group
                    .split_first()
                    .is_some_and(|(first, rest)| rest.iter().any(|poi| poi.name != first.name))
            })
            .collect())
    }

    /// Groups of POIs whose names match once trimmed and lower-cased.
    pub fn pois_with_same_name(&self) -> Result<Vec<Vec<PoiRecord>>, AdminError> {
        Ok(group_duplicates(self.catalogue.pois()?, |poi| {
            normalise_name(&poi.name)
        }))
    }

    /// Write `poi` remotely, then locally.
    pub async fn update_poi(&self, poi: &PoiRecord) -> Result<(), AdminError> {
        if let Some(mirror) = self.mirror.as_deref() {
            mirror
                .put_document(POIS_COLLECTION, &poi.id, poi_document(poi))
                .await
                .inspect_err(|err| warn!("remote update of POI {} failed: {err}", poi.id))?;
        }
        self.catalogue.upsert_poi(poi)?;
        info!("updated POI {}", poi.id);
        Ok(())
    }

    /// Delete a POI and drop it from every stop list.
    ///
    /// A POI that starts or ends a route is refused with
    /// [`AdminError::PoiInUse`] before anything is written. The remote
    /// delete runs first; if it fails the catalogue is left untouched.
    pub async fn delete_poi(&mut self, id: &str) -> Result<CascadeOutcome, AdminError> {
        if self.catalogue.poi(id)?.is_none() {
            debug!("delete of POI {id} skipped: unknown id");
            return Ok(CascadeOutcome::Skipped);
        }
        if let Some(route) = self
            .catalogue
            .routes()?
            .into_iter()
            .find(|route| route.is_anchored_at(id))
        {
            return Err(AdminError::PoiInUse {
                poi_id: id.to_owned(),
                route_id: route.id,
            });
        }

        let touched = self.referencing_routes(id)?;
        if let Some(mirror) = self.mirror.as_deref() {
            let documents = self.route_documents(&touched, |poi_id| {
                (poi_id != id).then(|| poi_id.to_owned())
            })?;
            push_routes(mirror, documents).await?;
            mirror
                .delete_document(POIS_COLLECTION, id)
                .await
                .inspect_err(|err| warn!("remote delete of POI {id} failed: {err}"))?;
        }

        self.catalogue.remove_poi(id)?;
        info!("deleted POI {id} from {} route(s)", touched.len());
        Ok(CascadeOutcome::Applied {
            touched_routes: touched.into_iter().map(|route| route.id).collect(),
        })
    }

    /// Fold POI `remove_id` into `keep_id`.
    ///
    /// Names and details are reconciled as for in-memory point merges, and
    /// every route reference to `remove_id` moves to `keep_id`. The remote leg
    /// runs first. The local merge runs even when the remote leg fails, and
    /// the remote error is returned afterwards.
    pub async fn merge_pois(
        &mut self,
        keep_id: &str,
        remove_id: &str,
    ) -> Result<CascadeOutcome, AdminError> {
        if keep_id == remove_id {
            debug!("merge of POI {remove_id} into itself skipped");
            return Ok(CascadeOutcome::Skipped);
        }
        let (Some(kept), Some(removed)) =
            (self.catalogue.poi(keep_id)?, self.catalogue.poi(remove_id)?)
        else {
            debug!("merge of POI {remove_id} into {keep_id} skipped: unknown id");
            return Ok(CascadeOutcome::Skipped);
        };
        let merged = PoiRecord {
            name: reconcile_name(&kept.name, &removed.name),
            details: reconcile_details(&kept.details, &removed.details),
            ..kept
        };

        let touched = self.referencing_routes(remove_id)?;
        let remote = match self.mirror.as_deref() {
            Some(mirror) => {
                let documents = self.route_documents(&touched, |poi_id| {
                    Some((if poi_id == remove_id { keep_id } else { poi_id }).to_owned())
                })?;
                push_merge(mirror, documents, &merged, remove_id).await
            }
            None => Ok(()),
        };
        if let Err(err) = &remote {
            warn!("remote merge of POI {remove_id} into {keep_id} failed: {err}");
        }

        self.catalogue.reassign_poi(&merged, remove_id)?;
        info!(
            "merged POI {remove_id} into {keep_id} across {} route(s)",
            touched.len()
        );
        remote?;
        Ok(CascadeOutcome::Applied {
            touched_routes: touched.into_iter().map(|route| route.id).collect(),
        })
    }

    fn referencing_routes(&self, poi_id: &str) -> Result<Vec<RouteRecord>, CatalogueError> {
        let mut routes = Vec::new();
        for route_id in self.catalogue.routes_referencing(poi_id)? {
            if let Some(route) = self.catalogue.route(&route_id)? {
                routes.push(route);
            }
        }
        Ok(routes)
    }

    /// Route documents with every POI reference passed through `rewrite`.
    ///
    /// Stops mapped to `None` are dropped; endpoints mapped to `None` keep
    /// their current id.
    fn route_documents(
        &self,
        routes: &[RouteRecord],
        rewrite: impl Fn(&str) -> Option<String>,
    ) -> Result<Vec<(String, Fields)>, CatalogueError> {
        let anchor = |id: &str| rewrite(id).unwrap_or_else(|| id.to_owned());
        let mut documents = Vec::with_capacity(routes.len());
        for route in routes {
            let header = RouteRecord {
                start_poi_id: anchor(&route.start_poi_id),
                end_poi_id: anchor(&route.end_poi_id),
                ..route.clone()
            };
            let stops = |list: StopList| -> Result<Vec<String>, CatalogueError> {
                Ok(self
                    .catalogue
                    .stops(list, &route.id)?
                    .iter()
                    .filter_map(|poi_id| rewrite(poi_id.as_str()))
                    .collect())
            };
            let fields = route_document(
                &header,
                &stops(StopList::Waypoints)?,
                &stops(StopList::BusStations)?,
            );
            documents.push((route.id.clone(), fields));
        }
        Ok(documents)
    }
}

async fn push_routes(
    mirror: &dyn DocumentMirror,
    documents: Vec<(String, Fields)>,
) -> Result<(), MirrorError> {
    for (id, fields) in documents {
        mirror
            .put_document(ROUTES_COLLECTION, &id, fields)
            .await
            .inspect_err(|err| warn!("remote update of route {id} failed: {err}"))?;
    }
    Ok(())
}

async fn push_merge(
    mirror: &dyn DocumentMirror,
    documents: Vec<(String, Fields)>,
    merged: &PoiRecord,
    remove_id: &str,
) -> Result<(), MirrorError> {
    push_routes(mirror, documents).await?;
    mirror
        .put_document(POIS_COLLECTION, &merged.id, poi_document(merged))
        .await?;
    mirror.delete_document(POIS_COLLECTION, remove_id).await
}
