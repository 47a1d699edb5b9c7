//! Administrative maintenance over the catalogue.
//!
//! Admin writes go to the remote mirror before the local catalogue, so a
//! remote outage usually leaves local data untouched. POI merges are the
//! exception: the local merge always runs and a remote failure is reported
//! afterwards.

use smartroute_core::MirrorError;
use thiserror::Error;

use crate::catalogue::CatalogueError;

mod poi;
mod route;

pub use poi::AdminPoiRepository;
pub use route::AdminRouteRepository;

/// Errors raised by the admin repositories.
#[derive(Debug, Error)]
pub enum AdminError {
    /// The local catalogue failed.
    #[error(transparent)]
    Catalogue(#[from] CatalogueError),
    /// The remote mirror failed.
    #[error(transparent)]
    Mirror(#[from] MirrorError),
    /// The POI is the start or end of a route and cannot be deleted.
    #[error("POI {poi_id} is an endpoint of route {route_id}")]
    PoiInUse { poi_id: String, route_id: String },
    /// A route edit names a POI that is not in the catalogue.
    #[error("route {route_id} references unknown POI {poi_id}")]
    UnknownPoi { route_id: String, poi_id: String },
}
