//! Persistent catalogue of points of interest and routes.
//!
//! The catalogue is the admin view of the data set: POIs carry coordinates,
//! routes carry a start and end POI plus two ordered stop lists (waypoints and
//! bus stations). Everything lives in a single SQLite database.

use std::path::PathBuf;

use geo::Coord;
use thiserror::Error;

mod documents;
mod schema;
mod sqlite;

pub use documents::{poi_document, route_document};
pub use schema::{SCHEMA_VERSION, initialise_schema};
pub use sqlite::SqliteCatalogue;

/// Point of interest as stored in the catalogue.
#[derive(Debug, Clone, PartialEq)]
pub struct PoiRecord {
    /// Catalogue key, also used as the mirror document id.
    pub id: String,
    /// Display name.
    pub name: String,
    /// Free-form description, possibly multi-line.
    pub details: String,
    /// WGS84 position with `x = longitude` and `y = latitude`.
    pub location: Coord<f64>,
}

impl PoiRecord {
    /// Build a record from its parts.
    ///
    /// # Examples
    /// ```
    /// use geo::Coord;
    /// use smartroute_data::catalogue::PoiRecord;
    ///
    /// let poi = PoiRecord::new("1", "Λευκός Πύργος", "", Coord { x: 22.9485, y: 40.6264 });
    /// assert_eq!(poi.location.y, 40.6264);
    /// ```
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        details: impl Into<String>,
        location: Coord<f64>,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            details: details.into(),
            location,
        }
    }
}

/// Route header as stored in the catalogue.
#[derive(Debug, Clone, PartialEq)]
pub struct RouteRecord {
    /// Catalogue key, also used as the mirror document id.
    pub id: String,
    /// Display name.
    pub name: String,
    /// POI the route departs from.
    pub start_poi_id: String,
    /// POI the route arrives at.
    pub end_poi_id: String,
    /// Fare charged for the whole route.
    pub cost: f64,
}

impl RouteRecord {
    /// Build a route header with zero cost.
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        start_poi_id: impl Into<String>,
        end_poi_id: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            start_poi_id: start_poi_id.into(),
            end_poi_id: end_poi_id.into(),
            cost: 0.0,
        }
    }

    /// Set the fare charged for the route.
    #[must_use]
    pub fn with_cost(mut self, cost: f64) -> Self {
        self.cost = cost;
        self
    }

    /// Whether the route starts or ends at `poi_id`.
    pub fn is_anchored_at(&self, poi_id: &str) -> bool {
        self.start_poi_id == poi_id || self.end_poi_id == poi_id
    }
}

/// The two ordered stop lists a route owns.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopList {
    /// Points the route passes through, stored in `route_points`.
    Waypoints,
    /// Bus stations served along the route, stored in `route_bus_stations`.
    BusStations,
}

impl StopList {
    /// Both lists, in the order cascades visit them.
    pub const ALL: [Self; 2] = [Self::Waypoints, Self::BusStations];

    pub(crate) fn table(self) -> &'static str {
        match self {
            Self::Waypoints => "route_points",
            Self::BusStations => "route_bus_stations",
        }
    }
}

/// Errors raised by the catalogue.
#[derive(Debug, Error)]
pub enum CatalogueError {
    /// Opening the SQLite database failed.
    #[error("failed to open catalogue database at {path}: {source}")]
    Open {
        /// Location of the database on disk.
        path: PathBuf,
        /// Source error returned by `rusqlite`.
        #[source]
        source: rusqlite::Error,
    },
    /// A schema step failed.
    #[error("catalogue schema step `{step}` failed: {source}")]
    Migration {
        step: &'static str,
        #[source]
        source: rusqlite::Error,
    },
    /// The database was created by an incompatible schema version.
    #[error("catalogue schema version {found} does not match expected {expected}")]
    VersionMismatch { expected: i64, found: i64 },
    /// Generic SQLite error while reading or writing rows.
    #[error(transparent)]
    Database(#[from] rusqlite::Error),
}
