//! Facade crate for the SmartRoute deduplication engine.
//!
//! This crate re-exports the core domain types and, behind the `catalogue`
//! feature, the SQLite catalogue with its admin repositories.

#![forbid(unsafe_code)]

pub use smartroute_core::{
    CascadeOutcome, ComplexRoute, DocumentChange, DocumentMirror, DriverInfo, EntityStore,
    Fields, MirrorError, Point, PointRepository, Route, RouteSegment, RouteSideRecords,
    Subscription, dedup, merge,
};

#[cfg(feature = "catalogue")]
pub use smartroute_data::{
    AdminError, AdminPoiRepository, AdminRouteRepository, CatalogueError, PoiRecord, RouteRecord,
    SqliteCatalogue, StopList,
};
