//! Core domain types for the SmartRoute engine.
//!
//! Points and routes live in an [`EntityStore`]. The [`merge`] module folds
//! duplicate entities together while keeping every route reference valid, and
//! [`PointRepository`] coordinates those operations with an optional remote
//! [`DocumentMirror`].
//!
//! Operations on unknown ids are silent no-ops so that merges and deletes can
//! be retried safely.

pub mod dedup;
pub mod merge;
pub mod mirror;
mod poi;
mod repository;
mod route;
pub mod store;
#[cfg(any(test, feature = "test-support"))]
pub mod test_support;

pub use merge::CascadeOutcome;
pub use mirror::{DocumentChange, DocumentMirror, Fields, MirrorError, Subscription};
pub use poi::Point;
pub use repository::PointRepository;
pub use route::{ComplexRoute, DriverInfo, Route, RouteSegment};
pub use store::EntityStore;

/// Cleanup hook for auxiliary per-route records.
///
/// Side records are anything keyed by a route id besides the route itself,
/// such as waypoint ordering or bus-station rows. Implementations must be
/// idempotent: cleaning a route that has no side records succeeds.
pub trait RouteSideRecords {
    /// Error raised by the backing storage.
    type Error;

    /// Delete every side record keyed by `route_id`.
    fn delete_side_records_for_route(&mut self, route_id: &str) -> Result<(), Self::Error>;
}
