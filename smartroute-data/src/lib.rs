//! Persistent catalogue and admin maintenance for the SmartRoute engine.
//!
//! Responsibilities:
//! - Store POIs, routes and their ordered stop lists in SQLite.
//! - Map catalogue rows to remote mirror documents.
//! - Detect duplicate POIs and routes and fold them together.
//!
//! Boundaries:
//! - Merge rules such as name reconciliation live in `smartroute-core`.
//! - Remote stores are reached only through `smartroute_core::DocumentMirror`.
//!
//! Invariants:
//! - Multi-row catalogue rewrites are transactional.
//! - Stop positions within a route are contiguous from zero.

pub mod admin;
pub mod catalogue;

pub use admin::{AdminError, AdminPoiRepository, AdminRouteRepository};
pub use catalogue::{CatalogueError, PoiRecord, RouteRecord, SqliteCatalogue, StopList};
