//! `duplicate-pois` and `duplicate-routes` commands.

use std::{io::Write, path::PathBuf};

use clap::Parser;
use ortho_config::{OrthoConfig, SubcmdConfigMerge};
use serde::{Deserialize, Serialize};
use smartroute_data::{AdminPoiRepository, AdminRouteRepository, PoiRecord, RouteRecord};

use crate::{
    ARG_DATABASE, CliError, DatabaseConfig, ENV_DUPLICATE_POIS_DATABASE,
    ENV_DUPLICATE_ROUTES_DATABASE, write_json,
};

/// CLI arguments for the `duplicate-pois` subcommand.
#[derive(Debug, Clone, Parser, Deserialize, Serialize, OrthoConfig, Default)]
#[command(
    name = "duplicate-pois",
    long_about = "List groups of POIs that share a name (ignoring case and \
                 surrounding spaces) and groups that sit at the same \
                 coordinates under different names.",
    about = "List POIs that look like duplicates"
)]
#[ortho_config(prefix = "SMARTROUTE")]
pub(crate) struct DuplicatePoisArgs {
    /// Path to the catalogue database.
    #[arg(long = ARG_DATABASE, value_name = "path")]
    #[serde(default)]
    pub(crate) database: Option<PathBuf>,
}

impl DuplicatePoisArgs {
    pub(crate) fn into_config(self) -> Result<DatabaseConfig, CliError> {
        let merged = self.load_and_merge().map_err(CliError::Configuration)?;
        DatabaseConfig::try_from(merged)
    }
}

impl TryFrom<DuplicatePoisArgs> for DatabaseConfig {
    type Error = CliError;

    fn try_from(args: DuplicatePoisArgs) -> Result<Self, Self::Error> {
        Self::resolve(args.database, ENV_DUPLICATE_POIS_DATABASE)
    }
}

/// CLI arguments for the `duplicate-routes` subcommand.
#[derive(Debug, Clone, Parser, Deserialize, Serialize, OrthoConfig, Default)]
#[command(
    name = "duplicate-routes",
    long_about = "List groups of routes that share a trimmed name or visit \
                 the same waypoints in the same order.",
    about = "List routes that look like duplicates"
)]
#[ortho_config(prefix = "SMARTROUTE")]
pub(crate) struct DuplicateRoutesArgs {
    /// Path to the catalogue database.
    #[arg(long = ARG_DATABASE, value_name = "path")]
    #[serde(default)]
    pub(crate) database: Option<PathBuf>,
}

impl DuplicateRoutesArgs {
    pub(crate) fn into_config(self) -> Result<DatabaseConfig, CliError> {
        let merged = self.load_and_merge().map_err(CliError::Configuration)?;
        DatabaseConfig::try_from(merged)
    }
}

impl TryFrom<DuplicateRoutesArgs> for DatabaseConfig {
    type Error = CliError;

    fn try_from(args: DuplicateRoutesArgs) -> Result<Self, Self::Error> {
        Self::resolve(args.database, ENV_DUPLICATE_ROUTES_DATABASE)
    }
}

/// POI as printed by `duplicate-pois`.
#[derive(Debug, Serialize)]
pub(crate) struct PoiEntry {
    id: String,
    name: String,
    details: String,
    lat: f64,
    lng: f64,
}

impl From<PoiRecord> for PoiEntry {
    fn from(poi: PoiRecord) -> Self {
        Self {
            id: poi.id,
            name: poi.name,
            details: poi.details,
            lat: poi.location.y,
            lng: poi.location.x,
        }
    }
}

/// Route header as printed by `duplicate-routes`.
#[derive(Debug, Serialize)]
pub(crate) struct RouteEntry {
    id: String,
    name: String,
    start: String,
    end: String,
    cost: f64,
}

impl From<RouteRecord> for RouteEntry {
    fn from(route: RouteRecord) -> Self {
        Self {
            id: route.id,
            name: route.name,
            start: route.start_poi_id,
            end: route.end_poi_id,
            cost: route.cost,
        }
    }
}

#[derive(Debug, Serialize)]
struct PoiDuplicates {
    same_name: Vec<Vec<PoiEntry>>,
    same_coordinates: Vec<Vec<PoiEntry>>,
}

fn entries<R, E: From<R>>(groups: Vec<Vec<R>>) -> Vec<Vec<E>> {
    groups
        .into_iter()
        .map(|group| group.into_iter().map(E::from).collect())
        .collect()
}

pub(crate) fn duplicate_pois(config: &DatabaseConfig, out: &mut dyn Write) -> Result<(), CliError> {
    let repo = AdminPoiRepository::new(config.open()?);
    let report = PoiDuplicates {
        same_name: entries(repo.pois_with_same_name()?),
        same_coordinates: entries(repo.pois_with_same_coordinates_different_name()?),
    };
    write_json(out, &report)
}

pub(crate) fn duplicate_routes(
    config: &DatabaseConfig,
    out: &mut dyn Write,
) -> Result<(), CliError> {
    let repo = AdminRouteRepository::new(config.open()?);
    let groups: Vec<Vec<RouteEntry>> = entries(repo.duplicate_routes()?);
    write_json(out, &groups)
}
