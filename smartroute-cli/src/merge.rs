//! `merge-pois` and `merge-routes` commands.

use std::{future::Future, io::Write, path::PathBuf};

use clap::Parser;
use ortho_config::{OrthoConfig, SubcmdConfigMerge};
use serde::{Deserialize, Serialize};
use smartroute_core::CascadeOutcome;
use smartroute_data::{AdminError, AdminPoiRepository, AdminRouteRepository};

use crate::{
    ARG_DATABASE, ARG_KEEP, ARG_REMOVE, CliError, DatabaseConfig, ENV_MERGE_POIS_DATABASE,
    ENV_MERGE_POIS_KEEP, ENV_MERGE_POIS_REMOVE, ENV_MERGE_ROUTES_DATABASE, ENV_MERGE_ROUTES_KEEP,
    ENV_MERGE_ROUTES_REMOVE, write_json,
};

/// CLI arguments for the `merge-pois` subcommand.
#[derive(Debug, Clone, Parser, Deserialize, Serialize, OrthoConfig, Default)]
#[command(
    name = "merge-pois",
    long_about = "Fold one POI into another. Names and details are combined, \
                 every route reference moves to the kept POI and the \
                 removed POI is deleted.",
    about = "Merge one POI into another"
)]
#[ortho_config(prefix = "SMARTROUTE")]
pub(crate) struct MergePoisArgs {
    /// Path to the catalogue database.
    #[arg(long = ARG_DATABASE, value_name = "path")]
    #[serde(default)]
    pub(crate) database: Option<PathBuf>,
    /// Id of the POI that survives the merge.
    #[arg(long = ARG_KEEP, value_name = "id")]
    #[serde(default)]
    pub(crate) keep: Option<String>,
    /// Id of the POI folded into the kept one.
    #[arg(long = ARG_REMOVE, value_name = "id")]
    #[serde(default)]
    pub(crate) remove: Option<String>,
}

impl MergePoisArgs {
    pub(crate) fn into_config(self) -> Result<MergeConfig, CliError> {
        let merged = self.load_and_merge().map_err(CliError::Configuration)?;
        MergeConfig::try_from(merged)
    }
}

impl TryFrom<MergePoisArgs> for MergeConfig {
    type Error = CliError;

    fn try_from(args: MergePoisArgs) -> Result<Self, Self::Error> {
        Ok(Self {
            catalogue: DatabaseConfig::resolve(args.database, ENV_MERGE_POIS_DATABASE)?,
            keep: required(args.keep, ARG_KEEP, ENV_MERGE_POIS_KEEP)?,
            remove: required(args.remove, ARG_REMOVE, ENV_MERGE_POIS_REMOVE)?,
        })
    }
}

/// CLI arguments for the `merge-routes` subcommand.
#[derive(Debug, Clone, Parser, Deserialize, Serialize, OrthoConfig, Default)]
#[command(
    name = "merge-routes",
    long_about = "Drop a route as a duplicate of another. The removed route \
                 loses its waypoints and bus stations; the kept route is not \
                 changed.",
    about = "Drop a route as a duplicate of another"
)]
#[ortho_config(prefix = "SMARTROUTE")]
pub(crate) struct MergeRoutesArgs {
    /// Path to the catalogue database.
    #[arg(long = ARG_DATABASE, value_name = "path")]
    #[serde(default)]
    pub(crate) database: Option<PathBuf>,
    /// Id of the route that is kept.
    #[arg(long = ARG_KEEP, value_name = "id")]
    #[serde(default)]
    pub(crate) keep: Option<String>,
    /// Id of the route that is removed.
    #[arg(long = ARG_REMOVE, value_name = "id")]
    #[serde(default)]
    pub(crate) remove: Option<String>,
}

impl MergeRoutesArgs {
    pub(crate) fn into_config(self) -> Result<MergeConfig, CliError> {
        let merged = self.load_and_merge().map_err(CliError::Configuration)?;
        MergeConfig::try_from(merged)
    }
}

impl TryFrom<MergeRoutesArgs> for MergeConfig {
    type Error = CliError;

    fn try_from(args: MergeRoutesArgs) -> Result<Self, Self::Error> {
        Ok(Self {
            catalogue: DatabaseConfig::resolve(args.database, ENV_MERGE_ROUTES_DATABASE)?,
            keep: required(args.keep, ARG_KEEP, ENV_MERGE_ROUTES_KEEP)?,
            remove: required(args.remove, ARG_REMOVE, ENV_MERGE_ROUTES_REMOVE)?,
        })
    }
}

/// Resolved configuration shared by both merge commands.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct MergeConfig {
    pub(crate) catalogue: DatabaseConfig,
    pub(crate) keep: String,
    pub(crate) remove: String,
}

fn required(
    value: Option<String>,
    field: &'static str,
    env: &'static str,
) -> Result<String, CliError> {
    value.ok_or(CliError::MissingArgument { field, env })
}

/// Summary printed after a merge.
#[derive(Debug, Serialize)]
struct MergeReport<'a> {
    kept: &'a str,
    removed: &'a str,
    applied: bool,
    touched_routes: &'a [String],
}

impl MergeReport<'_> {
    fn write(
        config: &MergeConfig,
        outcome: &CascadeOutcome,
        out: &mut dyn Write,
    ) -> Result<(), CliError> {
        let report = MergeReport {
            kept: &config.keep,
            removed: &config.remove,
            applied: outcome.is_applied(),
            touched_routes: outcome.touched_routes(),
        };
        write_json(out, &report)
    }
}

fn block_on<F>(future: F) -> Result<F::Output, CliError>
where
    F: Future,
{
    let runtime = tokio::runtime::Builder::new_current_thread()
        .build()
        .map_err(CliError::Runtime)?;
    Ok(runtime.block_on(future))
}

pub(crate) fn merge_pois(config: &MergeConfig, out: &mut dyn Write) -> Result<(), CliError> {
    let mut repo = AdminPoiRepository::new(config.catalogue.open()?);
    let outcome: Result<CascadeOutcome, AdminError> =
        block_on(repo.merge_pois(&config.keep, &config.remove))?;
    MergeReport::write(config, &outcome?, out)
}

pub(crate) fn merge_routes(config: &MergeConfig, out: &mut dyn Write) -> Result<(), CliError> {
    let mut repo = AdminRouteRepository::new(config.catalogue.open()?);
    let outcome: Result<CascadeOutcome, AdminError> =
        block_on(repo.merge_routes(&config.keep, &config.remove))?;
    MergeReport::write(config, &outcome?, out)
}
