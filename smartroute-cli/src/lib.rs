//! Command-line interface for SmartRoute catalogue maintenance.
#![forbid(unsafe_code)]

use std::{
    io::{self, Write},
    path::{Path, PathBuf},
};

use clap::{Parser, Subcommand};
use flexi_logger::{Logger, LoggerHandle};
use serde::Serialize;
use smartroute_data::SqliteCatalogue;

mod error;
mod listing;
mod merge;

pub use error::CliError;

use listing::{DuplicatePoisArgs, DuplicateRoutesArgs};
use merge::{MergePoisArgs, MergeRoutesArgs};

const ARG_DATABASE: &str = "database";
const ARG_KEEP: &str = "keep";
const ARG_REMOVE: &str = "remove";
const ENV_DUPLICATE_POIS_DATABASE: &str = "SMARTROUTE_CMDS_DUPLICATE_POIS_DATABASE";
const ENV_DUPLICATE_ROUTES_DATABASE: &str = "SMARTROUTE_CMDS_DUPLICATE_ROUTES_DATABASE";
const ENV_MERGE_POIS_DATABASE: &str = "SMARTROUTE_CMDS_MERGE_POIS_DATABASE";
const ENV_MERGE_POIS_KEEP: &str = "SMARTROUTE_CMDS_MERGE_POIS_KEEP";
const ENV_MERGE_POIS_REMOVE: &str = "SMARTROUTE_CMDS_MERGE_POIS_REMOVE";
const ENV_MERGE_ROUTES_DATABASE: &str = "SMARTROUTE_CMDS_MERGE_ROUTES_DATABASE";
const ENV_MERGE_ROUTES_KEEP: &str = "SMARTROUTE_CMDS_MERGE_ROUTES_KEEP";
const ENV_MERGE_ROUTES_REMOVE: &str = "SMARTROUTE_CMDS_MERGE_ROUTES_REMOVE";

/// Log level used when `RUST_LOG` is unset.
const DEFAULT_LOG_SPEC: &str = "warn";

/// Install a stderr logger driven by `RUST_LOG`.
///
/// Keep the returned handle alive for as long as logging is needed.
pub fn init_logging() -> Result<LoggerHandle, CliError> {
    Ok(Logger::try_with_env_or_str(DEFAULT_LOG_SPEC)?
        .log_to_stderr()
        .start()?)
}

/// Run the SmartRoute CLI with the current process arguments and environment.
pub fn run() -> Result<(), CliError> {
    let cli = Cli::try_parse().map_err(CliError::ArgumentParsing)?;
    let stdout = io::stdout();
    execute(cli.command, &mut stdout.lock())
}

fn execute(command: Command, out: &mut dyn Write) -> Result<(), CliError> {
    match command {
        Command::DuplicatePois(args) => listing::duplicate_pois(&args.into_config()?, out),
        Command::DuplicateRoutes(args) => listing::duplicate_routes(&args.into_config()?, out),
        Command::MergePois(args) => merge::merge_pois(&args.into_config()?, out),
        Command::MergeRoutes(args) => merge::merge_routes(&args.into_config()?, out),
    }
}

#[derive(Debug, Parser)]
#[command(
    name = "smartroute",
    about = "Find and fold together duplicate POIs and routes in a SmartRoute catalogue",
    version
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// List POIs that look like duplicates.
    DuplicatePois(DuplicatePoisArgs),
    /// List routes that look like duplicates.
    DuplicateRoutes(DuplicateRoutesArgs),
    /// Merge one POI into another.
    MergePois(MergePoisArgs),
    /// Drop a route as a duplicate of another.
    MergeRoutes(MergeRoutesArgs),
}

/// Resolved location of the catalogue database.
#[derive(Debug, Clone, PartialEq, Eq)]
struct DatabaseConfig {
    database: PathBuf,
}

impl DatabaseConfig {
    fn resolve(database: Option<PathBuf>, env: &'static str) -> Result<Self, CliError> {
        let database = database.ok_or(CliError::MissingArgument {
            field: ARG_DATABASE,
            env,
        })?;
        Ok(Self { database })
    }

    /// Open the catalogue, refusing to create a new database.
    fn open(&self) -> Result<SqliteCatalogue, CliError> {
        require_existing(&self.database)?;
        Ok(SqliteCatalogue::open(&self.database)?)
    }
}

fn require_existing(path: &Path) -> Result<(), CliError> {
    if path.is_file() {
        Ok(())
    } else {
        Err(CliError::MissingDatabase {
            path: path.to_path_buf(),
        })
    }
}

fn write_json<T: Serialize + ?Sized>(out: &mut dyn Write, value: &T) -> Result<(), CliError> {
    serde_json::to_writer_pretty(&mut *out, value).map_err(CliError::Serialize)?;
    writeln!(out).map_err(CliError::Output)
}

#[cfg(test)]
mod tests;
