//! Error types emitted by the SmartRoute CLI.
//!
//! Keep this error type reasonably small, as every CLI helper returns
//! `Result<_, CliError>`.

use std::{path::PathBuf, sync::Arc};

use smartroute_data::{AdminError, CatalogueError};
use thiserror::Error;

/// Errors emitted by the SmartRoute CLI.
#[derive(Debug, Error)]
pub enum CliError {
    /// Provided arguments failed Clap validation.
    #[error(transparent)]
    ArgumentParsing(#[from] clap::Error),
    /// Configuration layering failed (files, env, CLI).
    #[error("failed to load configuration: {0}")]
    Configuration(#[from] Arc<ortho_config::OrthoError>),
    /// A required option is missing after configuration merging.
    #[error("missing {field} (set --{field} or {env})")]
    MissingArgument {
        field: &'static str,
        env: &'static str,
    },
    /// The catalogue database does not exist or is not a file.
    #[error("catalogue database {path:?} does not exist or is not a file")]
    MissingDatabase { path: PathBuf },
    /// Opening or reading the catalogue failed.
    #[error(transparent)]
    Catalogue(#[from] CatalogueError),
    /// An admin operation failed.
    #[error(transparent)]
    Admin(#[from] AdminError),
    /// The async runtime could not be started.
    #[error("failed to start async runtime: {0}")]
    Runtime(#[source] std::io::Error),
    /// Serializing command output failed.
    #[error("failed to serialize output: {0}")]
    Serialize(#[source] serde_json::Error),
    /// Writing command output failed.
    #[error("failed to write output: {0}")]
    Output(#[source] std::io::Error),
    /// The logger could not be installed.
    #[error("failed to initialise logging: {0}")]
    Logging(#[from] flexi_logger::FlexiLoggerError),
}
