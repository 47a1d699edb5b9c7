use rusqlite::{Connection, OptionalExtension, Transaction};

use super::CatalogueError;

/// Version recorded in `catalogue_schema_version` by this build.
pub const SCHEMA_VERSION: i64 = 2;

/// Create the catalogue tables inside an SQLite database.
///
/// Idempotent for databases already at [`SCHEMA_VERSION`]; any other recorded
/// version is rejected so migrations can be applied explicitly. Foreign keys
/// are enabled on `connection`, so every route endpoint and stop must name an
/// existing POI.
///
/// # Examples
/// ```
/// use rusqlite::Connection;
/// use smartroute_data::catalogue::initialise_schema;
///
/// let mut conn = Connection::open_in_memory().expect("create in-memory database");
/// initialise_schema(&mut conn).expect("create catalogue schema");
/// initialise_schema(&mut conn).expect("second run is a no-op");
///
/// let version: i64 = conn
///     .query_row("SELECT version FROM catalogue_schema_version", [], |row| row.get(0))
///     .expect("read schema version");
/// assert_eq!(version, 2);
/// ```
pub fn initialise_schema(connection: &mut Connection) -> Result<(), CatalogueError> {
    connection
        .pragma_update(None, "foreign_keys", true)
        .map_err(|source| CatalogueError::Migration {
            step: "enable foreign keys",
            source,
        })?;

    let transaction = connection
        .transaction()
        .map_err(|source| CatalogueError::Migration {
            step: "begin schema transaction",
            source,
        })?;

    create_tables(&transaction)?;
    create_indexes(&transaction)?;
    ensure_schema_version(&transaction)?;

    transaction
        .commit()
        .map_err(|source| CatalogueError::Migration {
            step: "commit schema transaction",
            source,
        })
}

fn create_tables(transaction: &Transaction<'_>) -> Result<(), CatalogueError> {
    run_migration_step(
        transaction,
        "create pois",
        "CREATE TABLE IF NOT EXISTS pois (
            id TEXT PRIMARY KEY CHECK (length(trim(id)) > 0),
            name TEXT NOT NULL,
            details TEXT NOT NULL DEFAULT '',
            lng REAL NOT NULL,
            lat REAL NOT NULL
        )",
    )?;
    run_migration_step(
        transaction,
        "create routes",
        "CREATE TABLE IF NOT EXISTS routes (
            id TEXT PRIMARY KEY CHECK (length(trim(id)) > 0),
            name TEXT NOT NULL,
            start_poi_id TEXT NOT NULL REFERENCES pois(id),
            end_poi_id TEXT NOT NULL REFERENCES pois(id),
            cost REAL NOT NULL DEFAULT 0
        )",
    )?;
    run_migration_step(
        transaction,
        "create route_points",
        "CREATE TABLE IF NOT EXISTS route_points (
            route_id TEXT NOT NULL,
            position INTEGER NOT NULL CHECK (position >= 0),
            poi_id TEXT NOT NULL,
            PRIMARY KEY (route_id, position),
            FOREIGN KEY (poi_id) REFERENCES pois(id)
        ) WITHOUT ROWID",
    )?;
    run_migration_step(
        transaction,
        "create route_bus_stations",
        "CREATE TABLE IF NOT EXISTS route_bus_stations (
            route_id TEXT NOT NULL,
            position INTEGER NOT NULL CHECK (position >= 0),
            poi_id TEXT NOT NULL,
            PRIMARY KEY (route_id, position),
            FOREIGN KEY (poi_id) REFERENCES pois(id)
        ) WITHOUT ROWID",
    )
}

fn create_indexes(transaction: &Transaction<'_>) -> Result<(), CatalogueError> {
    run_migration_step(
        transaction,
        "index pois by location",
        "CREATE INDEX IF NOT EXISTS idx_pois_location ON pois(lat, lng)",
    )?;
    run_migration_step(
        transaction,
        "index route_points by poi",
        "CREATE INDEX IF NOT EXISTS idx_route_points_poi ON route_points(poi_id)",
    )?;
    run_migration_step(
        transaction,
        "index route_bus_stations by poi",
        "CREATE INDEX IF NOT EXISTS idx_route_bus_stations_poi ON route_bus_stations(poi_id)",
    )
}

fn ensure_schema_version(transaction: &Transaction<'_>) -> Result<(), CatalogueError> {
    run_migration_step(
        transaction,
        "create schema version table",
        "CREATE TABLE IF NOT EXISTS catalogue_schema_version (
            version INTEGER PRIMARY KEY CHECK (version > 0),
            applied_at TEXT NOT NULL DEFAULT (strftime('%Y-%m-%dT%H:%M:%SZ', 'now'))
        ) WITHOUT ROWID",
    )?;

    let existing_version: Option<i64> = transaction
        .query_row(
            "SELECT version FROM catalogue_schema_version LIMIT 1",
            [],
            |row| row.get(0),
        )
        .optional()
        .map_err(|source| CatalogueError::Migration {
            step: "read schema version",
            source,
        })?;

    match existing_version {
        Some(version) if version == SCHEMA_VERSION => Ok(()),
        Some(found) => Err(CatalogueError::VersionMismatch {
            expected: SCHEMA_VERSION,
            found,
        }),
        None => transaction
            .execute(
                "INSERT INTO catalogue_schema_version (version) VALUES (?1)",
                [SCHEMA_VERSION],
            )
            .map(|_| ())
            .map_err(|source| CatalogueError::Migration {
                step: "record schema version",
                source,
            }),
    }
}

fn run_migration_step(
    transaction: &Transaction<'_>,
    step: &'static str,
    sql: &str,
) -> Result<(), CatalogueError> {
    transaction
        .execute(sql, [])
        .map(|_| ())
        .map_err(|source| CatalogueError::Migration { step, source })
}
