//! Test helpers for building catalogue databases and invoking commands.

use super::*;
use geo::Coord;
use smartroute_data::{PoiRecord, RouteRecord, StopList};
use tempfile::TempDir;

/// On-disk catalogue seeded with one duplicate of each kind.
///
/// - POIs `1` ("Αγορά") and `2` ("αγορά ") share a name.
/// - POIs `3` and `4` share coordinates under different names.
/// - Routes `r1` and `r2` visit the same waypoints.
#[derive(Debug)]
pub(super) struct CatalogueFile {
    dir: TempDir,
    path: PathBuf,
}

impl CatalogueFile {
    pub(super) fn new() -> Self {
        let dir = TempDir::new().expect("tempdir");
        let path = dir.path().join("catalogue.sqlite");
        let catalogue = SqliteCatalogue::open(&path).expect("create catalogue");
        for (id, name, x) in [
            ("1", "Αγορά", 22.94),
            ("2", "αγορά ", 22.95),
            ("3", "Ροτόντα", 22.96),
            ("4", "Rotonda", 22.96),
        ] {
            catalogue
                .upsert_poi(&PoiRecord::new(id, name, "", Coord { x, y: 40.63 }))
                .expect("insert poi");
        }
        for (id, name) in [("r1", "Κέντρο"), ("r2", "Κέντρο βράδυ")] {
            catalogue
                .upsert_route(&RouteRecord::new(id, name, "1", "3"))
                .expect("insert route");
            for stop in ["1", "2", "3"] {
                catalogue
                    .push_stop(StopList::Waypoints, id, stop)
                    .expect("push waypoint");
            }
        }
        Self { dir, path }
    }

    pub(super) fn path(&self) -> &Path {
        &self.path
    }

    /// Path inside the temp dir that was never created.
    pub(super) fn missing_path(&self) -> PathBuf {
        self.dir.path().join("missing.sqlite")
    }

    pub(super) fn reopen(&self) -> SqliteCatalogue {
        SqliteCatalogue::open(&self.path).expect("reopen catalogue")
    }
}

/// Parse `args` as a `smartroute` invocation and run it, capturing stdout.
pub(super) fn invoke<I, S>(args: I) -> Result<String, CliError>
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    let mut invocation = vec!["smartroute".to_owned()];
    invocation.extend(args.into_iter().map(Into::into));
    let cli = Cli::try_parse_from(invocation).map_err(CliError::ArgumentParsing)?;
    let mut out = Vec::new();
    execute(cli.command, &mut out)?;
    Ok(String::from_utf8(out).expect("command output is UTF-8"))
}
