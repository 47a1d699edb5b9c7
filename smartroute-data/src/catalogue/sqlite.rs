//! SQLite-backed catalogue.

use std::{
    collections::HashMap,
    fmt,
    path::{Path, PathBuf},
};

use geo::Coord;
use log::debug;
use rusqlite::{Connection, OptionalExtension, Row, params};
use smartroute_core::RouteSideRecords;

use super::{CatalogueError, PoiRecord, RouteRecord, StopList, initialise_schema};

const IN_MEMORY: &str = ":memory:";

/// Read-write catalogue stored in one SQLite database.
///
/// Listings come back in insertion order; re-saving an existing row keeps its
/// place. Multi-row rewrites run inside a transaction so a failure leaves the
/// catalogue untouched.
pub struct SqliteCatalogue {
    connection: Connection,
    path: PathBuf,
}

impl fmt::Debug for SqliteCatalogue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SqliteCatalogue")
            .field("path", &self.path)
            .finish_non_exhaustive()
    }
}

impl SqliteCatalogue {
    /// Open or create the catalogue at `path`, initialising its schema.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, CatalogueError> {
        let path = path.as_ref();
        let connection = Connection::open(path).map_err(|source| CatalogueError::Open {
            path: path.to_path_buf(),
            source,
        })?;
        Self::initialise(connection, path.to_path_buf())
    }

    /// Create an empty catalogue that lives only as long as the value.
    pub fn open_in_memory() -> Result<Self, CatalogueError> {
        let connection = Connection::open_in_memory().map_err(|source| CatalogueError::Open {
            path: PathBuf::from(IN_MEMORY),
            source,
        })?;
        Self::initialise(connection, PathBuf::from(IN_MEMORY))
    }

    fn initialise(mut connection: Connection, path: PathBuf) -> Result<Self, CatalogueError> {
        initialise_schema(&mut connection)?;
        debug!("opened catalogue at {}", path.display());
        Ok(Self { connection, path })
    }

    /// Insert `poi` or overwrite the row with the same id.
    pub fn upsert_poi(&self, poi: &PoiRecord) -> Result<(), CatalogueError> {
        upsert_poi(&self.connection, poi)
    }

    /// Look up a POI by id.
    pub fn poi(&self, id: &str) -> Result<Option<PoiRecord>, CatalogueError> {
        self.connection
            .query_row(
                "SELECT id, name, details, lng, lat FROM pois WHERE id = ?1",
                [id],
                poi_from_row,
            )
            .optional()
            .map_err(CatalogueError::from)
    }

    /// Every POI, in insertion order.
    pub fn pois(&self) -> Result<Vec<PoiRecord>, CatalogueError> {
        let mut statement = self
            .connection
            .prepare("SELECT id, name, details, lng, lat FROM pois ORDER BY rowid")?;
        let rows = statement.query_map([], poi_from_row)?;
        rows.collect::<Result<_, _>>().map_err(CatalogueError::from)
    }

    /// Insert `route` or overwrite the header with the same id.
    pub fn upsert_route(&self, route: &RouteRecord) -> Result<(), CatalogueError> {
        self.connection.execute(
            "INSERT INTO routes (id, name, start_poi_id, end_poi_id, cost)
             VALUES (?1, ?2, ?3, ?4, ?5)
             ON CONFLICT(id) DO UPDATE SET
                name = excluded.name,
                start_poi_id = excluded.start_poi_id,
                end_poi_id = excluded.end_poi_id,
                cost = excluded.cost",
            params![
                route.id,
                route.name,
                route.start_poi_id,
                route.end_poi_id,
                route.cost
            ],
        )?;
        Ok(())
    }

    /// Look up a route header by id.
    pub fn route(&self, id: &str) -> Result<Option<RouteRecord>, CatalogueError> {
        self.connection
            .query_row(
                "SELECT id, name, start_poi_id, end_poi_id, cost FROM routes WHERE id = ?1",
                [id],
                route_from_row,
            )
            .optional()
            .map_err(CatalogueError::from)
    }

    /// Every route header, in insertion order.
    pub fn routes(&self) -> Result<Vec<RouteRecord>, CatalogueError> {
        let mut statement = self.connection.prepare(
            "SELECT id, name, start_poi_id, end_poi_id, cost FROM routes ORDER BY rowid",
        )?;
        let rows = statement.query_map([], route_from_row)?;
        rows.collect::<Result<_, _>>().map_err(CatalogueError::from)
    }

    /// Ids of routes that reference `poi_id` anywhere: as start, end or stop.
    pub fn routes_referencing(&self, poi_id: &str) -> Result<Vec<String>, CatalogueError> {
        let mut statement = self.connection.prepare(
            "SELECT id FROM routes
             WHERE start_poi_id = ?1
                OR end_poi_id = ?1
                OR id IN (SELECT route_id FROM route_points WHERE poi_id = ?1)
                OR id IN (SELECT route_id FROM route_bus_stations WHERE poi_id = ?1)
             ORDER BY rowid",
        )?;
        let rows = statement.query_map([poi_id], |row| row.get(0))?;
        rows.collect::<Result<_, _>>().map_err(CatalogueError::from)
    }

    /// Append `poi_id` to the end of a route's stop list.
    pub fn push_stop(
        &self,
        list: StopList,
        route_id: &str,
        poi_id: &str,
    ) -> Result<(), CatalogueError> {
        let sql = format!(
            "INSERT INTO {table} (route_id, position, poi_id)
             SELECT ?1, COALESCE(MAX(position) + 1, 0), ?2 FROM {table} WHERE route_id = ?1",
            table = list.table()
        );
        self.connection.execute(&sql, params![route_id, poi_id])?;
        Ok(())
    }

    /// Replace a route's stop list with `poi_ids`, numbered from zero.
    pub fn set_stops<S: AsRef<str>>(
        &mut self,
        list: StopList,
        route_id: &str,
        poi_ids: &[S],
    ) -> Result<(), CatalogueError> {
        let transaction = self.connection.transaction()?;
        write_stops(&transaction, list, route_id, poi_ids)?;
        transaction.commit()?;
        Ok(())
    }

    /// POI ids of one route's stop list, in route order.
    pub fn stops(&self, list: StopList, route_id: &str) -> Result<Vec<String>, CatalogueError> {
        read_stops(&self.connection, list, route_id)
    }

    /// Every route's stop list, keyed by route id.
    pub fn all_stops(&self, list: StopList) -> Result<HashMap<String, Vec<String>>, CatalogueError> {
        let sql = format!(
            "SELECT route_id, poi_id FROM {} ORDER BY route_id, position",
            list.table()
        );
        let mut statement = self.connection.prepare(&sql)?;
        let mut rows = statement.query([])?;
        let mut lists: HashMap<String, Vec<String>> = HashMap::new();
        while let Some(row) = rows.next()? {
            lists.entry(row.get(0)?).or_default().push(row.get(1)?);
        }
        Ok(lists)
    }

    /// Fold `remove_id` into `kept` in one transaction.
    ///
    /// `kept` is written as given. Every stop, start and end that pointed at
    /// `remove_id` is redirected to `kept.id`, keeping positions, and the
    /// removed row is deleted.
    pub fn reassign_poi(&mut self, kept: &PoiRecord, remove_id: &str) -> Result<(), CatalogueError> {
        let transaction = self.connection.transaction()?;
        upsert_poi(&transaction, kept)?;
        for list in StopList::ALL {
            let sql = format!("UPDATE {} SET poi_id = ?1 WHERE poi_id = ?2", list.table());
            transaction.execute(&sql, params![kept.id, remove_id])?;
        }
        transaction.execute(
            "UPDATE routes SET start_poi_id = ?1 WHERE start_poi_id = ?2",
            params![kept.id, remove_id],
        )?;
        transaction.execute(
            "UPDATE routes SET end_poi_id = ?1 WHERE end_poi_id = ?2",
            params![kept.id, remove_id],
        )?;
        transaction.execute("DELETE FROM pois WHERE id = ?1", [remove_id])?;
        transaction.commit()?;
        debug!("reassigned POI {remove_id} to {}", kept.id);
        Ok(())
    }

    /// Delete a POI and drop it from every stop list, closing the gaps.
    ///
    /// Route starts and ends are not touched, so deleting a POI that anchors
    /// a route fails and rolls back. Returns whether the POI row existed.
    pub fn remove_poi(&mut self, id: &str) -> Result<bool, CatalogueError> {
        let transaction = self.connection.transaction()?;
        for list in StopList::ALL {
            let sql = format!("SELECT DISTINCT route_id FROM {} WHERE poi_id = ?1", list.table());
            let route_ids: Vec<String> = {
                let mut statement = transaction.prepare(&sql)?;
                let rows = statement.query_map([id], |row| row.get(0))?;
                rows.collect::<Result<_, _>>()?
            };
            for route_id in route_ids {
                let remaining: Vec<String> = read_stops(&transaction, list, &route_id)?
                    .into_iter()
                    .filter(|poi_id| poi_id != id)
                    .collect();
                write_stops(&transaction, list, &route_id, &remaining)?;
            }
        }
        let deleted = transaction.execute("DELETE FROM pois WHERE id = ?1", [id])?;
        transaction.commit()?;
        Ok(deleted > 0)
    }

    /// Delete a route header. Returns whether it existed.
    ///
    /// Stop lists are left in place; clear them first with
    /// [`RouteSideRecords::delete_side_records_for_route`].
    pub fn remove_route(&self, id: &str) -> Result<bool, CatalogueError> {
        let deleted = self
            .connection
            .execute("DELETE FROM routes WHERE id = ?1", [id])?;
        Ok(deleted > 0)
    }
}

impl RouteSideRecords for SqliteCatalogue {
    type Error = CatalogueError;

    fn delete_side_records_for_route(&mut self, route_id: &str) -> Result<(), Self::Error> {
        let transaction = self.connection.transaction()?;
        delete_side_records(&transaction, route_id)?;
        transaction.commit()?;
        Ok(())
    }
}

fn upsert_poi(connection: &Connection, poi: &PoiRecord) -> Result<(), CatalogueError> {
    connection.execute(
        "INSERT INTO pois (id, name, details, lng, lat)
         VALUES (?1, ?2, ?3, ?4, ?5)
         ON CONFLICT(id) DO UPDATE SET
            name = excluded.name,
            details = excluded.details,
            lng = excluded.lng,
            lat = excluded.lat",
        params![
            poi.id,
            poi.name,
            poi.details,
            poi.location.x,
            poi.location.y
        ],
    )?;
    Ok(())
}

fn read_stops(
    connection: &Connection,
    list: StopList,
    route_id: &str,
) -> Result<Vec<String>, CatalogueError> {
    let sql = format!(
        "SELECT poi_id FROM {} WHERE route_id = ?1 ORDER BY position",
        list.table()
    );
    let mut statement = connection.prepare(&sql)?;
    let rows = statement.query_map([route_id], |row| row.get(0))?;
    rows.collect::<Result<_, _>>().map_err(CatalogueError::from)
}

fn write_stops<S: AsRef<str>>(
    connection: &Connection,
    list: StopList,
    route_id: &str,
    poi_ids: &[S],
) -> Result<(), CatalogueError> {
    let table = list.table();
    connection.execute(
        &format!("DELETE FROM {table} WHERE route_id = ?1"),
        [route_id],
    )?;
    let mut insert = connection.prepare(&format!(
        "INSERT INTO {table} (route_id, position, poi_id) VALUES (?1, ?2, ?3)"
    ))?;
    for (position, poi_id) in (0_u32..).zip(poi_ids) {
        insert.execute(params![route_id, position, poi_id.as_ref()])?;
    }
    Ok(())
}

fn delete_side_records(connection: &Connection, route_id: &str) -> Result<(), CatalogueError> {
    for list in StopList::ALL {
        let sql = format!("DELETE FROM {} WHERE route_id = ?1", list.table());
        connection.execute(&sql, [route_id])?;
    }
    Ok(())
}

fn poi_from_row(row: &Row<'_>) -> rusqlite::Result<PoiRecord> {
    Ok(PoiRecord {
        id: row.get(0)?,
        name: row.get(1)?,
        details: row.get(2)?,
        location: Coord {
            x: row.get(3)?,
            y: row.get(4)?,
        },
    })
}

fn route_from_row(row: &Row<'_>) -> rusqlite::Result<RouteRecord> {
    Ok(RouteRecord {
        id: row.get(0)?,
        name: row.get(1)?,
        start_poi_id: row.get(2)?,
        end_poi_id: row.get(3)?,
        cost: row.get(4)?,
    })
}
