//! Mapping from catalogue rows to mirror documents.

use serde_json::Value;
use smartroute_core::Fields;

use super::{PoiRecord, RouteRecord};

/// Document written to the `pois` collection.
///
/// # Examples
/// ```
/// use geo::Coord;
/// use smartroute_data::catalogue::{PoiRecord, poi_document};
///
/// let poi = PoiRecord::new("7", "Ροτόντα", "", Coord { x: 22.9527, y: 40.6333 });
/// let fields = poi_document(&poi);
/// assert_eq!(fields["lat"], 40.6333);
/// assert_eq!(fields["name"], "Ροτόντα");
/// ```
pub fn poi_document(poi: &PoiRecord) -> Fields {
    let mut fields = Fields::new();
    fields.insert("id".into(), Value::from(poi.id.as_str()));
    fields.insert("name".into(), Value::from(poi.name.as_str()));
    fields.insert("details".into(), Value::from(poi.details.as_str()));
    fields.insert("lat".into(), Value::from(poi.location.y));
    fields.insert("lng".into(), Value::from(poi.location.x));
    fields
}

/// Document written to the `routes` collection.
///
/// Stop lists are stored as arrays of POI ids in route order.
pub fn route_document(route: &RouteRecord, waypoints: &[String], bus_stations: &[String]) -> Fields {
    let ids = |list: &[String]| Value::from(list.to_vec());
    let mut fields = Fields::new();
    fields.insert("id".into(), Value::from(route.id.as_str()));
    fields.insert("name".into(), Value::from(route.name.as_str()));
    fields.insert("start".into(), Value::from(route.start_poi_id.as_str()));
    fields.insert("end".into(), Value::from(route.end_poi_id.as_str()));
    fields.insert("cost".into(), Value::from(route.cost));
    fields.insert("points".into(), ids(waypoints));
    fields.insert("busStations".into(), ids(bus_stations));
    fields
}
