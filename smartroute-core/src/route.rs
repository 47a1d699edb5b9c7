//! Routes through points of interest.
//!
//! A [`Route`] is an ordered list of point identifiers. The same point may be
//! visited more than once. [`RouteSegment`] describes how a leg of a trip is
//! travelled.

use serde::{Deserialize, Serialize};

/// An ordered path through points, referenced by id.
///
/// # Examples
/// ```
/// use smartroute_core::Route;
///
/// let route = Route::new("r", ["1", "2", "1"]);
///
/// assert_eq!(route.id(), "r");
/// assert_eq!(route.point_ids, vec!["1", "2", "1"]);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Route {
    id: String,
    /// Point identifiers visited in order. Duplicates are allowed.
    #[serde(default)]
    pub point_ids: Vec<String>,
}

impl Route {
    /// Construct a route from its id and the ordered point ids.
    pub fn new<I, S>(id: impl Into<String>, point_ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            id: id.into(),
            point_ids: point_ids.into_iter().map(Into::into).collect(),
        }
    }

    /// Construct a route that visits no points yet.
    pub fn empty(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            point_ids: Vec::new(),
        }
    }

    /// Stable identifier.
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Whether any stop of the route is `point_id`.
    pub fn visits(&self, point_id: &str) -> bool {
        self.point_ids.iter().any(|id| id == point_id)
    }

    /// Rewrite every occurrence of `from` to `to`, keeping length and order.
    ///
    /// Returns `true` when at least one stop was rewritten.
    pub(crate) fn replace_point(&mut self, from: &str, to: &str) -> bool {
        let mut changed = false;
        for id in self.point_ids.iter_mut().filter(|id| id.as_str() == from) {
            to.clone_into(id);
            changed = true;
        }
        changed
    }

    /// Drop every occurrence of `point_id`.
    ///
    /// Returns `true` when the route shrank.
    pub(crate) fn remove_point(&mut self, point_id: &str) -> bool {
        let before = self.point_ids.len();
        self.point_ids.retain(|id| id != point_id);
        self.point_ids.len() != before
    }
}

/// Driver assigned to a bus leg.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DriverInfo {
    /// Driver identifier.
    pub id: String,
    /// Display name.
    pub name: String,
}

/// One leg of a trip, either on foot or by bus.
///
/// `start` and `end` are point identifiers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RouteSegment {
    /// Walking leg.
    Walk { start: String, end: String },
    /// Bus leg driven by `driver`.
    Bus {
        start: String,
        end: String,
        driver: DriverInfo,
    },
}

impl RouteSegment {
    /// Point id where the leg begins.
    pub fn start(&self) -> &str {
        match self {
            Self::Walk { start, .. } | Self::Bus { start, .. } => start,
        }
    }

    /// Point id where the leg ends.
    pub fn end(&self) -> &str {
        match self {
            Self::Walk { end, .. } | Self::Bus { end, .. } => end,
        }
    }

    /// The driver of a bus leg, if any.
    pub fn driver(&self) -> Option<&DriverInfo> {
        match self {
            Self::Walk { .. } => None,
            Self::Bus { driver, .. } => Some(driver),
        }
    }
}

/// A trip made of several walk and bus legs.
///
/// # Examples
/// ```
/// use smartroute_core::{ComplexRoute, DriverInfo, RouteSegment};
///
/// let trip = ComplexRoute::new(vec![
///     RouteSegment::Walk { start: "a".into(), end: "b".into() },
///     RouteSegment::Bus {
///         start: "b".into(),
///         end: "c".into(),
///         driver: DriverInfo { id: "d1".into(), name: "Eleni".into() },
///     },
/// ]);
///
/// assert!(trip.is_driver_assigned("d1"));
/// assert!(!trip.is_driver_assigned("d2"));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ComplexRoute {
    /// Legs in travel order.
    pub segments: Vec<RouteSegment>,
}

impl ComplexRoute {
    /// Construct a trip from its legs.
    pub fn new(segments: Vec<RouteSegment>) -> Self {
        Self { segments }
    }

    /// Whether `driver_id` drives any bus leg of this trip.
    pub fn is_driver_assigned(&self, driver_id: &str) -> bool {
        self.segments
            .iter()
            .filter_map(RouteSegment::driver)
            .any(|driver| driver.id == driver_id)
    }

    /// Whether the legs chain end-to-start without gaps.
    pub fn is_contiguous(&self) -> bool {
        self.segments
            .windows(2)
            .all(|pair| matches!(pair, [a, b] if a.end() == b.start()))
    }
}
