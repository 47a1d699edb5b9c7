use serde::{Deserialize, Serialize};

/// A named point of interest with free-text details.
///
/// The identifier is fixed at construction; name and details may be edited
/// through [`crate::EntityStore::update_point`] or reconciled by a merge.
///
/// # Examples
/// ```
/// use smartroute_core::Point;
///
/// let point = Point::new("1", "Museum", "Opens at nine");
///
/// assert_eq!(point.id(), "1");
/// assert_eq!(point.name, "Museum");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Point {
    id: String,
    /// Display name.
    pub name: String,
    /// Free-text details, possibly spanning several lines after a merge.
    #[serde(default)]
    pub details: String,
}

impl Point {
    /// Construct a `Point`.
    pub fn new(id: impl Into<String>, name: impl Into<String>, details: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            details: details.into(),
        }
    }

    /// Construct a `Point` without details.
    ///
    /// # Examples
    /// ```
    /// use smartroute_core::Point;
    ///
    /// let point = Point::named("1", "Museum");
    /// assert!(point.details.is_empty());
    /// ```
    pub fn named(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self::new(id, name, String::new())
    }

    /// Stable identifier.
    pub fn id(&self) -> &str {
        &self.id
    }
}
