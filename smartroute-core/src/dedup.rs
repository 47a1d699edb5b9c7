//! Helpers for spotting merge candidates.
//!
//! Grouping is deterministic: groups appear in the order their first member
//! was seen, and members keep input order.

use std::collections::HashMap;
use std::hash::Hash;

use indexmap::IndexMap;

/// Partition `items` by `key` and keep partitions with two or more members.
///
/// # Examples
/// ```
/// use smartroute_core::dedup::group_duplicates;
///
/// let groups = group_duplicates(["ab", "c", "ad", "e"], |s| s.chars().next());
/// assert_eq!(groups, vec![vec!["ab", "ad"]]);
/// ```
pub fn group_duplicates<T, K, F>(items: impl IntoIterator<Item = T>, key: F) -> Vec<Vec<T>>
where
    K: Eq + Hash,
    F: Fn(&T) -> K,
{
    let mut groups: IndexMap<K, Vec<T>> = IndexMap::new();
    for item in items {
        groups.entry(key(&item)).or_default().push(item);
    }
    groups
        .into_values()
        .filter(|group| group.len() > 1)
        .collect()
}

/// Comparison form of a display name: trimmed and lower-cased.
///
/// # Examples
/// ```
/// use smartroute_core::dedup::normalise_name;
///
/// assert_eq!(normalise_name("  Ακρόπολη "), normalise_name("ακρόπολη"));
/// ```
pub fn normalise_name(name: &str) -> String {
    name.trim().to_lowercase()
}

/// Whether two stop lists differ by more than ordering.
///
/// Reordering the same stops is not a change; adding, removing, or changing
/// how many times a stop appears is.
///
/// # Examples
/// ```
/// use smartroute_core::dedup::membership_changed;
///
/// assert!(!membership_changed(&["a", "b"], &["b", "a"]));
/// assert!(membership_changed(&["a", "b"], &["a", "a"]));
/// ```
pub fn membership_changed<S: AsRef<str>>(original: &[S], current: &[S]) -> bool {
    if original.len() != current.len() {
        return true;
    }
    counts(original) != counts(current)
}

fn counts<S: AsRef<str>>(ids: &[S]) -> HashMap<&str, usize> {
    let mut counts = HashMap::new();
    for id in ids {
        *counts.entry(id.as_ref()).or_insert(0) += 1;
    }
    counts
}
