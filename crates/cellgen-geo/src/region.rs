//! Region table: per-region attributes and validity.
//!
//! A region is *invalid* when its population is null or zero. Invalid
//! regions stay in the table so they can be told apart from regions that
//! are missing altogether: adjacency rows touching an invalid region are
//! dropped, while a missing region is a data-integrity error.

use std::collections::BTreeSet;

use cellgen_types::RegionId;
use indexmap::IndexMap;
use tracing::warn;

use crate::error::GeoError;

/// Attributes of one region from the cleaned region table.
#[derive(Debug, Clone, PartialEq)]
pub struct Region {
    /// Region identifier.
    pub id: RegionId,
    /// Population, `None` when the source cell is null.
    pub population: Option<u64>,
    /// Area in the table's units, when present.
    pub area: Option<f64>,
}

impl Region {
    /// Build a region row.
    pub fn new(id: impl Into<RegionId>, population: Option<u64>, area: Option<f64>) -> Self {
        Self {
            id: id.into(),
            population,
            area,
        }
    }

    /// Whether the region can become a cell (population present and non-zero).
    pub const fn is_valid(&self) -> bool {
        matches!(self.population, Some(n) if n > 0)
    }
}

/// All regions of one run, keyed by id in table order.
#[derive(Debug, Clone, Default)]
pub struct RegionTable {
    regions: IndexMap<RegionId, Region>,
}

impl RegionTable {
    /// Create an empty table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a region row.
    ///
    /// The first row for an id wins; later rows with the same id are ignored
    /// with a warning. Returns `true` when the row was kept.
    pub fn insert(&mut self, region: Region) -> bool {
        if self.regions.contains_key(&region.id) {
            warn!(region_id = %region.id, "duplicate region row ignored");
            return false;
        }
        self.regions.insert(region.id.clone(), region);
        true
    }

    /// Look up a region.
    pub fn get(&self, id: &RegionId) -> Option<&Region> {
        self.regions.get(id)
    }

    /// Look up a region that must exist.
    ///
    /// # Errors
    ///
    /// Returns [`GeoError::RegionNotFound`] if the id is not in the table.
    pub fn require(&self, id: &RegionId) -> Result<&Region, GeoError> {
        self.regions
            .get(id)
            .ok_or_else(|| GeoError::RegionNotFound(id.clone()))
    }

    /// Whether the id names a region with null or zero population.
    ///
    /// Ids absent from the table are not invalid, they are missing.
    pub fn is_invalid(&self, id: &RegionId) -> bool {
        self.regions.get(id).is_some_and(|r| !r.is_valid())
    }

    /// Ids of every invalid region.
    pub fn invalid_ids(&self) -> BTreeSet<RegionId> {
        self.regions
            .values()
            .filter(|r| !r.is_valid())
            .map(|r| r.id.clone())
            .collect()
    }

    /// Number of regions in the table.
    pub fn len(&self) -> usize {
        self.regions.len()
    }

    /// Whether the table is empty.
    pub fn is_empty(&self) -> bool {
        self.regions.is_empty()
    }

    /// Iterate over regions in table order.
    pub fn iter(&self) -> impl Iterator<Item = &Region> {
        self.regions.values()
    }
}

impl FromIterator<Region> for RegionTable {
    fn from_iter<I: IntoIterator<Item = Region>>(iter: I) -> Self {
        let mut table = Self::new();
        for region in iter {
            table.insert(region);
        }
        table
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_table() -> RegionTable {
        [
            Region::new("1", Some(500), Some(2.5)),
            Region::new("2", Some(0), Some(1.0)),
            Region::new("3", None, None),
            Region::new("4", Some(12), None),
        ]
        .into_iter()
        .collect()
    }

    #[test]
    fn null_and_zero_population_are_invalid() {
        let table = sample_table();
        assert!(!table.is_invalid(&RegionId::new("1")));
        assert!(table.is_invalid(&RegionId::new("2")));
        assert!(table.is_invalid(&RegionId::new("3")));
        assert!(!table.is_invalid(&RegionId::new("4")));
    }

    #[test]
    fn missing_region_is_not_invalid() {
        let table = sample_table();
        assert!(!table.is_invalid(&RegionId::new("99")));
        assert!(table.require(&RegionId::new("99")).is_err());
    }

    #[test]
    fn invalid_ids_lists_only_invalid() {
        let ids: Vec<String> = sample_table()
            .invalid_ids()
            .into_iter()
            .map(RegionId::into_inner)
            .collect();
        assert_eq!(ids, vec!["2".to_owned(), "3".to_owned()]);
    }

    #[test]
    fn first_duplicate_row_wins() {
        let mut table = sample_table();
        assert!(!table.insert(Region::new("1", Some(1), None)));
        assert_eq!(
            table.get(&RegionId::new("1")).and_then(|r| r.population),
            Some(500)
        );
        assert_eq!(table.len(), 4);
    }

    #[test]
    fn iteration_follows_table_order() {
        let table = sample_table();
        let order: Vec<&str> = table.iter().map(|r| r.id.as_str()).collect();
        assert_eq!(order, vec!["1", "2", "3", "4"]);
    }
}
