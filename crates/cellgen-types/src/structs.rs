//! Scenario document structs.
//!
//! The shapes here are exactly what the cell-based simulator reads:
//!
//! ```text
//! { "cells": { "default": {...}, "<id>": { "state": {...},
//!              "neighborhood": { "<id>": { "correlation": f64,
//!                                          "infection_correction_factors": {...} } } } },
//!   "fields": {...} }
//! ```
//!
//! Every map that ends up in the document is an [`IndexMap`] so that key
//! order on disk is insertion order, never sort order.

use indexmap::IndexMap;
use serde::ser::SerializeMap;
use serde::{Deserialize, Serialize, Serializer};
use serde_json::{Map, Value};
use ts_rs::TS;

use crate::ids::RegionId;

/// Key of the template entry at the head of [`ScenarioCells`].
pub const DEFAULT_CELL_KEY: &str = "default";

// ---------------------------------------------------------------------------
// Adjacency input
// ---------------------------------------------------------------------------

/// A directed adjacency candidate read from the adjacency table.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AdjacencyPair {
    /// Region the edge starts from (the cell that receives the neighbor).
    pub region_id: RegionId,
    /// Region on the other side of the shared boundary.
    pub neighbor_id: RegionId,
}

impl AdjacencyPair {
    /// Build a pair from anything convertible into [`RegionId`].
    pub fn new(region_id: impl Into<RegionId>, neighbor_id: impl Into<RegionId>) -> Self {
        Self {
            region_id: region_id.into(),
            neighbor_id: neighbor_id.into(),
        }
    }

    /// Whether both ends name the same region.
    pub fn is_self_reference(&self) -> bool {
        self.region_id == self.neighbor_id
    }
}

// ---------------------------------------------------------------------------
// Cells
// ---------------------------------------------------------------------------

/// Weighted edge from a cell to one of its neighbors (or itself).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct NeighborhoodEntry {
    /// Normalized boundary-overlap weight in `(0, 1]` for geometric edges;
    /// the template's default correlation for self-loops.
    pub correlation: f64,
    /// Opaque correction factors copied from the default template.
    #[ts(type = "Record<string, unknown>")]
    pub infection_correction_factors: Value,
}

/// One geographic region's initial state and weighted neighbor list.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct Cell {
    /// Deep copy of the template state with `population` overwritten.
    #[ts(type = "Record<string, unknown>")]
    pub state: Map<String, Value>,
    /// Neighbor id to edge, in insertion order. Always contains the cell's
    /// own id once assembly finishes.
    pub neighborhood: IndexMap<RegionId, NeighborhoodEntry>,
}

impl Cell {
    /// Create a cell with the given state and no neighbors yet.
    pub fn new(state: Map<String, Value>) -> Self {
        Self {
            state,
            neighborhood: IndexMap::new(),
        }
    }

    /// Population recorded in the cell state, if it is a non-negative integer.
    pub fn population(&self) -> Option<u64> {
        self.state.get("population").and_then(Value::as_u64)
    }
}

// ---------------------------------------------------------------------------
// Scenario document
// ---------------------------------------------------------------------------

/// The `cells` object of a scenario: the verbatim template entry under
/// `"default"` followed by every assembled cell in first-seen order.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ScenarioCells {
    /// The template's `default` object, copied verbatim.
    pub default: Value,
    /// Assembled cells keyed by region id.
    pub cells: IndexMap<RegionId, Cell>,
}

impl ScenarioCells {
    /// Number of region cells, not counting the `default` entry.
    pub fn len(&self) -> usize {
        self.cells.len()
    }

    /// Whether there are no region cells.
    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    /// Look up a region cell.
    pub fn get(&self, id: &RegionId) -> Option<&Cell> {
        self.cells.get(id)
    }
}

impl Serialize for ScenarioCells {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let len = self.cells.len().saturating_add(1);
        let mut map = serializer.serialize_map(Some(len))?;
        map.serialize_entry(DEFAULT_CELL_KEY, &self.default)?;
        for (id, cell) in &self.cells {
            map.serialize_entry(id, cell)?;
        }
        map.end()
    }
}

/// Complete configuration document handed to the simulator.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct Scenario {
    /// The template entry and all region cells.
    pub cells: ScenarioCells,
    /// Passthrough metadata for the GIS web viewer.
    pub fields: Value,
}
