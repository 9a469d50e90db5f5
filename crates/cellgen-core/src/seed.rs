//! Seed-infection overrides.
//!
//! Only `susceptible` and `exposed` are always written; `infected`,
//! `recovered` and `fatalities` are written only when the seed carries them.
//! Nothing else in a cell's state is touched. Seeds naming a region that did
//! not become a cell are skipped and reported, never treated as errors: seed
//! files are shared between region sets that do not all contain every id.

use cellgen_types::RegionId;
use serde_json::{Map, Value};
use tracing::{info, warn};

use crate::graph::CellGraph;
use crate::template::{SeedSet, SeedState};

/// Outcome of applying a seed set.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SeedReport {
    /// Seeds written onto a cell, in seed-file order.
    pub applied: Vec<RegionId>,
    /// Seeds with no matching cell, in seed-file order.
    pub unmatched: Vec<RegionId>,
}

/// Overlay every seed onto its matching cell.
pub fn apply_seeds(graph: &mut CellGraph, seeds: &SeedSet) -> SeedReport {
    let mut report = SeedReport::default();
    for (id, seed) in seeds.iter() {
        match graph.get_mut(id) {
            Some(cell) => {
                overlay(&mut cell.state, &seed.state);
                report.applied.push(id.clone());
            }
            None => report.unmatched.push(id.clone()),
        }
    }

    if !report.unmatched.is_empty() {
        let ids: Vec<&str> = report.unmatched.iter().map(RegionId::as_str).collect();
        warn!(
            count = report.unmatched.len(),
            ids = ?ids,
            "seed ids with no matching cell ignored"
        );
    }
    info!(applied = report.applied.len(), "seed infections applied");
    report
}

fn overlay(state: &mut Map<String, Value>, seed: &SeedState) {
    state.insert("susceptible".to_owned(), seed.susceptible.clone());
    state.insert("exposed".to_owned(), seed.exposed.clone());
    let optional = [
        ("infected", &seed.infected),
        ("recovered", &seed.recovered),
        ("fatalities", &seed.fatalities),
    ];
    for (key, value) in optional {
        if let Some(value) = value {
            state.insert(key.to_owned(), value.clone());
        }
    }
}
