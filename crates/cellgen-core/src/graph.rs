//! Cell graph assembly: adjacency rows in, ordered cells with weighted
//! neighborhoods out.
//!
//! Assembly is two passes over owned, single-threaded state:
//!
//! 1. Scan the adjacency rows in source order. Rows touching an invalid
//!    region are dropped. The first row naming a region creates its cell;
//!    every row contributes one neighborhood edge unless its correlation is
//!    zero.
//! 2. Give every created cell its self-loop. A genuine self-adjacency row is
//!    overwritten here, so the template weight always wins.
//!
//! Cell order is the order in which region ids are first encountered as the
//! source of a surviving row.

use cellgen_geo::{CorrelationSource, RegionTable};
use cellgen_types::{AdjacencyPair, Cell, DEFAULT_CELL_KEY, RegionId};
use indexmap::IndexMap;
use tracing::{debug, info, warn};

use crate::error::ScenarioError;
use crate::template::DefaultCellTemplate;

/// Ordered mapping from region id to cell.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CellGraph {
    cells: IndexMap<RegionId, Cell>,
}

impl CellGraph {
    /// Create an empty graph.
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a cell, replacing any previous cell with the same id in place.
    pub(crate) fn insert(&mut self, id: RegionId, cell: Cell) {
        self.cells.insert(id, cell);
    }

    /// Look up a cell.
    pub fn get(&self, id: &RegionId) -> Option<&Cell> {
        self.cells.get(id)
    }

    /// Look up a cell mutably.
    pub fn get_mut(&mut self, id: &RegionId) -> Option<&mut Cell> {
        self.cells.get_mut(id)
    }

    /// Whether the graph holds a cell for the id.
    pub fn contains(&self, id: &RegionId) -> bool {
        self.cells.contains_key(id)
    }

    /// Number of cells.
    pub fn len(&self) -> usize {
        self.cells.len()
    }

    /// Whether the graph has no cells.
    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    /// Cell ids in insertion order.
    pub fn ids(&self) -> impl Iterator<Item = &RegionId> {
        self.cells.keys()
    }

    /// Release the underlying ordered map.
    pub fn into_cells(self) -> IndexMap<RegionId, Cell> {
        self.cells
    }
}

/// Counters and dropped rows from one assembly run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AssemblyReport {
    /// Adjacency rows scanned.
    pub rows_scanned: usize,
    /// Cells created.
    pub cells_created: usize,
    /// Geometric edges recorded (self-loops excluded).
    pub edges_recorded: usize,
    /// Rows dropped because either end is an invalid region.
    pub invalid_pairs: Vec<AdjacencyPair>,
    /// Rows dropped because the regions share no boundary.
    pub zero_correlation_pairs: usize,
    /// Self-adjacency rows whose edge was replaced by the self-loop.
    pub self_references: usize,
}

/// Builds a [`CellGraph`] from adjacency rows.
#[derive(Debug)]
pub struct CellGraphAssembler<'a, C> {
    regions: &'a RegionTable,
    correlations: &'a C,
    template: &'a DefaultCellTemplate,
    progress_every: Option<usize>,
}

impl<'a, C: CorrelationSource> CellGraphAssembler<'a, C> {
    /// Create an assembler over the run's read-only inputs.
    pub const fn new(
        regions: &'a RegionTable,
        correlations: &'a C,
        template: &'a DefaultCellTemplate,
    ) -> Self {
        Self {
            regions,
            correlations,
            template,
            progress_every: None,
        }
    }

    /// Log a progress line every `every` rows. `None` or `Some(0)` disables.
    #[must_use]
    pub const fn with_progress(mut self, every: Option<usize>) -> Self {
        self.progress_every = every;
        self
    }

    /// Run both passes over the adjacency rows.
    ///
    /// # Errors
    ///
    /// Returns [`ScenarioError`] when a row names a region missing from the
    /// region table or the correlation source, or a region id equal to the
    /// reserved `default` key. Nothing is returned on failure.
    pub fn assemble(
        &self,
        pairs: &[AdjacencyPair],
    ) -> Result<(CellGraph, AssemblyReport), ScenarioError> {
        let mut graph = CellGraph::new();
        let mut report = AssemblyReport::default();
        let total = pairs.len();

        for (row, pair) in pairs.iter().enumerate() {
            report.rows_scanned = report.rows_scanned.saturating_add(1);
            self.scan_row(pair, &mut graph, &mut report)?;
            self.log_progress(row, total);
        }

        for (id, cell) in &mut graph.cells {
            if cell
                .neighborhood
                .insert(id.clone(), self.template.self_loop_entry())
                .is_some()
            {
                debug!(region_id = %id, "self-adjacency edge replaced by self-loop");
                report.self_references = report.self_references.saturating_add(1);
            }
        }

        if self.progress_every.is_some_and(|every| every > 0) {
            info!(rows = total, percent = 100, "adjacency scan complete");
        }
        info!(
            cells = report.cells_created,
            edges = report.edges_recorded,
            invalid_pairs = report.invalid_pairs.len(),
            zero_correlation_pairs = report.zero_correlation_pairs,
            "cell graph assembled"
        );

        Ok((graph, report))
    }

    fn scan_row(
        &self,
        pair: &AdjacencyPair,
        graph: &mut CellGraph,
        report: &mut AssemblyReport,
    ) -> Result<(), ScenarioError> {
        if self.regions.is_invalid(&pair.region_id) {
            warn!(region_id = %pair.region_id, "invalid region id, adjacency row dropped");
            report.invalid_pairs.push(pair.clone());
            return Ok(());
        }
        if self.regions.is_invalid(&pair.neighbor_id) {
            warn!(
                neighbor_id = %pair.neighbor_id,
                "invalid neighborhood region id, adjacency row dropped"
            );
            report.invalid_pairs.push(pair.clone());
            return Ok(());
        }

        if !graph.contains(&pair.region_id) {
            let cell = self.create_cell(&pair.region_id)?;
            graph.insert(pair.region_id.clone(), cell);
            report.cells_created = report.cells_created.saturating_add(1);
        }

        if pair.neighbor_id.as_str() == DEFAULT_CELL_KEY {
            return Err(ScenarioError::ReservedCellId(pair.neighbor_id.clone()));
        }
        self.regions.require(&pair.neighbor_id)?;
        let correlation = self
            .correlations
            .correlation(&pair.region_id, &pair.neighbor_id)?;
        if correlation <= 0.0 {
            debug!(
                region_id = %pair.region_id,
                neighbor_id = %pair.neighbor_id,
                "no shared boundary, edge skipped"
            );
            report.zero_correlation_pairs = report.zero_correlation_pairs.saturating_add(1);
            return Ok(());
        }

        if let Some(cell) = graph.cells.get_mut(&pair.region_id) {
            cell.neighborhood
                .insert(pair.neighbor_id.clone(), self.template.edge_entry(correlation));
            report.edges_recorded = report.edges_recorded.saturating_add(1);
        }
        Ok(())
    }

    fn create_cell(&self, id: &RegionId) -> Result<Cell, ScenarioError> {
        if id.as_str() == DEFAULT_CELL_KEY {
            return Err(ScenarioError::ReservedCellId(id.clone()));
        }
        let region = self.regions.require(id)?;
        // Rows with an invalid source never get here.
        let population = region.population.unwrap_or_default();
        debug!(region_id = %id, population, area = ?region.area, "cell created");
        Ok(Cell::new(self.template.instantiate_state(population)))
    }

    fn log_progress(&self, row: usize, total: usize) {
        let Some(every) = self.progress_every else {
            return;
        };
        if row.checked_rem(every) == Some(0) {
            info!(row, percent = %format_args!("{:.2}", percent(row, total)), "adjacency scan");
        }
    }
}

#[allow(clippy::cast_precision_loss)]
fn percent(done: usize, total: usize) -> f64 {
    if total == 0 {
        return 100.0;
    }
    100.0 * done as f64 / total as f64
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use cellgen_geo::{GeoError, Region};
    use serde_json::json;

    use super::*;

    /// Correlations from a fixed table; unknown pairs share nothing.
    struct FixedCorrelations(BTreeMap<(String, String), f64>);

    impl FixedCorrelations {
        fn new(entries: &[(&str, &str, f64)]) -> Self {
            let mut map = BTreeMap::new();
            for (a, b, value) in entries {
                map.insert(((*a).to_owned(), (*b).to_owned()), *value);
                map.insert(((*b).to_owned(), (*a).to_owned()), *value);
            }
            Self(map)
        }
    }

    impl CorrelationSource for FixedCorrelations {
        fn correlation(&self, a: &RegionId, b: &RegionId) -> Result<f64, GeoError> {
            if a.as_str() == "ghost" || b.as_str() == "ghost" {
                return Err(GeoError::GeometryNotFound(RegionId::new("ghost")));
            }
            Ok(self
                .0
                .get(&(a.as_str().to_owned(), b.as_str().to_owned()))
                .copied()
                .unwrap_or(0.0))
        }
    }

    fn template() -> Option<DefaultCellTemplate> {
        DefaultCellTemplate::from_value(json!({
            "default": {
                "state": {"population": 0, "susceptible": [1.0], "exposed": [0.0]},
                "neighborhood": {"default_cell_id": {
                    "correlation": 1.0,
                    "infection_correction_factors": {}
                }}
            }
        }))
        .ok()
    }

    fn regions() -> RegionTable {
        [
            Region::new("a", Some(100), Some(1.0)),
            Region::new("b", Some(200), Some(2.0)),
            Region::new("c", Some(300), Some(3.0)),
            Region::new("z", Some(0), Some(1.0)),
            Region::new("ghost", Some(5), None),
            Region::new("default", Some(5), None),
        ]
        .into_iter()
        .collect()
    }

    fn assemble(
        pairs: &[AdjacencyPair],
        correlations: &FixedCorrelations,
    ) -> Result<(CellGraph, AssemblyReport), ScenarioError> {
        let regions = regions();
        let Some(template) = template() else {
            return Ok((CellGraph::new(), AssemblyReport::default()));
        };
        CellGraphAssembler::new(&regions, correlations, &template).assemble(pairs)
    }

    #[test]
    fn cells_follow_first_seen_order() {
        let correlations = FixedCorrelations::new(&[("a", "b", 0.4), ("b", "c", 0.3)]);
        let pairs = [
            AdjacencyPair::new("c", "b"),
            AdjacencyPair::new("a", "b"),
            AdjacencyPair::new("b", "a"),
            AdjacencyPair::new("b", "c"),
        ];
        let (graph, report) = assemble(&pairs, &correlations).unwrap_or_default();
        let ids: Vec<&str> = graph.ids().map(RegionId::as_str).collect();
        assert_eq!(ids, vec!["c", "a", "b"]);
        assert_eq!(report.cells_created, 3);
        assert_eq!(report.edges_recorded, 4);
    }

    #[test]
    fn repeated_source_rows_add_edges_not_cells() {
        let correlations = FixedCorrelations::new(&[("a", "b", 0.4), ("a", "c", 0.2)]);
        let pairs = [AdjacencyPair::new("a", "b"), AdjacencyPair::new("a", "c")];
        let (graph, _) = assemble(&pairs, &correlations).unwrap_or_default();
        assert_eq!(graph.len(), 1);
        let keys: Vec<&str> = graph
            .get(&RegionId::new("a"))
            .map(|cell| cell.neighborhood.keys().map(RegionId::as_str).collect())
            .unwrap_or_default();
        assert_eq!(keys, vec!["b", "c", "a"]);
    }

    #[test]
    fn self_loop_added_with_template_weight() {
        let correlations = FixedCorrelations::new(&[("a", "b", 0.4)]);
        let (graph, _) =
            assemble(&[AdjacencyPair::new("a", "b")], &correlations).unwrap_or_default();
        let self_weight = graph
            .get(&RegionId::new("a"))
            .and_then(|cell| cell.neighborhood.get(&RegionId::new("a")))
            .map(|entry| entry.correlation);
        assert_eq!(self_weight, Some(1.0));
    }

    #[test]
    fn self_adjacency_is_overwritten_by_self_loop() {
        let correlations = FixedCorrelations::new(&[("a", "a", 0.7)]);
        let (graph, report) =
            assemble(&[AdjacencyPair::new("a", "a")], &correlations).unwrap_or_default();
        let cell = graph.get(&RegionId::new("a"));
        assert_eq!(cell.map(|c| c.neighborhood.len()), Some(1));
        assert_eq!(
            cell.and_then(|c| c.neighborhood.get(&RegionId::new("a")))
                .map(|e| e.correlation),
            Some(1.0)
        );
        assert_eq!(report.self_references, 1);
    }

    #[test]
    fn invalid_rows_dropped_either_side() {
        let correlations = FixedCorrelations::new(&[("a", "z", 0.5)]);
        let pairs = [AdjacencyPair::new("z", "a"), AdjacencyPair::new("a", "z")];
        let (graph, report) = assemble(&pairs, &correlations).unwrap_or_default();
        assert!(graph.is_empty());
        assert_eq!(report.invalid_pairs.len(), 2);
        assert_eq!(report.rows_scanned, 2);
    }

    #[test]
    fn zero_correlation_creates_cell_without_edge() {
        let correlations = FixedCorrelations::new(&[]);
        let (graph, report) =
            assemble(&[AdjacencyPair::new("b", "c")], &correlations).unwrap_or_default();
        let keys: Vec<&str> = graph
            .get(&RegionId::new("b"))
            .map(|cell| cell.neighborhood.keys().map(RegionId::as_str).collect())
            .unwrap_or_default();
        assert_eq!(keys, vec!["b"]);
        assert_eq!(report.zero_correlation_pairs, 1);
        assert_eq!(report.edges_recorded, 0);
    }

    #[test]
    fn population_written_into_state() {
        let correlations = FixedCorrelations::new(&[("b", "c", 0.5)]);
        let (graph, _) =
            assemble(&[AdjacencyPair::new("b", "c")], &correlations).unwrap_or_default();
        assert_eq!(
            graph.get(&RegionId::new("b")).and_then(Cell::population),
            Some(200)
        );
    }

    #[test]
    fn unknown_region_is_fatal() {
        let correlations = FixedCorrelations::new(&[]);
        let result = assemble(&[AdjacencyPair::new("a", "nowhere")], &correlations);
        assert!(matches!(
            result,
            Err(ScenarioError::Geo {
                source: GeoError::RegionNotFound(_)
            })
        ));
        let result = assemble(&[AdjacencyPair::new("nowhere", "a")], &correlations);
        assert!(result.is_err());
    }

    #[test]
    fn missing_geometry_is_fatal() {
        let correlations = FixedCorrelations::new(&[]);
        let result = assemble(&[AdjacencyPair::new("a", "ghost")], &correlations);
        assert!(matches!(
            result,
            Err(ScenarioError::Geo {
                source: GeoError::GeometryNotFound(_)
            })
        ));
    }

    #[test]
    fn reserved_id_is_rejected() {
        let correlations = FixedCorrelations::new(&[]);
        let result = assemble(&[AdjacencyPair::new("default", "a")], &correlations);
        assert!(matches!(result, Err(ScenarioError::ReservedCellId(_))));
        let result = assemble(&[AdjacencyPair::new("a", "default")], &correlations);
        assert!(matches!(
            result,
            Err(ScenarioError::ReservedCellId(ref id)) if id.as_str() == "default"
        ));
    }

    #[test]
    fn percent_of_empty_input() {
        assert!((percent(0, 0) - 100.0).abs() < f64::EPSILON);
        assert!((percent(5, 10) - 50.0).abs() < f64::EPSILON);
    }
}
