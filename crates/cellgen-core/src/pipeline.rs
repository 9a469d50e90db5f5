//! End-to-end generation: region data and templates in, scenario out.
//!
//! ```text
//! RegionTable + GeometryIndex --> CellGraphAssembler --> apply_seeds --> build_scenario
//! ```
//!
//! The whole run is a synchronous batch over data already in memory. Either
//! a complete [`Scenario`] comes back or a fatal [`ScenarioError`] does;
//! there is no partial output.

use cellgen_geo::{GeometryIndex, RegionTable};
use cellgen_types::{AdjacencyPair, Scenario};
use tracing::info;

use crate::error::ScenarioError;
use crate::graph::{AssemblyReport, CellGraphAssembler};
use crate::scenario::build_scenario;
use crate::seed::{SeedReport, apply_seeds};
use crate::template::{DefaultCellTemplate, FieldsTemplate, SeedSet};

/// Everything one run reads.
#[derive(Debug, Clone)]
pub struct ScenarioInputs {
    /// Region attributes and validity.
    pub regions: RegionTable,
    /// Region shapes.
    pub geometry: GeometryIndex,
    /// Adjacency rows in source order.
    pub adjacency: Vec<AdjacencyPair>,
    /// The default cell template.
    pub default_cell: DefaultCellTemplate,
    /// The fields block.
    pub fields: FieldsTemplate,
    /// Initial-infection overrides.
    pub seeds: SeedSet,
}

/// Knobs that do not change the output.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct GenerateOptions {
    /// Log a progress line every N adjacency rows.
    pub progress_every: Option<usize>,
}

/// Diagnostics collected over a run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GenerationReport {
    /// Cell graph assembly counters.
    pub assembly: AssemblyReport,
    /// Seed application outcome.
    pub seeds: SeedReport,
}

/// A generated scenario and its diagnostics.
#[derive(Debug, Clone)]
pub struct GeneratedScenario {
    /// The document to serialize.
    pub scenario: Scenario,
    /// What was dropped or ignored along the way.
    pub report: GenerationReport,
}

/// Run the full pipeline.
///
/// # Errors
///
/// Returns [`ScenarioError`] when an adjacency row references a region
/// missing from the region table or the geometry index, or a region id
/// collides with the reserved `default` key.
pub fn generate(
    inputs: &ScenarioInputs,
    options: &GenerateOptions,
) -> Result<GeneratedScenario, ScenarioError> {
    info!(
        regions = inputs.regions.len(),
        invalid_regions = inputs.regions.invalid_ids().len(),
        geometries = inputs.geometry.len(),
        adjacency_rows = inputs.adjacency.len(),
        seeds = inputs.seeds.len(),
        "generating scenario"
    );

    let (mut graph, assembly) =
        CellGraphAssembler::new(&inputs.regions, &inputs.geometry, &inputs.default_cell)
            .with_progress(options.progress_every)
            .assemble(&inputs.adjacency)?;

    let seeds = apply_seeds(&mut graph, &inputs.seeds);
    let scenario = build_scenario(graph, &inputs.default_cell, &inputs.fields);

    Ok(GeneratedScenario {
        scenario,
        report: GenerationReport { assembly, seeds },
    })
}
