//! Scenario generator entry point.
//!
//! Reads the region table, adjacency table, region shapes and JSON templates
//! for one study area, assembles the cell graph and writes the scenario file
//! the cell-based simulator loads.
//!
//! ```text
//! CSV + GeoJSON + templates --> generate --> output/scenario_<area>.json
//! ```

mod error;
mod io;

use std::path::{Path, PathBuf};

use anyhow::Context;
use cellgen_core::{
    AreaPaths, AreaProfile, DefaultCellTemplate, FieldsTemplate, GenerateOptions, LogFormat,
    LoggingConfig, ScenarioConfig, ScenarioInputs, SeedSet, generate,
};
use clap::Parser;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

/// Generate a cell-based epidemic scenario from regional GIS data.
#[derive(Debug, Parser)]
#[command(name = "cellgen", version, about)]
struct Cli {
    /// Study area to generate (built in: ottawa, ontario).
    area: String,

    /// Do not log adjacency progress while assembling.
    #[arg(long)]
    no_progress: bool,

    /// Configuration file. A missing file means built-in defaults.
    #[arg(long, env = "CELLGEN_CONFIG", default_value = "cellgen-config.yaml")]
    config: PathBuf,

    /// Write the scenario here instead of `<output_dir>/scenario_<area>.json`.
    #[arg(long)]
    output: Option<PathBuf>,
}

/// Application entry point.
///
/// # Errors
///
/// Returns an error if configuration, any input file, generation or the
/// output write fails. No output file is written on failure.
fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let (config, from_file) = load_config(&cli.config)?;
    init_logging(&config.logging);

    info!("cellgen starting");
    if from_file {
        info!(path = %cli.config.display(), "configuration loaded");
    } else {
        info!(path = %cli.config.display(), "config file not found, using defaults");
    }

    let profile = config.area(&cli.area)?;
    let paths = config.resolve(&cli.area)?;
    info!(
        area = %cli.area,
        regions = %paths.regions_csv.display(),
        adjacency = %paths.adjacency_csv.display(),
        geometry = %paths.geometry.display(),
        "area resolved"
    );

    let inputs = load_inputs(profile, &paths)?;
    let options = GenerateOptions {
        progress_every: (!cli.no_progress).then_some(profile.progress_every),
    };
    let generated = generate(&inputs, &options)
        .with_context(|| format!("failed to generate scenario for area {:?}", cli.area))?;

    let report = &generated.report;
    if !report.assembly.invalid_pairs.is_empty() {
        warn!(
            dropped = report.assembly.invalid_pairs.len(),
            "adjacency rows dropped for regions without population"
        );
    }

    let output = cli.output.unwrap_or(paths.output);
    io::write_scenario(&output, &generated.scenario)?;

    info!(
        cells = generated.scenario.cells.len(),
        edges = report.assembly.edges_recorded,
        zero_correlation = report.assembly.zero_correlation_pairs,
        seeds_applied = report.seeds.applied.len(),
        seeds_unmatched = report.seeds.unmatched.len(),
        output = %output.display(),
        "scenario generated"
    );
    Ok(())
}

/// Load the configuration file, falling back to defaults when it is absent.
/// The flag is `true` when the file was read.
fn load_config(path: &Path) -> anyhow::Result<(ScenarioConfig, bool)> {
    if path.exists() {
        let config = ScenarioConfig::from_file(path)
            .with_context(|| format!("failed to load {}", path.display()))?;
        Ok((config, true))
    } else {
        let config = ScenarioConfig::parse("")?;
        Ok((config, false))
    }
}

fn init_logging(logging: &LoggingConfig) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&logging.level));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true);
    match logging.format {
        LogFormat::Json => builder.json().init(),
        LogFormat::Pretty => builder.init(),
    }
}

fn load_inputs(profile: &AreaProfile, paths: &AreaPaths) -> anyhow::Result<ScenarioInputs> {
    let regions = io::read_regions(&paths.regions_csv, profile)?;
    let adjacency = io::read_adjacency(&paths.adjacency_csv, profile)?;
    let geometry = io::read_geometry(&paths.geometry, &profile.geometry_id_property)?;

    let default_cell = DefaultCellTemplate::from_value(io::read_json(&paths.default_cell)?)
        .with_context(|| format!("invalid template {}", paths.default_cell.display()))?;
    let fields = FieldsTemplate::from_value(io::read_json(&paths.fields)?)
        .with_context(|| format!("invalid template {}", paths.fields.display()))?;
    let seeds = SeedSet::from_value(io::read_json(&paths.seeds)?)
        .with_context(|| format!("invalid seed set {}", paths.seeds.display()))?;
    info!(seeds = seeds.len(), "templates loaded");

    Ok(ScenarioInputs {
        regions,
        geometry,
        adjacency,
        default_cell,
        fields,
        seeds,
    })
}
