//! Cell graph assembly and scenario generation for cellgen.
//!
//! Turns a region table, region shapes, and an adjacency list into the
//! scenario document of a cell-based epidemic simulator: one cell per valid
//! region, each with an initial state and a neighborhood weighted by shared
//! boundary.
//!
//! # Modules
//!
//! - [`config`] -- `cellgen-config.yaml` loading and study area profiles.
//! - [`error`] -- Fatal generation errors.
//! - [`graph`] -- [`CellGraphAssembler`]: cells, edges, and self-loops.
//! - [`pipeline`] -- [`generate`]: the full run with its report.
//! - [`scenario`] -- Wrapping cells with the template entry and fields.
//! - [`seed`] -- Seed-infection overrides.
//! - [`template`] -- Default cell, fields, and seed set documents.

pub mod config;
pub mod error;
pub mod graph;
pub mod pipeline;
pub mod scenario;
pub mod seed;
pub mod template;

pub use config::{
    AreaPaths, AreaProfile, ConfigError, LogFormat, LoggingConfig, PathsConfig, ScenarioConfig,
};
pub use error::ScenarioError;
pub use graph::{AssemblyReport, CellGraph, CellGraphAssembler};
pub use pipeline::{GenerateOptions, GeneratedScenario, GenerationReport, ScenarioInputs, generate};
pub use scenario::build_scenario;
pub use seed::{SeedReport, apply_seeds};
pub use template::{
    DefaultCellTemplate, FieldsTemplate, SeedOverride, SeedSet, SeedState, TemplateError,
};
