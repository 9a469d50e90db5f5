//! Configuration loading and typed config structures for cellgen.
//!
//! The configuration lives in `cellgen-config.yaml` next to the working
//! directory. It names where the GIS data and templates live and describes
//! each study area: which files hold its regions, adjacency and shapes, and
//! which columns carry ids and populations. The two study areas the tool was
//! built for, `ottawa` (dissemination areas) and `ontario` (public health
//! units), are built in; the file may override them or add more.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::Deserialize;

/// Errors that can occur when loading configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Failed to read the configuration file from disk.
    #[error("failed to read config file: {source}")]
    Io {
        /// The underlying I/O error.
        #[from]
        source: std::io::Error,
    },

    /// Failed to parse YAML content.
    #[error("failed to parse config YAML: {source}")]
    Yaml {
        /// The underlying YAML parse error.
        source: serde_yml::Error,
    },

    /// The requested study area has no profile.
    #[error("unknown area {name:?}; known areas: {known}")]
    UnknownArea {
        /// The requested name.
        name: String,
        /// Comma-separated list of configured areas.
        known: String,
    },
}

impl From<serde_yml::Error> for ConfigError {
    fn from(source: serde_yml::Error) -> Self {
        Self::Yaml { source }
    }
}

/// Top-level configuration.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ScenarioConfig {
    /// Directory layout.
    #[serde(default)]
    pub paths: PathsConfig,

    /// Study area profiles keyed by lower-case name.
    #[serde(default)]
    pub areas: BTreeMap<String, AreaProfile>,

    /// Logging configuration.
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl Default for ScenarioConfig {
    fn default() -> Self {
        Self {
            paths: PathsConfig::default(),
            areas: builtin_areas(),
            logging: LoggingConfig::default(),
        }
    }
}

impl ScenarioConfig {
    /// Load configuration from a YAML file at the given path.
    ///
    /// Environment variables override YAML values for directories:
    /// - `CELLGEN_DATA_DIR` overrides `paths.data_dir`
    /// - `CELLGEN_OUTPUT_DIR` overrides `paths.output_dir`
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Io`] if the file cannot be read, or
    /// [`ConfigError::Yaml`] if the content is not valid YAML.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        Self::parse(&contents)
    }

    /// Parse configuration from a YAML string.
    ///
    /// Areas in the YAML are layered over the built-in ones; a built-in area
    /// named again is replaced wholesale.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Yaml`] if the string is not valid YAML.
    pub fn parse(yaml: &str) -> Result<Self, ConfigError> {
        let mut config: Self = if yaml.trim().is_empty() {
            Self::default()
        } else {
            serde_yml::from_str(yaml)?
        };
        let mut areas = builtin_areas();
        areas.extend(
            std::mem::take(&mut config.areas)
                .into_iter()
                .map(|(name, profile)| (name.to_lowercase(), profile)),
        );
        config.areas = areas;
        config.paths.apply_env_overrides();
        Ok(config)
    }

    /// Look up an area profile by case-insensitive name.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::UnknownArea`] if no profile has that name.
    pub fn area(&self, name: &str) -> Result<&AreaProfile, ConfigError> {
        let key = name.to_lowercase();
        self.areas.get(&key).ok_or_else(|| ConfigError::UnknownArea {
            name: name.to_owned(),
            known: self.areas.keys().cloned().collect::<Vec<_>>().join(", "),
        })
    }

    /// Resolve every file path for one area.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::UnknownArea`] if no profile has that name.
    pub fn resolve(&self, name: &str) -> Result<AreaPaths, ConfigError> {
        let profile = self.area(name)?;
        let data_dir = Path::new(&self.paths.data_dir).join(&profile.data_subdir);
        let input_dir = PathBuf::from(format!(
            "{}{}",
            self.paths.input_dir_prefix, profile.input_subdir
        ));
        Ok(AreaPaths {
            regions_csv: data_dir.join(&profile.regions_csv),
            adjacency_csv: data_dir.join(&profile.adjacency_csv),
            geometry: data_dir.join(&profile.geometry_file),
            default_cell: input_dir.join("default.json"),
            fields: input_dir.join("fields.json"),
            seeds: input_dir.join("infectedCell.json"),
            output: Path::new(&self.paths.output_dir)
                .join(format!("scenario_{}.json", name.to_lowercase())),
        })
    }
}

/// Directory layout shared by all areas.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct PathsConfig {
    /// Root of the GIS data checkout.
    #[serde(default = "default_data_dir")]
    pub data_dir: String,

    /// Prefix of per-area template directories (`input_` + sub-directory).
    #[serde(default = "default_input_dir_prefix")]
    pub input_dir_prefix: String,

    /// Where scenario files are written.
    #[serde(default = "default_output_dir")]
    pub output_dir: String,
}

impl PathsConfig {
    /// Override directories with environment variables when set.
    pub fn apply_env_overrides(&mut self) {
        if let Ok(val) = std::env::var("CELLGEN_DATA_DIR") {
            self.data_dir = val;
        }
        if let Ok(val) = std::env::var("CELLGEN_OUTPUT_DIR") {
            self.output_dir = val;
        }
    }
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
            input_dir_prefix: default_input_dir_prefix(),
            output_dir: default_output_dir(),
        }
    }
}

/// Files and columns describing one study area.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct AreaProfile {
    /// Sub-directory of `paths.data_dir` holding the area's data.
    pub data_subdir: String,
    /// Cleaned region table (id, population, area).
    pub regions_csv: String,
    /// Adjacency table, one row per directed neighbor candidate.
    pub adjacency_csv: String,
    /// `GeoJSON` feature collection of region shapes.
    pub geometry_file: String,
    /// Template sub-directory appended to `paths.input_dir_prefix`.
    pub input_subdir: String,
    /// Feature property holding the region id in the geometry file.
    pub geometry_id_property: String,
    /// Region table column holding population.
    pub population_column: String,
    /// Region table column holding the region id.
    pub region_id_type_column: String,
    /// Adjacency table column holding the source region id.
    pub region_id_column: String,
    /// Adjacency table column holding the neighbor region id.
    pub neighbor_id_column: String,
    /// Region table column holding area.
    pub area_column: String,
    /// Adjacency rows between progress lines.
    #[serde(default = "default_progress_every")]
    pub progress_every: usize,
}

/// Fully resolved paths for one area.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AreaPaths {
    /// Region table.
    pub regions_csv: PathBuf,
    /// Adjacency table.
    pub adjacency_csv: PathBuf,
    /// Region shapes.
    pub geometry: PathBuf,
    /// Default cell template.
    pub default_cell: PathBuf,
    /// Fields template.
    pub fields: PathBuf,
    /// Seed set.
    pub seeds: PathBuf,
    /// Scenario output file.
    pub output: PathBuf,
}

/// Log output format.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// Human-readable lines.
    #[default]
    Pretty,
    /// One JSON object per line.
    Json,
}

/// Logging configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error). `RUST_LOG` wins when set.
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Output format.
    #[serde(default)]
    pub format: LogFormat,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: LogFormat::default(),
        }
    }
}

/// The study areas the tool ships with.
fn builtin_areas() -> BTreeMap<String, AreaProfile> {
    let mut areas = BTreeMap::new();
    areas.insert(
        "ottawa".to_owned(),
        AreaProfile {
            data_subdir: "Ottawa_DAs/".to_owned(),
            regions_csv: "DA Ottawa Clean.csv".to_owned(),
            adjacency_csv: "DA Ottawa Adjacency.csv".to_owned(),
            geometry_file: "DA Ottawa.geojson".to_owned(),
            input_subdir: "ottawa_da/".to_owned(),
            geometry_id_property: "dauid".to_owned(),
            population_column: "DApop_2016".to_owned(),
            region_id_type_column: "DAuid".to_owned(),
            region_id_column: "dauid".to_owned(),
            neighbor_id_column: "Neighbor_dauid".to_owned(),
            area_column: "DAarea".to_owned(),
            progress_every: 1000,
        },
    );
    areas.insert(
        "ontario".to_owned(),
        AreaProfile {
            data_subdir: "Ontario_PHUs/".to_owned(),
            regions_csv: "ontario_phu_clean.csv".to_owned(),
            adjacency_csv: "ontario_phu_adjacency.csv".to_owned(),
            geometry_file: "ontario_phu.geojson".to_owned(),
            input_subdir: "ontario_phu/".to_owned(),
            geometry_id_property: "PHU_ID".to_owned(),
            population_column: "population".to_owned(),
            region_id_type_column: "phu_id".to_owned(),
            region_id_column: "region_id".to_owned(),
            neighbor_id_column: "neighbor_id".to_owned(),
            area_column: "area_epsg4326".to_owned(),
            progress_every: 10,
        },
    );
    areas
}

// ---------------------------------------------------------------------------
// Default value functions
// ---------------------------------------------------------------------------

fn default_data_dir() -> String {
    "../../cadmium_gis/".to_owned()
}

fn default_input_dir_prefix() -> String {
    "input_".to_owned()
}

fn default_output_dir() -> String {
    "output".to_owned()
}

fn default_log_level() -> String {
    "info".to_owned()
}

const fn default_progress_every() -> usize {
    100
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_has_builtin_areas() {
        let config = ScenarioConfig::default();
        assert!(config.areas.contains_key("ottawa"));
        assert!(config.areas.contains_key("ontario"));
        assert_eq!(config.logging.format, LogFormat::Pretty);
    }

    #[test]
    fn area_lookup_is_case_insensitive() {
        let config = ScenarioConfig::default();
        let profile = config.area("Ottawa");
        assert_eq!(
            profile.ok().map(|p| p.population_column.as_str()),
            Some("DApop_2016")
        );
    }

    #[test]
    fn unknown_area_lists_known_ones() {
        let config = ScenarioConfig::default();
        let message = config
            .area("quebec")
            .err()
            .as_ref()
            .map(ToString::to_string)
            .unwrap_or_default();
        assert!(message.contains("quebec"));
        assert!(message.contains("ontario, ottawa"));
    }

    #[test]
    fn resolve_builds_original_layout() {
        let mut config = ScenarioConfig::default();
        config.paths = PathsConfig {
            data_dir: "gis".to_owned(),
            input_dir_prefix: "input_".to_owned(),
            output_dir: "output".to_owned(),
        };
        let paths = config.resolve("ONTARIO");
        assert!(paths.is_ok());
        let Ok(paths) = paths else { return };
        assert_eq!(
            paths.adjacency_csv,
            Path::new("gis").join("Ontario_PHUs/").join("ontario_phu_adjacency.csv")
        );
        assert_eq!(paths.seeds, Path::new("input_ontario_phu/").join("infectedCell.json"));
        assert_eq!(paths.output, Path::new("output").join("scenario_ontario.json"));
    }

    #[test]
    fn parse_custom_area_and_logging() {
        let yaml = r#"
paths:
  input_dir_prefix: "templates_"

areas:
  Toronto:
    data_subdir: "Toronto_DAs/"
    regions_csv: "clean.csv"
    adjacency_csv: "adjacency.csv"
    geometry_file: "shapes.geojson"
    input_subdir: "toronto/"
    geometry_id_property: "dauid"
    population_column: "pop"
    region_id_type_column: "DAuid"
    region_id_column: "dauid"
    neighbor_id_column: "neighbor"
    area_column: "area"

logging:
  level: "debug"
  format: "json"
"#;
        let config = ScenarioConfig::parse(yaml);
        assert!(config.is_ok());
        let config = config.ok().unwrap_or_default();

        assert_eq!(config.paths.input_dir_prefix, "templates_");
        assert_eq!(config.logging.level, "debug");
        assert_eq!(config.logging.format, LogFormat::Json);
        // Custom areas are added beside the built-in ones.
        assert_eq!(config.areas.len(), 3);
        assert_eq!(
            config.area("toronto").ok().map(|p| p.progress_every),
            Some(100)
        );
    }

    #[test]
    fn parse_empty_yaml() {
        let config = ScenarioConfig::parse("");
        assert!(config.is_ok());
        assert_eq!(config.ok().map(|c| c.areas.len()), Some(2));
    }

    #[test]
    fn load_project_config_file() {
        let path = Path::new(env!("CARGO_MANIFEST_DIR"))
            .join("..")
            .join("..")
            .join("cellgen-config.yaml");
        if path.exists() {
            let config = ScenarioConfig::from_file(&path);
            assert!(config.is_ok(), "Failed to load project config: {config:?}");
        }
    }
}
