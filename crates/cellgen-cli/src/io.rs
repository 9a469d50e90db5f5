//! File readers and the scenario writer.
//!
//! Readers accept the layouts the GIS preparation step produces: a cleaned
//! region CSV, an adjacency CSV, a `GeoJSON` feature collection of region
//! shapes, and the JSON templates. Columns and properties are looked up by
//! the names in the area profile. The scenario is written with four-space
//! indentation and keys in insertion order.

use std::fs::{self, File};
use std::io::{BufWriter, Read, Write};
use std::path::Path;

use cellgen_core::AreaProfile;
use cellgen_geo::{GeometryIndex, Region, RegionTable};
use cellgen_types::{AdjacencyPair, RegionId, Scenario};
use csv::StringRecord;
use geojson::GeoJson;
use serde::Serialize;
use serde_json::Value;
use tracing::{info, warn};

use crate::error::CliError;

/// Spellings of a missing value in exported tables.
const NULL_TOKENS: [&str; 7] = ["", "nan", "null", "na", "n/a", "#n/a", "none"];

// ---------------------------------------------------------------------------
// Region table
// ---------------------------------------------------------------------------

/// Read the cleaned region table.
///
/// # Errors
///
/// Returns [`CliError`] if the file cannot be read, a profile column is
/// missing, or a population or area value is not a number.
pub fn read_regions(path: &Path, profile: &AreaProfile) -> Result<RegionTable, CliError> {
    let file = File::open(path).map_err(|source| CliError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let table = parse_regions(file, path, profile)?;
    info!(
        path = %path.display(),
        regions = table.len(),
        invalid = table.invalid_ids().len(),
        "region table loaded"
    );
    Ok(table)
}

/// Parse a region table from any reader. `source` is only used in errors.
///
/// # Errors
///
/// Same conditions as [`read_regions`].
pub fn parse_regions(
    reader: impl Read,
    source: &Path,
    profile: &AreaProfile,
) -> Result<RegionTable, CliError> {
    let mut reader = csv_reader(reader);
    let headers = headers(&mut reader, source)?;
    let id_col = column(&headers, source, &profile.region_id_type_column)?;
    let population_col = column(&headers, source, &profile.population_column)?;
    let area_col = column(&headers, source, &profile.area_column)?;

    let mut table = RegionTable::new();
    for (index, record) in reader.records().enumerate() {
        let record = record.map_err(|source_err| CliError::Csv {
            path: source.to_path_buf(),
            source: source_err,
        })?;
        let row = index.saturating_add(1);
        let invalid = |column: &str, value: &str| CliError::InvalidValue {
            path: source.to_path_buf(),
            row,
            column: column.to_owned(),
            value: value.to_owned(),
        };

        let id = required_id(&record, id_col)
            .ok_or_else(|| invalid(profile.region_id_type_column.as_str(), ""))?;
        let raw_population = record.get(population_col).unwrap_or_default();
        let population = parse_population(raw_population)
            .ok_or_else(|| invalid(profile.population_column.as_str(), raw_population))?;
        let raw_area = record.get(area_col).unwrap_or_default();
        let area = parse_optional_f64(raw_area)
            .ok_or_else(|| invalid(profile.area_column.as_str(), raw_area))?;

        table.insert(Region {
            id,
            population,
            area,
        });
    }
    Ok(table)
}

// ---------------------------------------------------------------------------
// Adjacency
// ---------------------------------------------------------------------------

/// Read the adjacency table in file order.
///
/// # Errors
///
/// Returns [`CliError`] if the file cannot be read, a profile column is
/// missing, or a row has an empty id.
pub fn read_adjacency(path: &Path, profile: &AreaProfile) -> Result<Vec<AdjacencyPair>, CliError> {
    let file = File::open(path).map_err(|source| CliError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let pairs = parse_adjacency(file, path, profile)?;
    info!(path = %path.display(), rows = pairs.len(), "adjacency table loaded");
    Ok(pairs)
}

/// Parse an adjacency table from any reader. `source` is only used in errors.
///
/// # Errors
///
/// Same conditions as [`read_adjacency`].
pub fn parse_adjacency(
    reader: impl Read,
    source: &Path,
    profile: &AreaProfile,
) -> Result<Vec<AdjacencyPair>, CliError> {
    let mut reader = csv_reader(reader);
    let headers = headers(&mut reader, source)?;
    let region_col = column(&headers, source, &profile.region_id_column)?;
    let neighbor_col = column(&headers, source, &profile.neighbor_id_column)?;

    let mut pairs = Vec::new();
    for (index, record) in reader.records().enumerate() {
        let record = record.map_err(|source_err| CliError::Csv {
            path: source.to_path_buf(),
            source: source_err,
        })?;
        let row = index.saturating_add(1);
        let missing = |column: &str| CliError::InvalidValue {
            path: source.to_path_buf(),
            row,
            column: column.to_owned(),
            value: String::new(),
        };
        let region_id = required_id(&record, region_col)
            .ok_or_else(|| missing(profile.region_id_column.as_str()))?;
        let neighbor_id = required_id(&record, neighbor_col)
            .ok_or_else(|| missing(profile.neighbor_id_column.as_str()))?;
        pairs.push(AdjacencyPair {
            region_id,
            neighbor_id,
        });
    }
    Ok(pairs)
}

// ---------------------------------------------------------------------------
// Geometry
// ---------------------------------------------------------------------------

/// Read region shapes from a `GeoJSON` feature collection.
///
/// # Errors
///
/// Returns [`CliError`] if the file cannot be read or parsed, a feature has
/// no id property, or a geometry is not a polygon or multipolygon.
pub fn read_geometry(path: &Path, id_property: &str) -> Result<GeometryIndex, CliError> {
    let text = fs::read_to_string(path).map_err(|source| CliError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let index = parse_geometry(&text, path, id_property)?;
    info!(path = %path.display(), shapes = index.len(), "geometry loaded");
    Ok(index)
}

/// Parse region shapes from `GeoJSON` text. `source` is only used in errors.
///
/// # Errors
///
/// Same conditions as [`read_geometry`].
pub fn parse_geometry(
    text: &str,
    source: &Path,
    id_property: &str,
) -> Result<GeometryIndex, CliError> {
    let geojson_error = |message: String| CliError::GeoJson {
        path: source.to_path_buf(),
        message,
    };

    let document: GeoJson = text.parse().map_err(|e: geojson::Error| geojson_error(e.to_string()))?;
    let features = match document {
        GeoJson::FeatureCollection(collection) => collection.features,
        GeoJson::Feature(feature) => vec![feature],
        GeoJson::Geometry(_) => {
            return Err(geojson_error(
                "expected a feature collection, found a bare geometry".to_owned(),
            ));
        }
    };

    let mut index = GeometryIndex::new();
    for (position, feature) in features.into_iter().enumerate() {
        let id = match feature.property(id_property) {
            Some(Value::String(text)) => RegionId::normalized(text),
            Some(Value::Number(number)) => RegionId::normalized(&number.to_string()),
            _ => {
                return Err(CliError::MissingProperty {
                    path: source.to_path_buf(),
                    index: position,
                    property: id_property.to_owned(),
                });
            }
        };
        let Some(geometry) = feature.geometry else {
            warn!(region_id = %id, "feature without geometry skipped");
            continue;
        };
        let shape = geo::Geometry::<f64>::try_from(geometry)
            .map_err(|e| geojson_error(format!("feature {position}: {e}")))?;
        index
            .insert(id, shape)
            .map_err(|source_err| CliError::Geometry {
                path: source.to_path_buf(),
                source: source_err,
            })?;
    }
    Ok(index)
}

// ---------------------------------------------------------------------------
// JSON documents
// ---------------------------------------------------------------------------

/// Read a JSON document.
///
/// # Errors
///
/// Returns [`CliError`] if the file cannot be read or is not JSON.
pub fn read_json(path: &Path) -> Result<Value, CliError> {
    let text = fs::read_to_string(path).map_err(|source| CliError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    serde_json::from_str(&text).map_err(|source| CliError::Json {
        path: path.to_path_buf(),
        source,
    })
}

/// Render a scenario as four-space-indented JSON.
///
/// # Errors
///
/// Returns the serializer error; with in-memory output this only happens
/// for non-finite numbers.
pub fn render_scenario(scenario: &Scenario) -> Result<Vec<u8>, serde_json::Error> {
    let mut buffer = Vec::new();
    let formatter = serde_json::ser::PrettyFormatter::with_indent(b"    ");
    let mut serializer = serde_json::Serializer::with_formatter(&mut buffer, formatter);
    scenario.serialize(&mut serializer)?;
    Ok(buffer)
}

/// Write a scenario file, creating its directory when needed.
///
/// # Errors
///
/// Returns [`CliError`] if rendering or any file operation fails.
pub fn write_scenario(path: &Path, scenario: &Scenario) -> Result<(), CliError> {
    let io_error = |source| CliError::Io {
        path: path.to_path_buf(),
        source,
    };
    let bytes = render_scenario(scenario).map_err(|source| CliError::Json {
        path: path.to_path_buf(),
        source,
    })?;
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(io_error)?;
    }
    let mut writer = BufWriter::new(File::create(path).map_err(io_error)?);
    writer.write_all(&bytes).map_err(io_error)?;
    writer.flush().map_err(io_error)?;
    info!(path = %path.display(), bytes = bytes.len(), "scenario written");
    Ok(())
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn csv_reader<R: Read>(reader: R) -> csv::Reader<R> {
    csv::ReaderBuilder::new()
        .has_headers(true)
        .trim(csv::Trim::All)
        .from_reader(reader)
}

fn headers<R: Read>(reader: &mut csv::Reader<R>, source: &Path) -> Result<StringRecord, CliError> {
    reader
        .headers()
        .cloned()
        .map_err(|source_err| CliError::Csv {
            path: source.to_path_buf(),
            source: source_err,
        })
}

fn column(headers: &StringRecord, source: &Path, name: &str) -> Result<usize, CliError> {
    headers
        .iter()
        .position(|header| header == name)
        .ok_or_else(|| CliError::MissingColumn {
            path: source.to_path_buf(),
            column: name.to_owned(),
        })
}

fn required_id(record: &StringRecord, column: usize) -> Option<RegionId> {
    record
        .get(column)
        .filter(|raw| !raw.trim().is_empty())
        .map(RegionId::normalized)
}

fn is_null(raw: &str) -> bool {
    let raw = raw.trim();
    NULL_TOKENS.iter().any(|token| raw.eq_ignore_ascii_case(token))
}

/// `Some(None)` for a null cell, `Some(Some(n))` for a count, `None` when the
/// text is not a non-negative number. Fractions are truncated.
fn parse_population(raw: &str) -> Option<Option<u64>> {
    if is_null(raw) {
        return Some(None);
    }
    let raw = raw.trim();
    if let Ok(count) = raw.parse::<u64>() {
        return Some(Some(count));
    }
    let value = raw.parse::<f64>().ok()?;
    if value.is_nan() {
        return Some(None);
    }
    whole_count(value).map(Some)
}

#[allow(
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss,
    clippy::cast_precision_loss
)]
fn whole_count(value: f64) -> Option<u64> {
    (0.0..u64::MAX as f64)
        .contains(&value)
        .then(|| value.trunc() as u64)
}

/// `Some(None)` for a null cell, `None` when the text is not a number.
fn parse_optional_f64(raw: &str) -> Option<Option<f64>> {
    if is_null(raw) {
        return Some(None);
    }
    raw.trim().parse::<f64>().ok().map(Some)
}
