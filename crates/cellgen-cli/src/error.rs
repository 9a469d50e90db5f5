//! Error types for the `cellgen` binary.
//!
//! [`CliError`] covers reading the GIS inputs and writing the scenario. Each
//! variant names the file involved so a failed run points straight at the
//! bad input.

use std::path::PathBuf;

/// Failures while reading inputs or writing the scenario.
#[derive(Debug, thiserror::Error)]
pub enum CliError {
    /// A file could not be read or written.
    #[error("{}: {source}", path.display())]
    Io {
        /// The file involved.
        path: PathBuf,
        /// The underlying I/O error.
        source: std::io::Error,
    },

    /// A CSV file could not be parsed.
    #[error("{}: {source}", path.display())]
    Csv {
        /// The file involved.
        path: PathBuf,
        /// The underlying CSV error.
        source: csv::Error,
    },

    /// A required column is missing from a CSV header.
    #[error("{}: missing column {column:?}", path.display())]
    MissingColumn {
        /// The file involved.
        path: PathBuf,
        /// The expected column name.
        column: String,
    },

    /// A cell value could not be interpreted.
    #[error("{}: row {row}, column {column:?}: invalid value {value:?}", path.display())]
    InvalidValue {
        /// The file involved.
        path: PathBuf,
        /// One-based data row number.
        row: usize,
        /// The column holding the value.
        column: String,
        /// The raw value.
        value: String,
    },

    /// A `GeoJSON` document could not be parsed or converted.
    #[error("{}: {message}", path.display())]
    GeoJson {
        /// The file involved.
        path: PathBuf,
        /// Description of the failure.
        message: String,
    },

    /// A geometry was rejected by the geometry index.
    #[error("{}: {source}", path.display())]
    Geometry {
        /// The file involved.
        path: PathBuf,
        /// The underlying geometry error.
        source: cellgen_geo::GeoError,
    },

    /// A geometry feature lacks its region id property.
    #[error("{}: feature {index} has no {property:?} property", path.display())]
    MissingProperty {
        /// The file involved.
        path: PathBuf,
        /// Index of the feature in the collection.
        index: usize,
        /// The expected property name.
        property: String,
    },

    /// A JSON document could not be parsed.
    #[error("{}: {source}", path.display())]
    Json {
        /// The file involved.
        path: PathBuf,
        /// The underlying JSON error.
        source: serde_json::Error,
    },
}
