//! Error types for the `cellgen-geo` crate.
//!
//! All fallible operations in this crate return [`GeoError`] through the
//! standard [`Result`] type. Every variant is a data-integrity failure: the
//! caller is expected to abort the run rather than fabricate defaults.

use cellgen_types::RegionId;

/// Errors raised by region and geometry lookups.
#[derive(Debug, thiserror::Error)]
pub enum GeoError {
    /// The region is referenced but absent from the region table.
    #[error("region not found in region table: {0}")]
    RegionNotFound(RegionId),

    /// The region is referenced but has no geometry.
    #[error("no geometry for region: {0}")]
    GeometryNotFound(RegionId),

    /// A geometry that cannot bound an area was supplied for a region.
    #[error("region {id} has unsupported geometry type {kind}; expected Polygon or MultiPolygon")]
    UnsupportedGeometry {
        /// The region the geometry was supplied for.
        id: RegionId,
        /// Name of the rejected geometry type.
        kind: &'static str,
    },
}
