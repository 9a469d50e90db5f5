//! Regions, geometry, and boundary correlation for cellgen.
//!
//! This crate holds the read-only inputs of a run and the one geometric
//! computation the cell graph needs.
//!
//! # Modules
//!
//! - [`region`] -- [`RegionTable`] of per-region attributes and validity.
//! - [`geometry`] -- [`GeometryIndex`] of region shapes with perimeter and
//!   shared-boundary queries.
//! - [`correlation`] -- The boundary correlation formula and the
//!   [`CorrelationSource`] seam.
//! - [`error`] -- Error types for lookups and geometry intake.

pub mod correlation;
pub mod error;
pub mod geometry;
pub mod region;

pub use correlation::{CorrelationSource, boundary_correlation};
pub use error::GeoError;
pub use geometry::GeometryIndex;
pub use region::{Region, RegionTable};
