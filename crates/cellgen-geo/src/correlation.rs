//! Boundary correlation: the edge weight between two adjacent regions.
//!
//! ```text
//! correlation = (shared / perimeter_a + shared / perimeter_b) / 2
//! ```
//!
//! Each region's share of the common border is taken against its own
//! perimeter before averaging, so a small region enclosed by a large one
//! scores high even though the large region's own ratio is small. The result
//! is symmetric in its inputs and lies in `[0, 1]`. A result of `0` means
//! the regions do not share a boundary and must not be linked.

use cellgen_types::RegionId;

use crate::error::GeoError;
use crate::geometry::GeometryIndex;

/// Anything that can weigh the boundary between two regions.
///
/// The assembler is generic over this seam so that tabulated weights can be
/// substituted for geometry.
pub trait CorrelationSource {
    /// Normalized boundary-overlap weight between `a` and `b`.
    ///
    /// # Errors
    ///
    /// Returns a [`GeoError`] when either region is unknown to the source.
    fn correlation(&self, a: &RegionId, b: &RegionId) -> Result<f64, GeoError>;
}

/// Combine two perimeters and their shared length into a correlation.
///
/// Returns `0.0` when nothing is shared or when either perimeter is not a
/// positive finite number, so the result is never NaN. Floating-point noise
/// above `1.0` is clamped.
pub fn boundary_correlation(perimeter_a: f64, perimeter_b: f64, shared: f64) -> f64 {
    let usable = |length: f64| length.is_finite() && length > 0.0;
    if !usable(shared) || !usable(perimeter_a) || !usable(perimeter_b) {
        return 0.0;
    }
    ((shared / perimeter_a + shared / perimeter_b) / 2.0).min(1.0)
}

impl CorrelationSource for GeometryIndex {
    fn correlation(&self, a: &RegionId, b: &RegionId) -> Result<f64, GeoError> {
        let perimeter_a = self.boundary_length(a)?;
        let perimeter_b = self.boundary_length(b)?;
        let shared = self.shared_boundary_length(a, b)?;
        Ok(boundary_correlation(perimeter_a, perimeter_b, shared))
    }
}

#[cfg(test)]
mod tests {
    use geo::polygon;

    use super::*;

    fn close(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn averages_both_ratios() {
        let value = boundary_correlation(40.0, 30.0, 10.0);
        assert!(close(value, (10.0 / 40.0 + 10.0 / 30.0) / 2.0));
        assert!(close(value, 0.208_333_333_333_333_3));
    }

    #[test]
    fn symmetric_in_region_order() {
        assert!(close(
            boundary_correlation(12.0, 80.0, 3.0),
            boundary_correlation(80.0, 12.0, 3.0)
        ));
    }

    #[test]
    fn nothing_shared_is_zero() {
        assert!(close(boundary_correlation(40.0, 30.0, 0.0), 0.0));
    }

    #[test]
    fn degenerate_perimeter_is_zero_not_nan() {
        let value = boundary_correlation(0.0, 30.0, 5.0);
        assert!(!value.is_nan());
        assert!(close(value, 0.0));
    }

    #[test]
    fn enclosed_region_scores_high() {
        // A 1x1 island fully inside the 100-unit perimeter of its host.
        let value = boundary_correlation(4.0, 100.0, 4.0);
        assert!(value > 0.5);
        assert!(value <= 1.0);
    }

    #[test]
    fn geometry_index_correlation() {
        let mut index = GeometryIndex::new();
        let _ = index.insert(
            RegionId::new("a"),
            polygon![(x: 0.0, y: 0.0), (x: 10.0, y: 0.0), (x: 10.0, y: 10.0), (x: 0.0, y: 10.0)],
        );
        let _ = index.insert(
            RegionId::new("b"),
            polygon![(x: 0.0, y: 10.0), (x: 10.0, y: 10.0), (x: 10.0, y: 15.0), (x: 0.0, y: 15.0)],
        );
        let value = index
            .correlation(&RegionId::new("a"), &RegionId::new("b"))
            .unwrap_or_default();
        assert!(close(value, (10.0 / 40.0 + 10.0 / 30.0) / 2.0));
    }
}
