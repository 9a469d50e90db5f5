//! Geometry index: region id to polygon, with boundary-length queries.
//!
//! Every geometry is held as a [`MultiPolygon`] so that single polygons and
//! multi-part regions (islands, enclaves) share one code path. The boundary
//! of a shape is every ring of every member polygon, exterior and interior.
//!
//! Shared boundary length is the total length of collinear overlap between
//! the two boundaries' segments. Adjacent regions digitized from the same
//! source share vertices, so their common border shows up as collinear
//! segment overlap; contacts at a single point contribute nothing.

use std::collections::BTreeMap;

use cellgen_types::RegionId;
use geo::algorithm::line_intersection::{LineIntersection, line_intersection};
use geo::{
    BoundingRect, Euclidean, Geometry, Intersects, Length, Line, LineString, MultiPolygon, Rect,
};
use tracing::warn;

use crate::error::GeoError;

/// Region id to shape.
#[derive(Debug, Clone, Default)]
pub struct GeometryIndex {
    shapes: BTreeMap<RegionId, MultiPolygon<f64>>,
}

impl GeometryIndex {
    /// Create an empty index.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add the geometry of a region.
    ///
    /// Polygons are lifted to single-member multipolygons. The first
    /// geometry for an id wins; later ones are ignored with a warning.
    /// Returns `true` when the geometry was kept.
    ///
    /// # Errors
    ///
    /// Returns [`GeoError::UnsupportedGeometry`] for anything other than a
    /// polygon or multipolygon.
    pub fn insert(
        &mut self,
        id: RegionId,
        geometry: impl Into<Geometry<f64>>,
    ) -> Result<bool, GeoError> {
        let shape = match geometry.into() {
            Geometry::Polygon(polygon) => MultiPolygon::new(vec![polygon]),
            Geometry::MultiPolygon(multi) => multi,
            other => {
                return Err(GeoError::UnsupportedGeometry {
                    id,
                    kind: geometry_kind(&other),
                });
            }
        };
        if self.shapes.contains_key(&id) {
            warn!(region_id = %id, "duplicate region geometry ignored");
            return Ok(false);
        }
        self.shapes.insert(id, shape);
        Ok(true)
    }

    /// Look up a region's shape that must exist.
    ///
    /// # Errors
    ///
    /// Returns [`GeoError::GeometryNotFound`] if the id has no geometry.
    pub fn require(&self, id: &RegionId) -> Result<&MultiPolygon<f64>, GeoError> {
        self.shapes
            .get(id)
            .ok_or_else(|| GeoError::GeometryNotFound(id.clone()))
    }

    /// Number of indexed regions.
    pub fn len(&self) -> usize {
        self.shapes.len()
    }

    /// Whether the index is empty.
    pub fn is_empty(&self) -> bool {
        self.shapes.is_empty()
    }

    /// Perimeter of a region: the summed length of all of its rings.
    ///
    /// # Errors
    ///
    /// Returns [`GeoError::GeometryNotFound`] if the id has no geometry.
    pub fn boundary_length(&self, id: &RegionId) -> Result<f64, GeoError> {
        let shape = self.require(id)?;
        Ok(rings(shape).map(|ring| ring.length::<Euclidean>()).sum())
    }

    /// Length of the boundary the two regions have in common.
    ///
    /// # Errors
    ///
    /// Returns [`GeoError::GeometryNotFound`] if either id has no geometry.
    pub fn shared_boundary_length(&self, a: &RegionId, b: &RegionId) -> Result<f64, GeoError> {
        let shape_a = self.require(a)?;
        let shape_b = self.require(b)?;

        let (Some(rect_a), Some(rect_b)) = (shape_a.bounding_rect(), shape_b.bounding_rect())
        else {
            return Ok(0.0);
        };
        if !rect_a.intersects(&rect_b) {
            return Ok(0.0);
        }

        // Only segments near the other shape can overlap it.
        let candidates_b: Vec<(Line<f64>, Rect<f64>)> = boundary_segments(shape_b)
            .map(|line| (line, line.bounding_rect()))
            .filter(|(_, rect)| rect.intersects(&rect_a))
            .collect();

        let mut shared = 0.0;
        for line_a in boundary_segments(shape_a) {
            let rect = line_a.bounding_rect();
            if !rect.intersects(&rect_b) {
                continue;
            }
            for (line_b, _) in candidates_b.iter().filter(|(_, r)| r.intersects(&rect)) {
                if let Some(LineIntersection::Collinear { intersection }) =
                    line_intersection(line_a, *line_b)
                {
                    shared += intersection.length::<Euclidean>();
                }
            }
        }
        Ok(shared)
    }
}

/// Every ring of every polygon in the shape.
fn rings(shape: &MultiPolygon<f64>) -> impl Iterator<Item = &LineString<f64>> {
    shape
        .0
        .iter()
        .flat_map(|polygon| std::iter::once(polygon.exterior()).chain(polygon.interiors()))
}

/// Every boundary segment of the shape.
fn boundary_segments(shape: &MultiPolygon<f64>) -> impl Iterator<Item = Line<f64>> + '_ {
    rings(shape).flat_map(LineString::lines)
}

const fn geometry_kind(geometry: &Geometry<f64>) -> &'static str {
    match geometry {
        Geometry::Point(_) => "Point",
        Geometry::Line(_) => "Line",
        Geometry::LineString(_) => "LineString",
        Geometry::Polygon(_) => "Polygon",
        Geometry::MultiPoint(_) => "MultiPoint",
        Geometry::MultiLineString(_) => "MultiLineString",
        Geometry::MultiPolygon(_) => "MultiPolygon",
        Geometry::GeometryCollection(_) => "GeometryCollection",
        Geometry::Rect(_) => "Rect",
        Geometry::Triangle(_) => "Triangle",
    }
}
