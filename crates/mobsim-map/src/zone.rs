//! A single coverage polygon.

use geo::{BoundingRect, Intersects, LineString, Polygon, Rect};
use mobsim_common::{Point, Result, SimError};
use serde::Serialize;
use std::fmt;

/// Identifier of a zone within its [`CoverageIndex`](crate::CoverageIndex).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct ZoneId(pub usize);

impl fmt::Display for ZoneId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "zone#{}", self.0)
    }
}

/// An immutable closed coverage polygon.
#[derive(Debug, Clone)]
pub struct CoverageZone {
    id: ZoneId,
    vertices: Vec<Point>,
    polygon: Polygon<f64>,
    bounds: Rect<f64>,
}

impl CoverageZone {
    /// Builds a zone from its vertex ring.
    ///
    /// An explicitly closed ring (last vertex equal to the first) is
    /// accepted; the closing vertex is not counted.
    pub(crate) fn new(id: ZoneId, vertices: Vec<Point>) -> Result<Self> {
        let mut vertices = vertices;
        if vertices.len() > 3 && vertices.first() == vertices.last() {
            vertices.pop();
        }
        if vertices.len() < 3 {
            return Err(SimError::validation(format!(
                "Coverage zone needs at least 3 vertices, got {}",
                vertices.len()
            )));
        }
        if let Some(bad) = vertices.iter().find(|p| !p.is_finite()) {
            return Err(SimError::validation(format!(
                "Coverage zone vertex {} is not finite",
                bad
            )));
        }

        let ring: LineString<f64> = vertices.iter().map(|p| (p.x, p.y)).collect();
        let polygon = Polygon::new(ring, vec![]);
        let bounds = polygon
            .bounding_rect()
            .ok_or_else(|| SimError::validation("Coverage zone has no extent"))?;

        Ok(Self {
            id,
            vertices,
            polygon,
            bounds,
        })
    }

    /// The zone identifier.
    pub fn id(&self) -> ZoneId {
        self.id
    }

    /// The vertex ring as registered (without a closing vertex).
    pub fn vertices(&self) -> &[Point] {
        &self.vertices
    }

    /// Returns true if `point` lies inside the zone or on its boundary.
    pub fn contains(&self, point: Point) -> bool {
        let (min, max) = (self.bounds.min(), self.bounds.max());
        if point.x < min.x || point.x > max.x || point.y < min.y || point.y > max.y {
            return false;
        }
        self.polygon.intersects(&geo::Point::new(point.x, point.y))
    }
}
