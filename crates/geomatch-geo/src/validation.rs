//! Geometry repair
//!
//! Invalid polygonal input is rebuilt with a zero-width overlay: a boolean
//! union against the empty geometry, which resolves self-intersections and
//! bad ring orientation. Points and lines have no area to rebuild, so an
//! invalid one cannot be repaired.

use geo::{BooleanOps, Geometry, GeometryCollection, MultiPolygon, Polygon, Validation};
use geomatch_core::models::GeometryType;
use thiserror::Error;

use crate::intersection::catch_topology;

/// A geometry that could not be made valid
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Geometry cannot be repaired: {reason}")]
pub struct Unrepairable {
    pub reason: String,
}

/// The empty geometry
pub fn empty() -> Geometry {
    Geometry::GeometryCollection(GeometryCollection::new_from(vec![]))
}

/// Whether a geometry has no components
pub fn is_empty(geometry: &Geometry) -> bool {
    match geometry {
        Geometry::Point(_) | Geometry::Line(_) | Geometry::Rect(_) | Geometry::Triangle(_) => false,
        Geometry::LineString(ls) => ls.0.is_empty(),
        Geometry::Polygon(p) => p.exterior().0.is_empty(),
        Geometry::MultiPoint(mp) => mp.0.is_empty(),
        Geometry::MultiLineString(mls) => mls.0.iter().all(|ls| ls.0.is_empty()),
        Geometry::MultiPolygon(mp) => mp.0.iter().all(|p| p.exterior().0.is_empty()),
        Geometry::GeometryCollection(gc) => gc.0.iter().all(is_empty),
    }
}

/// Make a geometry valid.
///
/// Valid input comes back unchanged. Collections are repaired member by
/// member and fail if any member cannot be repaired.
pub fn repair(geometry: &Geometry) -> Result<Geometry, Unrepairable> {
    if geometry.is_valid() {
        return Ok(geometry.clone());
    }

    match geometry {
        Geometry::Polygon(polygon) => zero_width_overlay(std::slice::from_ref(polygon)),
        Geometry::MultiPolygon(mp) => zero_width_overlay(&mp.0),
        Geometry::Rect(rect) => zero_width_overlay(&[rect.to_polygon()]),
        Geometry::Triangle(triangle) => zero_width_overlay(&[triangle.to_polygon()]),
        Geometry::GeometryCollection(gc) => {
            let members = gc.0.iter().map(repair).collect::<Result<Vec<_>, _>>()?;
            Ok(Geometry::GeometryCollection(GeometryCollection::new_from(members)))
        }
        other => Err(Unrepairable {
            reason: format!("invalid {} has no area to rebuild", GeometryType::of(other)),
        }),
    }
}

/// Repair a geometry, falling back to the empty geometry.
///
/// Never fails, and always returns a valid geometry.
pub fn clean(geometry: &Geometry) -> Geometry {
    match repair(geometry) {
        Ok(repaired) if repaired.is_valid() => repaired,
        Ok(_) => {
            tracing::debug!("Repaired geometry is still invalid, dropping it");
            empty()
        }
        Err(e) => {
            tracing::debug!(error = %e, "Dropping unrepairable geometry");
            empty()
        }
    }
}

fn zero_width_overlay(polygons: &[Polygon]) -> Result<Geometry, Unrepairable> {
    catch_topology(|| {
        let rebuilt = polygons
            .iter()
            .fold(MultiPolygon::new(vec![]), |acc, polygon| acc.union(polygon));
        Ok(Geometry::MultiPolygon(rebuilt))
    })
    .map_err(|e| Unrepairable { reason: e.to_string() })
}
