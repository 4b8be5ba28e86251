//! Geometry kind classification and measurement

use geo::{Area, Distance, Euclidean, Geometry, LineString};
use geomatch_core::error::{GeomatchError, Result};
use geomatch_core::models::{GeometryKind, GeometryType};

use crate::validation::is_empty;

/// Classify a geometry into its kind family
pub fn classify(geometry: &Geometry) -> Result<GeometryKind> {
    let geometry_type = GeometryType::of(geometry);
    geometry_type.kind().ok_or_else(|| GeomatchError::UnsupportedGeometryKind {
        geometry_type: geometry_type.to_string(),
    })
}

/// Measure a geometry according to its kind.
///
/// Polygons measure by area, lines by length and points by count. An empty
/// geometry measures 0 for any kind.
pub fn measure(geometry: &Geometry, kind: Option<GeometryKind>) -> Result<f64> {
    if is_empty(geometry) {
        return Ok(0.0);
    }

    let actual = match (classify(geometry), kind) {
        (Ok(actual), _) => actual,
        (Err(_), Some(kind)) => {
            return Err(GeomatchError::MeasureKindMismatch {
                kind: kind.to_string(),
                geometry_type: GeometryType::of(geometry).to_string(),
            })
        }
        (Err(e), None) => return Err(e),
    };

    let kind = kind.unwrap_or(actual);
    if kind != actual {
        return Err(GeomatchError::MeasureKindMismatch {
            kind: kind.to_string(),
            geometry_type: GeometryType::of(geometry).to_string(),
        });
    }

    let value = match kind {
        GeometryKind::Polygon => geometry.unsigned_area(),
        GeometryKind::Line => line_length(geometry),
        GeometryKind::Point => point_count(geometry),
    };
    Ok(value)
}

fn line_length(geometry: &Geometry) -> f64 {
    match geometry {
        Geometry::Line(line) => Euclidean.distance(line.start_point(), line.end_point()),
        Geometry::LineString(ls) => linestring_length(ls),
        Geometry::MultiLineString(mls) => mls.0.iter().map(linestring_length).sum(),
        _ => 0.0,
    }
}

fn linestring_length(ls: &LineString) -> f64 {
    ls.lines().map(|line| Euclidean.distance(line.start_point(), line.end_point())).sum()
}

fn point_count(geometry: &Geometry) -> f64 {
    match geometry {
        Geometry::Point(_) => 1.0,
        Geometry::MultiPoint(mp) => mp.0.len() as f64,
        _ => 0.0,
    }
}
