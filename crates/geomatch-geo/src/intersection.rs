//! Per-feature intersection against a polygon collection

use std::any::Any;
use std::collections::BTreeMap;
use std::panic::{self, AssertUnwindSafe};

use geo::{BooleanOps, Geometry, Intersects, MultiLineString, MultiPoint, MultiPolygon};
use geomatch_core::error::{GeomatchError, Result};
use geomatch_core::models::{GeometryKind, IntersectionRecord};

use crate::collection::FeatureCollection;
use crate::extract::recursive_extract;
use crate::kind::measure;
use crate::transform::Reprojection;
use crate::validation::clean;

/// Options for [`intersect_one`]
#[derive(Debug, Clone, Copy)]
pub struct IntersectOptions<'a> {
    /// Reprojection applied before measuring; raw WGS 84 units when `None`
    pub metric: Option<&'a Reprojection>,
    /// Keep the overlap geometry in each record
    pub keep_geometries: bool,
}

impl Default for IntersectOptions<'_> {
    fn default() -> Self {
        Self { metric: None, keep_geometries: true }
    }
}

/// Run a geometry computation, turning a geometry engine panic into a
/// [`GeomatchError::Topology`] error
pub fn catch_topology<T, F>(f: F) -> Result<T>
where
    F: FnOnce() -> Result<T>,
{
    match panic::catch_unwind(AssertUnwindSafe(f)) {
        Ok(result) => result,
        Err(payload) => Err(GeomatchError::Topology { reason: panic_message(payload.as_ref()) }),
    }
}

/// Text of a caught panic payload
pub fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        message.to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "geometry operation panicked".to_string()
    }
}

/// Intersect one source geometry with candidate features of a polygon
/// collection.
///
/// `source` must already be in WGS 84. Candidates that do not intersect, or
/// whose overlap has no component of `kind`, are left out. Lines and points
/// on a shared boundary count for every polygon they touch.
pub fn intersect_one(
    source: &Geometry,
    kind: GeometryKind,
    target: &FeatureCollection,
    candidates: &[usize],
    options: &IntersectOptions<'_>,
) -> Result<BTreeMap<usize, IntersectionRecord>> {
    let mut results = BTreeMap::new();

    let Some(source) = recursive_extract(&clean(source), kind) else {
        return Ok(results);
    };

    for item in target.iterate_projected(Some(candidates)) {
        let (index, target_geom) = item?;
        if !target_geom.intersects(&source) {
            continue;
        }

        let raw = overlap(&source, &polygons_of(&target_geom));
        let Some(overlap) = recursive_extract(&clean(&raw), kind) else {
            continue;
        };

        let value = match options.metric {
            Some(metric) if kind != GeometryKind::Point => {
                measure(&metric.apply(&overlap)?, Some(kind))?
            }
            _ => measure(&overlap, Some(kind))?,
        };

        let geom = options.keep_geometries.then_some(overlap);
        results.insert(index, IntersectionRecord::new(value, geom));
    }

    Ok(results)
}

/// Raw overlap of an extracted source with a polygonal target
fn overlap(source: &Geometry, target: &MultiPolygon) -> Geometry {
    match source {
        Geometry::MultiPolygon(polygons) => Geometry::MultiPolygon(polygons.intersection(target)),
        Geometry::MultiLineString(lines) => {
            let clipped = target.clip(lines, false);
            let kept = clipped.0.into_iter().filter(|ls| ls.lines().any(|l| l.start != l.end));
            Geometry::MultiLineString(MultiLineString::new(kept.collect()))
        }
        Geometry::MultiPoint(points) => {
            let inside = points.0.iter().filter(|p| target.intersects(*p)).copied();
            Geometry::MultiPoint(MultiPoint::new(inside.collect()))
        }
        _ => crate::validation::empty(),
    }
}

/// Polygonal part of a target geometry
fn polygons_of(geometry: &Geometry) -> MultiPolygon {
    match geometry {
        Geometry::Polygon(p) => MultiPolygon::new(vec![p.clone()]),
        Geometry::MultiPolygon(mp) => mp.clone(),
        Geometry::Rect(r) => MultiPolygon::new(vec![r.to_polygon()]),
        Geometry::Triangle(t) => MultiPolygon::new(vec![t.to_polygon()]),
        other => match recursive_extract(other, GeometryKind::Polygon) {
            Some(Geometry::MultiPolygon(mp)) => mp,
            _ => MultiPolygon::new(vec![]),
        },
    }
}
