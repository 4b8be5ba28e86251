//! Measure of the part of a feature left over after known overlaps
//!
//! The result scales the naive leftover `m(original) - m(union)` by
//! `sum(m(overlap)) / m(union)`. This is exact when the overlaps are pairwise
//! disjoint and an approximation otherwise.

use std::collections::BTreeMap;

use geo::{Geometry, GeometryCollection};
use geomatch_core::error::{GeomatchError, Result};
use geomatch_core::models::{GeometryKind, IntersectionResult};

use crate::collection::FeatureCollection;
use crate::extract::recursive_extract;
use crate::intersection::catch_topology;
use crate::kind::{classify, measure};
use crate::transform::Reprojection;

/// Remaining measure of `original` after removing `overlaps`.
///
/// All geometries are in WGS 84. With a `metric` reprojection, measures are
/// taken in that CRS; point counts are never reprojected.
pub fn remaining(
    original: &Geometry,
    overlaps: &[Geometry],
    metric: Option<&Reprojection>,
) -> Result<f64> {
    let kind = classify(original)?;
    for overlap in overlaps {
        let found = classify(overlap)?;
        if found != kind {
            return Err(GeomatchError::IncompatibleKinds {
                expected: kind.to_string(),
                found: found.to_string(),
            });
        }
    }

    let metric = if kind == GeometryKind::Point { None } else { metric };
    let measure_in = |geometry: &Geometry| -> Result<f64> {
        match metric {
            Some(metric) => measure(&metric.apply(geometry)?, Some(kind)),
            None => measure(geometry, Some(kind)),
        }
    };

    let actual = measure_in(original)?;
    if overlaps.is_empty() {
        return Ok(actual);
    }

    let union = catch_topology(|| {
        let collection = GeometryCollection::new_from(overlaps.to_vec());
        Ok(recursive_extract(&Geometry::GeometryCollection(collection), kind))
    })?;
    let union_total = match union {
        Some(union) => measure_in(&union)?,
        None => 0.0,
    };
    if union_total == 0.0 {
        return Ok(actual);
    }

    let individual_total = overlaps.iter().map(&measure_in).sum::<Result<f64>>()?;

    Ok((actual - union_total) * (individual_total / union_total))
}

/// Remaining measure of every feature in `source`, using the overlap
/// geometries kept in `intersections`.
///
/// Features without any overlap keep their full measure.
pub fn remaining_for_collection(
    source: &FeatureCollection,
    intersections: &IntersectionResult,
    metric: Option<&Reprojection>,
) -> Result<BTreeMap<usize, f64>> {
    let grouped = intersections.geometries_by_source();
    let mut results = BTreeMap::new();

    for item in source.iterate_projected(None) {
        let (index, geometry) = item?;
        let overlaps = grouped.get(&index).map(Vec::as_slice).unwrap_or(&[]);
        results.insert(index, remaining(&geometry, overlaps, metric)?);
    }

    tracing::debug!(
        collection = source.name(),
        features = results.len(),
        "Computed remaining measures"
    );
    Ok(results)
}

#[cfg(test)]
mod tests {
    use super::*;
    use geo::{line_string, point, polygon, MultiPoint};

    fn unit_square() -> Geometry {
        polygon![(x: 0.0, y: 0.0), (x: 1.0, y: 0.0), (x: 1.0, y: 1.0), (x: 0.0, y: 1.0)].into()
    }

    fn lower_half() -> Geometry {
        polygon![(x: 0.0, y: 0.0), (x: 1.0, y: 0.0), (x: 1.0, y: 0.5), (x: 0.0, y: 0.5)].into()
    }

    fn upper_half() -> Geometry {
        polygon![(x: 0.0, y: 0.5), (x: 1.0, y: 0.5), (x: 1.0, y: 1.0), (x: 0.0, y: 1.0)].into()
    }

    #[test]
    fn test_no_overlaps_is_identity() {
        let square = unit_square();
        assert_eq!(remaining(&square, &[], None).unwrap(), 1.0);

        let line: Geometry = line_string![(x: 0.0, y: 0.0), (x: 0.0, y: 2.0)].into();
        assert_eq!(remaining(&line, &[], None).unwrap(), 2.0);
    }

    #[test]
    fn test_half_removed() {
        let value = remaining(&unit_square(), &[lower_half()], None).unwrap();
        assert!((value - 0.5).abs() < 1e-9);
    }

    #[test]
    fn test_fully_covered() {
        let value = remaining(&unit_square(), &[lower_half(), upper_half()], None).unwrap();
        assert!(value.abs() < 1e-9);
    }

    #[test]
    fn test_overlapping_overlaps_are_scaled() {
        // Two overlaps sharing a 0.25 strip: union 0.75, individual sum 1.0
        let first: Geometry =
            polygon![(x: 0.0, y: 0.0), (x: 1.0, y: 0.0), (x: 1.0, y: 0.5), (x: 0.0, y: 0.5)]
                .into();
        let second: Geometry =
            polygon![(x: 0.0, y: 0.25), (x: 1.0, y: 0.25), (x: 1.0, y: 0.75), (x: 0.0, y: 0.75)]
                .into();
        let value = remaining(&unit_square(), &[first, second], None).unwrap();
        assert!((value - 0.25 * (1.0 / 0.75)).abs() < 1e-9);
    }

    #[test]
    fn test_overlapping_lines_use_their_union() {
        let line: Geometry = line_string![(x: 0.0, y: 0.0), (x: 4.0, y: 0.0)].into();
        let first: Geometry = line_string![(x: 0.0, y: 0.0), (x: 2.0, y: 0.0)].into();
        let second: Geometry = line_string![(x: 1.0, y: 0.0), (x: 3.0, y: 0.0)].into();

        // Union 3, individual sum 4
        let value = remaining(&line, &[first, second], None).unwrap();
        assert!((value - (4.0 - 3.0) * (4.0 / 3.0)).abs() < 1e-9);
    }

    #[test]
    fn test_reversed_line_overlap_counts_once_in_union() {
        let line: Geometry = line_string![(x: 0.0, y: 0.0), (x: 4.0, y: 0.0)].into();
        let forward: Geometry = line_string![(x: 0.0, y: 0.0), (x: 2.0, y: 0.0)].into();
        let backward: Geometry = line_string![(x: 2.0, y: 0.0), (x: 0.0, y: 0.0)].into();

        let value = remaining(&line, &[forward, backward], None).unwrap();
        assert!((value - (4.0 - 2.0) * (4.0 / 2.0)).abs() < 1e-9);
    }

    #[test]
    fn test_incompatible_kinds() {
        let p: Geometry = point!(x: 0.5, y: 0.5).into();
        assert!(matches!(
            remaining(&unit_square(), &[p], None),
            Err(GeomatchError::IncompatibleKinds { .. })
        ));
    }

    #[test]
    fn test_points_ignore_metric() {
        let metric = Reprojection::wgs84_to_mollweide().unwrap();
        let points: Geometry = MultiPoint::from(vec![(0.0, 0.0), (1.0, 1.0), (2.0, 2.0)]).into();
        let removed: Geometry = point!(x: 1.0, y: 1.0).into();

        let value = remaining(&points, &[removed], Some(&metric)).unwrap();
        assert!((value - 2.0).abs() < 1e-12);
    }
}
