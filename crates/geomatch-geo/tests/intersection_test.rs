//! End-to-end matching of small fixtures against a polygon grid

mod common;

use std::collections::BTreeMap;

use common::{assert_close, collection, grid_source, lines_source, square_source};
use geomatch_core::models::GeometryKind;
use geomatch_geo::{intersect_one, FeatureCollection, IntersectOptions, Reprojection};
use serde_json::Value;

/// Match every source feature against the target, keyed by label
fn match_all(
    source: &FeatureCollection,
    target: &FeatureCollection,
    metric: Option<&Reprojection>,
) -> BTreeMap<(String, String), f64> {
    let index = target.build_spatial_index().unwrap();
    let kind = source.geometry_kind().unwrap();
    let source_labels = source.field_value_map(None).unwrap();
    let target_labels = target.field_value_map(None).unwrap();
    let options = IntersectOptions { metric, keep_geometries: true };

    let label = |value: &Value| value.as_str().unwrap().to_string();

    let mut found = BTreeMap::new();
    for item in source.iterate_projected(None) {
        let (i, geometry) = item.unwrap();
        let candidates = index.query_geometry(&geometry);
        for (j, record) in intersect_one(&geometry, kind, target, &candidates, &options).unwrap() {
            found.insert((label(&source_labels[&i]), label(&target_labels[&j])), record.measure);
        }
    }
    found
}

#[test]
fn test_square_against_grid() {
    let square = collection(square_source());
    let grid = collection(grid_source());

    let found = match_all(&square, &grid, None);

    assert_eq!(found.len(), 4);
    for measure in found.values() {
        assert_close(*measure, 0.25, 1e-9);
    }
    assert_close(found[&("single".to_string(), "grid cell 0".to_string())], 0.25, 1e-9);
}

#[test]
fn test_single_cell_against_square() {
    let grid = collection(grid_source());
    let square = collection(square_source());
    let index = square.build_spatial_index().unwrap();

    let mut pairs = Vec::new();
    for item in grid.iterate_projected(Some(&[0])) {
        let (i, geometry) = item.unwrap();
        let candidates = index.query_geometry(&geometry);
        let records = intersect_one(
            &geometry,
            GeometryKind::Polygon,
            &square,
            &candidates,
            &IntersectOptions::default(),
        )
        .unwrap();
        pairs.extend(records.into_iter().map(|(j, record)| ((i, j), record.measure)));
    }

    assert_eq!(pairs.len(), 1);
    assert_eq!(pairs[0].0, (0, 0));
    assert_close(pairs[0].1, 0.25, 1e-9);
}

#[test]
fn test_lines_against_grid_in_degrees() {
    let lines = collection(lines_source());
    let grid = collection(grid_source());

    let found = match_all(&lines, &grid, None);
    let get = |from: &str, to: &str| found[&(from.to_string(), to.to_string())];

    assert_eq!(found.len(), 4);
    assert_close(get("A", "grid cell 0"), 0.5, 1e-9);
    assert_close(get("A", "grid cell 1"), 1.0, 1e-9);
    assert_close(get("A", "grid cell 3"), 0.5, 1e-9);
    assert_close(get("B", "grid cell 2"), 2f64.sqrt() / 2.0, 1e-9);
}

#[test]
fn test_lines_against_grid_in_meters() {
    let lines = collection(lines_source());
    let grid = collection(grid_source());
    let metric = Reprojection::wgs84_to_mollweide().unwrap();

    let found = match_all(&lines, &grid, Some(&metric));
    let get = |from: &str, to: &str| found[&(from.to_string(), to.to_string())];

    assert_eq!(found.len(), 4);
    assert_close(get("A", "grid cell 0"), 62_000.0, 1e-2);
    assert_close(get("A", "grid cell 1"), 111_000.0, 2e-2);
    assert_close(get("A", "grid cell 3"), 50_000.0, 1e-2);
}

#[test]
fn test_dropping_geometries() {
    let square = collection(square_source());
    let grid = collection(grid_source());
    let index = grid.build_spatial_index().unwrap();

    let (_, geometry) = square.iterate_projected(None).next().unwrap().unwrap();
    let options = IntersectOptions { metric: None, keep_geometries: false };
    let records = intersect_one(
        &geometry,
        GeometryKind::Polygon,
        &grid,
        &index.query_geometry(&geometry),
        &options,
    )
    .unwrap();

    assert_eq!(records.len(), 4);
    assert!(records.values().all(|record| record.geom.is_none()));
}
