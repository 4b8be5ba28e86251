//! Integration tests for synchronous and parallel dispatch

use std::fs;
use std::path::Path;

use geo::{line_string, point, polygon, Geometry};
use geomatch_core::config::{ConfigOverrides, LayeredConfig};
use geomatch_core::formats::MemorySource;
use geomatch_core::models::{Feature, IntersectionResult};
use geomatch_core::{DatasetRef, GeomatchError};
use geomatch_dispatch::logging::LOG_FILE_PREFIX;
use geomatch_dispatch::{dispatch, DispatchOptions};
use serde_json::json;
use tempfile::TempDir;

fn cell(i: usize) -> Geometry {
    let (x, y) = ((i / 2) as f64, (i % 2) as f64);
    polygon![(x: x, y: y), (x: x, y: y + 1.0), (x: x + 1.0, y: y + 1.0), (x: x + 1.0, y: y)].into()
}

/// 2x2 unit grid, cells numbered column by column
fn grid() -> DatasetRef {
    MemorySource::builder("grid")
        .features((0..4).map(|i| Feature::new(cell(i)).with_property("name", format!("grid cell {i}"))))
        .build()
        .unwrap()
        .into()
}

fn lines() -> DatasetRef {
    MemorySource::builder("lines")
        .feature(Feature::new(line_string![(x: 0.5, y: 0.5), (x: 0.5, y: 1.5), (x: 1.5, y: 1.5)]))
        .feature(Feature::new(line_string![(x: 1.0, y: 1.0), (x: 1.5, y: 0.5)]))
        .build()
        .unwrap()
        .into()
}

/// Twenty points spread over cell 0
fn points() -> DatasetRef {
    MemorySource::builder("points")
        .features((0..20).map(|i| Feature::new(point!(x: 0.05 + 0.04 * i as f64, y: 0.5))))
        .build()
        .unwrap()
        .into()
}

fn parallel(log_dir: &Path) -> DispatchOptions {
    DispatchOptions::default().with_workers(2).with_min_chunk(1).with_log_dir(log_dir)
}

fn log_files(dir: &Path) -> Vec<String> {
    fs::read_dir(dir)
        .unwrap()
        .map(|entry| entry.unwrap().file_name().to_string_lossy().into_owned())
        .filter(|name| name.starts_with(LOG_FILE_PREFIX))
        .collect()
}

fn assert_same(left: &IntersectionResult, right: &IntersectionResult) {
    assert_eq!(left.keys().collect::<Vec<_>>(), right.keys().collect::<Vec<_>>());
    for ((key, a), (_, b)) in left.iter().zip(right.iter()) {
        assert!((a.measure - b.measure).abs() < 1e-9, "{key:?}: {} vs {}", a.measure, b.measure);
    }
}

#[test]
fn test_sync_and_parallel_agree() {
    let dir = TempDir::new().unwrap();

    for to_meters in [false, true] {
        let sync = DispatchOptions::default().with_to_meters(to_meters);
        let expected = dispatch(&lines(), &grid(), &sync).unwrap();
        assert_eq!(expected.len(), 4);

        let options = parallel(dir.path()).with_to_meters(to_meters);
        let actual = dispatch(&lines(), &grid(), &options).unwrap();
        assert_same(&expected, &actual);
    }
}

#[test]
fn test_line_measures_in_degrees() {
    let dir = TempDir::new().unwrap();
    let options = parallel(dir.path()).with_to_meters(false);
    let result = dispatch(&lines(), &grid(), &options).unwrap();

    let expected = [((0, 0), 0.5), ((0, 1), 1.0), ((0, 3), 0.5), ((1, 2), 2f64.sqrt() / 2.0)];
    for ((source, target), measure) in expected {
        let record = result.get(source, target).unwrap();
        assert!((record.measure - measure).abs() < 1e-9);
        assert!(record.geom.is_some());
    }
}

#[test]
fn test_failed_chunks_reported_after_siblings() {
    let dir = TempDir::new().unwrap();
    let mut indices: Vec<usize> = (0..10).collect();
    indices.push(99);
    indices.extend(10..20);

    // Chunks of 5: the third one holds the bad index
    let options = parallel(dir.path()).with_min_chunk(5).with_indices(indices);
    match dispatch(&points(), &grid(), &options) {
        Err(GeomatchError::DispatchFailed { failed_chunks, total_chunks }) => {
            assert_eq!(failed_chunks, vec![2]);
            assert_eq!(total_chunks, 5);
        }
        other => panic!("expected DispatchFailed, got {other:?}"),
    }

    let logs = log_files(dir.path());
    assert_eq!(logs.len(), 1);
    let content = fs::read_to_string(dir.path().join(&logs[0])).unwrap();
    assert!(content.contains("Chunk failed"));
}

#[test]
fn test_non_polygon_target_fails_every_chunk() {
    let dir = TempDir::new().unwrap();
    match dispatch(&grid(), &lines(), &parallel(dir.path())) {
        Err(GeomatchError::DispatchFailed { failed_chunks, total_chunks }) => {
            assert_eq!(failed_chunks, vec![0, 1, 2, 3]);
            assert_eq!(total_chunks, 4);
        }
        other => panic!("expected DispatchFailed, got {other:?}"),
    }

    let sync = dispatch(&grid(), &lines(), &DispatchOptions::default());
    assert!(matches!(sync, Err(GeomatchError::TargetNotPolygon { .. })));
}

#[test]
fn test_log_file_holds_start_summary() {
    let dir = TempDir::new().unwrap();
    let log_dir = dir.path().join("logs");
    dispatch(&points(), &grid(), &parallel(&log_dir)).unwrap();

    let logs = log_files(&log_dir);
    assert_eq!(logs.len(), 1);
    assert!(logs[0].ends_with(".log"));

    let content = fs::read_to_string(log_dir.join(&logs[0])).unwrap();
    assert!(content.contains("Starting intersect calculation"));
    assert!(content.contains("job_count=20"));
    assert!(content.contains("Starting chunk"));
    assert!(content.contains("Finished intersect calculation"));
}

#[test]
fn test_empty_indices_start_nothing() {
    let dir = TempDir::new().unwrap();
    let options = parallel(dir.path()).with_indices(Vec::new());

    let result = dispatch(&points(), &grid(), &options).unwrap();
    assert!(result.is_empty());
    assert!(log_files(dir.path()).is_empty());
}

#[test]
fn test_indices_honoured_in_both_modes() {
    let dir = TempDir::new().unwrap();

    let sync = DispatchOptions::default().with_indices(vec![3, 4]);
    let result = dispatch(&points(), &grid(), &sync).unwrap();
    assert_eq!(result.keys().collect::<Vec<_>>(), vec![(3, 0), (4, 0)]);

    let options = parallel(dir.path()).with_indices(vec![3, 4]);
    let result = dispatch(&points(), &grid(), &options).unwrap();
    assert_eq!(result.keys().collect::<Vec<_>>(), vec![(3, 0), (4, 0)]);
}

#[test]
fn test_geojson_square_against_grid() {
    let dir = TempDir::new().unwrap();

    let grid = json!({
        "type": "FeatureCollection",
        "features": (0..4).map(|i| {
            let (x, y) = ((i / 2) as f64, (i % 2) as f64);
            json!({
                "type": "Feature",
                "geometry": {
                    "type": "Polygon",
                    "coordinates": [[[x, y], [x, y + 1.0], [x + 1.0, y + 1.0], [x + 1.0, y], [x, y]]]
                },
                "properties": {"name": format!("grid cell {i}")}
            })
        }).collect::<Vec<_>>()
    });
    let square = json!({
        "type": "FeatureCollection",
        "features": [{
            "type": "Feature",
            "geometry": {
                "type": "Polygon",
                "coordinates": [[[0.5, 0.5], [0.5, 1.5], [1.5, 1.5], [1.5, 0.5], [0.5, 0.5]]]
            },
            "properties": {"name": "single"}
        }]
    });

    let grid_path = dir.path().join("grid.geojson");
    let square_path = dir.path().join("square.geojson");
    fs::write(&grid_path, grid.to_string()).unwrap();
    fs::write(&square_path, square.to_string()).unwrap();

    let options = parallel(dir.path()).with_to_meters(false).with_keep_geometries(false);
    let result = dispatch(&square_path.into(), &grid_path.into(), &options).unwrap();

    assert_eq!(result.len(), 4);
    for (key, record) in &result {
        assert!((record.measure - 0.25).abs() < 1e-9, "{key:?}");
        assert!(record.geom.is_none());
    }
}

#[test]
fn test_options_from_config() {
    let mut config = LayeredConfig::with_defaults();
    config.update_from_overrides(ConfigOverrides {
        workers: Some(0),
        min_chunk: Some(5),
        to_meters: Some(false),
        ..Default::default()
    });

    let options = DispatchOptions::from(&config);
    assert_eq!(options.workers, 0);
    assert_eq!(options.min_chunk, 5);
    assert_eq!(options.max_jobs, 200);
    assert!(!options.to_meters);
    assert!(options.keep_geometries);
    assert!(options.indices.is_none());

    let result = dispatch(&lines(), &grid(), &options).unwrap();
    assert_eq!(result.len(), 4);
}

#[test]
fn test_zero_partition_bounds_rejected() {
    let options = DispatchOptions::default().with_max_jobs(0);
    assert!(matches!(
        dispatch(&points(), &grid(), &options),
        Err(GeomatchError::ConfigInvalid { .. })
    ));
}
