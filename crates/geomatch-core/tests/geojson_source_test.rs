//! Integration tests for opening collections by reference

use geomatch_core::formats::MemorySource;
use geomatch_core::models::{Crs, Feature, GeometryType, NativeId};
use geomatch_core::{DatasetRef, GeomatchError};
use std::fs;
use tempfile::TempDir;

const GRID: &str = r#"{
    "type": "FeatureCollection",
    "features": [
        {
            "type": "Feature",
            "id": 10,
            "geometry": {"type": "Polygon", "coordinates": [[[0,0],[1,0],[1,1],[0,1],[0,0]]]},
            "properties": {"name": "grid cell 0"}
        },
        {
            "type": "Feature",
            "id": 11,
            "geometry": {"type": "Polygon", "coordinates": [[[1,0],[2,0],[2,1],[1,1],[1,0]]]},
            "properties": {"name": "grid cell 1"}
        }
    ]
}"#;

#[test]
fn test_open_geojson_by_path() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("grid.geojson");
    fs::write(&path, GRID).unwrap();

    let dataset = DatasetRef::from(path);
    let source = dataset.open().unwrap();

    assert_eq!(source.name(), "grid");
    assert_eq!(source.len(), 2);
    assert_eq!(source.crs(), Crs::wgs84());
    assert_eq!(source.declared_geometry_type(), GeometryType::Unknown);

    let ids: Vec<NativeId> = source.features().map(|(id, _)| id).collect();
    assert_eq!(ids, vec![NativeId::Int(10), NativeId::Int(11)]);

    let cell = source.feature(&NativeId::Int(11)).unwrap();
    assert_eq!(cell.property("name"), Some(&serde_json::Value::from("grid cell 1")));
}

#[test]
fn test_open_missing_file() {
    let dir = TempDir::new().unwrap();
    let dataset = DatasetRef::GeoJson(dir.path().join("absent.geojson"));
    assert!(matches!(dataset.open(), Err(GeomatchError::Io(_))));
}

#[test]
fn test_memory_reference_is_shared() {
    let memory = MemorySource::builder("points")
        .feature(Feature::new(geo::point!(x: 0.5, y: 0.5)))
        .build()
        .unwrap();
    let dataset = DatasetRef::from(memory);

    let first = dataset.open().unwrap();
    let second = dataset.clone().open().unwrap();
    assert_eq!(first.len(), second.len());
    assert_eq!(dataset.to_string(), "memory:points");
}
