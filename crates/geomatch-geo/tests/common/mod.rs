//! Shared fixtures: a 2x2 unit grid, a square straddling its center and
//! two lines crossing it

#![allow(dead_code)]

use geo::Geometry;
use geomatch_core::formats::MemorySource;
use geomatch_core::models::Feature;
use geomatch_geo::FeatureCollection;
use wkt::TryFromWkt;

pub fn wkt(text: &str) -> Geometry {
    Geometry::<f64>::try_from_wkt_str(text).unwrap()
}

/// Cells numbered column by column: 0 = (0,0), 1 = (0,1), 2 = (1,0), 3 = (1,1)
pub fn grid_source() -> MemorySource {
    let cells = [
        "POLYGON((0 0,0 1,1 1,1 0,0 0))",
        "POLYGON((0 1,0 2,1 2,1 1,0 1))",
        "POLYGON((1 0,1 1,2 1,2 0,1 0))",
        "POLYGON((1 1,1 2,2 2,2 1,1 1))",
    ];
    cells
        .iter()
        .enumerate()
        .fold(MemorySource::builder("grid"), |builder, (i, cell)| {
            builder.feature(
                Feature { geometry: Some(wkt(cell)), ..Default::default() }
                    .with_property("name", format!("grid cell {}", i)),
            )
        })
        .build()
        .unwrap()
}

pub fn square_source() -> MemorySource {
    MemorySource::builder("square")
        .feature(
            Feature { geometry: Some(wkt("POLYGON((0.5 0.5,0.5 1.5,1.5 1.5,1.5 0.5,0.5 0.5))")), ..Default::default() }
                .with_property("name", "single"),
        )
        .build()
        .unwrap()
}

pub fn lines_source() -> MemorySource {
    MemorySource::builder("lines")
        .feature(
            Feature { geometry: Some(wkt("LINESTRING(0.5 0.5,0.5 1.5,1.5 1.5)")), ..Default::default() }
                .with_property("name", "A"),
        )
        .feature(
            Feature { geometry: Some(wkt("LINESTRING(1 1,1.5 0.5)")), ..Default::default() }
                .with_property("name", "B"),
        )
        .build()
        .unwrap()
}

pub fn collection(source: MemorySource) -> FeatureCollection {
    FeatureCollection::from_source(Box::new(source)).unwrap().with_identifying_field("name")
}

pub fn assert_close(actual: f64, expected: f64, rtol: f64) {
    assert!(
        (actual - expected).abs() <= rtol * expected.abs(),
        "expected {expected} within {rtol}, got {actual}"
    );
}
