//! Canonical geometry classification types used across all geomatch crates.
//!
//! Geometries themselves are `geo::Geometry<f64>`; this module only carries
//! the coordinate reference system and the two classification levels: the
//! storage-level [`GeometryType`] and the analytical [`GeometryKind`].

use geo::Geometry;
use serde::{Deserialize, Serialize};
use std::fmt;

const WGS84: &str = "+proj=longlat +ellps=WGS84 +datum=WGS84 +no_defs";
const MOLLWEIDE: &str =
    "+proj=moll +lon_0=0 +x_0=0 +y_0=0 +ellps=WGS84 +datum=WGS84 +units=m +no_defs";

/// Coordinate Reference System, as a PROJ definition string
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Crs {
    pub definition: String,
}

impl Default for Crs {
    fn default() -> Self {
        Self::wgs84()
    }
}

impl Crs {
    /// Create a CRS from a PROJ string, an `AUTHORITY:CODE` pair or a URN.
    ///
    /// An empty definition, or the bare `+no_defs` some drivers report, is
    /// read as WGS 84.
    pub fn new(definition: impl Into<String>) -> Self {
        let definition = definition.into();
        let trimmed = definition.trim();
        if trimmed.is_empty() || trimmed == "+no_defs" {
            return Self::wgs84();
        }
        Self { definition: trimmed.to_string() }
    }

    /// WGS 84 geographic coordinates (longitude, latitude)
    pub fn wgs84() -> Self {
        Self { definition: WGS84.to_string() }
    }

    /// Mollweide equal-area projection, in meters
    pub fn mollweide() -> Self {
        Self { definition: MOLLWEIDE.to_string() }
    }

    /// Whether coordinates in this CRS are geographic longitude/latitude
    pub fn is_geographic(&self) -> bool {
        let def = self.definition.to_ascii_lowercase();
        def.contains("+proj=longlat")
            || def.contains("+proj=latlong")
            || def.contains("+proj=lonlat")
            || def == "epsg:4326"
            || def.ends_with("crs84")
            || def.ends_with("epsg::4326")
    }
}

impl fmt::Display for Crs {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.definition)
    }
}

/// Storage-level geometry type, as declared by a data source schema
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum GeometryType {
    Point,
    LineString,
    Polygon,
    MultiPoint,
    MultiLineString,
    MultiPolygon,
    GeometryCollection,
    /// Heterogeneous or undeclared
    #[default]
    Unknown,
}

impl GeometryType {
    /// Get the type of a concrete geometry
    pub fn of(geometry: &Geometry) -> Self {
        match geometry {
            Geometry::Point(_) => GeometryType::Point,
            Geometry::Line(_) | Geometry::LineString(_) => GeometryType::LineString,
            Geometry::Polygon(_) | Geometry::Rect(_) | Geometry::Triangle(_) => {
                GeometryType::Polygon
            }
            Geometry::MultiPoint(_) => GeometryType::MultiPoint,
            Geometry::MultiLineString(_) => GeometryType::MultiLineString,
            Geometry::MultiPolygon(_) => GeometryType::MultiPolygon,
            Geometry::GeometryCollection(_) => GeometryType::GeometryCollection,
        }
    }

    /// The analytical kind of this type, if it has one
    pub fn kind(&self) -> Option<GeometryKind> {
        match self {
            GeometryType::Point | GeometryType::MultiPoint => Some(GeometryKind::Point),
            GeometryType::LineString | GeometryType::MultiLineString => Some(GeometryKind::Line),
            GeometryType::Polygon | GeometryType::MultiPolygon => Some(GeometryKind::Polygon),
            GeometryType::GeometryCollection | GeometryType::Unknown => None,
        }
    }
}

impl fmt::Display for GeometryType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

/// Geometry family used for matching and measurement
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GeometryKind {
    /// Measured by component count
    Point,
    /// Measured by length
    Line,
    /// Measured by area
    Polygon,
}

impl fmt::Display for GeometryKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            GeometryKind::Point => "point",
            GeometryKind::Line => "line",
            GeometryKind::Polygon => "polygon",
        };
        f.write_str(name)
    }
}
