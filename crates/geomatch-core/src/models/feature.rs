use geo::{Geometry, GeometryCollection};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;

/// Identifier a data source uses for its own records.
///
/// This is not the ordinal position of the feature in storage order; sources
/// like GeoPackage start at 1 and may have gaps.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(untagged)]
pub enum NativeId {
    Int(i64),
    Str(String),
}

impl fmt::Display for NativeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NativeId::Int(id) => write!(f, "{}", id),
            NativeId::Str(id) => f.write_str(id),
        }
    }
}

impl From<i64> for NativeId {
    fn from(id: i64) -> Self {
        NativeId::Int(id)
    }
}

impl From<&str> for NativeId {
    fn from(id: &str) -> Self {
        NativeId::Str(id.to_string())
    }
}

/// A single record: an optional geometry plus its attributes
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Feature {
    pub geometry: Option<Geometry>,
    pub properties: Map<String, Value>,
}

impl Feature {
    pub fn new(geometry: impl Into<Geometry>) -> Self {
        Self { geometry: Some(geometry.into()), properties: Map::new() }
    }

    /// Builder: set one property
    pub fn with_property(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.properties.insert(key.into(), value.into());
        self
    }

    pub fn property(&self, key: &str) -> Option<&Value> {
        self.properties.get(key)
    }

    /// The geometry, with a missing one read as an empty collection
    pub fn geometry_or_empty(&self) -> Geometry {
        match &self.geometry {
            Some(geometry) => geometry.clone(),
            None => Geometry::GeometryCollection(GeometryCollection::new_from(vec![])),
        }
    }
}
