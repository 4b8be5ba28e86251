//! GeoJSON feature source

use std::collections::HashMap;
use std::fs;
use std::path::Path;

use crate::error::{GeomatchError, Result};
use crate::models::{Crs, Feature, GeometryType, NativeId};
use crate::ports::FeatureSource;

/// Features read from a GeoJSON file.
///
/// GeoJSON has no schema, so the declared geometry type is always `Unknown`.
#[derive(Debug, Clone)]
pub struct GeoJsonSource {
    name: String,
    crs: Crs,
    features: Vec<(NativeId, Feature)>,
    positions: HashMap<NativeId, usize>,
}

impl GeoJsonSource {
    /// Read and parse a GeoJSON file
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)?;

        let name = path.file_stem().and_then(|s| s.to_str()).unwrap_or("unnamed").to_string();

        Self::parse(&name, &content)
    }

    /// Parse GeoJSON text
    pub fn parse(name: &str, content: &str) -> Result<Self> {
        let geojson: geojson::GeoJson =
            content.parse().map_err(|e| GeomatchError::FormatValidation {
                format: "GeoJSON".to_string(),
                reason: format!("Failed to parse GeoJSON: {}", e),
            })?;

        let (raw_features, crs) = match geojson {
            geojson::GeoJson::FeatureCollection(fc) => {
                let crs = fc
                    .foreign_members
                    .as_ref()
                    .and_then(|fm| fm.get("crs"))
                    .and_then(crs_name)
                    .map(Crs::new)
                    .unwrap_or_default();
                (fc.features, crs)
            }
            geojson::GeoJson::Feature(feature) => (vec![feature], Crs::wgs84()),
            geojson::GeoJson::Geometry(geometry) => {
                (vec![geojson::Feature::from(geometry)], Crs::wgs84())
            }
        };

        let mut features = Vec::with_capacity(raw_features.len());
        let mut positions = HashMap::with_capacity(raw_features.len());

        for (idx, raw) in raw_features.into_iter().enumerate() {
            let (id, feature) = convert_feature(raw, idx)?;
            if positions.insert(id.clone(), idx).is_some() {
                return Err(GeomatchError::FormatValidation {
                    format: "GeoJSON".to_string(),
                    reason: format!("Duplicate feature id {}", id),
                });
            }
            features.push((id, feature));
        }

        tracing::debug!(name, features = features.len(), crs = %crs, "Loaded GeoJSON source");

        Ok(Self { name: name.to_string(), crs, features, positions })
    }
}

impl FeatureSource for GeoJsonSource {
    fn name(&self) -> &str {
        &self.name
    }

    fn crs(&self) -> Crs {
        self.crs.clone()
    }

    fn declared_geometry_type(&self) -> GeometryType {
        GeometryType::Unknown
    }

    fn len(&self) -> usize {
        self.features.len()
    }

    fn features(&self) -> Box<dyn Iterator<Item = (NativeId, Feature)> + '_> {
        Box::new(self.features.iter().cloned())
    }

    fn feature(&self, id: &NativeId) -> Result<Feature> {
        self.positions
            .get(id)
            .map(|&position| self.features[position].1.clone())
            .ok_or_else(|| GeomatchError::FeatureNotFound { id: id.to_string() })
    }
}

/// Convert a GeoJSON feature, using its position when it has no id
fn convert_feature(feature: geojson::Feature, idx: usize) -> Result<(NativeId, Feature)> {
    let id = match feature.id {
        Some(geojson::feature::Id::String(s)) => NativeId::Str(s),
        Some(geojson::feature::Id::Number(n)) => match n.as_i64() {
            Some(i) => NativeId::Int(i),
            None => NativeId::Str(n.to_string()),
        },
        None => NativeId::Int(idx as i64),
    };

    let geometry = match feature.geometry {
        Some(geometry) => Some(geo::Geometry::<f64>::try_from(geometry).map_err(|e| {
            GeomatchError::FormatValidation {
                format: "GeoJSON".to_string(),
                reason: format!("Feature {}: unsupported geometry: {}", id, e),
            }
        })?),
        None => None,
    };

    let properties = feature.properties.unwrap_or_default();

    Ok((id, Feature { geometry, properties }))
}

/// Extract the CRS name from a legacy `crs` member
fn crs_name(crs: &serde_json::Value) -> Option<String> {
    crs.get("properties")?.get("name")?.as_str().map(|name| name.to_string())
}
