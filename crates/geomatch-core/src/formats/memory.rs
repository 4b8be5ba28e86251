use std::collections::HashMap;
use std::sync::Arc;

use crate::error::{GeomatchError, Result};
use crate::models::{Crs, Feature, GeometryType, NativeId};
use crate::ports::FeatureSource;

/// Feature collection held in memory
#[derive(Debug, Clone)]
pub struct MemorySource {
    name: String,
    crs: Crs,
    geometry_type: GeometryType,
    features: Vec<(NativeId, Feature)>,
    positions: HashMap<NativeId, usize>,
}

impl MemorySource {
    pub fn builder(name: impl Into<String>) -> MemorySourceBuilder {
        MemorySourceBuilder::new(name)
    }
}

impl FeatureSource for MemorySource {
    fn name(&self) -> &str {
        &self.name
    }

    fn crs(&self) -> Crs {
        self.crs.clone()
    }

    fn declared_geometry_type(&self) -> GeometryType {
        self.geometry_type
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

impl FeatureSource for Arc<MemorySource> {
    fn name(&self) -> &str {
        self.as_ref().name()
    }

    fn crs(&self) -> Crs {
        self.as_ref().crs()
    }

    fn declared_geometry_type(&self) -> GeometryType {
        self.as_ref().declared_geometry_type()
    }

    fn len(&self) -> usize {
        self.as_ref().len()
    }

    fn features(&self) -> Box<dyn Iterator<Item = (NativeId, Feature)> + '_> {
        self.as_ref().features()
    }

    fn feature(&self, id: &NativeId) -> Result<Feature> {
        self.as_ref().feature(id)
    }
}

/// Builder for [`MemorySource`].
///
/// Features added without an explicit id are numbered from `id_start`
/// (0 by default) by position.
#[derive(Debug)]
pub struct MemorySourceBuilder {
    name: String,
    crs: Crs,
    geometry_type: GeometryType,
    id_start: i64,
    features: Vec<(Option<NativeId>, Feature)>,
}

impl MemorySourceBuilder {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            crs: Crs::wgs84(),
            geometry_type: GeometryType::Unknown,
            id_start: 0,
            features: Vec::new(),
        }
    }

    pub fn crs(mut self, crs: Crs) -> Self {
        self.crs = crs;
        self
    }

    /// Declare the schema geometry type instead of inferring it by scan
    pub fn geometry_type(mut self, geometry_type: GeometryType) -> Self {
        self.geometry_type = geometry_type;
        self
    }

    /// First native id for positionally numbered features
    pub fn id_start(mut self, start: i64) -> Self {
        self.id_start = start;
        self
    }

    pub fn feature(mut self, feature: Feature) -> Self {
        self.features.push((None, feature));
        self
    }

    pub fn feature_with_id(mut self, id: impl Into<NativeId>, feature: Feature) -> Self {
        self.features.push((Some(id.into()), feature));
        self
    }

    pub fn features(mut self, features: impl IntoIterator<Item = Feature>) -> Self {
        self.features.extend(features.into_iter().map(|f| (None, f)));
        self
    }

    pub fn build(self) -> Result<MemorySource> {
        let mut features = Vec::with_capacity(self.features.len());
        let mut positions = HashMap::with_capacity(self.features.len());

        for (position, (id, feature)) in self.features.into_iter().enumerate() {
            let id = id.unwrap_or(NativeId::Int(self.id_start + position as i64));
            if positions.insert(id.clone(), position).is_some() {
                return Err(GeomatchError::FormatValidation {
                    format: "memory".to_string(),
                    reason: format!("Duplicate native id {}", id),
                });
            }
            features.push((id, feature));
        }

        Ok(MemorySource {
            name: self.name,
            crs: self.crs,
            geometry_type: self.geometry_type,
            features,
            positions,
        })
    }
}
