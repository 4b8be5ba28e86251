//! Read-only feature collections with lazy random access

use std::cell::OnceCell;
use std::collections::{BTreeMap, HashSet};

use geo::Geometry;
use geomatch_core::error::{GeomatchError, Result};
use geomatch_core::models::{Crs, Feature, GeometryKind, GeometryType, NativeId};
use geomatch_core::ports::FeatureSource;
use geomatch_core::DatasetRef;
use serde_json::Value;

use crate::index::SpatialIndex;
use crate::transform::Reprojection;

/// An ordered collection of features over a [`FeatureSource`].
///
/// Features are addressed by ordinal position in storage order. Random access
/// through [`FeatureCollection::get`] needs a table from ordinal to native id.
/// That table is built by a full scan on first use, or up front with
/// [`FeatureCollection::ensure_index_map`].
pub struct FeatureCollection {
    source: Box<dyn FeatureSource>,
    identifying_field: Option<String>,
    to_wgs84: Reprojection,
    index_map: OnceCell<Vec<NativeId>>,
}

impl FeatureCollection {
    /// Open a collection by reference
    pub fn open(dataset: &DatasetRef) -> Result<Self> {
        Self::from_source(dataset.open()?)
    }

    pub fn from_source(source: Box<dyn FeatureSource>) -> Result<Self> {
        let to_wgs84 = Reprojection::to_wgs84(&source.crs())?;
        Ok(Self { source, identifying_field: None, to_wgs84, index_map: OnceCell::new() })
    }

    /// Builder: set the field that uniquely labels each feature
    pub fn with_identifying_field(mut self, field: impl Into<String>) -> Self {
        self.identifying_field = Some(field.into());
        self
    }

    pub fn identifying_field(&self) -> Option<&str> {
        self.identifying_field.as_deref()
    }

    pub fn len(&self) -> usize {
        self.source.len()
    }

    pub fn is_empty(&self) -> bool {
        self.source.is_empty()
    }

    pub fn crs(&self) -> Crs {
        self.source.crs()
    }

    pub fn name(&self) -> &str {
        self.source.name()
    }

    /// Whether the ordinal to native id table has been built
    pub fn has_index_map(&self) -> bool {
        self.index_map.get().is_some()
    }

    /// Build the ordinal to native id table if needed.
    ///
    /// This scans the whole collection.
    pub fn ensure_index_map(&self) -> &[NativeId] {
        self.index_map.get_or_init(|| {
            tracing::debug!(collection = self.name(), "Building index map");
            self.source.features().map(|(id, _)| id).collect()
        })
    }

    /// Fetch the feature at an ordinal position
    pub fn get(&self, index: usize) -> Result<Feature> {
        let ids = self.ensure_index_map();
        let id = ids
            .get(index)
            .ok_or(GeomatchError::IndexOutOfRange { index, len: ids.len() })?;
        self.source.feature(id)
    }

    /// Iterate geometries reprojected to WGS 84.
    ///
    /// With `indices`, only those ordinals are visited, in the given order.
    /// Reprojection happens on every pass; nothing is cached.
    pub fn iterate_projected<'a>(
        &'a self,
        indices: Option<&'a [usize]>,
    ) -> Box<dyn Iterator<Item = Result<(usize, Geometry)>> + 'a> {
        match indices {
            None => Box::new(self.source.features().enumerate().map(move |(index, (_, feature))| {
                self.project(&feature).map(|geometry| (index, geometry))
            })),
            Some(indices) => Box::new(indices.iter().map(move |&index| {
                let feature = self.get(index)?;
                self.project(&feature).map(|geometry| (index, geometry))
            })),
        }
    }

    fn project(&self, feature: &Feature) -> Result<Geometry> {
        self.to_wgs84.apply(&feature.geometry_or_empty())
    }

    /// Build an R-tree over the WGS 84 bounding boxes of all features
    pub fn build_spatial_index(&self) -> Result<SpatialIndex> {
        let projected = self.iterate_projected(None).collect::<Result<Vec<_>>>()?;
        let index = SpatialIndex::from_geometries(projected);
        tracing::debug!(collection = self.name(), indexed = index.len(), "Built spatial index");
        Ok(index)
    }

    /// Map each ordinal to the value of the identifying field.
    ///
    /// `field` falls back to the configured identifying field. The values
    /// must be unique across the collection.
    pub fn field_value_map(&self, field: Option<&str>) -> Result<BTreeMap<usize, Value>> {
        let field = field
            .or(self.identifying_field.as_deref())
            .ok_or(GeomatchError::NoIdentifyingField)?;

        let mut map = BTreeMap::new();
        let mut seen = HashSet::new();

        for (index, (_, feature)) in self.source.features().enumerate() {
            let value = match feature.property(field) {
                Some(value) => value.clone(),
                None if index == 0 => {
                    return Err(GeomatchError::FieldNotFound { field: field.to_string() })
                }
                None => Value::Null,
            };

            if !seen.insert(value.to_string()) {
                let value = match value {
                    Value::String(s) => s,
                    other => other.to_string(),
                };
                return Err(GeomatchError::DuplicateFieldValue { field: field.to_string(), value });
            }
            map.insert(index, value);
        }

        Ok(map)
    }

    /// Geometry type declared by the source, or inferred by a full scan.
    ///
    /// The scan only settles on a type when every feature with a geometry
    /// has that exact type.
    pub fn geometry_type(&self) -> GeometryType {
        let declared = self.source.declared_geometry_type();
        if declared != GeometryType::Unknown {
            return declared;
        }

        let mut found: Option<GeometryType> = None;
        for (_, feature) in self.source.features() {
            let Some(geometry) = &feature.geometry else {
                continue;
            };
            let geometry_type = GeometryType::of(geometry);
            match found {
                None => found = Some(geometry_type),
                Some(previous) if previous == geometry_type => {}
                Some(_) => return GeometryType::Unknown,
            }
        }
        found.unwrap_or(GeometryType::Unknown)
    }

    /// The single kind of every geometry in the collection
    pub fn geometry_kind(&self) -> Result<GeometryKind> {
        let geometry_type = self.geometry_type();
        geometry_type.kind().ok_or_else(|| GeomatchError::NoSingleKind {
            dataset: self.name().to_string(),
            found: geometry_type.to_string(),
        })
    }
}

impl std::fmt::Debug for FeatureCollection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FeatureCollection")
            .field("name", &self.name())
            .field("len", &self.len())
            .field("identifying_field", &self.identifying_field)
            .field("has_index_map", &self.has_index_map())
            .finish()
    }
}
