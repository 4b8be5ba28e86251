use crate::error::Result;
use crate::models::{Crs, Feature, GeometryType, NativeId};

/// Port for read-only access to a stored feature collection
pub trait FeatureSource: Send + Sync {
    /// Dataset name, used in log lines and errors
    fn name(&self) -> &str;

    /// Coordinate reference system of the stored geometries
    fn crs(&self) -> Crs;

    /// Geometry type declared by the storage schema, `Unknown` if none
    fn declared_geometry_type(&self) -> GeometryType;

    /// Number of features
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Iterate features in storage order, paired with their native ids
    fn features(&self) -> Box<dyn Iterator<Item = (NativeId, Feature)> + '_>;

    /// Fetch one feature by its native id
    fn feature(&self, id: &NativeId) -> Result<Feature>;
}
