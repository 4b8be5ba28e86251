use geo::{BoundingRect, Geometry, Rect};
use rstar::{RTree, RTreeObject, AABB};

/// Bounding box of one feature, keyed by its ordinal index
#[derive(Debug, Clone, PartialEq)]
pub struct IndexedEnvelope {
    /// Ordinal position of the feature in its collection
    pub index: usize,

    envelope: AABB<[f64; 2]>,
}

impl IndexedEnvelope {
    pub fn new(index: usize, rect: Rect) -> Self {
        let (min, max) = (rect.min(), rect.max());
        Self { index, envelope: AABB::from_corners([min.x, min.y], [max.x, max.y]) }
    }
}

impl RTreeObject for IndexedEnvelope {
    type Envelope = AABB<[f64; 2]>;

    fn envelope(&self) -> Self::Envelope {
        self.envelope
    }
}

/// Bounding-box index over a feature collection.
///
/// Built once by bulk loading and never mutated. Queries return candidate
/// ordinal indices in ascending order.
#[derive(Debug)]
pub struct SpatialIndex {
    tree: RTree<IndexedEnvelope>,
}

impl SpatialIndex {
    /// Create a spatial index from precomputed bounding boxes
    pub fn from_envelopes(envelopes: impl IntoIterator<Item = (usize, Rect)>) -> Self {
        let indexed: Vec<IndexedEnvelope> = envelopes
            .into_iter()
            .map(|(index, rect)| IndexedEnvelope::new(index, rect))
            .collect();

        Self { tree: RTree::bulk_load(indexed) }
    }

    /// Create a spatial index from geometries.
    ///
    /// Empty geometries have no bounding box and are left out.
    pub fn from_geometries(geometries: impl IntoIterator<Item = (usize, Geometry)>) -> Self {
        Self::from_envelopes(
            geometries
                .into_iter()
                .filter_map(|(index, geometry)| geometry.bounding_rect().map(|rect| (index, rect))),
        )
    }

    /// Indices whose bounding box intersects the given box
    pub fn query_bbox(&self, min: [f64; 2], max: [f64; 2]) -> Vec<usize> {
        let bbox = AABB::from_corners(min, max);
        let mut hits: Vec<usize> =
            self.tree.locate_in_envelope_intersecting(&bbox).map(|e| e.index).collect();
        hits.sort_unstable();
        hits
    }

    /// Indices whose bounding box intersects the geometry's bounding box
    pub fn query_geometry(&self, geometry: &Geometry) -> Vec<usize> {
        match geometry.bounding_rect() {
            Some(rect) => self.query_bbox([rect.min().x, rect.min().y], [rect.max().x, rect.max().y]),
            None => Vec::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.tree.size()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
