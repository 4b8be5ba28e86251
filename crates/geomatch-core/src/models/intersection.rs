//! Sparse intersection results keyed by `(source_index, target_index)`.

use geo::Geometry;
use serde::Serialize;
use serde_json::Value;
use std::collections::btree_map::{self, BTreeMap};

/// One non-empty overlap between a source and a target feature
#[derive(Debug, Clone, PartialEq)]
pub struct IntersectionRecord {
    /// Area, length or point count of the overlap
    pub measure: f64,
    /// The overlap itself, when geometries are kept
    pub geom: Option<Geometry>,
}

impl IntersectionRecord {
    pub fn new(measure: f64, geom: Option<Geometry>) -> Self {
        Self { measure, geom }
    }
}

/// A measure translated from ordinal keys to identifying-field values
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LabelledMeasure {
    pub from: Value,
    pub to: Value,
    pub measure: f64,
}

/// All non-empty overlaps of a matching run.
///
/// Only pairs with a non-empty intersection are present. Workers build
/// partial results which the dispatcher merges.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct IntersectionResult {
    records: BTreeMap<(usize, usize), IntersectionRecord>,
}

impl IntersectionResult {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, source: usize, target: usize, record: IntersectionRecord) {
        self.records.insert((source, target), record);
    }

    /// Absorb a partial result. Chunks are disjoint so keys never collide.
    pub fn merge(&mut self, other: IntersectionResult) {
        self.records.extend(other.records);
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn get(&self, source: usize, target: usize) -> Option<&IntersectionRecord> {
        self.records.get(&(source, target))
    }

    pub fn keys(&self) -> impl Iterator<Item = (usize, usize)> + '_ {
        self.records.keys().copied()
    }

    pub fn iter(&self) -> btree_map::Iter<'_, (usize, usize), IntersectionRecord> {
        self.records.iter()
    }

    /// Kept overlap geometries, grouped by source index
    pub fn geometries_by_source(&self) -> BTreeMap<usize, Vec<Geometry>> {
        let mut grouped: BTreeMap<usize, Vec<Geometry>> = BTreeMap::new();
        for (&(source, _), record) in &self.records {
            if let Some(geom) = &record.geom {
                grouped.entry(source).or_default().push(geom.clone());
            }
        }
        grouped
    }

    /// Translate ordinal keys into identifying-field values.
    ///
    /// Ordinals without a label come out as `null`.
    pub fn labelled(
        &self,
        source_labels: &BTreeMap<usize, Value>,
        target_labels: &BTreeMap<usize, Value>,
    ) -> Vec<LabelledMeasure> {
        self.records
            .iter()
            .map(|(&(source, target), record)| LabelledMeasure {
                from: source_labels.get(&source).cloned().unwrap_or(Value::Null),
                to: target_labels.get(&target).cloned().unwrap_or(Value::Null),
                measure: record.measure,
            })
            .collect()
    }
}

impl IntoIterator for IntersectionResult {
    type Item = ((usize, usize), IntersectionRecord);
    type IntoIter = btree_map::IntoIter<(usize, usize), IntersectionRecord>;

    fn into_iter(self) -> Self::IntoIter {
        self.records.into_iter()
    }
}

impl<'a> IntoIterator for &'a IntersectionResult {
    type Item = (&'a (usize, usize), &'a IntersectionRecord);
    type IntoIter = btree_map::Iter<'a, (usize, usize), IntersectionRecord>;

    fn into_iter(self) -> Self::IntoIter {
        self.records.iter()
    }
}

impl FromIterator<((usize, usize), IntersectionRecord)> for IntersectionResult {
    fn from_iter<I: IntoIterator<Item = ((usize, usize), IntersectionRecord)>>(iter: I) -> Self {
        Self { records: iter.into_iter().collect() }
    }
}
