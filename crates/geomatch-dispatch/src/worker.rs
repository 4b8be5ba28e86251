//! Matching worker: one source collection against one polygon target

use geomatch_core::error::{GeomatchError, Result};
use geomatch_core::models::{GeometryKind, IntersectionResult};
use geomatch_core::DatasetRef;
use geomatch_geo::{
    catch_topology, intersect_one, FeatureCollection, IntersectOptions, Reprojection, SpatialIndex,
};

/// Everything a worker needs to process part of a source collection
#[derive(Debug, Clone)]
pub struct WorkerJob {
    pub source: DatasetRef,
    pub target: DatasetRef,
    /// Source ordinals to process; all of them when `None`
    pub indices: Option<Vec<usize>>,
    /// Measure in Mollweide meters instead of degrees
    pub to_meters: bool,
    pub keep_geometries: bool,
}

impl WorkerJob {
    pub fn new(source: DatasetRef, target: DatasetRef) -> Self {
        Self { source, target, indices: None, to_meters: true, keep_geometries: true }
    }

    pub fn with_indices(mut self, indices: Vec<usize>) -> Self {
        self.indices = Some(indices);
        self
    }

    pub fn with_to_meters(mut self, to_meters: bool) -> Self {
        self.to_meters = to_meters;
        self
    }

    pub fn with_keep_geometries(mut self, keep_geometries: bool) -> Self {
        self.keep_geometries = keep_geometries;
        self
    }
}

/// Opened collections and target index, reused across chunks on one thread.
///
/// Holds a PROJ context, so it stays on the thread that opened it.
pub struct Worker {
    source: FeatureCollection,
    target: FeatureCollection,
    index: SpatialIndex,
    kind: GeometryKind,
    metric: Option<Reprojection>,
    keep_geometries: bool,
}

impl Worker {
    /// Open both collections and index the target
    pub fn open(job: &WorkerJob) -> Result<Self> {
        let target = FeatureCollection::open(&job.target)?;
        if !matches!(target.geometry_kind(), Ok(GeometryKind::Polygon)) {
            return Err(GeomatchError::TargetNotPolygon {
                found: target.geometry_type().to_string(),
            });
        }
        let index = target.build_spatial_index()?;
        tracing::info!(target = target.name(), features = target.len(), "Loaded target map");

        let source = FeatureCollection::open(&job.source)?;
        let kind = source.geometry_kind()?;
        tracing::info!(source = source.name(), features = source.len(), %kind, "Loaded source map");

        let metric = match kind {
            GeometryKind::Point => None,
            _ if job.to_meters => Some(Reprojection::wgs84_to_mollweide()?),
            _ => None,
        };

        Ok(Self { source, target, index, kind, metric, keep_geometries: job.keep_geometries })
    }

    pub fn kind(&self) -> GeometryKind {
        self.kind
    }

    /// Intersect the given source ordinals, or all of them.
    ///
    /// Features that hit a topology error are logged and skipped. Any other
    /// error stops the run.
    pub fn run(&self, indices: Option<&[usize]>) -> Result<IntersectionResult> {
        let options =
            IntersectOptions { metric: self.metric.as_ref(), keep_geometries: self.keep_geometries };
        let mut result = IntersectionResult::new();

        for item in self.source.iterate_projected(indices) {
            let outcome = item.and_then(|(source_index, geometry)| {
                catch_topology(|| {
                    let candidates = self.index.query_geometry(&geometry);
                    intersect_one(&geometry, self.kind, &self.target, &candidates, &options)
                })
                .map(|records| (source_index, records))
            });

            match outcome {
                Ok((source_index, records)) => {
                    for (target_index, record) in records {
                        result.insert(source_index, target_index, record);
                    }
                }
                Err(e) if e.is_per_feature() => {
                    tracing::warn!(error = %e, "Skipping feature after topology error");
                }
                Err(e) => {
                    tracing::error!(error = %e, source = self.source.name(), "Intersection worker failed");
                    return Err(e);
                }
            }
        }

        Ok(result)
    }
}

impl std::fmt::Debug for Worker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Worker")
            .field("source", &self.source)
            .field("target", &self.target)
            .field("kind", &self.kind)
            .field("metric", &self.metric)
            .finish()
    }
}

/// Run one job to completion on the calling thread
pub fn run_worker(job: &WorkerJob) -> Result<IntersectionResult> {
    tracing::info!(
        source = %job.source,
        target = %job.target,
        features = job.indices.as_ref().map(Vec::len),
        "Starting intersection worker"
    );

    let worker = Worker::open(job)?;
    let result = worker.run(job.indices.as_deref())?;

    tracing::info!(pairs = result.len(), "Finished intersection worker");
    Ok(result)
}
