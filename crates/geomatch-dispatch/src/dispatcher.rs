//! Chunked parallel dispatch of matching work.
//!
//! Source ordinals are split into chunks that a fixed pool of threads pulls
//! from a shared queue. Each thread opens its own collections and target
//! index. Chunk outcomes come back over a channel to the calling thread,
//! which is the only one that touches the merged result.

use std::panic::{self, AssertUnwindSafe};
use std::path::PathBuf;
use std::sync::mpsc::{self, Sender};
use std::sync::{Mutex, PoisonError};
use std::thread;

use geomatch_core::config::{LayeredConfig, DEFAULT_MAX_JOBS, DEFAULT_MIN_CHUNK};
use geomatch_core::error::{GeomatchError, Result};
use geomatch_core::models::IntersectionResult;
use geomatch_core::DatasetRef;
use geomatch_geo::{panic_message, FeatureCollection};

use crate::chunk::{chunker, partition};
use crate::logging::{LogHandle, LogSink};
use crate::worker::{run_worker, Worker, WorkerJob};

/// Options for [`dispatch`]
#[derive(Debug, Clone)]
pub struct DispatchOptions {
    /// Source ordinals to process; all of them when `None`
    pub indices: Option<Vec<usize>>,
    /// Worker threads; 0 runs synchronously on the calling thread
    pub workers: usize,
    /// Directory for the worker log; the working directory when `None`
    pub log_dir: Option<PathBuf>,
    pub to_meters: bool,
    pub keep_geometries: bool,
    pub max_jobs: usize,
    pub min_chunk: usize,
}

impl Default for DispatchOptions {
    fn default() -> Self {
        Self {
            indices: None,
            workers: 0,
            log_dir: None,
            to_meters: true,
            keep_geometries: true,
            max_jobs: DEFAULT_MAX_JOBS,
            min_chunk: DEFAULT_MIN_CHUNK,
        }
    }
}

impl DispatchOptions {
    pub fn with_indices(mut self, indices: Vec<usize>) -> Self {
        self.indices = Some(indices);
        self
    }

    pub fn with_workers(mut self, workers: usize) -> Self {
        self.workers = workers;
        self
    }

    pub fn with_log_dir(mut self, log_dir: impl Into<PathBuf>) -> Self {
        self.log_dir = Some(log_dir.into());
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

    pub fn with_max_jobs(mut self, max_jobs: usize) -> Self {
        self.max_jobs = max_jobs;
        self
    }

    pub fn with_min_chunk(mut self, min_chunk: usize) -> Self {
        self.min_chunk = min_chunk;
        self
    }

    /// Check the partitioning bounds
    pub fn validate(&self) -> Result<()> {
        for (key, value) in [("max_jobs", self.max_jobs), ("min_chunk", self.min_chunk)] {
            if value == 0 {
                return Err(GeomatchError::ConfigInvalid {
                    key: key.to_string(),
                    reason: "must be at least 1".to_string(),
                });
            }
        }
        Ok(())
    }

    fn job(&self, source: &DatasetRef, target: &DatasetRef) -> WorkerJob {
        WorkerJob {
            source: source.clone(),
            target: target.clone(),
            indices: self.indices.clone(),
            to_meters: self.to_meters,
            keep_geometries: self.keep_geometries,
        }
    }
}

impl From<&LayeredConfig> for DispatchOptions {
    fn from(config: &LayeredConfig) -> Self {
        Self {
            indices: None,
            workers: config.workers.value,
            log_dir: config.log_dir.value.clone(),
            to_meters: config.to_meters.value,
            keep_geometries: config.keep_geometries.value,
            max_jobs: config.max_jobs.value,
            min_chunk: config.min_chunk.value,
        }
    }
}

/// Result of one chunk, as sent back to the coordinator
struct ChunkOutcome {
    chunk_id: usize,
    result: std::result::Result<IntersectionResult, String>,
}

/// Intersect every source feature with the polygon target.
///
/// With `workers == 0` a single worker runs on the calling thread.
/// Otherwise every chunk runs to completion before the call returns. If
/// any chunk failed, the error lists the failed chunk ids.
pub fn dispatch(
    source: &DatasetRef,
    target: &DatasetRef,
    options: &DispatchOptions,
) -> Result<IntersectionResult> {
    options.validate()?;

    if options.workers == 0 {
        return run_worker(&options.job(source, target));
    }

    let ids: Vec<usize> = match &options.indices {
        Some(indices) => indices.clone(),
        None => (0..FeatureCollection::open(source)?.len()).collect(),
    };
    if ids.is_empty() {
        return Ok(IntersectionResult::new());
    }

    let (chunk_size, job_count) = partition(ids.len(), options.max_jobs, options.min_chunk);
    let chunks = chunker(&ids, chunk_size);

    let sink = LogSink::start(options.log_dir.as_deref())?;
    let outcome = {
        let _log = sink.handle().install();
        tracing::info!(
            source = %source,
            target = %target,
            size = ids.len(),
            chunk_size,
            job_count,
            workers = options.workers,
            "Starting intersect calculation"
        );

        let outcome = run_pool(source, target, options, chunks, &sink.handle());

        match &outcome {
            Ok(result) => tracing::info!(
                source = %source,
                target = %target,
                size = ids.len(),
                chunk_size,
                job_count,
                pairs = result.len(),
                "Finished intersect calculation"
            ),
            Err(e) => tracing::error!(error = %e, "Intersect calculation failed"),
        }
        outcome
    };
    sink.stop();

    outcome
}

fn run_pool(
    source: &DatasetRef,
    target: &DatasetRef,
    options: &DispatchOptions,
    chunks: Vec<Vec<usize>>,
    log: &LogHandle,
) -> Result<IntersectionResult> {
    let total_chunks = chunks.len();
    let thread_count = options.workers.min(total_chunks);
    let queue = Mutex::new(chunks.into_iter().enumerate());
    let (tx, rx) = mpsc::channel::<ChunkOutcome>();

    thread::scope(|scope| -> Result<IntersectionResult> {
        for n in 0..thread_count {
            let tx = tx.clone();
            let log = log.clone();
            let queue = &queue;
            let job = options.job(source, target);

            thread::Builder::new()
                .name(format!("geomatch-worker-{n}"))
                .spawn_scoped(scope, move || {
                    let _log = log.install();
                    worker_loop(&job, queue, &tx);
                })?;
        }
        drop(tx);

        let mut merged = IntersectionResult::new();
        let mut settled = vec![false; total_chunks];
        let mut failed_chunks = Vec::new();

        for ChunkOutcome { chunk_id, result } in rx {
            settled[chunk_id] = true;
            match result {
                Ok(partial) => merged.merge(partial),
                Err(reason) => {
                    tracing::error!(chunk = chunk_id, %reason, "Chunk failed");
                    failed_chunks.push(chunk_id);
                }
            }
        }

        // Chunks never reported back count as failed
        let missing = settled.iter().enumerate().filter(|(_, done)| !**done).map(|(id, _)| id);
        failed_chunks.extend(missing);

        if failed_chunks.is_empty() {
            Ok(merged)
        } else {
            failed_chunks.sort_unstable();
            Err(GeomatchError::DispatchFailed { failed_chunks, total_chunks })
        }
    })
}

/// Pull chunks off the queue until it is empty
fn worker_loop<I>(job: &WorkerJob, queue: &Mutex<I>, tx: &Sender<ChunkOutcome>)
where
    I: Iterator<Item = (usize, Vec<usize>)>,
{
    let worker = match panic::catch_unwind(AssertUnwindSafe(|| Worker::open(job))) {
        Ok(Ok(worker)) => Ok(worker),
        Ok(Err(e)) => {
            tracing::error!(error = %e, "Could not start worker");
            Err(e.to_string())
        }
        Err(payload) => Err(panic_message(payload.as_ref())),
    };

    loop {
        let next = queue.lock().unwrap_or_else(PoisonError::into_inner).next();
        let Some((chunk_id, indices)) = next else {
            break;
        };

        tracing::info!(
            chunk = chunk_id,
            features = indices.len(),
            first = indices.iter().min(),
            last = indices.iter().max(),
            "Starting chunk"
        );

        let result = match &worker {
            Ok(worker) => match panic::catch_unwind(AssertUnwindSafe(|| worker.run(Some(&indices)))) {
                Ok(result) => result.map_err(|e| e.to_string()),
                Err(payload) => Err(panic_message(payload.as_ref())),
            },
            Err(reason) => Err(reason.clone()),
        };

        if tx.send(ChunkOutcome { chunk_id, result }).is_err() {
            break;
        }
    }
}
