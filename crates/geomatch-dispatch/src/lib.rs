//! geomatch Dispatch - Chunked parallel matching
//!
//! Splits the source features of a matching run into chunks, runs them on a
//! fixed pool of worker threads, and merges the partial results on the
//! calling thread. Worker log lines go to a single file per run.

pub mod chunk;
pub mod dispatcher;
pub mod logging;
pub mod worker;

pub use chunk::{chunker, partition};
pub use dispatcher::{dispatch, DispatchOptions};
pub use logging::{LogHandle, LogSink};
pub use worker::{run_worker, Worker, WorkerJob};
