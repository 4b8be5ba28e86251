//! Concrete feature sources
//!
//! A [`DatasetRef`] names a collection without holding it open, so each
//! worker thread can open its own independent handle.

use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;

use crate::error::Result;
use crate::ports::FeatureSource;

pub mod geojson;
pub mod memory;

pub use self::geojson::GeoJsonSource;
pub use self::memory::{MemorySource, MemorySourceBuilder};

/// Cloneable, thread-safe reference to a feature collection
#[derive(Clone)]
pub enum DatasetRef {
    /// A GeoJSON file on disk
    GeoJson(PathBuf),
    /// An in-memory collection shared between threads
    Memory(Arc<MemorySource>),
}

impl DatasetRef {
    /// Open a fresh read handle
    pub fn open(&self) -> Result<Box<dyn FeatureSource>> {
        match self {
            DatasetRef::GeoJson(path) => Ok(Box::new(GeoJsonSource::open(path)?)),
            DatasetRef::Memory(source) => Ok(Box::new(Arc::clone(source))),
        }
    }
}

impl From<MemorySource> for DatasetRef {
    fn from(source: MemorySource) -> Self {
        DatasetRef::Memory(Arc::new(source))
    }
}

impl From<PathBuf> for DatasetRef {
    fn from(path: PathBuf) -> Self {
        DatasetRef::GeoJson(path)
    }
}

impl fmt::Debug for DatasetRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DatasetRef::GeoJson(path) => f.debug_tuple("GeoJson").field(path).finish(),
            DatasetRef::Memory(source) => f.debug_tuple("Memory").field(&source.name()).finish(),
        }
    }
}

impl fmt::Display for DatasetRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DatasetRef::GeoJson(path) => write!(f, "{}", path.display()),
            DatasetRef::Memory(source) => write!(f, "memory:{}", source.name()),
        }
    }
}
