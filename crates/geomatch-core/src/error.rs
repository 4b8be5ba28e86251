//! Error types for geomatch

use thiserror::Error;

#[derive(Debug, Error)]
pub enum GeomatchError {
    // Collection errors
    #[error("No identifying field configured or given")]
    NoIdentifyingField,

    #[error("Identifying field '{field}' not present in collection")]
    FieldNotFound { field: String },

    #[error("Identifying field '{field}' is not unique: value {value} appears more than once")]
    DuplicateFieldValue { field: String, value: String },

    #[error("Feature index {index} out of range for collection of {len} features")]
    IndexOutOfRange { index: usize, len: usize },

    #[error("No feature with native id {id}")]
    FeatureNotFound { id: String },

    // Geometry kind errors
    #[error("Unsupported geometry kind: {geometry_type}")]
    UnsupportedGeometryKind { geometry_type: String },

    #[error("Cannot measure a {geometry_type} geometry as kind {kind}")]
    MeasureKindMismatch { kind: String, geometry_type: String },

    #[error("Incompatible geometry kinds: expected {expected}, found {found}")]
    IncompatibleKinds { expected: String, found: String },

    #[error("Target collection must contain polygons, found {found}")]
    TargetNotPolygon { found: String },

    #[error("No single valid geometry kind in collection {dataset}: {found}")]
    NoSingleKind { dataset: String, found: String },

    #[error("Topology error: {reason}")]
    Topology { reason: String },

    // Projection errors
    #[error("Failed to create projection from '{from}' to '{to}': {reason}")]
    ProjectionSetup { from: String, to: String, reason: String },

    #[error("Projection failed: {reason}")]
    Projection { reason: String },

    // Dispatch errors
    #[error("Intersection dispatch failed: {} of {total_chunks} chunks failed ({failed_chunks:?})", .failed_chunks.len())]
    DispatchFailed {
        failed_chunks: Vec<usize>,
        total_chunks: usize,
    },

    // Configuration errors
    #[error("Invalid configuration value for {key}: {reason}")]
    ConfigInvalid { key: String, reason: String },

    // Format errors
    #[error("Invalid {format} data: {reason}")]
    FormatValidation { format: String, reason: String },

    // IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl GeomatchError {
    /// Whether this error concerns a single feature and may be skipped by a
    /// worker without aborting its chunk.
    pub fn is_per_feature(&self) -> bool {
        matches!(self, GeomatchError::Topology { .. })
    }
}

pub type Result<T> = std::result::Result<T, GeomatchError>;
