//! Port trait definitions
//!
//! These traits define the interfaces that data adapters must implement.

pub mod source;

pub use source::FeatureSource;
