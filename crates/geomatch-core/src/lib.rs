//! geomatch Core - Domain models, data source ports, and configuration
//!
//! This crate contains the domain types shared by the matching engine and the
//! dispatcher, the `FeatureSource` port through which collections are read,
//! and the layered configuration.

pub mod config;
pub mod error;
pub mod formats;
pub mod models;
pub mod ports;

pub use error::{GeomatchError, Result};
pub use formats::DatasetRef;
