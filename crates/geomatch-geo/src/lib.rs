//! geomatch Geo - Geometry classification, cleaning, and spatial matching
//!
//! This crate handles the geometric side of matching: classifying geometries
//! into kinds, repairing invalid input, reprojection, spatial indexing, and
//! the per-feature intersection and remaining-measure algorithms.

pub mod collection;
pub mod extract;
pub mod index;
pub mod intersection;
pub mod kind;
pub mod remaining;
pub mod transform;
pub mod validation;

pub use collection::FeatureCollection;
pub use extract::recursive_extract;
pub use index::SpatialIndex;
pub use intersection::{catch_topology, intersect_one, panic_message, IntersectOptions};
pub use kind::{classify, measure};
pub use remaining::{remaining, remaining_for_collection};
pub use transform::Reprojection;
pub use validation::{clean, repair, Unrepairable};
