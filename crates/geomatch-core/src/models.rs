pub mod feature;
pub mod geometry;
pub mod intersection;

pub use feature::{Feature, NativeId};
pub use geometry::{Crs, GeometryKind, GeometryType};
pub use intersection::{IntersectionRecord, IntersectionResult, LabelledMeasure};
