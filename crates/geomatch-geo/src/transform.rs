//! CRS transformation

use std::fmt;

use geo::{Coord, Geometry, MapCoords};
use geomatch_core::error::{GeomatchError, Result};
use geomatch_core::models::Crs;
use proj::Proj;

/// Check if two CRS describe the same coordinates
pub fn crs_match(crs1: &Crs, crs2: &Crs) -> bool {
    crs1 == crs2 || (crs1.is_geographic() && crs2.is_geographic())
}

/// A reusable transformation between two CRS.
///
/// Matching CRS give an identity transform that never touches PROJ. A PROJ
/// context is not thread-safe, so each worker builds its own.
pub struct Reprojection {
    from: Crs,
    to: Crs,
    proj: Option<Proj>,
}

impl Reprojection {
    pub fn new(from: &Crs, to: &Crs) -> Result<Self> {
        if crs_match(from, to) {
            return Ok(Self::identity(to));
        }

        let proj = Proj::new_known_crs(&from.definition, &to.definition, None).map_err(|e| {
            GeomatchError::ProjectionSetup {
                from: from.to_string(),
                to: to.to_string(),
                reason: e.to_string(),
            }
        })?;

        Ok(Self { from: from.clone(), to: to.clone(), proj: Some(proj) })
    }

    /// Transform that leaves coordinates untouched
    pub fn identity(crs: &Crs) -> Self {
        Self { from: crs.clone(), to: crs.clone(), proj: None }
    }

    /// Transform into WGS 84, used for indexing
    pub fn to_wgs84(from: &Crs) -> Result<Self> {
        Self::new(from, &Crs::wgs84())
    }

    /// Transform from WGS 84 into Mollweide, used for metric measures
    pub fn wgs84_to_mollweide() -> Result<Self> {
        Self::new(&Crs::wgs84(), &Crs::mollweide())
    }

    pub fn from_crs(&self) -> &Crs {
        &self.from
    }

    pub fn to_crs(&self) -> &Crs {
        &self.to
    }

    pub fn is_identity(&self) -> bool {
        self.proj.is_none()
    }

    /// Reproject a geometry
    pub fn apply(&self, geometry: &Geometry) -> Result<Geometry> {
        let proj = match &self.proj {
            Some(proj) => proj,
            None => return Ok(geometry.clone()),
        };

        geometry
            .try_map_coords(move |coord| {
                proj.convert((coord.x, coord.y)).map(|(x, y)| Coord { x, y })
            })
            .map_err(|e| GeomatchError::Projection {
                reason: format!("{} -> {}: {}", self.from, self.to, e),
            })
    }
}

impl fmt::Debug for Reprojection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Reprojection")
            .field("from", &self.from)
            .field("to", &self.to)
            .field("identity", &self.is_identity())
            .finish()
    }
}
