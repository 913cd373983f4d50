//! Contract of the external multipatch collaborator.
//!
//! MultiPatch records describe 3D surface meshes via mixed part types. The
//! triangulation/reconstruction algorithm itself is out of scope for this
//! crate; the geometry codec only delegates through [`MultiPatchAdapter`].

use crate::error::ShapeResult;
use crate::geom::Geometry;
use crate::record::PartType;

/// The vertex/part/part-type arrays of one multipatch record.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct MultiPatchParts {
    /// Start offset of each part into the vertex arrays.
    pub part_starts: Vec<i32>,
    /// Type tag of each part.
    pub part_types: Vec<PartType>,
    /// X ordinates.
    pub x: Vec<f64>,
    /// Y ordinates.
    pub y: Vec<f64>,
    /// Z ordinates.
    pub z: Vec<f64>,
}

/// Reconstructs a geometry from multipatch parts and decomposes one back.
pub trait MultiPatchAdapter {
    /// Builds an arbitrary polygonal or TIN geometry from the given parts.
    /// `None` means the parts could not be interpreted.
    fn reconstruct(&self, parts: &MultiPatchParts) -> Option<Geometry>;

    /// Decomposes a geometry into multipatch parts. Errors are surfaced to
    /// callers as unsupported-geometry failures.
    fn decompose(&self, geometry: &Geometry) -> ShapeResult<MultiPatchParts>;
}
