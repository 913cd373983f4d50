//! Defines [`ShapeError`], representing all errors returned by this crate.

use thiserror::Error;

/// Enum with all errors in this crate.
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum ShapeError {
    /// Generic failure with a caller-facing message.
    #[error("{0}")]
    AppDefined(String),

    /// Attempt to write a geometry whose type does not match the target shape
    /// type, or a multipatch decomposition failure.
    #[error("Attempt to write {geometry} geometry to {target} type shapefile.")]
    UnsupportedGeometryType {
        /// Type name of the offending geometry.
        geometry: String,
        /// Kind of shape the target layer stores.
        target: String,
    },

    /// A coordinate in the output buffer is NaN or infinite.
    #[error("Coordinates with non-finite values are not allowed")]
    NonFiniteCoordinates,

    /// Vertex or part counts exceed the format's signed 32-bit limits.
    #[error("Too big geometry")]
    GeometryTooLarge,

    /// [std::io::Error]
    #[error(transparent)]
    IOError(#[from] std::io::Error),
}

/// Crate-specific result type.
pub type ShapeResult<T> = std::result::Result<T, ShapeError>;
