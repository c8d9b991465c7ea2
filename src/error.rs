//! Errors

use thiserror::Error;

/// Errors raised while building or editing a scene
///
/// Tracing itself never fails: a ray that cannot continue simply has no child.
#[derive(Error, Debug)]
pub enum OpticsError {
    /// A direction vector of zero (or non-finite) length
    #[error("direction vector has zero length")]
    DegenerateDirection,

    /// Ray intensity must be finite and non-negative
    #[error("invalid ray intensity: {0}")]
    InvalidIntensity(f64),

    /// Mirror endpoints coincide
    #[error("mirror endpoints coincide")]
    DegenerateMirror,

    #[error("invalid sphere radius: {0}")]
    InvalidRadius(f64),

    /// Refractive indices below 1 are not supported
    #[error("invalid refractive index: {0}")]
    InvalidIndex(f64),

    #[error("polygon needs at least 3 vertices, got {0}")]
    TooFewVertices(usize),

    /// Zero area, repeated vertices or non-finite coordinates
    #[error("polygon is degenerate")]
    DegeneratePolygon,

    #[error("polygon edges {0} and {1} intersect")]
    SelfIntersectingPolygon(usize, usize),

    #[error("index {index} out of range for {len} items")]
    IndexOutOfRange { index: usize, len: usize },

    #[error("cannot read scene file: {0}")]
    Io(#[from] std::io::Error),

    #[error("cannot parse scene file: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

/// Result type for scene operations
pub type Result<T> = std::result::Result<T, OpticsError>;
