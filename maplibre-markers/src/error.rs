//! Errors which can happen in various parts of the library.

use lyon::tessellation::TessellationError;
use thiserror::Error;

/// Styling text could not be turned into style parameters.
#[derive(Error, Debug)]
pub enum StylingError {
    #[error("styling text is not a valid document: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("styling document must be a key-value map")]
    NotAnObject,
    #[error("style function {source_text} failed to compile: {reason}")]
    Expression { source_text: String, reason: String },
}

/// A mesh builder failed to produce geometry for a feature.
#[derive(Error, Debug)]
pub enum BuildError {
    #[error("tessellation failed: {0:?}")]
    Tessellation(TessellationError),
    #[error("processing feature geometry failed")]
    Processing(#[from] geozero::error::GeozeroError),
}

impl From<TessellationError> for BuildError {
    fn from(e: TessellationError) -> Self {
        BuildError::Tessellation(e)
    }
}

/// Failure of a public marker operation. Every failure leaves the marker untouched.
#[derive(Error, Debug)]
pub enum MarkerError {
    #[error("marker is not owned by this manager")]
    InvalidMarker,
    #[error("invalid geometry: {0}")]
    InvalidGeometry(&'static str),
    #[error("marker has no point feature to ease")]
    NoPointFeature,
    #[error(transparent)]
    Styling(#[from] StylingError),
}
