//! Capture pipeline error types.

use thiserror::Error;

/// Errors that can occur in the capture and compositing pipeline.
///
/// Nothing in the per-tick path treats these as fatal; callers log and
/// retry on the next tick.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CaptureError {
    /// Failed to create a GPU resource.
    #[error("resource creation failed: {0}")]
    ResourceCreation(String),
    /// A texture's underlying GPU resource is not realized yet.
    #[error("texture resource not ready")]
    ResourceNotReady,
    /// The compositor produced no input frame when one was required.
    #[error("no compositor frame available")]
    FrameUnavailable,
    /// A named render target was expected but absent.
    #[error("render target missing: {0}")]
    MissingTarget(&'static str),
    /// The host scene failed to render a capture request.
    #[error("scene capture failed: {0}")]
    SceneCapture(String),
    /// An invalid parameter was provided.
    #[error("invalid parameter: {0}")]
    InvalidParameter(String),
    /// An internal error occurred.
    #[error("internal error: {0}")]
    Internal(String),
}
