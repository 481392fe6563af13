//! Error types for the stitch pipeline.

use thiserror::Error;

use crate::encode::EncodeError;

/// The computed canvas cannot be allocated.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LayoutError {
    /// One side exceeds what a raster surface can address.
    #[error("Canvas size {width}x{height} exceeds maximum {max}")]
    CanvasTooLarge { width: u32, height: u32, max: u32 },

    /// One side is zero.
    #[error("Canvas dimensions must be positive, got {width}x{height}")]
    EmptyCanvas { width: u32, height: u32 },
}

/// Errors that abort a stitch attempt.
///
/// Each variant is distinct so the UI can pick its own message; none of
/// them leaves partial output behind.
#[derive(Debug, Error)]
pub enum StitchError {
    /// No image survived loading or cropping.
    #[error("No valid images to stitch")]
    NoValidImages,

    /// The canvas size is out of bounds.
    #[error(transparent)]
    Layout(#[from] LayoutError),

    /// The output encoder failed.
    #[error(transparent)]
    Encode(#[from] EncodeError),

    /// A blit refers to an image that was not passed in.
    #[error("Layout refers to image {index} but only {available} were supplied")]
    MissingSource { index: usize, available: usize },

    /// A supplied image does not fit the blit computed for it.
    #[error("Image {index} does not match the layout: {reason}")]
    SourceMismatch { index: usize, reason: String },

    /// Another stitch is already running.
    #[error("A stitch operation is already in progress")]
    Busy,

    /// The ticket does not belong to the running stitch.
    #[error("Stitch ticket {0} is no longer current")]
    StaleTicket(u64),

    /// Export was requested before any preview was rendered.
    #[error("No preview available. Generate a preview first.")]
    NoPreview,
}

impl StitchError {
    /// Short machine-readable tag, stable across releases.
    pub fn kind(&self) -> &'static str {
        match self {
            StitchError::NoValidImages => "noValidImages",
            StitchError::Layout(_) => "layout",
            StitchError::Encode(_) => "encode",
            StitchError::MissingSource { .. } => "missingSource",
            StitchError::SourceMismatch { .. } => "sourceMismatch",
            StitchError::Busy => "busy",
            StitchError::StaleTicket(_) => "staleTicket",
            StitchError::NoPreview => "noPreview",
        }
    }
}
