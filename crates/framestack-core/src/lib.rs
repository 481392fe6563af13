//! Framestack Core - crop-and-stitch engine
//!
//! This crate turns an ordered sequence of images (typically film frames or
//! screenshots with subtitles) into one tall image: every image but the
//! first loses a percentage off its top, every image loses a percentage off
//! its bottom, and the remaining strips are stacked top to bottom.
//!
//! The pipeline is:
//!
//! 1. [`params::validate`] the raw user input into [`CropParameters`]
//! 2. [`layout::compute_layout`] the canvas size and blit list
//! 3. [`compose::compose`] the pixels
//! 4. [`encode::encode`] to JPEG, PNG or WebP
//!
//! [`stitch`] runs steps 2 to 4 in one call. [`session::StitchSession`]
//! keeps the state an interactive front end needs between those steps.

pub mod compose;
pub mod decode;
pub mod encode;
pub mod error;
pub mod export;
pub mod layout;
pub mod loader;
pub mod params;
pub mod schedule;
pub mod selection;
pub mod session;
pub mod storage;

pub use decode::{decode_image, DecodedImage};
pub use encode::StitchOutput;
pub use error::{LayoutError, StitchError};
pub use layout::{compute_layout, Blit, ImageGeometry, StitchLayout, MAX_CANVAS_DIMENSION};
pub use params::{validate, AdjustingField, Adjustment, CropParameters, ExportFormat, RawParameters};
pub use session::StitchSession;

/// Crop, stack and encode `images` in one go.
///
/// Uses `params.export_format` and `params.export_quality` for the output.
///
/// # Errors
///
/// Any [`StitchError`] from layout, composition or encoding. Nothing is
/// returned on failure; there is no partial output.
pub fn stitch(
    images: &[DecodedImage],
    params: &CropParameters,
) -> Result<StitchOutput, StitchError> {
    let geometry: Vec<ImageGeometry> = images.iter().map(DecodedImage::geometry).collect();
    let layout = compute_layout(&geometry, params)?;
    let canvas = compose::compose(images, &layout)?;
    let output = encode::encode(&canvas, params.export_format, params.export_quality)?;

    log::info!(
        "stitched {} of {} images into {}x{} {}",
        layout.contributing_images(),
        images.len(),
        output.width,
        output.height,
        output.format
    );
    Ok(output)
}

/// Crate version, as reported to the host.
pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
