//! Pixel composition of a stitch layout.
//!
//! The canvas starts fully transparent. Each blit copies whole source rows to
//! the left edge of the canvas, so an image narrower than the canvas leaves
//! the rest of its rows transparent.

use crate::decode::DecodedImage;
use crate::error::StitchError;
use crate::layout::{Blit, StitchLayout};

/// Compose the images into one canvas following `layout`.
///
/// `images` must be the same list (same order) the layout was computed from.
/// Blits are applied strictly in layout order.
///
/// # Errors
///
/// - `StitchError::MissingSource` if a blit names an image that is not in
///   `images`
/// - `StitchError::SourceMismatch` if an image is shorter than its blit's
///   rows, wider than the canvas, or a blit runs past the canvas bottom
///
/// All checks run before any pixel is copied, so there is never a
/// partially composed result.
///
/// # Example
///
/// ```
/// use framestack_core::compose::compose;
/// use framestack_core::decode::DecodedImage;
/// use framestack_core::layout::compute_layout;
/// use framestack_core::CropParameters;
///
/// let images = vec![
///     DecodedImage::new(2, 2, vec![255u8; 2 * 2 * 4]),
///     DecodedImage::new(1, 2, vec![128u8; 1 * 2 * 4]),
/// ];
/// let geometry: Vec<_> = images.iter().map(|i| i.geometry()).collect();
/// let layout = compute_layout(&geometry, &CropParameters::default()).unwrap();
/// let canvas = compose(&images, &layout).unwrap();
/// assert_eq!((canvas.width, canvas.height), (2, 4));
/// ```
pub fn compose(
    images: &[DecodedImage],
    layout: &StitchLayout,
) -> Result<DecodedImage, StitchError> {
    for blit in &layout.blits {
        let Some(source) = images.get(blit.descriptor_index) else {
            return Err(StitchError::MissingSource {
                index: blit.descriptor_index,
                available: images.len(),
            });
        };
        check_blit(source, blit, layout)?;
    }

    let mut canvas = DecodedImage::transparent(layout.canvas_width, layout.canvas_height);
    let dst_stride = canvas.row_stride();

    for blit in &layout.blits {
        let source = &images[blit.descriptor_index];
        let src_stride = source.row_stride();
        let rows = source.rows(blit.src_y, blit.src_height);

        // Copy pixel data row by row; rows are left-aligned
        for (row, src_row) in rows.chunks_exact(src_stride.max(1)).enumerate() {
            let dst_start = (blit.dest_y as usize + row) * dst_stride;
            canvas.pixels[dst_start..dst_start + src_stride].copy_from_slice(src_row);
        }
    }

    log::debug!(
        "composed {} blits into {}x{}",
        layout.blits.len(),
        canvas.width,
        canvas.height
    );
    Ok(canvas)
}

fn check_blit(
    source: &DecodedImage,
    blit: &Blit,
    layout: &StitchLayout,
) -> Result<(), StitchError> {
    let mismatch = |reason: String| StitchError::SourceMismatch {
        index: blit.descriptor_index,
        reason,
    };

    let src_end = u64::from(blit.src_y) + u64::from(blit.src_height);
    if src_end > u64::from(source.height) {
        return Err(mismatch(format!(
            "rows {}..{} requested from an image {} rows tall",
            blit.src_y, src_end, source.height
        )));
    }
    if source.width > layout.canvas_width {
        return Err(mismatch(format!(
            "width {} exceeds canvas width {}",
            source.width, layout.canvas_width
        )));
    }
    if source.pixels.len() != source.row_stride() * source.height as usize {
        return Err(mismatch(format!(
            "buffer holds {} bytes, expected {}",
            source.pixels.len(),
            source.row_stride() * source.height as usize
        )));
    }
    let dest_end = u64::from(blit.dest_y) + u64::from(blit.src_height);
    if dest_end > u64::from(layout.canvas_height) {
        return Err(mismatch(format!(
            "ends at row {} of a {} row canvas",
            dest_end, layout.canvas_height
        )));
    }
    Ok(())
}


// ============================================================================
// Property-Based Tests
// ============================================================================
