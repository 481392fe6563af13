//! Stitch layout computation.
//!
//! Given the geometry of each image and the crop settings, work out the size
//! of the output canvas and which rows of which image land where. No pixels
//! are touched here, so the layout can be computed (and shown to the user)
//! before anything is decoded.
//!
//! # Cropping rules
//!
//! - The first image keeps its top edge and loses only the bottom crop.
//! - Every later image loses both the top and the bottom crop.
//! - Crop amounts are `round(height * percent / 100)` rows.
//! - An image left with no rows contributes nothing, without failing.
//!
//! Images are stacked top to bottom in input order and left-aligned; the
//! canvas is as wide as the widest image.

use serde::{Deserialize, Serialize};

use crate::error::{LayoutError, StitchError};
use crate::params::CropParameters;

/// Largest width or height a canvas may have.
///
/// This is the addressable limit of common 2D raster backends, browser
/// canvases included.
pub const MAX_CANVAS_DIMENSION: u32 = 32767;

/// Native pixel dimensions of one input image.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageGeometry {
    pub width: u32,
    pub height: u32,
}

impl ImageGeometry {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }
}

/// One copy operation: rows `src_y..src_y + src_height` of image
/// `descriptor_index` go to row `dest_y` of the canvas.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Blit {
    pub descriptor_index: usize,
    pub src_y: u32,
    pub src_height: u32,
    pub dest_y: u32,
}

/// Canvas size plus the ordered blit list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StitchLayout {
    pub canvas_width: u32,
    pub canvas_height: u32,
    pub blits: Vec<Blit>,
}

impl StitchLayout {
    /// Number of images that contribute rows.
    pub fn contributing_images(&self) -> usize {
        self.blits.len()
    }
}

fn crop_rows(height: u32, percent: f64) -> i64 {
    (f64::from(height) * (percent / 100.0)).round() as i64
}

/// Rows kept from one image, as `(first_row, row_count)`.
///
/// Returns `None` when the crop leaves nothing.
pub fn crop_span(index: usize, height: u32, params: &CropParameters) -> Option<(u32, u32)> {
    let top = if index == 0 {
        0
    } else {
        crop_rows(height, params.crop_top_percent)
    };
    let bottom = crop_rows(height, params.crop_bottom_percent);
    let kept = i64::from(height) - top - bottom;

    if kept <= 0 {
        return None;
    }
    Some((top as u32, kept as u32))
}

/// Compute the canvas size and blit list for a stitch.
///
/// # Errors
///
/// - `StitchError::NoValidImages` if the list is empty or every image is
///   cropped away
/// - `StitchError::Layout` if either canvas side is zero or larger than
///   [`MAX_CANVAS_DIMENSION`]
pub fn compute_layout(
    images: &[ImageGeometry],
    params: &CropParameters,
) -> Result<StitchLayout, StitchError> {
    let mut blits = Vec::with_capacity(images.len());
    let mut dest_y: u64 = 0;

    for (index, geometry) in images.iter().enumerate() {
        let Some((src_y, src_height)) = crop_span(index, geometry.height, params) else {
            log::debug!(
                "image {} ({}x{}) cropped away entirely, skipping",
                index + 1,
                geometry.width,
                geometry.height
            );
            continue;
        };

        blits.push(Blit {
            descriptor_index: index,
            src_y,
            src_height,
            // Saturates only past the ceiling, which is rejected below
            dest_y: dest_y.min(u64::from(u32::MAX)) as u32,
        });
        dest_y += u64::from(src_height);
    }

    if blits.is_empty() {
        return Err(StitchError::NoValidImages);
    }

    let canvas_width = images.iter().map(|g| g.width).max().unwrap_or(0);
    let canvas_height = dest_y;

    if canvas_height > u64::from(MAX_CANVAS_DIMENSION) || canvas_width > MAX_CANVAS_DIMENSION {
        return Err(LayoutError::CanvasTooLarge {
            width: canvas_width,
            height: canvas_height.min(u64::from(u32::MAX)) as u32,
            max: MAX_CANVAS_DIMENSION,
        }
        .into());
    }
    let canvas_height = canvas_height as u32;
    if canvas_width == 0 || canvas_height == 0 {
        return Err(LayoutError::EmptyCanvas {
            width: canvas_width,
            height: canvas_height,
        }
        .into());
    }

    log::debug!(
        "layout: {} of {} images on a {}x{} canvas",
        blits.len(),
        images.len(),
        canvas_width,
        canvas_height
    );

    Ok(StitchLayout {
        canvas_width,
        canvas_height,
        blits,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn crops(top: f64, bottom: f64) -> CropParameters {
        CropParameters {
            crop_top_percent: top,
            crop_bottom_percent: bottom,
            ..Default::default()
        }
    }

    fn blit(descriptor_index: usize, src_y: u32, src_height: u32, dest_y: u32) -> Blit {
        Blit {
            descriptor_index,
            src_y,
            src_height,
            dest_y,
        }
    }

    fn geoms(sizes: &[(u32, u32)]) -> Vec<ImageGeometry> {
        sizes.iter().map(|&(w, h)| ImageGeometry::new(w, h)).collect()
    }

    #[test]
    fn test_three_images_ten_percent() {
        let images = geoms(&[(300, 100), (300, 200), (300, 150)]);
        let layout = compute_layout(&images, &crops(10.0, 10.0)).unwrap();

        assert_eq!(layout.canvas_width, 300);
        assert_eq!(layout.canvas_height, 370);
        assert_eq!(
            layout.blits,
            vec![
                blit(0, 0, 90, 0),
                blit(1, 20, 160, 90),
                blit(2, 15, 120, 250),
            ]
        );
    }

    #[test]
    fn test_first_image_never_top_cropped() {
        let images = geoms(&[(10, 100)]);
        let layout = compute_layout(&images, &crops(90.0, 0.0)).unwrap();

        assert_eq!(layout.blits[0].src_y, 0);
        assert_eq!(layout.canvas_height, 100);
    }

    #[test]
    fn test_single_pixel_row_is_valid() {
        let images = geoms(&[(50, 100)]);
        let layout = compute_layout(&images, &crops(0.0, 99.0)).unwrap();

        assert_eq!(layout.canvas_height, 1);
        assert_eq!(layout.blits.len(), 1);
    }

    #[test]
    fn test_all_cropped_away_is_no_valid_images() {
        // A half-row bottom crop rounds up and eats each 1-row image
        let images = geoms(&[(10, 1), (10, 1)]);
        let result = compute_layout(&images, &crops(49.0, 50.0));
        assert!(matches!(result, Err(StitchError::NoValidImages)));
    }

    #[test]
    fn test_empty_input_is_no_valid_images() {
        let result = compute_layout(&[], &CropParameters::default());
        assert!(matches!(result, Err(StitchError::NoValidImages)));
    }

    #[test]
    fn test_cropped_away_image_is_skipped() {
        // Middle image: 2 rows, 40% top and bottom each round to 1 row
        let images = geoms(&[(10, 10), (10, 2), (10, 10)]);
        let layout = compute_layout(&images, &crops(40.0, 40.0)).unwrap();

        let indices: Vec<usize> = layout.blits.iter().map(|b| b.descriptor_index).collect();
        assert_eq!(indices, vec![0, 2]);
        assert_eq!(layout.canvas_height, 6 + 2);
        assert_eq!(layout.blits[1].dest_y, 6);
    }

    #[test]
    fn test_width_is_max_of_all_images() {
        let images = geoms(&[(100, 10), (250, 10), (80, 10)]);
        let layout = compute_layout(&images, &CropParameters::default()).unwrap();
        assert_eq!(layout.canvas_width, 250);
    }

    #[test]
    fn test_skipped_image_still_counts_for_width() {
        let images = geoms(&[(100, 10), (400, 1)]);
        let layout = compute_layout(&images, &crops(50.0, 49.0)).unwrap();
        assert_eq!(layout.blits.len(), 1);
        assert_eq!(layout.canvas_width, 400);
    }

    #[test]
    fn test_height_over_ceiling() {
        let images = geoms(&[(100, 20000), (100, 20000)]);
        let result = compute_layout(&images, &CropParameters::default());
        assert!(matches!(
            result,
            Err(StitchError::Layout(LayoutError::CanvasTooLarge { height: 40000, .. }))
        ));
    }

    #[test]
    fn test_width_over_ceiling() {
        let images = geoms(&[(40000, 10)]);
        let result = compute_layout(&images, &CropParameters::default());
        assert!(matches!(
            result,
            Err(StitchError::Layout(LayoutError::CanvasTooLarge { width: 40000, .. }))
        ));
    }

    #[test]
    fn test_exact_ceiling_is_allowed() {
        let images = geoms(&[(MAX_CANVAS_DIMENSION, MAX_CANVAS_DIMENSION)]);
        let layout = compute_layout(&images, &CropParameters::default()).unwrap();
        assert_eq!(layout.canvas_height, MAX_CANVAS_DIMENSION);
    }

    #[test]
    fn test_zero_width_is_empty_canvas() {
        let images = geoms(&[(0, 10)]);
        let result = compute_layout(&images, &CropParameters::default());
        assert!(matches!(
            result,
            Err(StitchError::Layout(LayoutError::EmptyCanvas { width: 0, .. }))
        ));
    }

    #[test]
    fn test_crop_span_rounds_half_up() {
        // 15 * 10% = 1.5 rows, rounds to 2
        let params = crops(10.0, 10.0);
        assert_eq!(crop_span(1, 15, &params), Some((2, 11)));
        assert_eq!(crop_span(0, 15, &params), Some((0, 13)));
    }

    #[test]
    fn test_layout_serializes_camel_case() {
        let layout = compute_layout(&geoms(&[(4, 4)]), &CropParameters::default()).unwrap();
        let json = serde_json::to_value(&layout).unwrap();
        assert_eq!(json["canvasWidth"], 4);
        assert_eq!(json["blits"][0]["srcHeight"], 4);
    }
}

// ============================================================================
// Property-Based Tests
// ============================================================================
