//! Stitch session state.
//!
//! A [`StitchSession`] is everything the plugin window keeps between user
//! actions: the current parameters, decoded images for the current
//! selection, the running stitch (if any) and the last good preview.
//!
//! Only one stitch may run at a time. [`StitchSession::begin`] hands out a
//! [`StitchTicket`]; rendering requires the current ticket, and
//! [`StitchSession::cancel`] turns the outstanding one stale so a result for
//! an outdated selection is never shown.

use chrono::{DateTime, Utc};

use crate::compose::compose;
use crate::decode::DecodedImage;
use crate::encode::encode;
use crate::error::StitchError;
use crate::export::{suggested_filename, ExportArtifact, ExportError, ExportSink};
use crate::layout::{compute_layout, ImageGeometry, StitchLayout};
use crate::params::{validate, Adjustment, AdjustingField, CropParameters, RawParameters};

/// Proof that the holder runs the current stitch.
///
/// Not `Clone`: [`StitchSession::finish`] consumes it.
#[derive(Debug, PartialEq, Eq)]
pub struct StitchTicket {
    id: u64,
}

impl StitchTicket {
    pub fn id(&self) -> u64 {
        self.id
    }
}

/// The last successfully composed canvas.
#[derive(Debug, Clone)]
pub struct Preview {
    pub canvas: DecodedImage,
    pub layout: StitchLayout,
    /// Parameters the canvas was composed with.
    pub params: CropParameters,
}

#[derive(Debug)]
struct ImageCache {
    key: String,
    images: Vec<DecodedImage>,
}

/// State of one stitching window.
#[derive(Debug, Default)]
pub struct StitchSession {
    params: CropParameters,
    cache: Option<ImageCache>,
    active: Option<u64>,
    next_ticket: u64,
    preview: Option<Preview>,
}

impl StitchSession {
    /// Start a session with already validated parameters, e.g. the ones
    /// restored from storage.
    pub fn new(params: CropParameters) -> Self {
        Self {
            params,
            ..Self::default()
        }
    }

    pub fn parameters(&self) -> &CropParameters {
        &self.params
    }

    /// Validate and adopt new raw values.
    ///
    /// Fields missing from `raw` keep their current value. Returns the
    /// corrections made, for display as notices.
    pub fn update_parameters(
        &mut self,
        raw: &RawParameters,
        adjusting: Option<AdjustingField>,
    ) -> Vec<Adjustment> {
        let current = self.params.to_raw();
        let merged = RawParameters {
            crop_top_percent: raw.crop_top_percent.clone().or(current.crop_top_percent),
            crop_bottom_percent: raw
                .crop_bottom_percent
                .clone()
                .or(current.crop_bottom_percent),
            export_format: raw.export_format.clone().or(current.export_format),
            export_quality: raw.export_quality.clone().or(current.export_quality),
        };

        let validated = validate(&merged, adjusting);
        self.params = validated.params;
        validated.adjustments
    }

    /// Claim the single stitch slot.
    ///
    /// # Errors
    ///
    /// `StitchError::Busy` while another ticket is outstanding.
    pub fn begin(&mut self) -> Result<StitchTicket, StitchError> {
        if self.active.is_some() {
            return Err(StitchError::Busy);
        }
        self.next_ticket += 1;
        self.active = Some(self.next_ticket);
        Ok(StitchTicket {
            id: self.next_ticket,
        })
    }

    /// Release the stitch slot.
    ///
    /// A stale ticket (one invalidated by [`cancel`](Self::cancel)) is
    /// rejected and leaves the slot as it is.
    pub fn finish(&mut self, ticket: StitchTicket) -> Result<(), StitchError> {
        self.check(&ticket)?;
        self.active = None;
        Ok(())
    }

    /// Invalidate the outstanding ticket, if any, and free the slot.
    pub fn cancel(&mut self) {
        if let Some(id) = self.active.take() {
            log::debug!("stitch {} cancelled", id);
        }
    }

    pub fn is_busy(&self) -> bool {
        self.active.is_some()
    }

    /// Compose `images` with the current parameters and keep the result as
    /// the preview.
    ///
    /// On any error the previous preview stays in place.
    pub fn render_preview(
        &mut self,
        ticket: &StitchTicket,
        images: &[DecodedImage],
    ) -> Result<&Preview, StitchError> {
        self.check(ticket)?;
        let preview = build_preview(images, self.params)?;
        Ok(self.preview.insert(preview))
    }

    /// Like [`render_preview`](Self::render_preview), using the cached
    /// images. Used when only the parameters changed.
    ///
    /// # Errors
    ///
    /// `StitchError::NoValidImages` when nothing is cached.
    pub fn render_cached_preview(
        &mut self,
        ticket: &StitchTicket,
    ) -> Result<&Preview, StitchError> {
        self.check(ticket)?;
        let images = match &self.cache {
            Some(cache) => cache.images.as_slice(),
            None => return Err(StitchError::NoValidImages),
        };
        let preview = build_preview(images, self.params)?;
        Ok(self.preview.insert(preview))
    }

    /// Cache `images` under `key`, then render them as the preview.
    ///
    /// A stale ticket is rejected before the cache is touched.
    pub fn render_and_cache(
        &mut self,
        ticket: &StitchTicket,
        key: impl Into<String>,
        images: Vec<DecodedImage>,
    ) -> Result<&Preview, StitchError> {
        self.check(ticket)?;
        self.cache_images(key, images);
        self.render_cached_preview(ticket)
    }

    /// Remember decoded images for the image set identified by `key`,
    /// replacing whatever was cached before.
    pub fn cache_images(&mut self, key: impl Into<String>, images: Vec<DecodedImage>) {
        let key = key.into();
        log::debug!("caching {} decoded images for [{}]", images.len(), key);
        self.cache = Some(ImageCache { key, images });
    }

    /// Cached images, if they were decoded for exactly this image set.
    pub fn cached_images(&self, key: &str) -> Option<&[DecodedImage]> {
        self.cache
            .as_ref()
            .filter(|cache| cache.key == key)
            .map(|cache| cache.images.as_slice())
    }

    pub fn invalidate_cache(&mut self) {
        self.cache = None;
    }

    pub fn preview(&self) -> Option<&Preview> {
        self.preview.as_ref()
    }

    pub fn clear_preview(&mut self) {
        self.preview = None;
    }

    /// Encode the preview with the current export format and quality.
    ///
    /// # Errors
    ///
    /// `StitchError::NoPreview` if nothing was rendered yet.
    pub fn export(&self, now: DateTime<Utc>) -> Result<ExportArtifact, StitchError> {
        let preview = self.preview.as_ref().ok_or(StitchError::NoPreview)?;
        let output = encode(
            &preview.canvas,
            self.params.export_format,
            self.params.export_quality,
        )?;
        let filename = suggested_filename(self.params.export_format, now);

        log::info!("exported {} ({} bytes)", filename, output.bytes.len());
        Ok(ExportArtifact { output, filename })
    }

    /// [`export`](Self::export), then hand the artifact to `sink`.
    pub fn export_to<K: ExportSink + ?Sized>(
        &self,
        sink: &mut K,
        now: DateTime<Utc>,
    ) -> Result<ExportArtifact, ExportError> {
        let artifact = self.export(now)?;
        sink.write(&artifact)?;
        Ok(artifact)
    }

    fn check(&self, ticket: &StitchTicket) -> Result<(), StitchError> {
        if self.active == Some(ticket.id) {
            Ok(())
        } else {
            Err(StitchError::StaleTicket(ticket.id))
        }
    }
}

fn build_preview(
    images: &[DecodedImage],
    params: CropParameters,
) -> Result<Preview, StitchError> {
    let geometry: Vec<ImageGeometry> = images.iter().map(DecodedImage::geometry).collect();
    let layout = compute_layout(&geometry, &params)?;
    let canvas = compose(images, &layout)?;
    Ok(Preview {
        canvas,
        layout,
        params,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::export::SinkError;
    use crate::params::{ExportFormat, RawValue};
    use chrono::TimeZone;

    fn solid(width: u32, height: u32, value: u8) -> DecodedImage {
        DecodedImage::new(width, height, vec![value; (width * height * 4) as usize])
    }

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 10, 19, 12, 0, 0).unwrap()
    }

    struct RefusingSink;

    impl ExportSink for RefusingSink {
        fn write(&mut self, artifact: &ExportArtifact) -> Result<(), SinkError> {
            Err(SinkError {
                filename: artifact.filename.clone(),
                message: "library is read-only".to_string(),
            })
        }
    }

    #[test]
    fn test_single_stitch_at_a_time() {
        let mut session = StitchSession::default();
        let ticket = session.begin().unwrap();
        assert!(matches!(session.begin(), Err(StitchError::Busy)));

        session.finish(ticket).unwrap();
        assert!(!session.is_busy());
        assert!(session.begin().is_ok());
    }

    #[test]
    fn test_cancel_makes_ticket_stale() {
        let mut session = StitchSession::default();
        let old = session.begin().unwrap();
        session.cancel();

        let result = session.render_preview(&old, &[solid(2, 2, 9)]);
        assert!(matches!(result, Err(StitchError::StaleTicket(1))));
        assert!(session.preview().is_none());

        let fresh = session.begin().unwrap();
        assert!(matches!(session.finish(old), Err(StitchError::StaleTicket(1))));
        assert!(session.is_busy());
        session.finish(fresh).unwrap();
    }

    #[test]
    fn test_render_preview() {
        let mut session = StitchSession::default();
        let ticket = session.begin().unwrap();
        let images = [solid(100, 300, 1), solid(200, 300, 2), solid(150, 300, 3)];
        let preview = session.render_preview(&ticket, &images).unwrap();

        assert_eq!((preview.canvas.width, preview.canvas.height), (200, 900));
        assert_eq!(preview.layout.blits.len(), 3);
    }

    #[test]
    fn test_failed_render_keeps_previous_preview() {
        let mut session = StitchSession::default();
        let ticket = session.begin().unwrap();
        session.render_preview(&ticket, &[solid(4, 4, 7)]).unwrap();

        let result = session.render_preview(&ticket, &[]);
        assert!(matches!(result, Err(StitchError::NoValidImages)));

        let kept = session.preview().unwrap();
        assert_eq!((kept.canvas.width, kept.canvas.height), (4, 4));
    }

    #[test]
    fn test_parameter_update_merges_and_validates() {
        let mut session = StitchSession::default();
        let notices = session.update_parameters(
            &RawParameters::crops(60.0, 50.0),
            Some(AdjustingField::CropTop),
        );
        assert_eq!(notices.len(), 1);
        assert_eq!(session.parameters().crop_top_percent, 49.0);
        assert_eq!(session.parameters().crop_bottom_percent, 50.0);

        let format_only = RawParameters {
            export_format: Some("png".to_string()),
            ..Default::default()
        };
        assert!(session.update_parameters(&format_only, None).is_empty());
        assert_eq!(session.parameters().crop_top_percent, 49.0);
        assert_eq!(session.parameters().export_format, ExportFormat::Png);
    }

    #[test]
    fn test_crop_change_reuses_cache() {
        let mut session = StitchSession::default();
        session.cache_images("a,b", vec![solid(10, 100, 1), solid(10, 100, 2)]);
        assert!(session.cached_images("a,b").is_some());
        assert!(session.cached_images("b,a").is_none());

        let ticket = session.begin().unwrap();
        let raw = RawParameters {
            crop_top_percent: Some(RawValue::Number(10.0)),
            crop_bottom_percent: Some(RawValue::Number(10.0)),
            ..Default::default()
        };
        session.update_parameters(&raw, None);
        let preview = session.render_cached_preview(&ticket).unwrap();
        // 90 rows from the first image, 80 from the second
        assert_eq!(preview.canvas.height, 170);
        assert_eq!(preview.params.crop_top_percent, 10.0);

        session.invalidate_cache();
        assert!(matches!(
            session.render_cached_preview(&ticket),
            Err(StitchError::NoValidImages)
        ));
    }

    #[test]
    fn test_render_and_cache() {
        let mut session = StitchSession::default();
        let ticket = session.begin().unwrap();
        let preview = session
            .render_and_cache(&ticket, "a", vec![solid(3, 4, 1)])
            .unwrap();
        assert_eq!(preview.canvas.height, 4);
        assert!(session.cached_images("a").is_some());
    }

    #[test]
    fn test_stale_ticket_leaves_cache_alone() {
        let mut session = StitchSession::default();
        session.cache_images("old", vec![solid(2, 2, 1)]);
        let stale = session.begin().unwrap();
        session.cancel();

        let result = session.render_and_cache(&stale, "new", vec![solid(2, 2, 2)]);
        assert!(matches!(result, Err(StitchError::StaleTicket(1))));
        assert!(session.cached_images("old").is_some());
        assert!(session.cached_images("new").is_none());
    }

    #[test]
    fn test_export_without_preview() {
        let session = StitchSession::default();
        let err = session.export(now()).unwrap_err();
        assert!(matches!(err, StitchError::NoPreview));
        assert_eq!(err.to_string(), "No preview available. Generate a preview first.");
    }

    #[test]
    fn test_export_uses_current_format() {
        let mut session = StitchSession::default();
        let ticket = session.begin().unwrap();
        session.render_preview(&ticket, &[solid(8, 8, 200)]).unwrap();
        session.finish(ticket).unwrap();

        session.update_parameters(
            &RawParameters {
                export_format: Some("webp".to_string()),
                ..Default::default()
            },
            None,
        );
        let artifact = session.export(now()).unwrap();
        assert_eq!(artifact.output.mime_type, "image/webp");
        assert_eq!(artifact.filename, "stitched_image_2026-10-19T12-00-00.webp");
    }

    #[test]
    fn test_export_to_sink() {
        let mut session = StitchSession::default();
        let ticket = session.begin().unwrap();
        session.render_preview(&ticket, &[solid(8, 8, 200)]).unwrap();

        let mut saved: Vec<ExportArtifact> = Vec::new();
        let artifact = session.export_to(&mut saved, now()).unwrap();
        assert_eq!(saved, vec![artifact]);

        let err = session.export_to(&mut RefusingSink, now()).unwrap_err();
        assert!(matches!(err, ExportError::Sink(_)));
        assert!(err.to_string().ends_with("library is read-only"));
    }
}
