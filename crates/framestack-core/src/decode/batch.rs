//! Decoding a whole selection at once.

use super::{decode_image, DecodedImage};

/// Decode every source, dropping the ones that fail.
///
/// `None` entries stand for sources the caller could not fetch at all. The
/// surviving images keep the relative order of their sources, so the stitch
/// order matches the selection order even when some images are missing.
pub fn decode_batch<'a, I>(sources: I) -> Vec<DecodedImage>
where
    I: IntoIterator<Item = Option<&'a [u8]>>,
{
    let mut decoded = Vec::new();
    let mut total = 0usize;

    for (index, source) in sources.into_iter().enumerate() {
        total += 1;
        let Some(bytes) = source else {
            log::warn!("image {} has no data, skipping", index + 1);
            continue;
        };

        match decode_image(bytes) {
            Ok(img) => decoded.push(img),
            Err(e) => log::warn!("image {} failed to decode: {}", index + 1, e),
        }
    }

    log::debug!("decoded {}/{} images", decoded.len(), total);
    decoded
}
