//! Export artifacts and file naming.

use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::encode::StitchOutput;
use crate::error::StitchError;
use crate::params::ExportFormat;

/// Name prefix for exported files.
pub const FILENAME_PREFIX: &str = "stitched_image";

/// An encoded stitch ready to be handed to the host.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportArtifact {
    pub output: StitchOutput,
    pub filename: String,
}

/// The host refused an export.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Failed to save {filename}: {message}")]
pub struct SinkError {
    pub filename: String,
    pub message: String,
}

/// Failure of [`crate::session::StitchSession::export_to`].
#[derive(Debug, Error)]
pub enum ExportError {
    #[error(transparent)]
    Stitch(#[from] StitchError),

    #[error(transparent)]
    Sink(#[from] SinkError),
}

/// Destination for exported images (host library, disk, ...).
pub trait ExportSink {
    fn write(&mut self, artifact: &ExportArtifact) -> Result<(), SinkError>;
}

/// Collects artifacts in memory.
impl ExportSink for Vec<ExportArtifact> {
    fn write(&mut self, artifact: &ExportArtifact) -> Result<(), SinkError> {
        self.push(artifact.clone());
        Ok(())
    }
}

/// Default file name for an export made at `now`.
///
/// The timestamp is the UTC time to the second, with `:` replaced by `-` so
/// the name is valid on every file system:
/// `stitched_image_2026-03-14T09-26-53.webp`.
pub fn suggested_filename(format: ExportFormat, now: DateTime<Utc>) -> String {
    format!(
        "{}_{}.{}",
        FILENAME_PREFIX,
        now.format("%Y-%m-%dT%H-%M-%S"),
        format.as_str()
    )
}

/// Make a user-supplied name safe to use as a file name.
///
/// Characters reserved on common file systems and runs of whitespace become
/// `_`, repeated underscores collapse to one and a leading or trailing `_` is
/// dropped.
pub fn safe_filename(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    for c in name.chars() {
        let c = match c {
            '<' | '>' | ':' | '"' | '/' | '\\' | '|' | '?' | '*' => '_',
            c if c.is_whitespace() => '_',
            c => c,
        };
        if c == '_' && out.ends_with('_') {
            continue;
        }
        out.push(c);
    }

    let out = out.strip_prefix('_').unwrap_or(&out);
    let out = out.strip_suffix('_').unwrap_or(out);
    out.to_string()
}
