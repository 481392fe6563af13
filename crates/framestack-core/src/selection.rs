//! The host's image selection.
//!
//! The host application owns the selection; this module only describes what
//! a selected item looks like, detects when the selection changed between
//! polls and sanity-checks it before a stitch.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Most images a single stitch accepts.
pub const MAX_SELECTION: usize = 50;

/// File extensions the decoder handles.
pub const SUPPORTED_EXTENSIONS: [&str; 6] = ["jpg", "jpeg", "png", "webp", "bmp", "gif"];

/// One item of the host's selection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SelectedImage {
    pub id: String,
    #[serde(default)]
    pub name: String,
    /// File extension without the dot, any case.
    #[serde(default)]
    pub ext: String,
    #[serde(default)]
    pub width: Option<u32>,
    #[serde(default)]
    pub height: Option<u32>,
    /// Where the full-size file can be read from.
    #[serde(default, rename = "fileURL")]
    pub file_url: Option<String>,
    #[serde(default, rename = "thumbnailURL")]
    pub thumbnail_url: Option<String>,
}

impl SelectedImage {
    /// Whether the extension is one the decoder handles.
    pub fn is_supported(&self) -> bool {
        let ext = self.ext.to_ascii_lowercase();
        SUPPORTED_EXTENSIONS.contains(&ext.as_str())
    }
}

/// The host could not report its selection.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SelectionError {
    #[error("Selection API not available")]
    Unavailable,

    #[error("Failed to get selected images: {0}")]
    Query(String),
}

/// Something that can report the current selection.
pub trait SelectionSource {
    fn selected(&self) -> Result<Vec<SelectedImage>, SelectionError>;
}

/// Detects selection changes between polls.
///
/// Two selections are the same when their ordered id lists are equal, so a
/// reorder counts as a change.
#[derive(Debug, Clone, Default)]
pub struct SelectionTracker {
    last_ids: Option<Vec<String>>,
}

impl SelectionTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Query `source` and return the selection only if it changed since the
    /// previous poll. The very first poll always reports.
    pub fn poll_once<S: SelectionSource + ?Sized>(
        &mut self,
        source: &S,
    ) -> Result<Option<Vec<SelectedImage>>, SelectionError> {
        let items = source.selected()?;
        let ids: Vec<String> = items.iter().map(|item| item.id.clone()).collect();
        Ok(self.observe(ids).then_some(items))
    }

    /// Record an id list and report whether it differs from the last one.
    pub fn observe(&mut self, ids: Vec<String>) -> bool {
        if self.last_ids.as_ref() == Some(&ids) {
            return false;
        }
        log::debug!("selection changed: {} items", ids.len());
        self.last_ids = Some(ids);
        true
    }

    /// Forget the last selection so the next poll reports again.
    pub fn reset(&mut self) {
        self.last_ids = None;
    }

    /// The id list from the last reported change.
    pub fn last_ids(&self) -> Option<&[String]> {
        self.last_ids.as_deref()
    }
}

/// Why a selection cannot be stitched.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Error)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum SelectionIssue {
    #[error("No images selected")]
    NoImages,

    #[error("Too many images selected (maximum {max})")]
    TooMany { count: usize, max: usize },

    #[error("Invalid image formats detected: {count} files")]
    UnsupportedFormat { count: usize },
}

/// Check a selection before stitching. Empty means it can go ahead.
pub fn validate_selection(items: &[SelectedImage]) -> Vec<SelectionIssue> {
    let mut issues = Vec::new();

    if items.is_empty() {
        issues.push(SelectionIssue::NoImages);
    }
    if items.len() > MAX_SELECTION {
        issues.push(SelectionIssue::TooMany {
            count: items.len(),
            max: MAX_SELECTION,
        });
    }
    let unsupported = items.iter().filter(|item| !item.is_supported()).count();
    if unsupported > 0 {
        issues.push(SelectionIssue::UnsupportedFormat { count: unsupported });
    }

    issues
}

/// Identity of an image set, used as a decode cache key.
pub fn selection_key(items: &[SelectedImage]) -> String {
    items
        .iter()
        .map(|item| item.id.as_str())
        .collect::<Vec<_>>()
        .join(",")
}
