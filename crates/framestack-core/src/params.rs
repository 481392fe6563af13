//! Crop and export parameter validation.
//!
//! Raw values arrive from form inputs and persisted storage, so anything can
//! show up: out-of-range numbers, `NaN`, strings, nothing at all. [`validate`]
//! turns them into a legal [`CropParameters`] and never fails; each correction
//! it makes is reported as an [`Adjustment`] the caller may surface as a
//! non-blocking notice.
//!
//! # The crop budget
//!
//! The two crop percentages share a budget: `top + bottom` must stay below
//! 100, otherwise a middle image would be cropped away entirely. When the sum
//! is exceeded, the field the user is currently editing wins and the other
//! one is left alone:
//!
//! - editing top: `top = 99 - bottom`
//! - editing bottom: `bottom = 99 - top`
//! - neither (startup, restored values): both scale down by `99 / (top + bottom)`
//!   and are floored. The floored sum may land below 99; that gap is kept.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Largest value either crop percentage, or their sum, may reach.
pub const MAX_CROP_PERCENT: f64 = 99.0;
/// Lower bound for lossy export quality.
pub const MIN_EXPORT_QUALITY: f64 = 0.1;
/// Upper bound for lossy export quality.
pub const MAX_EXPORT_QUALITY: f64 = 1.0;
/// Quality used when the raw value is missing or not a number.
pub const DEFAULT_EXPORT_QUALITY: f64 = 0.92;

/// Output encoding for the stitched image.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExportFormat {
    /// Lossy JPEG.
    #[default]
    Jpg,
    /// Lossless PNG.
    Png,
    /// WebP.
    Webp,
}

impl ExportFormat {
    /// Parse a format name. Accepts `jpg`, `png` and `webp`, ignoring case
    /// and surrounding whitespace.
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "jpg" => Some(ExportFormat::Jpg),
            "png" => Some(ExportFormat::Png),
            "webp" => Some(ExportFormat::Webp),
            _ => None,
        }
    }

    /// The canonical short name, also used as the file extension.
    pub fn as_str(self) -> &'static str {
        match self {
            ExportFormat::Jpg => "jpg",
            ExportFormat::Png => "png",
            ExportFormat::Webp => "webp",
        }
    }

    /// MIME type of the encoded output.
    pub fn mime_type(self) -> &'static str {
        match self {
            ExportFormat::Jpg => "image/jpeg",
            ExportFormat::Png => "image/png",
            ExportFormat::Webp => "image/webp",
        }
    }

    /// Whether the export quality setting has any effect.
    pub fn is_lossy(self) -> bool {
        !matches!(self, ExportFormat::Png)
    }
}

impl fmt::Display for ExportFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Validated crop and export settings.
///
/// Values of this type produced by [`validate`] always satisfy
/// `crop_top_percent + crop_bottom_percent < 100`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CropParameters {
    /// Percentage of height removed from the top of every image but the first (0 to 99)
    pub crop_top_percent: f64,
    /// Percentage of height removed from the bottom of every image (0 to 99)
    pub crop_bottom_percent: f64,
    /// Output encoding
    pub export_format: ExportFormat,
    /// Lossy encoder quality (0.1 to 1.0), stored but unused for PNG
    pub export_quality: f64,
}

impl Default for CropParameters {
    fn default() -> Self {
        Self {
            crop_top_percent: 0.0,
            crop_bottom_percent: 0.0,
            export_format: ExportFormat::Jpg,
            export_quality: DEFAULT_EXPORT_QUALITY,
        }
    }
}

impl CropParameters {
    /// Create parameters with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Largest top crop allowed with the current bottom crop.
    pub fn remaining_for_top(&self) -> f64 {
        (MAX_CROP_PERCENT - self.crop_bottom_percent).max(0.0)
    }

    /// Largest bottom crop allowed with the current top crop.
    pub fn remaining_for_bottom(&self) -> f64 {
        (MAX_CROP_PERCENT - self.crop_top_percent).max(0.0)
    }

    /// Check an already-built parameter set without correcting it.
    ///
    /// Returns one message per violated rule; empty means the set is usable.
    pub fn problems(&self) -> Vec<String> {
        let mut problems = Vec::new();

        if self.crop_top_percent + self.crop_bottom_percent >= 100.0 {
            problems.push("Total crop percentage cannot exceed 99%".to_string());
        }
        if !(0.0..=MAX_CROP_PERCENT).contains(&self.crop_top_percent)
            || !(0.0..=MAX_CROP_PERCENT).contains(&self.crop_bottom_percent)
        {
            problems.push("Crop percentages must be between 0 and 99".to_string());
        }
        if !(MIN_EXPORT_QUALITY..=MAX_EXPORT_QUALITY).contains(&self.export_quality) {
            problems.push("Export quality must be between 0.1 and 1.0".to_string());
        }

        problems
    }

    /// Shorthand for `problems().is_empty()`.
    pub fn is_valid(&self) -> bool {
        self.problems().is_empty()
    }

    /// Turn validated values back into raw input, e.g. to re-run validation.
    pub fn to_raw(&self) -> RawParameters {
        RawParameters {
            crop_top_percent: Some(RawValue::Number(self.crop_top_percent)),
            crop_bottom_percent: Some(RawValue::Number(self.crop_bottom_percent)),
            export_format: Some(self.export_format.as_str().to_string()),
            export_quality: Some(RawValue::Number(self.export_quality)),
        }
    }
}

/// A raw numeric input: either already a number or the text of an input field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RawValue {
    Number(f64),
    Text(String),
}

impl RawValue {
    /// The value as a finite number, if it is one.
    ///
    /// Text is read like a form field: leading whitespace is skipped and the
    /// longest numeric prefix is used, so `"12.5%"` reads as `12.5`.
    pub fn as_finite(&self) -> Option<f64> {
        let value = match self {
            RawValue::Number(n) => *n,
            RawValue::Text(s) => parse_leading_number(s)?,
        };
        value.is_finite().then_some(value)
    }
}

impl From<f64> for RawValue {
    fn from(value: f64) -> Self {
        RawValue::Number(value)
    }
}

impl From<&str> for RawValue {
    fn from(value: &str) -> Self {
        RawValue::Text(value.to_string())
    }
}

fn parse_leading_number(text: &str) -> Option<f64> {
    let text = text.trim_start();
    let bytes = text.as_bytes();
    let mut end = 0;

    if end < bytes.len() && (bytes[end] == b'+' || bytes[end] == b'-') {
        end += 1;
    }
    while end < bytes.len() && bytes[end].is_ascii_digit() {
        end += 1;
    }
    if end < bytes.len() && bytes[end] == b'.' {
        end += 1;
        while end < bytes.len() && bytes[end].is_ascii_digit() {
            end += 1;
        }
    }
    // Exponent only counts when digits follow it
    if end < bytes.len() && (bytes[end] == b'e' || bytes[end] == b'E') {
        let mut exp_end = end + 1;
        if exp_end < bytes.len() && (bytes[exp_end] == b'+' || bytes[exp_end] == b'-') {
            exp_end += 1;
        }
        let digits_start = exp_end;
        while exp_end < bytes.len() && bytes[exp_end].is_ascii_digit() {
            exp_end += 1;
        }
        if exp_end > digits_start {
            end = exp_end;
        }
    }

    text[..end].parse::<f64>().ok()
}

/// Unvalidated parameter input. Any field may be missing.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RawParameters {
    pub crop_top_percent: Option<RawValue>,
    pub crop_bottom_percent: Option<RawValue>,
    pub export_format: Option<String>,
    pub export_quality: Option<RawValue>,
}

impl RawParameters {
    /// Raw input made of two crop numbers and default export settings.
    pub fn crops(top: f64, bottom: f64) -> Self {
        Self {
            crop_top_percent: Some(RawValue::Number(top)),
            crop_bottom_percent: Some(RawValue::Number(bottom)),
            ..Self::default()
        }
    }
}

/// The parameter the user is editing while validation runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum AdjustingField {
    CropTop,
    CropBottom,
}

impl AdjustingField {
    /// Parse the identifier a form control reports.
    ///
    /// Accepts the field names (`cropTop`, `cropBottom`) as well as the
    /// input ids (`cropTopPercent`, `cropBottomPercent`, `cropTopSlider`, ...).
    pub fn parse(value: &str) -> Option<Self> {
        if value.starts_with("cropTop") {
            Some(AdjustingField::CropTop)
        } else if value.starts_with("cropBottom") {
            Some(AdjustingField::CropBottom)
        } else {
            None
        }
    }
}

/// A correction [`validate`] applied to the raw input.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum Adjustment {
    /// Quality was missing or not a number.
    QualityDefaulted { value: f64 },
    /// Quality was outside 0.1 to 1.0.
    QualityClamped { from: f64, to: f64 },
    /// A crop value was missing or not a number.
    CropDefaulted { field: AdjustingField },
    /// A crop value was outside 0 to 99.
    CropClamped {
        field: AdjustingField,
        from: f64,
        to: f64,
    },
    /// The edited crop was lowered to fit next to the other one.
    CropLimited {
        field: AdjustingField,
        value: f64,
        other: f64,
    },
    /// Both crops were scaled down proportionally.
    CropsRescaled { top: f64, bottom: f64 },
    /// The export format was not recognised.
    FormatDefaulted { given: String },
}

impl fmt::Display for Adjustment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Adjustment::QualityDefaulted { value } => {
                write!(f, "Export quality missing, using {value}")
            }
            Adjustment::QualityClamped { from, to } => {
                write!(f, "Export quality {from} adjusted to valid range (0.1-1.0): {to}")
            }
            Adjustment::CropDefaulted { field } => {
                write!(f, "{} crop missing, using 0%", field_label(*field))
            }
            Adjustment::CropClamped { field, from, to } => {
                write!(f, "{} crop {from}% adjusted to {to}%", field_label(*field))
            }
            Adjustment::CropLimited {
                field,
                value,
                other,
            } => write!(
                f,
                "{} crop adjusted to maximum setting: {value}% ({} fixed at {other}%)",
                field_label(*field),
                match field {
                    AdjustingField::CropTop => "bottom",
                    AdjustingField::CropBottom => "top",
                }
            ),
            Adjustment::CropsRescaled { top, bottom } => write!(
                f,
                "Crop parameters have been adjusted to valid range: top {top}%, bottom {bottom}%"
            ),
            Adjustment::FormatDefaulted { given } => {
                write!(f, "Unknown export format '{given}', using jpg")
            }
        }
    }
}

fn field_label(field: AdjustingField) -> &'static str {
    match field {
        AdjustingField::CropTop => "Top",
        AdjustingField::CropBottom => "Bottom",
    }
}

/// Result of [`validate`]: the legal parameters plus what was changed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Validated {
    pub params: CropParameters,
    pub adjustments: Vec<Adjustment>,
}

impl Validated {
    /// True when the raw input was already legal.
    pub fn is_unchanged(&self) -> bool {
        self.adjustments.is_empty()
    }
}

/// Validate raw input into legal parameters.
///
/// `adjusting` names the field the user is editing, if any; see the module
/// documentation for how it decides which value absorbs a budget overflow.
///
/// This is a pure function: it never fails and the same input always gives
/// the same output.
pub fn validate(raw: &RawParameters, adjusting: Option<AdjustingField>) -> Validated {
    let mut adjustments = Vec::new();

    let export_quality = match raw.export_quality.as_ref().and_then(RawValue::as_finite) {
        Some(q) => {
            let clamped = q.clamp(MIN_EXPORT_QUALITY, MAX_EXPORT_QUALITY);
            if clamped != q {
                adjustments.push(Adjustment::QualityClamped {
                    from: q,
                    to: clamped,
                });
            }
            clamped
        }
        None => {
            if raw.export_quality.is_some() {
                adjustments.push(Adjustment::QualityDefaulted {
                    value: DEFAULT_EXPORT_QUALITY,
                });
            }
            DEFAULT_EXPORT_QUALITY
        }
    };

    let mut top = crop_value(
        raw.crop_top_percent.as_ref(),
        AdjustingField::CropTop,
        &mut adjustments,
    );
    let mut bottom = crop_value(
        raw.crop_bottom_percent.as_ref(),
        AdjustingField::CropBottom,
        &mut adjustments,
    );

    if top + bottom >= 100.0 {
        match adjusting {
            Some(AdjustingField::CropTop) => {
                top = MAX_CROP_PERCENT - bottom;
                adjustments.push(Adjustment::CropLimited {
                    field: AdjustingField::CropTop,
                    value: top,
                    other: bottom,
                });
            }
            Some(AdjustingField::CropBottom) => {
                bottom = MAX_CROP_PERCENT - top;
                adjustments.push(Adjustment::CropLimited {
                    field: AdjustingField::CropBottom,
                    value: bottom,
                    other: top,
                });
            }
            None => {
                let ratio = MAX_CROP_PERCENT / (top + bottom);
                top = (top * ratio).floor();
                bottom = (bottom * ratio).floor();
                adjustments.push(Adjustment::CropsRescaled { top, bottom });
            }
        }
    }

    let export_format = match raw.export_format.as_deref() {
        Some(name) => ExportFormat::parse(name).unwrap_or_else(|| {
            adjustments.push(Adjustment::FormatDefaulted {
                given: name.to_string(),
            });
            ExportFormat::Jpg
        }),
        None => ExportFormat::Jpg,
    };

    for adjustment in &adjustments {
        log::warn!("{}", adjustment);
    }

    Validated {
        params: CropParameters {
            crop_top_percent: top,
            crop_bottom_percent: bottom,
            export_format,
            export_quality,
        },
        adjustments,
    }
}

fn crop_value(
    raw: Option<&RawValue>,
    field: AdjustingField,
    adjustments: &mut Vec<Adjustment>,
) -> f64 {
    match raw.and_then(RawValue::as_finite) {
        Some(value) => {
            let clamped = value.clamp(0.0, MAX_CROP_PERCENT);
            if clamped != value {
                adjustments.push(Adjustment::CropClamped {
                    field,
                    from: value,
                    to: clamped,
                });
            }
            clamped
        }
        None => {
            if raw.is_some() {
                adjustments.push(Adjustment::CropDefaulted { field });
            }
            0.0
        }
    }
}


// ============================================================================
// Property-Based Tests
// ============================================================================

#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    /// Crop inputs including out-of-range and fractional values.
    fn crop_strategy() -> impl Strategy<Value = f64> {
        prop_oneof![-50.0f64..=200.0, (0u32..=99).prop_map(f64::from)]
    }

    fn field_strategy() -> impl Strategy<Value = Option<AdjustingField>> {
        prop_oneof![
            Just(None),
            Just(Some(AdjustingField::CropTop)),
            Just(Some(AdjustingField::CropBottom)),
        ]
    }

    proptest! {
        /// Property: validated crops are in range and sum below 100.
        #[test]
        fn prop_sum_invariant(
            top in crop_strategy(),
            bottom in crop_strategy(),
            field in field_strategy(),
        ) {
            let params = validate(&RawParameters::crops(top, bottom), field).params;

            prop_assert!((0.0..=99.0).contains(&params.crop_top_percent));
            prop_assert!((0.0..=99.0).contains(&params.crop_bottom_percent));
            prop_assert!(params.crop_top_percent + params.crop_bottom_percent < 100.0);
        }

        /// Property: validation is deterministic.
        #[test]
        fn prop_deterministic(
            top in crop_strategy(),
            bottom in crop_strategy(),
            field in field_strategy(),
        ) {
            let raw = RawParameters::crops(top, bottom);
            prop_assert_eq!(validate(&raw, field), validate(&raw, field));
        }

        /// Property: validating an already validated set changes nothing.
        #[test]
        fn prop_idempotent(
            top in crop_strategy(),
            bottom in crop_strategy(),
            quality in -1.0f64..=2.0,
            field in field_strategy(),
        ) {
            let raw = RawParameters {
                export_quality: Some(quality.into()),
                ..RawParameters::crops(top, bottom)
            };
            let first = validate(&raw, field);
            let second = validate(&first.params.to_raw(), field);

            prop_assert_eq!(first.params, second.params);
            prop_assert!(second.is_unchanged());
        }

        /// Property: the field not being edited is never altered by the budget rule.
        #[test]
        fn prop_other_field_preserved(
            top in 0u32..=99,
            bottom in 0u32..=99,
        ) {
            let (top, bottom) = (f64::from(top), f64::from(bottom));
            let raw = RawParameters::crops(top, bottom);

            let editing_top = validate(&raw, Some(AdjustingField::CropTop)).params;
            prop_assert_eq!(editing_top.crop_bottom_percent, bottom);

            let editing_bottom = validate(&raw, Some(AdjustingField::CropBottom)).params;
            prop_assert_eq!(editing_bottom.crop_top_percent, top);
        }

        /// Property: quality always lands in range.
        #[test]
        fn prop_quality_in_range(quality in any::<f64>()) {
            let raw = RawParameters {
                export_quality: Some(quality.into()),
                ..Default::default()
            };
            let q = validate(&raw, None).params.export_quality;
            prop_assert!((0.1..=1.0).contains(&q));
        }
    }
}
