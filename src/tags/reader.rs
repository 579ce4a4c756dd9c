//! Turns raw metadata values into the display strings drawn on the overlay.
//!
//! Decoding EXIF/IPTC blocks is left to a [`MetadataSource`]; this module only
//! picks the catalog fields, validates and formats them, and reports which
//! tags the image carries.

use crate::tags::catalog::{TagInfo, TagType};
use crate::tags::manager::TagManager;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;

/// Catalog key of the computed "width x height" tag.
pub const SIZE_TAG: &str = "size";
const RECIPROCAL_PREFIX: &str = "1/";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RawTagValue {
    Number(f64),
    Text(String),
    Rational { numerator: f64, denominator: f64 },
}

impl RawTagValue {
    pub fn as_number(&self) -> Option<f64> {
        match self {
            Self::Number(value) => Some(*value),
            Self::Rational {
                numerator,
                denominator,
            } => Some(numerator / denominator),
            Self::Text(text) => text.trim().parse().ok(),
        }
    }

    /// Zero, NaN and empty strings count as missing; rationals are always kept.
    pub fn is_present(&self) -> bool {
        match self {
            Self::Number(value) => *value != 0.0 && !value.is_nan(),
            Self::Text(text) => !text.is_empty(),
            Self::Rational { .. } => true,
        }
    }

    fn display(&self) -> String {
        match self {
            Self::Text(text) => text.clone(),
            other => other.as_number().map(format_number).unwrap_or_default(),
        }
    }
}

pub fn format_number(value: f64) -> String {
    if value.is_nan() {
        return "NaN".to_owned();
    }
    if value.is_infinite() {
        return if value > 0.0 { "Infinity" } else { "-Infinity" }.to_owned();
    }
    if value.fract() == 0.0 && value.abs() < 1e15 {
        return format!("{}", value as i64);
    }
    format!("{value}")
}

/// Applies the catalog prefix/suffix. A prefix ending in `1/` shows the
/// reciprocal of the value, rounded, e.g. an exposure of `0.004` as `1/250`.
pub fn format_tag_value(value: &RawTagValue, info: &TagInfo) -> String {
    let mut output = String::new();
    let mut shown = value.display();

    if let Some(prefix) = info.prefix.as_deref() {
        output.push_str(prefix);
        if prefix.ends_with(RECIPROCAL_PREFIX) {
            match value.as_number() {
                Some(number) => shown = format_number((1.0 / number + 0.5).floor()),
                None => tracing::debug!(value = %shown, "reciprocal prefix on a non-numeric value"),
            }
        }
    }

    output.push_str(&shown);
    if let Some(suffix) = info.suffix.as_deref() {
        output.push_str(suffix);
    }
    output
}

/// Source of raw metadata for one image.
pub trait MetadataSource {
    fn exif(&self, tag_id: &str) -> Option<RawTagValue>;
    fn iptc(&self, tag_id: &str) -> Option<RawTagValue>;
    /// Pixel size of the decoded image.
    fn dimensions(&self) -> Option<(u32, u32)>;
}

/// Metadata held in memory, e.g. read from a JSON sidecar file.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StaticMetadata {
    #[serde(default)]
    pub exif: HashMap<String, RawTagValue>,
    #[serde(default)]
    pub iptc: HashMap<String, RawTagValue>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub width: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub height: Option<u32>,
}

impl StaticMetadata {
    pub fn from_json(content: &str) -> Result<Self> {
        if content.trim().is_empty() {
            return Ok(Self::default());
        }
        serde_json::from_str(content).context("deserialize metadata")
    }

    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("read metadata file {}", path.display()))?;
        Self::from_json(&content).with_context(|| format!("parse metadata file {}", path.display()))
    }

    pub fn with_dimensions(mut self, width: u32, height: u32) -> Self {
        self.width = Some(width);
        self.height = Some(height);
        self
    }
}

impl MetadataSource for StaticMetadata {
    fn exif(&self, tag_id: &str) -> Option<RawTagValue> {
        self.exif.get(tag_id).cloned()
    }

    fn iptc(&self, tag_id: &str) -> Option<RawTagValue> {
        self.iptc.get(tag_id).cloned()
    }

    fn dimensions(&self) -> Option<(u32, u32)> {
        self.width.zip(self.height)
    }
}

/// Formatted value per catalog key for the current image.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TagValues {
    values: HashMap<String, String>,
}

impl TagValues {
    pub fn get(&self, key: &str) -> Option<&str> {
        self.values.get(key).map(String::as_str)
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.values.insert(key.into(), value.into());
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn clear(&mut self) {
        self.values.clear();
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for TagValues {
    fn from_iter<T: IntoIterator<Item = (K, V)>>(iter: T) -> Self {
        let mut values = Self::default();
        for (key, value) in iter {
            values.insert(key, value);
        }
        values
    }
}

/// Reads every catalog tag from `source`, reporting availability to `tags`.
pub fn read_tags(tags: &mut TagManager, source: &dyn MetadataSource) -> TagValues {
    let mut values = TagValues::default();
    let entries: Vec<(String, TagInfo)> = tags
        .catalog()
        .iter()
        .map(|(key, info)| (key.to_owned(), info.clone()))
        .collect();

    for (key, info) in entries {
        let raw = match info.tag_type {
            TagType::Exif => source.exif(&info.tag_id),
            TagType::Iptc => source.iptc(&info.tag_id),
            TagType::Custom => custom_tag_value(&key, source),
            TagType::Unknown => {
                tracing::warn!(tag = %key, "tag type is not supported");
                continue;
            }
        };

        let valid = raw.as_ref().is_some_and(RawTagValue::is_present);
        tags.set_enabled(&key, valid);
        if let (true, Some(raw)) = (valid, raw) {
            values.insert(key, format_tag_value(&raw, &info));
        }
    }

    tracing::debug!(found = values.len(), "read image tags");
    values
}

fn custom_tag_value(key: &str, source: &dyn MetadataSource) -> Option<RawTagValue> {
    match key {
        SIZE_TAG => {
            let dims = source.dimensions();
            let axis = |tag_id: &str, fallback: Option<u32>| {
                source
                    .exif(tag_id)
                    .filter(RawTagValue::is_present)
                    .map(|value| value.display())
                    .or_else(|| fallback.map(|v| v.to_string()))
            };
            let width = axis("ImageWidth", dims.map(|d| d.0))?;
            let height = axis("ImageHeight", dims.map(|d| d.1))?;
            Some(RawTagValue::Text(format!("{width}x{height}")))
        }
        other => {
            tracing::debug!(tag = other, "no reader for custom tag");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tags::catalog::TagCatalog;

    fn info(prefix: Option<&str>, suffix: Option<&str>) -> TagInfo {
        TagInfo {
            icon_type: crate::tags::catalog::IconType::MaterialSymbol,
            icon_id: String::new(),
            name: String::new(),
            desc: String::new(),
            tag_type: TagType::Exif,
            tag_id: String::new(),
            prefix: prefix.map(str::to_owned),
            suffix: suffix.map(str::to_owned),
        }
    }

    #[test]
    fn reciprocal_prefix_inverts_and_rounds() {
        let value = RawTagValue::Number(0.004);
        assert_eq!(format_tag_value(&value, &info(Some("1/"), Some("s"))), "1/250s");

        let rational = RawTagValue::Rational {
            numerator: 1.0,
            denominator: 60.0,
        };
        assert_eq!(format_tag_value(&rational, &info(Some("1/"), None)), "1/60");
    }

    #[test]
    fn plain_prefix_and_suffix_wrap_value() {
        let value = RawTagValue::Number(5.6);
        assert_eq!(format_tag_value(&value, &info(Some("f/"), None)), "f/5.6");
        let iso = RawTagValue::Number(200.0);
        assert_eq!(format_tag_value(&iso, &info(Some("ISO "), None)), "ISO 200");
        let text = RawTagValue::Text("X100V".to_owned());
        assert_eq!(format_tag_value(&text, &info(None, Some("!"))), "X100V!");
    }

    #[test]
    fn zero_and_empty_values_are_missing() {
        assert!(!RawTagValue::Number(0.0).is_present());
        assert!(!RawTagValue::Text(String::new()).is_present());
        assert!(RawTagValue::Text("0".to_owned()).is_present());
    }

    #[test]
    fn read_tags_reports_availability() {
        let catalog = TagCatalog::from_json(
            r#"{
                "camera": { "iconType": "material_symbol", "iconID": "photo_camera", "tagType": "exif", "tagID": "Model" },
                "lens": { "iconType": "material_symbol", "iconID": "lens", "tagType": "exif", "tagID": "LensModel" },
                "title": { "iconType": "material_symbol", "iconID": "title", "tagType": "iptc", "tagID": "caption" },
                "size": { "iconType": "material_symbol", "iconID": "aspect_ratio", "tagType": "custom" },
                "odd": { "iconType": "material_symbol", "iconID": "x", "tagType": "xmp" }
            }"#,
        )
        .expect("catalog");
        let mut tags = TagManager::new(catalog);
        let metadata = StaticMetadata::from_json(
            r#"{
                "exif": { "Model": "X-T5", "LensModel": "", "ImageWidth": 6240 },
                "iptc": { "caption": "Harbour" }
            }"#,
        )
        .expect("metadata")
        .with_dimensions(1200, 800);

        let values = read_tags(&mut tags, &metadata);

        assert_eq!(values.get("camera"), Some("X-T5"));
        assert_eq!(values.get("title"), Some("Harbour"));
        assert_eq!(values.get("size"), Some("6240x800"));
        assert_eq!(values.get("lens"), None);
        assert!(!tags.is_available("lens"));
        assert!(tags.is_available("camera"));
        assert!(tags.is_available("odd"));
    }

    #[test]
    fn number_formatting_matches_display_conventions() {
        assert_eq!(format_number(250.0), "250");
        assert_eq!(format_number(2.8), "2.8");
        assert_eq!(format_number(f64::INFINITY), "Infinity");
    }
}
