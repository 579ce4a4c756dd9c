use anyhow::{Context, Result};
use hashlink::LinkedHashMap;
use serde::{Deserialize, Serialize};
use std::path::Path;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum IconType {
    /// Glyph from the icon font, `icon_id` names the glyph.
    MaterialSymbol,
    /// Vector icon file, `icon_id` is its path.
    LocalSvg,
    #[serde(other)]
    Unknown,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum TagType {
    Exif,
    Iptc,
    /// Computed from other fields, see `tags::reader`.
    Custom,
    #[serde(other)]
    Unknown,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TagInfo {
    #[serde(rename = "iconType")]
    pub icon_type: IconType,
    #[serde(rename = "iconID", default)]
    pub icon_id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub desc: String,
    #[serde(rename = "tagType")]
    pub tag_type: TagType,
    #[serde(rename = "tagID", default)]
    pub tag_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prefix: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub suffix: Option<String>,
}

/// Supported tags in declaration order. Keys starting with `_` are disabled
/// entries and never enter the catalog.
#[derive(Debug, Clone, Default)]
pub struct TagCatalog {
    tags: LinkedHashMap<String, TagInfo>,
}

impl TagCatalog {
    pub fn from_entries(entries: LinkedHashMap<String, TagInfo>) -> Self {
        let tags = entries
            .into_iter()
            .filter(|(key, _)| !key.starts_with('_'))
            .collect();
        Self { tags }
    }

    pub fn from_json(content: &str) -> Result<Self> {
        let entries: LinkedHashMap<String, TagInfo> =
            serde_json::from_str(content).context("deserialize tag catalog")?;
        let catalog = Self::from_entries(entries);
        for (key, info) in catalog.iter() {
            if info.icon_type == IconType::Unknown {
                tracing::warn!(tag = %key, "icon type is not supported");
            }
        }
        Ok(catalog)
    }

    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("read tag catalog {}", path.display()))?;
        Self::from_json(&content).with_context(|| format!("parse tag catalog {}", path.display()))
    }

    pub fn get(&self, key: &str) -> Option<&TagInfo> {
        self.tags.get(key)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.tags.contains_key(key)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &TagInfo)> {
        self.tags.iter().map(|(key, info)| (key.as_str(), info))
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.tags.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.tags.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tags.is_empty()
    }
}
