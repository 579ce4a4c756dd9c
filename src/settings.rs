use anyhow::{Context, Result};
use hashlink::LinkedHashMap;
use kurbo::Vec2;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::path::{Path, PathBuf};

pub const CONFIG_FILE: &str = "json/ep_config.json";
pub const THEMES_FILE: &str = "json/ep_themes.json";
pub const TAGS_FILE: &str = "json/ep_tags_data.json";
pub const FONTS_DIR: &str = "fonts";

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Default)]
pub struct OverlayOffset {
    pub x: f64,
    pub y: f64,
}

impl From<OverlayOffset> for Vec2 {
    fn from(offset: OverlayOffset) -> Self {
        Vec2::new(offset.x, offset.y)
    }
}

impl From<Vec2> for OverlayOffset {
    fn from(v: Vec2) -> Self {
        Self { x: v.x, y: v.y }
    }
}

/// Initial view of a bundled example image.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ExampleView {
    #[serde(default)]
    pub offset: OverlayOffset,
    #[serde(default = "default_scale")]
    pub scale: f64,
    #[serde(default)]
    pub theme: String,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metrics: Option<Map<String, Value>>,
}

fn default_scale() -> f64 {
    1.0
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(rename_all = "camelCase")]
pub struct AppConfig {
    /// Tags selected on startup, top to bottom.
    #[serde(default)]
    pub default_tags: Vec<String>,
    /// Example image path to its initial view, in file order.
    #[serde(default)]
    pub examples: LinkedHashMap<String, ExampleView>,
}

impl AppConfig {
    pub fn from_json(content: &str) -> Result<Self> {
        if content.trim().is_empty() {
            return Ok(Self::default());
        }
        serde_json::from_str(content).context("deserialize configuration")
    }

    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("read configuration {}", path.display()))?;
        Self::from_json(&content)
            .with_context(|| format!("parse configuration {}", path.display()))
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)
            .with_context(|| format!("write configuration {}", path.display()))?;
        Ok(())
    }

    pub fn example(&self, path: &str) -> Option<&ExampleView> {
        self.examples.get(path)
    }
}

/// Layout of a resource directory. Vector icon ids in the tag catalog are
/// relative to `root`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resources {
    pub root: PathBuf,
}

impl Resources {
    pub fn from_dir(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn config_path(&self) -> PathBuf {
        self.root.join(CONFIG_FILE)
    }

    pub fn themes_path(&self) -> PathBuf {
        self.root.join(THEMES_FILE)
    }

    pub fn tags_path(&self) -> PathBuf {
        self.root.join(TAGS_FILE)
    }

    pub fn fonts_dir(&self) -> PathBuf {
        self.root.join(FONTS_DIR)
    }

    pub fn icon_root(&self) -> &Path {
        &self.root
    }

    pub fn resolve(&self, relative: &str) -> PathBuf {
        self.root.join(relative)
    }
}

#[cfg(test)]
mod tests {
    use super::{AppConfig, Resources};
    use kurbo::Vec2;

    #[test]
    fn parses_examples_in_file_order() {
        let config = AppConfig::from_json(
            r#"{
                "defaultTags": ["camera", "lens"],
                "examples": {
                    "images/b.jpg": { "offset": {"x": 10, "y": 20}, "scale": 0.5, "theme": "dark", "tags": ["iso"] },
                    "images/a.jpg": { "offset": {"x": 0, "y": 0}, "scale": 1.2, "theme": "light", "tags": [],
                                      "metrics": { "textSize": 40 } }
                }
            }"#,
        )
        .expect("config");

        assert_eq!(config.default_tags, vec!["camera", "lens"]);
        let keys: Vec<_> = config.examples.keys().cloned().collect();
        assert_eq!(keys, vec!["images/b.jpg", "images/a.jpg"]);
        let b = config.example("images/b.jpg").expect("example");
        assert_eq!(Vec2::from(b.offset), Vec2::new(10.0, 20.0));
        assert!(b.metrics.is_none());
        assert!(config.example("images/a.jpg").and_then(|a| a.metrics.as_ref()).is_some());
    }

    #[test]
    fn empty_config_is_default() {
        assert_eq!(AppConfig::from_json("  ").expect("config"), AppConfig::default());
    }

    #[test]
    fn save_then_load_keeps_config() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("config.json");
        let config = AppConfig::from_json(r#"{"defaultTags": ["iso"]}"#).expect("config");
        config.save(&path).expect("save");
        assert_eq!(AppConfig::load(&path).expect("load"), config);
    }

    #[test]
    fn resource_paths_are_rooted() {
        let resources = Resources::from_dir("/srv/ep");
        assert!(resources.config_path().ends_with("json/ep_config.json"));
        assert!(resources.fonts_dir().ends_with("fonts"));
        assert_eq!(resources.resolve("icons/x.svg"), resources.root.join("icons/x.svg"));
    }
}
