use crate::overlay::color::ThemeColor;
use anyhow::{Context, Result};
use hashlink::LinkedHashMap;
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::path::Path;

pub const DEFAULT_THEME_NAME: &str = "default";

/// Theme as stored in the themes file, colors still in CSS notation.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ThemeSpec {
    #[serde(default = "default_background")]
    pub background: String,
    #[serde(default = "default_text")]
    pub text: String,
    #[serde(default = "default_icon")]
    pub icon: String,
    #[serde(default = "default_text_font")]
    pub text_font: String,
    #[serde(default = "default_decorations")]
    pub decorations: String,
    #[serde(default = "default_draw_icon_background")]
    pub draw_icon_background: bool,
    #[serde(default = "default_border_width")]
    pub border_width: f64,
    #[serde(default = "default_shadow_blur")]
    pub shadow_blur: f64,
    #[serde(default = "default_shadow_color")]
    pub shadow_color: String,
    #[serde(default)]
    pub blur: f64,
}

impl Default for ThemeSpec {
    fn default() -> Self {
        Self {
            background: default_background(),
            text: default_text(),
            icon: default_icon(),
            text_font: default_text_font(),
            decorations: default_decorations(),
            draw_icon_background: default_draw_icon_background(),
            border_width: default_border_width(),
            shadow_blur: default_shadow_blur(),
            shadow_color: default_shadow_color(),
            blur: 0.0,
        }
    }
}

fn default_background() -> String {
    "rgba(0,0,0,0.45)".to_owned()
}

fn default_text() -> String {
    "white".to_owned()
}

fn default_icon() -> String {
    "white".to_owned()
}

fn default_text_font() -> String {
    "\"M PLUS 1 Code\"".to_owned()
}

fn default_decorations() -> String {
    "rgba(0,0,0, 0.45)".to_owned()
}

fn default_draw_icon_background() -> bool {
    true
}

fn default_border_width() -> f64 {
    6.0
}

fn default_shadow_blur() -> f64 {
    10.0
}

fn default_shadow_color() -> String {
    "rgba(0,0,0, 0.5)".to_owned()
}

static DEFAULT_THEME: Lazy<Theme> = Lazy::new(|| Theme::from_spec(&ThemeSpec::default()));

/// Active theme with every color converted once at activation time.
#[derive(Debug, Clone, PartialEq)]
pub struct Theme {
    pub background: ThemeColor,
    pub text: ThemeColor,
    pub icon: ThemeColor,
    pub decorations: ThemeColor,
    pub shadow_color: ThemeColor,
    pub text_font: String,
    pub draw_icon_background: bool,
    pub border_width: f64,
    pub shadow_blur: f64,
    pub blur: f64,
}

impl Default for Theme {
    fn default() -> Self {
        DEFAULT_THEME.clone()
    }
}

impl Theme {
    pub fn from_spec(spec: &ThemeSpec) -> Self {
        let fallback = ThemeSpec::default();
        let color = |field: &str, value: &str, fallback: &str| -> ThemeColor {
            ThemeColor::parse(value).unwrap_or_else(|| {
                tracing::warn!(field, value, "invalid theme color; using default");
                ThemeColor::parse(fallback).unwrap_or(ThemeColor::WHITE)
            })
        };
        Self {
            background: color("background", &spec.background, &fallback.background),
            text: color("text", &spec.text, &fallback.text),
            icon: color("icon", &spec.icon, &fallback.icon),
            decorations: color("decorations", &spec.decorations, &fallback.decorations),
            shadow_color: color("shadowColor", &spec.shadow_color, &fallback.shadow_color),
            text_font: spec.text_font.clone(),
            draw_icon_background: spec.draw_icon_background,
            border_width: spec.border_width,
            shadow_blur: spec.shadow_blur,
            blur: spec.blur,
        }
    }

    pub fn to_spec(&self) -> ThemeSpec {
        ThemeSpec {
            background: self.background.to_css_string(),
            text: self.text.to_css_string(),
            icon: self.icon.to_css_string(),
            text_font: self.text_font.clone(),
            decorations: self.decorations.to_css_string(),
            draw_icon_background: self.draw_icon_background,
            border_width: self.border_width,
            shadow_blur: self.shadow_blur,
            shadow_color: self.shadow_color.to_css_string(),
            blur: self.blur,
        }
    }
}

/// Named themes in file order, exactly one of them current.
#[derive(Debug, Clone)]
pub struct ThemeStore {
    themes: LinkedHashMap<String, ThemeSpec>,
    current_name: String,
    current: Theme,
}

impl Default for ThemeStore {
    fn default() -> Self {
        let mut themes = LinkedHashMap::new();
        themes.insert(DEFAULT_THEME_NAME.to_owned(), ThemeSpec::default());
        Self {
            themes,
            current_name: DEFAULT_THEME_NAME.to_owned(),
            current: Theme::default(),
        }
    }
}

impl ThemeStore {
    pub fn from_specs(themes: LinkedHashMap<String, ThemeSpec>) -> Self {
        if themes.is_empty() {
            tracing::warn!("theme list is empty; using the built-in theme");
            return Self::default();
        }
        let mut store = Self {
            themes,
            current_name: String::new(),
            current: Theme::default(),
        };
        if let Some(first) = store.themes.keys().next().cloned() {
            store.set_current(&first);
        }
        store
    }

    pub fn from_json(content: &str) -> Result<Self> {
        if content.trim().is_empty() {
            return Ok(Self::default());
        }
        let themes: LinkedHashMap<String, ThemeSpec> =
            serde_json::from_str(content).context("deserialize themes")?;
        Ok(Self::from_specs(themes))
    }

    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("read themes file {}", path.display()))?;
        Self::from_json(&content).with_context(|| format!("parse themes file {}", path.display()))
    }

    /// Swaps in the named theme. Unknown names leave the current theme as is.
    pub fn set_current(&mut self, name: &str) -> bool {
        let Some(spec) = self.themes.get(name) else {
            tracing::warn!(theme = name, "no theme with this name");
            return false;
        };
        self.current = Theme::from_spec(spec);
        self.current_name = name.to_owned();
        true
    }

    pub fn current(&self) -> &Theme {
        &self.current
    }

    /// Live edits to the current theme; they are not written back to the list.
    pub fn current_mut(&mut self) -> &mut Theme {
        &mut self.current
    }

    pub fn current_name(&self) -> &str {
        &self.current_name
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.themes.keys().map(String::as_str)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.themes.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.themes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.themes.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::{Theme, ThemeSpec, ThemeStore, DEFAULT_THEME_NAME};
    use crate::overlay::color::ThemeColor;

    const THEMES: &str = r##"{
        "zeta": { "background": "#102030", "text": "black" },
        "alpha": { "background": "rgba(255,255,255,0.2)", "decorations": "rgba(0,0,0,0)" }
    }"##;

    #[test]
    fn first_theme_in_file_order_becomes_current() {
        let store = ThemeStore::from_json(THEMES).expect("themes");
        assert_eq!(store.current_name(), "zeta");
        assert_eq!(store.names().collect::<Vec<_>>(), vec!["zeta", "alpha"]);
        assert_eq!(
            store.current().background,
            ThemeColor::rgba(0x10, 0x20, 0x30, 255)
        );
        assert_eq!(store.current().text, ThemeColor::BLACK);
    }

    #[test]
    fn switching_converts_all_colors() {
        let mut store = ThemeStore::from_json(THEMES).expect("themes");
        assert!(store.set_current("alpha"));
        assert_eq!(store.current().background, ThemeColor::rgba(255, 255, 255, 51));
        assert!(!store.current().decorations.is_visible());
        assert_eq!(store.current().text, ThemeColor::WHITE);
    }

    #[test]
    fn unknown_theme_keeps_current() {
        let mut store = ThemeStore::from_json(THEMES).expect("themes");
        assert!(!store.set_current("missing"));
        assert_eq!(store.current_name(), "zeta");
    }

    #[test]
    fn empty_theme_file_falls_back_to_builtin() {
        let store = ThemeStore::from_json("{}").expect("themes");
        assert_eq!(store.current_name(), DEFAULT_THEME_NAME);
        assert_eq!(store.current(), &Theme::default());

        let blank = ThemeStore::from_json("  ").expect("themes");
        assert_eq!(blank.len(), 1);
    }

    #[test]
    fn invalid_color_uses_default_field_value() {
        let spec = ThemeSpec {
            text: "definitely not a color".to_owned(),
            ..ThemeSpec::default()
        };
        assert_eq!(Theme::from_spec(&spec).text, ThemeColor::WHITE);
    }
}
