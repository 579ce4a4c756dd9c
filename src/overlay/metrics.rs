use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// `sqrt(2)` rounded the way badge geometry has always been computed.
pub const SQRT_2: f64 = 1.4142;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct ShadowOffset {
    pub x: f64,
    pub y: f64,
}

/// Styling constants shared by every badge drawn in a frame.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Metrics {
    /// Tag icon size in pixels at scale 1.0.
    #[serde(default = "default_icon_size")]
    pub icon_size: f64,
    /// Added to the diameter of the icon circle.
    #[serde(default)]
    pub icon_background_margin: f64,
    /// Vector icons are authored on a `svg_icon_size` square.
    #[serde(default = "default_svg_icon_size")]
    pub svg_icon_size: f64,
    #[serde(default = "default_text_size")]
    pub text_size: f64,
    #[serde(default = "default_text_margin")]
    pub text_margin: f64,
    /// Vertical gap between two badges.
    #[serde(default = "default_line_spacing")]
    pub line_spacing: f64,
    #[serde(default = "default_text_shadow_offset")]
    pub text_shadow_offset: ShadowOffset,
}

impl Default for Metrics {
    fn default() -> Self {
        Self {
            icon_size: default_icon_size(),
            icon_background_margin: 0.0,
            svg_icon_size: default_svg_icon_size(),
            text_size: default_text_size(),
            text_margin: default_text_margin(),
            line_spacing: default_line_spacing(),
            text_shadow_offset: default_text_shadow_offset(),
        }
    }
}

impl Metrics {
    /// Overwrites the fields named in `overrides`. Unknown keys are ignored;
    /// a value of the wrong type leaves every field untouched.
    pub fn apply_overrides(&mut self, overrides: &Map<String, Value>) -> Result<()> {
        let mut current = serde_json::to_value(&*self).context("serialize current metrics")?;
        let Some(fields) = current.as_object_mut() else {
            return Ok(());
        };

        for (key, value) in overrides {
            if fields.contains_key(key) {
                fields.insert(key.clone(), value.clone());
            } else {
                tracing::debug!(key = %key, "ignoring unknown metric override");
            }
        }

        let updated: Metrics =
            serde_json::from_value(current).context("deserialize overridden metrics")?;
        *self = updated;
        Ok(())
    }
}

fn default_icon_size() -> f64 {
    46.0
}

fn default_svg_icon_size() -> f64 {
    24.0
}

fn default_text_size() -> f64 {
    32.0
}

fn default_text_margin() -> f64 {
    10.0
}

fn default_line_spacing() -> f64 {
    5.0
}

fn default_text_shadow_offset() -> ShadowOffset {
    ShadowOffset { x: 3.0, y: 3.0 }
}
