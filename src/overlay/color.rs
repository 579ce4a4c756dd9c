use serde::{Deserialize, Serialize};

/// Alpha below which a decoration is treated as invisible and not drawn.
pub const ALPHA_EPSILON: f64 = 0.01;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct ThemeColor {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl ThemeColor {
    pub const WHITE: Self = Self::rgba(255, 255, 255, 255);
    pub const BLACK: Self = Self::rgba(0, 0, 0, 255);
    pub const TRANSPARENT: Self = Self::rgba(0, 0, 0, 0);

    pub const fn rgba(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    pub fn with_alpha(self, alpha: f64) -> Self {
        Self {
            a: unit_to_u8(alpha),
            ..self
        }
    }

    /// Alpha in the `0.0..=1.0` range.
    pub fn alpha(self) -> f64 {
        self.a as f64 / 255.0
    }

    pub fn is_visible(self) -> bool {
        self.alpha() > ALPHA_EPSILON
    }

    pub fn to_rgba_array(self) -> [u8; 4] {
        [self.r, self.g, self.b, self.a]
    }

    /// Parses the CSS color notations used by theme files: `#rgb`, `#rgba`,
    /// `#rrggbb`, `#rrggbbaa`, `rgb(...)`, `rgba(...)` and a set of named colors.
    pub fn parse(input: &str) -> Option<Self> {
        let s = input.trim();
        if s.is_empty() {
            return None;
        }
        if let Some(hex) = s.strip_prefix('#') {
            return parse_hex(hex);
        }
        let lower = s.to_ascii_lowercase();
        if let Some(args) = function_args(&lower, "rgba").or_else(|| function_args(&lower, "rgb")) {
            return parse_rgb_function(args);
        }
        named_color(&lower)
    }

    pub fn to_css_string(self) -> String {
        if self.a == 255 {
            format!("rgb({}, {}, {})", self.r, self.g, self.b)
        } else {
            let alpha = (self.alpha() * 100.0).round() / 100.0;
            format!("rgba({}, {}, {}, {})", self.r, self.g, self.b, alpha)
        }
    }
}

fn unit_to_u8(value: f64) -> u8 {
    (value.clamp(0.0, 1.0) * 255.0).round() as u8
}

fn parse_hex(hex: &str) -> Option<ThemeColor> {
    if !hex.chars().all(|c| c.is_ascii_hexdigit()) {
        return None;
    }
    let nibble = |i: usize| u8::from_str_radix(&hex[i..i + 1], 16).ok().map(|v| v * 17);
    let byte = |i: usize| u8::from_str_radix(&hex[i..i + 2], 16).ok();
    match hex.len() {
        3 => Some(ThemeColor::rgba(nibble(0)?, nibble(1)?, nibble(2)?, 255)),
        4 => Some(ThemeColor::rgba(nibble(0)?, nibble(1)?, nibble(2)?, nibble(3)?)),
        6 => Some(ThemeColor::rgba(byte(0)?, byte(2)?, byte(4)?, 255)),
        8 => Some(ThemeColor::rgba(byte(0)?, byte(2)?, byte(4)?, byte(6)?)),
        _ => None,
    }
}

fn function_args<'a>(s: &'a str, name: &str) -> Option<&'a str> {
    let rest = s.strip_prefix(name)?.trim_start();
    rest.strip_prefix('(')?.strip_suffix(')')
}

fn parse_rgb_function(args: &str) -> Option<ThemeColor> {
    let parts: Vec<&str> = args
        .split(|c: char| c == ',' || c == '/' || c.is_whitespace())
        .filter(|p| !p.is_empty())
        .collect();
    if parts.len() != 3 && parts.len() != 4 {
        return None;
    }
    let channel = |p: &str| -> Option<u8> {
        if let Some(pct) = p.strip_suffix('%') {
            let v: f64 = pct.parse().ok()?;
            Some(unit_to_u8(v / 100.0))
        } else {
            let v: f64 = p.parse().ok()?;
            Some(v.clamp(0.0, 255.0).round() as u8)
        }
    };
    let alpha = match parts.get(3) {
        Some(p) => {
            if let Some(pct) = p.strip_suffix('%') {
                unit_to_u8(pct.parse::<f64>().ok()? / 100.0)
            } else {
                unit_to_u8(p.parse::<f64>().ok()?)
            }
        }
        None => 255,
    };
    Some(ThemeColor::rgba(
        channel(parts[0])?,
        channel(parts[1])?,
        channel(parts[2])?,
        alpha,
    ))
}

fn named_color(name: &str) -> Option<ThemeColor> {
    let rgb = |r, g, b| Some(ThemeColor::rgba(r, g, b, 255));
    match name {
        "transparent" => Some(ThemeColor::TRANSPARENT),
        "white" => rgb(255, 255, 255),
        "black" => rgb(0, 0, 0),
        "red" => rgb(255, 0, 0),
        "green" => rgb(0, 128, 0),
        "lime" => rgb(0, 255, 0),
        "blue" => rgb(0, 0, 255),
        "yellow" => rgb(255, 255, 0),
        "orange" => rgb(255, 165, 0),
        "purple" => rgb(128, 0, 128),
        "magenta" | "fuchsia" => rgb(255, 0, 255),
        "cyan" | "aqua" => rgb(0, 255, 255),
        "gray" | "grey" => rgb(128, 128, 128),
        "silver" => rgb(192, 192, 192),
        "lightgray" | "lightgrey" => rgb(211, 211, 211),
        "darkgray" | "darkgrey" => rgb(169, 169, 169),
        "navy" => rgb(0, 0, 128),
        "teal" => rgb(0, 128, 128),
        "maroon" => rgb(128, 0, 0),
        "olive" => rgb(128, 128, 0),
        "gold" => rgb(255, 215, 0),
        "pink" => rgb(255, 192, 203),
        "brown" => rgb(165, 42, 42),
        "beige" => rgb(245, 245, 220),
        "ivory" => rgb(255, 255, 240),
        "whitesmoke" => rgb(245, 245, 245),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::ThemeColor;

    #[test]
    fn parses_rgba_function_with_fractional_alpha() {
        let color = ThemeColor::parse("rgba(0,0,0, 0.45)").expect("rgba color");
        assert_eq!(color, ThemeColor::rgba(0, 0, 0, 115));
        assert!((color.alpha() - 0.45).abs() < 0.01);
    }

    #[test]
    fn parses_hex_variants() {
        assert_eq!(ThemeColor::parse("#fff"), Some(ThemeColor::WHITE));
        assert_eq!(
            ThemeColor::parse("#11223344"),
            Some(ThemeColor::rgba(0x11, 0x22, 0x33, 0x44))
        );
        assert_eq!(ThemeColor::parse("#12345"), None);
        assert_eq!(ThemeColor::parse("#zzz"), None);
    }

    #[test]
    fn parses_named_colors_case_insensitively() {
        assert_eq!(ThemeColor::parse("White"), Some(ThemeColor::WHITE));
        assert_eq!(ThemeColor::parse("transparent").map(|c| c.a), Some(0));
        assert_eq!(ThemeColor::parse("not-a-color"), None);
    }

    #[test]
    fn zero_alpha_is_not_visible() {
        let color = ThemeColor::parse("rgba(10, 20, 30, 0)").expect("rgba color");
        assert!(!color.is_visible());
        assert!(ThemeColor::BLACK.is_visible());
    }

    #[test]
    fn css_string_round_trips() {
        let color = ThemeColor::rgba(12, 34, 56, 128);
        assert_eq!(ThemeColor::parse(&color.to_css_string()), Some(color));
        assert_eq!(ThemeColor::WHITE.to_css_string(), "rgb(255, 255, 255)");
    }
}
