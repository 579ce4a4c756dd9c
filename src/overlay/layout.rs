//! Badge layout for the metadata overlay.
//!
//! A badge is an icon circle followed by a pill shaped caption box. Badges are
//! stacked top to bottom in selection order, `line_spacing` apart.

use crate::overlay::icon::IconSet;
use crate::overlay::metrics::{Metrics, SQRT_2};
use crate::overlay::surface::{Filter, FontSpec, LineCap, StrokeStyle, Surface, TextAnchor};
use crate::overlay::theme::Theme;
use crate::tags::catalog::{IconType, TagCatalog};
use crate::tags::reader::TagValues;
use kurbo::{Affine, Arc, BezPath, Point, Rect, Vec2};
use std::f64::consts::{FRAC_PI_2, PI};

pub const ICON_FONT_FAMILY: &str = "Material Symbols Outlined";
const ICON_STROKE_WIDTH: f64 = 2.0;
const ARC_TOLERANCE: f64 = 0.1;
const MIN_BORDER_WIDTH: f64 = 0.5;
const MIN_BLUR: f64 = 0.01;

/// One laid out tag.
#[derive(Debug, Clone, PartialEq)]
pub struct Badge {
    pub key: String,
    /// Area the caption is centered in.
    pub caption: Rect,
    /// Icon circle plus pill.
    pub bounds: Rect,
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct BadgeGeometry {
    center: Point,
    radius: f64,
    box_width: f64,
}

impl BadgeGeometry {
    fn new(origin: Point, text_width: f64, text_height: f64, metrics: &Metrics) -> Self {
        let diameter =
            (metrics.icon_size * SQRT_2 + metrics.icon_background_margin).max(text_height);
        let radius = diameter / 2.0;
        Self {
            center: origin + Vec2::new(radius, radius),
            radius,
            box_width: text_width + metrics.text_margin + metrics.text_size / 2.0,
        }
    }

    fn diameter(&self) -> f64 {
        self.radius * 2.0
    }

    fn caption_rect(&self, text_width: f64, metrics: &Metrics) -> Rect {
        let x = self.center.x + self.radius + metrics.text_margin;
        let y = self.center.y - self.radius;
        Rect::new(x, y, x + text_width, y + self.diameter())
    }

    fn bounds(&self) -> Rect {
        Rect::new(
            self.center.x - self.radius,
            self.center.y - self.radius,
            self.center.x + self.box_width + self.radius,
            self.center.y + self.radius,
        )
    }

    /// `(====)`: top edge, right half circle, bottom edge, left half circle.
    fn pill(&self) -> BezPath {
        let Self {
            center,
            radius,
            box_width,
        } = *self;
        let right = center + Vec2::new(box_width, 0.0);
        let mut path = BezPath::new();
        path.move_to((center.x, center.y - radius));
        path.line_to((right.x, center.y - radius));
        append_arc(&mut path, right, radius, -FRAC_PI_2, PI);
        path.line_to((center.x, center.y + radius));
        append_arc(&mut path, center, radius, FRAC_PI_2, PI);
        path.close_path();
        path
    }

    /// Left half of the icon circle closed into a square on the right.
    fn icon_backplate(&self) -> BezPath {
        let Self { center, radius, .. } = *self;
        let mut path = BezPath::new();
        path.move_to((center.x, center.y + radius));
        append_arc(&mut path, center, radius, FRAC_PI_2, PI);
        path.line_to((center.x + radius, center.y - radius));
        path.line_to((center.x + radius, center.y + radius));
        path.line_to((center.x, center.y + radius));
        path
    }
}

fn append_arc(path: &mut BezPath, center: Point, radius: f64, start_angle: f64, sweep_angle: f64) {
    let arc = Arc {
        center,
        radii: Vec2::new(radius, radius),
        start_angle,
        sweep_angle,
        x_rotation: 0.0,
    };
    path.line_to(center + Vec2::from_angle(start_angle) * radius);
    path.extend(arc.append_iter(ARC_TOLERANCE));
}

/// Icon font glyph text. `U+e412` and `0xe412` name a code point directly;
/// anything else is a ligature name that the font shapes into one glyph.
pub fn glyph_text(icon_id: &str) -> String {
    let hex = icon_id
        .strip_prefix("U+")
        .or_else(|| icon_id.strip_prefix("u+"))
        .or_else(|| icon_id.strip_prefix("0x"));
    hex.and_then(|hex| u32::from_str_radix(hex, 16).ok())
        .and_then(char::from_u32)
        .map(String::from)
        .unwrap_or_else(|| icon_id.to_owned())
}

/// Draws tag badges with the active theme. Only reads its inputs.
pub struct OverlayRenderer<'a> {
    pub theme: &'a Theme,
    pub metrics: &'a Metrics,
    pub catalog: &'a TagCatalog,
    pub icons: &'a IconSet,
}

impl<'a> OverlayRenderer<'a> {
    pub fn new(
        theme: &'a Theme,
        metrics: &'a Metrics,
        catalog: &'a TagCatalog,
        icons: &'a IconSet,
    ) -> Self {
        Self {
            theme,
            metrics,
            catalog,
            icons,
        }
    }

    /// Draws the selected tags that have a value, starting at `origin`.
    pub fn render_tags(
        &self,
        surface: &mut dyn Surface,
        values: &TagValues,
        selected: &[String],
        origin: Point,
    ) -> Vec<Badge> {
        let mut badges = Vec::with_capacity(selected.len());
        let mut line_offset = 0.0;

        for key in selected {
            let Some(value) = values.get(key).filter(|v| !v.is_empty()) else {
                continue;
            };
            let badge = self.render_tag(surface, key, value, origin + Vec2::new(0.0, line_offset));
            line_offset += badge.caption.height() + self.metrics.line_spacing;
            badges.push(badge);
        }

        badges
    }

    pub fn render_tag(&self, surface: &mut dyn Surface, key: &str, value: &str, origin: Point) -> Badge {
        let font = FontSpec::new(&self.theme.text_font, self.metrics.text_size);
        let text = surface.measure_text(value, &font);
        let geometry = BadgeGeometry::new(origin, text.width, text.height(), self.metrics);

        self.render_background(surface, &geometry);

        let caption = geometry.caption_rect(text.width, self.metrics);
        let center = caption.center();
        let shadow = self.metrics.text_shadow_offset;
        surface.save();
        surface.fill_text(
            value,
            &font,
            center + Vec2::new(shadow.x, shadow.y),
            TextAnchor::Center,
            self.theme.shadow_color,
        );
        surface.fill_text(value, &font, center, TextAnchor::Center, self.theme.text);
        surface.restore();

        let inset = (caption.height() - self.metrics.icon_size) / 2.0;
        self.render_icon(surface, key, origin + Vec2::new(inset, inset));

        Badge {
            key: key.to_owned(),
            caption,
            bounds: geometry.bounds(),
        }
    }

    fn render_background(&self, surface: &mut dyn Surface, geometry: &BadgeGeometry) {
        let theme = self.theme;
        let pill = geometry.pill();
        let has_border = theme.border_width >= MIN_BORDER_WIDTH;

        surface.save();

        if has_border && theme.shadow_color.is_visible() {
            if theme.shadow_blur > MIN_BLUR {
                surface.set_filter(Filter::Blur(theme.shadow_blur));
            }
            surface.stroke_path(&pill, &StrokeStyle::new(theme.border_width * 2.0, theme.shadow_color));
            surface.set_filter(Filter::None);
        }

        // The background blur stays on for the outline and backplate.
        if theme.blur > MIN_BLUR {
            surface.set_filter(Filter::Blur(theme.blur));
        }
        surface.fill_path(&pill, theme.background);

        if has_border && theme.decorations.is_visible() {
            surface.save();
            surface.clip(&pill);
            surface.stroke_path(&pill, &StrokeStyle::new(theme.border_width * 2.0, theme.decorations));
            surface.restore();
        }

        if theme.draw_icon_background && theme.decorations.is_visible() {
            surface.fill_path(&geometry.icon_backplate(), theme.decorations);
        }

        surface.restore();
    }

    fn render_icon(&self, surface: &mut dyn Surface, key: &str, origin: Point) {
        let Some(info) = self.catalog.get(key) else {
            tracing::warn!(tag = key, "no catalog entry; icon skipped");
            return;
        };
        let metrics = self.metrics;
        let color = self.theme.icon;

        match info.icon_type {
            IconType::MaterialSymbol => {
                let font = FontSpec::new(ICON_FONT_FAMILY, metrics.icon_size);
                let text = glyph_text(&info.icon_id);
                if !surface.has_glyphs(&text, &font) {
                    tracing::warn!(tag = key, icon = %info.icon_id, "icon font glyph not available; icon skipped");
                    return;
                }
                surface.fill_text(
                    &text,
                    &font,
                    origin + Vec2::new(0.0, metrics.icon_size),
                    TextAnchor::Baseline,
                    color,
                );
            }
            IconType::LocalSvg => {
                let Some(icon) = self.icons.get(key) else {
                    tracing::warn!(tag = key, icon = %info.icon_id, "vector icon not loaded");
                    return;
                };
                let scale = metrics.icon_size / metrics.svg_icon_size;
                let mut stroke = StrokeStyle::new(ICON_STROKE_WIDTH, color);
                stroke.cap = LineCap::Round;

                surface.save();
                surface.transform(Affine::translate(origin.to_vec2()) * Affine::scale(scale));
                surface.fill_path(&icon.fill, color);
                surface.stroke_path(&icon.stroke, &stroke);
                surface.restore();
            }
            IconType::Unknown => {
                tracing::warn!(tag = key, "unsupported icon type; icon skipped");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::overlay::color::ThemeColor;
    use crate::overlay::surface::{DrawCall, RecordingSurface};
    use kurbo::Shape;

    fn catalog() -> TagCatalog {
        TagCatalog::from_json(
            r#"{
                "camera": { "iconType": "material_symbol", "iconID": "photo_camera", "tagType": "exif", "tagID": "Model" },
                "aperture": { "iconType": "local_svg", "iconID": "icons/aperture.svg", "tagType": "exif", "tagID": "FNumber" }
            }"#,
        )
        .expect("catalog")
    }

    #[test]
    fn geometry_follows_icon_circle_and_caption() {
        let metrics = Metrics::default();
        let geometry = BadgeGeometry::new(Point::new(10.0, 20.0), 100.0, 32.0, &metrics);
        let diameter = 46.0 * SQRT_2;
        assert!((geometry.diameter() - diameter).abs() < 1e-9);

        let caption = geometry.caption_rect(100.0, &metrics);
        assert!((caption.x0 - (10.0 + diameter + 10.0)).abs() < 1e-9);
        assert_eq!(caption.y0, 20.0);
        assert_eq!(caption.width(), 100.0);

        let pill = geometry.pill().bounding_box();
        assert!((pill.x1 - geometry.bounds().x1).abs() < 1e-6);
        assert!((pill.y1 - (20.0 + diameter)).abs() < 1e-6);
    }

    #[test]
    fn tall_text_grows_the_circle() {
        let metrics = Metrics::default();
        let geometry = BadgeGeometry::new(Point::ZERO, 10.0, 200.0, &metrics);
        assert_eq!(geometry.diameter(), 200.0);
    }

    #[test]
    fn glyph_text_resolves_code_points() {
        assert_eq!(glyph_text("U+E412"), "\u{e412}");
        assert_eq!(glyph_text("0xe3af"), "\u{e3af}");
        assert_eq!(glyph_text("photo_camera"), "photo_camera");
    }

    #[test]
    fn missing_vector_icon_is_skipped() {
        let theme = Theme::default();
        let metrics = Metrics::default();
        let catalog = catalog();
        let icons = IconSet::default();
        let renderer = OverlayRenderer::new(&theme, &metrics, &catalog, &icons);
        let mut surface = RecordingSurface::new(800, 600);

        let badge = renderer.render_tag(&mut surface, "aperture", "f/2.8", Point::ZERO);

        assert_eq!(badge.key, "aperture");
        assert_eq!(surface.texts(), vec!["f/2.8", "f/2.8"]);
        assert_eq!(surface.stack_depth(), 0);
    }

    #[test]
    fn icon_without_font_glyphs_is_skipped() {
        let theme = Theme::default();
        let metrics = Metrics::default();
        let catalog = catalog();
        let icons = IconSet::default();
        let renderer = OverlayRenderer::new(&theme, &metrics, &catalog, &icons);
        let mut surface = RecordingSurface::new(800, 600).without_font(ICON_FONT_FAMILY);

        renderer.render_tag(&mut surface, "camera", "X-T5", Point::ZERO);

        assert_eq!(surface.texts(), vec!["X-T5", "X-T5"]);
        assert_eq!(surface.stack_depth(), 0);
    }

    #[test]
    fn background_blur_is_kept_for_decorations() {
        let theme = Theme {
            blur: 4.0,
            shadow_color: ThemeColor::TRANSPARENT,
            ..Theme::default()
        };
        let metrics = Metrics::default();
        let catalog = catalog();
        let icons = IconSet::default();
        let renderer = OverlayRenderer::new(&theme, &metrics, &catalog, &icons);
        let mut surface = RecordingSurface::new(800, 600);

        renderer.render_tag(&mut surface, "camera", "X-T5", Point::ZERO);

        let blurred = surface
            .calls()
            .iter()
            .filter(|call| {
                matches!(
                    call,
                    DrawCall::Fill { filter: Filter::Blur(_), .. }
                        | DrawCall::Stroke { filter: Filter::Blur(_), .. }
                )
            })
            .count();
        assert_eq!(blurred, 3);
    }
}
