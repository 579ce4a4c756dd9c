//! Pixel surface backed by a `tiny_skia::Pixmap`.
//!
//! Text is drawn by turning glyph outlines into paths, so captions follow the
//! current transform like any other shape. Text is shaped first, so kerning
//! and icon font ligatures resolve to the font's glyphs. Blur filters render
//! into a scratch pixmap covering the shape plus the blur spread, which is
//! blurred with three box passes before it is composited.

use crate::overlay::color::ThemeColor;
use crate::overlay::fonts::{FontBook, FontFace};
use crate::overlay::surface::{
    Filter, FontSpec, LineCap, StrokeStyle, Surface, TextAnchor, TextMetrics,
};
use ab_glyph::{Font, FontArc, GlyphId, OutlineCurve, PxScale, ScaleFont};
use anyhow::{anyhow, Result};
use image::{RgbImage, RgbaImage};
use kurbo::{Affine, BezPath, PathEl, Point, Rect, Shape, Vec2};
use tiny_skia::{
    ColorU8, FillRule, Mask, Paint, PathBuilder, Pixmap, PixmapPaint, PremultipliedColorU8,
};

const FALLBACK_ADVANCE_RATIO: f64 = 0.5;
const FALLBACK_ASCENT_RATIO: f64 = 0.8;
const FALLBACK_DESCENT_RATIO: f64 = 0.2;
const BLUR_PASSES: usize = 3;
const MAX_BLUR_RADIUS: usize = 1 << 16;

#[derive(Clone, Copy, Debug, PartialEq, Default)]
struct RasterState {
    transform: Affine,
    filter: Filter,
    clip_depth: usize,
}

pub struct RasterSurface<'a> {
    pixmap: Pixmap,
    fonts: &'a FontBook,
    state: RasterState,
    stack: Vec<RasterState>,
    /// One mask per clip level; `state.clip_depth` selects the active one.
    clips: Vec<Mask>,
}

impl std::fmt::Debug for RasterSurface<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RasterSurface")
            .field("width", &self.pixmap.width())
            .field("height", &self.pixmap.height())
            .field("state", &self.state)
            .finish()
    }
}

fn to_skia_transform(affine: Affine) -> tiny_skia::Transform {
    let [a, b, c, d, e, f] = affine.as_coeffs();
    tiny_skia::Transform::from_row(a as f32, b as f32, c as f32, d as f32, e as f32, f as f32)
}

fn to_skia_path(path: &BezPath) -> Option<tiny_skia::Path> {
    let mut builder = PathBuilder::new();
    for el in path.elements() {
        match *el {
            PathEl::MoveTo(p) => builder.move_to(p.x as f32, p.y as f32),
            PathEl::LineTo(p) => builder.line_to(p.x as f32, p.y as f32),
            PathEl::QuadTo(p1, p2) => {
                builder.quad_to(p1.x as f32, p1.y as f32, p2.x as f32, p2.y as f32)
            }
            PathEl::CurveTo(p1, p2, p3) => builder.cubic_to(
                p1.x as f32,
                p1.y as f32,
                p2.x as f32,
                p2.y as f32,
                p3.x as f32,
                p3.y as f32,
            ),
            PathEl::ClosePath => builder.close(),
        }
    }
    builder.finish()
}

fn paint_for(color: ThemeColor) -> Paint<'static> {
    let mut paint = Paint::default();
    paint.set_color_rgba8(color.r, color.g, color.b, color.a);
    paint.anti_alias = true;
    paint
}

/// Pixel scale that makes the em square `size` pixels tall, as CSS font sizes do.
fn px_scale(font: &FontArc, size: f64) -> PxScale {
    let size = size as f32;
    match font.units_per_em() {
        Some(units) if units > 0.0 => PxScale::from(size * font.height_unscaled() / units),
        _ => PxScale::from(size),
    }
}

impl<'a> RasterSurface<'a> {
    pub fn new(width: u32, height: u32, fonts: &'a FontBook) -> Result<Self> {
        let pixmap = Pixmap::new(width, height)
            .ok_or_else(|| anyhow!("cannot create a {width}x{height} surface"))?;
        Ok(Self {
            pixmap,
            fonts,
            state: RasterState::default(),
            stack: Vec::new(),
            clips: Vec::new(),
        })
    }

    pub fn pixmap(&self) -> &Pixmap {
        &self.pixmap
    }

    /// Straight-alpha copy of the pixels.
    pub fn to_rgba_image(&self) -> RgbaImage {
        let mut out = RgbaImage::new(self.pixmap.width(), self.pixmap.height());
        for (dst, src) in out.pixels_mut().zip(self.pixmap.pixels()) {
            let c = src.demultiply();
            dst.0 = [c.red(), c.green(), c.blue(), c.alpha()];
        }
        out
    }

    /// Pixels composited over black, the way a JPEG export flattens them.
    pub fn to_rgb_image(&self) -> RgbImage {
        let mut out = RgbImage::new(self.pixmap.width(), self.pixmap.height());
        for (dst, src) in out.pixels_mut().zip(self.pixmap.pixels()) {
            dst.0 = [src.red(), src.green(), src.blue()];
        }
        out
    }

    fn active_clip(&self) -> Option<&Mask> {
        match self.state.clip_depth {
            0 => None,
            depth => self.clips.get(depth - 1),
        }
    }

    /// Runs `draw` on the main pixmap, or on a blurred scratch layer when a
    /// blur filter is set. `bounds` covers what `draw` paints, in user space.
    fn with_layer(
        &mut self,
        bounds: Rect,
        draw: impl FnOnce(&mut Pixmap, tiny_skia::Transform, Option<&Mask>),
    ) {
        let sigma = match self.state.filter {
            Filter::Blur(sigma) if sigma > 0.0 => sigma,
            _ => {
                let clip = match self.state.clip_depth {
                    0 => None,
                    depth => self.clips.get(depth - 1),
                };
                draw(&mut self.pixmap, to_skia_transform(self.state.transform), clip);
                return;
            }
        };

        let Some(area) = self.blur_area(bounds, sigma) else {
            return;
        };
        let (x0, y0) = (area.x0, area.y0);
        let Some(mut layer) = Pixmap::new(area.width() as u32, area.height() as u32) else {
            return;
        };
        let transform = Affine::translate((-x0, -y0)) * self.state.transform;
        draw(&mut layer, to_skia_transform(transform), None);
        box_blur(&mut layer, sigma);
        let clip = match self.state.clip_depth {
            0 => None,
            depth => self.clips.get(depth - 1),
        };
        self.pixmap.draw_pixmap(
            x0 as i32,
            y0 as i32,
            layer.as_ref(),
            &PixmapPaint::default(),
            tiny_skia::Transform::identity(),
            clip,
        );
    }

    /// Whole pixel area a blurred draw of `bounds` can touch, clipped to the
    /// canvas. `None` when nothing would land on it.
    fn blur_area(&self, bounds: Rect, sigma: f64) -> Option<Rect> {
        let spread = (BLUR_PASSES * blur_radius(sigma) + 1) as f64;
        let canvas = Rect::new(0.0, 0.0, self.pixmap.width() as f64, self.pixmap.height() as f64);
        let area = self
            .state
            .transform
            .transform_rect_bbox(bounds)
            .inflate(spread, spread)
            .intersect(canvas)
            .expand();
        (area.is_finite() && area.width() > 0.0 && area.height() > 0.0).then_some(area)
    }

    fn text_path(&self, face: &FontFace, text: &str, size: f64) -> ShapedText {
        let font = face.glyphs();
        let scaled = font.as_scaled(px_scale(font, size));
        let h_scale = scaled.h_scale_factor() as f64;
        let v_scale = scaled.v_scale_factor() as f64;
        let mut shaped = ShapedText {
            path: BezPath::new(),
            metrics: TextMetrics {
                width: 0.0,
                ascent: scaled.ascent() as f64,
                descent: -(scaled.descent() as f64),
            },
            missing: 0,
        };
        let Some(shaper) = face.shaper() else {
            shaped.missing = text.chars().count();
            return shaped;
        };

        let mut buffer = rustybuzz::UnicodeBuffer::new();
        buffer.push_str(text);
        let glyphs = rustybuzz::shape(&shaper, &[], buffer);

        let mut caret = Vec2::ZERO;
        for (info, pos) in glyphs.glyph_infos().iter().zip(glyphs.glyph_positions()) {
            if info.glyph_id == 0 {
                shaped.missing += 1;
            }
            let origin = caret
                + Vec2::new(pos.x_offset as f64 * h_scale, -(pos.y_offset as f64) * v_scale);
            if let Some(outline) = u16::try_from(info.glyph_id)
                .ok()
                .and_then(|id| font.outline(GlyphId(id)))
            {
                append_outline(&mut shaped.path, &outline.curves, origin, h_scale, v_scale);
            }
            caret += Vec2::new(pos.x_advance as f64 * h_scale, -(pos.y_advance as f64) * v_scale);
        }
        shaped.metrics.width = caret.x;
        shaped
    }

    /// The font for `family`, or the first loaded font for captions.
    fn text_face(&self, family: &str) -> Option<&'a FontFace> {
        let fonts: &'a FontBook = self.fonts;
        fonts.resolve(family).or_else(|| fonts.fallback())
    }
}

struct ShapedText {
    /// Glyph outlines with the baseline origin at (0, 0).
    path: BezPath,
    metrics: TextMetrics,
    /// Glyphs the font does not have.
    missing: usize,
}

fn append_outline(path: &mut BezPath, curves: &[OutlineCurve], origin: Vec2, h_scale: f64, v_scale: f64) {
    let map = |p: ab_glyph::Point| {
        Point::new(origin.x + p.x as f64 * h_scale, origin.y - p.y as f64 * v_scale)
    };
    let mut last: Option<Point> = None;
    for curve in curves {
        let start = match curve {
            OutlineCurve::Line(p0, _) | OutlineCurve::Quad(p0, _, _) | OutlineCurve::Cubic(p0, _, _, _) => {
                map(*p0)
            }
        };
        if last.map_or(true, |l| (l - start).hypot() > 1e-6) {
            if last.is_some() {
                path.close_path();
            }
            path.move_to(start);
        }
        let end = match curve {
            OutlineCurve::Line(_, p1) => {
                let p1 = map(*p1);
                path.line_to(p1);
                p1
            }
            OutlineCurve::Quad(_, p1, p2) => {
                let p2 = map(*p2);
                path.quad_to(map(*p1), p2);
                p2
            }
            OutlineCurve::Cubic(_, p1, p2, p3) => {
                let p3 = map(*p3);
                path.curve_to(map(*p1), map(*p2), p3);
                p3
            }
        };
        last = Some(end);
    }
    if last.is_some() {
        path.close_path();
    }
}

impl Surface for RasterSurface<'_> {
    fn size(&self) -> (u32, u32) {
        (self.pixmap.width(), self.pixmap.height())
    }

    fn clear(&mut self) {
        self.pixmap.fill(tiny_skia::Color::TRANSPARENT);
    }

    fn save(&mut self) {
        self.stack.push(self.state);
    }

    fn restore(&mut self) {
        if let Some(state) = self.stack.pop() {
            self.state = state;
            self.clips.truncate(self.state.clip_depth);
        }
    }

    fn reset_transform(&mut self) {
        self.state.transform = Affine::IDENTITY;
    }

    fn transform(&mut self, affine: Affine) {
        self.state.transform = self.state.transform * affine;
    }

    fn clip(&mut self, path: &BezPath) {
        let Some(path) = to_skia_path(path) else {
            return;
        };
        let transform = to_skia_transform(self.state.transform);
        let mask = match self.active_clip() {
            Some(current) => {
                let mut mask = current.clone();
                mask.intersect_path(&path, FillRule::Winding, true, transform);
                Some(mask)
            }
            None => Mask::new(self.pixmap.width(), self.pixmap.height()).map(|mut mask| {
                mask.fill_path(&path, FillRule::Winding, true, transform);
                mask
            }),
        };
        if let Some(mask) = mask {
            self.clips.truncate(self.state.clip_depth);
            self.clips.push(mask);
            self.state.clip_depth += 1;
        }
    }

    fn set_filter(&mut self, filter: Filter) {
        self.state.filter = filter;
    }

    fn fill_path(&mut self, shape: &BezPath, color: ThemeColor) {
        let Some(path) = to_skia_path(shape) else {
            return;
        };
        let paint = paint_for(color);
        let bounds = shape.bounding_box();
        self.with_layer(bounds, |pixmap, transform, clip| {
            pixmap.fill_path(&path, &paint, FillRule::Winding, transform, clip);
        });
    }

    fn stroke_path(&mut self, shape: &BezPath, style: &StrokeStyle) {
        let Some(path) = to_skia_path(shape) else {
            return;
        };
        let paint = paint_for(style.color);
        let stroke = tiny_skia::Stroke {
            width: style.width as f32,
            miter_limit: style.miter_limit as f32,
            line_cap: match style.cap {
                LineCap::Butt => tiny_skia::LineCap::Butt,
                LineCap::Round => tiny_skia::LineCap::Round,
            },
            ..tiny_skia::Stroke::default()
        };
        // Miter joins reach at most `miter_limit * width / 2` past the path.
        let reach = style.width * style.miter_limit.max(1.0) / 2.0;
        let bounds = shape.bounding_box().inflate(reach, reach);
        self.with_layer(bounds, |pixmap, transform, clip| {
            pixmap.stroke_path(&path, &paint, &stroke, transform, clip);
        });
    }

    fn measure_text(&mut self, text: &str, font: &FontSpec) -> TextMetrics {
        match self.text_face(&font.family) {
            Some(face) => self.text_path(face, text, font.size).metrics,
            None => TextMetrics {
                width: text.chars().count() as f64 * font.size * FALLBACK_ADVANCE_RATIO,
                ascent: font.size * FALLBACK_ASCENT_RATIO,
                descent: font.size * FALLBACK_DESCENT_RATIO,
            },
        }
    }

    fn has_glyphs(&mut self, text: &str, font: &FontSpec) -> bool {
        match self.fonts.resolve(&font.family) {
            Some(face) => self.text_path(face, text, font.size).missing == 0,
            None => false,
        }
    }

    fn fill_text(
        &mut self,
        text: &str,
        font: &FontSpec,
        pos: Point,
        anchor: TextAnchor,
        color: ThemeColor,
    ) {
        let Some(face) = self.text_face(&font.family) else {
            tracing::debug!(family = %font.family, "no font loaded; text skipped");
            return;
        };
        let ShapedText { path: glyphs, metrics, .. } = self.text_path(face, text, font.size);
        let origin = match anchor {
            TextAnchor::Baseline => pos,
            TextAnchor::Center => Point::new(
                pos.x - metrics.width / 2.0,
                pos.y + (metrics.ascent - metrics.descent) / 2.0,
            ),
        };
        let placed = Affine::translate(origin.to_vec2()) * glyphs;
        self.fill_path(&placed, color);
    }

    fn draw_image(&mut self, image: &RgbaImage, pos: Point) {
        let Some(mut source) = Pixmap::new(image.width(), image.height()) else {
            return;
        };
        for (dst, px) in source.pixels_mut().iter_mut().zip(image.pixels()) {
            let [r, g, b, a] = px.0;
            *dst = ColorU8::from_rgba(r, g, b, a).premultiply();
        }
        let transform = to_skia_transform(self.state.transform);
        let clip = match self.state.clip_depth {
            0 => None,
            depth => self.clips.get(depth - 1),
        };
        self.pixmap.draw_pixmap(
            pos.x.round() as i32,
            pos.y.round() as i32,
            source.as_ref(),
            &PixmapPaint::default(),
            transform,
            clip,
        );
    }
}

/// Box radius whose repeated passes approximate a gaussian of `sigma`.
fn blur_radius(sigma: f64) -> usize {
    let ideal = (12.0 * sigma * sigma / BLUR_PASSES as f64 + 1.0).sqrt();
    ((ideal - 1.0) / 2.0).round().clamp(1.0, MAX_BLUR_RADIUS as f64) as usize
}

/// Box blur approximating a gaussian with standard deviation `sigma`.
fn box_blur(pixmap: &mut Pixmap, sigma: f64) {
    let width = pixmap.width() as usize;
    let height = pixmap.height() as usize;
    let radius = blur_radius(sigma);

    let pixels = pixmap.pixels_mut();
    let mut scratch = vec![[0u8; 4]; width * height];
    let mut buffer: Vec<[u8; 4]> = pixels
        .iter()
        .map(|p| [p.red(), p.green(), p.blue(), p.alpha()])
        .collect();

    for _ in 0..BLUR_PASSES {
        blur_lines(&buffer, &mut scratch, width, height, radius, true);
        blur_lines(&scratch, &mut buffer, width, height, radius, false);
    }

    for (dst, [r, g, b, a]) in pixels.iter_mut().zip(buffer) {
        // Averaging premultiplied pixels keeps every channel <= alpha.
        if let Some(color) = PremultipliedColorU8::from_rgba(r.min(a), g.min(a), b.min(a), a) {
            *dst = color;
        }
    }
}

fn blur_lines(
    src: &[[u8; 4]],
    dst: &mut [[u8; 4]],
    width: usize,
    height: usize,
    radius: usize,
    horizontal: bool,
) {
    let (lines, len) = if horizontal { (height, width) } else { (width, height) };
    if len == 0 {
        return;
    }
    // Past `len - 1` the window only repeats edge pixels.
    let radius = radius.min(len - 1);
    let index = |line: usize, i: usize| {
        if horizontal {
            line * width + i
        } else {
            i * width + line
        }
    };
    let window = (2 * radius + 1) as u32;

    for line in 0..lines {
        let mut sum = [0u32; 4];
        for offset in 0..=2 * radius {
            let i = offset.saturating_sub(radius).min(len - 1);
            let px = src[index(line, i)];
            for c in 0..4 {
                sum[c] += px[c] as u32;
            }
        }
        for i in 0..len {
            let out = &mut dst[index(line, i)];
            for c in 0..4 {
                out[c] = (sum[c] / window) as u8;
            }
            let leaving = src[index(line, i.saturating_sub(radius))];
            let entering = src[index(line, (i + radius + 1).min(len - 1))];
            for c in 0..4 {
                sum[c] = sum[c] + entering[c] as u32 - leaving[c] as u32;
            }
        }
    }
}
