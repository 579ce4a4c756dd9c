use crate::overlay::color::ThemeColor;
use image::RgbaImage;
use kurbo::{Affine, BezPath, Point, Rect, Shape};

#[derive(Debug, Clone, PartialEq)]
pub struct FontSpec {
    pub family: String,
    pub size: f64,
}

impl FontSpec {
    pub fn new(family: impl Into<String>, size: f64) -> Self {
        Self {
            family: family.into(),
            size,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct TextMetrics {
    pub width: f64,
    pub ascent: f64,
    pub descent: f64,
}

impl TextMetrics {
    pub fn height(&self) -> f64 {
        self.ascent + self.descent
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextAnchor {
    /// `pos` is the left end of the baseline.
    Baseline,
    /// `pos` is the center of the text box.
    Center,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineCap {
    Butt,
    Round,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StrokeStyle {
    pub width: f64,
    pub color: ThemeColor,
    pub cap: LineCap,
    pub miter_limit: f64,
}

impl StrokeStyle {
    pub fn new(width: f64, color: ThemeColor) -> Self {
        Self {
            width,
            color,
            cap: LineCap::Butt,
            miter_limit: 10.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum Filter {
    #[default]
    None,
    Blur(f64),
}

/// 2D drawing target. Transform, clip and filter are part of the state that
/// `save`/`restore` push and pop.
pub trait Surface {
    fn size(&self) -> (u32, u32);
    fn clear(&mut self);
    fn save(&mut self);
    fn restore(&mut self);
    fn reset_transform(&mut self);
    /// Post-multiplies `affine` onto the current transform.
    fn transform(&mut self, affine: Affine);
    fn clip(&mut self, path: &BezPath);
    fn set_filter(&mut self, filter: Filter);
    fn fill_path(&mut self, path: &BezPath, color: ThemeColor);
    fn stroke_path(&mut self, path: &BezPath, style: &StrokeStyle);
    fn measure_text(&mut self, text: &str, font: &FontSpec) -> TextMetrics;
    /// Whether `font` is loaded and maps all of `text` to glyphs.
    fn has_glyphs(&mut self, _text: &str, _font: &FontSpec) -> bool {
        true
    }
    fn fill_text(
        &mut self,
        text: &str,
        font: &FontSpec,
        pos: Point,
        anchor: TextAnchor,
        color: ThemeColor,
    );
    fn draw_image(&mut self, image: &RgbaImage, pos: Point);
}

#[derive(Debug, Clone, PartialEq)]
pub enum DrawCall {
    Clear,
    Image {
        width: u32,
        height: u32,
        transform: Affine,
    },
    Fill {
        bounds: Rect,
        color: ThemeColor,
        filter: Filter,
        clipped: bool,
        transform: Affine,
    },
    Stroke {
        bounds: Rect,
        style: StrokeStyle,
        filter: Filter,
        clipped: bool,
        transform: Affine,
    },
    Text {
        text: String,
        font: FontSpec,
        pos: Point,
        anchor: TextAnchor,
        color: ThemeColor,
        transform: Affine,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
struct RecordingState {
    transform: Affine,
    clip_depth: usize,
    filter: Filter,
}

/// Surface that records draw calls instead of producing pixels. Text is
/// measured with a fixed advance of half the font size per character.
#[derive(Debug, Clone, Default)]
pub struct RecordingSurface {
    width: u32,
    height: u32,
    state: RecordingState,
    stack: Vec<RecordingState>,
    calls: Vec<DrawCall>,
    missing_fonts: Vec<String>,
}

impl RecordingSurface {
    pub const ADVANCE_RATIO: f64 = 0.5;
    pub const ASCENT_RATIO: f64 = 0.8;
    pub const DESCENT_RATIO: f64 = 0.2;

    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            ..Self::default()
        }
    }

    /// Makes `family` report no glyphs, as if it were not loaded.
    pub fn without_font(mut self, family: &str) -> Self {
        self.missing_fonts.push(family.to_owned());
        self
    }

    pub fn calls(&self) -> &[DrawCall] {
        &self.calls
    }

    pub fn take_calls(&mut self) -> Vec<DrawCall> {
        std::mem::take(&mut self.calls)
    }

    pub fn texts(&self) -> Vec<&str> {
        self.calls
            .iter()
            .filter_map(|call| match call {
                DrawCall::Text { text, .. } => Some(text.as_str()),
                _ => None,
            })
            .collect()
    }

    pub fn stack_depth(&self) -> usize {
        self.stack.len()
    }
}

impl Surface for RecordingSurface {
    fn size(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    fn clear(&mut self) {
        self.calls.push(DrawCall::Clear);
    }

    fn save(&mut self) {
        self.stack.push(self.state);
    }

    fn restore(&mut self) {
        if let Some(state) = self.stack.pop() {
            self.state = state;
        }
    }

    fn reset_transform(&mut self) {
        self.state.transform = Affine::IDENTITY;
    }

    fn transform(&mut self, affine: Affine) {
        self.state.transform = self.state.transform * affine;
    }

    fn clip(&mut self, _path: &BezPath) {
        self.state.clip_depth += 1;
    }

    fn set_filter(&mut self, filter: Filter) {
        self.state.filter = filter;
    }

    fn fill_path(&mut self, path: &BezPath, color: ThemeColor) {
        self.calls.push(DrawCall::Fill {
            bounds: path.bounding_box(),
            color,
            filter: self.state.filter,
            clipped: self.state.clip_depth > 0,
            transform: self.state.transform,
        });
    }

    fn stroke_path(&mut self, path: &BezPath, style: &StrokeStyle) {
        self.calls.push(DrawCall::Stroke {
            bounds: path.bounding_box(),
            style: *style,
            filter: self.state.filter,
            clipped: self.state.clip_depth > 0,
            transform: self.state.transform,
        });
    }

    fn measure_text(&mut self, text: &str, font: &FontSpec) -> TextMetrics {
        TextMetrics {
            width: text.chars().count() as f64 * font.size * Self::ADVANCE_RATIO,
            ascent: font.size * Self::ASCENT_RATIO,
            descent: font.size * Self::DESCENT_RATIO,
        }
    }

    fn has_glyphs(&mut self, _text: &str, font: &FontSpec) -> bool {
        !self.missing_fonts.contains(&font.family)
    }

    fn fill_text(
        &mut self,
        text: &str,
        font: &FontSpec,
        pos: Point,
        anchor: TextAnchor,
        color: ThemeColor,
    ) {
        self.calls.push(DrawCall::Text {
            text: text.to_owned(),
            font: font.clone(),
            pos,
            anchor,
            color,
            transform: self.state.transform,
        });
    }

    fn draw_image(&mut self, image: &RgbaImage, _pos: Point) {
        self.calls.push(DrawCall::Image {
            width: image.width(),
            height: image.height(),
            transform: self.state.transform,
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn restore_pops_transform_clip_and_filter() {
        let mut surface = RecordingSurface::new(10, 10);
        let mut path = BezPath::new();
        path.move_to((0.0, 0.0));
        path.line_to((4.0, 4.0));

        surface.save();
        surface.transform(Affine::scale(2.0));
        surface.clip(&path);
        surface.set_filter(Filter::Blur(3.0));
        surface.fill_path(&path, ThemeColor::WHITE);
        surface.restore();
        surface.fill_path(&path, ThemeColor::WHITE);

        match surface.calls() {
            [DrawCall::Fill {
                filter: Filter::Blur(_),
                clipped: true,
                transform: inner,
                ..
            }, DrawCall::Fill {
                filter: Filter::None,
                clipped: false,
                transform: outer,
                ..
            }] => {
                assert_eq!(*inner, Affine::scale(2.0));
                assert_eq!(*outer, Affine::IDENTITY);
            }
            other => panic!("unexpected calls: {other:?}"),
        }
        assert_eq!(surface.stack_depth(), 0);
    }

    #[test]
    fn measures_text_with_fixed_advance() {
        let mut surface = RecordingSurface::new(1, 1);
        let metrics = surface.measure_text("f/2.8", &FontSpec::new("Mono", 20.0));
        assert_eq!(metrics.width, 50.0);
        assert_eq!(metrics.height(), 20.0);
    }
}
