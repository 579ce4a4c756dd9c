//! Pan/zoom state for the metadata overlay.
//!
//! Panning follows a single pointer (mouse or one finger). Zooming follows the
//! mouse wheel or a two finger pinch. The controller only keeps a transform;
//! the caller decides when to redraw.

use kurbo::{Affine, Point, Vec2};

pub const DEFAULT_MIN_ZOOM: f64 = 0.2;
pub const DEFAULT_MAX_ZOOM: f64 = 2.0;
pub const DEFAULT_SCROLL_SENSITIVITY: f64 = 0.0005;
const MIN_SCROLL_SENSITIVITY: f64 = 0.00001;
const MAX_SCROLL_SENSITIVITY: f64 = 1.0;

/// Weight given to the newest pinch sample when it is blended with the
/// distance recorded at the start of the pinch.
pub const PINCH_SMOOTHING: f64 = 0.01;

pub type GestureCallback = Box<dyn FnMut()>;

fn lerp(a: f64, b: f64, t: f64) -> f64 {
    a * (1.0 - t) + b * t
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Transform {
    pub offset: Vec2,
    pub scale: f64,
}

impl Default for Transform {
    fn default() -> Self {
        Self {
            offset: Vec2::ZERO,
            scale: 1.0,
        }
    }
}

impl Transform {
    /// Scales around the overlay origin (`offset`), then leaves the origin in place.
    pub fn overlay_affine(&self) -> Affine {
        Affine::translate(self.offset)
            * Affine::scale(self.scale)
            * Affine::translate(-self.offset)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GestureState {
    Idle,
    Dragging,
}

/// Ratio between the drawing surface's logical pixels and the size it is
/// displayed at, so screen positions map onto surface pixels.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Viewport {
    pub logical: (f64, f64),
    pub displayed: (f64, f64),
}

impl Default for Viewport {
    fn default() -> Self {
        Self {
            logical: (1.0, 1.0),
            displayed: (1.0, 1.0),
        }
    }
}

impl Viewport {
    pub fn ratio(&self) -> Vec2 {
        let axis = |logical: f64, displayed: f64| {
            if displayed > 0.0 && displayed.is_finite() {
                logical / displayed
            } else {
                1.0
            }
        };
        Vec2::new(
            axis(self.logical.0, self.displayed.0),
            axis(self.logical.1, self.displayed.1),
        )
    }
}

pub struct GestureController {
    transform: Transform,
    state: GestureState,
    drag_start: Vec2,
    start_pinch_distance: Option<f64>,
    min_zoom: f64,
    max_zoom: f64,
    scroll_sensitivity: f64,
    viewport: Viewport,
    on_zoom: Option<GestureCallback>,
    on_pan: Option<GestureCallback>,
}

impl std::fmt::Debug for GestureController {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GestureController")
            .field("transform", &self.transform)
            .field("state", &self.state)
            .field("drag_start", &self.drag_start)
            .field("start_pinch_distance", &self.start_pinch_distance)
            .field("min_zoom", &self.min_zoom)
            .field("max_zoom", &self.max_zoom)
            .field("scroll_sensitivity", &self.scroll_sensitivity)
            .field("viewport", &self.viewport)
            .finish_non_exhaustive()
    }
}

impl Default for GestureController {
    fn default() -> Self {
        Self::new()
    }
}

impl GestureController {
    pub fn new() -> Self {
        Self {
            transform: Transform::default(),
            state: GestureState::Idle,
            drag_start: Vec2::ZERO,
            start_pinch_distance: None,
            min_zoom: DEFAULT_MIN_ZOOM,
            max_zoom: DEFAULT_MAX_ZOOM,
            scroll_sensitivity: DEFAULT_SCROLL_SENSITIVITY,
            viewport: Viewport::default(),
            on_zoom: None,
            on_pan: None,
        }
    }

    pub fn with_callbacks(on_zoom: Option<GestureCallback>, on_pan: Option<GestureCallback>) -> Self {
        Self {
            on_zoom,
            on_pan,
            ..Self::new()
        }
    }

    pub fn set_on_zoom(&mut self, callback: Option<GestureCallback>) {
        self.on_zoom = callback;
    }

    pub fn set_on_pan(&mut self, callback: Option<GestureCallback>) {
        self.on_pan = callback;
    }

    pub fn transform(&self) -> Transform {
        self.transform
    }

    pub fn state(&self) -> GestureState {
        self.state
    }

    pub fn is_dragging(&self) -> bool {
        self.state == GestureState::Dragging
    }

    pub fn is_pinching(&self) -> bool {
        self.start_pinch_distance.is_some()
    }

    pub fn offset(&self) -> Vec2 {
        self.transform.offset
    }

    pub fn set_offset(&mut self, offset: Vec2) {
        self.transform.offset = offset;
    }

    pub fn zoom_factor(&self) -> f64 {
        self.transform.scale
    }

    pub fn set_zoom_factor(&mut self, factor: f64) {
        self.transform.scale = self.clamp_zoom(factor);
    }

    pub fn min_zoom(&self) -> f64 {
        self.min_zoom
    }

    pub fn max_zoom(&self) -> f64 {
        self.max_zoom
    }

    /// Ignored unless `min < max`.
    pub fn set_zoom_range(&mut self, min: f64, max: f64) -> bool {
        if !(min < max) {
            tracing::warn!(min, max, "rejecting zoom range with min >= max");
            return false;
        }
        self.min_zoom = min;
        self.max_zoom = max;
        self.transform.scale = self.clamp_zoom(self.transform.scale);
        true
    }

    pub fn scroll_sensitivity(&self) -> f64 {
        self.scroll_sensitivity
    }

    pub fn set_scroll_sensitivity(&mut self, sensitivity: f64) {
        self.scroll_sensitivity = sensitivity.clamp(MIN_SCROLL_SENSITIVITY, MAX_SCROLL_SENSITIVITY);
    }

    pub fn viewport(&self) -> Viewport {
        self.viewport
    }

    pub fn set_viewport(&mut self, viewport: Viewport) {
        self.viewport = viewport;
    }

    /// Maps a screen position onto surface pixels.
    pub fn surface_point(&self, screen: Point) -> Point {
        let ratio = self.viewport.ratio();
        Point::new(screen.x * ratio.x, screen.y * ratio.y)
    }

    pub fn reset(&mut self) {
        self.transform = Transform::default();
        self.drag_start = Vec2::ZERO;
        self.state = GestureState::Idle;
        self.start_pinch_distance = None;
    }

    pub fn pointer_down(&mut self, pos: Point) {
        self.state = GestureState::Dragging;
        self.drag_start = pos.to_vec2() - self.transform.offset;
    }

    pub fn pointer_up(&mut self) {
        self.state = GestureState::Idle;
        self.start_pinch_distance = None;
    }

    /// Returns `true` when the offset changed.
    pub fn pointer_move(&mut self, pos: Point) -> bool {
        if !self.is_dragging() {
            return false;
        }
        self.transform.offset = pos.to_vec2() - self.drag_start;
        if let Some(on_pan) = self.on_pan.as_mut() {
            on_pan();
        }
        true
    }

    /// Returns `true` when the zoom was applied.
    pub fn wheel(&mut self, delta_y: f64) -> bool {
        self.adjust_zoom(ZoomStep::Amount(delta_y * self.scroll_sensitivity))
    }

    /// Feeds one two-finger sample. The first sample of a pinch only records
    /// the baseline distance.
    pub fn pinch_move(&mut self, touch1: Point, touch2: Point) -> bool {
        self.state = GestureState::Idle;

        let current = (touch1 - touch2).hypot2();
        match self.start_pinch_distance {
            Some(start) if start > 0.0 => {
                let adjusted = lerp(start, current, PINCH_SMOOTHING);
                self.adjust_zoom(ZoomStep::Factor(adjusted / start))
            }
            _ => {
                self.start_pinch_distance = Some(current);
                false
            }
        }
    }

    fn adjust_zoom(&mut self, step: ZoomStep) -> bool {
        if self.is_dragging() {
            return false;
        }
        match step {
            ZoomStep::Amount(amount) if amount != 0.0 => self.transform.scale += amount,
            ZoomStep::Factor(factor) if factor != 0.0 => self.transform.scale *= factor,
            _ => {}
        }
        self.transform.scale = self.clamp_zoom(self.transform.scale);
        if let Some(on_zoom) = self.on_zoom.as_mut() {
            on_zoom();
        }
        true
    }

    fn clamp_zoom(&self, value: f64) -> f64 {
        if value.is_nan() {
            return self.min_zoom;
        }
        value.clamp(self.min_zoom, self.max_zoom)
    }
}

#[derive(Debug, Clone, Copy)]
enum ZoomStep {
    Amount(f64),
    Factor(f64),
}
