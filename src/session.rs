//! Owner of everything one editing session needs: gesture state, themes,
//! metrics, tag catalog and selection, icons, fonts and the current image.
//!
//! Nothing here is global. A host builds a [`Session`], calls
//! [`Session::initialize`] once, then feeds it input and images and asks it to
//! draw into a [`Surface`].

use crate::export::{self, JpegExport};
use crate::overlay::fonts::FontBook;
use crate::overlay::gesture::{GestureController, Viewport};
use crate::overlay::icon::IconSet;
use crate::overlay::input::{self, InputCommand, InputEvent};
use crate::overlay::layout::{Badge, OverlayRenderer};
use crate::overlay::metrics::Metrics;
use crate::overlay::raster::RasterSurface;
use crate::overlay::surface::Surface;
use crate::overlay::theme::ThemeStore;
use crate::settings::{AppConfig, ExampleView, OverlayOffset, Resources};
use crate::tags::catalog::TagCatalog;
use crate::tags::manager::{Placement, TagManager};
use crate::tags::reader::{read_tags, MetadataSource, TagValues};
use anyhow::Result;
use image::RgbaImage;
use kurbo::{Point, Vec2};
use rand::seq::IteratorRandom;
use rand::Rng;
use serde_json::{json, Value};

/// Overlay zoom per pixel of image height when an image is loaded.
const LOAD_ZOOM_PER_PIXEL: f64 = 0.001;
const LOAD_OFFSET: Vec2 = Vec2::new(20.0, 40.0);

#[derive(Debug, Clone)]
pub struct LoadedImage {
    pub pixels: RgbaImage,
    /// File name without folder and extension, used to name exports.
    pub stem: String,
}

#[derive(Debug, Default)]
pub struct Session {
    controller: GestureController,
    themes: ThemeStore,
    metrics: Metrics,
    tags: TagManager,
    icons: IconSet,
    fonts: FontBook,
    config: AppConfig,
    image: Option<LoadedImage>,
    values: TagValues,
    pending_example: Option<ExampleView>,
    /// Size the host displays the surface at; the image size until set.
    display_size: Option<(f64, f64)>,
    can_render: bool,
}

impl Session {
    pub fn new() -> Self {
        Self::default()
    }

    /// Loads configuration, tag catalog, themes, icons and fonts in that
    /// order. A resource that fails to load is logged and left at its
    /// default; rendering is enabled once every step has run.
    pub fn initialize(&mut self, resources: &Resources) {
        self.can_render = false;

        self.config = AppConfig::load(&resources.config_path()).unwrap_or_else(|err| {
            tracing::warn!(error = %format!("{err:#}"), "configuration unavailable");
            AppConfig::default()
        });

        let catalog = TagCatalog::load(&resources.tags_path()).unwrap_or_else(|err| {
            tracing::warn!(error = %format!("{err:#}"), "tag catalog unavailable");
            TagCatalog::default()
        });
        self.tags = TagManager::new(catalog);
        for key in &self.config.default_tags {
            self.tags.select(key, true, Placement::Bottom);
        }

        self.themes = ThemeStore::load(&resources.themes_path()).unwrap_or_else(|err| {
            tracing::warn!(error = %format!("{err:#}"), "themes unavailable; using the default theme");
            ThemeStore::default()
        });

        self.icons = IconSet::load(self.tags.catalog(), resources.icon_root());

        self.fonts = FontBook::load_dir(&resources.fonts_dir()).unwrap_or_else(|err| {
            tracing::warn!(error = %format!("{err:#}"), "fonts unavailable; text is not drawn");
            FontBook::default()
        });

        tracing::info!(
            tags = self.tags.catalog().len(),
            themes = self.themes.len(),
            icons = self.icons.len(),
            fonts = self.fonts.len(),
            "session initialized"
        );
        self.can_render = true;
    }

    pub fn can_render(&self) -> bool {
        self.can_render
    }

    pub fn controller(&self) -> &GestureController {
        &self.controller
    }

    pub fn controller_mut(&mut self) -> &mut GestureController {
        &mut self.controller
    }

    pub fn handle_input(&mut self, event: &InputEvent) -> Option<InputCommand> {
        input::dispatch(&mut self.controller, event)
    }

    pub fn themes(&self) -> &ThemeStore {
        &self.themes
    }

    pub fn themes_mut(&mut self) -> &mut ThemeStore {
        &mut self.themes
    }

    pub fn set_theme(&mut self, name: &str) -> bool {
        self.themes.set_current(name)
    }

    pub fn metrics(&self) -> &Metrics {
        &self.metrics
    }

    pub fn metrics_mut(&mut self) -> &mut Metrics {
        &mut self.metrics
    }

    pub fn tags(&self) -> &TagManager {
        &self.tags
    }

    pub fn tags_mut(&mut self) -> &mut TagManager {
        &mut self.tags
    }

    pub fn icons(&self) -> &IconSet {
        &self.icons
    }

    pub fn icons_mut(&mut self) -> &mut IconSet {
        &mut self.icons
    }

    pub fn fonts(&self) -> &FontBook {
        &self.fonts
    }

    pub fn fonts_mut(&mut self) -> &mut FontBook {
        &mut self.fonts
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    pub fn image(&self) -> Option<&LoadedImage> {
        self.image.as_ref()
    }

    pub fn values(&self) -> &TagValues {
        &self.values
    }

    /// Replaces the current image and places the overlay for it. A pending
    /// example view wins over the default placement.
    pub fn load_image(&mut self, pixels: RgbaImage, file_name: &str) {
        let (width, height) = (pixels.width() as f64, pixels.height() as f64);
        self.controller.set_viewport(Viewport {
            logical: (width, height),
            displayed: self.display_size.unwrap_or((width, height)),
        });
        self.controller.reset();
        self.controller.set_zoom_factor(height * LOAD_ZOOM_PER_PIXEL);
        self.controller.set_offset(LOAD_OFFSET);

        if let Some(example) = self.pending_example.take() {
            self.controller.set_offset(example.offset.into());
            self.controller.set_zoom_factor(example.scale);
        }

        let stem = export::remove_extension(file_name).to_owned();
        tracing::debug!(%stem, width, height, "image loaded");
        self.image = Some(LoadedImage { pixels, stem });
        self.values.clear();
    }

    /// Records the on-screen size of the surface. Kept across image loads.
    pub fn set_display_size(&mut self, width: f64, height: f64) {
        self.display_size = Some((width, height));
        let mut viewport = self.controller.viewport();
        viewport.displayed = (width, height);
        self.controller.set_viewport(viewport);
    }

    /// Reads the catalog tags of the current image and updates availability.
    pub fn read_metadata(&mut self, source: &dyn MetadataSource) {
        self.values = read_tags(&mut self.tags, source);
    }

    pub fn set_values(&mut self, values: TagValues) {
        self.values = values;
    }

    /// Applies an example's theme, tags and metric overrides now; its offset
    /// and scale are applied by the next [`Session::load_image`].
    pub fn apply_example(&mut self, path: &str) -> bool {
        let Some(example) = self.config.example(path).cloned() else {
            tracing::warn!(path, "no such example");
            return false;
        };

        if !self.themes.set_current(&example.theme) {
            tracing::warn!(theme = %example.theme, "example theme not found");
        }
        self.tags.set_selected(&example.tags);
        if let Some(overrides) = &example.metrics {
            if let Err(err) = self.metrics.apply_overrides(overrides) {
                tracing::warn!(error = %format!("{err:#}"), "example metrics ignored");
            }
        }
        self.pending_example = Some(example);
        true
    }

    /// Picks a random example and applies it. Returns the image path to load.
    pub fn show_example<R: Rng + ?Sized>(&mut self, rng: &mut R) -> Option<String> {
        let path = self.config.examples.keys().choose(rng)?.clone();
        self.apply_example(&path).then_some(path)
    }

    /// Draws image and overlay. Does nothing until initialized and an image is loaded.
    pub fn redraw(&self, surface: &mut dyn Surface) -> Option<Vec<Badge>> {
        if !self.can_render {
            return None;
        }
        self.draw_frame(surface)
    }

    fn draw_frame(&self, surface: &mut dyn Surface) -> Option<Vec<Badge>> {
        let image = self.image.as_ref()?;

        surface.reset_transform();
        surface.clear();
        surface.draw_image(&image.pixels, Point::ORIGIN);

        let transform = self.controller.transform();
        let renderer = OverlayRenderer::new(
            self.themes.current(),
            &self.metrics,
            self.tags.catalog(),
            &self.icons,
        );
        surface.save();
        surface.transform(transform.overlay_affine());
        let badges = renderer.render_tags(
            surface,
            &self.values,
            self.tags.selected(),
            transform.offset.to_point(),
        );
        surface.restore();
        Some(badges)
    }

    /// Renders the current image with its overlay into a JPEG. `None` when
    /// no image is loaded.
    pub fn export_jpeg(&self) -> Result<Option<JpegExport>> {
        let Some(image) = self.image.as_ref() else {
            tracing::debug!("export skipped; no image loaded");
            return Ok(None);
        };
        let mut surface = RasterSurface::new(image.pixels.width(), image.pixels.height(), &self.fonts)?;
        self.draw_frame(&mut surface);
        let bytes = export::encode_jpeg(&surface.to_rgb_image())?;
        Ok(Some(JpegExport {
            file_name: export::build_filename(&image.stem),
            bytes,
        }))
    }

    /// Current view as JSON, in the shape used for example entries.
    pub fn settings_snapshot(&self) -> Value {
        json!({
            "offset": OverlayOffset::from(self.controller.offset()),
            "scale": self.controller.zoom_factor(),
            "theme": self.themes.current_name(),
            "themeStyle": self.themes.current().to_spec(),
            "selectedTags": self.tags.selected(),
            "metrics": &self.metrics,
        })
    }
}
