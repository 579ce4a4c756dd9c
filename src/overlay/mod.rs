pub mod color;
pub mod fonts;
pub mod gesture;
pub mod icon;
pub mod input;
pub mod layout;
pub mod metrics;
pub mod raster;
pub mod surface;
pub mod theme;

pub use color::ThemeColor;
pub use gesture::{GestureController, GestureState, Transform, Viewport};
pub use icon::{parse_vector_icon, IconSet, VectorIcon};
pub use input::{dispatch, InputCommand, InputEvent};
pub use layout::{Badge, OverlayRenderer};
pub use metrics::Metrics;
pub use raster::RasterSurface;
pub use surface::{RecordingSurface, Surface};
pub use theme::{Theme, ThemeSpec, ThemeStore};
