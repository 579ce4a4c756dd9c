pub mod export;
pub mod logging;
pub mod overlay;
pub mod session;
pub mod settings;
pub mod tags;

pub use session::Session;
