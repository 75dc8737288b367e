pub mod camera;
pub mod effects;
pub mod geometry;
pub mod idle;
pub mod layer;
pub mod projection;
pub mod renderer;

pub use layer::{CursorStyle, GlobeLayer};
pub use projection::GlobeViewport;
pub use renderer::{render_globe, DisplaySettings, GlobeFrame, Label};
