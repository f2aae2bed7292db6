//! LayerPaint: layered raster-image editor core.
//!
//! The GUI is an external collaborator: it forwards pointer phases and tool
//! selections into a [`project::Project`] and displays the composited
//! RGBA8 buffer it gets back.

pub mod canvas;
pub mod cli;
pub mod components;
pub mod error;
pub mod io;
pub mod logger;
pub mod ops;
pub mod project;

pub use canvas::{Color, Image, Layer, PixelBuffer, Point, blend_pixel};
pub use components::history::History;
pub use components::tools::{FillMode, Tool, ToolEngine, ToolProperties};
pub use error::{CanvasError, ProjectFileError};
pub use project::{GestureEvent, GesturePhase, Project};
