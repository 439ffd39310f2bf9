//! Doodle Render Library
//!
//! Offscreen rasterization of a [`doodle_core::Drawing`] into the square
//! bitmap handed to the classifier and to share targets.

mod png_export;
mod raster;

pub use png_export::encode_png;
pub use raster::{
    Bitmap, DEFAULT_MAX_SIDE_PX, RenderError, RenderOptions, RenderResult, render_drawing,
};
