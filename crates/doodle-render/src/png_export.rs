//! PNG encoding for exported drawings.

use crate::raster::{RenderError, RenderResult};
use image::RgbaImage;

/// Encode a straight-alpha RGBA image as PNG bytes.
pub fn encode_png(image: &RgbaImage) -> RenderResult<Vec<u8>> {
    let (width, height) = image.dimensions();
    let mut png_data = Vec::new();
    {
        let mut encoder = png::Encoder::new(&mut png_data, width, height);
        encoder.set_color(png::ColorType::Rgba);
        encoder.set_depth(png::BitDepth::Eight);

        let mut writer = encoder
            .write_header()
            .map_err(|e| RenderError::Encode(format!("PNG header: {e}")))?;
        writer
            .write_image_data(image.as_raw())
            .map_err(|e| RenderError::Encode(format!("PNG data: {e}")))?;
    }
    log::debug!("Encoded {}x{} PNG ({} bytes)", width, height, png_data.len());
    Ok(png_data)
}
