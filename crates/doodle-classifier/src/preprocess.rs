//! Bitmap to model-input conversion.
//!
//! The crop/scale policy is scale-to-fill: the bitmap is stretched to the
//! model's input size without preserving aspect ratio.

use crate::model::{InputSpec, ModelInput, PixelFormat};
use image::imageops::{self, FilterType};
use image::{Rgb, RgbImage, RgbaImage};

/// Flatten alpha onto white so transparent regions read as paper.
fn flatten_on_white(image: &RgbaImage) -> RgbImage {
    RgbImage::from_fn(image.width(), image.height(), |x, y| {
        let [r, g, b, a] = image.get_pixel(x, y).0;
        let alpha = a as f32 / 255.0;
        let blend = |c: u8| (c as f32 * alpha + 255.0 * (1.0 - alpha)).round() as u8;
        Rgb([blend(r), blend(g), blend(b)])
    })
}

fn luminance(px: &Rgb<u8>) -> f32 {
    let [r, g, b] = px.0;
    (0.299 * r as f32 + 0.587 * g as f32 + 0.114 * b as f32) / 255.0
}

/// Convert an arbitrary bitmap into the model's fixed input.
pub fn preprocess(image: &RgbaImage, spec: &InputSpec) -> ModelInput {
    let flat = flatten_on_white(image);
    let scaled = if flat.dimensions() == (spec.width, spec.height) {
        flat
    } else {
        imageops::resize(&flat, spec.width, spec.height, FilterType::Triangle)
    };

    let plane = (spec.width * spec.height) as usize;
    let mut data = vec![0.0; spec.len()];
    for (i, px) in scaled.pixels().enumerate() {
        match spec.pixel_format {
            PixelFormat::Grayscale => data[i] = luminance(px),
            PixelFormat::InvertedGrayscale => data[i] = 1.0 - luminance(px),
            PixelFormat::Rgb => {
                for (c, value) in px.0.iter().enumerate() {
                    data[c * plane + i] = *value as f32 / 255.0;
                }
            }
        }
    }

    ModelInput { spec: *spec, data }
}
