//! CPU rasterizer built on tiny-skia.

use doodle_core::{Drawing, SerializableColor, Stroke};
use image::{Rgba, RgbaImage};
use kurbo::Rect;
use thiserror::Error;
use tiny_skia::{FillRule, LineCap, LineJoin, Paint, PathBuilder, Pixmap, Transform};

/// Largest bitmap side produced, in physical pixels.
pub const DEFAULT_MAX_SIDE_PX: u32 = 4096;

/// Renderer errors.
#[derive(Debug, Error)]
pub enum RenderError {
    #[error("Drawing is empty")]
    EmptyDrawing,
    #[error("Degenerate geometry: {0}")]
    Degenerate(String),
    #[error("Encode failed: {0}")]
    Encode(String),
}

/// Result type for render operations.
pub type RenderResult<T> = Result<T, RenderError>;

/// Options for exporting a drawing as a bitmap.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RenderOptions {
    /// Device pixel ratio applied to logical coordinates.
    pub scale: f64,
    /// Extra margin around the bounding square, in logical pixels.
    pub padding: f64,
    /// Solid fill behind the ink.
    pub background: SerializableColor,
    /// Upper bound on the output side; larger drawings are scaled down.
    pub max_side_px: u32,
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            scale: 1.0,
            padding: 0.0,
            background: SerializableColor::white(),
            max_side_px: DEFAULT_MAX_SIDE_PX,
        }
    }
}

impl RenderOptions {
    /// Set the device pixel ratio.
    pub fn with_scale(mut self, scale: f64) -> Self {
        self.scale = scale;
        self
    }

    /// Set the padding around the drawing.
    pub fn with_padding(mut self, padding: f64) -> Self {
        self.padding = padding;
        self
    }

    /// Set the background color.
    pub fn with_background(mut self, color: impl Into<SerializableColor>) -> Self {
        self.background = color.into();
        self
    }
}

/// A rendered drawing.
#[derive(Debug, Clone)]
pub struct Bitmap {
    /// Straight-alpha RGBA pixels.
    pub image: RgbaImage,
    /// The logical-coordinate square that was captured.
    pub source: Rect,
    /// Physical pixels per logical pixel actually used.
    pub scale: f64,
}

impl Bitmap {
    pub fn width(&self) -> u32 {
        self.image.width()
    }

    pub fn height(&self) -> u32 {
        self.image.height()
    }

    pub fn into_image(self) -> RgbaImage {
        self.image
    }
}

/// Render the drawing cropped to its bounding square.
pub fn render_drawing(drawing: &Drawing, options: &RenderOptions) -> RenderResult<Bitmap> {
    let square = drawing.bounding_square().ok_or(RenderError::EmptyDrawing)?;
    let padding = options.padding.max(0.0);
    let source = square.inflate(padding, padding);

    if !(source.is_finite() && options.scale.is_finite() && options.scale > 0.0) {
        return Err(RenderError::Degenerate(format!(
            "cannot rasterize {:?} at scale {}",
            source, options.scale
        )));
    }

    let mut scale = options.scale;
    let mut side = (source.width() * scale).ceil();
    if side > options.max_side_px as f64 {
        scale *= options.max_side_px as f64 / side;
        side = options.max_side_px as f64;
        log::debug!("Drawing downscaled to fit {}px (scale {:.3})", options.max_side_px, scale);
    }
    let side = (side as u32).max(1);

    let mut pixmap = Pixmap::new(side, side)
        .ok_or_else(|| RenderError::Degenerate(format!("cannot allocate {side}x{side} pixmap")))?;
    let bg = options.background;
    pixmap.fill(tiny_skia::Color::from_rgba8(bg.r, bg.g, bg.b, bg.a));

    let transform = Transform::from_scale(scale as f32, scale as f32)
        .pre_translate(-source.x0 as f32, -source.y0 as f32);

    for stroke in drawing.strokes() {
        draw_stroke(&mut pixmap, stroke, transform);
    }

    Ok(Bitmap {
        image: to_rgba_image(&pixmap),
        source,
        scale,
    })
}

fn ink_paint(color: SerializableColor) -> Paint<'static> {
    let mut paint = Paint::default();
    paint.set_color_rgba8(color.r, color.g, color.b, color.a);
    paint.anti_alias = true;
    paint
}

fn pen(width: f64) -> tiny_skia::Stroke {
    tiny_skia::Stroke {
        width: width as f32,
        line_cap: LineCap::Round,
        line_join: LineJoin::Round,
        ..Default::default()
    }
}

fn draw_stroke(pixmap: &mut Pixmap, stroke: &Stroke, transform: Transform) {
    let paint = ink_paint(stroke.color);

    if let [only] = stroke.points.as_slice() {
        // A tap leaves a round dot
        let radius = (stroke.width * only.pressure / 2.0) as f32;
        let (x, y) = (only.position.x as f32, only.position.y as f32);
        if let Some(dot) = PathBuilder::from_circle(x, y, radius) {
            pixmap.fill_path(&dot, &paint, FillRule::Winding, transform, None);
        }
        return;
    }

    let uniform = stroke
        .points
        .windows(2)
        .all(|w| (w[0].pressure - w[1].pressure).abs() < f64::EPSILON);

    if uniform {
        let mut pb = PathBuilder::new();
        for (i, p) in stroke.points.iter().enumerate() {
            if i == 0 {
                pb.move_to(p.position.x as f32, p.position.y as f32);
            } else {
                pb.line_to(p.position.x as f32, p.position.y as f32);
            }
        }
        let pressure = stroke.points.first().map_or(1.0, |p| p.pressure);
        if let Some(path) = pb.finish() {
            pixmap.stroke_path(&path, &paint, &pen(stroke.width * pressure), transform, None);
        }
        return;
    }

    for segment in stroke.points.windows(2) {
        let (a, b) = (segment[0], segment[1]);
        let mut pb = PathBuilder::new();
        pb.move_to(a.position.x as f32, a.position.y as f32);
        pb.line_to(b.position.x as f32, b.position.y as f32);
        let width = stroke.width * (a.pressure + b.pressure) / 2.0;
        if let Some(path) = pb.finish() {
            pixmap.stroke_path(&path, &paint, &pen(width), transform, None);
        }
    }
}

/// Convert premultiplied pixmap data into a straight-alpha image.
fn to_rgba_image(pixmap: &Pixmap) -> RgbaImage {
    let width = pixmap.width();
    let mut image = RgbaImage::new(width, pixmap.height());
    for (i, px) in pixmap.pixels().iter().enumerate() {
        let c = px.demultiply();
        let (x, y) = (i as u32 % width, i as u32 / width);
        image.put_pixel(x, y, Rgba([c.red(), c.green(), c.blue(), c.alpha()]));
    }
    image
}
