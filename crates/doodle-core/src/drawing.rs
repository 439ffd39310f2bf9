//! Hand-drawn strokes and the drawing that owns them.

use kurbo::{Point, Rect};
use peniko::Color;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use uuid::Uuid;

/// Unique identifier for a stroke.
pub type StrokeId = Uuid;

/// Default pen width in logical pixels.
pub const DEFAULT_STROKE_WIDTH: f64 = 20.0;

/// Serializable color representation (RGBA8).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SerializableColor {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl SerializableColor {
    pub fn new(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    pub fn black() -> Self {
        Self::new(0, 0, 0, 255)
    }

    pub fn white() -> Self {
        Self::new(255, 255, 255, 255)
    }
}

impl From<Color> for SerializableColor {
    fn from(color: Color) -> Self {
        let rgba = color.to_rgba8();
        Self {
            r: rgba.r,
            g: rgba.g,
            b: rgba.b,
            a: rgba.a,
        }
    }
}

impl From<SerializableColor> for Color {
    fn from(color: SerializableColor) -> Self {
        Color::from_rgba8(color.r, color.g, color.b, color.a)
    }
}

/// A single pointer sample within a stroke.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StrokePoint {
    /// Position in canvas (logical) coordinates.
    pub position: Point,
    /// Normalized pen pressure in `0.0..=1.0`. Mouse input reports `1.0`.
    pub pressure: f64,
    /// Time elapsed since the stroke began.
    pub time: Duration,
}

impl StrokePoint {
    /// Create a full-pressure sample.
    pub fn new(position: Point, time: Duration) -> Self {
        Self::with_pressure(position, 1.0, time)
    }

    /// Create a sample with explicit pressure (clamped to `0.0..=1.0`).
    pub fn with_pressure(position: Point, pressure: f64, time: Duration) -> Self {
        let pressure = if pressure.is_finite() { pressure.clamp(0.0, 1.0) } else { 1.0 };
        Self { position, pressure, time }
    }
}

/// A continuous pen stroke.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Stroke {
    pub(crate) id: StrokeId,
    /// Samples in input order.
    pub points: Vec<StrokePoint>,
    /// Nominal pen width in logical pixels.
    pub width: f64,
    /// Ink color.
    pub color: SerializableColor,
}

impl Stroke {
    /// Create an empty black stroke with the given width.
    pub fn new(width: f64) -> Self {
        Self {
            id: Uuid::new_v4(),
            points: Vec::new(),
            width,
            color: SerializableColor::black(),
        }
    }

    /// Create a stroke from existing samples.
    pub fn from_points(points: Vec<StrokePoint>, width: f64) -> Self {
        Self {
            points,
            ..Self::new(width)
        }
    }

    pub fn id(&self) -> StrokeId {
        self.id
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    /// Bounding box of the inked area, including half the pen width on
    /// every side. `None` for a stroke with no samples.
    pub fn bounds(&self) -> Option<Rect> {
        let first = self.points.first()?.position;
        let hull = self
            .points
            .iter()
            .skip(1)
            .fold(Rect::from_points(first, first), |rect, p| rect.union_pt(p.position));
        Some(hull.inflate(self.width / 2.0, self.width / 2.0))
    }
}

/// Accumulates pointer samples for the stroke currently being drawn.
#[derive(Debug, Clone)]
pub struct StrokeBuilder {
    stroke: Stroke,
}

impl StrokeBuilder {
    pub fn new(width: f64, color: SerializableColor) -> Self {
        let mut stroke = Stroke::new(width);
        stroke.color = color;
        Self { stroke }
    }

    /// Append a sample. Returns false if it repeats the previous position.
    pub fn push(&mut self, point: StrokePoint) -> bool {
        if self.stroke.points.last().is_some_and(|last| last.position == point.position) {
            return false;
        }
        self.stroke.points.push(point);
        true
    }

    /// The stroke as drawn so far.
    pub fn stroke(&self) -> &Stroke {
        &self.stroke
    }

    /// Finish the stroke. `None` if no samples were recorded.
    pub fn finish(self) -> Option<Stroke> {
        if self.stroke.is_empty() {
            None
        } else {
            Some(self.stroke)
        }
    }
}

/// An ordered sequence of strokes.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Drawing {
    strokes: Vec<Stroke>,
}

impl Drawing {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a stroke. Empty strokes are dropped; returns whether the
    /// drawing changed.
    pub fn push_stroke(&mut self, stroke: Stroke) -> bool {
        if stroke.is_empty() {
            return false;
        }
        self.strokes.push(stroke);
        true
    }

    /// Remove the most recent stroke.
    pub fn undo_last_stroke(&mut self) -> Option<Stroke> {
        self.strokes.pop()
    }

    /// Remove every stroke.
    pub fn clear(&mut self) {
        self.strokes.clear();
    }

    pub fn strokes(&self) -> &[Stroke] {
        &self.strokes
    }

    pub fn stroke_count(&self) -> usize {
        self.strokes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.strokes.is_empty()
    }

    /// Bounding box of all ink. `None` when there is nothing to classify,
    /// either because there are no strokes or the area is zero.
    pub fn bounds(&self) -> Option<Rect> {
        let rect = self
            .strokes
            .iter()
            .filter_map(Stroke::bounds)
            .reduce(|acc, r| acc.union(r))?;
        if rect.width() > 0.0 && rect.height() > 0.0 {
            Some(rect)
        } else {
            None
        }
    }

    /// The smallest square centered on [`Self::bounds`] that contains it.
    pub fn bounding_square(&self) -> Option<Rect> {
        let bounds = self.bounds()?;
        let side = bounds.width().max(bounds.height());
        Some(Rect::from_center_size(bounds.center(), (side, side)))
    }
}
