//! Canvas controller: owns the live drawing and decides when it is finished.
//!
//! All methods run on the UI thread. Timestamps are passed in explicitly so
//! the frame loop (or a test) controls the clock.

use crate::config::{AppConfig, ConfigError};
use crate::share::{ShareError, ShareTarget, SharedImage};
use doodle_classifier::{ClassifierState, ImageClassifier};
use doodle_core::{
    ClassificationResult, Debouncer, Drawing, RequestId, SerializableColor, Stroke, StrokeBuilder,
    StrokePoint,
};
use doodle_render::{RenderOptions, encode_png, render_drawing};
use kurbo::Point;
use std::time::{Duration, Instant};

/// Tunables taken from [`AppConfig`].
#[derive(Debug, Clone)]
pub struct ControllerSettings {
    pub stroke_width: f64,
    pub stroke_color: SerializableColor,
    pub render: RenderOptions,
}

impl Default for ControllerSettings {
    fn default() -> Self {
        Self {
            stroke_width: doodle_core::DEFAULT_STROKE_WIDTH,
            stroke_color: SerializableColor::black(),
            render: RenderOptions::default(),
        }
    }
}

impl TryFrom<&AppConfig> for ControllerSettings {
    type Error = ConfigError;

    fn try_from(config: &AppConfig) -> Result<Self, Self::Error> {
        Ok(Self {
            stroke_width: config.stroke_width,
            stroke_color: config.stroke_color()?,
            render: RenderOptions::default()
                .with_padding(config.render_padding)
                .with_background(config.background_color()?),
        })
    }
}

/// The stroke currently under the pointer.
struct ActiveStroke {
    builder: StrokeBuilder,
    started: Instant,
}

pub struct CanvasController {
    drawing: Drawing,
    active: Option<ActiveStroke>,
    debouncer: Debouncer,
    classifier: ImageClassifier,
    settings: ControllerSettings,
    label: String,
    last_result: Option<ClassificationResult>,
    /// Newest request handed to the classifier.
    last_issued: RequestId,
    /// Newest request whose result reached the label.
    last_applied: RequestId,
    /// Results for requests up to this id predate a clear and are dropped.
    discard_up_to: RequestId,
}

impl CanvasController {
    pub fn new(classifier: ImageClassifier, settings: ControllerSettings) -> Self {
        Self {
            drawing: Drawing::new(),
            active: None,
            debouncer: Debouncer::default(),
            classifier,
            settings,
            label: String::new(),
            last_result: None,
            last_issued: 0,
            last_applied: 0,
            discard_up_to: 0,
        }
    }

    pub fn drawing(&self) -> &Drawing {
        &self.drawing
    }

    /// The stroke being drawn, not yet part of the drawing.
    pub fn active_stroke(&self) -> Option<&Stroke> {
        self.active.as_ref().map(|a| a.builder.stroke())
    }

    /// The displayed prediction; empty when there is none.
    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn last_result(&self) -> Option<&ClassificationResult> {
        self.last_result.as_ref()
    }

    pub fn classifier_state(&self) -> ClassifierState {
        self.classifier.state()
    }

    pub fn classifier_mut(&mut self) -> &mut ImageClassifier {
        &mut self.classifier
    }

    pub fn settings(&self) -> &ControllerSettings {
        &self.settings
    }

    /// Set the device pixel ratio used when rendering the bitmap.
    pub fn set_scale(&mut self, scale: f64) {
        self.settings.render.scale = scale;
    }

    /// Time until the pending classification fires, if one is pending.
    pub fn time_until_finish(&self, now: Instant) -> Option<Duration> {
        self.debouncer.remaining(now)
    }

    /// Pointer down: start a new stroke.
    pub fn begin_stroke(&mut self, position: Point, pressure: f64, now: Instant) {
        if self.active.is_some() {
            self.end_stroke(now);
        }
        let mut builder =
            StrokeBuilder::new(self.settings.stroke_width, self.settings.stroke_color);
        builder.push(StrokePoint::with_pressure(position, pressure, Duration::ZERO));
        self.active = Some(ActiveStroke { builder, started: now });
        self.keep_alive(now);
    }

    /// Pointer moved while down.
    pub fn extend_stroke(&mut self, position: Point, pressure: f64, now: Instant) {
        let Some(active) = self.active.as_mut() else {
            return;
        };
        let time = now.saturating_duration_since(active.started);
        active.builder.push(StrokePoint::with_pressure(position, pressure, time));
        self.keep_alive(now);
    }

    /// Pointer up: commit the stroke to the drawing.
    pub fn end_stroke(&mut self, now: Instant) {
        let Some(active) = self.active.take() else {
            return;
        };
        if let Some(stroke) = active.builder.finish() {
            self.drawing.push_stroke(stroke);
            self.drawing_changed(now);
        }
    }

    /// Abandon the stroke in progress without committing it.
    pub fn cancel_stroke(&mut self) {
        self.active = None;
    }

    /// Change notification for the stroke set. Returns false when the
    /// drawing is empty or has no area, in which case nothing is scheduled.
    pub fn drawing_changed(&mut self, now: Instant) -> bool {
        if self.drawing.bounds().is_none() {
            return false;
        }
        self.debouncer.notify(now);
        true
    }

    /// Pointer activity pushes back a pending classification.
    fn keep_alive(&mut self, now: Instant) {
        if self.debouncer.is_pending() {
            self.debouncer.notify(now);
        }
    }

    /// Per-frame update. Applies finished classifications to the label and
    /// fires the debounce. Returns true if a classification was requested.
    pub fn tick(&mut self, now: Instant) -> bool {
        self.apply_results();
        if self.active.is_some() || !self.debouncer.poll(now) {
            return false;
        }
        self.finish_drawing()
    }

    /// Render the drawing and hand it to the classifier.
    fn finish_drawing(&mut self) -> bool {
        match render_drawing(&self.drawing, &self.settings.render) {
            Ok(bitmap) => {
                log::debug!(
                    "Classifying {} strokes as {}x{} bitmap",
                    self.drawing.stroke_count(),
                    bitmap.width(),
                    bitmap.height()
                );
                self.last_issued = self.classifier.classify(bitmap.into_image());
                true
            }
            Err(e) => {
                log::warn!("Skipping classification: {}", e);
                false
            }
        }
    }

    fn apply_results(&mut self) {
        for result in self.classifier.poll() {
            let id = result.request_id;
            if id <= self.discard_up_to || id < self.last_applied {
                log::debug!("Dropping stale result for request {}", id);
                continue;
            }
            if let Some(top) = result.top() {
                self.label = top.label.clone();
                self.last_applied = id;
                self.last_result = Some(result);
            }
        }
    }

    /// Reset to an empty canvas with no label.
    pub fn clear(&mut self) {
        self.drawing.clear();
        self.active = None;
        self.reset_prediction();
    }

    /// Remove the most recent stroke. Returns false if there was none.
    pub fn undo(&mut self, now: Instant) -> bool {
        if self.drawing.undo_last_stroke().is_none() {
            return false;
        }
        if !self.drawing_changed(now) {
            self.reset_prediction();
        }
        true
    }

    fn reset_prediction(&mut self) {
        self.debouncer.cancel();
        self.label.clear();
        self.last_result = None;
        self.discard_up_to = self.last_issued;
    }

    /// Export the current drawing to `target`. An empty canvas shares nothing.
    pub fn share(&self, target: &dyn ShareTarget) -> Result<(), ShareError> {
        if self.drawing.bounds().is_none() {
            log::info!("Nothing to share");
            return Ok(());
        }
        let bitmap = render_drawing(&self.drawing, &self.settings.render)
            .map_err(|e| ShareError::Render(e.to_string()))?;
        let png = encode_png(&bitmap.image).map_err(|e| ShareError::Render(e.to_string()))?;
        target.share(&SharedImage {
            rgba: bitmap.into_image(),
            png,
        })
    }
}
