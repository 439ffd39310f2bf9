//! egui application shell.

use crate::config::{AppConfig, ConfigError};
use crate::controller::{CanvasController, ControllerSettings};
use crate::share::{ClipboardShare, FileShare, ShareTarget};
use doodle_classifier::{ClassifierError, ClassifierState, ImageClassifier, OnnxModel};
use doodle_core::{SerializableColor, Stroke};
use egui::{Color32, Pos2, Sense, Vec2};
use kurbo::Point;
use std::sync::Arc;
use std::time::Instant;
use thiserror::Error;

/// Startup errors.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),
    #[error("Failed to load classifier: {0}")]
    Model(#[from] ClassifierError),
    #[error("GUI error: {0}")]
    Gui(String),
}

fn color32(color: SerializableColor) -> Color32 {
    Color32::from_rgba_unmultiplied(color.r, color.g, color.b, color.a)
}

/// Main application struct.
pub struct DoodleApp {
    controller: CanvasController,
    background: Color32,
}

impl DoodleApp {
    pub fn new(
        cc: &eframe::CreationContext<'_>,
        mut controller: CanvasController,
        config: &AppConfig,
    ) -> Self {
        let ctx = cc.egui_ctx.clone();
        controller
            .classifier_mut()
            .set_waker(Arc::new(move || ctx.request_repaint()));

        let background = config
            .background_color()
            .map(color32)
            .unwrap_or(Color32::WHITE);
        Self { controller, background }
    }

    fn share(&self, target: &dyn ShareTarget) {
        if let Err(e) = self.controller.share(target) {
            log::error!("Share failed: {}", e);
        }
    }

    fn toolbar(&mut self, ui: &mut egui::Ui, now: Instant) {
        ui.horizontal(|ui| {
            if ui.button("Save").clicked() {
                self.share(&FileShare);
            }
            if ui.button("Copy").clicked() {
                self.share(&ClipboardShare);
            }

            ui.separator();
            let mut text = egui::RichText::new(self.controller.label()).size(20.0).strong();
            if matches!(self.controller.classifier_state(), ClassifierState::Inferring(_)) {
                text = text.italics();
            }
            ui.label(text);

            ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                if ui.button("Clear").clicked() {
                    self.controller.clear();
                }
                if ui.button("Undo").clicked() {
                    self.controller.undo(now);
                }
            });
        });
    }

    fn canvas(&mut self, ui: &mut egui::Ui, now: Instant) {
        let (response, painter) = ui.allocate_painter(ui.available_size(), Sense::drag());
        let origin = response.rect.min;
        let to_canvas =
            |pos: Pos2| Point::new((pos.x - origin.x) as f64, (pos.y - origin.y) as f64);

        let pressure = ui.input(|i| {
            i.events.iter().rev().find_map(|event| match event {
                egui::Event::Touch { force, .. } => *force,
                _ => None,
            })
        });
        let pressure = pressure.map_or(1.0, |f| f as f64);

        if let Some(pos) = response.interact_pointer_pos() {
            if response.drag_started() {
                self.controller.begin_stroke(to_canvas(pos), pressure, now);
            } else if response.dragged() {
                self.controller.extend_stroke(to_canvas(pos), pressure, now);
            }
        }
        if response.drag_stopped() {
            self.controller.end_stroke(now);
        }

        let strokes = self.controller.drawing().strokes().iter();
        for stroke in strokes.chain(self.controller.active_stroke()) {
            paint_stroke(&painter, stroke, origin);
        }
    }
}

fn paint_stroke(painter: &egui::Painter, stroke: &Stroke, origin: Pos2) {
    let color = color32(stroke.color);
    let to_screen = |p: Point| origin + Vec2::new(p.x as f32, p.y as f32);
    let points: Vec<Pos2> = stroke.points.iter().map(|p| to_screen(p.position)).collect();

    for (p, point) in stroke.points.iter().zip(&points) {
        // Round joins and caps
        painter.circle_filled(*point, (stroke.width * p.pressure / 2.0) as f32, color);
    }
    for (segment, pair) in stroke.points.windows(2).zip(points.windows(2)) {
        let width = stroke.width * (segment[0].pressure + segment[1].pressure) / 2.0;
        painter.line_segment([pair[0], pair[1]], egui::Stroke::new(width as f32, color));
    }
}

impl eframe::App for DoodleApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        let now = Instant::now();
        self.controller.set_scale(ctx.pixels_per_point() as f64);

        egui::TopBottomPanel::top("toolbar").show(ctx, |ui| self.toolbar(ui, now));
        egui::CentralPanel::default()
            .frame(egui::Frame::default().fill(self.background))
            .show(ctx, |ui| self.canvas(ui, now));

        self.controller.tick(now);
        if let Some(wait) = self.controller.time_until_finish(now) {
            ctx.request_repaint_after(wait);
        }
    }
}

/// Load configuration and the model, then run the window until closed.
pub fn run() -> Result<(), AppError> {
    let config = AppConfig::load()?;
    let (model_path, labels_path) = config.model_paths()?;
    let model = OnnxModel::load(model_path, labels_path, config.model_input)?;

    let classifier = ImageClassifier::new(Arc::new(model));
    let controller = CanvasController::new(classifier, ControllerSettings::try_from(&config)?);

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_title(config.title.clone())
            .with_inner_size([config.width as f32, config.height as f32]),
        ..Default::default()
    };

    let title = config.title.clone();
    eframe::run_native(
        &title,
        options,
        Box::new(move |cc| Ok(Box::new(DoodleApp::new(cc, controller, &config)))),
    )
    .map_err(|e| AppError::Gui(e.to_string()))
}
