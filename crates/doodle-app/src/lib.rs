//! Doodle Recognizer Application
//!
//! The canvas controller, configuration, share targets and the egui shell
//! that ties drawing input to the classifier.

mod config;
mod controller;
mod share;

#[cfg(feature = "native")]
mod app;

pub use config::{AppConfig, ConfigError, LABELS_ENV, MODEL_ENV, parse_color};
pub use controller::{CanvasController, ControllerSettings};
pub use share::{DirectoryShare, ShareError, ShareTarget, SharedImage};

#[cfg(feature = "native")]
pub use app::{AppError, DoodleApp, run};
#[cfg(feature = "native")]
pub use share::{ClipboardShare, FileShare};
