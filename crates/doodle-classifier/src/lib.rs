//! Doodle Classifier Library
//!
//! Adapter between rendered drawings and an opaque, pre-trained image
//! classification model: converts bitmaps into the model's fixed input,
//! runs inference on background threads, and republishes ranked results on
//! the thread that owns the [`ImageClassifier`].

mod classifier;
mod error;
mod labels;
mod model;
#[cfg(feature = "onnx")]
mod onnx;
mod preprocess;

pub use classifier::{ClassifierState, ImageClassifier, Subscriber, Waker, run_inference};
pub use error::{ClassifierError, ClassifierResult};
pub use labels::{load_labels, parse_labels};
pub use model::{ClassificationModel, InputSpec, ModelInput, PixelFormat, normalize_scores};
#[cfg(feature = "onnx")]
pub use onnx::OnnxModel;
pub use preprocess::preprocess;
