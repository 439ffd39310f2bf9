//! Doodle Core Library
//!
//! Platform-agnostic data structures and timing logic for the doodle recognizer:
//! the hand-drawn [`Drawing`], the trailing [`Debouncer`] that decides when a
//! drawing is finished, and the ranked [`ClassificationResult`] a model produces.

pub mod classification;
pub mod debounce;
pub mod drawing;

pub use classification::{Classification, ClassificationResult, DEFAULT_TOP_N, RequestId};
pub use debounce::{DEFAULT_DEBOUNCE, Debouncer};
pub use drawing::{
    DEFAULT_STROKE_WIDTH, Drawing, SerializableColor, Stroke, StrokeBuilder, StrokeId, StrokePoint,
};
