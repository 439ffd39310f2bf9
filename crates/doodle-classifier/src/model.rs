//! The model boundary.

use crate::error::ClassifierResult;
use doodle_core::Classification;
use serde::{Deserialize, Serialize};

/// How pixels are presented to the model. Values are `0.0..=1.0`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PixelFormat {
    /// One channel, white = 1.0.
    Grayscale,
    /// One channel, ink = 1.0 on a 0.0 background.
    #[default]
    InvertedGrayscale,
    /// Three planar channels.
    Rgb,
}

impl PixelFormat {
    pub fn channels(self) -> usize {
        match self {
            PixelFormat::Grayscale | PixelFormat::InvertedGrayscale => 1,
            PixelFormat::Rgb => 3,
        }
    }
}

/// Fixed input geometry expected by a model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct InputSpec {
    pub width: u32,
    pub height: u32,
    pub pixel_format: PixelFormat,
}

impl Default for InputSpec {
    fn default() -> Self {
        Self {
            width: 28,
            height: 28,
            pixel_format: PixelFormat::InvertedGrayscale,
        }
    }
}

impl InputSpec {
    /// Tensor shape in NCHW order with a batch of one.
    pub fn shape(&self) -> [usize; 4] {
        [
            1,
            self.pixel_format.channels(),
            self.height as usize,
            self.width as usize,
        ]
    }

    pub fn len(&self) -> usize {
        self.shape().iter().product()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// A preprocessed image, ready for inference.
#[derive(Debug, Clone, PartialEq)]
pub struct ModelInput {
    pub spec: InputSpec,
    /// Planar NCHW values.
    pub data: Vec<f32>,
}

/// A pre-trained multi-class image classifier.
///
/// Implementations run on background threads, so they must be shareable.
pub trait ClassificationModel: Send + Sync {
    /// The input geometry this model accepts.
    fn input_spec(&self) -> InputSpec;

    /// Classify one preprocessed image. The returned entries need not be sorted.
    fn predict(&self, input: &ModelInput) -> ClassifierResult<Vec<Classification>>;
}

/// Turn raw model outputs into probabilities. Outputs that already form a
/// distribution are returned unchanged, anything else goes through softmax.
pub fn normalize_scores(raw: &[f32]) -> Vec<f32> {
    if raw.is_empty() {
        return Vec::new();
    }
    let in_range = raw.iter().all(|v| (0.0..=1.0).contains(v));
    let sum: f32 = raw.iter().sum();
    if in_range && (sum - 1.0).abs() < 1e-3 {
        return raw.to_vec();
    }

    let max = raw.iter().copied().fold(f32::NEG_INFINITY, f32::max);
    let exps: Vec<f32> = raw.iter().map(|v| (v - max).exp()).collect();
    let total: f32 = exps.iter().sum();
    exps.into_iter().map(|v| v / total).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_input_spec_shape() {
        let spec = InputSpec {
            width: 32,
            height: 16,
            pixel_format: PixelFormat::Rgb,
        };
        assert_eq!(spec.shape(), [1, 3, 16, 32]);
        assert_eq!(spec.len(), 3 * 16 * 32);
    }

    #[test]
    fn test_probabilities_pass_through() {
        let scores = normalize_scores(&[0.25, 0.5, 0.25]);
        assert_eq!(scores, vec![0.25, 0.5, 0.25]);
    }

    #[test]
    fn test_logits_are_softmaxed() {
        let scores = normalize_scores(&[2.0, 1.0, -3.0]);
        let sum: f32 = scores.iter().sum();
        assert!((sum - 1.0).abs() < 1e-5);
        assert!(scores[0] > scores[1] && scores[1] > scores[2]);
        assert!(scores.iter().all(|s| (0.0..=1.0).contains(s)));
    }

    #[test]
    fn test_empty_scores() {
        assert!(normalize_scores(&[]).is_empty());
    }
}
