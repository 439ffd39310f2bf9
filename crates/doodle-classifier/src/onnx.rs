//! ONNX model backed by the pure-Rust tract runtime.

use crate::error::{ClassifierError, ClassifierResult};
use crate::labels::load_labels;
use crate::model::{ClassificationModel, InputSpec, ModelInput, normalize_scores};
use doodle_core::Classification;
use std::path::Path;
use tract_onnx::prelude::*;

/// A single-input, single-output ONNX classifier.
pub struct OnnxModel {
    plan: TypedRunnableModel<TypedModel>,
    labels: Vec<String>,
    spec: InputSpec,
}

impl OnnxModel {
    /// Load and optimize a model for a fixed input geometry.
    ///
    /// Fails if the file cannot be parsed, the graph does not accept
    /// `spec`, or the output size disagrees with the label count.
    pub fn load(model_path: &Path, labels_path: &Path, spec: InputSpec) -> ClassifierResult<Self> {
        let labels = load_labels(labels_path)?;
        let load_err = |e: TractError| {
            ClassifierError::ModelLoad(format!("{}: {}", model_path.display(), e))
        };

        let plan = tract_onnx::onnx()
            .model_for_path(model_path)
            .and_then(|model| model.with_input_fact(0, f32::fact(spec.shape()).into()))
            .and_then(|model| model.into_optimized())
            .and_then(|model| model.into_runnable())
            .map_err(load_err)?;

        let output = plan.model().output_fact(0).map_err(load_err)?;
        if let Some(dims) = output.shape.as_concrete() {
            let classes: usize = dims.iter().product();
            if classes != labels.len() {
                return Err(ClassifierError::ModelLoad(format!(
                    "model has {} outputs but {} labels were given",
                    classes,
                    labels.len()
                )));
            }
        }

        log::info!(
            "Loaded model {} ({}x{} {:?}, {} classes)",
            model_path.display(),
            spec.width,
            spec.height,
            spec.pixel_format,
            labels.len()
        );
        Ok(Self { plan, labels, spec })
    }

    pub fn labels(&self) -> &[String] {
        &self.labels
    }
}

impl ClassificationModel for OnnxModel {
    fn input_spec(&self) -> InputSpec {
        self.spec
    }

    fn predict(&self, input: &ModelInput) -> ClassifierResult<Vec<Classification>> {
        let infer_err = |e: TractError| ClassifierError::Inference(e.to_string());

        let tensor = Tensor::from_shape(&input.spec.shape(), &input.data).map_err(infer_err)?;
        let outputs = self.plan.run(tvec!(tensor.into())).map_err(infer_err)?;
        let output = outputs
            .first()
            .ok_or_else(|| ClassifierError::Inference("model produced no outputs".to_string()))?;
        let view = output.to_array_view::<f32>().map_err(infer_err)?;
        let raw: Vec<f32> = view.iter().copied().collect();

        let scores = normalize_scores(&raw);
        Ok(self
            .labels
            .iter()
            .zip(scores)
            .map(|(label, score)| Classification::new(label.clone(), score))
            .collect())
    }
}
