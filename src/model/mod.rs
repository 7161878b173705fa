//! Trained classifier handle. Training happens outside this crate; the model is only ever
//! applied to schema-bound vectors and is never mutated here.

mod onnx;

pub use onnx::OnnxClassifier;

use crate::error::{FlowError, FlowResult};
use crate::features::FeatureVector;

pub trait Classifier {
    /// P(malicious) for each row of `batch`, same order, each in [0, 1].
    fn predict_proba(&self, batch: &[FeatureVector]) -> FlowResult<Vec<f32>>;
}

/// Any scoring closure is a classifier (rule-based baselines, test doubles).
impl<F> Classifier for F
where
    F: Fn(&FeatureVector) -> f32,
{
    fn predict_proba(&self, batch: &[FeatureVector]) -> FlowResult<Vec<f32>> {
        batch
            .iter()
            .enumerate()
            .map(|(i, v)| {
                let p = self(v);
                if p.is_finite() {
                    Ok(p.clamp(0.0, 1.0))
                } else {
                    Err(FlowError::Model(format!("non-finite probability at row {}", i)))
                }
            })
            .collect()
    }
}
