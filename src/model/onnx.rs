//! ONNX Runtime inference for P(malicious). Input: [N, feature_dim] f32 with NaN for missing
//! values (the exported pipeline imputes them). Output: `[N, 2]` class probabilities, or `[N]`/`[N, 1]`.

use super::Classifier;
use crate::error::{FlowError, FlowResult};
use crate::features::FeatureVector;
use ndarray::Array2;
use ort::session::Session;
use ort::value::Value;
use std::path::Path;
use std::sync::{Mutex, OnceLock};

const ARTIFACT: &str = "trained model";

static ORT_ENV: OnceLock<()> = OnceLock::new();

fn init_env() {
    ORT_ENV.get_or_init(|| {
        let _ = ort::init().with_name("flow-sentry").commit();
    });
}

fn model_err(e: impl std::fmt::Display) -> FlowError {
    FlowError::Model(e.to_string())
}

pub struct OnnxClassifier {
    session: Mutex<Session>,
    output_name: String,
    feature_dim: usize,
}

impl OnnxClassifier {
    /// Load the model exported for a schema of `feature_dim` columns.
    /// A missing file or an absent `output_name` is a configuration fault.
    pub fn load(path: &Path, feature_dim: usize, output_name: &str) -> FlowResult<Self> {
        if !path.exists() {
            return Err(FlowError::MissingArtifact {
                what: ARTIFACT,
                path: path.to_path_buf(),
            });
        }
        init_env();

        let session = Session::builder()
            .map_err(model_err)?
            .commit_from_file(path)
            .map_err(|e| FlowError::InvalidArtifact {
                what: ARTIFACT,
                path: path.to_path_buf(),
                reason: e.to_string(),
            })?;

        let outputs: Vec<String> = session.outputs.iter().map(|o| o.name.clone()).collect();
        if !outputs.iter().any(|o| o == output_name) {
            return Err(FlowError::InvalidArtifact {
                what: ARTIFACT,
                path: path.to_path_buf(),
                reason: format!("no output named '{}' (outputs: {:?})", output_name, outputs),
            });
        }
        let input = session
            .inputs
            .first()
            .map(|i| i.name.clone())
            .unwrap_or_default();
        tracing::info!(path = %path.display(), input = %input, output = output_name, feature_dim, "loaded ONNX model");

        Ok(Self {
            session: Mutex::new(session),
            output_name: output_name.to_string(),
            feature_dim,
        })
    }

    pub fn feature_dim(&self) -> usize {
        self.feature_dim
    }
}

impl Classifier for OnnxClassifier {
    fn predict_proba(&self, batch: &[FeatureVector]) -> FlowResult<Vec<f32>> {
        let n = batch.len();
        if n == 0 {
            return Ok(Vec::new());
        }
        let mut data = Vec::with_capacity(n * self.feature_dim);
        for v in batch {
            if v.dim() != self.feature_dim {
                return Err(FlowError::Model(format!(
                    "vector has {} features, model expects {}",
                    v.dim(),
                    self.feature_dim
                )));
            }
            data.extend(v.to_model_row());
        }
        let arr = Array2::from_shape_vec((n, self.feature_dim), data).map_err(model_err)?;
        let input = Value::from_array(arr).map_err(model_err)?;

        let mut session = self
            .session
            .lock()
            .map_err(|_| FlowError::Model("session lock poisoned".into()))?;
        let outputs = session.run(ort::inputs![input]).map_err(model_err)?;
        let output = outputs
            .get(self.output_name.as_str())
            .ok_or_else(|| FlowError::Model(format!("output '{}' missing", self.output_name)))?;
        let raw = output.try_extract_tensor::<f32>().map_err(model_err)?.1;

        let cols = raw.len() / n;
        if cols == 0 || cols > 2 || raw.len() % n != 0 {
            return Err(FlowError::Model(format!(
                "unexpected output size {} for {} rows",
                raw.len(),
                n
            )));
        }
        let positive = cols - 1;
        let probs: FlowResult<Vec<f32>> = (0..n)
            .map(|i| {
                let p = raw[i * cols + positive];
                if p.is_finite() {
                    Ok(p.clamp(0.0, 1.0))
                } else {
                    Err(FlowError::Model(format!("non-finite probability at row {}", i)))
                }
            })
            .collect();
        probs
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_model_is_a_configuration_fault() {
        let err = OnnxClassifier::load(Path::new("nonexistent.onnx"), 4, "probabilities")
            .err()
            .unwrap();
        assert!(err.is_configuration());
        assert!(err.to_string().contains("nonexistent.onnx"));
    }
}
