//! Pipeline configuration. Built once at process start and passed by reference to each stage.

use crate::error::{FlowError, FlowResult};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Artifact and data locations
    pub paths: PathsConfig,
    /// Training table construction
    pub dataset: DatasetConfig,
    /// Column conventions: label field and leakage policies
    pub columns: ColumnsConfig,
    /// Inference and alert thresholding
    pub scoring: ScoringConfig,
    /// Logging
    pub log: LogConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PathsConfig {
    /// Directory holding raw CIC flow CSVs
    pub raw_dir: PathBuf,
    /// Training table written by `build`
    pub dataset_path: PathBuf,
    /// ONNX export of the trained classifier
    pub model_path: PathBuf,
    /// Feature schema artifact (`feature_columns`)
    pub schema_path: PathBuf,
    /// Build report (per-file counts, class balance, missing audit)
    pub report_path: PathBuf,
    /// Default alert table destination
    pub alerts_path: PathBuf,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DatasetConfig {
    /// Rows kept per source file; 0 keeps every row
    pub sample_per_file: usize,
    /// Base seed; each file derives its own seed from it
    pub seed: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ColumnsConfig {
    /// Raw categorical label field
    pub label: String,
    /// The only label value mapped to benign (exact, case-sensitive)
    pub benign_token: String,
    /// Dropped before training (identifiers, addresses, timestamps, label, provenance)
    pub training_drop: Vec<String>,
    /// Dropped before inference
    pub inference_drop: Vec<String>,
    /// Retained raw on each scored flow for triage
    pub metadata: Vec<String>,
    /// Subset of `metadata` that never enters the feature vector
    pub metadata_only: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoringConfig {
    /// Alert when prob_malicious >= threshold (0.0–1.0)
    pub threshold: f32,
    /// Rows per model invocation
    pub batch_size: usize,
    /// ONNX output holding class probabilities
    pub output_name: String,
    /// Ranked alerts printed after scoring
    pub top: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LogConfig {
    pub level: String,
    pub json: bool,
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            raw_dir: PathBuf::from("data/raw"),
            dataset_path: PathBuf::from("data/processed/dataset_v1.csv"),
            model_path: PathBuf::from("models/rf_v1.onnx"),
            schema_path: PathBuf::from("models/features_v1.json"),
            report_path: PathBuf::from("reports/build_v1.json"),
            alerts_path: PathBuf::from("reports/alerts.csv"),
        }
    }
}

impl Default for DatasetConfig {
    fn default() -> Self {
        Self {
            sample_per_file: 150_000,
            seed: 42,
        }
    }
}

fn names(list: &[&str]) -> Vec<String> {
    list.iter().map(|s| s.to_string()).collect()
}

impl Default for ColumnsConfig {
    fn default() -> Self {
        Self {
            label: "Label".to_string(),
            benign_token: "BENIGN".to_string(),
            training_drop: names(&[
                "Flow ID",
                "Src IP",
                "Dst IP",
                "Timestamp",
                "Label",
                crate::dataset::SOURCE_FILE_COLUMN,
            ]),
            inference_drop: names(&[
                "Flow ID",
                "Timestamp",
                "Label",
                crate::dataset::SOURCE_FILE_COLUMN,
            ]),
            metadata: names(&["Src IP", "Dst IP", "Src Port", "Dst Port", "Protocol"]),
            metadata_only: names(&["Src IP", "Dst IP"]),
        }
    }
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self {
            threshold: 0.5,
            batch_size: 4096,
            output_name: "probabilities".to_string(),
            top: 25,
        }
    }
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json: false,
        }
    }
}

impl Config {
    /// Load from JSON file if present; otherwise return default.
    /// A file that exists but does not parse is a configuration fault.
    pub fn load(path: &Path) -> FlowResult<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let data = std::fs::read_to_string(path).map_err(|e| FlowError::io(path, e))?;
        let config: Config = serde_json::from_str(&data)
            .map_err(|e| FlowError::InvalidConfig(format!("{}: {}", path.display(), e)))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> FlowResult<()> {
        validate_threshold(self.scoring.threshold)?;
        if self.scoring.batch_size == 0 {
            return Err(FlowError::InvalidConfig(
                "scoring.batch_size must be positive".into(),
            ));
        }
        if self.columns.label.trim().is_empty() {
            return Err(FlowError::InvalidConfig("columns.label is empty".into()));
        }
        if let Some(c) = self
            .columns
            .metadata_only
            .iter()
            .find(|c| !self.columns.metadata.contains(c))
        {
            return Err(FlowError::InvalidConfig(format!(
                "columns.metadata_only entry '{}' is not listed in columns.metadata",
                c
            )));
        }
        Ok(())
    }
}

pub fn validate_threshold(threshold: f32) -> FlowResult<()> {
    if (0.0..=1.0).contains(&threshold) {
        Ok(())
    } else {
        Err(FlowError::InvalidThreshold(threshold))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_file_yields_defaults() {
        let c = Config::load(Path::new("definitely-not-here.json")).unwrap();
        assert_eq!(c.columns.label, "Label");
        assert_eq!(c.dataset.seed, 42);
        assert_eq!(c.scoring.threshold, 0.5);
    }

    #[test]
    fn partial_file_fills_in_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cfg.json");
        std::fs::write(&path, r#"{"scoring":{"threshold":0.7}}"#).unwrap();
        let c = Config::load(&path).unwrap();
        assert_eq!(c.scoring.threshold, 0.7);
        assert_eq!(c.scoring.batch_size, 4096);
        assert_eq!(c.dataset.sample_per_file, 150_000);
    }

    #[test]
    fn unparsable_file_is_a_fault() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cfg.json");
        std::fs::write(&path, "{not json").unwrap();
        assert!(matches!(
            Config::load(&path),
            Err(FlowError::InvalidConfig(_))
        ));
    }

    #[test]
    fn thresholds_outside_unit_interval_rejected() {
        assert!(validate_threshold(0.0).is_ok());
        assert!(validate_threshold(1.0).is_ok());
        assert!(validate_threshold(1.01).is_err());
        assert!(validate_threshold(f32::NAN).is_err());
    }

    #[test]
    fn metadata_only_must_be_metadata() {
        let mut c = Config::default();
        c.columns.metadata_only.push("Flow ID".into());
        assert!(c.validate().is_err());
    }
}
