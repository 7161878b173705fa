//! flow-sentry — feature contract, training-table builder and thresholded alerting for
//! binary (malicious vs benign) classifiers over CIC-style network flow records.
//!
//! Modular structure:
//! - [`flows`] — Raw flow records and CSV access
//! - [`features`] — Normalization, labeling, leakage filtering, schema binding
//! - [`dataset`] — Training table construction with per-file subsampling
//! - [`model`] — Classifier handle and ONNX inference
//! - [`alerts`] — Thresholded decisions, ranking, alert tables
//! - [`inspect`] — Raw input sanity check
//! - [`logging`] — Structured logging

pub mod config;
pub mod error;
pub mod flows;
pub mod features;
pub mod dataset;
pub mod model;
pub mod alerts;
pub mod inspect;
pub mod logging;

pub use config::Config;
pub use error::{FlowError, FlowResult};
pub use flows::{FlowTable, RawRecord};
pub use features::{FeatureSchema, FeatureVector, LeakageFilter, Labeler, Normalizer};
pub use dataset::{DatasetBuilder, TrainingTable};
pub use model::{Classifier, OnnxClassifier};
pub use alerts::{AlertEngine, AlertTable, ScoredFlow, ScoringOptions};
pub use logging::StructuredLogger;
