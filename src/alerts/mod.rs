//! Inference & alerting: raw file → inference leakage policy → schema binding → model →
//! thresholded, rankable alert table.

mod engine;
mod table;

pub use engine::{decide, rank, score, AlertEngine, ScoredFlow};
pub use table::{write_alert_table, AlertTable};

use crate::error::{FlowError, FlowResult};
use crate::features::{FeatureSchema, LeakageFilter, MissingAudit};
use crate::flows::{self, FlowTable, RawRecord};
use crate::model::Classifier;
use std::path::Path;
use tracing::{debug, info};

/// Per-invocation scoring parameters. The threshold is a false-positive/false-negative
/// tradeoff chosen by the caller.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScoringOptions {
    pub threshold: f32,
    /// Rows to score; 0 scores the whole file
    pub nrows: usize,
    pub batch_size: usize,
}

impl Default for ScoringOptions {
    fn default() -> Self {
        Self {
            threshold: 0.5,
            nrows: 0,
            batch_size: 4096,
        }
    }
}

/// Score a raw flow file against a trained model and its schema.
pub fn score_file(
    path: &Path,
    model: &dyn Classifier,
    schema: &FeatureSchema,
    filter: &LeakageFilter,
    options: &ScoringOptions,
) -> FlowResult<(AlertTable, MissingAudit)> {
    let limit = (options.nrows > 0).then_some(options.nrows);
    let table = flows::read_flow_table(path, limit)?;
    info!(input = %path.display(), rows = table.len(), "scoring flows");
    score_table(&table, model, schema, filter, options)
}

pub fn score_table(
    table: &FlowTable,
    model: &dyn Classifier,
    schema: &FeatureSchema,
    filter: &LeakageFilter,
    options: &ScoringOptions,
) -> FlowResult<(AlertTable, MissingAudit)> {
    let engine = AlertEngine::new(options.threshold)?;
    if options.batch_size == 0 {
        return Err(FlowError::InvalidConfig("batch size must be positive".into()));
    }
    let normalizer = filter.normalizer();
    let mut audit = MissingAudit::default();
    let mut flows = Vec::with_capacity(table.len());

    let mut batch = Vec::with_capacity(options.batch_size.min(table.len()));
    let mut pending = Vec::with_capacity(batch.capacity());
    for (chunk_index, rows) in table.rows.chunks(options.batch_size).enumerate() {
        let chunk_start = chunk_index * options.batch_size;
        batch.clear();
        pending.clear();
        for row in rows {
            let record = RawRecord::from_row(&table.header, row.iter());
            pending.push(filter.metadata(&record));
            let features = normalizer.normalize(&record, &mut audit);
            batch.push(schema.bind_audited(&features, &mut audit));
        }
        let probs = model.predict_proba(&batch)?;
        if probs.len() != batch.len() {
            return Err(FlowError::Model(format!(
                "model returned {} probabilities for {} rows",
                probs.len(),
                batch.len()
            )));
        }
        for (offset, (metadata, p)) in pending.drain(..).zip(probs).enumerate() {
            flows.push(engine.score_flow(chunk_start + offset, metadata, p));
        }
        debug!(scored = flows.len(), "batch scored");
    }

    let alerts = AlertTable {
        metadata_columns: filter.metadata_columns(&table.header),
        flows,
    };
    info!(
        scored = alerts.len(),
        alerts = alerts.alert_count(),
        threshold = engine.threshold(),
        missing = audit.total(),
        "scoring complete"
    );
    Ok((alerts, audit))
}
