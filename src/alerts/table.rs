//! Alert table: metadata columns present in the input, then `prob_malicious`, `pred_is_malicious`.

use super::{rank, ScoredFlow};
use crate::error::{FlowError, FlowResult};
use std::path::Path;

pub const PROB_COLUMN: &str = "prob_malicious";
pub const PRED_COLUMN: &str = "pred_is_malicious";

#[derive(Debug, Clone, Default)]
pub struct AlertTable {
    pub metadata_columns: Vec<String>,
    /// In input order
    pub flows: Vec<ScoredFlow>,
}

impl AlertTable {
    pub fn len(&self) -> usize {
        self.flows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.flows.is_empty()
    }

    pub fn alert_count(&self) -> usize {
        self.flows.iter().filter(|f| f.is_alert()).count()
    }

    pub fn ranked(&self) -> Vec<ScoredFlow> {
        rank(self.flows.clone())
    }

    /// Highest-probability `n` flows, ties in input order.
    pub fn top(&self, n: usize) -> Vec<ScoredFlow> {
        let mut ranked = self.ranked();
        ranked.truncate(n);
        ranked
    }
}

/// Write `flows` (input order, or ranked when `ranked` is set).
pub fn write_alert_table(path: &Path, table: &AlertTable, ranked: bool) -> FlowResult<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).map_err(|e| FlowError::io(parent, e))?;
    }
    let mut writer = csv::Writer::from_path(path)?;

    let mut header: Vec<&str> = table.metadata_columns.iter().map(String::as_str).collect();
    header.push(PROB_COLUMN);
    header.push(PRED_COLUMN);
    writer.write_record(&header)?;

    let ordered;
    let flows: &[ScoredFlow] = if ranked {
        ordered = table.ranked();
        &ordered
    } else {
        &table.flows
    };
    for flow in flows {
        let mut fields: Vec<String> = table
            .metadata_columns
            .iter()
            .map(|c| flow.metadata_value(c).unwrap_or_default().to_string())
            .collect();
        fields.push(flow.prob_malicious.to_string());
        fields.push(flow.pred_is_malicious.to_string());
        writer.write_record(&fields)?;
    }
    writer.flush().map_err(|e| FlowError::io(path, e))?;
    tracing::info!(path = %path.display(), rows = flows.len(), ranked, "wrote alert table");
    Ok(())
}
