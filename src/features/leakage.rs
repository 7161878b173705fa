//! Leakage policies: identifiers, raw addresses and timestamps let a classifier memorize
//! flows instead of learning traffic patterns, so they never enter a feature vector.

use super::Normalizer;
use crate::config::ColumnsConfig;
use crate::flows::RawRecord;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct LeakageFilter {
    /// Removed outright
    drop: Vec<String>,
    /// Kept raw alongside the score, in this order
    metadata: Vec<String>,
    /// Metadata columns that are not features
    metadata_only: Vec<String>,
}

fn push_unique(list: &mut Vec<String>, name: &str) {
    let name = name.trim();
    if !list.iter().any(|c| c == name) {
        list.push(name.to_string());
    }
}

fn trimmed(list: &[String]) -> Vec<String> {
    let mut out = Vec::with_capacity(list.len());
    for name in list {
        push_unique(&mut out, name);
    }
    out
}

impl LeakageFilter {
    /// Training policy: drops identifiers, addresses, timestamps, the raw label and
    /// the provenance column. Nothing is retained.
    pub fn training(columns: &ColumnsConfig) -> Self {
        let mut drop = trimmed(&columns.training_drop);
        push_unique(&mut drop, &columns.label);
        push_unique(&mut drop, crate::dataset::SOURCE_FILE_COLUMN);
        Self {
            drop,
            metadata: Vec::new(),
            metadata_only: Vec::new(),
        }
    }

    /// Inference policy: drops identifiers, timestamps and the label (if the file has one);
    /// keeps addresses, ports and protocol as triage metadata. Addresses stay out of the
    /// feature vector, ports and protocol remain features as they were at training time.
    pub fn inference(columns: &ColumnsConfig) -> Self {
        let mut drop = trimmed(&columns.inference_drop);
        push_unique(&mut drop, &columns.label);
        push_unique(&mut drop, crate::dataset::SOURCE_FILE_COLUMN);
        let metadata = trimmed(&columns.metadata);
        let metadata_only = trimmed(&columns.metadata_only)
            .into_iter()
            .filter(|c| metadata.contains(c))
            .collect();
        Self {
            drop,
            metadata,
            metadata_only,
        }
    }

    pub fn is_feature(&self, name: &str) -> bool {
        !self.drop.iter().any(|c| c == name) && !self.metadata_only.iter().any(|c| c == name)
    }

    /// Columns the normalizer must not coerce into features.
    pub fn feature_exclusions(&self) -> impl Iterator<Item = &str> {
        self.drop
            .iter()
            .chain(self.metadata_only.iter())
            .map(String::as_str)
    }

    pub fn normalizer(&self) -> Normalizer {
        Normalizer::new(self.feature_exclusions())
    }

    /// Configured metadata columns present in `header`, in configured order.
    pub fn metadata_columns<S: AsRef<str>>(&self, header: &[S]) -> Vec<String> {
        self.metadata
            .iter()
            .filter(|m| header.iter().any(|h| h.as_ref().trim() == m.as_str()))
            .cloned()
            .collect()
    }

    /// Raw metadata values of one record, for triage.
    pub fn metadata(&self, record: &RawRecord) -> Vec<(String, String)> {
        self.metadata
            .iter()
            .filter_map(|m| record.get(m).map(|v| (m.clone(), v.trim().to_string())))
            .collect()
    }

    /// Feature columns a header would contribute under this policy.
    pub fn feature_columns<S: AsRef<str>>(&self, header: &[S]) -> Vec<String> {
        header
            .iter()
            .map(|h| h.as_ref().trim())
            .filter(|h| self.is_feature(h))
            .map(str::to_string)
            .collect()
    }
}
