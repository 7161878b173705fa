//! Feature schema binding. The model matrix has no column names, only positions, so every
//! vector handed to it is reprojected here onto the exact training-time column order.

use super::{FeatureRecord, FeatureValue, FeatureVector, MissingAudit, MISSING};
use crate::dataset::{SOURCE_FILE_COLUMN, TARGET_COLUMN};
use crate::error::{FlowError, FlowResult};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::path::Path;

const ARTIFACT: &str = "feature schema";

/// Ordered training feature columns. Immutable once created.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeatureSchema {
    feature_columns: Vec<String>,
}

impl FeatureSchema {
    pub fn new<S: Into<String>>(columns: impl IntoIterator<Item = S>) -> Self {
        Self {
            feature_columns: columns.into_iter().map(Into::into).collect(),
        }
    }

    /// Schema of a training table: every column except the target and provenance.
    pub fn from_training_header<S: AsRef<str>>(header: &[S]) -> Self {
        Self::new(
            header
                .iter()
                .map(|h| h.as_ref().trim())
                .filter(|h| *h != TARGET_COLUMN && *h != SOURCE_FILE_COLUMN),
        )
    }

    pub fn columns(&self) -> &[String] {
        &self.feature_columns
    }

    pub fn len(&self) -> usize {
        self.feature_columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.feature_columns.is_empty()
    }

    /// Exactly `len()` values in schema order: present columns copied, absent ones missing,
    /// extras dropped.
    pub fn bind(&self, record: &FeatureRecord) -> FeatureVector {
        self.bind_audited(record, &mut MissingAudit::default())
    }

    pub fn bind_audited(&self, record: &FeatureRecord, audit: &mut MissingAudit) -> FeatureVector {
        let mut by_name: HashMap<&str, FeatureValue> = HashMap::with_capacity(record.len());
        for (name, value) in record.columns().zip(record.values()) {
            by_name.entry(name).or_insert(value);
        }
        let values = self
            .feature_columns
            .iter()
            .map(|c| match by_name.get(c.as_str()) {
                Some(v) => *v,
                None => {
                    audit.record_absent(c, 1);
                    MISSING
                }
            })
            .collect();
        FeatureVector::from_bound(values)
    }

    /// Inverse of [`bind`](Self::bind) for a vector already shaped to this schema.
    pub fn bind_as_record(&self, vector: &FeatureVector) -> FeatureRecord {
        self.feature_columns
            .iter()
            .cloned()
            .zip(vector.as_slice().iter().copied())
            .collect()
    }

    /// Precomputed positional mapping from a source header onto this schema.
    pub fn projection<S: AsRef<str>>(&self, header: &[S]) -> Projection {
        let mut position: HashMap<&str, usize> = HashMap::with_capacity(header.len());
        for (i, h) in header.iter().enumerate() {
            position.entry(h.as_ref().trim()).or_insert(i);
        }
        let indices: Vec<Option<usize>> = self
            .feature_columns
            .iter()
            .map(|c| position.get(c.as_str()).copied())
            .collect();
        let absent = self
            .feature_columns
            .iter()
            .zip(&indices)
            .filter(|(_, i)| i.is_none())
            .map(|(c, _)| c.clone())
            .collect();
        Projection { indices, absent }
    }

    pub fn save(&self, path: &Path) -> FlowResult<()> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|e| FlowError::io(parent, e))?;
        }
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json).map_err(|e| FlowError::io(path, e))?;
        tracing::info!(path = %path.display(), columns = self.len(), "saved feature schema");
        Ok(())
    }

    /// Absent, unparsable, empty or duplicate-column schemas are configuration faults.
    pub fn load(path: &Path) -> FlowResult<Self> {
        if !path.exists() {
            return Err(FlowError::MissingArtifact {
                what: ARTIFACT,
                path: path.to_path_buf(),
            });
        }
        let data = std::fs::read_to_string(path).map_err(|e| FlowError::io(path, e))?;
        let invalid = |reason: String| FlowError::InvalidArtifact {
            what: ARTIFACT,
            path: path.to_path_buf(),
            reason,
        };
        let schema: FeatureSchema =
            serde_json::from_str(&data).map_err(|e| invalid(e.to_string()))?;
        if schema.is_empty() {
            return Err(invalid("feature_columns is empty".into()));
        }
        let mut seen = HashSet::new();
        if let Some(dup) = schema.feature_columns.iter().find(|c| !seen.insert(c.as_str())) {
            return Err(invalid(format!("duplicate column '{}'", dup)));
        }
        Ok(schema)
    }
}

/// Column positions of a source header in schema order; `None` where the source lacks a column.
#[derive(Debug, Clone, PartialEq)]
pub struct Projection {
    indices: Vec<Option<usize>>,
    absent: Vec<String>,
}

impl Projection {
    pub fn apply(&self, row: &[FeatureValue]) -> FeatureVector {
        FeatureVector::from_bound(
            self.indices
                .iter()
                .map(|i| i.and_then(|i| row.get(i).copied().flatten()))
                .collect(),
        )
    }

    /// Schema columns the source header does not provide.
    pub fn absent_columns(&self) -> &[String] {
        &self.absent
    }

    /// Count `rows` fills for every absent column.
    pub fn record_absent(&self, rows: u64, audit: &mut MissingAudit) {
        for c in &self.absent {
            audit.record_absent(c, rows);
        }
    }
}
