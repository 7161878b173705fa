//! Feature contract: raw flow fields → normalized numeric record → schema-bound vector.

mod label;
mod leakage;
mod normalize;
mod schema;

pub use label::{label_of, Labeler};
pub use leakage::LeakageFilter;
pub use normalize::{normalize_header, normalize_value, Normalizer};
pub use schema::{FeatureSchema, Projection};

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A normalized feature value. `None` is the missing sentinel: never zero, never infinite.
pub type FeatureValue = Option<f64>;

pub const MISSING: FeatureValue = None;

/// Named numeric fields of one flow after normalization, in source column order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FeatureRecord {
    fields: Vec<(String, FeatureValue)>,
}

impl FeatureRecord {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, name: impl Into<String>, value: FeatureValue) {
        self.fields.push((name.into(), value));
    }

    /// `None` when the column is absent; `Some(None)` when present but missing.
    pub fn get(&self, name: &str) -> Option<FeatureValue> {
        self.fields.iter().find(|(k, _)| k == name).map(|(_, v)| *v)
    }

    pub fn columns(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(|(k, _)| k.as_str())
    }

    pub fn values(&self) -> impl Iterator<Item = FeatureValue> + '_ {
        self.fields.iter().map(|(_, v)| *v)
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

impl<K: Into<String>> FromIterator<(K, FeatureValue)> for FeatureRecord {
    fn from_iter<I: IntoIterator<Item = (K, FeatureValue)>>(iter: I) -> Self {
        Self {
            fields: iter.into_iter().map(|(k, v)| (k.into(), v)).collect(),
        }
    }
}

/// Positional feature vector bound to a [`FeatureSchema`]; only the binder constructs one.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureVector {
    values: Vec<FeatureValue>,
}

impl FeatureVector {
    pub(crate) fn from_bound(values: Vec<FeatureValue>) -> Self {
        Self { values }
    }

    pub fn as_slice(&self) -> &[FeatureValue] {
        &self.values
    }

    pub fn dim(&self) -> usize {
        self.values.len()
    }

    /// Model input row; missing becomes NaN for the exported imputer.
    pub fn to_model_row(&self) -> impl Iterator<Item = f32> + '_ {
        self.values.iter().map(|v| v.map_or(f32::NAN, |x| x as f32))
    }
}

/// Counts of data-quality substitutions. Never an error; reported for audit.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MissingAudit {
    /// Present values that were non-numeric, empty or non-finite
    pub coerced: u64,
    /// Columns absent from a record and filled with missing
    pub absent: u64,
    pub by_column: BTreeMap<String, u64>,
}

impl MissingAudit {
    pub fn record_coerced(&mut self, column: &str) {
        self.coerced += 1;
        *self.by_column.entry(column.to_string()).or_default() += 1;
    }

    pub fn record_absent(&mut self, column: &str, count: u64) {
        if count == 0 {
            return;
        }
        self.absent += count;
        *self.by_column.entry(column.to_string()).or_default() += count;
    }

    pub fn merge(&mut self, other: &MissingAudit) {
        self.coerced += other.coerced;
        self.absent += other.absent;
        for (k, v) in &other.by_column {
            *self.by_column.entry(k.clone()).or_default() += v;
        }
    }

    pub fn total(&self) -> u64 {
        self.coerced + self.absent
    }

    /// Columns with the most substitutions, descending.
    pub fn worst_columns(&self, n: usize) -> Vec<(&str, u64)> {
        let mut cols: Vec<(&str, u64)> = self.by_column.iter().map(|(k, v)| (k.as_str(), *v)).collect();
        cols.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(b.0)));
        cols.truncate(n);
        cols
    }
}
