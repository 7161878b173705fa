//! Raw flow records as read from CIC-style CSV exports.
//! Field names are trimmed on the way in; values are kept verbatim until normalization.

mod reader;

pub use reader::{discover_inputs, read_flow_table, read_header, FlowTable};

/// One observed flow: string-keyed fields in source column order.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct RawRecord {
    fields: Vec<(String, String)>,
}

impl RawRecord {
    /// Pair a (trimmed) header with one row. Short rows simply lack the trailing fields.
    pub fn from_row<S: AsRef<str>>(header: &[String], row: impl IntoIterator<Item = S>) -> Self {
        let fields = header
            .iter()
            .zip(row)
            .map(|(name, value)| (name.trim().to_string(), value.as_ref().to_string()))
            .collect();
        Self { fields }
    }

    pub fn from_pairs<K: Into<String>, V: Into<String>>(pairs: impl IntoIterator<Item = (K, V)>) -> Self {
        Self {
            fields: pairs
                .into_iter()
                .map(|(k, v)| (k.into().trim().to_string(), v.into()))
                .collect(),
        }
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }

    pub fn fields(&self) -> impl Iterator<Item = (&str, &str)> {
        self.fields.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}
