//! Binary target derivation from the raw categorical label.

use super::MissingAudit;
use crate::error::{FlowError, FlowResult};
use crate::flows::RawRecord;

pub const BENIGN: &str = "BENIGN";

/// 0 iff the trimmed label is exactly `BENIGN`. Case is not folded: `benign` is malicious.
pub fn label_of(raw: &str) -> u8 {
    label_with(raw, BENIGN)
}

fn label_with(raw: &str, benign_token: &str) -> u8 {
    u8::from(raw.trim() != benign_token)
}

#[derive(Debug, Clone)]
pub struct Labeler {
    field: String,
    benign_token: String,
}

impl Default for Labeler {
    fn default() -> Self {
        Self::new("Label", BENIGN)
    }
}

impl Labeler {
    pub fn new(field: impl Into<String>, benign_token: impl Into<String>) -> Self {
        Self {
            field: field.into().trim().to_string(),
            benign_token: benign_token.into(),
        }
    }

    pub fn field(&self) -> &str {
        &self.field
    }

    /// Fails when a (trimmed) header lacks the label field: the wrong file was supplied.
    pub fn require<S: AsRef<str>>(&self, header: &[S], source_name: &str) -> FlowResult<()> {
        if header.iter().any(|h| h.as_ref().trim() == self.field) {
            Ok(())
        } else {
            Err(self.missing(source_name))
        }
    }

    /// Target of one record whose header already passed [`require`](Self::require).
    /// A short row without the label value is malicious, like an empty label.
    pub fn label(&self, record: &RawRecord, audit: &mut MissingAudit) -> u8 {
        match record.get(&self.field) {
            Some(raw) => label_with(raw, &self.benign_token),
            None => {
                audit.record_absent(&self.field, 1);
                1
            }
        }
    }

    fn missing(&self, source_name: &str) -> FlowError {
        FlowError::MissingLabelColumn {
            column: self.field.clone(),
            source_name: source_name.to_string(),
        }
    }
}
