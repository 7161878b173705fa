//! Fault taxonomy. Configuration faults are fatal and name the missing prerequisite;
//! data-quality defects never appear here (see [`crate::features::MissingAudit`]).

use std::path::PathBuf;

pub type FlowResult<T> = Result<T, FlowError>;

#[derive(Debug, thiserror::Error)]
pub enum FlowError {
    #[error("no CSV files found in {}", .0.display())]
    NoInputFiles(PathBuf),

    #[error("no '{column}' column found in {source_name} after stripping column names")]
    MissingLabelColumn { column: String, source_name: String },

    #[error("missing {what} at {}", .path.display())]
    MissingArtifact { what: &'static str, path: PathBuf },

    #[error("invalid {what} at {}: {reason}", .path.display())]
    InvalidArtifact {
        what: &'static str,
        path: PathBuf,
        reason: String,
    },

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("threshold must be within [0, 1], got {0}")]
    InvalidThreshold(f32),

    #[error("model error: {0}")]
    Model(String),

    #[error("I/O error on {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl FlowError {
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        FlowError::Io {
            path: path.into(),
            source,
        }
    }

    /// Configuration faults are the ones a rerun cannot fix without operator action.
    pub fn is_configuration(&self) -> bool {
        matches!(
            self,
            FlowError::NoInputFiles(_)
                | FlowError::MissingLabelColumn { .. }
                | FlowError::MissingArtifact { .. }
                | FlowError::InvalidArtifact { .. }
                | FlowError::InvalidConfig(_)
                | FlowError::InvalidThreshold(_)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn messages_name_the_prerequisite() {
        let e = FlowError::MissingLabelColumn {
            column: "Label".into(),
            source_name: "monday.csv".into(),
        };
        assert!(e.to_string().contains("'Label'"));
        assert!(e.to_string().contains("monday.csv"));
        assert!(e.is_configuration());

        let e = FlowError::MissingArtifact {
            what: "feature schema",
            path: PathBuf::from("models/features_v1.json"),
        };
        assert_eq!(
            e.to_string(),
            "missing feature schema at models/features_v1.json"
        );
    }

    #[test]
    fn model_faults_are_not_configuration() {
        assert!(!FlowError::Model("shape".into()).is_configuration());
    }
}
