//! Sanity check over the raw input directory before a build.

use crate::error::FlowResult;
use crate::flows;
use serde::Serialize;
use std::collections::HashMap;
use std::path::Path;

#[derive(Debug, Clone, Serialize)]
pub struct InspectReport {
    pub file_count: usize,
    pub first_file: String,
    pub rows_loaded: usize,
    /// First 15 trimmed column names
    pub columns: Vec<String>,
    /// Top 10 raw label values with counts, when the label field exists
    pub label_counts: Option<Vec<(String, usize)>>,
    /// Columns that look like a label (case-insensitive), when it does not
    pub label_like_columns: Vec<String>,
}

pub fn inspect(raw_dir: &Path, nrows: usize, label_field: &str) -> FlowResult<InspectReport> {
    let files = flows::discover_inputs(raw_dir)?;
    let first = &files[0];
    let table = flows::read_flow_table(first, Some(nrows))?;

    let (label_counts, label_like_columns) = if table.has_column(label_field) {
        let mut counts: HashMap<String, usize> = HashMap::new();
        for record in table.records() {
            if let Some(v) = record.get(label_field) {
                *counts.entry(v.to_string()).or_default() += 1;
            }
        }
        let mut counts: Vec<(String, usize)> = counts.into_iter().collect();
        counts.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
        counts.truncate(10);
        (Some(counts), Vec::new())
    } else {
        let needle = label_field.to_lowercase();
        let like = table
            .header
            .iter()
            .filter(|h| h.to_lowercase().contains(&needle))
            .cloned()
            .collect();
        (None, like)
    };

    Ok(InspectReport {
        file_count: files.len(),
        first_file: first
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default(),
        rows_loaded: table.len(),
        columns: table.header.iter().take(15).cloned().collect(),
        label_counts,
        label_like_columns,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counts_labels_in_first_file() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join("a.csv"),
            " Dur, Label\n1,BENIGN\n2,DDoS\n3,BENIGN\n4,DDoS\n5,BENIGN\n",
        )
        .unwrap();
        std::fs::write(dir.path().join("b.csv"), "Dur,Label\n1,PortScan\n").unwrap();

        let r = inspect(dir.path(), 4, "Label").unwrap();
        assert_eq!(r.file_count, 2);
        assert_eq!(r.first_file, "a.csv");
        assert_eq!(r.rows_loaded, 4);
        assert_eq!(r.columns, vec!["Dur", "Label"]);
        assert_eq!(
            r.label_counts,
            Some(vec![("BENIGN".to_string(), 2), ("DDoS".to_string(), 2)])
        );
    }

    #[test]
    fn suggests_label_like_columns() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("a.csv"), "Dur,attack_label\n1,x\n").unwrap();
        let r = inspect(dir.path(), 10, "Label").unwrap();
        assert!(r.label_counts.is_none());
        assert_eq!(r.label_like_columns, vec!["attack_label"]);
    }
}
