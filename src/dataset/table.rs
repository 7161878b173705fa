//! Training table CSV: feature columns verbatim, then `is_malicious`, then `source_file`.
//! Missing values are written as empty fields.

use super::{TrainingTable, SOURCE_FILE_COLUMN, TARGET_COLUMN};
use crate::error::{FlowError, FlowResult};
use std::path::Path;

pub fn write_training_table(path: &Path, table: &TrainingTable) -> FlowResult<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).map_err(|e| FlowError::io(parent, e))?;
    }
    let mut writer = csv::Writer::from_path(path)?;

    let mut header: Vec<&str> = table.schema.columns().iter().map(String::as_str).collect();
    header.push(TARGET_COLUMN);
    header.push(SOURCE_FILE_COLUMN);
    writer.write_record(&header)?;

    let mut fields: Vec<String> = Vec::with_capacity(header.len());
    for row in &table.rows {
        fields.clear();
        fields.extend(
            row.features
                .as_slice()
                .iter()
                .map(|v| v.map(|x| x.to_string()).unwrap_or_default()),
        );
        fields.push(row.is_malicious.to_string());
        fields.push(row.source_file.clone());
        writer.write_record(&fields)?;
    }
    writer.flush().map_err(|e| FlowError::io(path, e))?;
    tracing::info!(path = %path.display(), rows = table.len(), "saved training table");
    Ok(())
}
