//! CSV access for raw flow exports and input discovery.

use super::RawRecord;
use crate::error::{FlowError, FlowResult};
use csv::{ByteRecord, ReaderBuilder, StringRecord};
use std::collections::HashSet;
use std::fs::File;
use std::path::{Path, PathBuf};
use tracing::warn;
use walkdir::WalkDir;

/// A raw file held in memory: trimmed header plus untouched rows.
#[derive(Debug, Clone, Default)]
pub struct FlowTable {
    pub header: Vec<String>,
    pub rows: Vec<StringRecord>,
}

impl FlowTable {
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.header.iter().any(|h| h == name)
    }

    pub fn record(&self, index: usize) -> Option<RawRecord> {
        self.rows
            .get(index)
            .map(|row| RawRecord::from_row(&self.header, row.iter()))
    }

    pub fn records(&self) -> impl Iterator<Item = RawRecord> + '_ {
        self.rows
            .iter()
            .map(|row| RawRecord::from_row(&self.header, row.iter()))
    }
}

fn open(path: &Path) -> FlowResult<csv::Reader<File>> {
    let file = File::open(path).map_err(|e| FlowError::io(path, e))?;
    Ok(ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(file))
}

/// Undecodable bytes become U+FFFD, which the normalizer then treats as missing.
fn lossy(record: &ByteRecord) -> StringRecord {
    record.iter().map(String::from_utf8_lossy).collect()
}

/// Repeated names get `.1`, `.2`, ... suffixes so no column is shadowed
/// (CIC-IDS2017 repeats "Fwd Header Length").
fn dedup_header(names: impl IntoIterator<Item = String>, path: &Path) -> Vec<String> {
    let names: Vec<String> = names.into_iter().collect();
    let mut seen: HashSet<String> = HashSet::with_capacity(names.len());
    let mut header = Vec::with_capacity(names.len());
    for name in names {
        let mut unique = name.clone();
        let mut k = 1;
        while seen.contains(&unique) {
            unique = format!("{}.{}", name, k);
            k += 1;
        }
        if unique != name {
            warn!(file = %path.display(), column = %name, renamed = %unique, "duplicate column renamed");
        }
        seen.insert(unique.clone());
        header.push(unique);
    }
    header
}

fn trimmed_header(reader: &mut csv::Reader<File>, path: &Path) -> FlowResult<Vec<String>> {
    let raw = lossy(reader.byte_headers()?);
    Ok(dedup_header(raw.iter().map(|h| h.trim().to_string()), path))
}

/// Read a flow CSV. `limit` caps the number of data rows (None reads all).
pub fn read_flow_table(path: &Path, limit: Option<usize>) -> FlowResult<FlowTable> {
    let mut reader = open(path)?;
    let header = trimmed_header(&mut reader, path)?;
    let mut rows = Vec::new();
    for record in reader.byte_records() {
        if limit.is_some_and(|n| rows.len() >= n) {
            break;
        }
        rows.push(lossy(&record?));
    }
    Ok(FlowTable { header, rows })
}

/// Header only, trimmed.
pub fn read_header(path: &Path) -> FlowResult<Vec<String>> {
    let mut reader = open(path)?;
    trimmed_header(&mut reader, path)
}

/// `*.csv` files directly inside `dir`, sorted by name. None found is a configuration fault.
pub fn discover_inputs(dir: &Path) -> FlowResult<Vec<PathBuf>> {
    let mut files: Vec<PathBuf> = WalkDir::new(dir)
        .min_depth(1)
        .max_depth(1)
        .into_iter()
        .filter_map(Result::ok)
        .filter(|e| e.file_type().is_file())
        .map(|e| e.into_path())
        .filter(|p| {
            p.extension()
                .and_then(|x| x.to_str())
                .is_some_and(|x| x.eq_ignore_ascii_case("csv"))
        })
        .collect();
    if files.is_empty() {
        return Err(FlowError::NoInputFiles(dir.to_path_buf()));
    }
    files.sort();
    Ok(files)
}
