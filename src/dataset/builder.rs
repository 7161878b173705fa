//! Dataset builder: raw files → subsample → label → leakage filter → normalize → concatenate.

use super::{per_file_seed, subsample_indices, LabeledRow, TrainingTable};
use crate::config::Config;
use crate::error::{FlowError, FlowResult};
use crate::features::{FeatureSchema, FeatureVector, Labeler, LeakageFilter, MissingAudit, Normalizer};
use crate::flows::{self, FlowTable, RawRecord};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Per-source provenance for the build report.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SourceSummary {
    pub source_file: String,
    pub rows_read: usize,
    pub rows_kept: usize,
    pub seed: u64,
    pub benign: usize,
    pub malicious: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BuildReport {
    pub generated_at: DateTime<Utc>,
    pub rows: usize,
    pub feature_columns: usize,
    pub benign: usize,
    pub malicious: usize,
    pub sources: Vec<SourceSummary>,
    pub missing: MissingAudit,
}

impl BuildReport {
    pub fn save(&self, path: &Path) -> FlowResult<()> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|e| FlowError::io(parent, e))?;
        }
        std::fs::write(path, serde_json::to_string_pretty(self)?).map_err(|e| FlowError::io(path, e))
    }
}

/// One processed source file, bound to its own feature columns.
struct SourceBlock {
    schema: FeatureSchema,
    rows: Vec<(FeatureVector, u8)>,
    summary: SourceSummary,
}

pub struct DatasetBuilder {
    labeler: Labeler,
    filter: LeakageFilter,
    normalizer: Normalizer,
    sample_per_file: usize,
    seed: u64,
}

fn source_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

impl DatasetBuilder {
    pub fn new(config: &Config) -> Self {
        let filter = LeakageFilter::training(&config.columns);
        Self {
            labeler: Labeler::new(&config.columns.label, &config.columns.benign_token),
            normalizer: filter.normalizer(),
            filter,
            sample_per_file: config.dataset.sample_per_file,
            seed: config.dataset.seed,
        }
    }

    /// Build from every `*.csv` in `dir`.
    pub fn build_dir(&self, dir: &Path) -> FlowResult<(TrainingTable, BuildReport)> {
        let files = flows::discover_inputs(dir)?;
        info!(count = files.len(), dir = %dir.display(), "found raw flow files");
        self.build_files(&files)
    }

    /// Every header is checked for the label field before any file is processed.
    pub fn build_files(&self, files: &[PathBuf]) -> FlowResult<(TrainingTable, BuildReport)> {
        if files.is_empty() {
            return Err(FlowError::NoInputFiles(PathBuf::new()));
        }
        for path in files {
            let header = flows::read_header(path)?;
            self.labeler.require(&header, &source_name(path))?;
        }

        let mut blocks = Vec::with_capacity(files.len());
        let mut audit = MissingAudit::default();
        for path in files {
            let name = source_name(path);
            info!(source = %name, "loading");
            let table = flows::read_flow_table(path, None)?;
            blocks.push(self.process_table(&name, &table, &mut audit)?);
        }
        blocks.sort_by(|a, b| a.summary.source_file.cmp(&b.summary.source_file));
        Ok(self.concatenate(blocks, audit))
    }

    fn process_table(
        &self,
        name: &str,
        table: &FlowTable,
        audit: &mut MissingAudit,
    ) -> FlowResult<SourceBlock> {
        self.labeler.require(&table.header, name)?;

        let seed = per_file_seed(self.seed, name);
        let keep = subsample_indices(table.len(), self.sample_per_file, seed);
        let schema = FeatureSchema::new(self.filter.feature_columns(&table.header));

        let mut rows = Vec::with_capacity(keep.len());
        let mut malicious = 0;
        for i in keep {
            let record = RawRecord::from_row(&table.header, table.rows[i].iter());
            let target = self.labeler.label(&record, audit);
            let features = self.normalizer.normalize(&record, audit);
            malicious += usize::from(target);
            rows.push((schema.bind_audited(&features, audit), target));
        }

        let summary = SourceSummary {
            source_file: name.to_string(),
            rows_read: table.len(),
            rows_kept: rows.len(),
            seed,
            benign: rows.len() - malicious,
            malicious,
        };
        debug!(
            source = %name,
            rows_read = summary.rows_read,
            rows_kept = summary.rows_kept,
            malicious,
            "processed source"
        );
        Ok(SourceBlock {
            schema,
            rows,
            summary,
        })
    }

    /// Union of columns in first-seen order; rows of files lacking a column get missing there.
    fn concatenate(&self, blocks: Vec<SourceBlock>, mut audit: MissingAudit) -> (TrainingTable, BuildReport) {
        let mut union: Vec<String> = Vec::new();
        for block in &blocks {
            for c in block.schema.columns() {
                if !union.contains(c) {
                    union.push(c.clone());
                }
            }
        }
        let schema = FeatureSchema::new(union);

        let mut rows = Vec::new();
        let mut sources = Vec::with_capacity(blocks.len());
        for block in blocks {
            let projection = schema.projection(block.schema.columns());
            projection.record_absent(block.rows.len() as u64, &mut audit);
            let source_file = block.summary.source_file.clone();
            rows.extend(block.rows.into_iter().map(|(features, is_malicious)| LabeledRow {
                features: projection.apply(features.as_slice()),
                is_malicious,
                source_file: source_file.clone(),
            }));
            sources.push(block.summary);
        }

        let table = TrainingTable { schema, rows };
        let (benign, malicious) = table.class_counts();
        info!(
            rows = table.len(),
            columns = table.schema.len(),
            benign,
            malicious,
            missing = audit.total(),
            "combined training table"
        );
        let report = BuildReport {
            generated_at: Utc::now(),
            rows: table.len(),
            feature_columns: table.schema.len(),
            benign,
            malicious,
            sources,
            missing: audit,
        };
        (table, report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::MISSING;

    fn write(dir: &Path, name: &str, body: &str) -> PathBuf {
        let p = dir.join(name);
        std::fs::write(&p, body).unwrap();
        p
    }

    #[test]
    fn drops_leakage_columns_and_coerces_bad_values() {
        let dir = tempfile::tempdir().unwrap();
        write(
            dir.path(),
            "day1.csv",
            "Flow ID,Src IP,Dst IP,Timestamp,Dur,Label\n\
             f1,1.1.1.1,2.2.2.2,t1,5,BENIGN\n\
             f2,1.1.1.1,3.3.3.3,t2,bad,PortScan\n",
        );
        let (table, report) = DatasetBuilder::new(&Config::default())
            .build_dir(dir.path())
            .unwrap();

        assert_eq!(table.schema.columns(), &["Dur".to_string()]);
        assert_eq!(table.len(), 2);
        assert_eq!(table.rows[0].features.as_slice(), &[Some(5.0)]);
        assert_eq!(table.rows[0].is_malicious, 0);
        assert_eq!(table.rows[1].features.as_slice(), &[MISSING]);
        assert_eq!(table.rows[1].is_malicious, 1);
        assert!(table.rows.iter().all(|r| r.source_file == "day1.csv"));
        assert_eq!(report.missing.coerced, 1);
        assert_eq!((report.benign, report.malicious), (1, 1));
    }

    #[test]
    fn union_of_columns_fills_missing_instead_of_dropping_rows() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "b.csv", "Pkts,Label\n7,DDoS\n");
        write(dir.path(), "a.csv", " Dur , Label\n1,BENIGN\n2,BENIGN\n");
        let (table, report) = DatasetBuilder::new(&Config::default())
            .build_dir(dir.path())
            .unwrap();

        assert_eq!(table.schema.columns(), &["Dur".to_string(), "Pkts".to_string()]);
        assert_eq!(table.len(), 3);
        assert_eq!(table.rows[0].source_file, "a.csv");
        assert_eq!(table.rows[0].features.as_slice(), &[Some(1.0), MISSING]);
        assert_eq!(table.rows[2].source_file, "b.csv");
        assert_eq!(table.rows[2].features.as_slice(), &[MISSING, Some(7.0)]);
        assert_eq!(report.missing.absent, 3);
    }

    #[test]
    fn label_check_happens_before_any_processing() {
        let dir = tempfile::tempdir().unwrap();
        let good = write(dir.path(), "a.csv", "Dur,Label\n1,BENIGN\n");
        let bad = write(dir.path(), "b.csv", "Dur,label\n1,BENIGN\n");
        let err = DatasetBuilder::new(&Config::default())
            .build_files(&[good, bad])
            .unwrap_err();
        assert!(matches!(err, FlowError::MissingLabelColumn { ref source_name, .. } if source_name == "b.csv"));
    }

    #[test]
    fn subsampling_is_per_file_and_order_independent() {
        let dir = tempfile::tempdir().unwrap();
        let mut body = String::from("Dur,Label\n");
        for i in 0..200 {
            body.push_str(&format!("{},{}\n", i, if i % 3 == 0 { "DDoS" } else { "BENIGN" }));
        }
        let a = write(dir.path(), "a.csv", &body);
        let b = write(dir.path(), "b.csv", &body);

        let mut config = Config::default();
        config.dataset.sample_per_file = 20;
        let builder = DatasetBuilder::new(&config);

        let (forward, _) = builder.build_files(&[a.clone(), b.clone()]).unwrap();
        let (reverse, _) = builder.build_files(&[b, a]).unwrap();
        assert_eq!(forward.len(), 40);
        assert_eq!(forward.rows, reverse.rows);

        let from_a: Vec<_> = forward.rows.iter().filter(|r| r.source_file == "a.csv").collect();
        let from_b: Vec<_> = forward.rows.iter().filter(|r| r.source_file == "b.csv").collect();
        assert_eq!(from_a.len(), 20);
        assert_ne!(
            from_a.iter().map(|r| r.features.clone()).collect::<Vec<_>>(),
            from_b.iter().map(|r| r.features.clone()).collect::<Vec<_>>()
        );
    }

    #[test]
    fn noisy_rows_become_missing_instead_of_failing() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join("noisy.csv"),
            b"Dur,Label\n1,BENIGN\n2\n\xff\xfe,DDoS\n4,BENIGN,junk,9\n",
        )
        .unwrap();
        let (table, report) = DatasetBuilder::new(&Config::default())
            .build_dir(dir.path())
            .unwrap();

        assert_eq!(table.schema.columns(), &["Dur".to_string()]);
        let features: Vec<_> = table.rows.iter().map(|r| r.features.as_slice()[0]).collect();
        assert_eq!(features, vec![Some(1.0), Some(2.0), MISSING, Some(4.0)]);
        let targets: Vec<u8> = table.rows.iter().map(|r| r.is_malicious).collect();
        assert_eq!(targets, vec![0, 1, 1, 0]);
        assert_eq!(report.missing.coerced, 1);
        assert_eq!(report.missing.absent, 1);
        assert_eq!(report.missing.by_column.get("Label"), Some(&1));
    }

    #[test]
    fn empty_file_list_is_a_fault() {
        let err = DatasetBuilder::new(&Config::default()).build_files(&[]).unwrap_err();
        assert!(err.is_configuration());
    }
}
