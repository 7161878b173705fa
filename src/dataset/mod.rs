//! Training table construction from many raw flow files.

mod builder;
mod table;

pub use builder::{BuildReport, DatasetBuilder, SourceSummary};
pub use table::write_training_table;

use crate::features::{FeatureSchema, FeatureVector};
use rand::rngs::StdRng;
use rand::SeedableRng;
use sha2::{Digest, Sha256};

/// Binary target column of the training table.
pub const TARGET_COLUMN: &str = "is_malicious";
/// Provenance column: the raw file a row came from.
pub const SOURCE_FILE_COLUMN: &str = "source_file";

/// One training example: features bound to the table's columns, target, provenance.
#[derive(Debug, Clone, PartialEq)]
pub struct LabeledRow {
    pub features: FeatureVector,
    pub is_malicious: u8,
    pub source_file: String,
}

/// Concatenated training table. `schema` is the union of feature columns in first-seen order.
#[derive(Debug, Clone)]
pub struct TrainingTable {
    pub schema: FeatureSchema,
    pub rows: Vec<LabeledRow>,
}

impl TrainingTable {
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// (benign, malicious) row counts.
    pub fn class_counts(&self) -> (usize, usize) {
        let malicious = self.rows.iter().filter(|r| r.is_malicious == 1).count();
        (self.rows.len() - malicious, malicious)
    }
}

/// Seed scoped to one source file, independent of processing order.
pub fn per_file_seed(base_seed: u64, source_name: &str) -> u64 {
    let digest = Sha256::digest(source_name.as_bytes());
    let mut bytes = [0u8; 8];
    bytes.copy_from_slice(&digest[..8]);
    base_seed ^ u64::from_le_bytes(bytes)
}

/// Row indices to keep, ascending. `sample == 0` or a short file keeps everything.
pub fn subsample_indices(len: usize, sample: usize, seed: u64) -> Vec<usize> {
    if sample == 0 || len <= sample {
        return (0..len).collect();
    }
    let mut rng = StdRng::seed_from_u64(seed);
    let mut picked = rand::seq::index::sample(&mut rng, len, sample).into_vec();
    picked.sort_unstable();
    picked
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn seeds_are_stable_and_file_scoped() {
        let a = per_file_seed(42, "Monday-WorkingHours.pcap_ISCX.csv");
        assert_eq!(a, per_file_seed(42, "Monday-WorkingHours.pcap_ISCX.csv"));
        assert_ne!(a, per_file_seed(42, "Tuesday-WorkingHours.pcap_ISCX.csv"));
        assert_ne!(a, per_file_seed(43, "Monday-WorkingHours.pcap_ISCX.csv"));
    }

    #[test]
    fn subsample_is_reproducible_sorted_and_exact() {
        let seed = per_file_seed(42, "day.csv");
        let first = subsample_indices(1_000, 100, seed);
        assert_eq!(first, subsample_indices(1_000, 100, seed));
        assert_eq!(first.len(), 100);
        assert!(first.windows(2).all(|w| w[0] < w[1]));
        assert!(first.iter().all(|&i| i < 1_000));
        assert_ne!(first, subsample_indices(1_000, 100, per_file_seed(42, "other.csv")));
    }

    #[test]
    fn short_files_and_disabled_sampling_keep_all_rows() {
        assert_eq!(subsample_indices(5, 10, 1), vec![0, 1, 2, 3, 4]);
        assert_eq!(subsample_indices(5, 5, 1), vec![0, 1, 2, 3, 4]);
        assert_eq!(subsample_indices(3, 0, 1), vec![0, 1, 2]);
    }
}
