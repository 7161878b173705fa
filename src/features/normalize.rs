//! Column-name cleanup and total numeric coercion.

use super::{FeatureRecord, FeatureValue, MissingAudit, MISSING};
use crate::flows::RawRecord;
use std::collections::HashSet;

pub fn normalize_header<S: AsRef<str>>(names: &[S]) -> Vec<String> {
    names.iter().map(|n| n.as_ref().trim().to_string()).collect()
}

/// Total over arbitrary input: a finite number or missing.
/// Infinities come from rate columns divided by a zero flow duration and must never reach a model.
pub fn normalize_value(raw: &str) -> FeatureValue {
    match raw.trim().parse::<f64>() {
        Ok(v) if v.is_finite() => Some(v),
        _ => MISSING,
    }
}

/// Coerces every non-excluded field of a record to a feature value.
#[derive(Debug, Clone, Default)]
pub struct Normalizer {
    exclude: HashSet<String>,
}

impl Normalizer {
    pub fn new<S: AsRef<str>>(exclude: impl IntoIterator<Item = S>) -> Self {
        Self {
            exclude: exclude
                .into_iter()
                .map(|s| s.as_ref().trim().to_string())
                .collect(),
        }
    }

    pub fn is_excluded(&self, name: &str) -> bool {
        self.exclude.contains(name)
    }

    pub fn normalize(&self, record: &RawRecord, audit: &mut MissingAudit) -> FeatureRecord {
        let mut out = FeatureRecord::new();
        for (name, raw) in record.fields() {
            if self.is_excluded(name) {
                continue;
            }
            let value = normalize_value(raw);
            if value.is_none() {
                audit.record_coerced(name);
            }
            out.push(name, value);
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    #[test]
    fn parses_plain_numbers() {
        assert_eq!(normalize_value("5"), Some(5.0));
        assert_eq!(normalize_value(" -3.25 "), Some(-3.25));
        assert_eq!(normalize_value("1e3"), Some(1000.0));
    }

    #[test]
    fn infinities_and_nan_are_missing() {
        for raw in ["inf", "-inf", "+inf", "Infinity", "-Infinity", "NaN", "nan"] {
            assert_eq!(normalize_value(raw), MISSING, "{raw}");
        }
        assert_eq!(normalize_value(&f64::INFINITY.to_string()), MISSING);
        assert_eq!(normalize_value(&f64::NEG_INFINITY.to_string()), MISSING);
    }

    #[test]
    fn garbage_is_missing_not_zero() {
        for raw in ["", "   ", "bad", "1.2.3", "0x10", "12 packets"] {
            assert_eq!(normalize_value(raw), MISSING, "{raw:?}");
        }
    }

    #[test]
    fn total_over_random_strings() {
        let mut rng = StdRng::seed_from_u64(7);
        let alphabet: Vec<char> = "0123456789.-+eEinfaINFAN x\t,".chars().collect();
        for _ in 0..5_000 {
            let len = rng.gen_range(0..12);
            let s: String = (0..len)
                .map(|_| alphabet[rng.gen_range(0..alphabet.len())])
                .collect();
            if let Some(v) = normalize_value(&s) {
                assert!(v.is_finite(), "{s:?} -> {v}");
            }
        }
    }

    #[test]
    fn excluded_fields_skipped_and_defects_counted() {
        let record = RawRecord::from_pairs([
            ("Flow ID", "f1"),
            ("Dur", "5"),
            ("Flow Bytes/s", "Infinity"),
            ("Label", "BENIGN"),
        ]);
        let n = Normalizer::new(["Flow ID", "Label"]);
        let mut audit = MissingAudit::default();
        let out = n.normalize(&record, &mut audit);
        assert_eq!(out.columns().collect::<Vec<_>>(), vec!["Dur", "Flow Bytes/s"]);
        assert_eq!(out.get("Dur"), Some(Some(5.0)));
        assert_eq!(out.get("Flow Bytes/s"), Some(MISSING));
        assert_eq!(audit.coerced, 1);
        assert_eq!(audit.by_column.get("Flow Bytes/s"), Some(&1));
    }

    #[test]
    fn header_trimmed() {
        assert_eq!(
            normalize_header(&[" Dst Port", "Label  "]),
            vec!["Dst Port", "Label"]
        );
    }
}
