//! Turns model probabilities into thresholded decisions and a stable ranking.

use crate::config::validate_threshold;
use crate::error::{FlowError, FlowResult};
use crate::features::FeatureVector;
use crate::model::Classifier;
use serde::ser::{Serialize, SerializeMap, Serializer};

/// A scored flow: triage metadata, probability of malicious, decision.
#[derive(Debug, Clone, PartialEq)]
pub struct ScoredFlow {
    /// Position in the scored input
    pub row: usize,
    pub metadata: Vec<(String, String)>,
    pub prob_malicious: f32,
    pub pred_is_malicious: u8,
}

impl ScoredFlow {
    pub fn is_alert(&self) -> bool {
        self.pred_is_malicious == 1
    }

    pub fn metadata_value(&self, column: &str) -> Option<&str> {
        self.metadata
            .iter()
            .find(|(k, _)| k == column)
            .map(|(_, v)| v.as_str())
    }
}

impl Serialize for ScoredFlow {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.metadata.len() + 3))?;
        map.serialize_entry("row", &self.row)?;
        for (k, v) in &self.metadata {
            map.serialize_entry(k, v)?;
        }
        map.serialize_entry("prob_malicious", &self.prob_malicious)?;
        map.serialize_entry("pred_is_malicious", &self.pred_is_malicious)?;
        map.end()
    }
}

/// Single-vector scoring; the vector must come from the model's schema binder.
pub fn score(model: &dyn Classifier, vector: &FeatureVector) -> FlowResult<f32> {
    model
        .predict_proba(std::slice::from_ref(vector))?
        .first()
        .copied()
        .ok_or_else(|| FlowError::Model("model returned no probability".into()))
}

/// 1 iff `probability >= threshold`; a flow exactly at the threshold is an alert.
pub fn decide(probability: f32, threshold: f32) -> u8 {
    u8::from(probability >= threshold)
}

/// Probability descending; equal probabilities keep their input order.
pub fn rank(mut flows: Vec<ScoredFlow>) -> Vec<ScoredFlow> {
    flows.sort_by(|a, b| b.prob_malicious.total_cmp(&a.prob_malicious));
    flows
}

pub struct AlertEngine {
    threshold: f32,
}

impl AlertEngine {
    pub fn new(threshold: f32) -> FlowResult<Self> {
        validate_threshold(threshold)?;
        Ok(Self { threshold })
    }

    pub fn threshold(&self) -> f32 {
        self.threshold
    }

    pub fn score_flow(&self, row: usize, metadata: Vec<(String, String)>, prob_malicious: f32) -> ScoredFlow {
        ScoredFlow {
            row,
            metadata,
            prob_malicious,
            pred_is_malicious: decide(prob_malicious, self.threshold),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::{FeatureRecord, FeatureSchema};
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    fn flows(probs: &[f32], threshold: f32) -> Vec<ScoredFlow> {
        let engine = AlertEngine::new(threshold).unwrap();
        probs
            .iter()
            .enumerate()
            .map(|(i, p)| engine.score_flow(i, vec![("Src IP".into(), format!("10.0.0.{i}"))], *p))
            .collect()
    }

    #[test]
    fn thresholds_and_ranks_example_scores() {
        let scored = flows(&[0.9, 0.4, 0.7], 0.5);
        let decisions: Vec<u8> = scored.iter().map(|f| f.pred_is_malicious).collect();
        assert_eq!(decisions, vec![1, 0, 1]);
        let ranked: Vec<f32> = rank(scored).iter().map(|f| f.prob_malicious).collect();
        assert_eq!(ranked, vec![0.9, 0.7, 0.4]);
    }

    #[test]
    fn boundary_is_inclusive() {
        for t in [0.0f32, 0.25, 0.5, 0.7, 1.0] {
            assert_eq!(decide(t, t), 1);
        }
        assert_eq!(decide(0.4999, 0.5), 0);
    }

    #[test]
    fn decide_is_monotonic() {
        let mut rng = StdRng::seed_from_u64(3);
        for _ in 0..10_000 {
            let t: f32 = rng.gen();
            let (a, b): (f32, f32) = (rng.gen(), rng.gen());
            let (hi, lo) = if a >= b { (a, b) } else { (b, a) };
            assert!(decide(hi, t) >= decide(lo, t));
        }
    }

    #[test]
    fn rank_is_stable_for_ties() {
        let scored = flows(&[0.5, 0.8, 0.5, 0.8, 0.1, 0.5], 0.5);
        let order: Vec<usize> = rank(scored).iter().map(|f| f.row).collect();
        assert_eq!(order, vec![1, 3, 0, 2, 5, 4]);
    }

    #[test]
    fn engine_rejects_out_of_range_threshold() {
        assert!(AlertEngine::new(1.5).is_err());
        assert!(AlertEngine::new(-0.1).is_err());
    }

    #[test]
    fn score_delegates_to_model() {
        let schema = FeatureSchema::new(["Dur"]);
        let rec: FeatureRecord = [("Dur", Some(8.0))].into_iter().collect();
        let v = schema.bind(&rec);
        let model = |v: &FeatureVector| v.as_slice()[0].unwrap_or(0.0) as f32 / 10.0;
        assert!((score(&model, &v).unwrap() - 0.8).abs() < 1e-6);
    }

    #[test]
    fn serializes_metadata_inline() {
        let f = flows(&[0.75], 0.5).remove(0);
        let json = serde_json::to_string(&f).unwrap();
        assert_eq!(
            json,
            r#"{"row":0,"Src IP":"10.0.0.0","prob_malicious":0.75,"pred_is_malicious":1}"#
        );
    }
}
