// SPDX-FileCopyrightText: Copyright (c) 2024-2025 NVIDIA CORPORATION & AFFILIATES. All rights reserved.
// SPDX-License-Identifier: Apache-2.0

//! Raw model scores to per-label probabilities.

use serde::{Deserialize, Serialize};

use crate::error::TriageError;
use crate::metrics::NONFINITE_SCORES;

/// How raw scores become probabilities.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Default)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum ScoreMode {
    /// Softmax across all labels; labels are mutually exclusive and sum to 1.
    #[default]
    Joint,
    /// Element-wise logistic of `score / temperature`; each label judged on its own.
    Independent { temperature: f32 },
}

#[derive(Debug, Clone, Copy)]
pub struct ScoreNormalizer {
    mode: ScoreMode,
}

impl ScoreNormalizer {
    pub fn new(mode: ScoreMode) -> Result<Self, TriageError> {
        if let ScoreMode::Independent { temperature } = mode {
            if !(temperature.is_finite() && temperature > 0.0) {
                return Err(TriageError::InvalidTemperature(temperature));
            }
        }
        Ok(Self { mode })
    }

    pub fn mode(&self) -> ScoreMode {
        self.mode
    }

    /// Normalize a raw score vector.
    ///
    /// Non-finite raw scores are treated as `-inf`, i.e. probability 0 for that
    /// label. If no finite mass remains (joint mode with every score non-finite)
    /// every output is NaN so the decision stage resolves to `UNSURE`.
    pub fn normalize(&self, raw: &[f32]) -> Vec<f32> {
        let nonfinite = raw.iter().filter(|s| !s.is_finite()).count();
        if nonfinite > 0 {
            NONFINITE_SCORES.inc_by(nonfinite as u64);
            tracing::warn!(nonfinite, total = raw.len(), "non-finite raw scores");
        }

        let sanitized = raw
            .iter()
            .map(|&s| if s.is_finite() { s } else { f32::NEG_INFINITY });

        match self.mode {
            ScoreMode::Joint => softmax(sanitized.collect()),
            ScoreMode::Independent { temperature } => {
                sanitized.map(|s| sigmoid(s / temperature)).collect()
            }
        }
    }
}

/// Numerically stable softmax; NaN everywhere when there is no finite maximum.
fn softmax(scores: Vec<f32>) -> Vec<f32> {
    let max = scores.iter().copied().fold(f32::NEG_INFINITY, f32::max);
    if !max.is_finite() {
        return vec![f32::NAN; scores.len()];
    }

    let exps: Vec<f32> = scores.iter().map(|&s| (s - max).exp()).collect();
    let sum: f32 = exps.iter().sum();
    exps.into_iter().map(|e| e / sum).collect()
}

fn sigmoid(x: f32) -> f32 {
    1.0 / (1.0 + (-x).exp())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn joint() -> ScoreNormalizer {
        ScoreNormalizer::new(ScoreMode::Joint).unwrap()
    }

    fn independent(temperature: f32) -> ScoreNormalizer {
        ScoreNormalizer::new(ScoreMode::Independent { temperature }).unwrap()
    }

    #[rstest]
    #[case(vec![1.0, 2.0, 3.0, 4.0])]
    #[case(vec![1000.0, 999.0, -1000.0])]
    #[case(vec![-88.0, -90.0])]
    #[case(vec![0.0])]
    #[case(vec![3.5, 3.5, 3.5])]
    fn test_joint_sums_to_one(#[case] raw: Vec<f32>) {
        let probs = joint().normalize(&raw);
        let sum: f32 = probs.iter().sum();
        assert!((sum - 1.0).abs() < 1e-6, "sum = {sum}");
        assert!(probs.iter().all(|p| (0.0..=1.0).contains(p)));
    }

    #[test]
    fn test_joint_preserves_order() {
        let probs = joint().normalize(&[0.1, 2.0, -1.0]);
        assert!(probs[1] > probs[0] && probs[0] > probs[2]);
    }

    #[test]
    fn test_independent_untempered() {
        let probs = independent(1.0).normalize(&[0.0, 2.0, -2.0]);
        assert!((probs[0] - 0.5).abs() < 1e-6);
        assert!((probs[1] - 0.880_797).abs() < 1e-5);
        assert!((probs[2] - 0.119_203).abs() < 1e-5);
    }

    #[test]
    fn test_temperature_flattens() {
        let sharp = independent(1.0).normalize(&[3.0]);
        let flat = independent(3.0).normalize(&[3.0]);
        assert!(flat[0] < sharp[0]);
        assert!(flat[0] > 0.5);
    }

    #[rstest]
    #[case(f32::NAN)]
    #[case(f32::INFINITY)]
    #[case(f32::NEG_INFINITY)]
    fn test_nonfinite_score_gets_lowest_probability(#[case] bad: f32) {
        let probs = joint().normalize(&[bad, 1.0, 0.0]);
        assert_eq!(probs[0], 0.0);
        assert!(probs.iter().all(|p| p.is_finite()));

        let probs = independent(2.0).normalize(&[bad, 1.0]);
        assert_eq!(probs[0], 0.0);
        assert!(probs[1] > 0.5);
    }

    #[test]
    fn test_all_nonfinite_joint_is_flagged() {
        let probs = joint().normalize(&[f32::NAN, f32::INFINITY]);
        assert!(probs.iter().all(|p| p.is_nan()));
    }

    #[rstest]
    #[case(0.0)]
    #[case(-1.0)]
    #[case(f32::NAN)]
    #[case(f32::INFINITY)]
    fn test_invalid_temperature(#[case] temperature: f32) {
        let err = ScoreNormalizer::new(ScoreMode::Independent { temperature }).unwrap_err();
        assert!(matches!(err, TriageError::InvalidTemperature(_)));
        assert!(err.is_configuration());
    }

    #[test]
    fn test_mode_serde() {
        let mode: ScoreMode =
            serde_json::from_str(r#"{"mode": "independent", "temperature": 1.5}"#).unwrap();
        assert_eq!(mode, ScoreMode::Independent { temperature: 1.5 });
        let mode: ScoreMode = serde_json::from_str(r#"{"mode": "joint"}"#).unwrap();
        assert_eq!(mode, ScoreMode::Joint);
    }
}
