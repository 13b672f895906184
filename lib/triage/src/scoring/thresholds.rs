// SPDX-FileCopyrightText: Copyright (c) 2024-2025 NVIDIA CORPORATION & AFFILIATES. All rights reserved.
// SPDX-License-Identifier: Apache-2.0

//! Acceptance thresholds document
//!
//! ```yaml
//! labels: [CPR_NEEDED, SEVERE_BLEEDING, CHOKING, SEIZURE]
//! min_confidence: 0.6
//! per_label_min_confidence:
//!   CPR_NEEDED: 0.45
//! min_margin: 0.1
//! unsure_band: 0.05
//! model_id: triage-bert-small
//! model_version: "2024-11-02"
//! ```
//!
//! Every field is optional. JSON documents parse as well.

use std::collections::HashMap;
use std::path::Path;

use serde::{Deserialize, Serialize};
use validator::{Validate, ValidationError};

use crate::error::TriageError;

pub const DEFAULT_MIN_CONFIDENCE: f32 = 0.5;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
#[serde(default)]
pub struct ThresholdsConfig {
    /// Ordered label names; overrides the process configuration when non-empty.
    pub labels: Option<Vec<String>>,

    /// Global confidence floor for accepting the top label.
    #[validate(custom(function = "validate_unit_interval"))]
    pub min_confidence: f32,

    /// Per-label floors, replacing `min_confidence` for the named label.
    #[validate(custom(function = "validate_per_label"))]
    pub per_label_min_confidence: HashMap<String, f32>,

    /// Required gap between the top and runner-up probabilities.
    #[validate(custom(function = "validate_unit_interval"))]
    pub min_margin: f32,

    /// Advisory width of a softer "unsure" boundary. Surfaced to callers only.
    #[validate(custom(function = "validate_band"))]
    pub unsure_band: f32,

    pub model_id: Option<String>,
    pub model_version: Option<String>,
}

impl Default for ThresholdsConfig {
    fn default() -> Self {
        Self {
            labels: None,
            min_confidence: DEFAULT_MIN_CONFIDENCE,
            per_label_min_confidence: HashMap::new(),
            min_margin: 0.0,
            unsure_band: 0.0,
            model_id: None,
            model_version: None,
        }
    }
}

// `range` lets NaN through, so bounds are checked by hand.
fn validate_unit_interval(value: f32) -> Result<(), ValidationError> {
    if (0.0..=1.0).contains(&value) {
        Ok(())
    } else {
        Err(ValidationError::new("not_in_unit_interval"))
    }
}

fn validate_band(value: f32) -> Result<(), ValidationError> {
    if value.is_finite() && value >= 0.0 {
        Ok(())
    } else {
        Err(ValidationError::new("invalid_unsure_band"))
    }
}

fn validate_per_label(map: &HashMap<String, f32>) -> Result<(), ValidationError> {
    if map.values().all(|v| (0.0..=1.0).contains(v)) {
        Ok(())
    } else {
        Err(ValidationError::new("per_label_min_confidence_out_of_range"))
    }
}

impl ThresholdsConfig {
    /// Parse and validate a YAML (or JSON) thresholds document.
    pub fn parse(text: &str) -> Result<Self, TriageError> {
        let config: Self = serde_yaml::from_str(text)?;
        config
            .validate()
            .map_err(|e| TriageError::InvalidThresholds(e.to_string()))?;
        Ok(config)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, TriageError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| TriageError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let config = Self::parse(&text)?;
        tracing::info!(
            path = %path.display(),
            min_confidence = config.min_confidence,
            min_margin = config.min_margin,
            unsure_band = config.unsure_band,
            per_label = config.per_label_min_confidence.len(),
            model_id = config.model_id.as_deref().unwrap_or("-"),
            model_version = config.model_version.as_deref().unwrap_or("-"),
            "loaded thresholds"
        );
        Ok(config)
    }

    /// Effective floor for a label: its override if present, else the global floor.
    pub fn min_confidence_for(&self, label: &str) -> f32 {
        self.per_label_min_confidence
            .get(label)
            .copied()
            .unwrap_or(self.min_confidence)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use std::io::Write;

    #[test]
    fn test_defaults() {
        let config = ThresholdsConfig::parse("{}").unwrap();
        assert_eq!(config, ThresholdsConfig::default());
        assert_eq!(config.min_confidence, 0.5);
        assert_eq!(config.min_margin, 0.0);
        assert_eq!(config.unsure_band, 0.0);
        assert!(config.labels.is_none());
    }

    #[test]
    fn test_parse_yaml() {
        let config = ThresholdsConfig::parse(
            r#"
labels: [CPR_NEEDED, SEVERE_BLEEDING, CHOKING, SEIZURE]
min_confidence: 0.6
per_label_min_confidence:
  CPR_NEEDED: 0.45
min_margin: 0.1
unsure_band: 0.05
model_id: triage-bert-small
model_version: "3"
"#,
        )
        .unwrap();
        assert_eq!(config.labels.as_ref().map(Vec::len), Some(4));
        assert_eq!(config.min_confidence_for("CPR_NEEDED"), 0.45);
        assert_eq!(config.min_confidence_for("CHOKING"), 0.6);
        assert_eq!(config.min_margin, 0.1);
        assert_eq!(config.model_version.as_deref(), Some("3"));
    }

    #[test]
    fn test_parse_json() {
        let config =
            ThresholdsConfig::parse(r#"{"min_confidence": 0.7, "model_id": "m"}"#).unwrap();
        assert_eq!(config.min_confidence, 0.7);
        assert_eq!(config.model_id.as_deref(), Some("m"));
    }

    #[rstest]
    #[case("min_confidence: 1.5")]
    #[case("min_confidence: -0.1")]
    #[case("min_margin: 2.0")]
    #[case("unsure_band: -0.2")]
    #[case("per_label_min_confidence: {CHOKING: 1.2}")]
    #[case("per_label_min_confidence: {CHOKING: .nan}")]
    #[case("min_confidence: .nan")]
    #[case("min_margin: .nan")]
    #[case("unsure_band: .inf")]
    #[case("unsure_band: .nan")]
    fn test_out_of_range(#[case] doc: &str) {
        let err = ThresholdsConfig::parse(doc).unwrap_err();
        assert!(matches!(err, TriageError::InvalidThresholds(_)), "{err}");
    }

    #[test]
    fn test_malformed() {
        let err = ThresholdsConfig::parse("min_confidence: [high]").unwrap_err();
        assert!(matches!(err, TriageError::ThresholdsParse(_)));
        assert!(err.is_configuration());
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "min_margin: 0.2").unwrap();
        let config = ThresholdsConfig::load(file.path()).unwrap();
        assert_eq!(config.min_margin, 0.2);
    }
}
