// SPDX-FileCopyrightText: Copyright (c) 2024-2025 NVIDIA CORPORATION & AFFILIATES. All rights reserved.
// SPDX-License-Identifier: Apache-2.0

//! Triage process configuration
//!
//! Every option is enumerated on [`TriageConfig`] with its default, and the whole
//! struct is resolved exactly once at startup. Nothing here is re-read while
//! serving.

use std::path::PathBuf;

use figment::{
    providers::{Env, Format, Json, Serialized, Toml},
    value::{Dict, Map},
    Figment, Metadata, Profile, Provider,
};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use validator::{Validate, ValidationError, ValidationErrors};

use crate::scoring::{ScoreMode, ThresholdsConfig};
use crate::tokenizer::{DEFAULT_CONTINUATION_PREFIX, DEFAULT_MAX_CHARS_PER_WORD};

/// Shortest sequence length a request may ask for.
pub const MIN_SEQ_LEN: usize = 8;
/// Longest sequence length a request may ask for.
pub const MAX_SEQ_LEN: usize = 256;
pub const DEFAULT_SEQ_LEN: usize = 128;

/// ENV pointing at an optional TOML configuration file
const CONFIG_PATH_ENV: &str = "TRIAGE_CONFIG_PATH";

/// System-wide configuration file, merged below `TRIAGE_CONFIG_PATH`
const SYSTEM_CONFIG_PATH: &str = "/opt/triage/etc/triage.toml";

/// Configuration errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to extract configuration: {0}")]
    Extraction(#[from] Box<figment::Error>),

    #[error("Configuration validation failed: {0}")]
    Validation(#[from] ValidationErrors),
}

/// Reserved token strings every vocabulary must contain.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Validate)]
pub struct SpecialTokens {
    #[validate(length(min = 1))]
    pub start: String,
    #[validate(length(min = 1))]
    pub end: String,
    #[validate(length(min = 1))]
    pub pad: String,
    #[validate(length(min = 1))]
    pub unknown: String,
}

impl Default for SpecialTokens {
    fn default() -> Self {
        Self {
            start: "[CLS]".to_string(),
            end: "[SEP]".to_string(),
            pad: "[PAD]".to_string(),
            unknown: "[UNK]".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct TriageConfig {
    /// Newline-delimited vocabulary; the line index is the token id.
    pub vocab_path: PathBuf,

    /// Optional YAML/JSON thresholds document.
    #[serde(default)]
    pub thresholds_path: Option<PathBuf>,

    /// Ordered label names, one per score index.
    /// Replaced by the thresholds document's `labels` when it has any.
    #[serde(default)]
    pub labels: Vec<String>,

    /// Length of the score vector the model emits.
    /// Defaults to the number of labels.
    #[validate(range(min = 1))]
    #[serde(default)]
    pub num_scores: Option<usize>,

    /// Default sequence length L when a request does not override it.
    #[validate(range(min = MIN_SEQ_LEN, max = MAX_SEQ_LEN))]
    pub max_seq_len: usize,

    /// Words longer than this many characters segment to the unknown token.
    #[validate(range(min = 1))]
    pub max_chars_per_word: usize,

    #[validate(length(min = 1))]
    pub continuation_prefix: String,

    #[validate(nested)]
    pub special_tokens: SpecialTokens,

    #[validate(custom(function = "validate_score_mode"))]
    pub score_mode: ScoreMode,
}

impl Default for TriageConfig {
    fn default() -> Self {
        Self {
            vocab_path: PathBuf::from("vocab.txt"),
            thresholds_path: None,
            labels: Vec::new(),
            num_scores: None,
            max_seq_len: DEFAULT_SEQ_LEN,
            max_chars_per_word: DEFAULT_MAX_CHARS_PER_WORD,
            continuation_prefix: DEFAULT_CONTINUATION_PREFIX.to_string(),
            special_tokens: SpecialTokens::default(),
            score_mode: ScoreMode::Joint,
        }
    }
}

fn validate_score_mode(mode: &ScoreMode) -> Result<(), ValidationError> {
    match mode {
        ScoreMode::Independent { temperature }
            if !(temperature.is_finite() && *temperature > 0.0) =>
        {
            Err(ValidationError::new("temperature_must_be_positive"))
        }
        _ => Ok(()),
    }
}

impl TriageConfig {
    /// Create a Figment configuration with all sources merged.
    ///
    /// Configuration sources in priority order (lowest to highest):
    /// 1. Code defaults
    /// 2. System config file at /opt/triage/etc/triage.toml
    /// 3. TOML file from TRIAGE_CONFIG_PATH environment variable
    /// 4. Environment variables (TRIAGE_* prefixed, `__` separates nested keys)
    pub fn figment() -> Figment {
        let config_path = std::env::var(CONFIG_PATH_ENV).unwrap_or_default();

        Figment::new()
            .merge(Serialized::defaults(TriageConfig::default()))
            .merge(Toml::file(SYSTEM_CONFIG_PATH))
            .merge(Toml::file(&config_path))
            // TRIAGE_MAX_SEQ_LEN, TRIAGE_SCORE_MODE__MODE, TRIAGE_SPECIAL_TOKENS__UNKNOWN, ...
            .merge(
                Env::prefixed("TRIAGE_")
                    .ignore(&["config_path", "log", "logging_jsonl", "logging_disable_ansi"])
                    .split("__"),
            )
    }

    /// Load configuration from default figment (env and files).
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::extract_from(Self::figment())
    }

    /// Extract configuration from any provider and validate it.
    pub fn extract_from<T: Provider>(provider: T) -> Result<Self, ConfigError> {
        let config: Self = Figment::from(provider)
            .extract()
            .map_err(|e| ConfigError::Extraction(Box::new(e)))?;
        config.validate()?;
        Ok(config)
    }

    /// Build a figment from defaults, then merge a custom provider.
    ///
    /// # Example
    /// ```rust,ignore
    /// let figment = TriageConfig::figment_with(("max_seq_len", 64usize));
    /// let config = TriageConfig::extract_from(figment)?;
    /// ```
    pub fn figment_with<T: Provider>(extra: T) -> Figment {
        Self::figment().merge(extra)
    }

    /// Load configuration with JSON overrides taking the highest priority.
    pub fn from_figment_with_json(json: &str) -> Result<Self, ConfigError> {
        Self::extract_from(Self::figment().merge(Json::string(json)))
    }

    /// Load the thresholds document, or its defaults when no path is configured.
    pub fn load_thresholds(&self) -> crate::Result<ThresholdsConfig> {
        match &self.thresholds_path {
            Some(path) => ThresholdsConfig::load(path),
            None => {
                tracing::info!("no thresholds document configured, using defaults");
                Ok(ThresholdsConfig::default())
            }
        }
    }

    /// Label order: the thresholds document wins when it lists any labels.
    pub fn resolve_labels(&self, thresholds: &ThresholdsConfig) -> Vec<String> {
        match &thresholds.labels {
            Some(labels) if !labels.is_empty() => labels.clone(),
            _ => self.labels.clone(),
        }
    }

    /// Clamp a per-request sequence length override into `[MIN_SEQ_LEN, MAX_SEQ_LEN]`.
    pub fn clamp_seq_len(requested: Option<usize>, default: usize) -> usize {
        requested
            .unwrap_or(default)
            .clamp(MIN_SEQ_LEN, MAX_SEQ_LEN)
    }
}

impl Provider for TriageConfig {
    fn metadata(&self) -> Metadata {
        Metadata::named("TriageConfig")
    }

    fn data(&self) -> Result<Map<Profile, Dict>, figment::Error> {
        Serialized::defaults(self).data()
    }
}
