// SPDX-FileCopyrightText: Copyright (c) 2024-2025 NVIDIA CORPORATION & AFFILIATES. All rights reserved.
// SPDX-License-Identifier: Apache-2.0

//! Triage error taxonomy
//!
//! Errors fall into three buckets, exposed through [`ErrorKind`]:
//! - configuration errors are fatal at startup and never produced while serving,
//! - request errors reject a single request without touching shared state,
//! - runtime errors come from the external model boundary.
//!
//! Numeric anomalies and unmatchable subwords are deliberately absent: the former
//! resolve to an `UNSURE` decision, the latter to the unknown token.

use std::fmt;
use std::path::PathBuf;

use crate::config::ConfigError;

/// Coarse category of a [`TriageError`].
///
/// The serving layer inspects the kind to pick a response status rather than
/// matching on individual variants.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Configuration,
    Request,
    Runtime,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ErrorKind::Configuration => write!(f, "Configuration"),
            ErrorKind::Request => write!(f, "Request"),
            ErrorKind::Runtime => write!(f, "Runtime"),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum TriageError {
    #[error("vocabulary is missing reserved token {0:?}")]
    MissingSpecialToken(String),

    #[error("no labels configured")]
    NoLabels,

    #[error("label {0:?} is configured more than once")]
    DuplicateLabel(String),

    #[error("{labels} labels configured but the model emits only {scores} scores")]
    LabelOverflow { labels: usize, scores: usize },

    #[error("temperature must be finite and greater than 0, got {0}")]
    InvalidTemperature(f32),

    #[error("invalid thresholds: {0}")]
    InvalidThresholds(String),

    #[error("failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse thresholds document: {0}")]
    ThresholdsParse(#[from] serde_yaml::Error),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("request rejected: {0}")]
    InvalidRequest(String),

    #[error("model runtime returned {got} scores, expected {expected}")]
    ScoreShape { expected: usize, got: usize },

    #[error("model runtime {runtime} failed: {source}")]
    Runtime {
        runtime: &'static str,
        #[source]
        source: anyhow::Error,
    },
}

impl TriageError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            TriageError::MissingSpecialToken(_)
            | TriageError::NoLabels
            | TriageError::DuplicateLabel(_)
            | TriageError::LabelOverflow { .. }
            | TriageError::InvalidTemperature(_)
            | TriageError::InvalidThresholds(_)
            | TriageError::Io { .. }
            | TriageError::ThresholdsParse(_)
            | TriageError::Config(_) => ErrorKind::Configuration,
            TriageError::InvalidRequest(_) => ErrorKind::Request,
            TriageError::ScoreShape { .. } | TriageError::Runtime { .. } => ErrorKind::Runtime,
        }
    }

    pub fn is_configuration(&self) -> bool {
        self.kind() == ErrorKind::Configuration
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_mapping() {
        assert_eq!(
            TriageError::MissingSpecialToken("[CLS]".into()).kind(),
            ErrorKind::Configuration
        );
        assert_eq!(
            TriageError::LabelOverflow { labels: 5, scores: 4 }.kind(),
            ErrorKind::Configuration
        );
        assert_eq!(
            TriageError::InvalidRequest("empty text".into()).kind(),
            ErrorKind::Request
        );
        assert_eq!(
            TriageError::ScoreShape { expected: 4, got: 3 }.kind(),
            ErrorKind::Runtime
        );
        assert!(TriageError::InvalidTemperature(0.0).is_configuration());
    }

    #[test]
    fn test_display() {
        let err = TriageError::LabelOverflow { labels: 5, scores: 4 };
        assert_eq!(
            err.to_string(),
            "5 labels configured but the model emits only 4 scores"
        );
        assert_eq!(ErrorKind::Request.to_string(), "Request");
    }
}
