// SPDX-FileCopyrightText: Copyright (c) 2024-2025 NVIDIA CORPORATION & AFFILIATES. All rights reserved.
// SPDX-License-Identifier: Apache-2.0

//! Request path: text in, decision out
//!
//! Everything is built once from a [`TriageConfig`] and then only read. There is
//! no reload path; picking up a new vocabulary or thresholds document means
//! building a new service (in practice, restarting the process).

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::config::TriageConfig;
use crate::error::TriageError;
use crate::metrics::{DECISIONS, MODEL_LATENCY, REJECTED_REQUESTS};
use crate::runtime::ModelRuntime;
use crate::scoring::{
    DecisionEngine, DecisionResult, LabelSet, RankedLabel, ScoreNormalizer, ThresholdsConfig,
};
use crate::tokenizer::{normalize, EncodedSequence, SequenceEncoder, Vocabulary, WordPiece};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TriageRequest {
    pub text: String,
    /// Sequence length override, clamped to `[8, 256]`.
    #[serde(default)]
    pub max_seq_len: Option<usize>,
}

impl TriageRequest {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            max_seq_len: None,
        }
    }

    pub fn with_max_seq_len(mut self, max_seq_len: usize) -> Self {
        self.max_seq_len = Some(max_seq_len);
        self
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TriageResponse {
    /// Accepted label, or `UNSURE`.
    pub decision: String,
    pub accepted: bool,
    pub confidence: f32,
    pub top: Vec<RankedLabel>,
    pub unsure_band: f32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model_version: Option<String>,
}

/// Text side: normalize, segment and frame into model inputs.
#[derive(Debug, Clone)]
pub struct Preprocessor {
    segmenter: WordPiece,
    encoder: SequenceEncoder,
    default_seq_len: usize,
}

impl Preprocessor {
    pub fn new(segmenter: WordPiece, encoder: SequenceEncoder, default_seq_len: usize) -> Self {
        Self {
            segmenter,
            encoder,
            default_seq_len,
        }
    }

    pub fn from_config(
        config: &TriageConfig,
        vocab: Arc<Vocabulary>,
    ) -> Result<Self, TriageError> {
        let encoder = SequenceEncoder::new(vocab.clone(), &config.special_tokens)?;
        let segmenter = WordPiece::new(vocab, config.special_tokens.unknown.clone())
            .with_continuation_prefix(config.continuation_prefix.clone())
            .with_max_chars_per_word(config.max_chars_per_word);
        Ok(Self::new(segmenter, encoder, config.max_seq_len))
    }

    /// Normalized text and its subword pieces.
    pub fn tokenize(&self, text: &str) -> (String, Vec<String>) {
        let normalized = normalize(text);
        let pieces = self.segmenter.segment(&normalized);
        (normalized, pieces)
    }

    /// Encode request text. Text with no content after normalization is rejected
    /// before segmentation.
    pub fn encode(
        &self,
        text: &str,
        max_seq_len: Option<usize>,
    ) -> Result<EncodedSequence, TriageError> {
        let normalized = normalize(text);
        if normalized.is_empty() {
            return Err(TriageError::InvalidRequest(
                "text is empty after normalization".to_string(),
            ));
        }
        let pieces = self.segmenter.segment(&normalized);
        let seq_len = TriageConfig::clamp_seq_len(max_seq_len, self.default_seq_len);
        let encoded = self.encoder.encode(&pieces, seq_len);
        tracing::debug!(
            pieces = pieces.len(),
            real = encoded.real_len(),
            seq_len,
            "encoded request"
        );
        Ok(encoded)
    }
}

/// Score side: normalize raw scores and apply the acceptance policy.
#[derive(Debug, Clone)]
pub struct Postprocessor {
    normalizer: ScoreNormalizer,
    engine: DecisionEngine,
}

impl Postprocessor {
    pub fn new(normalizer: ScoreNormalizer, engine: DecisionEngine) -> Self {
        Self { normalizer, engine }
    }

    pub fn from_config(
        config: &TriageConfig,
        thresholds: &ThresholdsConfig,
    ) -> Result<Self, TriageError> {
        let names = config.resolve_labels(thresholds);
        let num_scores = config.num_scores.unwrap_or(names.len());
        let labels = LabelSet::new(names, num_scores)?;
        let normalizer = ScoreNormalizer::new(config.score_mode)?;
        tracing::info!(mode = ?normalizer.mode(), "score normalizer ready");
        Ok(Self::new(normalizer, DecisionEngine::new(labels, thresholds)))
    }

    pub fn engine(&self) -> &DecisionEngine {
        &self.engine
    }

    /// Decide over a raw score vector, which must have the configured length.
    pub fn decide(&self, raw: &[f32]) -> Result<DecisionResult, TriageError> {
        let expected = self.engine.labels().num_scores();
        if raw.len() != expected {
            return Err(TriageError::ScoreShape {
                expected,
                got: raw.len(),
            });
        }
        let probs = self.normalizer.normalize(raw);
        Ok(self.engine.decide(&probs))
    }
}

/// Shared, read-only classification service.
pub struct TriageService {
    pre: Preprocessor,
    post: Postprocessor,
    runtime: Arc<dyn ModelRuntime>,
}

impl TriageService {
    pub fn new(pre: Preprocessor, post: Postprocessor, runtime: Arc<dyn ModelRuntime>) -> Self {
        Self { pre, post, runtime }
    }

    /// Load the vocabulary and thresholds named by `config` and wire every stage.
    pub fn from_config(
        config: &TriageConfig,
        runtime: Arc<dyn ModelRuntime>,
    ) -> Result<Self, TriageError> {
        let vocab = Arc::new(Vocabulary::load(&config.vocab_path)?);
        let thresholds = config.load_thresholds()?;
        Self::from_parts(config, vocab, &thresholds, runtime)
    }

    /// Wire every stage from already-loaded artifacts.
    pub fn from_parts(
        config: &TriageConfig,
        vocab: Arc<Vocabulary>,
        thresholds: &ThresholdsConfig,
        runtime: Arc<dyn ModelRuntime>,
    ) -> Result<Self, TriageError> {
        let pre = Preprocessor::from_config(config, vocab)?;
        let post = Postprocessor::from_config(config, thresholds)?;
        tracing::info!(
            runtime = runtime.name(),
            labels = post.engine().labels().len(),
            max_seq_len = config.max_seq_len,
            "triage service initialized"
        );
        Ok(Self::new(pre, post, runtime))
    }

    pub fn preprocessor(&self) -> &Preprocessor {
        &self.pre
    }

    pub fn postprocessor(&self) -> &Postprocessor {
        &self.post
    }

    pub async fn classify(&self, request: &TriageRequest) -> Result<TriageResponse, TriageError> {
        let encoded = match self.pre.encode(&request.text, request.max_seq_len) {
            Ok(encoded) => encoded,
            Err(e) => {
                REJECTED_REQUESTS.with_label_values(&["invalid_request"]).inc();
                return Err(e);
            }
        };

        let t0 = std::time::Instant::now();
        let scores = self.runtime.infer(&encoded).await.map_err(|source| {
            REJECTED_REQUESTS.with_label_values(&["runtime_error"]).inc();
            TriageError::Runtime {
                runtime: self.runtime.name(),
                source,
            }
        })?;
        MODEL_LATENCY.observe(t0.elapsed().as_secs_f64() * 1000.0);

        let result = self.post.decide(&scores).inspect_err(|_| {
            REJECTED_REQUESTS.with_label_values(&["score_shape"]).inc();
        })?;

        DECISIONS
            .with_label_values(&[result.decision.as_str(), bool_label(result.accepted)])
            .inc();
        tracing::debug!(
            decision = %result.decision,
            confidence = result.confidence,
            accepted = result.accepted,
            "classified request"
        );

        let engine = self.post.engine();
        Ok(TriageResponse {
            decision: result.decision,
            accepted: result.accepted,
            confidence: result.confidence,
            top: result.top,
            unsure_band: result.unsure_band,
            model_id: engine.model_id().map(str::to_string),
            model_version: engine.model_version().map(str::to_string),
        })
    }
}

fn bool_label(b: bool) -> &'static str {
    if b {
        "true"
    } else {
        "false"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scoring::ScoreMode;

    fn config(labels: &[&str]) -> TriageConfig {
        TriageConfig {
            labels: labels.iter().map(|s| s.to_string()).collect(),
            ..Default::default()
        }
    }

    fn vocab() -> Arc<Vocabulary> {
        Arc::new(Vocabulary::parse("[CLS]\n[SEP]\n[PAD]\n[UNK]\nhe\n##lp\n"))
    }

    #[test]
    fn test_preprocessor_rejects_blank_text() {
        let pre = Preprocessor::from_config(&config(&["A"]), vocab()).unwrap();
        for text in ["", "   ", "\t\n", "\u{0301}"] {
            let err = pre.encode(text, None).unwrap_err();
            assert_eq!(err.kind(), crate::ErrorKind::Request);
        }
    }

    #[test]
    fn test_preprocessor_clamps_length() {
        let pre = Preprocessor::from_config(&config(&["A"]), vocab()).unwrap();
        assert_eq!(pre.encode("help", Some(2)).unwrap().len(), 8);
        assert_eq!(pre.encode("help", Some(4096)).unwrap().len(), 256);
        assert_eq!(pre.encode("help", None).unwrap().len(), 128);
    }

    #[test]
    fn test_postprocessor_checks_score_length() {
        let post =
            Postprocessor::from_config(&config(&["A", "B"]), &ThresholdsConfig::default()).unwrap();
        let err = post.decide(&[1.0, 2.0, 3.0]).unwrap_err();
        assert!(matches!(err, TriageError::ScoreShape { expected: 2, got: 3 }));
        assert_eq!(post.decide(&[0.0, 5.0]).unwrap().decision, "B");
    }

    #[test]
    fn test_postprocessor_label_overflow_fails_at_load() {
        let cfg = TriageConfig {
            num_scores: Some(1),
            ..config(&["A", "B"])
        };
        let err = Postprocessor::from_config(&cfg, &ThresholdsConfig::default()).unwrap_err();
        assert!(err.is_configuration());
    }

    #[test]
    fn test_postprocessor_invalid_temperature() {
        let cfg = TriageConfig {
            score_mode: ScoreMode::Independent { temperature: 0.0 },
            ..config(&["A"])
        };
        let err = Postprocessor::from_config(&cfg, &ThresholdsConfig::default()).unwrap_err();
        assert!(matches!(err, TriageError::InvalidTemperature(_)));
    }

    #[test]
    fn test_request_serde() {
        let req: TriageRequest = serde_json::from_str(r#"{"text": "help"}"#).unwrap();
        assert_eq!(req, TriageRequest::new("help"));
        let req: TriageRequest =
            serde_json::from_str(r#"{"text": "help", "max_seq_len": 32}"#).unwrap();
        assert_eq!(req.max_seq_len, Some(32));
        assert!(serde_json::from_str::<TriageRequest>(r#"{"text": 42}"#).is_err());
    }
}
