// SPDX-FileCopyrightText: Copyright (c) 2024-2025 NVIDIA CORPORATION & AFFILIATES. All rights reserved.
// SPDX-License-Identifier: Apache-2.0

//! Model runtime boundary
//!
//! The neural model is opaque: three equal-length integer arrays in (ids,
//! attention mask, all-zero segment ids), one real-valued score per label out.
//! Implementations wrap ONNX Runtime, Candle, a remote endpoint, etc.

use std::collections::HashMap;

use anyhow::Result;
use async_trait::async_trait;

use crate::scoring::LabelSet;
use crate::tokenizer::{EncodedSequence, Vocabulary};

#[async_trait]
pub trait ModelRuntime: Send + Sync {
    /// Run the model once over a single encoded sequence.
    async fn infer(&self, input: &EncodedSequence) -> Result<Vec<f32>>;

    fn name(&self) -> &'static str;
}

/// Deterministic keyword-counting runtime for tests and dry runs.
///
/// Each label owns a set of vocabulary tokens. The raw score for a label is
/// `base + weight * hits`, where `hits` counts real (unmasked) positions carrying
/// one of its tokens. Scores past the label count stay at `base`.
pub struct KeywordRuntime {
    keyword_ids: Vec<Vec<u32>>,
    num_scores: usize,
    base: f32,
    weight: f32,
}

impl KeywordRuntime {
    pub fn new(
        vocab: &Vocabulary,
        labels: &LabelSet,
        keywords: &HashMap<String, Vec<String>>,
    ) -> Self {
        let keyword_ids = labels
            .names()
            .iter()
            .map(|label| {
                keywords
                    .get(label)
                    .into_iter()
                    .flatten()
                    .filter_map(|token| {
                        let id = vocab.get(token);
                        if id.is_none() {
                            tracing::warn!(%label, %token, "keyword not in vocabulary; skipped");
                        }
                        id
                    })
                    .collect()
            })
            .collect();

        tracing::info!(labels = labels.len(), "initialized KeywordRuntime");

        Self {
            keyword_ids,
            num_scores: labels.num_scores(),
            base: 0.0,
            weight: 2.0,
        }
    }

    pub fn with_logits(mut self, base: f32, weight: f32) -> Self {
        self.base = base;
        self.weight = weight;
        self
    }
}

#[async_trait]
impl ModelRuntime for KeywordRuntime {
    async fn infer(&self, input: &EncodedSequence) -> Result<Vec<f32>> {
        let real: Vec<u32> = input
            .input_ids
            .iter()
            .zip(&input.attention_mask)
            .filter(|(_, &m)| m == 1)
            .map(|(&id, _)| id)
            .collect();

        let mut scores = vec![self.base; self.num_scores];
        for (score, ids) in scores.iter_mut().zip(&self.keyword_ids) {
            let hits = real.iter().filter(|&&id| ids.contains(&id)).count();
            *score += self.weight * hits as f32;
        }
        Ok(scores)
    }

    fn name(&self) -> &'static str {
        "keyword"
    }
}
