// SPDX-FileCopyrightText: Copyright (c) 2024-2025 NVIDIA CORPORATION & AFFILIATES. All rights reserved.
// SPDX-License-Identifier: Apache-2.0

//! Acceptance policy over normalized probabilities
//!
//! The top-ranked label is accepted only when all of these hold:
//! - its probability is a finite number,
//! - it reaches the label's effective floor (per-label override, else global),
//! - it leads the runner-up by at least the configured margin.
//!
//! Anything else resolves to [`UNSURE`]. The unsure band is carried through as
//! advisory metadata and never changes the outcome.

use std::cmp::Ordering;

use serde::{Deserialize, Serialize};

use super::{LabelSet, ThresholdsConfig};

/// Sentinel decision when no label is accepted.
pub const UNSURE: &str = "UNSURE";

/// Number of ranked alternatives reported with every decision.
pub const TOP_K: usize = 3;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RankedLabel {
    pub label: String,
    pub probability: f32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DecisionResult {
    /// Accepted label name, or [`UNSURE`].
    pub decision: String,
    pub accepted: bool,
    /// Probability of the top-ranked label, accepted or not.
    pub confidence: f32,
    /// Up to three labels, highest probability first; ties keep label order.
    pub top: Vec<RankedLabel>,
    pub unsure_band: f32,
}

/// Applies a [`ThresholdsConfig`] to probability vectors for a fixed [`LabelSet`].
#[derive(Debug, Clone)]
pub struct DecisionEngine {
    labels: LabelSet,
    /// Effective floor per label index, resolved once.
    min_confidence: Vec<f32>,
    min_margin: f32,
    unsure_band: f32,
    model_id: Option<String>,
    model_version: Option<String>,
}

impl DecisionEngine {
    pub fn new(labels: LabelSet, thresholds: &ThresholdsConfig) -> Self {
        for name in thresholds.per_label_min_confidence.keys() {
            if labels.index_of(name).is_none() {
                tracing::warn!(label = %name, "per-label threshold names an unknown label; ignored");
            }
        }

        let min_confidence = labels
            .names()
            .iter()
            .map(|name| thresholds.min_confidence_for(name))
            .collect();

        tracing::info!(
            labels = labels.len(),
            min_confidence = thresholds.min_confidence,
            min_margin = thresholds.min_margin,
            unsure_band = thresholds.unsure_band,
            "decision engine ready"
        );

        Self {
            labels,
            min_confidence,
            min_margin: thresholds.min_margin,
            unsure_band: thresholds.unsure_band,
            model_id: thresholds.model_id.clone(),
            model_version: thresholds.model_version.clone(),
        }
    }

    pub fn labels(&self) -> &LabelSet {
        &self.labels
    }

    pub fn model_id(&self) -> Option<&str> {
        self.model_id.as_deref()
    }

    pub fn model_version(&self) -> Option<&str> {
        self.model_version.as_deref()
    }

    /// Decide over `probs`, indexed like the label set.
    ///
    /// Scores beyond the label count are ignored; labels without a score are
    /// treated as NaN, which forces `UNSURE`.
    pub fn decide(&self, probs: &[f32]) -> DecisionResult {
        let mut ranked: Vec<(usize, f32)> = (0..self.labels.len())
            .map(|i| (i, probs.get(i).copied().unwrap_or(f32::NAN)))
            .collect();
        // stable: equal probabilities keep label order
        ranked.sort_by(|a, b| rank_desc(a.1, b.1));

        let (top_index, top_p) = ranked[0];
        let second_p = ranked.get(1).map_or(0.0, |&(_, p)| p);

        let floor = self.min_confidence[top_index];
        let separated = (top_p - second_p) >= self.min_margin;
        let accepted = top_p.is_finite() && top_p >= floor && separated;

        let top_name = self.labels.names()[top_index].clone();
        let decision = if accepted {
            top_name.clone()
        } else {
            UNSURE.to_string()
        };

        let top = ranked
            .iter()
            .take(TOP_K)
            .map(|&(i, p)| RankedLabel {
                label: self.labels.names()[i].clone(),
                probability: p,
            })
            .collect();

        tracing::debug!(
            top = %top_name,
            top_p,
            second_p,
            floor,
            separated,
            accepted,
            "decision"
        );

        DecisionResult {
            decision,
            accepted,
            confidence: top_p,
            top,
            unsure_band: self.unsure_band,
        }
    }
}

/// Descending order with NaN ranked above every number.
fn rank_desc(a: f32, b: f32) -> Ordering {
    match (a.is_nan(), b.is_nan()) {
        (true, true) => Ordering::Equal,
        (true, false) => Ordering::Less,
        (false, true) => Ordering::Greater,
        (false, false) => b.partial_cmp(&a).unwrap_or(Ordering::Equal),
    }
}
