// SPDX-FileCopyrightText: Copyright (c) 2024-2025 NVIDIA CORPORATION & AFFILIATES. All rights reserved.
// SPDX-License-Identifier: Apache-2.0

use crate::error::TriageError;

/// Ordered label names, position `i` naming score index `i`.
///
/// Validated once against the model's score-vector length: fewer labels than
/// scores is allowed (trailing scores are ignored), more is a configuration error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LabelSet {
    names: Vec<String>,
    num_scores: usize,
}

impl LabelSet {
    pub fn new(names: Vec<String>, num_scores: usize) -> Result<Self, TriageError> {
        if names.is_empty() {
            return Err(TriageError::NoLabels);
        }
        if names.len() > num_scores {
            return Err(TriageError::LabelOverflow {
                labels: names.len(),
                scores: num_scores,
            });
        }
        for (i, name) in names.iter().enumerate() {
            if names[..i].contains(name) {
                return Err(TriageError::DuplicateLabel(name.clone()));
            }
        }
        if names.len() < num_scores {
            tracing::warn!(
                labels = names.len(),
                scores = num_scores,
                "fewer labels than model scores; trailing scores are ignored"
            );
        }
        Ok(Self { names, num_scores })
    }

    /// Label set whose score length equals its label count.
    pub fn exact(names: Vec<String>) -> Result<Self, TriageError> {
        let n = names.len();
        Self::new(names, n)
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    /// Expected length of the raw score vector.
    pub fn num_scores(&self) -> usize {
        self.num_scores
    }

    pub fn names(&self) -> &[String] {
        &self.names
    }

    pub fn name(&self, index: usize) -> Option<&str> {
        self.names.get(index).map(String::as_str)
    }

    pub fn index_of(&self, name: &str) -> Option<usize> {
        self.names.iter().position(|n| n == name)
    }
}
