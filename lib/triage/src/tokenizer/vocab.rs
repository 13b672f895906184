// SPDX-FileCopyrightText: Copyright (c) 2024-2025 NVIDIA CORPORATION & AFFILIATES. All rights reserved.
// SPDX-License-Identifier: Apache-2.0

//! Subword vocabulary loaded from a newline-delimited token list.

use std::collections::HashMap;
use std::path::Path;

use crate::error::TriageError;

/// Immutable mapping from subword string to integer id.
///
/// A token's id is the 0-based index of the line it appears on. Blank lines are
/// skipped but still consume their index, so ids always match file positions.
#[derive(Debug, Clone, Default)]
pub struct Vocabulary {
    token_to_id: HashMap<String, u32>,
    /// One past the highest assigned id.
    id_span: usize,
}

impl Vocabulary {
    /// Build a vocabulary from ordered lines, where the line index is the id.
    pub fn from_lines<I, S>(lines: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut token_to_id = HashMap::new();
        let mut id_span = 0;
        let mut duplicates = 0usize;

        for (index, line) in lines.into_iter().enumerate() {
            let token = line.as_ref().trim_end();
            if token.trim().is_empty() {
                continue;
            }
            let id = index as u32;
            if token_to_id.contains_key(token) {
                duplicates += 1;
                tracing::warn!(token, line = index, "duplicate vocabulary entry ignored");
                continue;
            }
            token_to_id.insert(token.to_string(), id);
            id_span = index + 1;
        }

        tracing::debug!(
            tokens = token_to_id.len(),
            id_span,
            duplicates,
            "vocabulary built"
        );

        Self {
            token_to_id,
            id_span,
        }
    }

    /// Parse the contents of a `vocab.txt` style document.
    pub fn parse(text: &str) -> Self {
        Self::from_lines(text.lines())
    }

    /// Read and parse a vocabulary file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, TriageError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| TriageError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let vocab = Self::parse(&text);
        tracing::info!(
            path = %path.display(),
            tokens = vocab.len(),
            "loaded vocabulary"
        );
        Ok(vocab)
    }

    pub fn get(&self, token: &str) -> Option<u32> {
        self.token_to_id.get(token).copied()
    }

    pub fn contains(&self, token: &str) -> bool {
        self.token_to_id.contains_key(token)
    }

    /// Number of distinct tokens.
    pub fn len(&self) -> usize {
        self.token_to_id.len()
    }

    pub fn is_empty(&self) -> bool {
        self.token_to_id.is_empty()
    }

    /// Size of the id space, i.e. the embedding rows the model must provide.
    pub fn id_span(&self) -> usize {
        self.id_span
    }
}
