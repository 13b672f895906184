// SPDX-FileCopyrightText: Copyright (c) 2024-2025 NVIDIA CORPORATION & AFFILIATES. All rights reserved.
// SPDX-License-Identifier: Apache-2.0

//! Greedy longest-match-first (WordPiece) segmentation.
//!
//! Each whitespace-separated word is split into the longest vocabulary pieces
//! available, left to right. Pieces after the first are looked up with the
//! continuation prefix (`##` by default) prepended. A word with any position that
//! matches nothing collapses to a single unknown token, never a partial list.

use std::sync::Arc;

use super::Vocabulary;

pub const DEFAULT_CONTINUATION_PREFIX: &str = "##";
pub const DEFAULT_MAX_CHARS_PER_WORD: usize = 100;

/// WordPiece segmenter bound to a shared [`Vocabulary`].
#[derive(Debug, Clone)]
pub struct WordPiece {
    vocab: Arc<Vocabulary>,
    unk_token: String,
    continuation_prefix: String,
    max_chars_per_word: usize,
}

impl WordPiece {
    pub fn new(vocab: Arc<Vocabulary>, unk_token: impl Into<String>) -> Self {
        Self {
            vocab,
            unk_token: unk_token.into(),
            continuation_prefix: DEFAULT_CONTINUATION_PREFIX.to_string(),
            max_chars_per_word: DEFAULT_MAX_CHARS_PER_WORD,
        }
    }

    pub fn with_continuation_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.continuation_prefix = prefix.into();
        self
    }

    pub fn with_max_chars_per_word(mut self, max_chars: usize) -> Self {
        self.max_chars_per_word = max_chars;
        self
    }

    /// Segment already-normalized text into subword pieces.
    pub fn segment(&self, normalized: &str) -> Vec<String> {
        let mut pieces = Vec::new();
        for word in normalized.split(' ').filter(|w| !w.is_empty()) {
            self.segment_word(word, &mut pieces);
        }
        pieces
    }

    fn segment_word(&self, word: &str, output: &mut Vec<String>) {
        // char boundaries, plus the end of the word
        let bounds: Vec<usize> = word
            .char_indices()
            .map(|(i, _)| i)
            .chain(std::iter::once(word.len()))
            .collect();
        let char_len = bounds.len() - 1;

        if char_len > self.max_chars_per_word {
            output.push(self.unk_token.clone());
            return;
        }

        let mut word_pieces = Vec::new();
        let mut candidate = String::with_capacity(word.len() + self.continuation_prefix.len());
        let mut start = 0;

        while start < char_len {
            let mut end = char_len;
            let mut matched = false;

            while end > start {
                candidate.clear();
                if start > 0 {
                    candidate.push_str(&self.continuation_prefix);
                }
                candidate.push_str(&word[bounds[start]..bounds[end]]);

                if self.vocab.contains(&candidate) {
                    matched = true;
                    break;
                }
                end -= 1;
            }

            if !matched {
                output.push(self.unk_token.clone());
                return;
            }

            word_pieces.push(candidate.clone());
            start = end;
        }

        output.extend(word_pieces);
    }
}
