// SPDX-FileCopyrightText: Copyright (c) 2024-2025 NVIDIA CORPORATION & AFFILIATES. All rights reserved.
// SPDX-License-Identifier: Apache-2.0

//! Fixed-length sequence framing for the model input tensors.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use super::Vocabulary;
use crate::config::SpecialTokens;
use crate::error::TriageError;

/// Start and end tokens are always present.
const FRAME_LEN: usize = 2;

/// The three parallel arrays the model runtime consumes.
///
/// All three have the same length; `attention_mask` is 1 for real positions and
/// 0 for padding, and `token_type_ids` is all zero (single-segment input).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EncodedSequence {
    pub input_ids: Vec<u32>,
    pub attention_mask: Vec<u32>,
    pub token_type_ids: Vec<u32>,
}

impl EncodedSequence {
    pub fn len(&self) -> usize {
        self.input_ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.input_ids.is_empty()
    }

    /// Number of non-padding positions.
    pub fn real_len(&self) -> usize {
        self.attention_mask.iter().filter(|&&m| m == 1).count()
    }

    /// Widen to the `i64` tensors ONNX-style runtimes expect.
    pub fn to_i64(&self) -> [Vec<i64>; 3] {
        let widen = |v: &[u32]| v.iter().map(|&x| x as i64).collect::<Vec<_>>();
        [
            widen(&self.input_ids),
            widen(&self.attention_mask),
            widen(&self.token_type_ids),
        ]
    }
}

/// Frames subword pieces as `[start] pieces.. [end] [pad]..` of a fixed length.
///
/// Reserved token ids are resolved once at construction; a vocabulary lacking any
/// of them is a configuration error.
#[derive(Debug, Clone)]
pub struct SequenceEncoder {
    vocab: Arc<Vocabulary>,
    start_id: u32,
    end_id: u32,
    pad_id: u32,
    unk_id: u32,
}

impl SequenceEncoder {
    pub fn new(vocab: Arc<Vocabulary>, special: &SpecialTokens) -> Result<Self, TriageError> {
        let resolve = |token: &str| {
            vocab
                .get(token)
                .ok_or_else(|| TriageError::MissingSpecialToken(token.to_string()))
        };
        let start_id = resolve(&special.start)?;
        let end_id = resolve(&special.end)?;
        let pad_id = resolve(&special.pad)?;
        let unk_id = resolve(&special.unknown)?;

        tracing::debug!(start_id, end_id, pad_id, unk_id, "resolved reserved token ids");

        Ok(Self {
            vocab,
            start_id,
            end_id,
            pad_id,
            unk_id,
        })
    }

    /// Encode pieces into exactly `max_len` positions.
    ///
    /// At most `max_len - 2` pieces are kept. Lengths below 2 are raised to 2 since
    /// the start/end frame cannot be dropped.
    pub fn encode<S: AsRef<str>>(&self, pieces: &[S], max_len: usize) -> EncodedSequence {
        let max_len = max_len.max(FRAME_LEN);
        let kept = pieces.len().min(max_len - FRAME_LEN);

        let mut input_ids = Vec::with_capacity(max_len);
        input_ids.push(self.start_id);
        input_ids.extend(
            pieces[..kept]
                .iter()
                .map(|p| self.vocab.get(p.as_ref()).unwrap_or(self.unk_id)),
        );
        input_ids.push(self.end_id);

        let real = input_ids.len();
        let mut attention_mask = vec![1u32; real];

        input_ids.resize(max_len, self.pad_id);
        attention_mask.resize(max_len, 0);

        if kept < pieces.len() {
            tracing::debug!(
                pieces = pieces.len(),
                kept,
                max_len,
                "truncated subword sequence"
            );
        }

        EncodedSequence {
            input_ids,
            attention_mask,
            token_type_ids: vec![0; max_len],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tokenizer::WordPiece;
    use rstest::rstest;

    fn vocab() -> Arc<Vocabulary> {
        Arc::new(Vocabulary::parse("[CLS]\n[SEP]\n[PAD]\n[UNK]\nhe\n##lp\n"))
    }

    fn encoder() -> SequenceEncoder {
        SequenceEncoder::new(vocab(), &SpecialTokens::default()).unwrap()
    }

    #[test]
    fn test_help_example() {
        let pieces = WordPiece::new(vocab(), "[UNK]").segment("help");
        let enc = encoder().encode(&pieces, 6);
        assert_eq!(enc.input_ids, vec![0, 4, 5, 1, 2, 2]);
        assert_eq!(enc.attention_mask, vec![1, 1, 1, 1, 0, 0]);
        assert_eq!(enc.token_type_ids, vec![0; 6]);
        assert_eq!(enc.real_len(), 4);
    }

    #[test]
    fn test_truncation_keeps_frame() {
        let pieces = vec!["he"; 20];
        let enc = encoder().encode(&pieces, 8);
        assert_eq!(enc.input_ids, vec![0, 4, 4, 4, 4, 4, 4, 1]);
        assert_eq!(enc.attention_mask, vec![1; 8]);
    }

    #[test]
    fn test_empty_pieces_frame_only() {
        let enc = encoder().encode::<&str>(&[], 8);
        assert_eq!(enc.input_ids, vec![0, 1, 2, 2, 2, 2, 2, 2]);
        assert_eq!(enc.real_len(), 2);
    }

    #[test]
    fn test_absent_piece_maps_to_unknown() {
        let enc = encoder().encode(&["nope"], 4);
        assert_eq!(enc.input_ids, vec![0, 3, 1, 2]);
    }

    #[rstest]
    #[case(0)]
    #[case(1)]
    #[case(2)]
    fn test_tiny_lengths_frame_at_two(#[case] max_len: usize) {
        let enc = encoder().encode(&["he", "##lp"], max_len);
        assert_eq!(enc.input_ids, vec![0, 1]);
    }

    #[rstest]
    #[case(8, 0)]
    #[case(8, 3)]
    #[case(8, 100)]
    #[case(64, 17)]
    #[case(256, 300)]
    fn test_shape_invariants(#[case] max_len: usize, #[case] n_pieces: usize) {
        let pieces = vec!["he"; n_pieces];
        let enc = encoder().encode(&pieces, max_len);
        assert_eq!(enc.len(), max_len);
        assert_eq!(enc.attention_mask.len(), max_len);
        assert_eq!(enc.token_type_ids.len(), max_len);
        let real: u32 = enc.attention_mask.iter().sum();
        assert!(real as usize <= max_len);
        assert!(real >= 2);
        assert_eq!(real as usize, (n_pieces + 2).min(max_len));
    }

    #[test]
    fn test_deterministic() {
        let pieces = WordPiece::new(vocab(), "[UNK]").segment("help he help");
        let a = encoder().encode(&pieces, 16);
        let b = encoder().encode(&pieces, 16);
        assert_eq!(a, b);
    }

    #[rstest]
    #[case("[CLS]")]
    #[case("[SEP]")]
    #[case("[PAD]")]
    #[case("[UNK]")]
    fn test_missing_reserved_token(#[case] missing: &str) {
        let lines: Vec<&str> = ["[CLS]", "[SEP]", "[PAD]", "[UNK]", "he"]
            .into_iter()
            .filter(|t| *t != missing)
            .collect();
        let vocab = Arc::new(Vocabulary::from_lines(lines));
        let err = SequenceEncoder::new(vocab, &SpecialTokens::default()).unwrap_err();
        assert!(matches!(err, TriageError::MissingSpecialToken(ref t) if t == missing));
        assert!(err.is_configuration());
    }

    #[test]
    fn test_to_i64() {
        let enc = encoder().encode(&["he"], 4);
        let [ids, mask, types] = enc.to_i64();
        assert_eq!(ids, vec![0i64, 4, 1, 2]);
        assert_eq!(mask, vec![1i64, 1, 1, 0]);
        assert_eq!(types, vec![0i64; 4]);
    }
}
