// SPDX-FileCopyrightText: Copyright (c) 2024-2025 NVIDIA CORPORATION & AFFILIATES. All rights reserved.
// SPDX-License-Identifier: Apache-2.0

//! Text to model-input conversion
//!
//! `text -> normalize -> WordPiece::segment -> SequenceEncoder::encode`

mod encoder;
mod normalize;
mod vocab;
mod wordpiece;

pub use encoder::{EncodedSequence, SequenceEncoder};
pub use normalize::normalize;
pub use vocab::Vocabulary;
pub use wordpiece::{WordPiece, DEFAULT_CONTINUATION_PREFIX, DEFAULT_MAX_CHARS_PER_WORD};
