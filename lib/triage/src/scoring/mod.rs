// SPDX-FileCopyrightText: Copyright (c) 2024-2025 NVIDIA CORPORATION & AFFILIATES. All rights reserved.
// SPDX-License-Identifier: Apache-2.0

//! Model output to decision
//!
//! `raw scores -> ScoreNormalizer::normalize -> DecisionEngine::decide`

mod decision;
mod labels;
mod normalizer;
mod thresholds;

pub use decision::{DecisionEngine, DecisionResult, RankedLabel, TOP_K, UNSURE};
pub use labels::LabelSet;
pub use normalizer::{ScoreMode, ScoreNormalizer};
pub use thresholds::{ThresholdsConfig, DEFAULT_MIN_CONFIDENCE};
