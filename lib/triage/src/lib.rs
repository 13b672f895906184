// SPDX-FileCopyrightText: Copyright (c) 2024-2025 NVIDIA CORPORATION & AFFILIATES. All rights reserved.
// SPDX-License-Identifier: Apache-2.0

//! Emergency Triage - deterministic stages around an opaque sequence classifier
//!
//! Short free-text emergency descriptions are classified into a fixed label set
//! (e.g. `CPR_NEEDED`, `SEVERE_BLEEDING`, `CHOKING`). The neural model itself is an
//! external collaborator; this crate owns everything around it:
//!
//! - [`tokenizer`]: text normalization, WordPiece segmentation and fixed-length
//!   sequence framing into the integer tensors the model expects.
//! - [`scoring`]: score normalization (joint softmax or tempered independent
//!   logistic) and the acceptance policy that yields a label or `UNSURE`.
//! - [`service`]: the request path tying both halves to a [`runtime::ModelRuntime`].
//!
//! # Example
//! ```rust,ignore
//! use emergency_triage::{TriageConfig, TriageRequest, TriageService};
//!
//! emergency_triage::logging::init();
//! let config = TriageConfig::from_env()?;
//! let service = TriageService::from_config(&config, runtime)?;
//! let response = service.classify(&TriageRequest::new("he is not breathing")).await?;
//! println!("{} ({:.2})", response.decision, response.confidence);
//! ```

pub mod config;
pub mod error;
pub mod logging;
pub mod metrics;
pub mod runtime;
pub mod scoring;
pub mod service;
pub mod tokenizer;

pub use config::{ConfigError, SpecialTokens, TriageConfig};
pub use error::{ErrorKind, TriageError};
pub use runtime::{KeywordRuntime, ModelRuntime};
pub use scoring::{
    DecisionEngine, DecisionResult, LabelSet, RankedLabel, ScoreMode, ScoreNormalizer,
    ThresholdsConfig, UNSURE,
};
pub use service::{Postprocessor, Preprocessor, TriageRequest, TriageResponse, TriageService};
pub use tokenizer::{normalize, EncodedSequence, SequenceEncoder, Vocabulary, WordPiece};

pub type Result<T, E = TriageError> = std::result::Result<T, E>;
