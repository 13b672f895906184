// SPDX-FileCopyrightText: Copyright (c) 2024-2025 NVIDIA CORPORATION & AFFILIATES. All rights reserved.
// SPDX-License-Identifier: Apache-2.0

//! Operator tooling for the triage pipeline.
//!
//! Configuration comes from the same sources as the service (`TRIAGE_CONFIG_PATH`,
//! `TRIAGE_*` variables). Results are printed as JSON on stdout; logs go to stderr.

use std::sync::Arc;

use anyhow::{anyhow, Result};
use clap::{Parser, Subcommand};

use emergency_triage::service::{Postprocessor, Preprocessor};
use emergency_triage::{logging, TriageConfig, Vocabulary};

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Args {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Print normalized text and its subword pieces
    Tokenize {
        /// Free-text emergency description
        #[arg(long)]
        text: String,
    },

    /// Print the fixed-length model inputs for a description
    Encode {
        /// Free-text emergency description
        #[arg(long)]
        text: String,

        /// Sequence length override, clamped to [8, 256]
        #[arg(long)]
        max_seq_len: Option<usize>,
    },

    /// Apply score normalization and the acceptance policy to raw model scores
    Decide {
        /// Comma-separated raw scores, one per label index
        #[arg(long, value_delimiter = ',', allow_hyphen_values = true)]
        scores: Vec<f32>,
    },
}

fn main() -> Result<()> {
    logging::init();
    let args = Args::parse();
    let config = TriageConfig::from_env()?;

    let output = match args.command {
        Command::Tokenize { text } => {
            let pre = preprocessor(&config)?;
            let (normalized, pieces) = pre.tokenize(&text);
            serde_json::json!({ "normalized": normalized, "pieces": pieces })
        }
        Command::Encode { text, max_seq_len } => {
            let pre = preprocessor(&config)?;
            serde_json::to_value(pre.encode(&text, max_seq_len)?)?
        }
        Command::Decide { scores } => {
            validate_scores(&scores)?;
            let thresholds = config.load_thresholds()?;
            let post = Postprocessor::from_config(&config, &thresholds)?;
            serde_json::to_value(post.decide(&scores)?)?
        }
    };

    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}

fn preprocessor(config: &TriageConfig) -> Result<Preprocessor> {
    let vocab = Arc::new(Vocabulary::load(&config.vocab_path)?);
    Ok(Preprocessor::from_config(config, vocab)?)
}

fn validate_scores(scores: &[f32]) -> Result<()> {
    if scores.is_empty() {
        return Err(anyhow!("At least one score is required"));
    }
    Ok(())
}
