// SPDX-FileCopyrightText: Copyright (c) 2024-2025 NVIDIA CORPORATION & AFFILIATES. All rights reserved.
// SPDX-License-Identifier: Apache-2.0

//! Triage logging setup.
//!
//! Logging can take two forms: `READABLE` or `JSONL`. The default is `READABLE`. `JSONL`
//! can be enabled by setting the `TRIAGE_LOGGING_JSONL` environment variable to `1`.
//!
//! Filters are read from the `TRIAGE_LOG` environment variable using `EnvFilter` syntax,
//! e.g. `TRIAGE_LOG=info,emergency_triage::scoring=debug`. The default log level is `info`.

use std::sync::Once;

use tracing::level_filters::LevelFilter;
use tracing_subscriber::fmt;
use tracing_subscriber::prelude::*;
use tracing_subscriber::EnvFilter;

/// ENV used to set the log filter
const FILTER_ENV: &str = "TRIAGE_LOG";

/// ENV switching output to JSON lines
const JSONL_ENV: &str = "TRIAGE_LOGGING_JSONL";

/// ENV disabling ANSI colours in readable output
const DISABLE_ANSI_ENV: &str = "TRIAGE_LOGGING_DISABLE_ANSI";

/// Once instance to ensure the logger is only initialized once
static INIT: Once = Once::new();

/// Install the global subscriber. Later calls are no-ops.
pub fn init() {
    INIT.call_once(setup_logging);
}

fn setup_logging() {
    let filter_layer = EnvFilter::builder()
        .with_default_directive(LevelFilter::INFO.into())
        .with_env_var(FILTER_ENV)
        .from_env_lossy();

    if env_is_truthy(JSONL_ENV) {
        let l = fmt::layer()
            .json()
            .with_current_span(true)
            .with_writer(std::io::stderr)
            .with_filter(filter_layer);
        tracing_subscriber::registry().with(l).init();
    } else {
        let l = fmt::layer()
            .compact()
            .with_ansi(!env_is_truthy(DISABLE_ANSI_ENV))
            .with_writer(std::io::stderr)
            .with_filter(filter_layer);
        tracing_subscriber::registry().with(l).init();
    }
}

fn env_is_truthy(env: &str) -> bool {
    std::env::var(env)
        .map(|v| is_truthy(&v))
        .unwrap_or(false)
}

fn is_truthy(val: &str) -> bool {
    matches!(val.to_lowercase().as_str(), "1" | "true" | "on" | "yes")
}
