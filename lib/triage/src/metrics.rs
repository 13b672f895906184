// SPDX-FileCopyrightText: Copyright (c) 2024-2025 NVIDIA CORPORATION & AFFILIATES. All rights reserved.
// SPDX-License-Identifier: Apache-2.0

use once_cell::sync::Lazy;
use prometheus::{
    register_histogram, register_int_counter, register_int_counter_vec, Histogram, IntCounter,
    IntCounterVec,
};

pub static DECISIONS: Lazy<IntCounterVec> = Lazy::new(|| {
    register_int_counter_vec!(
        "triage_decisions_total",
        "Decisions produced by the triage service",
        &["decision", "accepted"]
    )
    .expect("Failed to register triage_decisions_total metric")
});

pub static REJECTED_REQUESTS: Lazy<IntCounterVec> = Lazy::new(|| {
    register_int_counter_vec!(
        "triage_rejected_requests_total",
        "Requests rejected before or during classification",
        &["reason"]
    )
    .expect("Failed to register triage_rejected_requests_total metric")
});

pub static MODEL_LATENCY: Lazy<Histogram> = Lazy::new(|| {
    register_histogram!(
        "triage_model_latency_ms",
        "Latency of the external model call"
    )
    .expect("Failed to register triage_model_latency_ms metric")
});

pub static NONFINITE_SCORES: Lazy<IntCounter> = Lazy::new(|| {
    register_int_counter!(
        "triage_nonfinite_scores_total",
        "Raw model scores that were NaN or infinite"
    )
    .expect("Failed to register triage_nonfinite_scores_total metric")
});
