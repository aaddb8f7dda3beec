/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2025 ByteDance and/or its affiliates.
 */

use thiserror::Error;

use crate::MetricKind;

#[derive(Debug, Error)]
pub enum ModelError {
    #[error("invalid metric kind {0}")]
    InvalidKind(String),
    #[error("invalid {kind} value {value}: {reason}")]
    ParseError {
        kind: MetricKind,
        value: String,
        reason: String,
    },
    #[error("malformed metric {id:?}: {reason}")]
    MalformedMetric { id: String, reason: &'static str },
    #[error("invalid metric payload: {0}")]
    InvalidPayload(#[from] serde_json::Error),
}
