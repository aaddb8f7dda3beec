/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2025 ByteDance and/or its affiliates.
 */

use std::io;
use std::path::PathBuf;

use thiserror::Error;

use g3_metric_model::{MetricKind, ModelError};

use super::CodecError;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("malformed metric: {0}")]
    MalformedMetric(ModelError),
    #[error("unknown metric type {0}")]
    UnknownType(String),
    #[error("counter {0} has no delta")]
    EmptyDelta(String),
    #[error("gauge {0} has no value")]
    EmptyValue(String),
    #[error("{kind} {id} not found")]
    NotFound { id: String, kind: MetricKind },
    #[error("io error: {0}")]
    Io(#[from] io::Error),
    #[error("corrupt snapshot at line {line}: {reason}")]
    CorruptSnapshot { line: usize, reason: String },
    #[error("failed to restore from {}: {source}", path.display())]
    RestoreFailed {
        path: PathBuf,
        source: Box<StoreError>,
    },
    #[error("operation not supported by {0} storage")]
    UnsupportedOperation(&'static str),
}

impl StoreError {
    /// Errors caused by the request content rather than the server.
    pub fn is_bad_request(&self) -> bool {
        matches!(
            self,
            StoreError::MalformedMetric(_)
                | StoreError::UnknownType(_)
                | StoreError::EmptyDelta(_)
                | StoreError::EmptyValue(_)
        )
    }
}

impl From<ModelError> for StoreError {
    fn from(e: ModelError) -> Self {
        match e {
            ModelError::InvalidKind(kind) => StoreError::UnknownType(kind),
            e => StoreError::MalformedMetric(e),
        }
    }
}

impl From<CodecError> for StoreError {
    fn from(e: CodecError) -> Self {
        match e {
            CodecError::Io(e) => StoreError::Io(e),
            CodecError::Encode(e) => StoreError::Io(io::Error::other(e)),
            CodecError::NonFinite(id) => StoreError::Io(io::Error::new(
                io::ErrorKind::InvalidData,
                format!("non finite value for {id}"),
            )),
            CodecError::Corrupt { line, reason } => StoreError::CorruptSnapshot { line, reason },
        }
    }
}
