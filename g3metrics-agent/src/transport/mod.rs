/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2025 ByteDance and/or its affiliates.
 */

use std::io;

use thiserror::Error;

use g3_metric_model::Metric;
use g3_metric_model::protocol::ResponseStatus;

mod udp;
pub use udp::UdpSender;

#[derive(Debug, Error)]
pub enum SendError {
    #[error("io error: {0}")]
    Io(#[from] io::Error),
    #[error("timed out waiting for response")]
    Timeout,
    #[error("failed to encode request: {0}")]
    Encode(serde_json::Error),
    #[error("request size {0} exceeds datagram limit")]
    TooLarge(usize),
    #[error("invalid response: {0}")]
    InvalidResponse(serde_json::Error),
    #[error("rejected by server ({status:?}): {reason}")]
    Rejected {
        status: ResponseStatus,
        reason: String,
    },
}

/// Outbound side of the update API.
pub trait MetricSender: Send + Sync + 'static {
    fn send_gauge(&self, name: &str, value: f64)
    -> impl Future<Output = Result<(), SendError>> + Send;

    fn send_counter(
        &self,
        name: &str,
        delta: i64,
    ) -> impl Future<Output = Result<(), SendError>> + Send;

    fn send_batch(&self, metrics: &[Metric]) -> impl Future<Output = Result<(), SendError>> + Send;
}
