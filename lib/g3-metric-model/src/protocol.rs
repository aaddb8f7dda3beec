/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2025 ByteDance and/or its affiliates.
 */

//! Datagram request / response messages of the metrics update API.
//!
//! Each UDP datagram carries exactly one JSON encoded [`Request`], and the
//! server replies with exactly one JSON encoded [`Response`].

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::Metric;

/// Max payload size of a single UDP datagram over IPv4.
pub const MAX_DATAGRAM_SIZE: usize = 65507;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "lowercase")]
pub enum Request {
    Update {
        metric: Metric,
    },
    Updates {
        metrics: Vec<Metric>,
    },
    Value {
        id: String,
        #[serde(rename = "type")]
        kind: String,
    },
    Values,
    Ping,
}

impl Request {
    pub fn decode(buf: &[u8]) -> Result<Self, serde_json::Error> {
        serde_json::from_slice(buf)
    }

    pub fn encode(&self) -> Result<Vec<u8>, serde_json::Error> {
        serde_json::to_vec(self)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResponseStatus {
    Ok,
    BadRequest,
    NotFound,
    InternalError,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Response {
    pub status: ResponseStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metric: Option<Metric>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub values: Option<BTreeMap<String, String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl Response {
    pub fn ok() -> Self {
        Response {
            status: ResponseStatus::Ok,
            metric: None,
            values: None,
            error: None,
        }
    }

    pub fn with_metric(metric: Metric) -> Self {
        Response {
            metric: Some(metric),
            ..Response::ok()
        }
    }

    pub fn with_values(values: BTreeMap<String, String>) -> Self {
        Response {
            values: Some(values),
            ..Response::ok()
        }
    }

    pub fn error<E: ToString>(status: ResponseStatus, e: E) -> Self {
        Response {
            status,
            metric: None,
            values: None,
            error: Some(e.to_string()),
        }
    }

    #[inline]
    pub fn is_ok(&self) -> bool {
        self.status == ResponseStatus::Ok
    }

    pub fn decode(buf: &[u8]) -> Result<Self, serde_json::Error> {
        serde_json::from_slice(buf)
    }

    pub fn encode(&self) -> Result<Vec<u8>, serde_json::Error> {
        serde_json::to_vec(self)
    }
}
