/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2025 ByteDance and/or its affiliates.
 */

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::{MetricKind, ModelError};

/// A single metric record, as carried on the wire and in snapshot files.
///
/// The numeric payload lives in `delta` for counters and in `value` for
/// gauges. Records that break this pairing can still be constructed and
/// decoded, `validate` is the place where they get rejected.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawMetric")]
pub struct Metric {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: MetricKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub delta: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<f64>,
}

#[derive(Deserialize)]
struct RawMetric {
    id: String,
    #[serde(rename = "type")]
    kind: String,
    delta: Option<i64>,
    value: Option<f64>,
}

impl TryFrom<RawMetric> for Metric {
    type Error = ModelError;

    fn try_from(raw: RawMetric) -> Result<Self, Self::Error> {
        let kind = MetricKind::from_str(&raw.kind)?;
        Ok(Metric {
            id: raw.id,
            kind,
            delta: raw.delta,
            value: raw.value,
        })
    }
}

impl Metric {
    pub fn counter<S: Into<String>>(id: S, delta: i64) -> Self {
        Metric {
            id: id.into(),
            kind: MetricKind::Counter,
            delta: Some(delta),
            value: None,
        }
    }

    pub fn gauge<S: Into<String>>(id: S, value: f64) -> Self {
        Metric {
            id: id.into(),
            kind: MetricKind::Gauge,
            delta: None,
            value: Some(value),
        }
    }

    /// Build a metric from the positional `name`, `kind` and `value` strings
    /// found in update paths.
    pub fn parse_from_wire(name: &str, kind: &str, value: &str) -> Result<Self, ModelError> {
        let kind = MetricKind::from_str(kind)?;
        let metric = match kind {
            MetricKind::Counter => {
                let delta = i64::from_str(value).map_err(|e| ModelError::ParseError {
                    kind,
                    value: value.to_string(),
                    reason: e.to_string(),
                })?;
                Metric::counter(name, delta)
            }
            MetricKind::Gauge => {
                let v = f64::from_str(value).map_err(|e| ModelError::ParseError {
                    kind,
                    value: value.to_string(),
                    reason: e.to_string(),
                })?;
                Metric::gauge(name, v)
            }
        };
        metric.validate()?;
        Ok(metric)
    }

    /// Decode a structured JSON payload.
    ///
    /// Only the kind is checked here, the field pairing is left to `validate`.
    pub fn from_json(buf: &[u8]) -> Result<Self, ModelError> {
        let raw: RawMetric = serde_json::from_slice(buf)?;
        Metric::try_from(raw)
    }

    pub fn validate(&self) -> Result<(), ModelError> {
        let reason = if self.id.is_empty() {
            "empty id"
        } else {
            match self.kind {
                MetricKind::Counter => match (self.delta, self.value) {
                    (None, _) => "counter without delta",
                    (Some(_), Some(_)) => "counter with gauge value",
                    (Some(_), None) => return Ok(()),
                },
                MetricKind::Gauge => match (self.value, self.delta) {
                    (None, _) => "gauge without value",
                    (Some(_), Some(_)) => "gauge with counter delta",
                    (Some(v), None) if !v.is_finite() => "gauge value is not finite",
                    (Some(_), None) => return Ok(()),
                },
            }
        };
        Err(ModelError::MalformedMetric {
            id: self.id.clone(),
            reason,
        })
    }

    /// The string form of the numeric payload for this metric's kind.
    pub fn value_string(&self) -> Option<String> {
        match self.kind {
            MetricKind::Counter => self.delta.map(format_counter),
            MetricKind::Gauge => self.value.map(format_gauge),
        }
    }
}

pub fn format_counter(delta: i64) -> String {
    itoa::Buffer::new().format(delta).to_string()
}

// no exponent, shortest form that parses back to the same bits
pub fn format_gauge(value: f64) -> String {
    value.to_string()
}

impl fmt::Display for Metric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.value_string() {
            Some(v) => write!(f, "{} {}={}", self.kind, self.id, v),
            None => write!(f, "{} {}=<none>", self.kind, self.id),
        }
    }
}
