/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2025 ByteDance and/or its affiliates.
 */

use std::fmt;
use std::str::FromStr;

use serde::Serialize;

use crate::ModelError;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum MetricKind {
    Counter,
    Gauge,
}

impl MetricKind {
    pub const fn as_str(&self) -> &'static str {
        match self {
            MetricKind::Counter => "counter",
            MetricKind::Gauge => "gauge",
        }
    }
}

impl FromStr for MetricKind {
    type Err = ModelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.eq_ignore_ascii_case("counter") {
            Ok(MetricKind::Counter)
        } else if s.eq_ignore_ascii_case("gauge") {
            Ok(MetricKind::Gauge)
        } else {
            Err(ModelError::InvalidKind(s.to_string()))
        }
    }
}

impl fmt::Display for MetricKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_ignore_case() {
        assert_eq!(MetricKind::from_str("counter").unwrap(), MetricKind::Counter);
        assert_eq!(MetricKind::from_str("Counter").unwrap(), MetricKind::Counter);
        assert_eq!(MetricKind::from_str("GAUGE").unwrap(), MetricKind::Gauge);
    }

    #[test]
    fn parse_invalid() {
        let e = MetricKind::from_str("histogram").unwrap_err();
        assert!(matches!(e, ModelError::InvalidKind(s) if s == "histogram"));
        assert!(MetricKind::from_str("").is_err());
        assert!(MetricKind::from_str("gauges").is_err());
    }
}
