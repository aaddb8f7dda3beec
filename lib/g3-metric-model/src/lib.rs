/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2025 ByteDance and/or its affiliates.
 */

mod error;
pub use error::ModelError;

mod kind;
pub use kind::MetricKind;

mod metric;
pub use metric::{Metric, format_counter, format_gauge};

pub mod protocol;
