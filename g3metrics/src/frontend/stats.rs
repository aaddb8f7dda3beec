/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2025 ByteDance and/or its affiliates.
 */

use std::sync::atomic::{AtomicU64, Ordering};

#[derive(Default)]
pub struct FrontendStats {
    request_total: AtomicU64,
    request_invalid: AtomicU64,
    response_total: AtomicU64,
    response_fail: AtomicU64,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct FrontendSnapshot {
    pub request_total: u64,
    pub request_invalid: u64,
    pub response_total: u64,
    pub response_fail: u64,
}

impl FrontendStats {
    pub(crate) fn add_request_total(&self) {
        self.request_total.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn add_request_invalid(&self) {
        self.request_invalid.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn add_response_total(&self) {
        self.response_total.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn add_response_fail(&self) {
        self.response_fail.fetch_add(1, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> FrontendSnapshot {
        FrontendSnapshot {
            request_total: self.request_total.load(Ordering::Relaxed),
            request_invalid: self.request_invalid.load(Ordering::Relaxed),
            response_total: self.response_total.load(Ordering::Relaxed),
            response_fail: self.response_fail.load(Ordering::Relaxed),
        }
    }
}
