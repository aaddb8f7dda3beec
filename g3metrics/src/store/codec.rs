/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2025 ByteDance and/or its affiliates.
 */

//! Line oriented snapshot format, one JSON encoded metric per line.

use std::io::{self, BufRead};

use thiserror::Error;

use g3_metric_model::Metric;

#[derive(Debug, Error)]
pub enum CodecError {
    #[error("io error: {0}")]
    Io(#[from] io::Error),
    #[error("failed to encode record: {0}")]
    Encode(serde_json::Error),
    #[error("non finite value for {0}")]
    NonFinite(String),
    #[error("corrupt record at line {line}: {reason}")]
    Corrupt { line: usize, reason: String },
}

/// Encode `metric` as a single line, including the trailing newline.
pub fn encode_line(metric: &Metric) -> Result<Vec<u8>, CodecError> {
    if let Some(v) = metric.value
        && !v.is_finite()
    {
        return Err(CodecError::NonFinite(metric.id.clone()));
    }
    let mut buf = serde_json::to_vec(metric).map_err(CodecError::Encode)?;
    buf.push(b'\n');
    Ok(buf)
}

pub fn decode_line(line: &[u8]) -> Result<Metric, String> {
    let metric = Metric::from_json(line).map_err(|e| e.to_string())?;
    metric.validate().map_err(|e| e.to_string())?;
    Ok(metric)
}

/// Lazy reader over a snapshot stream.
///
/// Yields records in file order. The first failure is yielded as an error
/// and ends the iteration.
pub struct SnapshotReader<R> {
    reader: R,
    line_no: usize,
    buf: Vec<u8>,
    failed: bool,
}

impl<R: BufRead> SnapshotReader<R> {
    pub fn new(reader: R) -> Self {
        SnapshotReader {
            reader,
            line_no: 0,
            buf: Vec::with_capacity(256),
            failed: false,
        }
    }

    fn corrupt(&mut self, reason: String) -> CodecError {
        self.failed = true;
        CodecError::Corrupt {
            line: self.line_no,
            reason,
        }
    }
}

impl<R: BufRead> Iterator for SnapshotReader<R> {
    type Item = Result<Metric, CodecError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.failed {
            return None;
        }
        loop {
            self.buf.clear();
            let nr = match self.reader.read_until(b'\n', &mut self.buf) {
                Ok(nr) => nr,
                Err(e) => {
                    self.line_no += 1;
                    return Some(Err(self.corrupt(format!("read failed: {e}"))));
                }
            };
            if nr == 0 {
                return None;
            }
            self.line_no += 1;

            let line = self.buf.trim_ascii();
            if line.is_empty() {
                continue;
            }
            return match decode_line(line) {
                Ok(metric) => Some(Ok(metric)),
                Err(reason) => Some(Err(self.corrupt(reason))),
            };
        }
    }
}
