/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2025 ByteDance and/or its affiliates.
 */

use std::collections::BTreeMap;
use std::net::SocketAddr;
use std::str::FromStr;
use std::sync::Arc;

use anyhow::anyhow;
use log::{debug, info, warn};

use g3_metric_daemon::quit::QuitWaiter;
use g3_metric_model::MetricKind;
use g3_metric_model::protocol::{MAX_DATAGRAM_SIZE, Request, Response, ResponseStatus};

use crate::store::{MetricStorage, StoreError};

mod stats;
pub use stats::{FrontendSnapshot, FrontendStats};

mod udp_dgram;
use udp_dgram::UdpDgramFrontend;

fn error_response(e: StoreError) -> Response {
    let status = match &e {
        StoreError::NotFound { .. } => ResponseStatus::NotFound,
        e if e.is_bad_request() => ResponseStatus::BadRequest,
        _ => ResponseStatus::InternalError,
    };
    Response::error(status, e)
}

/// Map one decoded request onto the storage update API.
pub fn handle_request<S: MetricStorage + ?Sized>(storage: &S, req: Request) -> Response {
    let r = match req {
        Request::Update { metric } => storage.update_by_metric(&metric).map(Response::with_metric),
        Request::Updates { metrics } => storage.update_batch(&metrics).map(|_| Response::ok()),
        Request::Value { id, kind } => MetricKind::from_str(&kind)
            .map_err(StoreError::from)
            .and_then(|kind| storage.value_by_metric(&id, kind))
            .map(Response::with_metric),
        Request::Values => storage
            .all_values()
            .map(|values| Response::with_values(values.into_iter().collect::<BTreeMap<_, _>>())),
        Request::Ping => match storage.ping() {
            // not applicable is not an outage
            Ok(_) | Err(StoreError::UnsupportedOperation(_)) => Ok(Response::ok()),
            Err(e) => Err(e),
        },
    };
    r.unwrap_or_else(error_response)
}

/// Decode one datagram and build the encoded response for it.
pub fn handle_datagram<S: MetricStorage + ?Sized>(storage: &S, buf: &[u8]) -> (Response, Vec<u8>) {
    let rsp = match Request::decode(buf) {
        Ok(req) => handle_request(storage, req),
        Err(e) => Response::error(ResponseStatus::BadRequest, format!("invalid request: {e}")),
    };

    match rsp.encode() {
        Ok(data) if data.len() <= MAX_DATAGRAM_SIZE => (rsp, data),
        Ok(data) => {
            let reason = match &rsp.values {
                Some(values) => format!(
                    "response size {} of {} values exceeds datagram limit",
                    data.len(),
                    values.len()
                ),
                None => format!("response size {} exceeds datagram limit", data.len()),
            };
            warn!("{reason}");
            let rsp = Response::error(ResponseStatus::InternalError, reason);
            let data = rsp.encode().unwrap_or_default();
            (rsp, data)
        }
        Err(e) => {
            let rsp = Response::error(
                ResponseStatus::InternalError,
                format!("failed to encode response: {e}"),
            );
            let data = rsp.encode().unwrap_or_default();
            (rsp, data)
        }
    }
}

pub struct Frontend {
    io: UdpDgramFrontend,
    storage: Arc<dyn MetricStorage>,
    stats: Arc<FrontendStats>,
}

impl Frontend {
    pub async fn bind(
        addr: SocketAddr,
        storage: Arc<dyn MetricStorage>,
        stats: Arc<FrontendStats>,
    ) -> anyhow::Result<Self> {
        let io = UdpDgramFrontend::new(addr)
            .await
            .map_err(|e| anyhow!("failed to bind udp socket to {addr}: {e}"))?;
        Ok(Frontend { io, storage, stats })
    }

    pub fn local_addr(&self) -> anyhow::Result<SocketAddr> {
        self.io
            .local_addr()
            .map_err(|e| anyhow!("failed to get local address: {e}"))
    }

    /// Serve requests until quit. The request in progress is always finished.
    pub async fn run(self, mut quit: QuitWaiter) {
        let mut recv_buf = vec![0u8; u16::MAX as usize];
        if let Ok(addr) = self.io.local_addr() {
            info!("frontend listening on udp {addr}");
        }

        loop {
            tokio::select! {
                biased;

                _ = quit.wait() => break,
                r = self.io.recv_req(&mut recv_buf) => {
                    match r {
                        Ok((len, peer)) => self.serve(&recv_buf[..len], peer).await,
                        Err(e) => warn!("failed to recv req: {e}"),
                    }
                }
            }
        }

        let s = self.stats.snapshot();
        info!(
            "frontend stopped, requests: {} (invalid {}), responses: {} (failed {})",
            s.request_total, s.request_invalid, s.response_total, s.response_fail
        );
    }

    async fn serve(&self, buf: &[u8], peer: SocketAddr) {
        self.stats.add_request_total();

        let (rsp, data) = handle_datagram(self.storage.as_ref(), buf);
        if rsp.status == ResponseStatus::BadRequest {
            self.stats.add_request_invalid();
            debug!("bad request from {peer}: {}", rsp.error.as_deref().unwrap_or(""));
        } else if let Some(e) = &rsp.error {
            warn!("request from {peer} failed: {e}");
        }
        if data.is_empty() {
            return;
        }

        self.stats.add_response_total();
        if let Err(e) = self.io.send_rsp(&data, peer).await {
            self.stats.add_response_fail();
            debug!("failed to send response to {peer}: {e}");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStorage;
    use g3_metric_model::Metric;

    fn call(storage: &MemoryStorage, req: &str) -> Response {
        let (rsp, data) = handle_datagram(storage, req.as_bytes());
        assert_eq!(Response::decode(&data).unwrap(), rsp);
        rsp
    }

    #[test]
    fn update_and_read() {
        let s = MemoryStorage::new();
        let rsp = call(&s, r#"{"op":"update","metric":{"id":"requests","type":"counter","delta":5}}"#);
        assert!(rsp.is_ok());
        let rsp = call(&s, r#"{"op":"update","metric":{"id":"requests","type":"counter","delta":3}}"#);
        assert_eq!(rsp.metric, Some(Metric::counter("requests", 8)));

        let rsp = call(&s, r#"{"op":"value","id":"requests","type":"Counter"}"#);
        assert_eq!(rsp.metric, Some(Metric::counter("requests", 8)));

        let rsp = call(&s, r#"{"op":"updates","metrics":[{"id":"temp","type":"gauge","value":19.5},{"id":"temp","type":"gauge","value":21.0}]}"#);
        assert!(rsp.is_ok());
        assert!(rsp.metric.is_none());

        let rsp = call(&s, r#"{"op":"values"}"#);
        let values = rsp.values.unwrap();
        assert_eq!(values.len(), 2);
        assert_eq!(values["requests"], "8");
        assert_eq!(values["temp"], "21");
    }

    #[test]
    fn errors() {
        let s = MemoryStorage::new();
        let rsp = call(&s, "garbage");
        assert_eq!(rsp.status, ResponseStatus::BadRequest);

        let rsp = call(&s, r#"{"op":"update","metric":{"id":"a","type":"counter","value":1.0}}"#);
        assert_eq!(rsp.status, ResponseStatus::BadRequest);
        assert!(rsp.error.is_some());

        let rsp = call(&s, r#"{"op":"update","metric":{"id":"a","type":"histogram","delta":1}}"#);
        assert_eq!(rsp.status, ResponseStatus::BadRequest);

        let rsp = call(&s, r#"{"op":"value","id":"a","type":"summary"}"#);
        assert_eq!(rsp.status, ResponseStatus::BadRequest);

        let rsp = call(&s, r#"{"op":"value","id":"a","type":"gauge"}"#);
        assert_eq!(rsp.status, ResponseStatus::NotFound);
    }

    #[test]
    fn batch_abort() {
        let s = MemoryStorage::new();
        let rsp = call(
            &s,
            r#"{"op":"updates","metrics":[{"id":"a","type":"counter","delta":1},{"id":"b","type":"counter"},{"id":"c","type":"counter","delta":1}]}"#,
        );
        assert_eq!(rsp.status, ResponseStatus::BadRequest);
        assert!(s.value_of("a", MetricKind::Counter).is_ok());
        assert!(s.value_of("c", MetricKind::Counter).is_err());
    }

    #[test]
    fn ping() {
        let s = MemoryStorage::new();
        let rsp = call(&s, r#"{"op":"ping"}"#);
        assert!(rsp.is_ok());
    }

    #[test]
    fn values_too_large() {
        let s = MemoryStorage::new();
        for i in 0..4000 {
            s.update_one(&Metric::gauge(format!("process_runtime_gauge_{i}"), 0.5))
                .unwrap();
        }
        let rsp = call(&s, r#"{"op":"values"}"#);
        assert_eq!(rsp.status, ResponseStatus::InternalError);
        assert!(rsp.values.is_none());
        assert!(rsp.error.unwrap().contains("of 4000 values"));

        // single lookups still work
        let rsp = call(&s, r#"{"op":"value","id":"process_runtime_gauge_7","type":"gauge"}"#);
        assert!(rsp.is_ok());
    }

    #[test]
    fn error_status() {
        let rsp = error_response(StoreError::Io(std::io::Error::other("disk full")));
        assert_eq!(rsp.status, ResponseStatus::InternalError);
        let rsp = error_response(StoreError::UnknownType("x".to_string()));
        assert_eq!(rsp.status, ResponseStatus::BadRequest);
    }

    #[tokio::test]
    async fn serve_udp() {
        let storage = Arc::new(MemoryStorage::new());
        let stats = Arc::new(FrontendStats::default());
        let frontend = Frontend::bind(
            "127.0.0.1:0".parse().unwrap(),
            storage.clone(),
            stats.clone(),
        )
        .await
        .unwrap();
        let addr = frontend.local_addr().unwrap();

        let quit = g3_metric_daemon::quit::QuitSignal::default();
        let task = tokio::spawn(frontend.run(quit.waiter()));

        let client = tokio::net::UdpSocket::bind("127.0.0.1:0").await.unwrap();
        client.connect(addr).await.unwrap();
        client
            .send(br#"{"op":"update","metric":{"id":"g","type":"gauge","value":1.25}}"#)
            .await
            .unwrap();
        let mut buf = [0u8; 1024];
        let len = client.recv(&mut buf).await.unwrap();
        let rsp = Response::decode(&buf[..len]).unwrap();
        assert_eq!(rsp.metric, Some(Metric::gauge("g", 1.25)));

        client.send(b"{}").await.unwrap();
        let len = client.recv(&mut buf).await.unwrap();
        let rsp = Response::decode(&buf[..len]).unwrap();
        assert_eq!(rsp.status, ResponseStatus::BadRequest);

        quit.trigger();
        task.await.unwrap();

        let s = stats.snapshot();
        assert_eq!(s.request_total, 2);
        assert_eq!(s.request_invalid, 1);
        assert_eq!(s.response_total, 2);
        assert_eq!(
            storage.value_of("g", MetricKind::Gauge).unwrap(),
            Metric::gauge("g", 1.25)
        );
    }
}
