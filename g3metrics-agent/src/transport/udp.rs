/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2025 ByteDance and/or its affiliates.
 */

use std::net::{Ipv4Addr, Ipv6Addr, SocketAddr};
use std::time::Duration;

use tokio::net::UdpSocket;

use g3_metric_model::Metric;
use g3_metric_model::protocol::{MAX_DATAGRAM_SIZE, Request, Response};

use super::{MetricSender, SendError};

/// Sends each request from a fresh socket and waits for the reply.
pub struct UdpSender {
    server: SocketAddr,
    timeout: Duration,
}

impl UdpSender {
    pub fn new(server: SocketAddr, timeout: Duration) -> Self {
        UdpSender { server, timeout }
    }

    async fn request(&self, req: &Request) -> Result<Response, SendError> {
        let data = req.encode().map_err(SendError::Encode)?;
        if data.len() > MAX_DATAGRAM_SIZE {
            return Err(SendError::TooLarge(data.len()));
        }

        let bind_addr = match self.server {
            SocketAddr::V4(_) => SocketAddr::from((Ipv4Addr::UNSPECIFIED, 0)),
            SocketAddr::V6(_) => SocketAddr::from((Ipv6Addr::UNSPECIFIED, 0)),
        };
        let socket = UdpSocket::bind(bind_addr).await?;
        socket.connect(self.server).await?;
        socket.send(&data).await?;

        let mut buf = vec![0u8; u16::MAX as usize];
        let len = tokio::time::timeout(self.timeout, socket.recv(&mut buf))
            .await
            .map_err(|_| SendError::Timeout)??;
        let rsp = Response::decode(&buf[..len]).map_err(SendError::InvalidResponse)?;
        if rsp.is_ok() {
            Ok(rsp)
        } else {
            Err(SendError::Rejected {
                status: rsp.status,
                reason: rsp.error.unwrap_or_default(),
            })
        }
    }
}

impl MetricSender for UdpSender {
    async fn send_gauge(&self, name: &str, value: f64) -> Result<(), SendError> {
        let req = Request::Update {
            metric: Metric::gauge(name, value),
        };
        self.request(&req).await.map(|_| ())
    }

    async fn send_counter(&self, name: &str, delta: i64) -> Result<(), SendError> {
        let req = Request::Update {
            metric: Metric::counter(name, delta),
        };
        self.request(&req).await.map(|_| ())
    }

    async fn send_batch(&self, metrics: &[Metric]) -> Result<(), SendError> {
        let req = Request::Updates {
            metrics: metrics.to_vec(),
        };
        self.request(&req).await.map(|_| ())
    }
}
