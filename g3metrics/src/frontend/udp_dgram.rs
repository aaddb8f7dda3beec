/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2025 ByteDance and/or its affiliates.
 */

use std::io;
use std::net::SocketAddr;

use tokio::net::UdpSocket;

pub(super) struct UdpDgramFrontend {
    socket: UdpSocket,
}

impl UdpDgramFrontend {
    pub(super) async fn new(addr: SocketAddr) -> io::Result<Self> {
        let socket = UdpSocket::bind(addr).await?;
        Ok(UdpDgramFrontend { socket })
    }

    pub(super) fn local_addr(&self) -> io::Result<SocketAddr> {
        self.socket.local_addr()
    }

    pub(super) async fn recv_req(&self, buf: &mut [u8]) -> io::Result<(usize, SocketAddr)> {
        self.socket.recv_from(buf).await
    }

    pub(super) async fn send_rsp(&self, data: &[u8], peer: SocketAddr) -> io::Result<()> {
        let nw = self.socket.send_to(data, peer).await?;
        if nw != data.len() {
            Err(io::Error::other(format!(
                "not all data written, only {nw}/{}",
                data.len()
            )))
        } else {
            Ok(())
        }
    }
}
