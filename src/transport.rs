// Copyright (C) 2022-2025 Michael Herstine <sp1ff@pobox.com>
//
// This file is part of playbook-syslog.
//
// playbook-syslog is free software: you can redistribute it and/or modify it under the terms of the
// GNU General Public License as published by the Free Software Foundation, either version 3 of the
// License, or (at your option) any later version.
//
// playbook-syslog is distributed in the hope that it will be useful, but WITHOUT ANY WARRANTY; without
// even the implied warranty of MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the GNU
// General Public License for more details.
//
// You should have received a copy of the GNU General Public License along with playbook-syslog.  If
// not, see <http://www.gnu.org/licenses/>.

//! The syslog transport layer.
//!
//! This module defines the [`Transport`] trait that all implementations must support, the UDP
//! implementation, and [`BestEffort`], the boundary at which send failures stop.
//!
//! # Examples
//!
//! To send syslog messages over UDP to a collector listening on port 514 (the default) on
//! localhost:
//!
//! ```rust
//! use playbook_syslog::transport::UdpTransport;
//! let transpo = UdpTransport::local().unwrap();
//! ```
//!
//! On a non-standard port on another host:
//!
//! ```rust
//! use playbook_syslog::transport::UdpTransport;
//! let transpo = UdpTransport::new("some-host.domain.invalid:5514");
//! assert!(transpo.is_err()); // no such host, after all
//! ```

use crate::error::{Error, Result};

use backtrace::Backtrace;

use std::{
    net::{Ipv4Addr, Ipv6Addr, SocketAddr, ToSocketAddrs, UdpSocket},
    sync::atomic::{AtomicU64, Ordering},
};

////////////////////////////////////////////////////////////////////////////////////////////////////
//                                      transport mechanisms                                      //
////////////////////////////////////////////////////////////////////////////////////////////////////

/// Operations all transport layers must support.
pub trait Transport {
    /// Send a slice of byte on this transport mechanism.
    ///
    /// Each call is one complete syslog packet; implementations shall neither buffer nor retry.
    fn send(&self, buf: &[u8]) -> Result<usize>;
}

fn transport_error(err: std::io::Error) -> Error {
    Error::Transport {
        source: Box::new(err),
        back: Backtrace::new(),
    }
}

/// Sending syslog messages via UDP datagrams.
///
/// The socket is opened (and its destination resolved) once, at construction, and closed when
/// the [`UdpTransport`] is dropped. It is non-blocking: a datagram the kernel can't take right
/// away is an error, not a wait.
#[derive(Debug)]
pub struct UdpTransport {
    socket: UdpSocket,
}

impl UdpTransport {
    /// Construct a [`Transport`] implementation via UDP at `addr`.
    pub fn new<A: ToSocketAddrs>(addr: A) -> Result<UdpTransport> {
        // Prefer IPv4 when a name resolves to both families (e.g. "localhost")
        let addrs: Vec<SocketAddr> = addr.to_socket_addrs().map_err(transport_error)?.collect();
        let dest = addrs
            .iter()
            .find(|a| a.is_ipv4())
            .or_else(|| addrs.first())
            .copied()
            .ok_or_else(|| {
                transport_error(std::io::Error::new(
                    std::io::ErrorKind::NotFound,
                    "collector address resolved to nothing",
                ))
            })?;
        // Bind to any available port on any interface of the matching address family...
        let local: SocketAddr = match dest {
            SocketAddr::V4(_) => (Ipv4Addr::UNSPECIFIED, 0).into(),
            SocketAddr::V6(_) => (Ipv6Addr::UNSPECIFIED, 0).into(),
        };
        let socket = UdpSocket::bind(local).map_err(transport_error)?;
        // and connect to the collector at `dest`:
        socket.connect(dest).map_err(transport_error)?;
        socket.set_nonblocking(true).map_err(transport_error)?;
        Ok(UdpTransport { socket })
    }
    /// Construct a [`Transport`] implementation via UDP at localhost:514
    pub fn local() -> Result<UdpTransport> {
        UdpTransport::new("localhost:514")
    }
    /// The collector's address
    pub fn peer_addr(&self) -> Result<SocketAddr> {
        self.socket.peer_addr().map_err(transport_error)
    }
}

impl Transport for UdpTransport {
    fn send(&self, buf: &[u8]) -> Result<usize> {
        self.socket.send(buf).map_err(transport_error)
    }
}

impl<T: Transport + ?Sized> Transport for Box<T> {
    fn send(&self, buf: &[u8]) -> Result<usize> {
        (**self).send(buf)
    }
}

impl<T: Transport + ?Sized> Transport for &T {
    fn send(&self, buf: &[u8]) -> Result<usize> {
        (**self).send(buf)
    }
}

////////////////////////////////////////////////////////////////////////////////////////////////////
//                                       best-effort delivery                                     //
////////////////////////////////////////////////////////////////////////////////////////////////////

/// What became of the packets handed to a [`BestEffort`]
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct Delivery {
    pub sent: u64,
    pub dropped: u64,
}

/// Fire-and-forget delivery over a [`Transport`].
///
/// Delivery over UDP is unacknowledged anyway, so a failure to _send_ (collector unreachable,
/// socket buffer full, ...) is treated the same as a datagram lost in transit: logged at debug
/// level, counted, and otherwise ignored. Nothing here ever returns an error to the caller.
#[derive(Debug)]
pub struct BestEffort<T> {
    transport: T,
    sent: AtomicU64,
    dropped: AtomicU64,
}

impl<T: Transport> BestEffort<T> {
    pub fn new(transport: T) -> BestEffort<T> {
        BestEffort {
            transport,
            sent: AtomicU64::new(0),
            dropped: AtomicU64::new(0),
        }
    }
    pub fn deliver(&self, packet: &[u8]) {
        match self.transport.send(packet) {
            Ok(_) => {
                self.sent.fetch_add(1, Ordering::Relaxed);
            }
            Err(err) => {
                self.dropped.fetch_add(1, Ordering::Relaxed);
                tracing::debug!("dropped a {}-byte syslog packet: {}", packet.len(), err);
            }
        }
    }
    pub fn delivery(&self) -> Delivery {
        Delivery {
            sent: self.sent.load(Ordering::Relaxed),
            dropped: self.dropped.load(Ordering::Relaxed),
        }
    }
    pub fn transport(&self) -> &T {
        &self.transport
    }
    /// Release the underlying transport (closing its socket), reporting final counts
    pub fn shutdown(self) -> Delivery {
        let delivery = self.delivery();
        drop(self.transport);
        delivery
    }
}
