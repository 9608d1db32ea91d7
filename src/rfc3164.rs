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

//! RFC 3164-compliant syslog message formatting
//! ============================================
//!
//! # Introduction
//!
//! [`Rfc3164`] is a [`SyslogFormatter`] that produces syslog messages according to RFC [3164] (AKA
//! the BSD syslog protocol). The protocol is descriptive rather than prescriptive in that it
//! attempted to describe what was already present in the wild, rather than describe something new.
//!
//! [3164]: https://datatracker.ietf.org/doc/html/rfc3164
//!
//! Although older than RFC [5424] it remains the format most collectors accept without any
//! configuration, which is why it's the default here.
//!
//! [5424]: https://datatracker.ietf.org/doc/html/rfc5424

use crate::{
    error::{Error, Result},
    facility::{Facility, Priority, Severity},
    formatter::SyslogFormatter,
    host::{local_address, system_hostname},
};

use backtrace::Backtrace;
use chrono::prelude::*;

type StdResult<T, E> = std::result::Result<T, E>;

////////////////////////////////////////////////////////////////////////////////////////////////////
//                                         utility types                                          //
////////////////////////////////////////////////////////////////////////////////////////////////////

/// A `Vec<u8>` instance with the additional constraint that its contents be ASCII above the value
/// 32 (space)
pub struct Rfc3164Hostname(Vec<u8>);

impl Rfc3164Hostname {
    /// An RFC 3164-compliant hostname is made-up of ASCII above 32/space. The RFC states "The
    /// Domain Name MUST NOT be included in the HOSTNAME field" which I interpret to mean that _if_
    /// one is using a true [hostname], `bytes` should contain only letters, digits and `-`. That
    /// said, one _may_ use an IP v4 address for this field, so this method doesn't attempt to
    /// enforce this condition & instead relies on the caller to do so (this _is_ respected by
    /// [`Rfc3164Hostname::discover`]).
    ///
    /// [hostname]: https://man7.org/linux/man-pages/man7/hostname.7.html
    pub fn new(bytes: Vec<u8>) -> Result<Rfc3164Hostname> {
        if !bytes.is_empty() && bytes.iter().all(|&x| x > 32 && x < 128) {
            Ok(Rfc3164Hostname(bytes))
        } else {
            Err(Error::BadHostname {
                name: bytes,
                back: Backtrace::new(),
            })
        }
    }
    /// Remove the domain (if any) from a host name
    ///
    /// This method will remove anything including & after the first `.` in `bytes`.
    fn strip_domain(mut bytes: Vec<u8>) -> Vec<u8> {
        if let Some(idx) = bytes.iter().position(|&x| x == b'.') {
            bytes.truncate(idx);
        }
        bytes
    }
    /// Figure-out an RFC [3164]-compliant hostname.
    ///
    /// Per the RFC:
    ///
    /// The HOSTNAME field will contain only the hostname, the IPv4 address, or the IPv6 address of
    /// the originator of the message.  The preferred value is the hostname.
    ///
    /// So: try the hostname (sans domain), then this host's IP address, then give up & say
    /// "localhost".
    ///
    /// [3164]: https://datatracker.ietf.org/doc/html/rfc3164
    pub fn discover() -> Rfc3164Hostname {
        system_hostname()
            .and_then(|hn| Rfc3164Hostname::new(Rfc3164Hostname::strip_domain(hn)).ok())
            .or_else(|| local_address().and_then(|ip| Rfc3164Hostname::new(ip).ok()))
            .unwrap_or_else(|| Rfc3164Hostname(b"localhost".to_vec()))
    }
}

impl std::convert::TryFrom<String> for Rfc3164Hostname {
    type Error = Error;
    /// IP addresses are taken as-is; anything else has its domain stripped. What's left is
    /// validated.
    fn try_from(x: String) -> StdResult<Self, Self::Error> {
        if x.parse::<std::net::IpAddr>().is_ok() {
            Rfc3164Hostname::new(x.into_bytes())
        } else {
            Rfc3164Hostname::new(Rfc3164Hostname::strip_domain(x.into_bytes()))
        }
    }
}

/// A `Vec<u8>` instance with the additional constraint that it be ASCII alphanumeric characters
///
/// Per the RFC: "The value in the TAG field will be the name of the program or process that
/// generated the message. The TAG is a string of ABNF alphanumeric characters that MUST NOT exceed
/// 32 characters.  Any non-alphanumeric character will terminate the TAG field and will be assumed
/// to be the starting character of the CONTENT field."
pub struct Tag(Vec<u8>);

impl Tag {
    pub fn new(bytes: Vec<u8>) -> Result<Tag> {
        if !bytes.is_empty() && bytes.len() <= 32 && bytes.iter().all(u8::is_ascii_alphanumeric) {
            Ok(Tag(bytes))
        } else {
            Err(Error::BadTag {
                name: bytes,
                back: Backtrace::new(),
            })
        }
    }
}

impl std::default::Default for Tag {
    fn default() -> Self {
        Tag(b"ansible".to_vec())
    }
}

impl std::fmt::Display for Tag {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> StdResult<(), std::fmt::Error> {
        write!(f, "{}", String::from_utf8_lossy(&self.0))
    }
}

impl std::convert::TryFrom<String> for Tag {
    type Error = Error;
    fn try_from(x: String) -> StdResult<Self, Self::Error> {
        Tag::new(x.into_bytes())
    }
}


/// A syslog formatter that produces RFC [3164]-conformant syslog messages:
///
/// ```text
/// <PRI>Mmm dd hh:mm:ss HOSTNAME TAG: MSG
/// ```
///
/// [3164]: https://datatracker.ietf.org/doc/html/rfc3164
pub struct Rfc3164 {
    facility: Facility,
    hostname: Rfc3164Hostname,
    tag: Tag,
}

impl std::default::Default for Rfc3164 {
    /// `LOG_USER`, the discovered hostname & the default tag
    fn default() -> Self {
        Rfc3164::builder().build()
    }
}

impl Rfc3164 {
    pub fn builder() -> Rfc3164Builder {
        Rfc3164Builder {
            facility: Facility::LOG_USER,
            hostname: None,
            tag: Tag::default(),
        }
    }
}

/// Hostname discovery is deferred to [`build`](Rfc3164Builder::build), and skipped entirely if a
/// hostname was given.
pub struct Rfc3164Builder {
    facility: Facility,
    hostname: Option<Rfc3164Hostname>,
    tag: Tag,
}

impl Rfc3164Builder {
    pub fn facility(mut self, facility: Facility) -> Self {
        self.facility = facility;
        self
    }
    pub fn hostname(mut self, hostname: Rfc3164Hostname) -> Self {
        self.hostname = Some(hostname);
        self
    }
    pub fn hostname_as_string(mut self, hostname: String) -> Result<Self> {
        self.hostname = Some(Rfc3164Hostname::try_from(hostname)?);
        Ok(self)
    }
    pub fn tag_as_string(mut self, tag: String) -> Result<Self> {
        self.tag = Tag::try_from(tag)?;
        Ok(self)
    }
    pub fn build(self) -> Rfc3164 {
        Rfc3164 {
            facility: self.facility,
            hostname: self.hostname.unwrap_or_else(Rfc3164Hostname::discover),
            tag: self.tag,
        }
    }
}

impl SyslogFormatter for Rfc3164 {
    type Error = Error;
    type Output = Vec<u8>;
    fn format(
        &self,
        severity: Severity,
        msg: &str,
        timestamp: Option<DateTime<FixedOffset>>,
    ) -> Result<Self::Output> {
        // RFC 3164 timestamps carry no timezone; they're read as the originator's local time,
        // which is whatever offset `timestamp` is expressed in.
        let timestamp = timestamp.unwrap_or_else(|| Local::now().into());
        let mut buf = format!(
            "<{}>{} ",
            Priority::new(self.facility, severity),
            timestamp.format("%b %_d %H:%M:%S"),
        )
        .into_bytes();

        use bytes::BufMut;
        buf.put_slice(&self.hostname.0);

        // The MSG part has two fields known as the TAG field and the CONTENT field.  The value in
        // the TAG field will be the name of the program or process that generated the message.
        // Any non-alphanumeric character will terminate the TAG field and will be assumed to be
        // the starting character of the CONTENT field; a colon is the conventional choice.
        buf.put_slice(b" ");
        buf.put_slice(&self.tag.0);
        buf.put_slice(b": ");
        buf.put_slice(msg.as_bytes());

        Ok(buf)
    }
}
