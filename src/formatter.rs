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

//! syslog formatting primitives.
//!
//! This module defines the [`SyslogFormatter`] trait, along with [`MessageFormatter`], which
//! selects between the [RFC 3164] & [RFC 5424] implementations at runtime.
//!
//! [RFC 3164]: crate::rfc3164::Rfc3164
//! [RFC 5424]: crate::rfc5424::Rfc5424

use crate::{
    error::{Error, Result},
    facility::{Facility, Severity},
    rfc3164::Rfc3164,
    rfc5424::Rfc5424,
};

use backtrace::Backtrace;
use chrono::prelude::*;

use std::ops::Deref;

/// Operations all formatters must support
/// ======================================
///
/// The translation from playbook events to syslog messages occurs in three parts:
///
/// 1. rendering the event to a textual payload (see [`payload`])
///
/// 2. incorporating that payload into a syslog packet compliant with your collector's
///    implementation
///
/// 3. transporting that packet to your collector
///
/// [`SyslogFormatter`] implements step 2 in this process: given the [`Severity`], a textual
/// payload, and an optional timestamp, produce a compliant syslog packet. The facility, hostname
/// & tag are fixed for the life of the formatter. Implementations shall use the current local time
/// when no timestamp is given.
///
/// [`payload`]: crate::payload
pub trait SyslogFormatter {
    type Error: std::error::Error;
    type Output: Deref<Target = [u8]>;
    fn format(
        &self,
        severity: Severity,
        msg: &str,
        timestamp: Option<DateTime<FixedOffset>>,
    ) -> std::result::Result<Self::Output, Self::Error>;
}

/// The two wire formats we speak
#[derive(Copy, Clone, Debug, PartialEq, Eq, Default)]
pub enum Format {
    /// The BSD syslog protocol
    #[default]
    Rfc3164,
    /// The structured syslog protocol
    Rfc5424,
}

impl std::str::FromStr for Format {
    type Err = Error;
    fn from_str(s: &str) -> Result<Format> {
        match s.trim().to_ascii_lowercase().as_str() {
            "rfc3164" | "3164" | "bsd" => Ok(Format::Rfc3164),
            "rfc5424" | "5424" | "structured" => Ok(Format::Rfc5424),
            _ => Err(Error::BadConfigValue {
                key: "format".to_string(),
                value: s.to_string(),
                back: Backtrace::new(),
            }),
        }
    }
}

/// A [`SyslogFormatter`] whose wire format is chosen by configuration
pub enum MessageFormatter {
    Bsd(Rfc3164),
    Structured(Rfc5424),
}

impl MessageFormatter {
    /// Build a formatter for `format`; `hostname` is discovered if not given.
    pub fn new(
        format: Format,
        facility: Facility,
        hostname: Option<&str>,
        tag: &str,
    ) -> Result<MessageFormatter> {
        Ok(match format {
            Format::Rfc3164 => {
                let mut builder = Rfc3164::builder()
                    .facility(facility)
                    .tag_as_string(tag.to_string())?;
                if let Some(hostname) = hostname {
                    builder = builder.hostname_as_string(hostname.to_string())?;
                }
                MessageFormatter::Bsd(builder.build())
            }
            Format::Rfc5424 => {
                let mut builder = Rfc5424::builder()
                    .facility(facility)
                    .appname_as_string(tag.to_string())?;
                if let Some(hostname) = hostname {
                    builder = builder.hostname_as_string(hostname.to_string())?;
                }
                MessageFormatter::Structured(builder.build())
            }
        })
    }
    pub fn format_kind(&self) -> Format {
        match self {
            MessageFormatter::Bsd(_) => Format::Rfc3164,
            MessageFormatter::Structured(_) => Format::Rfc5424,
        }
    }
}

impl SyslogFormatter for MessageFormatter {
    type Error = Error;
    type Output = Vec<u8>;
    fn format(
        &self,
        severity: Severity,
        msg: &str,
        timestamp: Option<DateTime<FixedOffset>>,
    ) -> Result<Vec<u8>> {
        match self {
            MessageFormatter::Bsd(f) => f.format(severity, msg, timestamp),
            MessageFormatter::Structured(f) => f.format(severity, msg, timestamp),
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn selects_format() {
        assert_eq!("RFC5424".parse::<Format>().unwrap(), Format::Rfc5424);
        assert_eq!("bsd".parse::<Format>().unwrap(), Format::Rfc3164);
        assert!("json".parse::<Format>().is_err());

        let ts = FixedOffset::east_opt(0)
            .unwrap()
            .with_ymd_and_hms(2024, 3, 5, 7, 8, 9)
            .unwrap();
        let bsd =
            MessageFormatter::new(Format::Rfc3164, Facility::LOG_USER, Some("bree"), "ansible")
                .unwrap();
        assert_eq!(bsd.format_kind(), Format::Rfc3164);
        assert_eq!(
            bsd.format(Severity::LOG_ERR, "site.yml status=failed", Some(ts))
                .unwrap(),
            b"<11>Mar  5 07:08:09 bree ansible: site.yml status=failed".to_vec()
        );
        let structured = MessageFormatter::new(
            Format::Rfc5424,
            Facility::LOG_LOCAL0,
            Some("bree.local"),
            "ansible",
        )
        .unwrap();
        assert_eq!(
            structured
                .format(Severity::LOG_INFO, "site.yml status=ok", Some(ts))
                .unwrap(),
            b"<134>1 2024-03-05T07:08:09.000000+00:00 bree.local ansible - - - site.yml status=ok"
                .to_vec()
        );
    }

    #[test]
    fn rejects_bad_tag() {
        assert!(
            MessageFormatter::new(Format::Rfc3164, Facility::LOG_USER, Some("bree"), "my app")
                .is_err()
        );
    }
}
