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

//! RFC [5424]-compliant syslog message formatting
//!
//! [5424]: https://datatracker.ietf.org/doc/html/rfc5424
//!
//! [`Rfc5424`] is a [`SyslogFormatter`] that produces syslog messages according to RFC 5424:
//!
//! ```text
//! <PRI>1 TIMESTAMP HOSTNAME APP-NAME PROCID MSGID STRUCTURED-DATA MSG
//! ```
//!
//! We send no MSGID and no structured data, and by default no PROCID either (each is the
//! NILVALUE, `-`); everything of interest is in the key=value payload.

use crate::{
    error::{Error, Result},
    facility::{Facility, Priority, Severity},
    formatter::SyslogFormatter,
    host::{local_address, system_hostname},
};

use backtrace::Backtrace;
use chrono::prelude::*;

type StdResult<T, E> = std::result::Result<T, E>;

/// A [`Vec<u8>`] instance with the additional constraint that it must be less than 256 bytes
/// of ASCII.
pub struct Rfc5424Hostname(Vec<u8>);

impl Rfc5424Hostname {
    /// An RFC 5424-compliant hostname is at most 255 bytes of printable ASCII
    pub fn new(bytes: Vec<u8>) -> Result<Rfc5424Hostname> {
        if !bytes.is_empty() && bytes.len() < 256 && bytes.iter().all(|&x| x > 32 && x < 127) {
            Ok(Rfc5424Hostname(bytes))
        } else {
            Err(Error::BadHostname {
                name: bytes,
                back: Backtrace::new(),
            })
        }
    }
}

impl std::default::Default for Rfc5424Hostname {
    /// Attempt to figure-out an RFC [5424]-compliant hostname.
    ///
    /// The order of preference for the contents of the HOSTNAME field is as follows:
    ///
    /// 1.  FQDN
    /// 2.  Static IP address
    /// 3.  hostname
    /// 4.  Dynamic IP address
    /// 5.  the NILVALUE
    ///
    /// This implementation doesn't quite do that; for reasons of expedience, it will first simply
    /// try [gethostname()], then ask for this host's IP address, and finally settle for the
    /// NILVALUE.
    ///
    /// [5424]: https://datatracker.ietf.org/doc/html/rfc5424
    /// [gethostname()]: https://man7.org/linux/man-pages/man2/gethostname.2.html
    fn default() -> Self {
        system_hostname()
            .and_then(|hn| Rfc5424Hostname::new(hn).ok())
            .or_else(|| local_address().and_then(|ip| Rfc5424Hostname::new(ip).ok()))
            .unwrap_or_else(|| Rfc5424Hostname(b"-".to_vec()))
    }
}

impl std::convert::TryFrom<String> for Rfc5424Hostname {
    type Error = Error;
    fn try_from(x: String) -> StdResult<Self, Self::Error> {
        Rfc5424Hostname::new(x.into_bytes())
    }
}

/// A string with the additional constraint that it is less than forty-nine bytes of printable
/// ASCII.
pub struct AppName(Vec<u8>);

impl std::fmt::Display for AppName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> StdResult<(), std::fmt::Error> {
        write!(f, "{}", String::from_utf8_lossy(&self.0))
    }
}

impl AppName {
    pub fn new(bytes: Vec<u8>) -> Result<AppName> {
        if !bytes.is_empty() && bytes.len() < 49 && bytes.iter().all(|&x| x > 32 && x < 127) {
            Ok(AppName(bytes))
        } else {
            Err(Error::BadTag {
                name: bytes,
                back: Backtrace::new(),
            })
        }
    }
}

impl std::convert::TryFrom<String> for AppName {
    type Error = Error;
    fn try_from(x: String) -> StdResult<Self, Self::Error> {
        AppName::new(x.into_bytes())
    }
}

impl std::default::Default for AppName {
    fn default() -> Self {
        AppName(b"ansible".to_vec())
    }
}

/// A string with the additional constraint that it is less than 129 bytes of printable ASCII.
pub struct ProcId(Vec<u8>);

impl std::fmt::Display for ProcId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> StdResult<(), std::fmt::Error> {
        write!(f, "{}", String::from_utf8_lossy(&self.0))
    }
}

impl ProcId {
    pub fn new(bytes: Vec<u8>) -> Result<ProcId> {
        if !bytes.is_empty() && bytes.len() < 129 && bytes.iter().all(|&x| x > 32 && x < 127) {
            Ok(ProcId(bytes))
        } else {
            Err(Error::BadConfigValue {
                key: "procid".to_string(),
                value: String::from_utf8_lossy(&bytes).into_owned(),
                back: Backtrace::new(),
            })
        }
    }
}

impl std::convert::TryFrom<String> for ProcId {
    type Error = Error;
    fn try_from(x: String) -> StdResult<Self, Self::Error> {
        ProcId::new(x.into_bytes())
    }
}

/// Render `timestamp` as an RFC 5424 TIMESTAMP: RFC 3339 with at most six digits of fractional
/// seconds, and the UTC offset written `+HH:MM` (chrono's `%z` would give `+HHMM`, which RFC 5424
/// does not allow).
pub fn rfc5424_timestamp(timestamp: &DateTime<FixedOffset>) -> String {
    timestamp.format("%Y-%m-%dT%H:%M:%S%.6f%:z").to_string()
}

/// A formatter that produces RFC [5424]-conformant syslog messages.
///
/// [5424]: https://datatracker.ietf.org/doc/html/rfc5424
pub struct Rfc5424 {
    facility: Facility,
    hostname: Rfc5424Hostname,
    appname: AppName,
    pid: Option<ProcId>,
}

impl std::default::Default for Rfc5424 {
    /// `LOG_USER`, the discovered hostname & the default tag
    fn default() -> Self {
        Rfc5424::builder().build()
    }
}

/// As with [`Rfc3164Builder`](crate::rfc3164::Rfc3164Builder), the hostname is only discovered
/// at [`build`](Rfc5424Builder::build) time, and only if none was given.
pub struct Rfc5424Builder {
    facility: Facility,
    hostname: Option<Rfc5424Hostname>,
    appname: AppName,
    pid: Option<ProcId>,
}

impl Rfc5424Builder {
    pub fn facility(mut self, facility: Facility) -> Self {
        self.facility = facility;
        self
    }
    pub fn hostname(mut self, hostname: Rfc5424Hostname) -> Self {
        self.hostname = Some(hostname);
        self
    }
    pub fn hostname_as_string(mut self, hostname: String) -> Result<Self> {
        self.hostname = Some(Rfc5424Hostname::try_from(hostname)?);
        Ok(self)
    }
    pub fn appname_as_string(mut self, appname: String) -> Result<Self> {
        self.appname = AppName::try_from(appname)?;
        Ok(self)
    }
    pub fn pid(mut self, pid: ProcId) -> Self {
        self.pid = Some(pid);
        self
    }
    pub fn build(self) -> Rfc5424 {
        Rfc5424 {
            facility: self.facility,
            hostname: self.hostname.unwrap_or_default(),
            appname: self.appname,
            pid: self.pid,
        }
    }
}

impl Rfc5424 {
    pub fn builder() -> Rfc5424Builder {
        Rfc5424Builder {
            facility: Facility::LOG_USER,
            hostname: None,
            appname: AppName::default(),
            pid: None,
        }
    }
}

impl SyslogFormatter for Rfc5424 {
    type Error = Error;
    type Output = Vec<u8>;
    fn format(
        &self,
        severity: Severity,
        msg: &str,
        timestamp: Option<DateTime<FixedOffset>>,
    ) -> Result<Vec<u8>> {
        let timestamp = timestamp.unwrap_or_else(|| Local::now().into());
        let mut buf = format!(
            "<{}>1 {} ",
            Priority::new(self.facility, severity),
            rfc5424_timestamp(&timestamp)
        )
        .into_bytes();

        use bytes::buf::BufMut;
        buf.put_slice(&self.hostname.0);

        match &self.pid {
            Some(pid) => buf.put_slice(format!(" {} {} - - ", self.appname, pid).as_bytes()),
            None => buf.put_slice(format!(" {} - - - ", self.appname).as_bytes()),
        }

        // "The character set used in MSG SHOULD be UNICODE, encoded using UTF-8 as specified in
        // [RFC3629]." We don't prepend the BOM: a payload that is pure ASCII is also valid
        // UTF-8, and collectors that key=value-parse the MSG choke on it.
        buf.put_slice(msg.as_bytes());
        Ok(buf)
    }
}

#[cfg(test)]
mod test {

    use super::*;

    fn epoch() -> DateTime<FixedOffset> {
        DateTime::<Utc>::from(std::time::UNIX_EPOCH).into()
    }

    fn bree() -> Rfc5424 {
        Rfc5424::builder()
            .hostname_as_string("bree.local".to_string())
            .unwrap()
            .appname_as_string("ansible".to_string())
            .unwrap()
            .build()
    }

    #[test]
    fn discovery_waits_for_build() {
        let builder = Rfc5424::builder().facility(Facility::LOG_LOCAL0);
        assert!(builder.hostname.is_none());
        let f = builder
            .hostname_as_string("bree.local".to_string())
            .unwrap()
            .build();
        assert_eq!(f.hostname.0, b"bree.local");
        assert_eq!(f.facility, Facility::LOG_LOCAL0);

        let f = Rfc5424::default();
        assert_eq!(f.facility, Facility::LOG_USER);
        assert_eq!(f.appname.0, b"ansible");
        assert!(f.pid.is_none());
    }

    #[test]
    fn app_name() {
        let x: &[u8] = b"0123456789012345678901234567890123456789012345678";
        assert!(AppName::new(x.into()).is_err());
        assert!(AppName::new(b"udp-test".to_vec()).is_ok());
        assert!(AppName::new(b"two words".to_vec()).is_err());
    }

    #[test]
    fn golden() {
        let rsp = bree()
            .format(
                Severity::LOG_INFO,
                "site.yml status=playbook_start",
                Some(epoch()),
            )
            .unwrap();
        assert_eq!(
            std::str::from_utf8(&rsp).unwrap(),
            "<14>1 1970-01-01T00:00:00.000000+00:00 bree.local ansible - - - site.yml status=playbook_start"
        );

        let f = Rfc5424::builder()
            .hostname_as_string("bree.local".to_string())
            .unwrap()
            .pid(ProcId::new(b"123".to_vec()).unwrap())
            .build();
        let rsp = f
            .format(Severity::LOG_ERR, "x", Some(epoch()))
            .unwrap();
        assert_eq!(
            std::str::from_utf8(&rsp).unwrap(),
            "<11>1 1970-01-01T00:00:00.000000+00:00 bree.local ansible 123 - - x"
        );
    }

    /// The offset must always be written with a colon, never as chrono's default `+HHMM`
    #[test]
    fn colon_offsets() {
        let instant = Utc.with_ymd_and_hms(2024, 6, 30, 12, 0, 0).unwrap();
        for seconds in [0, 3600, -5 * 3600, 5 * 3600 + 1800, -(9 * 3600 + 30 * 60), 14 * 3600] {
            let offset = FixedOffset::east_opt(seconds).unwrap();
            let ts = rfc5424_timestamp(&instant.with_timezone(&offset));
            let tail = &ts[ts.len() - 6..];
            let bytes = tail.as_bytes();
            assert!(bytes[0] == b'+' || bytes[0] == b'-', "{}", ts);
            assert!(bytes[1].is_ascii_digit() && bytes[2].is_ascii_digit(), "{}", ts);
            assert_eq!(bytes[3], b':', "{}", ts);
            assert!(bytes[4].is_ascii_digit() && bytes[5].is_ascii_digit(), "{}", ts);
        }
        let ts = rfc5424_timestamp(
            &instant.with_timezone(&FixedOffset::east_opt(5 * 3600 + 1800).unwrap()),
        );
        assert_eq!(ts, "2024-06-30T17:30:00.000000+05:30");
    }

    /// Fractional seconds must not exceed six digits
    #[test]
    fn microsecond_precision() {
        let rsp = String::from_utf8(bree().format(Severity::LOG_NOTICE, "x", None).unwrap()).unwrap();
        let ts = rsp.split(' ').nth(1).unwrap();
        let i = ts.find('.').unwrap();
        let j = ts.rfind(|c| c == '+' || c == '-').unwrap();
        assert_eq!(j - i - 1, 6, "{}", ts);
        assert_eq!(&ts[ts.len() - 3..ts.len() - 2], ":");
    }

    #[test]
    fn idempotent() {
        let f = bree();
        let ts = FixedOffset::east_opt(-7 * 3600)
            .unwrap()
            .with_ymd_and_hms(2024, 2, 29, 23, 59, 59)
            .unwrap();
        let a = f.format(Severity::LOG_ERR, "site.yml status=failed", Some(ts)).unwrap();
        let b = f.format(Severity::LOG_ERR, "site.yml status=failed", Some(ts)).unwrap();
        assert_eq!(a, b);
    }
}
