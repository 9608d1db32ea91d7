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

//! syslog facility, severity & priority definitions.
//!
//! [`Facility`] and [`Severity`] replicate the names used in `<syslog.h>`. They are (mostly)
//! identical in both RFC [3164] & [5424], and so [playbook-syslog](crate) models both with the
//! same enumeration. A [`Priority`] is the single integer that opens every syslog packet,
//! combining the two as per RFC 5424 §6.2.1.
//!
//! Both enumerations may be resolved from their symbolic names (`"user"`, `"LOG_USER"`,
//! `"err"`, `"LOG_ERR"` and so forth) or from their raw codes. Anything else is a configuration
//! error, so callers should resolve names once, at load time:
//!
//! ```rust
//! use playbook_syslog::facility::encode;
//! assert_eq!(encode("user", "LOG_ERR").unwrap().value(), 11);
//! assert_eq!(encode(1u8, 3u8).unwrap().value(), 11);
//! assert!(encode("nosuch", "LOG_ERR").is_err());
//! ```
//!
//! [3164]: https://datatracker.ietf.org/doc/html/rfc3164
//! [5424]: https://datatracker.ietf.org/doc/html/rfc5424

use crate::error::{Error, Result};

use backtrace::Backtrace;

type StdResult<T, E> = std::result::Result<T, E>;

/// Both RFCs [5424] & [3164] define twenty-four "facilities" for messages. The enumeration values
/// duplicate the constants defined in `<syslog.h>`, albeit multiplied by 8 for convenience in
/// forming syslog message headers (which again mirrors the `#define`s in `<syslog.h>`).
///
/// [5424]: https://datatracker.ietf.org/doc/html/rfc5424
/// [3164]: https://datatracker.ietf.org/doc/html/rfc3164
#[allow(non_camel_case_types)]
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Facility {
    /// kernel messages
    LOG_KERN = 0 << 3,
    /// random user-level messages
    LOG_USER = 1 << 3,
    /// mail system
    LOG_MAIL = 2 << 3,
    /// system daemons
    LOG_DAEMON = 3 << 3,
    /// security/authorization messages
    LOG_AUTH = 4 << 3,
    /// messages generated internally by syslogd
    LOG_SYSLOG = 5 << 3,
    /// line printer subsystem
    LOG_LPR = 6 << 3,
    /// network news subsystem
    LOG_NEWS = 7 << 3,
    /// UUCP subsystem
    LOG_UUCP = 8 << 3,
    /// clock daemon
    LOG_CRON = 9 << 3,
    /// security/authorization messages (private)
    LOG_AUTHPRIV = 10 << 3,
    /// ftp daemon
    LOG_FTP = 11 << 3,
    /// NTP subsystem
    LOG_NTP = 12 << 3,
    /// log audit
    LOG_AUDIT = 13 << 3,
    /// log alert
    LOG_ALERT = 14 << 3,
    /// clock daemon (note 2 in RFC 5424's table)
    LOG_CLOCK = 15 << 3,
    /// reserved for local use
    LOG_LOCAL0 = 16 << 3,
    /// reserved for local use
    LOG_LOCAL1 = 17 << 3,
    /// reserved for local use
    LOG_LOCAL2 = 18 << 3,
    /// reserved for local use
    LOG_LOCAL3 = 19 << 3,
    /// reserved for local use
    LOG_LOCAL4 = 20 << 3,
    /// reserved for local use
    LOG_LOCAL5 = 21 << 3,
    /// reserved for local use
    LOG_LOCAL6 = 22 << 3,
    /// reserved for local use
    LOG_LOCAL7 = 23 << 3,
}

/// Every [`Facility`], indexed by code. Names are the lower-case `<syslog.h>` spelling minus the
/// `LOG_` prefix.
const FACILITIES: [(Facility, &str); 24] = [
    (Facility::LOG_KERN, "kern"),
    (Facility::LOG_USER, "user"),
    (Facility::LOG_MAIL, "mail"),
    (Facility::LOG_DAEMON, "daemon"),
    (Facility::LOG_AUTH, "auth"),
    (Facility::LOG_SYSLOG, "syslog"),
    (Facility::LOG_LPR, "lpr"),
    (Facility::LOG_NEWS, "news"),
    (Facility::LOG_UUCP, "uucp"),
    (Facility::LOG_CRON, "cron"),
    (Facility::LOG_AUTHPRIV, "authpriv"),
    (Facility::LOG_FTP, "ftp"),
    (Facility::LOG_NTP, "ntp"),
    (Facility::LOG_AUDIT, "audit"),
    (Facility::LOG_ALERT, "alert"),
    (Facility::LOG_CLOCK, "clock"),
    (Facility::LOG_LOCAL0, "local0"),
    (Facility::LOG_LOCAL1, "local1"),
    (Facility::LOG_LOCAL2, "local2"),
    (Facility::LOG_LOCAL3, "local3"),
    (Facility::LOG_LOCAL4, "local4"),
    (Facility::LOG_LOCAL5, "local5"),
    (Facility::LOG_LOCAL6, "local6"),
    (Facility::LOG_LOCAL7, "local7"),
];

impl Facility {
    /// The RFC 5424 facility code, in `0..=23`
    pub fn code(self) -> u8 {
        (self as u8) >> 3
    }
    /// The short, lower-case name (`"user"`, `"local3"`, ...)
    pub fn name(self) -> &'static str {
        FACILITIES[self.code() as usize].1
    }
    pub fn from_code(code: u8) -> Result<Facility> {
        FACILITIES
            .get(code as usize)
            .map(|(facility, _)| *facility)
            .ok_or_else(|| Error::BadFacility {
                name: code.to_string(),
                back: Backtrace::new(),
            })
    }
}

impl std::default::Default for Facility {
    /// The default facility is `LOG_USER`.
    fn default() -> Self {
        Facility::LOG_USER
    }
}

impl std::fmt::Display for Facility {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> StdResult<(), std::fmt::Error> {
        write!(f, "LOG_{}", self.name().to_ascii_uppercase())
    }
}

/// Strip an optional, case-insensitive `LOG_` prefix
fn strip_log_prefix(s: &str) -> &str {
    match s.get(..4) {
        Some(prefix) if prefix.eq_ignore_ascii_case("log_") => &s[4..],
        _ => s,
    }
}

impl std::str::FromStr for Facility {
    type Err = Error;
    /// Resolve `s` as either a raw code or a facility name, with or without the `LOG_` prefix
    fn from_str(s: &str) -> Result<Facility> {
        let text = s.trim();
        if let Ok(code) = text.parse::<u8>() {
            return Facility::from_code(code);
        }
        let name = strip_log_prefix(text);
        FACILITIES
            .iter()
            .find(|(_, candidate)| candidate.eq_ignore_ascii_case(name))
            .map(|(facility, _)| *facility)
            .ok_or_else(|| Error::BadFacility {
                name: s.to_string(),
                back: Backtrace::new(),
            })
    }
}

impl std::convert::TryFrom<u8> for Facility {
    type Error = Error;
    fn try_from(code: u8) -> Result<Facility> {
        Facility::from_code(code)
    }
}

impl std::convert::TryFrom<&str> for Facility {
    type Error = Error;
    fn try_from(name: &str) -> Result<Facility> {
        name.parse()
    }
}

/// Both RFCs [5424] & [3164] define eight severity levels for messages. The enumeration values
/// duplicate the constants documented as per the `syslog()` manual [page] & defined in
/// `<syslog.h>`.
///
/// [5424]: https://datatracker.ietf.org/doc/html/rfc5424
/// [3164]: https://datatracker.ietf.org/doc/html/rfc3164
/// [page]: https://man7.org/linux/man-pages/man3/syslog.3.html
#[allow(non_camel_case_types)]
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub enum Severity {
    /// system is unusable
    LOG_EMERG,
    /// action must be take immediately
    LOG_ALERT,
    /// critical conditions
    LOG_CRIT,
    /// error conditions
    LOG_ERR,
    /// warning conditions
    LOG_WARNING,
    /// normal, but significant condition
    LOG_NOTICE,
    /// informational message
    LOG_INFO,
    /// debug-level message
    LOG_DEBUG,
}

const SEVERITIES: [Severity; 8] = [
    Severity::LOG_EMERG,
    Severity::LOG_ALERT,
    Severity::LOG_CRIT,
    Severity::LOG_ERR,
    Severity::LOG_WARNING,
    Severity::LOG_NOTICE,
    Severity::LOG_INFO,
    Severity::LOG_DEBUG,
];

impl Severity {
    /// The RFC 5424 severity code, in `0..=7`
    pub fn code(self) -> u8 {
        self as u8
    }
    pub fn from_code(code: u8) -> Result<Severity> {
        SEVERITIES
            .get(code as usize)
            .copied()
            .ok_or_else(|| Error::BadSeverity {
                name: code.to_string(),
                back: Backtrace::new(),
            })
    }
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> StdResult<(), std::fmt::Error> {
        write!(
            f,
            "{}",
            match self {
                Severity::LOG_EMERG => "LOG_EMERG",
                Severity::LOG_ALERT => "LOG_ALERT",
                Severity::LOG_CRIT => "LOG_CRIT",
                Severity::LOG_ERR => "LOG_ERR",
                Severity::LOG_WARNING => "LOG_WARNING",
                Severity::LOG_NOTICE => "LOG_NOTICE",
                Severity::LOG_INFO => "LOG_INFO",
                Severity::LOG_DEBUG => "LOG_DEBUG",
            }
        )
    }
}

impl std::str::FromStr for Severity {
    type Err = Error;
    /// Resolve `s` as either a raw code or a severity name; the `<syslog.h>` spellings are
    /// accepted along with a few common long forms ("EMERGENCY", "ERROR", "WARN", ...).
    fn from_str(s: &str) -> Result<Severity> {
        let text = s.trim();
        if let Ok(code) = text.parse::<u8>() {
            return Severity::from_code(code);
        }
        match strip_log_prefix(text).to_ascii_uppercase().as_str() {
            "EMERG" | "EMERGENCY" | "PANIC" => Ok(Severity::LOG_EMERG),
            "ALERT" => Ok(Severity::LOG_ALERT),
            "CRIT" | "CRITICAL" => Ok(Severity::LOG_CRIT),
            "ERR" | "ERROR" => Ok(Severity::LOG_ERR),
            "WARNING" | "WARN" => Ok(Severity::LOG_WARNING),
            "NOTICE" => Ok(Severity::LOG_NOTICE),
            "INFO" | "INFORMATIONAL" => Ok(Severity::LOG_INFO),
            "DEBUG" => Ok(Severity::LOG_DEBUG),
            _ => Err(Error::BadSeverity {
                name: s.to_string(),
                back: Backtrace::new(),
            }),
        }
    }
}

impl std::convert::TryFrom<u8> for Severity {
    type Error = Error;
    fn try_from(code: u8) -> Result<Severity> {
        Severity::from_code(code)
    }
}

impl std::convert::TryFrom<&str> for Severity {
    type Error = Error;
    fn try_from(name: &str) -> Result<Severity> {
        name.parse()
    }
}

/// The PRI part of a syslog packet: `(facility << 3) | severity`, always in `0..=191`.
///
/// A [`Priority`] can only be built from a valid [`Facility`] & [`Severity`], so it can always be
/// decoded back into them.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct Priority(u8);

impl Priority {
    pub fn new(facility: Facility, severity: Severity) -> Priority {
        Priority(facility as u8 | severity as u8)
    }
    /// Validate a raw PRI value
    pub fn from_value(value: u8) -> Result<Priority> {
        let facility = Facility::from_code(value >> 3)?;
        Ok(Priority::new(facility, Severity::from_code(value & 0x7)?))
    }
    pub fn value(self) -> u8 {
        self.0
    }
    pub fn facility(self) -> Facility {
        // `self.0 >> 3` is in range by construction
        FACILITIES[(self.0 >> 3) as usize].0
    }
    pub fn severity(self) -> Severity {
        SEVERITIES[(self.0 & 0x7) as usize]
    }
    pub fn decode(self) -> (Facility, Severity) {
        (self.facility(), self.severity())
    }
}

impl std::fmt::Display for Priority {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> StdResult<(), std::fmt::Error> {
        write!(f, "{}", self.0)
    }
}

/// Encode a facility & severity, each given either symbolically or as a raw code.
pub fn encode<F, S>(facility: F, severity: S) -> Result<Priority>
where
    F: TryInto<Facility, Error = Error>,
    S: TryInto<Severity, Error = Error>,
{
    Ok(Priority::new(facility.try_into()?, severity.try_into()?))
}

#[cfg(test)]
mod facility_level_tests {
    use super::*;

    /// Test basic PRI formatting
    #[test]
    fn test_pri() {
        assert_eq!(14, (Facility::LOG_USER as u8) | (Severity::LOG_INFO as u8));
        assert_eq!(format!("{}", Facility::LOG_FTP), "LOG_FTP".to_string());
        assert_eq!(format!("{:?}", Facility::LOG_FTP), "LOG_FTP".to_string());
        assert_eq!(Priority::new(Facility::LOG_USER, Severity::LOG_INFO).value(), 14);
    }

    #[test]
    fn test_encode() {
        let by_name = encode("user", "LOG_ERR").unwrap();
        let by_code = encode(1u8, 3u8).unwrap();
        assert_eq!(by_name, by_code);
        assert_eq!(by_name.value(), 11);
        assert_eq!(encode("LOG_LOCAL7", "debug").unwrap().value(), 191);
        assert_eq!(encode("kern", "EMERGENCY").unwrap().value(), 0);
        assert_eq!(encode("log_audit", "warn").unwrap().value(), 13 * 8 + 4);
    }

    #[test]
    fn test_decode_every_pair() {
        for facility in 0u8..24 {
            for severity in 0u8..8 {
                let pri = encode(facility, severity).unwrap();
                assert_eq!(pri.value() >> 3, facility);
                assert_eq!(pri.value() & 0x7, severity);
                let (f, s) = pri.decode();
                assert_eq!((f.code(), s.code()), (facility, severity));
                assert_eq!(Priority::from_value(pri.value()).unwrap(), pri);
            }
        }
    }

    #[test]
    fn test_rejects_out_of_range() {
        assert!(Facility::from_code(24).is_err());
        assert!(Severity::from_code(8).is_err());
        assert!(encode(24u8, 0u8).is_err());
        assert!(encode(0u8, 8u8).is_err());
        assert!(Priority::from_value(192).is_err());
        assert!("-1".parse::<Facility>().is_err());
    }

    #[test]
    fn test_names() {
        assert_eq!("user".parse::<Facility>().unwrap(), Facility::LOG_USER);
        assert_eq!("LOG_DAEMON".parse::<Facility>().unwrap(), Facility::LOG_DAEMON);
        assert_eq!(" Local4 ".parse::<Facility>().unwrap(), Facility::LOG_LOCAL4);
        assert_eq!("10".parse::<Facility>().unwrap(), Facility::LOG_AUTHPRIV);
        assert_eq!(Facility::LOG_LOCAL4.name(), "local4");
        assert!("printer".parse::<Facility>().is_err());

        assert_eq!("LOG_ERR".parse::<Severity>().unwrap(), Severity::LOG_ERR);
        assert_eq!("Emergency".parse::<Severity>().unwrap(), Severity::LOG_EMERG);
        assert_eq!("5".parse::<Severity>().unwrap(), Severity::LOG_NOTICE);
        assert!("LOUD".parse::<Severity>().is_err());
    }
}
