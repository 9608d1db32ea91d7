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
//! [playbook-syslog](crate) errors

use crate::event::EventKind;

use backtrace::Backtrace;

/// The broad classes of [`Error`], chosen on the basis of what the caller will need to do in
/// response.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Category {
    /// Unusable configuration; fatal at load time
    Config,
    /// A callback arrived before the run was started, or with the wrong kind of record
    Ordering,
    /// The datagram socket could not be created or used
    Transport,
    /// Something went wrong while building a message (e.g. summarizing run statistics)
    Internal,
}

/// [playbook-syslog](crate) error type
///
/// Like its sibling crates, [playbook-syslog](crate) eschews libraries like [thiserror] &
/// [anyhow] in favor of a straightforward enumeration, each variant carrying a backtrace.
///
/// [thiserror]: https://docs.rs/thiserror
/// [anyhow]: https://docs.rs/anyhow
#[non_exhaustive]
pub enum Error {
    /// Unresolvable facility name, or a facility code outside `0..=23`
    BadFacility { name: String, back: Backtrace },
    /// Unresolvable severity name, or a severity code outside `0..=7`
    BadSeverity { name: String, back: Backtrace },
    /// A configuration key named an event kind that doesn't exist
    UnknownEventKind { name: String, back: Backtrace },
    /// An `ANSIBLE_SYSLOG_*` variable we don't recognize
    UnknownConfigKey { key: String, back: Backtrace },
    /// A recognized configuration key with a malformed value
    BadConfigValue {
        key: String,
        value: String,
        back: Backtrace,
    },
    /// Hostname not compliant with the selected syslog format
    BadHostname { name: Vec<u8>, back: Backtrace },
    /// Tag (APP-NAME) not compliant with the selected syslog format
    BadTag { name: Vec<u8>, back: Backtrace },
    /// An event arrived before `PlaybookStart`
    NotStarted { kind: EventKind, back: Backtrace },
    /// A record was handed in under an event kind that doesn't describe it
    RecordMismatch {
        kind: EventKind,
        record: &'static str,
        back: Backtrace,
    },
    /// A host's task total didn't fit in a `u64`
    CounterOverflow { host: String, back: Backtrace },
    /// General transport layer error
    Transport {
        source: Box<dyn std::error::Error + Send + Sync + 'static>,
        back: Backtrace,
    },
}

impl Error {
    pub fn category(&self) -> Category {
        match self {
            Error::BadFacility { .. }
            | Error::BadSeverity { .. }
            | Error::UnknownEventKind { .. }
            | Error::UnknownConfigKey { .. }
            | Error::BadConfigValue { .. }
            | Error::BadHostname { .. }
            | Error::BadTag { .. } => Category::Config,
            Error::NotStarted { .. } | Error::RecordMismatch { .. } => Category::Ordering,
            Error::Transport { .. } => Category::Transport,
            Error::CounterOverflow { .. } => Category::Internal,
        }
    }
    fn backtrace(&self) -> &Backtrace {
        match self {
            Error::BadFacility { back, .. }
            | Error::BadSeverity { back, .. }
            | Error::UnknownEventKind { back, .. }
            | Error::UnknownConfigKey { back, .. }
            | Error::BadConfigValue { back, .. }
            | Error::BadHostname { back, .. }
            | Error::BadTag { back, .. }
            | Error::NotStarted { back, .. }
            | Error::RecordMismatch { back, .. }
            | Error::CounterOverflow { back, .. }
            | Error::Transport { back, .. } => back,
        }
    }
}

impl std::fmt::Display for Error {
    // `Error` is non-exhaustive so that adding variants won't be a breaking change to our
    // callers. That means the compiler won't catch us if we miss a variant here, so we
    // always include a `_` arm.
    #[allow(unreachable_patterns)]
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match self {
            Error::BadFacility { name, .. } => {
                write!(f, "{:?} is not a syslog facility name or code (0-23)", name)
            }
            Error::BadSeverity { name, .. } => {
                write!(f, "{:?} is not a syslog severity name or code (0-7)", name)
            }
            Error::UnknownEventKind { name, .. } => write!(f, "{:?} names no event kind", name),
            Error::UnknownConfigKey { key, .. } => {
                write!(f, "Unrecognized configuration variable {}", key)
            }
            Error::BadConfigValue { key, value, .. } => {
                write!(f, "{:?} is not a valid value for {}", value, key)
            }
            Error::BadHostname { name, .. } => write!(
                f,
                "{:?} is not a compliant syslog hostname",
                String::from_utf8_lossy(name)
            ),
            Error::BadTag { name, .. } => write!(
                f,
                "{:?} is not a compliant syslog tag",
                String::from_utf8_lossy(name)
            ),
            Error::NotStarted { kind, .. } => write!(
                f,
                "Event '{}' arrived before the playbook was started",
                kind
            ),
            Error::RecordMismatch { kind, record, .. } => {
                write!(f, "Event '{}' can't be built from a {} record", kind, record)
            }
            Error::CounterOverflow { host, .. } => {
                write!(f, "Task counters for host {} overflowed", host)
            }
            Error::Transport { source, .. } => write!(f, "Transport error: {}", source),
            _ => write!(f, "Other playbook-syslog error"),
        }
    }
}

impl std::fmt::Debug for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(f, "{}\n{:?}", self, self.backtrace())
    }
}

impl std::error::Error for Error {}

pub type Result<T> = std::result::Result<T, Error>;
