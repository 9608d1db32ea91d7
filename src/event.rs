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

//! Playbook lifecycle events.
//!
//! Every callback the orchestration engine can raise maps onto exactly one [`EventKind`]. What
//! differs from kind to kind (the key used in `status=` and in configuration, the default
//! severity, and the kind-specific payload fields) lives in one data table, [`KindSpec`], rather
//! than being spread across per-kind code paths.

use crate::{
    error::{Error, Result},
    facility::Severity,
    stats::HostStats,
};

use backtrace::Backtrace;

use std::collections::BTreeMap;

type StdResult<T, E> = std::result::Result<T, E>;

/// The closed set of lifecycle events we know how to report
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum EventKind {
    PlaybookStart,
    PlayStart,
    TaskStart,
    TaskOk,
    TaskChanged,
    TaskFailed,
    TaskUnreachable,
    TaskSkipped,
    TaskRetry,
    ItemOk,
    ItemFailed,
    ItemSkipped,
    SummaryStart,
    SummaryHost,
    SummaryComplete,
    SummaryNoHosts,
    InternalError,
}

/// Kind-specific payload fields, rendered after `status=`
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Field {
    /// `error=`, taken from the `msg` detail
    Error,
    /// `reason=`, taken from the `skip_reason` detail
    Reason,
    /// `attempt=`, one more than the `retries` detail
    Attempt,
    /// `hosts=`, taken from the `hosts` detail
    Hosts,
    /// `tasks=` followed by the nonzero per-host counters
    Counters,
}

/// Everything that varies by [`EventKind`]
#[derive(Debug)]
pub struct KindSpec {
    pub kind: EventKind,
    /// Used for `status=` and to name the kind in configuration
    pub key: &'static str,
    pub default_severity: Severity,
    pub fields: &'static [Field],
}

const fn spec(
    kind: EventKind,
    key: &'static str,
    default_severity: Severity,
    fields: &'static [Field],
) -> KindSpec {
    KindSpec {
        kind,
        key,
        default_severity,
        fields,
    }
}

/// Indexed by `EventKind as usize`
pub static KINDS: [KindSpec; EventKind::COUNT] = [
    spec(EventKind::PlaybookStart, "playbook_start", Severity::LOG_INFO, &[]),
    spec(EventKind::PlayStart, "play_start", Severity::LOG_INFO, &[]),
    spec(EventKind::TaskStart, "task_start", Severity::LOG_DEBUG, &[]),
    spec(EventKind::TaskOk, "ok", Severity::LOG_INFO, &[]),
    spec(EventKind::TaskChanged, "changed", Severity::LOG_INFO, &[]),
    spec(EventKind::TaskFailed, "failed", Severity::LOG_ERR, &[Field::Error]),
    spec(
        EventKind::TaskUnreachable,
        "unreachable",
        Severity::LOG_EMERG,
        &[Field::Error],
    ),
    spec(EventKind::TaskSkipped, "skipped", Severity::LOG_NOTICE, &[Field::Reason]),
    spec(EventKind::TaskRetry, "retry", Severity::LOG_WARNING, &[Field::Attempt]),
    spec(EventKind::ItemOk, "item_ok", Severity::LOG_INFO, &[]),
    spec(EventKind::ItemFailed, "item_failed", Severity::LOG_ERR, &[Field::Error]),
    spec(
        EventKind::ItemSkipped,
        "item_skipped",
        Severity::LOG_NOTICE,
        &[Field::Reason],
    ),
    spec(EventKind::SummaryStart, "summary_start", Severity::LOG_INFO, &[Field::Hosts]),
    spec(EventKind::SummaryHost, "summary_host", Severity::LOG_INFO, &[Field::Counters]),
    spec(
        EventKind::SummaryComplete,
        "summary_complete",
        Severity::LOG_INFO,
        &[Field::Hosts],
    ),
    spec(EventKind::SummaryNoHosts, "summary_no_hosts", Severity::LOG_WARNING, &[]),
    spec(EventKind::InternalError, "internal_error", Severity::LOG_ALERT, &[Field::Error]),
];

impl EventKind {
    pub const COUNT: usize = 17;

    pub const ALL: [EventKind; EventKind::COUNT] = [
        EventKind::PlaybookStart,
        EventKind::PlayStart,
        EventKind::TaskStart,
        EventKind::TaskOk,
        EventKind::TaskChanged,
        EventKind::TaskFailed,
        EventKind::TaskUnreachable,
        EventKind::TaskSkipped,
        EventKind::TaskRetry,
        EventKind::ItemOk,
        EventKind::ItemFailed,
        EventKind::ItemSkipped,
        EventKind::SummaryStart,
        EventKind::SummaryHost,
        EventKind::SummaryComplete,
        EventKind::SummaryNoHosts,
        EventKind::InternalError,
    ];

    pub fn spec(self) -> &'static KindSpec {
        &KINDS[self as usize]
    }
    pub fn key(self) -> &'static str {
        self.spec().key
    }
}

impl std::fmt::Display for EventKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> StdResult<(), std::fmt::Error> {
        write!(f, "{}", self.key())
    }
}

impl std::str::FromStr for EventKind {
    type Err = Error;
    /// Look a kind up by its key, case-insensitively
    fn from_str(s: &str) -> Result<EventKind> {
        KINDS
            .iter()
            .find(|spec| spec.key.eq_ignore_ascii_case(s.trim()))
            .map(|spec| spec.kind)
            .ok_or_else(|| Error::UnknownEventKind {
                name: s.to_string(),
                back: Backtrace::new(),
            })
    }
}

/// A single lifecycle event, ready to be formatted.
///
/// Events are built by the translator as each callback fires, and are dropped as soon as the
/// corresponding syslog packet has been handed to the transport.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Event {
    pub kind: EventKind,
    pub run_name: String,
    pub play_name: Option<String>,
    pub target_host: Option<String>,
    pub task_name: Option<String>,
    pub item: Option<String>,
    /// Free-form result fields (`msg`, `skip_reason`, `retries`, ...)
    pub detail: BTreeMap<String, String>,
    pub ignore_errors: bool,
    /// Per-host counters; only meaningful for [`EventKind::SummaryHost`]
    pub stats: Option<HostStats>,
}

impl Event {
    pub fn new<S: Into<String>>(kind: EventKind, run_name: S) -> Event {
        Event {
            kind,
            run_name: run_name.into(),
            play_name: None,
            target_host: None,
            task_name: None,
            item: None,
            detail: BTreeMap::new(),
            ignore_errors: false,
            stats: None,
        }
    }
    pub fn play<S: Into<String>>(mut self, name: S) -> Self {
        self.play_name = Some(name.into());
        self
    }
    pub fn host<S: Into<String>>(mut self, name: S) -> Self {
        self.target_host = Some(name.into());
        self
    }
    pub fn task<S: Into<String>>(mut self, name: S) -> Self {
        self.task_name = Some(name.into());
        self
    }
    pub fn item<S: Into<String>>(mut self, item: S) -> Self {
        self.item = Some(item.into());
        self
    }
    pub fn detail<K: Into<String>, V: Into<String>>(mut self, key: K, value: V) -> Self {
        self.detail.insert(key.into(), value.into());
        self
    }
    pub fn ignore_errors(mut self, ignore_errors: bool) -> Self {
        self.ignore_errors = ignore_errors;
        self
    }
    pub fn stats(mut self, stats: HostStats) -> Self {
        self.stats = Some(stats);
        self
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn table_is_indexed_by_kind() {
        for (i, kind) in EventKind::ALL.iter().enumerate() {
            assert_eq!(*kind as usize, i);
            assert_eq!(kind.spec().kind, *kind);
        }
    }

    #[test]
    fn keys_round_trip() {
        for kind in EventKind::ALL {
            assert_eq!(kind.key().parse::<EventKind>().unwrap(), kind);
        }
        assert_eq!("FAILED".parse::<EventKind>().unwrap(), EventKind::TaskFailed);
        assert!("on_handler_start".parse::<EventKind>().is_err());
    }

    #[test]
    fn defaults() {
        assert_eq!(EventKind::TaskFailed.spec().default_severity, Severity::LOG_ERR);
        assert_eq!(EventKind::TaskUnreachable.spec().default_severity, Severity::LOG_EMERG);
        assert_eq!(EventKind::TaskOk.spec().default_severity, Severity::LOG_INFO);
        assert_eq!(EventKind::TaskStart.spec().default_severity, Severity::LOG_DEBUG);
    }
}
