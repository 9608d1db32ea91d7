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

//! End-of-run statistics.
//!
//! When a run completes the event source hands us a [`StatsSnapshot`]: one set of [`HostStats`]
//! counters per target. [`summarize`] reduces that to the sequence of summary [`Event`]s we send:
//!
//! 1. `SummaryStart`
//! 2. one `SummaryHost` per target, in ascending order of target name
//! 3. `SummaryComplete`
//!
//! or, if no targets were processed at all, a lone `SummaryNoHosts`.

use crate::{
    error::{Error, Result},
    event::{Event, EventKind},
};

use backtrace::Backtrace;

use std::collections::BTreeMap;

/// The per-host counters, named as the event source names them
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct HostStats {
    pub ok: u64,
    pub changed: u64,
    pub failures: u64,
    pub unreachable: u64,
    pub skipped: u64,
    pub rescued: u64,
    pub ignored: u64,
}

/// One of the [`HostStats`] counters
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Counter {
    Ok,
    Changed,
    Failures,
    Unreachable,
    Skipped,
    Rescued,
    Ignored,
}

impl Counter {
    /// The canonical order in which counters are reported
    pub const ORDER: [Counter; 7] = [
        Counter::Ok,
        Counter::Changed,
        Counter::Failures,
        Counter::Unreachable,
        Counter::Skipped,
        Counter::Rescued,
        Counter::Ignored,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Counter::Ok => "ok",
            Counter::Changed => "changed",
            Counter::Failures => "failures",
            Counter::Unreachable => "unreachable",
            Counter::Skipped => "skipped",
            Counter::Rescued => "rescued",
            Counter::Ignored => "ignored",
        }
    }
}

impl HostStats {
    pub fn get(&self, counter: Counter) -> u64 {
        match counter {
            Counter::Ok => self.ok,
            Counter::Changed => self.changed,
            Counter::Failures => self.failures,
            Counter::Unreachable => self.unreachable,
            Counter::Skipped => self.skipped,
            Counter::Rescued => self.rescued,
            Counter::Ignored => self.ignored,
        }
    }
    /// The number of tasks run against this host.
    ///
    /// `changed` tasks are already counted in `ok`, and `rescued` & `ignored` annotate tasks
    /// already counted in `failures`, so neither contributes. `None` on overflow.
    pub fn total(&self) -> Option<u64> {
        self.ok
            .checked_add(self.failures)?
            .checked_add(self.unreachable)?
            .checked_add(self.skipped)
    }
    /// The nonzero counters, in canonical order
    pub fn nonzero(&self) -> impl Iterator<Item = (Counter, u64)> + '_ {
        Counter::ORDER
            .into_iter()
            .map(move |counter| (counter, self.get(counter)))
            .filter(|&(_, n)| n != 0)
    }
}

/// Per-target counters at the end of a run, ordered by target name
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct StatsSnapshot(BTreeMap<String, HostStats>);

impl StatsSnapshot {
    pub fn new() -> StatsSnapshot {
        StatsSnapshot::default()
    }
    pub fn insert<S: Into<String>>(&mut self, host: S, stats: HostStats) {
        self.0.insert(host.into(), stats);
    }
    pub fn get(&self, host: &str) -> Option<&HostStats> {
        self.0.get(host)
    }
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
    pub fn len(&self) -> usize {
        self.0.len()
    }
    /// Targets & their counters in ascending lexicographic order of target name
    pub fn iter(&self) -> impl Iterator<Item = (&str, &HostStats)> {
        self.0.iter().map(|(host, stats)| (host.as_str(), stats))
    }
}

impl<S: Into<String>> FromIterator<(S, HostStats)> for StatsSnapshot {
    fn from_iter<I: IntoIterator<Item = (S, HostStats)>>(iter: I) -> Self {
        StatsSnapshot(
            iter.into_iter()
                .map(|(host, stats)| (host.into(), stats))
                .collect(),
        )
    }
}

/// Reduce `snapshot` to the ordered sequence of summary events for run `run_name`.
///
/// Fails if any host's task total can't be computed; the caller is expected to report that
/// rather than drop the summary silently.
pub fn summarize(run_name: &str, snapshot: &StatsSnapshot) -> Result<Vec<Event>> {
    if snapshot.is_empty() {
        return Ok(vec![Event::new(EventKind::SummaryNoHosts, run_name)]);
    }

    let hosts = snapshot.len().to_string();
    let mut events = Vec::with_capacity(snapshot.len() + 2);
    events.push(Event::new(EventKind::SummaryStart, run_name).detail("hosts", hosts.as_str()));
    for (host, stats) in snapshot.iter() {
        let total = stats.total().ok_or_else(|| Error::CounterOverflow {
            host: host.to_string(),
            back: Backtrace::new(),
        })?;
        events.push(
            Event::new(EventKind::SummaryHost, run_name)
                .host(host)
                .detail("tasks", total.to_string())
                .stats(*stats),
        );
    }
    events.push(Event::new(EventKind::SummaryComplete, run_name).detail("hosts", hosts));
    Ok(events)
}

#[cfg(test)]
pub(crate) mod test {
    use super::*;

    /// The three-host run used throughout the test suite
    pub(crate) fn three_hosts() -> StatsSnapshot {
        [
            (
                "host1",
                HostStats {
                    ok: 5,
                    changed: 2,
                    skipped: 1,
                    ..Default::default()
                },
            ),
            (
                "host3",
                HostStats {
                    ok: 2,
                    changed: 1,
                    unreachable: 1,
                    ignored: 1,
                    ..Default::default()
                },
            ),
            (
                "host2",
                HostStats {
                    ok: 3,
                    failures: 1,
                    rescued: 1,
                    ..Default::default()
                },
            ),
        ]
        .into_iter()
        .collect()
    }

    #[test]
    fn ordered_sequence() {
        let events = summarize("site.yml", &three_hosts()).unwrap();
        let kinds: Vec<EventKind> = events.iter().map(|e| e.kind).collect();
        assert_eq!(
            kinds,
            vec![
                EventKind::SummaryStart,
                EventKind::SummaryHost,
                EventKind::SummaryHost,
                EventKind::SummaryHost,
                EventKind::SummaryComplete
            ]
        );
        let hosts: Vec<&str> = events[1..4]
            .iter()
            .map(|e| e.target_host.as_deref().unwrap())
            .collect();
        assert_eq!(hosts, vec!["host1", "host2", "host3"]);
        assert_eq!(events[0].detail["hosts"], "3");
        assert_eq!(events[1].detail["tasks"], "6");
        assert!(events.iter().all(|e| e.run_name == "site.yml"));
    }

    #[test]
    fn empty_snapshot() {
        let events = summarize("site.yml", &StatsSnapshot::new()).unwrap();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].kind, EventKind::SummaryNoHosts);
    }

    #[test]
    fn nonzero_in_canonical_order() {
        let stats = HostStats {
            ignored: 4,
            ok: 1,
            unreachable: 2,
            ..Default::default()
        };
        let names: Vec<(&str, u64)> = stats.nonzero().map(|(c, n)| (c.name(), n)).collect();
        assert_eq!(names, vec![("ok", 1), ("unreachable", 2), ("ignored", 4)]);
    }

    #[test]
    fn overflow_is_an_error() {
        let mut snapshot = StatsSnapshot::new();
        snapshot.insert(
            "huge",
            HostStats {
                ok: u64::MAX,
                skipped: 1,
                ..Default::default()
            },
        );
        let err = summarize("site.yml", &snapshot).unwrap_err();
        assert_eq!(err.category(), crate::error::Category::Internal);
    }
}
