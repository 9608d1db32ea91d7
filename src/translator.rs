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

//! Turning playbook lifecycle callbacks into syslog packets.
//!
//! # Introduction
//!
//! Two types live here. [`Pipeline`] is the stateless core: hand it an [`Event`] (or the pieces
//! of one) and it resolves the severity, renders the payload, stamps & formats the packet and
//! delivers it, best-effort. Because every [`Pipeline`] method takes the run name explicitly,
//! one instance may be shared among threads (it's [`Sync`] whenever its [`Transport`] is).
//!
//! [`EventTranslator`] wraps a [`Pipeline`] for a single run, exposing one method per playbook
//! callback. It remembers the run name (from [`playbook_start`]) and the current play, and refuses
//! every other callback until the run has started:
//!
//! ```rust
//! use playbook_syslog::{config::Config, translator::EventTranslator};
//! # fn main() -> playbook_syslog::error::Result<()> {
//! let config = Config::builder().host("127.0.0.1").port(5514).build()?;
//! let mut translator = EventTranslator::connect(&config)?;
//! assert!(translator.play_start("Set up servers").is_err());
//! translator.playbook_start("/srv/ansible/site.yml")?;
//! translator.play_start("Set up servers")?;
//! let delivery = translator.shutdown();
//! # assert_eq!(delivery.sent + delivery.dropped, 2);
//! # Ok(())
//! # }
//! ```
//!
//! Failing to deliver a packet is never an error here; see [`BestEffort`].
//!
//! [`playbook_start`]: EventTranslator::playbook_start

use crate::{
    clock::{Clock, SystemClock},
    config::Config,
    error::{Error, Result},
    event::{Event, EventKind},
    formatter::{MessageFormatter, SyslogFormatter},
    payload::{self, PLACEHOLDER},
    severity::{resolve_event, SeverityConfig},
    stats::{self, StatsSnapshot},
    transport::{BestEffort, Delivery, Transport, UdpTransport},
};

use backtrace::Backtrace;
use tracing::{debug, warn};

use std::{collections::BTreeMap, path::Path};

/// The outcome of running one task on one host, as reported to the `runner_*` & `item_*`
/// callbacks
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct TaskResult {
    pub host: String,
    pub task: String,
    /// Result fields: `msg`, `skip_reason`, `retries`, and, for loop items, `item`
    pub detail: BTreeMap<String, String>,
    pub ignore_errors: bool,
}

impl TaskResult {
    pub fn new<H: Into<String>, T: Into<String>>(host: H, task: T) -> TaskResult {
        TaskResult {
            host: host.into(),
            task: task.into(),
            ..Default::default()
        }
    }
    pub fn detail<K: Into<String>, V: Into<String>>(mut self, key: K, value: V) -> Self {
        self.detail.insert(key.into(), value.into());
        self
    }
    pub fn ignore_errors(mut self, ignore_errors: bool) -> Self {
        self.ignore_errors = ignore_errors;
        self
    }
}

/// The inbound record shapes, one per family of callbacks
#[derive(Copy, Clone, Debug)]
pub enum Record<'a> {
    Playbook(&'a Path),
    Play(&'a str),
    Task(&'a str),
    Result(&'a TaskResult),
}

impl Record<'_> {
    fn name(&self) -> &'static str {
        match self {
            Record::Playbook(_) => "playbook",
            Record::Play(_) => "play",
            Record::Task(_) => "task",
            Record::Result(_) => "task result",
        }
    }
    /// True if an event of kind `kind` is built from this shape of record. Summary kinds &
    /// [`EventKind::InternalError`] are built from statistics only, never from a record.
    pub fn describes(&self, kind: EventKind) -> bool {
        use EventKind::*;
        matches!(
            (self, kind),
            (Record::Playbook(_), PlaybookStart)
                | (Record::Play(_), PlayStart)
                | (Record::Task(_), TaskStart)
                | (
                    Record::Result(_),
                    TaskOk
                        | TaskChanged
                        | TaskFailed
                        | TaskUnreachable
                        | TaskSkipped
                        | TaskRetry
                        | ItemOk
                        | ItemFailed
                        | ItemSkipped
                )
        )
    }
    fn check(&self, kind: EventKind) -> Result<()> {
        if self.describes(kind) {
            Ok(())
        } else {
            Err(Error::RecordMismatch {
                kind,
                record: self.name(),
                back: Backtrace::new(),
            })
        }
    }
}

/// The run name for the playbook at `path`: its file name, directory stripped
pub fn run_name<P: AsRef<Path>>(path: P) -> String {
    path.as_ref()
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| PLACEHOLDER.to_string())
}

/// Build the [`Event`] of kind `kind` describing `record`, which occurred during play `play` of
/// run `run_name`.
pub fn build_event(kind: EventKind, run_name: &str, play: Option<&str>, record: Record<'_>) -> Event {
    let mut event = Event::new(kind, run_name);
    event.play_name = play.map(str::to_string);
    match record {
        Record::Playbook(_) => (),
        Record::Play(name) => event.play_name = Some(name.to_string()),
        Record::Task(name) => event.task_name = Some(name.to_string()),
        Record::Result(result) => {
            let mut detail = result.detail.clone();
            event.item = detail.remove("item");
            event.detail = detail;
            event.target_host = Some(result.host.clone());
            event.task_name = Some(result.task.clone());
            event.ignore_errors = result.ignore_errors;
        }
    }
    event
}

////////////////////////////////////////////////////////////////////////////////////////////////////
//                                             Pipeline                                           //
////////////////////////////////////////////////////////////////////////////////////////////////////

/// Severity resolution, formatting & delivery, with no per-run state
pub struct Pipeline<T, C = SystemClock> {
    severities: SeverityConfig,
    formatter: MessageFormatter,
    sink: BestEffort<T>,
    clock: C,
    debug: bool,
}

impl Pipeline<UdpTransport, SystemClock> {
    /// Open a UDP socket to the collector named in `config`
    pub fn connect(config: &Config) -> Result<Pipeline<UdpTransport, SystemClock>> {
        Pipeline::new(config, UdpTransport::new(config.destination())?, SystemClock)
    }
}

impl<T: Transport, C: Clock> Pipeline<T, C> {
    pub fn new(config: &Config, transport: T, clock: C) -> Result<Pipeline<T, C>> {
        Ok(Pipeline {
            severities: config.severities.clone(),
            formatter: config.formatter()?,
            sink: BestEffort::new(transport),
            clock,
            debug: config.debug,
        })
    }

    /// Format `event` & hand it to the transport
    pub fn emit(&self, event: &Event) {
        let severity = resolve_event(event, &self.severities);
        let payload = payload::render(event);
        match self
            .formatter
            .format(severity, &payload, Some(self.clock.now()))
        {
            Ok(packet) => {
                if self.debug {
                    debug!("{}", String::from_utf8_lossy(&packet));
                }
                self.sink.deliver(&packet);
            }
            Err(err) => warn!("failed to format a {} event: {}", event.kind, err),
        }
    }

    /// Build the event for `record` & emit it; fails if `record` can't describe a `kind` event.
    pub fn translate(
        &self,
        kind: EventKind,
        run_name: &str,
        play: Option<&str>,
        record: Record<'_>,
    ) -> Result<()> {
        record.check(kind)?;
        self.emit(&build_event(kind, run_name, play, record));
        Ok(())
    }

    /// Emit the end-of-run summary for `snapshot`.
    ///
    /// If the summary can't be computed, an [`EventKind::InternalError`] message describing the
    /// failure is sent in its place.
    pub fn summarize(&self, run_name: &str, snapshot: &StatsSnapshot) {
        match stats::summarize(run_name, snapshot) {
            Ok(events) => events.iter().for_each(|event| self.emit(event)),
            Err(err) => {
                warn!("failed to summarize run {}: {}", run_name, err);
                self.emit(
                    &Event::new(EventKind::InternalError, run_name).detail("msg", err.to_string()),
                );
            }
        }
    }

    pub fn delivery(&self) -> Delivery {
        self.sink.delivery()
    }
    pub fn transport(&self) -> &T {
        self.sink.transport()
    }
    /// Release the transport, reporting how many packets were sent & dropped
    pub fn shutdown(self) -> Delivery {
        self.sink.shutdown()
    }
}

////////////////////////////////////////////////////////////////////////////////////////////////////
//                                          EventTranslator                                       //
////////////////////////////////////////////////////////////////////////////////////////////////////

#[derive(Clone, Debug, PartialEq, Eq)]
enum RunState {
    Uninitialized,
    Running {
        run_name: String,
        play: Option<String>,
    },
}

/// One playbook run's worth of callbacks
pub struct EventTranslator<T, C = SystemClock> {
    pipeline: Pipeline<T, C>,
    state: RunState,
}

impl EventTranslator<UdpTransport, SystemClock> {
    pub fn connect(config: &Config) -> Result<EventTranslator<UdpTransport, SystemClock>> {
        Ok(EventTranslator::new(Pipeline::connect(config)?))
    }
}

impl<T: Transport, C: Clock> EventTranslator<T, C> {
    pub fn new(pipeline: Pipeline<T, C>) -> EventTranslator<T, C> {
        EventTranslator {
            pipeline,
            state: RunState::Uninitialized,
        }
    }

    /// The current run's name, once started
    pub fn run_name(&self) -> Option<&str> {
        match &self.state {
            RunState::Uninitialized => None,
            RunState::Running { run_name, .. } => Some(run_name),
        }
    }

    /// Dispatch one callback.
    ///
    /// [`Record::Playbook`] starts (or restarts) the run; anything else before that fails with
    /// [`Error::NotStarted`] without sending anything. A `record` that can't describe a `kind`
    /// event fails with [`Error::RecordMismatch`], leaving the run untouched.
    pub fn translate(&mut self, kind: EventKind, record: Record<'_>) -> Result<()> {
        record.check(kind)?;
        if let Record::Playbook(path) = record {
            self.state = RunState::Running {
                run_name: run_name(path),
                play: None,
            };
        }
        let (run_name, play) = match &mut self.state {
            RunState::Uninitialized => {
                return Err(Error::NotStarted {
                    kind,
                    back: Backtrace::new(),
                })
            }
            RunState::Running { run_name, play } => (run_name, play),
        };
        if let Record::Play(name) = record {
            *play = Some(name.to_string());
        }
        self.pipeline
            .translate(kind, run_name.as_str(), play.as_deref(), record)
    }

    pub fn playbook_start<P: AsRef<Path>>(&mut self, path: P) -> Result<()> {
        self.translate(EventKind::PlaybookStart, Record::Playbook(path.as_ref()))
    }
    pub fn play_start(&mut self, name: &str) -> Result<()> {
        self.translate(EventKind::PlayStart, Record::Play(name))
    }
    pub fn task_start(&mut self, name: &str) -> Result<()> {
        self.translate(EventKind::TaskStart, Record::Task(name))
    }
    pub fn runner_ok(&mut self, result: &TaskResult) -> Result<()> {
        self.translate(EventKind::TaskOk, Record::Result(result))
    }
    pub fn runner_changed(&mut self, result: &TaskResult) -> Result<()> {
        self.translate(EventKind::TaskChanged, Record::Result(result))
    }
    pub fn runner_failed(&mut self, result: &TaskResult) -> Result<()> {
        self.translate(EventKind::TaskFailed, Record::Result(result))
    }
    pub fn runner_unreachable(&mut self, result: &TaskResult) -> Result<()> {
        self.translate(EventKind::TaskUnreachable, Record::Result(result))
    }
    pub fn runner_skipped(&mut self, result: &TaskResult) -> Result<()> {
        self.translate(EventKind::TaskSkipped, Record::Result(result))
    }
    pub fn runner_retry(&mut self, result: &TaskResult) -> Result<()> {
        self.translate(EventKind::TaskRetry, Record::Result(result))
    }
    pub fn item_ok(&mut self, result: &TaskResult) -> Result<()> {
        self.translate(EventKind::ItemOk, Record::Result(result))
    }
    pub fn item_failed(&mut self, result: &TaskResult) -> Result<()> {
        self.translate(EventKind::ItemFailed, Record::Result(result))
    }
    pub fn item_skipped(&mut self, result: &TaskResult) -> Result<()> {
        self.translate(EventKind::ItemSkipped, Record::Result(result))
    }

    /// The end-of-run statistics
    pub fn stats(&mut self, snapshot: &StatsSnapshot) -> Result<()> {
        match &self.state {
            RunState::Uninitialized => Err(Error::NotStarted {
                kind: EventKind::SummaryStart,
                back: Backtrace::new(),
            }),
            RunState::Running { run_name, .. } => {
                self.pipeline.summarize(run_name, snapshot);
                Ok(())
            }
        }
    }

    pub fn pipeline(&self) -> &Pipeline<T, C> {
        &self.pipeline
    }
    pub fn delivery(&self) -> Delivery {
        self.pipeline.delivery()
    }
    pub fn shutdown(self) -> Delivery {
        self.pipeline.shutdown()
    }
}
