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

//! Forward the lifecycle events of a configuration-management playbook run to a [`syslog`]
//! [daemon].
//!
//! [`syslog`]: https://en.wikipedia.org/wiki/Syslog
//! [daemon]: https://en.wikipedia.org/wiki/Daemon_(computing)
//!
//! # Introduction
//!
//! An orchestration engine running a playbook raises a stream of callbacks: the playbook starts,
//! a play starts, a task starts, the task succeeds on this host, fails on that one, is skipped on
//! a third, and so on until, at the end, a statistics summary arrives with per-host counters. This
//! crate turns each of those callbacks into one syslog message and fires it at a collector over
//! UDP, so that a run can be followed (and alerted on) from the same place as every other log.
//!
//! Each message carries a priority computed from the configured [facility] and a [severity]
//! chosen per kind of event, a timestamp, the originating hostname, a tag and a single-line
//! `key=value` [payload]:
//!
//! ```text
//! <11>Mar  5 07:08:09 bree ansible: site.yml task="Start database" target_host=db01 status=failed error="Service startup failed"
//! ```
//!
//! [facility]: crate::facility::Facility
//! [severity]: crate::severity
//! [payload]: crate::payload
//!
//! Delivery is best-effort: a collector that's down or unreachable never causes a callback to
//! fail (see [`transport::BestEffort`]).
//!
//! # Usage
//!
//! Resolve a [`Config`] once, at start-up, connect an [`EventTranslator`] & feed it callbacks:
//!
//! ```no_run
//! use playbook_syslog::{config::Config, stats::StatsSnapshot, translator::{EventTranslator, TaskResult}};
//! # fn main() -> playbook_syslog::error::Result<()> {
//! // ANSIBLE_SYSLOG_HOST, ANSIBLE_SYSLOG_PORT, ANSIBLE_SYSLOG_FORMAT, ...
//! let config = Config::from_env()?;
//! let mut translator = EventTranslator::connect(&config)?;
//!
//! translator.playbook_start("/srv/ansible/site.yml")?;
//! translator.play_start("Set up servers")?;
//! translator.task_start("Install nginx")?;
//! translator.runner_ok(&TaskResult::new("web01", "Install nginx"))?;
//! translator.stats(&StatsSnapshot::new())?;
//!
//! let delivery = translator.shutdown();
//! println!("sent {}, dropped {}", delivery.sent, delivery.dropped);
//! # Ok(())
//! # }
//! ```
//!
//! Messages are formatted as per RFC [3164] by default; set `ANSIBLE_SYSLOG_FORMAT=rfc5424` (or
//! use [`Format::Rfc5424`]) for RFC [5424].
//!
//! [`Config`]: crate::config::Config
//! [`EventTranslator`]: crate::translator::EventTranslator
//! [`Format::Rfc5424`]: crate::formatter::Format::Rfc5424
//! [3164]: https://datatracker.ietf.org/doc/html/rfc3164
//! [5424]: https://datatracker.ietf.org/doc/html/rfc5424

pub mod clock;
pub mod config;
pub mod error;
pub mod event;
pub mod facility;
pub mod formatter;
mod host;
pub mod payload;
pub mod rfc3164;
pub mod rfc5424;
pub mod severity;
pub mod stats;
pub mod translator;
pub mod transport;
