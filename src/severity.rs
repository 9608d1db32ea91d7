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

//! Deciding the syslog severity of each event.
//!
//! Most of the time the answer is simply whatever [`SeverityConfig`] says for the event's
//! [`EventKind`]; that table starts from the compiled-in defaults in [`KINDS`] and may be
//! overridden, kind by kind, at load time. Two rules take precedence over the table:
//!
//! - a failed task whose errors the playbook ignores is reported at `LOG_NOTICE`
//! - a host summary with failures is reported at `LOG_ERR`, and one with unreachable tasks (but no
//!   failures) at `LOG_EMERG`, whatever `summary_host` is configured to
//!
//! [`KINDS`]: crate::event::KINDS

use crate::{
    error::Result,
    event::{Event, EventKind, KINDS},
    facility::Severity,
    stats::HostStats,
};

/// The severity for each [`EventKind`]. Immutable once loaded.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SeverityConfig([Severity; EventKind::COUNT]);

impl std::default::Default for SeverityConfig {
    fn default() -> Self {
        let mut levels = [Severity::LOG_INFO; EventKind::COUNT];
        for spec in KINDS.iter() {
            levels[spec.kind as usize] = spec.default_severity;
        }
        SeverityConfig(levels)
    }
}

impl SeverityConfig {
    pub fn get(&self, kind: EventKind) -> Severity {
        self.0[kind as usize]
    }
    pub fn set(&mut self, kind: EventKind, severity: Severity) {
        self.0[kind as usize] = severity;
    }
    pub fn with(mut self, kind: EventKind, severity: Severity) -> Self {
        self.set(kind, severity);
        self
    }
    /// Override the level for the kind whose key is `kind` (e.g. `"failed"`) with the severity
    /// named by `severity` (e.g. `"LOG_WARNING"`, `"warn"` or `"4"`).
    pub fn set_by_name(&mut self, kind: &str, severity: &str) -> Result<()> {
        let kind: EventKind = kind.parse()?;
        self.set(kind, severity.parse()?);
        Ok(())
    }
}

/// Per-event facts that can override the configured severity
#[derive(Copy, Clone, Debug, Default)]
pub struct Context<'a> {
    pub ignore_errors: bool,
    pub stats: Option<&'a HostStats>,
}

impl<'a> Context<'a> {
    pub fn of(event: &'a Event) -> Context<'a> {
        Context {
            ignore_errors: event.ignore_errors,
            stats: event.stats.as_ref(),
        }
    }
}

/// Resolve the severity at which an event of kind `kind` shall be reported.
pub fn resolve(kind: EventKind, config: &SeverityConfig, context: Context<'_>) -> Severity {
    match (kind, context.stats) {
        (EventKind::TaskFailed, _) if context.ignore_errors => Severity::LOG_NOTICE,
        (EventKind::SummaryHost, Some(stats)) if stats.failures > 0 => Severity::LOG_ERR,
        (EventKind::SummaryHost, Some(stats)) if stats.unreachable > 0 => Severity::LOG_EMERG,
        _ => config.get(kind),
    }
}

/// Convenience wrapper: resolve the severity for `event`
pub fn resolve_event(event: &Event, config: &SeverityConfig) -> Severity {
    resolve(event.kind, config, Context::of(event))
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn defaults_come_from_the_table() {
        let config = SeverityConfig::default();
        for kind in EventKind::ALL {
            assert_eq!(config.get(kind), kind.spec().default_severity);
        }
    }

    #[test]
    fn ignored_failures_are_demoted() {
        for configured in [Severity::LOG_EMERG, Severity::LOG_ERR, Severity::LOG_DEBUG] {
            let config = SeverityConfig::default().with(EventKind::TaskFailed, configured);
            let ctx = Context {
                ignore_errors: true,
                stats: None,
            };
            assert_eq!(
                resolve(EventKind::TaskFailed, &config, ctx),
                Severity::LOG_NOTICE
            );
            assert_eq!(
                resolve(EventKind::TaskFailed, &config, Context::default()),
                configured
            );
        }
        // only failed tasks get the treatment
        let ctx = Context {
            ignore_errors: true,
            stats: None,
        };
        assert_eq!(
            resolve(EventKind::ItemFailed, &SeverityConfig::default(), ctx),
            Severity::LOG_ERR
        );
    }

    #[test]
    fn summary_overrides() {
        let config = SeverityConfig::default().with(EventKind::SummaryHost, Severity::LOG_DEBUG);
        let clean = HostStats {
            ok: 4,
            rescued: 2,
            ignored: 1,
            ..Default::default()
        };
        let failed = HostStats {
            failures: 1,
            unreachable: 3,
            ..Default::default()
        };
        let unreachable = HostStats {
            ok: 1,
            unreachable: 1,
            ..Default::default()
        };
        let at = |stats: &HostStats| {
            resolve(
                EventKind::SummaryHost,
                &config,
                Context {
                    ignore_errors: false,
                    stats: Some(stats),
                },
            )
        };
        assert_eq!(at(&clean), Severity::LOG_DEBUG);
        assert_eq!(at(&failed), Severity::LOG_ERR);
        assert_eq!(at(&unreachable), Severity::LOG_EMERG);
    }

    #[test]
    fn override_by_name() {
        let mut config = SeverityConfig::default();
        config.set_by_name("ok", "LOG_NOTICE").unwrap();
        assert_eq!(config.get(EventKind::TaskOk), Severity::LOG_NOTICE);
        assert!(config.set_by_name("on_ok", "LOG_NOTICE").is_err());
        assert!(config.set_by_name("ok", "LOUD").is_err());
        assert_eq!(config.get(EventKind::TaskOk), Severity::LOG_NOTICE);
    }
}
