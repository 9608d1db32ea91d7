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

//! Building the textual payload of each syslog message.
//!
//! Every [`Event`] renders to a single line of space-delimited `key=value` tokens, led by the run
//! name:
//!
//! ```text
//! site.yml task="Start database" target_host=db01 status=failed error="Service startup failed"
//! ```
//!
//! Free-text values (play & task names, error messages, skip reasons, loop items) are always
//! double-quoted; anything else is quoted only when it has to be. Inside quotes, `"` & `\` are
//! backslash-escaped and control characters are written as escapes, so nothing an event carries
//! can break the token structure or smuggle a second line into the collector.

use crate::event::{Event, Field};

use std::fmt::Write;

/// Substituted for any detail the event source didn't supply
pub const PLACEHOLDER: &str = "unknown";

fn needs_quotes(value: &str) -> bool {
    value.is_empty()
        || value
            .chars()
            .any(|c| c == ' ' || c == '"' || c == '=' || c == '\\' || c.is_control())
}

/// Append `value` to `buf`, quoted & escaped
fn push_quoted(buf: &mut String, value: &str) {
    buf.push('"');
    for c in value.chars() {
        match c {
            '"' => buf.push_str("\\\""),
            '\\' => buf.push_str("\\\\"),
            '\n' => buf.push_str("\\n"),
            '\r' => buf.push_str("\\r"),
            '\t' => buf.push_str("\\t"),
            c if c.is_control() => {
                // Writing to a `String` can't fail
                let _ = write!(buf, "\\u{{{:x}}}", c as u32);
            }
            c => buf.push(c),
        }
    }
    buf.push('"');
}

/// Append `value` to `buf`, quoting only if it contains a delimiter or control character
fn push_value(buf: &mut String, value: &str) {
    if needs_quotes(value) {
        push_quoted(buf, value);
    } else {
        buf.push_str(value);
    }
}

fn push_field(buf: &mut String, key: &str, value: &str) {
    buf.push(' ');
    buf.push_str(key);
    buf.push('=');
    push_value(buf, value);
}

fn push_text_field(buf: &mut String, key: &str, value: &str) {
    buf.push(' ');
    buf.push_str(key);
    buf.push('=');
    push_quoted(buf, value);
}

fn detail<'a>(event: &'a Event, key: &str) -> &'a str {
    event.detail.get(key).map(String::as_str).unwrap_or(PLACEHOLDER)
}

/// `attempt` is one more than the number of retries already made
fn attempt(event: &Event) -> String {
    event
        .detail
        .get("retries")
        .and_then(|r| r.trim().parse::<u64>().ok())
        .and_then(|r| r.checked_add(1))
        .map(|n| n.to_string())
        .unwrap_or_else(|| PLACEHOLDER.to_string())
}

/// Render `event` to its payload line. The same event always renders to the same bytes.
pub fn render(event: &Event) -> String {
    let mut buf = String::with_capacity(128);
    push_value(&mut buf, &event.run_name);
    if let Some(play) = &event.play_name {
        push_text_field(&mut buf, "play", play);
    }
    if let Some(task) = &event.task_name {
        push_text_field(&mut buf, "task", task);
    }
    if let Some(host) = &event.target_host {
        push_field(&mut buf, "target_host", host);
    }
    push_field(&mut buf, "status", event.kind.key());

    for field in event.kind.spec().fields {
        match field {
            Field::Error => push_text_field(&mut buf, "error", detail(event, "msg")),
            Field::Reason => push_text_field(&mut buf, "reason", detail(event, "skip_reason")),
            Field::Attempt => push_field(&mut buf, "attempt", &attempt(event)),
            Field::Hosts => push_field(&mut buf, "hosts", detail(event, "hosts")),
            Field::Counters => {
                push_field(&mut buf, "tasks", detail(event, "tasks"));
                if let Some(stats) = &event.stats {
                    for (counter, n) in stats.nonzero() {
                        push_field(&mut buf, counter.name(), &n.to_string());
                    }
                }
            }
        }
    }

    if let Some(item) = &event.item {
        push_text_field(&mut buf, "item", item);
    }
    buf
}

#[cfg(test)]
pub(crate) mod test {
    use super::*;

    use crate::{event::EventKind, stats::HostStats};

    /// Split a payload into tokens the way a key=value parser on the collector side would:
    /// on spaces, except within double quotes, honoring backslash escapes.
    pub(crate) fn tokenize(payload: &str) -> Vec<String> {
        let mut tokens = Vec::new();
        let mut cur = String::new();
        let mut quoted = false;
        let mut chars = payload.chars();
        while let Some(c) = chars.next() {
            match c {
                '\\' if quoted => {
                    cur.push(c);
                    if let Some(next) = chars.next() {
                        cur.push(next);
                    }
                }
                '"' => {
                    quoted = !quoted;
                    cur.push(c);
                }
                ' ' if !quoted => tokens.push(std::mem::take(&mut cur)),
                c => cur.push(c),
            }
        }
        assert!(!quoted, "unbalanced quotes in {:?}", payload);
        tokens.push(cur);
        tokens
    }

    fn assert_key_values(payload: &str) {
        let tokens = tokenize(payload);
        for token in &tokens[1..] {
            let (key, _) = token.split_once('=').expect("key=value");
            assert!(
                key.chars().all(|c| c.is_ascii_alphanumeric() || c == '_'),
                "bad key in {:?}",
                token
            );
        }
    }

    #[test]
    fn task_events() {
        let event = Event::new(EventKind::TaskFailed, "site.yml")
            .host("db01")
            .task("Start database")
            .detail("msg", "Service startup failed");
        assert_eq!(
            render(&event),
            "site.yml task=\"Start database\" target_host=db01 status=failed error=\"Service startup failed\""
        );

        let event = Event::new(EventKind::TaskOk, "site.yml")
            .host("web01")
            .task("Install nginx");
        assert_eq!(
            render(&event),
            "site.yml task=\"Install nginx\" target_host=web01 status=ok"
        );

        let event = Event::new(EventKind::PlayStart, "site.yml").play("Test Play - Setup servers");
        assert_eq!(
            render(&event),
            "site.yml play=\"Test Play - Setup servers\" status=play_start"
        );
    }

    #[test]
    fn kind_specific_fields() {
        let skipped = Event::new(EventKind::TaskSkipped, "site.yml")
            .host("web02")
            .task("Install debug tools")
            .detail("skip_reason", "Not in debug mode");
        assert!(render(&skipped).ends_with("status=skipped reason=\"Not in debug mode\""));

        let retry = Event::new(EventKind::TaskRetry, "site.yml")
            .host("app01")
            .task("Download package")
            .detail("retries", "2");
        assert!(render(&retry).ends_with("status=retry attempt=3"));

        let item = Event::new(EventKind::ItemFailed, "site.yml")
            .host("web01")
            .task("Install packages")
            .item("mysql-server")
            .detail("msg", "Package not found");
        assert!(render(&item)
            .ends_with("status=item_failed error=\"Package not found\" item=\"mysql-server\""));
    }

    #[test]
    fn missing_details_degrade() {
        let failed = Event::new(EventKind::TaskUnreachable, "site.yml")
            .host("web03")
            .task("Ping test");
        assert!(render(&failed).ends_with("status=unreachable error=\"unknown\""));

        let retry = Event::new(EventKind::TaskRetry, "site.yml").detail("retries", "lots");
        assert!(render(&retry).ends_with("attempt=unknown"));

        let skipped = Event::new(EventKind::ItemSkipped, "site.yml");
        assert!(render(&skipped).ends_with("reason=\"unknown\""));
    }

    #[test]
    fn summary_fields() {
        let event = Event::new(EventKind::SummaryHost, "site.yml")
            .host("host1")
            .detail("tasks", "6")
            .stats(HostStats {
                ok: 5,
                changed: 2,
                skipped: 1,
                ..Default::default()
            });
        assert_eq!(
            render(&event),
            "site.yml target_host=host1 status=summary_host tasks=6 ok=5 changed=2 skipped=1"
        );
        let start = Event::new(EventKind::SummaryStart, "site.yml").detail("hosts", "3");
        assert_eq!(render(&start), "site.yml status=summary_start hosts=3");
        let none = Event::new(EventKind::SummaryNoHosts, "site.yml");
        assert_eq!(render(&none), "site.yml status=summary_no_hosts");
    }

    #[test]
    fn quoting() {
        let event = Event::new(EventKind::TaskStart, "site.yml").task("Configure \"firewall\"");
        let payload = render(&event);
        assert_eq!(
            payload,
            "site.yml task=\"Configure \\\"firewall\\\"\" status=task_start"
        );
        assert_key_values(&payload);
        assert_eq!(tokenize(&payload).len(), 3);
    }

    #[test]
    fn injection() {
        let event = Event::new(EventKind::TaskFailed, "my play.yml")
            .host("evil host=1")
            .task("a\\b")
            .detail("msg", "oops\n<11>Jan  1 00:00:00 forged status=ok");
        let payload = render(&event);
        assert!(!payload.contains('\n'));
        assert!(payload.starts_with("\"my play.yml\" "));
        assert!(payload.contains("target_host=\"evil host=1\""));
        assert!(payload.contains("task=\"a\\\\b\""));
        assert!(payload.contains("error=\"oops\\n<11>Jan  1 00:00:00 forged status=ok\""));
        assert_key_values(&payload);
        assert_eq!(tokenize(&payload).len(), 5);

        let bell = Event::new(EventKind::TaskOk, "site.yml").task("ding\u{7}");
        assert!(render(&bell).contains("task=\"ding\\u{7}\""));
    }

    #[test]
    fn deterministic() {
        let event = Event::new(EventKind::TaskFailed, "site.yml")
            .host("db01")
            .task("Start database")
            .detail("zeta", "z")
            .detail("msg", "boom")
            .detail("alpha", "a");
        assert_eq!(render(&event), render(&event.clone()));
    }
}
