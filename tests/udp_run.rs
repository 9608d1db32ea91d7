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

//! A complete run, delivered over loopback UDP to a socket standing in for the collector.

use playbook_syslog::{
    config::Config,
    formatter::Format,
    stats::{HostStats, StatsSnapshot},
    translator::{EventTranslator, TaskResult},
};
use syslog_rfc5424::{parse_message, SyslogFacility, SyslogSeverity};

use std::{net::UdpSocket, time::Duration};

fn collector() -> (UdpSocket, u16) {
    let socket = UdpSocket::bind("127.0.0.1:0").unwrap();
    socket
        .set_read_timeout(Some(Duration::from_secs(5)))
        .unwrap();
    let port = socket.local_addr().unwrap().port();
    (socket, port)
}

fn receive(socket: &UdpSocket, n: usize) -> Vec<String> {
    let mut buf = [0u8; 2048];
    (0..n)
        .map(|_| {
            let len = socket.recv(&mut buf).unwrap();
            String::from_utf8(buf[..len].to_vec()).unwrap()
        })
        .collect()
}

#[test]
fn rfc5424_run() {
    let (socket, port) = collector();
    let config = Config::builder()
        .host("127.0.0.1")
        .port(port)
        .format(Format::Rfc5424)
        .hostname("bree.local")
        .build()
        .unwrap();

    let mut translator = EventTranslator::connect(&config).unwrap();
    translator.playbook_start("/path/to/site.yml").unwrap();
    translator.play_start("Setup").unwrap();
    translator
        .runner_failed(&TaskResult::new("db01", "Start database").detail("msg", "boom"))
        .unwrap();
    let snapshot: StatsSnapshot = [
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
                unreachable: 1,
                ..Default::default()
            },
        ),
    ]
    .into_iter()
    .collect();
    translator.stats(&snapshot).unwrap();
    let delivery = translator.shutdown();
    assert_eq!(delivery.sent, 7);
    assert_eq!(delivery.dropped, 0);

    let messages = receive(&socket, 7)
        .into_iter()
        .map(|packet| parse_message(packet).unwrap())
        .collect::<Vec<_>>();

    for message in &messages {
        assert!(matches!(message.facility, SyslogFacility::LOG_USER));
        assert_eq!(message.hostname.as_deref(), Some("bree.local"));
        assert_eq!(message.appname.as_deref(), Some("ansible"));
        assert!(message.procid.is_none());
        assert!(message.msgid.is_none());
        assert!(message.timestamp.is_some());
    }

    assert!(matches!(messages[0].severity, SyslogSeverity::SEV_INFO));
    assert_eq!(messages[0].msg, "site.yml status=playbook_start");
    assert_eq!(messages[1].msg, "site.yml play=\"Setup\" status=play_start");
    assert!(matches!(messages[2].severity, SyslogSeverity::SEV_ERR));
    assert_eq!(
        messages[2].msg,
        "site.yml play=\"Setup\" task=\"Start database\" target_host=db01 status=failed error=\"boom\""
    );
    assert_eq!(messages[3].msg, "site.yml status=summary_start hosts=2");
    assert!(matches!(messages[4].severity, SyslogSeverity::SEV_INFO));
    assert!(messages[4]
        .msg
        .ends_with("target_host=host1 status=summary_host tasks=6 ok=5 changed=2 skipped=1"));
    assert!(matches!(messages[5].severity, SyslogSeverity::SEV_EMERG));
    assert!(messages[5]
        .msg
        .ends_with("target_host=host3 status=summary_host tasks=3 ok=2 unreachable=1"));
    assert!(messages[6].msg.ends_with("status=summary_complete hosts=2"));
}

#[test]
fn rfc3164_run() {
    let (socket, port) = collector();
    let config = Config::from_vars([
        ("ANSIBLE_SYSLOG_HOST", "127.0.0.1".to_string()),
        ("ANSIBLE_SYSLOG_PORT", port.to_string()),
        ("ANSIBLE_SYSLOG_FACILITY", "local0".to_string()),
        ("ANSIBLE_SYSLOG_HOSTNAME", "bree.local".to_string()),
        ("ANSIBLE_SYSLOG_TAG", "deploy".to_string()),
    ])
    .unwrap();

    let mut translator = EventTranslator::connect(&config).unwrap();
    translator.playbook_start("site.yml").unwrap();
    translator.stats(&StatsSnapshot::new()).unwrap();
    assert_eq!(translator.shutdown().sent, 2);

    let packets = receive(&socket, 2);
    assert!(packets[0].starts_with("<134>"));
    assert!(packets[0].ends_with(" bree deploy: site.yml status=playbook_start"));
    assert!(packets[1].starts_with("<132>"));
    assert!(packets[1].ends_with(" bree deploy: site.yml status=summary_no_hosts"));
}
