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

//! Replay a representative playbook run against a live collector over UDP.
//!
//! Configuration comes from the environment, exactly as it would for a real run; e.g.
//!
//! ```text
//! ANSIBLE_SYSLOG_PORT=5514 ANSIBLE_SYSLOG_FORMAT=rfc5424 ANSIBLE_SYSLOG_DEBUG=1 \
//!     cargo run --bin udp-replay -- /path/to/test_playbook.yml
//! ```

use playbook_syslog::{
    config::Config,
    error::Result,
    stats::{HostStats, StatsSnapshot},
    translator::{EventTranslator, TaskResult},
};
use tracing::{info, Level};

fn replay<P: AsRef<std::path::Path>>(config: &Config, playbook: P) -> Result<()> {
    let mut translator = EventTranslator::connect(config)?;

    translator.playbook_start(playbook)?;
    info!("run name: {}", translator.run_name().unwrap_or("-"));
    translator.play_start("Test Play - Setup servers")?;

    translator.task_start("Install nginx")?;
    translator.runner_ok(&TaskResult::new("web01", "Install nginx"))?;
    translator.runner_changed(&TaskResult::new("web01", "Update nginx config"))?;
    translator.runner_failed(
        &TaskResult::new("db01", "Start database").detail("msg", "Service startup failed"),
    )?;
    translator.runner_failed(
        &TaskResult::new("db02", "Start database")
            .detail("msg", "Service startup failed")
            .ignore_errors(true),
    )?;
    translator
        .runner_unreachable(&TaskResult::new("web03", "Ping test").detail("msg", "Connection timeout"))?;
    translator.runner_skipped(
        &TaskResult::new("web02", "Install debug tools").detail("skip_reason", "Not in debug mode"),
    )?;
    translator.runner_retry(&TaskResult::new("app01", "Download package").detail("retries", "2"))?;

    translator.item_ok(&TaskResult::new("web01", "Install packages").detail("item", "nginx"))?;
    translator.item_failed(
        &TaskResult::new("web01", "Install packages")
            .detail("item", "mysql-server")
            .detail("msg", "Package not found"),
    )?;
    translator.item_skipped(
        &TaskResult::new("web01", "Install packages")
            .detail("item", "debug-tools")
            .detail("skip_reason", "Not needed"),
    )?;
    translator.task_start("Configure \"firewall\"")?;

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
            "host2",
            HostStats {
                ok: 3,
                failures: 1,
                rescued: 1,
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
    ]
    .into_iter()
    .collect();
    translator.stats(&snapshot)?;

    let delivery = translator.shutdown();
    println!("sent {} packets, dropped {}", delivery.sent, delivery.dropped);
    Ok(())
}

pub fn main() {
    let config = match Config::from_env() {
        Ok(config) => config,
        Err(err) => {
            eprintln!("{}", err);
            std::process::exit(2);
        }
    };

    tracing_subscriber::fmt()
        .with_max_level(if config.debug { Level::DEBUG } else { Level::INFO })
        .with_writer(std::io::stderr)
        .init();

    info!(
        "replaying to {}:{} ({:?}, facility {})",
        config.host, config.port, config.format, config.facility
    );
    let playbook = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "/path/to/test_playbook.yml".to_string());
    if let Err(err) = replay(&config, playbook) {
        eprintln!("{}", err);
        std::process::exit(1);
    }
}
