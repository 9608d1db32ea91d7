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

//! [playbook-syslog](crate) configuration.
//!
//! A [`Config`] is resolved once, at start-up, either through [`Config::builder`] or from the
//! process environment via [`Config::from_env`]. Every value is checked as it's loaded: an
//! unknown facility or severity name, an unknown event kind, or a variable we don't recognize is
//! an error _then_, rather than a surprise on the first event that needs it.
//!
//! The environment variables are:
//!
//! | variable                      | meaning                           | default     |
//! |-------------------------------|-----------------------------------|-------------|
//! | `ANSIBLE_SYSLOG_HOST`         | collector host                    | `localhost` |
//! | `ANSIBLE_SYSLOG_PORT`         | collector port                    | `514`       |
//! | `ANSIBLE_SYSLOG_FACILITY`     | facility name or code             | `user`      |
//! | `ANSIBLE_SYSLOG_TAG`          | tag (RFC 3164) / APP-NAME (5424)  | `ansible`   |
//! | `ANSIBLE_SYSLOG_DEBUG`        | echo packets to the diagnostic log| off         |
//! | `ANSIBLE_SYSLOG_FORMAT`       | `rfc3164` or `rfc5424`            | `rfc3164`   |
//! | `ANSIBLE_SYSLOG_HOSTNAME`     | reported hostname                 | discovered  |
//! | `ANSIBLE_SYSLOG_CHANGED_BEHAVIOR` | see [`ChangedBehavior`]       | `normal`    |
//! | `ANSIBLE_SYSLOG_LEVEL_<KIND>` | severity for event kind `<KIND>`  | see [`KINDS`] |
//!
//! e.g. `ANSIBLE_SYSLOG_LEVEL_FAILED=LOG_CRIT`.
//!
//! [`KINDS`]: crate::event::KINDS

use crate::{
    error::{Error, Result},
    event::EventKind,
    facility::{Facility, Severity},
    formatter::{Format, MessageFormatter},
    rfc3164::{Rfc3164Hostname, Tag},
    rfc5424::{AppName, Rfc5424Hostname},
    severity::SeverityConfig,
};

use backtrace::Backtrace;

/// Every environment variable we read starts with this
pub const ENV_PREFIX: &str = "ANSIBLE_SYSLOG_";

/// How a `changed` task result is to be regarded: `normal`, `expected` or `unexpected`.
///
/// Recognized for compatibility with existing `ANSIBLE_SYSLOG_*` environments and carried on
/// [`Config`]; it doesn't (yet) alter what's sent.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub enum ChangedBehavior {
    #[default]
    Normal,
    Expected,
    Unexpected,
}

impl std::fmt::Display for ChangedBehavior {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}",
            match self {
                ChangedBehavior::Normal => "normal",
                ChangedBehavior::Expected => "expected",
                ChangedBehavior::Unexpected => "unexpected",
            }
        )
    }
}

impl std::str::FromStr for ChangedBehavior {
    type Err = Error;
    fn from_str(s: &str) -> Result<ChangedBehavior> {
        match s.trim().to_ascii_lowercase().as_str() {
            "normal" => Ok(ChangedBehavior::Normal),
            "expected" => Ok(ChangedBehavior::Expected),
            "unexpected" => Ok(ChangedBehavior::Unexpected),
            _ => Err(bad_value("changed_behavior", s)),
        }
    }
}

/// The complete, validated configuration
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub facility: Facility,
    pub tag: String,
    pub debug: bool,
    pub format: Format,
    /// Overrides hostname discovery when set
    pub hostname: Option<String>,
    pub changed_behavior: ChangedBehavior,
    pub severities: SeverityConfig,
}

impl std::default::Default for Config {
    fn default() -> Self {
        Config {
            host: "localhost".to_string(),
            port: 514,
            facility: Facility::LOG_USER,
            tag: "ansible".to_string(),
            debug: false,
            format: Format::Rfc3164,
            hostname: None,
            changed_behavior: ChangedBehavior::default(),
            severities: SeverityConfig::default(),
        }
    }
}

fn bad_value(key: &str, value: &str) -> Error {
    Error::BadConfigValue {
        key: key.to_string(),
        value: value.to_string(),
        back: Backtrace::new(),
    }
}

fn parse_flag(key: &str, value: &str) -> Result<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Ok(true),
        "false" | "0" | "no" | "off" | "" => Ok(false),
        _ => Err(bad_value(key, value)),
    }
}

impl Config {
    pub fn builder() -> ConfigBuilder {
        ConfigBuilder {
            imp: Config::default(),
        }
    }

    /// Load from the process environment
    pub fn from_env() -> Result<Config> {
        Config::from_vars(std::env::vars_os().filter_map(|(key, value)| {
            key.into_string()
                .ok()
                .map(|key| (key, value.to_string_lossy().into_owned()))
        }))
    }

    /// Load from `vars`, ignoring any that don't start with [`ENV_PREFIX`]
    pub fn from_vars<I, K, V>(vars: I) -> Result<Config>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: AsRef<str>,
    {
        let mut config = Config::default();
        for (key, value) in vars {
            let (key, value) = (key.as_ref(), value.as_ref());
            let name = match key.strip_prefix(ENV_PREFIX) {
                Some(name) => name,
                None => continue,
            };
            match name {
                "HOST" => config.host = value.trim().to_string(),
                "PORT" => {
                    config.port = value.trim().parse().map_err(|_| bad_value(key, value))?
                }
                "FACILITY" => config.facility = value.parse()?,
                "TAG" => config.tag = value.trim().to_string(),
                "DEBUG" => config.debug = parse_flag(key, value)?,
                "FORMAT" => config.format = value.parse().map_err(|_| bad_value(key, value))?,
                "HOSTNAME" => config.hostname = Some(value.trim().to_string()),
                "CHANGED_BEHAVIOR" => {
                    config.changed_behavior = value.parse().map_err(|_| bad_value(key, value))?
                }
                other => match other.strip_prefix("LEVEL_") {
                    Some(kind) => config.severities.set_by_name(kind, value)?,
                    None => {
                        return Err(Error::UnknownConfigKey {
                            key: key.to_string(),
                            back: Backtrace::new(),
                        })
                    }
                },
            }
        }
        config.validate()?;
        Ok(config)
    }

    /// Check the fields whose constraints depend on the wire format
    fn validate(&self) -> Result<()> {
        if self.host.is_empty() {
            return Err(bad_value("host", &self.host));
        }
        match self.format {
            Format::Rfc3164 => {
                Tag::new(self.tag.clone().into_bytes())?;
                if let Some(hostname) = &self.hostname {
                    Rfc3164Hostname::try_from(hostname.clone())?;
                }
            }
            Format::Rfc5424 => {
                AppName::new(self.tag.clone().into_bytes())?;
                if let Some(hostname) = &self.hostname {
                    Rfc5424Hostname::try_from(hostname.clone())?;
                }
            }
        }
        Ok(())
    }

    /// The collector's address, suitable for [`UdpTransport::new`]
    ///
    /// [`UdpTransport::new`]: crate::transport::UdpTransport::new
    pub fn destination(&self) -> (&str, u16) {
        (self.host.as_str(), self.port)
    }

    pub fn formatter(&self) -> Result<MessageFormatter> {
        MessageFormatter::new(
            self.format,
            self.facility,
            self.hostname.as_deref(),
            &self.tag,
        )
    }
}

pub struct ConfigBuilder {
    imp: Config,
}

impl ConfigBuilder {
    pub fn host<S: Into<String>>(mut self, host: S) -> Self {
        self.imp.host = host.into();
        self
    }
    pub fn port(mut self, port: u16) -> Self {
        self.imp.port = port;
        self
    }
    pub fn facility(mut self, facility: Facility) -> Self {
        self.imp.facility = facility;
        self
    }
    pub fn tag<S: Into<String>>(mut self, tag: S) -> Self {
        self.imp.tag = tag.into();
        self
    }
    pub fn debug(mut self, debug: bool) -> Self {
        self.imp.debug = debug;
        self
    }
    pub fn format(mut self, format: Format) -> Self {
        self.imp.format = format;
        self
    }
    pub fn hostname<S: Into<String>>(mut self, hostname: S) -> Self {
        self.imp.hostname = Some(hostname.into());
        self
    }
    pub fn changed_behavior(mut self, behavior: ChangedBehavior) -> Self {
        self.imp.changed_behavior = behavior;
        self
    }
    pub fn severity(mut self, kind: EventKind, severity: Severity) -> Self {
        self.imp.severities.set(kind, severity);
        self
    }
    pub fn build(self) -> Result<Config> {
        self.imp.validate()?;
        Ok(self.imp)
    }
}
