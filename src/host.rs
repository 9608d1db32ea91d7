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

//! Where the HOSTNAME field comes from when it isn't configured.
//!
//! Both formatters prefer the system's hostname, falling back to this host's IP address; each
//! then applies its own RFC's constraints to what it gets back.

/// The system hostname, as raw bytes, if it can be had
pub fn system_hostname() -> Option<Vec<u8>> {
    hostname::get().ok().map(into_bytes)
}

/// This host's (non-loopback) IP address, as text
pub fn local_address() -> Option<Vec<u8>> {
    local_ip_address::local_ip()
        .ok()
        .map(|ip| ip.to_string().into_bytes())
}

#[cfg(unix)]
fn into_bytes(s: std::ffi::OsString) -> Vec<u8> {
    use std::os::unix::ffi::OsStringExt;
    s.into_vec()
}

#[cfg(not(unix))]
fn into_bytes(s: std::ffi::OsString) -> Vec<u8> {
    s.to_string_lossy().as_bytes().to_vec()
}
