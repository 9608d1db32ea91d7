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

//! Where message timestamps come from.
//!
//! The formatters are pure functions of their inputs, timestamp included; the [`Clock`] is what
//! the translator consults to get one. Tests substitute a [`FixedClock`] to get byte-for-byte
//! reproducible packets.

use chrono::prelude::*;

pub trait Clock {
    fn now(&self) -> DateTime<FixedOffset>;
}

/// The wall clock, in the local timezone
#[derive(Copy, Clone, Debug, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<FixedOffset> {
        Local::now().into()
    }
}

/// A clock that's always at the same instant
#[derive(Copy, Clone, Debug)]
pub struct FixedClock(pub DateTime<FixedOffset>);

impl Clock for FixedClock {
    fn now(&self) -> DateTime<FixedOffset> {
        self.0
    }
}
