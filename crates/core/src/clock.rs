// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Time source abstraction.
//!
//! The daemon never calls `chrono::Utc::now()`/`Instant::now()` directly;
//! everything that needs the current time takes a `Clock`, so the Executor's
//! context-prefix timestamp and the Heartbeat Probe's cadence are
//! deterministic under test.

use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use std::sync::Arc;
use std::time::{Duration, Instant};

/// A source of wall-clock and monotonic time.
pub trait Clock: Send + Sync {
    /// Current wall-clock time.
    fn now(&self) -> DateTime<Utc>;

    /// Current monotonic instant, for scheduling and timeouts.
    fn instant_now(&self) -> Instant;
}

/// Real time, backed by the OS clock.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }

    fn instant_now(&self) -> Instant {
        Instant::now()
    }
}

/// A controllable clock for tests.
///
/// Starts at a fixed wall-clock time and a fresh `Instant::now()`; advance it
/// with [`FakeClock::advance`].
#[derive(Clone)]
pub struct FakeClock {
    inner: Arc<Mutex<FakeClockState>>,
}

struct FakeClockState {
    wall: DateTime<Utc>,
    instant: Instant,
}

impl FakeClock {
    /// Create a clock fixed at the given wall-clock time.
    pub fn new(wall: DateTime<Utc>) -> Self {
        Self {
            inner: Arc::new(Mutex::new(FakeClockState {
                wall,
                instant: Instant::now(),
            })),
        }
    }

    /// Advance both the wall-clock and monotonic readings by `delta`.
    pub fn advance(&self, delta: Duration) {
        let mut state = self.inner.lock();
        state.wall += delta;
        state.instant += delta;
    }

    /// Set the wall-clock reading directly, leaving the monotonic clock alone.
    pub fn set(&self, wall: DateTime<Utc>) {
        self.inner.lock().wall = wall;
    }
}

impl Default for FakeClock {
    fn default() -> Self {
        Self::new(Utc::now())
    }
}

impl Clock for FakeClock {
    fn now(&self) -> DateTime<Utc> {
        self.inner.lock().wall
    }

    fn instant_now(&self) -> Instant {
        self.inner.lock().instant
    }
}

#[cfg(test)]
#[path = "clock_tests.rs"]
mod tests;
