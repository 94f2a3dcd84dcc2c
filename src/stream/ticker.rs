//! Periodic tick sources
//!
//! The [`StreamEngine`](super::StreamEngine) never reads the wall clock
//! itself. It asks a [`Ticker`] whether a tick is due and runs exactly one
//! delivery step per tick. Two implementations are provided:
//!
//! - [`IntervalTicker`] - Real timer backed by [`crossbeam_channel::tick`].
//!   Ticks that the host does not consume in time are coalesced, so a slow
//!   consumer never sees a burst of overlapping ticks.
//! - [`ManualTicker`] - Virtual clock for tests. Time only moves when
//!   [`ManualTicker::advance`] is called (or when [`Ticker::wait`] jumps to
//!   the next due tick).
//!
//! Disarming a ticker with [`Ticker::stop`] revokes any tick that was
//! scheduled but not yet handed out.

use crossbeam_channel::Receiver;
use std::time::{Duration, Instant};

/// A single tick handed out by a [`Ticker`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Tick {
    /// 1-based sequence number since the ticker was last armed
    pub seq: u64,
    /// Time since the ticker was last armed
    pub elapsed: Duration,
}

/// Periodic scheduler used to pace a stream session
pub trait Ticker {
    /// Arm the ticker to fire every `interval`, replacing any previous schedule
    fn start(&mut self, interval: Duration);

    /// Disarm the ticker; pending ticks are revoked
    fn stop(&mut self);

    /// Whether the ticker is currently armed
    fn is_armed(&self) -> bool;

    /// Return a due tick without blocking
    fn try_next(&mut self) -> Option<Tick>;

    /// Wait for the next tick; `None` if the ticker is not armed
    fn wait(&mut self) -> Option<Tick>;
}

// ==================== Interval Ticker ====================

enum TickSource {
    /// Backed by a crossbeam timer channel
    Timer(Receiver<Instant>),
    /// Zero interval: every poll is a tick
    Immediate,
}

struct ArmedInterval {
    source: TickSource,
    started: Instant,
    seq: u64,
}

impl ArmedInterval {
    fn fire(&mut self, at: Instant) -> Tick {
        self.seq += 1;
        Tick {
            seq: self.seq,
            elapsed: at.saturating_duration_since(self.started),
        }
    }
}

/// Real-time ticker
#[derive(Default)]
pub struct IntervalTicker {
    armed: Option<ArmedInterval>,
}

impl IntervalTicker {
    /// Create a disarmed ticker
    pub fn new() -> Self {
        Self::default()
    }
}

impl std::fmt::Debug for IntervalTicker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IntervalTicker")
            .field("armed", &self.armed.is_some())
            .field("seq", &self.armed.as_ref().map(|a| a.seq))
            .finish()
    }
}

impl Ticker for IntervalTicker {
    fn start(&mut self, interval: Duration) {
        let source = if interval.is_zero() {
            TickSource::Immediate
        } else {
            TickSource::Timer(crossbeam_channel::tick(interval))
        };
        self.armed = Some(ArmedInterval {
            source,
            started: Instant::now(),
            seq: 0,
        });
    }

    fn stop(&mut self) {
        // Dropping the receiver discards any tick already queued
        self.armed = None;
    }

    fn is_armed(&self) -> bool {
        self.armed.is_some()
    }

    fn try_next(&mut self) -> Option<Tick> {
        let armed = self.armed.as_mut()?;
        let at = match &armed.source {
            TickSource::Timer(rx) => rx.try_recv().ok()?,
            TickSource::Immediate => Instant::now(),
        };
        Some(armed.fire(at))
    }

    fn wait(&mut self) -> Option<Tick> {
        let armed = self.armed.as_mut()?;
        let at = match &armed.source {
            TickSource::Timer(rx) => rx.recv().ok()?,
            TickSource::Immediate => Instant::now(),
        };
        Some(armed.fire(at))
    }
}

// ==================== Manual Ticker ====================

/// Virtual-clock ticker for deterministic tests
///
/// With a zero interval every poll yields a tick, mirroring
/// [`IntervalTicker`].
#[derive(Debug, Clone, Default)]
pub struct ManualTicker {
    now: Duration,
    armed_at: Duration,
    interval: Duration,
    next_due: Option<Duration>,
    seq: u64,
    total_fired: u64,
}

impl ManualTicker {
    /// Create a disarmed ticker at virtual time zero
    pub fn new() -> Self {
        Self::default()
    }

    /// Move virtual time forward
    pub fn advance(&mut self, by: Duration) {
        self.now += by;
    }

    /// Current virtual time
    pub fn now(&self) -> Duration {
        self.now
    }

    /// Interval of the current (or last) schedule
    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Total ticks handed out over the ticker's lifetime
    pub fn total_fired(&self) -> u64 {
        self.total_fired
    }
}

impl Ticker for ManualTicker {
    fn start(&mut self, interval: Duration) {
        self.interval = interval;
        self.armed_at = self.now;
        self.next_due = Some(self.now + interval);
        self.seq = 0;
    }

    fn stop(&mut self) {
        self.next_due = None;
    }

    fn is_armed(&self) -> bool {
        self.next_due.is_some()
    }

    fn try_next(&mut self) -> Option<Tick> {
        let due = self.next_due?;
        if due > self.now {
            return None;
        }
        self.next_due = Some(due + self.interval);
        self.seq += 1;
        self.total_fired += 1;
        Some(Tick {
            seq: self.seq,
            elapsed: due - self.armed_at,
        })
    }

    fn wait(&mut self) -> Option<Tick> {
        let due = self.next_due?;
        if due > self.now {
            self.now = due;
        }
        self.try_next()
    }
}
