//! The stopwatch state machine.
//!
//! Three states and four operations:
//! - `start`: idle → running (fresh) or paused → running (resume)
//! - `pause`: running → paused, freezing the elapsed time
//! - `stop`: any → idle, zeroing everything
//! - `apply_snapshot`: overwrite every field from a paired device
//!
//! Elapsed time while running is always `now - start_time`; periodic
//! refreshes recompute it and never accumulate, so the display cannot drift.
//! Every operation is total: calls that make no sense in the current state
//! are no-ops.

use std::fmt;
use std::sync::Arc;

use chrono::{DateTime, Utc};

use crate::types::{TimerSnapshot, TimerState};

use super::clock::{offset_by_seconds, seconds_between, Clock, SystemClock};

// ============================================================================
// TimerEvent / TimerChange
// ============================================================================

/// What caused a stopwatch mutation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimerEvent {
    /// Fresh start from idle
    Started,
    /// Resumed from paused
    Resumed,
    Paused,
    Stopped,
    /// Fields overwritten from a paired device
    Synced,
    /// Periodic display refresh
    Tick,
}

/// A mutation and the fields as they are after it.
#[derive(Debug, Clone, PartialEq)]
pub struct TimerChange {
    pub event: TimerEvent,
    pub snapshot: TimerSnapshot,
}

/// Callback invoked after every field mutation.
pub type TimerListener = Box<dyn Fn(&TimerChange) + Send + Sync>;

// ============================================================================
// Stopwatch
// ============================================================================

/// A single device's stopwatch.
pub struct Stopwatch {
    state: TimerState,
    elapsed_time: f64,
    start_time: Option<DateTime<Utc>>,
    paused_time: f64,
    clock: Arc<dyn Clock>,
    listeners: Vec<TimerListener>,
}

impl Stopwatch {
    /// Creates an idle stopwatch reading time from `clock`.
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self {
            state: TimerState::Idle,
            elapsed_time: 0.0,
            start_time: None,
            paused_time: 0.0,
            clock,
            listeners: Vec::new(),
        }
    }

    /// Registers a listener called after every mutation.
    pub fn subscribe(&mut self, listener: TimerListener) {
        self.listeners.push(listener);
    }

    /// Starts or resumes the stopwatch.
    ///
    /// Returns the resulting event, or `None` if it was already running.
    pub fn start(&mut self) -> Option<TimerEvent> {
        let now = self.clock.now();
        let event = match self.state {
            TimerState::Running => return None,
            TimerState::Paused => {
                self.start_time = Some(offset_by_seconds(now, -self.paused_time));
                TimerEvent::Resumed
            }
            TimerState::Idle => {
                self.start_time = Some(now);
                self.elapsed_time = 0.0;
                self.paused_time = 0.0;
                TimerEvent::Started
            }
        };

        self.state = TimerState::Running;
        self.recompute_elapsed(now);
        self.notify(event);
        Some(event)
    }

    /// Pauses a running stopwatch, freezing the elapsed time.
    ///
    /// Returns `None` (and changes nothing) unless running.
    pub fn pause(&mut self) -> Option<TimerEvent> {
        if self.state != TimerState::Running {
            return None;
        }

        let now = self.clock.now();
        self.recompute_elapsed(now);
        self.paused_time = self.elapsed_time;
        self.start_time = None;
        self.state = TimerState::Paused;
        self.notify(TimerEvent::Paused);
        Some(TimerEvent::Paused)
    }

    /// Resets to idle from any state.
    pub fn stop(&mut self) -> TimerEvent {
        self.state = TimerState::Idle;
        self.elapsed_time = 0.0;
        self.start_time = None;
        self.paused_time = 0.0;
        self.notify(TimerEvent::Stopped);
        TimerEvent::Stopped
    }

    /// Overwrites every field from `snapshot`, last write wins.
    pub fn apply_snapshot(&mut self, snapshot: &TimerSnapshot) {
        self.state = snapshot.state;
        self.elapsed_time = snapshot.elapsed_time;
        self.start_time = snapshot.start_time;
        self.paused_time = snapshot.paused_time;
        self.notify(TimerEvent::Synced);
    }

    /// Recomputes the displayed elapsed time while running.
    ///
    /// Returns the current elapsed time; a no-op unless running.
    pub fn refresh(&mut self) -> f64 {
        if self.state == TimerState::Running {
            let now = self.clock.now();
            self.recompute_elapsed(now);
            self.notify(TimerEvent::Tick);
        }
        self.elapsed_time
    }

    /// Projects the four observable fields.
    pub fn snapshot(&self) -> TimerSnapshot {
        TimerSnapshot {
            state: self.state,
            elapsed_time: self.elapsed_time,
            start_time: self.start_time,
            paused_time: self.paused_time,
        }
    }

    pub fn state(&self) -> TimerState {
        self.state
    }

    /// Elapsed seconds as of the last start, pause, sync or refresh.
    pub fn elapsed_time(&self) -> f64 {
        self.elapsed_time
    }

    pub fn start_time(&self) -> Option<DateTime<Utc>> {
        self.start_time
    }

    pub fn paused_time(&self) -> f64 {
        self.paused_time
    }

    pub fn is_running(&self) -> bool {
        self.state == TimerState::Running
    }

    fn recompute_elapsed(&mut self, now: DateTime<Utc>) {
        if let Some(start) = self.start_time {
            self.elapsed_time = seconds_between(start, now);
        }
    }

    fn notify(&self, event: TimerEvent) {
        if self.listeners.is_empty() {
            return;
        }
        let change = TimerChange {
            event,
            snapshot: self.snapshot(),
        };
        for listener in &self.listeners {
            listener(&change);
        }
    }
}

impl Default for Stopwatch {
    fn default() -> Self {
        Self::new(Arc::new(SystemClock))
    }
}

impl fmt::Debug for Stopwatch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Stopwatch")
            .field("state", &self.state)
            .field("elapsed_time", &self.elapsed_time)
            .field("start_time", &self.start_time)
            .field("paused_time", &self.paused_time)
            .field("listeners", &self.listeners.len())
            .finish()
    }
}

// ============================================================================
// Tests
// ============================================================================
