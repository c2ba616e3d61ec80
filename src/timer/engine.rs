//! Timer engine for a device's stopwatch.
//!
//! This module drives a [`Stopwatch`] from async code:
//! - Owns the single periodic refresh task (display tick)
//! - Replaces the tick task on every transition into `running`
//! - Forwards every stopwatch change on an mpsc channel

use std::sync::Arc;

use tokio::sync::{mpsc, Mutex};
use tokio::task::JoinHandle;
use tokio::time::{interval, Duration, MissedTickBehavior};

use crate::types::{StopwatchConfig, TimerSnapshot};

use super::clock::Clock;
use super::stopwatch::{Stopwatch, TimerChange, TimerEvent};

// ============================================================================
// TimerEngine
// ============================================================================

/// Drives a stopwatch and its display refresh.
pub struct TimerEngine {
    /// Stopwatch shared with the tick task
    stopwatch: Arc<Mutex<Stopwatch>>,
    /// Handle of the running tick task, if any
    ticker: Option<JoinHandle<()>>,
    /// Refresh cadence
    tick_interval: Duration,
}

impl TimerEngine {
    /// Creates a new engine with an idle stopwatch.
    ///
    /// Every stopwatch change, ticks included, is sent on `event_tx`.
    pub fn new(
        config: &StopwatchConfig,
        clock: Arc<dyn Clock>,
        event_tx: mpsc::UnboundedSender<TimerChange>,
    ) -> Self {
        let mut stopwatch = Stopwatch::new(clock);
        stopwatch.subscribe(Box::new(move |change| {
            // The receiver going away only means nobody is watching
            let _ = event_tx.send(change.clone());
        }));

        Self {
            stopwatch: Arc::new(Mutex::new(stopwatch)),
            ticker: None,
            tick_interval: Duration::from_millis(config.tick_interval_ms),
        }
    }

    /// Starts or resumes the stopwatch.
    pub async fn start(&mut self) -> Option<TimerEvent> {
        let event = self.stopwatch.lock().await.start();
        if event.is_some() {
            self.restart_ticker();
        }
        event
    }

    /// Pauses the stopwatch if running.
    pub async fn pause(&mut self) -> Option<TimerEvent> {
        let event = self.stopwatch.lock().await.pause();
        if event.is_some() {
            self.stop_ticker();
        }
        event
    }

    /// Resets the stopwatch to idle.
    pub async fn stop(&mut self) -> TimerEvent {
        self.stop_ticker();
        self.stopwatch.lock().await.stop()
    }

    /// Overwrites the stopwatch from a paired device's snapshot.
    pub async fn apply_snapshot(&mut self, snapshot: &TimerSnapshot) {
        self.stop_ticker();

        let running = {
            let mut stopwatch = self.stopwatch.lock().await;
            stopwatch.apply_snapshot(snapshot);
            stopwatch.is_running()
        };

        if running {
            self.restart_ticker();
        }
    }

    /// Returns the current four fields.
    pub async fn snapshot(&self) -> TimerSnapshot {
        self.stopwatch.lock().await.snapshot()
    }

    /// Returns true while a tick task is alive.
    pub fn is_ticking(&self) -> bool {
        self.ticker.as_ref().is_some_and(|handle| !handle.is_finished())
    }

    /// Returns the shared stopwatch.
    pub fn stopwatch(&self) -> Arc<Mutex<Stopwatch>> {
        Arc::clone(&self.stopwatch)
    }

    /// Replaces any existing tick task with a fresh one.
    fn restart_ticker(&mut self) {
        self.stop_ticker();

        let stopwatch = Arc::clone(&self.stopwatch);
        let period = self.tick_interval;

        self.ticker = Some(tokio::spawn(async move {
            let mut ticker = interval(period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
            // The first tick completes immediately
            ticker.tick().await;

            loop {
                ticker.tick().await;

                let mut stopwatch = stopwatch.lock().await;
                if !stopwatch.is_running() {
                    break;
                }
                stopwatch.refresh();
            }
        }));
    }

    fn stop_ticker(&mut self) {
        if let Some(handle) = self.ticker.take() {
            handle.abort();
        }
    }
}

impl Drop for TimerEngine {
    fn drop(&mut self) {
        self.stop_ticker();
    }
}

// ============================================================================
// Tests
// ============================================================================
