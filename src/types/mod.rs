//! Core data types for the timer sync system.
//!
//! This module defines the data structures used for:
//! - Stopwatch state and the snapshot exchanged between devices
//! - Remote commands and device roles
//! - Stopwatch configuration with validation
//! - Control IPC request/response serialization

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::timer::format::format_time;

// ============================================================================
// TimerState
// ============================================================================

/// Lifecycle state of a stopwatch.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TimerState {
    /// Not started, or stopped
    #[default]
    Idle,
    /// Counting up from `start_time`
    Running,
    /// Frozen at `paused_time`
    Paused,
}

impl TimerState {
    /// Returns the wire representation of the state.
    pub fn as_str(&self) -> &'static str {
        match self {
            TimerState::Idle => "idle",
            TimerState::Running => "running",
            TimerState::Paused => "paused",
        }
    }

    /// Returns the label shown next to the time display.
    pub fn display_text(&self) -> &'static str {
        match self {
            TimerState::Idle => "Ready",
            TimerState::Running => "Running",
            TimerState::Paused => "Paused",
        }
    }

    /// Parses the wire representation of a state.
    pub fn from_wire(s: &str) -> Option<Self> {
        match s {
            "idle" => Some(TimerState::Idle),
            "running" => Some(TimerState::Running),
            "paused" => Some(TimerState::Paused),
            _ => None,
        }
    }
}

impl std::fmt::Display for TimerState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// TimerSnapshot
// ============================================================================

/// Longest elapsed time a snapshot may carry, in seconds (about 31 years).
pub const MAX_SNAPSHOT_SECONDS: f64 = 1e9;

/// The four observable fields of a stopwatch, as sent to a paired device.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimerSnapshot {
    /// Lifecycle state
    pub state: TimerState,
    /// Elapsed seconds at the time the snapshot was taken
    pub elapsed_time: f64,
    /// Absolute start instant, present only while running
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_time: Option<DateTime<Utc>>,
    /// Elapsed seconds frozen at the last pause
    pub paused_time: f64,
}

impl TimerSnapshot {
    /// The snapshot of a stopwatch at rest.
    pub fn idle() -> Self {
        Self {
            state: TimerState::Idle,
            elapsed_time: 0.0,
            start_time: None,
            paused_time: 0.0,
        }
    }

    /// Checks the field invariants for the snapshot's state.
    ///
    /// Returns an error message if validation fails.
    pub fn validate(&self) -> Result<(), String> {
        check_seconds("elapsedTime", self.elapsed_time)?;
        check_seconds("pausedTime", self.paused_time)?;
        match self.state {
            TimerState::Running if self.start_time.is_none() => {
                Err("running snapshot is missing startTime".to_string())
            }
            TimerState::Idle | TimerState::Paused if self.start_time.is_some() => Err(format!(
                "{} snapshot must not carry startTime",
                self.state.as_str()
            )),
            _ => Ok(()),
        }
    }
}

fn check_seconds(field: &str, value: f64) -> Result<(), String> {
    if !(0.0..=MAX_SNAPSHOT_SECONDS).contains(&value) {
        return Err(format!(
            "{} must be between 0 and {}, got {}",
            field, MAX_SNAPSHOT_SECONDS, value
        ));
    }
    Ok(())
}

impl Default for TimerSnapshot {
    fn default() -> Self {
        Self::idle()
    }
}

// ============================================================================
// TimerCommand
// ============================================================================

/// Bare commands a device can send to trigger a transition on its peer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimerCommand {
    Start,
    Pause,
    Stop,
}

impl TimerCommand {
    /// Returns the command string carried on the wire.
    pub fn as_str(&self) -> &'static str {
        match self {
            TimerCommand::Start => "start",
            TimerCommand::Pause => "pause",
            TimerCommand::Stop => "stop",
        }
    }

    /// Maps a received command string to a command.
    ///
    /// Unknown strings yield `None`; they are not an error.
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "start" => Some(TimerCommand::Start),
            "pause" => Some(TimerCommand::Pause),
            "stop" => Some(TimerCommand::Stop),
            _ => None,
        }
    }
}

impl std::fmt::Display for TimerCommand {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// DeviceRole
// ============================================================================

/// Which side of the pairing a process plays.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum DeviceRole {
    Phone,
    Watch,
}

impl DeviceRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            DeviceRole::Phone => "phone",
            DeviceRole::Watch => "watch",
        }
    }

    /// The paired device.
    pub fn peer(&self) -> Self {
        match self {
            DeviceRole::Phone => DeviceRole::Watch,
            DeviceRole::Watch => DeviceRole::Phone,
        }
    }
}

impl std::fmt::Display for DeviceRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// StopwatchConfig
// ============================================================================

/// Default display refresh cadence in milliseconds
pub const DEFAULT_TICK_INTERVAL_MS: u64 = 100;

/// Configuration for a device's stopwatch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StopwatchConfig {
    /// Display refresh cadence in milliseconds (10-1000)
    pub tick_interval_ms: u64,
    /// Whether the live presentation is enabled
    pub live_activity: bool,
}

impl Default for StopwatchConfig {
    fn default() -> Self {
        Self {
            tick_interval_ms: DEFAULT_TICK_INTERVAL_MS,
            live_activity: true,
        }
    }
}

impl StopwatchConfig {
    /// Creates a new configuration with the specified refresh cadence.
    pub fn with_tick_interval_ms(mut self, ms: u64) -> Self {
        self.tick_interval_ms = ms;
        self
    }

    /// Creates a new configuration with the live presentation toggled.
    pub fn with_live_activity(mut self, enabled: bool) -> Self {
        self.live_activity = enabled;
        self
    }

    /// Validates the configuration.
    ///
    /// Returns an error message if validation fails.
    pub fn validate(&self) -> Result<(), String> {
        if self.tick_interval_ms < 10 || self.tick_interval_ms > 1000 {
            return Err("更新間隔は10-1000ミリ秒の範囲で指定してください".to_string());
        }
        Ok(())
    }
}

// ============================================================================
// IPC Types
// ============================================================================

/// Control request from the CLI to a device daemon.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "command", rename_all = "lowercase")]
pub enum IpcRequest {
    /// Start or resume the stopwatch
    Start,
    /// Pause the running stopwatch
    Pause,
    /// Stop and reset the stopwatch
    Stop,
    /// Query the current status
    Status,
}

/// Response data for IPC responses.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResponseData {
    /// Current state
    #[serde(skip_serializing_if = "Option::is_none")]
    pub state: Option<String>,
    /// Elapsed seconds
    #[serde(skip_serializing_if = "Option::is_none")]
    pub elapsed_time: Option<f64>,
    /// Elapsed time rendered as `MM:SS.d` / `HH:MM:SS.d`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub formatted: Option<String>,
    /// Start instant while running
    #[serde(skip_serializing_if = "Option::is_none")]
    pub start_time: Option<DateTime<Utc>>,
    /// Frozen elapsed seconds while paused
    #[serde(skip_serializing_if = "Option::is_none")]
    pub paused_time: Option<f64>,
}

impl ResponseData {
    /// Creates response data from a snapshot.
    pub fn from_snapshot(snapshot: &TimerSnapshot) -> Self {
        Self {
            state: Some(snapshot.state.as_str().to_string()),
            elapsed_time: Some(snapshot.elapsed_time),
            formatted: Some(format_time(snapshot.elapsed_time)),
            start_time: snapshot.start_time,
            paused_time: Some(snapshot.paused_time),
        }
    }
}

/// IPC response from daemon to client.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IpcResponse {
    /// Response status ("success" or "error")
    pub status: String,
    /// Human-readable message
    pub message: String,
    /// Optional response data
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<ResponseData>,
}

impl IpcResponse {
    /// Creates a success response.
    pub fn success(message: impl Into<String>, data: Option<ResponseData>) -> Self {
        Self {
            status: "success".to_string(),
            message: message.into(),
            data,
        }
    }

    /// Creates an error response.
    pub fn error(message: impl Into<String>) -> Self {
        Self {
            status: "error".to_string(),
            message: message.into(),
            data: None,
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
