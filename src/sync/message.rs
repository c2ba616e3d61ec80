//! Sync payloads.
//!
//! A paired device receives one of two shapes:
//!
//! ```json
//! { "timerData": { "state": "running", "elapsedTime": 1.2, "startTime": "...", "pausedTime": 0.0 } }
//! { "command": "pause" }
//! ```

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::types::{TimerCommand, TimerSnapshot};

/// Errors encoding or decoding a sync payload.
#[derive(Debug, Error)]
pub enum SyncError {
    #[error("Failed to encode sync message: {0}")]
    Encode(#[source] serde_json::Error),

    #[error("Failed to decode sync message: {0}")]
    Decode(#[source] serde_json::Error),

    /// A snapshot whose fields contradict its state
    #[error("Invalid timer snapshot: {0}")]
    InvalidSnapshot(String),
}

/// A payload exchanged between paired devices.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SyncMessage {
    /// Full state for last-write-wins overwrite
    TimerData(TimerSnapshot),
    /// A bare command string; unknown values are ignored by the receiver
    Command(String),
}

impl SyncMessage {
    pub fn timer_data(snapshot: TimerSnapshot) -> Self {
        SyncMessage::TimerData(snapshot)
    }

    pub fn command(command: TimerCommand) -> Self {
        SyncMessage::Command(command.as_str().to_string())
    }

    /// Serializes the message to JSON bytes.
    pub fn encode(&self) -> Result<Vec<u8>, SyncError> {
        serde_json::to_vec(self).map_err(SyncError::Encode)
    }

    /// Parses JSON bytes, rejecting snapshots that break their state's invariants.
    pub fn decode(bytes: &[u8]) -> Result<Self, SyncError> {
        let message: SyncMessage = serde_json::from_slice(bytes).map_err(SyncError::Decode)?;
        if let SyncMessage::TimerData(snapshot) = &message {
            snapshot.validate().map_err(SyncError::InvalidSnapshot)?;
        }
        Ok(message)
    }

    /// Short label for logs.
    pub fn kind(&self) -> &'static str {
        match self {
            SyncMessage::TimerData(_) => "timerData",
            SyncMessage::Command(_) => "command",
        }
    }
}
