//! Synchronization adapter.
//!
//! Translates a stopwatch to and from [`TimerSnapshot`]s, pushes snapshots
//! and commands through a [`Transport`], and applies incoming payloads with
//! last-write-wins. Delivery failures degrade to the shared-context store
//! (snapshots) or are dropped (commands); none of them reach the stopwatch.

use tracing::{debug, warn};

use crate::timer::{Stopwatch, TimerEngine, TimerEvent};
use crate::types::{TimerCommand, TimerSnapshot, TimerState};

use super::message::SyncMessage;
use super::transport::Transport;

/// Where an outgoing message ended up.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Delivery {
    /// Sent for immediate delivery
    Live,
    /// Written to the shared-context store
    Context,
    /// Not delivered anywhere
    Dropped,
}

/// What an incoming message did to the local stopwatch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Inbound {
    /// A snapshot was applied; carries the state it left the stopwatch in
    Snapshot(TimerState),
    /// A known command was mapped to an operation
    Command {
        command: TimerCommand,
        /// `None` if the operation was a no-op in the current state
        event: Option<TimerEvent>,
    },
    /// An unknown command string
    Ignored(String),
}

// ============================================================================
// SyncAdapter
// ============================================================================

/// Bridges one device's stopwatch and the transport to its peer.
pub struct SyncAdapter<T: Transport> {
    transport: T,
}

impl<T: Transport> SyncAdapter<T> {
    pub fn new(transport: T) -> Self {
        Self { transport }
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Projects the four observable fields.
    pub fn to_snapshot(stopwatch: &Stopwatch) -> TimerSnapshot {
        stopwatch.snapshot()
    }

    /// Overwrites the engine's stopwatch from `snapshot`.
    pub async fn from_snapshot(snapshot: &TimerSnapshot, engine: &mut TimerEngine) {
        engine.apply_snapshot(snapshot).await;
    }

    /// Sends a snapshot to the peer, falling back to the shared context.
    pub async fn send_snapshot(&self, snapshot: &TimerSnapshot) -> Delivery {
        let message = SyncMessage::timer_data(snapshot.clone());

        if self.transport.is_reachable().await {
            match self.transport.send_message(&message).await {
                Ok(()) => {
                    debug!("Sent snapshot ({})", snapshot.state);
                    return Delivery::Live;
                }
                Err(e) => warn!("Failed to send snapshot, updating context: {}", e),
            }
        } else {
            debug!("Peer unreachable, updating context");
        }

        match self.transport.update_context(&message).await {
            Ok(()) => Delivery::Context,
            Err(e) => {
                warn!("Failed to update context: {}", e);
                Delivery::Dropped
            }
        }
    }

    /// Sends a bare command to the peer. Commands are never queued.
    pub async fn send_command(&self, command: TimerCommand) -> Delivery {
        if !self.transport.is_reachable().await {
            warn!("Peer unreachable, dropping command '{}'", command);
            return Delivery::Dropped;
        }

        match self
            .transport
            .send_message(&SyncMessage::command(command))
            .await
        {
            Ok(()) => {
                debug!("Sent command '{}'", command);
                Delivery::Live
            }
            Err(e) => {
                warn!("Failed to send command '{}': {}", command, e);
                Delivery::Dropped
            }
        }
    }

    /// Applies a payload received from the peer or read from the context.
    pub async fn handle_message(&self, message: SyncMessage, engine: &mut TimerEngine) -> Inbound {
        match message {
            SyncMessage::TimerData(snapshot) => {
                Self::from_snapshot(&snapshot, engine).await;
                debug!("Applied snapshot ({})", snapshot.state);
                Inbound::Snapshot(snapshot.state)
            }
            SyncMessage::Command(raw) => match TimerCommand::parse(&raw) {
                Some(command) => {
                    let event = match command {
                        TimerCommand::Start => engine.start().await,
                        TimerCommand::Pause => engine.pause().await,
                        TimerCommand::Stop => Some(engine.stop().await),
                    };
                    debug!("Applied command '{}' ({:?})", command, event);
                    Inbound::Command { command, event }
                }
                None => {
                    debug!("Ignoring unknown command '{}'", raw);
                    Inbound::Ignored(raw)
                }
            },
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
