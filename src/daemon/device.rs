//! One paired device: a stopwatch, its link to the peer, and its live display.

use tracing::{debug, info};

use crate::live::{LiveActivityManager, LiveContent, LivePresenter};
use crate::sync::{
    ContextStore, Delivery, Inbound, SyncAdapter, SyncMessage, Transport, TransportError,
};
use crate::timer::{TimerEngine, TimerEvent};
use crate::types::{DeviceRole, TimerCommand, TimerSnapshot, TimerState};

/// Result of a locally triggered operation.
#[derive(Debug, Clone, PartialEq)]
pub struct LocalAction {
    /// `None` if the operation was a no-op in the current state
    pub event: Option<TimerEvent>,
    /// Fields after the operation
    pub snapshot: TimerSnapshot,
    /// Where the snapshot went
    pub delivery: Delivery,
}

impl LocalAction {
    pub fn changed(&self) -> bool {
        self.event.is_some()
    }
}

/// A device wired from its parts.
pub struct TimerDevice<T: Transport, P: LivePresenter> {
    role: DeviceRole,
    engine: TimerEngine,
    adapter: SyncAdapter<T>,
    live: LiveActivityManager<P>,
}

impl<T: Transport, P: LivePresenter> TimerDevice<T, P> {
    pub fn new(
        role: DeviceRole,
        engine: TimerEngine,
        adapter: SyncAdapter<T>,
        live: LiveActivityManager<P>,
    ) -> Self {
        Self {
            role,
            engine,
            adapter,
            live,
        }
    }

    pub fn role(&self) -> DeviceRole {
        self.role
    }

    pub fn engine(&self) -> &TimerEngine {
        &self.engine
    }

    pub fn adapter(&self) -> &SyncAdapter<T> {
        &self.adapter
    }

    pub fn live(&self) -> &LiveActivityManager<P> {
        &self.live
    }

    pub async fn snapshot(&self) -> TimerSnapshot {
        self.engine.snapshot().await
    }

    // ------------------------------------------------------------------------
    // Local actions
    // ------------------------------------------------------------------------

    /// Starts or resumes locally and tells the peer.
    pub async fn start(&mut self) -> LocalAction {
        let event = self.engine.start().await;
        let action = self.publish(event, TimerCommand::Start).await;
        if action.changed() {
            self.live
                .start_activity(&LiveContent::from_snapshot(&action.snapshot));
        }
        action
    }

    /// Pauses locally and tells the peer.
    pub async fn pause(&mut self) -> LocalAction {
        let event = self.engine.pause().await;
        let action = self.publish(event, TimerCommand::Pause).await;
        if action.changed() {
            self.live
                .update_activity(&LiveContent::from_snapshot(&action.snapshot));
        }
        action
    }

    /// Resets locally and tells the peer.
    pub async fn stop(&mut self) -> LocalAction {
        let event = Some(self.engine.stop().await);
        let action = self.publish(event, TimerCommand::Stop).await;
        self.live.end_activity();
        action
    }

    /// Sends the current snapshot, then the command that produced it.
    async fn publish(&self, event: Option<TimerEvent>, command: TimerCommand) -> LocalAction {
        let snapshot = self.engine.snapshot().await;
        info!("[{}] {} -> {}", self.role, command, snapshot.state);

        let delivery = self.adapter.send_snapshot(&snapshot).await;
        self.adapter.send_command(command).await;

        LocalAction {
            event,
            snapshot,
            delivery,
        }
    }

    // ------------------------------------------------------------------------
    // Remote payloads
    // ------------------------------------------------------------------------

    /// Applies a payload from the peer. Never sends anything back.
    pub async fn handle_message(&mut self, message: SyncMessage) -> Inbound {
        let inbound = self.adapter.handle_message(message, &mut self.engine).await;
        let content = LiveContent::from_snapshot(&self.engine.snapshot().await);

        match &inbound {
            Inbound::Snapshot(TimerState::Idle) => self.live.end_activity(),
            Inbound::Snapshot(_) => self.live.update_activity(&content),
            Inbound::Command {
                command: TimerCommand::Start,
                event: Some(_),
            } => self.live.start_activity(&content),
            Inbound::Command {
                command: TimerCommand::Pause,
                event: Some(_),
            } => self.live.update_activity(&content),
            Inbound::Command {
                command: TimerCommand::Stop,
                ..
            } => self.live.end_activity(),
            Inbound::Command { .. } | Inbound::Ignored(_) => {}
        }

        debug!("[{}] received {:?}", self.role, inbound);
        inbound
    }

    /// Applies and clears whatever the peer left in the shared context.
    pub async fn restore_context(
        &mut self,
        store: &ContextStore,
    ) -> Result<Option<Inbound>, TransportError> {
        match store.take().await? {
            Some(message) => {
                info!("[{}] Restoring shared context ({})", self.role, message.kind());
                Ok(Some(self.handle_message(message).await))
            }
            None => Ok(None),
        }
    }
}
