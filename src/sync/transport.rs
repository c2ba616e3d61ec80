//! The channel between paired devices.
//!
//! Delivery is the transport's business: the adapter only asks whether the
//! peer is reachable, hands over a live message, or falls back to the slower
//! shared-context store.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;

use thiserror::Error;

use super::message::{SyncError, SyncMessage};

/// Errors reported by a transport.
#[derive(Debug, Error)]
pub enum TransportError {
    #[error("Peer is not reachable")]
    Unreachable,

    #[error("Failed to send message: {0}")]
    SendFailed(String),

    #[error("Failed to update shared context: {0}")]
    ContextFailed(String),

    #[error("Operation timed out")]
    Timeout,

    #[error(transparent)]
    Sync(#[from] SyncError),
}

#[allow(async_fn_in_trait)]
pub trait Transport {
    /// Whether a live message is likely to reach the peer right now.
    async fn is_reachable(&self) -> bool;

    /// Sends a message for immediate delivery.
    async fn send_message(&self, message: &SyncMessage) -> Result<(), TransportError>;

    /// Replaces the best-effort shared context the peer reads later.
    async fn update_context(&self, message: &SyncMessage) -> Result<(), TransportError>;
}

// ============================================================================
// MockTransport
// ============================================================================

/// In-memory transport that records everything handed to it.
#[derive(Debug)]
pub struct MockTransport {
    sent: Mutex<Vec<SyncMessage>>,
    context: Mutex<Vec<SyncMessage>>,
    reachable: AtomicBool,
    should_fail_send: AtomicBool,
    should_fail_context: AtomicBool,
}

impl MockTransport {
    #[must_use]
    pub fn new() -> Self {
        Self {
            sent: Mutex::new(Vec::new()),
            context: Mutex::new(Vec::new()),
            reachable: AtomicBool::new(true),
            should_fail_send: AtomicBool::new(false),
            should_fail_context: AtomicBool::new(false),
        }
    }

    pub fn set_reachable(&self, reachable: bool) {
        self.reachable.store(reachable, Ordering::SeqCst);
    }

    pub fn set_should_fail_send(&self, should_fail: bool) {
        self.should_fail_send.store(should_fail, Ordering::SeqCst);
    }

    pub fn set_should_fail_context(&self, should_fail: bool) {
        self.should_fail_context.store(should_fail, Ordering::SeqCst);
    }

    /// Messages delivered live, oldest first.
    #[must_use]
    pub fn sent_messages(&self) -> Vec<SyncMessage> {
        self.sent.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }

    /// Every context update, oldest first.
    #[must_use]
    pub fn context_updates(&self) -> Vec<SyncMessage> {
        self.context.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }

    pub fn clear(&self) {
        self.sent.lock().unwrap_or_else(|e| e.into_inner()).clear();
        self.context.lock().unwrap_or_else(|e| e.into_inner()).clear();
    }
}

impl Default for MockTransport {
    fn default() -> Self {
        Self::new()
    }
}

impl Transport for MockTransport {
    async fn is_reachable(&self) -> bool {
        self.reachable.load(Ordering::SeqCst)
    }

    async fn send_message(&self, message: &SyncMessage) -> Result<(), TransportError> {
        if !self.reachable.load(Ordering::SeqCst) {
            return Err(TransportError::Unreachable);
        }
        if self.should_fail_send.load(Ordering::SeqCst) {
            return Err(TransportError::SendFailed("simulated failure".to_string()));
        }
        self.sent
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(message.clone());
        Ok(())
    }

    async fn update_context(&self, message: &SyncMessage) -> Result<(), TransportError> {
        if self.should_fail_context.load(Ordering::SeqCst) {
            return Err(TransportError::ContextFailed(
                "simulated failure".to_string(),
            ));
        }
        self.context
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(message.clone());
        Ok(())
    }
}

// Forwarding impl so a device and a test can share one transport.
impl<T: Transport> Transport for std::sync::Arc<T> {
    async fn is_reachable(&self) -> bool {
        (**self).is_reachable().await
    }

    async fn send_message(&self, message: &SyncMessage) -> Result<(), TransportError> {
        (**self).send_message(message).await
    }

    async fn update_context(&self, message: &SyncMessage) -> Result<(), TransportError> {
        (**self).update_context(message).await
    }
}
