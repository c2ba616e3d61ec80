//! IPC servers for a device daemon.
//!
//! This module provides Unix Domain Socket IPC functionality:
//! - Server that listens on a Unix socket (used for both control and sync)
//! - Control request/response handling for CLI commands
//! - Sync message intake from the paired device

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{UnixListener, UnixStream};
use tokio::sync::Mutex;
use tokio::time::{timeout, Duration};

use crate::live::LivePresenter;
use crate::sync::{Delivery, Inbound, SyncMessage, Transport};
use crate::timer::TimerEvent;
use crate::types::{IpcRequest, IpcResponse, ResponseData};

use super::device::{LocalAction, TimerDevice};

// ============================================================================
// Constants
// ============================================================================

/// Maximum request size in bytes (4KB)
const MAX_REQUEST_SIZE: usize = 4096;

/// Read timeout in seconds
const READ_TIMEOUT_SECS: u64 = 5;

// ============================================================================
// IpcError
// ============================================================================

/// IPC-specific error types.
#[derive(Debug, thiserror::Error)]
pub enum IpcError {
    /// Connection error
    #[error("Connection error: {0}")]
    ConnectionError(String),

    /// Read error
    #[error("Failed to read request: {0}")]
    ReadError(String),

    /// Timeout error
    #[error("Operation timed out")]
    Timeout,

    /// Request too large
    #[error("Request too large (max {MAX_REQUEST_SIZE} bytes)")]
    RequestTooLarge,
}

// ============================================================================
// IpcServer
// ============================================================================

/// Unix Domain Socket IPC server.
pub struct IpcServer {
    /// Unix socket listener
    listener: UnixListener,
    /// Socket path (for cleanup)
    socket_path: PathBuf,
}

impl IpcServer {
    /// Creates a new IPC server bound to the specified socket path.
    ///
    /// If the socket file already exists, it will be removed before binding.
    ///
    /// # Errors
    ///
    /// Returns an error if the socket cannot be bound.
    pub fn new(socket_path: &Path) -> Result<Self> {
        // Remove existing socket file if present
        if socket_path.exists() {
            std::fs::remove_file(socket_path)
                .with_context(|| format!("Failed to remove existing socket: {:?}", socket_path))?;
        }

        // Ensure parent directory exists
        if let Some(parent) = socket_path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create socket directory: {:?}", parent))?;
        }

        let listener = UnixListener::bind(socket_path)
            .with_context(|| format!("Failed to bind Unix socket: {:?}", socket_path))?;

        Ok(Self {
            listener,
            socket_path: socket_path.to_path_buf(),
        })
    }

    /// Accepts an incoming connection.
    ///
    /// # Errors
    ///
    /// Returns an error if the connection cannot be accepted.
    pub async fn accept(&self) -> Result<UnixStream> {
        let (stream, _addr) = self
            .listener
            .accept()
            .await
            .context("Failed to accept connection")?;
        Ok(stream)
    }

    /// Reads one frame: everything the peer writes before shutting down its
    /// write side.
    ///
    /// # Errors
    ///
    /// Returns an error on timeout, an empty frame, or more than 4KB.
    pub async fn read_frame(stream: &mut UnixStream) -> Result<Vec<u8>, IpcError> {
        let mut buffer = Vec::with_capacity(1024);
        let mut limited = stream.take(MAX_REQUEST_SIZE as u64 + 1);

        match timeout(
            Duration::from_secs(READ_TIMEOUT_SECS),
            limited.read_to_end(&mut buffer),
        )
        .await
        {
            Ok(Ok(_)) => {}
            Ok(Err(e)) => return Err(IpcError::ReadError(e.to_string())),
            Err(_) => return Err(IpcError::Timeout),
        }

        if buffer.is_empty() {
            return Err(IpcError::ConnectionError(
                "Connection closed by client".to_string(),
            ));
        }
        if buffer.len() > MAX_REQUEST_SIZE {
            return Err(IpcError::RequestTooLarge);
        }

        Ok(buffer)
    }

    /// Receives and deserializes a control request from the stream.
    ///
    /// # Errors
    ///
    /// Returns an error if reading or deserialization fails.
    pub async fn receive_request(stream: &mut UnixStream) -> Result<IpcRequest> {
        let buffer = Self::read_frame(stream).await?;
        let request: IpcRequest = serde_json::from_slice(&buffer)
            .with_context(|| "Failed to deserialize IPC request")?;
        Ok(request)
    }

    /// Receives and decodes a sync message from the stream.
    ///
    /// # Errors
    ///
    /// Returns an error if reading fails or the payload is not a valid
    /// sync message.
    pub async fn receive_message(stream: &mut UnixStream) -> Result<SyncMessage> {
        let buffer = Self::read_frame(stream).await?;
        let message = SyncMessage::decode(&buffer)?;
        Ok(message)
    }

    /// Serializes and sends an IPC response to the stream.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization or writing fails.
    pub async fn send_response(stream: &mut UnixStream, response: &IpcResponse) -> Result<()> {
        let json = serde_json::to_vec(response).context("Failed to serialize IPC response")?;

        stream
            .write_all(&json)
            .await
            .context("Failed to write response")?;
        stream.flush().await.context("Failed to flush response")?;

        Ok(())
    }

    /// Returns the socket path.
    pub fn socket_path(&self) -> &Path {
        &self.socket_path
    }
}

impl Drop for IpcServer {
    fn drop(&mut self) {
        // Clean up socket file on drop
        let _ = std::fs::remove_file(&self.socket_path);
    }
}

// ============================================================================
// RequestHandler
// ============================================================================

/// Handles control requests by dispatching to a device.
pub struct RequestHandler<T: Transport, P: LivePresenter> {
    /// Shared reference to the device
    device: Arc<Mutex<TimerDevice<T, P>>>,
}

impl<T: Transport, P: LivePresenter> RequestHandler<T, P> {
    /// Creates a new request handler for the given device.
    pub fn new(device: Arc<Mutex<TimerDevice<T, P>>>) -> Self {
        Self { device }
    }

    /// Handles a control request and returns the appropriate response.
    ///
    /// Every operation is total, so the response is always a success; the
    /// message says whether anything changed.
    pub async fn handle(&self, request: IpcRequest) -> IpcResponse {
        let mut device = self.device.lock().await;

        match request {
            IpcRequest::Start => {
                let action = device.start().await;
                let message = match action.event {
                    Some(TimerEvent::Resumed) => "タイマーを再開しました",
                    Some(_) => "タイマーを開始しました",
                    None => "タイマーは既に実行中です",
                };
                Self::action_response(message, &action)
            }
            IpcRequest::Pause => {
                let action = device.pause().await;
                let message = if action.changed() {
                    "タイマーを一時停止しました"
                } else {
                    "タイマーは実行されていません"
                };
                Self::action_response(message, &action)
            }
            IpcRequest::Stop => {
                let action = device.stop().await;
                Self::action_response("タイマーを停止しました", &action)
            }
            IpcRequest::Status => {
                let snapshot = device.snapshot().await;
                IpcResponse::success("", Some(ResponseData::from_snapshot(&snapshot)))
            }
        }
    }

    fn action_response(message: &str, action: &LocalAction) -> IpcResponse {
        let message = match action.delivery {
            Delivery::Live => message.to_string(),
            Delivery::Context => format!("{}（ペアデバイスには後で同期されます）", message),
            Delivery::Dropped => format!("{}（ペアデバイスへの同期に失敗しました）", message),
        };
        IpcResponse::success(message, Some(ResponseData::from_snapshot(&action.snapshot)))
    }
}

// ============================================================================
// Connection handling
// ============================================================================

/// Serves one control connection: read a request, write the response.
///
/// # Errors
///
/// Returns an error if the response cannot be written.
pub async fn serve_control<T: Transport, P: LivePresenter>(
    handler: &RequestHandler<T, P>,
    stream: &mut UnixStream,
) -> Result<()> {
    let response = match IpcServer::receive_request(stream).await {
        Ok(request) => handler.handle(request).await,
        Err(e) => {
            tracing::warn!("Invalid control request: {:#}", e);
            IpcResponse::error(format!("無効なリクエストです: {}", e))
        }
    };
    IpcServer::send_response(stream, &response).await
}

/// Serves one sync connection from the paired device.
///
/// # Errors
///
/// Returns an error if the message cannot be read or decoded; the device is
/// left untouched in that case.
pub async fn serve_sync<T: Transport, P: LivePresenter>(
    device: &Arc<Mutex<TimerDevice<T, P>>>,
    stream: &mut UnixStream,
) -> Result<Inbound> {
    let message = IpcServer::receive_message(stream).await?;
    let inbound = device.lock().await.handle_message(message).await;
    Ok(inbound)
}

// ============================================================================
// Tests
// ============================================================================
