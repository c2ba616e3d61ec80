//! Unix socket transport between two local device daemons.
//!
//! Each live message travels on its own connection to the peer's sync
//! socket: connect, write the JSON, shut down the write side. The shared
//! context is a JSON file the peer picks up when it next starts.

use std::path::{Path, PathBuf};

use tokio::io::AsyncWriteExt;
use tokio::net::UnixStream;
use tokio::time::{timeout, Duration};

use super::message::SyncMessage;
use super::transport::{Transport, TransportError};

/// Connection timeout in milliseconds
const CONNECT_TIMEOUT_MS: u64 = 1000;

/// Write timeout in milliseconds
const WRITE_TIMEOUT_MS: u64 = 2000;

// ============================================================================
// ContextStore
// ============================================================================

/// Latest-value store for messages that could not be delivered live.
#[derive(Debug, Clone)]
pub struct ContextStore {
    path: PathBuf,
}

impl ContextStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Replaces the stored message.
    ///
    /// Writes to a sibling temp file and renames it over the old one, so a
    /// reader never sees a half-written context.
    pub async fn save(&self, message: &SyncMessage) -> Result<(), TransportError> {
        let bytes = message.encode()?;

        if let Some(parent) = self.path.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| TransportError::ContextFailed(e.to_string()))?;
        }

        let tmp = self.path.with_extension("tmp");
        tokio::fs::write(&tmp, &bytes)
            .await
            .map_err(|e| TransportError::ContextFailed(e.to_string()))?;
        tokio::fs::rename(&tmp, &self.path)
            .await
            .map_err(|e| TransportError::ContextFailed(e.to_string()))?;

        Ok(())
    }

    /// Reads the stored message, if any.
    pub async fn load(&self) -> Result<Option<SyncMessage>, TransportError> {
        match tokio::fs::read(&self.path).await {
            Ok(bytes) => Ok(Some(SyncMessage::decode(&bytes)?)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(TransportError::ContextFailed(e.to_string())),
        }
    }

    /// Reads and removes the stored message, so it is applied at most once.
    pub async fn take(&self) -> Result<Option<SyncMessage>, TransportError> {
        let message = self.load().await;
        match tokio::fs::remove_file(&self.path).await {
            Ok(()) => {}
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => return Err(TransportError::ContextFailed(e.to_string())),
        }
        message
    }
}

// ============================================================================
// SocketTransport
// ============================================================================

/// Transport that talks to the peer daemon's sync socket.
#[derive(Debug, Clone)]
pub struct SocketTransport {
    /// Peer's sync socket
    peer_socket: PathBuf,
    /// Context store the peer reads
    context: ContextStore,
}

impl SocketTransport {
    pub fn new(peer_socket: impl Into<PathBuf>, context: ContextStore) -> Self {
        Self {
            peer_socket: peer_socket.into(),
            context,
        }
    }

    pub fn context(&self) -> &ContextStore {
        &self.context
    }
}

impl Transport for SocketTransport {
    /// The peer is considered reachable while its socket file exists; a stale
    /// file shows up as a send failure instead.
    async fn is_reachable(&self) -> bool {
        self.peer_socket.exists()
    }

    async fn send_message(&self, message: &SyncMessage) -> Result<(), TransportError> {
        let bytes = message.encode()?;

        let mut stream = timeout(
            Duration::from_millis(CONNECT_TIMEOUT_MS),
            UnixStream::connect(&self.peer_socket),
        )
        .await
        .map_err(|_| TransportError::Timeout)?
        .map_err(|e| TransportError::SendFailed(e.to_string()))?;

        timeout(Duration::from_millis(WRITE_TIMEOUT_MS), async {
            stream.write_all(&bytes).await?;
            stream.flush().await?;
            stream.shutdown().await
        })
        .await
        .map_err(|_| TransportError::Timeout)?
        .map_err(|e| TransportError::SendFailed(e.to_string()))?;

        Ok(())
    }

    async fn update_context(&self, message: &SyncMessage) -> Result<(), TransportError> {
        self.context.save(message).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::AsyncReadExt;
    use tokio::net::UnixListener;

    use crate::types::{TimerCommand, TimerSnapshot};

    fn temp_dir() -> PathBuf {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().to_path_buf();
        // Keep the directory so it's not deleted
        std::mem::forget(dir);
        path
    }

    mod context_store_tests {
        use super::*;

        #[tokio::test]
        async fn test_load_missing_is_none() {
            let store = ContextStore::new(temp_dir().join("watch.context.json"));
            assert!(store.load().await.unwrap().is_none());
            assert!(store.take().await.unwrap().is_none());
        }

        #[tokio::test]
        async fn test_save_overwrites_previous() {
            let store = ContextStore::new(temp_dir().join("nested").join("ctx.json"));

            store
                .save(&SyncMessage::command(TimerCommand::Start))
                .await
                .unwrap();
            store
                .save(&SyncMessage::timer_data(TimerSnapshot::idle()))
                .await
                .unwrap();

            let loaded = store.load().await.unwrap();
            assert_eq!(
                loaded,
                Some(SyncMessage::timer_data(TimerSnapshot::idle()))
            );
        }

        #[tokio::test]
        async fn test_take_removes_file() {
            let store = ContextStore::new(temp_dir().join("ctx.json"));
            store
                .save(&SyncMessage::timer_data(TimerSnapshot::idle()))
                .await
                .unwrap();

            assert!(store.take().await.unwrap().is_some());
            assert!(!store.path().exists());
            assert!(store.take().await.unwrap().is_none());
        }

        #[tokio::test]
        async fn test_load_corrupt_file_is_error() {
            let store = ContextStore::new(temp_dir().join("ctx.json"));
            std::fs::write(store.path(), "{broken").unwrap();

            let result = store.load().await;
            assert!(matches!(result, Err(TransportError::Sync(_))));
        }
    }

    mod socket_transport_tests {
        use super::*;

        #[tokio::test]
        async fn test_unreachable_without_socket() {
            let dir = temp_dir();
            let transport = SocketTransport::new(
                dir.join("peer.sock"),
                ContextStore::new(dir.join("peer.context.json")),
            );

            assert!(!transport.is_reachable().await);
            let result = transport
                .send_message(&SyncMessage::command(TimerCommand::Start))
                .await;
            assert!(result.is_err());
        }

        #[tokio::test]
        async fn test_send_message_delivers_json() {
            let dir = temp_dir();
            let socket = dir.join("peer.sock");
            let listener = UnixListener::bind(&socket).unwrap();
            let transport =
                SocketTransport::new(&socket, ContextStore::new(dir.join("ctx.json")));

            assert!(transport.is_reachable().await);
            transport
                .send_message(&SyncMessage::command(TimerCommand::Pause))
                .await
                .unwrap();

            let (mut stream, _) = listener.accept().await.unwrap();
            let mut buf = Vec::new();
            stream.read_to_end(&mut buf).await.unwrap();
            assert_eq!(
                SyncMessage::decode(&buf).unwrap(),
                SyncMessage::command(TimerCommand::Pause)
            );
        }

        #[tokio::test]
        async fn test_update_context_writes_store() {
            let dir = temp_dir();
            let transport = SocketTransport::new(
                dir.join("peer.sock"),
                ContextStore::new(dir.join("peer.context.json")),
            );

            transport
                .update_context(&SyncMessage::timer_data(TimerSnapshot::idle()))
                .await
                .unwrap();

            assert!(transport.context().load().await.unwrap().is_some());
        }
    }
}
