//! Cross-device synchronization.
//!
//! This module keeps a paired device's stopwatch in step with ours:
//! - `message`: the two payload shapes and their JSON encoding
//! - `transport`: the channel boundary as a trait, plus a recording mock
//! - `socket`: Unix socket transport and the shared-context file store
//! - `adapter`: snapshot projection, sending with fallback, and applying
//!   received payloads (last write wins)

pub mod adapter;
pub mod message;
pub mod socket;
pub mod transport;

pub use adapter::{Delivery, Inbound, SyncAdapter};
pub use message::{SyncError, SyncMessage};
pub use socket::{ContextStore, SocketTransport};
pub use transport::{MockTransport, Transport, TransportError};
