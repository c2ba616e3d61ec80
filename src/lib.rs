//! timer-sync Library
//!
//! A stopwatch whose state is mirrored between two paired devices. It
//! includes:
//! - The idle/running/paused stopwatch state machine and its async engine
//! - Snapshot and command sync with a shared-context fallback
//! - Live presentation of the running stopwatch
//! - A per-device daemon with control and sync sockets
//! - CLI command parsing, IPC client and display utilities

pub mod cli;
pub mod daemon;
pub mod live;
pub mod sync;
pub mod timer;
pub mod types;

// Re-export commonly used types for convenience
pub use types::{
    DeviceRole, IpcRequest, IpcResponse, ResponseData, StopwatchConfig, TimerCommand,
    TimerSnapshot, TimerState,
};

pub use timer::{
    format_time, Clock, ManualClock, Stopwatch, SystemClock, TimerChange, TimerEngine, TimerEvent,
};

pub use sync::{
    ContextStore, Delivery, Inbound, MockTransport, SocketTransport, SyncAdapter, SyncError,
    SyncMessage, Transport, TransportError,
};

pub use live::{
    LiveActivityManager, LiveCall, LiveContent, LiveError, LivePresenter, LogPresenter,
    MockPresenter,
};

pub use daemon::{DaemonOptions, DevicePaths, TimerDevice};
