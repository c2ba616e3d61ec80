//! Device daemon.
//!
//! This module contains the per-device process:
//! - `device`: one stopwatch wired to its peer link and live display
//! - `ipc`: control and sync socket servers
//! - `paths`: socket and context file layout
//!
//! A daemon owns exactly one device. It restores whatever its peer left in
//! the shared context, then serves the control socket (CLI) and the sync
//! socket (peer) from a single cooperative loop.

pub mod device;
pub mod ipc;
pub mod paths;

use std::sync::Arc;

use anyhow::{Context, Result};
use tokio::sync::{mpsc, Mutex};
use tracing::{debug, info, warn};

use crate::live::{LiveActivityManager, LogPresenter};
use crate::sync::{ContextStore, SocketTransport, SyncAdapter};
use crate::timer::{format_time, SystemClock, TimerChange, TimerEngine, TimerEvent};
use crate::types::{DeviceRole, StopwatchConfig};

pub use device::{LocalAction, TimerDevice};
pub use ipc::{serve_control, serve_sync, IpcError, IpcServer, RequestHandler};
pub use paths::DevicePaths;

/// Everything needed to run one device.
#[derive(Debug, Clone)]
pub struct DaemonOptions {
    pub role: DeviceRole,
    pub paths: DevicePaths,
    pub config: StopwatchConfig,
}

/// Runs a device daemon until Ctrl-C.
///
/// # Errors
///
/// Returns an error if the configuration is invalid or a socket cannot be
/// bound. Failures while serving a connection are logged and do not stop the
/// daemon.
pub async fn run(options: DaemonOptions) -> Result<()> {
    let DaemonOptions {
        role,
        paths,
        config,
    } = options;
    config.validate().map_err(anyhow::Error::msg)?;

    let peer = role.peer();
    let (event_tx, mut event_rx) = mpsc::unbounded_channel();

    let engine = TimerEngine::new(&config, Arc::new(SystemClock), event_tx);
    let transport = SocketTransport::new(
        paths.sync_socket(peer),
        ContextStore::new(paths.context_file(peer)),
    );
    let live = LiveActivityManager::new(LogPresenter::new(role, config.live_activity));
    let device = Arc::new(Mutex::new(TimerDevice::new(
        role,
        engine,
        SyncAdapter::new(transport),
        live,
    )));

    // Apply what the peer left while we were away before accepting live traffic
    let inbound = ContextStore::new(paths.context_file(role));
    if let Err(e) = device.lock().await.restore_context(&inbound).await {
        warn!("Failed to restore shared context: {}", e);
    }

    let control = IpcServer::new(&paths.control_socket(role))
        .context("制御ソケットの作成に失敗しました")?;
    let sync = IpcServer::new(&paths.sync_socket(role))
        .context("同期ソケットの作成に失敗しました")?;
    let handler = RequestHandler::new(Arc::clone(&device));

    info!(
        "{} daemon started (control: {:?}, sync: {:?})",
        role,
        control.socket_path(),
        sync.socket_path()
    );

    let shutdown = tokio::signal::ctrl_c();
    tokio::pin!(shutdown);

    loop {
        tokio::select! {
            accepted = control.accept() => match accepted {
                Ok(mut stream) => {
                    if let Err(e) = serve_control(&handler, &mut stream).await {
                        warn!("Control connection failed: {:#}", e);
                    }
                }
                Err(e) => warn!("{:#}", e),
            },
            accepted = sync.accept() => match accepted {
                Ok(mut stream) => match serve_sync(&device, &mut stream).await {
                    Ok(inbound) => debug!("Sync message applied: {:?}", inbound),
                    Err(e) => warn!("Dropped sync message: {:#}", e),
                },
                Err(e) => warn!("{:#}", e),
            },
            Some(change) = event_rx.recv() => log_change(role, &change),
            _ = &mut shutdown => {
                info!("{} daemon shutting down", role);
                break;
            }
        }
    }

    Ok(())
}

fn log_change(role: DeviceRole, change: &TimerChange) {
    let time = format_time(change.snapshot.elapsed_time);
    match change.event {
        TimerEvent::Tick => debug!("[{}] {}", role, time),
        event => info!("[{}] {:?}: {} {}", role, event, change.snapshot.state, time),
    }
}
