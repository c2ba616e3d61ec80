//! Integration tests for Daemon-CLI IPC communication.
//!
//! These tests drive a device through its control socket with the real
//! CLI client:
//! - Start, pause, resume and stop via IPC
//! - Status query via IPC
//! - Connection error handling

use std::path::PathBuf;
use std::sync::Arc;

use tokio::sync::{mpsc, Mutex};
use tokio::task::JoinHandle;
use tokio::time::{timeout, Duration};

use timer_sync::cli::client::IpcClient;
use timer_sync::daemon::ipc::{serve_control, IpcServer, RequestHandler};
use timer_sync::daemon::TimerDevice;
use timer_sync::live::{LiveActivityManager, LiveCall, LivePresenter, MockPresenter};
use timer_sync::sync::{MockTransport, SyncAdapter, SyncMessage, Transport};
use timer_sync::timer::{ManualClock, TimerEngine};
use timer_sync::types::{DeviceRole, IpcResponse, StopwatchConfig, TimerCommand};

// ============================================================================
// Test Helpers
// ============================================================================

type MockDevice = TimerDevice<Arc<MockTransport>, Arc<MockPresenter>>;

struct Fixture {
    socket_path: PathBuf,
    server: IpcServer,
    handler: RequestHandler<Arc<MockTransport>, Arc<MockPresenter>>,
    clock: Arc<ManualClock>,
    transport: Arc<MockTransport>,
    presenter: Arc<MockPresenter>,
}

/// Creates a temporary socket path for testing.
fn create_temp_socket_path() -> PathBuf {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("integration_test.sock");
    // Keep the directory so it's not deleted
    std::mem::forget(dir);
    path
}

fn create_fixture() -> Fixture {
    let socket_path = create_temp_socket_path();
    let (tx, _rx) = mpsc::unbounded_channel();
    let clock = Arc::new(ManualClock::default());
    let transport = Arc::new(MockTransport::new());
    let presenter = Arc::new(MockPresenter::new());

    let engine = TimerEngine::new(&StopwatchConfig::default(), clock.clone(), tx);
    let device: MockDevice = TimerDevice::new(
        DeviceRole::Phone,
        engine,
        SyncAdapter::new(transport.clone()),
        LiveActivityManager::new(presenter.clone()),
    );

    Fixture {
        server: IpcServer::new(&socket_path).unwrap(),
        socket_path,
        handler: RequestHandler::new(Arc::new(Mutex::new(device))),
        clock,
        transport,
        presenter,
    }
}

/// Runs a single request-response cycle on the server.
async fn handle_single_request<T: Transport, P: LivePresenter>(
    server: &IpcServer,
    handler: &RequestHandler<T, P>,
) {
    let mut stream = server.accept().await.unwrap();
    serve_control(handler, &mut stream).await.unwrap();
}

/// Sends one request from a background client task.
fn spawn_client<F, Fut>(socket_path: &PathBuf, call: F) -> JoinHandle<anyhow::Result<IpcResponse>>
where
    F: FnOnce(IpcClient) -> Fut + Send + 'static,
    Fut: std::future::Future<Output = anyhow::Result<IpcResponse>> + Send + 'static,
{
    let client = IpcClient::with_socket_path(socket_path.clone());
    tokio::spawn(async move { call(client).await })
}

async fn round_trip<F, Fut>(fixture: &Fixture, call: F) -> IpcResponse
where
    F: FnOnce(IpcClient) -> Fut + Send + 'static,
    Fut: std::future::Future<Output = anyhow::Result<IpcResponse>> + Send + 'static,
{
    let client = spawn_client(&fixture.socket_path, call);
    handle_single_request(&fixture.server, &fixture.handler).await;
    client.await.unwrap().unwrap()
}

// ============================================================================
// Control via IPC
// ============================================================================

#[tokio::test]
async fn test_start_via_ipc() {
    let fixture = create_fixture();

    let response = round_trip(&fixture, |client| async move { client.start().await }).await;

    assert_eq!(response.status, "success");
    assert_eq!(response.message, "タイマーを開始しました");
    let data = response.data.expect("Response should contain data");
    assert_eq!(data.state, Some("running".to_string()));
    assert!(data.start_time.is_some());

    // Snapshot first, then the command
    let sent = fixture.transport.sent_messages();
    assert_eq!(sent.len(), 2);
    assert!(matches!(sent[0], SyncMessage::TimerData(_)));
    assert_eq!(sent[1], SyncMessage::command(TimerCommand::Start));

    assert!(matches!(fixture.presenter.calls().as_slice(), [LiveCall::Start(_)]));
}

#[tokio::test]
async fn test_pause_resume_stop_via_ipc() {
    let fixture = create_fixture();

    round_trip(&fixture, |client| async move { client.start().await }).await;
    fixture.clock.advance(5.0);

    let response = round_trip(&fixture, |client| async move { client.pause().await }).await;
    let data = response.data.unwrap();
    assert_eq!(data.state, Some("paused".to_string()));
    assert_eq!(data.paused_time, Some(5.0));
    assert_eq!(data.formatted, Some("00:05.0".to_string()));

    fixture.clock.advance(60.0);
    let response = round_trip(&fixture, |client| async move { client.start().await }).await;
    assert_eq!(response.message, "タイマーを再開しました");
    assert_eq!(response.data.unwrap().elapsed_time, Some(5.0));

    let response = round_trip(&fixture, |client| async move { client.stop().await }).await;
    let data = response.data.unwrap();
    assert_eq!(data.state, Some("idle".to_string()));
    assert_eq!(data.elapsed_time, Some(0.0));
    assert!(data.start_time.is_none());
}

#[tokio::test]
async fn test_status_via_ipc() {
    let fixture = create_fixture();

    round_trip(&fixture, |client| async move { client.start().await }).await;
    fixture.clock.advance(3661.2);
    fixture.transport.clear();

    // Let the display tick pick up the new time
    tokio::time::sleep(Duration::from_millis(250)).await;

    let response = round_trip(&fixture, |client| async move { client.status().await }).await;

    let data = response.data.unwrap();
    assert_eq!(data.state, Some("running".to_string()));
    assert_eq!(data.formatted, Some("01:01:01.2".to_string()));
    assert!(fixture.transport.sent_messages().is_empty());
}

#[tokio::test]
async fn test_start_with_unreachable_peer() {
    let fixture = create_fixture();
    fixture.transport.set_reachable(false);

    let response = round_trip(&fixture, |client| async move { client.start().await }).await;

    assert_eq!(response.status, "success");
    assert!(response.message.contains("後で同期"));
    assert_eq!(fixture.transport.context_updates().len(), 1);
    assert!(fixture.transport.sent_messages().is_empty());
}

// ============================================================================
// Connection errors
// ============================================================================

#[tokio::test]
async fn test_connection_error_without_daemon() {
    let socket_path = create_temp_socket_path();
    let client = IpcClient::with_socket_path(socket_path);

    let result = timeout(Duration::from_secs(10), client.status())
        .await
        .expect("Client should give up after its retries");

    let error = result.unwrap_err();
    assert!(
        format!("{:#}", error).contains("Daemonに接続できません"),
        "Unexpected error: {:#}",
        error
    );
}
