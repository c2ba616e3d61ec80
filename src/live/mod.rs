//! Live presentation of a running stopwatch.
//!
//! A device mirrors its stopwatch onto a glanceable display (a lock-screen
//! activity on real hardware). The stopwatch works the same whether or not a
//! presenter is present or enabled: presenter failures are logged and
//! swallowed by [`LiveActivityManager`].

pub mod error;

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::timer::format_time;
use crate::types::{DeviceRole, TimerSnapshot, TimerState};

pub use self::error::LiveError;

/// What the live display shows.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LiveContent {
    pub elapsed_time: f64,
    pub state: TimerState,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_time: Option<DateTime<Utc>>,
}

impl LiveContent {
    pub fn from_snapshot(snapshot: &TimerSnapshot) -> Self {
        Self {
            elapsed_time: snapshot.elapsed_time,
            state: snapshot.state,
            start_time: snapshot.start_time,
        }
    }
}

/// A display that can mirror one stopwatch at a time.
pub trait LivePresenter {
    /// Whether the user allows live presentation.
    fn is_enabled(&self) -> bool;

    fn start(&self, content: &LiveContent) -> Result<(), LiveError>;

    fn update(&self, content: &LiveContent) -> Result<(), LiveError>;

    fn end(&self) -> Result<(), LiveError>;
}

impl<P: LivePresenter> LivePresenter for Arc<P> {
    fn is_enabled(&self) -> bool {
        (**self).is_enabled()
    }

    fn start(&self, content: &LiveContent) -> Result<(), LiveError> {
        (**self).start(content)
    }

    fn update(&self, content: &LiveContent) -> Result<(), LiveError> {
        (**self).update(content)
    }

    fn end(&self) -> Result<(), LiveError> {
        (**self).end()
    }
}

// ============================================================================
// LiveActivityManager
// ============================================================================

/// Tracks the current live activity and drives a presenter.
#[derive(Debug)]
pub struct LiveActivityManager<P: LivePresenter> {
    presenter: P,
    active: bool,
}

impl<P: LivePresenter> LiveActivityManager<P> {
    pub fn new(presenter: P) -> Self {
        Self {
            presenter,
            active: false,
        }
    }

    /// Returns true while an activity is current.
    pub fn is_active(&self) -> bool {
        self.active
    }

    /// Starts a new activity, ending the current one first.
    ///
    /// Declines without error when the presenter is disabled.
    pub fn start_activity(&mut self, content: &LiveContent) {
        if !self.presenter.is_enabled() {
            debug!("Live presentation disabled, not starting");
            return;
        }

        if self.active {
            self.end_activity();
        }

        match self.presenter.start(content) {
            Ok(()) => self.active = true,
            Err(e) if e.is_disabled() => debug!("Live presentation disabled, not starting"),
            Err(e) => warn!("Failed to start live activity: {}", e),
        }
    }

    /// Pushes new content to the current activity, if any.
    pub fn update_activity(&mut self, content: &LiveContent) {
        if !self.active {
            return;
        }
        if let Err(e) = self.presenter.update(content) {
            warn!("Failed to update live activity: {}", e);
        }
    }

    /// Ends the current activity, if any.
    pub fn end_activity(&mut self) {
        if !self.active {
            return;
        }
        self.active = false;
        if let Err(e) = self.presenter.end() {
            warn!("Failed to end live activity: {}", e);
        }
    }
}

// ============================================================================
// LogPresenter
// ============================================================================

/// Presenter that renders the live display into the log.
#[derive(Debug, Clone)]
pub struct LogPresenter {
    role: DeviceRole,
    enabled: bool,
}

impl LogPresenter {
    pub fn new(role: DeviceRole, enabled: bool) -> Self {
        Self { role, enabled }
    }
}

impl LivePresenter for LogPresenter {
    fn is_enabled(&self) -> bool {
        self.enabled
    }

    fn start(&self, content: &LiveContent) -> Result<(), LiveError> {
        if !self.enabled {
            return Err(LiveError::NotEnabled);
        }
        info!(
            "[{}] ▶ {} {}",
            self.role,
            content.state.display_text(),
            format_time(content.elapsed_time)
        );
        Ok(())
    }

    fn update(&self, content: &LiveContent) -> Result<(), LiveError> {
        if !self.enabled {
            return Err(LiveError::NotEnabled);
        }
        info!(
            "[{}] ↻ {} {}",
            self.role,
            content.state.display_text(),
            format_time(content.elapsed_time)
        );
        Ok(())
    }

    fn end(&self) -> Result<(), LiveError> {
        info!("[{}] ■ ended", self.role);
        Ok(())
    }
}

// ============================================================================
// MockPresenter
// ============================================================================

/// A call received by [`MockPresenter`].
#[derive(Debug, Clone, PartialEq)]
pub enum LiveCall {
    Start(LiveContent),
    Update(LiveContent),
    End,
}

/// Presenter that records every call.
#[derive(Debug)]
pub struct MockPresenter {
    calls: Mutex<Vec<LiveCall>>,
    enabled: AtomicBool,
    should_fail: AtomicBool,
}

impl MockPresenter {
    #[must_use]
    pub fn new() -> Self {
        Self {
            calls: Mutex::new(Vec::new()),
            enabled: AtomicBool::new(true),
            should_fail: AtomicBool::new(false),
        }
    }

    pub fn set_enabled(&self, enabled: bool) {
        self.enabled.store(enabled, Ordering::SeqCst);
    }

    pub fn set_should_fail(&self, should_fail: bool) {
        self.should_fail.store(should_fail, Ordering::SeqCst);
    }

    #[must_use]
    pub fn calls(&self) -> Vec<LiveCall> {
        self.calls.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }

    pub fn clear(&self) {
        self.calls.lock().unwrap_or_else(|e| e.into_inner()).clear();
    }

    fn record(&self, call: LiveCall) -> Result<(), LiveError> {
        if self.should_fail.load(Ordering::SeqCst) {
            return Err(LiveError::RequestFailed("simulated failure".to_string()));
        }
        self.calls
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(call);
        Ok(())
    }
}

impl Default for MockPresenter {
    fn default() -> Self {
        Self::new()
    }
}

impl LivePresenter for MockPresenter {
    fn is_enabled(&self) -> bool {
        self.enabled.load(Ordering::SeqCst)
    }

    fn start(&self, content: &LiveContent) -> Result<(), LiveError> {
        self.record(LiveCall::Start(content.clone()))
    }

    fn update(&self, content: &LiveContent) -> Result<(), LiveError> {
        self.record(LiveCall::Update(content.clone()))
    }

    fn end(&self) -> Result<(), LiveError> {
        self.record(LiveCall::End)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn running_content() -> LiveContent {
        LiveContent {
            elapsed_time: 1.5,
            state: TimerState::Running,
            start_time: Some(DateTime::<Utc>::UNIX_EPOCH),
        }
    }

    fn create_manager() -> (LiveActivityManager<Arc<MockPresenter>>, Arc<MockPresenter>) {
        let presenter = Arc::new(MockPresenter::new());
        (LiveActivityManager::new(presenter.clone()), presenter)
    }

    mod content_tests {
        use super::*;

        #[test]
        fn test_from_snapshot() {
            let content = LiveContent::from_snapshot(&TimerSnapshot::idle());
            assert_eq!(content.state, TimerState::Idle);
            assert_eq!(content.elapsed_time, 0.0);
            assert!(content.start_time.is_none());
        }

        #[test]
        fn test_serialization_field_names() {
            let json = serde_json::to_string(&running_content()).unwrap();
            assert!(json.contains("\"elapsedTime\":1.5"));
            assert!(json.contains("\"state\":\"running\""));
            assert!(json.contains("\"startTime\""));
        }
    }

    mod manager_tests {
        use super::*;

        #[test]
        fn test_start_update_end() {
            let (mut manager, presenter) = create_manager();

            manager.start_activity(&running_content());
            assert!(manager.is_active());

            manager.update_activity(&running_content());
            manager.end_activity();
            assert!(!manager.is_active());

            assert_eq!(
                presenter.calls(),
                vec![
                    LiveCall::Start(running_content()),
                    LiveCall::Update(running_content()),
                    LiveCall::End,
                ]
            );
        }

        #[test]
        fn test_start_declines_when_disabled() {
            let (mut manager, presenter) = create_manager();
            presenter.set_enabled(false);

            manager.start_activity(&running_content());

            assert!(!manager.is_active());
            assert!(presenter.calls().is_empty());
        }

        #[test]
        fn test_start_ends_existing_activity() {
            let (mut manager, presenter) = create_manager();

            manager.start_activity(&running_content());
            manager.start_activity(&running_content());

            assert!(manager.is_active());
            assert_eq!(
                presenter.calls(),
                vec![
                    LiveCall::Start(running_content()),
                    LiveCall::End,
                    LiveCall::Start(running_content()),
                ]
            );
        }

        #[test]
        fn test_update_and_end_without_activity_are_noops() {
            let (mut manager, presenter) = create_manager();

            manager.update_activity(&running_content());
            manager.end_activity();

            assert!(presenter.calls().is_empty());
        }

        #[test]
        fn test_presenter_failure_is_swallowed() {
            let (mut manager, presenter) = create_manager();
            presenter.set_should_fail(true);

            manager.start_activity(&running_content());

            assert!(!manager.is_active());
        }

        /// Reports enabled but is switched off by the time a request arrives.
        struct SwitchedOffPresenter;

        impl LivePresenter for SwitchedOffPresenter {
            fn is_enabled(&self) -> bool {
                true
            }

            fn start(&self, _content: &LiveContent) -> Result<(), LiveError> {
                Err(LiveError::NotEnabled)
            }

            fn update(&self, _content: &LiveContent) -> Result<(), LiveError> {
                Err(LiveError::NotEnabled)
            }

            fn end(&self) -> Result<(), LiveError> {
                Err(LiveError::NotEnabled)
            }
        }

        #[test]
        fn test_start_refused_as_disabled_stays_inactive() {
            let mut manager = LiveActivityManager::new(SwitchedOffPresenter);

            manager.start_activity(&running_content());
            manager.update_activity(&running_content());

            assert!(!manager.is_active());
        }
    }

    mod log_presenter_tests {
        use super::*;

        #[test]
        fn test_disabled_rejects_start() {
            let presenter = LogPresenter::new(DeviceRole::Watch, false);
            assert!(!presenter.is_enabled());
            let err = presenter.start(&running_content()).unwrap_err();
            assert!(err.is_disabled());
        }

        #[test]
        fn test_enabled_accepts_calls() {
            let presenter = LogPresenter::new(DeviceRole::Phone, true);
            assert!(presenter.start(&running_content()).is_ok());
            assert!(presenter.update(&running_content()).is_ok());
            assert!(presenter.end().is_ok());
        }
    }
}
