//! Display utilities for the timer-sync CLI.
//!
//! This module provides formatted output for:
//! - Success messages
//! - Error messages
//! - Status display

use crate::types::{DeviceRole, IpcResponse, ResponseData, TimerState};

// ============================================================================
// Display
// ============================================================================

/// Display utilities for CLI output.
pub struct Display;

impl Display {
    /// Shows the result of a start request.
    pub fn show_start_success(response: &IpcResponse) {
        println!("> {}", response.message);
        if let Some(line) = response.data.as_ref().and_then(Self::time_line) {
            println!("  {}", line);
        }
    }

    /// Shows the result of a pause request.
    pub fn show_pause_success(response: &IpcResponse) {
        println!("|| {}", response.message);
        if let Some(line) = response.data.as_ref().and_then(Self::time_line) {
            println!("  {}", line);
        }
    }

    /// Shows the result of a stop request.
    pub fn show_stop_success(response: &IpcResponse) {
        println!("[] {}", response.message);
    }

    /// Shows the current stopwatch status of a device.
    pub fn show_status(device: DeviceRole, response: &IpcResponse) {
        println!("ストップウォッチ ステータス ({})", device);
        println!("─────────────────────────────");

        match &response.data {
            Some(data) => {
                println!("状態: {}", Self::state_label(data.state.as_deref()));
                if let Some(formatted) = &data.formatted {
                    println!("経過時間: {}", formatted);
                }
                if let Some(start) = data.start_time {
                    println!("開始時刻: {}", start.to_rfc3339());
                }
            }
            None => println!("ステータスを取得できませんでした"),
        }
    }

    /// Shows an error message.
    pub fn show_error(message: &str) {
        eprintln!("エラー: {}", message);
    }

    /// Maps a wire state to the label shown next to the time.
    fn state_label(state: Option<&str>) -> &str {
        match state {
            Some(s) => TimerState::from_wire(s).map_or(s, |state| state.display_text()),
            None => "unknown",
        }
    }

    /// `"00:01.5 (Running)"`, if the response carries a time.
    fn time_line(data: &ResponseData) -> Option<String> {
        let formatted = data.formatted.as_deref()?;
        Some(format!(
            "{} ({})",
            formatted,
            Self::state_label(data.state.as_deref())
        ))
    }
}

// ============================================================================
// Tests
// ============================================================================
