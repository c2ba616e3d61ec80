//! Command definitions for the timer-sync CLI.
//!
//! Uses clap derive macro for argument parsing.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use crate::types::{DeviceRole, StopwatchConfig, DEFAULT_TICK_INTERVAL_MS};

// ============================================================================
// CLI Structure
// ============================================================================

/// timer-sync - A stopwatch mirrored between a phone and a watch
#[derive(Parser, Debug)]
#[command(
    name = "timer-sync",
    version,
    about = "2台のデバイス間で同期するストップウォッチ",
    long_about = "フォンとウォッチの2台で状態を共有するストップウォッチ。\n\
                  各デバイスはデーモンとして動作し、Unixソケット経由で同期します。",
    propagate_version = true
)]
pub struct Cli {
    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Enable verbose output for debugging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Directory holding sockets and shared context (default: ~/.timer-sync)
    #[arg(long, global = true, value_name = "DIR")]
    pub base_dir: Option<PathBuf>,
}

// ============================================================================
// Subcommands
// ============================================================================

/// Available subcommands
#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// Start or resume the stopwatch
    Start(DeviceArgs),

    /// Pause the running stopwatch
    Pause(DeviceArgs),

    /// Stop and reset the stopwatch
    Stop(DeviceArgs),

    /// Show the current stopwatch status
    Status(DeviceArgs),

    /// Run a device daemon
    Daemon(DaemonArgs),

    /// Generate shell completion scripts
    Completions {
        /// Shell type for completion script
        #[arg(value_enum)]
        shell: clap_complete::Shell,
    },
}

// ============================================================================
// Arguments
// ============================================================================

/// Selects which device daemon a command is sent to
#[derive(Args, Debug, Clone)]
pub struct DeviceArgs {
    /// Target device
    #[arg(short, long, value_enum, default_value_t = DeviceRole::Phone)]
    pub device: DeviceRole,
}

/// Arguments for the daemon command
#[derive(Args, Debug, Clone)]
pub struct DaemonArgs {
    /// Which device this daemon plays
    #[arg(short, long, value_enum)]
    pub role: DeviceRole,

    /// Display refresh interval in milliseconds (10-1000)
    #[arg(
        long,
        default_value_t = DEFAULT_TICK_INTERVAL_MS,
        value_parser = clap::value_parser!(u64).range(10..=1000)
    )]
    pub tick_ms: u64,

    /// Disable the live presentation
    #[arg(long)]
    pub no_live: bool,
}

impl DaemonArgs {
    /// Builds the stopwatch configuration from the arguments.
    pub fn to_config(&self) -> StopwatchConfig {
        StopwatchConfig::default()
            .with_tick_interval_ms(self.tick_ms)
            .with_live_activity(!self.no_live)
    }
}

// ============================================================================
// Tests
// ============================================================================
