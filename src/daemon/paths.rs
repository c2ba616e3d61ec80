//! Filesystem layout shared by the daemons and the CLI.
//!
//! ```text
//! ~/.timer-sync/
//!   phone.ctl.sock       control socket (CLI -> phone daemon)
//!   phone.sync.sock      sync socket (watch daemon -> phone daemon)
//!   phone.context.json   shared context the phone reads on startup
//!   watch.ctl.sock
//!   watch.sync.sock
//!   watch.context.json
//! ```

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

use crate::types::DeviceRole;

/// Default base directory name under the home directory
pub const DEFAULT_DIR_NAME: &str = ".timer-sync";

/// Socket and context file locations for both devices.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DevicePaths {
    base_dir: PathBuf,
}

impl DevicePaths {
    pub fn new(base_dir: impl Into<PathBuf>) -> Self {
        Self {
            base_dir: base_dir.into(),
        }
    }

    /// Paths under `~/.timer-sync`.
    ///
    /// # Errors
    ///
    /// Returns an error if the home directory cannot be determined.
    pub fn from_home() -> Result<Self> {
        let home = dirs::home_dir().context("ホームディレクトリが見つかりません")?;
        Ok(Self::new(home.join(DEFAULT_DIR_NAME)))
    }

    /// Uses `base_dir` when given, `~/.timer-sync` otherwise.
    pub fn resolve(base_dir: Option<&Path>) -> Result<Self> {
        match base_dir {
            Some(dir) => Ok(Self::new(dir)),
            None => Self::from_home(),
        }
    }

    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }

    /// Socket the CLI talks to.
    pub fn control_socket(&self, role: DeviceRole) -> PathBuf {
        self.base_dir.join(format!("{}.ctl.sock", role))
    }

    /// Socket the paired device sends live messages to.
    pub fn sync_socket(&self, role: DeviceRole) -> PathBuf {
        self.base_dir.join(format!("{}.sync.sock", role))
    }

    /// Shared context written by the peer and read by `role`.
    pub fn context_file(&self, role: DeviceRole) -> PathBuf {
        self.base_dir.join(format!("{}.context.json", role))
    }
}
