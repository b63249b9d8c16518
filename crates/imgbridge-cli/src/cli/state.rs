//! Placement numbering that survives between CLI runs.
//!
//! Each `imgbridge show` is a fresh provider, so the next placement id is
//! kept in a small file beside the host socket. Separate hosts get separate
//! counters.

use std::ffi::OsString;
use std::path::{Path, PathBuf};

use anyhow::Context;

#[derive(Debug, Clone)]
pub struct PlacementCounter {
    path: PathBuf,
}

impl PlacementCounter {
    /// Counter for the host listening on `socket`.
    pub fn for_socket(socket: &Path) -> Self {
        let mut name = OsString::from(socket.as_os_str());
        name.push(".placements");
        Self {
            path: PathBuf::from(name),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Next placement id to hand out; 1 when nothing was saved yet.
    pub fn load(&self) -> u32 {
        std::fs::read_to_string(&self.path)
            .ok()
            .and_then(|s| s.trim().parse::<u32>().ok())
            .unwrap_or(1)
            .max(1)
    }

    /// Record that `used` was handed out.
    pub fn save_after(&self, used: u32) -> anyhow::Result<()> {
        let next = used.wrapping_add(1).max(1);
        std::fs::write(&self.path, next.to_string())
            .with_context(|| format!("failed to write {}", self.path.display()))
    }
}
