//! Synchronous notification client used on the editor side.

use std::io::Write;
use std::os::unix::net::UnixStream;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use imgbridge_protocol::{encode_frame, JsonRpcRequest, Notifier, NotifyError};

/// Writes image notifications to a running host over its Unix socket.
///
/// Never reads: every message is a notification, so there is no reply to
/// wait for. Thread-safe via an internal mutex so it can sit behind an
/// `Arc<dyn Notifier>`.
pub struct IpcClient {
    stream: Mutex<UnixStream>,
    path: PathBuf,
}

impl IpcClient {
    /// Connect to a running host.
    ///
    /// Uses `configured` or `$IMGBRIDGE_SOCKET` when that file exists, and
    /// otherwise the newest socket in the runtime directory.
    pub fn connect(configured: Option<&Path>) -> Result<Self> {
        let socket = find_socket(configured)?;
        Self::connect_to(socket)
    }

    /// Connect to a specific socket path.
    pub fn connect_to(path: PathBuf) -> Result<Self> {
        let stream = UnixStream::connect(&path)
            .with_context(|| format!("failed to connect to {}", path.display()))?;
        stream.set_write_timeout(Some(Duration::from_secs(30)))?;
        log::debug!("connected to image host at {}", path.display());
        Ok(Self {
            stream: Mutex::new(stream),
            path,
        })
    }

    /// Connect with exponential backoff retry.
    pub fn connect_with_retry(configured: Option<&Path>, max_attempts: u32) -> Result<Self> {
        let mut delay = Duration::from_millis(100);
        let mut attempt = 1;
        loop {
            match Self::connect(configured) {
                Ok(client) => return Ok(client),
                Err(e) if attempt >= max_attempts => return Err(e),
                Err(e) => {
                    log::info!(
                        "host connect attempt {}/{}: {}, retrying in {:?}",
                        attempt,
                        max_attempts,
                        e,
                        delay
                    );
                    std::thread::sleep(delay);
                    delay = std::cmp::min(delay * 2, Duration::from_secs(5));
                    attempt += 1;
                }
            }
        }
    }

    pub fn socket_path(&self) -> &Path {
        &self.path
    }
}

impl Notifier for IpcClient {
    fn notify(&self, method: &str, params: serde_json::Value) -> Result<(), NotifyError> {
        let request = JsonRpcRequest::notification(method, Some(params));
        let bytes = serde_json::to_vec(&request).map_err(|source| NotifyError::Serialize {
            method: method.to_string(),
            source,
        })?;
        let frame = encode_frame(&bytes)?;

        let mut stream = self
            .stream
            .lock()
            .map_err(|_| NotifyError::Unavailable("IPC client mutex poisoned".into()))?;
        stream.write_all(&frame)?;
        stream.flush()?;
        Ok(())
    }
}

/// Find the socket path of a running host.
fn find_socket(configured: Option<&Path>) -> Result<PathBuf> {
    if let Some(path) = crate::discover_socket(configured) {
        return Ok(path);
    }

    bail!("no running image host found. Is the host running?")
}
