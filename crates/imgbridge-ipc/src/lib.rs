//! Unix domain socket transport for image notifications.
//!
//! The editor side writes length-prefixed JSON-RPC 2.0 notifications through
//! [`IpcClient`], which implements [`Notifier`](imgbridge_protocol::Notifier).
//! The host side runs a small tokio server that decodes them into
//! [`HostCommand`] values and hands them over an [`mpsc`] channel to whatever
//! thread owns the image store.
//!
//! # Usage
//!
//! ```rust,ignore
//! let host = imgbridge_ipc::start_host(None, "neovide")?;
//! while let Some(cmd) = host.commands.blocking_recv() {
//!     // apply cmd to the image store
//! }
//! ```

pub mod client;
pub mod command;
pub mod handler;
pub mod server;
pub mod socket;

pub use client::IpcClient;
pub use command::{HostCommand, RouteError};
pub use socket::{discover_socket, socket_path};

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Context;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

/// Handles for a running host server.
pub struct HostHandle {
    pub socket_path: PathBuf,
    pub commands: mpsc::Receiver<HostCommand>,
    /// Cancel to stop the server and remove the socket file.
    pub cancel: CancellationToken,
}

/// Start the host server on a dedicated thread with its own tokio runtime.
///
/// Returns once the socket is bound, so a bind failure is reported here
/// rather than only logged.
pub fn start_host(configured: Option<&Path>, namespace: &str) -> anyhow::Result<HostHandle> {
    let path = socket::socket_path(configured);
    let path_for_thread = path.clone();
    let namespace: Arc<str> = Arc::from(namespace);
    let (cmd_tx, cmd_rx) = mpsc::channel(64);
    let cancel = CancellationToken::new();
    let cancel_for_thread = cancel.clone();
    let (ready_tx, ready_rx) = std::sync::mpsc::channel::<anyhow::Result<()>>();

    let rt = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .context("failed to create tokio runtime for image host")?;

    std::thread::Builder::new()
        .name("imgbridge-host".into())
        .spawn(move || {
            rt.block_on(async move {
                match server::start_server(path_for_thread, namespace, cmd_tx, cancel_for_thread)
                    .await
                {
                    Ok(handle) => {
                        let _ = ready_tx.send(Ok(()));
                        let _ = handle.await;
                    }
                    Err(e) => {
                        let _ = ready_tx.send(Err(e));
                    }
                }
            });
        })
        .context("failed to spawn image host thread")?;

    ready_rx
        .recv()
        .context("image host thread exited before binding")?
        .with_context(|| format!("failed to bind {}", path.display()))?;

    Ok(HostHandle {
        socket_path: path,
        commands: cmd_rx,
        cancel,
    })
}
