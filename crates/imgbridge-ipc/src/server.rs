//! Host socket server: accepts editor connections on a Unix domain socket.

use std::path::PathBuf;
use std::sync::Arc;

use tokio::net::UnixListener;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::command::HostCommand;
use crate::handler::handle_client;

/// Maximum number of concurrent client connections.
const MAX_CONNECTIONS: usize = 16;

/// Start the host server on a background tokio task.
///
/// Binds to `socket_path`, checks that each peer runs under our UID, and
/// spawns a per-client handler that forwards [`HostCommand`]s through
/// `cmd_tx`. Only methods under `namespace` are accepted.
///
/// Cancelling `cancel` stops the accept loop, closes open connections and
/// removes the socket file.
pub async fn start_server(
    socket_path: PathBuf,
    namespace: Arc<str>,
    cmd_tx: mpsc::Sender<HostCommand>,
    cancel: CancellationToken,
) -> anyhow::Result<JoinHandle<()>> {
    // Clean up stale socket from a previous run.
    let _ = std::fs::remove_file(&socket_path);

    let listener = UnixListener::bind(&socket_path)?;

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        std::fs::set_permissions(&socket_path, std::fs::Permissions::from_mode(0o600))?;
    }

    log::info!(
        "image host listening on {} (namespace {namespace})",
        socket_path.display()
    );

    let semaphore = Arc::new(tokio::sync::Semaphore::new(MAX_CONNECTIONS));

    let handle = tokio::spawn(async move {
        loop {
            tokio::select! {
                _ = cancel.cancelled() => {
                    log::info!("image host shutting down");
                    let _ = std::fs::remove_file(&socket_path);
                    break;
                }
                result = listener.accept() => {
                    let stream = match result {
                        Ok((stream, _addr)) => stream,
                        Err(e) => {
                            log::error!("accept error: {e}");
                            continue;
                        }
                    };

                    // Verify that the connecting process has the same UID.
                    let my_uid = unsafe { libc::getuid() };
                    match stream.peer_cred() {
                        Ok(cred) if cred.uid() != my_uid => {
                            log::warn!("rejected connection from UID {}", cred.uid());
                            continue;
                        }
                        Ok(cred) => log::info!("editor connected (UID {})", cred.uid()),
                        Err(e) => {
                            log::warn!("failed to get peer credentials: {e}");
                            continue;
                        }
                    }

                    let permit = match semaphore.clone().try_acquire_owned() {
                        Ok(permit) => permit,
                        Err(_) => {
                            log::warn!("connection limit reached, rejecting client");
                            continue;
                        }
                    };

                    let tx = cmd_tx.clone();
                    let namespace = namespace.clone();
                    let cancel = cancel.clone();
                    tokio::spawn(async move {
                        tokio::select! {
                            _ = cancel.cancelled() => {
                                log::debug!("closing client connection on shutdown");
                            }
                            result = handle_client(stream, &namespace, tx) => match result {
                                Ok(()) => log::debug!("client disconnected gracefully"),
                                Err(e) => log::warn!("client disconnected: {e}"),
                            }
                        }
                        drop(permit);
                    });
                }
            }
        }
    });

    Ok(handle)
}
