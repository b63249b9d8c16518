//! Per-client connection handler.
//!
//! Reads length-prefixed JSON-RPC frames from a [`tokio::net::UnixStream`]
//! and forwards decoded notifications through an [`mpsc`] channel. Nothing is
//! written back except an error for a message that carried an `id`.

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::UnixStream;
use tokio::sync::mpsc;

use imgbridge_protocol::{encode_frame, error_code, FrameBuffer, JsonRpcRequest, JsonRpcResponse};

use crate::command::{HostCommand, RouteError};

/// What one frame turned into.
#[derive(Debug)]
pub enum Routed {
    Command(HostCommand),
    /// The sender expected an answer; tell it this channel has none.
    Reply(JsonRpcResponse),
    Ignored,
}

/// Handle a single client connection until it disconnects.
pub async fn handle_client(
    mut stream: UnixStream,
    namespace: &str,
    cmd_tx: mpsc::Sender<HostCommand>,
) -> anyhow::Result<()> {
    let mut buf = vec![0u8; 64 * 1024];
    let mut frames = FrameBuffer::new();

    loop {
        let n = stream.read(&mut buf).await?;
        if n == 0 {
            break; // client disconnected
        }

        frames.extend(&buf[..n]);

        // Process all complete frames in the buffer.
        while let Some(payload) = frames.next_frame()? {
            match route_payload(namespace, &payload) {
                Routed::Command(cmd) => {
                    if cmd_tx.send(cmd).await.is_err() {
                        log::debug!("command receiver dropped, closing connection");
                        return Ok(());
                    }
                }
                Routed::Reply(resp) => {
                    let resp_bytes = serde_json::to_vec(&resp)?;
                    stream.write_all(&encode_frame(&resp_bytes)?).await?;
                }
                Routed::Ignored => {}
            }
        }
    }

    Ok(())
}

/// Decode one frame payload.
pub fn route_payload(namespace: &str, payload: &[u8]) -> Routed {
    let mut request: JsonRpcRequest = match serde_json::from_slice(payload) {
        Ok(r) => r,
        Err(e) => {
            log::warn!("ignoring malformed JSON-RPC message: {e}");
            return Routed::Ignored;
        }
    };

    if let Some(id) = request.id.take() {
        let method = request.method.clone();
        let (code, message) = match HostCommand::from_notification(namespace, request) {
            Ok(_) => (
                error_code::NOTIFICATION_EXPECTED,
                format!("{method} is a notification and takes no id"),
            ),
            Err(e @ RouteError::UnknownMethod(_)) => (error_code::METHOD_NOT_FOUND, e.to_string()),
            Err(e @ RouteError::InvalidParams { .. }) => (error_code::INVALID_PARAMS, e.to_string()),
        };
        log::warn!("rejecting request {id} for {method}: {message}");
        return Routed::Reply(JsonRpcResponse::error(id, code, message));
    }

    match HostCommand::from_notification(namespace, request) {
        Ok(cmd) => Routed::Command(cmd),
        Err(e) => {
            log::warn!("ignoring notification: {e}");
            Routed::Ignored
        }
    }
}
