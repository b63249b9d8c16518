//! Notification sink for CLI commands: the host socket, or memory for `--dry-run`.

use std::path::Path;
use std::sync::Arc;

use imgbridge_ipc::IpcClient;
use imgbridge_protocol::{ImgChannel, MemoryNotifier, Notification};

use super::state::PlacementCounter;

const CONNECT_ATTEMPTS: u32 = 3;

pub enum Sink {
    Socket(Arc<IpcClient>),
    Memory(Arc<MemoryNotifier>),
}

impl Sink {
    /// Connect to a running host, or record in memory when `dry_run` is set.
    pub fn open(dry_run: bool, socket: Option<&Path>) -> anyhow::Result<Self> {
        if dry_run {
            return Ok(Sink::Memory(Arc::new(MemoryNotifier::new())));
        }
        let client = IpcClient::connect_with_retry(socket, CONNECT_ATTEMPTS)?;
        log::info!("sending to {}", client.socket_path().display());
        Ok(Sink::Socket(Arc::new(client)))
    }

    pub fn channel(&self, namespace: &str) -> ImgChannel {
        match self {
            Sink::Socket(client) => ImgChannel::new(namespace, client.clone()),
            Sink::Memory(memory) => ImgChannel::new(namespace, memory.clone()),
        }
    }

    /// Persistent placement numbering for the connected host. Dry runs
    /// always start at 1.
    pub fn placement_counter(&self) -> Option<PlacementCounter> {
        match self {
            Sink::Socket(client) => Some(PlacementCounter::for_socket(client.socket_path())),
            Sink::Memory(_) => None,
        }
    }

    /// Notifications recorded so far; always empty for a socket sink.
    pub fn recorded(&self) -> Vec<Notification> {
        match self {
            Sink::Socket(_) => Vec::new(),
            Sink::Memory(memory) => memory.take(),
        }
    }
}
