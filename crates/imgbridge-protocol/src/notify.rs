//! Outbound notification plumbing.
//!
//! Everything the bridge sends is a one-way notification: nothing waits for a
//! reply, and a failed send is logged and dropped rather than surfaced to the
//! editor.

use std::fmt;
use std::sync::{Arc, Mutex};

use serde::Serialize;

use crate::framing::FrameError;
use crate::method;
use crate::rpc::{HideImagesParams, ShowImageParams, UploadImageParams};

#[derive(Debug, thiserror::Error)]
pub enum NotifyError {
    #[error("failed to serialize params for {method}: {source}")]
    Serialize {
        method: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("frame error: {0}")]
    Frame(#[from] FrameError),

    #[error("transport error: {0}")]
    Transport(#[from] std::io::Error),

    #[error("notifier unavailable: {0}")]
    Unavailable(String),
}

/// Sink for one-way notifications.
///
/// The IPC client implements this for real sockets; [`MemoryNotifier`]
/// records notifications for tests and dry runs.
pub trait Notifier: Send + Sync {
    fn notify(&self, method: &str, params: serde_json::Value) -> Result<(), NotifyError>;
}

/// A notification captured by [`MemoryNotifier`].
#[derive(Debug, Clone, PartialEq)]
pub struct Notification {
    pub method: String,
    pub params: serde_json::Value,
}

#[derive(Debug, Default)]
pub struct MemoryNotifier {
    sent: Mutex<Vec<Notification>>,
}

impl MemoryNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of everything sent so far, oldest first.
    pub fn sent(&self) -> Vec<Notification> {
        self.sent.lock().map(|sent| sent.clone()).unwrap_or_default()
    }

    /// Drain the recorded notifications.
    pub fn take(&self) -> Vec<Notification> {
        self.sent
            .lock()
            .map(|mut sent| std::mem::take(&mut *sent))
            .unwrap_or_default()
    }

    /// Recorded notifications whose method ends with `op` (e.g. `img.show`).
    pub fn sent_op(&self, op: &str) -> Vec<Notification> {
        self.sent()
            .into_iter()
            .filter(|n| n.method.ends_with(op))
            .collect()
    }
}

impl Notifier for MemoryNotifier {
    fn notify(&self, method: &str, params: serde_json::Value) -> Result<(), NotifyError> {
        let mut sent = self
            .sent
            .lock()
            .map_err(|_| NotifyError::Unavailable("memory notifier mutex poisoned".into()))?;
        sent.push(Notification {
            method: method.to_string(),
            params,
        });
        Ok(())
    }
}

/// Typed front for the three image notifications under one namespace.
#[derive(Clone)]
pub struct ImgChannel {
    namespace: String,
    notifier: Arc<dyn Notifier>,
}

impl fmt::Debug for ImgChannel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ImgChannel")
            .field("namespace", &self.namespace)
            .finish_non_exhaustive()
    }
}

impl ImgChannel {
    pub fn new(namespace: impl Into<String>, notifier: Arc<dyn Notifier>) -> Self {
        Self {
            namespace: namespace.into(),
            notifier,
        }
    }

    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    pub fn upload(&self, params: &UploadImageParams) {
        if let Err(e) = self.try_upload(params) {
            log::warn!("dropping {}.{} notification: {e}", self.namespace, method::IMG_UPLOAD);
        }
    }

    /// Like [`upload`](Self::upload), but the caller learns whether the
    /// host was reached.
    pub fn try_upload(&self, params: &UploadImageParams) -> Result<(), NotifyError> {
        log::debug!(
            "upload image {} ({} bytes, more_chunks={}, base64={})",
            params.img.id,
            params.img.bytes.len(),
            params.more_chunks,
            params.base64
        );
        self.try_emit(method::IMG_UPLOAD, params)
    }

    pub fn show(&self, params: &ShowImageParams) {
        log::debug!(
            "show image {} as placement {}",
            params.image_id,
            params.placement_id
        );
        self.emit(method::IMG_SHOW, params);
    }

    pub fn hide(&self, params: &HideImagesParams) {
        log::debug!("hide placements {:?}", params.ids);
        self.emit(method::IMG_HIDE, params);
    }

    /// Serialize and send, returning the failure instead of logging it.
    pub fn try_emit<T: Serialize>(&self, op: &str, params: &T) -> Result<(), NotifyError> {
        let method = method::qualified(&self.namespace, op);
        let value = serde_json::to_value(params).map_err(|source| NotifyError::Serialize {
            method: method.clone(),
            source,
        })?;
        self.notifier.notify(&method, value)
    }

    fn emit<T: Serialize>(&self, op: &str, params: &T) {
        if let Err(e) = self.try_emit(op, params) {
            log::warn!("dropping {}.{op} notification: {e}", self.namespace);
        }
    }
}
