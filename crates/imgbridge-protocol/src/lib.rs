//! Shared protocol types for the image bridge.
//!
//! This crate defines the image data model, the JSON-RPC 2.0 messages and
//! notification params, length-prefix framing, and the [`Notifier`] seam
//! through which both the provider adapter and the kitty decoder emit
//! `<namespace>.img.*` notifications.

pub mod error_code;
pub mod framing;
pub mod method;
mod notify;
mod rpc;
mod types;
mod wire;

// Re-export everything at crate root.

// types
pub use types::{DisplayOptions, Image, JsonRpcId, Position, Region, Relative, Size, Unit};

// rpc
pub use rpc::{
    HideImagesParams, JsonRpcError, JsonRpcRequest, JsonRpcResponse, ShowImageParams,
    UploadImageParams,
};

// notify
pub use notify::{ImgChannel, MemoryNotifier, Notification, Notifier, NotifyError};

// framing
pub use framing::{
    decode_frame, encode_frame, FrameBuffer, FrameError, MAX_FRAME_SIZE, MAX_IMAGE_BYTES,
};
