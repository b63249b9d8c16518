//! Kitty graphics support for the image bridge.
//!
//! This crate covers both ends of the image notifications:
//!
//! - **Parsing**: kitty APC bodies into [`KittyRecord`]s
//! - **Decoding**: records into `img.upload` / `img.show` notifications
//! - **Storing**: the host-side [`ImageStore`] that consumes them
//! - **Placeholders**: U+10EEEE text runs into [`ImageFragment`]s
//!
//! # Architecture
//!
//! ```text
//! APC body
//!     │
//!     ▼
//! protocol::kitty::parse_kitty_record()   ← split keys and payload
//!     │
//!     ▼
//! KittyDecoder::decode()                  ← upload, show or drop
//!     │  (notification over the RPC channel)
//!     ▼
//! ImageStore::upload() / show() / hide()  ← host side
//! ```

pub mod decoder;
pub mod error;
pub mod placeholder;
pub mod protocol;
pub mod store;
pub mod types;

// Re-export primary types for convenience.
pub use decoder::{Dispatch, KittyDecoder};
pub use error::GraphicsError;
pub use placeholder::{parse_placeholders, ImageFragment, IMAGE_PLACEHOLDER};
pub use protocol::kitty::{parse_kitty_record, strip_apc, KittyRecord};
pub use store::{ImageStore, StoreLimits};
pub use types::{StoredImage, UploadOutcome, VisiblePlacement};
