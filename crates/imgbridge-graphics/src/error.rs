//! Error types for kitty parsing and the host-side image store.

/// Errors that can occur while parsing records or storing images.
#[derive(Debug, thiserror::Error)]
pub enum GraphicsError {
    /// The image ID was not found in the store.
    #[error("image not found: {0}")]
    ImageNotFound(u32),

    /// The image data exceeds the maximum allowed size.
    #[error("image too large: {size} bytes (max {max} bytes)")]
    ImageTooLarge { size: usize, max: usize },

    /// The total memory quota has been exceeded.
    #[error("memory quota exceeded: {used} / {quota} bytes")]
    QuotaExceeded { used: usize, quota: usize },

    /// Base64 decoding failed.
    #[error("base64 decode error: {0}")]
    Base64Decode(#[from] base64::DecodeError),

    /// A kitty graphics record could not be parsed.
    #[error("parse error: {0}")]
    ParseError(String),
}
