//! Host-side records for stored images and visible placements.

use imgbridge_protocol::DisplayOptions;

/// An image held by the host after its upload completed.
///
/// `bytes` is the encoded file content (PNG, JPEG, ...); turning it into
/// pixels is left to the renderer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredImage {
    pub id: u32,
    pub bytes: Vec<u8>,
    pub filename: String,
}

impl StoredImage {
    pub fn byte_size(&self) -> usize {
        self.bytes.len()
    }
}

/// A placement the host was asked to show.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VisiblePlacement {
    pub image_id: u32,
    pub placement_id: u32,
    pub opts: DisplayOptions,
}

impl VisiblePlacement {
    /// Layer used for draw ordering; an unset `z` draws at 0.
    pub fn z_index(&self) -> i32 {
        self.opts.z.unwrap_or(0)
    }
}

/// Result of feeding one upload notification to the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UploadOutcome {
    /// More chunks are expected; `buffered` bytes are held so far.
    Pending { image_id: u32, buffered: usize },
    /// The image is complete and stored.
    Stored { image_id: u32, bytes: usize },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn placement_z_defaults_to_zero() {
        let placement = VisiblePlacement {
            image_id: 1,
            placement_id: 1,
            opts: DisplayOptions::default(),
        };
        assert_eq!(placement.z_index(), 0);
    }

    #[test]
    fn stored_image_byte_size() {
        let image = StoredImage {
            id: 1,
            bytes: vec![0; 100],
            filename: String::new(),
        };
        assert_eq!(image.byte_size(), 100);
    }
}
