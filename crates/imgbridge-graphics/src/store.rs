//! Host-side image store fed by `img.upload`, `img.show` and `img.hide`.
//!
//! The [`ImageStore`] reassembles chunked uploads, decodes base64 payloads,
//! keeps completed images under a memory quota (least-recently-used images
//! are evicted first) and tracks which placements are visible.

use std::collections::HashMap;

use base64::alphabet;
use base64::engine::general_purpose::{GeneralPurpose, GeneralPurposeConfig};
use base64::engine::DecodePaddingMode;
use base64::Engine;

use imgbridge_protocol::{ShowImageParams, UploadImageParams};

use crate::error::GraphicsError;
use crate::types::{StoredImage, UploadOutcome, VisiblePlacement};

/// Default memory quota: 320 MiB.
pub const DEFAULT_QUOTA_BYTES: usize = 320 * 1024 * 1024;

/// Default maximum single image size: the largest unchunked upload.
pub const DEFAULT_MAX_IMAGE_BYTES: usize = imgbridge_protocol::MAX_IMAGE_BYTES;

/// Standard alphabet, accepts input with or without padding.
const BASE64_INDIFFERENT: GeneralPurpose = GeneralPurpose::new(
    &alphabet::STANDARD,
    GeneralPurposeConfig::new()
        .with_encode_padding(false)
        .with_decode_padding_mode(DecodePaddingMode::Indifferent),
);

/// Memory limits for an [`ImageStore`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StoreLimits {
    pub quota_bytes: usize,
    pub max_image_bytes: usize,
}

impl Default for StoreLimits {
    fn default() -> Self {
        Self {
            quota_bytes: DEFAULT_QUOTA_BYTES,
            max_image_bytes: DEFAULT_MAX_IMAGE_BYTES,
        }
    }
}

#[derive(Debug)]
struct StoredEntry {
    image: StoredImage,
    /// Monotonically increasing access counter for LRU eviction.
    last_access: u64,
}

/// An upload whose final chunk has not arrived yet.
#[derive(Debug)]
struct PendingUpload {
    image_id: u32,
    filename: String,
    base64: bool,
    data: Vec<u8>,
}

#[derive(Debug)]
pub struct ImageStore {
    images: HashMap<u32, StoredEntry>,
    /// Visible placements keyed by placement id.
    placements: HashMap<u32, VisiblePlacement>,
    /// Only one chunked transfer runs at a time.
    in_progress: Option<PendingUpload>,
    total_bytes: usize,
    limits: StoreLimits,
    access_counter: u64,
    /// Next id handed to uploads that arrive with id 0.
    next_auto_id: u32,
}

impl Default for ImageStore {
    fn default() -> Self {
        Self::new()
    }
}

impl ImageStore {
    pub fn new() -> Self {
        Self::with_limits(StoreLimits::default())
    }

    pub fn with_limits(limits: StoreLimits) -> Self {
        Self {
            images: HashMap::new(),
            placements: HashMap::new(),
            in_progress: None,
            total_bytes: 0,
            limits,
            access_counter: 0,
            next_auto_id: 1,
        }
    }

    pub fn total_bytes(&self) -> usize {
        self.total_bytes
    }

    pub fn limits(&self) -> StoreLimits {
        self.limits
    }

    pub fn image_count(&self) -> usize {
        self.images.len()
    }

    pub fn placement_count(&self) -> usize {
        self.placements.len()
    }

    pub fn has_image(&self, id: u32) -> bool {
        self.images.contains_key(&id)
    }

    pub fn has_pending_upload(&self) -> bool {
        self.in_progress.is_some()
    }

    /// Feed one upload notification.
    ///
    /// A chunk with id 0 continues the transfer in progress. A chunk for a
    /// different id abandons the stale transfer. The final chunk decodes the
    /// accumulated payload and stores the image.
    pub fn upload(&mut self, params: UploadImageParams) -> Result<UploadOutcome, GraphicsError> {
        let UploadImageParams {
            img,
            more_chunks,
            base64,
        } = params;

        let mut pending = match self.in_progress.take() {
            Some(pending) if img.id == 0 || img.id == pending.image_id => pending,
            stale => {
                if let Some(stale) = stale {
                    log::warn!(
                        "discarding incomplete upload of image {} ({} bytes buffered)",
                        stale.image_id,
                        stale.data.len()
                    );
                }
                PendingUpload {
                    image_id: img.id,
                    filename: img.filename,
                    base64,
                    data: Vec::new(),
                }
            }
        };

        let limit = self.encoded_limit(pending.base64);
        let new_size = pending.data.len() + img.bytes.len();
        if new_size > limit {
            return Err(GraphicsError::ImageTooLarge {
                size: new_size,
                max: limit,
            });
        }
        pending.data.extend_from_slice(&img.bytes);

        if more_chunks {
            let outcome = UploadOutcome::Pending {
                image_id: pending.image_id,
                buffered: pending.data.len(),
            };
            self.in_progress = Some(pending);
            return Ok(outcome);
        }

        let bytes = if pending.base64 {
            BASE64_INDIFFERENT.decode(&pending.data)?
        } else {
            pending.data
        };
        let image_id = if pending.image_id == 0 {
            self.next_image_id()
        } else {
            pending.image_id
        };
        let size = bytes.len();
        self.store_image(StoredImage {
            id: image_id,
            bytes,
            filename: pending.filename,
        })?;
        Ok(UploadOutcome::Stored {
            image_id,
            bytes: size,
        })
    }

    /// Record a visible placement, replacing one with the same placement id.
    pub fn show(&mut self, params: ShowImageParams) -> Result<(), GraphicsError> {
        self.touch(params.image_id)?;
        self.placements.insert(
            params.placement_id,
            VisiblePlacement {
                image_id: params.image_id,
                placement_id: params.placement_id,
                opts: params.opts,
            },
        );
        Ok(())
    }

    /// Remove placements by id. Returns how many were visible.
    pub fn hide(&mut self, placement_ids: &[u32]) -> usize {
        placement_ids
            .iter()
            .filter(|&&id| self.placements.remove(&id).is_some())
            .count()
    }

    /// Retrieve an image, updating the LRU counter.
    pub fn get_image(&mut self, id: u32) -> Result<&StoredImage, GraphicsError> {
        self.access_counter += 1;
        let counter = self.access_counter;
        let entry = self
            .images
            .get_mut(&id)
            .ok_or(GraphicsError::ImageNotFound(id))?;
        entry.last_access = counter;
        Ok(&entry.image)
    }

    /// Visible placements in draw order (z-index, then placement id).
    pub fn visible_placements(&self) -> Vec<&VisiblePlacement> {
        let mut result: Vec<_> = self.placements.values().collect();
        result.sort_by_key(|p| (p.z_index(), p.placement_id));
        result
    }

    fn touch(&mut self, id: u32) -> Result<(), GraphicsError> {
        self.get_image(id).map(|_| ())
    }

    fn next_image_id(&mut self) -> u32 {
        loop {
            let id = self.next_auto_id;
            self.next_auto_id = self.next_auto_id.wrapping_add(1).max(1);
            if !self.images.contains_key(&id) {
                return id;
            }
        }
    }

    /// Largest payload accepted while reassembling, before decoding.
    fn encoded_limit(&self, base64: bool) -> usize {
        if base64 {
            self.limits.max_image_bytes.div_ceil(3) * 4
        } else {
            self.limits.max_image_bytes
        }
    }

    /// Store a completed image, replacing any image with the same id.
    fn store_image(&mut self, image: StoredImage) -> Result<(), GraphicsError> {
        let size = image.byte_size();
        if size > self.limits.max_image_bytes {
            return Err(GraphicsError::ImageTooLarge {
                size,
                max: self.limits.max_image_bytes,
            });
        }

        if let Some(old) = self.images.remove(&image.id) {
            self.total_bytes = self.total_bytes.saturating_sub(old.image.byte_size());
        }

        while self.total_bytes + size > self.limits.quota_bytes && !self.images.is_empty() {
            self.evict_lru();
        }

        if self.total_bytes + size > self.limits.quota_bytes {
            return Err(GraphicsError::QuotaExceeded {
                used: self.total_bytes + size,
                quota: self.limits.quota_bytes,
            });
        }

        self.access_counter += 1;
        log::debug!("stored image {} ({} bytes)", image.id, size);
        self.images.insert(
            image.id,
            StoredEntry {
                image,
                last_access: self.access_counter,
            },
        );
        self.total_bytes += size;
        Ok(())
    }

    /// Evict the least-recently-used image and its placements.
    fn evict_lru(&mut self) {
        let Some(lru_id) = self
            .images
            .iter()
            .min_by_key(|(_, entry)| entry.last_access)
            .map(|(&id, _)| id)
        else {
            return;
        };
        if let Some(entry) = self.images.remove(&lru_id) {
            self.total_bytes = self.total_bytes.saturating_sub(entry.image.byte_size());
            self.placements.retain(|_, p| p.image_id != lru_id);
            log::debug!(
                "evicted image {} ({} bytes), total now {} bytes",
                lru_id,
                entry.image.byte_size(),
                self.total_bytes
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use imgbridge_protocol::{DisplayOptions, Image};

    fn raw_upload(id: u32, size: usize) -> UploadImageParams {
        UploadImageParams {
            img: Image::new(id, vec![0u8; size]),
            more_chunks: false,
            base64: false,
        }
    }

    fn b64_chunk(id: u32, data: &str, more_chunks: bool) -> UploadImageParams {
        UploadImageParams {
            img: Image::new(id, data.as_bytes().to_vec()),
            more_chunks,
            base64: true,
        }
    }

    fn show(image_id: u32, placement_id: u32, z: Option<i32>) -> ShowImageParams {
        ShowImageParams {
            image_id,
            placement_id,
            opts: DisplayOptions {
                z,
                ..Default::default()
            },
        }
    }

    fn limits(quota_bytes: usize, max_image_bytes: usize) -> StoreLimits {
        StoreLimits {
            quota_bytes,
            max_image_bytes,
        }
    }

    #[test]
    fn test_raw_upload_stores_image() {
        let mut store = ImageStore::new();
        let outcome = store.upload(raw_upload(1, 100)).unwrap();
        assert_eq!(
            outcome,
            UploadOutcome::Stored {
                image_id: 1,
                bytes: 100
            }
        );
        assert!(store.has_image(1));
        assert_eq!(store.total_bytes(), 100);
    }

    #[test]
    fn test_base64_upload_is_decoded() {
        let mut store = ImageStore::new();
        store.upload(b64_chunk(2, "AQID", false)).unwrap();
        assert_eq!(store.get_image(2).unwrap().bytes, vec![1, 2, 3]);
    }

    #[test]
    fn test_base64_without_padding_is_accepted() {
        let mut store = ImageStore::new();
        store.upload(b64_chunk(3, "QQ", false)).unwrap();
        assert_eq!(store.get_image(3).unwrap().bytes, b"A");
    }

    #[test]
    fn test_invalid_base64_is_rejected() {
        let mut store = ImageStore::new();
        let err = store.upload(b64_chunk(1, "!!!!", false)).unwrap_err();
        assert!(matches!(err, GraphicsError::Base64Decode(_)));
        assert!(!store.has_image(1));
    }

    #[test]
    fn test_chunked_upload_reassembles() {
        let mut store = ImageStore::new();
        let first = store.upload(b64_chunk(7, "AQID", true)).unwrap();
        assert_eq!(
            first,
            UploadOutcome::Pending {
                image_id: 7,
                buffered: 4
            }
        );
        assert!(store.has_pending_upload());
        assert!(!store.has_image(7));

        // Continuation chunks from kitty usually omit the id.
        store.upload(b64_chunk(0, "BAUG", false)).unwrap();
        assert!(!store.has_pending_upload());
        assert_eq!(store.get_image(7).unwrap().bytes, vec![1, 2, 3, 4, 5, 6]);
    }

    #[test]
    fn test_new_id_discards_stale_transfer() {
        let mut store = ImageStore::new();
        store.upload(b64_chunk(1, "AQID", true)).unwrap();
        store.upload(b64_chunk(2, "BAUG", false)).unwrap();

        assert!(!store.has_image(1));
        assert_eq!(store.get_image(2).unwrap().bytes, vec![4, 5, 6]);
    }

    #[test]
    fn test_upload_without_id_gets_auto_id() {
        let mut store = ImageStore::new();
        store.upload(raw_upload(1, 10)).unwrap();
        let outcome = store.upload(raw_upload(0, 10)).unwrap();
        assert_eq!(
            outcome,
            UploadOutcome::Stored {
                image_id: 2,
                bytes: 10
            }
        );
    }

    #[test]
    fn test_filename_is_kept() {
        let mut store = ImageStore::new();
        let mut params = raw_upload(4, 8);
        params.img.filename = "/tmp/cat.png".into();
        store.upload(params).unwrap();
        assert_eq!(store.get_image(4).unwrap().filename, "/tmp/cat.png");
    }

    #[test]
    fn test_replace_existing_image() {
        let mut store = ImageStore::new();
        store.upload(raw_upload(1, 100)).unwrap();
        store.upload(raw_upload(1, 200)).unwrap();
        assert_eq!(store.image_count(), 1);
        assert_eq!(store.total_bytes(), 200);
    }

    #[test]
    fn test_quota_enforcement() {
        let mut store = ImageStore::with_limits(limits(500, 500));
        store.upload(raw_upload(1, 200)).unwrap();
        store.upload(raw_upload(2, 200)).unwrap();
        store.upload(raw_upload(3, 200)).unwrap();

        assert!(!store.has_image(1));
        assert!(store.has_image(2));
        assert!(store.has_image(3));
        assert!(store.total_bytes() <= 500);
    }

    #[test]
    fn test_lru_eviction_order() {
        let mut store = ImageStore::with_limits(limits(300, 300));
        store.upload(raw_upload(1, 100)).unwrap();
        store.upload(raw_upload(2, 100)).unwrap();
        store.upload(raw_upload(3, 100)).unwrap();

        // Showing image 1 makes it recently used.
        store.show(show(1, 10, None)).unwrap();

        store.upload(raw_upload(4, 100)).unwrap();
        assert!(store.has_image(1));
        assert!(!store.has_image(2));
        assert!(store.has_image(3));
        assert!(store.has_image(4));
    }

    #[test]
    fn test_eviction_drops_placements() {
        let mut store = ImageStore::with_limits(limits(100, 100));
        store.upload(raw_upload(1, 100)).unwrap();
        store.show(show(1, 1, None)).unwrap();

        store.upload(raw_upload(2, 100)).unwrap();
        assert_eq!(store.placement_count(), 0);
    }

    #[test]
    fn test_per_image_size_limit() {
        let mut store = ImageStore::with_limits(limits(1000, 100));
        let err = store.upload(raw_upload(1, 101)).unwrap_err();
        assert!(matches!(
            err,
            GraphicsError::ImageTooLarge { size: 101, max: 100 }
        ));
    }

    #[test]
    fn test_chunk_accumulation_limit() {
        let mut store = ImageStore::with_limits(limits(1000, 3));
        store.upload(b64_chunk(1, "AQID", true)).unwrap();
        let err = store.upload(b64_chunk(0, "BAUG", true)).unwrap_err();
        assert!(matches!(err, GraphicsError::ImageTooLarge { .. }));
        assert!(!store.has_pending_upload());
    }

    #[test]
    fn test_show_unknown_image_fails() {
        let mut store = ImageStore::new();
        let err = store.show(show(99, 1, None)).unwrap_err();
        assert!(matches!(err, GraphicsError::ImageNotFound(99)));
        assert_eq!(store.placement_count(), 0);
    }

    #[test]
    fn test_show_replaces_same_placement() {
        let mut store = ImageStore::new();
        store.upload(raw_upload(1, 10)).unwrap();
        store.upload(raw_upload(2, 10)).unwrap();
        store.show(show(1, 5, None)).unwrap();
        store.show(show(2, 5, Some(3))).unwrap();

        let visible = store.visible_placements();
        assert_eq!(visible.len(), 1);
        assert_eq!(visible[0].image_id, 2);
    }

    #[test]
    fn test_hide_removes_listed_placements() {
        let mut store = ImageStore::new();
        store.upload(raw_upload(1, 10)).unwrap();
        store.show(show(1, 1, None)).unwrap();
        store.show(show(1, 2, None)).unwrap();
        store.show(show(1, 3, None)).unwrap();

        assert_eq!(store.hide(&[1, 3, 42]), 2);
        let remaining: Vec<u32> = store
            .visible_placements()
            .iter()
            .map(|p| p.placement_id)
            .collect();
        assert_eq!(remaining, vec![2]);
        assert!(store.has_image(1));
    }

    #[test]
    fn test_visible_placements_sorted_by_z() {
        let mut store = ImageStore::new();
        store.upload(raw_upload(1, 10)).unwrap();
        store.show(show(1, 1, Some(5))).unwrap();
        store.show(show(1, 2, Some(-1))).unwrap();
        store.show(show(1, 3, None)).unwrap();

        let order: Vec<u32> = store
            .visible_placements()
            .iter()
            .map(|p| p.placement_id)
            .collect();
        assert_eq!(order, vec![2, 3, 1]);
    }
}
