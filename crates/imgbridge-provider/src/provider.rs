use std::collections::HashSet;

use imgbridge_protocol::{
    DisplayOptions, HideImagesParams, Image, ImgChannel, ShowImageParams, UploadImageParams,
};

/// Capability set the editor expects from an image backend.
pub trait ImageProvider {
    /// Whether this backend can display images at all.
    fn supported(&self) -> bool;

    /// Called when the editor activates the provider.
    fn load(&mut self);

    /// Called when the editor deactivates the provider.
    fn unload(&mut self);

    /// Display `image` with `opts` and return the new placement id.
    fn show(&mut self, image: &Image, opts: &DisplayOptions) -> u32;

    /// Remove the given placements.
    fn hide(&mut self, ids: &[u32]);

    /// Change a placement's options and return the id it now has.
    fn update(&mut self, placement_id: u32, opts: &DisplayOptions) -> u32;
}

/// Provider that delegates rendering to the host terminal.
///
/// Sends `upload` the first time an image id is shown, then `show` for every
/// placement. Notification failures are logged by the channel and never
/// reach the editor.
#[derive(Debug)]
pub struct RpcImageProvider {
    channel: ImgChannel,
    /// Ids already uploaded. Grows for the lifetime of the provider.
    loaded: HashSet<u32>,
    next_placement_id: u32,
}

impl RpcImageProvider {
    pub fn new(channel: ImgChannel) -> Self {
        Self::with_next_placement_id(channel, 1)
    }

    /// Start numbering placements at `next` instead of 1, for callers that
    /// continue a numbering across provider instances. 0 is bumped to 1.
    pub fn with_next_placement_id(channel: ImgChannel, next: u32) -> Self {
        Self {
            channel,
            loaded: HashSet::new(),
            next_placement_id: next.max(1),
        }
    }

    pub fn is_loaded(&self, image_id: u32) -> bool {
        self.loaded.contains(&image_id)
    }

    pub fn loaded_count(&self) -> usize {
        self.loaded.len()
    }

    fn upload_once(&mut self, image: &Image) {
        if self.loaded.contains(&image.id) {
            return;
        }
        let params = UploadImageParams {
            img: image.clone(),
            more_chunks: false,
            base64: false,
        };
        match self.channel.try_upload(&params) {
            Ok(()) => {
                self.loaded.insert(image.id);
            }
            Err(e) => {
                log::warn!("upload of image {} failed, retrying on next show: {e}", image.id);
            }
        }
    }
}

impl ImageProvider for RpcImageProvider {
    fn supported(&self) -> bool {
        true
    }

    fn load(&mut self) {
        log::debug!("image provider loaded (namespace {})", self.channel.namespace());
    }

    fn unload(&mut self) {
        log::debug!("image provider unloaded");
    }

    fn show(&mut self, image: &Image, opts: &DisplayOptions) -> u32 {
        self.upload_once(image);

        let placement_id = self.next_placement_id;
        self.channel.show(&ShowImageParams {
            image_id: image.id,
            placement_id,
            opts: opts.clone(),
        });
        self.next_placement_id = self.next_placement_id.wrapping_add(1).max(1);
        placement_id
    }

    fn hide(&mut self, ids: &[u32]) {
        self.channel.hide(&HideImagesParams { ids: ids.to_vec() });
    }

    fn update(&mut self, placement_id: u32, _opts: &DisplayOptions) -> u32 {
        placement_id
    }
}
