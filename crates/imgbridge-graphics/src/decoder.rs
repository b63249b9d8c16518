//! Turns kitty graphics records into image notifications.
//!
//! Each record is handled on its own: a transmit becomes `img.upload`, a
//! placement becomes `img.show`, anything else is dropped. The decoder keeps
//! no state and never checks whether an image was uploaded before it is
//! shown; sequencing is up to whoever produced the escape sequences.

use imgbridge_protocol::{
    DisplayOptions, Image, ImgChannel, Position, Region, Relative, ShowImageParams, Size,
    UploadImageParams,
};

use crate::protocol::kitty::KittyRecord;

/// What a record turned into.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dispatch {
    Upload,
    Show,
    Dropped,
}

/// Pick the branch for a record.
///
/// Upload wins when the action is absent or `t` and the record either has a
/// payload or names no placement. Otherwise a non-zero placement id makes it
/// a show.
pub fn classify(record: &KittyRecord) -> Dispatch {
    let transmit = matches!(record.action.as_deref(), None | Some("t"));
    let placement = record.placement_id.is_some_and(|p| p != 0);

    if transmit && (record.has_payload() || !placement) {
        Dispatch::Upload
    } else if placement {
        Dispatch::Show
    } else {
        Dispatch::Dropped
    }
}

/// Params for the upload branch. Kitty payloads are always base64 text.
pub fn upload_params(record: &KittyRecord) -> UploadImageParams {
    UploadImageParams {
        img: Image::new(
            record.image_id.unwrap_or(0),
            record.data.clone().unwrap_or_default(),
        ),
        more_chunks: record.more == Some(1),
        base64: true,
    }
}

/// Params for the placement branch.
pub fn show_params(record: &KittyRecord) -> ShowImageParams {
    ShowImageParams {
        image_id: record.image_id.unwrap_or(0),
        placement_id: record.placement_id.unwrap_or(0),
        opts: DisplayOptions {
            relative: Some(Relative::Placement),
            crop: Some(crop_region(record)),
            pos: None,
            size: Some(display_size(record)),
            win: None,
            z: Some(record.z.unwrap_or(0)),
        },
    }
}

/// Source rectangle in pixels. Built even when every coordinate is absent.
fn crop_region(record: &KittyRecord) -> Region {
    let x = to_i32(record.x.unwrap_or(0));
    let y = to_i32(record.y.unwrap_or(0));
    let w = to_i32(record.w.unwrap_or(0));
    let h = to_i32(record.h.unwrap_or(0));
    Region {
        pos1: Position::pixel(x, y),
        pos2: Position::pixel(x.saturating_add(w), y.saturating_add(h)),
    }
}

/// Display size in cells. Built even when `c` and `r` are absent.
fn display_size(record: &KittyRecord) -> Size {
    Size::cells(
        to_i32(record.columns.unwrap_or(0)),
        to_i32(record.rows.unwrap_or(0)),
    )
}

fn to_i32(value: u32) -> i32 {
    i32::try_from(value).unwrap_or(i32::MAX)
}

/// Emits the notification a record calls for.
#[derive(Debug, Clone)]
pub struct KittyDecoder {
    channel: ImgChannel,
}

impl KittyDecoder {
    pub fn new(channel: ImgChannel) -> Self {
        Self { channel }
    }

    pub fn decode(&self, record: &KittyRecord) -> Dispatch {
        let dispatch = classify(record);
        match dispatch {
            Dispatch::Upload => self.channel.upload(&upload_params(record)),
            Dispatch::Show => self.channel.show(&show_params(record)),
            Dispatch::Dropped => {
                log::trace!(
                    "dropping kitty record (action={:?}, placement={:?})",
                    record.action,
                    record.placement_id
                );
            }
        }
        dispatch
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::protocol::kitty::parse_kitty_record;
    use imgbridge_protocol::{method, MemoryNotifier};
    use serde_json::json;

    fn decoder() -> (KittyDecoder, Arc<MemoryNotifier>) {
        let sink = Arc::new(MemoryNotifier::new());
        let channel = ImgChannel::new("neovide", sink.clone());
        (KittyDecoder::new(channel), sink)
    }

    #[test]
    fn transmit_without_action_uploads_base64() {
        let (decoder, sink) = decoder();
        let record = KittyRecord {
            data: Some(b"ABC".to_vec()),
            ..Default::default()
        };

        assert_eq!(decoder.decode(&record), Dispatch::Upload);

        let sent = sink.sent();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].method, "neovide.img.upload");
        let params: UploadImageParams = serde_json::from_value(sent[0].params.clone()).unwrap();
        assert!(params.base64);
        assert!(!params.more_chunks);
        assert_eq!(params.img.bytes, b"ABC");
        assert_eq!(params.img.id, 0);
        assert!(params.img.filename.is_empty());
    }

    #[test]
    fn placement_record_shows_with_crop_and_size() {
        let (decoder, sink) = decoder();
        let record = KittyRecord {
            image_id: Some(5),
            placement_id: Some(3),
            x: Some(0),
            y: Some(0),
            w: Some(10),
            h: Some(20),
            columns: Some(2),
            rows: Some(4),
            z: Some(1),
            ..Default::default()
        };

        assert_eq!(decoder.decode(&record), Dispatch::Show);

        let sent = sink.sent();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].method, "neovide.img.show");
        assert_eq!(
            sent[0].params,
            json!({
                "image_id": 5,
                "placement_id": 3,
                "opts": {
                    "relative": "placement",
                    "crop": {
                        "pos1": {"x": 0, "y": 0, "unit": "pixel"},
                        "pos2": {"x": 10, "y": 20, "unit": "pixel"}
                    },
                    "size": {"width": 2, "height": 4, "unit": "cell"},
                    "z": 1
                }
            })
        );
    }

    #[test]
    fn other_actions_without_placement_are_dropped() {
        let (decoder, sink) = decoder();
        let bodies: [&[u8]; 4] = [b"a=d,d=a", b"a=q,i=1;AAAA", b"a=p,i=1", b"a=p,i=1,p=0"];
        for body in bodies {
            let record = parse_kitty_record(body).unwrap();
            assert_eq!(decoder.decode(&record), Dispatch::Dropped, "{body:?}");
        }
        assert!(sink.sent().is_empty());
    }

    #[test]
    fn more_flag_maps_to_more_chunks() {
        let first = parse_kitty_record(b"a=t,i=9,m=1;AAAA").unwrap();
        assert!(upload_params(&first).more_chunks);

        let last = parse_kitty_record(b"m=0;BBBB").unwrap();
        assert!(!upload_params(&last).more_chunks);
    }

    #[test]
    fn transmit_with_payload_and_placement_uploads() {
        let record = parse_kitty_record(b"a=t,i=1,p=2;AAAA").unwrap();
        assert_eq!(classify(&record), Dispatch::Upload);
    }

    #[test]
    fn bare_final_chunk_still_uploads() {
        let record = parse_kitty_record(b"m=0;").unwrap();
        assert_eq!(classify(&record), Dispatch::Upload);
    }

    #[test]
    fn put_action_with_placement_shows() {
        let record = parse_kitty_record(b"a=p,i=4,p=2").unwrap();
        assert_eq!(classify(&record), Dispatch::Show);
    }

    #[test]
    fn show_defaults_build_zero_region_and_size() {
        let record = parse_kitty_record(b"a=p,p=1").unwrap();
        let params = show_params(&record);
        assert_eq!(params.image_id, 0);
        assert_eq!(
            params.opts.crop,
            Some(Region {
                pos1: Position::pixel(0, 0),
                pos2: Position::pixel(0, 0),
            })
        );
        assert_eq!(params.opts.size, Some(Size::cells(0, 0)));
        assert_eq!(params.opts.z, Some(0));
        assert!(params.opts.pos.is_none());
    }

    #[test]
    fn crop_offsets_extent_by_origin() {
        let record = parse_kitty_record(b"a=p,p=1,x=5,y=6,w=100,h=75").unwrap();
        let crop = show_params(&record).opts.crop.unwrap();
        assert_eq!(crop.pos1, Position::pixel(5, 6));
        assert_eq!(crop.pos2, Position::pixel(105, 81));
    }

    #[test]
    fn decoder_never_consults_upload_history() {
        let (decoder, sink) = decoder();
        let record = parse_kitty_record(b"a=t,i=1;AAAA").unwrap();
        decoder.decode(&record);
        decoder.decode(&record);
        assert_eq!(sink.sent_op(method::IMG_UPLOAD).len(), 2);
    }
}
