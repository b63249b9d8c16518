//! Output formatting for CLI commands.

use imgbridge_graphics::{Dispatch, ImageFragment};
use imgbridge_protocol::Notification;

/// One JSON object per notification, in the order they were sent.
pub fn notification_lines(sent: &[Notification]) -> Vec<String> {
    sent.iter()
        .map(|n| {
            serde_json::json!({
                "method": n.method,
                "params": n.params,
            })
            .to_string()
        })
        .collect()
}

pub fn print_notifications(sent: &[Notification]) {
    for line in notification_lines(sent) {
        println!("{line}");
    }
}

/// One JSON object per placeholder fragment.
pub fn fragment_lines(fragments: &[ImageFragment]) -> Vec<String> {
    fragments
        .iter()
        .map(|f| {
            serde_json::json!({
                "image_id": f.image_id,
                "placement_id": f.placement_id,
                "dst_col": f.dst_col,
                "src_row": f.src_row,
                "src_cols": [f.src_range.start, f.src_range.end],
            })
            .to_string()
        })
        .collect()
}

pub fn print_fragments(fragments: &[ImageFragment]) {
    for line in fragment_lines(fragments) {
        println!("{line}");
    }
}

pub fn dispatch_label(dispatch: Dispatch) -> &'static str {
    match dispatch {
        Dispatch::Upload => "upload",
        Dispatch::Show => "show",
        Dispatch::Dropped => "dropped",
    }
}
