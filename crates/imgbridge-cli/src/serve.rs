//! `imgbridge serve`: the receiving end, applying notifications to an image store.

use anyhow::Context;
use imgbridge_config::BridgeConfig;
use imgbridge_graphics::{ImageStore, StoreLimits, UploadOutcome};
use imgbridge_ipc::HostCommand;

pub fn run(config: &BridgeConfig) -> anyhow::Result<()> {
    let limits = StoreLimits {
        quota_bytes: config.store.quota_bytes(),
        max_image_bytes: config.store.max_image_bytes(),
    };
    let mut store = ImageStore::with_limits(limits);

    let mut host = imgbridge_ipc::start_host(config.rpc.socket.as_deref(), &config.rpc.namespace)
        .context("failed to start image host")?;
    println!("{}", host.socket_path.display());

    while let Some(cmd) = host.commands.blocking_recv() {
        apply(&mut store, cmd);
    }

    host.cancel.cancel();
    Ok(())
}

/// Apply one command, logging the result. Store errors never stop the loop.
pub(crate) fn apply(store: &mut ImageStore, cmd: HostCommand) {
    let op = cmd.op();
    let result = match cmd {
        HostCommand::Upload(params) => store.upload(params).map(|outcome| match outcome {
            UploadOutcome::Pending { image_id, buffered } => {
                log::debug!("image {image_id}: {buffered} bytes buffered");
            }
            UploadOutcome::Stored { image_id, bytes } => {
                log::info!(
                    "stored image {image_id} ({bytes} bytes, {} images, {} bytes total)",
                    store.image_count(),
                    store.total_bytes()
                );
            }
        }),
        HostCommand::Show(params) => {
            let (image_id, placement_id) = (params.image_id, params.placement_id);
            store.show(params).map(|()| {
                log::info!("showing image {image_id} as placement {placement_id}");
            })
        }
        HostCommand::Hide(params) => {
            let removed = store.hide(&params.ids);
            log::info!("hid {removed} of {} placements", params.ids.len());
            Ok(())
        }
    };

    if let Err(e) = result {
        log::warn!("{op} failed: {e}");
    }
    log::debug!("{} placements visible", store.placement_count());
}
