//! Command dispatch for the `imgbridge` binary.

pub mod client;
pub mod commands;
pub mod output;
pub mod state;

use std::os::unix::ffi::OsStrExt;
use std::path::Path;

use anyhow::Context;
use imgbridge_config::BridgeConfig;
use imgbridge_graphics::{parse_kitty_record, parse_placeholders, strip_apc, KittyDecoder};
use imgbridge_protocol::{DisplayOptions, Image, ImgChannel, Size};
use imgbridge_provider::{ProviderRegistry, RpcImageProvider};

use client::Sink;
use commands::{CliArgs, CliCommand};
use state::PlacementCounter;

const PROVIDER_NAME: &str = "imgbridge";

pub fn run(args: CliArgs) -> anyhow::Result<()> {
    let config = match &args.config {
        Some(path) => BridgeConfig::load_from(path),
        None => BridgeConfig::load(),
    }
    .context("failed to load config")?;
    let dry_run = args.dry_run;

    match args.command {
        CliCommand::Show {
            file,
            id,
            cols,
            rows,
            z,
        } => {
            let bytes = std::fs::read(&file)
                .with_context(|| format!("failed to read {}", file.display()))?;
            let id = id.unwrap_or_else(|| image_id_for(&file));
            let image = Image::new(id, bytes).with_filename(file.display().to_string());
            let opts = DisplayOptions {
                size: cols.zip(rows).map(|(c, r)| Size::cells(c, r)),
                z,
                ..Default::default()
            };

            with_sink(dry_run, &config, |sink| {
                let channel = sink.channel(&config.rpc.namespace);
                let counter = sink.placement_counter();
                let placement_id = show_image(channel, counter.as_ref(), &image, &opts);
                println!("{placement_id}");
                Ok(())
            })
        }
        CliCommand::Hide { ids } => with_sink(dry_run, &config, |sink| {
            let channel = sink.channel(&config.rpc.namespace);
            let mut registry = ProviderRegistry::new(RpcImageProvider::new(channel));
            registry.load(PROVIDER_NAME).hide(&ids);
            Ok(())
        }),
        CliCommand::Kitty { sequence } => {
            let bytes = sequence.as_bytes();
            let body = strip_apc(bytes).unwrap_or(bytes);
            let record = parse_kitty_record(body).context("invalid kitty graphics record")?;
            with_sink(dry_run, &config, |sink| {
                let channel = sink.channel(&config.rpc.namespace);
                let dispatch = KittyDecoder::new(channel).decode(&record);
                log::info!("kitty record: {}", output::dispatch_label(dispatch));
                Ok(())
            })
        }
        CliCommand::Placeholder {
            text,
            fg,
            underline,
            column,
        } => {
            let fragments = parse_placeholders(&text, column, fg, underline.unwrap_or(0))
                .context("text does not start with U+10EEEE")?;
            output::print_fragments(&fragments);
            Ok(())
        }
        CliCommand::Serve => crate::serve::run(&config),
    }
}

/// Open the sink, run `f` on it, then print anything recorded.
fn with_sink(
    dry_run: bool,
    config: &BridgeConfig,
    f: impl FnOnce(&Sink) -> anyhow::Result<()>,
) -> anyhow::Result<()> {
    let sink = Sink::open(dry_run, config.rpc.socket.as_deref())?;
    f(&sink)?;
    output::print_notifications(&sink.recorded());
    Ok(())
}

/// Show `image` through a one-shot provider.
///
/// Placement ids continue from `counter` so that separate runs against the
/// same host never reuse one.
fn show_image(
    channel: ImgChannel,
    counter: Option<&PlacementCounter>,
    image: &Image,
    opts: &DisplayOptions,
) -> u32 {
    let next = counter.map_or(1, PlacementCounter::load);
    let mut registry =
        ProviderRegistry::new(RpcImageProvider::with_next_placement_id(channel, next));
    let provider = registry.load(PROVIDER_NAME);
    provider.load();
    let placement_id = provider.show(image, opts);
    if let Some(counter) = counter {
        if let Err(e) = counter.save_after(placement_id) {
            log::warn!("placement counter not saved: {e:#}");
        }
    }
    placement_id
}

/// Non-zero id for a file: 32-bit FNV-1a of its canonical path bytes.
fn image_id_for(path: &Path) -> u32 {
    const FNV_OFFSET: u32 = 0x811c_9dc5;
    const FNV_PRIME: u32 = 0x0100_0193;

    let canonical = path.canonicalize().unwrap_or_else(|_| path.to_path_buf());
    let hash = canonical
        .as_os_str()
        .as_bytes()
        .iter()
        .fold(FNV_OFFSET, |h, &b| (h ^ u32::from(b)).wrapping_mul(FNV_PRIME));
    hash.max(1)
}
