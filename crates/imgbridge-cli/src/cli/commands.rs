//! CLI command definitions using clap derive macros.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// Forward images to a host terminal as RPC notifications
#[derive(Parser)]
#[command(name = "imgbridge", version, about)]
pub struct CliArgs {
    /// Print notifications as JSON lines instead of sending them
    #[arg(long, global = true)]
    pub dry_run: bool,

    /// Config file (default: $IMGBRIDGE_CONFIG or the platform config dir)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: CliCommand,
}

#[derive(Subcommand)]
pub enum CliCommand {
    /// Upload an image file (once) and show it, printing the placement id
    Show {
        /// Image file to send
        file: PathBuf,

        /// Image id (default: derived from the file path)
        #[arg(long)]
        id: Option<u32>,

        /// Display width in cells
        #[arg(long, requires = "rows")]
        cols: Option<i32>,

        /// Display height in cells
        #[arg(long, requires = "cols")]
        rows: Option<i32>,

        /// Z-index; negative draws under text
        #[arg(long, allow_hyphen_values = true)]
        z: Option<i32>,
    },

    /// Hide placements
    Hide {
        /// Placement ids
        #[arg(required = true)]
        ids: Vec<u32>,
    },

    /// Decode one kitty graphics sequence (full APC or bare body)
    Kitty {
        /// `ESC _ G ... ESC \` or just `a=t,i=1;...`
        sequence: String,
    },

    /// Split a run of kitty Unicode placeholders into image fragments
    Placeholder {
        /// Text starting with U+10EEEE cells and their diacritics
        text: String,

        /// Foreground color carrying the image id (`#RRGGBB` or `0xRRGGBB`)
        #[arg(long, value_parser = parse_color)]
        fg: u32,

        /// Underline color carrying the placement id
        #[arg(long, value_parser = parse_color)]
        underline: Option<u32>,

        /// Grid column of the first cell
        #[arg(long, default_value_t = 0)]
        column: u32,
    },

    /// Receive notifications and keep an image store
    Serve,
}

/// Parse a 24-bit color written as `#RRGGBB`, `0xRRGGBB` or `RRGGBB`.
fn parse_color(s: &str) -> Result<u32, String> {
    let hex = s
        .strip_prefix('#')
        .or_else(|| s.strip_prefix("0x"))
        .unwrap_or(s);
    if hex.is_empty() || hex.len() > 6 {
        return Err(format!("expected up to six hex digits, got {s:?}"));
    }
    u32::from_str_radix(hex, 16).map_err(|e| format!("invalid color {s:?}: {e}"))
}
