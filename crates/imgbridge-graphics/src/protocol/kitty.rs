//! Kitty graphics protocol record parser.
//!
//! The Kitty graphics protocol uses APC (Application Program Command) escape
//! sequences to transmit and place images:
//!
//! ```text
//! APC G <key>=<value>,<key>=<value>,...;<base64-data> ST
//! ```
//!
//! Where APC = `\x1b_` and ST = `\x1b\\` (or `\x07` as BEL terminator).
//!
//! Parsing keeps every field optional: the decoder applies its own defaults,
//! so "absent" and "zero" must stay distinguishable here.
//!
//! Reference: <https://sw.kovidgoyal.net/kitty/graphics-protocol/>

use crate::error::GraphicsError;

const APC_START: &[u8] = b"\x1b_G";
const ST: &[u8] = b"\x1b\\";
const BEL: u8 = 0x07;

/// One kitty graphics command with its keys left optional.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct KittyRecord {
    /// `a`: action (`t` transmit, `T` transmit+display, `p` put, `d` delete, ...).
    pub action: Option<String>,
    /// `i`: image id.
    pub image_id: Option<u32>,
    /// Payload after `;`, still base64 text.
    pub data: Option<Vec<u8>>,
    /// `m`: `1` while more chunks follow.
    pub more: Option<u32>,
    /// `p`: placement id.
    pub placement_id: Option<u32>,
    /// `x`, `y`: source rectangle origin in pixels.
    pub x: Option<u32>,
    pub y: Option<u32>,
    /// `w`, `h`: source rectangle extent in pixels.
    pub w: Option<u32>,
    pub h: Option<u32>,
    /// `c`: display columns.
    pub columns: Option<u32>,
    /// `r`: display rows.
    pub rows: Option<u32>,
    /// `z`: z-index, negative draws under text.
    pub z: Option<i32>,
}

impl KittyRecord {
    /// True when the record carries a non-empty payload.
    pub fn has_payload(&self) -> bool {
        self.data.as_ref().is_some_and(|d| !d.is_empty())
    }
}

/// Strip the `ESC _ G` introducer and the `ST`/BEL terminator.
///
/// Returns `None` when `input` does not start with the APC graphics
/// introducer. A missing terminator is tolerated.
pub fn strip_apc(input: &[u8]) -> Option<&[u8]> {
    let body = input.strip_prefix(APC_START)?;
    let body = body
        .strip_suffix(ST)
        .or_else(|| body.strip_suffix(&[BEL]))
        .unwrap_or(body);
    Some(body)
}

/// Parse the content between `APC G` and `ST`.
///
/// Format: `key=value,key=value,...;payload`. Unknown keys are ignored.
///
/// # Errors
///
/// Returns `GraphicsError::ParseError` for non-UTF-8 input, a pair without
/// `=`, or a numeric key whose value does not parse.
pub fn parse_kitty_record(input: &[u8]) -> Result<KittyRecord, GraphicsError> {
    let input_str = std::str::from_utf8(input)
        .map_err(|e| GraphicsError::ParseError(format!("invalid UTF-8: {e}")))?;

    let mut record = KittyRecord::default();

    let params_str = match input_str.split_once(';') {
        Some((params, payload)) => {
            record.data = Some(payload.as_bytes().to_vec());
            params
        }
        None => input_str,
    };

    for pair in params_str.split(',') {
        if pair.is_empty() {
            continue;
        }
        let Some((key, value)) = pair.split_once('=') else {
            return Err(GraphicsError::ParseError(format!(
                "invalid key-value pair: {pair}"
            )));
        };

        match key {
            "a" => record.action = Some(value.to_string()),
            "i" => record.image_id = Some(parse_u32(value, "image id")?),
            "m" => record.more = Some(parse_u32(value, "more flag")?),
            "p" => record.placement_id = Some(parse_u32(value, "placement id")?),
            "x" => record.x = Some(parse_u32(value, "source x")?),
            "y" => record.y = Some(parse_u32(value, "source y")?),
            "w" => record.w = Some(parse_u32(value, "source width")?),
            "h" => record.h = Some(parse_u32(value, "source height")?),
            "c" => record.columns = Some(parse_u32(value, "display columns")?),
            "r" => record.rows = Some(parse_u32(value, "display rows")?),
            "z" => {
                record.z = Some(
                    value
                        .parse::<i32>()
                        .map_err(|e| GraphicsError::ParseError(format!("invalid z-index: {e}")))?,
                );
            }
            // Format, transmission medium, compression and friends are the
            // host's business; the bridge forwards the payload untouched.
            _ => {
                log::trace!("ignoring kitty graphics key: {key}={value}");
            }
        }
    }

    Ok(record)
}

/// Parse a string as u32, providing a contextual error message.
fn parse_u32(value: &str, context: &str) -> Result<u32, GraphicsError> {
    value
        .parse::<u32>()
        .map_err(|e| GraphicsError::ParseError(format!("invalid {context}: {e}")))
}
