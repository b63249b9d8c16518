//! Core image types shared by the editor side and the host side.

use std::fmt;

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// JSON-RPC 2.0 identifier
// ---------------------------------------------------------------------------

/// JSON-RPC 2.0 request/response identifier.
/// Can be a number, string, or null.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum JsonRpcId {
    Number(u64),
    String(String),
    Null,
}

impl fmt::Display for JsonRpcId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            JsonRpcId::Number(n) => write!(f, "{n}"),
            JsonRpcId::String(s) => write!(f, "{s}"),
            JsonRpcId::Null => write!(f, "null"),
        }
    }
}

// ---------------------------------------------------------------------------
// Image
// ---------------------------------------------------------------------------

/// An image as handed over by the editor or decoded from a kitty record.
///
/// `id == 0` means the sender did not pick an id.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Image {
    #[serde(default)]
    pub id: u32,
    /// Encoded image content. Base64 text when the upload says so.
    ///
    /// Independently of that, the JSON wire form is always a base64 string.
    #[serde(default, with = "crate::wire")]
    pub bytes: Vec<u8>,
    /// Path on disk, empty when the image came from memory.
    #[serde(default)]
    pub filename: String,
}

impl Image {
    pub fn new(id: u32, bytes: Vec<u8>) -> Self {
        Self {
            id,
            bytes,
            filename: String::new(),
        }
    }

    pub fn with_filename(mut self, filename: impl Into<String>) -> Self {
        self.filename = filename.into();
        self
    }
}

// ---------------------------------------------------------------------------
// Display options
// ---------------------------------------------------------------------------

/// What the placement position is relative to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Relative {
    Win,
    Cursor,
    Mouse,
    Placement,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Unit {
    Cell,
    Pixel,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Position {
    pub x: i32,
    pub y: i32,
    pub unit: Unit,
}

impl Position {
    pub fn pixel(x: i32, y: i32) -> Self {
        Self {
            x,
            y,
            unit: Unit::Pixel,
        }
    }

    pub fn cell(x: i32, y: i32) -> Self {
        Self {
            x,
            y,
            unit: Unit::Cell,
        }
    }
}

/// Rectangle between two corners, `pos1` top-left and `pos2` bottom-right.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Region {
    pub pos1: Position,
    pub pos2: Position,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Size {
    pub width: i32,
    pub height: i32,
    pub unit: Unit,
}

impl Size {
    pub fn cells(width: i32, height: i32) -> Self {
        Self {
            width,
            height,
            unit: Unit::Cell,
        }
    }
}

/// Options attached to a `show` notification.
///
/// The provider adapter forwards whatever the editor passed, so every field
/// stays optional and absent fields are left off the wire.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DisplayOptions {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub relative: Option<Relative>,
    /// Portion of the image to display.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub crop: Option<Region>,
    /// Upper-left position of the image within the editor.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pos: Option<Position>,
    /// Explicit size to scale the image to.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size: Option<Size>,
    /// Window to use when `relative` is `win`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub win: Option<i32>,
    /// Lower values are drawn first.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub z: Option<i32>,
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
