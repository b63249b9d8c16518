//! Graphics protocol parsers.
//!
//! - [`kitty`]: Kitty graphics protocol (APC-based)

pub mod kitty;
