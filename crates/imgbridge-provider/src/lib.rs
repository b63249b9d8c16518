//! Editor-facing image provider.
//!
//! The editor's image subsystem talks to an [`ImageProvider`]; the only
//! provider here, [`RpcImageProvider`], forwards every call to the host as a
//! one-way notification and keeps just enough state to upload each image
//! once and to number placements.

mod provider;
mod registry;

pub use provider::{ImageProvider, RpcImageProvider};
pub use registry::ProviderRegistry;
