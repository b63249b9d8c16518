//! JSON-RPC and bridge-specific error code constants.

// Standard JSON-RPC
pub const METHOD_NOT_FOUND: i32 = -32601;
pub const INVALID_PARAMS: i32 = -32602;

// Bridge-specific
/// A request carried an `id` but image methods are one-way notifications.
pub const NOTIFICATION_EXPECTED: i32 = -2001;
