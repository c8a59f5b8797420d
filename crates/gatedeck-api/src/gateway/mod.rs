// Gateway Admin API client modules
//
// Read-only access to the entity collections of one gateway (or one
// control plane proxied by the managed API), scoped by the base URL the
// client was built with.

pub mod client;
pub mod collections;

pub use client::GatewayClient;
pub use collections::Collection;
