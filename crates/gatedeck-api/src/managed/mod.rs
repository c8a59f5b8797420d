// Managed control-plane API client modules
//
// Cookie-session login, control-plane lookup, and the packaging/document
// resources that live only on the managed backend.

pub mod auth;
pub mod client;
pub mod control_planes;
pub mod packages;

pub use auth::{Credentials, Session};
pub use client::{DEFAULT_ADDRESS, ManagedClient};
pub use packages::DocumentParent;
