// gatedeck-api: async clients for the gateway Admin API and the managed
// control-plane API, built through one shared transport factory.

pub mod client;
pub mod cookies;
pub mod error;
pub mod gateway;
pub mod managed;
pub mod models;
pub mod tls;
pub mod transport;

pub use client::ApiClient;
pub use cookies::{CookieJarLoader, NetscapeCookieFile};
pub use error::Error;
pub use gateway::{Collection, GatewayClient};
pub use managed::{Credentials, DocumentParent, ManagedClient, Session};
pub use models::{ControlPlane, Entity};
pub use tls::TlsOptions;
pub use transport::{
    ClientConfig, CookieJarSource, build_client, build_client_with_loader, clean_address,
    parse_headers,
};
