// Managed API HTTP client
//
// Owns the cookie jar that receives the session cookie on login. The
// gateway client for a control plane is later built with the same jar so
// proxied Admin API calls are authorized by that session.

use std::sync::Arc;

use reqwest::cookie::Jar;
use url::Url;

use crate::client::ApiClient;
use crate::error::Error;
use crate::transport::{ClientConfig, build_client};

/// Base address of the hosted managed API.
pub const DEFAULT_ADDRESS: &str = "https://konnect.konghq.com";

/// Client for the managed control-plane API.
#[derive(Debug, Clone)]
pub struct ManagedClient {
    api: ApiClient,
}

impl ManagedClient {
    /// Build a client from config through the shared factory.
    ///
    /// If the config doesn't already include a cookie jar, a fresh one is
    /// attached (session auth requires cookies).
    pub fn new(config: &ClientConfig) -> Result<Self, Error> {
        let api = if config.cookie_jar.is_some() {
            build_client(config)?
        } else {
            build_client(&config.with_cookie_jar(Arc::new(Jar::default())))?
        };
        Ok(Self { api })
    }

    pub fn api(&self) -> &ApiClient {
        &self.api
    }

    /// The managed API base URL.
    pub fn base_url(&self) -> &Url {
        self.api.base_url()
    }

    /// Address of the Admin API proxy for one control plane:
    /// `{base}/api/control_planes/{id}`.
    pub fn control_plane_address(&self, control_plane_id: &str) -> String {
        format!(
            "{}/api/control_planes/{control_plane_id}",
            self.base_url().as_str().trim_end_matches('/')
        )
    }
}
