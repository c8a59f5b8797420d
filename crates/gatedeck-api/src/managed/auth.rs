// Managed API authentication
//
// Cookie-based session login. The login endpoint sets a session cookie in
// the client's jar; subsequent requests (including those of a gateway
// client built with the same jar) use that cookie automatically.

use std::sync::Arc;

use reqwest::StatusCode;
use reqwest::cookie::Jar;
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use serde_json::json;
use tracing::{debug, warn};

use crate::client::ensure_success;
use crate::error::Error;
use crate::managed::client::ManagedClient;

/// Email + password, consumed by a single login call.
#[derive(Debug, Clone)]
pub struct Credentials {
    pub email: String,
    pub password: SecretString,
}

impl Credentials {
    pub fn new(email: impl Into<String>, password: SecretString) -> Self {
        Self {
            email: email.into(),
            password,
        }
    }
}

/// Authentication context returned by [`ManagedClient::login`].
///
/// Holds the cookie jar carrying the session cookie. Lives for one dump.
#[derive(Debug, Clone)]
pub struct Session {
    cookie_jar: Arc<Jar>,
    user_id: Option<String>,
    org_id: Option<String>,
}

impl Session {
    /// The jar holding the session cookie; share it with scoped clients.
    pub fn cookie_jar(&self) -> Arc<Jar> {
        Arc::clone(&self.cookie_jar)
    }

    pub fn user_id(&self) -> Option<&str> {
        self.user_id.as_deref()
    }

    pub fn org_id(&self) -> Option<&str> {
        self.org_id.as_deref()
    }
}

#[derive(Debug, Default, Deserialize)]
struct LoginResponse {
    #[serde(default)]
    id: Option<String>,
    #[serde(default)]
    org_id: Option<String>,
}

impl ManagedClient {
    /// Authenticate with email/password.
    ///
    /// `POST /api/auth` with `{"username": ..., "password": ...}`. On
    /// success the session cookie lands in the client's jar. No retry:
    /// rejected credentials and transport failures surface immediately.
    pub async fn login(&self, credentials: Credentials) -> Result<Session, Error> {
        debug!(email = %credentials.email, "logging in");

        let body = json!({
            "username": credentials.email,
            "password": credentials.password.expose_secret(),
        });
        drop(credentials);

        let resp = self.api().post_json("api/auth", &body).await?;

        if resp.status == StatusCode::UNAUTHORIZED || resp.status == StatusCode::FORBIDDEN {
            return Err(Error::Authentication {
                message: format!("login failed (HTTP {}): {}", resp.status, resp.body.trim()),
            });
        }
        let resp = ensure_success(resp)?;

        let cookie_jar = self
            .api()
            .cookie_jar()
            .cloned()
            .ok_or_else(|| Error::Authentication {
                message: "client has no cookie jar to hold the session".into(),
            })?;
        if self.api().cookie_header().is_none() {
            warn!("login succeeded but no session cookie was set");
        }

        let info: LoginResponse = serde_json::from_str(&resp.body).unwrap_or_default();
        debug!(user_id = ?info.id, "login successful");

        Ok(Session {
            cookie_jar,
            user_id: info.id,
            org_id: info.org_id,
        })
    }
}
