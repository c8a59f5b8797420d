use thiserror::Error;

/// Top-level error type for the `gatedeck-api` crate.
///
/// Client construction failures are tagged with the stage that failed
/// (header parsing, address parsing, certificate loading, cookie-jar
/// loading) so callers can diagnose the root cause without digging into
/// transport internals. `gatedeck-core` maps these into its dump taxonomy.
#[derive(Debug, Error)]
pub enum Error {
    // ── Client construction ─────────────────────────────────────────
    /// A `--headers` entry was not of the form `Key:Value`.
    #[error("parsing headers: {0}")]
    Headers(String),

    /// The base address could not be parsed as an absolute URL.
    #[error("failed to parse address {address:?}: {reason}")]
    InvalidAddress { address: String, reason: String },

    /// A CA certificate was supplied but none of it could be loaded.
    #[error("failed to load CA certificate: {0}")]
    CaCert(String),

    /// The client certificate / key pair could not be loaded.
    #[error("failed to load client certificate: {0}")]
    ClientCert(String),

    /// Any other TLS setup failure (bad SNI override, provider setup).
    #[error("TLS error: {0}")]
    Tls(String),

    /// The cookie-jar file could not be read or parsed.
    #[error("failed to initialize cookie-jar from {path}: {message}")]
    CookieJar { path: String, message: String },

    // ── Authentication ──────────────────────────────────────────────
    /// Login rejected (bad credentials, locked account, expired session).
    #[error("Authentication failed: {message}")]
    Authentication { message: String },

    // ── Transport ───────────────────────────────────────────────────
    /// HTTP transport error (connection refused, DNS failure, timeout).
    #[error("HTTP transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// Request URL could not be assembled.
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    // ── API ─────────────────────────────────────────────────────────
    /// Non-success HTTP status from either API.
    #[error("API error (HTTP {status}) at {url}: {message}")]
    Api {
        status: u16,
        url: String,
        message: String,
    },

    // ── Data ────────────────────────────────────────────────────────
    /// JSON deserialization failed, with the raw body for debugging.
    #[error("Deserialization error: {message}")]
    Deserialization { message: String, body: String },
}

impl Error {
    /// Returns `true` for failures raised while building a client,
    /// before any network call was made.
    pub fn is_config(&self) -> bool {
        matches!(
            self,
            Self::Headers(_)
                | Self::InvalidAddress { .. }
                | Self::CaCert(_)
                | Self::ClientCert(_)
                | Self::Tls(_)
                | Self::CookieJar { .. }
        )
    }

    /// Returns `true` if the server rejected our credentials or session.
    pub fn is_unauthorized(&self) -> bool {
        match self {
            Self::Authentication { .. } => true,
            Self::Api { status, .. } => *status == 401 || *status == 403,
            _ => false,
        }
    }

    /// Returns `true` if this is a "not found" error.
    pub fn is_not_found(&self) -> bool {
        match self {
            Self::Transport(e) => e.status() == Some(reqwest::StatusCode::NOT_FOUND),
            Self::Api { status: 404, .. } => true,
            _ => false,
        }
    }

    /// Returns `true` if the request timed out.
    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::Transport(e) if e.is_timeout())
    }

    /// Returns `true` if the server could not be reached at all.
    pub fn is_connect(&self) -> bool {
        matches!(self, Self::Transport(e) if e.is_connect())
    }
}
