// Shared transport configuration and the HTTP client factory.
//
// Both the gateway and the managed client are built through `build_client`,
// which composes header parsing, address normalization, TLS material and an
// optional cookie jar into one `ApiClient`. Building never touches the
// network and never mutates the config it was given.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use reqwest::cookie::Jar;
use reqwest::header::{
    AUTHORIZATION, COOKIE, HeaderMap, HeaderName, HeaderValue, PROXY_AUTHORIZATION, USER_AGENT,
};
use tracing::debug;
use url::Url;

use crate::client::ApiClient;
use crate::cookies::{CookieJarLoader, NetscapeCookieFile};
use crate::error::Error;
use crate::tls::TlsOptions;

const DEFAULT_USER_AGENT: &str = concat!("gatedeck/", env!("CARGO_PKG_VERSION"));

/// Admin API token header, kept out of debug traces like `Authorization`.
const ADMIN_TOKEN: &str = "kong-admin-token";

/// Default request timeout applied when the caller does not set one.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Where a client's cookies come from.
#[derive(Debug, Clone)]
pub enum CookieJarSource {
    /// Load a cookie file from disk through a [`CookieJarLoader`].
    File(PathBuf),
    /// Share an in-memory jar, e.g. the one holding a login session.
    Shared(Arc<Jar>),
}

impl PartialEq for CookieJarSource {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::File(a), Self::File(b)) => a == b,
            (Self::Shared(a), Self::Shared(b)) => Arc::ptr_eq(a, b),
            _ => false,
        }
    }
}

/// Everything needed to build a client for one API.
///
/// A plain value: derive scoped variants with [`for_workspace`](Self::for_workspace)
/// and friends, which copy the config and override a single field.
#[derive(Debug, Clone, PartialEq)]
pub struct ClientConfig {
    /// Base address, e.g. `https://gateway.example:8444`.
    pub address: String,
    /// Optional path scope appended to the base address.
    pub workspace: Option<String>,
    pub tls: TlsOptions,
    /// Extra headers, each `Key:Value`, sent on every request.
    pub headers: Vec<String>,
    /// Write a request/response trace of every call to stderr.
    pub debug: bool,
    /// Applied uniformly to every request made by the built client.
    /// `Duration::ZERO` disables the timeout.
    pub timeout: Duration,
    pub cookie_jar: Option<CookieJarSource>,
}

impl ClientConfig {
    pub fn new(address: impl Into<String>) -> Self {
        Self {
            address: address.into(),
            workspace: None,
            tls: TlsOptions::default(),
            headers: Vec::new(),
            debug: false,
            timeout: DEFAULT_TIMEOUT,
            cookie_jar: None,
        }
    }

    /// A copy of this config scoped to the given workspace.
    pub fn for_workspace(&self, name: &str) -> Self {
        Self {
            workspace: Some(name.to_owned()),
            ..self.clone()
        }
    }

    /// A copy of this config pointed at another base address.
    pub fn with_address(&self, address: impl Into<String>) -> Self {
        Self {
            address: address.into(),
            ..self.clone()
        }
    }

    /// A copy of this config that shares the given cookie jar.
    pub fn with_cookie_jar(&self, jar: Arc<Jar>) -> Self {
        Self {
            cookie_jar: Some(CookieJarSource::Shared(jar)),
            ..self.clone()
        }
    }
}

/// Strip any run of trailing `/` from an address.
pub fn clean_address(address: &str) -> &str {
    address.trim_end_matches('/')
}

/// Parse `Key:Value` strings into a header map.
///
/// Splits on the first colon only, so `A:B:C` yields `A` → `B:C`. Repeated
/// keys are appended, not replaced. Any malformed entry fails the whole
/// call. Credential-bearing values are marked sensitive.
pub fn parse_headers<S: AsRef<str>>(headers: &[S]) -> Result<HeaderMap, Error> {
    let mut map = HeaderMap::new();
    for entry in headers {
        let entry = entry.as_ref();
        let Some((key, value)) = entry.split_once(':') else {
            return Err(Error::Headers(format!(
                "splitting header key-value '{entry}'"
            )));
        };
        let name = HeaderName::from_bytes(key.as_bytes())
            .map_err(|e| Error::Headers(format!("invalid header name in '{entry}': {e}")))?;
        let mut value = HeaderValue::from_str(value)
            .map_err(|e| Error::Headers(format!("invalid header value in '{entry}': {e}")))?;
        value.set_sensitive(is_credential(&name));
        map.append(name, value);
    }
    Ok(map)
}

fn is_credential(name: &HeaderName) -> bool {
    *name == AUTHORIZATION
        || *name == PROXY_AUTHORIZATION
        || *name == COOKIE
        || *name == ADMIN_TOKEN
}

/// Normalize and parse a base address, then append the workspace path.
pub fn resolve_base_url(address: &str, workspace: Option<&str>) -> Result<Url, Error> {
    let cleaned = clean_address(address);
    let mut url = Url::parse(cleaned).map_err(|e| Error::InvalidAddress {
        address: address.to_owned(),
        reason: e.to_string(),
    })?;
    if url.cannot_be_a_base() || url.host().is_none() {
        return Err(Error::InvalidAddress {
            address: address.to_owned(),
            reason: "not an absolute URL".into(),
        });
    }

    if let Some(ws) = workspace.map(|w| w.trim_matches('/')).filter(|w| !w.is_empty()) {
        let base = url.path().trim_end_matches('/').to_owned();
        url.set_path(&format!("{base}/{ws}"));
    }
    Ok(url)
}

/// Build an [`ApiClient`] using the default Netscape cookie-file loader.
pub fn build_client(config: &ClientConfig) -> Result<ApiClient, Error> {
    build_client_with_loader(config, &NetscapeCookieFile)
}

/// Build an [`ApiClient`], loading file-based cookie jars through `loader`.
pub fn build_client_with_loader(
    config: &ClientConfig,
    loader: &dyn CookieJarLoader,
) -> Result<ApiClient, Error> {
    let tls = config.tls.build()?;
    let mut headers = parse_headers(&config.headers)?;
    headers
        .entry(USER_AGENT)
        .or_insert(HeaderValue::from_static(DEFAULT_USER_AGENT));
    let base_url = resolve_base_url(&config.address, config.workspace.as_deref())?;

    let cookie_jar = match &config.cookie_jar {
        None => None,
        Some(CookieJarSource::File(path)) => Some(loader.load(path)?),
        Some(CookieJarSource::Shared(jar)) => Some(Arc::clone(jar)),
    };

    let mut builder = reqwest::Client::builder()
        .default_headers(headers.clone())
        .use_preconfigured_tls(tls);
    if !config.timeout.is_zero() {
        builder = builder
            .timeout(config.timeout)
            .connect_timeout(config.timeout);
    }
    if let Some(ref jar) = cookie_jar {
        builder = builder.cookie_provider(Arc::clone(jar));
    }

    let http = builder
        .build()
        .map_err(|e| Error::Tls(format!("failed to build HTTP client: {e}")))?;

    debug!(base_url = %base_url, debug = config.debug, "built API client");
    Ok(ApiClient::new(
        http,
        base_url,
        config.debug,
        cookie_jar,
        headers,
    ))
}
