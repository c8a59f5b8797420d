// HTTP client shared by the gateway and managed API wrappers
//
// Wraps `reqwest::Client` with base-URL path joining, `{ "data": [...] }`
// list unwrapping, status-to-error mapping, and the `--debug` request trace.

use std::io::{self, Write};
use std::sync::Arc;

use reqwest::cookie::{CookieStore, Jar};
use reqwest::header::{COOKIE, HeaderMap};
use reqwest::{Method, Request, StatusCode};
use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::{debug, trace};
use url::Url;

use crate::error::Error;
use crate::models::ListResponse;

const BODY_PREVIEW: usize = 200;

/// A built HTTP client bound to one API's base address.
///
/// Produced by [`build_client`](crate::transport::build_client); callers
/// never construct one from raw parts outside tests.
#[derive(Debug, Clone)]
pub struct ApiClient {
    http: reqwest::Client,
    base_url: Url,
    debug: bool,
    cookie_jar: Option<Arc<Jar>>,
    /// Headers the transport adds to every request; only read by the trace.
    default_headers: HeaderMap,
}

/// Status and body of a completed request.
#[derive(Debug)]
pub(crate) struct RawResponse {
    pub status: StatusCode,
    pub url: Url,
    pub body: String,
}

impl ApiClient {
    pub(crate) fn new(
        http: reqwest::Client,
        base_url: Url,
        debug: bool,
        cookie_jar: Option<Arc<Jar>>,
        default_headers: HeaderMap,
    ) -> Self {
        Self {
            http,
            base_url,
            debug,
            cookie_jar,
            default_headers,
        }
    }

    /// Wrap an existing `reqwest::Client` (tests, custom transports).
    pub fn from_reqwest(http: reqwest::Client, base_url: Url) -> Self {
        Self::new(http, base_url, false, None, HeaderMap::new())
    }

    /// The effective base URL, workspace included.
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// The cookie jar this client reads and writes, if any.
    pub fn cookie_jar(&self) -> Option<&Arc<Jar>> {
        self.cookie_jar.as_ref()
    }

    /// `Cookie` header value currently held for the base URL.
    pub fn cookie_header(&self) -> Option<String> {
        let jar = self.cookie_jar.as_ref()?;
        let cookies = jar.cookies(&self.base_url)?;
        cookies.to_str().ok().map(String::from)
    }

    // ── URL builder ──────────────────────────────────────────────────

    /// Join a relative path onto the base URL: `{base}/{path}`.
    pub(crate) fn url(&self, path: &str) -> Result<Url, Error> {
        let base = self.base_url.as_str().trim_end_matches('/');
        let path = path.trim_start_matches('/');
        Ok(Url::parse(&format!("{base}/{path}"))?)
    }

    // ── Request helpers ──────────────────────────────────────────────

    /// GET a list endpoint and unwrap its `data` array.
    pub(crate) async fn get_list<T: DeserializeOwned>(&self, path: &str) -> Result<Vec<T>, Error> {
        let resp = self.get_raw(path).await?;
        let page: ListResponse<T> = decode(&resp)?;
        Ok(page.data)
    }

    /// GET an endpoint and fail on any non-success status.
    pub(crate) async fn get_raw(&self, path: &str) -> Result<RawResponse, Error> {
        let url = self.url(path)?;
        let request = self.http.request(Method::GET, url).build()?;
        let resp = self.execute(request).await?;
        ensure_success(resp)
    }

    /// POST a JSON body. The caller decides how to treat the status.
    pub(crate) async fn post_json(
        &self,
        path: &str,
        body: &(impl Serialize + Sync),
    ) -> Result<RawResponse, Error> {
        let url = self.url(path)?;
        let request = self.http.post(url).json(body).build()?;
        self.execute(request).await
    }

    async fn execute(&self, request: Request) -> Result<RawResponse, Error> {
        debug!(method = %request.method(), url = %request.url(), "sending request");
        if self.debug {
            let headers = self.wire_headers(&request);
            let _ = write_request_trace(&mut io::stderr().lock(), &request, &headers);
        }

        let resp = self.http.execute(request).await?;
        let status = resp.status();
        let url = resp.url().clone();
        let body = resp.text().await?;

        trace!(%status, bytes = body.len(), "response received");
        if self.debug {
            let _ = write_response_trace(&mut io::stderr().lock(), status, &body);
        }
        Ok(RawResponse { status, url, body })
    }

    /// Headers as they go on the wire: the transport defaults, overridden by
    /// the request's own, plus the jar's cookies for the request URL.
    fn wire_headers(&self, request: &Request) -> HeaderMap {
        let mut headers = self.default_headers.clone();
        for name in request.headers().keys() {
            headers.remove(name);
        }
        for (name, value) in request.headers() {
            headers.append(name.clone(), value.clone());
        }
        if let Some(mut cookie) = self
            .cookie_jar
            .as_ref()
            .and_then(|jar| jar.cookies(request.url()))
        {
            cookie.set_sensitive(true);
            headers.insert(COOKIE, cookie);
        }
        headers
    }
}

/// Map a non-2xx response to [`Error::Api`].
pub(crate) fn ensure_success(resp: RawResponse) -> Result<RawResponse, Error> {
    if resp.status.is_success() {
        return Ok(resp);
    }
    Err(Error::Api {
        status: resp.status.as_u16(),
        url: resp.url.to_string(),
        message: api_message(&resp.body),
    })
}

/// Decode a JSON body, keeping a preview of the payload on failure.
pub(crate) fn decode<T: DeserializeOwned>(resp: &RawResponse) -> Result<T, Error> {
    serde_json::from_str(&resp.body).map_err(|e| Error::Deserialization {
        message: format!("{e} (body preview: {:?})", preview(&resp.body)),
        body: resp.body.clone(),
    })
}

/// Both APIs report errors as `{"message": "..."}`; fall back to the raw body.
fn api_message(body: &str) -> String {
    #[derive(serde::Deserialize)]
    struct ErrorBody {
        message: Option<String>,
    }

    serde_json::from_str::<ErrorBody>(body)
        .ok()
        .and_then(|b| b.message)
        .unwrap_or_else(|| preview(body).to_owned())
}

fn preview(body: &str) -> &str {
    let mut end = body.len().min(BODY_PREVIEW);
    while !body.is_char_boundary(end) {
        end -= 1;
    }
    &body[..end]
}

// ── Debug trace (stderr) ─────────────────────────────────────────────

fn write_request_trace(
    out: &mut impl Write,
    request: &Request,
    headers: &HeaderMap,
) -> io::Result<()> {
    writeln!(out, "> {} {}", request.method(), request.url())?;
    for (name, value) in headers {
        if value.is_sensitive() {
            writeln!(out, "> {name}: <redacted>")?;
        } else {
            writeln!(out, "> {name}: {}", value.to_str().unwrap_or("<binary>"))?;
        }
    }
    writeln!(out, ">")
}

fn write_response_trace(out: &mut impl Write, status: StatusCode, body: &str) -> io::Result<()> {
    writeln!(out, "< {status}")?;
    writeln!(out, "{body}")?;
    writeln!(out, "<")
}
