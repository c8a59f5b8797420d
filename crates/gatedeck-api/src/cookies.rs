// Cookie-jar loading for session-cookie auth against gateways that sit
// behind a browser-style login.
//
// The loader is a trait so callers can plug in another on-disk format; the
// default reads the Netscape `cookies.txt` layout written by curl and most
// browsers' export tools.

use std::path::Path;
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

use reqwest::cookie::Jar;
use tracing::debug;
use url::Url;

use crate::error::Error;

const HTTP_ONLY_PREFIX: &str = "#HttpOnly_";

/// Turns a cookie-jar file into a jar the HTTP client can use.
pub trait CookieJarLoader: Send + Sync {
    fn load(&self, path: &Path) -> Result<Arc<Jar>, Error>;
}

/// Loader for Netscape-format cookie files.
///
/// Each non-comment line has seven tab-separated fields:
/// `domain  include_subdomains  path  secure  expires  name  value`.
/// Expired cookies are skipped; `expires == 0` marks a session cookie.
#[derive(Debug, Default, Clone, Copy)]
pub struct NetscapeCookieFile;

impl CookieJarLoader for NetscapeCookieFile {
    fn load(&self, path: &Path) -> Result<Arc<Jar>, Error> {
        let contents = std::fs::read_to_string(path).map_err(|e| Error::CookieJar {
            path: path.display().to_string(),
            message: e.to_string(),
        })?;
        let jar = parse_netscape(&contents).map_err(|message| Error::CookieJar {
            path: path.display().to_string(),
            message,
        })?;
        Ok(Arc::new(jar))
    }
}

fn parse_netscape(contents: &str) -> Result<Jar, String> {
    let jar = Jar::default();
    let now = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_or(0, |d| d.as_secs());
    let mut loaded = 0_usize;

    for (index, raw) in contents.lines().enumerate() {
        let line_no = index + 1;
        let line = raw.trim_end_matches('\r');
        let line = match line.strip_prefix(HTTP_ONLY_PREFIX) {
            Some(rest) => rest,
            None if line.trim().is_empty() || line.starts_with('#') => continue,
            None => line,
        };

        let fields: Vec<&str> = line.split('\t').collect();
        let [domain, _subdomains, path, secure, expires, name, value] = fields.as_slice() else {
            return Err(format!(
                "line {line_no}: expected 7 tab-separated fields, found {}",
                fields.len()
            ));
        };

        let expires: u64 = expires
            .parse()
            .map_err(|_| format!("line {line_no}: invalid expiry {expires:?}"))?;
        if expires != 0 && expires <= now {
            continue;
        }

        let secure = secure.eq_ignore_ascii_case("TRUE");
        let host = domain.trim_start_matches('.');
        let scheme = if secure { "https" } else { "http" };
        let url = Url::parse(&format!("{scheme}://{host}{path}"))
            .map_err(|e| format!("line {line_no}: invalid domain {domain:?}: {e}"))?;

        let mut cookie = format!("{name}={value}; Path={path}");
        if domain.starts_with('.') {
            cookie.push_str(&format!("; Domain={host}"));
        }
        if secure {
            cookie.push_str("; Secure");
        }
        if expires != 0 {
            cookie.push_str(&format!("; Max-Age={}", expires - now));
        }

        jar.add_cookie_str(&cookie, &url);
        loaded += 1;
    }

    debug!(cookies = loaded, "loaded cookie jar");
    Ok(jar)
}
