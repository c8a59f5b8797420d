//! Shared configuration for the gatedeck CLI.
//!
//! TOML profiles, credential resolution (env + keyring + plaintext),
//! multi-field validation, and translation to `gatedeck_api::ClientConfig`.
//! The CLI layers its flag overrides on top of a [`Profile`] before
//! resolving it.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use directories::ProjectDirs;
use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use gatedeck_api::transport::resolve_base_url;
use gatedeck_api::{ClientConfig, CookieJarSource, TlsOptions, parse_headers};
use gatedeck_core::ErrorArray;
use secrecy::SecretString;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

/// Keyring service name; entries are keyed `{profile}/password`.
pub const KEYRING_SERVICE: &str = "gatedeck";

/// Env var consulted for the managed API password.
pub const PASSWORD_ENV: &str = "GATEDECK_KONNECT_PASSWORD";

// ── Error ───────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid {field}: {reason}")]
    Validation { field: String, reason: String },

    #[error("no password configured for profile '{profile}'")]
    NoCredentials { profile: String },

    #[error("profile '{profile}' not found in {path}")]
    UnknownProfile { profile: String, path: String },

    #[error("config loading failed: {0}")]
    Figment(Box<figment::Error>),

    #[error("failed to read {field} from {path}: {source}")]
    ReadFile {
        field: &'static str,
        path: String,
        #[source]
        source: std::io::Error,
    },
}

impl From<figment::Error> for ConfigError {
    fn from(err: figment::Error) -> Self {
        Self::Figment(Box::new(err))
    }
}

impl ConfigError {
    fn invalid(field: &str, reason: impl Into<String>) -> Self {
        Self::Validation {
            field: field.to_owned(),
            reason: reason.into(),
        }
    }
}

// ── TOML config structs ─────────────────────────────────────────────

/// Top-level TOML configuration.
#[derive(Debug, Deserialize, Serialize)]
pub struct Config {
    /// Profile used when `--profile` is not given.
    pub default_profile: Option<String>,

    #[serde(default)]
    pub defaults: Defaults,

    #[serde(default)]
    pub profiles: HashMap<String, Profile>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            default_profile: Some("default".into()),
            defaults: Defaults::default(),
            profiles: HashMap::new(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Defaults {
    /// Request timeout in seconds.
    #[serde(default = "default_timeout")]
    pub timeout: u64,

    #[serde(default)]
    pub debug: bool,
}

impl Default for Defaults {
    fn default() -> Self {
        Self {
            timeout: default_timeout(),
            debug: false,
        }
    }
}

fn default_timeout() -> u64 {
    10
}

/// A named managed-API profile. Every field is optional; CLI flags fill or
/// override them.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct Profile {
    /// Managed API base URL. Defaults to the hosted service.
    pub konnect_addr: Option<String>,

    pub email: Option<String>,

    /// Password (plaintext, prefer keyring or env var).
    pub password: Option<String>,

    /// Name of an environment variable holding the password.
    pub password_env: Option<String>,

    /// Extra `Key:Value` headers for every request.
    #[serde(default)]
    pub headers: Vec<String>,

    pub tls_skip_verify: Option<bool>,
    pub tls_server_name: Option<String>,

    /// Inline CA bundle (PEM). Each inline PEM field excludes its `*_file`
    /// counterpart; setting both fails validation.
    pub ca_cert: Option<String>,
    pub ca_cert_file: Option<PathBuf>,

    pub tls_client_cert: Option<String>,
    pub tls_client_cert_file: Option<PathBuf>,
    pub tls_client_key: Option<String>,
    pub tls_client_key_file: Option<PathBuf>,

    /// Netscape cookie file loaded into the managed client.
    pub cookie_jar: Option<PathBuf>,

    /// Request timeout in seconds.
    pub timeout: Option<u64>,

    pub debug: Option<bool>,
}

// ── Config file path ────────────────────────────────────────────────

/// Resolve the config file path via XDG / platform conventions.
///
/// `GATEDECK_CONFIG` points at an explicit file instead.
pub fn config_path() -> PathBuf {
    if let Some(explicit) = std::env::var_os("GATEDECK_CONFIG") {
        return PathBuf::from(explicit);
    }
    ProjectDirs::from("com", "gatedeck", "gatedeck").map_or_else(
        || {
            let mut p = PathBuf::from(std::env::var("HOME").unwrap_or_else(|_| ".".into()));
            p.push(".config");
            p.push("gatedeck");
            p.push("config.toml");
            p
        },
        |dirs| dirs.config_dir().join("config.toml"),
    )
}

// ── Config loading ──────────────────────────────────────────────────

/// Load the full Config from `path` + environment.
///
/// A missing file is not an error. Environment keys use `__` for nesting,
/// e.g. `GATEDECK_DEFAULTS__TIMEOUT=30`.
pub fn load_config_from(path: &Path) -> Result<Config, ConfigError> {
    let figment = Figment::new()
        .merge(Serialized::defaults(Config::default()))
        .merge(Toml::file(path))
        .merge(Env::prefixed("GATEDECK_").split("__"));

    let config: Config = figment.extract()?;
    debug!(path = %path.display(), profiles = config.profiles.len(), "loaded config");
    Ok(config)
}

/// Load the Config from the canonical path.
pub fn load_config() -> Result<Config, ConfigError> {
    load_config_from(&config_path())
}

impl Config {
    /// Name of the profile to use: explicit, then `default_profile`, then
    /// `"default"`.
    pub fn active_profile_name(&self, explicit: Option<&str>) -> String {
        explicit
            .map(str::to_owned)
            .or_else(|| self.default_profile.clone())
            .unwrap_or_else(|| "default".into())
    }

    /// Look up a profile. An explicitly requested profile must exist; the
    /// implicit default may be absent and yields an empty profile.
    pub fn profile(&self, explicit: Option<&str>) -> Result<(String, Profile), ConfigError> {
        let name = self.active_profile_name(explicit);
        match self.profiles.get(&name) {
            Some(profile) => Ok((name, profile.clone())),
            None if explicit.is_some() => Err(ConfigError::UnknownProfile {
                profile: name,
                path: config_path().display().to_string(),
            }),
            None => Ok((name, Profile::default())),
        }
    }
}

// ── Credential resolution ───────────────────────────────────────────

/// Resolve the managed API password.
///
/// Order: `flag` → env var named by `password_env` → `GATEDECK_KONNECT_PASSWORD`
/// → system keyring → plaintext in the profile.
pub fn resolve_password(
    flag: Option<SecretString>,
    profile: &Profile,
    profile_name: &str,
) -> Result<SecretString, ConfigError> {
    if let Some(secret) = flag {
        return Ok(secret);
    }

    if let Some(ref env_name) = profile.password_env {
        if let Ok(val) = std::env::var(env_name) {
            return Ok(SecretString::from(val));
        }
    }

    if let Ok(val) = std::env::var(PASSWORD_ENV) {
        return Ok(SecretString::from(val));
    }

    if let Ok(entry) = keyring::Entry::new(KEYRING_SERVICE, &format!("{profile_name}/password")) {
        if let Ok(pw) = entry.get_password() {
            return Ok(SecretString::from(pw));
        }
    }

    if let Some(ref pw) = profile.password {
        return Ok(SecretString::from(pw.clone()));
    }

    Err(ConfigError::NoCredentials {
        profile: profile_name.into(),
    })
}

// ── TLS material ────────────────────────────────────────────────────

/// Read PEM material from the inline value or, if that is unset or blank,
/// from the file. Validated profiles never set both.
fn pem(
    field: &'static str,
    inline: Option<&str>,
    file: Option<&Path>,
) -> Result<Option<String>, ConfigError> {
    if let Some(value) = inline.filter(|v| !v.trim().is_empty()) {
        return Ok(Some(value.to_owned()));
    }
    let Some(path) = file else {
        return Ok(None);
    };
    std::fs::read_to_string(path)
        .map(Some)
        .map_err(|source| ConfigError::ReadFile {
            field,
            path: path.display().to_string(),
            source,
        })
}

impl Profile {
    /// Whether some client certificate was configured, inline or as a file.
    fn has_client_cert(&self) -> bool {
        self.tls_client_cert.is_some() || self.tls_client_cert_file.is_some()
    }

    fn has_client_key(&self) -> bool {
        self.tls_client_key.is_some() || self.tls_client_key_file.is_some()
    }

    /// Collect TLS settings, reading any `*_file` PEM paths.
    pub fn tls_options(&self) -> Result<TlsOptions, ConfigError> {
        Ok(TlsOptions {
            skip_verify: self.tls_skip_verify.unwrap_or(false),
            server_name: self.tls_server_name.clone(),
            ca_cert: pem(
                "ca_cert",
                self.ca_cert.as_deref(),
                self.ca_cert_file.as_deref(),
            )?,
            client_cert: pem(
                "tls_client_cert",
                self.tls_client_cert.as_deref(),
                self.tls_client_cert_file.as_deref(),
            )?,
            client_key: pem(
                "tls_client_key",
                self.tls_client_key.as_deref(),
                self.tls_client_key_file.as_deref(),
            )?,
        })
    }

    /// The managed API address, falling back to the hosted service.
    pub fn address(&self) -> &str {
        self.konnect_addr
            .as_deref()
            .unwrap_or(gatedeck_api::managed::DEFAULT_ADDRESS)
    }

    /// Build the managed API client config for this profile.
    pub fn client_config(&self, defaults: &Defaults) -> Result<ClientConfig, ConfigError> {
        Ok(ClientConfig {
            tls: self.tls_options()?,
            headers: self.headers.clone(),
            debug: self.debug.unwrap_or(defaults.debug),
            timeout: Duration::from_secs(self.timeout.unwrap_or(defaults.timeout)),
            cookie_jar: self.cookie_jar.clone().map(CookieJarSource::File),
            ..ClientConfig::new(self.address())
        })
    }
}

// ── Validation ──────────────────────────────────────────────────────

/// Check every field and report all problems at once.
///
/// Stricter than the client factory: a client certificate without its key
/// (or the reverse) is rejected here.
pub fn validate_profile(profile: &Profile) -> ErrorArray {
    let mut errors = ErrorArray::new();

    if let Err(e) = resolve_base_url(profile.address(), None) {
        errors.push(ConfigError::invalid("konnect_addr", e.to_string()));
    }

    if profile
        .email
        .as_deref()
        .is_none_or(|email| email.trim().is_empty())
    {
        errors.push(ConfigError::invalid(
            "email",
            "required (set --konnect-email or `email` in the profile)",
        ));
    }

    if profile.timeout == Some(0) {
        errors.push(ConfigError::invalid("timeout", "must be greater than zero"));
    }

    for header in &profile.headers {
        if let Err(e) = parse_headers(&[header]) {
            errors.push(ConfigError::invalid("headers", e.to_string()));
        }
    }

    let pem_sources = [
        ("ca_cert", profile.ca_cert.is_some(), profile.ca_cert_file.is_some()),
        (
            "tls_client_cert",
            profile.tls_client_cert.is_some(),
            profile.tls_client_cert_file.is_some(),
        ),
        (
            "tls_client_key",
            profile.tls_client_key.is_some(),
            profile.tls_client_key_file.is_some(),
        ),
    ];
    for (field, inline, file) in pem_sources {
        if inline && file {
            errors.push(ConfigError::invalid(
                field,
                "set either an inline value or a file, not both",
            ));
        }
    }

    match (profile.has_client_cert(), profile.has_client_key()) {
        (true, false) => errors.push(ConfigError::invalid(
            "tls_client_key",
            "a client certificate was given without its key",
        )),
        (false, true) => errors.push(ConfigError::invalid(
            "tls_client_cert",
            "a client key was given without its certificate",
        )),
        _ => {}
    }

    errors
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::io::Write;

    use figment::Jail;
    use pretty_assertions::assert_eq;
    use secrecy::ExposeSecret;

    use super::*;

    fn valid_profile() -> Profile {
        Profile {
            email: Some("ops@example.test".into()),
            ..Profile::default()
        }
    }

    #[test]
    fn load_merges_file_and_env() {
        Jail::expect_with(|jail| {
            jail.create_file(
                "config.toml",
                r#"
                    default_profile = "prod"

                    [defaults]
                    timeout = 15

                    [profiles.prod]
                    konnect_addr = "https://eu.konnect.test"
                    email = "ops@example.test"
                    headers = ["X-Team:platform"]
                "#,
            )?;
            jail.set_env("GATEDECK_DEFAULTS__DEBUG", "true");

            let config = load_config_from(Path::new("config.toml")).unwrap();
            assert_eq!(config.defaults.timeout, 15);
            assert!(config.defaults.debug);

            let (name, profile) = config.profile(None).unwrap();
            assert_eq!(name, "prod");
            assert_eq!(profile.address(), "https://eu.konnect.test");
            assert_eq!(profile.headers, ["X-Team:platform"]);
            Ok(())
        });
    }

    #[test]
    fn missing_file_yields_defaults() {
        Jail::expect_with(|_jail| {
            let config = load_config_from(Path::new("absent.toml")).unwrap();
            assert_eq!(config.defaults.timeout, 10);
            let (name, profile) = config.profile(None).unwrap();
            assert_eq!(name, "default");
            assert_eq!(profile, Profile::default());
            Ok(())
        });
    }

    #[test]
    fn explicit_unknown_profile_fails() {
        let config = Config::default();
        assert!(matches!(
            config.profile(Some("staging")),
            Err(ConfigError::UnknownProfile { .. })
        ));
    }

    #[test]
    fn password_chain_prefers_flag_then_profile_env() {
        Jail::expect_with(|jail| {
            jail.set_env("TEAM_PW", "from-team-env");
            jail.set_env(PASSWORD_ENV, "from-global-env");
            let profile = Profile {
                password_env: Some("TEAM_PW".into()),
                password: Some("plaintext".into()),
                ..Profile::default()
            };

            let flag = resolve_password(Some("from-flag".to_owned().into()), &profile, "p")
                .unwrap();
            assert_eq!(flag.expose_secret(), "from-flag");

            let env = resolve_password(None, &profile, "p").unwrap();
            assert_eq!(env.expose_secret(), "from-team-env");
            Ok(())
        });
    }

    #[test]
    fn password_chain_uses_global_env_before_plaintext() {
        Jail::expect_with(|jail| {
            jail.set_env(PASSWORD_ENV, "from-global-env");
            let profile = Profile {
                password: Some("plaintext".into()),
                ..Profile::default()
            };
            let pw = resolve_password(None, &profile, "p").unwrap();
            assert_eq!(pw.expose_secret(), "from-global-env");
            Ok(())
        });
    }

    #[test]
    fn client_config_reads_pem_files() {
        let mut ca = tempfile::NamedTempFile::new().unwrap();
        write!(ca, "-----BEGIN CERTIFICATE-----\n...").unwrap();
        let profile = Profile {
            ca_cert_file: Some(ca.path().to_path_buf()),
            timeout: Some(3),
            headers: vec!["A:B".into()],
            ..valid_profile()
        };

        let config = profile.client_config(&Defaults::default()).unwrap();
        assert!(config.tls.ca_cert.unwrap().starts_with("-----BEGIN CERTIFICATE-----"));
        assert_eq!(config.timeout, Duration::from_secs(3));
        assert_eq!(config.address, gatedeck_api::managed::DEFAULT_ADDRESS);
        assert_eq!(config.headers, ["A:B"]);
    }

    #[test]
    fn missing_pem_file_is_reported() {
        let profile = Profile {
            tls_client_key_file: Some("/nonexistent/gatedeck/key.pem".into()),
            ..valid_profile()
        };
        let err = profile.tls_options().unwrap_err();
        assert!(err.to_string().contains("tls_client_key"), "{err}");
    }

    #[test]
    fn valid_profile_has_no_errors() {
        assert!(validate_profile(&valid_profile()).is_empty());
    }

    #[test]
    fn validation_reports_every_problem_in_order() {
        let profile = Profile {
            konnect_addr: Some("not a url".into()),
            email: None,
            timeout: Some(0),
            headers: vec!["good:1".into(), "bad".into()],
            tls_client_cert: Some("pem".into()),
            ..Profile::default()
        };

        let errors = validate_profile(&profile);
        let fields: Vec<String> = errors
            .iter()
            .map(|e| e.to_string().split(':').next().unwrap().to_owned())
            .collect();
        assert_eq!(
            fields,
            [
                "invalid konnect_addr",
                "invalid email",
                "invalid timeout",
                "invalid headers",
                "invalid tls_client_key"
            ]
        );
        assert!(errors.to_string().starts_with("5 errors occurred:\n\t"));
    }

    #[test]
    fn inline_and_file_pem_are_mutually_exclusive() {
        let profile = Profile {
            ca_cert: Some("pem".into()),
            ca_cert_file: Some("/etc/ca.pem".into()),
            tls_client_cert: Some("pem".into()),
            tls_client_key: Some("pem".into()),
            tls_client_key_file: Some("/etc/key.pem".into()),
            ..valid_profile()
        };

        let messages: Vec<String> = validate_profile(&profile)
            .iter()
            .map(|e| e.to_string())
            .collect();
        assert_eq!(messages.len(), 2, "{messages:?}");
        assert!(messages[0].starts_with("invalid ca_cert"), "{messages:?}");
        assert!(messages[1].starts_with("invalid tls_client_key"), "{messages:?}");
        assert!(messages.iter().all(|m| m.contains("not both")));
    }
}
