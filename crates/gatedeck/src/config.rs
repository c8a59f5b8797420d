//! CLI configuration: thin layer over `gatedeck_config`.
//!
//! Loads the active profile, applies `GlobalOpts` flag overrides, validates
//! the result as a whole, and produces the managed client config plus
//! login credentials.

use gatedeck_api::{ClientConfig, Credentials};
use gatedeck_config::{Profile, load_config, resolve_password, validate_profile};
use gatedeck_core::CoreError;
use secrecy::SecretString;
use tracing::debug;

use crate::cli::GlobalOpts;
use crate::error::CliError;

/// Overlay CLI flags onto a profile. Flags win; headers accumulate.
///
/// An inline PEM flag replaces a file configured in the profile and vice
/// versa, so one source per field remains.
pub fn apply_overrides(profile: &mut Profile, global: &GlobalOpts) {
    if let Some(ref addr) = global.konnect_addr {
        profile.konnect_addr = Some(addr.clone());
    }
    if let Some(ref email) = global.konnect_email {
        profile.email = Some(email.clone());
    }
    profile.headers.extend(global.headers.iter().cloned());

    if global.tls_skip_verify {
        profile.tls_skip_verify = Some(true);
    }
    if let Some(ref name) = global.tls_server_name {
        profile.tls_server_name = Some(name.clone());
    }

    override_pem(
        &mut profile.ca_cert,
        &mut profile.ca_cert_file,
        global.ca_cert.as_ref(),
        global.ca_cert_file.as_ref(),
    );
    override_pem(
        &mut profile.tls_client_cert,
        &mut profile.tls_client_cert_file,
        global.tls_client_cert.as_ref(),
        global.tls_client_cert_file.as_ref(),
    );
    override_pem(
        &mut profile.tls_client_key,
        &mut profile.tls_client_key_file,
        global.tls_client_key.as_ref(),
        global.tls_client_key_file.as_ref(),
    );

    if let Some(ref path) = global.cookie_jar_path {
        profile.cookie_jar = Some(path.clone());
    }
    if let Some(timeout) = global.timeout {
        profile.timeout = Some(timeout);
    }
    if global.debug {
        profile.debug = Some(true);
    }
}

fn override_pem<F: Clone>(
    inline: &mut Option<String>,
    file: &mut Option<F>,
    flag_inline: Option<&String>,
    flag_file: Option<&F>,
) {
    if let Some(pem) = flag_inline {
        *inline = Some(pem.clone());
        *file = None;
    } else if let Some(path) = flag_file {
        *inline = None;
        *file = Some(path.clone());
    }
}

/// Resolve the managed client config and credentials for this invocation.
pub fn resolve_managed(global: &GlobalOpts) -> Result<(ClientConfig, Credentials), CliError> {
    let config = load_config()?;
    let (profile_name, mut profile) = config.profile(global.profile.as_deref())?;
    apply_overrides(&mut profile, global);
    debug!(profile = %profile_name, address = profile.address(), "resolved profile");

    validate_profile(&profile)
        .into_result()
        .map_err(CoreError::Validation)?;

    let managed = profile.client_config(&config.defaults)?;
    let password = resolve_password(
        global.konnect_password.clone().map(SecretString::from),
        &profile,
        &profile_name,
    )?;
    let email = profile.email.unwrap_or_default();

    Ok((managed, Credentials::new(email, password)))
}
