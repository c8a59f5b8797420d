// TLS material for both API clients.
//
// Everything is assembled into one `rustls::ClientConfig` that reqwest uses
// as a preconfigured backend. Inputs are inline PEM strings; reading files
// is the config layer's job.

use std::fmt;
use std::sync::Arc;

use rustls::client::WebPkiServerVerifier;
use rustls::client::danger::{HandshakeSignatureValid, ServerCertVerified, ServerCertVerifier};
use rustls::crypto::{CryptoProvider, verify_tls12_signature, verify_tls13_signature};
use rustls::{ClientConfig, DigitallySignedStruct, RootCertStore, SignatureScheme};
use rustls_pki_types::pem::PemObject;
use rustls_pki_types::{CertificateDer, PrivateKeyDer, ServerName, UnixTime};
use tracing::{debug, warn};

use crate::error::Error;

/// TLS settings for one API client.
///
/// All fields are optional. Empty strings are treated as absent so that
/// unset CLI flags and blank config entries behave the same way.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct TlsOptions {
    /// Disable server certificate validation entirely.
    ///
    /// **Unsafe for production.** Any certificate from any host is accepted,
    /// so the connection can be intercepted without detection. Intended for
    /// lab gateways with self-signed certificates only.
    pub skip_verify: bool,
    /// Name the server certificate is validated against instead of the
    /// URL host.
    ///
    /// Only certificate validation uses it. The SNI sent in the ClientHello
    /// is still the URL host, since reqwest derives it from the request URL.
    /// Has no effect when `skip_verify` is set.
    pub server_name: Option<String>,
    /// PEM bundle of CA certificates. When present it replaces the bundled
    /// web PKI roots.
    pub ca_cert: Option<String>,
    /// PEM client certificate chain for mutual TLS.
    pub client_cert: Option<String>,
    /// PEM private key matching `client_cert`.
    pub client_key: Option<String>,
}

impl fmt::Debug for TlsOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TlsOptions")
            .field("skip_verify", &self.skip_verify)
            .field("server_name", &self.server_name)
            .field("ca_cert", &self.ca_cert.as_ref().map(|_| "<pem>"))
            .field("client_cert", &self.client_cert.as_ref().map(|_| "<pem>"))
            .field("client_key", &self.client_key.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

impl TlsOptions {
    /// Assemble the rustls client configuration.
    ///
    /// - an unparsable CA bundle fails with [`Error::CaCert`]; there is no
    ///   fallback to the bundled roots once a CA was supplied
    /// - a client cert + key that do not load fails with [`Error::ClientCert`]
    /// - supplying only one half of the client pair is accepted and the pair
    ///   is not used (a warning is logged; `gatedeck-config` rejects it)
    pub fn build(&self) -> Result<ClientConfig, Error> {
        let provider = Arc::new(rustls::crypto::ring::default_provider());

        // Parse everything up front so bad input fails even in insecure mode.
        let roots = self.root_store()?;
        let server_name = self.server_name_override()?;

        let verifier: Arc<dyn ServerCertVerifier> = if self.skip_verify {
            warn!("TLS certificate verification is disabled");
            Arc::new(AcceptAnyCertificate {
                provider: Arc::clone(&provider),
            })
        } else {
            let webpki =
                WebPkiServerVerifier::builder_with_provider(Arc::new(roots), Arc::clone(&provider))
                    .build()
                    .map_err(|e| Error::Tls(format!("building certificate verifier: {e}")))?;
            if let Some(name) = server_name {
                debug!(server_name = ?name, "validating server certificate against override name");
                Arc::new(ServerNameOverride {
                    inner: webpki,
                    name,
                })
            } else {
                webpki
            }
        };

        let builder = ClientConfig::builder_with_provider(provider)
            .with_safe_default_protocol_versions()
            .map_err(|e| Error::Tls(e.to_string()))?
            .dangerous()
            .with_custom_certificate_verifier(verifier);

        match (non_empty(&self.client_cert), non_empty(&self.client_key)) {
            (Some(cert), Some(key)) => {
                let (chain, key) = load_client_identity(cert, key)?;
                builder
                    .with_client_auth_cert(chain, key)
                    .map_err(|e| Error::ClientCert(e.to_string()))
            }
            (Some(_), None) | (None, Some(_)) => {
                warn!("only one of client certificate / client key supplied; mutual TLS disabled");
                Ok(builder.with_no_client_auth())
            }
            (None, None) => Ok(builder.with_no_client_auth()),
        }
    }

    fn root_store(&self) -> Result<RootCertStore, Error> {
        let Some(pem) = non_empty(&self.ca_cert) else {
            return Ok(webpki_roots::TLS_SERVER_ROOTS.iter().cloned().collect());
        };

        let certs = CertificateDer::pem_slice_iter(pem.as_bytes())
            .collect::<Result<Vec<_>, _>>()
            .map_err(|e| Error::CaCert(e.to_string()))?;
        if certs.is_empty() {
            return Err(Error::CaCert("no PEM certificate found".into()));
        }

        let mut roots = RootCertStore::empty();
        for cert in certs {
            roots.add(cert).map_err(|e| Error::CaCert(e.to_string()))?;
        }
        Ok(roots)
    }

    fn server_name_override(&self) -> Result<Option<ServerName<'static>>, Error> {
        non_empty(&self.server_name)
            .map(|name| {
                ServerName::try_from(name.to_owned())
                    .map_err(|e| Error::Tls(format!("invalid TLS server name {name:?}: {e}")))
            })
            .transpose()
    }
}

fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|v| !v.trim().is_empty())
}

fn load_client_identity(
    cert: &str,
    key: &str,
) -> Result<(Vec<CertificateDer<'static>>, PrivateKeyDer<'static>), Error> {
    let chain = CertificateDer::pem_slice_iter(cert.as_bytes())
        .collect::<Result<Vec<_>, _>>()
        .map_err(|e| Error::ClientCert(format!("parsing certificate: {e}")))?;
    if chain.is_empty() {
        return Err(Error::ClientCert("no PEM certificate found".into()));
    }
    let key = PrivateKeyDer::from_pem_slice(key.as_bytes())
        .map_err(|e| Error::ClientCert(format!("parsing private key: {e}")))?;
    Ok((chain, key))
}

// ── Verifiers ────────────────────────────────────────────────────────

/// Accepts every server certificate. Handshake signatures are still checked
/// so the session keys are at least bound to the presented certificate.
#[derive(Debug)]
struct AcceptAnyCertificate {
    provider: Arc<CryptoProvider>,
}

impl ServerCertVerifier for AcceptAnyCertificate {
    fn verify_server_cert(
        &self,
        _end_entity: &CertificateDer<'_>,
        _intermediates: &[CertificateDer<'_>],
        _server_name: &ServerName<'_>,
        _ocsp_response: &[u8],
        _now: UnixTime,
    ) -> Result<ServerCertVerified, rustls::Error> {
        Ok(ServerCertVerified::assertion())
    }

    fn verify_tls12_signature(
        &self,
        message: &[u8],
        cert: &CertificateDer<'_>,
        dss: &DigitallySignedStruct,
    ) -> Result<HandshakeSignatureValid, rustls::Error> {
        verify_tls12_signature(
            message,
            cert,
            dss,
            &self.provider.signature_verification_algorithms,
        )
    }

    fn verify_tls13_signature(
        &self,
        message: &[u8],
        cert: &CertificateDer<'_>,
        dss: &DigitallySignedStruct,
    ) -> Result<HandshakeSignatureValid, rustls::Error> {
        verify_tls13_signature(
            message,
            cert,
            dss,
            &self.provider.signature_verification_algorithms,
        )
    }

    fn supported_verify_schemes(&self) -> Vec<SignatureScheme> {
        self.provider
            .signature_verification_algorithms
            .supported_schemes()
    }
}

/// Web PKI validation against a fixed name instead of the URL host.
#[derive(Debug)]
struct ServerNameOverride {
    inner: Arc<WebPkiServerVerifier>,
    name: ServerName<'static>,
}

impl ServerCertVerifier for ServerNameOverride {
    fn verify_server_cert(
        &self,
        end_entity: &CertificateDer<'_>,
        intermediates: &[CertificateDer<'_>],
        _server_name: &ServerName<'_>,
        ocsp_response: &[u8],
        now: UnixTime,
    ) -> Result<ServerCertVerified, rustls::Error> {
        self.inner
            .verify_server_cert(end_entity, intermediates, &self.name, ocsp_response, now)
    }

    fn verify_tls12_signature(
        &self,
        message: &[u8],
        cert: &CertificateDer<'_>,
        dss: &DigitallySignedStruct,
    ) -> Result<HandshakeSignatureValid, rustls::Error> {
        self.inner.verify_tls12_signature(message, cert, dss)
    }

    fn verify_tls13_signature(
        &self,
        message: &[u8],
        cert: &CertificateDer<'_>,
        dss: &DigitallySignedStruct,
    ) -> Result<HandshakeSignatureValid, rustls::Error> {
        self.inner.verify_tls13_signature(message, cert, dss)
    }

    fn supported_verify_schemes(&self) -> Vec<SignatureScheme> {
        self.inner.supported_verify_schemes()
    }
}
