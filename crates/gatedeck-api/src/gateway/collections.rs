// Gateway entity collections and their Admin API paths.

use strum::{Display, EnumIter};

/// Top-level collections readable with a single `GET`.
///
/// Nested collections (targets per upstream, endpoint permissions per RBAC
/// role, custom entities) have dedicated methods on
/// [`GatewayClient`](super::GatewayClient).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumIter)]
#[strum(serialize_all = "snake_case")]
pub enum Collection {
    Services,
    Routes,
    Plugins,
    Upstreams,
    Certificates,
    Snis,
    CaCertificates,
    Consumers,
    KeyAuths,
    HmacAuths,
    JwtAuths,
    BasicAuths,
    AclGroups,
    Oauth2Credentials,
    MtlsAuths,
    RbacRoles,
}

impl Collection {
    /// Admin API path relative to the client's base URL.
    pub fn path(self) -> &'static str {
        match self {
            Self::Services => "services",
            Self::Routes => "routes",
            Self::Plugins => "plugins",
            Self::Upstreams => "upstreams",
            Self::Certificates => "certificates",
            Self::Snis => "snis",
            Self::CaCertificates => "ca_certificates",
            Self::Consumers => "consumers",
            Self::KeyAuths => "key-auths",
            Self::HmacAuths => "hmac-auths",
            Self::JwtAuths => "jwts",
            Self::BasicAuths => "basic-auths",
            Self::AclGroups => "acls",
            Self::Oauth2Credentials => "oauth2",
            Self::MtlsAuths => "mtls-auths",
            Self::RbacRoles => "rbac/roles",
        }
    }

    /// Consumers and every credential kind hanging off a consumer.
    pub fn is_consumer_scoped(self) -> bool {
        matches!(
            self,
            Self::Consumers
                | Self::KeyAuths
                | Self::HmacAuths
                | Self::JwtAuths
                | Self::BasicAuths
                | Self::AclGroups
                | Self::Oauth2Credentials
                | Self::MtlsAuths
        )
    }
}

#[cfg(test)]
mod tests {
    use strum::IntoEnumIterator;

    use super::*;

    #[test]
    fn credential_collections_are_consumer_scoped() {
        let scoped: Vec<_> = Collection::iter()
            .filter(|c| c.is_consumer_scoped())
            .map(Collection::path)
            .collect();
        assert_eq!(
            scoped,
            [
                "consumers",
                "key-auths",
                "hmac-auths",
                "jwts",
                "basic-auths",
                "acls",
                "oauth2",
                "mtls-auths"
            ]
        );
    }

    #[test]
    fn display_is_snake_case() {
        assert_eq!(Collection::CaCertificates.to_string(), "ca_certificates");
        assert_eq!(Collection::Oauth2Credentials.to_string(), "oauth2_credentials");
    }
}
