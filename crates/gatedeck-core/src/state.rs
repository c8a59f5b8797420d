// ── Raw state snapshot ──
//
// The full, untransformed set of entity collections read from one control
// plane. Every collection is always present (possibly empty) and keeps the
// order the API returned it in.

use gatedeck_api::Entity;
use serde::Serialize;

/// A plugin-defined entity, tagged with its type.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CustomEntity {
    #[serde(rename = "type")]
    pub entity_type: String,
    #[serde(rename = "fields")]
    pub entity: Entity,
}

/// Every gateway collection, one ordered sequence per entity kind.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct GatewayRawState {
    pub services: Vec<Entity>,
    pub routes: Vec<Entity>,
    pub plugins: Vec<Entity>,
    pub upstreams: Vec<Entity>,
    pub targets: Vec<Entity>,
    pub certificates: Vec<Entity>,
    pub snis: Vec<Entity>,
    pub ca_certificates: Vec<Entity>,
    pub consumers: Vec<Entity>,
    pub custom_entities: Vec<CustomEntity>,
    pub key_auths: Vec<Entity>,
    pub hmac_auths: Vec<Entity>,
    pub jwt_auths: Vec<Entity>,
    pub basic_auths: Vec<Entity>,
    pub acl_groups: Vec<Entity>,
    pub oauth2_credentials: Vec<Entity>,
    pub mtls_auths: Vec<Entity>,
    pub rbac_roles: Vec<Entity>,
    pub rbac_endpoint_permissions: Vec<Entity>,
}

impl GatewayRawState {
    /// Plain entity collections with their output names, in output order.
    /// Custom entities are listed separately.
    pub fn collections(&self) -> [(&'static str, &[Entity]); 18] {
        [
            ("services", self.services.as_slice()),
            ("routes", self.routes.as_slice()),
            ("plugins", self.plugins.as_slice()),
            ("upstreams", self.upstreams.as_slice()),
            ("targets", self.targets.as_slice()),
            ("certificates", self.certificates.as_slice()),
            ("snis", self.snis.as_slice()),
            ("ca_certificates", self.ca_certificates.as_slice()),
            ("consumers", self.consumers.as_slice()),
            ("keyauth_credentials", self.key_auths.as_slice()),
            ("hmacauth_credentials", self.hmac_auths.as_slice()),
            ("jwt_secrets", self.jwt_auths.as_slice()),
            ("basicauth_credentials", self.basic_auths.as_slice()),
            ("acls", self.acl_groups.as_slice()),
            ("oauth2_credentials", self.oauth2_credentials.as_slice()),
            ("mtls_auth_credentials", self.mtls_auths.as_slice()),
            ("rbac_roles", self.rbac_roles.as_slice()),
            ("rbac_endpoint_permissions", self.rbac_endpoint_permissions.as_slice()),
        ]
    }

    pub fn entity_count(&self) -> usize {
        self.collections()
            .iter()
            .map(|(_, items)| items.len())
            .sum::<usize>()
            + self.custom_entities.len()
    }
}

/// Which managed resource a document hangs off.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DocumentOwner {
    ServicePackage(String),
    ServiceVersion(String),
}

/// A managed-API document together with its owner.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Document {
    #[serde(flatten)]
    pub owner: DocumentOwner,
    #[serde(flatten)]
    pub entity: Entity,
}

/// Packaging resources that exist only on the managed backend.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ManagedRawState {
    pub service_packages: Vec<Entity>,
    pub documents: Vec<Document>,
}

impl ManagedRawState {
    pub fn entity_count(&self) -> usize {
        self.service_packages.len() + self.documents.len()
    }
}

/// Everything one dump read, handed to a [`StateWriter`](crate::dump::StateWriter).
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DumpState {
    pub control_plane_id: String,
    pub gateway: GatewayRawState,
    pub managed: ManagedRawState,
}

impl DumpState {
    pub fn entity_count(&self) -> usize {
        self.gateway.entity_count() + self.managed.entity_count()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use serde_json::json;

    use super::*;

    fn entity(value: serde_json::Value) -> Entity {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn default_state_has_every_collection_empty() {
        let state = GatewayRawState::default();
        assert!(state.collections().iter().all(|(_, items)| items.is_empty()));
        assert_eq!(state.entity_count(), 0);
    }

    #[test]
    fn entity_count_includes_custom_entities() {
        let state = GatewayRawState {
            services: vec![entity(json!({"id": "s1"}))],
            custom_entities: vec![CustomEntity {
                entity_type: "degraphql_routes".into(),
                entity: entity(json!({"id": "d1"})),
            }],
            ..GatewayRawState::default()
        };
        assert_eq!(state.entity_count(), 2);
    }

    #[test]
    fn document_serializes_owner_inline() {
        let doc = Document {
            owner: DocumentOwner::ServicePackage("pkg-1".into()),
            entity: entity(json!({"id": "doc-1", "path": "/readme"})),
        };
        assert_eq!(
            serde_json::to_value(&doc).unwrap(),
            json!({"service_package": "pkg-1", "id": "doc-1", "path": "/readme"})
        );
    }
}
