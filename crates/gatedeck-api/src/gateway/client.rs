// Gateway Admin API client
//
// Thin typed wrapper over `ApiClient`. Every list is one `GET` returning
// the `{ "data": [...] }` envelope; entities are passed through in the
// order the API returned them.

use tracing::debug;

use crate::client::ApiClient;
use crate::error::Error;
use crate::gateway::collections::Collection;
use crate::models::Entity;
use crate::transport::{ClientConfig, build_client};

/// Read-only client for a gateway's Admin API.
#[derive(Debug, Clone)]
pub struct GatewayClient {
    api: ApiClient,
}

impl GatewayClient {
    /// Build a client from config through the shared factory.
    pub fn new(config: &ClientConfig) -> Result<Self, Error> {
        Ok(Self {
            api: build_client(config)?,
        })
    }

    /// List one top-level collection.
    pub async fn list(&self, collection: Collection) -> Result<Vec<Entity>, Error> {
        debug!(%collection, "listing gateway collection");
        self.api.get_list(collection.path()).await
    }

    /// `GET /upstreams/{id}/targets`
    pub async fn list_targets(&self, upstream_id: &str) -> Result<Vec<Entity>, Error> {
        debug!(upstream_id, "listing targets");
        self.api
            .get_list(&format!("upstreams/{upstream_id}/targets"))
            .await
    }

    /// `GET /rbac/roles/{id}/endpoints`
    pub async fn list_role_endpoints(&self, role_id: &str) -> Result<Vec<Entity>, Error> {
        debug!(role_id, "listing RBAC endpoint permissions");
        self.api
            .get_list(&format!("rbac/roles/{role_id}/endpoints"))
            .await
    }

    /// `GET /{entity_type}` for a plugin-defined custom entity.
    pub async fn list_custom(&self, entity_type: &str) -> Result<Vec<Entity>, Error> {
        debug!(entity_type, "listing custom entities");
        self.api.get_list(entity_type).await
    }
}
