// ── State fetching ──
//
// One read per collection. Reads run concurrently inside the calling task
// and are joined fail-fast: the first error drops every in-flight read and
// every completed partial result, so callers either get a full snapshot or
// nothing. Nested reads (one per upstream, role, custom type or document
// owner) are capped at `NESTED_READ_CONCURRENCY` in flight per parent.

use futures_util::stream::{self, StreamExt, TryStreamExt};
use futures_util::try_join;
use gatedeck_api::{Collection, DocumentParent, Entity, GatewayClient, ManagedClient, Session};
use tracing::{debug, info};

use crate::error::CoreError;
use crate::state::{CustomEntity, Document, DocumentOwner, GatewayRawState, ManagedRawState};

/// What to read from the gateway.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FetchOptions {
    /// Skip consumers, their credentials and consumer-bound plugins.
    /// Consumer endpoints are never called.
    pub exclude_consumers: bool,
    /// Read RBAC roles and their endpoint permissions.
    pub include_rbac: bool,
    /// Plugin-defined entity types to read, e.g. `degraphql_routes`.
    pub custom_entity_types: Vec<String>,
}

fn fetch_error(collection: impl ToString) -> impl FnOnce(gatedeck_api::Error) -> CoreError {
    move |source| CoreError::Fetch {
        collection: collection.to_string(),
        source,
    }
}

/// Most nested reads in flight for one parent collection.
pub const NESTED_READ_CONCURRENCY: usize = 8;

/// Run `read` for each item with bounded concurrency, flattening the results
/// in input order. Stops at the first error.
async fn read_each<I, F, Fut, T>(items: I, read: F) -> Result<Vec<T>, CoreError>
where
    I: IntoIterator,
    F: FnMut(I::Item) -> Fut,
    Fut: Future<Output = Result<Vec<T>, CoreError>>,
{
    let per_item: Vec<Vec<T>> = stream::iter(items)
        .map(read)
        .buffered(NESTED_READ_CONCURRENCY)
        .try_collect()
        .await?;
    Ok(per_item.into_iter().flatten().collect())
}

async fn list(
    client: &GatewayClient,
    collection: Collection,
    skip: bool,
) -> Result<Vec<Entity>, CoreError> {
    if skip {
        debug!(%collection, "skipping collection");
        return Ok(Vec::new());
    }
    client
        .list(collection)
        .await
        .map_err(fetch_error(collection))
}

async fn list_consumer_scoped(
    client: &GatewayClient,
    collection: Collection,
    options: &FetchOptions,
) -> Result<Vec<Entity>, CoreError> {
    list(
        client,
        collection,
        options.exclude_consumers && collection.is_consumer_scoped(),
    )
    .await
}

async fn upstreams_with_targets(
    client: &GatewayClient,
) -> Result<(Vec<Entity>, Vec<Entity>), CoreError> {
    let upstreams = list(client, Collection::Upstreams, false).await?;
    let targets = read_each(upstreams.iter().filter_map(Entity::id), |id| async move {
        client.list_targets(id).await.map_err(fetch_error("targets"))
    })
    .await?;
    Ok((upstreams, targets))
}

async fn rbac(
    client: &GatewayClient,
    include: bool,
) -> Result<(Vec<Entity>, Vec<Entity>), CoreError> {
    if !include {
        return Ok((Vec::new(), Vec::new()));
    }
    let roles = list(client, Collection::RbacRoles, false).await?;
    let permissions = read_each(roles.iter().filter_map(Entity::id), |id| async move {
        client
            .list_role_endpoints(id)
            .await
            .map_err(fetch_error("rbac_endpoint_permissions"))
    })
    .await?;
    Ok((roles, permissions))
}

async fn custom_entities(
    client: &GatewayClient,
    types: &[String],
) -> Result<Vec<CustomEntity>, CoreError> {
    read_each(types, |entity_type| async move {
        let entities = client
            .list_custom(entity_type)
            .await
            .map_err(fetch_error(entity_type))?;
        Ok::<_, CoreError>(
            entities
                .into_iter()
                .map(|entity| CustomEntity {
                    entity_type: entity_type.clone(),
                    entity,
                })
                .collect::<Vec<_>>(),
        )
    })
    .await
}

/// Read every gateway collection through `client`.
pub async fn fetch_gateway_state(
    client: &GatewayClient,
    options: &FetchOptions,
) -> Result<GatewayRawState, CoreError> {
    let (
        services,
        routes,
        mut plugins,
        (upstreams, targets),
        certificates,
        snis,
        ca_certificates,
        consumers,
        key_auths,
        hmac_auths,
        jwt_auths,
        basic_auths,
        acl_groups,
        oauth2_credentials,
        mtls_auths,
        (rbac_roles, rbac_endpoint_permissions),
        custom_entities,
    ) = try_join!(
        list(client, Collection::Services, false),
        list(client, Collection::Routes, false),
        list(client, Collection::Plugins, false),
        upstreams_with_targets(client),
        list(client, Collection::Certificates, false),
        list(client, Collection::Snis, false),
        list(client, Collection::CaCertificates, false),
        list_consumer_scoped(client, Collection::Consumers, options),
        list_consumer_scoped(client, Collection::KeyAuths, options),
        list_consumer_scoped(client, Collection::HmacAuths, options),
        list_consumer_scoped(client, Collection::JwtAuths, options),
        list_consumer_scoped(client, Collection::BasicAuths, options),
        list_consumer_scoped(client, Collection::AclGroups, options),
        list_consumer_scoped(client, Collection::Oauth2Credentials, options),
        list_consumer_scoped(client, Collection::MtlsAuths, options),
        rbac(client, options.include_rbac),
        custom_entities(client, &options.custom_entity_types),
    )?;

    // Plugins share one endpoint with their consumer-bound siblings.
    if options.exclude_consumers {
        plugins.retain(|plugin| !plugin.references("consumer"));
    }

    let state = GatewayRawState {
        services,
        routes,
        plugins,
        upstreams,
        targets,
        certificates,
        snis,
        ca_certificates,
        consumers,
        custom_entities,
        key_auths,
        hmac_auths,
        jwt_auths,
        basic_auths,
        acl_groups,
        oauth2_credentials,
        mtls_auths,
        rbac_roles,
        rbac_endpoint_permissions,
    };
    info!(entities = state.entity_count(), "fetched gateway state");
    Ok(state)
}

/// Version ids embedded in a service package record.
fn version_ids(package: &Entity) -> Vec<&str> {
    package
        .get("versions")
        .and_then(serde_json::Value::as_array)
        .map(|versions| {
            versions
                .iter()
                .filter_map(|v| v.get("id").and_then(serde_json::Value::as_str))
                .collect()
        })
        .unwrap_or_default()
}

async fn read_documents(
    client: &ManagedClient,
    session: &Session,
    owner: DocumentOwner,
) -> Result<Vec<Document>, CoreError> {
    let parent = match &owner {
        DocumentOwner::ServicePackage(id) => DocumentParent::Package(id),
        DocumentOwner::ServiceVersion(id) => DocumentParent::Version(id),
    };
    let entities = client
        .list_documents(session, parent)
        .await
        .map_err(fetch_error("documents"))?;
    Ok(entities
        .into_iter()
        .map(|entity| Document {
            owner: owner.clone(),
            entity,
        })
        .collect())
}

/// Read service packages and the documents of every package and version.
pub async fn fetch_managed_state(
    client: &ManagedClient,
    session: &Session,
) -> Result<ManagedRawState, CoreError> {
    let service_packages = client
        .list_service_packages(session)
        .await
        .map_err(fetch_error("service_packages"))?;

    let mut owners = Vec::new();
    for package in &service_packages {
        if let Some(id) = package.id() {
            owners.push(DocumentOwner::ServicePackage(id.to_owned()));
        }
        owners.extend(
            version_ids(package)
                .into_iter()
                .map(|id| DocumentOwner::ServiceVersion(id.to_owned())),
        );
    }

    let documents = read_each(owners, |owner| read_documents(client, session, owner)).await?;

    let state = ManagedRawState {
        service_packages,
        documents,
    };
    info!(entities = state.entity_count(), "fetched managed state");
    Ok(state)
}

/// Read the gateway and managed snapshots concurrently, all or nothing.
pub async fn fetch_state(
    gateway: &GatewayClient,
    managed: &ManagedClient,
    session: &Session,
    options: &FetchOptions,
) -> Result<(GatewayRawState, ManagedRawState), CoreError> {
    try_join!(
        fetch_gateway_state(gateway, options),
        fetch_managed_state(managed, session),
    )
}
