// ── Dump orchestration ──
//
// Linear pipeline: build managed client → login → resolve control plane →
// build scoped gateway client → fetch → hand the snapshot to a writer.
// Every step depends on the previous one, so steps run strictly in order
// and the first failure ends the dump. Nothing remote is mutated.

use gatedeck_api::{ClientConfig, Credentials, GatewayClient, ManagedClient};
use strum::{Display, EnumString};
use tracing::info;

use crate::error::{BoxError, CoreError};
use crate::fetch::{FetchOptions, fetch_state};
use crate::resolve::resolve_control_plane;
use crate::state::DumpState;

/// Steps of a dump, used to tag failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
pub enum DumpStage {
    #[strum(serialize = "building managed client")]
    BuildManagedClient,
    #[strum(serialize = "authenticating with Konnect")]
    Authenticate,
    #[strum(serialize = "resolving control plane")]
    ResolveControlPlane,
    #[strum(serialize = "building gateway client")]
    BuildGatewayClient,
    #[strum(serialize = "fetching state")]
    FetchState,
    #[strum(serialize = "writing state")]
    WriteState,
}

/// Output encoding. Parsing is case-insensitive.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Display, EnumString)]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum Format {
    Json,
    #[default]
    Yaml,
}

impl Format {
    pub fn extension(self) -> &'static str {
        match self {
            Self::Json => "json",
            Self::Yaml => "yaml",
        }
    }
}

/// Where and how the snapshot is written.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WriteConfig {
    /// File name, or `-` for standard output.
    pub output: String,
    pub format: Format,
    /// Keep entity ids in the output.
    pub with_id: bool,
}

impl Default for WriteConfig {
    fn default() -> Self {
        Self {
            output: "kong".to_owned(),
            format: Format::Yaml,
            with_id: false,
        }
    }
}

/// Encodes a finished snapshot. Implemented by the binary's file writer.
pub trait StateWriter: Send + Sync {
    fn write(&self, state: &DumpState, config: &WriteConfig) -> Result<(), BoxError>;
}

/// Inputs of one dump.
#[derive(Debug, Clone)]
pub struct DumpRequest {
    /// Managed API client config. The gateway client is derived from it.
    pub managed: ClientConfig,
    pub credentials: Credentials,
    /// Control-plane name, when more than one could match.
    pub control_plane: Option<String>,
    pub fetch: FetchOptions,
    pub write: WriteConfig,
}

/// Outcome of a successful dump.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DumpSummary {
    pub control_plane_id: String,
    pub entities: usize,
}

/// Run one dump end to end.
///
/// The writer is only invoked with a complete snapshot; any earlier failure
/// returns before it is called.
pub async fn run_dump(
    request: DumpRequest,
    writer: &dyn StateWriter,
) -> Result<DumpSummary, CoreError> {
    let DumpRequest {
        managed: managed_config,
        credentials,
        control_plane,
        fetch,
        write,
    } = request;

    let managed = ManagedClient::new(&managed_config).map_err(|source| CoreError::Config {
        stage: DumpStage::BuildManagedClient,
        source,
    })?;

    let session = managed
        .login(credentials)
        .await
        .map_err(|source| CoreError::Auth { source })?;
    info!("authenticated with Konnect");

    let control_plane_id =
        resolve_control_plane(&managed, &session, control_plane.as_deref()).await?;

    let gateway_config = managed_config
        .with_address(managed.control_plane_address(&control_plane_id))
        .with_cookie_jar(session.cookie_jar());
    let gateway = GatewayClient::new(&gateway_config).map_err(|source| CoreError::Config {
        stage: DumpStage::BuildGatewayClient,
        source,
    })?;

    let (gateway_state, managed_state) = fetch_state(&gateway, &managed, &session, &fetch).await?;
    let state = DumpState {
        control_plane_id,
        gateway: gateway_state,
        managed: managed_state,
    };

    writer
        .write(&state, &write)
        .map_err(|source| CoreError::Serialization { source })?;

    let summary = DumpSummary {
        entities: state.entity_count(),
        control_plane_id: state.control_plane_id,
    };
    info!(
        control_plane = %summary.control_plane_id,
        entities = summary.entities,
        output = %write.output,
        "dump complete"
    );
    Ok(summary)
}
