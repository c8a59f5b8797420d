// gatedeck-core: the dump pipeline on top of gatedeck-api.
//
// Resolves the target control plane, reads a complete snapshot of its
// entities, and hands it to a `StateWriter`.

pub mod dump;
pub mod error;
pub mod fetch;
pub mod resolve;
pub mod state;

pub use dump::{DumpRequest, DumpStage, DumpSummary, Format, StateWriter, WriteConfig, run_dump};
pub use error::{BoxError, CoreError, ErrorArray};
pub use fetch::{FetchOptions, fetch_gateway_state, fetch_managed_state, fetch_state};
pub use resolve::{ENTERPRISE_CONTROL_PLANE_TYPE, resolve_control_plane, select_control_plane};
pub use state::{CustomEntity, Document, DocumentOwner, DumpState, GatewayRawState, ManagedRawState};
