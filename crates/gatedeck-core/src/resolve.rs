// ── Control-plane resolution ──
//
// One lookup call against the managed API, then a pure selection over the
// listed control planes: the single Enterprise gateway control plane,
// optionally narrowed by name.

use gatedeck_api::{ControlPlane, ManagedClient, Session};
use tracing::{debug, info};

use crate::error::CoreError;

/// Type name of a gateway control plane on the managed backend.
pub const ENTERPRISE_CONTROL_PLANE_TYPE: &str = "kong-ee";

/// Pick the one Enterprise control plane out of `planes`.
///
/// With `name` set, only planes with that exact name are candidates.
/// Zero or several candidates are both resolution failures.
pub fn select_control_plane<'a>(
    planes: &'a [ControlPlane],
    name: Option<&str>,
) -> Result<&'a ControlPlane, CoreError> {
    let mut candidates = planes.iter().filter(|cp| {
        cp.type_name() == Some(ENTERPRISE_CONTROL_PLANE_TYPE)
            && name.is_none_or(|wanted| cp.name.as_deref() == Some(wanted))
    });

    let Some(first) = candidates.next() else {
        let message = match name {
            Some(wanted) => format!("found no Kong Enterprise control plane named {wanted:?}"),
            None => "found no Kong Enterprise control plane".to_owned(),
        };
        return Err(CoreError::Resolution {
            message,
            source: None,
        });
    };

    let extra = candidates.count();
    if extra > 0 {
        return Err(CoreError::Resolution {
            message: format!(
                "found multiple Kong Enterprise control planes ({}); pass --control-plane to pick one",
                extra + 1
            ),
            source: None,
        });
    }
    Ok(first)
}

/// List the session's control planes and return the id of the target one.
pub async fn resolve_control_plane(
    managed: &ManagedClient,
    session: &Session,
    name: Option<&str>,
) -> Result<String, CoreError> {
    let planes = managed
        .list_control_planes(session)
        .await
        .map_err(|source| CoreError::Resolution {
            message: source.to_string(),
            source: Some(source),
        })?;
    debug!(count = planes.len(), "listed control planes");

    let selected = select_control_plane(&planes, name)?;
    info!(id = %selected.id, name = ?selected.name, "resolved control plane");
    Ok(selected.id.clone())
}
