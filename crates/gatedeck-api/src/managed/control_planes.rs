// Managed API control-plane endpoints

use tracing::debug;

use crate::error::Error;
use crate::managed::auth::Session;
use crate::managed::client::ManagedClient;
use crate::models::ControlPlane;

impl ManagedClient {
    /// List every control plane visible to the session.
    ///
    /// `GET /api/control_planes`
    pub async fn list_control_planes(&self, session: &Session) -> Result<Vec<ControlPlane>, Error> {
        debug!(org_id = ?session.org_id(), "listing control planes");
        self.api().get_list("api/control_planes").await
    }
}
