// Managed API packaging and document endpoints
//
// Service packages embed their versions; documents hang off either a
// package or a version and are listed per parent.

use tracing::debug;

use crate::error::Error;
use crate::managed::auth::Session;
use crate::managed::client::ManagedClient;
use crate::models::Entity;

/// Owner of a document collection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentParent<'a> {
    Package(&'a str),
    Version(&'a str),
}

impl DocumentParent<'_> {
    fn path(self) -> String {
        match self {
            Self::Package(id) => format!("api/service_packages/{id}/documents"),
            Self::Version(id) => format!("api/service_versions/{id}/documents"),
        }
    }
}

impl ManagedClient {
    /// `GET /api/service_packages`
    pub async fn list_service_packages(&self, session: &Session) -> Result<Vec<Entity>, Error> {
        debug!(org_id = ?session.org_id(), "listing service packages");
        self.api().get_list("api/service_packages").await
    }

    /// `GET /api/service_packages/{id}/documents` or
    /// `GET /api/service_versions/{id}/documents`
    pub async fn list_documents(
        &self,
        session: &Session,
        parent: DocumentParent<'_>,
    ) -> Result<Vec<Entity>, Error> {
        debug!(?parent, org_id = ?session.org_id(), "listing documents");
        self.api().get_list(&parent.path()).await
    }
}
