//! Project lookup and configuration through the active client.

use astward_ids::ProjectId;
use tracing::{debug, info};

use crate::client::ProtocolClient;
use crate::documents::ScanSettingsDocument;
use crate::domain::{Project, ScanSettings};
use crate::error::Result;
use crate::patterns;

/// Projects on the server, addressed by name or id.
///
/// Name uniqueness is the server's business; this view only searches before
/// creating so repeated setup converges on one project.
pub struct ProjectDirectory<'a> {
    client: &'a dyn ProtocolClient,
}

impl<'a> ProjectDirectory<'a> {
    pub fn new(client: &'a dyn ProtocolClient) -> Self {
        Self { client }
    }

    pub fn find_by_name(&self, name: &str) -> Result<Option<Project>> {
        self.client.find_project_by_name(name)
    }

    pub fn find_by_id(&self, id: &ProjectId) -> Result<Option<Project>> {
        self.client.find_project_by_id(id)
    }

    /// Create `name` with `settings`, or replace the settings of the existing
    /// project. The policy attachment is applied in both cases.
    pub fn create_or_update(&self, name: &str, settings: &ScanSettings) -> Result<Project> {
        let project = self.upsert(name, settings)?;
        self.client
            .assign_policy(&project.id, settings.policy.as_deref())?;
        Ok(project)
    }

    /// Remove a project. Deleting an already removed project is an error.
    pub fn delete(&self, id: &ProjectId) -> Result<()> {
        debug!("Deleting project {}", id);
        self.client.delete_project(id)
    }

    /// `(id, name)` pairs in server order.
    pub fn list(&self) -> Result<Vec<(ProjectId, String)>> {
        self.client.list_projects()
    }

    /// Build scan settings from a parsed settings document, negotiating the
    /// pattern lists against the server catalog, then create or update the
    /// project. `before_policy` runs after the project exists and before the
    /// policy is assigned; source upload hooks in here.
    pub fn setup_from_settings<F>(
        &self,
        document: &ScanSettingsDocument,
        policy: Option<&str>,
        before_policy: F,
    ) -> Result<Project>
    where
        F: FnOnce(&Project) -> Result<()>,
    {
        let selection = patterns::negotiate(self.client, document.programming_language)?;
        let mut settings = ScanSettings::new(document.programming_language);
        settings.enabled_patterns = selection.enabled;
        settings.disabled_patterns = selection.disabled;
        settings.incremental = document.use_incremental_scan;

        let project = self.upsert(&document.project_name, &settings)?;
        before_policy(&project)?;
        self.client.assign_policy(&project.id, policy)?;
        Ok(project)
    }

    fn upsert(&self, name: &str, settings: &ScanSettings) -> Result<Project> {
        match self.find_by_name(name)? {
            Some(existing) => {
                debug!("Updating settings of project {} ({})", name, existing.id);
                self.client.update_scan_settings(&existing, settings)?;
                Ok(existing)
            }
            None => {
                let created = self.client.create_project(name, settings)?;
                info!("Created project {} ({})", name, created.id);
                Ok(created)
            }
        }
    }
}
