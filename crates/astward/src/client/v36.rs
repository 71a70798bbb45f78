//! Client for 3.6 servers.

use astward_ids::{ProjectId, ScanResultId};
use astward_protocol::wire::v36;
use astward_protocol::{Component, ProtocolVersion};
use serde_json::Value;
use tracing::debug;

use super::{with_body, ClientCore, ProtocolClient};
use crate::domain::{
    PmPattern, PolicyState, Project, ScanErrorInfo, ScanIssue, ScanResult, ScanResultBrief,
    ScanSettings, ScanStage, ServerVersion,
};
use crate::error::Result;
use crate::settings::ConnectionSettings;

pub struct V36Client {
    core: ClientCore,
}

impl V36Client {
    pub fn new(core: ClientCore) -> Self {
        Self { core }
    }

    fn scan_settings(project: Option<&Project>, settings: &ScanSettings) -> v36::V36ScanSettings {
        v36::V36ScanSettings {
            id: project.and_then(|p| p.settings_id),
            programming_language: settings.language.as_str().to_string(),
            enabled_patterns: settings.enabled_patterns.clone(),
            disabled_patterns: settings.disabled_patterns.clone(),
            use_incremental_scan: settings.incremental,
        }
    }
}

impl ProtocolClient for V36Client {
    fn version(&self) -> ProtocolVersion {
        ProtocolVersion::V36
    }

    fn connection(&self) -> &ConnectionSettings {
        self.core.connection()
    }

    fn find_project_by_name(&self, name: &str) -> Result<Option<Project>> {
        debug!("Looking for project with name {}", name);
        let light: Option<v36::ProjectLight> = self
            .core
            .fetch_opt(v36::project_light_by_name(name), "Project search failed")?;
        Ok(light.map(|p| Project {
            id: p.id,
            name: p.name,
            settings_id: p.settings_id,
        }))
    }

    fn find_project_by_id(&self, id: &ProjectId) -> Result<Option<Project>> {
        debug!("Looking for project with id {}", id);
        let project: Option<v36::Project> = self
            .core
            .fetch_opt(v36::project_by_id(id), "Project search failed")?;
        Ok(project.map(convert_project))
    }

    fn create_project(&self, name: &str, settings: &ScanSettings) -> Result<Project> {
        let model = v36::CreateProjectModel {
            name: name.to_string(),
            scan_settings: Self::scan_settings(None, settings),
        };
        let request = with_body(v36::create_project(), &model, "Project create failed")?;
        let project: v36::Project = self.core.fetch(request, "Project create failed")?;
        Ok(convert_project(project))
    }

    fn update_scan_settings(&self, project: &Project, settings: &ScanSettings) -> Result<()> {
        let model = Self::scan_settings(Some(project), settings);
        let request = with_body(
            v36::put_scan_settings(&project.id),
            &model,
            "Project settings update failed",
        )?;
        self.core.send(request, "Project settings update failed")
    }

    fn assign_policy(&self, id: &ProjectId, policy: Option<&str>) -> Result<()> {
        let rules = Value::String(policy.unwrap_or_default().to_string());
        let request = with_body(v36::put_policy_rules(id), &rules, "Project policy assignment failed")?;
        self.core.send(request, "Project policy assignment failed")
    }

    fn delete_project(&self, id: &ProjectId) -> Result<()> {
        self.core
            .send(v36::delete_project(id), "Project delete failed")
    }

    fn list_projects(&self) -> Result<Vec<(ProjectId, String)>> {
        let without_details = self.core.connection().credentials.is_token();
        let projects: Vec<v36::Project> = self.core.fetch(
            v36::list_projects(without_details),
            "Project list read failed",
        )?;
        Ok(projects.into_iter().map(|p| (p.id, p.name)).collect())
    }

    fn pattern_catalog(&self) -> Result<Vec<PmPattern>> {
        let patterns: Vec<v36::PmPattern> = self
            .core
            .fetch(v36::pm_patterns(), "Patterns load failed")?;
        Ok(patterns
            .into_iter()
            .map(|p| PmPattern {
                key: p.key,
                // Java long on the wire; keep the bit pattern
                languages: p.programming_languages.map(|mask| mask as u64),
            })
            .collect())
    }

    fn latest_scan_result(&self, id: &ProjectId) -> Result<Option<ScanResultBrief>> {
        let result: Option<v36::ScanResult> = self.core.fetch_opt(
            v36::last_scan_result(id),
            "Project latest scan result search failed",
        )?;
        Ok(result.map(convert_brief))
    }

    fn scan_results(&self, id: &ProjectId) -> Result<Vec<ScanResultBrief>> {
        let results: Vec<v36::ScanResult> = self
            .core
            .fetch(v36::scan_results(id), "Project scan results load failed")?;
        Ok(results.into_iter().map(convert_brief).collect())
    }

    fn scan_result(&self, id: &ProjectId, result: &ScanResultId) -> Result<ScanResult> {
        let brief: v36::ScanResult = self
            .core
            .fetch(v36::scan_result(id, result), "Scan result load failed")?;
        let issues: Vec<v36::ScanIssue> = self
            .core
            .fetch(v36::scan_issues(id, result), "Scan issues load failed")?;
        let errors: Vec<v36::ScanError> = self
            .core
            .fetch(v36::scan_errors(id, result), "Scan errors load failed")?;
        Ok(ScanResult {
            brief: convert_brief(brief),
            issues: issues
                .into_iter()
                .map(|i| ScanIssue {
                    id: i.id,
                    issue_type: i.issue_type,
                    level: i.level,
                })
                .collect(),
            errors: errors
                .into_iter()
                .map(|e| ScanErrorInfo {
                    message: e.message,
                    critical: e.is_critical,
                })
                .collect(),
        })
    }

    fn version_info(&self) -> Result<ServerVersion> {
        let mut info = ServerVersion::default();
        for component in Component::ALL {
            debug!("Getting current {} component version", component);
            let version: String = self.core.fetch(
                v36::current_version(component),
                "Server component current version get failed",
            )?;
            debug!("Current version: {}", version);
            info.components.insert(component, version);
        }
        Ok(info)
    }
}

fn convert_project(project: v36::Project) -> Project {
    Project {
        id: project.id,
        name: project.name,
        settings_id: project.settings_id,
    }
}

fn convert_brief(result: v36::ScanResult) -> ScanResultBrief {
    ScanResultBrief {
        id: result.id,
        project_id: result.project_id,
        created_at: result.scan_date,
        stage: result
            .progress
            .map(|p| convert_stage(p.stage))
            .unwrap_or(ScanStage::Unknown),
        policy_state: match result.policy_state {
            None | Some(v36::PolicyState::None) => PolicyState::None,
            Some(v36::PolicyState::Confirmed) => PolicyState::Confirmed,
            Some(v36::PolicyState::Rejected) => PolicyState::Rejected,
        },
    }
}

fn convert_stage(stage: v36::Stage) -> ScanStage {
    match stage {
        v36::Stage::Setup => ScanStage::Setup,
        v36::Stage::Enqueued => ScanStage::Enqueued,
        v36::Stage::VfsSetup => ScanStage::VfsSetup,
        v36::Stage::Zip => ScanStage::Zip,
        v36::Stage::Upload => ScanStage::Upload,
        v36::Stage::Precheck => ScanStage::Precheck,
        v36::Stage::Scan => ScanStage::Scan,
        v36::Stage::Finalize => ScanStage::Finalize,
        v36::Stage::Done => ScanStage::Done,
        v36::Stage::Failed => ScanStage::Failed,
        v36::Stage::Aborted => ScanStage::Aborted,
        v36::Stage::Unknown => ScanStage::Unknown,
    }
}
