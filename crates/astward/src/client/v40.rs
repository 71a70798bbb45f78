//! Client for 4.0 servers.

use astward_ids::{ProjectId, ScanResultId};
use astward_protocol::wire::v40;
use astward_protocol::{Component, ProtocolVersion};
use serde_json::json;
use tracing::debug;

use super::{with_body, ClientCore, ProtocolClient};
use crate::domain::{
    Language, PmPattern, PolicyState, Project, ScanErrorInfo, ScanIssue, ScanResult,
    ScanResultBrief, ScanSettings, ScanStage, ServerVersion,
};
use crate::error::Result;
use crate::settings::ConnectionSettings;

pub struct V40Client {
    core: ClientCore,
}

impl V40Client {
    pub fn new(core: ClientCore) -> Self {
        Self { core }
    }
}

/// Language spelling used by 4.0 settings.
pub fn language_name(language: Language) -> &'static str {
    match language {
        Language::Php => "php",
        Language::Java => "java",
        Language::CSharp => "csharp",
        Language::Vb => "vb",
        Language::JavaScript => "javascript",
        Language::Python => "python",
        Language::ObjectiveC => "objective_c",
        Language::Swift => "swift",
        Language::Kotlin => "kotlin",
        Language::Go => "go",
        Language::Sql => "sql",
        Language::Cpp => "cpp",
    }
}

fn settings_model(settings: &ScanSettings) -> v40::ProjectSettingsModel {
    v40::ProjectSettingsModel {
        languages: vec![language_name(settings.language).to_string()],
        patterns: v40::PatternSelection {
            enabled: settings.enabled_patterns.clone(),
            disabled: settings.disabled_patterns.clone(),
        },
        incremental: settings.incremental,
    }
}

impl ProtocolClient for V40Client {
    fn version(&self) -> ProtocolVersion {
        ProtocolVersion::V40
    }

    fn connection(&self) -> &ConnectionSettings {
        self.core.connection()
    }

    fn find_project_by_name(&self, name: &str) -> Result<Option<Project>> {
        debug!("Looking for project with name {}", name);
        let project: Option<v40::ProjectModel> = self
            .core
            .fetch_opt(v40::project_by_name(name), "Project search failed")?;
        Ok(project.map(convert_project))
    }

    fn find_project_by_id(&self, id: &ProjectId) -> Result<Option<Project>> {
        debug!("Looking for project with id {}", id);
        let project: Option<v40::ProjectModel> = self
            .core
            .fetch_opt(v40::project_by_id(id), "Project search failed")?;
        Ok(project.map(convert_project))
    }

    fn create_project(&self, name: &str, settings: &ScanSettings) -> Result<Project> {
        let model = v40::CreateProjectModel {
            name: name.to_string(),
            settings: settings_model(settings),
        };
        let request = with_body(v40::create_project(), &model, "Project create failed")?;
        let project: v40::ProjectModel = self.core.fetch(request, "Project create failed")?;
        Ok(convert_project(project))
    }

    fn update_scan_settings(&self, project: &Project, settings: &ScanSettings) -> Result<()> {
        let request = with_body(
            v40::put_settings(&project.id),
            &settings_model(settings),
            "Project settings update failed",
        )?;
        self.core.send(request, "Project settings update failed")
    }

    fn assign_policy(&self, id: &ProjectId, policy: Option<&str>) -> Result<()> {
        let body = json!({ "rules": policy.unwrap_or_default() });
        let request = with_body(v40::put_policy(id), &body, "Project policy assignment failed")?;
        self.core.send(request, "Project policy assignment failed")
    }

    fn delete_project(&self, id: &ProjectId) -> Result<()> {
        self.core
            .send(v40::delete_project(id), "Project delete failed")
    }

    fn list_projects(&self) -> Result<Vec<(ProjectId, String)>> {
        let without_details = self.core.connection().credentials.is_token();
        let projects: Vec<v40::ProjectModel> = self.core.fetch(
            v40::list_projects(without_details),
            "Project list read failed",
        )?;
        Ok(projects.into_iter().map(|p| (p.id, p.name)).collect())
    }

    fn pattern_catalog(&self) -> Result<Vec<PmPattern>> {
        let patterns: Vec<v40::PatternModel> = self
            .core
            .fetch(v40::patterns(), "Patterns load failed")?;
        Ok(patterns
            .into_iter()
            .map(|p| PmPattern {
                key: p.key,
                languages: p.language_mask,
            })
            .collect())
    }

    fn latest_scan_result(&self, id: &ProjectId) -> Result<Option<ScanResultBrief>> {
        let result: Option<v40::ScanResultModel> = self.core.fetch_opt(
            v40::last_scan_result(id),
            "Project latest scan result search failed",
        )?;
        Ok(result.map(convert_brief))
    }

    fn scan_results(&self, id: &ProjectId) -> Result<Vec<ScanResultBrief>> {
        let results: Vec<v40::ScanResultModel> = self
            .core
            .fetch(v40::scan_results(id), "Project scan results load failed")?;
        Ok(results.into_iter().map(convert_brief).collect())
    }

    fn scan_result(&self, id: &ProjectId, result: &ScanResultId) -> Result<ScanResult> {
        let brief: v40::ScanResultModel = self
            .core
            .fetch(v40::scan_result(id, result), "Scan result load failed")?;
        let issues: Vec<v40::IssueModel> = self
            .core
            .fetch(v40::scan_issues(id, result), "Scan issues load failed")?;
        let errors: Vec<v40::ScanErrorModel> = self
            .core
            .fetch(v40::scan_errors(id, result), "Scan errors load failed")?;
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
                    critical: e.critical,
                })
                .collect(),
        })
    }

    fn version_info(&self) -> Result<ServerVersion> {
        let mut info = ServerVersion::default();
        for component in Component::ALL {
            debug!("Getting current {} component version", component);
            let version: String = self.core.fetch(
                v40::current_version(component),
                "Server component current version get failed",
            )?;
            info.components.insert(component, version);
        }
        Ok(info)
    }
}

fn convert_project(project: v40::ProjectModel) -> Project {
    Project {
        id: project.id,
        name: project.name,
        settings_id: None,
    }
}

fn convert_brief(result: v40::ScanResultModel) -> ScanResultBrief {
    let stage = match result.status.map(|s| s.stage) {
        Some(v40::Stage::Setup) => ScanStage::Setup,
        Some(v40::Stage::Enqueued) => ScanStage::Enqueued,
        Some(v40::Stage::VfsSetup) => ScanStage::VfsSetup,
        Some(v40::Stage::Zip) => ScanStage::Zip,
        Some(v40::Stage::Upload) => ScanStage::Upload,
        Some(v40::Stage::Precheck) => ScanStage::Precheck,
        Some(v40::Stage::Scan) => ScanStage::Scan,
        Some(v40::Stage::Finalize) => ScanStage::Finalize,
        Some(v40::Stage::Done) => ScanStage::Done,
        Some(v40::Stage::Failed) => ScanStage::Failed,
        Some(v40::Stage::Aborted) => ScanStage::Aborted,
        Some(v40::Stage::Unknown) | None => ScanStage::Unknown,
    };
    ScanResultBrief {
        id: result.id,
        project_id: result.project_id,
        created_at: result.created_at,
        stage,
        policy_state: match result.policy_state {
            None | Some(v40::PolicyState::None) => PolicyState::None,
            Some(v40::PolicyState::Confirmed) => PolicyState::Confirmed,
            Some(v40::PolicyState::Rejected) => PolicyState::Rejected,
        },
    }
}
