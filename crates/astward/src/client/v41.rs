//! Client for 4.1 servers.

use astward_ids::{ProjectId, ScanResultId};
use astward_protocol::wire::v41;
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

pub struct V41Client {
    core: ClientCore,
}

impl V41Client {
    pub fn new(core: ClientCore) -> Self {
        Self { core }
    }
}

/// Language spelling used by 4.1 scan settings.
pub fn language_name(language: Language) -> &'static str {
    match language {
        Language::Php => "PHP",
        Language::Java => "JAVA",
        Language::CSharp => "CSHARP",
        Language::Vb => "VB",
        Language::JavaScript => "JAVASCRIPT",
        Language::Python => "PYTHON",
        Language::ObjectiveC => "OBJECTIVEC",
        Language::Swift => "SWIFT",
        Language::Kotlin => "KOTLIN",
        Language::Go => "GO",
        Language::Sql => "SQL",
        Language::Cpp => "CPP",
    }
}

fn settings_model(settings: &ScanSettings) -> v41::ScanSettingsModel {
    v41::ScanSettingsModel {
        programming_languages: vec![language_name(settings.language).to_string()],
        enabled_patterns: settings.enabled_patterns.clone(),
        disabled_patterns: settings.disabled_patterns.clone(),
        use_incremental_scan: settings.incremental,
    }
}

impl ProtocolClient for V41Client {
    fn version(&self) -> ProtocolVersion {
        ProtocolVersion::V41
    }

    fn connection(&self) -> &ConnectionSettings {
        self.core.connection()
    }

    fn find_project_by_name(&self, name: &str) -> Result<Option<Project>> {
        debug!("Looking for project with name {}", name);
        let project: Option<v41::ProjectModel> = self
            .core
            .fetch_opt(v41::project_by_name(name), "Project search failed")?;
        Ok(project.map(convert_project))
    }

    fn find_project_by_id(&self, id: &ProjectId) -> Result<Option<Project>> {
        debug!("Looking for project with id {}", id);
        let project: Option<v41::ProjectModel> = self
            .core
            .fetch_opt(v41::project_by_id(id), "Project search failed")?;
        Ok(project.map(convert_project))
    }

    fn create_project(&self, name: &str, settings: &ScanSettings) -> Result<Project> {
        let model = v41::CreateProjectModel {
            name: name.to_string(),
            scan_settings: settings_model(settings),
        };
        let request = with_body(v41::create_project(), &model, "Project create failed")?;
        let project: v41::ProjectModel = self.core.fetch(request, "Project create failed")?;
        Ok(convert_project(project))
    }

    fn update_scan_settings(&self, project: &Project, settings: &ScanSettings) -> Result<()> {
        let request = with_body(
            v41::put_scan_settings(&project.id),
            &settings_model(settings),
            "Project settings update failed",
        )?;
        self.core.send(request, "Project settings update failed")
    }

    fn assign_policy(&self, id: &ProjectId, policy: Option<&str>) -> Result<()> {
        let body = json!({ "rules": policy.unwrap_or_default() });
        let request = with_body(v41::put_policy(id), &body, "Project policy assignment failed")?;
        self.core.send(request, "Project policy assignment failed")
    }

    fn delete_project(&self, id: &ProjectId) -> Result<()> {
        self.core
            .send(v41::delete_project(id), "Project delete failed")
    }

    fn list_projects(&self) -> Result<Vec<(ProjectId, String)>> {
        let without_details = self.core.connection().credentials.is_token();
        let request = v41::list_projects(without_details);
        if without_details {
            let projects: Vec<v41::ProjectLightModel> =
                self.core.fetch(request, "Project list read failed")?;
            Ok(projects.into_iter().map(|p| (p.id, p.name)).collect())
        } else {
            let projects: Vec<v41::ProjectModel> =
                self.core.fetch(request, "Project list read failed")?;
            Ok(projects.into_iter().map(|p| (p.id, p.name)).collect())
        }
    }

    fn pattern_catalog(&self) -> Result<Vec<PmPattern>> {
        let patterns: Vec<v41::PatternModel> = self
            .core
            .fetch(v41::patterns(), "Patterns load failed")?;
        Ok(patterns
            .into_iter()
            .map(|p| PmPattern {
                key: p.key,
                languages: p.languages,
            })
            .collect())
    }

    fn latest_scan_result(&self, id: &ProjectId) -> Result<Option<ScanResultBrief>> {
        let result: Option<v41::ScanResultModel> = self.core.fetch_opt(
            v41::last_scan_result(id),
            "Project latest scan result search failed",
        )?;
        Ok(result.map(convert_brief))
    }

    fn scan_results(&self, id: &ProjectId) -> Result<Vec<ScanResultBrief>> {
        let results: Vec<v41::ScanResultModel> = self
            .core
            .fetch(v41::scan_results(id), "Project scan results load failed")?;
        Ok(results.into_iter().map(convert_brief).collect())
    }

    fn scan_result(&self, id: &ProjectId, result: &ScanResultId) -> Result<ScanResult> {
        let brief: v41::ScanResultModel = self
            .core
            .fetch(v41::scan_result(id, result), "Scan result load failed")?;
        let issues: Vec<v41::IssueModel> = self
            .core
            .fetch(v41::scan_issues(id, result), "Scan issues load failed")?;
        let errors: Vec<v41::ScanErrorModel> = self
            .core
            .fetch(v41::scan_errors(id, result), "Scan errors load failed")?;
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
                v41::current_version(component),
                "Server component current version get failed",
            )?;
            info.components.insert(component, version);
        }
        Ok(info)
    }
}

fn convert_project(project: v41::ProjectModel) -> Project {
    Project {
        id: project.id,
        name: project.name,
        settings_id: None,
    }
}

fn convert_brief(result: v41::ScanResultModel) -> ScanResultBrief {
    let stage = match result.stage {
        v41::Stage::Setup => ScanStage::Setup,
        v41::Stage::Enqueued => ScanStage::Enqueued,
        v41::Stage::VfsSetup => ScanStage::VfsSetup,
        v41::Stage::Zip => ScanStage::Zip,
        v41::Stage::Upload => ScanStage::Upload,
        v41::Stage::Precheck => ScanStage::Precheck,
        v41::Stage::Scan => ScanStage::Scan,
        v41::Stage::Finalize => ScanStage::Finalize,
        v41::Stage::Done => ScanStage::Done,
        v41::Stage::Failed => ScanStage::Failed,
        v41::Stage::Aborted => ScanStage::Aborted,
        v41::Stage::Unknown => ScanStage::Unknown,
    };
    ScanResultBrief {
        id: result.id,
        project_id: result.project_id,
        created_at: result.scan_date,
        stage,
        policy_state: match result.policy_state {
            None | Some(v41::PolicyState::None) => PolicyState::None,
            Some(v41::PolicyState::Confirmed) => PolicyState::Confirmed,
            Some(v41::PolicyState::Rejected) => PolicyState::Rejected,
        },
    }
}
