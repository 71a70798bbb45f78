//! Wire schema of the 3.6 server generation.
//!
//! PascalCase resource paths, settings that carry their own identity, and
//! PascalCase enum values.

use astward_ids::{ProjectId, ScanResultId, SettingsId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::transport::ApiRequest;
use crate::Component;

pub fn project_light_by_name(name: &str) -> ApiRequest {
    ApiRequest::get("/api/Projects/light").with_query("name", name)
}

pub fn project_by_id(id: &ProjectId) -> ApiRequest {
    ApiRequest::get(format!("/api/Projects/{}", id))
}

pub fn create_project() -> ApiRequest {
    ApiRequest::post("/api/Projects")
}

pub fn put_scan_settings(id: &ProjectId) -> ApiRequest {
    ApiRequest::put(format!("/api/Projects/{}/ScanSettings", id))
}

pub fn put_policy_rules(id: &ProjectId) -> ApiRequest {
    ApiRequest::put(format!("/api/Projects/{}/PoliciesRules", id))
}

pub fn delete_project(id: &ProjectId) -> ApiRequest {
    ApiRequest::delete(format!("/api/Projects/{}", id))
}

pub fn list_projects(without_details: bool) -> ApiRequest {
    ApiRequest::get("/api/Projects").with_query("withoutDetails", without_details)
}

pub fn pm_patterns() -> ApiRequest {
    ApiRequest::get("/api/Configs/pmPatterns")
}

pub fn last_scan_result(id: &ProjectId) -> ApiRequest {
    ApiRequest::get(format!("/api/Projects/{}/ScanResults/last", id))
}

pub fn scan_results(id: &ProjectId) -> ApiRequest {
    ApiRequest::get(format!("/api/Projects/{}/ScanResults", id))
        .with_query("authScope", "AccessToken")
}

pub fn scan_result(id: &ProjectId, result: &ScanResultId) -> ApiRequest {
    ApiRequest::get(format!("/api/Projects/{}/ScanResults/{}", id, result))
}

pub fn scan_issues(id: &ProjectId, result: &ScanResultId) -> ApiRequest {
    ApiRequest::get(format!("/api/Projects/{}/ScanResults/{}/Issues", id, result))
}

pub fn scan_errors(id: &ProjectId, result: &ScanResultId) -> ApiRequest {
    ApiRequest::get(format!("/api/Projects/{}/ScanResults/{}/Errors", id, result))
}

pub fn current_version(component: Component) -> ApiRequest {
    ApiRequest::get(format!("/api/Versions/{}/current", component.as_str()))
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectLight {
    pub id: ProjectId,
    pub name: String,
    #[serde(default)]
    pub settings_id: Option<SettingsId>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Project {
    pub id: ProjectId,
    pub name: String,
    #[serde(default)]
    pub settings_id: Option<SettingsId>,
    #[serde(default)]
    pub creation_date: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct V36ScanSettings {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<SettingsId>,
    pub programming_language: String,
    pub enabled_patterns: Vec<String>,
    pub disabled_patterns: Vec<String>,
    pub use_incremental_scan: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateProjectModel {
    pub name: String,
    pub scan_settings: V36ScanSettings,
}

/// Pattern languages arrive as a signed Java long.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PmPattern {
    pub key: String,
    #[serde(default)]
    pub programming_languages: Option<i64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Stage {
    Setup,
    Enqueued,
    VfsSetup,
    Zip,
    Upload,
    Precheck,
    Scan,
    Finalize,
    Done,
    Failed,
    Aborted,
    #[serde(other)]
    Unknown,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PolicyState {
    None,
    Confirmed,
    Rejected,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScanProgress {
    pub stage: Stage,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScanResult {
    pub id: ScanResultId,
    pub project_id: ProjectId,
    pub scan_date: DateTime<Utc>,
    #[serde(default)]
    pub progress: Option<ScanProgress>,
    #[serde(default)]
    pub policy_state: Option<PolicyState>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScanIssue {
    pub id: String,
    pub issue_type: String,
    pub level: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScanError {
    pub message: String,
    #[serde(default)]
    pub is_critical: bool,
}
