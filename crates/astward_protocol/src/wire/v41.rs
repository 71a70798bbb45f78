//! Wire schema of the 4.1 server generation.
//!
//! Project listing and scan results moved under `/api/v2`, the stage became a
//! top-level SCREAMING_SNAKE_CASE field and patterns report `languages`.

use astward_ids::{ProjectId, ScanResultId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::transport::ApiRequest;
use crate::Component;

pub fn project_by_name(name: &str) -> ApiRequest {
    ApiRequest::get("/api/projects/name").with_query("name", name)
}

pub fn project_by_id(id: &ProjectId) -> ApiRequest {
    ApiRequest::get(format!("/api/projects/{}", id))
}

pub fn create_project() -> ApiRequest {
    ApiRequest::post("/api/projects")
}

pub fn put_scan_settings(id: &ProjectId) -> ApiRequest {
    ApiRequest::put(format!("/api/projects/{}/scanSettings", id))
}

pub fn put_policy(id: &ProjectId) -> ApiRequest {
    ApiRequest::put(format!("/api/projects/{}/policy", id))
}

pub fn delete_project(id: &ProjectId) -> ApiRequest {
    ApiRequest::delete(format!("/api/projects/{}", id))
}

pub fn list_projects(without_details: bool) -> ApiRequest {
    ApiRequest::get("/api/v2/projects").with_query("withoutDetails", without_details)
}

pub fn patterns() -> ApiRequest {
    ApiRequest::get("/api/configs/patterns")
}

pub fn last_scan_result(id: &ProjectId) -> ApiRequest {
    ApiRequest::get(format!("/api/v2/projects/{}/scanResults/last", id))
}

pub fn scan_results(id: &ProjectId) -> ApiRequest {
    ApiRequest::get(format!("/api/v2/projects/{}/scanResults", id))
}

pub fn scan_result(id: &ProjectId, result: &ScanResultId) -> ApiRequest {
    ApiRequest::get(format!("/api/v2/projects/{}/scanResults/{}", id, result))
}

pub fn scan_issues(id: &ProjectId, result: &ScanResultId) -> ApiRequest {
    ApiRequest::get(format!("/api/v2/projects/{}/scanResults/{}/issues", id, result))
}

pub fn scan_errors(id: &ProjectId, result: &ScanResultId) -> ApiRequest {
    ApiRequest::get(format!("/api/v2/projects/{}/scanResults/{}/errors", id, result))
}

pub fn current_version(component: Component) -> ApiRequest {
    ApiRequest::get("/api/versions/product/current").with_query("component", component.as_str())
}

/// Reduced-detail listing entry returned for token credentials.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectLightModel {
    pub id: ProjectId,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectModel {
    pub id: ProjectId,
    pub name: String,
    #[serde(default)]
    pub creation_date: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScanSettingsModel {
    pub programming_languages: Vec<String>,
    pub enabled_patterns: Vec<String>,
    pub disabled_patterns: Vec<String>,
    pub use_incremental_scan: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateProjectModel {
    pub name: String,
    pub scan_settings: ScanSettingsModel,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PatternModel {
    pub key: String,
    #[serde(default)]
    pub languages: Option<u64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
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
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PolicyState {
    None,
    Confirmed,
    Rejected,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScanResultModel {
    pub id: ScanResultId,
    pub project_id: ProjectId,
    pub scan_date: DateTime<Utc>,
    pub stage: Stage,
    #[serde(default)]
    pub policy_state: Option<PolicyState>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IssueModel {
    pub id: String,
    #[serde(rename = "type")]
    pub issue_type: String,
    pub level: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScanErrorModel {
    pub message: String,
    #[serde(default)]
    pub is_critical: bool,
}
