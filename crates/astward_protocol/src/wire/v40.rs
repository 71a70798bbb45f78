//! Wire schema of the 4.0 server generation.
//!
//! Lower-case resource paths. Settings are a sub-resource of the project and
//! have no identity of their own. Enum values are snake_case.

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

pub fn put_settings(id: &ProjectId) -> ApiRequest {
    ApiRequest::put(format!("/api/projects/{}/settings", id))
}

pub fn put_policy(id: &ProjectId) -> ApiRequest {
    ApiRequest::put(format!("/api/projects/{}/policy", id))
}

pub fn delete_project(id: &ProjectId) -> ApiRequest {
    ApiRequest::delete(format!("/api/projects/{}", id))
}

pub fn list_projects(without_details: bool) -> ApiRequest {
    ApiRequest::get("/api/projects").with_query("withoutDetails", without_details)
}

pub fn patterns() -> ApiRequest {
    ApiRequest::get("/api/configs/patterns")
}

pub fn last_scan_result(id: &ProjectId) -> ApiRequest {
    ApiRequest::get(format!("/api/projects/{}/scanResults/last", id))
}

pub fn scan_results(id: &ProjectId) -> ApiRequest {
    ApiRequest::get(format!("/api/projects/{}/scanResults", id))
}

pub fn scan_result(id: &ProjectId, result: &ScanResultId) -> ApiRequest {
    ApiRequest::get(format!("/api/projects/{}/scanResults/{}", id, result))
}

pub fn scan_issues(id: &ProjectId, result: &ScanResultId) -> ApiRequest {
    ApiRequest::get(format!("/api/projects/{}/scanResults/{}/issues", id, result))
}

pub fn scan_errors(id: &ProjectId, result: &ScanResultId) -> ApiRequest {
    ApiRequest::get(format!("/api/projects/{}/scanResults/{}/errors", id, result))
}

pub fn current_version(component: Component) -> ApiRequest {
    ApiRequest::get("/api/versions/product/current").with_query("component", component.as_str())
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectModel {
    pub id: ProjectId,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PatternSelection {
    pub enabled: Vec<String>,
    pub disabled: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectSettingsModel {
    pub languages: Vec<String>,
    pub patterns: PatternSelection,
    pub incremental: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateProjectModel {
    pub name: String,
    pub settings: ProjectSettingsModel,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PatternModel {
    pub key: String,
    #[serde(default)]
    pub language_mask: Option<u64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
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
#[serde(rename_all = "snake_case")]
pub enum PolicyState {
    None,
    Confirmed,
    Rejected,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScanStatusModel {
    pub stage: Stage,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScanResultModel {
    pub id: ScanResultId,
    pub project_id: ProjectId,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub status: Option<ScanStatusModel>,
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
    pub critical: bool,
}
