//! In-memory analysis server speaking one wire generation.
//!
//! Responses are built from the same wire models the client decodes, and
//! requests are routed only by the paths their generation owns, so a client
//! that uses another generation's paths gets `400` instead of data.

use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, MutexGuard};

use astward_ids::{ProjectId, ScanResultId, SettingsId};
use astward_protocol::wire::{self, v36, v40, v41};
use astward_protocol::{
    ApiRequest, ApiResponse, Method, ProtocolVersion, Transport, TransportError,
};
use chrono::{DateTime, Duration, TimeZone, Utc};
use serde::Serialize;
use serde_json::{json, Value};

/// Generation-neutral stage of a stored scan result.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FakeStage {
    Enqueued,
    Scan,
    Done,
    Failed,
    Aborted,
}

/// Generation-neutral policy verdict of a stored scan result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FakePolicy {
    #[default]
    None,
    Confirmed,
    Rejected,
}

/// Scan settings as the server stored them.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct FakeSettings {
    pub languages: Vec<String>,
    pub enabled: Vec<String>,
    pub disabled: Vec<String>,
    pub incremental: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct FakeProject {
    pub id: ProjectId,
    pub name: String,
    pub settings_id: SettingsId,
    pub settings: FakeSettings,
    /// Serialized policy rules; `None` once cleared.
    pub policy: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct FakeScanResult {
    pub id: ScanResultId,
    pub created_at: DateTime<Utc>,
    pub stage: FakeStage,
    pub policy: FakePolicy,
    /// `(id, type, level)`
    pub issues: Vec<(String, String, String)>,
    /// `(message, critical)`
    pub errors: Vec<(String, bool)>,
    /// Listings left before a running result turns `Done`.
    pub completes_after: Option<u32>,
}

impl FakeScanResult {
    pub fn new(stage: FakeStage, created_at: DateTime<Utc>) -> Self {
        Self {
            id: ScanResultId::new(),
            created_at,
            stage,
            policy: FakePolicy::None,
            issues: Vec::new(),
            errors: Vec::new(),
            completes_after: None,
        }
    }

    /// A running scan that becomes `Done` after `listings` result listings.
    pub fn running(created_at: DateTime<Utc>, listings: u32) -> Self {
        Self {
            completes_after: Some(listings),
            ..Self::new(FakeStage::Scan, created_at)
        }
    }

    pub fn with_policy(mut self, policy: FakePolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn with_issue(mut self, issue_type: &str, level: &str) -> Self {
        let id = format!("issue-{}", self.issues.len() + 1);
        self.issues
            .push((id, issue_type.to_string(), level.to_string()));
        self
    }

    pub fn with_error(mut self, message: &str, critical: bool) -> Self {
        self.errors.push((message.to_string(), critical));
        self
    }
}

/// How a matching request fails.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Failure {
    /// Answer with this HTTP status and no body.
    Status(u16),
    /// Fail below HTTP, as a dropped connection would.
    Disconnect,
    /// Report the call as interrupted.
    Interrupted,
}

#[derive(Debug, Default)]
struct State {
    reported_version: String,
    projects: Vec<FakeProject>,
    catalog: Vec<(String, Option<u64>)>,
    results: BTreeMap<ProjectId, Vec<FakeScanResult>>,
    failures: Vec<(Method, String, Failure)>,
    requests: Vec<String>,
    clock: i64,
}

/// In-memory server. Clones share state, so a test can keep one handle while
/// the client owns another as its [`Transport`].
#[derive(Debug, Clone)]
pub struct FakeServer {
    generation: ProtocolVersion,
    state: Arc<Mutex<State>>,
}

impl FakeServer {
    pub fn new(generation: ProtocolVersion) -> Self {
        let reported_version = match generation {
            ProtocolVersion::V36 => "3.6.5.1087",
            ProtocolVersion::V40 => "4.0.2.11940",
            ProtocolVersion::V41 => "4.1.2.15222",
        };
        Self {
            generation,
            state: Arc::new(Mutex::new(State {
                reported_version: reported_version.to_string(),
                ..State::default()
            })),
        }
    }

    pub fn generation(&self) -> ProtocolVersion {
        self.generation
    }

    /// Override what the version probe reports.
    pub fn set_reported_version(&self, version: &str) {
        self.lock().reported_version = version.to_string();
    }

    pub fn set_catalog(&self, catalog: Vec<(&str, Option<u64>)>) {
        self.lock().catalog = catalog
            .into_iter()
            .map(|(key, mask)| (key.to_string(), mask))
            .collect();
    }

    /// Every request whose method matches and whose rendered form contains
    /// `fragment` fails with `failure` until [`clear_failures`](Self::clear_failures).
    pub fn fail(&self, method: Method, fragment: &str, failure: Failure) {
        self.lock()
            .failures
            .push((method, fragment.to_string(), failure));
    }

    pub fn clear_failures(&self) {
        self.lock().failures.clear();
    }

    /// Store a project directly, bypassing the client.
    pub fn insert_project(&self, name: &str) -> ProjectId {
        let mut state = self.lock();
        let created_at = state.tick();
        let project = FakeProject {
            id: ProjectId::new(),
            name: name.to_string(),
            settings_id: SettingsId::new(),
            settings: FakeSettings::default(),
            policy: None,
            created_at,
        };
        let id = project.id;
        state.projects.push(project);
        id
    }

    pub fn add_result(&self, project: ProjectId, result: FakeScanResult) -> ScanResultId {
        let id = result.id;
        self.lock().results.entry(project).or_default().push(result);
        id
    }

    /// A timestamp later than every one handed out before.
    pub fn next_timestamp(&self) -> DateTime<Utc> {
        self.lock().tick()
    }

    pub fn projects(&self) -> Vec<FakeProject> {
        self.lock().projects.clone()
    }

    pub fn project_named(&self, name: &str) -> Option<FakeProject> {
        self.lock()
            .projects
            .iter()
            .find(|p| p.name == name)
            .cloned()
    }

    pub fn results(&self, project: &ProjectId) -> Vec<FakeScanResult> {
        self.lock()
            .results
            .get(project)
            .cloned()
            .unwrap_or_default()
    }

    /// Rendered requests in arrival order, e.g. `GET /api/projects?withoutDetails=true`.
    pub fn requests(&self) -> Vec<String> {
        self.lock().requests.clone()
    }

    pub fn request_count(&self, fragment: &str) -> usize {
        self.lock()
            .requests
            .iter()
            .filter(|r| r.contains(fragment))
            .count()
    }

    fn lock(&self) -> MutexGuard<'_, State> {
        match self.state.lock() {
            Ok(state) => state,
            Err(poisoned) => poisoned.into_inner(),
        }
    }
}

impl Transport for FakeServer {
    fn execute(&self, request: &ApiRequest) -> Result<ApiResponse, TransportError> {
        let rendered = request.to_string();
        let mut state = self.lock();
        state.requests.push(rendered.clone());

        let failure = state
            .failures
            .iter()
            .find(|(method, fragment, _)| *method == request.method && rendered.contains(fragment))
            .map(|(_, _, failure)| *failure);
        match failure {
            Some(Failure::Status(status)) => return Ok(ApiResponse::new(status, None)),
            Some(Failure::Disconnect) => {
                return Err(TransportError::Request {
                    request: rendered,
                    message: "connection reset by peer".to_string(),
                })
            }
            Some(Failure::Interrupted) => return Err(TransportError::Interrupted),
            None => {}
        }

        Ok(Router {
            generation: self.generation,
            state: &mut *state,
        }
        .route(request))
    }
}

impl State {
    fn tick(&mut self) -> DateTime<Utc> {
        self.clock += 1;
        let base = Utc
            .with_ymd_and_hms(2024, 1, 1, 0, 0, 0)
            .single()
            .unwrap_or_default();
        base + Duration::seconds(self.clock)
    }

    fn project_index(&self, id: &ProjectId) -> Option<usize> {
        self.projects.iter().position(|p| p.id == *id)
    }
}

struct Layout {
    projects: &'static str,
    by_name: &'static str,
    settings: &'static str,
    policy: &'static str,
    results: &'static str,
    issues: &'static str,
    errors: &'static str,
    /// Listing lives under `/api/v2`.
    v2_listing: bool,
    /// Scan results live under `/api/v2`.
    v2_results: bool,
}

impl Layout {
    fn of(generation: ProtocolVersion) -> Self {
        match generation {
            ProtocolVersion::V36 => Layout {
                projects: "Projects",
                by_name: "light",
                settings: "ScanSettings",
                policy: "PoliciesRules",
                results: "ScanResults",
                issues: "Issues",
                errors: "Errors",
                v2_listing: false,
                v2_results: false,
            },
            ProtocolVersion::V40 => Layout {
                projects: "projects",
                by_name: "name",
                settings: "settings",
                policy: "policy",
                results: "scanResults",
                issues: "issues",
                errors: "errors",
                v2_listing: false,
                v2_results: false,
            },
            ProtocolVersion::V41 => Layout {
                projects: "projects",
                by_name: "name",
                settings: "scanSettings",
                policy: "policy",
                results: "scanResults",
                issues: "issues",
                errors: "errors",
                v2_listing: true,
                v2_results: true,
            },
        }
    }
}

struct Router<'a> {
    generation: ProtocolVersion,
    state: &'a mut State,
}

fn bad_request(reason: &str) -> ApiResponse {
    ApiResponse::new(400, Some(json!({ "error": reason })))
}

fn to_json<T: Serialize>(value: &T) -> ApiResponse {
    match serde_json::to_value(value) {
        Ok(body) => ApiResponse::ok(body),
        Err(e) => ApiResponse::new(500, Some(json!({ "error": e.to_string() }))),
    }
}

impl<'a> Router<'a> {
    fn route(mut self, request: &ApiRequest) -> ApiResponse {
        let segments: Vec<&str> = request
            .path
            .split('/')
            .filter(|s| !s.is_empty())
            .collect();
        let layout = Layout::of(self.generation);

        match (request.method, segments.as_slice()) {
            (Method::Get, ["api", "version"]) => to_json(&wire::VersionProbeResponse {
                version: self.state.reported_version.clone(),
            }),
            (Method::Get, ["api", "Configs", "pmPatterns"])
                if self.generation == ProtocolVersion::V36 =>
            {
                self.patterns()
            }
            (Method::Get, ["api", "configs", "patterns"])
                if self.generation != ProtocolVersion::V36 =>
            {
                self.patterns()
            }
            (Method::Get, ["api", "Versions", component, "current"])
                if self.generation == ProtocolVersion::V36 =>
            {
                self.component_version(component)
            }
            (Method::Get, ["api", "versions", "product", "current"])
                if self.generation != ProtocolVersion::V36 =>
            {
                match request.query_value("component") {
                    Some(component) => self.component_version(component),
                    None => bad_request("component is required"),
                }
            }
            (_, ["api", "v2", projects, rest @ ..]) if *projects == layout.projects => {
                self.projects(request, &layout, true, rest)
            }
            (_, ["api", projects, rest @ ..]) if *projects == layout.projects => {
                self.projects(request, &layout, false, rest)
            }
            _ => bad_request("no such route"),
        }
    }

    fn projects(
        &mut self,
        request: &ApiRequest,
        layout: &Layout,
        v2: bool,
        rest: &[&str],
    ) -> ApiResponse {
        match (request.method, rest) {
            (Method::Get, []) if v2 == layout.v2_listing => self.list(request),
            (Method::Post, []) if !v2 => self.create(request),
            (Method::Get, [by_name]) if !v2 && *by_name == layout.by_name => {
                match request.query_value("name") {
                    Some(name) => self.find_by_name(name),
                    None => bad_request("name is required"),
                }
            }
            (_, [id, tail @ ..]) => {
                let Ok(id) = ProjectId::parse(id) else {
                    return bad_request("malformed project id");
                };
                self.project_resource(request, layout, v2, id, tail)
            }
            _ => bad_request("no such route"),
        }
    }

    fn project_resource(
        &mut self,
        request: &ApiRequest,
        layout: &Layout,
        v2: bool,
        id: ProjectId,
        tail: &[&str],
    ) -> ApiResponse {
        match (request.method, tail) {
            (Method::Get, []) if !v2 => self.find_by_id(&id),
            (Method::Delete, []) if !v2 => self.delete(&id),
            (Method::Put, [settings]) if !v2 && *settings == layout.settings => {
                self.put_settings(request, &id)
            }
            (Method::Put, [policy]) if !v2 && *policy == layout.policy => {
                self.put_policy(request, &id)
            }
            (Method::Get, [results, rest @ ..])
                if v2 == layout.v2_results && *results == layout.results =>
            {
                match rest {
                    ["last"] => self.last_result(&id),
                    [] => self.list_results(&id),
                    [result] => self.result(&id, result, None, layout),
                    [result, part] => self.result(&id, result, Some(*part), layout),
                    _ => bad_request("no such route"),
                }
            }
            _ => bad_request("no such route"),
        }
    }

    fn patterns(&self) -> ApiResponse {
        let catalog = &self.state.catalog;
        match self.generation {
            ProtocolVersion::V36 => to_json(
                &catalog
                    .iter()
                    .map(|(key, mask)| v36::PmPattern {
                        key: key.clone(),
                        programming_languages: mask.map(|m| m as i64),
                    })
                    .collect::<Vec<_>>(),
            ),
            ProtocolVersion::V40 => to_json(
                &catalog
                    .iter()
                    .map(|(key, mask)| v40::PatternModel {
                        key: key.clone(),
                        language_mask: *mask,
                    })
                    .collect::<Vec<_>>(),
            ),
            ProtocolVersion::V41 => to_json(
                &catalog
                    .iter()
                    .map(|(key, mask)| v41::PatternModel {
                        key: key.clone(),
                        languages: *mask,
                    })
                    .collect::<Vec<_>>(),
            ),
        }
    }

    fn component_version(&self, component: &str) -> ApiResponse {
        match component {
            "AiServer" | "AiViewer" => ApiResponse::ok(Value::String(format!(
                "{} {}",
                component, self.state.reported_version
            ))),
            _ => ApiResponse::not_found(),
        }
    }

    fn list(&self, request: &ApiRequest) -> ApiResponse {
        let light = request.query_value("withoutDetails") == Some("true");
        let projects = &self.state.projects;
        match self.generation {
            ProtocolVersion::V36 => to_json(
                &projects
                    .iter()
                    .map(|p| v36::Project {
                        id: p.id,
                        name: p.name.clone(),
                        settings_id: if light { None } else { Some(p.settings_id) },
                        creation_date: if light { None } else { Some(p.created_at) },
                    })
                    .collect::<Vec<_>>(),
            ),
            ProtocolVersion::V40 => to_json(
                &projects
                    .iter()
                    .map(|p| v40::ProjectModel {
                        id: p.id,
                        name: p.name.clone(),
                    })
                    .collect::<Vec<_>>(),
            ),
            ProtocolVersion::V41 if light => to_json(
                &projects
                    .iter()
                    .map(|p| v41::ProjectLightModel {
                        id: p.id,
                        name: p.name.clone(),
                    })
                    .collect::<Vec<_>>(),
            ),
            ProtocolVersion::V41 => to_json(
                &projects
                    .iter()
                    .map(|p| v41::ProjectModel {
                        id: p.id,
                        name: p.name.clone(),
                        creation_date: Some(p.created_at),
                    })
                    .collect::<Vec<_>>(),
            ),
        }
    }

    fn project_body(&self, project: &FakeProject, light: bool) -> ApiResponse {
        match self.generation {
            ProtocolVersion::V36 if light => to_json(&v36::ProjectLight {
                id: project.id,
                name: project.name.clone(),
                settings_id: Some(project.settings_id),
            }),
            ProtocolVersion::V36 => to_json(&v36::Project {
                id: project.id,
                name: project.name.clone(),
                settings_id: Some(project.settings_id),
                creation_date: Some(project.created_at),
            }),
            ProtocolVersion::V40 => to_json(&v40::ProjectModel {
                id: project.id,
                name: project.name.clone(),
            }),
            ProtocolVersion::V41 => to_json(&v41::ProjectModel {
                id: project.id,
                name: project.name.clone(),
                creation_date: Some(project.created_at),
            }),
        }
    }

    fn find_by_name(&self, name: &str) -> ApiResponse {
        match self.state.projects.iter().find(|p| p.name == name) {
            Some(project) => self.project_body(project, true),
            // 3.6 answers a missing name with an empty body, later servers with 404
            None if self.generation == ProtocolVersion::V36 => ApiResponse::no_content(),
            None => ApiResponse::not_found(),
        }
    }

    fn find_by_id(&self, id: &ProjectId) -> ApiResponse {
        match self.state.project_index(id) {
            Some(index) => self.project_body(&self.state.projects[index], false),
            None => ApiResponse::not_found(),
        }
    }

    fn decode_settings(&self, body: Value) -> Result<(Option<SettingsId>, FakeSettings), String> {
        match self.generation {
            ProtocolVersion::V36 => {
                let s: v36::V36ScanSettings =
                    serde_json::from_value(body).map_err(|e| e.to_string())?;
                Ok((
                    s.id,
                    FakeSettings {
                        languages: vec![s.programming_language],
                        enabled: s.enabled_patterns,
                        disabled: s.disabled_patterns,
                        incremental: s.use_incremental_scan,
                    },
                ))
            }
            ProtocolVersion::V40 => {
                let s: v40::ProjectSettingsModel =
                    serde_json::from_value(body).map_err(|e| e.to_string())?;
                Ok((
                    None,
                    FakeSettings {
                        languages: s.languages,
                        enabled: s.patterns.enabled,
                        disabled: s.patterns.disabled,
                        incremental: s.incremental,
                    },
                ))
            }
            ProtocolVersion::V41 => {
                let s: v41::ScanSettingsModel =
                    serde_json::from_value(body).map_err(|e| e.to_string())?;
                Ok((
                    None,
                    FakeSettings {
                        languages: s.programming_languages,
                        enabled: s.enabled_patterns,
                        disabled: s.disabled_patterns,
                        incremental: s.use_incremental_scan,
                    },
                ))
            }
        }
    }

    fn create(&mut self, request: &ApiRequest) -> ApiResponse {
        let Some(body) = request.body.clone() else {
            return bad_request("body is required");
        };
        let parsed = match self.generation {
            ProtocolVersion::V36 => serde_json::from_value::<v36::CreateProjectModel>(body)
                .map_err(|e| e.to_string())
                .and_then(|m| {
                    let settings = serde_json::to_value(&m.scan_settings).map_err(|e| e.to_string())?;
                    Ok((m.name, settings))
                }),
            ProtocolVersion::V40 => serde_json::from_value::<v40::CreateProjectModel>(body)
                .map_err(|e| e.to_string())
                .and_then(|m| {
                    let settings = serde_json::to_value(&m.settings).map_err(|e| e.to_string())?;
                    Ok((m.name, settings))
                }),
            ProtocolVersion::V41 => serde_json::from_value::<v41::CreateProjectModel>(body)
                .map_err(|e| e.to_string())
                .and_then(|m| {
                    let settings = serde_json::to_value(&m.scan_settings).map_err(|e| e.to_string())?;
                    Ok((m.name, settings))
                }),
        };
        let (name, settings) = match parsed.and_then(|(name, s)| {
            self.decode_settings(s).map(|(_, settings)| (name, settings))
        }) {
            Ok(parsed) => parsed,
            Err(reason) => return bad_request(&reason),
        };
        if self.state.projects.iter().any(|p| p.name == name) {
            return ApiResponse::new(409, Some(json!({ "error": "project name is taken" })));
        }
        let created_at = self.state.tick();
        let project = FakeProject {
            id: ProjectId::new(),
            name,
            settings_id: SettingsId::new(),
            settings,
            policy: None,
            created_at,
        };
        let response = self.project_body(&project, false);
        self.state.projects.push(project);
        response
    }

    fn put_settings(&mut self, request: &ApiRequest, id: &ProjectId) -> ApiResponse {
        let Some(index) = self.state.project_index(id) else {
            return ApiResponse::not_found();
        };
        let Some(body) = request.body.clone() else {
            return bad_request("body is required");
        };
        let (settings_id, settings) = match self.decode_settings(body) {
            Ok(decoded) => decoded,
            Err(reason) => return bad_request(&reason),
        };
        let project = &mut self.state.projects[index];
        if self.generation == ProtocolVersion::V36 && settings_id != Some(project.settings_id) {
            return bad_request("scan settings id does not match the project");
        }
        project.settings = settings;
        ApiResponse::no_content()
    }

    fn put_policy(&mut self, request: &ApiRequest, id: &ProjectId) -> ApiResponse {
        let Some(index) = self.state.project_index(id) else {
            return ApiResponse::not_found();
        };
        let rules = match (self.generation, &request.body) {
            (ProtocolVersion::V36, Some(Value::String(rules))) => rules.clone(),
            (_, Some(Value::Object(body))) if self.generation != ProtocolVersion::V36 => {
                match body.get("rules") {
                    Some(Value::String(rules)) => rules.clone(),
                    _ => return bad_request("rules must be a string"),
                }
            }
            _ => return bad_request("unexpected policy body"),
        };
        self.state.projects[index].policy = if rules.is_empty() { None } else { Some(rules) };
        ApiResponse::no_content()
    }

    fn delete(&mut self, id: &ProjectId) -> ApiResponse {
        match self.state.project_index(id) {
            Some(index) => {
                self.state.projects.remove(index);
                self.state.results.remove(id);
                ApiResponse::no_content()
            }
            None => ApiResponse::not_found(),
        }
    }

    fn last_result(&self, id: &ProjectId) -> ApiResponse {
        if self.state.project_index(id).is_none() {
            return ApiResponse::not_found();
        }
        let last = self
            .state
            .results
            .get(id)
            .and_then(|results| results.iter().max_by_key(|r| r.created_at));
        match last {
            Some(result) => self.result_body(id, result),
            None => ApiResponse::no_content(),
        }
    }

    fn list_results(&mut self, id: &ProjectId) -> ApiResponse {
        if self.state.project_index(id).is_none() {
            return ApiResponse::not_found();
        }
        let results = self.state.results.entry(*id).or_default();
        for result in results.iter_mut() {
            if let Some(left) = result.completes_after {
                if left == 0 {
                    result.stage = FakeStage::Done;
                    result.completes_after = None;
                } else {
                    result.completes_after = Some(left - 1);
                }
            }
        }
        let snapshot = results.clone();
        let bodies: Vec<Value> = snapshot
            .iter()
            .filter_map(|r| self.result_body(id, r).body)
            .collect();
        ApiResponse::ok(Value::Array(bodies))
    }

    fn result(
        &self,
        id: &ProjectId,
        result: &str,
        part: Option<&str>,
        layout: &Layout,
    ) -> ApiResponse {
        let Ok(result_id) = ScanResultId::parse(result) else {
            return bad_request("malformed scan result id");
        };
        let found = self
            .state
            .results
            .get(id)
            .and_then(|results| results.iter().find(|r| r.id == result_id));
        let Some(found) = found else {
            return ApiResponse::not_found();
        };
        match part {
            None => self.result_body(id, found),
            Some(part) if part == layout.issues => self.issues_body(found),
            Some(part) if part == layout.errors => self.errors_body(found),
            Some(_) => bad_request("no such route"),
        }
    }

    fn result_body(&self, project: &ProjectId, result: &FakeScanResult) -> ApiResponse {
        match self.generation {
            ProtocolVersion::V36 => to_json(&v36::ScanResult {
                id: result.id,
                project_id: *project,
                scan_date: result.created_at,
                progress: Some(v36::ScanProgress {
                    stage: match result.stage {
                        FakeStage::Enqueued => v36::Stage::Enqueued,
                        FakeStage::Scan => v36::Stage::Scan,
                        FakeStage::Done => v36::Stage::Done,
                        FakeStage::Failed => v36::Stage::Failed,
                        FakeStage::Aborted => v36::Stage::Aborted,
                    },
                }),
                policy_state: Some(match result.policy {
                    FakePolicy::None => v36::PolicyState::None,
                    FakePolicy::Confirmed => v36::PolicyState::Confirmed,
                    FakePolicy::Rejected => v36::PolicyState::Rejected,
                }),
            }),
            ProtocolVersion::V40 => to_json(&v40::ScanResultModel {
                id: result.id,
                project_id: *project,
                created_at: result.created_at,
                status: Some(v40::ScanStatusModel {
                    stage: match result.stage {
                        FakeStage::Enqueued => v40::Stage::Enqueued,
                        FakeStage::Scan => v40::Stage::Scan,
                        FakeStage::Done => v40::Stage::Done,
                        FakeStage::Failed => v40::Stage::Failed,
                        FakeStage::Aborted => v40::Stage::Aborted,
                    },
                }),
                policy_state: Some(match result.policy {
                    FakePolicy::None => v40::PolicyState::None,
                    FakePolicy::Confirmed => v40::PolicyState::Confirmed,
                    FakePolicy::Rejected => v40::PolicyState::Rejected,
                }),
            }),
            ProtocolVersion::V41 => to_json(&v41::ScanResultModel {
                id: result.id,
                project_id: *project,
                scan_date: result.created_at,
                stage: match result.stage {
                    FakeStage::Enqueued => v41::Stage::Enqueued,
                    FakeStage::Scan => v41::Stage::Scan,
                    FakeStage::Done => v41::Stage::Done,
                    FakeStage::Failed => v41::Stage::Failed,
                    FakeStage::Aborted => v41::Stage::Aborted,
                },
                policy_state: Some(match result.policy {
                    FakePolicy::None => v41::PolicyState::None,
                    FakePolicy::Confirmed => v41::PolicyState::Confirmed,
                    FakePolicy::Rejected => v41::PolicyState::Rejected,
                }),
            }),
        }
    }

    fn issues_body(&self, result: &FakeScanResult) -> ApiResponse {
        let issues = result.issues.iter();
        match self.generation {
            ProtocolVersion::V36 => to_json(
                &issues
                    .map(|(id, issue_type, level)| v36::ScanIssue {
                        id: id.clone(),
                        issue_type: issue_type.clone(),
                        level: level.clone(),
                    })
                    .collect::<Vec<_>>(),
            ),
            ProtocolVersion::V40 => to_json(
                &issues
                    .map(|(id, issue_type, level)| v40::IssueModel {
                        id: id.clone(),
                        issue_type: issue_type.clone(),
                        level: level.clone(),
                    })
                    .collect::<Vec<_>>(),
            ),
            ProtocolVersion::V41 => to_json(
                &issues
                    .map(|(id, issue_type, level)| v41::IssueModel {
                        id: id.clone(),
                        issue_type: issue_type.clone(),
                        level: level.clone(),
                    })
                    .collect::<Vec<_>>(),
            ),
        }
    }

    fn errors_body(&self, result: &FakeScanResult) -> ApiResponse {
        let errors = result.errors.iter();
        match self.generation {
            ProtocolVersion::V36 => to_json(
                &errors
                    .map(|(message, critical)| v36::ScanError {
                        message: message.clone(),
                        is_critical: *critical,
                    })
                    .collect::<Vec<_>>(),
            ),
            ProtocolVersion::V40 => to_json(
                &errors
                    .map(|(message, critical)| v40::ScanErrorModel {
                        message: message.clone(),
                        critical: *critical,
                    })
                    .collect::<Vec<_>>(),
            ),
            ProtocolVersion::V41 => to_json(
                &errors
                    .map(|(message, critical)| v41::ScanErrorModel {
                        message: message.clone(),
                        is_critical: *critical,
                    })
                    .collect::<Vec<_>>(),
            ),
        }
    }
}
