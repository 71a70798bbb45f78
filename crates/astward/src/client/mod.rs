//! Versioned protocol clients.
//!
//! [`ProtocolClient`] is the one capability surface the rest of the crate
//! uses. Each server generation has its own implementation; a job holds
//! exactly one of them, wrapped in the closed [`VersionedClient`] enum chosen
//! by [`factory::connect`].

pub mod factory;
pub mod v36;
pub mod v40;
pub mod v41;

use std::sync::Arc;

use astward_ids::{ProjectId, ScanResultId};
use astward_protocol::{ApiRequest, ApiResponse, ProtocolVersion, Transport, TransportError};
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{trace, Level};

use crate::cancel::CancellationToken;
use crate::domain::{PmPattern, Project, ScanResult, ScanResultBrief, ScanSettings, ServerVersion};
use crate::error::{ErrorKind, JobError, Result};
use crate::settings::{AdvancedSettings, ConnectionSettings};

pub use factory::{connect, TransportConnector, VersionSelection};
pub use v36::V36Client;
pub use v40::V40Client;
pub use v41::V41Client;

/// Capabilities every server generation provides.
///
/// Lookups return `Ok(None)` when the entity does not exist. Every other
/// failure is a [`JobError`]; nothing here retries.
pub trait ProtocolClient: Send + Sync {
    fn version(&self) -> ProtocolVersion;

    fn connection(&self) -> &ConnectionSettings;

    fn find_project_by_name(&self, name: &str) -> Result<Option<Project>>;

    fn find_project_by_id(&self, id: &ProjectId) -> Result<Option<Project>>;

    fn create_project(&self, name: &str, settings: &ScanSettings) -> Result<Project>;

    /// Replace the project's scan settings wholesale.
    fn update_scan_settings(&self, project: &Project, settings: &ScanSettings) -> Result<()>;

    /// Assign serialized policy rules. `None` clears them.
    fn assign_policy(&self, id: &ProjectId, policy: Option<&str>) -> Result<()>;

    fn delete_project(&self, id: &ProjectId) -> Result<()>;

    /// `(id, name)` pairs in server order.
    fn list_projects(&self) -> Result<Vec<(ProjectId, String)>>;

    fn pattern_catalog(&self) -> Result<Vec<PmPattern>>;

    fn latest_scan_result(&self, id: &ProjectId) -> Result<Option<ScanResultBrief>>;

    fn scan_results(&self, id: &ProjectId) -> Result<Vec<ScanResultBrief>>;

    fn scan_result(&self, id: &ProjectId, result: &ScanResultId) -> Result<ScanResult>;

    fn version_info(&self) -> Result<ServerVersion>;
}

/// The client bound to a job, one variant per server generation.
pub enum VersionedClient {
    V36(V36Client),
    V40(V40Client),
    V41(V41Client),
}

macro_rules! dispatch {
    ($self:ident, $client:ident => $call:expr) => {
        match $self {
            VersionedClient::V36($client) => $call,
            VersionedClient::V40($client) => $call,
            VersionedClient::V41($client) => $call,
        }
    };
}

impl VersionedClient {
    pub fn new(version: ProtocolVersion, core: ClientCore) -> Self {
        match version {
            ProtocolVersion::V36 => VersionedClient::V36(V36Client::new(core)),
            ProtocolVersion::V40 => VersionedClient::V40(V40Client::new(core)),
            ProtocolVersion::V41 => VersionedClient::V41(V41Client::new(core)),
        }
    }
}

impl ProtocolClient for VersionedClient {
    fn version(&self) -> ProtocolVersion {
        dispatch!(self, c => c.version())
    }

    fn connection(&self) -> &ConnectionSettings {
        dispatch!(self, c => c.connection())
    }

    fn find_project_by_name(&self, name: &str) -> Result<Option<Project>> {
        dispatch!(self, c => c.find_project_by_name(name))
    }

    fn find_project_by_id(&self, id: &ProjectId) -> Result<Option<Project>> {
        dispatch!(self, c => c.find_project_by_id(id))
    }

    fn create_project(&self, name: &str, settings: &ScanSettings) -> Result<Project> {
        dispatch!(self, c => c.create_project(name, settings))
    }

    fn update_scan_settings(&self, project: &Project, settings: &ScanSettings) -> Result<()> {
        dispatch!(self, c => c.update_scan_settings(project, settings))
    }

    fn assign_policy(&self, id: &ProjectId, policy: Option<&str>) -> Result<()> {
        dispatch!(self, c => c.assign_policy(id, policy))
    }

    fn delete_project(&self, id: &ProjectId) -> Result<()> {
        dispatch!(self, c => c.delete_project(id))
    }

    fn list_projects(&self) -> Result<Vec<(ProjectId, String)>> {
        dispatch!(self, c => c.list_projects())
    }

    fn pattern_catalog(&self) -> Result<Vec<PmPattern>> {
        dispatch!(self, c => c.pattern_catalog())
    }

    fn latest_scan_result(&self, id: &ProjectId) -> Result<Option<ScanResultBrief>> {
        dispatch!(self, c => c.latest_scan_result(id))
    }

    fn scan_results(&self, id: &ProjectId) -> Result<Vec<ScanResultBrief>> {
        dispatch!(self, c => c.scan_results(id))
    }

    fn scan_result(&self, id: &ProjectId, result: &ScanResultId) -> Result<ScanResult> {
        dispatch!(self, c => c.scan_result(id, result))
    }

    fn version_info(&self) -> Result<ServerVersion> {
        dispatch!(self, c => c.version_info())
    }
}

/// Session state shared by every generation's client: the transport, the
/// job's connection parameters, its settings and its cancellation token.
pub struct ClientCore {
    transport: Arc<dyn Transport>,
    connection: ConnectionSettings,
    settings: Arc<AdvancedSettings>,
    cancel: CancellationToken,
}

impl ClientCore {
    pub fn new(
        transport: Arc<dyn Transport>,
        connection: ConnectionSettings,
        settings: Arc<AdvancedSettings>,
        cancel: CancellationToken,
    ) -> Self {
        Self {
            transport,
            connection,
            settings,
            cancel,
        }
    }

    pub fn connection(&self) -> &ConnectionSettings {
        &self.connection
    }

    /// One remote call. Failures keep `message` and chain the cause.
    pub fn call(&self, request: ApiRequest, message: &'static str) -> Result<ApiResponse> {
        self.cancel.check()?;
        let tracing_bodies = tracing::enabled!(Level::TRACE);

        match &request.body {
            Some(body) if tracing_bodies => {
                let body = body.to_string();
                trace!(
                    "Request {} body: {}",
                    request,
                    truncate(&body, self.settings.request_log_limit())
                );
            }
            _ => trace!("Request {}", request),
        }

        let response = self
            .transport
            .execute(&request)
            .map_err(|e| classify_transport_error(message, e))?;

        match &response.body {
            Some(body) if tracing_bodies => {
                let body = body.to_string();
                trace!(
                    "Response {} status {} body: {}",
                    request,
                    response.status,
                    truncate(&body, self.settings.response_log_limit())
                );
            }
            _ => trace!("Response {} status {}", request, response.status),
        }
        Ok(response)
    }

    /// Call and decode a required JSON body.
    pub fn fetch<T: DeserializeOwned>(&self, request: ApiRequest, message: &'static str) -> Result<T> {
        self.call(request, message)?
            .json()
            .map_err(|e| JobError::transport(message, e))
    }

    /// Call and decode a body that may legitimately be absent.
    pub fn fetch_opt<T: DeserializeOwned>(
        &self,
        request: ApiRequest,
        message: &'static str,
    ) -> Result<Option<T>> {
        self.call(request, message)?
            .json_opt()
            .map_err(|e| JobError::transport(message, e))
    }

    /// Call where only success matters.
    pub fn send(&self, request: ApiRequest, message: &'static str) -> Result<()> {
        self.call(request, message)?
            .require_success()
            .map(|_| ())
            .map_err(|e| JobError::transport(message, e))
    }
}

/// Attach a JSON body, failing with `message` if it cannot be encoded.
pub(crate) fn with_body<T: Serialize>(
    request: ApiRequest,
    body: &T,
    message: &'static str,
) -> Result<ApiRequest> {
    request
        .with_json(body)
        .map_err(|e| JobError::with_source(ErrorKind::Unknown, message, e))
}

fn classify_transport_error(message: &'static str, err: TransportError) -> JobError {
    match err {
        TransportError::Interrupted => JobError::with_source(ErrorKind::Interrupted, message, err),
        other => JobError::transport(message, other),
    }
}

fn truncate(text: &str, limit: usize) -> &str {
    if text.len() <= limit {
        return text;
    }
    let mut end = limit;
    while !text.is_char_boundary(end) {
        end -= 1;
    }
    &text[..end]
}
