//! Connection-time selection of the versioned client.

use std::sync::Arc;

use astward_protocol::defaults::VERSION_PROBE_PATH;
use astward_protocol::{
    ApiRequest, ProtocolError, ProtocolVersion, Transport, TransportError, VersionProbeResponse,
};
use tracing::{debug, info};

use super::{ClientCore, VersionedClient};
use crate::cancel::CancellationToken;
use crate::error::{ErrorKind, JobError, Result};
use crate::settings::{AdvancedSettings, ConnectionSettings};

/// How the server generation is chosen.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum VersionSelection {
    /// Trust the caller; no probe call is made.
    Pinned(ProtocolVersion),
    /// Ask the server once.
    #[default]
    Probe,
}

/// Opens the network session for one job. TLS, authentication and timeouts
/// live behind this seam.
pub trait TransportConnector: Send + Sync {
    fn connect(
        &self,
        connection: &ConnectionSettings,
        settings: &AdvancedSettings,
    ) -> std::result::Result<Arc<dyn Transport>, TransportError>;
}

/// Establish the session and bind it to one protocol generation for the
/// lifetime of the job. Exactly one connection attempt is made.
pub fn connect(
    connector: &dyn TransportConnector,
    connection: &ConnectionSettings,
    settings: Arc<AdvancedSettings>,
    selection: VersionSelection,
    cancel: CancellationToken,
) -> Result<VersionedClient> {
    cancel.check()?;
    debug!("Connecting to {}", connection.url);
    let transport = connector
        .connect(connection, &settings)
        .map_err(|e| match e {
            TransportError::Interrupted => {
                JobError::with_source(ErrorKind::Interrupted, "Server connection interrupted", e)
            }
            other => JobError::transport("Server connection failed", other),
        })?;

    let core = ClientCore::new(transport, connection.clone(), settings, cancel);
    let version = match selection {
        VersionSelection::Pinned(version) => version,
        VersionSelection::Probe => probe(&core)?,
    };
    info!("Using {} protocol client for {}", version, connection.url);
    Ok(VersionedClient::new(version, core))
}

fn probe(core: &ClientCore) -> Result<ProtocolVersion> {
    let response: VersionProbeResponse =
        core.fetch(ApiRequest::get(VERSION_PROBE_PATH), "Server version probe failed")?;
    debug!("Server reports version {}", response.version);
    ProtocolVersion::from_server_version(&response.version).ok_or_else(|| {
        JobError::with_source(
            ErrorKind::Validation,
            "Server version is not supported",
            ProtocolError::UnsupportedServerVersion(response.version),
        )
    })
}
