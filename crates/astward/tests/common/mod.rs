//! Shared fixtures for the astward integration tests.

#![allow(dead_code)]

use std::sync::Arc;

use astward::settings::{AdvancedSettings, ConnectionSettings, Credentials};
use astward::{connect, CancellationToken, TransportConnector, VersionSelection, VersionedClient};
use astward_protocol::{ProtocolVersion, Transport, TransportError};
use astward_test_utils::FakeServer;

pub const GENERATIONS: [ProtocolVersion; 3] = ProtocolVersion::ALL;

/// Hands out the fake server as the transport, or refuses like a dead host.
pub struct FakeConnector {
    server: FakeServer,
    reachable: bool,
}

impl FakeConnector {
    pub fn new(server: &FakeServer) -> Self {
        Self {
            server: server.clone(),
            reachable: true,
        }
    }

    pub fn unreachable(server: &FakeServer) -> Self {
        Self {
            server: server.clone(),
            reachable: false,
        }
    }
}

impl TransportConnector for FakeConnector {
    fn connect(
        &self,
        connection: &ConnectionSettings,
        _settings: &AdvancedSettings,
    ) -> Result<Arc<dyn Transport>, TransportError> {
        if !self.reachable {
            return Err(TransportError::Connect {
                endpoint: connection.url.clone(),
                message: "connection refused".to_string(),
            });
        }
        Ok(Arc::new(self.server.clone()))
    }
}

pub fn token_connection() -> ConnectionSettings {
    ConnectionSettings {
        url: "https://ast.example.test".to_string(),
        credentials: Credentials::Token {
            token: "secret-token".to_string(),
        },
        insecure: false,
        ca_certificates: None,
    }
}

pub fn password_connection() -> ConnectionSettings {
    ConnectionSettings {
        credentials: Credentials::Password {
            user: "admin".to_string(),
            password: "P@ssw0rd".to_string(),
        },
        ..token_connection()
    }
}

/// Client pinned to the server's generation, authenticated with a token.
pub fn client(server: &FakeServer) -> VersionedClient {
    client_with(server, token_connection(), CancellationToken::new())
}

pub fn client_with(
    server: &FakeServer,
    connection: ConnectionSettings,
    cancel: CancellationToken,
) -> VersionedClient {
    connect(
        &FakeConnector::new(server),
        &connection,
        Arc::new(AdvancedSettings::default()),
        VersionSelection::Pinned(server.generation()),
        cancel,
    )
    .expect("pinned connect to fake server")
}
