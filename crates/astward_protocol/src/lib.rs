//! Analysis Server Protocol
//!
//! Wire-level vocabulary shared by the Astward client and its transports.
//!
//! # Generations
//!
//! The analysis server has shipped three mutually incompatible REST schemas:
//!
//! ```text
//! 3.6  /api/Projects/...      PascalCase enums, settings carry their own id
//! 4.0  /api/projects/...      snake_case enums, settings as a sub-resource
//! 4.1  /api/v2/projects/...   SCREAMING_SNAKE_CASE enums, top-level stage
//! ```
//!
//! Every generation answers [`defaults::VERSION_PROBE_PATH`], which is how a
//! client discovers which schema to speak.

pub mod defaults;
pub mod error;
pub mod transport;
pub mod wire;

pub use error::{ProtocolError, Result};
pub use transport::{ApiRequest, ApiResponse, Method, Transport, TransportError};
pub use wire::VersionProbeResponse;

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// One server wire-protocol generation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ProtocolVersion {
    V36,
    V40,
    V41,
}

impl ProtocolVersion {
    pub const ALL: [ProtocolVersion; 3] =
        [ProtocolVersion::V36, ProtocolVersion::V40, ProtocolVersion::V41];

    pub fn as_str(&self) -> &'static str {
        match self {
            ProtocolVersion::V36 => "v3.6",
            ProtocolVersion::V40 => "v4.0",
            ProtocolVersion::V41 => "v4.1",
        }
    }

    /// Map a full product version ("4.1.2.34567") to the generation that
    /// speaks it. Only major and minor are significant.
    pub fn from_server_version(version: &str) -> Option<Self> {
        let mut parts = version.trim().trim_start_matches(['v', 'V']).split('.');
        let major: u32 = parts.next()?.trim().parse().ok()?;
        let minor: u32 = parts.next()?.trim().parse().ok()?;
        match (major, minor) {
            (3, 6) => Some(ProtocolVersion::V36),
            (4, 0) => Some(ProtocolVersion::V40),
            (4, 1) => Some(ProtocolVersion::V41),
            _ => None,
        }
    }
}

impl fmt::Display for ProtocolVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for ProtocolVersion {
    type Err = ProtocolError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "v3.6" | "3.6" | "v36" => Ok(ProtocolVersion::V36),
            "v4.0" | "4.0" | "v40" => Ok(ProtocolVersion::V40),
            "v4.1" | "4.1" | "v41" => Ok(ProtocolVersion::V41),
            _ => Err(ProtocolError::InvalidVersion(s.to_string())),
        }
    }
}

/// Server components that report their own version.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Component {
    AiServer,
    AiViewer,
}

impl Component {
    pub const ALL: [Component; 2] = [Component::AiServer, Component::AiViewer];

    pub fn as_str(&self) -> &'static str {
        match self {
            Component::AiServer => "AiServer",
            Component::AiViewer => "AiViewer",
        }
    }
}

impl fmt::Display for Component {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
