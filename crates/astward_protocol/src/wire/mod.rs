//! Per-generation wire schemas.
//!
//! Each module owns the resource paths and JSON shapes of one server
//! generation. Generations share no types.

pub mod v36;
pub mod v40;
pub mod v41;

use serde::{Deserialize, Serialize};

/// Body of the generation-neutral version probe.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VersionProbeResponse {
    pub version: String,
}
