//! Canonical default values shared by the client and its collaborators.

pub const DEFAULT_SERVER_URL: &str = "https://ast.domain.org:443";
pub const DEFAULT_INSECURE: bool = true;
pub const CANCELLED_BY_USER_MESSAGE: &str = "Cancelled by user";

/// Generation-neutral endpoint every supported server answers.
pub const VERSION_PROBE_PATH: &str = "/api/version";
