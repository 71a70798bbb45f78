//! Connection parameters and process-wide advanced settings.
//!
//! [`AdvancedSettings`] is built once at process start and shared read-only
//! through `Arc` by every job. There is no global instance.

use std::collections::BTreeMap;
use std::fmt;
use std::time::Duration;

use astward_protocol::defaults;
use serde::{Deserialize, Serialize};
use tracing::{trace, warn};
use url::Url;

use crate::error::{JobError, Result};

/// Prefix used when overrides come from a shared host-level source.
pub const SYSTEM_PREFIX: &str = "astward.";

/// Every known advanced setting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum SettingInfo {
    LoggingHttpResponseMaxBodySize,
    LoggingHttpRequestMaxBodySize,
    HttpRequestReadTimeout,
    HttpRequestWriteTimeout,
}

impl SettingInfo {
    pub const ALL: [SettingInfo; 4] = [
        SettingInfo::LoggingHttpResponseMaxBodySize,
        SettingInfo::LoggingHttpRequestMaxBodySize,
        SettingInfo::HttpRequestReadTimeout,
        SettingInfo::HttpRequestWriteTimeout,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            SettingInfo::LoggingHttpResponseMaxBodySize => "logging.http.response.max.body.size",
            SettingInfo::LoggingHttpRequestMaxBodySize => "logging.http.request.max.body.size",
            SettingInfo::HttpRequestReadTimeout => "http.request.read.timeout",
            SettingInfo::HttpRequestWriteTimeout => "http.request.write.timeout",
        }
    }

    pub fn default_value(&self) -> u64 {
        match self {
            SettingInfo::LoggingHttpResponseMaxBodySize => 102_400,
            SettingInfo::LoggingHttpRequestMaxBodySize => 51_200,
            SettingInfo::HttpRequestReadTimeout => 3600,
            SettingInfo::HttpRequestWriteTimeout => 3600,
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            SettingInfo::LoggingHttpResponseMaxBodySize => {
                "Maximum response body size to be output to log"
            }
            SettingInfo::LoggingHttpRequestMaxBodySize => {
                "Maximum request body size to be output to log"
            }
            SettingInfo::HttpRequestReadTimeout => "HTTP request read timeout in seconds",
            SettingInfo::HttpRequestWriteTimeout => "HTTP request write timeout in seconds",
        }
    }

    fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|info| info.name() == name)
    }
}

/// Timeouts and log body-size caps.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AdvancedSettings {
    values: BTreeMap<SettingInfo, u64>,
}

impl Default for AdvancedSettings {
    fn default() -> Self {
        Self {
            values: SettingInfo::ALL
                .into_iter()
                .map(|info| (info, info.default_value()))
                .collect(),
        }
    }
}

impl AdvancedSettings {
    /// Apply `key=value` overrides. Unknown keys are ignored and values that
    /// are not unsigned integers are skipped with a warning.
    pub fn with_overrides(self, text: &str) -> Self {
        self.apply(text, None)
    }

    /// Same as [`with_overrides`](Self::with_overrides) but only keys carrying
    /// `prefix` are considered, with the prefix stripped.
    pub fn with_prefixed_overrides(self, text: &str, prefix: &str) -> Self {
        self.apply(text, Some(prefix))
    }

    fn apply(mut self, text: &str, prefix: Option<&str>) -> Self {
        for (key, value) in parse_properties(text) {
            let name = match prefix {
                Some(prefix) => match key.strip_prefix(prefix) {
                    Some(name) => name,
                    None => continue,
                },
                None => key.as_str(),
            };
            let Some(info) = SettingInfo::from_name(name) else {
                continue;
            };
            match value.parse::<u64>() {
                Ok(parsed) => {
                    trace!("Set {} = {}", info.name(), parsed);
                    self.values.insert(info, parsed);
                }
                Err(_) => {
                    warn!(
                        "Skip {} = {} as string to number conversion failed",
                        info.name(),
                        value
                    );
                }
            }
        }
        self
    }

    pub fn get(&self, info: SettingInfo) -> u64 {
        self.values
            .get(&info)
            .copied()
            .unwrap_or_else(|| info.default_value())
    }

    pub fn response_log_limit(&self) -> usize {
        self.get(SettingInfo::LoggingHttpResponseMaxBodySize) as usize
    }

    pub fn request_log_limit(&self) -> usize {
        self.get(SettingInfo::LoggingHttpRequestMaxBodySize) as usize
    }

    pub fn read_timeout(&self) -> Duration {
        Duration::from_secs(self.get(SettingInfo::HttpRequestReadTimeout))
    }

    pub fn write_timeout(&self) -> Duration {
        Duration::from_secs(self.get(SettingInfo::HttpRequestWriteTimeout))
    }
}

impl fmt::Display for AdvancedSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (idx, info) in SettingInfo::ALL.iter().enumerate() {
            if idx > 0 {
                writeln!(f)?;
            }
            writeln!(f, "# {}", info.description())?;
            write!(f, "{} = {}", info.name(), self.get(*info))?;
        }
        Ok(())
    }
}

/// Properties-style `key=value` / `key: value` lines. `#` and `!` start a
/// comment line. A line without separator is a key with an empty value.
fn parse_properties(text: &str) -> Vec<(String, String)> {
    text.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#') && !line.starts_with('!'))
        .map(|line| match line.find(['=', ':']) {
            Some(pos) => (
                line[..pos].trim().to_string(),
                line[pos + 1..].trim().to_string(),
            ),
            None => (line.to_string(), String::new()),
        })
        .collect()
}

/// How the job authenticates. Token credentials get the reduced-detail
/// project listing.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Credentials {
    Token { token: String },
    Password { user: String, password: String },
}

impl Credentials {
    pub fn is_token(&self) -> bool {
        matches!(self, Credentials::Token { .. })
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Credentials::Token { .. } => f.debug_struct("Token").field("token", &"***").finish(),
            Credentials::Password { user, .. } => f
                .debug_struct("Password")
                .field("user", user)
                .field("password", &"***")
                .finish(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConnectionSettings {
    pub url: String,
    pub credentials: Credentials,
    pub insecure: bool,
    /// PEM bundle of trusted CA certificates.
    #[serde(default)]
    pub ca_certificates: Option<String>,
}

impl Default for ConnectionSettings {
    fn default() -> Self {
        Self {
            url: defaults::DEFAULT_SERVER_URL.to_string(),
            credentials: Credentials::Token {
                token: String::new(),
            },
            insecure: defaults::DEFAULT_INSECURE,
            ca_certificates: None,
        }
    }
}

impl ConnectionSettings {
    pub fn validate(&self) -> Result<()> {
        if self.url.trim().is_empty() {
            return Err(JobError::validation("Server URL must not be empty"));
        }
        let url = Url::parse(self.url.trim()).map_err(|e| {
            JobError::with_source(
                crate::error::ErrorKind::Validation,
                format!("Invalid server URL {}", self.url),
                e,
            )
        })?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(JobError::validation(format!(
                "Unsupported server URL scheme '{}'",
                url.scheme()
            )));
        }
        match &self.credentials {
            Credentials::Token { token } if token.trim().is_empty() => {
                Err(JobError::validation("API token must not be empty"))
            }
            Credentials::Password { user, .. } if user.trim().is_empty() => {
                Err(JobError::validation("User name must not be empty"))
            }
            _ => Ok(()),
        }
    }
}
