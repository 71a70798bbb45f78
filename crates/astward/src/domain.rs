//! Version-agnostic domain model.
//!
//! Every versioned client converts its wire schema into these types, so
//! nothing above the client layer knows which server generation it talks to.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use astward_ids::{ProjectId, ScanResultId, SettingsId};
use astward_protocol::Component;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Low-level pattern-language bits used in pattern catalog masks.
pub mod pattern_language {
    pub const NONE: u64 = 0;
    pub const DOTNET: u64 = 0x0000_0001;
    pub const PHP: u64 = 0x0000_0002;
    pub const JAVA: u64 = 0x0000_0004;
    pub const HTML: u64 = 0x0000_0008;
    pub const JAVASCRIPT: u64 = 0x0000_0010;
    pub const SANDBOX: u64 = 0x0000_0040;
    pub const BINARY: u64 = 0x0000_0080;
    pub const PLSQL: u64 = 0x0000_0100;
    pub const TSQL: u64 = 0x0000_0200;
    pub const ASPX: u64 = 0x0000_0400;
    pub const C: u64 = 0x0000_0800;
    pub const CPLUSPLUS: u64 = 0x0000_1000;
    pub const OBJECTIVEC: u64 = 0x0000_2000;
    pub const SWIFT: u64 = 0x0000_4000;
    pub const MYSQL: u64 = 0x0000_8000;
    pub const PYTHON: u64 = 0x0001_0000;
    pub const CSHARP: u64 = 0x0002_0000;
    pub const VB: u64 = 0x0004_0000;
    pub const GO: u64 = 0x0008_0000;
    pub const KOTLIN: u64 = 0x0010_0000;
}

/// Target language of a scan.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Language {
    #[serde(rename = "Php", alias = "PHP")]
    Php,
    #[serde(rename = "Java", alias = "JAVA")]
    Java,
    #[serde(rename = "CSharp", alias = "CSHARP")]
    CSharp,
    #[serde(rename = "VB", alias = "Vb")]
    Vb,
    #[serde(rename = "JavaScript", alias = "JAVASCRIPT")]
    JavaScript,
    #[serde(rename = "Python", alias = "PYTHON")]
    Python,
    #[serde(rename = "ObjectiveC", alias = "OBJECTIVEC")]
    ObjectiveC,
    #[serde(rename = "Swift", alias = "SWIFT")]
    Swift,
    #[serde(rename = "Kotlin", alias = "KOTLIN")]
    Kotlin,
    #[serde(rename = "Go", alias = "GO")]
    Go,
    #[serde(rename = "SQL", alias = "Sql")]
    Sql,
    #[serde(rename = "CPlusPlus", alias = "CPP", alias = "Cpp")]
    Cpp,
}

impl Language {
    pub const ALL: [Language; 12] = [
        Language::Php,
        Language::Java,
        Language::CSharp,
        Language::Vb,
        Language::JavaScript,
        Language::Python,
        Language::ObjectiveC,
        Language::Swift,
        Language::Kotlin,
        Language::Go,
        Language::Sql,
        Language::Cpp,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Language::Php => "Php",
            Language::Java => "Java",
            Language::CSharp => "CSharp",
            Language::Vb => "VB",
            Language::JavaScript => "JavaScript",
            Language::Python => "Python",
            Language::ObjectiveC => "ObjectiveC",
            Language::Swift => "Swift",
            Language::Kotlin => "Kotlin",
            Language::Go => "Go",
            Language::Sql => "SQL",
            Language::Cpp => "CPlusPlus",
        }
    }

    /// Pattern-language bits of this language's group.
    pub fn pattern_languages(&self) -> &'static [u64] {
        use pattern_language::*;
        match self {
            Language::Php => &[PHP],
            Language::Java => &[JAVA],
            Language::CSharp => &[CSHARP],
            Language::Vb => &[VB],
            Language::JavaScript => &[JAVASCRIPT],
            Language::Python => &[PYTHON],
            Language::ObjectiveC => &[OBJECTIVEC],
            Language::Swift => &[SWIFT],
            Language::Kotlin => &[KOTLIN],
            Language::Go => &[GO],
            Language::Sql => &[MYSQL, PLSQL, TSQL],
            Language::Cpp => &[C, CPLUSPLUS],
        }
    }

    /// OR of the group's pattern-language bits.
    pub fn mask(&self) -> u64 {
        self.pattern_languages()
            .iter()
            .fold(pattern_language::NONE, |mask, bit| mask | bit)
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for Language {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_lowercase();
        Language::ALL
            .into_iter()
            .find(|lang| {
                lang.as_str().to_lowercase() == wanted
                    || format!("{:?}", lang).to_lowercase() == wanted
            })
            .ok_or_else(|| format!("Invalid programming language: '{}'", s))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Project {
    pub id: ProjectId,
    pub name: String,
    /// Only 3.6 servers give settings their own identity.
    pub settings_id: Option<SettingsId>,
}

/// Scan configuration of a project. Replaced wholesale on update.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScanSettings {
    pub language: Language,
    pub enabled_patterns: Vec<String>,
    pub disabled_patterns: Vec<String>,
    pub incremental: bool,
    /// Serialized policy rules; `None` clears the project's policy.
    pub policy: Option<String>,
}

impl ScanSettings {
    pub fn new(language: Language) -> Self {
        Self {
            language,
            enabled_patterns: Vec::new(),
            disabled_patterns: Vec::new(),
            incremental: false,
            policy: None,
        }
    }
}

/// Catalog entry. A missing mask means the server could not classify it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PmPattern {
    pub key: String,
    pub languages: Option<u64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ScanStage {
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
    Unknown,
}

impl ScanStage {
    pub fn is_complete(&self) -> bool {
        *self == ScanStage::Done
    }

    /// The scan ended and will not change stage again.
    pub fn is_terminal(&self) -> bool {
        matches!(self, ScanStage::Done | ScanStage::Failed | ScanStage::Aborted)
    }
}

/// Policy verdict computed by the server for a finished scan.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum PolicyState {
    /// No policy assigned.
    #[default]
    None,
    Confirmed,
    Rejected,
}

/// Listing entry of a scan result.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScanResultBrief {
    pub id: ScanResultId,
    pub project_id: ProjectId,
    pub created_at: DateTime<Utc>,
    pub stage: ScanStage,
    pub policy_state: PolicyState,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScanIssue {
    pub id: String,
    pub issue_type: String,
    pub level: String,
}

/// Error the engine reported while scanning.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScanErrorInfo {
    pub message: String,
    pub critical: bool,
}

/// Full scan result. Immutable once fetched.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScanResult {
    pub brief: ScanResultBrief,
    pub issues: Vec<ScanIssue>,
    pub errors: Vec<ScanErrorInfo>,
}

impl ScanResult {
    pub fn id(&self) -> ScanResultId {
        self.brief.id
    }

    pub fn stage(&self) -> ScanStage {
        self.brief.stage
    }
}

/// Current version of each server component.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ServerVersion {
    pub components: BTreeMap<Component, String>,
}
