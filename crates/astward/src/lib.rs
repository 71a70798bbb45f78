//! Astward: submit and supervise static-analysis scan jobs.
//!
//! One capability surface ([`client::ProtocolClient`]) covers every supported
//! server generation. On top of it sit the project directory, pattern
//! negotiation, result location and the [`job`] lifecycle that classifies
//! every failure into an [`error::ErrorKind`].

pub mod cancel;
pub mod client;
pub mod directory;
pub mod documents;
pub mod domain;
pub mod error;
pub mod job;
pub mod locator;
pub mod output;
pub mod patterns;
pub mod policy;
pub mod settings;

pub use astward_ids::{ProjectId, ScanResultId, SettingsId};
pub use astward_protocol::{Component, ProtocolVersion};

pub use cancel::CancellationToken;
pub use client::{connect, ProtocolClient, TransportConnector, VersionSelection, VersionedClient};
pub use directory::ProjectDirectory;
pub use documents::ScanSettingsDocument;
pub use domain::{Language, PmPattern, Project, ScanResult, ScanSettings, ScanStage};
pub use error::{ErrorKind, JobError, Result};
pub use job::{AstJob, Job, JobBody, JobContext, JobOutcome, JobReport, JobState, ScanLauncher};
pub use locator::{Baseline, ScanResultLocator, WaitPolicy};
pub use output::{StderrOutput, TextOutput};
pub use patterns::PatternSelection;
pub use policy::{PolicyEvaluator, PolicyOutcome, ServerPolicyEvaluator};
pub use settings::{AdvancedSettings, ConnectionSettings, Credentials};
