//! Job lifecycle.
//!
//! A [`Job`] runs its [`JobBody`] through `Init -> Validate -> Connected ->
//! Executing` and ends in exactly one terminal state. Any error is classified
//! by its [`ErrorKind`]: interruption ends in `Interrupted`, everything else
//! in `Failed`. Only unexpected failures reach the user-visible channel.

pub mod ast;

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use tracing::{debug, error, info};

use crate::cancel::CancellationToken;
use crate::client::{self, ProtocolClient, TransportConnector, VersionSelection};
use crate::error::{ErrorKind, JobError, Result};
use crate::output::{StderrOutput, TextOutput};
use crate::settings::{AdvancedSettings, ConnectionSettings};

pub use ast::{AstJob, ScanLauncher};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum JobState {
    Init,
    Validate,
    Connected,
    Executing,
    Success,
    Failed,
    Interrupted,
}

impl JobState {
    pub fn as_str(&self) -> &'static str {
        match self {
            JobState::Init => "init",
            JobState::Validate => "validate",
            JobState::Connected => "connected",
            JobState::Executing => "executing",
            JobState::Success => "success",
            JobState::Failed => "failed",
            JobState::Interrupted => "interrupted",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            JobState::Success | JobState::Failed | JobState::Interrupted
        )
    }
}

impl fmt::Display for JobState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum JobOutcome {
    Success,
    Failed,
    Interrupted,
}

impl JobOutcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            JobOutcome::Success => "success",
            JobOutcome::Failed => "failed",
            JobOutcome::Interrupted => "interrupted",
        }
    }

    fn terminal_state(&self) -> JobState {
        match self {
            JobOutcome::Success => JobState::Success,
            JobOutcome::Failed => JobState::Failed,
            JobOutcome::Interrupted => JobState::Interrupted,
        }
    }
}

impl fmt::Display for JobOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// What the host gets back from one job run.
#[derive(Debug)]
pub struct JobReport {
    pub outcome: JobOutcome,
    /// Every state entered, in order, ending with the terminal one.
    pub state_trail: Vec<JobState>,
    pub error: Option<JobError>,
}

impl JobReport {
    pub fn error_kind(&self) -> Option<ErrorKind> {
        self.error.as_ref().map(JobError::kind)
    }

    pub fn detailed_message(&self) -> Option<String> {
        self.error.as_ref().map(JobError::detailed_message)
    }
}

/// Host macro substitution: `(text, variables) -> expanded text`.
pub type MacroExpander = Arc<dyn Fn(&str, &BTreeMap<String, String>) -> String + Send + Sync>;

/// Everything a job reads from its host.
#[derive(Clone)]
pub struct JobContext {
    pub connection: ConnectionSettings,
    pub settings: Arc<AdvancedSettings>,
    pub selection: VersionSelection,
    pub cancel: CancellationToken,
    pub macro_expander: MacroExpander,
    pub variables: BTreeMap<String, String>,
    pub output: Arc<dyn TextOutput>,
}

impl JobContext {
    pub fn new(connection: ConnectionSettings, settings: Arc<AdvancedSettings>) -> Self {
        Self {
            connection,
            settings,
            selection: VersionSelection::default(),
            cancel: CancellationToken::new(),
            macro_expander: Arc::new(|text: &str, _: &BTreeMap<String, String>| text.to_string()),
            variables: BTreeMap::new(),
            output: Arc::new(StderrOutput),
        }
    }

    pub fn with_selection(mut self, selection: VersionSelection) -> Self {
        self.selection = selection;
        self
    }

    pub fn with_cancel(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }

    pub fn with_macro_expander(mut self, expander: MacroExpander) -> Self {
        self.macro_expander = expander;
        self
    }

    pub fn with_variables(mut self, variables: BTreeMap<String, String>) -> Self {
        self.variables = variables;
        self
    }

    pub fn with_output(mut self, output: Arc<dyn TextOutput>) -> Self {
        self.output = output;
        self
    }

    /// Run the host macro expander over `text`.
    pub fn expand(&self, text: &str) -> String {
        (self.macro_expander)(text, &self.variables)
    }
}

impl fmt::Debug for JobContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("JobContext")
            .field("connection", &self.connection)
            .field("settings", &self.settings)
            .field("selection", &self.selection)
            .field("cancel", &self.cancel)
            .field("variables", &self.variables)
            .finish_non_exhaustive()
    }
}

/// The job-specific part of a run.
pub trait JobBody {
    /// Read and validate inputs. Failures here are validation failures.
    fn setup(&mut self, context: &JobContext) -> Result<()>;

    fn execute(&mut self, context: &JobContext, client: &dyn ProtocolClient) -> Result<()>;
}

/// One run of a [`JobBody`]. Consumed by [`Job::execute`].
pub struct Job<B: JobBody> {
    context: JobContext,
    connector: Arc<dyn TransportConnector>,
    body: B,
}

impl<B: JobBody> Job<B> {
    pub fn new(context: JobContext, connector: Arc<dyn TransportConnector>, body: B) -> Self {
        Self {
            context,
            connector,
            body,
        }
    }

    pub fn context(&self) -> &JobContext {
        &self.context
    }

    pub fn execute(mut self) -> JobReport {
        let mut trail = vec![JobState::Init];
        let result = self.run(&mut trail);
        let (outcome, error) = match result {
            Ok(()) => (JobOutcome::Success, None),
            Err(err) => (self.classify(&err), Some(err)),
        };
        trail.push(outcome.terminal_state());
        info!("Job finished: {}", outcome);
        JobReport {
            outcome,
            state_trail: trail,
            error,
        }
    }

    fn run(&mut self, trail: &mut Vec<JobState>) -> Result<()> {
        self.context.cancel.check()?;
        self.body.setup(&self.context).map_err(into_validation)?;

        trail.push(JobState::Validate);
        self.context.connection.validate()?;

        let client = client::connect(
            self.connector.as_ref(),
            &self.context.connection,
            Arc::clone(&self.context.settings),
            self.context.selection,
            self.context.cancel.clone(),
        )?;
        trail.push(JobState::Connected);

        trail.push(JobState::Executing);
        self.body.execute(&self.context, &client)
    }

    fn classify(&self, err: &JobError) -> JobOutcome {
        match err.kind() {
            ErrorKind::Interrupted => {
                debug!("Job execution interrupted: {}", err.detailed_message());
                JobOutcome::Interrupted
            }
            ErrorKind::PolicyViolation | ErrorKind::MinorIssues => {
                debug!("{}", err.detailed_message());
                JobOutcome::Failed
            }
            ErrorKind::Validation | ErrorKind::Transport | ErrorKind::Unknown => {
                let detailed = err.detailed_message();
                self.context.output.severe(&detailed);
                error!("{} job failure: {}", err.kind(), detailed);
                JobOutcome::Failed
            }
        }
    }
}

fn into_validation(err: JobError) -> JobError {
    match err.kind() {
        ErrorKind::Validation | ErrorKind::Interrupted => err,
        _ => JobError::with_source(ErrorKind::Validation, "Job setup failed", err),
    }
}
