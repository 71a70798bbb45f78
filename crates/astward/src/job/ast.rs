//! The scan job: configure the project, launch a scan, wait for its result
//! and judge it.

use std::sync::Arc;

use tracing::{debug, info};

use super::{JobBody, JobContext};
use crate::client::ProtocolClient;
use crate::directory::ProjectDirectory;
use crate::documents::{self, ScanSettingsDocument};
use crate::domain::{Project, ScanResult};
use crate::error::{JobError, Result};
use crate::locator::{ScanResultLocator, WaitPolicy};
use crate::output::TextOutput;
use crate::policy::{PolicyEvaluator, PolicyOutcome, ServerPolicyEvaluator};

/// Source upload and scan start. Both are host concerns.
pub trait ScanLauncher: Send + Sync {
    /// Called once the project exists, before its policy is assigned.
    fn upload_sources(&self, client: &dyn ProtocolClient, project: &Project) -> Result<()>;

    fn start_scan(
        &self,
        client: &dyn ProtocolClient,
        project: &Project,
        incremental: bool,
    ) -> Result<()>;
}

pub struct AstJob {
    settings_text: String,
    policy_text: Option<String>,
    launcher: Arc<dyn ScanLauncher>,
    evaluator: Arc<dyn PolicyEvaluator>,
    wait: WaitPolicy,
    fail_if_policy_violated: bool,
    fail_if_minor_errors: bool,
    document: Option<ScanSettingsDocument>,
    policy: Option<String>,
}

impl AstJob {
    pub fn new(settings_text: impl Into<String>, launcher: Arc<dyn ScanLauncher>) -> Self {
        Self {
            settings_text: settings_text.into(),
            policy_text: None,
            launcher,
            evaluator: Arc::new(ServerPolicyEvaluator),
            wait: WaitPolicy::default(),
            fail_if_policy_violated: false,
            fail_if_minor_errors: false,
            document: None,
            policy: None,
        }
    }

    pub fn with_policy(mut self, policy_text: impl Into<String>) -> Self {
        self.policy_text = Some(policy_text.into());
        self
    }

    pub fn with_evaluator(mut self, evaluator: Arc<dyn PolicyEvaluator>) -> Self {
        self.evaluator = evaluator;
        self
    }

    pub fn with_wait_policy(mut self, wait: WaitPolicy) -> Self {
        self.wait = wait;
        self
    }

    pub fn fail_if_policy_violated(mut self, fail: bool) -> Self {
        self.fail_if_policy_violated = fail;
        self
    }

    pub fn fail_if_minor_errors(mut self, fail: bool) -> Self {
        self.fail_if_minor_errors = fail;
        self
    }

    /// Turn the scan verdict into the job result. Verdicts that do not fail
    /// the job are reported as warnings on `output`.
    fn judge(&self, result: &ScanResult, output: &dyn TextOutput) -> Result<()> {
        let outcome = self.evaluator.evaluate(result)?;
        debug!("Scan result {} policy outcome: {}", result.id(), outcome);
        if outcome == PolicyOutcome::Violated {
            let message = format!("Scan result {} violates the project policy", result.id());
            if self.fail_if_policy_violated {
                return Err(JobError::policy_violation(message));
            }
            output.warning(&message);
        }

        let critical = result.errors.iter().filter(|e| e.critical).count();
        if critical > 0 {
            return Err(JobError::unknown(format!(
                "Scan result {} has {} critical error(s)",
                result.id(),
                critical
            )));
        }
        let minor = result.errors.len();
        if minor > 0 {
            let message = format!("Scan result {} has {} minor error(s)", result.id(), minor);
            if self.fail_if_minor_errors {
                return Err(JobError::minor_issues(message));
            }
            output.warning(&message);
        }
        Ok(())
    }
}

impl JobBody for AstJob {
    fn setup(&mut self, context: &JobContext) -> Result<()> {
        let settings_text = context.expand(&self.settings_text);
        let document = ScanSettingsDocument::parse(&settings_text)?;
        let policy_text = self.policy_text.as_deref().map(|text| context.expand(text));
        self.policy = documents::parse_policy(policy_text.as_deref())?;
        debug!(
            "Settings parsed for project {} ({}), policy {}",
            document.project_name,
            document.programming_language,
            if self.policy.is_some() { "set" } else { "empty" }
        );
        self.document = Some(document);
        Ok(())
    }

    fn execute(&mut self, context: &JobContext, client: &dyn ProtocolClient) -> Result<()> {
        let document = self
            .document
            .as_ref()
            .ok_or_else(|| JobError::unknown("Scan settings are not parsed"))?;

        let launcher = Arc::clone(&self.launcher);
        let project = ProjectDirectory::new(client).setup_from_settings(
            document,
            self.policy.as_deref(),
            |project| launcher.upload_sources(client, project),
        )?;
        context
            .output
            .info(&format!("Project {} ({}) is set up", project.name, project.id));

        let locator = ScanResultLocator::new(client);
        let baseline = locator.baseline(&project.id)?;
        launcher.start_scan(client, &project, document.use_incremental_scan)?;
        info!("Scan started for project {}", project.name);

        let result_id =
            locator.wait_for_complete(&project.id, &baseline, &self.wait, &context.cancel)?;
        let result = client.scan_result(&project.id, &result_id)?;
        context.output.info(&format!(
            "Scan result {} finished with {} issue(s) and {} error(s)",
            result_id,
            result.issues.len(),
            result.errors.len()
        ));
        self.judge(&result, context.output.as_ref())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{PolicyState, ScanErrorInfo, ScanResultBrief, ScanStage};
    use crate::error::ErrorKind;
    use crate::output::{BufferedOutput, OutputLevel};
    use astward_ids::{ProjectId, ScanResultId};
    use chrono::Utc;

    struct NoLauncher;

    impl ScanLauncher for NoLauncher {
        fn upload_sources(&self, _: &dyn ProtocolClient, _: &Project) -> Result<()> {
            Ok(())
        }

        fn start_scan(&self, _: &dyn ProtocolClient, _: &Project, _: bool) -> Result<()> {
            Ok(())
        }
    }

    fn result(policy_state: PolicyState, errors: &[bool]) -> ScanResult {
        ScanResult {
            brief: ScanResultBrief {
                id: ScanResultId::new(),
                project_id: ProjectId::new(),
                created_at: Utc::now(),
                stage: ScanStage::Done,
                policy_state,
            },
            issues: Vec::new(),
            errors: errors
                .iter()
                .map(|critical| ScanErrorInfo {
                    message: "error".to_string(),
                    critical: *critical,
                })
                .collect(),
        }
    }

    fn job() -> AstJob {
        AstJob::new("{}", Arc::new(NoLauncher))
    }

    #[test]
    fn violation_fails_only_when_asked() {
        let rejected = result(PolicyState::Rejected, &[]);
        let out = BufferedOutput::new();
        assert!(job().judge(&rejected, &out).is_ok());
        assert_eq!(out.count(OutputLevel::Warning), 1);

        let out = BufferedOutput::new();
        let err = job()
            .fail_if_policy_violated(true)
            .judge(&rejected, &out)
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::PolicyViolation);
        assert_eq!(out.count(OutputLevel::Warning), 0);
    }

    #[test]
    fn minor_errors_fail_only_when_asked() {
        let minor = result(PolicyState::Confirmed, &[false]);
        let out = BufferedOutput::new();
        assert!(job().judge(&minor, &out).is_ok());
        assert_eq!(
            out.lines(),
            vec![(
                OutputLevel::Warning,
                format!("Scan result {} has 1 minor error(s)", minor.id())
            )]
        );
        let err = job()
            .fail_if_minor_errors(true)
            .judge(&minor, &BufferedOutput::new())
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::MinorIssues);
    }

    #[test]
    fn clean_result_warns_nothing() {
        let out = BufferedOutput::new();
        assert!(job().judge(&result(PolicyState::Confirmed, &[]), &out).is_ok());
        assert!(out.lines().is_empty());
    }

    #[test]
    fn critical_errors_always_fail() {
        let err = job()
            .judge(&result(PolicyState::None, &[false, true]), &BufferedOutput::new())
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Unknown);
    }

    #[test]
    fn setup_expands_and_validates() {
        let context = JobContext::new(Default::default(), Arc::default()).with_macro_expander(
            Arc::new(|text: &str, _: &std::collections::BTreeMap<String, String>| {
                text.replace("${NAME}", "app")
            }),
        );
        let mut body = AstJob::new(
            r#"{"ProjectName":"${NAME}","ProgrammingLanguage":"Java"}"#,
            Arc::new(NoLauncher),
        )
        .with_policy("[]");
        body.setup(&context).unwrap();
        assert_eq!(body.document.as_ref().unwrap().project_name, "app");
        assert_eq!(body.policy.as_deref(), Some("[]"));

        let mut bad = AstJob::new(
            r#"{"ProjectName":"app","ProgrammingLanguage":"Java"}"#,
            Arc::new(NoLauncher),
        )
        .with_policy(r#"{"Scopes":[]}"#);
        assert_eq!(bad.setup(&context).unwrap_err().kind(), ErrorKind::Validation);
    }
}
