//! Scan result lookup and completion polling.

use std::thread;
use std::time::{Duration, Instant};

use astward_ids::{ProjectId, ScanResultId};
use tracing::debug;

use crate::cancel::CancellationToken;
use crate::client::ProtocolClient;
use crate::domain::ScanResultBrief;
use crate::error::{ErrorKind, JobError, Result};

/// Longest single sleep while waiting, so cancellation is seen promptly.
const SLEEP_SLICE: Duration = Duration::from_millis(100);

/// Caller-supplied polling discipline for [`ScanResultLocator::wait_for_complete`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WaitPolicy {
    pub interval: Duration,
    pub timeout: Duration,
}

impl Default for WaitPolicy {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(5),
            timeout: Duration::from_secs(24 * 60 * 60),
        }
    }
}

/// A project's results as they stood before a scan was launched.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Baseline {
    /// Newest `Done` result.
    pub complete: Option<ScanResultId>,
    /// Newest result of any stage.
    pub latest: Option<ScanResultId>,
}

/// Finds the results of a project's scans.
pub struct ScanResultLocator<'a> {
    client: &'a dyn ProtocolClient,
}

impl<'a> ScanResultLocator<'a> {
    pub fn new(client: &'a dyn ProtocolClient) -> Self {
        Self { client }
    }

    /// Most recently created result regardless of stage.
    pub fn latest(&self, project: &ProjectId) -> Result<Option<ScanResultId>> {
        Ok(self.client.latest_scan_result(project)?.map(|r| r.id))
    }

    /// The newest result whose stage is `Done`. Fails when there is none.
    pub fn latest_complete(&self, project: &ProjectId) -> Result<ScanResultId> {
        self.find_latest_complete(project)?.ok_or_else(|| {
            JobError::with_source(
                ErrorKind::Unknown,
                "Project finished scan results are not found",
                format!("project {}", project),
            )
        })
    }

    /// Same selection as [`latest_complete`](Self::latest_complete) but an
    /// empty completion set is `None`.
    pub fn find_latest_complete(&self, project: &ProjectId) -> Result<Option<ScanResultId>> {
        let results = self.client.scan_results(project)?;
        Ok(select_latest_complete(&results).map(|r| r.id))
    }

    /// Snapshot taken before launching a scan, for [`wait_for_complete`](Self::wait_for_complete).
    pub fn baseline(&self, project: &ProjectId) -> Result<Baseline> {
        Ok(Baseline {
            complete: self.find_latest_complete(project)?,
            latest: self.latest(project)?,
        })
    }

    /// Poll until a completed result newer than `baseline` exists.
    ///
    /// A newer result that ended `Failed` or `Aborted` stops the wait with an
    /// Unknown-kind error. A timeout too large to represent means no deadline.
    pub fn wait_for_complete(
        &self,
        project: &ProjectId,
        baseline: &Baseline,
        policy: &WaitPolicy,
        cancel: &CancellationToken,
    ) -> Result<ScanResultId> {
        let deadline = Instant::now().checked_add(policy.timeout);
        loop {
            cancel.check()?;
            if let Some(id) = self.find_latest_complete(project)? {
                if Some(id) != baseline.complete {
                    debug!("Scan result {} of project {} is complete", id, project);
                    return Ok(id);
                }
            }
            if let Some(latest) = self.client.latest_scan_result(project)? {
                if latest.stage.is_terminal()
                    && !latest.stage.is_complete()
                    && Some(latest.id) != baseline.latest
                {
                    return Err(JobError::with_source(
                        ErrorKind::Unknown,
                        "Scan finished without a complete result",
                        format!(
                            "scan result {} of project {} ended in stage {:?}",
                            latest.id, project, latest.stage
                        ),
                    ));
                }
            }
            let pause = match deadline {
                Some(deadline) => {
                    let left = deadline.saturating_duration_since(Instant::now());
                    if left.is_zero() {
                        return Err(JobError::with_source(
                            ErrorKind::Transport,
                            "Scan result wait timed out",
                            format!("project {} after {:?}", project, policy.timeout),
                        ));
                    }
                    policy.interval.min(left)
                }
                None => policy.interval,
            };
            sleep_cancellable(pause, cancel)?;
        }
    }
}

/// Greatest `created_at` among `Done` entries; ties go to the one listed last.
pub fn select_latest_complete(results: &[ScanResultBrief]) -> Option<&ScanResultBrief> {
    results
        .iter()
        .filter(|r| r.stage.is_complete())
        .fold(None, |best: Option<&ScanResultBrief>, r| match best {
            Some(b) if b.created_at > r.created_at => Some(b),
            _ => Some(r),
        })
}

fn sleep_cancellable(duration: Duration, cancel: &CancellationToken) -> Result<()> {
    let mut left = duration;
    while !left.is_zero() {
        cancel.check()?;
        let slice = SLEEP_SLICE.min(left);
        thread::sleep(slice);
        left = left.saturating_sub(slice);
    }
    cancel.check()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{PolicyState, ScanStage};
    use chrono::{TimeZone, Utc};

    fn brief(stage: ScanStage, minute: u32) -> ScanResultBrief {
        ScanResultBrief {
            id: ScanResultId::new(),
            project_id: ProjectId::from_uuid(uuid::Uuid::nil()),
            created_at: Utc.with_ymd_and_hms(2024, 1, 1, 12, minute, 0).unwrap(),
            stage,
            policy_state: PolicyState::None,
        }
    }

    #[test]
    fn picks_newest_done_entry() {
        let results = vec![
            brief(ScanStage::Done, 1),
            brief(ScanStage::Done, 30),
            brief(ScanStage::Scan, 45),
            brief(ScanStage::Done, 10),
        ];
        assert_eq!(select_latest_complete(&results).unwrap().id, results[1].id);
    }

    #[test]
    fn ties_go_to_last_listed() {
        let results = vec![brief(ScanStage::Done, 5), brief(ScanStage::Done, 5)];
        assert_eq!(select_latest_complete(&results).unwrap().id, results[1].id);
    }

    #[test]
    fn no_done_entry_selects_nothing() {
        let results = vec![brief(ScanStage::Failed, 1), brief(ScanStage::Scan, 2)];
        assert!(select_latest_complete(&results).is_none());
        assert!(select_latest_complete(&[]).is_none());
    }

    #[test]
    fn sleep_stops_on_cancel() {
        let cancel = CancellationToken::new();
        cancel.cancel();
        let started = Instant::now();
        let err = sleep_cancellable(Duration::from_secs(60), &cancel).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Interrupted);
        assert!(started.elapsed() < Duration::from_secs(1));
    }

    #[test]
    fn unbounded_sleep_still_stops_on_cancel() {
        let cancel = CancellationToken::new();
        cancel.cancel();
        let err = sleep_cancellable(Duration::MAX, &cancel).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Interrupted);
    }

    #[test]
    fn only_done_failed_and_aborted_are_terminal() {
        assert!(ScanStage::Done.is_terminal());
        assert!(ScanStage::Failed.is_terminal());
        assert!(ScanStage::Aborted.is_terminal());
        assert!(!ScanStage::Scan.is_terminal());
        assert!(!ScanStage::Unknown.is_terminal());
    }
}
