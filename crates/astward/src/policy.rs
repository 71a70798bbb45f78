//! Policy verdicts for finished scans.
//!
//! Rule evaluation belongs to the server or the host; the job only consumes
//! the verdict.

use crate::domain::{PolicyState, ScanResult};
use crate::error::Result;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PolicyOutcome {
    Compliant,
    Violated,
    /// No policy applies to the project.
    NoPolicy,
}

impl PolicyOutcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            PolicyOutcome::Compliant => "compliant",
            PolicyOutcome::Violated => "violated",
            PolicyOutcome::NoPolicy => "no_policy",
        }
    }
}

impl std::fmt::Display for PolicyOutcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

pub trait PolicyEvaluator: Send + Sync {
    fn evaluate(&self, result: &ScanResult) -> Result<PolicyOutcome>;
}

/// Trusts the verdict the server attached to the result.
#[derive(Debug, Clone, Copy, Default)]
pub struct ServerPolicyEvaluator;

impl PolicyEvaluator for ServerPolicyEvaluator {
    fn evaluate(&self, result: &ScanResult) -> Result<PolicyOutcome> {
        Ok(match result.brief.policy_state {
            PolicyState::None => PolicyOutcome::NoPolicy,
            PolicyState::Confirmed => PolicyOutcome::Compliant,
            PolicyState::Rejected => PolicyOutcome::Violated,
        })
    }
}
