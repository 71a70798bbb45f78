//! Job error taxonomy.
//!
//! Every remote call and validation step reports failure as a [`JobError`]:
//! one [`ErrorKind`], a static call-site message and the original cause
//! chained underneath. The lifecycle classifies by kind alone.

use std::error::Error as StdError;
use std::fmt;

pub type Result<T> = std::result::Result<T, JobError>;

type BoxError = Box<dyn StdError + Send + Sync + 'static>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Bad input: settings, policy or connection parameters.
    Validation,
    /// A remote call failed or the server could not be reached.
    Transport,
    /// The scan result violates the assigned policy.
    PolicyViolation,
    /// The scan finished with non-critical errors.
    MinorIssues,
    /// The job was cancelled.
    Interrupted,
    Unknown,
}

impl ErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::Validation => "validation",
            ErrorKind::Transport => "transport",
            ErrorKind::PolicyViolation => "policy_violation",
            ErrorKind::MinorIssues => "minor_issues",
            ErrorKind::Interrupted => "interrupted",
            ErrorKind::Unknown => "unknown",
        }
    }

    /// Policy violations and minor issues are normal operational outcomes.
    pub fn is_expected_failure(&self) -> bool {
        matches!(self, ErrorKind::PolicyViolation | ErrorKind::MinorIssues)
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Classified, cause-chaining error.
#[derive(Debug)]
pub struct JobError {
    kind: ErrorKind,
    message: String,
    source: Option<BoxError>,
}

impl JobError {
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            source: None,
        }
    }

    pub fn with_source(
        kind: ErrorKind,
        message: impl Into<String>,
        source: impl Into<BoxError>,
    ) -> Self {
        Self {
            kind,
            message: message.into(),
            source: Some(source.into()),
        }
    }

    pub fn validation(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Validation, message)
    }

    pub fn transport(message: impl Into<String>, source: impl Into<BoxError>) -> Self {
        Self::with_source(ErrorKind::Transport, message, source)
    }

    pub fn interrupted(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Interrupted, message)
    }

    pub fn policy_violation(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::PolicyViolation, message)
    }

    pub fn minor_issues(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::MinorIssues, message)
    }

    pub fn unknown(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Unknown, message)
    }

    pub fn kind(&self) -> ErrorKind {
        self.kind
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    /// Message followed by every cause in the chain, outermost first.
    pub fn detailed_message(&self) -> String {
        let mut detailed = self.message.clone();
        let mut cause = self.source.as_deref().map(|e| e as &(dyn StdError + 'static));
        while let Some(err) = cause {
            detailed.push_str(": ");
            detailed.push_str(&err.to_string());
            cause = err.source();
        }
        detailed
    }
}

impl fmt::Display for JobError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl StdError for JobError {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        self.source.as_deref().map(|e| e as &(dyn StdError + 'static))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io;

    #[derive(Debug)]
    struct Wrapped(io::Error);

    impl fmt::Display for Wrapped {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            write!(f, "socket closed")
        }
    }

    impl StdError for Wrapped {
        fn source(&self) -> Option<&(dyn StdError + 'static)> {
            Some(&self.0)
        }
    }

    #[test]
    fn detailed_message_walks_the_chain() {
        let root = io::Error::new(io::ErrorKind::ConnectionReset, "reset by peer");
        let err = JobError::transport("Project search failed", Wrapped(root));
        assert_eq!(
            err.detailed_message(),
            "Project search failed: socket closed: reset by peer"
        );
        assert_eq!(err.to_string(), "Project search failed");
    }

    #[test]
    fn source_is_preserved() {
        let err = JobError::transport("call failed", io::Error::new(io::ErrorKind::Other, "boom"));
        let source = err.source().unwrap();
        assert!(source.downcast_ref::<io::Error>().is_some());
    }

    #[test]
    fn without_source_detailed_is_message() {
        let err = JobError::validation("Project name must not be empty");
        assert_eq!(err.kind(), ErrorKind::Validation);
        assert_eq!(err.detailed_message(), "Project name must not be empty");
        assert!(err.source().is_none());
    }

    #[test]
    fn expected_failures() {
        assert!(ErrorKind::PolicyViolation.is_expected_failure());
        assert!(ErrorKind::MinorIssues.is_expected_failure());
        assert!(!ErrorKind::Transport.is_expected_failure());
        assert!(!ErrorKind::Interrupted.is_expected_failure());
    }
}
