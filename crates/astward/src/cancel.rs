use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use astward_protocol::defaults::CANCELLED_BY_USER_MESSAGE;

use crate::error::{JobError, Result};

/// Token for cooperative cancellation of a running job.
///
/// Clone is cheap and shares state: the host keeps one clone to signal, the
/// job and its client observe the other.
#[derive(Debug, Clone, Default)]
pub struct CancellationToken {
    cancelled: Arc<AtomicBool>,
}

impl CancellationToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }

    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
    }

    /// Interrupted-kind error once cancellation was requested.
    pub fn check(&self) -> Result<()> {
        if self.is_cancelled() {
            Err(JobError::interrupted(CANCELLED_BY_USER_MESSAGE))
        } else {
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;

    #[test]
    fn clones_share_state() {
        let token = CancellationToken::new();
        let observer = token.clone();
        assert!(observer.check().is_ok());
        token.cancel();
        assert!(observer.is_cancelled());
        assert_eq!(observer.check().unwrap_err().kind(), ErrorKind::Interrupted);
    }
}
