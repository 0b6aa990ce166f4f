use std::str::FromStr;

use tracing::{error, info};

use crate::contract::{ReplicationOutcome, COMPLETION_STATUS};
use crate::replicator::ReplicationError;

/// Which failures are reported back to the invoking runtime.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ErrorPolicy {
    /// Only retryable store failures fail the invocation; everything else is
    /// logged and reported as done.
    #[default]
    BestEffort,
    /// Every failure fails the invocation.
    Strict,
}

impl ErrorPolicy {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::BestEffort => "best-effort",
            Self::Strict => "strict",
        }
    }
}

impl FromStr for ErrorPolicy {
    type Err = String;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "best-effort" | "best_effort" | "besteffort" => Ok(Self::BestEffort),
            "strict" => Ok(Self::Strict),
            _ => Err(format!(
                "unsupported error policy '{raw}' (expected best-effort or strict)"
            )),
        }
    }
}

/// Logs the result of one invocation and decides between "done" and
/// "retry". This is the only place replication errors are logged.
pub fn settle(
    result: Result<ReplicationOutcome, ReplicationError>,
    policy: ErrorPolicy,
) -> Result<&'static str, ReplicationError> {
    match result {
        Ok(outcome) => {
            match serde_json::to_string(&outcome) {
                Ok(rendered) => info!(outcome = %rendered, "replication completed"),
                Err(_) => info!(outcome = ?outcome, "replication completed"),
            }
            Ok(COMPLETION_STATUS)
        }
        Err(failure) => {
            let retryable = failure.is_retryable();
            error!(
                error = %failure,
                retryable,
                policy = policy.as_str(),
                "replication failed"
            );
            if retryable || policy == ErrorPolicy::Strict {
                Err(failure)
            } else {
                Ok(COMPLETION_STATUS)
            }
        }
    }
}
