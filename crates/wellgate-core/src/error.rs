// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! Error types for job execution.

use thiserror::Error;
use wellgate_connections::ProviderError;
use wellgate_witsml::WitsmlError;

/// Result type using JobError.
pub type Result<T> = std::result::Result<T, JobError>;

/// Errors raised while executing a job.
///
/// Every variant is converted into a structured
/// [`WorkerResult`](crate::job::WorkerResult) at the job boundary; no error
/// leaks to the submitting layer as a panic.
#[derive(Debug, Error)]
pub enum JobError {
    /// Job input failed a required-field check. No protocol call was made.
    #[error("invalid job input: {0}")]
    Validation(String),

    /// The store accepted the creation but the object never became visible
    /// within the bounded poll. Distinct from the add call itself failing.
    #[error("'{entity}' was created but not visible after {attempts} attempts")]
    ConsistencyTimeout {
        /// Description of the created entity.
        entity: String,
        /// Number of poll attempts made.
        attempts: u32,
    },

    /// A referenced object (source object, target parent) does not exist.
    #[error("{0} was not found")]
    NotFound(String),

    /// The job observed a cancellation signal at a step boundary.
    #[error("job cancelled")]
    Cancelled,

    /// The dispatcher is gone; the job was never enqueued.
    #[error("job queue is closed")]
    QueueClosed,

    /// Store protocol or transport failure.
    #[error(transparent)]
    Witsml(#[from] WitsmlError),

    /// Client resolution failure (no access, bad registry).
    #[error(transparent)]
    Provider(#[from] ProviderError),
}

impl JobError {
    /// Stable code string for structured job results.
    pub fn code(&self) -> &'static str {
        match self {
            Self::Validation(_) => "VALIDATION",
            Self::ConsistencyTimeout { .. } => "CONSISTENCY_TIMEOUT",
            Self::NotFound(_) => "NOT_FOUND",
            Self::Cancelled => "CANCELLED",
            Self::QueueClosed => "QUEUE_CLOSED",
            Self::Witsml(e) => e.code(),
            Self::Provider(e) => e.code(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wellgate_connections::ServerRole;

    #[test]
    fn test_consistency_timeout_display() {
        let err = JobError::ConsistencyTimeout {
            entity: "well 'W-1'".to_string(),
            attempts: 30,
        };
        assert_eq!(
            err.to_string(),
            "'well 'W-1'' was created but not visible after 30 attempts"
        );
        assert_eq!(err.code(), "CONSISTENCY_TIMEOUT");
    }

    #[test]
    fn test_codes_delegate_to_source() {
        let err = JobError::from(ProviderError::no_access(ServerRole::Target));
        assert_eq!(err.code(), "NO_ACCESS");

        let err = JobError::from(WitsmlError::RemoteCrashed {
            server: "s".to_string(),
        });
        assert_eq!(err.code(), "REMOTE_CRASHED");
    }

    #[test]
    fn test_validation_code() {
        assert_eq!(JobError::Validation("x".to_string()).code(), "VALIDATION");
        assert_eq!(JobError::Cancelled.code(), "CANCELLED");
    }
}
