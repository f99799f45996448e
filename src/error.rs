use thiserror::Error;

/// Failure taxonomy for a synchronization run.
///
/// The variants matter to callers: authentication and category-tree failures
/// abort a run (readers fall back to last-known-good data), while per-item
/// fetch failures are caught inside the orchestrator, logged and skipped.
#[derive(Debug, Error)]
pub enum SyncError {
    /// The vendor rejected the credentials or returned no usable token.
    /// Fatal to the current run, not to the process.
    #[error("vendor authentication failed: {reason}")]
    Authentication { reason: String },

    /// A remote read failed: network error, timeout, non-2xx status or a
    /// structurally unparseable response body.
    #[error("remote fetch failed ({endpoint}): {reason}")]
    RemoteFetch { endpoint: String, reason: String },

    /// The catalog store is unreachable or rejected a write. Never swallowed.
    #[error("catalog store failure: {reason}")]
    Persistence { reason: String },
}

impl SyncError {
    pub fn authentication(reason: impl Into<String>) -> Self {
        Self::Authentication {
            reason: reason.into(),
        }
    }

    pub fn remote_fetch(endpoint: impl Into<String>, reason: impl std::fmt::Display) -> Self {
        Self::RemoteFetch {
            endpoint: endpoint.into(),
            reason: reason.to_string(),
        }
    }

    pub fn persistence(reason: impl std::fmt::Display) -> Self {
        Self::Persistence {
            reason: reason.to_string(),
        }
    }
}

impl From<sqlx::Error> for SyncError {
    fn from(e: sqlx::Error) -> Self {
        SyncError::persistence(e)
    }
}
