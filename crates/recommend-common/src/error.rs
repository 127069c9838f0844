/// Failures surfaced by the query panel.
///
/// Every failure of a submission is caught at the panel and stored as one of these
/// variants. `Display` renders the single user-facing message; `kind()` keeps the
/// underlying category available to callers and tests.
use reqwest::StatusCode;

use crate::client::ClientError;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum QueryError {
    #[error("Please enter a query.")]
    Validation,

    #[error("Could not reach the recommendation service. Check the API URL and try again.")]
    Transport { detail: String },

    #[error("The recommendation service returned an error (HTTP {}).", .status.as_u16())]
    Api { status: StatusCode },

    #[error("No recommendations found for this query.")]
    EmptyResult,
}

/// Category of a [`QueryError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Validation,
    Transport,
    Api,
    EmptyResult,
}

impl QueryError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            QueryError::Validation => ErrorKind::Validation,
            QueryError::Transport { .. } => ErrorKind::Transport,
            QueryError::Api { .. } => ErrorKind::Api,
            QueryError::EmptyResult => ErrorKind::EmptyResult,
        }
    }

    /// Informational outcomes are shown to the user but do not mark the request failed.
    pub fn is_informational(&self) -> bool {
        matches!(self, QueryError::EmptyResult)
    }
}

impl From<ClientError> for QueryError {
    fn from(err: ClientError) -> Self {
        match err {
            ClientError::Transport(e) => QueryError::Transport {
                detail: e.to_string(),
            },
            ClientError::Api { status, .. } | ClientError::InvalidBody { status, .. } => {
                QueryError::Api { status }
            }
        }
    }
}
