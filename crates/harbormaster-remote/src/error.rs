//! Error types for the tracker and forge boundaries.

use thiserror::Error;

/// Errors raised by a [`crate::TicketSource`] implementation.
///
/// Absence of a ticket during lookup is not an error; `get_ticket` returns
/// `Ok(None)`. Mutating a ticket that does not exist is.
#[derive(Error, Debug)]
pub enum TrackerError {
    /// Could not reach the tracker at all (DNS, TLS, refused connection).
    #[error("tracker connection failed: {0}")]
    Connection(String),

    /// The request exceeded the configured time bound.
    #[error("tracker request timed out: {0}")]
    Timeout(String),

    /// The tracker rejected the configured credentials.
    #[error("tracker authentication rejected")]
    Auth,

    /// Mutation addressed to a ticket the tracker does not know.
    #[error("ticket not found: {0}")]
    TicketNotFound(String),

    /// Non-success status the client has no better mapping for.
    #[error("tracker request failed with status {status}: {body}")]
    Status { status: u16, body: String },

    /// The tracker answered with a payload the client could not parse.
    #[error("malformed tracker response: {0}")]
    Malformed(String),
}

impl From<reqwest::Error> for TrackerError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            TrackerError::Timeout(err.to_string())
        } else {
            TrackerError::Connection(err.to_string())
        }
    }
}

/// Errors raised by a [`crate::SourceHost`] or [`crate::RepoForge`]
/// implementation.
///
/// Missing repositories, files, users, readmes are all `Ok(None)` on the
/// lookup traits; these variants are reserved for genuine infrastructure
/// failures.
#[derive(Error, Debug)]
pub enum ForgeError {
    /// Could not reach the forge API.
    #[error("forge connection failed: {0}")]
    Connection(String),

    /// The request exceeded the configured time bound.
    #[error("forge request timed out: {0}")]
    Timeout(String),

    /// The forge rejected the configured credentials.
    #[error("forge authentication rejected")]
    Auth,

    /// Non-success status the client has no better mapping for.
    #[error("forge request failed with status {status}: {body}")]
    Status { status: u16, body: String },

    /// The forge answered with a payload the client could not parse.
    #[error("malformed forge response: {0}")]
    Malformed(String),
}

impl From<reqwest::Error> for ForgeError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            ForgeError::Timeout(err.to_string())
        } else {
            ForgeError::Connection(err.to_string())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tracker_error_display() {
        let err = TrackerError::TicketNotFound("HOSTING-123".to_string());
        assert!(err.to_string().contains("HOSTING-123"));

        let err = TrackerError::Status {
            status: 500,
            body: "oops".to_string(),
        };
        assert!(err.to_string().contains("500"));
    }

    #[test]
    fn test_forge_error_display() {
        let err = ForgeError::Connection("refused".to_string());
        assert!(err.to_string().contains("refused"));
        assert!(ForgeError::Auth.to_string().contains("authentication"));
    }
}
