//! Ticket tracker boundary: the hosting-request record and its source.
//!
//! A hosting request lives in the external issue tracker. The engine reads
//! three logical fields plus the reporter identity, treats the fetched
//! [`Ticket`] as an immutable snapshot for the whole verification run, and
//! writes back only through [`TicketSource::update_fields`] and
//! [`TicketSource::post_comment`].

use std::collections::BTreeMap;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::TrackerError;

/// Result type for tracker operations.
pub type TrackerResult<T> = std::result::Result<T, TrackerError>;

/// The logical ticket fields the engine reads and corrects.
///
/// Tracker implementations map these onto their own field identifiers
/// (custom field ids for JIRA-style trackers). The display names below are
/// the ones rendered into verification messages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TicketField {
    /// URL of the candidate source repository.
    SourceUrl,

    /// Delimited list of accounts to authorize on the hosted repository.
    AuthorizedUsers,

    /// Requested name for the repository inside the target organization.
    TargetName,
}

impl TicketField {
    /// Human-facing field label, as shown on the hosting-request form.
    pub fn display_name(&self) -> &'static str {
        match self {
            TicketField::SourceUrl => "Repository URL",
            TicketField::AuthorizedUsers => "GitHub Users to Authorize as Committers",
            TicketField::TargetName => "New Repository Name",
        }
    }
}

impl std::fmt::Display for TicketField {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.display_name())
    }
}

/// A proposed overwrite of one ticket field.
///
/// Produced by a checker when the stored value is recoverable-but-malformed
/// (trailing `.git`, plain-http scheme, camelCase name). Corrections for the
/// same field apply in checker-registration order; the last write wins.
/// Re-running verification against a corrected ticket must produce zero
/// further corrections for that field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldCorrection {
    /// Which field to overwrite.
    pub field: TicketField,
    /// The replacement value.
    pub value: String,
}

impl FieldCorrection {
    pub fn new(field: TicketField, value: impl Into<String>) -> Self {
        Self {
            field,
            value: value.into(),
        }
    }
}

/// A hosting-request record, fetched once per verification run.
///
/// Field presence is never assumed: a missing entry and a blank value are
/// the same thing to checkers. The snapshot is read-only to the engine;
/// corrections go back through the tracker.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ticket {
    /// Tracker key, e.g. `HOSTING-123`.
    pub key: String,

    /// Account name of the requester, if the tracker resolved one.
    pub reporter: Option<String>,

    /// Logical field values as stored on the ticket.
    pub fields: BTreeMap<TicketField, String>,
}

impl Ticket {
    /// Create an empty ticket snapshot for the given key.
    pub fn new(key: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            reporter: None,
            fields: BTreeMap::new(),
        }
    }

    /// Set the reporter identity.
    pub fn with_reporter(mut self, reporter: impl Into<String>) -> Self {
        self.reporter = Some(reporter.into());
        self
    }

    /// Set one field value.
    pub fn with_field(mut self, field: TicketField, value: impl Into<String>) -> Self {
        self.fields.insert(field, value.into());
        self
    }

    /// The stored value of a field, if any.
    pub fn field(&self, field: TicketField) -> Option<&str> {
        self.fields.get(&field).map(String::as_str)
    }

    /// True when the field is absent or contains only whitespace.
    pub fn is_blank(&self, field: TicketField) -> bool {
        self.field(field).map_or(true, |v| v.trim().is_empty())
    }
}

/// Ticket tracker access.
///
/// Guarantees:
/// - `get_ticket` returns `Ok(None)` for unknown keys, never an error.
/// - All calls are bounded by the implementation's configured timeout; a
///   timeout surfaces as `TrackerError::Timeout`, never a hang.
/// - `update_fields` applies corrections in slice order; when the same field
///   appears twice, the later value wins.
#[async_trait]
pub trait TicketSource: Send + Sync {
    /// Fetch a ticket snapshot by key.
    async fn get_ticket(&self, key: &str) -> TrackerResult<Option<Ticket>>;

    /// Overwrite ticket fields with the given corrections.
    async fn update_fields(&self, key: &str, corrections: &[FieldCorrection])
        -> TrackerResult<()>;

    /// Append a comment to the ticket.
    async fn post_comment(&self, key: &str, body: &str) -> TrackerResult<()>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_field_display_names() {
        assert_eq!(TicketField::SourceUrl.display_name(), "Repository URL");
        assert_eq!(TicketField::TargetName.display_name(), "New Repository Name");
        assert!(TicketField::AuthorizedUsers
            .display_name()
            .contains("Committers"));
    }

    #[test]
    fn test_ticket_blank_fields() {
        let ticket = Ticket::new("HOSTING-1")
            .with_field(TicketField::SourceUrl, "   ")
            .with_field(TicketField::TargetName, "my-plugin");

        assert!(ticket.is_blank(TicketField::SourceUrl));
        assert!(ticket.is_blank(TicketField::AuthorizedUsers));
        assert!(!ticket.is_blank(TicketField::TargetName));
        assert_eq!(ticket.field(TicketField::TargetName), Some("my-plugin"));
    }

    #[test]
    fn test_ticket_snapshot_round_trip() {
        let ticket = Ticket::new("HOSTING-2")
            .with_reporter("someone")
            .with_field(TicketField::SourceUrl, "https://github.com/a/b");

        let json = serde_json::to_string(&ticket).unwrap();
        let back: Ticket = serde_json::from_str(&json).unwrap();
        assert_eq!(back, ticket);
    }
}
