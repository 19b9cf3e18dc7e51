//! Severity-ranked verification messages.
//!
//! Findings are collected into a `BTreeSet`, so deduplication and render
//! order are properties of the container: structurally equal messages
//! collapse to one entry, and iteration yields severity descending with
//! message text ascending as the tie-break.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

/// Ranking of a finding. Declaration order gives `Required` the highest rank.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    /// Informational only.
    Info,
    /// Should be fixed before hosting, not blocking.
    Warning,
    /// Must be fixed before the request can be approved.
    Required,
}

impl Severity {
    /// Upper-case label used in rendered reports.
    pub fn label(&self) -> &'static str {
        match self {
            Severity::Info => "INFO",
            Severity::Warning => "WARNING",
            Severity::Required => "REQUIRED",
        }
    }
}

/// One finding, optionally carrying nested sub-entries.
///
/// Equality is structural over all three fields, which is what makes the
/// set-based dedup contract hold.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VerificationMessage {
    pub severity: Severity,
    pub text: String,
    /// Nested entries, rendered one marker level deeper.
    #[serde(default, skip_serializing_if = "BTreeSet::is_empty")]
    pub sub_items: BTreeSet<VerificationMessage>,
}

impl VerificationMessage {
    pub fn new(severity: Severity, text: impl Into<String>) -> Self {
        Self {
            severity,
            text: text.into(),
            sub_items: BTreeSet::new(),
        }
    }

    pub fn required(text: impl Into<String>) -> Self {
        Self::new(Severity::Required, text)
    }

    pub fn warning(text: impl Into<String>) -> Self {
        Self::new(Severity::Warning, text)
    }

    pub fn info(text: impl Into<String>) -> Self {
        Self::new(Severity::Info, text)
    }

    /// A `Required` message with one level of nested sub-entries.
    pub fn required_with<I, S>(text: impl Into<String>, sub_texts: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut message = Self::required(text);
        message.sub_items = sub_texts
            .into_iter()
            .map(|t| VerificationMessage::required(t))
            .collect();
        message
    }
}

impl Ord for VerificationMessage {
    /// Severity descending, then text ascending, then sub-items.
    ///
    /// The final sub-item comparison exists only to keep the order total and
    /// consistent with structural equality.
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        other
            .severity
            .cmp(&self.severity)
            .then_with(|| self.text.cmp(&other.text))
            .then_with(|| self.sub_items.cmp(&other.sub_items))
    }
}

impl PartialOrd for VerificationMessage {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_severity_ranking() {
        assert!(Severity::Required > Severity::Warning);
        assert!(Severity::Warning > Severity::Info);
    }

    #[test]
    fn test_structurally_equal_messages_dedup_in_set() {
        let mut set = BTreeSet::new();
        set.insert(VerificationMessage::required("missing readme"));
        set.insert(VerificationMessage::required("missing readme"));

        assert_eq!(set.len(), 1);
    }

    #[test]
    fn test_set_iteration_orders_severity_desc_then_text_asc() {
        let mut set = BTreeSet::new();
        set.insert(VerificationMessage::warning("only a warning"));
        set.insert(VerificationMessage::required("zeta problem"));
        set.insert(VerificationMessage::required("alpha problem"));

        let texts: Vec<&str> = set.iter().map(|m| m.text.as_str()).collect();
        assert_eq!(texts, vec!["alpha problem", "zeta problem", "only a warning"]);
    }

    #[test]
    fn test_messages_differing_only_in_sub_items_are_distinct() {
        let plain = VerificationMessage::required("fix the name");
        let nested = VerificationMessage::required_with("fix the name", ["use hyphens"]);

        let mut set = BTreeSet::new();
        set.insert(plain);
        set.insert(nested);
        assert_eq!(set.len(), 2);
    }

    #[test]
    fn test_required_with_builds_one_nesting_level() {
        let message =
            VerificationMessage::required_with("naming rules", ["rule b", "rule a"]);

        assert_eq!(message.severity, Severity::Required);
        let subs: Vec<&str> = message.sub_items.iter().map(|m| m.text.as_str()).collect();
        assert_eq!(subs, vec!["rule a", "rule b"]);
    }
}
