//! Ticket-field verification and silent normalization.
//!
//! Recoverable formatting mistakes (trailing `.git`, plain-http scheme,
//! camelCase names, comma-separated user lists) become corrections with no
//! message. Only genuinely missing or unfixable values become findings.

use async_trait::async_trait;

use harbormaster_remote::{Ticket, TicketField};

use crate::checks::{Verifier, VerifyError};
use crate::findings::Findings;
use crate::message::VerificationMessage;
use crate::normalize::{
    normalize_source_url, normalize_target_name, normalize_user_list, parse_repo_url,
};

/// The naming conventions listed under the empty-name finding.
pub const NAMING_RULES: [&str; 5] = [
    "match the artifactId (or shortName) declared in the build file",
    "end with \"-plugin\"",
    "be all lowercase",
    "not contain \"jenkins\" or \"hudson\"",
    "use hyphens between words instead of camelCase or spaces",
];

pub const EMPTY_NAME_TEXT: &str =
    "'New Repository Name' is empty; the new repository name must:";

pub const NAME_SUFFIX_TEXT: &str = "'New Repository Name' must end with \"-plugin\"";

pub const EMPTY_URL_TEXT: &str = "'Repository URL' must not be empty";

pub const INVALID_FORK_SOURCE_TEXT: &str =
    "'Repository URL' must be a forkable GitHub repository of the form \
     https://github.com/<owner>/<repository>";

pub const EMPTY_USERS_TEXT: &str =
    "'GitHub Users to Authorize as Committers' must list at least one GitHub user";

/// Validates and normalizes the three hosting-request fields. Pure; never
/// touches the network.
pub struct FieldVerifier;

impl FieldVerifier {
    fn check_users(&self, ticket: &Ticket, findings: &mut Findings) {
        if ticket.is_blank(TicketField::AuthorizedUsers) {
            findings.require(EMPTY_USERS_TEXT);
            return;
        }
        let raw = ticket.field(TicketField::AuthorizedUsers).unwrap_or("");
        let canonical = normalize_user_list(raw);
        if canonical != raw {
            findings.correct(TicketField::AuthorizedUsers, canonical);
        }
    }

    fn check_source_url(&self, ticket: &Ticket, findings: &mut Findings) {
        if ticket.is_blank(TicketField::SourceUrl) {
            findings.require(EMPTY_URL_TEXT);
            return;
        }
        let raw = ticket.field(TicketField::SourceUrl).unwrap_or("");
        let normalized = normalize_source_url(raw);

        // The `.git` form is what people paste when they mean "fork this";
        // make sure the stripped URL actually is forkable.
        if raw.trim().ends_with(".git") && parse_repo_url(&normalized).is_none() {
            findings.require(INVALID_FORK_SOURCE_TEXT);
        }

        if normalized != raw {
            findings.correct(TicketField::SourceUrl, normalized);
        }
    }

    fn check_target_name(&self, ticket: &Ticket, findings: &mut Findings) {
        if ticket.is_blank(TicketField::TargetName) {
            findings.push(VerificationMessage::required_with(
                EMPTY_NAME_TEXT,
                NAMING_RULES,
            ));
            return;
        }
        let raw = ticket.field(TicketField::TargetName).unwrap_or("");
        let normalized = normalize_target_name(raw);

        if !normalized.ends_with("-plugin") {
            findings.require(NAME_SUFFIX_TEXT);
        }

        if normalized != raw {
            findings.correct(TicketField::TargetName, normalized);
        }
    }
}

#[async_trait]
impl Verifier for FieldVerifier {
    async fn verify(&self, ticket: &Ticket, findings: &mut Findings) -> Result<(), VerifyError> {
        self.check_users(ticket, findings);
        self.check_source_url(ticket, findings);
        self.check_target_name(ticket, findings);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::message::Severity;

    fn well_formed_ticket() -> Ticket {
        Ticket::new("HOSTING-1")
            .with_reporter("alice")
            .with_field(TicketField::SourceUrl, "https://github.com/alice/demo-plugin")
            .with_field(TicketField::AuthorizedUsers, "alice\nbob")
            .with_field(TicketField::TargetName, "demo-plugin")
    }

    async fn run(ticket: &Ticket) -> Findings {
        let mut findings = Findings::new();
        FieldVerifier.verify(ticket, &mut findings).await.unwrap();
        findings
    }

    fn apply(ticket: &Ticket, findings: &Findings) -> Ticket {
        let mut corrected = ticket.clone();
        for correction in &findings.corrections {
            corrected
                .fields
                .insert(correction.field, correction.value.clone());
        }
        corrected
    }

    #[tokio::test]
    async fn well_formed_ticket_produces_nothing() {
        let findings = run(&well_formed_ticket()).await;
        assert!(findings.is_clean());
        assert!(findings.corrections.is_empty());
    }

    #[tokio::test]
    async fn git_suffix_is_corrected_without_a_message() {
        let ticket = well_formed_ticket().with_field(
            TicketField::SourceUrl,
            "https://github.com/alice/demo-plugin.git",
        );
        let findings = run(&ticket).await;

        assert!(findings.is_clean());
        assert_eq!(findings.corrections.len(), 1);
        assert_eq!(
            findings.corrections[0].value,
            "https://github.com/alice/demo-plugin"
        );
    }

    #[tokio::test]
    async fn git_suffix_off_pattern_raises_invalid_fork_source() {
        let ticket = well_formed_ticket()
            .with_field(TicketField::SourceUrl, "https://example.com/alice/demo.git");
        let findings = run(&ticket).await;

        assert!(findings
            .messages
            .iter()
            .any(|m| m.text == INVALID_FORK_SOURCE_TEXT));
        // The `.git` strip is still proposed even though the shape is bad.
        assert_eq!(findings.corrections.len(), 1);
    }

    #[tokio::test]
    async fn plain_http_scheme_is_upgraded() {
        let ticket = well_formed_ticket()
            .with_field(TicketField::SourceUrl, "http://github.com/alice/demo-plugin");
        let findings = run(&ticket).await;

        assert!(findings.is_clean());
        assert_eq!(
            findings.corrections[0].value,
            "https://github.com/alice/demo-plugin"
        );
    }

    #[tokio::test]
    async fn user_list_is_silently_canonicalized() {
        let ticket =
            well_formed_ticket().with_field(TicketField::AuthorizedUsers, "alice, bob; carol");
        let findings = run(&ticket).await;

        assert!(findings.is_clean());
        assert_eq!(findings.corrections[0].value, "alice\nbob\ncarol");
    }

    #[tokio::test]
    async fn camel_case_names_are_corrected() {
        for (raw, expected) in [
            ("TestPlugin", "test-plugin"),
            ("test-jenkins-plugin", "test-plugin"),
            ("jenkins-test-plugin", "test-plugin"),
            ("test-hudson-plugin", "test-plugin"),
            ("hudson-test-plugin", "test-plugin"),
        ] {
            let ticket = well_formed_ticket().with_field(TicketField::TargetName, raw);
            let findings = run(&ticket).await;

            assert!(findings.is_clean(), "unexpected finding for {raw:?}");
            assert_eq!(findings.corrections.len(), 1, "for {raw:?}");
            assert_eq!(findings.corrections[0].value, expected, "for {raw:?}");
        }
    }

    #[tokio::test]
    async fn name_without_plugin_suffix_raises_but_is_not_corrected() {
        let ticket = well_formed_ticket().with_field(TicketField::TargetName, "test");
        let findings = run(&ticket).await;

        let texts: Vec<&str> = findings.messages.iter().map(|m| m.text.as_str()).collect();
        assert_eq!(texts, vec![NAME_SUFFIX_TEXT]);
        assert!(texts[0].starts_with("'New Repository Name' must end with \"-plugin\""));
        assert!(findings.corrections.is_empty());
    }

    #[tokio::test]
    async fn blank_fields_raise_required_findings() {
        let ticket = Ticket::new("HOSTING-1").with_reporter("alice");
        let findings = run(&ticket).await;

        assert_eq!(findings.count_at(Severity::Required), 3);
        let name_finding = findings
            .messages
            .iter()
            .find(|m| m.text == EMPTY_NAME_TEXT)
            .unwrap();
        assert_eq!(name_finding.sub_items.len(), NAMING_RULES.len());
    }

    #[tokio::test]
    async fn normalization_reaches_a_fixed_point_after_one_pass() {
        let ticket = Ticket::new("HOSTING-1")
            .with_reporter("alice")
            .with_field(TicketField::SourceUrl, "http://github.com/alice/Demo.git")
            .with_field(TicketField::AuthorizedUsers, "alice, bob")
            .with_field(TicketField::TargetName, "JenkinsDemoPlugin");

        let first = run(&ticket).await;
        assert!(!first.corrections.is_empty());

        let corrected = apply(&ticket, &first);
        let second = run(&corrected).await;
        assert!(
            second.corrections.is_empty(),
            "second pass proposed {:?}",
            second.corrections
        );

        let third = run(&apply(&corrected, &second)).await;
        assert_eq!(second.messages, third.messages);
    }
}
