//! Live verification of the candidate repository and its committer list.
//!
//! Works on host data rather than the URL string alone. URL shape is
//! deliberately validated a second time here, after the silent `.git` and
//! `http` normalizations, so a malformed URL is caught even if the
//! ticket-field pass is skipped.

use std::sync::Arc;

use async_trait::async_trait;

use harbormaster_remote::{AccountKind, SourceHost, Ticket, TicketField};

use crate::checks::{Verifier, VerifyError};
use crate::config::HostingPolicy;
use crate::findings::Findings;
use crate::normalize::{normalize_source_url, normalize_user_list, parse_repo_url};

pub const URL_SHAPE_TEXT: &str =
    "'Repository URL' must be a GitHub repository of the form \
     https://github.com/<owner>/<repository>";

pub const MISSING_README_TEXT: &str = "the source repository does not contain a README";

pub const MISSING_LICENSE_TEXT: &str = "the source repository does not declare a license";

/// Checks the source repository as it exists on the host: reachability,
/// README and license presence, fork ancestry, duplicate forks in the
/// target organization, and that every authorized user is an individual
/// account.
pub struct SourceHostVerifier {
    host: Arc<dyn SourceHost>,
    policy: HostingPolicy,
}

impl SourceHostVerifier {
    pub fn new(host: Arc<dyn SourceHost>, policy: HostingPolicy) -> Self {
        Self { host, policy }
    }

    async fn check_users(
        &self,
        ticket: &Ticket,
        findings: &mut Findings,
    ) -> Result<(), VerifyError> {
        let Some(raw) = ticket.field(TicketField::AuthorizedUsers) else {
            return Ok(());
        };

        let mut rejected = Vec::new();
        for login in normalize_user_list(raw).split('\n').filter(|l| !l.is_empty()) {
            match self.host.resolve_user(login).await? {
                Some(account) if account.kind == AccountKind::User => {}
                // Organizations cannot be added as individual committers,
                // and unknown logins cannot be added at all.
                _ => rejected.push(login.to_string()),
            }
        }

        if !rejected.is_empty() {
            findings.require(format!(
                "the following 'GitHub Users to Authorize as Committers' entries do not \
                 resolve to individual GitHub user accounts: {}",
                rejected.join(", ")
            ));
        }
        Ok(())
    }

    async fn check_repository(
        &self,
        ticket: &Ticket,
        findings: &mut Findings,
    ) -> Result<(), VerifyError> {
        let Some(raw) = ticket.field(TicketField::SourceUrl) else {
            return Ok(());
        };
        if raw.trim().is_empty() {
            return Ok(());
        }

        let normalized = normalize_source_url(raw);
        let Some(wanted) = parse_repo_url(&normalized) else {
            findings.require(URL_SHAPE_TEXT);
            return Ok(());
        };

        let Some(repo) = self
            .host
            .resolve_repository(&wanted.owner, &wanted.name)
            .await?
        else {
            findings.require(format!(
                "the repository {} could not be found on GitHub",
                wanted.full_name()
            ));
            return Ok(());
        };

        if self.host.get_readme(&repo.owner, &repo.name).await?.is_none() {
            findings.require(MISSING_README_TEXT);
        }

        if repo.license.is_none() {
            findings.require(MISSING_LICENSE_TEXT);
        }

        if repo.fork {
            if let Some(parent) = &repo.parent {
                if parent.owner.eq_ignore_ascii_case(&self.policy.target_org) {
                    findings.require(format!(
                        "the source repository is a fork of {}; detach it from its parent \
                         before hosting",
                        parent.full_name()
                    ));
                }
            }
        }

        let org_forks: Vec<String> = self
            .host
            .list_forks(&repo.owner, &repo.name)
            .await?
            .into_iter()
            .filter(|fork| fork.owner.eq_ignore_ascii_case(&self.policy.target_org))
            .map(|fork| fork.full_name())
            .collect();
        if !org_forks.is_empty() {
            findings.require(format!(
                "the following forks of the source repository already exist in {}: {}",
                self.policy.target_org,
                org_forks.join(", ")
            ));
        }

        Ok(())
    }
}

#[async_trait]
impl Verifier for SourceHostVerifier {
    async fn verify(&self, ticket: &Ticket, findings: &mut Findings) -> Result<(), VerifyError> {
        self.check_users(ticket, findings).await?;
        self.check_repository(ticket, findings).await?;
        Ok(())
    }
}
