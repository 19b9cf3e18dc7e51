//! Checker traits and the registry entry type.
//!
//! A rule checker ("verifier") appends findings; a condition checker gates
//! whether a verifier runs at all. Both surface infrastructure failures as
//! `Err`, which the engine isolates per entry. Policy violations are never
//! errors.

use std::sync::Arc;

use async_trait::async_trait;

use harbormaster_remote::{ForgeError, SourceHost, Ticket, TicketField};

use crate::findings::Findings;
use crate::normalize::{normalize_source_url, parse_repo_url};

pub mod fields;
pub mod gradle;
pub mod maven;
pub mod source_host;

/// Infrastructure failures raised inside a checker. The engine reports
/// these as transcript lines, never as verification messages.
#[derive(Debug, thiserror::Error)]
pub enum VerifyError {
    #[error("source host error: {0}")]
    Forge(#[from] ForgeError),
}

/// Gate deciding whether a registry entry runs for this ticket.
#[async_trait]
pub trait ConditionChecker: Send + Sync {
    async fn applies(&self, ticket: &Ticket) -> Result<bool, VerifyError>;
}

/// One verification concern.
#[async_trait]
pub trait Verifier: Send + Sync {
    /// Inspect the ticket (and possibly the candidate repository) and
    /// append findings and corrections.
    async fn verify(&self, ticket: &Ticket, findings: &mut Findings) -> Result<(), VerifyError>;

    /// Whether this verifier represents a supported build system. Explicit
    /// capability flag; the engine never inspects concrete types.
    fn is_build_system(&self) -> bool {
        false
    }

    /// Whether the candidate repository carries this verifier's build
    /// descriptor. Only consulted for build-system verifiers, and only for
    /// coverage accounting.
    async fn has_build_file(&self, _ticket: &Ticket) -> Result<bool, VerifyError> {
        Ok(false)
    }
}

/// Fetch `path` from the ticket's source repository.
///
/// The URL is matched in its normalized form, the same form the corrections
/// will store, so a recoverable `.git`/`http` paste does not hide the
/// repository from the build-system probes. An off-pattern or missing
/// source URL is `Ok(None)`, not an error; the ticket-field verifier owns
/// reporting that.
pub(crate) async fn fetch_source_file(
    host: &dyn SourceHost,
    ticket: &Ticket,
    path: &str,
) -> Result<Option<harbormaster_remote::RepoFile>, VerifyError> {
    let Some(url) = ticket.field(TicketField::SourceUrl) else {
        return Ok(None);
    };
    let Some(repo) = parse_repo_url(&normalize_source_url(url)) else {
        return Ok(None);
    };
    Ok(host.get_file(&repo.owner, &repo.name, path).await?)
}

/// True only when `path` exists in the source repository as a regular file.
pub(crate) async fn source_file_is_regular(
    host: &dyn SourceHost,
    ticket: &Ticket,
    path: &str,
) -> Result<bool, VerifyError> {
    Ok(fetch_source_file(host, ticket, path)
        .await?
        .map_or(false, |file| file.is_file()))
}

/// Condition: the source repository contains `path` as a regular file.
pub struct FileExistsCondition {
    host: Arc<dyn SourceHost>,
    path: String,
}

impl FileExistsCondition {
    pub fn new(host: Arc<dyn SourceHost>, path: impl Into<String>) -> Self {
        Self {
            host,
            path: path.into(),
        }
    }
}

#[async_trait]
impl ConditionChecker for FileExistsCondition {
    async fn applies(&self, ticket: &Ticket) -> Result<bool, VerifyError> {
        source_file_is_regular(self.host.as_ref(), ticket, &self.path).await
    }
}

/// One registered checker: a name for transcripts, the verifier, and an
/// optional gate. Absent gate means "always run".
pub struct CheckerEntry {
    pub name: &'static str,
    pub verifier: Arc<dyn Verifier>,
    pub condition: Option<Arc<dyn ConditionChecker>>,
}

impl CheckerEntry {
    pub fn new(name: &'static str, verifier: Arc<dyn Verifier>) -> Self {
        Self {
            name,
            verifier,
            condition: None,
        }
    }

    pub fn gated(
        name: &'static str,
        verifier: Arc<dyn Verifier>,
        condition: Arc<dyn ConditionChecker>,
    ) -> Self {
        Self {
            name,
            verifier,
            condition: Some(condition),
        }
    }
}
