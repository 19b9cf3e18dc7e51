//! Source host boundary: repository lookups and mutations.
//!
//! [`SourceHost`] is the read side the verification engine depends on;
//! [`RepoForge`] is the write side behind the bot's repository chores
//! (create, fork, rename, authorize). Both are backend-agnostic async
//! traits; the GitHub implementation lives in [`crate::github`] and an
//! in-memory fake in [`crate::fakes`].

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::ForgeError;

/// Result type for forge operations.
pub type ForgeResult<T> = std::result::Result<T, ForgeError>;

/// An `owner/name` pair identifying a repository on the host.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct RepoRef {
    pub owner: String,
    pub name: String,
}

impl RepoRef {
    pub fn new(owner: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            owner: owner.into(),
            name: name.into(),
        }
    }

    /// Parse from `owner/name`. Returns `None` when either half is missing.
    pub fn parse(full_name: &str) -> Option<Self> {
        let (owner, name) = full_name.split_once('/')?;
        if owner.is_empty() || name.is_empty() {
            return None;
        }
        Some(Self::new(owner, name))
    }

    /// The `owner/name` form used throughout reports.
    pub fn full_name(&self) -> String {
        format!("{}/{}", self.owner, self.name)
    }
}

impl std::fmt::Display for RepoRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", self.owner, self.name)
    }
}

/// Repository metadata snapshot, resolved once per verification run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HostedRepo {
    pub owner: String,
    pub name: String,

    /// Whether the host marks this repository as a fork.
    pub fork: bool,

    /// The fork parent, when the host reports one.
    pub parent: Option<RepoRef>,

    /// License identifier the host detected, if any. Presence is what the
    /// engine checks; the exact identifier is informational.
    pub license: Option<String>,
}

impl HostedRepo {
    pub fn full_name(&self) -> String {
        format!("{}/{}", self.owner, self.name)
    }
}

/// Entry kinds a repository listing distinguishes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FileKind {
    File,
    Directory,
    /// Symlinks, submodules, and anything else that is not a plain file
    /// or directory.
    Other,
}

/// A file fetched from the source repository's default branch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RepoFile {
    pub path: String,
    pub kind: FileKind,
    /// Decoded text content for regular files; empty for anything else.
    pub content: String,
}

impl RepoFile {
    /// True only for regular files, the kind the build-system conditions
    /// accept.
    pub fn is_file(&self) -> bool {
        self.kind == FileKind::File
    }
}

/// Account kinds the host distinguishes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AccountKind {
    /// A normal individual account.
    User,
    /// An organization; not acceptable as an authorized committer.
    Organization,
}

/// A resolved account on the source host.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Account {
    pub login: String,
    pub kind: AccountKind,
}

/// Read access to the source host.
///
/// Guarantees:
/// - Lookups return `Ok(None)` for things that do not exist; `Err` is
///   reserved for infrastructure failures. Callers can therefore tell
///   "condition is false" apart from "could not evaluate the condition".
/// - `list_forks` is finite and single-pass: one bounded page, no cursoring.
/// - Every call is bounded by the implementation's configured timeout.
#[async_trait]
pub trait SourceHost: Send + Sync {
    /// Resolve repository metadata by owner and name.
    async fn resolve_repository(&self, owner: &str, name: &str)
        -> ForgeResult<Option<HostedRepo>>;

    /// Fetch one path from the repository's default branch.
    async fn get_file(&self, owner: &str, name: &str, path: &str)
        -> ForgeResult<Option<RepoFile>>;

    /// The repository's preferred readme content, if the host can render one.
    async fn get_readme(&self, owner: &str, name: &str) -> ForgeResult<Option<String>>;

    /// Direct forks of the repository. Finite, one pass.
    async fn list_forks(&self, owner: &str, name: &str) -> ForgeResult<Vec<RepoRef>>;

    /// Resolve an account login to its kind.
    async fn resolve_user(&self, login: &str) -> ForgeResult<Option<Account>>;
}

/// Write access to the source host: the repository chores the bot runs on
/// command. Kept separate from [`SourceHost`] so the verification engine can
/// be handed a read-only handle.
#[async_trait]
pub trait RepoForge: Send + Sync {
    /// Create an empty repository inside an organization.
    async fn create_repository(&self, org: &str, name: &str, description: &str)
        -> ForgeResult<RepoRef>;

    /// Fork `owner/name` into the given organization.
    async fn fork_repository(&self, owner: &str, name: &str, into_org: &str)
        -> ForgeResult<RepoRef>;

    /// Rename a repository within an organization.
    async fn rename_repository(&self, org: &str, from: &str, to: &str) -> ForgeResult<RepoRef>;

    /// Grant one account push access to a repository.
    async fn add_collaborator(&self, org: &str, repo: &str, user: &str) -> ForgeResult<()>;
}
