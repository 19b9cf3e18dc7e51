//! In-memory fakes for the tracker and source-host traits (testing only)
//!
//! Provides `InMemoryTracker` and `InMemoryForge` that satisfy the trait
//! contracts without any network access. Both support targeted failure
//! injection so callers can exercise their degraded paths.

use std::collections::{HashMap, HashSet};
use std::sync::Mutex;

use async_trait::async_trait;

use crate::error::{ForgeError, TrackerError};
use crate::forge::{
    Account, AccountKind, FileKind, ForgeResult, HostedRepo, RepoFile, RepoForge, RepoRef,
    SourceHost,
};
use crate::tracker::{FieldCorrection, Ticket, TicketSource, TrackerResult};

// ---------------------------------------------------------------------------
// InMemoryTracker
// ---------------------------------------------------------------------------

/// In-memory ticket tracker backed by a `HashMap<key, Ticket>`.
#[derive(Debug, Default)]
pub struct InMemoryTracker {
    tickets: Mutex<HashMap<String, Ticket>>,
    comments: Mutex<HashMap<String, Vec<String>>>,
    fail_updates: Mutex<bool>,
    fail_comments: Mutex<bool>,
}

impl InMemoryTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace a ticket.
    pub fn seed_ticket(&self, ticket: Ticket) {
        let mut tickets = self.tickets.lock().unwrap();
        tickets.insert(ticket.key.clone(), ticket);
    }

    /// Snapshot of a ticket as currently stored.
    pub fn ticket(&self, key: &str) -> Option<Ticket> {
        let tickets = self.tickets.lock().unwrap();
        tickets.get(key).cloned()
    }

    /// Comments posted to a ticket, oldest first.
    pub fn comments_for(&self, key: &str) -> Vec<String> {
        let comments = self.comments.lock().unwrap();
        comments.get(key).cloned().unwrap_or_default()
    }

    /// Make every subsequent `update_fields` call fail.
    pub fn set_fail_updates(&self, fail: bool) {
        *self.fail_updates.lock().unwrap() = fail;
    }

    /// Make every subsequent `post_comment` call fail.
    pub fn set_fail_comments(&self, fail: bool) {
        *self.fail_comments.lock().unwrap() = fail;
    }
}

#[async_trait]
impl TicketSource for InMemoryTracker {
    async fn get_ticket(&self, key: &str) -> TrackerResult<Option<Ticket>> {
        let tickets = self.tickets.lock().unwrap();
        Ok(tickets.get(key).cloned())
    }

    async fn update_fields(
        &self,
        key: &str,
        corrections: &[FieldCorrection],
    ) -> TrackerResult<()> {
        if *self.fail_updates.lock().unwrap() {
            return Err(TrackerError::Status {
                status: 500,
                body: "injected update failure".to_string(),
            });
        }
        let mut tickets = self.tickets.lock().unwrap();
        let ticket = tickets
            .get_mut(key)
            .ok_or_else(|| TrackerError::TicketNotFound(key.to_string()))?;
        // Later corrections win, same as the REST client's payload merge.
        for correction in corrections {
            ticket
                .fields
                .insert(correction.field, correction.value.clone());
        }
        Ok(())
    }

    async fn post_comment(&self, key: &str, body: &str) -> TrackerResult<()> {
        if *self.fail_comments.lock().unwrap() {
            return Err(TrackerError::Status {
                status: 500,
                body: "injected comment failure".to_string(),
            });
        }
        let tickets = self.tickets.lock().unwrap();
        if !tickets.contains_key(key) {
            return Err(TrackerError::TicketNotFound(key.to_string()));
        }
        let mut comments = self.comments.lock().unwrap();
        comments
            .entry(key.to_string())
            .or_default()
            .push(body.to_string());
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// InMemoryForge
// ---------------------------------------------------------------------------

/// A write the fake forge has accepted, in call order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ForgeMutation {
    Created {
        org: String,
        name: String,
    },
    Forked {
        owner: String,
        name: String,
        into_org: String,
    },
    Renamed {
        org: String,
        from: String,
        to: String,
    },
    CollaboratorAdded {
        org: String,
        repo: String,
        user: String,
    },
}

/// In-memory source host backed by `HashMap`s keyed on lowercased
/// `owner/name`, matching the real host's case-insensitive resolution.
#[derive(Debug, Default)]
pub struct InMemoryForge {
    repos: Mutex<HashMap<String, HostedRepo>>,
    files: Mutex<HashMap<(String, String), RepoFile>>,
    readmes: Mutex<HashMap<String, String>>,
    forks: Mutex<HashMap<String, Vec<RepoRef>>>,
    accounts: Mutex<HashMap<String, Account>>,
    broken_paths: Mutex<HashSet<(String, String)>>,
    mutations: Mutex<Vec<ForgeMutation>>,
}

fn repo_key(owner: &str, name: &str) -> String {
    format!("{}/{}", owner, name).to_lowercase()
}

impl InMemoryForge {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace a repository.
    pub fn seed_repo(&self, repo: HostedRepo) {
        let key = repo_key(&repo.owner, &repo.name);
        let mut repos = self.repos.lock().unwrap();
        repos.insert(key, repo);
    }

    /// Insert a plain file at `path` in the repository's default branch.
    pub fn seed_file(&self, owner: &str, name: &str, path: &str, content: &str) {
        let mut files = self.files.lock().unwrap();
        files.insert(
            (repo_key(owner, name), path.to_string()),
            RepoFile {
                path: path.to_string(),
                kind: FileKind::File,
                content: content.to_string(),
            },
        );
    }

    /// Insert a directory entry at `path`.
    pub fn seed_directory(&self, owner: &str, name: &str, path: &str) {
        let mut files = self.files.lock().unwrap();
        files.insert(
            (repo_key(owner, name), path.to_string()),
            RepoFile {
                path: path.to_string(),
                kind: FileKind::Directory,
                content: String::new(),
            },
        );
    }

    /// Set the rendered readme for a repository.
    pub fn seed_readme(&self, owner: &str, name: &str, content: &str) {
        let mut readmes = self.readmes.lock().unwrap();
        readmes.insert(repo_key(owner, name), content.to_string());
    }

    /// Register `fork` as a direct fork of `owner/name`.
    pub fn seed_fork(&self, owner: &str, name: &str, fork: RepoRef) {
        let mut forks = self.forks.lock().unwrap();
        forks.entry(repo_key(owner, name)).or_default().push(fork);
    }

    /// Register an individual account.
    pub fn seed_user(&self, login: &str) {
        self.seed_account(Account {
            login: login.to_string(),
            kind: AccountKind::User,
        });
    }

    /// Register an organization account.
    pub fn seed_org(&self, login: &str) {
        self.seed_account(Account {
            login: login.to_string(),
            kind: AccountKind::Organization,
        });
    }

    pub fn seed_account(&self, account: Account) {
        let mut accounts = self.accounts.lock().unwrap();
        accounts.insert(account.login.to_lowercase(), account);
    }

    /// Make `get_file` for this path return an error instead of a result.
    pub fn break_path(&self, owner: &str, name: &str, path: &str) {
        let mut broken = self.broken_paths.lock().unwrap();
        broken.insert((repo_key(owner, name), path.to_string()));
    }

    /// Every accepted write, in call order.
    pub fn mutations(&self) -> Vec<ForgeMutation> {
        self.mutations.lock().unwrap().clone()
    }
}

#[async_trait]
impl SourceHost for InMemoryForge {
    async fn resolve_repository(
        &self,
        owner: &str,
        name: &str,
    ) -> ForgeResult<Option<HostedRepo>> {
        let repos = self.repos.lock().unwrap();
        Ok(repos.get(&repo_key(owner, name)).cloned())
    }

    async fn get_file(&self, owner: &str, name: &str, path: &str) -> ForgeResult<Option<RepoFile>> {
        let key = (repo_key(owner, name), path.to_string());
        if self.broken_paths.lock().unwrap().contains(&key) {
            return Err(ForgeError::Status {
                status: 500,
                body: format!("injected failure for {path}"),
            });
        }
        let files = self.files.lock().unwrap();
        Ok(files.get(&key).cloned())
    }

    async fn get_readme(&self, owner: &str, name: &str) -> ForgeResult<Option<String>> {
        let readmes = self.readmes.lock().unwrap();
        Ok(readmes.get(&repo_key(owner, name)).cloned())
    }

    async fn list_forks(&self, owner: &str, name: &str) -> ForgeResult<Vec<RepoRef>> {
        let forks = self.forks.lock().unwrap();
        Ok(forks.get(&repo_key(owner, name)).cloned().unwrap_or_default())
    }

    async fn resolve_user(&self, login: &str) -> ForgeResult<Option<Account>> {
        let accounts = self.accounts.lock().unwrap();
        Ok(accounts.get(&login.to_lowercase()).cloned())
    }
}

#[async_trait]
impl RepoForge for InMemoryForge {
    async fn create_repository(
        &self,
        org: &str,
        name: &str,
        _description: &str,
    ) -> ForgeResult<RepoRef> {
        self.seed_repo(HostedRepo {
            owner: org.to_string(),
            name: name.to_string(),
            fork: false,
            parent: None,
            license: None,
        });
        self.mutations.lock().unwrap().push(ForgeMutation::Created {
            org: org.to_string(),
            name: name.to_string(),
        });
        Ok(RepoRef::new(org, name))
    }

    async fn fork_repository(&self, owner: &str, name: &str, into_org: &str) -> ForgeResult<RepoRef> {
        self.seed_repo(HostedRepo {
            owner: into_org.to_string(),
            name: name.to_string(),
            fork: true,
            parent: Some(RepoRef::new(owner, name)),
            license: None,
        });
        self.mutations.lock().unwrap().push(ForgeMutation::Forked {
            owner: owner.to_string(),
            name: name.to_string(),
            into_org: into_org.to_string(),
        });
        Ok(RepoRef::new(into_org, name))
    }

    async fn rename_repository(&self, org: &str, from: &str, to: &str) -> ForgeResult<RepoRef> {
        {
            let mut repos = self.repos.lock().unwrap();
            if let Some(mut repo) = repos.remove(&repo_key(org, from)) {
                repo.name = to.to_string();
                repos.insert(repo_key(org, to), repo);
            }
        }
        self.mutations.lock().unwrap().push(ForgeMutation::Renamed {
            org: org.to_string(),
            from: from.to_string(),
            to: to.to_string(),
        });
        Ok(RepoRef::new(org, to))
    }

    async fn add_collaborator(&self, org: &str, repo: &str, user: &str) -> ForgeResult<()> {
        self.mutations
            .lock()
            .unwrap()
            .push(ForgeMutation::CollaboratorAdded {
                org: org.to_string(),
                repo: repo.to_string(),
                user: user.to_string(),
            });
        Ok(())
    }
}
