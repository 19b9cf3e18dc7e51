//! Harbormaster-Remote: tracker and source-host boundary
//!
//! This crate owns every network call the hosting bot makes. It defines the
//! trait seams the verification engine consumes and ships one REST
//! implementation of each, plus in-memory fakes for tests.
//!
//! ## Key Components
//!
//! - `TicketSource`: read/correct/comment access to the hosting tracker
//! - `SourceHost` / `RepoForge`: read and write access to the code host
//! - `JiraTracker` / `GithubClient`: the REST implementations
//! - `fakes`: in-memory stand-ins satisfying the same contracts

mod error;
pub mod fakes;
pub mod forge;
mod github;
mod jira;
pub mod tracker;

pub use error::{ForgeError, TrackerError};
pub use forge::{
    Account, AccountKind, FileKind, ForgeResult, HostedRepo, RepoFile, RepoForge, RepoRef,
    SourceHost,
};
pub use github::{ForgeConfig, GithubClient, DEFAULT_API_URL};
pub use jira::{FieldMap, JiraTracker, TrackerConfig, DEFAULT_TRACKER_URL};
pub use tracker::{FieldCorrection, Ticket, TicketField, TicketSource, TrackerResult};
