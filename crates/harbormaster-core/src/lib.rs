//! Harbormaster-Core: Hosting-Request Verification Engine
//!
//! This crate verifies plugin hosting requests before a repository is
//! imported into the target organization. It reads a ticket snapshot from
//! the tracker, runs a fixed registry of checkers against the ticket and
//! the candidate source repository, and publishes a severity-sorted report
//! plus any field corrections back to the ticket.
//!
//! ## Key Components
//!
//! - `VerificationEngine`: one-pass orchestrator over the checker registry
//! - `Verifier` / `ConditionChecker`: the checker seams, implemented by the
//!   ticket-field, source-host, Maven, and Gradle checkers
//! - `VerificationMessage` / `Findings`: deduplicated, render-ordered
//!   finding model shared by every checker
//! - `render_report`: wiki and ANSI renderings of one run's findings

pub mod checks;
pub mod config;
pub mod engine;
pub mod findings;
pub mod message;
pub mod normalize;
pub mod obs;
pub mod report;
pub mod telemetry;
pub mod version;

pub use checks::fields::FieldVerifier;
pub use checks::gradle::{GradleVerifier, GRADLE_PATH};
pub use checks::maven::{MavenVerifier, POM_PATH};
pub use checks::source_host::SourceHostVerifier;
pub use checks::{CheckerEntry, ConditionChecker, FileExistsCondition, Verifier, VerifyError};
pub use config::HostingPolicy;
pub use engine::{
    CheckerFailure, EngineError, PublishStatus, VerificationEngine, VerificationRun,
    NO_BUILD_SYSTEM_TEXT,
};
pub use findings::Findings;
pub use message::{Severity, VerificationMessage};
pub use normalize::{
    normalize_source_url, normalize_target_name, normalize_user_list, parse_repo_url,
};
pub use report::{render_report, Palette};
pub use telemetry::{init_tracing, level_for_verbosity};
pub use version::{Version, VersionError};

pub use harbormaster_remote::{
    FieldCorrection, RepoRef, SourceHost, Ticket, TicketField, TicketSource,
};
