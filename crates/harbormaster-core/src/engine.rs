//! Verification orchestrator.
//!
//! One [`VerificationEngine::run`] call is one complete pass over a hosting
//! request: fetch the ticket, dispatch every registered checker in
//! declaration order, account for build-system coverage, render the report,
//! and publish it back to the tracker. Checker failures are isolated per
//! entry; only ticket fetch problems abort the run.

use std::collections::BTreeSet;
use std::sync::Arc;
use std::time::Instant;

use serde::{Deserialize, Serialize};
use tracing::debug;
use uuid::Uuid;

use harbormaster_remote::{FieldCorrection, SourceHost, TicketSource, TrackerError};

use crate::checks::fields::FieldVerifier;
use crate::checks::gradle::{GradleVerifier, GRADLE_PATH};
use crate::checks::maven::{MavenVerifier, POM_PATH};
use crate::checks::source_host::SourceHostVerifier;
use crate::checks::{CheckerEntry, FileExistsCondition, VerifyError};
use crate::config::HostingPolicy;
use crate::findings::Findings;
use crate::message::{Severity, VerificationMessage};
use crate::obs::{
    emit_checker_failed, emit_corrections_applied, emit_dry_run_report, emit_publish_failed,
    emit_run_finished, emit_run_started, RunSpan,
};
use crate::report::{render_report, Palette};

/// Coverage warning appended when no build-system verifier reported a
/// build descriptor in the candidate repository.
pub const NO_BUILD_SYSTEM_TEXT: &str =
    "no build system found in the source repository; add a pom.xml or a build.gradle \
     so releases can be built";

/// Fatal conditions that abort a verification run before any report exists.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    /// The tracker has no ticket under the requested key.
    #[error("ticket {0} was not found in the tracker")]
    TicketNotFound(String),

    /// The ticket resolved but carries no reporter identity, so the report
    /// has nobody to address.
    #[error("ticket {0} has no reporter identity")]
    ReporterMissing(String),

    /// The tracker could not be reached at all.
    #[error(transparent)]
    Tracker(#[from] TrackerError),
}

/// One isolated checker failure, reported as a transcript line rather than
/// a verification message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckerFailure {
    /// Registry name of the checker that failed.
    pub checker: String,
    /// Human-readable failure description.
    pub error: String,
}

/// What happened to the rendered report at the end of the run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PublishStatus {
    /// Comment posted (and corrections applied, when any were proposed).
    Posted,
    /// Dry-run policy: report logged, no tracker writes.
    DryRun,
    /// Posting or correcting failed; the rendered report is still in the
    /// run record.
    Failed { reason: String },
}

/// Complete record of one verification run.
#[derive(Debug, Clone, Serialize)]
pub struct VerificationRun {
    /// Unique id for this run, present on every log event it emitted.
    pub run_id: String,

    /// Ticket the run verified.
    pub ticket_key: String,

    /// Account the report is addressed to.
    pub reporter: String,

    /// Deduplicated findings in render order.
    pub messages: BTreeSet<VerificationMessage>,

    /// Field corrections the checkers proposed, in registration order.
    pub corrections: Vec<FieldCorrection>,

    /// Checkers that failed with infrastructure errors and were skipped.
    pub failures: Vec<CheckerFailure>,

    /// Whether any build-system verifier found its descriptor.
    pub build_system_found: bool,

    /// The rendered report, in tracker wiki markup, exactly as published.
    pub report: String,

    /// Outcome of the publish step.
    pub publish: PublishStatus,

    /// Wall-clock duration of the whole run.
    pub duration_ms: u64,
}

impl VerificationRun {
    /// True when at least one finding blocks approval.
    pub fn has_blockers(&self) -> bool {
        self.messages
            .iter()
            .any(|m| m.severity == Severity::Required)
    }
}

fn record_failure(
    run_id: &str,
    failures: &mut Vec<CheckerFailure>,
    checker: &str,
    error: &VerifyError,
) {
    emit_checker_failed(run_id, checker, error);
    failures.push(CheckerFailure {
        checker: checker.to_string(),
        error: error.to_string(),
    });
}

/// The verification orchestrator.
///
/// Holds the checker registry and the tracker handle; the source-host
/// handle lives inside the checkers that need it. Construct once and reuse
/// across runs.
pub struct VerificationEngine {
    tracker: Arc<dyn TicketSource>,
    policy: HostingPolicy,
    registry: Vec<CheckerEntry>,
}

impl VerificationEngine {
    /// Build the engine with the standard checker registry: ticket fields,
    /// source repository, then one gated entry per supported build system.
    pub fn new(
        tracker: Arc<dyn TicketSource>,
        host: Arc<dyn SourceHost>,
        policy: HostingPolicy,
    ) -> Self {
        let registry = vec![
            CheckerEntry::new("ticket fields", Arc::new(FieldVerifier)),
            CheckerEntry::new(
                "source repository",
                Arc::new(SourceHostVerifier::new(host.clone(), policy.clone())),
            ),
            CheckerEntry::gated(
                "maven build descriptor",
                Arc::new(MavenVerifier::new(host.clone(), policy.clone())),
                Arc::new(FileExistsCondition::new(host.clone(), POM_PATH)),
            ),
            CheckerEntry::gated(
                "gradle build descriptor",
                Arc::new(GradleVerifier::new(host.clone(), policy.clone())),
                Arc::new(FileExistsCondition::new(host, GRADLE_PATH)),
            ),
        ];
        Self::with_registry(tracker, policy, registry)
    }

    /// Build the engine with an explicit registry. Entries dispatch in the
    /// order given.
    pub fn with_registry(
        tracker: Arc<dyn TicketSource>,
        policy: HostingPolicy,
        registry: Vec<CheckerEntry>,
    ) -> Self {
        Self {
            tracker,
            policy,
            registry,
        }
    }

    /// Run one complete verification pass for `ticket_key`.
    ///
    /// Returns `Err` only for the fatal cases: unknown ticket, missing
    /// reporter, or an unreachable tracker during fetch. Everything after
    /// the fetch, including publish failures, lands inside the returned
    /// [`VerificationRun`].
    pub async fn run(&self, ticket_key: &str) -> Result<VerificationRun, EngineError> {
        let run_id = Uuid::new_v4().to_string();
        let started = Instant::now();
        let _span = RunSpan::enter(&run_id, ticket_key);
        emit_run_started(&run_id, ticket_key);

        let ticket = self
            .tracker
            .get_ticket(ticket_key)
            .await?
            .ok_or_else(|| EngineError::TicketNotFound(ticket_key.to_string()))?;
        let reporter = ticket
            .reporter
            .clone()
            .filter(|name| !name.trim().is_empty())
            .ok_or_else(|| EngineError::ReporterMissing(ticket_key.to_string()))?;

        let mut findings = Findings::new();
        let mut failures = Vec::new();
        let mut build_system_found = false;

        for entry in &self.registry {
            // Coverage accounting happens for every build-system verifier,
            // whether or not its condition lets it run. The probe and the
            // condition hit the same file, so a probe failure skips the
            // whole entry rather than reporting the same outage twice.
            if entry.verifier.is_build_system() {
                match entry.verifier.has_build_file(&ticket).await {
                    Ok(found) => build_system_found |= found,
                    Err(err) => {
                        record_failure(&run_id, &mut failures, entry.name, &err);
                        continue;
                    }
                }
            }

            if let Some(condition) = &entry.condition {
                match condition.applies(&ticket).await {
                    Ok(true) => {}
                    Ok(false) => {
                        debug!(run_id = %run_id, checker = entry.name, "condition not met; skipping");
                        continue;
                    }
                    Err(err) => {
                        record_failure(&run_id, &mut failures, entry.name, &err);
                        continue;
                    }
                }
            }

            if let Err(err) = entry.verifier.verify(&ticket, &mut findings).await {
                record_failure(&run_id, &mut failures, entry.name, &err);
            }
        }

        if !build_system_found {
            findings.warn(NO_BUILD_SYSTEM_TEXT);
        }

        let report = render_report(&findings.messages, &reporter, Palette::Wiki);
        let publish = self.publish(&run_id, ticket_key, &findings, &report).await;

        let duration_ms = started.elapsed().as_millis() as u64;
        emit_run_finished(
            &run_id,
            duration_ms,
            findings.messages.len(),
            findings.count_at(Severity::Required),
            matches!(publish, PublishStatus::Posted),
        );

        Ok(VerificationRun {
            run_id,
            ticket_key: ticket_key.to_string(),
            reporter,
            messages: findings.messages,
            corrections: findings.corrections,
            failures,
            build_system_found,
            report,
            publish,
            duration_ms,
        })
    }

    /// Publish the rendered report according to policy.
    ///
    /// The comment is posted before corrections are applied; when the
    /// comment fails, corrections are withheld so the ticket never changes
    /// without the explanatory report beside it.
    async fn publish(
        &self,
        run_id: &str,
        ticket_key: &str,
        findings: &Findings,
        report: &str,
    ) -> PublishStatus {
        if self.policy.dry_run {
            emit_dry_run_report(run_id, report);
            return PublishStatus::DryRun;
        }

        if let Err(err) = self.tracker.post_comment(ticket_key, report).await {
            emit_publish_failed(run_id, ticket_key, &err);
            return PublishStatus::Failed {
                reason: format!("posting the report comment failed: {err}"),
            };
        }

        if !findings.corrections.is_empty() {
            if let Err(err) = self
                .tracker
                .update_fields(ticket_key, &findings.corrections)
                .await
            {
                emit_publish_failed(run_id, ticket_key, &err);
                return PublishStatus::Failed {
                    reason: format!(
                        "applying {} field corrections failed: {err}",
                        findings.corrections.len()
                    ),
                };
            }
            emit_corrections_applied(run_id, ticket_key, findings.corrections.len());
        }

        PublishStatus::Posted
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use harbormaster_remote::fakes::InMemoryTracker;
    use harbormaster_remote::{Ticket, TicketField};

    struct AlwaysWarn;

    #[async_trait]
    impl crate::checks::Verifier for AlwaysWarn {
        async fn verify(
            &self,
            _ticket: &Ticket,
            findings: &mut Findings,
        ) -> Result<(), VerifyError> {
            findings.warn("synthetic warning");
            Ok(())
        }
    }

    fn seeded_tracker() -> Arc<InMemoryTracker> {
        let tracker = Arc::new(InMemoryTracker::new());
        tracker.seed_ticket(
            Ticket::new("HOSTING-1")
                .with_reporter("alice")
                .with_field(TicketField::SourceUrl, "https://github.com/alice/demo-plugin")
                .with_field(TicketField::AuthorizedUsers, "alice")
                .with_field(TicketField::TargetName, "demo-plugin"),
        );
        tracker
    }

    #[tokio::test]
    async fn unknown_ticket_is_fatal() {
        let tracker = Arc::new(InMemoryTracker::new());
        let engine = VerificationEngine::with_registry(
            tracker,
            HostingPolicy::default(),
            Vec::new(),
        );

        let err = engine.run("HOSTING-404").await.unwrap_err();
        assert!(matches!(err, EngineError::TicketNotFound(key) if key == "HOSTING-404"));
    }

    #[tokio::test]
    async fn missing_reporter_is_fatal() {
        let tracker = Arc::new(InMemoryTracker::new());
        tracker.seed_ticket(Ticket::new("HOSTING-2"));
        let engine = VerificationEngine::with_registry(
            tracker,
            HostingPolicy::default(),
            Vec::new(),
        );

        let err = engine.run("HOSTING-2").await.unwrap_err();
        assert!(matches!(err, EngineError::ReporterMissing(key) if key == "HOSTING-2"));
    }

    #[tokio::test]
    async fn empty_registry_still_reports_missing_build_system() {
        let tracker = seeded_tracker();
        let engine = VerificationEngine::with_registry(
            tracker.clone(),
            HostingPolicy::default(),
            Vec::new(),
        );

        let run = engine.run("HOSTING-1").await.unwrap();
        assert!(!run.build_system_found);
        assert_eq!(run.messages.len(), 1);
        let only = run.messages.iter().next().unwrap();
        assert!(only.text.starts_with("no build system found"));
        assert_eq!(only.severity, Severity::Warning);
        assert_eq!(run.publish, PublishStatus::Posted);
        assert_eq!(tracker.comments_for("HOSTING-1").len(), 1);
    }

    #[tokio::test]
    async fn custom_registry_entries_dispatch_in_order() {
        let tracker = seeded_tracker();
        let engine = VerificationEngine::with_registry(
            tracker,
            HostingPolicy::default().with_dry_run(true),
            vec![CheckerEntry::new("synthetic", Arc::new(AlwaysWarn))],
        );

        let run = engine.run("HOSTING-1").await.unwrap();
        assert!(run
            .messages
            .iter()
            .any(|m| m.text == "synthetic warning"));
        assert_eq!(run.publish, PublishStatus::DryRun);
    }

    #[tokio::test]
    async fn blocker_detection_tracks_required_severity() {
        let tracker = seeded_tracker();
        let engine = VerificationEngine::with_registry(
            tracker,
            HostingPolicy::default().with_dry_run(true),
            Vec::new(),
        );

        let run = engine.run("HOSTING-1").await.unwrap();
        // The coverage warning alone does not block approval.
        assert!(!run.has_blockers());
    }
}
