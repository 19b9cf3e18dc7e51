//! End-to-end verification runs over the in-memory fakes.
//!
//! Each test drives the full engine: fetch, dispatch, coverage accounting,
//! rendering, and publish. The fakes stand in for the tracker and the
//! source host; everything else is the production wiring.

use std::sync::Arc;

use harbormaster_core::checks::source_host::{MISSING_LICENSE_TEXT, MISSING_README_TEXT};
use harbormaster_core::{
    EngineError, HostingPolicy, PublishStatus, Severity, VerificationEngine, NO_BUILD_SYSTEM_TEXT,
};
use harbormaster_remote::fakes::{InMemoryForge, InMemoryTracker};
use harbormaster_remote::{HostedRepo, RepoRef, Ticket, TicketField};

const DEMO_POM: &str = r#"<project>
  <parent>
    <groupId>org.jenkins-ci.plugins</groupId>
    <artifactId>plugin</artifactId>
  </parent>
  <groupId>io.jenkins.plugins</groupId>
  <artifactId>demo</artifactId>
  <properties>
    <jenkins.version>2.414.3</jenkins.version>
  </properties>
  <repositories>
    <repository>
      <url>https://repo.jenkins-ci.org/public/</url>
    </repository>
  </repositories>
</project>
"#;

fn licensed_repo(owner: &str, name: &str) -> HostedRepo {
    HostedRepo {
        owner: owner.to_string(),
        name: name.to_string(),
        fork: false,
        parent: None,
        license: Some("Apache License 2.0".to_string()),
    }
}

/// A request that should sail through with no findings and no corrections.
fn healthy_ticket() -> Ticket {
    Ticket::new("HOSTING-100")
        .with_reporter("alice")
        .with_field(TicketField::SourceUrl, "https://github.com/alice/demo-plugin")
        .with_field(TicketField::AuthorizedUsers, "alice")
        .with_field(TicketField::TargetName, "demo-plugin")
}

/// Seed the forge so `healthy_ticket` verifies cleanly.
fn seed_healthy_candidate(forge: &InMemoryForge) {
    forge.seed_repo(licensed_repo("alice", "demo-plugin"));
    forge.seed_readme("alice", "demo-plugin", "# Demo");
    forge.seed_user("alice");
    forge.seed_file("alice", "demo-plugin", "pom.xml", DEMO_POM);
}

fn engine(
    tracker: &Arc<InMemoryTracker>,
    forge: &Arc<InMemoryForge>,
    policy: HostingPolicy,
) -> VerificationEngine {
    VerificationEngine::new(tracker.clone(), forge.clone(), policy)
}

// ===========================================================================
// Clean runs
// ===========================================================================

#[tokio::test]
async fn clean_request_posts_the_all_clear() {
    let tracker = Arc::new(InMemoryTracker::new());
    tracker.seed_ticket(healthy_ticket());
    let forge = Arc::new(InMemoryForge::new());
    seed_healthy_candidate(&forge);

    let run = engine(&tracker, &forge, HostingPolicy::default())
        .run("HOSTING-100")
        .await
        .unwrap();

    assert!(run.messages.is_empty(), "unexpected: {:?}", run.messages);
    assert!(run.corrections.is_empty());
    assert!(run.failures.is_empty());
    assert!(run.build_system_found);
    assert!(!run.has_blockers());
    assert_eq!(run.publish, PublishStatus::Posted);
    assert!(run
        .report
        .contains("[~alice] everything is in order"));

    let comments = tracker.comments_for("HOSTING-100");
    assert_eq!(comments.len(), 1);
    assert_eq!(comments[0], run.report);
}

#[tokio::test]
async fn unknown_ticket_aborts_without_side_effects() {
    let tracker = Arc::new(InMemoryTracker::new());
    let forge = Arc::new(InMemoryForge::new());

    let err = engine(&tracker, &forge, HostingPolicy::default())
        .run("HOSTING-404")
        .await
        .unwrap_err();

    assert!(matches!(err, EngineError::TicketNotFound(_)));
    assert!(tracker.comments_for("HOSTING-404").is_empty());
}

// ===========================================================================
// Findings flow through to the posted report
// ===========================================================================

#[tokio::test]
async fn missing_readme_and_license_surface_through_the_full_run() {
    let tracker = Arc::new(InMemoryTracker::new());
    tracker.seed_ticket(healthy_ticket());
    let forge = Arc::new(InMemoryForge::new());
    let mut bare = licensed_repo("alice", "demo-plugin");
    bare.license = None;
    forge.seed_repo(bare);
    forge.seed_user("alice");
    forge.seed_file("alice", "demo-plugin", "pom.xml", DEMO_POM);

    let run = engine(&tracker, &forge, HostingPolicy::default())
        .run("HOSTING-100")
        .await
        .unwrap();

    assert_eq!(
        run.messages
            .iter()
            .filter(|m| m.severity == Severity::Required)
            .count(),
        2
    );
    assert!(run.has_blockers());
    assert!(run.report.contains(&format!(
        "* {{color:red}}REQUIRED: {MISSING_README_TEXT}{{color}}"
    )));
    assert!(run.report.contains(&format!(
        "* {{color:red}}REQUIRED: {MISSING_LICENSE_TEXT}{{color}}"
    )));
    assert!(run
        .report
        .starts_with("Hello, this is an automated review"));
}

#[tokio::test]
async fn duplicate_org_fork_is_named_in_the_report() {
    let tracker = Arc::new(InMemoryTracker::new());
    tracker.seed_ticket(healthy_ticket());
    let forge = Arc::new(InMemoryForge::new());
    seed_healthy_candidate(&forge);
    forge.seed_fork(
        "alice",
        "demo-plugin",
        RepoRef::new("jenkinsci", "demo-plugin"),
    );

    let run = engine(&tracker, &forge, HostingPolicy::default())
        .run("HOSTING-100")
        .await
        .unwrap();

    assert_eq!(run.messages.len(), 1);
    let finding = run.messages.iter().next().unwrap();
    assert_eq!(finding.severity, Severity::Required);
    assert!(finding.text.contains("jenkinsci/demo-plugin"));
}

#[tokio::test]
async fn coverage_warning_fires_exactly_once_without_build_descriptors() {
    let tracker = Arc::new(InMemoryTracker::new());
    tracker.seed_ticket(healthy_ticket());
    let forge = Arc::new(InMemoryForge::new());
    forge.seed_repo(licensed_repo("alice", "demo-plugin"));
    forge.seed_readme("alice", "demo-plugin", "# Demo");
    forge.seed_user("alice");

    let run = engine(&tracker, &forge, HostingPolicy::default())
        .run("HOSTING-100")
        .await
        .unwrap();

    assert!(!run.build_system_found);
    assert_eq!(run.messages.len(), 1);
    let warning = run.messages.iter().next().unwrap();
    assert_eq!(warning.severity, Severity::Warning);
    assert!(warning.text.starts_with("no build system found"));
}

// ===========================================================================
// Corrections
// ===========================================================================

const SOME_POM: &str = r#"<project>
  <groupId>io.jenkins.plugins</groupId>
  <artifactId>some</artifactId>
  <properties>
    <jenkins.version>2.414.3</jenkins.version>
  </properties>
</project>
"#;

/// All three fields malformed in the silently-correctable ways.
fn messy_ticket() -> Ticket {
    Ticket::new("HOSTING-200")
        .with_reporter("bob")
        .with_field(
            TicketField::SourceUrl,
            "http://github.com/alice/SomePlugin.git",
        )
        .with_field(TicketField::AuthorizedUsers, "alice, bob")
        .with_field(TicketField::TargetName, "SomePlugin")
}

fn seed_messy_candidate(forge: &InMemoryForge) {
    forge.seed_repo(licensed_repo("alice", "SomePlugin"));
    forge.seed_readme("alice", "SomePlugin", "# Some");
    forge.seed_user("alice");
    forge.seed_user("bob");
    forge.seed_file("alice", "SomePlugin", "pom.xml", SOME_POM);
}

#[tokio::test]
async fn corrections_reach_a_fixed_point_after_one_run() {
    let tracker = Arc::new(InMemoryTracker::new());
    tracker.seed_ticket(messy_ticket());
    let forge = Arc::new(InMemoryForge::new());
    seed_messy_candidate(&forge);

    let engine = engine(&tracker, &forge, HostingPolicy::default());
    let first = engine.run("HOSTING-200").await.unwrap();

    assert!(first.messages.is_empty(), "unexpected: {:?}", first.messages);
    assert_eq!(first.corrections.len(), 3);

    let corrected = tracker.ticket("HOSTING-200").unwrap();
    assert_eq!(
        corrected.field(TicketField::SourceUrl),
        Some("https://github.com/alice/SomePlugin")
    );
    assert_eq!(
        corrected.field(TicketField::AuthorizedUsers),
        Some("alice\nbob")
    );
    assert_eq!(corrected.field(TicketField::TargetName), Some("some-plugin"));

    let second = engine.run("HOSTING-200").await.unwrap();
    assert!(second.corrections.is_empty());
    assert_eq!(second.messages, first.messages);
}

#[tokio::test]
async fn recoverable_url_messiness_does_not_hide_the_build_system() {
    let tracker = Arc::new(InMemoryTracker::new());
    tracker.seed_ticket(messy_ticket());
    let forge = Arc::new(InMemoryForge::new());
    seed_messy_candidate(&forge);

    let run = engine(&tracker, &forge, HostingPolicy::default().with_dry_run(true))
        .run("HOSTING-200")
        .await
        .unwrap();

    // The probes match the URL in its corrected form, so a fixable
    // plain-http `.git` paste still locates the pom.
    assert!(run.build_system_found);
    assert!(!run
        .messages
        .iter()
        .any(|m| m.text == NO_BUILD_SYSTEM_TEXT));
}

#[tokio::test]
async fn dry_run_skips_every_tracker_write() {
    let tracker = Arc::new(InMemoryTracker::new());
    tracker.seed_ticket(messy_ticket());
    let forge = Arc::new(InMemoryForge::new());
    seed_messy_candidate(&forge);

    let run = engine(&tracker, &forge, HostingPolicy::default().with_dry_run(true))
        .run("HOSTING-200")
        .await
        .unwrap();

    assert_eq!(run.publish, PublishStatus::DryRun);
    // The record still carries what a normal run would have written.
    assert_eq!(run.corrections.len(), 3);
    assert!(!run.report.is_empty());

    assert!(tracker.comments_for("HOSTING-200").is_empty());
    assert_eq!(tracker.ticket("HOSTING-200").unwrap(), messy_ticket());
}

// ===========================================================================
// Failure isolation
// ===========================================================================

#[tokio::test]
async fn checker_failures_do_not_block_the_rest_of_the_run() {
    let tracker = Arc::new(InMemoryTracker::new());
    tracker.seed_ticket(healthy_ticket());
    let forge = Arc::new(InMemoryForge::new());
    forge.seed_repo(licensed_repo("alice", "demo-plugin"));
    forge.seed_readme("alice", "demo-plugin", "# Demo");
    forge.seed_user("alice");
    forge.break_path("alice", "demo-plugin", "pom.xml");

    let run = engine(&tracker, &forge, HostingPolicy::default())
        .run("HOSTING-100")
        .await
        .unwrap();

    assert_eq!(run.failures.len(), 1);
    assert_eq!(run.failures[0].checker, "maven build descriptor");
    assert!(run.failures[0].error.contains("source host error"));

    // Maven could not be probed and gradle is absent, so coverage still
    // warns; the failure itself never becomes a verification message.
    assert_eq!(run.messages.len(), 1);
    assert!(run
        .messages
        .iter()
        .next()
        .unwrap()
        .text
        .starts_with("no build system found"));
    assert_eq!(run.publish, PublishStatus::Posted);
}

#[tokio::test]
async fn comment_failure_withholds_corrections() {
    let tracker = Arc::new(InMemoryTracker::new());
    tracker.seed_ticket(messy_ticket());
    tracker.set_fail_comments(true);
    let forge = Arc::new(InMemoryForge::new());
    seed_messy_candidate(&forge);

    let run = engine(&tracker, &forge, HostingPolicy::default())
        .run("HOSTING-200")
        .await
        .unwrap();

    match &run.publish {
        PublishStatus::Failed { reason } => {
            assert!(reason.contains("posting the report comment failed"));
        }
        other => panic!("expected publish failure, got {other:?}"),
    }
    // The rendered report survives in the run record.
    assert!(!run.report.is_empty());
    // The ticket must not change when the explanatory comment never landed.
    assert_eq!(tracker.ticket("HOSTING-200").unwrap(), messy_ticket());
}

#[tokio::test]
async fn correction_failure_reports_the_persistence_problem() {
    let tracker = Arc::new(InMemoryTracker::new());
    tracker.seed_ticket(messy_ticket());
    tracker.set_fail_updates(true);
    let forge = Arc::new(InMemoryForge::new());
    seed_messy_candidate(&forge);

    let run = engine(&tracker, &forge, HostingPolicy::default())
        .run("HOSTING-200")
        .await
        .unwrap();

    match &run.publish {
        PublishStatus::Failed { reason } => {
            assert!(reason.contains("applying 3 field corrections failed"));
        }
        other => panic!("expected publish failure, got {other:?}"),
    }
    // The comment had already been posted before the update failed.
    assert_eq!(tracker.comments_for("HOSTING-200").len(), 1);
}
