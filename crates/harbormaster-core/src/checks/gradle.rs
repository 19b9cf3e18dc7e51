//! Gradle build-descriptor verification.
//!
//! `build.gradle` is Groovy, not data, so this is a line-oriented regex
//! scan rather than a real parse: good enough for the handful of settings
//! the hosting rules care about (`shortName`, `group`, `jenkinsVersion`,
//! repository `url` entries).

use std::sync::Arc;
use std::sync::OnceLock;

use async_trait::async_trait;
use regex::Regex;

use harbormaster_remote::{SourceHost, Ticket, TicketField};

use crate::checks::{fetch_source_file, source_file_is_regular, Verifier, VerifyError};
use crate::config::HostingPolicy;
use crate::findings::Findings;
use crate::normalize::normalize_target_name;
use crate::version::Version;

pub const GRADLE_PATH: &str = "build.gradle";

fn short_name_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r#"(?m)^\s*shortName\s*=?\s*['"]([^'"]+)['"]"#)
            .expect("shortName regex must compile")
    })
}

fn group_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r#"(?m)^\s*group\s*=?\s*['"]([^'"]+)['"]"#).expect("group regex must compile")
    })
}

fn jenkins_version_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r#"(?m)^\s*jenkinsVersion\s*=?\s*['"]([^'"]+)['"]"#)
            .expect("jenkinsVersion regex must compile")
    })
}

fn repo_url_line_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r#"\burl\s*\(?\s*['"]([^'"]+)['"]"#).expect("url regex must compile")
    })
}

#[derive(Debug, Default, PartialEq, Eq)]
pub(crate) struct GradleFacts {
    pub(crate) short_name: Option<String>,
    pub(crate) group: Option<String>,
    pub(crate) jenkins_version: Option<String>,
    pub(crate) repository_urls: Vec<String>,
}

pub(crate) fn scan_gradle(content: &str) -> GradleFacts {
    let capture = |re: &Regex| {
        re.captures(content)
            .map(|captures| captures[1].to_string())
    };

    GradleFacts {
        short_name: capture(short_name_re()),
        group: capture(group_re()),
        jenkins_version: capture(jenkins_version_re()),
        repository_urls: repo_url_line_re()
            .captures_iter(content)
            .map(|captures| captures[1].to_string())
            .collect(),
    }
}

/// Verifies the Gradle conventions, mirroring the Maven checks on the
/// values the jpi plugin DSL declares.
pub struct GradleVerifier {
    host: Arc<dyn SourceHost>,
    policy: HostingPolicy,
}

impl GradleVerifier {
    pub fn new(host: Arc<dyn SourceHost>, policy: HostingPolicy) -> Self {
        Self { host, policy }
    }

    fn check_short_name(&self, ticket: &Ticket, facts: &GradleFacts, findings: &mut Findings) {
        // Unlike a pom's artifactId, shortName is optional; the jpi plugin
        // falls back to the project name, so absence is not a violation.
        let Some(short_name) = &facts.short_name else {
            return;
        };

        if let Some(target) = ticket.field(TicketField::TargetName) {
            if !target.trim().is_empty() {
                let normalized = normalize_target_name(target);
                let expected = normalized.strip_suffix("-plugin").unwrap_or(&normalized);
                if !short_name.eq_ignore_ascii_case(expected) {
                    findings.require(format!(
                        "the build.gradle shortName ({short_name}) must match the \
                         'New Repository Name' ({normalized}) with \"-plugin\" removed"
                    ));
                }
            }
        }

        if short_name.chars().any(|c| c.is_ascii_uppercase()) {
            findings.require(format!(
                "the build.gradle shortName ({short_name}) must be all lowercase"
            ));
        }

        if short_name.to_ascii_lowercase().contains("jenkins") {
            findings.require(format!(
                "the build.gradle shortName ({short_name}) must not contain \"jenkins\""
            ));
        }
    }

    fn check_group(&self, facts: &GradleFacts, findings: &mut Findings) {
        if let Some(group) = &facts.group {
            if !self.policy.accepted_groups.iter().any(|g| g == group) {
                findings.warn(format!(
                    "the build.gradle group ({group}) should be one of: {}",
                    self.policy.accepted_groups.join(", ")
                ));
            }
        }
    }

    fn check_baseline(&self, facts: &GradleFacts, findings: &mut Findings) {
        let Some(declared) = &facts.jenkins_version else {
            return;
        };
        match declared.parse::<Version>() {
            Ok(version) if version < self.policy.platform_floor => {
                findings.require(format!(
                    "the declared Jenkins baseline ({declared}) must be at least {}",
                    self.policy.platform_floor
                ));
            }
            Ok(_) => {}
            Err(_) => {
                findings.require(format!(
                    "the declared Jenkins baseline ({declared}) is not a valid version number"
                ));
            }
        }
    }

    fn check_repositories(&self, facts: &GradleFacts, findings: &mut Findings) {
        for url in &facts.repository_urls {
            if let Some(rest) = url.strip_prefix("https://") {
                let host = rest.split('/').next().unwrap_or("");
                if !host.eq_ignore_ascii_case(&self.policy.artifact_host) {
                    findings.require(format!(
                        "the repository URL {url} in build.gradle must point at {}",
                        self.policy.artifact_host
                    ));
                }
            } else {
                findings.require(format!(
                    "the repository URL {url} in build.gradle must use https"
                ));
            }
        }
    }
}

#[async_trait]
impl Verifier for GradleVerifier {
    async fn verify(&self, ticket: &Ticket, findings: &mut Findings) -> Result<(), VerifyError> {
        let Some(file) = fetch_source_file(self.host.as_ref(), ticket, GRADLE_PATH).await? else {
            return Ok(());
        };
        if !file.is_file() {
            return Ok(());
        }

        let facts = scan_gradle(&file.content);
        self.check_short_name(ticket, &facts, findings);
        self.check_group(&facts, findings);
        self.check_baseline(&facts, findings);
        self.check_repositories(&facts, findings);
        Ok(())
    }

    fn is_build_system(&self) -> bool {
        true
    }

    async fn has_build_file(&self, ticket: &Ticket) -> Result<bool, VerifyError> {
        source_file_is_regular(self.host.as_ref(), ticket, GRADLE_PATH).await
    }
}
