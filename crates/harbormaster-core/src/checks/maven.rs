//! Maven build-descriptor verification.
//!
//! Streams `pom.xml` with quick-xml, tracking the element path so only
//! top-level values are read (a `<parent>` artifactId must not shadow the
//! project's own). An unparseable pom is a finding, not a checker failure:
//! the submitter can fix it, the infrastructure cannot.

use std::sync::Arc;

use async_trait::async_trait;
use quick_xml::events::Event;
use quick_xml::Reader;

use harbormaster_remote::{SourceHost, Ticket, TicketField};

use crate::checks::{fetch_source_file, source_file_is_regular, Verifier, VerifyError};
use crate::config::HostingPolicy;
use crate::findings::Findings;
use crate::normalize::normalize_target_name;
use crate::version::Version;

pub const POM_PATH: &str = "pom.xml";

/// The slice of a pom this verifier cares about.
#[derive(Debug, Default, PartialEq, Eq)]
pub(crate) struct PomFacts {
    pub(crate) artifact_id: Option<String>,
    pub(crate) group_id: Option<String>,
    pub(crate) parent_group_id: Option<String>,
    pub(crate) jenkins_version: Option<String>,
    pub(crate) repository_urls: Vec<String>,
}

impl PomFacts {
    /// Maven inherits the group from `<parent>` when the project does not
    /// declare its own.
    pub(crate) fn effective_group(&self) -> Option<&str> {
        self.group_id
            .as_deref()
            .or(self.parent_group_id.as_deref())
    }
}

pub(crate) fn parse_pom(content: &str) -> Result<PomFacts, quick_xml::Error> {
    let mut reader = Reader::from_str(content);
    reader.config_mut().trim_text(true);

    let mut facts = PomFacts::default();
    let mut path: Vec<String> = Vec::new();

    loop {
        match reader.read_event()? {
            Event::Start(start) => {
                path.push(String::from_utf8_lossy(start.name().as_ref()).into_owned());
            }
            Event::End(_) => {
                path.pop();
            }
            Event::Text(text) => {
                let unescaped = text.unescape().map_err(quick_xml::Error::from)?;
                let value = unescaped.trim();
                if value.is_empty() {
                    continue;
                }
                let segments: Vec<&str> = path.iter().map(String::as_str).collect();
                match segments.as_slice() {
                    ["project", "artifactId"] => facts.artifact_id = Some(value.to_string()),
                    ["project", "groupId"] => facts.group_id = Some(value.to_string()),
                    ["project", "parent", "groupId"] => {
                        facts.parent_group_id = Some(value.to_string());
                    }
                    ["project", "properties", "jenkins.version"] => {
                        facts.jenkins_version = Some(value.to_string());
                    }
                    ["project", "repositories", "repository", "url"] => {
                        facts.repository_urls.push(value.to_string());
                    }
                    _ => {}
                }
            }
            Event::Eof => break,
            _ => {}
        }
    }

    Ok(facts)
}

/// Verifies the Maven conventions: artifact id against the target name,
/// group id against the accepted namespaces, declared platform baseline
/// against the floor, and declared repository URLs against the expected
/// artifact host.
pub struct MavenVerifier {
    host: Arc<dyn SourceHost>,
    policy: HostingPolicy,
}

impl MavenVerifier {
    pub fn new(host: Arc<dyn SourceHost>, policy: HostingPolicy) -> Self {
        Self { host, policy }
    }

    fn check_artifact_id(&self, ticket: &Ticket, facts: &PomFacts, findings: &mut Findings) {
        let Some(artifact) = &facts.artifact_id else {
            findings.require("the pom.xml file does not declare an <artifactId>");
            return;
        };

        if let Some(target) = ticket.field(TicketField::TargetName) {
            if !target.trim().is_empty() {
                let normalized = normalize_target_name(target);
                let expected = normalized.strip_suffix("-plugin").unwrap_or(&normalized);
                if !artifact.eq_ignore_ascii_case(expected) {
                    findings.require(format!(
                        "the pom.xml <artifactId> ({artifact}) must match the \
                         'New Repository Name' ({normalized}) with \"-plugin\" removed"
                    ));
                }
            }
        }

        if artifact.chars().any(|c| c.is_ascii_uppercase()) {
            findings.require(format!(
                "the pom.xml <artifactId> ({artifact}) must be all lowercase"
            ));
        }

        if artifact.to_ascii_lowercase().contains("jenkins") {
            findings.require(format!(
                "the pom.xml <artifactId> ({artifact}) must not contain \"jenkins\""
            ));
        }
    }

    fn check_group(&self, facts: &PomFacts, findings: &mut Findings) {
        if let Some(group) = facts.effective_group() {
            if !self.policy.accepted_groups.iter().any(|g| g == group) {
                findings.warn(format!(
                    "the pom.xml <groupId> ({group}) should be one of: {}",
                    self.policy.accepted_groups.join(", ")
                ));
            }
        }
    }

    fn check_baseline(&self, facts: &PomFacts, findings: &mut Findings) {
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

    fn check_repositories(&self, facts: &PomFacts, findings: &mut Findings) {
        for url in &facts.repository_urls {
            if let Some(rest) = url.strip_prefix("https://") {
                let host = rest.split('/').next().unwrap_or("");
                if !host.eq_ignore_ascii_case(&self.policy.artifact_host) {
                    findings.require(format!(
                        "the repository URL {url} in pom.xml must point at {}",
                        self.policy.artifact_host
                    ));
                }
            } else {
                findings.require(format!(
                    "the repository URL {url} in pom.xml must use https"
                ));
            }
        }
    }
}

#[async_trait]
impl Verifier for MavenVerifier {
    async fn verify(&self, ticket: &Ticket, findings: &mut Findings) -> Result<(), VerifyError> {
        let Some(file) = fetch_source_file(self.host.as_ref(), ticket, POM_PATH).await? else {
            return Ok(());
        };
        if !file.is_file() {
            return Ok(());
        }

        let facts = match parse_pom(&file.content) {
            Ok(facts) => facts,
            Err(err) => {
                findings.require(format!("the pom.xml file could not be parsed: {err}"));
                return Ok(());
            }
        };

        self.check_artifact_id(ticket, &facts, findings);
        self.check_group(&facts, findings);
        self.check_baseline(&facts, findings);
        self.check_repositories(&facts, findings);
        Ok(())
    }

    fn is_build_system(&self) -> bool {
        true
    }

    async fn has_build_file(&self, ticket: &Ticket) -> Result<bool, VerifyError> {
        source_file_is_regular(self.host.as_ref(), ticket, POM_PATH).await
    }
}
