//! Hosting policy configuration.
//!
//! Built once at process start and handed to the engine; checkers never
//! read the environment themselves.

use serde::{Deserialize, Serialize};

use crate::version::Version;

/// Everything the verification checkers are allowed to assume about the
/// hosting program.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HostingPolicy {
    /// Organization the repository will be imported into.
    pub target_org: String,

    /// Minimum platform version a plugin may declare as its baseline.
    pub platform_floor: Version,

    /// Group/namespace identifiers the build file may declare.
    pub accepted_groups: Vec<String>,

    /// Host any declared internal artifact repository must point at.
    pub artifact_host: String,

    /// When set, reports go to the log and no ticket writes happen.
    pub dry_run: bool,
}

impl Default for HostingPolicy {
    fn default() -> Self {
        HostingPolicy {
            target_org: "jenkinsci".to_string(),
            platform_floor: Version::new(2, 361, 4),
            accepted_groups: vec![
                "io.jenkins.plugins".to_string(),
                "org.jenkins-ci.plugins".to_string(),
            ],
            artifact_host: "repo.jenkins-ci.org".to_string(),
            dry_run: false,
        }
    }
}

impl HostingPolicy {
    /// Builder-style override, mainly for tests.
    pub fn with_target_org(mut self, org: impl Into<String>) -> Self {
        self.target_org = org.into();
        self
    }

    pub fn with_platform_floor(mut self, floor: Version) -> Self {
        self.platform_floor = floor;
        self
    }

    pub fn with_dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }
}
