//! Field normalization for hosting tickets.
//!
//! Every function here is a fixed point: feeding its own output back in
//! changes nothing. The engine relies on that to guarantee a corrected
//! ticket produces zero further corrections on the next run.

use std::sync::OnceLock;

use regex::Regex;

use harbormaster_remote::RepoRef;

fn repo_url_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?i)^https://github\.com/([^/\s]+)/([^/\s]+?)(?:\.git)?/?$")
            .expect("repository url regex must compile")
    })
}

fn user_separator_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"[\s,;]+").expect("user separator regex must compile"))
}

fn space_run_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\s+").expect("space run regex must compile"))
}

fn hyphen_run_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"-{2,}").expect("hyphen run regex must compile"))
}

/// Extract `owner/repo` from a GitHub repository URL, case-insensitively.
/// Tolerates a trailing `.git` suffix and a trailing slash; anything else
/// off-pattern is `None`.
pub fn parse_repo_url(url: &str) -> Option<RepoRef> {
    let captures = repo_url_re().captures(url.trim())?;
    Some(RepoRef::new(&captures[1], &captures[2]))
}

/// Lowercase a camelCase identifier, inserting a hyphen at each word
/// boundary: `TestPlugin` becomes `test-plugin`.
pub fn fold_camel_case(name: &str) -> String {
    let chars: Vec<char> = name.chars().collect();
    let mut out = String::with_capacity(name.len() + 4);

    for (i, &c) in chars.iter().enumerate() {
        if c.is_uppercase() && i > 0 {
            let prev = chars[i - 1];
            let next_is_lower = chars.get(i + 1).is_some_and(|n| n.is_lowercase());
            // Boundary after a lowercase/digit, or at the tail of an
            // acronym run ("APIPlugin" folds to "api-plugin").
            let boundary = prev.is_lowercase()
                || prev.is_ascii_digit()
                || (prev.is_uppercase() && next_is_lower);
            if boundary && !out.ends_with('-') {
                out.push('-');
            }
        }
        out.extend(c.to_lowercase());
    }

    out
}

/// Remove every occurrence of `needle`, rescanning so that deletions
/// cannot splice a fresh occurrence together.
fn strip_all(mut haystack: String, needle: &str) -> String {
    while haystack.contains(needle) {
        haystack = haystack.replace(needle, "");
    }
    haystack
}

/// Canonical form of the target repository name: hyphen-case, lowercase,
/// no `jenkins`/`hudson` substring, no stray spaces or hyphen runs.
pub fn normalize_target_name(name: &str) -> String {
    let mut result = fold_camel_case(name.trim());

    // Hyphenated forms first so "test-jenkins-plugin" loses exactly one
    // hyphen along with the word.
    for needle in ["-jenkins", "jenkins", "-hudson", "hudson"] {
        result = strip_all(result, needle);
    }

    let result = result.trim_matches(|c| c == '-' || c == ' ');
    let result = space_run_re().replace_all(result, "-");
    let result = hyphen_run_re().replace_all(&result, "-");
    result.trim_matches('-').to_string()
}

/// Canonical newline-delimited form of the authorized-user list. Splits on
/// any run of whitespace, commas, or semicolons and drops empty entries.
pub fn normalize_user_list(value: &str) -> String {
    user_separator_re()
        .split(value)
        .filter(|entry| !entry.is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}

/// Canonical form of the source repository URL: trimmed, no trailing
/// `.git`, `https` scheme.
pub fn normalize_source_url(url: &str) -> String {
    let trimmed = url.trim();
    let stripped = trimmed.trim_end_matches(".git");
    if let Some(rest) = stripped.strip_prefix("http://") {
        format!("https://{rest}")
    } else {
        stripped.to_string()
    }
}
