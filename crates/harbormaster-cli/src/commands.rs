//! Chat-command grammar.
//!
//! The hosting bot historically took its orders as single chat lines. The
//! `dispatch` subcommand feeds one such line through [`parse_command`] and
//! executes the result; the grammar itself knows nothing about transports.

use std::sync::OnceLock;

use regex::Regex;

/// One parsed bot order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BotCommand {
    /// Run the verification pass for a hosting ticket.
    Verify { key: String },
    /// Create an empty repository in the target organization.
    Create { name: String },
    /// Fork a source repository into the target organization, optionally
    /// renaming it on arrival.
    Fork {
        source: String,
        name: Option<String>,
    },
    /// Grant a user push access to a hosted repository.
    AddUser { user: String, repo: String },
    /// Print the command summary.
    Help,
}

#[derive(Debug, PartialEq, Eq, thiserror::Error)]
pub enum CommandError {
    #[error("empty command line")]
    Empty,
    #[error("unrecognized command: {0:?}")]
    Unrecognized(String),
}

/// Command summary printed by `help`.
pub const HELP_TEXT: &str = "\
Commands:
  verify <KEY>            run verification for a hosting ticket (alias: check)
  create <NAME>           create an empty repository in the target organization
  fork <URL> [as <NAME>]  fork a source repository into the target organization
  add <USER> to <REPO>    grant a user push access to a hosted repository
  help                    show this text";

fn mention_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?i)^@?harbormaster[:,]?\s+").expect("mention regex must compile")
    })
}

fn verify_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?i)^(?:verify|check)\s+([A-Za-z][A-Za-z0-9]*-\d+)$")
            .expect("verify regex must compile")
    })
}

fn create_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?i)^create\s+(\S+)$").expect("create regex must compile"))
}

fn fork_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?i)^fork\s+(\S+)(?:\s+as\s+(\S+))?$").expect("fork regex must compile")
    })
}

fn add_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?i)^add\s+(\S+)\s+to\s+(\S+)$").expect("add regex must compile")
    })
}

fn help_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?i)^help$").expect("help regex must compile"))
}

/// Parse one chat line into a [`BotCommand`].
///
/// A leading bot mention (`@harbormaster`, `harbormaster:`) is tolerated
/// and ignored. Ticket keys are uppercased so `verify hosting-123` and
/// `verify HOSTING-123` address the same ticket.
pub fn parse_command(line: &str) -> Result<BotCommand, CommandError> {
    let line = line.trim();
    if line.is_empty() {
        return Err(CommandError::Empty);
    }
    let line = mention_re().replace(line, "");
    let line = line.trim();

    if let Some(captures) = verify_re().captures(line) {
        return Ok(BotCommand::Verify {
            key: captures[1].to_uppercase(),
        });
    }
    if let Some(captures) = create_re().captures(line) {
        return Ok(BotCommand::Create {
            name: captures[1].to_string(),
        });
    }
    if let Some(captures) = fork_re().captures(line) {
        return Ok(BotCommand::Fork {
            source: captures[1].to_string(),
            name: captures.get(2).map(|m| m.as_str().to_string()),
        });
    }
    if let Some(captures) = add_re().captures(line) {
        return Ok(BotCommand::AddUser {
            user: captures[1].to_string(),
            repo: captures[2].to_string(),
        });
    }
    if help_re().is_match(line) {
        return Ok(BotCommand::Help);
    }

    Err(CommandError::Unrecognized(line.to_string()))
}
