//! Harbormaster - hosting-request automation CLI
//!
//! The `harbormaster` command verifies plugin hosting tickets and runs the
//! repository chores behind the bot's chat commands.
//!
//! ## Commands
//!
//! - `verify`: run the full verification pass for one hosting ticket
//! - `check-name`: preview repository-name normalization without a ticket
//! - `dispatch`: parse one chat command line and execute it

mod commands;
mod config;

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use clap::{ArgAction, Parser, Subcommand};
use colored::Colorize;

use harbormaster_core::{
    init_tracing, level_for_verbosity, normalize_target_name, render_report, Palette,
    PublishStatus, VerificationEngine, VerificationRun,
};
use harbormaster_remote::{GithubClient, JiraTracker, RepoForge};

use commands::{parse_command, BotCommand, HELP_TEXT};
use config::AppConfig;

#[derive(Parser)]
#[command(name = "harbormaster")]
#[command(author = "Harbormaster Maintainers")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Hosting-request verification and repository chores", long_about = None)]
struct Cli {
    /// Increase log verbosity (-v debug, -vv trace)
    #[arg(short, long, global = true, action = ArgAction::Count)]
    verbose: u8,

    /// Emit JSON-formatted log lines
    #[arg(long, global = true)]
    json: bool,

    /// Path to a TOML configuration file
    #[arg(long, global = true, value_name = "FILE")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Verify one hosting ticket and publish the report to it
    Verify {
        /// Ticket key, e.g. HOSTING-123
        key: String,

        /// Render the report locally instead of writing to the tracker
        #[arg(long)]
        dry_run: bool,
    },

    /// Preview how a requested repository name will be normalized
    CheckName {
        /// Requested repository name
        name: String,
    },

    /// Parse one chat command line and execute it
    Dispatch {
        /// The command line, e.g. "verify HOSTING-123"
        line: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.json, level_for_verbosity(cli.verbose));

    let config = AppConfig::load(cli.config.as_deref())?;

    match cli.command {
        Commands::Verify { key, dry_run } => cmd_verify(&config, &key, dry_run).await,
        Commands::CheckName { name } => cmd_check_name(&name),
        Commands::Dispatch { line } => cmd_dispatch(&config, &line).await,
    }
}

fn build_engine(config: &AppConfig, dry_run: bool) -> Result<VerificationEngine> {
    let mut policy = config.policy.clone();
    policy.dry_run = policy.dry_run || dry_run;
    let tracker = Arc::new(
        JiraTracker::new(config.tracker.clone()).context("failed to build the tracker client")?,
    );
    let forge = Arc::new(
        GithubClient::new(config.forge.clone())
            .context("failed to build the source-host client")?,
    );
    Ok(VerificationEngine::new(tracker, forge, policy))
}

fn forge_client(config: &AppConfig) -> Result<GithubClient> {
    GithubClient::new(config.forge.clone()).context("failed to build the source-host client")
}

async fn cmd_verify(config: &AppConfig, key: &str, dry_run: bool) -> Result<()> {
    let engine = build_engine(config, dry_run)?;
    let run = engine
        .run(key)
        .await
        .with_context(|| format!("verification of {key} failed"))?;

    print_run(&run);

    if let PublishStatus::Failed { reason } = &run.publish {
        bail!("verification finished but publishing failed: {reason}");
    }
    Ok(())
}

fn print_run(run: &VerificationRun) {
    println!(
        "{}",
        render_report(&run.messages, &run.reporter, Palette::Ansi)
    );

    // Infrastructure problems are transcript lines, kept visually apart
    // from the policy findings above.
    for failure in &run.failures {
        eprintln!(
            "{}",
            format!("checker '{}' skipped: {}", failure.checker, failure.error).yellow()
        );
    }

    match &run.publish {
        PublishStatus::Posted if run.corrections.is_empty() => {
            println!("report posted to {}", run.ticket_key);
        }
        PublishStatus::Posted => {
            println!(
                "report posted to {}; {} field corrections applied",
                run.ticket_key,
                run.corrections.len()
            );
        }
        PublishStatus::DryRun => {
            println!("dry run: nothing was written to {}", run.ticket_key);
        }
        PublishStatus::Failed { .. } => {}
    }
}

fn cmd_check_name(name: &str) -> Result<()> {
    let normalized = normalize_target_name(name);
    println!("requested:  {name}");
    println!("normalized: {normalized}");
    if normalized.ends_with("-plugin") {
        println!("{}", "name is acceptable".green());
    } else {
        println!("{}", "name must end with \"-plugin\"".red());
    }
    Ok(())
}

async fn cmd_dispatch(config: &AppConfig, line: &str) -> Result<()> {
    let command = parse_command(line)?;
    tracing::debug!(?command, "dispatching chat command");
    match command {
        BotCommand::Verify { key } => cmd_verify(config, &key, false).await,
        BotCommand::Create { name } => cmd_create(config, &name).await,
        BotCommand::Fork { source, name } => cmd_fork(config, &source, name.as_deref()).await,
        BotCommand::AddUser { user, repo } => cmd_add_user(config, &user, &repo).await,
        BotCommand::Help => {
            println!("{HELP_TEXT}");
            Ok(())
        }
    }
}

async fn cmd_create(config: &AppConfig, name: &str) -> Result<()> {
    let org = &config.policy.target_org;
    if config.policy.dry_run {
        println!("dry run: would create {org}/{name}");
        return Ok(());
    }
    let created = forge_client(config)?
        .create_repository(org, name, "Plugin hosting import")
        .await
        .with_context(|| format!("failed to create {org}/{name}"))?;
    println!("created {}", created.full_name());
    Ok(())
}

async fn cmd_fork(config: &AppConfig, source: &str, new_name: Option<&str>) -> Result<()> {
    let Some(upstream) = harbormaster_core::parse_repo_url(source) else {
        bail!("{source:?} is not a forkable GitHub repository URL");
    };
    let org = &config.policy.target_org;
    if config.policy.dry_run {
        match new_name {
            Some(name) => println!(
                "dry run: would fork {} into {org} as {name}",
                upstream.full_name()
            ),
            None => println!("dry run: would fork {} into {org}", upstream.full_name()),
        }
        return Ok(());
    }

    let forge = forge_client(config)?;
    let fork = forge
        .fork_repository(&upstream.owner, &upstream.name, org)
        .await
        .with_context(|| format!("failed to fork {}", upstream.full_name()))?;
    println!("forked {} to {}", upstream.full_name(), fork.full_name());

    if let Some(name) = new_name {
        if name != fork.name {
            let renamed = forge
                .rename_repository(org, &fork.name, name)
                .await
                .with_context(|| format!("failed to rename {} to {name}", fork.full_name()))?;
            println!("renamed to {}", renamed.full_name());
        }
    }
    Ok(())
}

async fn cmd_add_user(config: &AppConfig, user: &str, repo: &str) -> Result<()> {
    let org = &config.policy.target_org;
    if config.policy.dry_run {
        println!("dry run: would grant {user} push access to {org}/{repo}");
        return Ok(());
    }
    forge_client(config)?
        .add_collaborator(org, repo, user)
        .await
        .with_context(|| format!("failed to add {user} to {org}/{repo}"))?;
    println!("granted {user} push access to {org}/{repo}");
    Ok(())
}
