//! CLI interface for commitdiff.

pub mod relay;

use std::io::{self, Write};
use std::path::Path;

use anyhow::Result;
use clap::{Parser, ValueEnum};
use thiserror::Error;
use tracing::debug;

use crate::generation::CommitMessage;
use crate::git::{commit_command_line, GitCli, Vcs};
use crate::utils::{check_git_repository, get_env_var_or};

pub use relay::{MessageSource, RelayClient, DEFAULT_ENDPOINT};

/// Returned when there is nothing staged to describe.
#[derive(Error, Debug)]
#[error("No staged changes found.\nStage your changes first: git add <files>")]
pub struct NoStagedChanges;

/// Commit message style.
///
/// Accepted for compatibility; generation does not vary by style.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, ValueEnum)]
pub enum CommitStyle {
    /// Conventional commits.
    #[default]
    Conventional,
    /// Title only.
    Short,
    /// Title with a longer body.
    Detailed,
}

/// commitdiff: AI-powered git commit message generator.
#[derive(Parser, Debug)]
#[command(name = "commitdiff")]
#[command(about = "AI-powered git commit message generator", long_about = None)]
#[command(version)]
pub struct Cli {
    /// Automatically commit with the generated message.
    #[arg(long)]
    pub commit: bool,

    /// Commit style (currently has no effect on generation).
    #[arg(long, value_enum, default_value_t = CommitStyle::Conventional)]
    pub style: CommitStyle,

    /// Relay endpoint to send the diff to.
    #[arg(long, env = "COMMITDIFF_ENDPOINT")]
    pub endpoint: Option<String>,
}

impl Cli {
    /// Executes the CLI command.
    pub async fn execute(self) -> Result<()> {
        let endpoint = self
            .endpoint
            .clone()
            .unwrap_or_else(|| get_env_var_or("COMMITDIFF_ENDPOINT", DEFAULT_ENDPOINT));
        check_git_repository(Path::new("."))?;
        let git = GitCli::new();
        let relay = RelayClient::new(endpoint)?;

        run(&self, &git, &relay, &mut io::stdout().lock()).await?;
        Ok(())
    }
}

/// Reads the staged diff, generates a message, prints it, and optionally commits.
///
/// Returns the generated message. No network call is made when nothing is
/// staged.
pub async fn run<W: Write>(
    cli: &Cli,
    vcs: &dyn Vcs,
    source: &dyn MessageSource,
    out: &mut W,
) -> Result<CommitMessage> {
    debug!(style = ?cli.style, commit = cli.commit, "Running commitdiff");
    eprintln!("Analyzing staged changes...");

    let diff = vcs.staged_diff()?;
    if diff.trim().is_empty() {
        return Err(NoStagedChanges.into());
    }

    eprintln!("Generating commit message...");
    let message = source.generate(&diff).await?;

    print_message(&message, out)?;

    if cli.commit {
        eprintln!("Committing...");
        vcs.commit(&message.title)?;
        writeln!(out, "Committed successfully.")?;
    }

    Ok(message)
}

fn print_message<W: Write>(message: &CommitMessage, out: &mut W) -> io::Result<()> {
    writeln!(out, "Generated commit message:\n")?;
    writeln!(out, "{}\n", message.title)?;
    writeln!(out, "Summary:")?;
    writeln!(out, "{}", message.summary)?;
    writeln!(out, "\n{}\n", "─".repeat(60))?;
    writeln!(out, "To commit with this message, run:")?;
    writeln!(out, "{}\n", commit_command_line(&message.title))?;
    Ok(())
}
