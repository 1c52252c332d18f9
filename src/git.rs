//! Local git operations used by the command-line client.

use std::path::PathBuf;
use std::process::{Command, Stdio};

use anyhow::{bail, Context, Result};
use tracing::debug;

/// Version-control operations the client needs.
pub trait Vcs {
    /// Returns the staged change set as unified diff text.
    fn staged_diff(&self) -> Result<String>;

    /// Creates a commit with `message` from the staged changes.
    fn commit(&self, message: &str) -> Result<()>;
}

/// [`Vcs`] implementation that shells out to the `git` binary.
#[derive(Debug, Default, Clone)]
pub struct GitCli {
    workdir: Option<PathBuf>,
}

impl GitCli {
    /// Runs git in the current directory.
    pub fn new() -> Self {
        Self::default()
    }

    /// Runs git in `workdir`.
    pub fn at(workdir: impl Into<PathBuf>) -> Self {
        Self {
            workdir: Some(workdir.into()),
        }
    }

    fn command(&self) -> Command {
        let mut command = Command::new("git");
        if let Some(dir) = &self.workdir {
            command.current_dir(dir);
        }
        command
    }
}

impl Vcs for GitCli {
    fn staged_diff(&self) -> Result<String> {
        let output = self
            .command()
            .args(["diff", "--staged"])
            .output()
            .context("Failed to get git diff. Are you in a git repository?")?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            debug!(stderr = %stderr.trim(), "git diff --staged failed");
            bail!("Failed to get git diff. Are you in a git repository?");
        }

        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }

    fn commit(&self, message: &str) -> Result<()> {
        // The message travels as its own argv entry; no shell is involved.
        let status = self
            .command()
            .args(["commit", "-m", message])
            .stdin(Stdio::null())
            .status()
            .context("Failed to execute git commit")?;

        if !status.success() {
            bail!("git commit exited with {status}");
        }
        Ok(())
    }
}

/// Escapes `text` for use inside a double-quoted POSIX shell argument.
#[must_use]
pub fn shell_escape_double_quoted(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        if matches!(c, '"' | '\\' | '$' | '`') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

/// Ready-to-run commit command for `title`.
#[must_use]
pub fn commit_command_line(title: &str) -> String {
    format!("git commit -m \"{}\"", shell_escape_double_quoted(title))
}
