//! Preflight validation checks for early failure detection
//!
//! The command-line client calls these before shelling out to git or
//! touching the network, so failures come with actionable guidance.

use std::path::Path;

use anyhow::{bail, Context, Result};
use url::Url;

/// Validate the directory is inside a git working tree
///
/// Opens (discovers) the repository without reading any objects.
pub fn check_git_repository(dir: &Path) -> Result<()> {
    let repo = git2::Repository::discover(dir)
        .context("Failed to get git diff. Are you in a git repository?")?;
    if repo.is_bare() {
        bail!("Repository is bare. Please run this command from a working tree.");
    }
    Ok(())
}

/// Validate the relay endpoint is an absolute http(s) URL
pub fn check_relay_endpoint(endpoint: &str) -> Result<Url> {
    let url = Url::parse(endpoint).with_context(|| format!("Invalid endpoint URL: {endpoint}"))?;
    match url.scheme() {
        "http" | "https" => Ok(url),
        other => bail!("Unsupported endpoint scheme '{other}'. Use http or https."),
    }
}
