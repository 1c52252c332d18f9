//! Utility functions and helpers.

pub mod preflight;
pub mod settings;

pub use preflight::{check_git_repository, check_relay_endpoint};
pub use settings::{get_env_var, get_env_var_or, Settings};
