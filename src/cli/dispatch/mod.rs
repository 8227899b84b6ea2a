//! Maps validated CLI arguments to the action the binary runs.

use crate::cli::actions::{server::Args, Action};
use crate::cli::commands::{auth, ARG_DATA_DIR, ARG_PORT};
use anyhow::{Context, Result};
use std::path::PathBuf;

/// Map validated CLI matches to a server action.
///
/// # Errors
/// Returns an error if the secret is missing or empty.
pub fn handler(matches: &clap::ArgMatches) -> Result<Action> {
    let port = matches.get_one::<u16>(ARG_PORT).copied().unwrap_or(3000);
    let data_dir = matches
        .get_one::<PathBuf>(ARG_DATA_DIR)
        .cloned()
        .context("missing required argument: --data-dir")?;

    let auth_opts = auth::Options::parse(matches)?;

    Ok(Action::Server(Args {
        port,
        data_dir,
        secret: auth_opts.secret,
        admin_email: auth_opts.admin_email,
        token_ttl_seconds: auth_opts.token_ttl_seconds,
    }))
}
