use crate::auth::DEFAULT_TOKEN_TTL_SECONDS;
use anyhow::{Context, Result};
use clap::{Arg, ArgMatches, Command};
use secrecy::SecretString;

pub const ARG_SECRET: &str = "secret";
pub const ARG_ADMIN_EMAIL: &str = "admin-email";
pub const ARG_TOKEN_TTL: &str = "token-ttl";

/// One year.
pub const MAX_TOKEN_TTL_SECONDS: i64 = 365 * 24 * 60 * 60;

#[must_use]
pub fn with_args(command: Command) -> Command {
    command
        .arg(
            Arg::new(ARG_SECRET)
                .long(ARG_SECRET)
                .help("Secret used to sign session tokens")
                .env("SCALPERBLOCK_SECRET")
                .hide_env_values(true)
                .required(true),
        )
        .arg(
            Arg::new(ARG_ADMIN_EMAIL)
                .long(ARG_ADMIN_EMAIL)
                .help("Email of the single account allowed to moderate stores")
                .env("SCALPERBLOCK_ADMIN_EMAIL"),
        )
        .arg(
            Arg::new(ARG_TOKEN_TTL)
                .long(ARG_TOKEN_TTL)
                .help("Session token TTL in seconds")
                .env("SCALPERBLOCK_TOKEN_TTL")
                .default_value("604800")
                .value_parser(clap::value_parser!(i64).range(1..=MAX_TOKEN_TTL_SECONDS)),
        )
}

#[derive(Debug)]
pub struct Options {
    pub secret: SecretString,
    pub admin_email: Option<String>,
    pub token_ttl_seconds: i64,
}

impl Options {
    /// # Errors
    /// Returns an error if the secret is missing or empty.
    pub fn parse(matches: &ArgMatches) -> Result<Self> {
        let secret = matches
            .get_one::<String>(ARG_SECRET)
            .filter(|secret| !secret.trim().is_empty())
            .cloned()
            .context("missing required argument: --secret")?;

        let token_ttl_seconds = matches
            .get_one::<i64>(ARG_TOKEN_TTL)
            .copied()
            .unwrap_or(DEFAULT_TOKEN_TTL_SECONDS);

        Ok(Self {
            secret: SecretString::from(secret),
            admin_email: matches.get_one::<String>(ARG_ADMIN_EMAIL).cloned(),
            token_ttl_seconds,
        })
    }
}
