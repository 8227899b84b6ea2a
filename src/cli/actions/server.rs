use crate::{api, auth::AuthConfig};
use anyhow::Result;
use secrecy::SecretString;
use std::path::PathBuf;
use tracing::info;

#[derive(Debug)]
pub struct Args {
    pub port: u16,
    pub data_dir: PathBuf,
    pub secret: SecretString,
    pub admin_email: Option<String>,
    pub token_ttl_seconds: i64,
}

impl Args {
    fn auth_config(&self) -> AuthConfig {
        AuthConfig::new(self.secret.clone())
            .with_token_ttl_seconds(self.token_ttl_seconds)
            .with_admin_email(self.admin_email.clone())
    }
}

/// Execute the server action.
/// # Errors
/// Returns an error if the server fails to bind or serve.
pub async fn execute(args: Args) -> Result<()> {
    log_startup_args(&args);
    let auth_config = args.auth_config();
    api::new(args.port, args.data_dir, auth_config).await
}

fn log_startup_args(args: &Args) {
    let entries = [
        ("listen", format!("tcp:{}", args.port)),
        ("data_dir", args.data_dir.display().to_string()),
        (
            "admin_email",
            args.admin_email
                .clone()
                .unwrap_or_else(|| "none".to_string()),
        ),
        ("token_ttl_seconds", args.token_ttl_seconds.to_string()),
    ];

    let max_key_len = entries.iter().map(|(key, _)| key.len()).max().unwrap_or(0);
    let mut message = format!(
        "scalperblock {} - {}\n\nStartup configuration:",
        env!("CARGO_PKG_VERSION"),
        short_commit(crate::GIT_COMMIT_HASH)
    );
    for (key, value) in &entries {
        let padding = " ".repeat(max_key_len.saturating_sub(key.len()));
        let _ =
            std::fmt::Write::write_fmt(&mut message, format_args!("\n  {key}:{padding} {value}"));
    }
    info!("{message}");
}

fn short_commit(hash: &str) -> String {
    let trimmed = hash.trim();
    trimmed.chars().take(7).collect()
}
