pub mod auth;
pub mod logging;

use clap::{
    builder::styling::{AnsiColor, Effects, Styles},
    Arg, ColorChoice, Command,
};
use std::path::PathBuf;

pub const ARG_PORT: &str = "port";
pub const ARG_DATA_DIR: &str = "data-dir";

#[must_use]
pub fn new() -> Command {
    let styles = Styles::styled()
        .header(AnsiColor::Yellow.on_default() | Effects::BOLD)
        .usage(AnsiColor::Green.on_default() | Effects::BOLD)
        .literal(AnsiColor::Blue.on_default() | Effects::BOLD)
        .placeholder(AnsiColor::Green.on_default());

    let long_version: &'static str = Box::leak(
        format!("{} - {}", env!("CARGO_PKG_VERSION"), crate::GIT_COMMIT_HASH).into_boxed_str(),
    );

    let command = Command::new("scalperblock")
        .about("Store submission and moderation")
        .version(env!("CARGO_PKG_VERSION"))
        .long_version(long_version)
        .color(ColorChoice::Auto)
        .styles(styles)
        .arg(
            Arg::new(ARG_PORT)
                .short('p')
                .long(ARG_PORT)
                .help("Port to listen on")
                .default_value("3000")
                .env("SCALPERBLOCK_PORT")
                .value_parser(clap::value_parser!(u16)),
        )
        .arg(
            Arg::new(ARG_DATA_DIR)
                .short('d')
                .long(ARG_DATA_DIR)
                .help("Directory holding the users and stores snapshots")
                .default_value("data")
                .env("SCALPERBLOCK_DATA_DIR")
                .value_parser(clap::value_parser!(PathBuf)),
        );

    let command = auth::with_args(command);
    logging::with_args(command)
}

#[cfg(test)]
mod tests {
    use super::*;

    const ENV_VARS: [&str; 6] = [
        "SCALPERBLOCK_PORT",
        "SCALPERBLOCK_DATA_DIR",
        "SCALPERBLOCK_SECRET",
        "SCALPERBLOCK_ADMIN_EMAIL",
        "SCALPERBLOCK_TOKEN_TTL",
        "SCALPERBLOCK_LOG_LEVEL",
    ];

    fn with_cleared_env<F, R>(f: F) -> R
    where
        F: FnOnce() -> R,
    {
        temp_env::with_vars(ENV_VARS.map(|key| (key, None::<&str>)), f)
    }

    #[test]
    fn test_new() {
        let command = new();

        assert_eq!(command.get_name(), "scalperblock");
        assert_eq!(
            command.get_about().map(ToString::to_string),
            Some("Store submission and moderation".to_string())
        );
        assert_eq!(
            command.get_version().map(ToString::to_string),
            Some(env!("CARGO_PKG_VERSION").to_string())
        );
    }

    #[test]
    fn test_defaults() {
        with_cleared_env(|| {
            let matches = new().get_matches_from(vec!["scalperblock", "--secret", "s3cr3t"]);
            assert_eq!(matches.get_one::<u16>(ARG_PORT).copied(), Some(3000));
            assert_eq!(
                matches.get_one::<PathBuf>(ARG_DATA_DIR).cloned(),
                Some(PathBuf::from("data"))
            );
            assert_eq!(
                matches.get_one::<i64>(auth::ARG_TOKEN_TTL).copied(),
                Some(604_800)
            );
            assert_eq!(matches.get_one::<String>(auth::ARG_ADMIN_EMAIL), None);
        });
    }

    #[test]
    fn test_check_args() {
        with_cleared_env(|| {
            let matches = new().get_matches_from(vec![
                "scalperblock",
                "--port",
                "8080",
                "--data-dir",
                "/var/lib/scalperblock",
                "--secret",
                "s3cr3t",
                "--admin-email",
                "admin@example.com",
                "--token-ttl",
                "3600",
            ]);

            assert_eq!(matches.get_one::<u16>(ARG_PORT).copied(), Some(8080));
            assert_eq!(
                matches.get_one::<PathBuf>(ARG_DATA_DIR).cloned(),
                Some(PathBuf::from("/var/lib/scalperblock"))
            );
            assert_eq!(
                matches.get_one::<String>(auth::ARG_SECRET).cloned(),
                Some("s3cr3t".to_string())
            );
            assert_eq!(
                matches.get_one::<String>(auth::ARG_ADMIN_EMAIL).cloned(),
                Some("admin@example.com".to_string())
            );
            assert_eq!(
                matches.get_one::<i64>(auth::ARG_TOKEN_TTL).copied(),
                Some(3600)
            );
        });
    }

    #[test]
    fn test_check_env() {
        temp_env::with_vars(
            [
                ("SCALPERBLOCK_PORT", Some("443")),
                ("SCALPERBLOCK_DATA_DIR", Some("/srv/data")),
                ("SCALPERBLOCK_SECRET", Some("from-env")),
                ("SCALPERBLOCK_ADMIN_EMAIL", Some("admin@example.com")),
                ("SCALPERBLOCK_TOKEN_TTL", Some("120")),
                ("SCALPERBLOCK_LOG_LEVEL", Some("info")),
            ],
            || {
                let matches = new().get_matches_from(vec!["scalperblock"]);
                assert_eq!(matches.get_one::<u16>(ARG_PORT).copied(), Some(443));
                assert_eq!(
                    matches.get_one::<PathBuf>(ARG_DATA_DIR).cloned(),
                    Some(PathBuf::from("/srv/data"))
                );
                assert_eq!(
                    matches.get_one::<String>(auth::ARG_SECRET).cloned(),
                    Some("from-env".to_string())
                );
                assert_eq!(
                    matches.get_one::<i64>(auth::ARG_TOKEN_TTL).copied(),
                    Some(120)
                );
                assert_eq!(
                    matches.get_one::<u8>(logging::ARG_VERBOSITY).copied(),
                    Some(2)
                );
            },
        );
    }

    #[test]
    fn test_secret_required() {
        with_cleared_env(|| {
            let result = new().try_get_matches_from(vec!["scalperblock"]);
            assert_eq!(
                result.map_err(|e| e.kind()).err(),
                Some(clap::error::ErrorKind::MissingRequiredArgument)
            );
        });
    }

    #[test]
    fn test_token_ttl_bounds() {
        with_cleared_env(|| {
            for ttl in ["-5", "0", "31536001", "9223372036854775807"] {
                let result = new().try_get_matches_from(vec![
                    "scalperblock",
                    "--secret",
                    "s3cr3t",
                    "--token-ttl",
                    ttl,
                ]);
                assert!(result.is_err(), "ttl {ttl} should be rejected");
            }

            let matches = new().get_matches_from(vec![
                "scalperblock",
                "--secret",
                "s3cr3t",
                "--token-ttl",
                "31536000",
            ]);
            assert_eq!(
                matches.get_one::<i64>(auth::ARG_TOKEN_TTL).copied(),
                Some(auth::MAX_TOKEN_TTL_SECONDS)
            );
        });
    }

    #[test]
    fn test_check_log_level_env() {
        let levels = ["error", "warn", "info", "debug", "trace"];
        for (index, &level) in levels.iter().enumerate() {
            temp_env::with_vars(
                [
                    ("SCALPERBLOCK_LOG_LEVEL", Some(level)),
                    ("SCALPERBLOCK_SECRET", Some("s3cr3t")),
                ],
                || {
                    let matches = new().get_matches_from(vec!["scalperblock"]);
                    assert_eq!(
                        matches.get_one::<u8>(logging::ARG_VERBOSITY).copied(),
                        u8::try_from(index).ok()
                    );
                },
            );
        }
    }

    #[test]
    fn test_check_log_level_verbosity() {
        let levels = ["error", "warn", "info", "debug", "trace"];
        for (index, _) in levels.iter().enumerate() {
            with_cleared_env(|| {
                let mut args = vec![
                    "scalperblock".to_string(),
                    "--secret".to_string(),
                    "s3cr3t".to_string(),
                ];

                // Add the appropriate number of "-v" flags based on the index
                if index > 0 {
                    args.push(format!("-{}", "v".repeat(index)));
                }

                let matches = new().get_matches_from(args);

                assert_eq!(
                    matches.get_one::<u8>(logging::ARG_VERBOSITY).copied(),
                    u8::try_from(index).ok()
                );
            });
        }
    }
}
