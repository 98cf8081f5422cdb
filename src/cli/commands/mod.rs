pub mod account;
pub mod compose;
pub mod logging;

use clap::{
    builder::styling::{AnsiColor, Effects, Styles},
    Arg, ColorChoice, Command,
};

pub const ARG_BASE_URL: &str = "base-url";
pub const ARG_TIMEOUT: &str = "timeout";
pub const ARG_REMEMBER_FILE: &str = "remember-file";

pub const DEFAULT_BASE_URL: &str = "http://127.0.0.1:5000";

fn with_forum_args(command: Command) -> Command {
    command
        .arg(
            Arg::new(ARG_BASE_URL)
                .short('b')
                .long("base-url")
                .help("Forum base URL")
                .env("WANGSHU_BASE_URL")
                .default_value(DEFAULT_BASE_URL)
                .global(true),
        )
        .arg(
            Arg::new(ARG_TIMEOUT)
                .long("timeout")
                .help("Override every request timeout, in seconds")
                .env("WANGSHU_TIMEOUT")
                .global(true)
                .value_parser(clap::value_parser!(u64).range(1..)),
        )
        .arg(
            Arg::new(ARG_REMEMBER_FILE)
                .long("remember-file")
                .help("Where the remembered login is kept (default: <config dir>/wangshu/remembered_user.json)")
                .env("WANGSHU_REMEMBER_FILE")
                .global(true),
        )
}

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

    let command = Command::new("wangshu")
        .about("Wangshu Echo forum client")
        .version(env!("CARGO_PKG_VERSION"))
        .long_version(long_version)
        .color(ColorChoice::Auto)
        .styles(styles)
        .subcommand_required(true)
        .arg_required_else_help(true);

    let command = with_forum_args(command);
    let command = account::subcommands(command);
    let command = compose::subcommands(command);
    logging::with_args(command)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use account::{ARG_EMAIL, ARG_PASSWORD, ARG_USERNAME, CMD_REGISTER};

    #[test]
    fn test_new() {
        let command = new();

        assert_eq!(command.get_name(), "wangshu");
        assert_eq!(
            command.get_about().map(ToString::to_string),
            Some("Wangshu Echo forum client".to_string())
        );
        assert_eq!(
            command.get_version().map(ToString::to_string),
            Some(env!("CARGO_PKG_VERSION").to_string())
        );
    }

    #[test]
    fn test_register_args() {
        temp_env::with_vars(
            [
                ("WANGSHU_PASSWORD", None::<&str>),
                ("WANGSHU_BASE_URL", None::<&str>),
            ],
            || {
                let matches = new().get_matches_from(vec![
                    "wangshu",
                    "register",
                    "--username",
                    "reader",
                    "--email",
                    "reader@example.com",
                    "--code",
                    "1234",
                    "--password",
                    "hunter22",
                ]);

                assert_eq!(
                    matches.get_one::<String>(ARG_BASE_URL).cloned(),
                    Some(DEFAULT_BASE_URL.to_string())
                );
                let (name, sub) = matches.subcommand().unwrap();
                assert_eq!(name, CMD_REGISTER);
                assert_eq!(
                    sub.get_one::<String>(ARG_USERNAME).cloned(),
                    Some("reader".to_string())
                );
                assert_eq!(
                    sub.get_one::<String>(ARG_EMAIL).cloned(),
                    Some("reader@example.com".to_string())
                );
                assert_eq!(
                    sub.get_one::<String>(ARG_PASSWORD).cloned(),
                    Some("hunter22".to_string())
                );
            },
        );
    }

    #[test]
    fn test_check_env() {
        temp_env::with_vars(
            [
                ("WANGSHU_BASE_URL", Some("https://echo.example")),
                ("WANGSHU_PASSWORD", Some("hunter22")),
                ("WANGSHU_TIMEOUT", Some("7")),
                ("WANGSHU_REMEMBER_FILE", Some("/tmp/remembered.json")),
                ("WANGSHU_LOG_LEVEL", Some("info")),
            ],
            || {
                let matches = new().get_matches_from(vec!["wangshu", "login", "-i", "reader"]);
                assert_eq!(
                    matches.get_one::<String>(ARG_BASE_URL).cloned(),
                    Some("https://echo.example".to_string())
                );
                assert_eq!(matches.get_one::<u64>(ARG_TIMEOUT).copied(), Some(7));
                assert_eq!(
                    matches.get_one::<String>(ARG_REMEMBER_FILE).cloned(),
                    Some("/tmp/remembered.json".to_string())
                );
                assert_eq!(
                    matches.get_one::<u8>(logging::ARG_VERBOSITY).copied(),
                    Some(2)
                );

                let (_, sub) = matches.subcommand().unwrap();
                assert_eq!(
                    sub.get_one::<String>(ARG_PASSWORD).cloned(),
                    Some("hunter22".to_string())
                );
            },
        );
    }

    #[test]
    fn test_missing_password_is_rejected() {
        temp_env::with_vars([("WANGSHU_PASSWORD", None::<&str>)], || {
            let result = new().try_get_matches_from(vec!["wangshu", "login", "-i", "reader"]);
            assert!(result.is_err());
        });
    }

    #[test]
    fn test_zero_timeout_is_rejected() {
        temp_env::with_vars([("WANGSHU_TIMEOUT", None::<&str>)], || {
            let result = new().try_get_matches_from(vec![
                "wangshu",
                "--timeout",
                "0",
                "draft",
                "--title",
                "Moon",
            ]);
            assert!(result.is_err());
        });
    }

    #[test]
    fn test_check_log_level_env() {
        let levels = ["error", "warn", "info", "debug", "trace"];
        for (index, &level) in levels.iter().enumerate() {
            temp_env::with_vars([("WANGSHU_LOG_LEVEL", Some(level))], || {
                let matches =
                    new().get_matches_from(vec!["wangshu", "draft", "--title", "Moon"]);
                assert_eq!(
                    matches.get_one::<u8>(logging::ARG_VERBOSITY).copied(),
                    u8::try_from(index).ok()
                );
            });
        }
    }

    #[test]
    fn test_check_log_level_verbosity() {
        for index in 0..5_usize {
            temp_env::with_vars([("WANGSHU_LOG_LEVEL", None::<String>)], || {
                let mut args = vec![
                    "wangshu".to_string(),
                    "draft".to_string(),
                    "--title".to_string(),
                    "Moon".to_string(),
                ];

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
