//! `-v` / `WANGSHU_LOG_LEVEL`. Each extra `v` shows one more level of the
//! forum client's request logging on stderr.

use clap::{builder::ValueParser, Arg, ArgMatches, Command};
use tracing::Level;

pub const ARG_VERBOSITY: &str = "verbosity";

/// Indexed by verbosity count.
const LEVELS: [(&str, Level); 5] = [
    ("error", Level::ERROR),
    ("warn", Level::WARN),
    ("info", Level::INFO),
    ("debug", Level::DEBUG),
    ("trace", Level::TRACE),
];

/// Accepts a level name or a count, so `WANGSHU_LOG_LEVEL=debug` and
/// `WANGSHU_LOG_LEVEL=3` mean the same as `-vvv`.
#[must_use]
pub fn validator_log_level() -> ValueParser {
    ValueParser::from(move |level: &str| -> std::result::Result<u8, String> {
        if let Ok(count) = level.parse::<u8>() {
            if usize::from(count) < LEVELS.len() {
                return Ok(count);
            }
        }

        LEVELS
            .iter()
            .position(|(name, _)| name.eq_ignore_ascii_case(level))
            .and_then(|index| u8::try_from(index).ok())
            .ok_or_else(|| {
                format!("invalid log level '{level}', expected error, warn, info, debug or trace")
            })
    })
}

/// Tracing level for the parsed verbosity; `None` leaves the default (errors only).
#[must_use]
pub fn level(matches: &ArgMatches) -> Option<Level> {
    match matches.get_one::<u8>(ARG_VERBOSITY).copied() {
        None | Some(0) => None,
        Some(count) => LEVELS
            .get(usize::from(count))
            .or(LEVELS.last())
            .map(|(_, level)| *level),
    }
}

#[must_use]
pub fn with_args(command: Command) -> Command {
    command.arg(
        Arg::new(ARG_VERBOSITY)
            .short('v')
            .long("verbose")
            .help("Show forum request logs: -v warn, -vv info, -vvv debug, -vvvv trace")
            .env("WANGSHU_LOG_LEVEL")
            .global(true)
            .action(clap::ArgAction::Count)
            .value_parser(validator_log_level()),
    )
}
