//! Maps validated CLI matches to the action to run.

use crate::cli::{
    actions::{
        account::{LoginArgs, RegisterArgs, SendCodeArgs},
        compose::{CommentArgs, DraftArgs, PostArgs},
        Action,
    },
    commands::{
        account::{
            ARG_CODE, ARG_CONFIRM_PASSWORD, ARG_EMAIL, ARG_IDENTIFIER, ARG_PASSWORD,
            ARG_REMEMBER, ARG_USERNAME, CMD_LOGIN, CMD_REGISTER, CMD_SEND_CODE,
        },
        compose::{ARG_CONTENT, ARG_IMAGE, ARG_POST_ID, ARG_TITLE, CMD_COMMENT, CMD_DRAFT, CMD_POST},
    },
    globals::GlobalArgs,
};
use anyhow::{bail, Context, Result};
use clap::ArgMatches;
use secrecy::SecretString;
use std::path::PathBuf;

fn required(matches: &ArgMatches, name: &str) -> Result<String> {
    matches
        .get_one::<String>(name)
        .cloned()
        .with_context(|| format!("missing required argument: --{name}"))
}

/// # Errors
/// Returns an error if required arguments are missing or inconsistent.
pub fn handler(matches: &ArgMatches) -> Result<Action> {
    let globals = GlobalArgs::parse(matches)?;

    let Some((name, sub)) = matches.subcommand() else {
        bail!("missing subcommand");
    };

    let action = match name {
        CMD_REGISTER => {
            let password = required(sub, ARG_PASSWORD)?;
            let confirm_password = sub
                .get_one::<String>(ARG_CONFIRM_PASSWORD)
                .cloned()
                .unwrap_or_else(|| password.clone());

            Action::Register(RegisterArgs {
                globals,
                username: required(sub, ARG_USERNAME)?,
                email: required(sub, ARG_EMAIL)?,
                code: required(sub, ARG_CODE)?,
                password: SecretString::from(password),
                confirm_password: SecretString::from(confirm_password),
            })
        }
        CMD_SEND_CODE => Action::SendCode(SendCodeArgs {
            globals,
            email: required(sub, ARG_EMAIL)?,
        }),
        CMD_LOGIN => Action::Login(LoginArgs {
            globals,
            identifier: sub.get_one::<String>(ARG_IDENTIFIER).cloned(),
            password: SecretString::from(required(sub, ARG_PASSWORD)?),
            remember: sub.get_flag(ARG_REMEMBER),
        }),
        CMD_POST => Action::Post(PostArgs {
            globals,
            title: required(sub, ARG_TITLE)?,
            content: required(sub, ARG_CONTENT)?,
            image: sub.get_one::<String>(ARG_IMAGE).map(PathBuf::from),
        }),
        CMD_DRAFT => Action::Draft(DraftArgs {
            globals,
            title: required(sub, ARG_TITLE)?,
        }),
        CMD_COMMENT => Action::Comment(CommentArgs {
            globals,
            post_id: sub
                .get_one::<u64>(ARG_POST_ID)
                .copied()
                .context("missing required argument: --post-id")?,
            content: required(sub, ARG_CONTENT)?,
        }),
        other => bail!("unknown subcommand: {other}"),
    };

    Ok(action)
}
