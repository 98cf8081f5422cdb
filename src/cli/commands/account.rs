use clap::{Arg, ArgAction, Command};

pub const CMD_REGISTER: &str = "register";
pub const CMD_SEND_CODE: &str = "send-code";
pub const CMD_LOGIN: &str = "login";

pub const ARG_USERNAME: &str = "username";
pub const ARG_EMAIL: &str = "email";
pub const ARG_CODE: &str = "code";
pub const ARG_PASSWORD: &str = "password";
pub const ARG_CONFIRM_PASSWORD: &str = "confirm-password";
pub const ARG_IDENTIFIER: &str = "identifier";
pub const ARG_REMEMBER: &str = "remember";

fn password_arg() -> Arg {
    Arg::new(ARG_PASSWORD)
        .short('p')
        .long("password")
        .help("Account password")
        .env("WANGSHU_PASSWORD")
        .hide_env_values(true)
        .required(true)
}

#[must_use]
pub fn subcommands(command: Command) -> Command {
    command
        .subcommand(
            Command::new(CMD_REGISTER)
                .about("Create an account with an emailed verification code")
                .arg(
                    Arg::new(ARG_USERNAME)
                        .short('u')
                        .long("username")
                        .help("Display name, 2 to 12 characters")
                        .required(true),
                )
                .arg(
                    Arg::new(ARG_EMAIL)
                        .short('e')
                        .long("email")
                        .help("Email address the code was sent to")
                        .required(true),
                )
                .arg(
                    Arg::new(ARG_CODE)
                        .short('c')
                        .long("code")
                        .help("4-digit verification code")
                        .required(true),
                )
                .arg(password_arg())
                .arg(
                    Arg::new(ARG_CONFIRM_PASSWORD)
                        .long("confirm-password")
                        .help("Password confirmation (default: same as --password)"),
                ),
        )
        .subcommand(
            Command::new(CMD_SEND_CODE)
                .about("Email a registration verification code")
                .arg(
                    Arg::new(ARG_EMAIL)
                        .short('e')
                        .long("email")
                        .help("Email address to verify")
                        .required(true),
                ),
        )
        .subcommand(
            Command::new(CMD_LOGIN)
                .about("Log in with a username or email")
                .arg(
                    Arg::new(ARG_IDENTIFIER)
                        .short('i')
                        .long("identifier")
                        .help("Username or email (default: the remembered login)"),
                )
                .arg(password_arg())
                .arg(
                    Arg::new(ARG_REMEMBER)
                        .short('r')
                        .long("remember")
                        .help("Remember the login for 7 days")
                        .action(ArgAction::SetTrue),
                ),
        )
}
