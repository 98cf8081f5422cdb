use crate::{
    cli::{actions::report, globals::GlobalArgs},
    forum::{
        cooldown::{Dispatch, COOLDOWN_STEPS},
        Login, LoginForm, Registration, RegistrationForm,
    },
};
use anyhow::{bail, Result};
use secrecy::SecretString;
use tracing::debug;

#[derive(Debug)]
pub struct RegisterArgs {
    pub globals: GlobalArgs,
    pub username: String,
    pub email: String,
    pub code: String,
    pub password: SecretString,
    pub confirm_password: SecretString,
}

#[derive(Debug)]
pub struct SendCodeArgs {
    pub globals: GlobalArgs,
    pub email: String,
}

#[derive(Debug)]
pub struct LoginArgs {
    pub globals: GlobalArgs,
    pub identifier: Option<String>,
    pub password: SecretString,
    pub remember: bool,
}

/// # Errors
/// Returns an error if the form is invalid or the forum rejects it.
pub async fn register(args: RegisterArgs) -> Result<()> {
    let api = args.globals.api()?;
    api.prefetch_token().await.map_err(report)?;

    let registration = Registration::new(api);
    let form = RegistrationForm {
        username: args.username,
        email: args.email,
        password: args.password,
        confirm_password: args.confirm_password,
        code: args.code,
    };

    let redirect = registration.submit(&form).await.map_err(report)?;

    if let Some(message) = redirect.message {
        println!("{message}");
    }
    println!("registered, continue at {}", redirect.target);

    Ok(())
}

/// # Errors
/// Returns an error if the address is invalid, taken, or the code cannot be sent.
pub async fn send_code(args: SendCodeArgs) -> Result<()> {
    let registration = Registration::new(args.globals.api()?);

    match registration.request_code(&args.email).await.map_err(report)? {
        Dispatch::Sent(message) => {
            println!("{message}");
            println!("a new code can be requested in {COOLDOWN_STEPS}s");
        }
        Dispatch::CoolingDown(remaining) => {
            println!("please wait {remaining}s before requesting another code");
        }
        Dispatch::InFlight => debug!("code request already in flight"),
    }

    Ok(())
}

/// # Errors
/// Returns an error if no identifier is known or the login is rejected.
pub async fn login(args: LoginArgs) -> Result<()> {
    let mut login = Login::new(args.globals.api()?);
    if let Some(store) = args.globals.remember_store() {
        login = login.with_remember(store);
    }

    let identifier = match args.identifier.or_else(|| login.remembered()) {
        Some(identifier) => identifier,
        None => bail!("no remembered login, pass --identifier"),
    };

    let form = LoginForm {
        identifier,
        password: args.password,
        remember: args.remember,
    };
    let success = login.submit(&form).await.map_err(report)?;

    println!("logged in as {}, continue at {}", success.identifier, success.redirect);

    Ok(())
}
