pub mod account;
pub mod compose;

// Internal "interpreter" for `Action`.
mod run;

use crate::forum::{FormError, FormErrors};
use anyhow::anyhow;

#[derive(Debug)]
pub enum Action {
    Register(account::RegisterArgs),
    SendCode(account::SendCodeArgs),
    Login(account::LoginArgs),
    Post(compose::PostArgs),
    Draft(compose::DraftArgs),
    Comment(compose::CommentArgs),
}

impl Action {
    /// Execute the action.
    /// # Errors
    /// Returns an error if the action fails.
    pub async fn execute(self) -> anyhow::Result<()> {
        run::execute(self).await
    }
}

/// Prints field errors inline on stderr; workflow errors are returned as is.
fn report(err: FormError) -> anyhow::Error {
    if !err.is_field_scoped() {
        return anyhow::Error::new(err);
    }

    let mut errors = FormErrors::new();
    errors.apply(&err);
    if let Err(io_err) = errors.render(&mut std::io::stderr().lock()) {
        return anyhow!("{err} ({io_err})");
    }

    anyhow!("please correct the fields above")
}
