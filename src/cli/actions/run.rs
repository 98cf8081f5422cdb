use crate::cli::actions::{account, compose, Action};
use anyhow::Result;

/// Execute the provided action.
// This is the single dispatch point for all CLI actions.
/// # Errors
/// Returns an error if the action fails.
pub async fn execute(action: Action) -> Result<()> {
    match action {
        Action::Register(args) => account::register(args).await,
        Action::SendCode(args) => account::send_code(args).await,
        Action::Login(args) => account::login(args).await,
        Action::Post(args) => compose::post(args).await,
        Action::Draft(args) => compose::draft(args).await,
        Action::Comment(args) => compose::comment(args).await,
    }
}
