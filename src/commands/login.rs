use async_trait::async_trait;

use super::{Command, CommandResult, SessionInfo};
use crate::auth::AuthError;

pub struct LoginCommand;

#[async_trait]
impl Command for LoginCommand {
    fn name(&self) -> &str {
        "/login"
    }

    fn description(&self) -> &str {
        "sign in to parley cloud"
    }

    async fn execute(&self, info: &SessionInfo<'_>) -> CommandResult {
        if info.session.authenticated() {
            println!("already signed in — /logout first to switch accounts");
            return CommandResult::Handled;
        }

        println!("Signing in to parley cloud...\n");
        match info.session.sign_in().await {
            Ok(()) => {
                let who = info
                    .session
                    .profile()
                    .map(|p| p.preferred_username.or(p.name).unwrap_or(p.sub))
                    .unwrap_or_else(|| "parley cloud".to_string());
                println!("  ✓ signed in as {who}");
            }
            // Dismissed the browser — not a failure, nothing to report.
            Err(AuthError::Cancelled) => println!("  sign-in cancelled"),
            Err(e) => eprintln!("  ✗ sign-in failed: {e}"),
        }
        CommandResult::Handled
    }
}
