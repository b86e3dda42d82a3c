use async_trait::async_trait;

use super::{Command, CommandResult, SessionInfo};

pub struct LogoutCommand;

#[async_trait]
impl Command for LogoutCommand {
    fn name(&self) -> &str {
        "/logout"
    }

    fn description(&self) -> &str {
        "sign out and delete the stored credential"
    }

    async fn execute(&self, info: &SessionInfo<'_>) -> CommandResult {
        info.session.sign_out().await;
        println!("  ✓ signed out");
        CommandResult::Handled
    }
}
