use async_trait::async_trait;

use super::{Command, CommandResult, SessionInfo};

/// Listed in the registry for discoverability; dispatch special-cases
/// `/help` because the full listing needs the registry itself.
pub struct HelpCommand;

#[async_trait]
impl Command for HelpCommand {
    fn name(&self) -> &str {
        "/help"
    }

    fn aliases(&self) -> &[&str] {
        &["/h", "/?"]
    }

    fn description(&self) -> &str {
        "list available commands"
    }

    async fn execute(&self, _info: &SessionInfo<'_>) -> CommandResult {
        CommandResult::Handled
    }
}
