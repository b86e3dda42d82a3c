use async_trait::async_trait;

use super::{Command, CommandResult, SessionInfo};

pub struct WhoamiCommand;

#[async_trait]
impl Command for WhoamiCommand {
    fn name(&self) -> &str {
        "/whoami"
    }

    fn description(&self) -> &str {
        "show backend, model, and session status"
    }

    async fn execute(&self, info: &SessionInfo<'_>) -> CommandResult {
        println!("  backend   {} ({})", info.backend, info.model);
        if info.session.authenticated() {
            match info.session.profile() {
                Some(p) => {
                    let who = p
                        .preferred_username
                        .or(p.name)
                        .unwrap_or_else(|| p.sub.clone());
                    println!("  signed in {who}");
                    if let Some(email) = p.email {
                        println!("  email     {email}");
                    }
                }
                None => println!("  signed in (profile unavailable)"),
            }
        } else {
            println!("  signed in no");
        }
        if let Some(err) = info.session.last_error() {
            println!("  last err  {err}");
        }
        CommandResult::Handled
    }
}
