use std::io::{self, Write};
use std::sync::Arc;

use clap::{Parser, Subcommand, ValueEnum};
use tokio::io::{AsyncBufReadExt, BufReader};

use parley::auth::{
    AuthError, AuthSession, BrowserPresenter, HttpIdentityProvider, OAuthFlowCoordinator,
    ProviderConfig, SqliteStore,
};
use parley::backend::cloud::CloudBackend;
use parley::backend::local::LocalBackend;
use parley::backend::{ChatBackend, ChatMessage};
use parley::banner::{BannerInfo, print_banner, print_farewell};
use parley::commands::{CommandRegistry, CommandResult, SessionInfo};
use parley::config::Config;
use parley::consts::{DEFAULT_ACCOUNT, default_db_path};

#[derive(Debug, Clone, ValueEnum)]
enum Backend {
    Cloud,
    Local,
}

#[derive(Parser)]
#[command(name = "parley", version, about = "A chat client for whichever model you like.")]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,

    /// Chat backend
    #[arg(short, long, value_enum)]
    backend: Option<Backend>,

    /// Model name (backend-specific)
    #[arg(long)]
    model: Option<String>,

    /// Base URL of the local inference server
    #[arg(long)]
    local_url: Option<String>,

    /// SQLite database path for credentials and config
    /// (use :memory: for ephemeral)
    #[arg(short, long)]
    db: Option<String>,
}

#[derive(Subcommand)]
enum Command {
    /// Sign in to parley cloud via OAuth
    Login,
    /// Sign out and delete the stored credential
    Logout,
    /// Show the signed-in account
    Whoami,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let db = resolve_db_path(cli.db.as_deref())?;
    let session = build_session(&db)?;

    if let Some(command) = &cli.command {
        match command {
            Command::Login => return handle_login(&session).await,
            Command::Logout => {
                session.sign_out().await;
                println!("✓ signed out");
                return Ok(());
            }
            Command::Whoami => return handle_whoami(&session).await,
        }
    }

    session.load_stored_credential().await;

    let config = Config::open(&db)?;
    let backend_kind = match cli.backend {
        Some(b) => b,
        None => match config.get("backend")?.as_deref() {
            Some("local") => Backend::Local,
            _ => Backend::Cloud,
        },
    };

    // Wire up the backend, remembering the choice for next time
    let (backend, backend_name, model): (Box<dyn ChatBackend>, &str, String) = match backend_kind {
        Backend::Cloud => {
            let model = cli.model.clone().or(config.get("model.cloud")?);
            let cloud = CloudBackend::new(session.clone(), model);
            let model = cloud.model().to_string();
            config.set("backend", "cloud")?;
            config.set("model.cloud", &model)?;
            (Box::new(cloud), "cloud", model)
        }
        Backend::Local => {
            let model = cli.model.clone().or(config.get("model.local")?);
            let local = LocalBackend::new(cli.local_url.clone(), model);
            let model = local.model().to_string();
            config.set("backend", "local")?;
            config.set("model.local", &model)?;
            (Box::new(local), "local", model)
        }
    };

    let auth_status = if session.authenticated() {
        let who = session
            .profile()
            .map(|p| p.preferred_username.or(p.name).unwrap_or(p.sub))
            .unwrap_or_default();
        format!("signed in ✓ {who}")
    } else {
        "not signed in".to_string()
    };

    print_banner(&BannerInfo {
        backend: backend_name,
        model: &model,
        auth_status: &auth_status,
        db: &db,
    });

    run_repl(backend.as_ref(), backend_name, &model, &session).await?;
    print_farewell();
    Ok(())
}

async fn run_repl(
    backend: &dyn ChatBackend,
    backend_name: &str,
    model: &str,
    session: &Arc<AuthSession>,
) -> anyhow::Result<()> {
    let registry = CommandRegistry::new();
    let mut transcript: Vec<ChatMessage> = Vec::new();

    // Async stdin so Ctrl+C is caught at the prompt too
    let stdin = BufReader::new(tokio::io::stdin());
    let mut lines = stdin.lines();

    loop {
        print!("\nparley> ");
        io::stdout().flush()?;

        let line = tokio::select! {
            result = lines.next_line() => {
                match result {
                    Ok(Some(line)) => line,
                    Ok(None) => {
                        // Ctrl+D (EOF)
                        println!();
                        break;
                    }
                    Err(e) => {
                        eprintln!("input error: {e}");
                        break;
                    }
                }
            }
            _ = tokio::signal::ctrl_c() => {
                println!();
                break;
            }
        };

        let input = line.trim();
        if input.is_empty() {
            continue;
        }

        let info = SessionInfo {
            backend: backend_name,
            model,
            session,
        };
        match registry.dispatch(input, &info).await {
            CommandResult::Quit => break,
            CommandResult::Handled => continue,
            CommandResult::NotACommand => {}
        }

        transcript.push(ChatMessage::user(input));

        // Ctrl+C during generation cancels the turn, not the REPL
        tokio::select! {
            result = backend.send(&transcript) => {
                match result {
                    Ok(reply) => {
                        println!("\n{reply}");
                        transcript.push(ChatMessage::assistant(reply));
                    }
                    Err(e) => {
                        eprintln!("\nerror: {e}");
                        transcript.pop();
                    }
                }
            }
            _ = tokio::signal::ctrl_c() => {
                println!("\n\ninterrupted");
                transcript.pop();
            }
        }
    }

    Ok(())
}

async fn handle_login(session: &Arc<AuthSession>) -> anyhow::Result<()> {
    session.load_stored_credential().await;
    if session.authenticated() {
        println!("already signed in — run `parley logout` first to switch accounts");
        return Ok(());
    }

    println!("Signing in to parley cloud...\n");
    match session.sign_in().await {
        Ok(()) => {
            let who = session
                .profile()
                .map(|p| p.preferred_username.or(p.name).unwrap_or(p.sub))
                .unwrap_or_else(|| "parley cloud".to_string());
            println!("✓ signed in as {who}");
            Ok(())
        }
        Err(AuthError::Cancelled) => {
            println!("sign-in cancelled");
            Ok(())
        }
        Err(e) => anyhow::bail!("sign-in failed: {e}"),
    }
}

async fn handle_whoami(session: &Arc<AuthSession>) -> anyhow::Result<()> {
    session.load_stored_credential().await;
    if !session.authenticated() {
        println!("not signed in — run `parley login`");
        return Ok(());
    }
    match session.profile() {
        Some(p) => {
            println!("  account   {}", p.sub);
            if let Some(name) = p.name {
                println!("  name      {name}");
            }
            if let Some(username) = p.preferred_username {
                println!("  username  {username}");
            }
            if let Some(email) = p.email {
                println!("  email     {email}");
            }
        }
        None => println!("signed in (profile unavailable)"),
    }
    Ok(())
}

/// Resolve the database path, creating `~/.parley/` on first run.
fn resolve_db_path(flag: Option<&str>) -> anyhow::Result<String> {
    match flag {
        Some(path) => Ok(path.to_string()),
        None => {
            let path = default_db_path();
            if let Some(parent) = path.parent() {
                std::fs::create_dir_all(parent)?;
            }
            Ok(path.to_string_lossy().into_owned())
        }
    }
}

fn build_session(db: &str) -> anyhow::Result<Arc<AuthSession>> {
    let config = ProviderConfig::parley_cloud();
    let provider = Arc::new(HttpIdentityProvider::new(config.clone()));
    let coordinator = Arc::new(OAuthFlowCoordinator::new(
        config,
        provider.clone(),
        Arc::new(BrowserPresenter),
    ));
    let store = Arc::new(SqliteStore::open(db)?);
    Ok(Arc::new(AuthSession::new(
        coordinator,
        provider,
        store,
        DEFAULT_ACCOUNT,
    )))
}
