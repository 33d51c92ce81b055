//! Command-line entry point: gather credentials and the target group,
//! launch the browser engine, and hand control to the unban session.

use std::sync::Arc;
use std::time::Duration;

use anyhow::{ensure, Context, Result};
use clap::Parser;
use engine_bridge::{ChromiumEngine, EngineConfig, PageEngine};
use tracing::info;
use tracing_subscriber::EnvFilter;
use unban_core::{SessionConfig, UnbanSession};

mod cli;
mod credentials;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let args = cli::Cli::parse();

    // Credentials are fatal-at-startup: nothing navigates without them.
    let creds = credentials::acquire()?;
    let group = match args.group {
        Some(group) => group,
        None => credentials::prompt_line(
            "Enter group name (e.g. sencha.indo.admin from /groups/sencha.indo.admin): ",
        )?,
    };
    ensure!(!group.is_empty(), "group name must not be empty");

    let mut engine_config = EngineConfig::default();
    engine_config.headless = args.headless;
    if let Some(chrome) = args.chrome {
        engine_config.executable = Some(chrome);
    }

    let engine: Arc<dyn PageEngine> = Arc::new(
        ChromiumEngine::launch(engine_config)
            .await
            .context("failed to launch browser engine")?,
    );

    let mut session_config = SessionConfig::new(group);
    session_config.home_url = args.home_url;
    session_config.poll_interval = Duration::from_secs(args.poll_interval_secs.max(1));
    session_config.watchdog_timeout = Duration::from_secs(args.watchdog_secs.max(1));

    info!(group = %session_config.group, "starting unban session");
    UnbanSession::new(engine, creds, session_config)
        .context("failed to build session")?
        .run()
        .await
        .context("session failed")?;

    Ok(())
}
