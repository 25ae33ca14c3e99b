//! cipherstudio: project manager and line-oriented studio session.
//! All state lives in one on-disk keyed store under the data directory.

use std::sync::Arc;

use chrono::Utc;
use clap::Parser;

use cipher_session::SessionController;
use cipher_store::{FileStore, ProjectRepository, ThemeStore};

mod cli;
mod cmd_projects;
mod cmd_theme;
mod config;
mod display;
mod studio;

fn init_tracing() {
    let filter = std::env::var("CIPHER_STUDIO_LOG")
        .or_else(|_| std::env::var("RUST_LOG"))
        .unwrap_or_else(|_| "warn".to_string());
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::new(filter))
        .with_writer(std::io::stderr)
        .init();
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = cli::Cli::parse();
    init_tracing();

    let config = config::StudioConfig::from_cli(&args);
    tracing::debug!(?config, "configuration resolved");

    let store = Arc::new(FileStore::open(&config.data_dir)?.with_quota(config.quota_bytes));
    let repo = ProjectRepository::new(Arc::clone(&store));

    let command = args
        .command
        .unwrap_or_else(|| cli::Command::Ls(cli::LsOpts::default()));

    match command {
        cli::Command::Ls(opts) => cmd_projects::cmd_ls(&repo, opts.json, Utc::now())?,
        cli::Command::New { name } => cmd_projects::cmd_new(&repo, &name, Utc::now())?,
        cli::Command::Rm { id } => cmd_projects::cmd_rm(&repo, &id)?,
        cli::Command::Rename { id, name } => {
            cmd_projects::cmd_rename(&repo, &id, &name, Utc::now())?;
        }
        cli::Command::Theme { action } => {
            let themes = ThemeStore::new(Arc::clone(&store));
            cmd_theme::cmd_theme(&themes, action)?;
        }
        cli::Command::Studio { id } => {
            let themes = ThemeStore::new(Arc::clone(&store));
            let mut session = SessionController::new(Arc::new(repo), config.autosave_coordinator());
            studio::run_studio(&mut session, &themes, &id).await?;
        }
    }

    Ok(())
}
