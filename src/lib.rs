//! `helpp` asks a Gemini model short CLI questions.
//!
//! The API key and model name are stored in `~/.config/helpp/env`, which is
//! created with an empty `GEMINI_API_KEY` on first run.

pub mod cli;
pub mod config;
pub mod dispatch;
pub mod env_file;
pub mod logging;
pub mod providers;

use anyhow::{Context, Result};
use reqwest::Client;
use tracing::debug;

use cli::Cli;
use config::ApiConfig;
use dispatch::Dispatcher;

pub async fn run(cli: Cli) -> Result<()> {
    let env_path = env_file::init_user_env()?;
    debug!(path = %env_path.display(), "resolved config file");

    let Some(prompt) = cli.prompt() else {
        logging::shutdown();
        Cli::exit_missing_question();
    };

    let cfg = ApiConfig::from_env_file(&env_path, cli.detail_level())?;
    let client = Client::builder()
        .build()
        .context("Failed to initialize HTTP client")?;

    let answer = Dispatcher::new(client, &cfg).ask(&prompt).await?;
    println!("{answer}");
    Ok(())
}
