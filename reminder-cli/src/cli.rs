use anyhow::Context;
use chrono::Local;
use clap::{Parser, Subcommand, ValueEnum};
use inquire::{Password, Text};
use tracing::{info, warn};

use reminder_core::{AppState, Config, ProviderId, render, server};

/// Top-level CLI struct.
#[derive(Debug, Parser)]
#[command(name = "reminder", version, about = "Weather, news and to-do backend")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Run the HTTP server.
    Serve {
        /// Listen address, overriding the config file (e.g. "127.0.0.1:8080").
        #[arg(long)]
        bind: Option<String>,
    },

    /// Configure credentials for a specific provider.
    Configure {
        /// Provider short name, "kma" or "naver".
        provider: String,
    },

    /// Fetch once and print a rendered panel.
    Show {
        #[arg(value_enum)]
        panel: Panel,
    },
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum Panel {
    Today,
    Future,
    News,
}

/// Config file overlaid with `API_KEY` / `NAVER_CLIENT_*` from the environment.
fn effective_config() -> anyhow::Result<Config> {
    let mut config = Config::load()?;
    config.apply_env();
    Ok(config)
}

impl Cli {
    pub async fn run(self) -> anyhow::Result<()> {
        match self.command {
            Command::Serve { bind } => {
                let mut config = effective_config()?;
                if let Some(bind) = bind {
                    config.server.bind = bind;
                }
                for id in ProviderId::all() {
                    if !config.is_provider_configured(*id) {
                        warn!(provider = %id, "provider has no credentials; its endpoint will fail");
                    }
                }
                server::serve(&config).await
            }
            Command::Configure { provider } => configure(&provider),
            Command::Show { panel } => show(panel).await,
        }
    }
}

fn configure(provider: &str) -> anyhow::Result<()> {
    let id = ProviderId::try_from(provider)?;
    // Env overrides stay out of the saved file.
    let mut config = Config::load()?;

    let (key_label, secret) = if id.needs_secret() {
        ("Client ID:", true)
    } else {
        ("API key:", false)
    };

    let api_key = Text::new(key_label)
        .prompt()
        .context("Failed to read credentials")?;

    let secret = if secret {
        let value = Password::new("Client secret:")
            .without_confirmation()
            .prompt()
            .context("Failed to read client secret")?;
        Some(value)
    } else {
        None
    };

    config.upsert_provider_credentials(id, api_key.trim().to_string(), secret);
    config.save()?;

    let path = Config::config_file_path()?;
    info!(provider = %id, path = %path.display(), "credentials saved");
    println!("Saved {id} credentials to {}", path.display());
    Ok(())
}

async fn show(panel: Panel) -> anyhow::Result<()> {
    let config = effective_config()?;
    let state = AppState::from_config(&config)?;
    let now = Local::now().naive_local();

    let html = match panel {
        Panel::Today => {
            let records = state.weather.records().await?;
            let (today, preview) = render::select_today(&records, now);
            render::render_today(&today, &preview)
        }
        Panel::Future => {
            let records = state.weather.records().await?;
            render::render_future(&render::select_future(&records, now))
        }
        Panel::News => render::render_news(&state.news.articles().await?),
    };

    println!("{html}");
    Ok(())
}
