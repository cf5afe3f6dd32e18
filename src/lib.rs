pub mod cli;
pub mod core;
pub mod providers;

use crate::core::config::AppConfig;
use crate::core::QuoteServices;
use crate::providers::{CachingCatalog, FunkitProvider, StaticCatalog};
use anyhow::Result;
use std::sync::Arc;
use tracing::{debug, info};

/// Subcommands that run against a loaded configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AppCommand {
    Assets,
    Quote {
        sell: String,
        buy: Option<String>,
        amount: String,
    },
    Watch {
        sell: Option<String>,
        buy: Option<String>,
    },
}

/// Session-scoped collaborators built from configuration.
pub struct App {
    pub config: AppConfig,
    pub catalog: CachingCatalog<StaticCatalog>,
    pub services: QuoteServices,
}

impl App {
    pub fn from_config(config: AppConfig) -> Result<Self> {
        let catalog = match &config.assets {
            Some(assets) => StaticCatalog::new(assets.clone())?,
            None => StaticCatalog::builtin(),
        };

        let providers = config.providers.funkit.clone().unwrap_or_default();
        let funkit = Arc::new(FunkitProvider::new(
            &providers.base_url,
            providers.api_key.as_deref(),
        )?);
        let services = QuoteServices::new(funkit.clone(), funkit, config.cache_policy());

        Ok(Self {
            catalog: CachingCatalog::new(catalog),
            services,
            config,
        })
    }
}

pub async fn run_command(command: AppCommand, config_path: Option<&str>) -> Result<()> {
    info!("quotecast starting...");

    let config = match config_path {
        Some(path) => AppConfig::load_from_path(path)?,
        None => AppConfig::load()?,
    };
    debug!("Loaded config: {config:#?}");

    let app = App::from_config(config)?;

    match command {
        AppCommand::Assets => cli::assets::run(&app).await,
        AppCommand::Quote { sell, buy, amount } => {
            cli::quote::run(&app, &sell, buy.as_deref(), &amount).await
        }
        AppCommand::Watch { sell, buy } => {
            cli::watch::run(&app, sell.as_deref(), buy.as_deref()).await
        }
    }
}
