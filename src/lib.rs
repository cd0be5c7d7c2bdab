pub mod audio;
pub mod catalog;
pub mod cli;
pub mod models;
pub mod session;
pub mod settings;
pub mod timer;
mod utils;

use std::{path::PathBuf, sync::Arc};

use anyhow::{anyhow, Context, Result};
use clap::Parser;

use audio::AlertPlayer;
use catalog::{find_method, suggest, BrewingMethod, CatalogLoader, CatalogSource, HttpCatalogSource};
use session::BrewSession;
use settings::SettingsStore;

/// Everything a front end needs, wired together once at startup.
pub struct AppState {
    pub catalog: CatalogLoader,
    pub alert: AlertPlayer,
    pub settings: SettingsStore,
}

impl AppState {
    pub fn new(settings: SettingsStore, source: Arc<dyn CatalogSource>) -> Self {
        let alert = AlertPlayer::new(&settings.alert());
        Self {
            catalog: CatalogLoader::new(source),
            alert,
            settings,
        }
    }

    /// Builds the state against the HTTP catalog configured in `settings`.
    pub fn from_settings(settings: SettingsStore) -> Result<Self> {
        let config = settings.settings();
        let source = HttpCatalogSource::new(&config.catalog_url, config.request_timeout())?;
        log::info!("Using brewing method catalog at {}", source.url());
        Ok(Self::new(settings, Arc::new(source)))
    }

    pub fn suggest(&self, flavor: &str) -> Option<BrewingMethod> {
        suggest(flavor, &self.catalog.methods()).cloned()
    }

    pub fn method(&self, id: &str) -> Option<BrewingMethod> {
        find_method(id, &self.catalog.methods()).cloned()
    }

    /// Opens a guided session over a loaded method.
    pub fn start_brew(&self, method_id: &str, cups: u32) -> Result<BrewSession> {
        let method = self
            .method(method_id)
            .ok_or_else(|| anyhow!("unknown brewing method '{method_id}'"))?;
        BrewSession::new(Arc::new(method), cups)
            .with_context(|| format!("cannot brew '{method_id}' for {cups} cups"))
    }
}

pub fn run() -> Result<()> {
    // Initialize logging (reads RUST_LOG env var)
    env_logger::Builder::new()
        .filter_level(log::LevelFilter::Info)
        .parse_default_env()
        .init();

    let args = cli::Cli::parse();
    log::debug!("BrewFlow starting up...");

    let settings_path: PathBuf = args.settings.clone();
    let settings = SettingsStore::new(settings_path)?;
    let state = AppState::from_settings(settings)?;

    let runtime = tokio::runtime::Runtime::new().context("Failed to start async runtime")?;
    runtime.block_on(cli::execute(&state, args.command))
}
