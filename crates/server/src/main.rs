use color_eyre::eyre::WrapErr;
use disaster_ops::AppResources;
use disaster_ops::api::start_webserver;
use disaster_ops::assistant::AssistantClient;
use disaster_ops::config::load_config;
use rustls::crypto;
use rustls::crypto::CryptoProvider;
use sea_orm::Database;
use std::sync::Arc;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

fn initialize_tracing() {
    let default_directives = "disaster_ops=info,hyper=warn,sea_orm=info";
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_directives));

    let registry = tracing_subscriber::registry().with(env_filter);
    let layer = fmt::layer().with_target(true).with_level(true);

    registry.with(layer).init();
}

#[tokio::main]
async fn main() -> color_eyre::eyre::Result<()> {
    color_eyre::install()?;
    initialize_tracing();

    let config = Arc::new(load_config().wrap_err("Failed to load configuration")?);

    if CryptoProvider::install_default(crypto::ring::default_provider()).is_err() {
        tracing::debug!("Crypto provider already installed");
    }

    let db = Arc::new(
        Database::connect(&config.database_url)
            .await
            .wrap_err("Failed to connect to database")?,
    );

    let assistant = Arc::new(
        AssistantClient::new(config.assistant.clone())
            .wrap_err("Failed to set up assistant client")?,
    );
    if config.assistant.api_key.is_none() {
        tracing::warn!("No assistant API key configured, /api/chat will answer with an error");
    }

    let resources = AppResources {
        db,
        config,
        assistant,
    };
    tracing::info!(bind = %resources.config.bind_address, "Starting disaster operations backend");

    start_webserver(resources).await
}
