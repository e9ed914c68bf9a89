use std::sync::Arc;

use anyhow::Context;
use chrono::Duration;
use mongodb::options::ClientOptions;
use mongodb::Client;
use tokio::net::TcpListener;

use ledgerline_backend::app;
use ledgerline_backend::config::{AppConfig, StorageBackend};
use ledgerline_backend::db::{
    AccountStore, MemoryAccountStore, MemoryUserStore, MongoAccountStore, MongoUserStore, UserStore,
};
use ledgerline_backend::logging::{init_logging, LoggingConfig};
use ledgerline_backend::services::auth::AuthHandler;
use ledgerline_backend::state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    // Initialize logging FIRST
    let logging = LoggingConfig::from_env().map_err(anyhow::Error::msg)?;
    init_logging(&logging).map_err(|e| anyhow::anyhow!(e.to_string()))?;

    let config = AppConfig::from_env().map_err(anyhow::Error::msg)?;

    // The client is built once here and handed to the stores; it is shut down
    // after the server stops accepting requests.
    let mut mongo_client: Option<Client> = None;
    let (accounts, users): (Arc<dyn AccountStore>, Arc<dyn UserStore>) = match config.storage {
        StorageBackend::Mongo => {
            let url = config.db_url.as_deref().context("DB_URL is not set")?;
            let options = ClientOptions::parse(url)
                .await
                .context("Failed to parse DB_URL")?;
            let client = Client::with_options(options).context("Failed to create MongoDB client")?;
            let db = client.database(&config.db_name);

            let users = MongoUserStore::new(&db);
            users
                .ensure_indexes()
                .await
                .context("Failed to reach MongoDB")?;
            tracing::info!("Using MongoDB database '{}'", config.db_name);

            mongo_client = Some(client);
            (Arc::new(MongoAccountStore::new(&db)), Arc::new(users))
        }
        StorageBackend::Memory => {
            tracing::warn!("Using in-memory storage; data is lost on shutdown");
            (Arc::new(MemoryAccountStore::new()), Arc::new(MemoryUserStore::new()))
        }
    };

    let state = AppState {
        accounts,
        users,
        auth: AuthHandler::new(&config.jwt_secret, Duration::hours(config.jwt_ttl_hours)),
    };
    let app = app::create_app(state);

    let listener = TcpListener::bind(&config.bind_addr)
        .await
        .with_context(|| format!("Failed to bind {}", config.bind_addr))?;
    tracing::info!("Ledgerline backend running at http://{}/", config.bind_addr);
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    if let Some(client) = mongo_client {
        client.shutdown().await;
        tracing::info!("MongoDB client closed");
    }
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
    }
    tracing::info!("Shutdown signal received");
}
