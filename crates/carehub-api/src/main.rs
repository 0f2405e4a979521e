use std::sync::Arc;

use carehub_api::config::{self, LogFormat, StoreKind};
use carehub_api::AppState;
use carehub_storage::memory::MemoryStore;
use carehub_storage::s3::S3Store;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> eyre::Result<()> {
    let config = config::load_config()?;

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    match config.log_format {
        LogFormat::Json => tracing_subscriber::fmt().with_env_filter(filter).json().init(),
        LogFormat::Pretty => tracing_subscriber::fmt().with_env_filter(filter).init(),
    }

    let state = match config.store {
        StoreKind::S3 => {
            let s3 = carehub_storage::client::build_client().await;
            AppState::new(Arc::new(S3Store::new(s3, config.bucket.clone())))
        }
        StoreKind::Memory => AppState::new(Arc::new(MemoryStore::new())),
    };

    let listener = tokio::net::TcpListener::bind(&config.bind).await?;
    tracing::info!(bind = %config.bind, store = ?config.store, "carehub-api listening");

    axum::serve(listener, carehub_api::app(state)).await?;
    Ok(())
}
