//! Storefront media service

use anyhow::Result;
use storefront::{cloudinary::CloudinaryClient, routes, StorefrontConfig};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::registry().with(tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into())).with(tracing_subscriber::fmt::layer()).init();
    let config = StorefrontConfig::from_env()?;
    let cloudinary = config.cloudinary.clone().map(|c| CloudinaryClient::new(c, config.request_timeout_secs)).transpose()?;
    if cloudinary.is_none() { tracing::warn!("Cloudinary credentials not set; media deletion will fail"); }
    tracing::info!(api = %config.api_base_url, storage = %config.storage_dir.display(), "cart backend configured");
    let app = routes::router(routes::AppState::new(cloudinary));

    tracing::info!("🚀 Storefront media service listening on 0.0.0.0:{}", config.port);
    axum::serve(tokio::net::TcpListener::bind(format!("0.0.0.0:{}", config.port)).await?, app).await?;
    Ok(())
}
