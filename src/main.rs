// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
use anyhow::{Context, Result};
use clap::Parser;
use signboard_reader_node::{
    api::{start_server, AppState},
    cli::Args,
    config::AssetStoreConfig,
    pipeline::{PipelineSettings, SignboardPipeline},
    storage::{AssetStore, CloudinaryStore, DisabledAssetStore},
    version,
    vision::VisionModelManager,
};
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    dotenv::dotenv().ok();

    // Initialize tracing subscriber for logging
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let args = Args::parse();

    println!("🚀 Starting Signboard Reader Node...\n");
    println!("📦 BUILD VERSION: {}", version::VERSION);
    println!("📅 Build Date: {}", version::BUILD_DATE);
    println!();

    let server_config = args.server_config();
    server_config
        .validate()
        .context("Invalid server configuration")?;

    println!("🧠 Loading vision models...");
    let models = VisionModelManager::new(args.vision_config())
        .await
        .context("Failed to load vision models")?;
    println!("✅ Vision models loaded");

    let store: Arc<dyn AssetStore> = match AssetStoreConfig::from_env() {
        Ok(config) => Arc::new(
            CloudinaryStore::new(config).context("Failed to create Cloudinary client")?,
        ),
        Err(e) => {
            tracing::warn!("⚠️ Cloudinary not configured ({}); uploads disabled", e);
            Arc::new(DisabledAssetStore)
        }
    };

    if let Some(dir) = server_config.retained_dir() {
        println!("💾 Retaining originals in {}", dir.display());
    }

    let pipeline = SignboardPipeline::new(&models, store, PipelineSettings::from(&server_config));
    let state = AppState::new(pipeline, models);

    println!("🌐 Serving on {}:{}", server_config.host, server_config.port);
    start_server(state, &server_config).await
}
