mod config;
mod errors;
mod routes;
mod screenplay;
mod state;

use anyhow::Result;
use std::net::SocketAddr;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::Config;
use crate::routes::build_router;
use crate::screenplay::{default_page_setup, ScreenplayFormatter};
use crate::state::AppState;

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration first (fails on malformed env vars)
    let config = Config::from_env()?;

    // Initialize structured logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!("{}={}", env!("CARGO_CRATE_NAME"), &config.rust_log))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting Slugline API v{}", env!("CARGO_PKG_VERSION"));

    // US Letter, Courier 12pt, 1.5" binding margin
    let page_setup = default_page_setup();
    info!(
        "Page setup: {}x{}mm, body {}pt",
        page_setup.page_width_mm, page_setup.page_height_mm, page_setup.body_font_pt
    );

    let formatter = ScreenplayFormatter::new(page_setup).with_staging_dir(config.staging_dir.clone());
    if let Some(dir) = &config.staging_dir {
        info!("Staging storyboard images in {}", dir.display());
    }

    // Build app state
    let state = AppState::new(config.clone(), formatter);

    // Build router
    let app = build_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive()); // TODO: restrict CORS origins once the web client has a fixed host

    let addr: SocketAddr = format!("0.0.0.0:{}", config.port).parse()?;
    info!("Listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
