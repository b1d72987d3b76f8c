mod api;
mod middleware;

use std::sync::Arc;

use geoguess_geocoder::AreaResolver;
use geoguess_streetview::StreetViewClient;
use tracing_subscriber::EnvFilter;

use crate::api::{build_app, AppState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let config = Arc::new(geoguess_core::load_app_config()?);
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(config.log_level.clone()))?;
    tracing_subscriber::fmt().with_env_filter(env_filter).init();

    let resolver = AreaResolver::from_app_config(&config)?;
    let warmed = resolver.warm_cache();
    if warmed > 0 {
        tracing::info!(places = warmed, "sub-area cache warmed from disk");
    }

    let streetview = StreetViewClient::with_endpoint(
        &config.streetview_metadata_url,
        config.google_maps_api_key.clone(),
        &config.user_agent,
        config.streetview_timeout_secs,
    )?;
    if !streetview.has_api_key() {
        tracing::warn!("GOOGLE_MAPS_API_KEY not set; street view routes will fail");
    }

    let app = build_app(AppState {
        resolver,
        streetview,
    });

    tracing::info!(addr = %config.bind_addr, env = %config.env, "starting geoguess server");
    let listener = tokio::net::TcpListener::bind(config.bind_addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("failed to listen for ctrl-c");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }

    tracing::info!("received shutdown signal, starting graceful shutdown");
}
