//! tenant-iam server: load settings, open tenant pools, serve HTTP.
//!
//! Run from repo root: `cargo run -p tenant-iam-server`

use tenant_iam::{app_router, AppState, Settings};
use tokio::net::TcpListener;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Only so RUST_LOG from .env reaches the filter; `Settings::from_env` loads
    // it again and reports a malformed file.
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                tracing_subscriber::EnvFilter::new("tenant_iam=info,tower_http=info")
            }),
        )
        .init();

    let settings = Settings::from_env()?;
    tracing::info!(
        tenants = settings.tenants.len(),
        policy = ?settings.startup_policy,
        "settings loaded"
    );

    let state = AppState::from_settings(&settings);
    let failed = state
        .registry
        .initialize(&settings.tenants, settings.startup_policy)
        .await?;
    if !failed.is_empty() {
        tracing::warn!(tenants = ?failed, "serving without some tenant pools");
    }

    let app = app_router(state.clone());
    let listener = TcpListener::bind(settings.bind_addr.as_str()).await?;
    tracing::info!("listening on http://{}", listener.local_addr()?);
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    for tenant in state.registry.tenants() {
        state.registry.invalidate(&tenant).await;
    }
    tracing::info!("tenant pools closed");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
}
