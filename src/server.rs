// Server setup and configuration

use axum::{
    Router,
    routing::{get, post},
};
use std::sync::Arc;
use tokio::net::TcpListener;

use crate::config::Config;
use crate::endpoints::{AppState, ServiceState, all_keys_handler, auth_handler, jwks_handler};
use crate::error::IssuerError;
use crate::key_management::KeyStore;
use crate::token::TokenIssuer;

/// Create the application router with all endpoints
pub fn create_app(app_state: AppState) -> Router {
    Router::new()
        .route("/.well-known/jwks.json", get(jwks_handler))
        .route("/jwks", get(jwks_handler)) // Alternative endpoint
        .route("/jwks/all", get(all_keys_handler))
        .route("/auth", post(auth_handler))
        .with_state(app_state)
}

/// Seed the key store and wire it into the handlers' state.
///
/// Runs once before the listener accepts traffic; the store is read-only
/// from then on.
pub fn build_state(config: &Config) -> Result<AppState, IssuerError> {
    let store = Arc::new(KeyStore::seed(
        &config.primary_kid,
        &config.expired_kid,
        config.key_validity()?,
    )?);
    tracing::info!(keys = store.len(), "key store seeded");
    let issuer = TokenIssuer::new(Arc::clone(&store), config.claims_template());

    Ok(Arc::new(ServiceState {
        store,
        issuer,
        kids: config.kid_defaults(),
    }))
}

pub async fn start_server(config: Config) -> Result<(), Box<dyn std::error::Error>> {
    let app_state = build_state(&config)?;
    let app = create_app(app_state);

    let listener = TcpListener::bind(&config.bind).await?;
    tracing::info!(bind = %config.bind, "JWKS issuer listening");
    tracing::info!("  GET  /.well-known/jwks.json - active keys");
    tracing::info!("  GET  /jwks                   - active keys (alias)");
    tracing::info!("  GET  /jwks/all               - all keys with expiry");
    tracing::info!("  POST /auth[?expired=true][&kid=...] - issue a token");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "failed to listen for shutdown signal");
        return;
    }
    tracing::info!("shutting down");
}
