// JWKS discovery and token issuance handlers

use axum::{
    extract::{Query, State},
    response::Json,
};
use chrono::Utc;
use std::sync::Arc;

use crate::error::IssuerError;
use crate::jwk;
use crate::key_management::KeyStore;
use crate::token::{KidDefaults, TokenIssuer};
use crate::types::{AuthQuery, AuthResponse, JwksResponse};

/// Shared state: the seeded key store and the issuer built on top of it.
#[derive(Debug)]
pub struct ServiceState {
    pub store: Arc<KeyStore>,
    pub issuer: TokenIssuer,
    pub kids: KidDefaults,
}

/// Application state handed to every handler
pub type AppState = Arc<ServiceState>;

/// JWKS endpoint handler - serves public keys in JWKS format
/// Only returns keys that have not expired, without `exp`
pub async fn jwks_handler(State(state): State<AppState>) -> Json<JwksResponse> {
    let keys = state.store.active_keys(Utc::now());
    Json(jwk::key_set(keys, false))
}

/// Full listing - every key, expired ones included, each with `exp`
pub async fn all_keys_handler(State(state): State<AppState>) -> Json<JwksResponse> {
    Json(jwk::key_set(state.store.all_keys(), true))
}

/// Auth endpoint handler - issues JWTs
/// `expired=true` backdates the token; `kid` picks the signing key
pub async fn auth_handler(
    State(state): State<AppState>,
    Query(params): Query<AuthQuery>,
) -> Result<Json<AuthResponse>, IssuerError> {
    let want_expired = params.wants_expired();
    let kid = state.kids.select(params.kid.as_deref(), want_expired);

    let token = state.issuer.issue(kid, want_expired, Utc::now())?;
    Ok(Json(AuthResponse { token }))
}
