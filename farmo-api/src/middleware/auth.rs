use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
    http::StatusCode,
};
use jsonwebtoken::{decode, DecodingKey, Validation};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use uuid::Uuid;

use crate::state::AppState;

// ============================================================================
// JWT Claims
// ============================================================================

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct CustomerClaims {
    pub sub: String,
    pub role: String,
    pub exp: usize,
}

impl CustomerClaims {
    pub fn customer_id(&self) -> Uuid {
        // Validated by the middleware before the claims are injected
        Uuid::parse_str(&self.sub).unwrap_or_default()
    }
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct ProviderClaims {
    /// Partner profile id
    pub sub: String,
    pub role: String,
    pub exp: usize,
}

impl ProviderClaims {
    pub fn provider_id(&self) -> Uuid {
        Uuid::parse_str(&self.sub).unwrap_or_default()
    }
}

fn decode_bearer<C: DeserializeOwned>(req: &Request, secret: &str) -> Result<C, StatusCode> {
    let auth_header = req.headers()
        .get("Authorization")
        .and_then(|h| h.to_str().ok())
        .ok_or(StatusCode::UNAUTHORIZED)?;

    let token = auth_header
        .strip_prefix("Bearer ")
        .ok_or(StatusCode::UNAUTHORIZED)?;

    let token_data = decode::<C>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &Validation::default(),
    ).map_err(|_| StatusCode::UNAUTHORIZED)?;

    Ok(token_data.claims)
}

// ============================================================================
// Customer Authentication Middleware
// ============================================================================

pub async fn customer_auth_middleware(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, StatusCode> {
    let claims: CustomerClaims = decode_bearer(&req, &state.auth.secret)?;

    if claims.role != "CUSTOMER" {
        return Err(StatusCode::FORBIDDEN);
    }
    if Uuid::parse_str(&claims.sub).is_err() {
        return Err(StatusCode::UNAUTHORIZED);
    }

    req.extensions_mut().insert(claims);
    Ok(next.run(req).await)
}

// ============================================================================
// Provider Authentication Middleware
// ============================================================================

pub async fn provider_auth_middleware(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, StatusCode> {
    let claims: ProviderClaims = decode_bearer(&req, &state.auth.secret)?;

    if claims.role != "PROVIDER" {
        return Err(StatusCode::FORBIDDEN);
    }
    if Uuid::parse_str(&claims.sub).is_err() {
        return Err(StatusCode::UNAUTHORIZED);
    }

    req.extensions_mut().insert(claims);
    Ok(next.run(req).await)
}
