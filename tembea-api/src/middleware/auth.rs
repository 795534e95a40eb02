use axum::{
    extract::{Request, State},
    http::StatusCode,
    middleware::Next,
    response::Response,
};
use jsonwebtoken::{decode, DecodingKey, Validation};
use serde::{Deserialize, Serialize};
use tembea_core::identity::Identity;
use uuid::Uuid;

use crate::state::AppState;

/// Claims carried by the hosted auth service's access tokens.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Claims {
    pub sub: String,
    pub email: Option<String>,
    pub exp: usize,
}

/// The request's identity, if a valid token was presented. Routes that can
/// serve anonymous traffic read the `None` case; everything user-scoped
/// rejects it.
#[derive(Debug, Clone)]
pub struct CurrentUser(pub Option<Identity>);

impl CurrentUser {
    pub fn require(&self) -> Result<&Identity, crate::error::ApiError> {
        self.0.as_ref().ok_or_else(|| {
            crate::error::ApiError::AuthenticationError("Sign in to continue".to_string())
        })
    }
}

/// Validate the bearer token when one is present and stash the resulting
/// identity in the request. A missing header is anonymous; a bad token is
/// rejected outright.
pub async fn attach_identity(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, StatusCode> {
    let header = req
        .headers()
        .get("Authorization")
        .and_then(|h| h.to_str().ok());

    let identity = match header {
        None => None,
        Some(value) => {
            // 1. Extract token from Authorization header
            let token = value.strip_prefix("Bearer ").ok_or(StatusCode::UNAUTHORIZED)?;

            // 2. Decode and validate JWT
            let token_data = decode::<Claims>(
                token,
                &DecodingKey::from_secret(state.auth.secret.as_bytes()),
                &Validation::default(),
            )
            .map_err(|_| StatusCode::UNAUTHORIZED)?;

            // 3. The subject is the identity id on the auth service's side
            let claims = token_data.claims;
            let id = Uuid::parse_str(&claims.sub).map_err(|_| StatusCode::UNAUTHORIZED)?;
            Some(Identity {
                id,
                email: claims.email.unwrap_or_default(),
            })
        }
    };

    // 4. Inject into request extensions
    req.extensions_mut().insert(CurrentUser(identity));
    Ok(next.run(req).await)
}
