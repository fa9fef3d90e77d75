use std::sync::Arc;

use axum::body::Body;
use axum::extract::State;
use axum::http::{header, Request};
use axum::middleware::Next;
use axum::response::IntoResponse;
use axum_extra::headers::{Authorization, Header};
use axum_extra::headers::authorization::Bearer;
use jsonwebtoken::errors::ErrorKind;

use crate::errors::{ApiError, AuthError};
use crate::services::TokenService;

#[derive(Clone)]
pub struct TokenState {
    pub token_service: Arc<TokenService>,
    /// When false, requests without credentials pass through unauthenticated
    pub required: bool,
}

impl TokenState {
    /// Same keys, but a token is mandatory.
    pub fn enforced(&self) -> Self {
        Self {
            token_service: self.token_service.clone(),
            required: true,
        }
    }
}

pub async fn auth(
    State(state): State<TokenState>,
    mut req: Request<Body>,
    next: Next,
) -> Result<impl IntoResponse, ApiError> {
    if !state.required && !req.headers().contains_key(header::AUTHORIZATION) {
        return Ok(next.run(req).await);
    }

    let mut headers = req
        .headers()
        .get_all(header::AUTHORIZATION)
        .iter();

    let header: Authorization<Bearer> = Authorization::decode(&mut headers)
        .map_err(|_| AuthError::InvalidToken)?;

    let token_data = state
        .token_service
        .retrieve_token_claims(header.token())
        .map_err(|e| match e.kind() {
            ErrorKind::ExpiredSignature => AuthError::TokenExpired,
            _ => AuthError::InvalidToken,
        })?;

    req.extensions_mut().insert(token_data.claims);

    Ok(next.run(req).await)
}
