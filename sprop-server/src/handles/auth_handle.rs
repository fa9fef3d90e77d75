use std::sync::Arc;

use anyhow::anyhow;
use axum::extract::State;
use axum::routing::{get, post};
use axum::{middleware, Extension, Json, Router};
use sprop_api::models::{LoginRequest, RegisterRequest, UserResponse};
use time::OffsetDateTime;

use crate::configs::Storage;
use crate::errors::{ApiError, AuthError};
use crate::middlewares::{auth, TokenState};
use crate::models::User;
use crate::repositories::UserRepository;
use crate::services::{AuthService, TokenClaims, TokenService};

#[derive(Clone)]
pub struct AuthState {
    pub auth_service: Arc<AuthService>,
    pub token_service: Arc<TokenService>,
    pub user_repository: Arc<UserRepository>,
    pub storage: Arc<Storage>,
}

pub fn auth_router(auth_state: AuthState, token_state: TokenState) -> Router {
    Router::new()
        .route("/api/auth/register", post(register))
        .route("/api/auth/login", post(login))
        .route(
            "/api/auth/me",
            get(get_current_user)
                .route_layer(middleware::from_fn_with_state(token_state.enforced(), auth)),
        )
        .with_state(auth_state)
}

#[utoipa::path(
    post,
    path = "/api/auth/register",
    tag = "auth",
    request_body = RegisterRequest,
    responses(
        (status = 200, description = "Registration successful, return user token", body = String),
        (status = 400, description = "Empty username or password"),
        (status = 409, description = "Username already exists"),
        (status = 500, description = "Internal server error")
    )
)]
pub async fn register(
    State(state): State<AuthState>,
    Json(body): Json<RegisterRequest>,
) -> Result<String, ApiError> {
    let username = body.username.trim();
    if username.is_empty() || body.password.is_empty() {
        return Err(AuthError::InvalidRequest.into());
    }

    if state.user_repository.find_by_username(username).await?.is_some() {
        return Err(AuthError::UsernameExists.into());
    }

    let hash_password = state
        .auth_service
        .hash(&body.password)
        .map_err(|e| anyhow!("Failed to hash password: {}", e))?;

    let user = User {
        id: 0,
        username: username.to_string(),
        password: hash_password,
        created_at: OffsetDateTime::now_utc(),
    };

    let mut tx = state.storage.get_pool().begin().await?;
    let id = state
        .user_repository
        .create(&user, &mut tx)
        .await
        .map_err(username_conflict)?;
    tx.commit().await?;

    tracing::info!("registered user {}", username);

    let token = state
        .token_service
        .generate_token(&User { id, ..user })
        .map_err(|e| anyhow!("Failed to generate token: {}", e))?
        .token;

    Ok(token)
}

/// A concurrent registration can still win the `UNIQUE` race after the lookup.
fn username_conflict(e: sqlx::Error) -> ApiError {
    match &e {
        sqlx::Error::Database(db) if db.is_unique_violation() => AuthError::UsernameExists.into(),
        _ => e.into(),
    }
}

#[utoipa::path(
    post,
    path = "/api/auth/login",
    tag = "auth",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Login successful, return user token", body = String),
        (status = 404, description = "User not found"),
        (status = 401, description = "Invalid password"),
        (status = 500, description = "Internal server error")
    )
)]
pub async fn login(
    State(state): State<AuthState>,
    Json(body): Json<LoginRequest>,
) -> Result<String, ApiError> {
    let user = state
        .user_repository
        .find_by_username(body.username.trim())
        .await?
        .ok_or(AuthError::UserNotFound)?;

    let result = state
        .auth_service
        .verify(&user, &body.password)
        .map_err(|e| anyhow!("Failed to verify password: {}", e))?;

    if !result {
        return Err(AuthError::InvalidPassword.into());
    }

    let token = state
        .token_service
        .generate_token(&user)
        .map_err(|e| anyhow!("Failed to generate token: {}", e))?
        .token;

    Ok(token)
}

#[utoipa::path(
    get,
    path = "/api/auth/me",
    tag = "auth",
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "Get current user information successfully", body = UserResponse),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "User does not exist"),
        (status = 500, description = "Server internal error")
    )
)]
pub async fn get_current_user(
    Extension(token_data): Extension<TokenClaims>,
    State(state): State<AuthState>,
) -> Result<Json<UserResponse>, ApiError> {
    let user = state
        .user_repository
        .find_by_id(token_data.sub)
        .await?
        .ok_or(AuthError::UserNotFound)?;

    Ok(Json(UserResponse {
        id: user.id,
        username: user.username,
        created_at: user.created_at,
    }))
}

#[cfg(test)]
mod tests {
    use crate::configs::{Database, SchemaManager};

    use super::*;

    #[tokio::test]
    async fn test_duplicate_insert_maps_to_conflict() {
        let storage = Arc::new(
            Storage::new(
                Database {
                    migration_path: None,
                    clean_start: true,
                    url: String::from("sqlite::memory:"),
                },
                SchemaManager::default(),
            )
            .await
            .unwrap(),
        );
        let repository = UserRepository::new(storage.clone());
        let user = User {
            id: 0,
            username: String::from("grower"),
            password: String::from("hashed_password"),
            created_at: OffsetDateTime::now_utc(),
        };

        let mut tx = storage.get_pool().begin().await.unwrap();
        repository.create(&user, &mut tx).await.unwrap();
        let e = repository.create(&user, &mut tx).await.unwrap_err();

        assert!(matches!(
            username_conflict(e),
            ApiError::AuthError(AuthError::UsernameExists)
        ));
        assert!(matches!(
            username_conflict(sqlx::Error::RowNotFound),
            ApiError::DatabaseError(_)
        ));
    }
}
