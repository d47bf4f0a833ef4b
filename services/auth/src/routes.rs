//! Authentication service routes

use axum::{
    Extension, Json, Router,
    extract::State,
    http::StatusCode,
    middleware,
    response::IntoResponse,
    routing::{get, post},
};
use axum_extra::extract::WithRejection;
use common::token::AuthUser;
use rules::{Action, Resource, permissions_for};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

use crate::{
    AppState,
    error::{AuthError, AuthResult},
    middleware::auth_middleware,
    models::{NewUser, User},
    password::{hash_password, verify_password},
    validation::{
        normalize_email, validate_email, validate_full_name, validate_password, validate_phone,
    },
};

/// Request for self-registration
#[derive(Deserialize)]
pub struct RegisterRequest {
    pub email: String,
    pub password: String,
    pub full_name: String,
    pub department: Option<String>,
    pub phone: Option<String>,
}

/// Request for user login
#[derive(Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// Request carrying a refresh token
#[derive(Deserialize)]
pub struct RefreshTokenRequest {
    pub refresh_token: String,
}

/// Response for a successful login
#[derive(Serialize)]
pub struct TokenResponse {
    pub access_token: String,
    pub refresh_token: String,
    pub token_type: String,
    pub expires_in: u64,
    pub user: User,
}

/// Response for token refresh
#[derive(Serialize)]
pub struct RefreshTokenResponse {
    pub access_token: String,
    pub refresh_token: String,
    pub token_type: String,
    pub expires_in: u64,
}

/// Current user and what the UI may offer them
#[derive(Serialize)]
pub struct MeResponse {
    pub user: User,
    pub permissions: BTreeMap<Resource, BTreeSet<Action>>,
}

/// Create the router for the authentication service
pub fn create_router(state: AppState) -> Router {
    let protected_routes = Router::new()
        .route("/auth/me", get(me))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            auth_middleware,
        ));

    Router::new()
        .route("/health", get(health_check))
        .route("/auth/register", post(register))
        .route("/auth/login", post(login))
        .route("/auth/refresh", post(refresh_token))
        .route("/auth/logout", post(logout))
        .merge(protected_routes)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Health check endpoint
pub async fn health_check() -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "ok",
        "service": "auth-service"
    }))
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Self-registration endpoint. New accounts always get the `user` role.
pub async fn register(
    State(state): State<AppState>,
    WithRejection(Json(payload), _): WithRejection<Json<RegisterRequest>, AuthError>,
) -> AuthResult<impl IntoResponse> {
    let email = normalize_email(&payload.email);
    info!("Registration request for: {}", email);

    validate_email(&email).map_err(AuthError::BadRequest)?;
    validate_password(&payload.password).map_err(AuthError::BadRequest)?;
    validate_full_name(&payload.full_name).map_err(AuthError::BadRequest)?;
    let phone = non_blank(payload.phone);
    if let Some(phone) = &phone {
        validate_phone(phone).map_err(AuthError::BadRequest)?;
    }

    if state.users.find_by_email(&email).await?.is_some() {
        return Err(AuthError::Conflict("Email already registered".to_string()));
    }

    let password_hash = hash_password(&payload.password)
        .map_err(|e| AuthError::internal("Failed to hash password", e))?;

    let new_user = NewUser {
        email,
        full_name: payload.full_name.trim().to_string(),
        role: rules::Role::User,
        department: non_blank(payload.department),
        phone,
        password_hash,
    };

    // a concurrent registration can still win the race; the unique index
    // turns that into the same 409
    let user = state.users.create(&new_user).await?;

    Ok((StatusCode::CREATED, Json(user)))
}

async fn issue_tokens(state: &AppState, user: &User) -> AuthResult<(String, String)> {
    let access_token = state
        .jwt_service
        .generate_access_token(user)
        .map_err(|e| AuthError::internal("Failed to generate access token", e))?;

    let refresh_token = state
        .jwt_service
        .generate_refresh_token(user)
        .map_err(|e| AuthError::internal("Failed to generate refresh token", e))?;

    state
        .sessions
        .create_session(
            user.id,
            &refresh_token,
            state.jwt_service.refresh_token_expiry(),
        )
        .await
        .map_err(|e| AuthError::internal("Failed to store session", e))?;

    Ok((access_token, refresh_token))
}

/// User login endpoint
pub async fn login(
    State(state): State<AppState>,
    WithRejection(Json(payload), _): WithRejection<Json<LoginRequest>, AuthError>,
) -> AuthResult<impl IntoResponse> {
    let email = normalize_email(&payload.email);
    info!("Login attempt for user: {}", email);

    if email.is_empty() || payload.password.is_empty() {
        return Err(AuthError::BadRequest(
            "Email and password are required".to_string(),
        ));
    }

    if !state.rate_limiter.is_allowed(&email).await {
        return Err(AuthError::TooManyRequests);
    }

    let Some(user) = state.users.find_by_email(&email).await? else {
        warn!("Login failed for {}: unknown account", email);
        return Err(AuthError::InvalidCredentials);
    };

    let password_ok = verify_password(&user.password_hash, &payload.password)
        .map_err(|e| AuthError::internal("Failed to verify password", e))?;
    if !password_ok {
        warn!("Login failed for {}: wrong password", email);
        return Err(AuthError::InvalidCredentials);
    }

    // checked after the password so a disabled account is only revealed
    // to someone who knows the credentials
    if !user.active {
        warn!("Login refused for {}: account disabled", email);
        return Err(AuthError::AccountDisabled);
    }

    state.rate_limiter.reset(&email).await;

    let (access_token, refresh_token) = issue_tokens(&state, &user).await?;

    let response = TokenResponse {
        access_token,
        refresh_token,
        token_type: "Bearer".to_string(),
        expires_in: state.jwt_service.access_token_expiry(),
        user,
    };

    Ok((StatusCode::OK, Json(response)))
}

/// Refresh token endpoint. The presented refresh token is revoked and a
/// new pair is issued.
pub async fn refresh_token(
    State(state): State<AppState>,
    WithRejection(Json(payload), _): WithRejection<Json<RefreshTokenRequest>, AuthError>,
) -> AuthResult<impl IntoResponse> {
    info!("Token refresh request");

    let claims = state
        .jwt_service
        .validate_refresh_token(&payload.refresh_token)
        .map_err(|_| AuthError::Unauthorized)?;

    let revoked = state
        .sessions
        .is_token_revoked(&payload.refresh_token)
        .await
        .map_err(|e| AuthError::internal("Failed to check token revocation", e))?;
    if revoked {
        return Err(AuthError::Unauthorized);
    }

    let current = state
        .sessions
        .is_session_valid(claims.sub, &payload.refresh_token)
        .await
        .map_err(|e| AuthError::internal("Failed to read session", e))?;
    if !current {
        return Err(AuthError::Unauthorized);
    }

    let user = state
        .users
        .find_by_id(claims.sub)
        .await?
        .ok_or(AuthError::Unauthorized)?;
    if !user.active {
        return Err(AuthError::AccountDisabled);
    }

    let remaining = state
        .jwt_service
        .remaining_lifetime(&claims)
        .map_err(|e| AuthError::internal("Failed to compute token lifetime", e))?;
    // only one of several concurrent refreshes wins the rotation
    let claimed = state
        .sessions
        .revoke_token(&payload.refresh_token, remaining)
        .await
        .map_err(|e| AuthError::internal("Failed to revoke refresh token", e))?;
    if !claimed {
        warn!("Refresh token for {} was already rotated", user.email);
        return Err(AuthError::Unauthorized);
    }

    let (access_token, refresh_token) = issue_tokens(&state, &user).await?;

    let response = RefreshTokenResponse {
        access_token,
        refresh_token,
        token_type: "Bearer".to_string(),
        expires_in: state.jwt_service.access_token_expiry(),
    };

    Ok((StatusCode::OK, Json(response)))
}

/// Logout endpoint
pub async fn logout(
    State(state): State<AppState>,
    WithRejection(Json(payload), _): WithRejection<Json<RefreshTokenRequest>, AuthError>,
) -> AuthResult<impl IntoResponse> {
    info!("Logout request");

    let claims = state
        .jwt_service
        .validate_refresh_token(&payload.refresh_token)
        .map_err(|_| AuthError::Unauthorized)?;

    let remaining = state
        .jwt_service
        .remaining_lifetime(&claims)
        .map_err(|e| AuthError::internal("Failed to compute token lifetime", e))?;

    state
        .sessions
        .revoke_token(&payload.refresh_token, remaining)
        .await
        .map_err(|e| AuthError::internal("Failed to revoke refresh token", e))?;

    state
        .sessions
        .delete_session(claims.sub)
        .await
        .map_err(|e| AuthError::internal("Failed to remove session", e))?;

    Ok((
        StatusCode::OK,
        Json(serde_json::json!({"message": "Logged out successfully"})),
    ))
}

/// Current user profile with the permission view for UI gating
pub async fn me(
    State(state): State<AppState>,
    Extension(caller): Extension<AuthUser>,
) -> AuthResult<impl IntoResponse> {
    let user = state
        .users
        .find_by_id(caller.id)
        .await?
        .ok_or_else(|| AuthError::NotFound("User not found".to_string()))?;

    let permissions = permissions_for(user.role);

    Ok(Json(MeResponse { user, permissions }))
}
