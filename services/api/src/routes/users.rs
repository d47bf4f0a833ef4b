//! User administration handlers

use axum::{
    Extension, Json,
    extract::{Path, State, rejection::JsonRejection},
    response::IntoResponse,
};
use common::token::AuthUser;
use rules::{Action, Resource, Role, can_access};
use serde_json::json;
use uuid::Uuid;

use super::record_audit;
use crate::{
    error::{ApiError, ApiResult},
    middleware::authorize,
    models::user::UpdateUserRequest,
    state::AppState,
    validation::validate_user_update,
};

pub async fn list_users(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
) -> ApiResult<impl IntoResponse> {
    authorize(&user, Resource::User, Action::Read)?;

    let users = state.user_repository.get_all().await?;

    Ok(Json(users))
}

pub async fn get_user(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<Uuid>,
) -> ApiResult<impl IntoResponse> {
    authorize(&user, Resource::User, Action::Read)?;

    let found = state
        .user_repository
        .find_by_id(id)
        .await?
        .ok_or_else(|| ApiError::not_found("User"))?;

    Ok(Json(found))
}

pub async fn update_user(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<Uuid>,
    payload: Result<Json<UpdateUserRequest>, JsonRejection>,
) -> ApiResult<impl IntoResponse> {
    authorize(&user, Resource::User, Action::Update)?;
    let Json(payload) = payload?;
    validate_user_update(&payload).map_err(ApiError::BadRequest)?;

    // an administrator keeps their own role and access
    if id == user.id && (!can_access(Some(&payload.role), Role::Admin) || !payload.active) {
        return Err(ApiError::Conflict(
            "You cannot demote or deactivate your own account".to_string(),
        ));
    }

    let updated = state
        .user_repository
        .update(id, &payload)
        .await?
        .ok_or_else(|| ApiError::not_found("User"))?;

    record_audit(&state, &user, Action::Update, Resource::User, Some(id)).await;

    Ok(Json(updated))
}

pub async fn delete_user(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<Uuid>,
) -> ApiResult<impl IntoResponse> {
    authorize(&user, Resource::User, Action::Delete)?;

    if id == user.id {
        return Err(ApiError::Conflict(
            "You cannot delete your own account".to_string(),
        ));
    }

    if !state.user_repository.delete(id).await? {
        return Err(ApiError::not_found("User"));
    }

    record_audit(&state, &user, Action::Delete, Resource::User, Some(id)).await;

    Ok(Json(json!({"message": "User deleted successfully"})))
}
