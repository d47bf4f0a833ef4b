//! Employee and reference table handlers

use axum::{
    Extension, Json,
    extract::{Path, Query, State, rejection::JsonRejection},
    http::StatusCode,
    response::IntoResponse,
};
use common::token::AuthUser;
use rules::{Action, Resource};
use serde_json::json;
use uuid::Uuid;

use super::record_audit;
use crate::{
    error::{ApiError, ApiResult},
    middleware::authorize,
    models::{
        employe::{EmployePayload, EmployeQuery},
        lookup::LookupKind,
    },
    state::AppState,
    validation::validate_employe,
};

pub async fn list_employes(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Query(query): Query<EmployeQuery>,
) -> ApiResult<impl IntoResponse> {
    authorize(&user, Resource::Employe, Action::Read)?;

    let employes = state.employe_repository.list(&query).await?;

    Ok(Json(employes))
}

pub async fn get_employe(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<Uuid>,
) -> ApiResult<impl IntoResponse> {
    authorize(&user, Resource::Employe, Action::Read)?;

    let employe = state
        .employe_repository
        .find_by_id(id)
        .await?
        .ok_or_else(|| ApiError::not_found("Employe"))?;

    Ok(Json(employe))
}

pub async fn create_employe(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    payload: Result<Json<EmployePayload>, JsonRejection>,
) -> ApiResult<impl IntoResponse> {
    authorize(&user, Resource::Employe, Action::Create)?;
    let Json(payload) = payload?;
    validate_employe(&payload).map_err(ApiError::BadRequest)?;

    let employe = state.employe_repository.create(&payload).await?;

    record_audit(
        &state,
        &user,
        Action::Create,
        Resource::Employe,
        Some(employe.id),
    )
    .await;

    Ok((StatusCode::CREATED, Json(employe)))
}

pub async fn update_employe(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<Uuid>,
    payload: Result<Json<EmployePayload>, JsonRejection>,
) -> ApiResult<impl IntoResponse> {
    authorize(&user, Resource::Employe, Action::Update)?;
    let Json(payload) = payload?;
    validate_employe(&payload).map_err(ApiError::BadRequest)?;

    let employe = state
        .employe_repository
        .update(id, &payload)
        .await?
        .ok_or_else(|| ApiError::not_found("Employe"))?;

    record_audit(&state, &user, Action::Update, Resource::Employe, Some(id)).await;

    Ok(Json(employe))
}

pub async fn delete_employe(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<Uuid>,
) -> ApiResult<impl IntoResponse> {
    authorize(&user, Resource::Employe, Action::Delete)?;

    if !state.employe_repository.delete(id).await? {
        return Err(ApiError::not_found("Employe"));
    }

    record_audit(&state, &user, Action::Delete, Resource::Employe, Some(id)).await;

    Ok(Json(json!({"message": "Employe deleted successfully"})))
}

/// Reference tables are read with the same right as employees
pub async fn list_lookup(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(kind): Path<String>,
) -> ApiResult<impl IntoResponse> {
    authorize(&user, Resource::Employe, Action::Read)?;

    let kind: LookupKind = kind.parse().map_err(ApiError::BadRequest)?;
    let rows = state.lookup_repository.list(kind).await?;

    Ok(Json(rows))
}
