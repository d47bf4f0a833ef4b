//! Marché and bande de livraison handlers

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
    models::marche::{BandePayload, MarchePayload, MarcheQuery},
    state::AppState,
    validation::{validate_bande, validate_marche},
};

pub async fn list_marches(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Query(query): Query<MarcheQuery>,
) -> ApiResult<impl IntoResponse> {
    authorize(&user, Resource::Marche, Action::Read)?;

    let marches = state.marche_repository.list(&query).await?;

    Ok(Json(marches))
}

pub async fn get_marche(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<Uuid>,
) -> ApiResult<impl IntoResponse> {
    authorize(&user, Resource::Marche, Action::Read)?;

    let marche = state
        .marche_repository
        .find_by_id(id)
        .await?
        .ok_or_else(|| ApiError::not_found("Marche"))?;

    Ok(Json(marche))
}

pub async fn create_marche(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    payload: Result<Json<MarchePayload>, JsonRejection>,
) -> ApiResult<impl IntoResponse> {
    authorize(&user, Resource::Marche, Action::Create)?;
    let Json(payload) = payload?;
    validate_marche(&payload).map_err(ApiError::BadRequest)?;

    let marche = state.marche_repository.create(&payload).await?;

    record_audit(
        &state,
        &user,
        Action::Create,
        Resource::Marche,
        Some(marche.id),
    )
    .await;

    Ok((StatusCode::CREATED, Json(marche)))
}

pub async fn update_marche(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<Uuid>,
    payload: Result<Json<MarchePayload>, JsonRejection>,
) -> ApiResult<impl IntoResponse> {
    authorize(&user, Resource::Marche, Action::Update)?;
    let Json(payload) = payload?;
    validate_marche(&payload).map_err(ApiError::BadRequest)?;

    let marche = state
        .marche_repository
        .update(id, &payload)
        .await?
        .ok_or_else(|| ApiError::not_found("Marche"))?;

    record_audit(&state, &user, Action::Update, Resource::Marche, Some(id)).await;

    Ok(Json(marche))
}

pub async fn delete_marche(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<Uuid>,
) -> ApiResult<impl IntoResponse> {
    authorize(&user, Resource::Marche, Action::Delete)?;

    if !state.marche_repository.delete(id).await? {
        return Err(ApiError::not_found("Marche"));
    }

    record_audit(&state, &user, Action::Delete, Resource::Marche, Some(id)).await;

    Ok(Json(json!({"message": "Marche deleted successfully"})))
}

pub async fn list_bandes(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(marche_id): Path<Uuid>,
) -> ApiResult<impl IntoResponse> {
    authorize(&user, Resource::Marche, Action::Read)?;

    if state.marche_repository.find_by_id(marche_id).await?.is_none() {
        return Err(ApiError::not_found("Marche"));
    }

    let bandes = state.marche_repository.list_bandes(marche_id).await?;

    Ok(Json(bandes))
}

/// Bandes are part of their marché: creating one is a marché update
pub async fn create_bande(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(marche_id): Path<Uuid>,
    payload: Result<Json<BandePayload>, JsonRejection>,
) -> ApiResult<impl IntoResponse> {
    authorize(&user, Resource::Marche, Action::Update)?;
    let Json(payload) = payload?;
    validate_bande(&payload).map_err(ApiError::BadRequest)?;

    if state.marche_repository.find_by_id(marche_id).await?.is_none() {
        return Err(ApiError::not_found("Marche"));
    }

    let bande = state
        .marche_repository
        .create_bande(marche_id, &payload)
        .await?;

    record_audit(
        &state,
        &user,
        Action::Update,
        Resource::Marche,
        Some(marche_id),
    )
    .await;

    Ok((StatusCode::CREATED, Json(bande)))
}

pub async fn update_bande(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<Uuid>,
    payload: Result<Json<BandePayload>, JsonRejection>,
) -> ApiResult<impl IntoResponse> {
    authorize(&user, Resource::Marche, Action::Update)?;
    let Json(payload) = payload?;
    validate_bande(&payload).map_err(ApiError::BadRequest)?;

    let bande = state
        .marche_repository
        .update_bande(id, &payload)
        .await?
        .ok_or_else(|| ApiError::not_found("Bande"))?;

    record_audit(
        &state,
        &user,
        Action::Update,
        Resource::Marche,
        Some(bande.marche_id),
    )
    .await;

    Ok(Json(bande))
}

pub async fn delete_bande(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<Uuid>,
) -> ApiResult<impl IntoResponse> {
    authorize(&user, Resource::Marche, Action::Delete)?;

    let marche_id = state
        .marche_repository
        .delete_bande(id)
        .await?
        .ok_or_else(|| ApiError::not_found("Bande"))?;

    // bande changes are logged against their marché
    record_audit(
        &state,
        &user,
        Action::Delete,
        Resource::Marche,
        Some(marche_id),
    )
    .await;

    Ok(Json(json!({"message": "Bande deleted successfully"})))
}
