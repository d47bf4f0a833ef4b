//! Stock handlers: categories, suppliers, items and movements

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
    models::stock::{
        CategoriePayload, FournisseurPayload, MaterielPayload, MaterielQuery, MouvementPayload,
        MouvementQuery,
    },
    state::AppState,
    validation::{validate_categorie, validate_fournisseur, validate_materiel, validate_mouvement},
};

pub async fn list_categories(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
) -> ApiResult<impl IntoResponse> {
    authorize(&user, Resource::Stock, Action::Read)?;

    Ok(Json(state.stock_repository.list_categories().await?))
}

pub async fn create_categorie(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    payload: Result<Json<CategoriePayload>, JsonRejection>,
) -> ApiResult<impl IntoResponse> {
    authorize(&user, Resource::Stock, Action::Create)?;
    let Json(payload) = payload?;
    validate_categorie(&payload).map_err(ApiError::BadRequest)?;

    let categorie = state.stock_repository.create_categorie(&payload).await?;

    record_audit(
        &state,
        &user,
        Action::Create,
        Resource::Stock,
        Some(categorie.id),
    )
    .await;

    Ok((StatusCode::CREATED, Json(categorie)))
}

pub async fn update_categorie(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<Uuid>,
    payload: Result<Json<CategoriePayload>, JsonRejection>,
) -> ApiResult<impl IntoResponse> {
    authorize(&user, Resource::Stock, Action::Update)?;
    let Json(payload) = payload?;
    validate_categorie(&payload).map_err(ApiError::BadRequest)?;

    let categorie = state
        .stock_repository
        .update_categorie(id, &payload)
        .await?
        .ok_or_else(|| ApiError::not_found("Categorie"))?;

    record_audit(&state, &user, Action::Update, Resource::Stock, Some(id)).await;

    Ok(Json(categorie))
}

pub async fn delete_categorie(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<Uuid>,
) -> ApiResult<impl IntoResponse> {
    authorize(&user, Resource::Stock, Action::Delete)?;

    if !state.stock_repository.delete_categorie(id).await? {
        return Err(ApiError::not_found("Categorie"));
    }

    record_audit(&state, &user, Action::Delete, Resource::Stock, Some(id)).await;

    Ok(Json(json!({"message": "Categorie deleted successfully"})))
}

pub async fn list_fournisseurs(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
) -> ApiResult<impl IntoResponse> {
    authorize(&user, Resource::Stock, Action::Read)?;

    Ok(Json(state.stock_repository.list_fournisseurs().await?))
}

pub async fn create_fournisseur(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    payload: Result<Json<FournisseurPayload>, JsonRejection>,
) -> ApiResult<impl IntoResponse> {
    authorize(&user, Resource::Stock, Action::Create)?;
    let Json(payload) = payload?;
    validate_fournisseur(&payload).map_err(ApiError::BadRequest)?;

    let fournisseur = state.stock_repository.create_fournisseur(&payload).await?;

    record_audit(
        &state,
        &user,
        Action::Create,
        Resource::Stock,
        Some(fournisseur.id),
    )
    .await;

    Ok((StatusCode::CREATED, Json(fournisseur)))
}

pub async fn update_fournisseur(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<Uuid>,
    payload: Result<Json<FournisseurPayload>, JsonRejection>,
) -> ApiResult<impl IntoResponse> {
    authorize(&user, Resource::Stock, Action::Update)?;
    let Json(payload) = payload?;
    validate_fournisseur(&payload).map_err(ApiError::BadRequest)?;

    let fournisseur = state
        .stock_repository
        .update_fournisseur(id, &payload)
        .await?
        .ok_or_else(|| ApiError::not_found("Fournisseur"))?;

    record_audit(&state, &user, Action::Update, Resource::Stock, Some(id)).await;

    Ok(Json(fournisseur))
}

pub async fn delete_fournisseur(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<Uuid>,
) -> ApiResult<impl IntoResponse> {
    authorize(&user, Resource::Stock, Action::Delete)?;

    if !state.stock_repository.delete_fournisseur(id).await? {
        return Err(ApiError::not_found("Fournisseur"));
    }

    record_audit(&state, &user, Action::Delete, Resource::Stock, Some(id)).await;

    Ok(Json(json!({"message": "Fournisseur deleted successfully"})))
}

pub async fn list_items(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Query(query): Query<MaterielQuery>,
) -> ApiResult<impl IntoResponse> {
    authorize(&user, Resource::Stock, Action::Read)?;

    Ok(Json(state.stock_repository.list_items(&query).await?))
}

pub async fn get_item(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<Uuid>,
) -> ApiResult<impl IntoResponse> {
    authorize(&user, Resource::Stock, Action::Read)?;

    let item = state
        .stock_repository
        .find_item(id)
        .await?
        .ok_or_else(|| ApiError::not_found("Materiel"))?;

    Ok(Json(item))
}

pub async fn create_item(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    payload: Result<Json<MaterielPayload>, JsonRejection>,
) -> ApiResult<impl IntoResponse> {
    authorize(&user, Resource::Stock, Action::Create)?;
    let Json(payload) = payload?;
    validate_materiel(&payload).map_err(ApiError::BadRequest)?;

    let item = state.stock_repository.create_item(&payload).await?;

    record_audit(&state, &user, Action::Create, Resource::Stock, Some(item.id)).await;

    Ok((StatusCode::CREATED, Json(item)))
}

pub async fn update_item(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<Uuid>,
    payload: Result<Json<MaterielPayload>, JsonRejection>,
) -> ApiResult<impl IntoResponse> {
    authorize(&user, Resource::Stock, Action::Update)?;
    let Json(payload) = payload?;
    validate_materiel(&payload).map_err(ApiError::BadRequest)?;

    let item = state
        .stock_repository
        .update_item(id, &payload)
        .await?
        .ok_or_else(|| ApiError::not_found("Materiel"))?;

    record_audit(&state, &user, Action::Update, Resource::Stock, Some(id)).await;

    Ok(Json(item))
}

pub async fn delete_item(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<Uuid>,
) -> ApiResult<impl IntoResponse> {
    authorize(&user, Resource::Stock, Action::Delete)?;

    if !state.stock_repository.delete_item(id).await? {
        return Err(ApiError::not_found("Materiel"));
    }

    record_audit(&state, &user, Action::Delete, Resource::Stock, Some(id)).await;

    Ok(Json(json!({"message": "Materiel deleted successfully"})))
}

pub async fn list_mouvements(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Query(query): Query<MouvementQuery>,
) -> ApiResult<impl IntoResponse> {
    authorize(&user, Resource::Stock, Action::Read)?;

    Ok(Json(state.stock_repository.list_mouvements(&query).await?))
}

/// Record a stock movement. A movement changes the item, so it needs the
/// update right on stock.
pub async fn create_mouvement(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    payload: Result<Json<MouvementPayload>, JsonRejection>,
) -> ApiResult<impl IntoResponse> {
    authorize(&user, Resource::Stock, Action::Update)?;
    let Json(payload) = payload?;
    validate_mouvement(&payload).map_err(ApiError::BadRequest)?;

    let mouvement = state
        .stock_repository
        .record_mouvement(&payload, user.id)
        .await?
        .ok_or_else(|| ApiError::not_found("Materiel"))?;

    record_audit(
        &state,
        &user,
        Action::Update,
        Resource::Stock,
        Some(mouvement.item_id),
    )
    .await;

    Ok((StatusCode::CREATED, Json(mouvement)))
}
