//! Alert handlers

use axum::{Extension, Json, extract::State, response::IntoResponse};
use common::token::AuthUser;
use rules::{Action, Resource};

use crate::{alerts::today, error::ApiResult, middleware::authorize, state::AppState};

pub async fn stock_alerts(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
) -> ApiResult<impl IntoResponse> {
    authorize(&user, Resource::Stock, Action::Read)?;

    Ok(Json(state.alert_service.stock_alerts().await?))
}

pub async fn marche_alerts(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
) -> ApiResult<impl IntoResponse> {
    authorize(&user, Resource::Marche, Action::Read)?;

    Ok(Json(state.alert_service.marche_alerts(today()).await?))
}

/// Merged alerts; the caller must be able to read both sources
pub async fn all_alerts(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
) -> ApiResult<impl IntoResponse> {
    authorize(&user, Resource::Stock, Action::Read)?;
    authorize(&user, Resource::Marche, Action::Read)?;

    Ok(Json(state.alert_service.all_alerts(today()).await?))
}
