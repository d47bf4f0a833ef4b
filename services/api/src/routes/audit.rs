//! Audit trail handler

use axum::{
    Extension, Json,
    extract::{Query, State},
    response::IntoResponse,
};
use common::token::AuthUser;
use rules::{Action, Resource};

use crate::{error::ApiResult, middleware::authorize, models::audit::AuditQuery, state::AppState};

pub async fn list_audit(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Query(query): Query<AuditQuery>,
) -> ApiResult<impl IntoResponse> {
    authorize(&user, Resource::Audit, Action::Read)?;

    Ok(Json(state.audit_repository.list(&query).await?))
}
