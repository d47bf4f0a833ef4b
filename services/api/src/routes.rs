//! API service routes

use axum::{
    Json, Router,
    http::StatusCode,
    middleware,
    response::IntoResponse,
    routing::{get, put},
};
use common::token::AuthUser;
use rules::{Action, Resource};
use serde_json::json;
use tower_http::trace::TraceLayer;
use tracing::warn;
use uuid::Uuid;

use crate::{middleware::auth_middleware, state::AppState};

mod alerts;
mod audit;
mod employes;
mod marches;
mod stock;
mod users;

/// Create the router for the API service
pub fn create_router(state: AppState) -> Router {
    let protected_routes = Router::new()
        .route("/users", get(users::list_users))
        .route(
            "/users/:id",
            get(users::get_user)
                .put(users::update_user)
                .delete(users::delete_user),
        )
        .route(
            "/employes",
            get(employes::list_employes).post(employes::create_employe),
        )
        .route(
            "/employes/:id",
            get(employes::get_employe)
                .put(employes::update_employe)
                .delete(employes::delete_employe),
        )
        .route("/lookups/:kind", get(employes::list_lookup))
        .route(
            "/marches",
            get(marches::list_marches).post(marches::create_marche),
        )
        .route("/marches/alerts", get(alerts::marche_alerts))
        .route(
            "/marches/:id",
            get(marches::get_marche)
                .put(marches::update_marche)
                .delete(marches::delete_marche),
        )
        .route(
            "/marches/:id/bandes",
            get(marches::list_bandes).post(marches::create_bande),
        )
        .route(
            "/bandes/:id",
            put(marches::update_bande).delete(marches::delete_bande),
        )
        .route(
            "/stock/categories",
            get(stock::list_categories).post(stock::create_categorie),
        )
        .route(
            "/stock/categories/:id",
            put(stock::update_categorie).delete(stock::delete_categorie),
        )
        .route(
            "/stock/fournisseurs",
            get(stock::list_fournisseurs).post(stock::create_fournisseur),
        )
        .route(
            "/stock/fournisseurs/:id",
            put(stock::update_fournisseur).delete(stock::delete_fournisseur),
        )
        .route(
            "/stock/items",
            get(stock::list_items).post(stock::create_item),
        )
        .route(
            "/stock/items/:id",
            get(stock::get_item)
                .put(stock::update_item)
                .delete(stock::delete_item),
        )
        .route(
            "/stock/mouvements",
            get(stock::list_mouvements).post(stock::create_mouvement),
        )
        .route("/stock/alerts", get(alerts::stock_alerts))
        .route("/audit", get(audit::list_audit))
        .route("/alerts", get(alerts::all_alerts))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            auth_middleware,
        ));

    Router::new()
        .route("/health", get(health_check))
        .merge(protected_routes)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Health check endpoint
pub async fn health_check() -> impl IntoResponse {
    (
        StatusCode::OK,
        Json(json!({
            "status": "ok",
            "service": "api-service"
        })),
    )
}

/// Append to the audit trail. A failure here never fails the request.
async fn record_audit(
    state: &AppState,
    user: &AuthUser,
    action: Action,
    resource: Resource,
    resource_id: Option<Uuid>,
) {
    if let Err(e) = state
        .audit_repository
        .record(user.id, action, resource, resource_id)
        .await
    {
        warn!(
            "Failed to record audit entry ({} {} by {}): {}",
            action, resource, user.id, e
        );
    }
}
