use axum::{
    extract::State,
    routing::{get, put},
    Json, Router,
};
use serde_json::{json, Value};
use tracing::{info, instrument};

use crate::{
    auth::AdminUser,
    error::ApiError,
    settings::{dto::UpdateSettingsRequest, repo},
    state::AppState,
};

pub fn settings_routes() -> Router<AppState> {
    Router::new()
        .route("/settings", get(get_settings))
        .route("/settings", put(update_settings))
}

#[instrument(skip(state))]
pub async fn get_settings(State(state): State<AppState>) -> Result<Json<Value>, ApiError> {
    let settings = repo::get_or_init(&state.db).await?;
    Ok(Json(json!({ "success": true, "data": settings })))
}

#[instrument(skip(state, payload))]
pub async fn update_settings(
    State(state): State<AppState>,
    AdminUser(ctx): AdminUser,
    Json(payload): Json<UpdateSettingsRequest>,
) -> Result<Json<Value>, ApiError> {
    let mut settings = repo::get_or_init(&state.db).await?;
    if let Some(general) = payload.general {
        settings.general = general;
    }
    if let Some(payment) = payload.payment {
        settings.payment = payment;
    }
    if let Some(notification) = payload.notification {
        settings.notification = notification;
    }

    let settings = repo::update(&state.db, &settings).await?;
    info!(admin_id = %ctx.user_id, "store settings updated");
    Ok(Json(json!({ "success": true, "data": settings })))
}
