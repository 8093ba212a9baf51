use axum::{
    extract::{Path, State},
    routing::{delete, get, put},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use time::{Duration, OffsetDateTime};
use tracing::{info, instrument};
use uuid::Uuid;

use crate::{
    auth::{
        repo::{Role, User},
        AdminUser, AuthUser,
    },
    error::ApiError,
    orders::repo::{Order, OrderWithItems},
    state::AppState,
};

pub fn user_routes() -> Router<AppState> {
    Router::new()
        .route("/users", get(list_users))
        .route("/users/stats", get(user_stats))
        .route("/users/:id", get(get_user))
        .route("/users/:id/role", put(update_role))
        .route("/users/:id", delete(delete_user))
        .route("/users/:id/orders", get(user_orders))
}

#[instrument(skip(state))]
pub async fn list_users(
    State(state): State<AppState>,
    AdminUser(_): AdminUser,
) -> Result<Json<Vec<User>>, ApiError> {
    let users = User::list(&state.db).await?;
    Ok(Json(users))
}

#[derive(Debug, Serialize)]
pub struct UserStats {
    pub total_users: i64,
    pub admin_users: i64,
    pub regular_users: i64,
    pub new_users: i64,
}

#[instrument(skip(state))]
pub async fn user_stats(
    State(state): State<AppState>,
    AdminUser(_): AdminUser,
) -> Result<Json<UserStats>, ApiError> {
    let thirty_days_ago = OffsetDateTime::now_utc() - Duration::days(30);
    Ok(Json(UserStats {
        total_users: User::count_all(&state.db).await?,
        admin_users: User::count_by_role(&state.db, Role::Admin).await?,
        regular_users: User::count_by_role(&state.db, Role::User).await?,
        new_users: User::count_created_since(&state.db, thirty_days_ago).await?,
    }))
}

#[instrument(skip(state))]
pub async fn get_user(
    State(state): State<AppState>,
    AdminUser(_): AdminUser,
    Path(id): Path<Uuid>,
) -> Result<Json<User>, ApiError> {
    let user = User::find_by_id(&state.db, id)
        .await?
        .ok_or_else(|| ApiError::NotFound("User not found".into()))?;
    Ok(Json(user))
}

#[derive(Debug, Deserialize)]
pub struct UpdateRoleRequest {
    pub role: String,
}

#[instrument(skip(state, payload))]
pub async fn update_role(
    State(state): State<AppState>,
    AdminUser(_): AdminUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateRoleRequest>,
) -> Result<Json<Value>, ApiError> {
    // Guest accounts are minted by checkout, never assigned by hand.
    let role = match payload.role.as_str() {
        "user" => Role::User,
        "admin" => Role::Admin,
        _ => return Err(ApiError::Validation("Invalid role".into())),
    };
    if !User::set_role(&state.db, id, role).await? {
        return Err(ApiError::NotFound("User not found".into()));
    }
    info!(user_id = %id, role = ?role, "user role updated");
    Ok(Json(json!({ "success": true, "message": "User role updated successfully" })))
}

#[instrument(skip(state))]
pub async fn delete_user(
    State(state): State<AppState>,
    AdminUser(_): AdminUser,
    Path(id): Path<Uuid>,
) -> Result<Json<Value>, ApiError> {
    if !User::delete(&state.db, id).await? {
        return Err(ApiError::NotFound("User not found".into()));
    }
    info!(user_id = %id, "user deleted");
    Ok(Json(json!({ "success": true, "message": "User deleted successfully" })))
}

#[instrument(skip(state))]
pub async fn user_orders(
    State(state): State<AppState>,
    AuthUser(ctx): AuthUser,
    Path(id): Path<Uuid>,
) -> Result<Json<Vec<OrderWithItems>>, ApiError> {
    if !ctx.is_admin() && id != ctx.user_id {
        return Err(ApiError::Forbidden(
            "Not authorized to view these orders".into(),
        ));
    }
    let orders = Order::list_by_user(&state.db, id).await?;
    let orders = Order::attach_items(&state.db, orders).await?;
    Ok(Json(orders))
}
