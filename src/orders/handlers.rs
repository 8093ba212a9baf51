use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{get, post, put},
    Json, Router,
};
use tracing::instrument;
use uuid::Uuid;

use crate::{
    auth::{AdminUser, AuthUser, MaybeUser},
    error::ApiError,
    orders::{
        dto::{CreateOrderRequest, PlacedOrderResponse, UpdatePaymentRequest, UpdateStatusRequest},
        repo::{Order, OrderWithItems},
        services,
    },
    state::AppState,
};

pub fn order_routes() -> Router<AppState> {
    Router::new()
        .route("/orders", post(create_order))
        .route("/orders/guest", post(create_guest_order))
        .route("/orders", get(list_orders))
        .route("/orders/:id", get(get_order))
        .route("/orders/:id/status", put(update_status))
        .route("/orders/:id/payment", put(update_payment))
        .route("/orders/:id/cancel", put(cancel_order))
}

#[instrument(skip(state, payload))]
pub async fn create_order(
    State(state): State<AppState>,
    MaybeUser(ctx): MaybeUser,
    Json(payload): Json<CreateOrderRequest>,
) -> Result<(StatusCode, Json<PlacedOrderResponse>), ApiError> {
    let placed = services::place_order(&state.db, ctx, payload).await?;
    Ok((
        StatusCode::CREATED,
        Json(PlacedOrderResponse {
            success: true,
            order: placed,
            message: "Order created successfully".into(),
        }),
    ))
}

/// Legacy alias kept for older storefront builds; always checks out as a
/// guest even when a token is present.
#[instrument(skip(state, payload))]
pub async fn create_guest_order(
    State(state): State<AppState>,
    Json(payload): Json<CreateOrderRequest>,
) -> Result<(StatusCode, Json<PlacedOrderResponse>), ApiError> {
    let placed = services::place_order(&state.db, None, payload).await?;
    Ok((
        StatusCode::CREATED,
        Json(PlacedOrderResponse {
            success: true,
            order: placed,
            message: "Order created successfully".into(),
        }),
    ))
}

#[instrument(skip(state))]
pub async fn list_orders(
    State(state): State<AppState>,
    AuthUser(ctx): AuthUser,
) -> Result<Json<Vec<OrderWithItems>>, ApiError> {
    let orders = if ctx.is_admin() {
        Order::list_all(&state.db).await?
    } else {
        Order::list_by_user(&state.db, ctx.user_id).await?
    };
    let orders = Order::attach_items(&state.db, orders).await?;
    Ok(Json(orders))
}

#[instrument(skip(state))]
pub async fn get_order(
    State(state): State<AppState>,
    AuthUser(ctx): AuthUser,
    Path(id): Path<Uuid>,
) -> Result<Json<OrderWithItems>, ApiError> {
    let order = Order::find_by_id(&state.db, id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Order not found".into()))?;

    if !ctx.is_admin() && order.user_id != Some(ctx.user_id) {
        return Err(ApiError::Forbidden("Not authorized to view this order".into()));
    }

    let items = Order::items_of(&state.db, id).await?;
    Ok(Json(OrderWithItems { order, items }))
}

#[instrument(skip(state))]
pub async fn update_status(
    State(state): State<AppState>,
    AdminUser(_): AdminUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateStatusRequest>,
) -> Result<Json<Order>, ApiError> {
    let order = Order::update_status(&state.db, id, payload.status)
        .await?
        .ok_or_else(|| ApiError::NotFound("Order not found".into()))?;
    Ok(Json(order))
}

#[instrument(skip(state))]
pub async fn update_payment(
    State(state): State<AppState>,
    AdminUser(_): AdminUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdatePaymentRequest>,
) -> Result<Json<Order>, ApiError> {
    let order = Order::update_payment_status(&state.db, id, payload.payment_status)
        .await?
        .ok_or_else(|| ApiError::NotFound("Order not found".into()))?;
    Ok(Json(order))
}

#[instrument(skip(state))]
pub async fn cancel_order(
    State(state): State<AppState>,
    AuthUser(ctx): AuthUser,
    Path(id): Path<Uuid>,
) -> Result<Json<Order>, ApiError> {
    let order = services::cancel_order(&state.db, ctx, id).await?;
    Ok(Json(order))
}
