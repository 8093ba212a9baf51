use axum::{
    extract::{Path, State},
    routing::{delete, get, post},
    Json, Router,
};
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::{info, instrument};
use uuid::Uuid;

use crate::{
    auth::AuthUser,
    error::ApiError,
    products::repo::Product,
    state::AppState,
    wishlist::repo,
};

pub fn wishlist_routes() -> Router<AppState> {
    Router::new()
        .route("/wishlist", get(get_wishlist))
        .route("/wishlist", post(add_to_wishlist))
        .route("/wishlist", delete(clear_wishlist))
        .route("/wishlist/:product_id", delete(remove_from_wishlist))
}

#[derive(Debug, Deserialize)]
pub struct AddToWishlistRequest {
    pub product_id: Uuid,
}

#[instrument(skip(state))]
pub async fn get_wishlist(
    State(state): State<AppState>,
    AuthUser(ctx): AuthUser,
) -> Result<Json<Value>, ApiError> {
    let products = repo::products_of(&state.db, ctx.user_id).await?;
    Ok(Json(json!({ "products": products })))
}

#[instrument(skip(state, payload))]
pub async fn add_to_wishlist(
    State(state): State<AppState>,
    AuthUser(ctx): AuthUser,
    Json(payload): Json<AddToWishlistRequest>,
) -> Result<Json<Value>, ApiError> {
    if Product::find_by_id(&state.db, payload.product_id)
        .await?
        .is_none()
    {
        return Err(ApiError::NotFound("Product not found".into()));
    }

    if repo::contains(&state.db, ctx.user_id, payload.product_id).await? {
        return Err(ApiError::Conflict("Product already in wishlist".into()));
    }

    repo::add(&state.db, ctx.user_id, payload.product_id).await?;
    info!(user_id = %ctx.user_id, product_id = %payload.product_id, "added to wishlist");

    let products = repo::products_of(&state.db, ctx.user_id).await?;
    Ok(Json(json!({
        "message": "Product added to wishlist",
        "products": products
    })))
}

#[instrument(skip(state))]
pub async fn remove_from_wishlist(
    State(state): State<AppState>,
    AuthUser(ctx): AuthUser,
    Path(product_id): Path<Uuid>,
) -> Result<Json<Value>, ApiError> {
    if !repo::remove(&state.db, ctx.user_id, product_id).await? {
        return Err(ApiError::NotFound("Product not in wishlist".into()));
    }
    let products = repo::products_of(&state.db, ctx.user_id).await?;
    Ok(Json(json!({
        "message": "Product removed from wishlist",
        "products": products
    })))
}

#[instrument(skip(state))]
pub async fn clear_wishlist(
    State(state): State<AppState>,
    AuthUser(ctx): AuthUser,
) -> Result<Json<Value>, ApiError> {
    repo::clear(&state.db, ctx.user_id).await?;
    Ok(Json(json!({ "message": "Wishlist cleared", "products": [] })))
}
