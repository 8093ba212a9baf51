use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{delete, get, post, put},
    Json, Router,
};
use serde_json::{json, Value};
use tracing::{info, instrument};
use uuid::Uuid;

use crate::{
    auth::{repo::User, AuthUser},
    error::ApiError,
    products::repo::Product,
    reviews::{
        dto::{CreateReviewRequest, UpdateReviewRequest},
        repo::Review,
        services::recompute_product_rating,
    },
    state::AppState,
};

pub fn review_routes() -> Router<AppState> {
    Router::new()
        .route("/reviews", post(create_review))
        .route("/reviews/product/:product_id", get(product_reviews))
        .route("/reviews/user", get(user_reviews))
        .route("/reviews/:id", put(update_review))
        .route("/reviews/:id", delete(delete_review))
}

#[instrument(skip(state, payload))]
pub async fn create_review(
    State(state): State<AppState>,
    AuthUser(ctx): AuthUser,
    Json(payload): Json<CreateReviewRequest>,
) -> Result<(StatusCode, Json<Review>), ApiError> {
    if !(1..=5).contains(&payload.rating) {
        return Err(ApiError::Validation("Rating must be between 1 and 5".into()));
    }

    if Product::find_by_id(&state.db, payload.product_id)
        .await?
        .is_none()
    {
        return Err(ApiError::NotFound("Product not found".into()));
    }

    if Review::exists_for(&state.db, payload.product_id, ctx.user_id).await? {
        return Err(ApiError::Conflict(
            "You have already reviewed this product".into(),
        ));
    }

    let user = User::find_by_id(&state.db, ctx.user_id)
        .await?
        .ok_or_else(|| ApiError::Unauthorized("User not found".into()))?;

    let review = Review::create(
        &state.db,
        payload.product_id,
        ctx.user_id,
        &user.username,
        payload.rating,
        &payload.comment,
    )
    .await?;

    recompute_product_rating(&state.db, payload.product_id).await?;

    info!(review_id = %review.id, product_id = %payload.product_id, "review created");
    Ok((StatusCode::CREATED, Json(review)))
}

#[instrument(skip(state))]
pub async fn product_reviews(
    State(state): State<AppState>,
    Path(product_id): Path<Uuid>,
) -> Result<Json<Value>, ApiError> {
    let reviews = Review::list_by_product(&state.db, product_id).await?;
    Ok(Json(json!({ "success": true, "data": reviews })))
}

#[instrument(skip(state))]
pub async fn user_reviews(
    State(state): State<AppState>,
    AuthUser(ctx): AuthUser,
) -> Result<Json<Vec<Review>>, ApiError> {
    let reviews = Review::list_by_user(&state.db, ctx.user_id).await?;
    Ok(Json(reviews))
}

#[instrument(skip(state, payload))]
pub async fn update_review(
    State(state): State<AppState>,
    AuthUser(ctx): AuthUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateReviewRequest>,
) -> Result<Json<Review>, ApiError> {
    if let Some(rating) = payload.rating {
        if !(1..=5).contains(&rating) {
            return Err(ApiError::Validation("Rating must be between 1 and 5".into()));
        }
    }

    let review = Review::find_by_id(&state.db, id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Review not found".into()))?;

    if review.user_id != ctx.user_id {
        return Err(ApiError::Forbidden(
            "Not authorized to update this review".into(),
        ));
    }

    let review = Review::update(&state.db, id, payload.rating, payload.comment.as_deref()).await?;
    recompute_product_rating(&state.db, review.product_id).await?;

    Ok(Json(review))
}

#[instrument(skip(state))]
pub async fn delete_review(
    State(state): State<AppState>,
    AuthUser(ctx): AuthUser,
    Path(id): Path<Uuid>,
) -> Result<Json<Value>, ApiError> {
    let review = Review::find_by_id(&state.db, id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Review not found".into()))?;

    if review.user_id != ctx.user_id && !ctx.is_admin() {
        return Err(ApiError::Forbidden(
            "Not authorized to delete this review".into(),
        ));
    }

    Review::delete(&state.db, id).await?;
    recompute_product_rating(&state.db, review.product_id).await?;

    info!(review_id = %id, product_id = %review.product_id, "review deleted");
    Ok(Json(json!({ "success": true, "message": "Review deleted successfully" })))
}
