use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool};
use time::OffsetDateTime;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Review {
    pub id: Uuid,
    pub product_id: Uuid,
    pub user_id: Uuid,
    /// Username captured at review time; not refreshed on rename.
    pub username: String,
    pub rating: i16,
    pub comment: String,
    pub created_at: OffsetDateTime,
    pub updated_at: OffsetDateTime,
}

const REVIEW_COLUMNS: &str =
    "id, product_id, user_id, username, rating, comment, created_at, updated_at";

impl Review {
    pub async fn create(
        db: &PgPool,
        product_id: Uuid,
        user_id: Uuid,
        username: &str,
        rating: i16,
        comment: &str,
    ) -> Result<Review, sqlx::Error> {
        sqlx::query_as::<_, Review>(&format!(
            "INSERT INTO reviews (id, product_id, user_id, username, rating, comment) \
             VALUES ($1, $2, $3, $4, $5, $6) \
             RETURNING {REVIEW_COLUMNS}"
        ))
        .bind(Uuid::new_v4())
        .bind(product_id)
        .bind(user_id)
        .bind(username)
        .bind(rating)
        .bind(comment)
        .fetch_one(db)
        .await
    }

    pub async fn find_by_id(db: &PgPool, id: Uuid) -> Result<Option<Review>, sqlx::Error> {
        sqlx::query_as::<_, Review>(&format!(
            "SELECT {REVIEW_COLUMNS} FROM reviews WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(db)
        .await
    }

    pub async fn exists_for(
        db: &PgPool,
        product_id: Uuid,
        user_id: Uuid,
    ) -> Result<bool, sqlx::Error> {
        sqlx::query_scalar(
            "SELECT EXISTS (SELECT 1 FROM reviews WHERE product_id = $1 AND user_id = $2)",
        )
        .bind(product_id)
        .bind(user_id)
        .fetch_one(db)
        .await
    }

    pub async fn list_by_product(
        db: &PgPool,
        product_id: Uuid,
    ) -> Result<Vec<Review>, sqlx::Error> {
        sqlx::query_as::<_, Review>(&format!(
            "SELECT {REVIEW_COLUMNS} FROM reviews WHERE product_id = $1 ORDER BY created_at DESC"
        ))
        .bind(product_id)
        .fetch_all(db)
        .await
    }

    pub async fn list_by_user(db: &PgPool, user_id: Uuid) -> Result<Vec<Review>, sqlx::Error> {
        sqlx::query_as::<_, Review>(&format!(
            "SELECT {REVIEW_COLUMNS} FROM reviews WHERE user_id = $1 ORDER BY created_at DESC"
        ))
        .bind(user_id)
        .fetch_all(db)
        .await
    }

    pub async fn update(
        db: &PgPool,
        id: Uuid,
        rating: Option<i16>,
        comment: Option<&str>,
    ) -> Result<Review, sqlx::Error> {
        sqlx::query_as::<_, Review>(&format!(
            "UPDATE reviews SET \
                 rating = COALESCE($2, rating), \
                 comment = COALESCE($3, comment), \
                 updated_at = now() \
             WHERE id = $1 \
             RETURNING {REVIEW_COLUMNS}"
        ))
        .bind(id)
        .bind(rating)
        .bind(comment)
        .fetch_one(db)
        .await
    }

    pub async fn delete(db: &PgPool, id: Uuid) -> Result<(), sqlx::Error> {
        sqlx::query("DELETE FROM reviews WHERE id = $1")
            .bind(id)
            .execute(db)
            .await?;
        Ok(())
    }

    pub async fn ratings_for_product(
        db: &PgPool,
        product_id: Uuid,
    ) -> Result<Vec<i16>, sqlx::Error> {
        sqlx::query_scalar("SELECT rating FROM reviews WHERE product_id = $1")
            .bind(product_id)
            .fetch_all(db)
            .await
    }
}
