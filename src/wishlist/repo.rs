use sqlx::PgPool;
use uuid::Uuid;

use crate::products::repo::Product;

pub async fn contains(db: &PgPool, user_id: Uuid, product_id: Uuid) -> Result<bool, sqlx::Error> {
    sqlx::query_scalar(
        "SELECT EXISTS (SELECT 1 FROM wishlist_items WHERE user_id = $1 AND product_id = $2)",
    )
    .bind(user_id)
    .bind(product_id)
    .fetch_one(db)
    .await
}

pub async fn add(db: &PgPool, user_id: Uuid, product_id: Uuid) -> Result<(), sqlx::Error> {
    sqlx::query("INSERT INTO wishlist_items (user_id, product_id) VALUES ($1, $2)")
        .bind(user_id)
        .bind(product_id)
        .execute(db)
        .await?;
    Ok(())
}

pub async fn remove(db: &PgPool, user_id: Uuid, product_id: Uuid) -> Result<bool, sqlx::Error> {
    let res = sqlx::query("DELETE FROM wishlist_items WHERE user_id = $1 AND product_id = $2")
        .bind(user_id)
        .bind(product_id)
        .execute(db)
        .await?;
    Ok(res.rows_affected() > 0)
}

pub async fn clear(db: &PgPool, user_id: Uuid) -> Result<(), sqlx::Error> {
    sqlx::query("DELETE FROM wishlist_items WHERE user_id = $1")
        .bind(user_id)
        .execute(db)
        .await?;
    Ok(())
}

/// The wishlisted products themselves, newest addition first.
pub async fn products_of(db: &PgPool, user_id: Uuid) -> Result<Vec<Product>, sqlx::Error> {
    sqlx::query_as::<_, Product>(
        "SELECT p.id, p.name, p.price, p.category, p.description, p.image, p.image_kind, \
                p.stock, p.featured, p.rating, p.num_reviews, p.created_at, p.updated_at \
         FROM wishlist_items w \
         JOIN products p ON p.id = w.product_id \
         WHERE w.user_id = $1 \
         ORDER BY w.created_at DESC",
    )
    .bind(user_id)
    .fetch_all(db)
    .await
}
