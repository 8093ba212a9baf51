use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool, Postgres, QueryBuilder, Transaction};
use time::OffsetDateTime;
use uuid::Uuid;

use crate::products::dto::SortOrder;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "lowercase")]
#[sqlx(type_name = "product_category", rename_all = "lowercase")]
pub enum ProductCategory {
    Phones,
    Laptops,
    Fans,
    Headphones,
    Chargers,
    Powerbanks,
    Accessories,
}

impl std::str::FromStr for ProductCategory {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "phones" => Ok(Self::Phones),
            "laptops" => Ok(Self::Laptops),
            "fans" => Ok(Self::Fans),
            "headphones" => Ok(Self::Headphones),
            "chargers" => Ok(Self::Chargers),
            "powerbanks" => Ok(Self::Powerbanks),
            "accessories" => Ok(Self::Accessories),
            _ => Err(()),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "lowercase")]
#[sqlx(type_name = "image_kind", rename_all = "lowercase")]
pub enum ImageKind {
    Upload,
    Url,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Product {
    pub id: Uuid,
    pub name: String,
    pub price: Decimal,
    pub category: ProductCategory,
    pub description: String,
    pub image: String,
    pub image_kind: ImageKind,
    pub stock: i32,
    pub featured: bool,
    pub rating: f64,
    pub num_reviews: i32,
    pub created_at: OffsetDateTime,
    pub updated_at: OffsetDateTime,
}

const PRODUCT_COLUMNS: &str = "id, name, price, category, description, image, image_kind, \
                               stock, featured, rating, num_reviews, created_at, updated_at";

pub struct NewProduct {
    pub name: String,
    pub price: Decimal,
    pub category: ProductCategory,
    pub description: String,
    pub image: String,
    pub image_kind: ImageKind,
    pub stock: i32,
    pub featured: bool,
}

/// Partial update; `None` keeps the stored value.
#[derive(Default)]
pub struct ProductUpdate {
    pub name: Option<String>,
    pub price: Option<Decimal>,
    pub category: Option<ProductCategory>,
    pub description: Option<String>,
    pub image: Option<(String, ImageKind)>,
    pub stock: Option<i32>,
    pub featured: Option<bool>,
}

impl Product {
    pub async fn list(
        db: &PgPool,
        category: Option<ProductCategory>,
        search: Option<&str>,
        sort: SortOrder,
    ) -> Result<Vec<Product>, sqlx::Error> {
        let mut qb: QueryBuilder<Postgres> =
            QueryBuilder::new(format!("SELECT {PRODUCT_COLUMNS} FROM products WHERE TRUE"));
        if let Some(category) = category {
            qb.push(" AND category = ").push_bind(category);
        }
        if let Some(search) = search {
            let pattern = format!("%{}%", search);
            qb.push(" AND (name ILIKE ")
                .push_bind(pattern.clone())
                .push(" OR description ILIKE ")
                .push_bind(pattern)
                .push(")");
        }
        qb.push(" ORDER BY ").push(sort.order_by_sql());
        qb.build_query_as::<Product>().fetch_all(db).await
    }

    pub async fn featured(db: &PgPool, limit: i64) -> Result<Vec<Product>, sqlx::Error> {
        sqlx::query_as::<_, Product>(&format!(
            "SELECT {PRODUCT_COLUMNS} FROM products WHERE featured ORDER BY created_at DESC LIMIT $1"
        ))
        .bind(limit)
        .fetch_all(db)
        .await
    }

    pub async fn by_category(
        db: &PgPool,
        category: ProductCategory,
    ) -> Result<Vec<Product>, sqlx::Error> {
        sqlx::query_as::<_, Product>(&format!(
            "SELECT {PRODUCT_COLUMNS} FROM products WHERE category = $1 ORDER BY created_at DESC"
        ))
        .bind(category)
        .fetch_all(db)
        .await
    }

    pub async fn find_by_id(db: &PgPool, id: Uuid) -> Result<Option<Product>, sqlx::Error> {
        sqlx::query_as::<_, Product>(&format!(
            "SELECT {PRODUCT_COLUMNS} FROM products WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(db)
        .await
    }

    /// Case-insensitive exact-match lookup used by the order workflow's
    /// by-name fallback.
    pub async fn find_by_name_ci(db: &PgPool, name: &str) -> Result<Option<Product>, sqlx::Error> {
        sqlx::query_as::<_, Product>(&format!(
            "SELECT {PRODUCT_COLUMNS} FROM products WHERE lower(name) = lower($1) LIMIT 1"
        ))
        .bind(name)
        .fetch_optional(db)
        .await
    }

    pub async fn create(db: &PgPool, new: &NewProduct) -> Result<Product, sqlx::Error> {
        sqlx::query_as::<_, Product>(&format!(
            "INSERT INTO products (id, name, price, category, description, image, image_kind, stock, featured) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9) \
             RETURNING {PRODUCT_COLUMNS}"
        ))
        .bind(Uuid::new_v4())
        .bind(&new.name)
        .bind(new.price)
        .bind(new.category)
        .bind(&new.description)
        .bind(&new.image)
        .bind(new.image_kind)
        .bind(new.stock)
        .bind(new.featured)
        .fetch_one(db)
        .await
    }

    pub async fn update(
        db: &PgPool,
        id: Uuid,
        update: &ProductUpdate,
    ) -> Result<Product, sqlx::Error> {
        let (image, image_kind) = match &update.image {
            Some((image, kind)) => (Some(image.clone()), Some(*kind)),
            None => (None, None),
        };
        sqlx::query_as::<_, Product>(&format!(
            "UPDATE products SET \
                 name = COALESCE($2, name), \
                 price = COALESCE($3, price), \
                 category = COALESCE($4, category), \
                 description = COALESCE($5, description), \
                 image = COALESCE($6, image), \
                 image_kind = COALESCE($7, image_kind), \
                 stock = COALESCE($8, stock), \
                 featured = COALESCE($9, featured), \
                 updated_at = now() \
             WHERE id = $1 \
             RETURNING {PRODUCT_COLUMNS}"
        ))
        .bind(id)
        .bind(&update.name)
        .bind(update.price)
        .bind(update.category)
        .bind(&update.description)
        .bind(image)
        .bind(image_kind)
        .bind(update.stock)
        .bind(update.featured)
        .fetch_one(db)
        .await
    }

    pub async fn delete(db: &PgPool, id: Uuid) -> Result<bool, sqlx::Error> {
        let res = sqlx::query("DELETE FROM products WHERE id = $1")
            .bind(id)
            .execute(db)
            .await?;
        Ok(res.rows_affected() > 0)
    }

    pub async fn all(db: &PgPool) -> Result<Vec<Product>, sqlx::Error> {
        sqlx::query_as::<_, Product>(&format!("SELECT {PRODUCT_COLUMNS} FROM products"))
            .fetch_all(db)
            .await
    }

    pub async fn count(db: &PgPool) -> Result<i64, sqlx::Error> {
        sqlx::query_scalar("SELECT COUNT(*) FROM products")
            .fetch_one(db)
            .await
    }

    pub async fn set_rating(
        db: &PgPool,
        id: Uuid,
        rating: f64,
        num_reviews: i64,
    ) -> Result<(), sqlx::Error> {
        sqlx::query(
            "UPDATE products SET rating = $2, num_reviews = $3, updated_at = now() WHERE id = $1",
        )
        .bind(id)
        .bind(rating)
        .bind(num_reviews as i32)
        .execute(db)
        .await?;
        Ok(())
    }

    /// Conditional decrement used inside the order transaction. Returns false
    /// when no row changed: either the product does not exist or stock would
    /// go negative.
    pub async fn try_decrement_stock(
        tx: &mut Transaction<'_, Postgres>,
        id: Uuid,
        quantity: i32,
    ) -> Result<bool, sqlx::Error> {
        let res = sqlx::query(
            "UPDATE products SET stock = stock - $2, updated_at = now() \
             WHERE id = $1 AND stock >= $2",
        )
        .bind(id)
        .bind(quantity)
        .execute(&mut **tx)
        .await?;
        Ok(res.rows_affected() > 0)
    }

    pub async fn increment_stock(
        tx: &mut Transaction<'_, Postgres>,
        id: Uuid,
        quantity: i32,
    ) -> Result<(), sqlx::Error> {
        sqlx::query(
            "UPDATE products SET stock = stock + $2, updated_at = now() WHERE id = $1",
        )
        .bind(id)
        .bind(quantity)
        .execute(&mut **tx)
        .await?;
        Ok(())
    }

    pub async fn exists(
        tx: &mut Transaction<'_, Postgres>,
        id: Uuid,
    ) -> Result<bool, sqlx::Error> {
        sqlx::query_scalar("SELECT EXISTS (SELECT 1 FROM products WHERE id = $1)")
            .bind(id)
            .fetch_one(&mut **tx)
            .await
    }
}
