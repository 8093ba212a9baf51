use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool, Postgres, Transaction};
use time::OffsetDateTime;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "snake_case")]
#[sqlx(type_name = "payment_method", rename_all = "snake_case")]
pub enum PaymentMethod {
    CashOnDelivery,
    BankTransfer,
    Card,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "lowercase")]
#[sqlx(type_name = "order_status", rename_all = "lowercase")]
pub enum OrderStatus {
    Pending,
    Processing,
    Shipped,
    Delivered,
    Cancelled,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "lowercase")]
#[sqlx(type_name = "payment_status", rename_all = "lowercase")]
pub enum PaymentStatus {
    Pending,
    Paid,
    Failed,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Order {
    pub id: Uuid,
    pub user_id: Option<Uuid>,
    pub total_price: Decimal,
    pub shipping_address: String,
    pub customer_name: String,
    pub customer_email: String,
    pub customer_phone: String,
    pub payment_method: PaymentMethod,
    pub status: OrderStatus,
    pub payment_status: PaymentStatus,
    pub is_guest_order: bool,
    pub notes: Option<String>,
    pub created_at: OffsetDateTime,
    pub updated_at: OffsetDateTime,
}

/// One order line with the name/price/image captured at order time. A NULL
/// product_id is the placeholder for a line that could not be resolved.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct OrderItem {
    pub id: Uuid,
    pub order_id: Uuid,
    pub product_id: Option<Uuid>,
    pub name: Option<String>,
    pub price: Decimal,
    pub quantity: i32,
    pub image: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct OrderWithItems {
    #[serde(flatten)]
    pub order: Order,
    pub items: Vec<OrderItem>,
}

const ORDER_COLUMNS: &str = "id, user_id, total_price, shipping_address, customer_name, \
                             customer_email, customer_phone, payment_method, status, \
                             payment_status, is_guest_order, notes, created_at, updated_at";
const ITEM_COLUMNS: &str = "id, order_id, product_id, name, price, quantity, image";

pub struct NewOrder {
    pub user_id: Option<Uuid>,
    pub total_price: Decimal,
    pub shipping_address: String,
    pub customer_name: String,
    pub customer_email: String,
    pub customer_phone: String,
    pub payment_method: PaymentMethod,
    pub is_guest_order: bool,
    pub notes: Option<String>,
}

pub struct NewOrderItem {
    pub product_id: Option<Uuid>,
    pub name: Option<String>,
    pub price: Decimal,
    pub quantity: i32,
    pub image: Option<String>,
}

impl Order {
    pub async fn insert(
        tx: &mut Transaction<'_, Postgres>,
        new: &NewOrder,
    ) -> Result<Order, sqlx::Error> {
        sqlx::query_as::<_, Order>(&format!(
            "INSERT INTO orders (id, user_id, total_price, shipping_address, customer_name, \
                                 customer_email, customer_phone, payment_method, is_guest_order, notes) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10) \
             RETURNING {ORDER_COLUMNS}"
        ))
        .bind(Uuid::new_v4())
        .bind(new.user_id)
        .bind(new.total_price)
        .bind(&new.shipping_address)
        .bind(&new.customer_name)
        .bind(&new.customer_email)
        .bind(&new.customer_phone)
        .bind(new.payment_method)
        .bind(new.is_guest_order)
        .bind(&new.notes)
        .fetch_one(&mut **tx)
        .await
    }

    pub async fn insert_item(
        tx: &mut Transaction<'_, Postgres>,
        order_id: Uuid,
        item: &NewOrderItem,
    ) -> Result<(), sqlx::Error> {
        sqlx::query(
            "INSERT INTO order_items (id, order_id, product_id, name, price, quantity, image) \
             VALUES ($1, $2, $3, $4, $5, $6, $7)",
        )
        .bind(Uuid::new_v4())
        .bind(order_id)
        .bind(item.product_id)
        .bind(&item.name)
        .bind(item.price)
        .bind(item.quantity)
        .bind(&item.image)
        .execute(&mut **tx)
        .await?;
        Ok(())
    }

    pub async fn find_by_id(db: &PgPool, id: Uuid) -> Result<Option<Order>, sqlx::Error> {
        sqlx::query_as::<_, Order>(&format!("SELECT {ORDER_COLUMNS} FROM orders WHERE id = $1"))
            .bind(id)
            .fetch_optional(db)
            .await
    }

    pub async fn items_of(db: &PgPool, order_id: Uuid) -> Result<Vec<OrderItem>, sqlx::Error> {
        sqlx::query_as::<_, OrderItem>(&format!(
            "SELECT {ITEM_COLUMNS} FROM order_items WHERE order_id = $1"
        ))
        .bind(order_id)
        .fetch_all(db)
        .await
    }

    pub async fn list_all(db: &PgPool) -> Result<Vec<Order>, sqlx::Error> {
        sqlx::query_as::<_, Order>(&format!(
            "SELECT {ORDER_COLUMNS} FROM orders ORDER BY created_at DESC"
        ))
        .fetch_all(db)
        .await
    }

    pub async fn list_by_user(db: &PgPool, user_id: Uuid) -> Result<Vec<Order>, sqlx::Error> {
        sqlx::query_as::<_, Order>(&format!(
            "SELECT {ORDER_COLUMNS} FROM orders WHERE user_id = $1 ORDER BY created_at DESC"
        ))
        .bind(user_id)
        .fetch_all(db)
        .await
    }

    pub async fn count(db: &PgPool) -> Result<i64, sqlx::Error> {
        sqlx::query_scalar("SELECT COUNT(*) FROM orders")
            .fetch_one(db)
            .await
    }

    pub async fn list_between(
        db: &PgPool,
        start: Option<OffsetDateTime>,
        end: Option<OffsetDateTime>,
    ) -> Result<Vec<Order>, sqlx::Error> {
        sqlx::query_as::<_, Order>(&format!(
            "SELECT {ORDER_COLUMNS} FROM orders \
             WHERE ($1::timestamptz IS NULL OR created_at >= $1) \
               AND ($2::timestamptz IS NULL OR created_at <= $2) \
             ORDER BY created_at DESC"
        ))
        .bind(start)
        .bind(end)
        .fetch_all(db)
        .await
    }

    pub async fn update_status(
        db: &PgPool,
        id: Uuid,
        status: OrderStatus,
    ) -> Result<Option<Order>, sqlx::Error> {
        sqlx::query_as::<_, Order>(&format!(
            "UPDATE orders SET status = $2, updated_at = now() WHERE id = $1 \
             RETURNING {ORDER_COLUMNS}"
        ))
        .bind(id)
        .bind(status)
        .fetch_optional(db)
        .await
    }

    pub async fn update_payment_status(
        db: &PgPool,
        id: Uuid,
        payment_status: PaymentStatus,
    ) -> Result<Option<Order>, sqlx::Error> {
        sqlx::query_as::<_, Order>(&format!(
            "UPDATE orders SET payment_status = $2, updated_at = now() WHERE id = $1 \
             RETURNING {ORDER_COLUMNS}"
        ))
        .bind(id)
        .bind(payment_status)
        .fetch_optional(db)
        .await
    }

    pub async fn set_cancelled(
        tx: &mut Transaction<'_, Postgres>,
        id: Uuid,
    ) -> Result<Order, sqlx::Error> {
        sqlx::query_as::<_, Order>(&format!(
            "UPDATE orders SET status = 'cancelled', updated_at = now() WHERE id = $1 \
             RETURNING {ORDER_COLUMNS}"
        ))
        .bind(id)
        .fetch_one(&mut **tx)
        .await
    }

    /// Loads the line items for a batch of orders in one query.
    pub async fn attach_items(
        db: &PgPool,
        orders: Vec<Order>,
    ) -> Result<Vec<OrderWithItems>, sqlx::Error> {
        let ids: Vec<Uuid> = orders.iter().map(|o| o.id).collect();
        let mut items = sqlx::query_as::<_, OrderItem>(&format!(
            "SELECT {ITEM_COLUMNS} FROM order_items WHERE order_id = ANY($1)"
        ))
        .bind(&ids)
        .fetch_all(db)
        .await?;

        let mut by_order: std::collections::HashMap<Uuid, Vec<OrderItem>> =
            std::collections::HashMap::new();
        for item in items.drain(..) {
            by_order.entry(item.order_id).or_default().push(item);
        }

        Ok(orders
            .into_iter()
            .map(|order| {
                let items = by_order.remove(&order.id).unwrap_or_default();
                OrderWithItems { order, items }
            })
            .collect())
    }
}
