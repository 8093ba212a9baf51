use sqlx::PgPool;
use time::OffsetDateTime;
use tracing::{info, warn};
use uuid::Uuid;

use crate::{
    auth::{
        repo::{Role, User},
        services::generate_guest_password,
        AuthContext,
    },
    error::ApiError,
    orders::{
        dto::{CreateOrderRequest, PlacedOrder, ValidOrderItem, ValidOrderRequest},
        repo::{NewOrder, NewOrderItem, Order, OrderStatus},
    },
    products::repo::Product,
};

/// Rejects malformed checkout payloads before any database work happens.
pub fn validate_order_request(req: CreateOrderRequest) -> Result<ValidOrderRequest, ApiError> {
    if req.items.is_empty() {
        return Err(ApiError::Validation("Order must contain at least one item".into()));
    }

    let mut items = Vec::with_capacity(req.items.len());
    for item in req.items {
        let quantity = match item.quantity {
            Some(q) if q > 0 => q,
            _ => return Err(ApiError::Validation("Item quantity must be positive".into())),
        };
        if item.product.is_none() && item.name.as_deref().map_or(true, |n| n.trim().is_empty()) {
            return Err(ApiError::Validation(
                "Each item needs a product reference or a product name".into(),
            ));
        }
        items.push(ValidOrderItem {
            product: item.product,
            name: item.name,
            price: item.price,
            quantity,
            image: item.image,
        });
    }

    fn required(value: Option<String>, field: &str) -> Result<String, ApiError> {
        value
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
            .ok_or_else(|| ApiError::Validation(format!("{field} is required")))
    }

    Ok(ValidOrderRequest {
        items,
        total_price: req
            .total_price
            .ok_or_else(|| ApiError::Validation("total_price is required".into()))?,
        shipping_address: required(req.shipping_address, "shipping_address")?,
        customer_name: required(req.customer_name, "customer_name")?,
        customer_email: required(req.customer_email, "customer_email")?.to_lowercase(),
        customer_phone: required(req.customer_phone, "customer_phone")?,
        payment_method: req
            .payment_method
            .ok_or_else(|| ApiError::Validation("payment_method is required".into()))?,
        notes: req.notes,
    })
}

struct OrderIdentity {
    user_id: Uuid,
    is_guest_order: bool,
}

/// Identity resolution, in priority order: the authenticated caller, a stored
/// account matching the customer email, or a freshly minted guest account.
async fn resolve_identity(
    db: &PgPool,
    auth: Option<AuthContext>,
    customer_email: &str,
) -> Result<OrderIdentity, ApiError> {
    if let Some(ctx) = auth {
        return Ok(OrderIdentity {
            user_id: ctx.user_id,
            is_guest_order: false,
        });
    }

    if let Some(user) = User::find_by_email(db, customer_email).await? {
        return Ok(OrderIdentity {
            user_id: user.id,
            is_guest_order: false,
        });
    }

    let username = format!("guest_{}", OffsetDateTime::now_utc().unix_timestamp());
    let password_hash = crate::auth::services::hash_password(&generate_guest_password())?;
    // A concurrent first order from the same email hits the unique constraint
    // here and surfaces as Conflict.
    let guest = User::create(db, &username, customer_email, &password_hash, Role::Guest).await?;

    info!(user_id = %guest.id, email = %customer_email, "guest account created");
    Ok(OrderIdentity {
        user_id: guest.id,
        is_guest_order: true,
    })
}

/// Line resolution: an explicit product reference is used verbatim (dangling
/// references are allowed and caught at stock time); otherwise the product
/// name is looked up case-insensitively and its price/image backfill whatever
/// the caller omitted. Unresolvable lines keep a NULL product reference so
/// the order can still be saved.
async fn resolve_items(
    db: &PgPool,
    items: Vec<ValidOrderItem>,
) -> Result<Vec<NewOrderItem>, ApiError> {
    let mut resolved = Vec::with_capacity(items.len());
    for item in items {
        let (product_id, price, image) = match item.product {
            Some(id) => (Some(id), item.price, item.image),
            None => {
                let name = item.name.as_deref().unwrap_or_default();
                match Product::find_by_name_ci(db, name).await {
                    Ok(Some(product)) => (
                        Some(product.id),
                        item.price.or(Some(product.price)),
                        item.image.or(Some(product.image)),
                    ),
                    Ok(None) => {
                        warn!(name, "no product matches item name, saving placeholder line");
                        (None, item.price, item.image)
                    }
                    Err(e) => {
                        warn!(name, error = %e, "product lookup failed, saving placeholder line");
                        (None, item.price, item.image)
                    }
                }
            }
        };
        resolved.push(NewOrderItem {
            product_id,
            name: item.name,
            price: price.unwrap_or_default(),
            quantity: item.quantity,
            image,
        });
    }
    Ok(resolved)
}

/// Places an order: validation, identity resolution, line resolution, then a
/// single transaction covering the order insert and every conditional stock
/// decrement, so a failed decrement leaves no partial order behind.
pub async fn place_order(
    db: &PgPool,
    auth: Option<AuthContext>,
    req: CreateOrderRequest,
) -> Result<PlacedOrder, ApiError> {
    let req = validate_order_request(req)?;
    let identity = resolve_identity(db, auth, &req.customer_email).await?;
    let items = resolve_items(db, req.items).await?;

    let mut tx = db.begin().await.map_err(ApiError::from)?;

    let order = Order::insert(
        &mut tx,
        &NewOrder {
            user_id: Some(identity.user_id),
            total_price: req.total_price,
            shipping_address: req.shipping_address,
            customer_name: req.customer_name,
            customer_email: req.customer_email,
            customer_phone: req.customer_phone,
            payment_method: req.payment_method,
            is_guest_order: identity.is_guest_order,
            notes: req.notes,
        },
    )
    .await?;

    for item in &items {
        Order::insert_item(&mut tx, order.id, item).await?;
    }

    for item in &items {
        let Some(product_id) = item.product_id else {
            // Placeholder line: no stock to adjust.
            continue;
        };
        if !Product::try_decrement_stock(&mut tx, product_id, item.quantity).await? {
            if Product::exists(&mut tx, product_id).await? {
                // Dropping the transaction rolls the whole order back.
                return Err(ApiError::Conflict(format!(
                    "Insufficient stock for product {product_id}"
                )));
            }
            // Dangling reference: the order still saves, stock is untouched.
            warn!(order_id = %order.id, %product_id, "order line references a missing product");
        }
    }

    tx.commit().await.map_err(ApiError::from)?;

    info!(order_id = %order.id, user_id = %identity.user_id, guest = identity.is_guest_order, "order placed");
    Ok(PlacedOrder {
        id: order.id,
        total_price: order.total_price,
        status: order.status,
        created_at: order.created_at,
    })
}

/// Cancellation is only legal while the order is still pending or processing.
pub fn ensure_cancellable(status: OrderStatus) -> Result<(), ApiError> {
    match status {
        OrderStatus::Pending | OrderStatus::Processing => Ok(()),
        _ => Err(ApiError::InvalidState(
            "Cannot cancel order. Order is already shipped or delivered.".into(),
        )),
    }
}

/// Cancels an order and restores the stock of every resolved line, in one
/// transaction with the status flip.
pub async fn cancel_order(
    db: &PgPool,
    ctx: AuthContext,
    order_id: Uuid,
) -> Result<Order, ApiError> {
    let order = Order::find_by_id(db, order_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Order not found".into()))?;

    if !ctx.is_admin() && order.user_id != Some(ctx.user_id) {
        return Err(ApiError::Forbidden("Not authorized to cancel this order".into()));
    }
    ensure_cancellable(order.status)?;

    let items = Order::items_of(db, order_id).await?;

    let mut tx = db.begin().await.map_err(ApiError::from)?;
    let order = Order::set_cancelled(&mut tx, order_id).await?;
    for item in &items {
        if let Some(product_id) = item.product_id {
            Product::increment_stock(&mut tx, product_id, item.quantity).await?;
        }
    }
    tx.commit().await.map_err(ApiError::from)?;

    info!(order_id = %order.id, "order cancelled, stock restored");
    Ok(order)
}

#[cfg(test)]
mod validation_tests {
    use super::*;
    use crate::orders::dto::OrderItemInput;
    use crate::orders::repo::PaymentMethod;
    use rust_decimal::Decimal;

    fn base_request() -> CreateOrderRequest {
        CreateOrderRequest {
            items: vec![OrderItemInput {
                product: Some(Uuid::new_v4()),
                name: Some("USB-C Charger".into()),
                price: Some(Decimal::from(10)),
                quantity: Some(2),
                image: None,
            }],
            total_price: Some(Decimal::from(20)),
            shipping_address: Some("12 Main St".into()),
            customer_name: Some("Ada".into()),
            customer_email: Some("Ada@Example.com".into()),
            customer_phone: Some("555-0100".into()),
            payment_method: Some(PaymentMethod::CashOnDelivery),
            notes: None,
        }
    }

    #[test]
    fn accepts_a_complete_request_and_lowercases_email() {
        let valid = validate_order_request(base_request()).expect("should validate");
        assert_eq!(valid.items.len(), 1);
        assert_eq!(valid.items[0].quantity, 2);
        assert_eq!(valid.customer_email, "ada@example.com");
    }

    #[test]
    fn rejects_empty_items() {
        let mut req = base_request();
        req.items.clear();
        assert!(matches!(
            validate_order_request(req),
            Err(ApiError::Validation(_))
        ));
    }

    #[test]
    fn rejects_non_positive_quantity() {
        let mut req = base_request();
        req.items[0].quantity = Some(0);
        assert!(matches!(
            validate_order_request(req),
            Err(ApiError::Validation(_))
        ));

        let mut req = base_request();
        req.items[0].quantity = None;
        assert!(matches!(
            validate_order_request(req),
            Err(ApiError::Validation(_))
        ));
    }

    #[test]
    fn rejects_item_with_neither_reference_nor_name() {
        let mut req = base_request();
        req.items[0].product = None;
        req.items[0].name = Some("   ".into());
        assert!(matches!(
            validate_order_request(req),
            Err(ApiError::Validation(_))
        ));
    }

    #[test]
    fn item_with_name_only_is_accepted() {
        let mut req = base_request();
        req.items[0].product = None;
        req.items[0].name = Some("USB-C Charger".into());
        assert!(validate_order_request(req).is_ok());
    }

    #[test]
    fn rejects_missing_scalars() {
        for field in 0..5 {
            let mut req = base_request();
            match field {
                0 => req.total_price = None,
                1 => req.shipping_address = None,
                2 => req.customer_name = Some("  ".into()),
                3 => req.customer_email = None,
                4 => req.customer_phone = None,
                _ => unreachable!(),
            }
            assert!(
                matches!(validate_order_request(req), Err(ApiError::Validation(_))),
                "field {field} should be required"
            );
        }

        let mut req = base_request();
        req.payment_method = None;
        assert!(matches!(
            validate_order_request(req),
            Err(ApiError::Validation(_))
        ));
    }
}

#[cfg(test)]
mod cancellation_tests {
    use super::*;

    #[test]
    fn pending_and_processing_are_cancellable() {
        assert!(ensure_cancellable(OrderStatus::Pending).is_ok());
        assert!(ensure_cancellable(OrderStatus::Processing).is_ok());
    }

    #[test]
    fn later_states_are_not() {
        for status in [
            OrderStatus::Shipped,
            OrderStatus::Delivered,
            OrderStatus::Cancelled,
        ] {
            assert!(matches!(
                ensure_cancellable(status),
                Err(ApiError::InvalidState(_))
            ));
        }
    }
}
