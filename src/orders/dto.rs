use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use uuid::Uuid;

use crate::orders::repo::{OrderStatus, PaymentMethod, PaymentStatus};

/// Checkout payload. All scalars are optional at the wire level so missing
/// fields surface as Validation errors instead of deserialization failures.
#[derive(Debug, Deserialize)]
pub struct CreateOrderRequest {
    #[serde(default)]
    pub items: Vec<OrderItemInput>,
    pub total_price: Option<Decimal>,
    pub shipping_address: Option<String>,
    pub customer_name: Option<String>,
    pub customer_email: Option<String>,
    pub customer_phone: Option<String>,
    pub payment_method: Option<PaymentMethod>,
    pub notes: Option<String>,
}

/// One requested line: either a product reference or a product name must be
/// present.
#[derive(Debug, Clone, Deserialize)]
pub struct OrderItemInput {
    pub product: Option<Uuid>,
    pub name: Option<String>,
    pub price: Option<Decimal>,
    pub quantity: Option<i32>,
    pub image: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct PlacedOrderResponse {
    pub success: bool,
    pub order: PlacedOrder,
    pub message: String,
}

#[derive(Debug, Serialize)]
pub struct PlacedOrder {
    pub id: Uuid,
    pub total_price: Decimal,
    pub status: OrderStatus,
    pub created_at: OffsetDateTime,
}

#[derive(Debug, Deserialize)]
pub struct UpdateStatusRequest {
    pub status: OrderStatus,
}

#[derive(Debug, Deserialize)]
pub struct UpdatePaymentRequest {
    pub payment_status: PaymentStatus,
}

/// Checkout payload after validation: every required scalar is present.
#[derive(Debug)]
pub struct ValidOrderRequest {
    pub items: Vec<ValidOrderItem>,
    pub total_price: Decimal,
    pub shipping_address: String,
    pub customer_name: String,
    pub customer_email: String,
    pub customer_phone: String,
    pub payment_method: PaymentMethod,
    pub notes: Option<String>,
}

#[derive(Debug)]
pub struct ValidOrderItem {
    pub product: Option<Uuid>,
    pub name: Option<String>,
    pub price: Option<Decimal>,
    pub quantity: i32,
    pub image: Option<String>,
}
