use std::collections::HashMap;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use crate::{
    orders::repo::{OrderStatus, OrderWithItems, PaymentMethod},
    products::repo::{Product, ProductCategory},
};

#[derive(Debug, Serialize)]
pub struct DashboardStats {
    pub total_products: i64,
    pub total_orders: i64,
    pub total_users: i64,
    pub total_revenue: Decimal,
    pub low_stock_products: Vec<Product>,
    pub monthly_sales: Vec<MonthlySales>,
    pub category_sales: HashMap<ProductCategory, Decimal>,
    pub recent_orders: Vec<OrderWithItems>,
}

/// One calendar-month bucket of the trailing sales window.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MonthlySales {
    pub month: String,
    pub year: i32,
    pub sales: Decimal,
    pub orders: i64,
}

#[derive(Debug, Deserialize)]
pub struct SalesQuery {
    #[serde(default, with = "time::serde::rfc3339::option")]
    pub start_date: Option<OffsetDateTime>,
    #[serde(default, with = "time::serde::rfc3339::option")]
    pub end_date: Option<OffsetDateTime>,
}

#[derive(Debug, Serialize)]
pub struct SalesReport {
    pub total_sales: Decimal,
    pub total_orders: i64,
    pub average_order_value: Decimal,
    pub sales_by_payment_method: HashMap<PaymentMethod, Decimal>,
    pub sales_by_status: HashMap<OrderStatus, Decimal>,
    pub sales_by_category: HashMap<ProductCategory, Decimal>,
}
