use std::collections::HashMap;

use rust_decimal::Decimal;
use time::OffsetDateTime;
use uuid::Uuid;

use crate::{
    dashboard::dto::{MonthlySales, SalesReport},
    orders::repo::{Order, OrderWithItems},
    products::repo::{Product, ProductCategory},
};

pub const LOW_STOCK_THRESHOLD: i32 = 10;
pub const SALES_WINDOW_MONTHS: i64 = 6;

const MONTH_LABELS: [&str; 12] = [
    "Jan", "Feb", "Mar", "Apr", "May", "Jun", "Jul", "Aug", "Sep", "Oct", "Nov", "Dec",
];

pub fn total_revenue(orders: &[Order]) -> Decimal {
    orders.iter().map(|o| o.total_price).sum()
}

pub fn low_stock(products: &[Product]) -> Vec<&Product> {
    let mut low: Vec<&Product> = products
        .iter()
        .filter(|p| p.stock < LOW_STOCK_THRESHOLD)
        .collect();
    low.sort_by_key(|p| p.stock);
    low
}

/// Zero-based month count since year 0. Makes walking backwards across a
/// year boundary plain integer arithmetic.
fn month_index(date: OffsetDateTime) -> i64 {
    date.year() as i64 * 12 + date.month() as i64 - 1
}

/// Sales bucketed per calendar month for the trailing window ending at `now`,
/// oldest month first. Months without orders still get a zero bucket.
pub fn monthly_sales(orders: &[Order], now: OffsetDateTime) -> Vec<MonthlySales> {
    let mut buckets: HashMap<i64, (Decimal, i64)> = HashMap::new();
    for order in orders {
        let entry = buckets
            .entry(month_index(order.created_at))
            .or_insert((Decimal::ZERO, 0));
        entry.0 += order.total_price;
        entry.1 += 1;
    }

    let current = month_index(now);
    (current - (SALES_WINDOW_MONTHS - 1)..=current)
        .map(|idx| {
            let (sales, count) = buckets.get(&idx).copied().unwrap_or((Decimal::ZERO, 0));
            MonthlySales {
                month: MONTH_LABELS[idx.rem_euclid(12) as usize].to_string(),
                year: idx.div_euclid(12) as i32,
                sales,
                orders: count,
            }
        })
        .collect()
}

/// Revenue per product category, computed from line-item snapshots
/// cross-referenced against the current catalog. Lines whose product no
/// longer exists carry no category and are left out.
pub fn category_revenue(
    orders: &[OrderWithItems],
    category_of: &HashMap<Uuid, ProductCategory>,
) -> HashMap<ProductCategory, Decimal> {
    let mut revenue: HashMap<_, Decimal> = HashMap::new();
    for order in orders {
        for item in &order.items {
            let Some(category) = item.product_id.and_then(|id| category_of.get(&id)) else {
                continue;
            };
            *revenue.entry(*category).or_default() += item.price * Decimal::from(item.quantity);
        }
    }
    revenue
}

/// Aggregates a set of orders into the sales report. `category_of` maps
/// product ids to their current category; lines whose product no longer
/// exists are left out of the category breakdown.
pub fn sales_report(
    orders: &[OrderWithItems],
    category_of: &HashMap<Uuid, ProductCategory>,
) -> SalesReport {
    let total_orders = orders.len() as i64;
    let total_sales: Decimal = orders.iter().map(|o| o.order.total_price).sum();
    let average_order_value = if total_orders > 0 {
        (total_sales / Decimal::from(total_orders)).round_dp(2)
    } else {
        Decimal::ZERO
    };

    let mut sales_by_payment_method: HashMap<_, Decimal> = HashMap::new();
    let mut sales_by_status: HashMap<_, Decimal> = HashMap::new();

    for order in orders {
        *sales_by_payment_method
            .entry(order.order.payment_method)
            .or_default() += order.order.total_price;
        *sales_by_status.entry(order.order.status).or_default() += order.order.total_price;
    }

    let sales_by_category = category_revenue(orders, category_of);

    SalesReport {
        total_sales,
        total_orders,
        average_order_value,
        sales_by_payment_method,
        sales_by_status,
        sales_by_category,
    }
}

#[cfg(test)]
mod monthly_sales_tests {
    use super::*;
    use crate::orders::repo::{OrderStatus, PaymentMethod, PaymentStatus};
    use rust_decimal_macros::dec;
    use time::macros::datetime;

    fn order_at(created_at: OffsetDateTime, total: Decimal) -> Order {
        Order {
            id: Uuid::new_v4(),
            user_id: None,
            total_price: total,
            shipping_address: "1 Test Street".into(),
            customer_name: "Test Customer".into(),
            customer_email: "customer@example.com".into(),
            customer_phone: "0700000000".into(),
            payment_method: PaymentMethod::Card,
            status: OrderStatus::Pending,
            payment_status: PaymentStatus::Pending,
            is_guest_order: false,
            notes: None,
            created_at,
            updated_at: created_at,
        }
    }

    #[test]
    fn window_has_six_buckets_oldest_first() {
        let now = datetime!(2024-06-15 12:00 UTC);
        let buckets = monthly_sales(&[], now);

        assert_eq!(buckets.len(), 6);
        let labels: Vec<&str> = buckets.iter().map(|b| b.month.as_str()).collect();
        assert_eq!(labels, ["Jan", "Feb", "Mar", "Apr", "May", "Jun"]);
        assert!(buckets.iter().all(|b| b.year == 2024));
        assert!(buckets.iter().all(|b| b.sales == Decimal::ZERO && b.orders == 0));
    }

    #[test]
    fn window_crosses_year_boundary() {
        let now = datetime!(2024-01-15 12:00 UTC);
        let buckets = monthly_sales(&[], now);

        let labels: Vec<&str> = buckets.iter().map(|b| b.month.as_str()).collect();
        assert_eq!(labels, ["Aug", "Sep", "Oct", "Nov", "Dec", "Jan"]);
        assert_eq!(buckets[4].year, 2023);
        assert_eq!(buckets[5].year, 2024);
    }

    #[test]
    fn orders_land_in_their_month() {
        let now = datetime!(2024-06-15 12:00 UTC);
        let orders = vec![
            order_at(datetime!(2024-06-01 09:00 UTC), dec!(100)),
            order_at(datetime!(2024-06-20 09:00 UTC), dec!(50)),
            order_at(datetime!(2024-04-03 09:00 UTC), dec!(30)),
            // outside the window, must not appear anywhere
            order_at(datetime!(2023-11-03 09:00 UTC), dec!(999)),
        ];

        let buckets = monthly_sales(&orders, now);
        assert_eq!(buckets[5].sales, dec!(150));
        assert_eq!(buckets[5].orders, 2);
        assert_eq!(buckets[3].sales, dec!(30));
        assert_eq!(buckets[3].orders, 1);
        let total: Decimal = buckets.iter().map(|b| b.sales).sum();
        assert_eq!(total, dec!(180));
    }

    #[test]
    fn revenue_sums_every_order() {
        let orders = vec![
            order_at(datetime!(2024-06-01 09:00 UTC), dec!(19.99)),
            order_at(datetime!(2024-06-02 09:00 UTC), dec!(5.01)),
        ];
        assert_eq!(total_revenue(&orders), dec!(25.00));
        assert_eq!(total_revenue(&[]), Decimal::ZERO);
    }
}

#[cfg(test)]
mod sales_report_tests {
    use super::*;
    use crate::orders::repo::{OrderItem, OrderStatus, PaymentMethod, PaymentStatus};
    use rust_decimal_macros::dec;
    use time::macros::datetime;

    fn order_with_items(
        method: PaymentMethod,
        status: OrderStatus,
        total: Decimal,
        items: Vec<OrderItem>,
    ) -> OrderWithItems {
        let created_at = datetime!(2024-06-01 09:00 UTC);
        OrderWithItems {
            order: Order {
                id: Uuid::new_v4(),
                user_id: None,
                total_price: total,
                shipping_address: "1 Test Street".into(),
                customer_name: "Test Customer".into(),
                customer_email: "customer@example.com".into(),
                customer_phone: "0700000000".into(),
                payment_method: method,
                status,
                payment_status: PaymentStatus::Paid,
                is_guest_order: false,
                notes: None,
                created_at,
                updated_at: created_at,
            },
            items,
        }
    }

    fn item(product_id: Option<Uuid>, price: Decimal, quantity: i32) -> OrderItem {
        OrderItem {
            id: Uuid::new_v4(),
            order_id: Uuid::new_v4(),
            product_id,
            name: Some("Item".into()),
            price,
            quantity,
            image: None,
        }
    }

    #[test]
    fn empty_report_is_all_zero() {
        let report = sales_report(&[], &HashMap::new());
        assert_eq!(report.total_sales, Decimal::ZERO);
        assert_eq!(report.total_orders, 0);
        assert_eq!(report.average_order_value, Decimal::ZERO);
        assert!(report.sales_by_payment_method.is_empty());
    }

    #[test]
    fn totals_and_breakdowns_add_up() {
        let phone_id = Uuid::new_v4();
        let category_of = HashMap::from([(phone_id, ProductCategory::Phones)]);

        let orders = vec![
            order_with_items(
                PaymentMethod::Card,
                OrderStatus::Delivered,
                dec!(200),
                vec![item(Some(phone_id), dec!(100), 2)],
            ),
            order_with_items(
                PaymentMethod::CashOnDelivery,
                OrderStatus::Pending,
                dec!(50),
                vec![item(None, dec!(50), 1)],
            ),
        ];

        let report = sales_report(&orders, &category_of);
        assert_eq!(report.total_sales, dec!(250));
        assert_eq!(report.total_orders, 2);
        assert_eq!(report.average_order_value, dec!(125.00));
        assert_eq!(report.sales_by_payment_method[&PaymentMethod::Card], dec!(200));
        assert_eq!(
            report.sales_by_payment_method[&PaymentMethod::CashOnDelivery],
            dec!(50)
        );
        assert_eq!(report.sales_by_status[&OrderStatus::Delivered], dec!(200));
        assert_eq!(report.sales_by_category[&ProductCategory::Phones], dec!(200));
        // placeholder line has no product, so no category bucket for it
        assert_eq!(report.sales_by_category.len(), 1);
    }
}
