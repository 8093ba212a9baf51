use std::collections::HashMap;

use axum::{
    extract::{Query, State},
    routing::get,
    Json, Router,
};
use tracing::instrument;

use crate::{
    auth::{repo::User, AdminUser},
    dashboard::{
        dto::{DashboardStats, SalesQuery, SalesReport},
        services,
    },
    error::ApiError,
    orders::repo::Order,
    products::repo::Product,
    state::AppState,
};

const RECENT_ORDERS_LIMIT: usize = 5;

pub fn dashboard_routes() -> Router<AppState> {
    Router::new()
        .route("/dashboard/stats", get(dashboard_stats))
        .route("/dashboard/sales", get(sales_report))
}

#[instrument(skip(state))]
pub async fn dashboard_stats(
    State(state): State<AppState>,
    AdminUser(_): AdminUser,
) -> Result<Json<DashboardStats>, ApiError> {
    let products = Product::all(&state.db).await?;
    let orders = Order::list_all(&state.db).await?;
    let total_users = User::count_non_admin(&state.db).await?;

    let total_orders = orders.len() as i64;
    let total_revenue = services::total_revenue(&orders);
    let monthly_sales = services::monthly_sales(&orders, time::OffsetDateTime::now_utc());
    let low_stock_products = services::low_stock(&products)
        .into_iter()
        .cloned()
        .collect();

    let orders = Order::attach_items(&state.db, orders).await?;
    let category_of: HashMap<_, _> = products.iter().map(|p| (p.id, p.category)).collect();
    let category_sales = services::category_revenue(&orders, &category_of);

    // list_all returns newest first.
    let recent_orders = orders.into_iter().take(RECENT_ORDERS_LIMIT).collect();

    Ok(Json(DashboardStats {
        total_products: products.len() as i64,
        total_orders,
        total_users,
        total_revenue,
        low_stock_products,
        monthly_sales,
        category_sales,
        recent_orders,
    }))
}

#[instrument(skip(state))]
pub async fn sales_report(
    State(state): State<AppState>,
    AdminUser(_): AdminUser,
    Query(query): Query<SalesQuery>,
) -> Result<Json<SalesReport>, ApiError> {
    let orders = Order::list_between(&state.db, query.start_date, query.end_date).await?;
    let orders = Order::attach_items(&state.db, orders).await?;

    let category_of: HashMap<_, _> = Product::all(&state.db)
        .await?
        .into_iter()
        .map(|p| (p.id, p.category))
        .collect();

    Ok(Json(services::sales_report(&orders, &category_of)))
}
