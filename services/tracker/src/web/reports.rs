//! services/tracker/src/web/reports.rs
//!
//! Read-only analytics endpoints over the stored production entries.

use axum::{
    extract::{Query, State},
    http::StatusCode,
    Json,
};
use chrono::NaiveDate;
use production_tracker_core::analytics::{
    self, AnalyticsFilter, DailyGroup, DailyTrend, MonthlySummary, MonthlyTrend, ProcessMetric,
    ProductTotals,
};
use production_tracker_core::domain::{Category, DashboardStats};
use serde::Deserialize;
use std::sync::Arc;
use utoipa::IntoParams;

use crate::web::state::AppState;

#[derive(Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct MonthQuery {
    pub category: Category,
    /// `YYYY-MM`
    pub month: String,
}

fn valid_month(month: &str) -> Result<&str, (StatusCode, String)> {
    let month = month.trim();
    let parsed = month.len() == 7 && NaiveDate::parse_from_str(&format!("{month}-01"), "%Y-%m-%d").is_ok();
    if parsed {
        Ok(month)
    } else {
        Err((
            StatusCode::BAD_REQUEST,
            format!("'{month}' is not a YYYY-MM month"),
        ))
    }
}

#[utoipa::path(
    get,
    path = "/analytics/monthly",
    params(MonthQuery),
    responses(
        (status = 200, description = "Plan vs actual for one department and month", body = MonthlySummary),
        (status = 400, description = "Malformed month")
    )
)]
pub async fn monthly_handler(
    State(state): State<Arc<AppState>>,
    Query(query): Query<MonthQuery>,
) -> Result<Json<MonthlySummary>, (StatusCode, String)> {
    let month = valid_month(&query.month)?;
    let entries = state.service.get_production_data().await;
    Ok(Json(analytics::monthly_summary(&entries, query.category, month)))
}

#[utoipa::path(
    get,
    path = "/analytics/daily",
    params(MonthQuery),
    responses(
        (status = 200, description = "Entries grouped by day, newest first", body = [DailyGroup]),
        (status = 400, description = "Malformed month")
    )
)]
pub async fn daily_handler(
    State(state): State<Arc<AppState>>,
    Query(query): Query<MonthQuery>,
) -> Result<Json<Vec<DailyGroup>>, (StatusCode, String)> {
    let month = valid_month(&query.month)?;
    let (entries, off_days) = futures::join!(
        state.service.get_production_data(),
        state.service.get_off_days()
    );
    Ok(Json(analytics::daily_groups(
        &entries,
        &off_days,
        query.category,
        month,
    )))
}

#[utoipa::path(
    get,
    path = "/analytics/processes",
    params(AnalyticsFilter),
    responses((status = 200, description = "Per-process efficiency, best first", body = [ProcessMetric]))
)]
pub async fn processes_handler(
    State(state): State<Arc<AppState>>,
    Query(filter): Query<AnalyticsFilter>,
) -> Json<Vec<ProcessMetric>> {
    let entries = state.service.get_production_data().await;
    Json(analytics::process_metrics(&entries, &filter))
}

#[utoipa::path(
    get,
    path = "/analytics/trend/monthly",
    params(AnalyticsFilter),
    responses((status = 200, description = "Plan vs actual per month, oldest first", body = [MonthlyTrend]))
)]
pub async fn monthly_trend_handler(
    State(state): State<Arc<AppState>>,
    Query(filter): Query<AnalyticsFilter>,
) -> Json<Vec<MonthlyTrend>> {
    let entries = state.service.get_production_data().await;
    Json(analytics::monthly_trend(&entries, &filter))
}

#[utoipa::path(
    get,
    path = "/analytics/trend/daily",
    params(AnalyticsFilter),
    responses((status = 200, description = "Average entry efficiency per day, oldest first", body = [DailyTrend]))
)]
pub async fn daily_trend_handler(
    State(state): State<Arc<AppState>>,
    Query(filter): Query<AnalyticsFilter>,
) -> Json<Vec<DailyTrend>> {
    let entries = state.service.get_production_data().await;
    Json(analytics::daily_trend(&entries, &filter))
}

#[utoipa::path(
    get,
    path = "/analytics/products",
    params(AnalyticsFilter),
    responses((status = 200, description = "Products with the largest planned quantity", body = [ProductTotals]))
)]
pub async fn top_products_handler(
    State(state): State<Arc<AppState>>,
    Query(filter): Query<AnalyticsFilter>,
) -> Json<Vec<ProductTotals>> {
    let entries = state.service.get_production_data().await;
    Json(analytics::top_products(&entries, &filter))
}

#[utoipa::path(
    get,
    path = "/analytics/stats",
    params(AnalyticsFilter),
    responses((status = 200, description = "Dashboard totals", body = DashboardStats))
)]
pub async fn stats_handler(
    State(state): State<Arc<AppState>>,
    Query(filter): Query<AnalyticsFilter>,
) -> Json<DashboardStats> {
    let mut entries = state.service.get_production_data().await;
    entries.retain(|e| filter.matches(e));
    Json(analytics::dashboard_stats(&entries))
}
