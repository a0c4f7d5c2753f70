//! crates/production_tracker_core/src/analytics.rs
//!
//! Read-only aggregations over production entries for the reporting views.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use utoipa::{IntoParams, ToSchema};

use crate::domain::{Category, DashboardStats, OffDay, ProcessType, ProductionEntry};

/// Actual over plan as a percentage; zero when nothing was planned.
pub fn efficiency(plan: f64, actual: f64) -> f64 {
    if plan > 0.0 {
        actual / plan * 100.0
    } else {
        0.0
    }
}

fn one_decimal(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

//=========================================================================================
// Monthly summary
//=========================================================================================

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ProcessTotals {
    pub process: ProcessType,
    pub plan: f64,
    pub actual: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct MonthlySummary {
    /// `YYYY-MM`
    pub month: String,
    pub category: Category,
    pub plan: f64,
    pub actual: f64,
    pub efficiency: f64,
    /// One row per process, including processes with no entries.
    pub by_process: Vec<ProcessTotals>,
}

fn in_month<'a>(
    entries: &'a [ProductionEntry],
    category: Category,
    month: &'a str,
) -> impl Iterator<Item = &'a ProductionEntry> + 'a {
    entries
        .iter()
        .filter(move |e| e.category == category && e.date.starts_with(month))
}

pub fn monthly_summary(entries: &[ProductionEntry], category: Category, month: &str) -> MonthlySummary {
    let mut by_process: Vec<ProcessTotals> = ProcessType::ALL
        .into_iter()
        .map(|process| ProcessTotals {
            process,
            plan: 0.0,
            actual: 0.0,
        })
        .collect();
    let (mut plan, mut actual) = (0.0, 0.0);

    for entry in in_month(entries, category, month) {
        plan += entry.plan_quantity;
        actual += entry.actual_quantity;
        if let Some(totals) = by_process.iter_mut().find(|t| t.process == entry.process) {
            totals.plan += entry.plan_quantity;
            totals.actual += entry.actual_quantity;
        }
    }

    MonthlySummary {
        month: month.to_string(),
        category,
        plan,
        actual,
        efficiency: one_decimal(efficiency(plan, actual)),
        by_process,
    }
}

//=========================================================================================
// Daily groups
//=========================================================================================

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct DailyGroup {
    pub date: String,
    pub total_actual: f64,
    pub entries: Vec<ProductionEntry>,
    pub is_off_day: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub off_day_name: Option<String>,
}

fn day_key(date: &str) -> &str {
    let date = date.trim();
    date.get(..10).unwrap_or(date)
}

/// Groups a department's entries for one month by date, newest first. Off-days
/// in the month get a group even when nothing was recorded on them.
pub fn daily_groups(
    entries: &[ProductionEntry],
    off_days: &[OffDay],
    category: Category,
    month: &str,
) -> Vec<DailyGroup> {
    let mut by_date: BTreeMap<&str, Vec<ProductionEntry>> = BTreeMap::new();
    for entry in in_month(entries, category, month) {
        by_date.entry(day_key(&entry.date)).or_default().push(entry.clone());
    }
    let off_days: Vec<&OffDay> = off_days
        .iter()
        .filter(|d| d.date.trim().starts_with(month))
        .collect();
    for day in off_days.iter().copied() {
        by_date.entry(day_key(&day.date)).or_default();
    }

    by_date
        .into_iter()
        .rev()
        .map(|(date, entries)| {
            let off_day = off_days.iter().find(|d| day_key(&d.date) == date);
            DailyGroup {
                date: date.to_string(),
                total_actual: entries.iter().map(|e| e.actual_quantity).sum(),
                entries,
                is_off_day: off_day.is_some(),
                off_day_name: off_day.map(|d| d.description.clone()),
            }
        })
        .collect()
}

//=========================================================================================
// Process metrics
//=========================================================================================

/// Optional narrowing of the entries considered. Dates are inclusive `YYYY-MM-DD`.
#[derive(Debug, Clone, Default, Deserialize, IntoParams, ToSchema)]
#[into_params(parameter_in = Query)]
pub struct AnalyticsFilter {
    pub category: Option<Category>,
    pub process: Option<ProcessType>,
    pub start: Option<String>,
    pub end: Option<String>,
}

impl AnalyticsFilter {
    pub fn matches(&self, entry: &ProductionEntry) -> bool {
        self.category.map_or(true, |c| entry.category == c)
            && self.process.map_or(true, |p| entry.process == p)
            && self.start.as_deref().map_or(true, |s| entry.date.as_str() >= s)
            && self.end.as_deref().map_or(true, |e| entry.date.as_str() <= e)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ProcessMetric {
    pub process: ProcessType,
    pub plan: f64,
    pub actual: f64,
    pub count: usize,
    pub efficiency: f64,
}

/// Per-process totals for every process, best first. Ties keep process order.
pub fn process_metrics(entries: &[ProductionEntry], filter: &AnalyticsFilter) -> Vec<ProcessMetric> {
    let mut metrics: Vec<ProcessMetric> = ProcessType::ALL
        .into_iter()
        .map(|process| {
            let matching: Vec<&ProductionEntry> = entries
                .iter()
                .filter(|e| e.process == process && filter.matches(e))
                .collect();
            let plan: f64 = matching.iter().map(|e| e.plan_quantity).sum();
            let actual: f64 = matching.iter().map(|e| e.actual_quantity).sum();
            ProcessMetric {
                process,
                plan,
                actual,
                count: matching.len(),
                efficiency: one_decimal(efficiency(plan, actual)),
            }
        })
        .collect();
    metrics.sort_by(|a, b| b.efficiency.total_cmp(&a.efficiency));
    metrics
}

//=========================================================================================
// Trends
//=========================================================================================

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct MonthlyTrend {
    /// `YYYY-MM`
    pub month: String,
    pub plan: f64,
    pub actual: f64,
    pub count: usize,
    pub efficiency: f64,
}

/// Plan and actual totals per month, oldest first.
pub fn monthly_trend(entries: &[ProductionEntry], filter: &AnalyticsFilter) -> Vec<MonthlyTrend> {
    let mut by_month: BTreeMap<&str, (f64, f64, usize)> = BTreeMap::new();
    for entry in entries.iter().filter(|e| filter.matches(e)) {
        let Some(month) = entry.date.get(..7) else {
            continue;
        };
        let totals = by_month.entry(month).or_default();
        totals.0 += entry.plan_quantity;
        totals.1 += entry.actual_quantity;
        totals.2 += 1;
    }
    by_month
        .into_iter()
        .map(|(month, (plan, actual, count))| MonthlyTrend {
            month: month.to_string(),
            plan,
            actual,
            count,
            efficiency: one_decimal(efficiency(plan, actual)),
        })
        .collect()
}

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct DailyTrend {
    pub date: String,
    /// Mean of the per-entry efficiencies on that day.
    pub efficiency: f64,
    pub actual: f64,
    pub count: usize,
}

/// Average entry efficiency per day, oldest first.
pub fn daily_trend(entries: &[ProductionEntry], filter: &AnalyticsFilter) -> Vec<DailyTrend> {
    let mut by_date: BTreeMap<&str, (f64, f64, usize)> = BTreeMap::new();
    for entry in entries.iter().filter(|e| filter.matches(e)) {
        let totals = by_date.entry(entry.date.as_str()).or_default();
        totals.0 += efficiency(entry.plan_quantity, entry.actual_quantity);
        totals.1 += entry.actual_quantity;
        totals.2 += 1;
    }
    by_date
        .into_iter()
        .map(|(date, (efficiency_sum, actual, count))| DailyTrend {
            date: date.to_string(),
            efficiency: one_decimal(efficiency_sum / count as f64),
            actual,
            count,
        })
        .collect()
}

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ProductTotals {
    pub product_name: String,
    pub plan: f64,
    pub actual: f64,
}

pub const TOP_PRODUCTS: usize = 10;

/// The products with the largest planned quantity.
pub fn top_products(entries: &[ProductionEntry], filter: &AnalyticsFilter) -> Vec<ProductTotals> {
    let mut by_name: BTreeMap<&str, (f64, f64)> = BTreeMap::new();
    for entry in entries.iter().filter(|e| filter.matches(e)) {
        let totals = by_name.entry(entry.product_name.as_str()).or_default();
        totals.0 += entry.plan_quantity;
        totals.1 += entry.actual_quantity;
    }
    let mut products: Vec<ProductTotals> = by_name
        .into_iter()
        .map(|(name, (plan, actual))| ProductTotals {
            product_name: name.to_string(),
            plan,
            actual,
        })
        .collect();
    products.sort_by(|a, b| b.plan.total_cmp(&a.plan));
    products.truncate(TOP_PRODUCTS);
    products
}

pub fn dashboard_stats(entries: &[ProductionEntry]) -> DashboardStats {
    let total_plan: f64 = entries.iter().map(|e| e.plan_quantity).sum();
    let total_actual: f64 = entries.iter().map(|e| e.actual_quantity).sum();
    DashboardStats {
        total_plan,
        total_actual,
        avg_efficiency: efficiency(total_plan, total_actual),
        total_manpower: entries.iter().map(|e| e.manpower).sum(),
    }
}
