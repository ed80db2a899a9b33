use crate::models::OrderLine;
use chrono::{Datelike, Timelike};
use serde::Serialize;
use std::cmp::Ordering;
use std::collections::{BTreeMap, BTreeSet};
use tracing::debug;

/// Hours listed in the overall peak table.
pub const OVERALL_PEAK_HOURS: usize = 5;
/// Hours listed per outlet.
pub const OUTLET_PEAK_HOURS: usize = 3;
/// Menu items listed in the popularity table.
pub const POPULAR_ITEM_LIMIT: usize = 20;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, clap::ValueEnum)]
pub enum ReportSection {
    Revenue,
    Branches,
    PeakHours,
    Menu,
    Customers,
}

impl ReportSection {
    pub const ALL: [ReportSection; 5] = [
        ReportSection::Revenue,
        ReportSection::Branches,
        ReportSection::PeakHours,
        ReportSection::Menu,
        ReportSection::Customers,
    ];
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RevenueSummary {
    pub total_orders: usize,
    pub total_lines: usize,
    /// Each order's total counted once.
    pub reconciled_revenue: f64,
    pub average_order_value: f64,
    pub monthly_revenue: BTreeMap<String, f64>,
    /// Percent change from the first to the last month.
    pub revenue_growth_rate: Option<f64>,
    pub revenue_by_payment_method: BTreeMap<String, f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BranchPerformance {
    pub outlet_id: String,
    pub outlet_name: Option<String>,
    pub borough: Option<String>,
    pub revenue: f64,
    pub order_count: usize,
    pub average_order_value: f64,
    pub customer_count: usize,
    pub average_preparation_minutes: Option<f64>,
    /// Percentage of distinct orders with status `Completed`.
    pub completion_rate: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HourCount {
    pub hour: u32,
    pub order_count: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PeakHours {
    pub overall: Vec<HourCount>,
    pub by_outlet: BTreeMap<String, Vec<HourCount>>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MenuItemStats {
    pub item_name: String,
    pub category: Option<String>,
    pub line_count: u64,
    pub revenue: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MenuSummary {
    pub popular_items: Vec<MenuItemStats>,
    pub revenue_by_category: BTreeMap<String, f64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum CustomerSegment {
    Vip,
    Loyal,
    Regular,
    Occasional,
}

impl CustomerSegment {
    /// Frequency is counted in order lines, spend in LKR.
    pub fn classify(frequency: usize, total_spent: f64) -> Self {
        if frequency >= 10 && total_spent >= 10_000.0 {
            CustomerSegment::Vip
        } else if frequency >= 5 && total_spent >= 5_000.0 {
            CustomerSegment::Loyal
        } else if frequency >= 3 {
            CustomerSegment::Regular
        } else {
            CustomerSegment::Occasional
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            CustomerSegment::Vip => "VIP",
            CustomerSegment::Loyal => "LOYAL",
            CustomerSegment::Regular => "REGULAR",
            CustomerSegment::Occasional => "OCCASIONAL",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CustomerProfile {
    pub customer_id: String,
    pub frequency: usize,
    pub monetary: f64,
    /// Days between the customer's last order and the newest order in the data.
    pub recency_days: Option<i64>,
    pub segment: CustomerSegment,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CustomerSegmentation {
    pub customers: Vec<CustomerProfile>,
    pub segment_distribution: BTreeMap<CustomerSegment, usize>,
}

/// Sections that were not requested are left out of the JSON payload.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BusinessReport {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub revenue: Option<RevenueSummary>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub branches: Option<Vec<BranchPerformance>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub peak_hours: Option<PeakHours>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub menu: Option<MenuSummary>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub customers: Option<CustomerSegmentation>,
}

pub struct ReportAnalyzer;

impl ReportAnalyzer {
    pub fn new() -> Self {
        Self
    }

    /// Build the requested sections; an empty list means all of them.
    pub fn build(&self, orders: &[OrderLine], sections: &[ReportSection]) -> BusinessReport {
        let wanted: BTreeSet<ReportSection> = if sections.is_empty() {
            ReportSection::ALL.into_iter().collect()
        } else {
            sections.iter().copied().collect()
        };

        let mut report = BusinessReport::default();
        for section in wanted {
            match section {
                ReportSection::Revenue => report.revenue = Some(self.revenue_summary(orders)),
                ReportSection::Branches => report.branches = Some(self.branch_rankings(orders)),
                ReportSection::PeakHours => report.peak_hours = Some(self.peak_hours(orders)),
                ReportSection::Menu => report.menu = Some(self.menu_summary(orders)),
                ReportSection::Customers => {
                    report.customers = Some(self.customer_segmentation(orders))
                }
            }
        }

        debug!(records = orders.len(), "business report built");
        report
    }

    pub fn revenue_summary(&self, orders: &[OrderLine]) -> RevenueSummary {
        let distinct: BTreeSet<&str> = orders.iter().map(|o| o.order_id.as_str()).collect();
        let priced = first_priced_lines(orders);
        let reconciled_revenue: f64 = priced.values().map(|(_, price)| price).sum();

        let mut monthly_revenue: BTreeMap<String, f64> = BTreeMap::new();
        let mut revenue_by_payment_method: BTreeMap<String, f64> = BTreeMap::new();
        for (order, price) in priced.values() {
            if let Some(placed) = order.order_placed {
                *monthly_revenue
                    .entry(format!("{:04}-{:02}", placed.year(), placed.month()))
                    .or_insert(0.0) += price;
            }
            if let Some(method) = &order.payment_method {
                *revenue_by_payment_method.entry(method.clone()).or_insert(0.0) += price;
            }
        }

        let revenue_growth_rate = match (
            monthly_revenue.values().next(),
            monthly_revenue.values().next_back(),
        ) {
            (Some(&first), Some(&last)) if monthly_revenue.len() >= 2 && first > 0.0 => {
                Some((last - first) / first * 100.0)
            }
            _ => None,
        };

        RevenueSummary {
            total_orders: distinct.len(),
            total_lines: orders.len(),
            reconciled_revenue,
            average_order_value: average(reconciled_revenue, priced.len()),
            monthly_revenue,
            revenue_growth_rate,
            revenue_by_payment_method,
        }
    }

    /// Outlets ordered by reconciled revenue, highest first.
    pub fn branch_rankings(&self, orders: &[OrderLine]) -> Vec<BranchPerformance> {
        let mut rankings: Vec<BranchPerformance> = group_by_outlet(orders)
            .into_iter()
            .map(|(outlet_id, lines)| branch_performance(outlet_id, &lines))
            .collect();

        rankings.sort_by(|a, b| {
            b.revenue
                .partial_cmp(&a.revenue)
                .unwrap_or(Ordering::Equal)
                .then_with(|| a.outlet_id.cmp(&b.outlet_id))
        });
        rankings
    }

    /// Busiest hours of day by order-line count.
    pub fn peak_hours(&self, orders: &[OrderLine]) -> PeakHours {
        let by_outlet = group_by_outlet(orders)
            .into_iter()
            .map(|(outlet_id, lines)| (outlet_id.to_string(), top_hours(lines, OUTLET_PEAK_HOURS)))
            .collect();

        PeakHours {
            overall: top_hours(orders, OVERALL_PEAK_HOURS),
            by_outlet,
        }
    }

    pub fn menu_summary(&self, orders: &[OrderLine]) -> MenuSummary {
        let mut items: BTreeMap<&str, MenuItemStats> = BTreeMap::new();
        let mut revenue_by_category: BTreeMap<String, f64> = BTreeMap::new();

        for order in orders {
            let item_price = order.item_price_lkr.filter(|price| price.is_finite());

            if let Some(name) = order.menu_item_name.as_deref() {
                let stats = items.entry(name).or_insert_with(|| MenuItemStats {
                    item_name: name.to_string(),
                    category: order.category.clone(),
                    line_count: 0,
                    revenue: 0.0,
                });
                stats.line_count += 1;
                stats.revenue += item_price.unwrap_or(0.0);
            }

            if let (Some(category), Some(price)) = (&order.category, item_price) {
                *revenue_by_category.entry(category.clone()).or_insert(0.0) += price;
            }
        }

        let mut popular_items: Vec<MenuItemStats> = items.into_values().collect();
        // stable sort keeps names ascending within equal counts
        popular_items.sort_by(|a, b| b.line_count.cmp(&a.line_count));
        popular_items.truncate(POPULAR_ITEM_LIMIT);

        MenuSummary {
            popular_items,
            revenue_by_category,
        }
    }

    /// Recency, frequency and spend per customer, biggest spenders first.
    pub fn customer_segmentation(&self, orders: &[OrderLine]) -> CustomerSegmentation {
        let newest = orders.iter().filter_map(|o| o.order_placed).max();

        let mut grouped: BTreeMap<&str, Vec<&OrderLine>> = BTreeMap::new();
        for order in orders {
            grouped.entry(order.customer_id.as_str()).or_default().push(order);
        }

        let mut customers: Vec<CustomerProfile> = grouped
            .into_iter()
            .map(|(customer_id, lines)| {
                let monetary: f64 = lines.iter().filter_map(|o| o.price()).sum();
                let last_order = lines.iter().filter_map(|o| o.order_placed).max();
                let recency_days = match (newest, last_order) {
                    (Some(newest), Some(last)) => Some((newest - last).num_days()),
                    _ => None,
                };

                CustomerProfile {
                    customer_id: customer_id.to_string(),
                    frequency: lines.len(),
                    monetary,
                    recency_days,
                    segment: CustomerSegment::classify(lines.len(), monetary),
                }
            })
            .collect();

        customers.sort_by(|a, b| {
            b.monetary
                .partial_cmp(&a.monetary)
                .unwrap_or(Ordering::Equal)
                .then_with(|| a.customer_id.cmp(&b.customer_id))
        });

        let mut segment_distribution = BTreeMap::new();
        for customer in &customers {
            *segment_distribution.entry(customer.segment).or_insert(0) += 1;
        }

        CustomerSegmentation {
            customers,
            segment_distribution,
        }
    }
}

impl Default for ReportAnalyzer {
    fn default() -> Self {
        Self::new()
    }
}

fn average(total: f64, count: usize) -> f64 {
    if count == 0 { 0.0 } else { total / count as f64 }
}

/// First line carrying a finite price for each order id. Order totals repeat
/// on every item line, so this counts each order once.
fn first_priced_lines<'a, I>(orders: I) -> BTreeMap<&'a str, (&'a OrderLine, f64)>
where
    I: IntoIterator<Item = &'a OrderLine>,
{
    let mut priced = BTreeMap::new();
    for order in orders {
        if let Some(price) = order.price() {
            priced.entry(order.order_id.as_str()).or_insert((order, price));
        }
    }
    priced
}

fn group_by_outlet(orders: &[OrderLine]) -> BTreeMap<&str, Vec<&OrderLine>> {
    let mut outlets: BTreeMap<&str, Vec<&OrderLine>> = BTreeMap::new();
    for order in orders {
        outlets.entry(order.outlet_id.as_str()).or_default().push(order);
    }
    outlets
}

fn branch_performance(outlet_id: &str, lines: &[&OrderLine]) -> BranchPerformance {
    let distinct: BTreeSet<&str> = lines.iter().map(|o| o.order_id.as_str()).collect();
    let completed: BTreeSet<&str> = lines
        .iter()
        .filter(|o| o.has_status("Completed"))
        .map(|o| o.order_id.as_str())
        .collect();
    let customers: BTreeSet<&str> = lines.iter().map(|o| o.customer_id.as_str()).collect();

    let priced = first_priced_lines(lines.iter().copied());
    let revenue: f64 = priced.values().map(|(_, price)| price).sum();

    let prep_minutes: Vec<f64> = lines
        .iter()
        .filter_map(|o| o.preparation_minutes())
        .map(|minutes| minutes as f64)
        .collect();
    let average_preparation_minutes = (!prep_minutes.is_empty())
        .then(|| prep_minutes.iter().sum::<f64>() / prep_minutes.len() as f64);

    BranchPerformance {
        outlet_id: outlet_id.to_string(),
        outlet_name: lines.iter().find_map(|o| o.outlet_name.clone()),
        borough: lines.iter().find_map(|o| o.borough.clone()),
        revenue,
        order_count: distinct.len(),
        average_order_value: average(revenue, priced.len()),
        customer_count: customers.len(),
        average_preparation_minutes,
        completion_rate: average(completed.len() as f64 * 100.0, distinct.len()),
    }
}

fn top_hours<'a, I>(orders: I, limit: usize) -> Vec<HourCount>
where
    I: IntoIterator<Item = &'a OrderLine>,
{
    let mut hours: BTreeMap<u32, u64> = BTreeMap::new();
    for placed in orders.into_iter().filter_map(|o| o.order_placed) {
        *hours.entry(placed.hour()).or_insert(0) += 1;
    }

    let mut counts: Vec<HourCount> = hours
        .into_iter()
        .map(|(hour, order_count)| HourCount { hour, order_count })
        .collect();
    counts.sort_by(|a, b| b.order_count.cmp(&a.order_count));
    counts.truncate(limit);
    counts
}
