use crate::analysis::reports::{
    BranchPerformance, BusinessReport, CustomerSegmentation, MenuSummary, PeakHours,
    RevenueSummary,
};
use crate::output::table::{OutputFormat, apply_table_style_with_color};
use serde::Serialize;
use tabled::{Table, Tabled};

/// Customers listed in the segmentation table.
const CUSTOMER_ROW_LIMIT: usize = 20;

#[derive(Tabled, Serialize, Debug)]
pub struct MetricRow {
    #[tabled(rename = "Metric")]
    pub metric: String,
    #[tabled(rename = "Value")]
    pub value: String,
}

#[derive(Tabled, Serialize, Debug)]
pub struct BranchRow {
    #[tabled(rename = "#")]
    pub rank: usize,
    #[tabled(rename = "Outlet")]
    pub outlet: String,
    #[tabled(rename = "Revenue")]
    pub revenue: String,
    #[tabled(rename = "Orders")]
    pub orders: usize,
    #[tabled(rename = "Avg Order")]
    pub average_order_value: String,
    #[tabled(rename = "Customers")]
    pub customers: usize,
    #[tabled(rename = "Avg Prep (min)")]
    pub average_preparation: String,
    #[tabled(rename = "Completed")]
    pub completion_rate: String,
}

#[derive(Tabled, Serialize, Debug)]
pub struct PeakHourRow {
    #[tabled(rename = "Scope")]
    pub scope: String,
    #[tabled(rename = "Hour")]
    pub hour: String,
    #[tabled(rename = "Lines")]
    pub order_count: u64,
}

#[derive(Tabled, Serialize, Debug)]
pub struct MenuItemRow {
    #[tabled(rename = "Item")]
    pub item: String,
    #[tabled(rename = "Category")]
    pub category: String,
    #[tabled(rename = "Lines")]
    pub line_count: u64,
    #[tabled(rename = "Revenue")]
    pub revenue: String,
}

#[derive(Tabled, Serialize, Debug)]
pub struct CustomerRow {
    #[tabled(rename = "Customer")]
    pub customer_id: String,
    #[tabled(rename = "Lines")]
    pub frequency: usize,
    #[tabled(rename = "Spent")]
    pub monetary: String,
    #[tabled(rename = "Days Since Last")]
    pub recency: String,
    #[tabled(rename = "Segment")]
    pub segment: String,
}

fn money(value: f64, places: usize) -> String {
    format!("{:.*}", places, value)
}

fn revenue_section(summary: &RevenueSummary, places: usize, colored: bool) -> String {
    let mut rows = vec![
        MetricRow {
            metric: "Orders".to_string(),
            value: summary.total_orders.to_string(),
        },
        MetricRow {
            metric: "Order lines".to_string(),
            value: summary.total_lines.to_string(),
        },
        MetricRow {
            metric: "Revenue (LKR)".to_string(),
            value: money(summary.reconciled_revenue, places),
        },
        MetricRow {
            metric: "Average order value".to_string(),
            value: money(summary.average_order_value, places),
        },
        MetricRow {
            metric: "Growth, first to last month".to_string(),
            value: summary
                .revenue_growth_rate
                .map(|rate| format!("{rate:.1}%"))
                .unwrap_or_else(|| "-".to_string()),
        },
    ];
    rows.extend(summary.monthly_revenue.iter().map(|(month, revenue)| MetricRow {
        metric: format!("Revenue {month}"),
        value: money(*revenue, places),
    }));
    rows.extend(
        summary
            .revenue_by_payment_method
            .iter()
            .map(|(method, revenue)| MetricRow {
                metric: format!("Paid by {method}"),
                value: money(*revenue, places),
            }),
    );

    format!(
        "Revenue summary\n{}",
        apply_table_style_with_color(Table::new(rows), colored)
    )
}

fn branch_section(branches: &[BranchPerformance], places: usize, colored: bool) -> String {
    if branches.is_empty() {
        return "Branch ranking: no outlets found.".to_string();
    }

    let rows: Vec<BranchRow> = branches
        .iter()
        .enumerate()
        .map(|(index, branch)| BranchRow {
            rank: index + 1,
            outlet: match &branch.outlet_name {
                Some(name) => format!("{} ({})", branch.outlet_id, name),
                None => branch.outlet_id.clone(),
            },
            revenue: money(branch.revenue, places),
            orders: branch.order_count,
            average_order_value: money(branch.average_order_value, places),
            customers: branch.customer_count,
            average_preparation: branch
                .average_preparation_minutes
                .map(|minutes| format!("{minutes:.1}"))
                .unwrap_or_else(|| "-".to_string()),
            completion_rate: format!("{:.1}%", branch.completion_rate),
        })
        .collect();

    format!(
        "Branch ranking\n{}",
        apply_table_style_with_color(Table::new(rows), colored)
    )
}

fn peak_hour_section(peaks: &PeakHours, colored: bool) -> String {
    let hour_row = |scope: &str, hour: u32, order_count: u64| PeakHourRow {
        scope: scope.to_string(),
        hour: format!("{hour:02}:00 - {hour:02}:59"),
        order_count,
    };

    let mut rows: Vec<PeakHourRow> = peaks
        .overall
        .iter()
        .map(|h| hour_row("All outlets", h.hour, h.order_count))
        .collect();
    for (outlet_id, hours) in &peaks.by_outlet {
        rows.extend(hours.iter().map(|h| hour_row(outlet_id, h.hour, h.order_count)));
    }

    if rows.is_empty() {
        return "Peak hours: no timestamped orders found.".to_string();
    }
    format!(
        "Peak hours\n{}",
        apply_table_style_with_color(Table::new(rows), colored)
    )
}

fn menu_section(menu: &MenuSummary, places: usize, colored: bool) -> String {
    if menu.popular_items.is_empty() {
        return "Menu: no menu items found.".to_string();
    }

    let rows: Vec<MenuItemRow> = menu
        .popular_items
        .iter()
        .map(|item| MenuItemRow {
            item: item.item_name.clone(),
            category: item.category.clone().unwrap_or_else(|| "-".to_string()),
            line_count: item.line_count,
            revenue: money(item.revenue, places),
        })
        .collect();

    format!(
        "Popular menu items\n{}",
        apply_table_style_with_color(Table::new(rows), colored)
    )
}

fn customer_section(segmentation: &CustomerSegmentation, places: usize, colored: bool) -> String {
    if segmentation.customers.is_empty() {
        return "Customers: none found.".to_string();
    }

    let rows: Vec<CustomerRow> = segmentation
        .customers
        .iter()
        .take(CUSTOMER_ROW_LIMIT)
        .map(|customer| CustomerRow {
            customer_id: customer.customer_id.clone(),
            frequency: customer.frequency,
            monetary: money(customer.monetary, places),
            recency: customer
                .recency_days
                .map(|days| days.to_string())
                .unwrap_or_else(|| "-".to_string()),
            segment: customer.segment.as_str().to_string(),
        })
        .collect();

    let distribution: Vec<String> = segmentation
        .segment_distribution
        .iter()
        .map(|(segment, count)| format!("{}: {}", segment.as_str(), count))
        .collect();

    format!(
        "Top customers by spend\n{}\nSegments: {}",
        apply_table_style_with_color(Table::new(rows), colored),
        distribution.join(", ")
    )
}

impl OutputFormat for BusinessReport {
    fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    fn to_table_with_color(&self, decimal_places: u8, colored: bool) -> String {
        let places = decimal_places as usize;
        let mut sections = Vec::new();

        if let Some(revenue) = &self.revenue {
            sections.push(revenue_section(revenue, places, colored));
        }
        if let Some(branches) = &self.branches {
            sections.push(branch_section(branches, places, colored));
        }
        if let Some(peaks) = &self.peak_hours {
            sections.push(peak_hour_section(peaks, colored));
        }
        if let Some(menu) = &self.menu {
            sections.push(menu_section(menu, places, colored));
        }
        if let Some(customers) = &self.customers {
            sections.push(customer_section(customers, places, colored));
        }

        if sections.is_empty() {
            return "No report sections selected.".to_string();
        }
        sections.join("\n\n")
    }
}
