use crate::models::OrderLine;
use anyhow::{Context, Result};
use chrono::NaiveDate;

/// Restricts the record set before analysis.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct OrderFilter {
    pub outlet_id: Option<String>,
    pub since: Option<NaiveDate>,
    pub until: Option<NaiveDate>,
}

impl OrderFilter {
    /// Build a filter from raw CLI values; dates are `YYYY-MM-DD`.
    pub fn from_args(
        outlet_id: Option<String>,
        since: Option<&str>,
        until: Option<&str>,
    ) -> Result<Self> {
        Ok(Self {
            outlet_id,
            since: since.map(parse_date).transpose()?,
            until: until.map(parse_date).transpose()?,
        })
    }

    pub fn is_empty(&self) -> bool {
        self.outlet_id.is_none() && self.since.is_none() && self.until.is_none()
    }

    /// Date bounds are inclusive. Without any date bound, lines lacking
    /// `order_placed` are kept.
    pub fn matches(&self, order: &OrderLine) -> bool {
        if let Some(ref outlet_id) = self.outlet_id {
            if &order.outlet_id != outlet_id {
                return false;
            }
        }

        if self.since.is_none() && self.until.is_none() {
            return true;
        }

        let Some(placed) = order.order_placed.map(|p| p.date()) else {
            return false;
        };

        if let Some(since) = self.since {
            if placed < since {
                return false;
            }
        }

        if let Some(until) = self.until {
            if placed > until {
                return false;
            }
        }

        true
    }

    pub fn apply(&self, orders: Vec<OrderLine>) -> Vec<OrderLine> {
        if self.is_empty() {
            return orders;
        }
        orders.into_iter().filter(|order| self.matches(order)).collect()
    }

    /// One-line description for verbose logging.
    pub fn describe(&self) -> String {
        let mut parts = Vec::new();
        if let Some(ref outlet_id) = self.outlet_id {
            parts.push(format!("outlet={outlet_id}"));
        }
        if let Some(since) = self.since {
            parts.push(format!("since={}", since.format("%Y-%m-%d")));
        }
        if let Some(until) = self.until {
            parts.push(format!("until={}", until.format("%Y-%m-%d")));
        }
        if parts.is_empty() {
            "none".to_string()
        } else {
            parts.join(", ")
        }
    }
}

fn parse_date(raw: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .with_context(|| format!("Invalid date '{}', expected YYYY-MM-DD", raw))
}

/// Drop lines missing identifiers, placement time or a positive price, and
/// tidy the free-text fields of the rest.
pub fn clean_and_validate(orders: Vec<OrderLine>) -> Vec<OrderLine> {
    orders
        .into_iter()
        .filter(is_valid_order)
        .map(clean_order)
        .collect()
}

fn is_valid_order(order: &OrderLine) -> bool {
    !order.order_id.is_empty()
        && !order.customer_id.is_empty()
        && !order.outlet_id.is_empty()
        && order.order_placed.is_some()
        && order.price().is_some_and(|price| price > 0.0)
}

fn clean_order(mut order: OrderLine) -> OrderLine {
    order.customer_name = order.customer_name.map(|s| s.trim().to_string());
    order.outlet_name = order.outlet_name.map(|s| s.trim().to_string());
    order.category = order.category.map(|s| s.trim().to_string());
    order.loyalty_group = order.loyalty_group.map(|s| s.trim().to_string());
    order.gender = order.gender.as_deref().map(normalize_gender);
    order
}

pub fn normalize_gender(gender: &str) -> String {
    match gender.trim().to_lowercase().as_str() {
        "m" | "male" => "Male",
        "f" | "female" => "Female",
        _ => "Other",
    }
    .to_string()
}
