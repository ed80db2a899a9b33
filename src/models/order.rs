use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

/// One point-of-sale row: a single item line of an order.
///
/// `total_price_lkr` is the order-level total and is repeated on every line
/// of the same order, so sums over raw lines count an order once per item.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct OrderLine {
    pub order_id: String,
    pub customer_id: String,
    pub outlet_id: String,
    pub order_placed: Option<NaiveDateTime>,
    pub order_confirmed: Option<NaiveDateTime>,
    pub prep_started: Option<NaiveDateTime>,
    pub prep_finished: Option<NaiveDateTime>,
    pub served_time: Option<NaiveDateTime>,
    pub status: Option<String>,
    pub num_items: Option<i32>,
    pub total_price_lkr: Option<f64>,
    pub payment_method: Option<String>,

    // Item details
    pub item_id: Option<String>,
    pub quantity: Option<i32>,
    pub item_price_lkr: Option<f64>,

    // Customer details
    pub customer_name: Option<String>,
    pub contact_no: Option<String>,
    pub gender: Option<String>,
    pub age: Option<i32>,
    pub join_date: Option<NaiveDateTime>,
    pub loyalty_group: Option<String>,
    pub estimated_total_spent_lkr: Option<f64>,

    // Outlet details
    pub outlet_name: Option<String>,
    pub borough: Option<String>,
    pub capacity: Option<i32>,
    pub opened: Option<NaiveDateTime>,

    // Menu item details
    pub menu_item_name: Option<String>,
    pub category: Option<String>,
    pub is_vegetarian: Option<bool>,
    pub spice_level: Option<String>,
}

impl OrderLine {
    /// Minutes between prep start and finish, truncated toward zero.
    /// `None` unless both timestamps are present.
    pub fn preparation_minutes(&self) -> Option<i64> {
        match (self.prep_started, self.prep_finished) {
            (Some(started), Some(finished)) => Some((finished - started).num_minutes()),
            _ => None,
        }
    }

    /// The order total, ignoring non-finite values.
    pub fn price(&self) -> Option<f64> {
        self.total_price_lkr.filter(|price| price.is_finite())
    }

    /// Case-insensitive status comparison; a missing status never matches.
    pub fn has_status(&self, status: &str) -> bool {
        self.status
            .as_deref()
            .is_some_and(|s| s.eq_ignore_ascii_case(status))
    }
}
