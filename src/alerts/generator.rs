use crate::alerts::thresholds::{Alert, AlertThresholds, AlertType};
use crate::models::OrderLine;
use tracing::debug;

/// Rule-based alerts over raw order lines. No statistics involved.
pub struct AlertGenerator {
    pub thresholds: AlertThresholds,
}

impl AlertGenerator {
    pub fn new(thresholds: AlertThresholds) -> Self {
        Self { thresholds }
    }

    /// Run every enabled rule and concatenate the results.
    pub fn generate(&self, orders: &[OrderLine]) -> Vec<Alert> {
        let mut alerts = Vec::new();

        if self.thresholds.is_enabled(AlertType::LongPreparationTime) {
            alerts.extend(self.long_preparation_alerts(orders));
        }

        if self.thresholds.is_enabled(AlertType::FailedOrder) {
            alerts.extend(self.failed_order_alerts(orders));
        }

        if self.thresholds.is_enabled(AlertType::HighValueOrder) {
            alerts.extend(self.high_value_alerts(orders));
        }

        debug!(alerts = alerts.len(), "alert rules evaluated");
        alerts
    }

    pub fn long_preparation_alerts(&self, orders: &[OrderLine]) -> Vec<Alert> {
        let limit = self.thresholds.long_preparation_minutes;

        orders
            .iter()
            .filter_map(|order| {
                let minutes = order.preparation_minutes()?;
                (minutes > limit).then(|| {
                    Alert::new(
                        AlertType::LongPreparationTime,
                        &order.order_id,
                        format!(
                            "Order {} took {} minutes to prepare",
                            order.order_id, minutes
                        ),
                    )
                    .with_outlet(&order.outlet_id)
                    .at(order.prep_started)
                })
            })
            .collect()
    }

    pub fn failed_order_alerts(&self, orders: &[OrderLine]) -> Vec<Alert> {
        orders
            .iter()
            .filter(|order| {
                self.thresholds
                    .failure_statuses
                    .iter()
                    .any(|status| order.has_status(status))
            })
            .map(|order| {
                Alert::new(
                    AlertType::FailedOrder,
                    &order.order_id,
                    format!(
                        "Order {} has status: {}",
                        order.order_id,
                        order.status.as_deref().unwrap_or_default()
                    ),
                )
                .with_outlet(&order.outlet_id)
                .at(order.order_placed)
            })
            .collect()
    }

    /// Lines priced strictly above `high_value_ratio` of the largest price.
    pub fn high_value_alerts(&self, orders: &[OrderLine]) -> Vec<Alert> {
        let Some(threshold) = self.high_value_threshold(orders) else {
            return Vec::new();
        };

        orders
            .iter()
            .filter_map(|order| {
                let price = order.price()?;
                (price > threshold).then(|| {
                    Alert::new(
                        AlertType::HighValueOrder,
                        &order.order_id,
                        format!("High value order: {:.2} LKR", price),
                    )
                    .with_customer(&order.customer_id)
                    .at(order.order_placed)
                })
            })
            .collect()
    }

    /// `None` when no line carries a finite price.
    pub fn high_value_threshold(&self, orders: &[OrderLine]) -> Option<f64> {
        orders
            .iter()
            .filter_map(OrderLine::price)
            .reduce(f64::max)
            .map(|max_price| max_price * self.thresholds.high_value_ratio)
    }
}

impl Default for AlertGenerator {
    fn default() -> Self {
        Self::new(AlertThresholds::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveDate, NaiveDateTime};

    fn noon() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 7, 4)
            .unwrap()
            .and_hms_opt(12, 0, 0)
            .unwrap()
    }

    fn order(order_id: &str) -> OrderLine {
        OrderLine {
            order_id: order_id.to_string(),
            outlet_id: "OUT1".to_string(),
            customer_id: "C1".to_string(),
            order_placed: Some(noon()),
            ..Default::default()
        }
    }

    fn with_prep(order_id: &str, minutes: i64) -> OrderLine {
        OrderLine {
            prep_started: Some(noon()),
            prep_finished: Some(noon() + chrono::Duration::minutes(minutes)),
            ..order(order_id)
        }
    }

    fn priced(order_id: &str, price: f64) -> OrderLine {
        OrderLine {
            total_price_lkr: Some(price),
            ..order(order_id)
        }
    }

    #[test]
    fn test_long_preparation_alert() {
        let generator = AlertGenerator::default();
        let alerts = generator.long_preparation_alerts(&[with_prep("O1", 75), with_prep("O2", 30)]);

        assert_eq!(alerts.len(), 1);
        let alert = &alerts[0];
        assert_eq!(alert.alert_id, "PREP_TIME_O1");
        assert_eq!(alert.alert_type, AlertType::LongPreparationTime);
        assert_eq!(alert.outlet_id.as_deref(), Some("OUT1"));
        assert_eq!(alert.timestamp, Some(noon()));
        assert!(alert.message.contains("75"));
    }

    #[test]
    fn test_exactly_sixty_minutes_is_not_long() {
        let generator = AlertGenerator::default();
        assert!(generator.long_preparation_alerts(&[with_prep("O1", 60)]).is_empty());
    }

    #[test]
    fn test_failed_and_cancelled_any_case() {
        let generator = AlertGenerator::default();
        let orders = vec![
            OrderLine {
                status: Some("failed".to_string()),
                ..order("O1")
            },
            OrderLine {
                status: Some("CANCELLED".to_string()),
                ..order("O2")
            },
            OrderLine {
                status: Some("Completed".to_string()),
                ..order("O3")
            },
            order("O4"),
        ];

        let alerts = generator.failed_order_alerts(&orders);
        let ids: Vec<&str> = alerts.iter().map(|a| a.alert_id.as_str()).collect();
        assert_eq!(ids, vec!["FAILED_ORDER_O1", "FAILED_ORDER_O2"]);
        assert!(alerts[0].message.contains("failed"));
    }

    #[test]
    fn test_only_top_priced_orders_alert() {
        let generator = AlertGenerator::default();
        let orders = vec![priced("O1", 1000.0), priced("O2", 5000.0), priced("O3", 10000.0)];

        let alerts = generator.high_value_alerts(&orders);
        assert_eq!(alerts.len(), 1);
        assert_eq!(alerts[0].alert_id, "HIGH_VALUE_O3");
        assert_eq!(alerts[0].customer_id.as_deref(), Some("C1"));
        assert!(alerts[0].outlet_id.is_none());
        assert!(alerts[0].message.contains("10000.00"));
    }

    #[test]
    fn test_high_value_threshold_is_strict() {
        let generator = AlertGenerator::default();
        // 900 sits exactly on 90% of 1000
        let orders = vec![priced("O1", 900.0), priced("O2", 1000.0)];
        assert_eq!(generator.high_value_threshold(&orders), Some(900.0));

        let alerts = generator.high_value_alerts(&orders);
        assert_eq!(alerts.len(), 1);
        assert_eq!(alerts[0].order_id, "O2");
    }

    #[test]
    fn test_non_finite_price_does_not_raise_threshold() {
        let generator = AlertGenerator::default();
        let orders = vec![
            priced("O1", 1000.0),
            priced("O2", 10000.0),
            priced("O3", f64::INFINITY),
            priced("O4", f64::NAN),
        ];
        assert_eq!(generator.high_value_threshold(&orders), Some(9000.0));

        let alerts = generator.high_value_alerts(&orders);
        let ids: Vec<&str> = alerts.iter().map(|a| a.order_id.as_str()).collect();
        assert_eq!(ids, vec!["O2"]);
    }

    #[test]
    fn test_no_prices_means_no_high_value_alerts() {
        let generator = AlertGenerator::default();
        let orders = vec![order("O1"), order("O2")];
        assert_eq!(generator.high_value_threshold(&orders), None);
        assert!(generator.high_value_alerts(&orders).is_empty());
    }

    #[test]
    fn test_disabled_rules_are_skipped() {
        let thresholds = AlertThresholds {
            enabled_alerts: vec!["failed_order".to_string()],
            ..Default::default()
        };
        let generator = AlertGenerator::new(thresholds);
        let orders = vec![
            with_prep("O1", 90),
            priced("O2", 500.0),
            OrderLine {
                status: Some("Failed".to_string()),
                ..order("O3")
            },
        ];

        let alerts = generator.generate(&orders);
        assert_eq!(alerts.len(), 1);
        assert_eq!(alerts[0].alert_type, AlertType::FailedOrder);
    }

    #[test]
    fn test_generate_runs_every_rule() {
        let generator = AlertGenerator::default();
        let orders = vec![
            OrderLine {
                status: Some("Cancelled".to_string()),
                total_price_lkr: Some(2000.0),
                ..with_prep("O1", 61)
            },
            priced("O2", 100.0),
        ];

        let alerts = generator.generate(&orders);
        let types: Vec<AlertType> = alerts.iter().map(|a| a.alert_type).collect();
        assert_eq!(
            types,
            vec![
                AlertType::LongPreparationTime,
                AlertType::FailedOrder,
                AlertType::HighValueOrder
            ]
        );
    }
}
