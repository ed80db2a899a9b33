use crate::alerts::{Alert, AlertGenerator, AlertThresholds};
use crate::analysis::stats::StatisticalSummary;
use crate::config::DetectionConfig;
use crate::models::{OrderLine, Severity};
use chrono::{NaiveDate, NaiveDateTime, Timelike};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::debug;

/// Observations further than this many standard deviations are outliers.
pub const ANOMALY_THRESHOLD: f64 = 2.0;

/// Customers with fewer priced lines than this are not evaluated.
pub const MIN_CUSTOMER_ORDERS: usize = 3;

/// A single statistical outlier, tagged by the dimension it was found in.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Anomaly {
    #[serde(rename = "PREPARATION_TIME", rename_all = "camelCase")]
    PreparationTime {
        order_id: String,
        outlet_id: String,
        preparation_time: i64,
        expected_time: f64,
        z_score: f64,
        severity: Severity,
        timestamp: NaiveDateTime,
    },
    #[serde(rename = "ORDER_VOLUME", rename_all = "camelCase")]
    OrderVolume {
        outlet_id: String,
        hour: u32,
        order_count: u64,
        expected_count: f64,
        z_score: f64,
        severity: Severity,
    },
    #[serde(rename = "REVENUE", rename_all = "camelCase")]
    Revenue {
        outlet_id: String,
        date: String,
        revenue: f64,
        expected_revenue: f64,
        z_score: f64,
        severity: Severity,
    },
    #[serde(rename = "CUSTOMER_SPENDING", rename_all = "camelCase")]
    CustomerSpending {
        customer_id: String,
        order_id: String,
        order_value: f64,
        expected_value: f64,
        z_score: f64,
        severity: Severity,
        timestamp: Option<NaiveDateTime>,
    },
}

impl Anomaly {
    pub fn kind(&self) -> &'static str {
        match self {
            Anomaly::PreparationTime { .. } => "PREPARATION_TIME",
            Anomaly::OrderVolume { .. } => "ORDER_VOLUME",
            Anomaly::Revenue { .. } => "REVENUE",
            Anomaly::CustomerSpending { .. } => "CUSTOMER_SPENDING",
        }
    }

    pub fn severity(&self) -> Severity {
        match self {
            Anomaly::PreparationTime { severity, .. }
            | Anomaly::OrderVolume { severity, .. }
            | Anomaly::Revenue { severity, .. }
            | Anomaly::CustomerSpending { severity, .. } => *severity,
        }
    }

    pub fn z_score(&self) -> f64 {
        match self {
            Anomaly::PreparationTime { z_score, .. }
            | Anomaly::OrderVolume { z_score, .. }
            | Anomaly::Revenue { z_score, .. }
            | Anomaly::CustomerSpending { z_score, .. } => *z_score,
        }
    }

    /// Observed and expected (group mean) values as plain numbers.
    pub fn observed_and_expected(&self) -> (f64, f64) {
        match self {
            Anomaly::PreparationTime {
                preparation_time,
                expected_time,
                ..
            } => (*preparation_time as f64, *expected_time),
            Anomaly::OrderVolume {
                order_count,
                expected_count,
                ..
            } => (*order_count as f64, *expected_count),
            Anomaly::Revenue {
                revenue,
                expected_revenue,
                ..
            } => (*revenue, *expected_revenue),
            Anomaly::CustomerSpending {
                order_value,
                expected_value,
                ..
            } => (*order_value, *expected_value),
        }
    }

    /// Short human label for the thing that was flagged.
    pub fn subject(&self) -> String {
        match self {
            Anomaly::PreparationTime {
                order_id,
                outlet_id,
                ..
            } => format!("order {order_id} @ {outlet_id}"),
            Anomaly::OrderVolume {
                outlet_id, hour, ..
            } => format!("{outlet_id} @ {hour:02}:00"),
            Anomaly::Revenue {
                outlet_id, date, ..
            } => format!("{outlet_id} on {date}"),
            Anomaly::CustomerSpending {
                customer_id,
                order_id,
                ..
            } => format!("customer {customer_id}, order {order_id}"),
        }
    }
}

/// Everything one detection run produces. Serialized as the response payload.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnomalyReport {
    pub preparation_time_anomalies: Vec<Anomaly>,
    pub order_volume_anomalies: Vec<Anomaly>,
    pub revenue_anomalies: Vec<Anomaly>,
    pub customer_behavior_anomalies: Vec<Anomaly>,
    pub alert_logs: Vec<Alert>,
}

impl AnomalyReport {
    pub fn anomalies(&self) -> impl Iterator<Item = &Anomaly> {
        self.preparation_time_anomalies
            .iter()
            .chain(&self.order_volume_anomalies)
            .chain(&self.revenue_anomalies)
            .chain(&self.customer_behavior_anomalies)
    }

    pub fn total_anomalies(&self) -> usize {
        self.anomalies().count()
    }

    pub fn is_empty(&self) -> bool {
        self.total_anomalies() == 0 && self.alert_logs.is_empty()
    }

    /// Anomaly counts per severity tier, alerts excluded.
    pub fn severity_counts(&self) -> BTreeMap<Severity, usize> {
        let mut counts = BTreeMap::new();
        for anomaly in self.anomalies() {
            *counts.entry(anomaly.severity()).or_insert(0) += 1;
        }
        counts
    }
}

/// A flagged member of a partition together with the partition's statistics.
struct Outlier<T> {
    member: T,
    value: f64,
    expected: f64,
    z_score: f64,
}

pub struct AnomalyDetector {
    threshold: f64,
    min_customer_orders: usize,
    alert_generator: AlertGenerator,
}

impl AnomalyDetector {
    pub fn new() -> Self {
        Self::with_settings(&DetectionConfig::default(), AlertThresholds::default())
    }

    pub fn with_settings(detection: &DetectionConfig, thresholds: AlertThresholds) -> Self {
        Self {
            threshold: detection.z_score_threshold,
            min_customer_orders: detection.min_customer_orders,
            alert_generator: AlertGenerator::new(thresholds),
        }
    }

    /// Run every dimension plus the alert rules over `orders`.
    pub fn detect(&self, orders: &[OrderLine]) -> AnomalyReport {
        let report = AnomalyReport {
            preparation_time_anomalies: self.preparation_time_anomalies(orders),
            order_volume_anomalies: self.order_volume_anomalies(orders),
            revenue_anomalies: self.revenue_anomalies(orders),
            customer_behavior_anomalies: self.customer_spending_anomalies(orders),
            alert_logs: self.alert_generator.generate(orders),
        };

        debug!(
            records = orders.len(),
            anomalies = report.total_anomalies(),
            alerts = report.alert_logs.len(),
            "detection finished"
        );

        report
    }

    /// One global distribution of preparation minutes across all outlets.
    pub fn preparation_time_anomalies(&self, orders: &[OrderLine]) -> Vec<Anomaly> {
        let observations: Vec<((&OrderLine, NaiveDateTime, i64), f64)> = orders
            .iter()
            .filter_map(|order| match (order.prep_started, order.preparation_minutes()) {
                (Some(started), Some(minutes)) => Some(((order, started, minutes), minutes as f64)),
                _ => None,
            })
            .collect();

        self.find_outliers(&observations)
            .into_iter()
            .map(|outlier| {
                let (order, started, minutes) = outlier.member;
                Anomaly::PreparationTime {
                    order_id: order.order_id.clone(),
                    outlet_id: order.outlet_id.clone(),
                    preparation_time: minutes,
                    expected_time: outlier.expected,
                    z_score: outlier.z_score,
                    severity: Severity::from_z_score(outlier.z_score),
                    timestamp: started,
                }
            })
            .collect()
    }

    /// Hourly line counts per outlet, judged against that outlet's own hours.
    /// Hours without any orders are not observations.
    pub fn order_volume_anomalies(&self, orders: &[OrderLine]) -> Vec<Anomaly> {
        let mut outlet_hours: BTreeMap<&str, BTreeMap<u32, u64>> = BTreeMap::new();
        for order in orders {
            if let Some(placed) = order.order_placed {
                *outlet_hours
                    .entry(order.outlet_id.as_str())
                    .or_default()
                    .entry(placed.hour())
                    .or_insert(0) += 1;
            }
        }

        let mut anomalies = Vec::new();
        for (outlet_id, hours) in outlet_hours {
            let observations: Vec<((u32, u64), f64)> = hours
                .into_iter()
                .map(|(hour, count)| ((hour, count), count as f64))
                .collect();

            for outlier in self.find_outliers(&observations) {
                let (hour, order_count) = outlier.member;
                anomalies.push(Anomaly::OrderVolume {
                    outlet_id: outlet_id.to_string(),
                    hour,
                    order_count,
                    expected_count: outlier.expected,
                    z_score: outlier.z_score,
                    severity: Severity::from_z_score(outlier.z_score),
                });
            }
        }

        anomalies
    }

    /// Daily revenue per outlet. Sums raw line totals, so an order counts
    /// once per item line.
    pub fn revenue_anomalies(&self, orders: &[OrderLine]) -> Vec<Anomaly> {
        let mut outlet_days: BTreeMap<&str, BTreeMap<NaiveDate, f64>> = BTreeMap::new();
        for order in orders {
            if let (Some(placed), Some(price)) = (order.order_placed, order.price()) {
                *outlet_days
                    .entry(order.outlet_id.as_str())
                    .or_default()
                    .entry(placed.date())
                    .or_insert(0.0) += price;
            }
        }

        let mut anomalies = Vec::new();
        for (outlet_id, days) in outlet_days {
            let observations: Vec<(NaiveDate, f64)> = days.into_iter().collect();

            for outlier in self.find_outliers(&observations) {
                anomalies.push(Anomaly::Revenue {
                    outlet_id: outlet_id.to_string(),
                    date: outlier.member.format("%Y-%m-%d").to_string(),
                    revenue: outlier.value,
                    expected_revenue: outlier.expected,
                    z_score: outlier.z_score,
                    severity: Severity::from_z_score(outlier.z_score),
                });
            }
        }

        anomalies
    }

    /// Per-customer line values; customers with too few priced lines are skipped.
    pub fn customer_spending_anomalies(&self, orders: &[OrderLine]) -> Vec<Anomaly> {
        let mut customers: BTreeMap<&str, Vec<(&OrderLine, f64)>> = BTreeMap::new();
        for order in orders {
            if let Some(price) = order.price() {
                customers
                    .entry(order.customer_id.as_str())
                    .or_default()
                    .push((order, price));
            }
        }

        let mut anomalies = Vec::new();
        for (customer_id, observations) in customers {
            if observations.len() < self.min_customer_orders {
                debug!(
                    customer_id,
                    observations = observations.len(),
                    "skipping customer with insufficient data"
                );
                continue;
            }

            for outlier in self.find_outliers(&observations) {
                let order = outlier.member;
                anomalies.push(Anomaly::CustomerSpending {
                    customer_id: customer_id.to_string(),
                    order_id: order.order_id.clone(),
                    order_value: outlier.value,
                    expected_value: outlier.expected,
                    z_score: outlier.z_score,
                    severity: Severity::from_z_score(outlier.z_score),
                    timestamp: order.order_placed,
                });
            }
        }

        anomalies
    }

    /// Summarize one partition, then rescan it for members beyond the threshold.
    fn find_outliers<T: Copy>(&self, observations: &[(T, f64)]) -> Vec<Outlier<T>> {
        if observations.is_empty() {
            return Vec::new();
        }

        let values: Vec<f64> = observations.iter().map(|(_, value)| *value).collect();
        let summary = StatisticalSummary::from_values(&values);

        observations
            .iter()
            .filter_map(|&(member, value)| {
                summary
                    .outlier_score(value, self.threshold)
                    .map(|z_score| Outlier {
                        member,
                        value,
                        expected: summary.mean(),
                        z_score,
                    })
            })
            .collect()
    }
}

impl Default for AnomalyDetector {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn at(day: u32, hour: u32, minute: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 5, day)
            .unwrap()
            .and_hms_opt(hour, minute, 0)
            .unwrap()
    }

    fn line(order_id: &str, outlet_id: &str, customer_id: &str) -> OrderLine {
        OrderLine {
            order_id: order_id.to_string(),
            outlet_id: outlet_id.to_string(),
            customer_id: customer_id.to_string(),
            ..Default::default()
        }
    }

    fn prepped(order_id: &str, minutes: i64) -> OrderLine {
        let started = at(1, 12, 0);
        OrderLine {
            prep_started: Some(started),
            prep_finished: Some(started + chrono::Duration::minutes(minutes)),
            ..line(order_id, "OUT1", "C1")
        }
    }

    fn placed(order_id: &str, outlet_id: &str, when: NaiveDateTime, price: Option<f64>) -> OrderLine {
        OrderLine {
            order_placed: Some(when),
            total_price_lkr: price,
            ..line(order_id, outlet_id, "C1")
        }
    }

    #[test]
    fn test_empty_input_gives_empty_report() {
        let report = AnomalyDetector::new().detect(&[]);
        assert!(report.is_empty());
        assert_eq!(report, AnomalyReport::default());
    }

    #[test]
    fn test_records_without_optional_fields_are_ignored() {
        let orders = vec![line("O1", "OUT1", "C1"), line("O2", "OUT1", "C2")];
        let report = AnomalyDetector::new().detect(&orders);
        assert!(report.is_empty());
    }

    #[test]
    fn test_moderate_prep_outlier_not_flagged() {
        let orders: Vec<OrderLine> = [20, 20, 20, 20, 80]
            .iter()
            .enumerate()
            .map(|(i, m)| prepped(&format!("O{i}"), *m))
            .collect();
        let anomalies = AnomalyDetector::new().preparation_time_anomalies(&orders);
        assert!(anomalies.is_empty());
    }

    #[test]
    fn test_extreme_prep_outlier_flagged() {
        let mut orders: Vec<OrderLine> = (0..9).map(|i| prepped(&format!("O{i}"), 20)).collect();
        orders.push(prepped("SLOW", 90));

        let anomalies = AnomalyDetector::new().preparation_time_anomalies(&orders);
        assert_eq!(anomalies.len(), 1);
        match &anomalies[0] {
            Anomaly::PreparationTime {
                order_id,
                preparation_time,
                expected_time,
                z_score,
                severity,
                timestamp,
                ..
            } => {
                assert_eq!(order_id, "SLOW");
                assert_eq!(*preparation_time, 90);
                assert_eq!(*expected_time, 27.0);
                assert!((*z_score - 2.846).abs() < 1e-3);
                assert_eq!(*severity, Severity::High);
                assert_eq!(*timestamp, at(1, 12, 0));
            }
            other => panic!("unexpected anomaly: {other:?}"),
        }
    }

    #[test]
    fn test_identical_prep_times_never_flagged() {
        let orders: Vec<OrderLine> = (0..6).map(|i| prepped(&format!("O{i}"), 15)).collect();
        assert!(AnomalyDetector::new().preparation_time_anomalies(&orders).is_empty());
    }

    #[test]
    fn test_busy_hour_flagged_per_outlet() {
        let mut orders = Vec::new();
        let mut n = 0;
        for (hour, count) in [(9, 2), (10, 3), (11, 2), (12, 3), (13, 2), (14, 3), (15, 2), (19, 10)] {
            for _ in 0..count {
                n += 1;
                orders.push(placed(&format!("O{n}"), "X", at(1, hour, 5), None));
            }
        }
        // a quiet second outlet must not be judged against outlet X
        orders.push(placed("Y1", "Y", at(1, 19, 0), None));

        let anomalies = AnomalyDetector::new().order_volume_anomalies(&orders);
        assert_eq!(anomalies.len(), 1);
        match &anomalies[0] {
            Anomaly::OrderVolume {
                outlet_id,
                hour,
                order_count,
                expected_count,
                ..
            } => {
                assert_eq!(outlet_id, "X");
                assert_eq!(*hour, 19);
                assert_eq!(*order_count, 10);
                assert_eq!(*expected_count, 27.0 / 8.0);
            }
            other => panic!("unexpected anomaly: {other:?}"),
        }
    }

    #[test]
    fn test_revenue_spike_day_flagged() {
        let totals = [5000.0, 6000.0, 5500.0, 6500.0, 15000.0];
        let mut orders: Vec<OrderLine> = totals
            .iter()
            .enumerate()
            .map(|(i, total)| placed(&format!("O{i}"), "OUT1", at(i as u32 + 1, 12, 0), Some(*total)))
            .collect();
        // the extra days keep the spike beyond two standard deviations
        for day in 6..=9 {
            orders.push(placed(&format!("D{day}"), "OUT1", at(day, 13, 0), Some(5750.0)));
        }

        let anomalies = AnomalyDetector::new().revenue_anomalies(&orders);
        assert_eq!(anomalies.len(), 1);
        match &anomalies[0] {
            Anomaly::Revenue {
                outlet_id,
                date,
                revenue,
                ..
            } => {
                assert_eq!(outlet_id, "OUT1");
                assert_eq!(date, "2024-05-05");
                assert_eq!(*revenue, 15000.0);
            }
            other => panic!("unexpected anomaly: {other:?}"),
        }
    }

    #[test]
    fn test_non_finite_totals_do_not_mask_revenue_spike() {
        let totals = [5000.0, 6000.0, 5500.0, 6500.0, 15000.0, 5750.0, 5750.0, 5750.0, 5750.0];
        let mut orders: Vec<OrderLine> = totals
            .iter()
            .enumerate()
            .map(|(i, total)| placed(&format!("O{i}"), "OUT1", at(i as u32 + 1, 12, 0), Some(*total)))
            .collect();
        orders.push(placed("INF", "OUT1", at(10, 12, 0), Some(f64::INFINITY)));
        orders.push(placed("NAN", "OUT1", at(3, 12, 0), Some(f64::NAN)));

        let detector = AnomalyDetector::new();
        let anomalies = detector.revenue_anomalies(&orders);
        assert_eq!(anomalies.len(), 1);
        assert!(matches!(
            &anomalies[0],
            Anomaly::Revenue { date, .. } if date == "2024-05-05"
        ));
        assert!(
            detector
                .customer_spending_anomalies(&orders)
                .iter()
                .all(|anomaly| anomaly.z_score().is_finite())
        );
    }

    #[test]
    fn test_revenue_sums_every_line_of_an_order() {
        // two lines of the same order on one day both count
        let mut orders = vec![
            placed("BIG", "OUT1", at(10, 12, 0), Some(3000.0)),
            placed("BIG", "OUT1", at(10, 12, 0), Some(3000.0)),
        ];
        for day in 1..=9 {
            orders.push(placed(&format!("O{day}"), "OUT1", at(day, 12, 0), Some(1000.0)));
        }
        orders.push(placed("O11", "OUT1", at(11, 12, 0), Some(1100.0)));

        let anomalies = AnomalyDetector::new().revenue_anomalies(&orders);
        assert_eq!(anomalies.len(), 1);
        assert!(matches!(
            &anomalies[0],
            Anomaly::Revenue { revenue, .. } if *revenue == 6000.0
        ));
    }

    #[test]
    fn test_customer_with_two_orders_not_evaluated() {
        let orders = vec![
            placed("O1", "OUT1", at(1, 12, 0), Some(100.0)),
            placed("O2", "OUT1", at(2, 12, 0), Some(90_000.0)),
        ];
        assert!(AnomalyDetector::new().customer_spending_anomalies(&orders).is_empty());
    }

    #[test]
    fn test_customer_spending_outlier() {
        let mut orders: Vec<OrderLine> = [1200.0, 1500.0, 1800.0, 1400.0, 1600.0, 1300.0, 1700.0]
            .iter()
            .enumerate()
            .map(|(i, v)| placed(&format!("O{i}"), "OUT1", at(i as u32 + 1, 12, 0), Some(*v)))
            .collect();
        orders.push(placed("HUGE", "OUT1", at(20, 19, 30), Some(8000.0)));

        let anomalies = AnomalyDetector::new().customer_spending_anomalies(&orders);
        assert_eq!(anomalies.len(), 1);
        match &anomalies[0] {
            Anomaly::CustomerSpending {
                customer_id,
                order_id,
                order_value,
                timestamp,
                ..
            } => {
                assert_eq!(customer_id, "C1");
                assert_eq!(order_id, "HUGE");
                assert_eq!(*order_value, 8000.0);
                assert_eq!(*timestamp, Some(at(20, 19, 30)));
            }
            other => panic!("unexpected anomaly: {other:?}"),
        }
    }

    #[test]
    fn test_custom_threshold_is_respected() {
        let detection = DetectionConfig {
            z_score_threshold: 1.5,
            min_customer_orders: MIN_CUSTOMER_ORDERS,
        };
        let detector = AnomalyDetector::with_settings(&detection, AlertThresholds::default());
        let orders: Vec<OrderLine> = [20, 20, 20, 20, 80]
            .iter()
            .enumerate()
            .map(|(i, m)| prepped(&format!("O{i}"), *m))
            .collect();
        let anomalies = detector.preparation_time_anomalies(&orders);
        assert_eq!(anomalies.len(), 1);
        assert_eq!(anomalies[0].severity(), Severity::Low);
    }

    #[test]
    fn test_detect_is_repeatable() {
        let mut orders: Vec<OrderLine> = (0..9).map(|i| prepped(&format!("O{i}"), 20)).collect();
        orders.push(prepped("SLOW", 90));
        let detector = AnomalyDetector::new();
        assert_eq!(detector.detect(&orders), detector.detect(&orders));
    }

    #[test]
    fn test_anomaly_serializes_flat_with_type_tag() {
        let anomaly = Anomaly::OrderVolume {
            outlet_id: "X".to_string(),
            hour: 19,
            order_count: 10,
            expected_count: 3.375,
            z_score: 2.4,
            severity: Severity::Medium,
        };
        let value = serde_json::to_value(&anomaly).unwrap();
        assert_eq!(value["type"], "ORDER_VOLUME");
        assert_eq!(value["outletId"], "X");
        assert_eq!(value["orderCount"], 10);
        assert_eq!(value["expectedCount"], 3.375);
        assert_eq!(value["zScore"], 2.4);
        assert_eq!(value["severity"], "MEDIUM");
    }

    #[test]
    fn test_report_severity_counts() {
        let mut orders: Vec<OrderLine> = (0..9).map(|i| prepped(&format!("O{i}"), 20)).collect();
        orders.push(prepped("SLOW", 90));
        let report = AnomalyDetector::new().detect(&orders);
        let counts = report.severity_counts();
        assert_eq!(counts.get(&Severity::High), Some(&1));
        assert_eq!(report.total_anomalies(), 1);
    }
}
