use crate::models::Severity;
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AlertThresholds {
    pub long_preparation_minutes: i64, // Alert when prep takes longer than this
    pub high_value_ratio: f64,         // Fraction of the largest order value
    pub failure_statuses: Vec<String>, // Compared case-insensitively
    pub enabled_alerts: Vec<String>,   // List of enabled alert types
}

impl Default for AlertThresholds {
    fn default() -> Self {
        Self {
            long_preparation_minutes: 60,
            high_value_ratio: 0.9,
            failure_statuses: vec!["Failed".to_string(), "Cancelled".to_string()],
            enabled_alerts: AlertType::ALL
                .iter()
                .map(|alert_type| alert_type.config_key().to_string())
                .collect(),
        }
    }
}

impl AlertThresholds {
    pub fn is_enabled(&self, alert_type: AlertType) -> bool {
        self.enabled_alerts
            .iter()
            .any(|key| key == alert_type.config_key())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AlertType {
    LongPreparationTime,
    FailedOrder,
    HighValueOrder,
}

impl AlertType {
    pub const ALL: [AlertType; 3] = [
        AlertType::LongPreparationTime,
        AlertType::FailedOrder,
        AlertType::HighValueOrder,
    ];

    /// Name used in the `enabled_alerts` config list.
    pub fn config_key(&self) -> &'static str {
        match self {
            AlertType::LongPreparationTime => "long_preparation_time",
            AlertType::FailedOrder => "failed_order",
            AlertType::HighValueOrder => "high_value_order",
        }
    }

    pub fn from_config_key(key: &str) -> Option<Self> {
        AlertType::ALL
            .into_iter()
            .find(|alert_type| alert_type.config_key() == key)
    }

    /// Prefix of the alert id; the order id is appended.
    pub fn id_prefix(&self) -> &'static str {
        match self {
            AlertType::LongPreparationTime => "PREP_TIME_",
            AlertType::FailedOrder => "FAILED_ORDER_",
            AlertType::HighValueOrder => "HIGH_VALUE_",
        }
    }

    pub fn severity(&self) -> Severity {
        match self {
            AlertType::LongPreparationTime => Severity::High,
            AlertType::FailedOrder => Severity::Medium,
            AlertType::HighValueOrder => Severity::Low,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            AlertType::LongPreparationTime => "LONG_PREPARATION_TIME",
            AlertType::FailedOrder => "FAILED_ORDER",
            AlertType::HighValueOrder => "HIGH_VALUE_ORDER",
        }
    }
}

/// A rule-triggered event about one order line.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Alert {
    pub alert_id: String,
    #[serde(rename = "type")]
    pub alert_type: AlertType,
    pub severity: Severity,
    pub message: String,
    pub order_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub outlet_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub customer_id: Option<String>,
    pub timestamp: Option<NaiveDateTime>,
}

impl Alert {
    pub fn new(alert_type: AlertType, order_id: &str, message: String) -> Self {
        Self {
            alert_id: format!("{}{}", alert_type.id_prefix(), order_id),
            alert_type,
            severity: alert_type.severity(),
            message,
            order_id: order_id.to_string(),
            outlet_id: None,
            customer_id: None,
            timestamp: None,
        }
    }

    pub fn with_outlet(mut self, outlet_id: &str) -> Self {
        self.outlet_id = Some(outlet_id.to_string());
        self
    }

    pub fn with_customer(mut self, customer_id: &str) -> Self {
        self.customer_id = Some(customer_id.to_string());
        self
    }

    pub fn at(mut self, timestamp: Option<NaiveDateTime>) -> Self {
        self.timestamp = timestamp;
        self
    }
}
