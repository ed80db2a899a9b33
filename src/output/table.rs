use crate::alerts::Alert;
use crate::analysis::{Anomaly, AnomalyReport};
use serde::Serialize;
use tabled::settings::object::Rows;
use tabled::settings::{Color, Style};
use tabled::{Table, Tabled};

/// Trait for items that can be displayed as tables or JSON
pub trait OutputFormat {
    fn to_table(&self) -> String {
        self.to_table_with_color(2, false)
    }
    fn to_json(&self) -> Result<String, serde_json::Error>;
    fn to_table_with_color(&self, decimal_places: u8, colored: bool) -> String;
}

/// Row for the anomaly tables
#[derive(Tabled, Serialize, Debug)]
pub struct AnomalyRow {
    #[tabled(rename = "Type")]
    pub kind: String,
    #[tabled(rename = "Subject")]
    pub subject: String,
    #[tabled(rename = "Observed")]
    pub observed: String,
    #[tabled(rename = "Expected")]
    pub expected: String,
    #[tabled(rename = "Z-Score")]
    pub z_score: String,
    #[tabled(rename = "Severity")]
    pub severity: String,
}

/// Row for the alert log table
#[derive(Tabled, Serialize, Debug)]
pub struct AlertRow {
    #[tabled(rename = "Alert")]
    pub alert_id: String,
    #[tabled(rename = "Type")]
    pub alert_type: String,
    #[tabled(rename = "Severity")]
    pub severity: String,
    #[tabled(rename = "Message")]
    pub message: String,
    #[tabled(rename = "Time")]
    pub timestamp: String,
}

impl AnomalyRow {
    pub fn from_anomaly(anomaly: &Anomaly, decimal_places: u8) -> Self {
        let places = decimal_places as usize;
        let (observed, expected) = anomaly.observed_and_expected();
        Self {
            kind: anomaly.kind().to_string(),
            subject: anomaly.subject(),
            observed: format!("{:.*}", places, observed),
            expected: format!("{:.*}", places, expected),
            z_score: format!("{:.2}", anomaly.z_score()),
            severity: anomaly.severity().to_string(),
        }
    }
}

impl AlertRow {
    pub fn from_alert(alert: &Alert) -> Self {
        Self {
            alert_id: alert.alert_id.clone(),
            alert_type: alert.alert_type.label().to_string(),
            severity: alert.severity.to_string(),
            message: alert.message.clone(),
            timestamp: alert
                .timestamp
                .map(|t| t.format("%Y-%m-%d %H:%M").to_string())
                .unwrap_or_else(|| "-".to_string()),
        }
    }
}

pub fn apply_table_style_with_color(mut table: Table, colored: bool) -> String {
    if colored {
        table.with(Style::modern());
        table.modify(Rows::first(), Color::FG_CYAN);
    } else {
        table.with(Style::ascii());
    }
    table.to_string()
}

fn anomaly_section(title: &str, anomalies: &[Anomaly], decimal_places: u8, colored: bool) -> String {
    if anomalies.is_empty() {
        return format!("{title}: none found.");
    }

    let rows: Vec<AnomalyRow> = anomalies
        .iter()
        .map(|anomaly| AnomalyRow::from_anomaly(anomaly, decimal_places))
        .collect();

    format!(
        "{title} ({})\n{}",
        anomalies.len(),
        apply_table_style_with_color(Table::new(rows), colored)
    )
}

fn alert_section(alerts: &[Alert], colored: bool) -> String {
    if alerts.is_empty() {
        return "Alerts: none found.".to_string();
    }

    let rows: Vec<AlertRow> = alerts.iter().map(AlertRow::from_alert).collect();
    format!(
        "Alerts ({})\n{}",
        alerts.len(),
        apply_table_style_with_color(Table::new(rows), colored)
    )
}

/// e.g. `3 anomalies (CRITICAL: 1, MEDIUM: 2), 4 alerts`
pub fn summary_line(report: &AnomalyReport) -> String {
    let counts = report.severity_counts();
    let breakdown: Vec<String> = counts
        .iter()
        .rev()
        .map(|(severity, count)| format!("{severity}: {count}"))
        .collect();

    let mut line = format!("{} anomalies", report.total_anomalies());
    if !breakdown.is_empty() {
        line.push_str(&format!(" ({})", breakdown.join(", ")));
    }
    line.push_str(&format!(", {} alerts", report.alert_logs.len()));
    line
}

impl OutputFormat for AnomalyReport {
    fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    fn to_table_with_color(&self, decimal_places: u8, colored: bool) -> String {
        if self.is_empty() {
            return "No anomalies or alerts found.".to_string();
        }

        let sections = [
            anomaly_section(
                "Preparation time anomalies",
                &self.preparation_time_anomalies,
                decimal_places,
                colored,
            ),
            anomaly_section(
                "Order volume anomalies",
                &self.order_volume_anomalies,
                decimal_places,
                colored,
            ),
            anomaly_section(
                "Revenue anomalies",
                &self.revenue_anomalies,
                decimal_places,
                colored,
            ),
            anomaly_section(
                "Customer spending anomalies",
                &self.customer_behavior_anomalies,
                decimal_places,
                colored,
            ),
            alert_section(&self.alert_logs, colored),
            summary_line(self),
        ];

        sections.join("\n\n")
    }
}

impl OutputFormat for Vec<Alert> {
    fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    fn to_table_with_color(&self, _decimal_places: u8, colored: bool) -> String {
        if self.is_empty() {
            return "No alerts found.".to_string();
        }
        alert_section(self, colored)
    }
}
