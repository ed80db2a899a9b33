// Analysis module
pub mod anomaly;
pub mod reports;
pub mod stats;

pub use anomaly::{ANOMALY_THRESHOLD, Anomaly, AnomalyDetector, AnomalyReport, MIN_CUSTOMER_ORDERS};
pub use reports::{BusinessReport, ReportAnalyzer, ReportSection};
pub use stats::StatisticalSummary;
