pub mod generator;
pub mod thresholds;

pub use generator::AlertGenerator;
pub use thresholds::{Alert, AlertThresholds, AlertType};
