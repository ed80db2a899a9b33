use crate::alerts::{AlertThresholds, AlertType};
use crate::analysis::{ANOMALY_THRESHOLD, MIN_CUSTOMER_ORDERS};
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

const LOG_LEVELS: [&str; 5] = ["trace", "debug", "info", "warn", "error"];

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub detection: DetectionConfig,
    pub alerts: AlertThresholds,
    pub ingest: IngestConfig,
    pub output: OutputConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DetectionConfig {
    pub z_score_threshold: f64,
    pub min_customer_orders: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct IngestConfig {
    pub clean: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    pub format: String, // "table" or "json"
    pub colored: bool,
    pub decimal_places: u8,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String, // trace, debug, info, warn or error
}

impl Default for DetectionConfig {
    fn default() -> Self {
        Self {
            z_score_threshold: ANOMALY_THRESHOLD,
            min_customer_orders: MIN_CUSTOMER_ORDERS,
        }
    }
}

impl Default for IngestConfig {
    fn default() -> Self {
        Self { clean: true }
    }
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            format: "table".to_string(),
            colored: false,
            decimal_places: 2,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "warn".to_string(),
        }
    }
}

impl Config {
    /// Load from `config_path`, creating it with defaults if missing.
    pub fn load_from(config_path: &Path) -> Result<Self> {
        if !config_path.exists() {
            let config = Self::default();
            config.save_to(config_path)?;
            return Ok(config);
        }

        let contents = fs::read_to_string(config_path)
            .with_context(|| format!("Failed to read config file: {}", config_path.display()))?;

        let config: Self = toml::from_str(&contents)
            .with_context(|| format!("Failed to parse config file: {}", config_path.display()))?;
        config
            .validate()
            .with_context(|| format!("Invalid config file: {}", config_path.display()))?;

        Ok(config)
    }

    pub fn save_to(&self, config_path: &Path) -> Result<()> {
        // Ensure parent directory exists
        if let Some(parent) = config_path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create config directory: {}", parent.display()))?;
        }

        let contents = self.to_commented_toml()?;

        fs::write(config_path, contents)
            .with_context(|| format!("Failed to write config file: {}", config_path.display()))?;

        Ok(())
    }

    /// TOML with a comment block above each section.
    pub fn to_commented_toml(&self) -> Result<String> {
        let mut output = String::new();

        output.push_str("# posguard configuration file\n");
        output.push_str("# Every setting can be left out; missing files are recreated with defaults.\n");
        output.push('\n');

        output.push_str("[detection]\n");
        output.push_str("# Observations more than this many sample standard deviations from\n");
        output.push_str("# their group mean are reported (strictly greater than)\n");
        output.push_str(&format!("z_score_threshold = {:?}\n", self.detection.z_score_threshold));
        output.push_str("# Customers with fewer priced order lines are not evaluated\n");
        output.push_str(&format!("min_customer_orders = {}\n", self.detection.min_customer_orders));
        output.push('\n');

        output.push_str("[alerts]\n");
        output.push_str("# Preparation longer than this many whole minutes raises LONG_PREPARATION_TIME\n");
        output.push_str(&format!(
            "long_preparation_minutes = {}\n",
            self.alerts.long_preparation_minutes
        ));
        output.push_str("# Lines priced above this fraction of the largest price raise HIGH_VALUE_ORDER\n");
        output.push_str(&format!("high_value_ratio = {:?}\n", self.alerts.high_value_ratio));
        output.push_str("# Statuses (any case) that raise FAILED_ORDER\n");
        output.push_str(&format!(
            "failure_statuses = {}\n",
            toml_string_list(&self.alerts.failure_statuses)
        ));
        output.push_str("# Rules to run: long_preparation_time, failed_order, high_value_order\n");
        output.push_str(&format!(
            "enabled_alerts = {}\n",
            toml_string_list(&self.alerts.enabled_alerts)
        ));
        output.push('\n');

        output.push_str("[ingest]\n");
        output.push_str("# Drop lines without identifiers, placement time or a positive price\n");
        output.push_str("# before analysis (override per run with --raw)\n");
        output.push_str(&format!("clean = {}\n", self.ingest.clean));
        output.push('\n');

        output.push_str("[output]\n");
        output.push_str("# \"table\" or \"json\"; --json always wins\n");
        output.push_str(&format!("format = \"{}\"\n", self.output.format));
        output.push_str(&format!("colored = {}\n", self.output.colored));
        output.push_str(&format!("decimal_places = {}\n", self.output.decimal_places));
        output.push('\n');

        output.push_str("[logging]\n");
        output.push_str("# trace, debug, info, warn or error; RUST_LOG and --verbose take precedence\n");
        output.push_str(&format!("level = \"{}\"\n", self.logging.level));

        Ok(output)
    }

    pub fn default_path() -> Result<PathBuf> {
        let home = dirs::home_dir().context("Failed to determine home directory")?;
        Ok(home.join(".config").join("posguard").join("config.toml"))
    }

    /// Range checks shared by `set_value` and hand-edited files.
    pub fn validate(&self) -> Result<()> {
        let threshold = self.detection.z_score_threshold;
        if !(threshold.is_finite() && threshold > 0.0) {
            anyhow::bail!("Threshold must be a positive number, got {}", threshold);
        }
        if self.alerts.long_preparation_minutes < 0 {
            anyhow::bail!("Preparation minutes must not be negative");
        }
        let ratio = self.alerts.high_value_ratio;
        if !(ratio > 0.0 && ratio <= 1.0) {
            anyhow::bail!("Ratio must be greater than 0 and at most 1, got {}", ratio);
        }
        if let Some(unknown) = self
            .alerts
            .enabled_alerts
            .iter()
            .find(|k| AlertType::from_config_key(k).is_none())
        {
            anyhow::bail!(
                "Unknown alert type: {}. Must be one of long_preparation_time, failed_order, high_value_order",
                unknown
            );
        }
        if !["table", "json"].contains(&self.output.format.as_str()) {
            anyhow::bail!(
                "Invalid output format: {}. Must be 'table' or 'json'",
                self.output.format
            );
        }
        if self.output.decimal_places > 10 {
            anyhow::bail!("Decimal places must be between 0 and 10");
        }
        if !LOG_LEVELS.contains(&self.logging.level.to_lowercase().as_str()) {
            anyhow::bail!(
                "Invalid log level: {}. Must be one of {}",
                self.logging.level,
                LOG_LEVELS.join(", ")
            );
        }
        Ok(())
    }

    /// Update one `section.key`; the config is left untouched on error.
    pub fn set_value(&mut self, key: &str, value: &str) -> Result<()> {
        let mut updated = self.clone();
        match key {
            "detection.z_score_threshold" => {
                updated.detection.z_score_threshold = value
                    .parse()
                    .with_context(|| format!("Invalid threshold value: {}", value))?;
            }
            "detection.min_customer_orders" => {
                updated.detection.min_customer_orders = value
                    .parse()
                    .with_context(|| format!("Invalid order count: {}", value))?;
            }
            "alerts.long_preparation_minutes" => {
                updated.alerts.long_preparation_minutes = value
                    .parse()
                    .with_context(|| format!("Invalid minutes value: {}", value))?;
            }
            "alerts.high_value_ratio" => {
                updated.alerts.high_value_ratio = value
                    .parse()
                    .with_context(|| format!("Invalid ratio value: {}", value))?;
            }
            "alerts.failure_statuses" => {
                updated.alerts.failure_statuses = split_list(value);
            }
            "alerts.enabled_alerts" => {
                updated.alerts.enabled_alerts = split_list(value);
            }
            "ingest.clean" => {
                updated.ingest.clean = value
                    .parse()
                    .with_context(|| format!("Invalid boolean value: {}", value))?;
            }
            "output.format" => {
                updated.output.format = value.to_string();
            }
            "output.colored" => {
                updated.output.colored = value
                    .parse()
                    .with_context(|| format!("Invalid boolean value: {}", value))?;
            }
            "output.decimal_places" => {
                updated.output.decimal_places = value
                    .parse()
                    .with_context(|| format!("Invalid decimal places value: {}", value))?;
            }
            "logging.level" => {
                updated.logging.level = value.to_lowercase();
            }
            _ => anyhow::bail!("Unknown configuration key: {}", key),
        }

        updated.validate()?;
        *self = updated;
        Ok(())
    }
}

fn split_list(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(|item| item.trim())
        .filter(|item| !item.is_empty())
        .map(str::to_string)
        .collect()
}

fn toml_string_list(items: &[String]) -> String {
    let quoted: Vec<String> = items.iter().map(|item| format!("{:?}", item)).collect();
    format!("[{}]", quoted.join(", "))
}
