pub mod settings;

pub use settings::{Config, DetectionConfig, IngestConfig, LoggingConfig, OutputConfig};
