// Command handlers module
pub mod alerts;
pub mod config;
pub mod context;
pub mod detect;
pub mod report;

// Re-export command handlers for easy access
pub use alerts::handle_alerts_command;
pub use config::handle_config_action;
pub use detect::handle_detect_command;
pub use report::handle_report_command;
