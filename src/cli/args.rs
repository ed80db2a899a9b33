use crate::analysis::ReportSection;
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "posguard")]
#[command(about = "Anomaly detection and alerting for restaurant point-of-sale exports")]
#[command(version)]
pub struct Cli {
    /// Custom config file path
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Verbose output (debug logging on stderr)
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// JSON output format
    #[arg(long, global = true)]
    pub json: bool,

    /// Enable colorized table output
    #[arg(long, global = true)]
    pub colored: bool,

    #[command(subcommand)]
    pub command: Commands,
}

/// Input file and record selection shared by the analysis commands
#[derive(Args, Debug, Clone)]
pub struct InputArgs {
    /// Order export to analyze (.csv, or .jsonl / .json for JSON lines)
    pub file: PathBuf,

    /// Only analyze this outlet
    #[arg(long)]
    pub outlet: Option<String>,

    /// Start date (YYYY-MM-DD), inclusive
    #[arg(long)]
    pub since: Option<String>,

    /// End date (YYYY-MM-DD), inclusive
    #[arg(long)]
    pub until: Option<String>,

    /// Skip the cleaning step and analyze every parsed line
    #[arg(long)]
    pub raw: bool,
}

#[derive(Subcommand)]
pub enum ConfigAction {
    /// Show current configuration
    Show,
    /// Initialize fresh configuration
    Init,
    /// Set configuration value
    Set {
        /// Configuration key (e.g., detection.z_score_threshold)
        key: String,
        /// Configuration value
        value: String,
    },
}

#[derive(Subcommand)]
pub enum Commands {
    /// Detect statistical anomalies and generate alerts
    Detect {
        #[command(flatten)]
        input: InputArgs,
    },

    /// Generate rule-based alerts only
    Alerts {
        #[command(flatten)]
        input: InputArgs,
    },

    /// Business summaries: revenue, branch ranking, peak hours, menu, customers
    Report {
        #[command(flatten)]
        input: InputArgs,

        /// Sections to include (repeatable); all when omitted
        #[arg(long = "section", value_enum)]
        sections: Vec<ReportSection>,
    },

    /// Configuration management
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_detect_with_filters() {
        let cli = Cli::try_parse_from([
            "posguard",
            "--json",
            "detect",
            "orders.csv",
            "--outlet",
            "OUT1",
            "--since",
            "2024-01-01",
        ])
        .unwrap();

        assert!(cli.json);
        match cli.command {
            Commands::Detect { input } => {
                assert_eq!(input.file, PathBuf::from("orders.csv"));
                assert_eq!(input.outlet.as_deref(), Some("OUT1"));
                assert_eq!(input.since.as_deref(), Some("2024-01-01"));
                assert!(input.until.is_none());
                assert!(!input.raw);
            }
            _ => panic!("expected detect command"),
        }
    }

    #[test]
    fn test_parse_report_sections() {
        let cli = Cli::try_parse_from([
            "posguard",
            "report",
            "orders.jsonl",
            "--section",
            "branches",
            "--section",
            "peak-hours",
        ])
        .unwrap();

        match cli.command {
            Commands::Report { input, sections } => {
                assert_eq!(input.file, PathBuf::from("orders.jsonl"));
                assert_eq!(sections, vec![ReportSection::Branches, ReportSection::PeakHours]);
            }
            _ => panic!("expected report command"),
        }

        assert!(Cli::try_parse_from(["posguard", "report", "o.csv", "--section", "weather"]).is_err());
    }

    #[test]
    fn test_parse_config_set() {
        let cli = Cli::try_parse_from(["posguard", "config", "set", "logging.level", "debug"]).unwrap();
        assert!(matches!(
            cli.command,
            Commands::Config {
                action: ConfigAction::Set { .. }
            }
        ));
    }
}
