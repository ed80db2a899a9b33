// posguard: point-of-sale anomaly detection
use clap::Parser;
use posguard::cli::{Cli, Commands};
use posguard::commands::{
    handle_alerts_command, handle_config_action, handle_detect_command, handle_report_command,
};
use posguard::config::Config;
use posguard::logging::init_logging;
use std::path::Path;

/// Load the configuration and install logging before any analysis runs.
fn prepare(config_path: &Path, verbose: bool) -> Config {
    let config = match Config::load_from(config_path) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error: Failed to load configuration: {e:#}");
            std::process::exit(1);
        }
    };

    if let Err(e) = init_logging(&config.logging.level, verbose) {
        eprintln!("Warning: {e:#}");
    }

    config
}

fn main() {
    let cli = Cli::parse();

    let config_path = match cli.config.clone() {
        Some(path) => path,
        None => match Config::default_path() {
            Ok(path) => path,
            Err(e) => {
                eprintln!("Error: {e:#}");
                std::process::exit(1);
            }
        },
    };

    let result = match cli.command {
        // config management must work even when the file is broken
        Commands::Config { action } => {
            handle_config_action(action, &config_path, cli.json);
            Ok(())
        }
        Commands::Detect { input } => {
            let config = prepare(&config_path, cli.verbose);
            handle_detect_command(input, &config, cli.json, cli.colored)
        }
        Commands::Alerts { input } => {
            let config = prepare(&config_path, cli.verbose);
            handle_alerts_command(input, &config, cli.json, cli.colored)
        }
        Commands::Report { input, sections } => {
            let config = prepare(&config_path, cli.verbose);
            handle_report_command(input, &sections, &config, cli.json, cli.colored)
        }
    };

    // handlers report their own errors
    if result.is_err() {
        std::process::exit(1);
    }
}
