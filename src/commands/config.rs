use crate::cli::ConfigAction;
use crate::config::Config;
use std::path::Path;

fn report_failure(what: &str, error: &anyhow::Error, json_output: bool) -> ! {
    if json_output {
        let payload = serde_json::json!({
            "status": "error",
            "message": format!("{what}: {error:#}"),
        });
        println!("{payload}");
    } else {
        eprintln!("Error: {what}: {error:#}");
    }
    std::process::exit(1);
}

fn report_success(message: &str, json_output: bool) {
    if json_output {
        let payload = serde_json::json!({ "status": "success", "message": message });
        println!("{payload}");
    } else {
        println!("{message}");
    }
}

pub fn handle_config_action(action: ConfigAction, config_path: &Path, json_output: bool) {
    match action {
        ConfigAction::Init => match Config::default().save_to(config_path) {
            Ok(()) => report_success(
                &format!("Configuration initialized at: {}", config_path.display()),
                json_output,
            ),
            Err(e) => report_failure("Failed to initialize config", &e, json_output),
        },
        ConfigAction::Show => match Config::load_from(config_path) {
            Ok(config) => {
                if json_output {
                    match serde_json::to_string_pretty(&config) {
                        Ok(json) => println!("{}", json),
                        Err(e) => {
                            report_failure("Failed to serialize config to JSON", &anyhow::Error::from(e), json_output)
                        }
                    }
                } else {
                    match toml::to_string_pretty(&config) {
                        Ok(toml_str) => {
                            println!("Configuration ({})", config_path.display());
                            println!("{}", toml_str);
                        }
                        Err(e) => report_failure("Failed to serialize config", &anyhow::Error::from(e), json_output),
                    }
                }
            }
            Err(e) => report_failure("Failed to load config", &e, json_output),
        },
        ConfigAction::Set { key, value } => {
            let mut config = match Config::load_from(config_path) {
                Ok(config) => config,
                Err(e) => report_failure("Failed to load config", &e, json_output),
            };

            if let Err(e) = config.set_value(&key, &value) {
                report_failure("Invalid configuration", &e, json_output);
            }

            match config.save_to(config_path) {
                Ok(()) => report_success(
                    &format!("Configuration updated: {} = {}", key, value),
                    json_output,
                ),
                Err(e) => report_failure("Failed to save config", &e, json_output),
            }
        }
    }
}
