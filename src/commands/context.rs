// Shared setup for the analysis commands
use crate::cli::InputArgs;
use crate::config::Config;
use crate::models::OrderLine;
use crate::output::OutputFormat;
use crate::parser::load_orders;
use crate::utils::{OrderFilter, clean_and_validate};
use anyhow::{Context, Result};
use tracing::{debug, info};

pub struct AnalysisContext<'a> {
    pub config: &'a Config,
    pub json_output: bool,
    pub colored: bool,
}

impl<'a> AnalysisContext<'a> {
    pub fn new(config: &'a Config, json_flag: bool, colored_flag: bool) -> Self {
        Self {
            config,
            // CLI override takes precedence
            json_output: json_flag || config.output.format == "json",
            colored: colored_flag || config.output.colored,
        }
    }

    /// Ingest, clean (unless `--raw` or disabled in config) and filter.
    pub fn load_records(&self, input: &InputArgs) -> Result<Vec<OrderLine>> {
        let parsed = load_orders(&input.file)
            .with_context(|| format!("Failed to ingest {}", input.file.display()))?;

        let parsed_count = parsed.records.len();
        let records = if self.config.ingest.clean && !input.raw {
            clean_and_validate(parsed.records)
        } else {
            parsed.records
        };
        debug!(
            parsed = parsed_count,
            kept = records.len(),
            "cleaning step finished"
        );

        let filter = OrderFilter::from_args(
            input.outlet.clone(),
            input.since.as_deref(),
            input.until.as_deref(),
        )?;
        let records = filter.apply(records);
        info!(filter = %filter.describe(), records = records.len(), "records selected");

        Ok(records)
    }

    pub fn print<T: OutputFormat>(&self, result: &T) -> Result<()> {
        if self.json_output {
            let json = result
                .to_json()
                .context("Failed to serialize results")?;
            println!("{json}");
        } else {
            println!(
                "{}",
                result.to_table_with_color(self.config.output.decimal_places, self.colored)
            );
        }
        Ok(())
    }
}

pub fn handle_error(error: &anyhow::Error, json_output: bool) {
    if json_output {
        let payload = serde_json::json!({
            "status": "error",
            "message": format!("{error:#}"),
        });
        println!("{payload}");
    } else {
        eprintln!("Error: {error:#}");
    }
}
