// Alerts command: rule-based alert logs only
use crate::alerts::AlertGenerator;
use crate::cli::InputArgs;
use crate::commands::context::{AnalysisContext, handle_error};
use crate::config::Config;

pub fn handle_alerts_command(
    input: InputArgs,
    config: &Config,
    json_output: bool,
    colored: bool,
) -> anyhow::Result<()> {
    let context = AnalysisContext::new(config, json_output, colored);

    let records = match context.load_records(&input) {
        Ok(records) => records,
        Err(e) => {
            handle_error(&e, context.json_output);
            return Err(e);
        }
    };

    let alerts = AlertGenerator::new(config.alerts.clone()).generate(&records);
    if let Err(e) = context.print(&alerts) {
        handle_error(&e, context.json_output);
        return Err(e);
    }

    Ok(())
}
