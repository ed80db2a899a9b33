// Detect command: statistical anomalies plus alert logs
use crate::analysis::AnomalyDetector;
use crate::cli::InputArgs;
use crate::commands::context::{AnalysisContext, handle_error};
use crate::config::Config;
use crate::output::summary_line;
use tracing::info;

pub fn handle_detect_command(
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

    let detector = AnomalyDetector::with_settings(&config.detection, config.alerts.clone());
    let report = detector.detect(&records);
    info!(summary = %summary_line(&report), "detection complete");

    if let Err(e) = context.print(&report) {
        handle_error(&e, context.json_output);
        return Err(e);
    }

    Ok(())
}
