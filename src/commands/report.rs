// Report command: descriptive business summaries over the selected lines
use crate::analysis::{ReportAnalyzer, ReportSection};
use crate::cli::InputArgs;
use crate::commands::context::{AnalysisContext, handle_error};
use crate::config::Config;
use tracing::info;

pub fn handle_report_command(
    input: InputArgs,
    sections: &[ReportSection],
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

    let report = ReportAnalyzer::new().build(&records, sections);
    info!(records = records.len(), sections = sections.len(), "report built");

    if let Err(e) = context.print(&report) {
        handle_error(&e, context.json_output);
        return Err(e);
    }

    Ok(())
}
