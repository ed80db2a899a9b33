use crate::models::OrderLine;
use crate::parser::{IngestError, ParsedOrders};
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;
use tracing::warn;

pub fn parse_jsonl_file(path: &Path) -> Result<ParsedOrders, IngestError> {
    let file = File::open(path)
        .map_err(|e| IngestError::FileNotFound(format!("{}: {}", path.display(), e)))?;
    parse_jsonl_reader(BufReader::new(file))
}

/// One serialized [`OrderLine`] per line. Blank lines are ignored; malformed
/// lines (bad JSON, invalid UTF-8) and lines without an order id are skipped
/// with a warning. Only I/O failures abort the file.
pub fn parse_jsonl_reader<R: BufRead>(mut reader: R) -> Result<ParsedOrders, IngestError> {
    let mut parsed = ParsedOrders::default();
    let mut buffer = Vec::new();
    let mut line_num = 0;

    loop {
        buffer.clear();
        let read = reader
            .read_until(b'\n', &mut buffer)
            .map_err(|e| IngestError::Read(format!("line {}: {e}", line_num + 1)))?;
        if read == 0 {
            break;
        }
        line_num += 1;

        let line = match std::str::from_utf8(&buffer) {
            Ok(line) => line.trim(),
            Err(e) => {
                warn!(line = line_num, error = %e, "skipping line that is not valid UTF-8");
                parsed.total_rows += 1;
                parsed.skipped_rows += 1;
                continue;
            }
        };

        if line.is_empty() {
            continue;
        }
        parsed.total_rows += 1;

        match parse_line(line) {
            Ok(Some(order)) => {
                parsed.records.push(order);
                parsed.parsed_rows += 1;
            }
            Ok(None) => {
                warn!(line = line_num, "skipping order line without orderId");
                parsed.skipped_rows += 1;
            }
            Err(e) => {
                warn!(line = line_num, error = %e, "skipping malformed JSON");
                parsed.skipped_rows += 1;
            }
        }
    }

    Ok(parsed)
}

fn parse_line(line: &str) -> Result<Option<OrderLine>, IngestError> {
    let order: OrderLine =
        serde_json::from_str(line).map_err(|e| IngestError::Json(e.to_string()))?;

    if order.order_id.trim().is_empty() {
        return Ok(None);
    }

    Ok(Some(order))
}
