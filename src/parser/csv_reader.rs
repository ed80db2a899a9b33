use crate::models::OrderLine;
use crate::parser::{IngestError, ParsedOrders};
use chrono::NaiveDateTime;
use csv::StringRecord;
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;
use std::str::FromStr;
use tracing::{debug, warn};

/// Rows are converted in batches of this size.
pub const CHUNK_SIZE: usize = 1000;

/// Number of positional columns in an export row.
pub const COLUMN_COUNT: usize = 31;

const TIMESTAMP_FORMATS: [&str; 2] = ["%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M:%S"];

pub fn parse_csv_file(path: &Path) -> Result<ParsedOrders, IngestError> {
    let file = File::open(path)
        .map_err(|e| IngestError::FileNotFound(format!("{}: {}", path.display(), e)))?;
    parse_csv_reader(BufReader::new(file))
}

/// Parse an export with a header row. Bad rows are skipped, not fatal; an
/// unreadable header or an I/O failure aborts the file.
pub fn parse_csv_reader<R: Read>(reader: R) -> Result<ParsedOrders, IngestError> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(reader);

    reader
        .headers()
        .map_err(|e| IngestError::Csv(format!("header: {e}")))?;

    let mut parsed = ParsedOrders::default();
    let mut chunk: Vec<(usize, StringRecord)> = Vec::with_capacity(CHUNK_SIZE);

    for (index, result) in reader.records().enumerate() {
        // header is line 1
        let line = index + 2;
        parsed.total_rows += 1;

        match result {
            Ok(record) => chunk.push((line, record)),
            Err(e) if matches!(e.kind(), csv::ErrorKind::Io(_)) => {
                return Err(IngestError::Read(format!("line {line}: {e}")));
            }
            Err(e) => {
                warn!(line, error = %e, "skipping unreadable CSV row");
                parsed.skipped_rows += 1;
                continue;
            }
        }

        if chunk.len() >= CHUNK_SIZE {
            process_chunk(&chunk, &mut parsed);
            chunk.clear();
        }
    }

    if !chunk.is_empty() {
        process_chunk(&chunk, &mut parsed);
    }

    Ok(parsed)
}

fn process_chunk(chunk: &[(usize, StringRecord)], parsed: &mut ParsedOrders) {
    let before = parsed.parsed_rows;

    for (line, record) in chunk {
        match parse_row(record) {
            Ok(order) => {
                parsed.records.push(order);
                parsed.parsed_rows += 1;
            }
            Err(e) => {
                warn!(line = *line, error = %e, "skipping malformed row");
                parsed.skipped_rows += 1;
            }
        }
    }

    debug!(
        rows = chunk.len(),
        accepted = parsed.parsed_rows - before,
        "processed chunk"
    );
}

/// Map one positional row onto an [`OrderLine`].
pub fn parse_row(record: &StringRecord) -> Result<OrderLine, IngestError> {
    if record.len() < COLUMN_COUNT {
        return Err(IngestError::MissingColumns {
            expected: COLUMN_COUNT,
            found: record.len(),
        });
    }

    let cell = |i: usize| record.get(i).unwrap_or_default();

    Ok(OrderLine {
        order_id: cell(0).trim().to_string(),
        customer_id: cell(1).trim().to_string(),
        outlet_id: cell(2).trim().to_string(),
        order_placed: parse_timestamp(cell(3), "order_placed")?,
        order_confirmed: parse_timestamp(cell(4), "order_confirmed")?,
        prep_started: parse_timestamp(cell(5), "prep_started")?,
        prep_finished: parse_timestamp(cell(6), "prep_finished")?,
        served_time: parse_timestamp(cell(7), "served_time")?,
        status: parse_text(cell(8)),
        num_items: parse_number(cell(9), "num_items")?,
        total_price_lkr: parse_amount(cell(10), "total_price_lkr")?,
        payment_method: parse_text(cell(11)),
        item_id: parse_text(cell(12)),
        quantity: parse_number(cell(13), "quantity")?,
        // column 14 is superseded by the menu price in column 28
        item_price_lkr: parse_amount(cell(28), "item_price_lkr")?,
        customer_name: parse_text(cell(15)),
        contact_no: parse_text(cell(16)),
        gender: parse_text(cell(17)),
        age: parse_number(cell(18), "age")?,
        join_date: parse_timestamp(cell(19), "join_date")?,
        loyalty_group: parse_text(cell(20)),
        estimated_total_spent_lkr: parse_amount(cell(21), "estimated_total_spent_lkr")?,
        outlet_name: parse_text(cell(22)),
        borough: parse_text(cell(23)),
        capacity: parse_number(cell(24), "capacity")?,
        opened: parse_timestamp(cell(25), "opened")?,
        menu_item_name: parse_text(cell(26)),
        category: parse_text(cell(27)),
        is_vegetarian: parse_flag(cell(29)),
        spice_level: parse_text(cell(30)),
    })
}

fn parse_text(raw: &str) -> Option<String> {
    let trimmed = raw.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}

fn parse_number<T: FromStr>(raw: &str, column: &'static str) -> Result<Option<T>, IngestError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Ok(None);
    }

    trimmed
        .parse::<T>()
        .map(Some)
        .map_err(|_| IngestError::InvalidField {
            column,
            value: raw.to_string(),
        })
}

/// Money columns: like [`parse_number`], but `inf` and `NaN` are rejected.
fn parse_amount(raw: &str, column: &'static str) -> Result<Option<f64>, IngestError> {
    match parse_number::<f64>(raw, column)? {
        Some(amount) if !amount.is_finite() => Err(IngestError::InvalidField {
            column,
            value: raw.to_string(),
        }),
        amount => Ok(amount),
    }
}

/// Anything other than a case-insensitive `true` is `false`.
fn parse_flag(raw: &str) -> Option<bool> {
    let trimmed = raw.trim();
    (!trimmed.is_empty()).then(|| trimmed.eq_ignore_ascii_case("true"))
}

fn parse_timestamp(raw: &str, column: &'static str) -> Result<Option<NaiveDateTime>, IngestError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Ok(None);
    }

    TIMESTAMP_FORMATS
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(trimmed, format).ok())
        .map(Some)
        .ok_or_else(|| IngestError::InvalidField {
            column,
            value: raw.to_string(),
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    const HEADER: &str = "order_id,customer_id,outlet_id,order_placed,order_confirmed,prep_started,prep_finished,served_time,status,num_items,total_price_lkr,payment_method,item_id,quantity,item_price_lkr,customer_name,contact_no,gender,age,join_date,loyalty_group,estimated_total_spent_lkr,outlet_name,borough,capacity,opened,menu_item_name,category,price_lkr,is_vegetarian,spice_level";

    const ROW: &str = "ORD1,CUST1,OUT1,2024-01-15T12:30:00,2024-01-15T12:31:00,2024-01-15T12:35:00,2024-01-15T12:55:30,2024-01-15T13:00:00,Completed,2,2450.50,Card,ITEM9,1,999,  Nimal Perera ,0771234567,m,34,2022-06-01T00:00:00,Gold,120000,Colombo 01,Colombo,80,2019-03-01T00:00:00,Kottu,Mains,1200.00,FALSE,Hot";

    fn csv_of(rows: &[&str]) -> String {
        let mut content = String::from(HEADER);
        for row in rows {
            content.push('\n');
            content.push_str(row);
        }
        content
    }

    #[test]
    fn test_parse_full_row() {
        let parsed = parse_csv_reader(csv_of(&[ROW]).as_bytes()).unwrap();
        assert_eq!(parsed.total_rows, 1);
        assert_eq!(parsed.parsed_rows, 1);
        assert_eq!(parsed.skipped_rows, 0);

        let order = &parsed.records[0];
        assert_eq!(order.order_id, "ORD1");
        assert_eq!(order.customer_id, "CUST1");
        assert_eq!(order.outlet_id, "OUT1");
        assert_eq!(
            order.order_placed,
            NaiveDate::from_ymd_opt(2024, 1, 15).unwrap().and_hms_opt(12, 30, 0)
        );
        assert_eq!(order.preparation_minutes(), Some(20));
        assert_eq!(order.status.as_deref(), Some("Completed"));
        assert_eq!(order.total_price_lkr, Some(2450.50));
        assert_eq!(order.item_price_lkr, Some(1200.0));
        assert_eq!(order.customer_name.as_deref(), Some("Nimal Perera"));
        assert_eq!(order.is_vegetarian, Some(false));
        assert_eq!(order.capacity, Some(80));
    }

    #[test]
    fn test_empty_cells_become_none() {
        let row = "ORD2,CUST1,OUT1,2024-01-15T12:30:00,,,,,,,,,,,,,,,,,,,,,,,,,,,";
        let parsed = parse_csv_reader(csv_of(&[row]).as_bytes()).unwrap();
        assert_eq!(parsed.parsed_rows, 1);

        let order = &parsed.records[0];
        assert!(order.prep_started.is_none());
        assert!(order.total_price_lkr.is_none());
        assert!(order.status.is_none());
        assert!(order.is_vegetarian.is_none());
    }

    #[test]
    fn test_bad_rows_are_skipped() {
        let short = "ORD3,CUST1,OUT1";
        let bad_price = ROW.replace("2450.50", "lots");
        let bad_time = ROW.replace("2024-01-15T12:30:00", "15/01/2024");
        let parsed =
            parse_csv_reader(csv_of(&[short, &bad_price, ROW, &bad_time]).as_bytes()).unwrap();

        assert_eq!(parsed.total_rows, 4);
        assert_eq!(parsed.parsed_rows, 1);
        assert_eq!(parsed.skipped_rows, 3);
    }

    #[test]
    fn test_non_finite_amounts_are_rejected() {
        let rows: Vec<String> = ["inf", "-infinity", "NaN"]
            .iter()
            .map(|amount| ROW.replace("2450.50", amount))
            .chain(std::iter::once(ROW.replace("120000", "inf")))
            .collect();
        let refs: Vec<&str> = rows.iter().map(String::as_str).collect();

        let parsed = parse_csv_reader(csv_of(&refs).as_bytes()).unwrap();
        assert_eq!(parsed.parsed_rows, 0);
        assert_eq!(parsed.skipped_rows, 4);

        let row = ROW.replace("2450.50", "inf");
        let record = StringRecord::from(row.split(',').collect::<Vec<_>>());
        let err = parse_row(&record).unwrap_err();
        assert!(matches!(
            err,
            IngestError::InvalidField { column: "total_price_lkr", .. }
        ));
    }

    #[test]
    fn test_space_separated_timestamps_accepted() {
        let row = ROW.replace("2024-01-15T12:30:00", "2024-01-15 12:30:00");
        let parsed = parse_csv_reader(csv_of(&[&row]).as_bytes()).unwrap();
        assert_eq!(parsed.parsed_rows, 1);
    }

    #[test]
    fn test_more_rows_than_one_chunk() {
        let rows: Vec<String> = (0..CHUNK_SIZE + 5)
            .map(|i| ROW.replacen("ORD1", &format!("ORD{i}"), 1))
            .collect();
        let refs: Vec<&str> = rows.iter().map(String::as_str).collect();

        let parsed = parse_csv_reader(csv_of(&refs).as_bytes()).unwrap();
        assert_eq!(parsed.parsed_rows, CHUNK_SIZE + 5);
        assert_eq!(parsed.records.last().unwrap().order_id, format!("ORD{}", CHUNK_SIZE + 4));
    }

    #[test]
    fn test_unreadable_header_is_an_error() {
        let mut content = b"order_id,\xff\n".to_vec();
        content.extend_from_slice(ROW.as_bytes());

        let err = parse_csv_reader(content.as_slice()).unwrap_err();
        assert!(matches!(err, IngestError::Csv(_)));
    }

    #[test]
    fn test_header_only() {
        let parsed = parse_csv_reader(HEADER.as_bytes()).unwrap();
        assert_eq!(parsed.total_rows, 0);
        assert!(parsed.records.is_empty());
    }
}
