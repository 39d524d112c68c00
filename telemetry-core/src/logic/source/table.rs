//! Table ingestion (CSV / spreadsheet)
//!
//! Dùng chung cho file source và upload: nhận bytes + tên file, trả về
//! RawBatch sau khi kiểm tra các cột bắt buộc.

use base64::Engine;
use calamine::{open_workbook_auto_from_rs, Data, DataType, Reader};
use serde_json::{Number, Value};
use std::io::Cursor;
use std::path::Path;

use crate::logic::error::IngestError;
use crate::logic::normalize::alias;
use crate::logic::types::{RawBatch, RawRecord};

// ============================================================================
// FORMAT
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TableFormat {
    /// Comma / tab / semicolon separated text
    Delimited,
    /// xlsx, xls, xlsm, ods
    Workbook,
}

impl TableFormat {
    /// Pick the decoder from the file extension
    pub fn from_filename(filename: &str) -> Result<Self, IngestError> {
        let ext = Path::new(filename)
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_ascii_lowercase())
            .unwrap_or_default();

        match ext.as_str() {
            "csv" | "tsv" | "txt" => Ok(TableFormat::Delimited),
            "xlsx" | "xls" | "xlsm" | "xlsb" | "ods" => Ok(TableFormat::Workbook),
            _ => Err(IngestError::UnsupportedFormat(filename.to_string())),
        }
    }
}

/// Parsed table, ready for the normalizer
#[derive(Debug, Clone, PartialEq)]
pub struct Table {
    pub columns: Vec<String>,
    pub records: RawBatch,
}

// ============================================================================
// ENTRY POINTS
// ============================================================================

/// Decode an upload payload: a `data:` URL or bare base64
pub fn decode_contents(contents: &str) -> Result<Vec<u8>, IngestError> {
    let payload = match contents.split_once(',') {
        Some((header, body)) if header.starts_with("data:") => body,
        _ => contents,
    };

    let cleaned: String = payload.chars().filter(|c| !c.is_ascii_whitespace()).collect();
    base64::engine::general_purpose::STANDARD
        .decode(cleaned.as_bytes())
        .map_err(|e| IngestError::Decode(e.to_string()))
}

/// Parse a table and check the required columns. Nothing is returned on error.
pub fn parse_table(filename: &str, bytes: &[u8], required: &[String]) -> Result<Table, IngestError> {
    let table = match TableFormat::from_filename(filename)? {
        TableFormat::Delimited => parse_delimited(bytes)?,
        TableFormat::Workbook => parse_workbook(bytes)?,
    };

    check_required(&table.columns, required)?;
    Ok(table)
}

/// Required columns absent from `columns`. A column counts when it matches
/// case-insensitively or both names resolve to the same field alias.
pub fn missing_columns(columns: &[String], required: &[String]) -> Vec<String> {
    required
        .iter()
        .filter(|req| {
            let req_field = alias::resolve(req);
            !columns.iter().any(|col| {
                col.trim().eq_ignore_ascii_case(req.trim())
                    || (req_field.is_some() && alias::resolve(col) == req_field)
            })
        })
        .cloned()
        .collect()
}

fn check_required(columns: &[String], required: &[String]) -> Result<(), IngestError> {
    let missing = missing_columns(columns, required);
    if missing.is_empty() {
        Ok(())
    } else {
        Err(IngestError::MissingColumns(missing))
    }
}

// ============================================================================
// DELIMITED TEXT
// ============================================================================

fn parse_delimited(bytes: &[u8]) -> Result<Table, IngestError> {
    let text = std::str::from_utf8(bytes)
        .map(str::to_string)
        .unwrap_or_else(|_| String::from_utf8_lossy(bytes).into_owned());
    let text = text.trim_start_matches('\u{feff}').trim_start_matches(['\r', '\n']);

    let delimiter = sniff_delimiter(text);
    let mut reader = csv::ReaderBuilder::new()
        .delimiter(delimiter)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(text.as_bytes());

    let columns: Vec<String> = reader
        .headers()
        .map_err(|e| IngestError::Parse(e.to_string()))?
        .iter()
        .map(str::to_string)
        .collect();

    let mut records = RawBatch::new();
    for row in reader.records() {
        let row = row.map_err(|e| IngestError::Parse(e.to_string()))?;
        let record: RawRecord = columns
            .iter()
            .zip(row.iter())
            .filter(|(col, cell)| !col.is_empty() && !cell.is_empty())
            .map(|(col, cell)| (col.clone(), Value::String(cell.to_string())))
            .collect();

        if !record.is_empty() {
            records.push(record);
        }
    }

    Ok(Table { columns, records })
}

/// Pick the separator that splits the header line into the most columns
fn sniff_delimiter(text: &str) -> u8 {
    let header = text.lines().next().unwrap_or_default();
    [b',', b'\t', b';']
        .into_iter()
        .max_by_key(|d| header.matches(*d as char).count())
        .filter(|d| header.contains(*d as char))
        .unwrap_or(b',')
}

// ============================================================================
// WORKBOOK
// ============================================================================

fn parse_workbook(bytes: &[u8]) -> Result<Table, IngestError> {
    let mut workbook = open_workbook_auto_from_rs(Cursor::new(bytes.to_vec()))
        .map_err(|e| IngestError::Parse(e.to_string()))?;

    let range = workbook
        .worksheet_range_at(0)
        .ok_or_else(|| IngestError::Parse("workbook has no sheets".to_string()))?
        .map_err(|e| IngestError::Parse(e.to_string()))?;

    let mut rows = range.rows();
    let columns: Vec<String> = match rows.next() {
        Some(header) => header.iter().map(|c| cell_text(c).unwrap_or_default()).collect(),
        None => return Ok(Table { columns: Vec::new(), records: Vec::new() }),
    };

    let records = rows
        .map(|row| {
            columns
                .iter()
                .zip(row.iter())
                .filter(|(col, _)| !col.is_empty())
                .filter_map(|(col, cell)| cell_value(cell).map(|v| (col.clone(), v)))
                .collect::<RawRecord>()
        })
        .filter(|record| !record.is_empty())
        .collect();

    Ok(Table { columns, records })
}

fn cell_text(cell: &Data) -> Option<String> {
    match cell_value(cell)? {
        Value::String(s) => Some(s),
        other => Some(other.to_string()),
    }
}

/// Cell -> JSON. Date cells become `YYYY-MM-DD HH:MM:SS` strings.
fn cell_value(cell: &Data) -> Option<Value> {
    match cell {
        Data::Empty | Data::Error(_) => None,
        Data::String(s) if s.trim().is_empty() => None,
        Data::String(s) => Some(Value::String(s.trim().to_string())),
        Data::Int(i) => Some(Value::Number(Number::from(*i))),
        Data::Float(f) => Number::from_f64(*f).map(Value::Number),
        Data::Bool(b) => Some(Value::Bool(*b)),
        Data::DateTimeIso(s) | Data::DurationIso(s) => Some(Value::String(s.clone())),
        Data::DateTime(_) => cell
            .as_datetime()
            .map(|dt| Value::String(dt.format("%Y-%m-%d %H:%M:%S").to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn required() -> Vec<String> {
        ["event_type", "CPU", "MEM", "TEMP", "FPS"].iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_format_from_filename() {
        assert_eq!(TableFormat::from_filename("log.CSV").unwrap(), TableFormat::Delimited);
        assert_eq!(TableFormat::from_filename("log.xlsx").unwrap(), TableFormat::Workbook);
        assert!(matches!(
            TableFormat::from_filename("log.pdf"),
            Err(IngestError::UnsupportedFormat(_))
        ));
    }

    #[test]
    fn test_decode_data_url() {
        let url = "data:text/csv;base64,YSxiCjEsMgo=";
        assert_eq!(decode_contents(url).unwrap(), b"a,b\n1,2\n");
        assert_eq!(decode_contents("YSxiCjEsMgo=").unwrap(), b"a,b\n1,2\n");
        assert!(matches!(decode_contents("data:x;base64,@@@"), Err(IngestError::Decode(_))));
    }

    #[test]
    fn test_parse_csv_with_required_columns() {
        let csv = "\u{feff}timestamp,event_type,CPU,MEM,TEMP,FPS\n\
                   2025-03-26 13:04:52,system_stats,40.3,55.1,61.2°C,24\n\
                   2025-03-26 13:04:53,detection,NaN,NaN,NaN,NaN\n";

        let table = parse_table("log.csv", csv.as_bytes(), &required()).unwrap();

        assert_eq!(table.columns.len(), 6);
        assert_eq!(table.records.len(), 2);
        assert_eq!(table.records[0]["TEMP"], "61.2°C");
    }

    #[test]
    fn test_semicolon_and_alias_columns() {
        let csv = "time;type;cpu_usage;memory;temperature;frame_rate\n\
                   2025-03-26 13:04:52;system_stats;40;50;60;30\n";

        let table = parse_table("log.csv", csv.as_bytes(), &required()).unwrap();
        assert_eq!(table.records[0]["cpu_usage"], "40");
    }

    #[test]
    fn test_missing_columns_imports_nothing() {
        let csv = "timestamp,event_type,CPU\n2025-03-26 13:04:52,system_stats,40\n";

        let err = parse_table("log.csv", csv.as_bytes(), &required()).unwrap_err();
        assert_eq!(
            err,
            IngestError::MissingColumns(vec!["MEM".into(), "TEMP".into(), "FPS".into()])
        );
    }

    #[test]
    fn test_tab_delimited() {
        let tsv = "timestamp\tCPU\n2025-03-26 13:04:52\t12\n";
        let table = parse_table("log.tsv", tsv.as_bytes(), &[]).unwrap();
        assert_eq!(table.columns, vec!["timestamp", "CPU"]);
    }

    #[test]
    fn test_garbage_workbook_is_parse_error() {
        let err = parse_table("log.xlsx", b"not a zip archive", &[]).unwrap_err();
        assert!(matches!(err, IngestError::Parse(_)));
    }
}
