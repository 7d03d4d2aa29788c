// src/data_input/log_parser.rs

use chrono::{Duration, NaiveDateTime};
use csv::{ReaderBuilder, StringRecord};
use std::fs;
use std::path::Path;
use tracing::{info, warn};

use crate::config::ColumnConfig;
use crate::data_input::log_data::LogRowData;
use crate::error::BodeError;

const UTF8_BOM: &[u8] = &[0xEF, 0xBB, 0xBF];

/// Text encodings tried, in order, when reading a log file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceEncoding {
    Utf8,
    Utf8WithBom,
    Latin1,
}

impl SourceEncoding {
    pub fn label(&self) -> &'static str {
        match self {
            SourceEncoding::Utf8 => "utf-8",
            SourceEncoding::Utf8WithBom => "utf-8-sig",
            SourceEncoding::Latin1 => "latin-1",
        }
    }
}

/// Result of parsing a log file.
#[derive(Debug, Clone)]
pub struct ParsedLog {
    pub rows: Vec<LogRowData>,
    pub headers: Vec<String>,
    pub encoding: SourceEncoding,
    /// Rows dropped because a required field was missing or invalid
    pub skipped_rows: usize,
}

/// Decodes raw file bytes, trying UTF-8 (with or without BOM) first and falling back to Latin-1.
///
/// Latin-1 maps every byte to a character, so decoding only fails for empty input.
pub fn decode_log_bytes(bytes: &[u8]) -> Option<(String, SourceEncoding)> {
    if bytes.is_empty() {
        return None;
    }
    if let Some(rest) = bytes.strip_prefix(UTF8_BOM) {
        if let Ok(text) = std::str::from_utf8(rest) {
            return Some((text.to_string(), SourceEncoding::Utf8WithBom));
        }
    }
    if let Ok(text) = std::str::from_utf8(bytes) {
        return Some((text.to_string(), SourceEncoding::Utf8));
    }
    Some((bytes.iter().map(|&b| b as char).collect(), SourceEncoding::Latin1))
}

/// Parses a number written with either a decimal comma or a decimal point.
pub fn parse_decimal(raw: &str) -> Option<f64> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }
    let normalized = trimmed.replace(',', ".");
    normalized.parse::<f64>().ok().filter(|v| v.is_finite())
}

/// Parses a period typed by the user, e.g. `6` or `2,5`.
pub fn parse_period_input(raw: &str) -> Result<f64, BodeError> {
    parse_decimal(raw).ok_or_else(|| BodeError::InvalidPeriodInput(raw.trim().to_string()))
}

/// Parses a timestamp such as `10/05/2024 - 14:03:07,250`.
///
/// `format` covers everything up to whole seconds; an optional fraction follows
/// `fraction_separator` and may carry any number of digits (nanosecond resolution).
pub fn parse_timestamp(raw: &str, format: &str, fraction_separator: char) -> Option<NaiveDateTime> {
    let trimmed = raw.trim();
    if let Ok(parsed) = NaiveDateTime::parse_from_str(trimmed, format) {
        return Some(parsed);
    }

    let (head, fraction) = trimmed.rsplit_once(fraction_separator)?;
    if fraction.is_empty() || !fraction.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    let whole = NaiveDateTime::parse_from_str(head.trim_end(), format).ok()?;

    let mut digits: String = fraction.chars().take(9).collect();
    while digits.len() < 9 {
        digits.push('0');
    }
    let nanos: i64 = digits.parse().ok()?;
    Some(whole + Duration::nanoseconds(nanos))
}

fn column_index(headers: &StringRecord, name: &str) -> Option<usize> {
    headers.iter().position(|h| h.trim() == name)
}

/// Parses decoded CSV text into rows with elapsed time relative to the first valid row.
pub fn parse_log_str(
    content: &str,
    columns: &ColumnConfig,
) -> Result<(Vec<LogRowData>, Vec<String>, usize), BodeError> {
    let mut reader = ReaderBuilder::new()
        .delimiter(columns.delimiter_byte()?)
        .has_headers(true)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(content.as_bytes());

    let header_record = reader.headers()?.clone();
    let headers: Vec<String> = header_record.iter().map(|h| h.trim().to_string()).collect();
    println!("Headers found in CSV: {:?}", headers);

    // --- Header Definition and Index Mapping ---
    let mut indices = [0usize; 4];
    println!("Header mapping status:");
    for (slot, name) in columns.required_columns().iter().enumerate() {
        match column_index(&header_record, name) {
            Some(i) => {
                println!("  '{}': Found", name);
                indices[slot] = i;
            }
            None => {
                println!("  '{}': Not Found (ESSENTIAL, MISSING!)", name);
                return Err(BodeError::MissingColumn {
                    column: name.to_string(),
                    found: headers,
                });
            }
        }
    }

    let mut rows: Vec<LogRowData> = Vec::new();
    let mut first_timestamp: Option<NaiveDateTime> = None;
    let mut skipped_rows = 0usize;

    for (row_index, result) in reader.records().enumerate() {
        // Header is line 1
        let line = row_index + 2;
        let record = match result {
            Ok(record) => record,
            Err(e) => {
                warn!("Skipping line {} due to CSV read error: {}", line, e);
                skipped_rows += 1;
                continue;
            }
        };

        match parse_row(&record, line, columns, indices) {
            Ok((timestamp, period_s, setpoint, controlled)) => {
                let t0 = *first_timestamp.get_or_insert(timestamp);
                rows.push(LogRowData {
                    timestamp,
                    time_sec: elapsed_seconds(t0, timestamp),
                    period_s,
                    setpoint,
                    controlled,
                });
            }
            Err(e) => {
                warn!("Skipping {}", e);
                skipped_rows += 1;
            }
        }
    }

    Ok((rows, headers, skipped_rows))
}

fn parse_row(
    record: &StringRecord,
    line: usize,
    columns: &ColumnConfig,
    [timestamp_idx, period_idx, setpoint_idx, controlled_idx]: [usize; 4],
) -> Result<(NaiveDateTime, f64, f64, f64), BodeError> {
    let raw_timestamp = record.get(timestamp_idx).unwrap_or("");
    let timestamp = parse_timestamp(
        raw_timestamp,
        &columns.timestamp_format,
        columns.fraction_separator,
    )
    .ok_or_else(|| BodeError::Timestamp {
        row: line,
        value: raw_timestamp.to_string(),
    })?;

    let number = |idx: usize, name: &str| -> Result<f64, BodeError> {
        let raw = record.get(idx).unwrap_or("");
        parse_decimal(raw).ok_or_else(|| BodeError::Value {
            row: line,
            column: name.to_string(),
            value: raw.to_string(),
        })
    };

    Ok((
        timestamp,
        number(period_idx, &columns.period)?,
        number(setpoint_idx, &columns.setpoint)?,
        number(controlled_idx, &columns.controlled)?,
    ))
}

fn elapsed_seconds(start: NaiveDateTime, at: NaiveDateTime) -> f64 {
    let delta = at - start;
    match delta.num_nanoseconds() {
        Some(ns) => ns as f64 / 1e9,
        None => delta.num_milliseconds() as f64 / 1e3,
    }
}

/// Reads and parses the log file at `input_file_path`.
pub fn parse_log_file(
    input_file_path: &Path,
    columns: &ColumnConfig,
) -> Result<ParsedLog, BodeError> {
    println!("Reading file: {}...", input_file_path.display());

    let bytes = fs::read(input_file_path).map_err(|source| BodeError::Io {
        path: input_file_path.to_path_buf(),
        source,
    })?;
    let (content, encoding) =
        decode_log_bytes(&bytes).ok_or_else(|| BodeError::Decode(input_file_path.to_path_buf()))?;
    info!("decoded {} with encoding {}", input_file_path.display(), encoding.label());
    println!("File read with encoding: {}", encoding.label());

    let (rows, headers, skipped_rows) = parse_log_str(&content, columns)?;
    if skipped_rows > 0 {
        println!("Warning: {} rows skipped due to missing or invalid values.", skipped_rows);
    }
    println!("Finished reading {} data rows.", rows.len());

    if rows.is_empty() {
        return Err(BodeError::EmptyDataset);
    }

    Ok(ParsedLog {
        rows,
        headers,
        encoding,
        skipped_rows,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    const FORMAT: &str = "%d/%m/%Y - %H:%M:%S";

    #[test]
    fn test_parse_decimal_comma_and_point() {
        assert_eq!(parse_decimal("1,5"), Some(1.5));
        assert_eq!(parse_decimal(" -0.25 "), Some(-0.25));
        assert_eq!(parse_decimal("6"), Some(6.0));
        assert_eq!(parse_decimal(""), None);
        assert_eq!(parse_decimal("abc"), None);
        assert_eq!(parse_decimal("NaN"), None);
    }

    #[test]
    fn test_period_input() {
        assert_eq!(parse_period_input(" 2,5 ").unwrap(), 2.5);
        assert_eq!(parse_period_input("6").unwrap(), 6.0);
        match parse_period_input(" six ") {
            Err(e @ BodeError::InvalidPeriodInput(_)) => {
                assert_eq!(e.to_string(), "'six' is not a valid period in seconds");
            }
            other => panic!("expected InvalidPeriodInput, got {:?}", other),
        }
    }

    #[test]
    fn test_parse_timestamp_with_fraction() {
        let expected = NaiveDate::from_ymd_opt(2024, 5, 10)
            .and_then(|d| d.and_hms_milli_opt(14, 3, 7, 250))
            .unwrap();
        assert_eq!(parse_timestamp("10/05/2024 - 14:03:07,250", FORMAT, ','), Some(expected));
        assert_eq!(parse_timestamp("10/05/2024 - 14:03:07,25", FORMAT, ','), Some(expected));
        assert_eq!(
            parse_timestamp("10/05/2024 - 14:03:07,250000", FORMAT, ','),
            Some(expected)
        );
    }

    #[test]
    fn test_parse_timestamp_without_fraction() {
        let expected = NaiveDate::from_ymd_opt(2024, 5, 10)
            .and_then(|d| d.and_hms_opt(14, 3, 7))
            .unwrap();
        assert_eq!(parse_timestamp("10/05/2024 - 14:03:07", FORMAT, ','), Some(expected));
        assert_eq!(parse_timestamp("2024-05-10 14:03:07", FORMAT, ','), None);
        assert_eq!(parse_timestamp("10/05/2024 - 14:03:07,2x", FORMAT, ','), None);
    }

    #[test]
    fn test_decode_fallbacks() {
        let (text, enc) = decode_log_bytes("Período".as_bytes()).unwrap();
        assert_eq!(enc, SourceEncoding::Utf8);
        assert_eq!(text, "Período");

        let mut with_bom = UTF8_BOM.to_vec();
        with_bom.extend_from_slice("Período".as_bytes());
        let (text, enc) = decode_log_bytes(&with_bom).unwrap();
        assert_eq!(enc, SourceEncoding::Utf8WithBom);
        assert_eq!(text, "Período");

        // 'í' as a single Latin-1 byte
        let (text, enc) = decode_log_bytes(b"Per\xedodo").unwrap();
        assert_eq!(enc, SourceEncoding::Latin1);
        assert_eq!(text, "Período");

        assert!(decode_log_bytes(b"").is_none());
    }

    #[test]
    fn test_parse_log_str_elapsed_time_and_skips() {
        let content = "\
DataHora;Período;Setpoint;Variavel_Controlada
10/05/2024 - 14:00:00,000;6;0,0;1,5
10/05/2024 - 14:00:00,100;6;0,1;1,6
bad timestamp;6;0,2;1,7
10/05/2024 - 14:00:01,500;3;-0,5;x
10/05/2024 - 14:00:02,000;3;-0,5;0,25
";
        let (rows, headers, skipped) = parse_log_str(content, &ColumnConfig::default()).unwrap();
        assert_eq!(headers.len(), 4);
        assert_eq!(skipped, 2);
        assert_eq!(rows.len(), 3);
        assert_eq!(rows[0].time_sec, 0.0);
        assert!((rows[1].time_sec - 0.1).abs() < 1e-12);
        assert!((rows[2].time_sec - 2.0).abs() < 1e-12);
        assert_eq!(rows[2].period_s, 3.0);
        assert_eq!(rows[2].setpoint, -0.5);
        assert_eq!(rows[2].controlled, 0.25);
    }

    #[test]
    fn test_missing_column_lists_found_columns() {
        let content = "DataHora;Periodo;Setpoint;Variavel_Controlada\n";
        match parse_log_str(content, &ColumnConfig::default()) {
            Err(BodeError::MissingColumn { column, found }) => {
                assert_eq!(column, "Período");
                assert_eq!(found, vec!["DataHora", "Periodo", "Setpoint", "Variavel_Controlada"]);
            }
            other => panic!("expected missing column error, got {:?}", other),
        }
    }

    #[test]
    fn test_header_names_are_trimmed() {
        let content = " DataHora ; Período ;Setpoint;Variavel_Controlada \n10/05/2024 - 14:00:00,0;2;1;1\n";
        let (rows, _, _) = parse_log_str(content, &ColumnConfig::default()).unwrap();
        assert_eq!(rows.len(), 1);
    }
}
