// src/data_input/log_data.rs

use chrono::NaiveDateTime;

/// Structure to hold data parsed from a single row of the CSV log.
/// Rows with a missing or unparseable field are skipped by the parser, so every field is present.
#[derive(Debug, Clone, PartialEq)]
pub struct LogRowData {
    pub timestamp: NaiveDateTime, // Absolute timestamp as logged.
    pub time_sec: f64,            // Seconds since the first valid row.
    pub period_s: f64,            // Excitation period of the test this row belongs to.
    pub setpoint: f64,            // Input (setpoint) signal.
    pub controlled: f64,          // Output (controlled variable) signal.
}

// src/data_input/log_data.rs
