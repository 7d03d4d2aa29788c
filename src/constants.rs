// src/constants.rs

// Import specific colors needed
use plotters::style::colors::full_palette::{BLUE, LIGHTBLUE, ORANGE, RED};
use plotters::style::RGBColor;

// Plot dimensions.
pub const PLOT_WIDTH: u32 = 1600;
pub const PLOT_HEIGHT: u32 = 1000;

// --- Analysis Defaults ---
pub const DEFAULT_WINDOW_S: f64 = 30.0; // Trailing seconds of each excitation period used for fitting
pub const MIN_WINDOW_SAMPLES: usize = 10; // Fewer samples than this and the period is skipped
pub const DEFAULT_AMPLITUDE_MIN: f64 = 0.05; // Output amplitude below this means no relevant excitation
pub const DEFAULT_R2_MIN: f64 = 0.85; // Minimum output fit quality (0 to 1)

// Gain reported when the output ratio is not positive (mirrors a PSD floor).
pub const GAIN_FLOOR_DB: f64 = -100.0;

// Two periods closer than this are treated as the same excitation group.
pub const PERIOD_MATCH_TOLERANCE_S: f64 = 1e-9;

// --- Input File Defaults ---
pub const DEFAULT_INPUT_FILE: &str = "dados.csv";
pub const DEFAULT_DELIMITER: char = ';';
pub const DEFAULT_TIMESTAMP_FORMAT: &str = "%d/%m/%Y - %H:%M:%S";
pub const DEFAULT_FRACTION_SEPARATOR: char = ',';

pub const COLUMN_TIMESTAMP: &str = "DataHora";
pub const COLUMN_PERIOD: &str = "Período";
pub const COLUMN_SETPOINT: &str = "Setpoint";
pub const COLUMN_CONTROLLED: &str = "Variavel_Controlada";

// --- Font Sizes ---
pub const FONT_SIZE_MAIN_TITLE: i32 = 26;
pub const FONT_SIZE_CHART_TITLE: i32 = 20;
pub const FONT_SIZE_AXIS_LABEL: i32 = 15;
pub const FONT_SIZE_LEGEND: i32 = 15;
pub const FONT_SIZE_MESSAGE: i32 = 18;

// --- Plot Color Assignments ---
pub const COLOR_BODE_ACCEPTED: &RGBColor = &BLUE;
pub const COLOR_BODE_REJECTED: &RGBColor = &RED;
pub const BODE_REJECTED_ALPHA: f64 = 0.5;
pub const COLOR_INPUT_RAW: &RGBColor = &LIGHTBLUE;
pub const COLOR_INPUT_FIT: &RGBColor = &RGBColor(0, 0, 128); // navy
pub const COLOR_OUTPUT_RAW: &RGBColor = &ORANGE;
pub const COLOR_OUTPUT_FIT: &RGBColor = &RED;
pub const RAW_SIGNAL_ALPHA: f64 = 0.5;

// Stroke widths for lines
pub const LINE_WIDTH_PLOT: u32 = 2;
pub const LINE_WIDTH_RAW: u32 = 1;
pub const LINE_WIDTH_LEGEND: u32 = 2;

// Marker sizes (pixels) for Bode points.
pub const MARKER_SIZE_ACCEPTED: i32 = 5;
pub const MARKER_SIZE_REJECTED: i32 = 6;

// src/constants.rs
