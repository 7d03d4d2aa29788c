// src/types.rs

/// (time or frequency, value) pairs ready for a plotters series
pub type PlotPoints = Vec<(f64, f64)>;
