// src/plot_functions/mod.rs

pub mod plot_bode;
pub mod plot_period_fit;

// src/plot_functions/mod.rs
