// src/data_analysis/mod.rs

pub mod frequency_response;
pub mod sinusoid_fit;
pub mod sweep;
pub mod validation;
pub mod window;

// src/data_analysis/mod.rs
