// src/data_analysis/validation.rs

use std::fmt;

use crate::config::AnalysisConfig;

/// Why a point was rejected. Rejected points remain in the sweep table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RejectionReason {
    LowAmplitude,
    PoorFit,
    LowAmplitudeAndPoorFit,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    Accepted,
    Rejected(RejectionReason),
}

impl Verdict {
    pub fn is_accepted(&self) -> bool {
        matches!(self, Verdict::Accepted)
    }
}

impl fmt::Display for Verdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Verdict::Accepted => write!(f, "accepted"),
            Verdict::Rejected(RejectionReason::LowAmplitude) => {
                write!(f, "rejected: output amplitude too low")
            }
            Verdict::Rejected(RejectionReason::PoorFit) => write!(f, "rejected: poor fit (R²)"),
            Verdict::Rejected(RejectionReason::LowAmplitudeAndPoorFit) => {
                write!(f, "rejected: output amplitude too low and poor fit (R²)")
            }
        }
    }
}

/// Output quality gate: `amplitude >= amplitude_min && r_squared >= r2_min`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ValidationGate {
    pub amplitude_min: f64,
    pub r2_min: f64,
}

impl ValidationGate {
    pub fn new(amplitude_min: f64, r2_min: f64) -> Self {
        Self {
            amplitude_min,
            r2_min,
        }
    }

    pub fn from_config(config: &AnalysisConfig) -> Self {
        Self::new(config.amplitude_min, config.r2_min)
    }

    pub fn verdict(&self, output_amplitude: f64, output_r_squared: f64) -> Verdict {
        // NaN compares false and is therefore rejected
        let enough_amplitude = output_amplitude >= self.amplitude_min;
        let good_fit = output_r_squared >= self.r2_min;

        match (enough_amplitude, good_fit) {
            (true, true) => Verdict::Accepted,
            (false, true) => Verdict::Rejected(RejectionReason::LowAmplitude),
            (true, false) => Verdict::Rejected(RejectionReason::PoorFit),
            (false, false) => Verdict::Rejected(RejectionReason::LowAmplitudeAndPoorFit),
        }
    }

    pub fn accepts(&self, output_amplitude: f64, output_r_squared: f64) -> bool {
        self.verdict(output_amplitude, output_r_squared).is_accepted()
    }
}

impl Default for ValidationGate {
    fn default() -> Self {
        Self::from_config(&AnalysisConfig::default())
    }
}
