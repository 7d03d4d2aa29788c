// src/data_analysis/frequency_response.rs

use crate::constants::GAIN_FLOOR_DB;
use crate::data_analysis::sinusoid_fit::SinusoidFitOutcome;
use crate::data_analysis::validation::{ValidationGate, Verdict};

/// Gain, phase and delay of the output relative to the input at one excitation period.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrequencyResponse {
    pub period_s: f64,
    pub frequency_hz: f64,
    /// 20·log10(output amplitude / input amplitude)
    pub gain_db: f64,
    /// Output phase minus input phase, normalized to (-180, 180]
    pub phase_deg: f64,
    /// Positive when the output lags the input
    pub delay_s: f64,
    pub input_amplitude: f64,
    pub output_amplitude: f64,
    pub input_r_squared: f64,
    pub output_r_squared: f64,
}

/// A response classified by the validation gate. The verdict is fixed at construction.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrequencyResponsePoint {
    response: FrequencyResponse,
    verdict: Verdict,
}

impl FrequencyResponsePoint {
    pub fn classify(response: FrequencyResponse, gate: &ValidationGate) -> Self {
        let verdict = gate.verdict(response.output_amplitude, response.output_r_squared);
        Self { response, verdict }
    }

    pub fn response(&self) -> &FrequencyResponse {
        &self.response
    }

    pub fn verdict(&self) -> Verdict {
        self.verdict
    }

    pub fn is_accepted(&self) -> bool {
        self.verdict.is_accepted()
    }

    pub fn frequency_hz(&self) -> f64 {
        self.response.frequency_hz
    }

    pub fn gain_db(&self) -> f64 {
        self.response.gain_db
    }

    pub fn phase_deg(&self) -> f64 {
        self.response.phase_deg
    }

    pub fn delay_s(&self) -> f64 {
        self.response.delay_s
    }

    pub fn output_r_squared(&self) -> f64 {
        self.response.output_r_squared
    }
}

/// Maps an angle in degrees onto the half-open interval (-180, 180].
///
/// Values already inside the interval are returned unchanged, so the mapping is idempotent.
/// Non-finite input is passed through.
pub fn normalize_phase_deg(phase_deg: f64) -> f64 {
    if !phase_deg.is_finite() || (phase_deg > -180.0 && phase_deg <= 180.0) {
        return phase_deg;
    }

    let wrapped = (phase_deg + 180.0).rem_euclid(360.0) - 180.0;
    if wrapped <= -180.0 {
        180.0
    } else {
        wrapped
    }
}

/// Gain in dB of `output_amplitude / input_amplitude`.
///
/// 0.0 when the input amplitude is zero (no excitation; callers filter this case out)
/// and `GAIN_FLOOR_DB` when the output amplitude is zero.
pub fn gain_db(input_amplitude: f64, output_amplitude: f64) -> f64 {
    if input_amplitude <= 0.0 {
        return 0.0;
    }
    let ratio = output_amplitude / input_amplitude;
    if ratio > 0.0 {
        20.0 * ratio.log10()
    } else {
        GAIN_FLOOR_DB
    }
}

/// Time delay implied by a normalized phase difference at the given period.
/// A phase of -90° at 4 s is a 1 s lag.
pub fn phase_to_delay_s(phase_deg: f64, period_s: f64) -> f64 {
    -(phase_deg / 360.0) * period_s
}

/// Combines the input and output fits taken at the same frequency.
pub fn build_response(
    period_s: f64,
    input: &SinusoidFitOutcome,
    output: &SinusoidFitOutcome,
) -> FrequencyResponse {
    let raw_phase_deg = (output.phase_rad() - input.phase_rad()).to_degrees();
    let phase_deg = normalize_phase_deg(raw_phase_deg);

    FrequencyResponse {
        period_s,
        frequency_hz: 1.0 / period_s,
        gain_db: gain_db(input.amplitude(), output.amplitude()),
        phase_deg,
        delay_s: phase_to_delay_s(phase_deg, period_s),
        input_amplitude: input.amplitude(),
        output_amplitude: output.amplitude(),
        input_r_squared: input.r_squared(),
        output_r_squared: output.r_squared(),
    }
}
