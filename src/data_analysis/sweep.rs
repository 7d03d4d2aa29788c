// src/data_analysis/sweep.rs

use thiserror::Error;
use tracing::{debug, warn};

use crate::config::AnalysisConfig;
use crate::data_analysis::frequency_response::{
    build_response, FrequencyResponse, FrequencyResponsePoint,
};
use crate::data_analysis::sinusoid_fit::{fit_sinusoid, SinusoidFitOutcome};
use crate::data_analysis::validation::ValidationGate;
use crate::data_analysis::window::{select_trailing_window, SteadyStateWindow, WindowSelection};
use crate::data_input::dataset::{ExcitationGroup, SampleSeries};

/// Why an excitation group produced no frequency response point.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SkipReason {
    #[error("period {0}s is not a positive number")]
    InvalidPeriod(f64),
    #[error("only {available} samples in the analysis window (minimum {required})")]
    InsufficientSamples { available: usize, required: usize },
    #[error("input signal has zero amplitude (no excitation)")]
    NoExcitation,
}

/// Frequency response points ordered by ascending frequency.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FrequencyResponseTable {
    points: Vec<FrequencyResponsePoint>,
}

impl FrequencyResponseTable {
    /// Sorts the points by frequency; input order does not matter.
    pub fn from_points(mut points: Vec<FrequencyResponsePoint>) -> Self {
        points.sort_by(|a, b| {
            a.frequency_hz()
                .partial_cmp(&b.frequency_hz())
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        Self { points }
    }

    pub fn points(&self) -> &[FrequencyResponsePoint] {
        &self.points
    }

    pub fn accepted(&self) -> Vec<&FrequencyResponsePoint> {
        self.points.iter().filter(|p| p.is_accepted()).collect()
    }

    pub fn rejected(&self) -> Vec<&FrequencyResponsePoint> {
        self.points.iter().filter(|p| !p.is_accepted()).collect()
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, FrequencyResponsePoint> {
        self.points.iter()
    }
}

impl<'a> IntoIterator for &'a FrequencyResponseTable {
    type Item = &'a FrequencyResponsePoint;
    type IntoIter = std::slice::Iter<'a, FrequencyResponsePoint>;

    fn into_iter(self) -> Self::IntoIter {
        self.points.iter()
    }
}

/// Window, fits and response for one excitation period, kept for plotting.
#[derive(Debug, Clone, PartialEq)]
pub struct PeriodAnalysis {
    pub window: SteadyStateWindow,
    pub input_fit: SinusoidFitOutcome,
    pub output_fit: SinusoidFitOutcome,
    pub response: FrequencyResponse,
}

impl PeriodAnalysis {
    pub fn input_series(&self) -> SampleSeries {
        SampleSeries::new(self.window.time.clone(), self.window.setpoint.clone())
    }

    pub fn output_series(&self) -> SampleSeries {
        SampleSeries::new(self.window.time.clone(), self.window.controlled.clone())
    }

    pub fn fitted_input_series(&self) -> SampleSeries {
        SampleSeries::new(self.window.time.clone(), self.input_fit.fitted_signal())
    }

    pub fn fitted_output_series(&self) -> SampleSeries {
        SampleSeries::new(self.window.time.clone(), self.output_fit.fitted_signal())
    }
}

/// Runs the window, fit and response steps shared by both modes.
fn evaluate_group(
    group: &ExcitationGroup,
    config: &AnalysisConfig,
) -> Result<PeriodAnalysis, SkipReason> {
    let frequency_hz = group
        .frequency_hz()
        .ok_or(SkipReason::InvalidPeriod(group.period_s))?;

    let window = match select_trailing_window(group, config.window_s, config.min_window_samples) {
        WindowSelection::Selected(window) => window,
        WindowSelection::Insufficient {
            available,
            required,
        } => {
            return Err(SkipReason::InsufficientSamples {
                available,
                required,
            })
        }
    };

    let input_fit = fit_sinusoid(window.time.view(), window.setpoint.view(), frequency_hz);
    let output_fit = fit_sinusoid(window.time.view(), window.controlled.view(), frequency_hz);

    // Degenerate fits report zero amplitude and land here too.
    if input_fit.amplitude() <= 0.0 {
        return Err(SkipReason::NoExcitation);
    }

    let response = build_response(group.period_s, &input_fit, &output_fit);

    Ok(PeriodAnalysis {
        window,
        input_fit,
        output_fit,
        response,
    })
}

/// Builds the frequency response table for every excitation group.
///
/// Groups with an invalid period, too few window samples or no input excitation are
/// left out. Every other group yields a point, accepted or rejected by the gate.
pub fn analyze_sweep(
    groups: &[ExcitationGroup],
    config: &AnalysisConfig,
) -> FrequencyResponseTable {
    let gate = ValidationGate::from_config(config);
    let mut points = Vec::with_capacity(groups.len());

    for group in groups {
        match evaluate_group(group, config) {
            Ok(analysis) => {
                points.push(FrequencyResponsePoint::classify(analysis.response, &gate));
            }
            Err(reason) => {
                debug!(period_s = group.period_s, %reason, "skipping excitation group");
            }
        }
    }

    FrequencyResponseTable::from_points(points)
}

/// Analyzes a single excitation period without applying the quality gate.
pub fn analyze_period(
    group: &ExcitationGroup,
    config: &AnalysisConfig,
) -> Result<PeriodAnalysis, SkipReason> {
    evaluate_group(group, config).map_err(|reason| {
        warn!(period_s = group.period_s, %reason, "period cannot be analyzed");
        reason
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use ndarray::Array1;
    use std::f64::consts::PI;

    fn sine_group(
        period_s: f64,
        start_s: f64,
        duration_s: f64,
        output_gain: f64,
        output_phase: f64,
    ) -> ExcitationGroup {
        let n = (duration_s * 10.0).round() as usize;
        let time: Array1<f64> = (0..n).map(|i| start_s + i as f64 / 10.0).collect();
        let w = 2.0 * PI / period_s;
        let setpoint = time.mapv(|t| (w * t).sin());
        let controlled = time.mapv(|t| output_gain * (w * t + output_phase).sin());
        ExcitationGroup::new(period_s, time, setpoint, controlled)
    }

    #[test]
    fn test_table_is_sorted_by_frequency() {
        let groups = vec![
            sine_group(8.0, 0.0, 60.0, 0.9, -0.3),
            sine_group(4.0, 60.0, 60.0, 0.7, -0.6),
            sine_group(2.0, 120.0, 60.0, 0.4, -1.2),
        ];

        let table = analyze_sweep(&groups, &AnalysisConfig::default());
        let freqs: Vec<f64> = table.iter().map(|p| p.frequency_hz()).collect();
        assert_eq!(freqs.len(), 3);
        assert_relative_eq!(freqs[0], 0.125, epsilon = 1e-12);
        assert_relative_eq!(freqs[1], 0.25, epsilon = 1e-12);
        assert_relative_eq!(freqs[2], 0.5, epsilon = 1e-12);
        assert_eq!(table.accepted().len(), 3);
    }

    #[test]
    fn test_invalid_and_short_groups_are_skipped() {
        let groups = vec![
            sine_group(0.0, 0.0, 60.0, 1.0, 0.0),
            sine_group(-4.0, 0.0, 60.0, 1.0, 0.0),
            sine_group(4.0, 0.0, 0.5, 1.0, 0.0),
            sine_group(6.0, 0.0, 60.0, 1.0, 0.0),
        ];

        let table = analyze_sweep(&groups, &AnalysisConfig::default());
        assert_eq!(table.len(), 1);
        assert_relative_eq!(table.points()[0].frequency_hz(), 1.0 / 6.0, epsilon = 1e-12);
    }

    #[test]
    fn test_constant_input_is_no_excitation() {
        let mut group = sine_group(5.0, 0.0, 60.0, 1.0, 0.0);
        group.setpoint.fill(20.0);

        assert_eq!(
            analyze_period(&group, &AnalysisConfig::default()),
            Err(SkipReason::NoExcitation)
        );
        assert!(analyze_sweep(&[group], &AnalysisConfig::default()).is_empty());
    }

    #[test]
    fn test_rejected_points_are_kept() {
        let groups = vec![
            sine_group(6.0, 0.0, 60.0, 1.0, -0.5),
            // Output far below the amplitude threshold
            sine_group(3.0, 60.0, 60.0, 0.01, -0.5),
        ];

        let table = analyze_sweep(&groups, &AnalysisConfig::default());
        assert_eq!(table.len(), 2);
        assert_eq!(table.accepted().len(), 1);
        assert_eq!(table.rejected().len(), 1);
        assert_relative_eq!(table.rejected()[0].frequency_hz(), 1.0 / 3.0, epsilon = 1e-12);
    }

    #[test]
    fn test_period_analysis_exposes_series() {
        let group = sine_group(6.0, 0.0, 60.0, 0.5, -PI / 2.0);
        let analysis = analyze_period(&group, &AnalysisConfig::default()).unwrap();

        let raw = analysis.output_series();
        let fitted = analysis.fitted_output_series();
        assert_eq!(raw.len(), fitted.len());
        assert_eq!(analysis.input_series().len(), analysis.window.len());
        for (r, f) in raw.values.iter().zip(fitted.values.iter()) {
            assert_relative_eq!(*r, *f, epsilon = 1e-9);
        }
        assert_relative_eq!(analysis.response.delay_s, 1.5, epsilon = 1e-9);
    }

    #[test]
    fn test_window_config_is_honoured() {
        let group = sine_group(6.0, 0.0, 60.0, 0.5, -PI / 2.0);
        let config = AnalysisConfig {
            window_s: 12.0,
            ..AnalysisConfig::default()
        };
        let analysis = analyze_period(&group, &config).unwrap();
        assert!(analysis.window.time.iter().all(|&t| t >= 59.9 - 12.0));
        assert!(analysis.window.len() < 130);
    }
}
