// src/data_analysis/window.rs

use ndarray::{Array1, ArrayView1};
use ndarray_stats::QuantileExt;

use crate::data_input::dataset::ExcitationGroup;

/// Trailing steady-state portion of one excitation group.
#[derive(Debug, Clone, PartialEq)]
pub struct SteadyStateWindow {
    pub period_s: f64,
    pub time: Array1<f64>,
    pub setpoint: Array1<f64>,
    pub controlled: Array1<f64>,
}

impl SteadyStateWindow {
    pub fn len(&self) -> usize {
        self.time.len()
    }

    pub fn is_empty(&self) -> bool {
        self.time.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum WindowSelection {
    Selected(SteadyStateWindow),
    Insufficient { available: usize, required: usize },
}

/// Indices of the samples with `time >= max(time) - window_s` (inclusive boundary).
///
/// Returns an empty list when the time vector is empty or its maximum is undefined (NaN).
pub fn trailing_window_indices(time: ArrayView1<f64>, window_s: f64) -> Vec<usize> {
    let end = match time.max() {
        Ok(&t) => t,
        Err(_) => return Vec::new(),
    };
    let start = end - window_s;

    time.iter()
        .enumerate()
        .filter(|(_, &t)| t >= start)
        .map(|(i, _)| i)
        .collect()
}

/// Selects the last `window_s` seconds of the group, discarding the startup transient.
pub fn select_trailing_window(
    group: &ExcitationGroup,
    window_s: f64,
    min_samples: usize,
) -> WindowSelection {
    let indices = trailing_window_indices(group.time.view(), window_s);

    if indices.len() < min_samples {
        return WindowSelection::Insufficient {
            available: indices.len(),
            required: min_samples,
        };
    }

    let pick =
        |values: &Array1<f64>| -> Array1<f64> { indices.iter().map(|&i| values[i]).collect() };

    WindowSelection::Selected(SteadyStateWindow {
        period_s: group.period_s,
        time: pick(&group.time),
        setpoint: pick(&group.setpoint),
        controlled: pick(&group.controlled),
    })
}
