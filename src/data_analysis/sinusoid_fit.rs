// src/data_analysis/sinusoid_fit.rs

use nalgebra::{DMatrix, DVector, SVD};
use ndarray::{Array1, ArrayView1};
use std::f64::consts::PI;

/// Fewest samples for which the three-parameter model is determined
pub const MIN_FIT_SAMPLES: usize = 3;

// Singular values below this fraction of the largest one count as zero.
const RANK_TOLERANCE: f64 = 1e-10;

/// Parameters of `y(t) = A·sin(2πft) + B·cos(2πft) + offset`, expressed as
/// `amplitude·sin(2πft + phase) + offset`.
#[derive(Debug, Clone, PartialEq)]
pub struct SinusoidFit {
    /// sqrt(A² + B²), never negative
    pub amplitude: f64,
    /// atan2(B, A) in radians
    pub phase_rad: f64,
    /// DC offset
    pub offset: f64,
    /// Coefficient of determination; 0.0 for a constant signal, negative when
    /// the fit is worse than the mean
    pub r_squared: f64,
    /// Model evaluated on the input time vector
    pub fitted: Array1<f64>,
}

/// Result of a fit attempt.
///
/// `Degenerate` is returned instead of an error when the least-squares system
/// cannot be solved (too few samples, rank-deficient design, non-finite data).
/// Its accessors read as a zero fit so that the amplitude gate excludes it.
#[derive(Debug, Clone, PartialEq)]
pub enum SinusoidFitOutcome {
    Fitted(SinusoidFit),
    Degenerate { len: usize },
}

impl SinusoidFitOutcome {
    pub fn amplitude(&self) -> f64 {
        match self {
            Self::Fitted(fit) => fit.amplitude,
            Self::Degenerate { .. } => 0.0,
        }
    }

    pub fn phase_rad(&self) -> f64 {
        match self {
            Self::Fitted(fit) => fit.phase_rad,
            Self::Degenerate { .. } => 0.0,
        }
    }

    pub fn offset(&self) -> f64 {
        match self {
            Self::Fitted(fit) => fit.offset,
            Self::Degenerate { .. } => 0.0,
        }
    }

    pub fn r_squared(&self) -> f64 {
        match self {
            Self::Fitted(fit) => fit.r_squared,
            Self::Degenerate { .. } => 0.0,
        }
    }

    /// Fitted signal; all zeros for a degenerate outcome.
    pub fn fitted_signal(&self) -> Array1<f64> {
        match self {
            Self::Fitted(fit) => fit.fitted.clone(),
            Self::Degenerate { len } => Array1::zeros(*len),
        }
    }

    pub fn as_fit(&self) -> Option<&SinusoidFit> {
        match self {
            Self::Fitted(fit) => Some(fit),
            Self::Degenerate { .. } => None,
        }
    }

    pub fn is_degenerate(&self) -> bool {
        matches!(self, Self::Degenerate { .. })
    }
}

/// Fits a single sinusoid of known frequency plus a DC offset by linear least squares.
///
/// The design matrix has the columns `sin(2πft)`, `cos(2πft)` and `1`.
///
/// # Panics
/// Panics if `time` and `signal` have different lengths.
pub fn fit_sinusoid(
    time: ArrayView1<f64>,
    signal: ArrayView1<f64>,
    frequency_hz: f64,
) -> SinusoidFitOutcome {
    assert_eq!(
        time.len(),
        signal.len(),
        "time and signal must have the same length"
    );

    let n = signal.len();
    let degenerate = SinusoidFitOutcome::Degenerate { len: n };

    if n < MIN_FIT_SAMPLES || !frequency_hz.is_finite() || frequency_hz <= 0.0 {
        return degenerate;
    }
    if time.iter().chain(signal.iter()).any(|v| !v.is_finite()) {
        return degenerate;
    }

    let omega = 2.0 * PI * frequency_hz;
    let sin_basis = time.mapv(|t| (omega * t).sin());
    let cos_basis = time.mapv(|t| (omega * t).cos());

    let coefficients = match solve_least_squares(&sin_basis, &cos_basis, signal) {
        Some(c) => c,
        None => return degenerate,
    };

    // A constant signal is fitted exactly by its offset alone.
    let first = signal[0];
    if signal.iter().all(|&v| v == first) {
        return SinusoidFitOutcome::Fitted(SinusoidFit {
            amplitude: 0.0,
            phase_rad: 0.0,
            offset: first,
            r_squared: 0.0,
            fitted: Array1::from_elem(n, first),
        });
    }

    let (a, b, offset) = (coefficients[0], coefficients[1], coefficients[2]);
    let fitted = &sin_basis * a + &cos_basis * b + offset;

    SinusoidFitOutcome::Fitted(SinusoidFit {
        amplitude: (a * a + b * b).sqrt(),
        phase_rad: b.atan2(a),
        offset,
        r_squared: coefficient_of_determination(signal, fitted.view()),
        fitted,
    })
}

/// R² = 1 - SS_res / SS_tot, defined as 0.0 when SS_tot is zero.
pub fn coefficient_of_determination(signal: ArrayView1<f64>, fitted: ArrayView1<f64>) -> f64 {
    let mean = match signal.mean() {
        Some(m) => m,
        None => return 0.0,
    };

    let residuals = &signal - &fitted;
    let ss_res = residuals.dot(&residuals);
    let deviations = signal.mapv(|v| v - mean);
    let ss_tot = deviations.dot(&deviations);

    if ss_tot == 0.0 {
        0.0
    } else {
        1.0 - ss_res / ss_tot
    }
}

/// Least-squares coefficients `[A, B, offset]` of the sin/cos/1 design, solved by SVD.
/// Returns `None` when the design is rank deficient.
fn solve_least_squares(
    sin_basis: &Array1<f64>,
    cos_basis: &Array1<f64>,
    signal: ArrayView1<f64>,
) -> Option<[f64; 3]> {
    let n = signal.len();
    let design = DMatrix::<f64>::from_fn(n, 3, |i, j| match j {
        0 => sin_basis[i],
        1 => cos_basis[i],
        _ => 1.0,
    });
    let y = DVector::<f64>::from_iterator(n, signal.iter().copied());

    let svd = SVD::new(design, true, true);
    let largest = svd.singular_values.max();
    if !largest.is_finite() || largest <= 0.0 {
        return None;
    }
    let eps = largest * RANK_TOLERANCE;
    if svd.rank(eps) < 3 {
        return None;
    }

    let beta = svd.solve(&y, eps).ok()?;
    let solution = [beta[0], beta[1], beta[2]];
    if solution.iter().all(|v| v.is_finite()) {
        Some(solution)
    } else {
        None
    }
}
