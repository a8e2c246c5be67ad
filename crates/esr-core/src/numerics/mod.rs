//! Stateless numerical routines consumed by the spectrum model.
//!
//! Every routine validates its parameters up front and fails before touching
//! any output; none of them hold state between calls.

pub mod baseline;
pub mod integrate;
pub mod linalg;
pub mod phase;
pub mod smooth;

pub use baseline::{
    BaselineFit, poly_baseline, robust_noise_smoothing_factor, spline_baseline,
};
pub use integrate::{cumulative_trapezoid, integrate_absorption, integrate_area, trapezoid};
pub use linalg::{polyfit_weighted, polyval, solve_dense, vandermonde};
pub use phase::{PhaseSearchGrid, analytic_signal, rotate_phase, search_phase};
pub use smooth::savgol_smooth;

use faer::Mat;

/// Dense real matrix used by the least-squares kernels.
pub type DenseMatrix = Mat<f64>;

/// Parameter-validation failures of the processing engine.
///
/// All of these are caller errors: reported immediately, never retried, and no
/// spectrum data is mutated once one is raised.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ProcessingError {
    #[error("smoothing window must be a positive odd integer, got {window}")]
    InvalidWindow { window: usize },
    #[error("smoothing window {window} must exceed polynomial order {polyorder}")]
    WindowOrderConflict { window: usize, polyorder: usize },
    #[error("smoothing window {window} exceeds signal length {len}")]
    WindowExceedsSignal { window: usize, len: usize },
    #[error("axis length mismatch: field={field}, signal={signal}")]
    LengthMismatch { field: usize, signal: usize },
    #[error("operation requires at least {minimum} points, got {actual}")]
    InsufficientPoints { minimum: usize, actual: usize },
    #[error("field axis must be strictly increasing at index {index}")]
    NonIncreasingField { index: usize },
    #[error("{name} must be finite at index {index}, got {value}")]
    NonFiniteValue {
        name: &'static str,
        index: usize,
        value: f64,
    },
    #[error("parameter '{name}' must be finite, got {value}")]
    NonFiniteParameter { name: &'static str, value: f64 },
    #[error("polynomial order {order} needs more than {points} fit points")]
    OrderTooLarge { order: usize, points: usize },
    #[error("mask length {mask} does not match data length {data}")]
    MaskLengthMismatch { mask: usize, data: usize },
    #[error("spline knot {index} at {value} must lie strictly inside the field range, in order")]
    InvalidKnot { index: usize, value: f64 },
    #[error("ROI [{min}, {max}] selects fewer than 2 points")]
    EmptyRoi { min: f64, max: f64 },
    #[error("ROI bounds must satisfy min < max, got [{min}, {max}]")]
    InvalidRoi { min: f64, max: f64 },
    #[error("phase search grid [{start_deg}, {stop_deg}] step {step_deg} is not ascending")]
    InvalidSearchGrid {
        start_deg: f64,
        stop_deg: f64,
        step_deg: f64,
    },
    #[error("least-squares system is singular")]
    SingularSystem,
    #[error("unknown baseline method '{name}'")]
    UnknownBaselineMethod { name: String },
    #[error("unknown smoothing method '{name}'")]
    UnknownSmoothingMethod { name: String },
}

pub(crate) fn validate_finite(
    name: &'static str,
    values: &[f64],
) -> Result<(), ProcessingError> {
    for (index, value) in values.iter().copied().enumerate() {
        if !value.is_finite() {
            return Err(ProcessingError::NonFiniteValue { name, index, value });
        }
    }
    Ok(())
}

pub(crate) fn validate_axis_pair(x: &[f64], y: &[f64]) -> Result<(), ProcessingError> {
    if x.len() != y.len() {
        return Err(ProcessingError::LengthMismatch {
            field: x.len(),
            signal: y.len(),
        });
    }
    if x.len() < 2 {
        return Err(ProcessingError::InsufficientPoints {
            minimum: 2,
            actual: x.len(),
        });
    }
    validate_finite("field", x)?;
    validate_finite("signal", y)
}

pub(crate) fn validate_strictly_increasing(x: &[f64]) -> Result<(), ProcessingError> {
    for index in 1..x.len() {
        if x[index] <= x[index - 1] {
            return Err(ProcessingError::NonIncreasingField { index });
        }
    }
    Ok(())
}
