use super::{ProcessingError, validate_finite};
use num_complex::Complex64;
use rustfft::FftPlanner;

/// Angle grid scanned by the automatic phase search.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PhaseSearchGrid {
    pub start_deg: f64,
    pub stop_deg: f64,
    pub step_deg: f64,
}

impl Default for PhaseSearchGrid {
    fn default() -> Self {
        Self {
            start_deg: -20.0,
            stop_deg: 20.0,
            step_deg: 0.25,
        }
    }
}

/// Analytic signal of a real series via the FFT Hilbert-transform pair.
pub fn analytic_signal(y: &[f64]) -> Result<Vec<Complex64>, ProcessingError> {
    if y.len() < 2 {
        return Err(ProcessingError::InsufficientPoints {
            minimum: 2,
            actual: y.len(),
        });
    }
    validate_finite("signal", y)?;

    let n = y.len();
    let mut buffer: Vec<Complex64> = y.iter().map(|&v| Complex64::new(v, 0.0)).collect();

    let mut planner = FftPlanner::<f64>::new();
    planner.plan_fft_forward(n).process(&mut buffer);

    // Zero the negative frequencies, double the positive ones.
    let half = n / 2;
    for (index, value) in buffer.iter_mut().enumerate() {
        if index == 0 || (n % 2 == 0 && index == half) {
            continue;
        }
        if index < half || (n % 2 == 1 && index == half) {
            *value *= 2.0;
        } else {
            *value = Complex64::new(0.0, 0.0);
        }
    }

    planner.plan_fft_inverse(n).process(&mut buffer);
    let scale = 1.0 / n as f64;
    for value in buffer.iter_mut() {
        *value *= scale;
    }
    Ok(buffer)
}

/// Rotate the derivative signal by `delta_rad` in the analytic plane and keep
/// the real part.
pub fn rotate_phase(y: &[f64], delta_rad: f64) -> Result<Vec<f64>, ProcessingError> {
    if !delta_rad.is_finite() {
        return Err(ProcessingError::NonFiniteParameter {
            name: "delta_rad",
            value: delta_rad,
        });
    }
    let analytic = analytic_signal(y)?;
    let rotation = Complex64::from_polar(1.0, -delta_rad);
    Ok(analytic.iter().map(|a| (a * rotation).re).collect())
}

/// Find the angle on `grid` minimizing the L2 norm of the dispersive
/// (imaginary) component of the analytic signal.
///
/// The dispersive part vanishes for a pure absorption-derivative line shape,
/// so the minimizer is the residual instrument phase. Ties break toward the
/// earliest grid angle.
pub fn search_phase(y: &[f64], grid: PhaseSearchGrid) -> Result<f64, ProcessingError> {
    if !(grid.step_deg > 0.0 && grid.start_deg < grid.stop_deg)
        || !grid.start_deg.is_finite()
        || !grid.stop_deg.is_finite()
    {
        return Err(ProcessingError::InvalidSearchGrid {
            start_deg: grid.start_deg,
            stop_deg: grid.stop_deg,
            step_deg: grid.step_deg,
        });
    }

    let analytic = analytic_signal(y)?;
    let steps = ((grid.stop_deg - grid.start_deg) / grid.step_deg).floor() as usize;

    let mut best_angle = 0.0;
    let mut best_norm = f64::INFINITY;
    for step in 0..=steps {
        let angle_deg = grid.start_deg + step as f64 * grid.step_deg;
        let angle = angle_deg.to_radians();
        let rotation = Complex64::from_polar(1.0, -angle);
        let norm_sq: f64 = analytic
            .iter()
            .map(|a| {
                let dispersive = (a * rotation).im;
                dispersive * dispersive
            })
            .sum();
        if norm_sq < best_norm {
            best_norm = norm_sq;
            best_angle = angle;
        }
    }
    Ok(best_angle)
}
