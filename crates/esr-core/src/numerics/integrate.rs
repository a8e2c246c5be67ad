use super::{ProcessingError, polyfit_weighted, polyval, validate_axis_pair};

/// Fraction of points (per side) used for the residual-baseline line fit in
/// [`integrate_area`].
const AREA_EDGE_DIVISOR: usize = 20;

/// Trapezoid-rule integral of `y` over `x`.
pub fn trapezoid(x: &[f64], y: &[f64]) -> Result<f64, ProcessingError> {
    validate_axis_pair(x, y)?;
    let mut area = 0.0;
    for index in 1..x.len() {
        area += 0.5 * (y[index] + y[index - 1]) * (x[index] - x[index - 1]);
    }
    Ok(area)
}

/// Cumulative trapezoid integral, anchored at zero.
pub fn cumulative_trapezoid(x: &[f64], y: &[f64]) -> Result<Vec<f64>, ProcessingError> {
    validate_axis_pair(x, y)?;
    let mut integral = vec![0.0; x.len()];
    for index in 1..x.len() {
        integral[index] = integral[index - 1]
            + 0.5 * (y[index] + y[index - 1]) * (x[index] - x[index - 1]);
    }
    Ok(integral)
}

/// Integrate the derivative signal into an absorption spectrum.
///
/// Unbounded integration accumulates any DC offset into a linear ramp; the
/// straight line connecting the first and last integrated points is removed.
pub fn integrate_absorption(x: &[f64], y_deriv: &[f64]) -> Result<Vec<f64>, ProcessingError> {
    let mut absorption = cumulative_trapezoid(x, y_deriv)?;
    let span = x[x.len() - 1] - x[0];
    if span == 0.0 {
        return Err(ProcessingError::NonIncreasingField { index: x.len() - 1 });
    }
    let first = absorption[0];
    let slope = (absorption[absorption.len() - 1] - first) / span;
    for (index, value) in absorption.iter_mut().enumerate() {
        *value -= slope * (x[index] - x[0]) + first;
    }
    Ok(absorption)
}

/// Area under the absorption curve, optionally restricted to a field window.
///
/// A line through the extreme ~5% of points on each side estimates the
/// residual baseline, which is subtracted before the trapezoid integral.
pub fn integrate_area(
    x: &[f64],
    y_abs: &[f64],
    roi: Option<(f64, f64)>,
) -> Result<f64, ProcessingError> {
    validate_axis_pair(x, y_abs)?;

    let (x_sel, y_sel): (Vec<f64>, Vec<f64>) = match roi {
        None => (x.to_vec(), y_abs.to_vec()),
        Some((min, max)) => {
            if !(min < max) || !min.is_finite() || !max.is_finite() {
                return Err(ProcessingError::InvalidRoi { min, max });
            }
            let mut xs = Vec::new();
            let mut ys = Vec::new();
            for (index, &value) in x.iter().enumerate() {
                if value >= min && value <= max {
                    xs.push(value);
                    ys.push(y_abs[index]);
                }
            }
            if xs.len() < 2 {
                return Err(ProcessingError::EmptyRoi { min, max });
            }
            (xs, ys)
        }
    };

    let n = x_sel.len();
    let edge = (n / AREA_EDGE_DIVISOR).max(1);
    let mut x_edge = Vec::with_capacity(2 * edge);
    let mut y_edge = Vec::with_capacity(2 * edge);
    x_edge.extend_from_slice(&x_sel[..edge]);
    x_edge.extend_from_slice(&x_sel[n - edge..]);
    y_edge.extend_from_slice(&y_sel[..edge]);
    y_edge.extend_from_slice(&y_sel[n - edge..]);

    let line = polyfit_weighted(&x_edge, &y_edge, None, 1)?;
    let corrected: Vec<f64> = x_sel
        .iter()
        .zip(y_sel.iter())
        .map(|(&b, &v)| v - polyval(&line, b))
        .collect();

    trapezoid(&x_sel, &corrected)
}
