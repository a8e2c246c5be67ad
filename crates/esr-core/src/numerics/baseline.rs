use super::{
    DenseMatrix, ProcessingError, polyfit_weighted, polyval, solve_dense, validate_axis_pair,
    validate_finite, validate_strictly_increasing,
};

const SPLINE_DEGREE: usize = 3;
const IRLS_MAX_ITERATIONS: usize = 30;
const IRLS_COEFFICIENT_TOLERANCE: f64 = 1.0e-12;
const ADAPTIVE_KNOT_CAP: usize = 64;

/// Baseline estimate plus the baseline-subtracted signal.
#[derive(Debug, Clone, PartialEq)]
pub struct BaselineFit {
    pub baseline: Vec<f64>,
    pub corrected: Vec<f64>,
}

/// Polynomial baseline with a soft-L1 robust loss.
///
/// The loss down-weights points far from the trend so a resonance line sitting
/// on the baseline does not contaminate the estimate. `mask` restricts the fit
/// region; the fitted polynomial is subtracted over the full axis.
pub fn poly_baseline(
    x: &[f64],
    y: &[f64],
    order: usize,
    mask: Option<&[bool]>,
) -> Result<BaselineFit, ProcessingError> {
    validate_axis_pair(x, y)?;
    let (x_fit, y_fit) = select_fit_region(x, y, mask)?;
    if x_fit.len() <= order {
        return Err(ProcessingError::OrderTooLarge {
            order,
            points: x_fit.len(),
        });
    }

    let mut coefficients = polyfit_weighted(&x_fit, &y_fit, None, order)?;
    let mut weights = vec![1.0; x_fit.len()];
    for _ in 0..IRLS_MAX_ITERATIONS {
        for (index, weight) in weights.iter_mut().enumerate() {
            let residual = polyval(&coefficients, x_fit[index]) - y_fit[index];
            // Derivative of the soft-L1 loss applied to the squared residual.
            *weight = 1.0 / (1.0 + residual * residual).sqrt();
        }
        let next = polyfit_weighted(&x_fit, &y_fit, Some(&weights), order)?;
        let scale = coefficients
            .iter()
            .fold(1.0_f64, |acc, c| acc.max(c.abs()));
        let delta = next
            .iter()
            .zip(coefficients.iter())
            .fold(0.0_f64, |acc, (a, b)| acc.max((a - b).abs()));
        coefficients = next;
        if delta <= IRLS_COEFFICIENT_TOLERANCE * scale {
            break;
        }
    }

    let baseline: Vec<f64> = x.iter().map(|&v| polyval(&coefficients, v)).collect();
    let corrected = subtract(y, &baseline);
    Ok(BaselineFit {
        baseline,
        corrected,
    })
}

/// Smoothing factor `N * (1.4826 * MAD)^2` estimated from the signal's robust
/// noise level.
pub fn robust_noise_smoothing_factor(y: &[f64]) -> f64 {
    let med = median(y);
    let deviations: Vec<f64> = y.iter().map(|&v| (v - med).abs()).collect();
    let mad = median(&deviations);
    y.len() as f64 * (1.4826 * mad).powi(2)
}

/// Cubic-spline baseline.
///
/// With explicit `knots` this is a fixed-knot least-squares spline. Without,
/// the smoothing factor (given or estimated via
/// [`robust_noise_smoothing_factor`]) acts as a residual budget: uniformly
/// spaced interior knots are doubled until the residual sum of squares fits
/// the budget or the knot cap is reached.
pub fn spline_baseline(
    x: &[f64],
    y: &[f64],
    knots: Option<&[f64]>,
    smoothing: Option<f64>,
) -> Result<BaselineFit, ProcessingError> {
    validate_axis_pair(x, y)?;
    validate_strictly_increasing(x)?;
    if x.len() < SPLINE_DEGREE + 1 {
        return Err(ProcessingError::InsufficientPoints {
            minimum: SPLINE_DEGREE + 1,
            actual: x.len(),
        });
    }
    if let Some(value) = smoothing
        && !value.is_finite()
    {
        return Err(ProcessingError::NonFiniteParameter {
            name: "smoothing",
            value,
        });
    }

    if let Some(interior) = knots.filter(|k| !k.is_empty()) {
        validate_interior_knots(x, interior)?;
        let baseline = fit_bspline(x, y, interior)?;
        let corrected = subtract(y, &baseline);
        return Ok(BaselineFit {
            baseline,
            corrected,
        });
    }

    let budget = smoothing.unwrap_or_else(|| robust_noise_smoothing_factor(y));
    let cap = ADAPTIVE_KNOT_CAP.min(x.len() / 4).max(1);

    let mut baseline = fit_bspline(x, y, &[])?;
    let mut interior_count = 0_usize;
    while residual_sum_of_squares(y, &baseline) > budget && interior_count < cap {
        interior_count = if interior_count == 0 {
            1
        } else {
            (interior_count * 2).min(cap)
        };
        let interior = uniform_interior_knots(x, interior_count);
        match fit_bspline(x, y, &interior) {
            Ok(next) => baseline = next,
            // Knots denser than the data leave empty spans; keep the last fit.
            Err(ProcessingError::SingularSystem) => break,
            Err(error) => return Err(error),
        }
    }

    let corrected = subtract(y, &baseline);
    Ok(BaselineFit {
        baseline,
        corrected,
    })
}

fn select_fit_region(
    x: &[f64],
    y: &[f64],
    mask: Option<&[bool]>,
) -> Result<(Vec<f64>, Vec<f64>), ProcessingError> {
    match mask {
        None => Ok((x.to_vec(), y.to_vec())),
        Some(selected) => {
            if selected.len() != x.len() {
                return Err(ProcessingError::MaskLengthMismatch {
                    mask: selected.len(),
                    data: x.len(),
                });
            }
            let mut x_fit = Vec::new();
            let mut y_fit = Vec::new();
            for (index, keep) in selected.iter().enumerate() {
                if *keep {
                    x_fit.push(x[index]);
                    y_fit.push(y[index]);
                }
            }
            Ok((x_fit, y_fit))
        }
    }
}

fn subtract(y: &[f64], baseline: &[f64]) -> Vec<f64> {
    y.iter()
        .zip(baseline.iter())
        .map(|(value, base)| value - base)
        .collect()
}

fn residual_sum_of_squares(y: &[f64], baseline: &[f64]) -> f64 {
    y.iter()
        .zip(baseline.iter())
        .map(|(value, base)| (value - base) * (value - base))
        .sum()
}

fn median(values: &[f64]) -> f64 {
    let mut sorted = values.to_vec();
    sorted.sort_by(f64::total_cmp);
    let mid = sorted.len() / 2;
    if sorted.len() % 2 == 0 {
        (sorted[mid - 1] + sorted[mid]) / 2.0
    } else {
        sorted[mid]
    }
}

fn uniform_interior_knots(x: &[f64], count: usize) -> Vec<f64> {
    let first = x[0];
    let span = x[x.len() - 1] - first;
    (1..=count)
        .map(|index| first + span * index as f64 / (count + 1) as f64)
        .collect()
}

fn validate_interior_knots(x: &[f64], interior: &[f64]) -> Result<(), ProcessingError> {
    validate_finite("knots", interior)?;
    let (low, high) = (x[0], x[x.len() - 1]);
    for (index, value) in interior.iter().copied().enumerate() {
        let ordered = index == 0 || value > interior[index - 1];
        if value <= low || value >= high || !ordered {
            return Err(ProcessingError::InvalidKnot { index, value });
        }
    }
    Ok(())
}

/// Least-squares cubic B-spline through `(x, y)` with the given interior
/// knots, evaluated back on `x`.
fn fit_bspline(x: &[f64], y: &[f64], interior: &[f64]) -> Result<Vec<f64>, ProcessingError> {
    let basis_count = interior.len() + SPLINE_DEGREE + 1;
    let knots = clamped_knot_vector(x, interior);

    let mut normal = DenseMatrix::zeros(basis_count, basis_count);
    let mut moment = vec![0.0; basis_count];
    let mut rows: Vec<(usize, [f64; SPLINE_DEGREE + 1])> = Vec::with_capacity(x.len());

    for (row, value) in x.iter().copied().enumerate() {
        let span = find_span(&knots, basis_count, value);
        let basis = basis_functions(&knots, span, value);
        rows.push((span, basis));
        for i in 0..=SPLINE_DEGREE {
            let col_i = span - SPLINE_DEGREE + i;
            moment[col_i] += basis[i] * y[row];
            for j in 0..=SPLINE_DEGREE {
                let col_j = span - SPLINE_DEGREE + j;
                normal[(col_i, col_j)] += basis[i] * basis[j];
            }
        }
    }

    let coefficients = solve_dense(&normal, &moment)?;
    Ok(rows
        .into_iter()
        .map(|(span, basis)| {
            (0..=SPLINE_DEGREE)
                .map(|i| basis[i] * coefficients[span - SPLINE_DEGREE + i])
                .sum()
        })
        .collect())
}

fn clamped_knot_vector(x: &[f64], interior: &[f64]) -> Vec<f64> {
    let mut knots = Vec::with_capacity(interior.len() + 2 * (SPLINE_DEGREE + 1));
    knots.extend(std::iter::repeat_n(x[0], SPLINE_DEGREE + 1));
    knots.extend_from_slice(interior);
    knots.extend(std::iter::repeat_n(x[x.len() - 1], SPLINE_DEGREE + 1));
    knots
}

fn find_span(knots: &[f64], basis_count: usize, u: f64) -> usize {
    if u >= knots[basis_count] {
        return basis_count - 1;
    }
    if u <= knots[SPLINE_DEGREE] {
        return SPLINE_DEGREE;
    }
    let mut low = SPLINE_DEGREE;
    let mut high = basis_count;
    while high - low > 1 {
        let mid = (low + high) / 2;
        if u < knots[mid] {
            high = mid;
        } else {
            low = mid;
        }
    }
    low
}

/// Non-zero basis values `N[span-3..=span](u)` (Cox–de Boor recursion).
fn basis_functions(knots: &[f64], span: usize, u: f64) -> [f64; SPLINE_DEGREE + 1] {
    let mut values = [0.0; SPLINE_DEGREE + 1];
    let mut left = [0.0; SPLINE_DEGREE + 1];
    let mut right = [0.0; SPLINE_DEGREE + 1];
    values[0] = 1.0;
    for level in 1..=SPLINE_DEGREE {
        left[level] = u - knots[span + 1 - level];
        right[level] = knots[span + level] - u;
        let mut saved = 0.0;
        for index in 0..level {
            let denominator = right[index + 1] + left[level - index];
            let term = if denominator == 0.0 {
                0.0
            } else {
                values[index] / denominator
            };
            values[index] = saved + right[index + 1] * term;
            saved = left[level - index] * term;
        }
        values[level] = saved;
    }
    values
}

#[cfg(test)]
mod tests {
    use super::{poly_baseline, robust_noise_smoothing_factor, spline_baseline};
    use crate::numerics::ProcessingError;

    fn quadratic_with_line(n: usize) -> (Vec<f64>, Vec<f64>) {
        // Quadratic drift plus a narrow Lorentzian-derivative line at center.
        let x: Vec<f64> = (0..n).map(|i| 0.30 + 0.04 * i as f64 / n as f64).collect();
        let y: Vec<f64> = x
            .iter()
            .map(|&b| {
                let drift = 5.0 - 12.0 * b + 9.0 * b * b;
                let u = (b - 0.32) / 0.0008;
                let line = -2.0 * u / (1.0 + u * u).powi(2);
                drift + line
            })
            .collect();
        (x, y)
    }

    #[test]
    fn robust_poly_baseline_ignores_the_line_shape() {
        let (x, y) = quadratic_with_line(401);
        let fit = poly_baseline(&x, &y, 2, None).expect("fit");

        // Away from the line the corrected signal should sit near zero.
        for (index, &b) in x.iter().enumerate() {
            if (b - 0.32).abs() > 0.004 {
                assert!(
                    fit.corrected[index].abs() < 0.05,
                    "index {index} corrected {}",
                    fit.corrected[index]
                );
            }
        }
    }

    #[test]
    fn masked_fit_uses_only_the_selected_region() {
        let (x, y) = quadratic_with_line(401);
        let mask: Vec<bool> = x.iter().map(|&b| (b - 0.32).abs() > 0.004).collect();
        let fit = poly_baseline(&x, &y, 2, Some(&mask)).expect("fit");

        let edge = fit.corrected[0].abs();
        assert!(edge < 1.0e-3, "edge residual {edge}");
    }

    #[test]
    fn poly_baseline_rejects_mask_length_mismatch() {
        let x = [0.0, 1.0, 2.0];
        let y = [0.0, 0.0, 0.0];
        let error = poly_baseline(&x, &y, 1, Some(&[true, false])).expect_err("mask");
        assert_eq!(
            error,
            ProcessingError::MaskLengthMismatch { mask: 2, data: 3 }
        );
    }

    #[test]
    fn fixed_knot_spline_follows_a_slow_trend() {
        let x: Vec<f64> = (0..200).map(|i| i as f64 / 199.0).collect();
        let y: Vec<f64> = x.iter().map(|&v| (2.5 * v).sin()).collect();
        let knots = [0.25, 0.5, 0.75];

        let fit = spline_baseline(&x, &y, Some(&knots), None).expect("fit");
        for (index, value) in fit.corrected.iter().enumerate() {
            assert!(value.abs() < 5.0e-3, "index {index} residual {value}");
        }
    }

    #[test]
    fn spline_rejects_out_of_range_knots() {
        let x: Vec<f64> = (0..50).map(|i| i as f64).collect();
        let y = vec![0.0; 50];
        let error = spline_baseline(&x, &y, Some(&[60.0]), None).expect_err("knot");
        assert_eq!(error, ProcessingError::InvalidKnot { index: 0, value: 60.0 });
    }

    #[test]
    fn adaptive_spline_respects_a_loose_budget() {
        let x: Vec<f64> = (0..100).map(|i| i as f64 / 99.0).collect();
        let y: Vec<f64> = x.iter().map(|&v| 1.0 + 0.2 * v).collect();

        // A linear signal is matched by the knot-free cubic immediately.
        let fit = spline_baseline(&x, &y, None, Some(1.0)).expect("fit");
        for value in &fit.corrected {
            assert!(value.abs() < 1.0e-8);
        }
    }

    #[test]
    fn smoothing_factor_tracks_the_mad() {
        let y = [1.0, 1.0, 1.0, 5.0];
        // median 1, deviations [0,0,0,4], MAD = 0 -> factor 0.
        assert_eq!(robust_noise_smoothing_factor(&y), 0.0);

        let y = [0.0, 1.0, 2.0, 3.0, 4.0];
        let expected = 5.0 * (1.4826 * 1.0_f64).powi(2);
        assert!((robust_noise_smoothing_factor(&y) - expected).abs() <= 1.0e-12);
    }
}
