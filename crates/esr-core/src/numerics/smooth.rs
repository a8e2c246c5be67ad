use super::{DenseMatrix, ProcessingError, polyfit_weighted, polyval, solve_dense, validate_finite};

/// Savitzky–Golay smoothing.
///
/// `window` must be a positive odd integer larger than `polyorder` and no
/// longer than the signal; violations are reported, never silently corrected.
/// Edges are handled by evaluating the edge window's fitted polynomial at the
/// edge positions, so polynomials of degree <= `polyorder` pass unchanged.
pub fn savgol_smooth(
    y: &[f64],
    window: usize,
    polyorder: usize,
) -> Result<Vec<f64>, ProcessingError> {
    if window == 0 || window % 2 == 0 {
        return Err(ProcessingError::InvalidWindow { window });
    }
    if window <= polyorder {
        return Err(ProcessingError::WindowOrderConflict { window, polyorder });
    }
    if window > y.len() {
        return Err(ProcessingError::WindowExceedsSignal {
            window,
            len: y.len(),
        });
    }
    validate_finite("signal", y)?;

    let half = window / 2;
    let weights = center_weights(window, polyorder)?;
    let n = y.len();
    let mut smoothed = vec![0.0; n];

    for center in half..(n - half) {
        let mut acc = 0.0;
        for (offset, weight) in weights.iter().enumerate() {
            acc += weight * y[center - half + offset];
        }
        smoothed[center] = acc;
    }

    // Leading edge: polynomial through the first window, evaluated in place.
    let offsets: Vec<f64> = (0..window).map(|i| i as f64).collect();
    let head = polyfit_weighted(&offsets, &y[..window], None, polyorder)?;
    for position in 0..half {
        smoothed[position] = polyval(&head, position as f64);
    }
    let tail = polyfit_weighted(&offsets, &y[n - window..], None, polyorder)?;
    for position in (n - half)..n {
        let local = (position - (n - window)) as f64;
        smoothed[position] = polyval(&tail, local);
    }

    Ok(smoothed)
}

/// Convolution weights for the window center: the first row of
/// `(A^T A)^{-1} A^T` over symmetric integer positions.
fn center_weights(window: usize, polyorder: usize) -> Result<Vec<f64>, ProcessingError> {
    let half = (window / 2) as isize;
    let positions: Vec<f64> = (-half..=half).map(|p| p as f64).collect();
    let unknowns = polyorder + 1;

    let mut normal = DenseMatrix::zeros(unknowns, unknowns);
    for &p in &positions {
        let mut powers = vec![1.0; unknowns];
        for k in 1..unknowns {
            powers[k] = powers[k - 1] * p;
        }
        for i in 0..unknowns {
            for j in 0..unknowns {
                normal[(i, j)] += powers[i] * powers[j];
            }
        }
    }

    let mut basis = vec![0.0; unknowns];
    basis[0] = 1.0;
    let solution = solve_dense(&normal, &basis)?;

    Ok(positions
        .iter()
        .map(|&p| {
            let mut power = 1.0;
            let mut acc = 0.0;
            for coefficient in &solution {
                acc += coefficient * power;
                power *= p;
            }
            acc
        })
        .collect())
}
