use super::{DenseMatrix, ProcessingError, validate_finite};

const SINGULAR_PIVOT_EPSILON: f64 = 1.0e-13;

/// Vandermonde design matrix in increasing powers: column `k` is `x^k`.
pub fn vandermonde(x: &[f64], degree: usize) -> DenseMatrix {
    let mut matrix = DenseMatrix::zeros(x.len(), degree + 1);
    for (row, value) in x.iter().copied().enumerate() {
        let mut power = 1.0;
        for col in 0..=degree {
            matrix[(row, col)] = power;
            power *= value;
        }
    }
    matrix
}

/// Evaluate a polynomial given in increasing powers.
pub fn polyval(coefficients: &[f64], x: f64) -> f64 {
    coefficients
        .iter()
        .rev()
        .copied()
        .fold(0.0, |acc, c| acc * x + c)
}

/// Solve a small square system in place via Gaussian elimination with
/// partial pivoting. Sized for normal equations (a handful of unknowns).
pub fn solve_dense(matrix: &DenseMatrix, rhs: &[f64]) -> Result<Vec<f64>, ProcessingError> {
    let dimension = matrix.nrows();
    debug_assert_eq!(matrix.ncols(), dimension);
    debug_assert_eq!(rhs.len(), dimension);

    let mut work = matrix.clone();
    let mut solution = rhs.to_vec();

    for pivot_col in 0..dimension {
        let mut pivot_row = pivot_col;
        let mut pivot_abs = work[(pivot_col, pivot_col)].abs();
        for row in (pivot_col + 1)..dimension {
            let candidate = work[(row, pivot_col)].abs();
            if candidate > pivot_abs {
                pivot_abs = candidate;
                pivot_row = row;
            }
        }
        if pivot_abs <= SINGULAR_PIVOT_EPSILON || !pivot_abs.is_finite() {
            return Err(ProcessingError::SingularSystem);
        }
        if pivot_row != pivot_col {
            for col in 0..dimension {
                let held = work[(pivot_col, col)];
                work[(pivot_col, col)] = work[(pivot_row, col)];
                work[(pivot_row, col)] = held;
            }
            solution.swap(pivot_col, pivot_row);
        }

        let pivot = work[(pivot_col, pivot_col)];
        for row in (pivot_col + 1)..dimension {
            let multiplier = work[(row, pivot_col)] / pivot;
            if multiplier == 0.0 {
                continue;
            }
            work[(row, pivot_col)] = 0.0;
            for col in (pivot_col + 1)..dimension {
                work[(row, col)] -= multiplier * work[(pivot_col, col)];
            }
            solution[row] -= multiplier * solution[pivot_col];
        }
    }

    for row in (0..dimension).rev() {
        let mut value = solution[row];
        for col in (row + 1)..dimension {
            value -= work[(row, col)] * solution[col];
        }
        solution[row] = value / work[(row, row)];
    }

    Ok(solution)
}

/// Weighted polynomial least squares via the normal equations.
///
/// Returns coefficients in increasing powers. Weights apply to the squared
/// residuals; `None` means ordinary least squares.
pub fn polyfit_weighted(
    x: &[f64],
    y: &[f64],
    weights: Option<&[f64]>,
    degree: usize,
) -> Result<Vec<f64>, ProcessingError> {
    if x.len() != y.len() {
        return Err(ProcessingError::LengthMismatch {
            field: x.len(),
            signal: y.len(),
        });
    }
    if x.len() <= degree {
        return Err(ProcessingError::OrderTooLarge {
            order: degree,
            points: x.len(),
        });
    }
    validate_finite("fit abscissa", x)?;
    validate_finite("fit ordinate", y)?;
    if let Some(w) = weights {
        if w.len() != x.len() {
            return Err(ProcessingError::MaskLengthMismatch {
                mask: w.len(),
                data: x.len(),
            });
        }
        validate_finite("fit weights", w)?;
    }

    let unknowns = degree + 1;
    let design = vandermonde(x, degree);
    let mut normal = DenseMatrix::zeros(unknowns, unknowns);
    let mut moment = vec![0.0; unknowns];

    for row in 0..x.len() {
        let weight = weights.map_or(1.0, |w| w[row]);
        for i in 0..unknowns {
            let weighted = weight * design[(row, i)];
            moment[i] += weighted * y[row];
            for j in i..unknowns {
                normal[(i, j)] += weighted * design[(row, j)];
            }
        }
    }
    for i in 0..unknowns {
        for j in 0..i {
            normal[(i, j)] = normal[(j, i)];
        }
    }

    solve_dense(&normal, &moment)
}

#[cfg(test)]
mod tests {
    use super::{polyfit_weighted, polyval, solve_dense, vandermonde};
    use crate::numerics::{DenseMatrix, ProcessingError};

    #[test]
    fn polyfit_recovers_exact_quadratic() {
        let x: Vec<f64> = (0..20).map(|i| -1.0 + 0.1 * i as f64).collect();
        let y: Vec<f64> = x.iter().map(|&v| 2.0 - 0.5 * v + 3.0 * v * v).collect();

        let coefficients = polyfit_weighted(&x, &y, None, 2).expect("fit");
        assert!((coefficients[0] - 2.0).abs() <= 1.0e-10);
        assert!((coefficients[1] + 0.5).abs() <= 1.0e-10);
        assert!((coefficients[2] - 3.0).abs() <= 1.0e-10);
    }

    #[test]
    fn zero_weight_points_do_not_pull_the_fit() {
        let x = [0.0, 1.0, 2.0, 3.0, 4.0];
        let y = [0.0, 1.0, 2.0, 3.0, 100.0];
        let weights = [1.0, 1.0, 1.0, 1.0, 0.0];

        let coefficients = polyfit_weighted(&x, &y, Some(&weights), 1).expect("fit");
        assert!((coefficients[0]).abs() <= 1.0e-10);
        assert!((coefficients[1] - 1.0).abs() <= 1.0e-10);
    }

    #[test]
    fn polyval_matches_vandermonde_rows() {
        let coefficients = [1.0, -2.0, 0.5];
        let design = vandermonde(&[1.7], 2);
        let manual =
            coefficients[0] * design[(0, 0)] + coefficients[1] * design[(0, 1)] + coefficients[2] * design[(0, 2)];
        assert!((polyval(&coefficients, 1.7) - manual).abs() <= 1.0e-12);
    }

    #[test]
    fn singular_normal_equations_are_reported() {
        // Two identical abscissa values cannot determine a line slope plus curvature.
        let x = [1.0, 1.0, 1.0];
        let y = [2.0, 2.0, 2.0];
        let error = polyfit_weighted(&x, &y, None, 2).expect_err("singular");
        assert_eq!(error, ProcessingError::SingularSystem);
    }

    #[test]
    fn solve_dense_handles_row_swaps() {
        let mut matrix = DenseMatrix::zeros(3, 3);
        matrix[(0, 0)] = 0.0;
        matrix[(0, 1)] = 2.0;
        matrix[(0, 2)] = 1.0;
        matrix[(1, 0)] = 1.0;
        matrix[(1, 1)] = 1.0;
        matrix[(1, 2)] = 1.0;
        matrix[(2, 0)] = 2.0;
        matrix[(2, 1)] = 0.0;
        matrix[(2, 2)] = 3.0;
        let rhs = [7.0, 6.0, 13.0];

        let solution = solve_dense(&matrix, &rhs).expect("solve");
        for (row, expected) in rhs.iter().enumerate() {
            let acc: f64 = (0..3).map(|col| matrix[(row, col)] * solution[col]).sum();
            assert!((acc - expected).abs() <= 1.0e-10);
        }
    }
}
