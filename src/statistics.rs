//! # Fit Statistics
//!
//! Goodness-of-fit measures and parameter uncertainties at a solution.
//!
//! All sums use the normalized weights of the [`Dataset`], so the measures
//! do not change when every weight is scaled by the same factor.

use crate::data::Dataset;
use crate::solution::Solution;
use nalgebra::DMatrix;
use ndarray::{Array1, Array2};
use serde::{Deserialize, Serialize};

/// Goodness-of-fit measures.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GoodnessOfFit {
    /// Weighted root-mean-square error, `sqrt(sum(w * r^2))`
    pub weighted_rms_error: f64,

    /// Coefficient of determination, see [`GoodnessOfFit::new`]
    pub r_squared: f64,

    /// Weighted sum of squared residuals, `sum(w * r^2)`
    pub chi_square: f64,

    /// Chi-square per degree of freedom, `NaN` when `nfree` is zero
    pub reduced_chi_square: f64,

    /// Number of data points
    pub ndata: usize,

    /// Degrees of freedom, data points minus resolved parameters
    pub nfree: usize,
}

impl GoodnessOfFit {
    /// Compute the measures from the unweighted residuals `f(x, p) - y`.
    ///
    /// `R^2 = 1 - SS_res / SS_tot`, with `SS_res = sum(w * (y - f)^2)` and
    /// `SS_tot = sum(w * (y - mean(y))^2)`. Note that `mean(y)` is the
    /// *unweighted* mean of the observations even though both sums are
    /// weighted. With non-uniform weights this is not the usual weighted
    /// R², and it is not bounded above by 1 in general. When all
    /// observations are equal `SS_tot` is zero and R² is not finite.
    pub fn new(data: &Dataset, residuals: &Array1<f64>, nresolved: usize) -> Self {
        let w = data.weights();
        let chi_square: f64 = w
            .iter()
            .zip(residuals.iter())
            .map(|(w, r)| w * r * r)
            .sum();

        let y_mean = data.y_mean();
        let ss_tot: f64 = w
            .iter()
            .zip(data.y().iter())
            .map(|(w, y)| w * (y - y_mean).powi(2))
            .sum();

        let ndata = data.ndata();
        let nfree = ndata.saturating_sub(nresolved);
        let reduced_chi_square = if nfree > 0 {
            chi_square / nfree as f64
        } else {
            f64::NAN
        };

        Self {
            weighted_rms_error: chi_square.sqrt(),
            r_squared: 1.0 - chi_square / ss_tot,
            chi_square,
            reduced_chi_square,
            ndata,
            nfree,
        }
    }
}

/// Parameter uncertainties estimated from the Jacobian at the solution.
///
/// Only resolved parameters take part; unresolved ones have no entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Uncertainties {
    /// Names of the parameters, in the order of the matrix rows
    pub names: Vec<String>,

    /// Covariance matrix, `inv(J^T W J) * chi_square / nfree`
    pub covariance: Array2<f64>,

    /// Standard errors, the square roots of the covariance diagonal
    pub standard_errors: Array1<f64>,

    /// Correlation matrix derived from the covariance
    pub correlation: Array2<f64>,
}

impl Uncertainties {
    /// Estimate the uncertainties of the resolved parameters.
    ///
    /// Parameters whose Jacobian column is zero at the solution are left out.
    /// Returns `None` when the Jacobian is unavailable, no degree of freedom
    /// is left, or the normal matrix is singular.
    pub fn new(solution: &Solution, data: &Dataset, goodness: &GoodnessOfFit) -> Option<Self> {
        let jacobian = solution.jacobian()?;
        let resolved: Vec<usize> = solution
            .names()
            .iter()
            .enumerate()
            // a column that vanishes at the solution carries no curvature
            .filter(|(j, name)| {
                solution.value(name).is_ok() && jacobian.column(*j).iter().any(|v| *v != 0.0)
            })
            .map(|(j, _)| j)
            .collect();

        if resolved.is_empty() || goodness.nfree == 0 {
            return None;
        }

        // J^T W J over the resolved columns
        let w = data.weights();
        let k = resolved.len();
        let normal = DMatrix::from_fn(k, k, |a, b| {
            let (ja, jb) = (resolved[a], resolved[b]);
            (0..data.ndata())
                .map(|i| w[i] * jacobian[[i, ja]] * jacobian[[i, jb]])
                .sum::<f64>()
        });

        let inverse = match normal.try_inverse() {
            Some(inverse) => inverse,
            None => {
                tracing::debug!("normal matrix is singular, no uncertainties");
                return None;
            }
        };

        let scale = goodness.reduced_chi_square;
        let covariance = Array2::from_shape_fn((k, k), |(a, b)| inverse[(a, b)] * scale);
        let standard_errors = standard_errors_from_covariance(&covariance);
        let correlation = correlation_from_covariance(&covariance);

        Some(Self {
            names: resolved
                .iter()
                .map(|&j| solution.names()[j].clone())
                .collect(),
            covariance,
            standard_errors,
            correlation,
        })
    }

    /// Standard error of one parameter
    pub fn standard_error(&self, name: &str) -> Option<f64> {
        let i = self.names.iter().position(|n| n == name)?;
        Some(self.standard_errors[i])
    }

    /// Correlation coefficient between two parameters
    pub fn correlation_between(&self, a: &str, b: &str) -> Option<f64> {
        let i = self.names.iter().position(|n| n == a)?;
        let j = self.names.iter().position(|n| n == b)?;
        Some(self.correlation[[i, j]])
    }
}

/// Standard errors are the square roots of the covariance diagonal.
pub fn standard_errors_from_covariance(covar: &Array2<f64>) -> Array1<f64> {
    covar
        .diag()
        .mapv(|v| if v > 0.0 { v.sqrt() } else { 0.0 })
}

/// Normalize a covariance matrix to unit diagonal.
///
/// `correl[i,j] = covar[i,j] / sqrt(covar[i,i] * covar[j,j])`; pairs with a
/// zero variance get a correlation of zero.
pub fn correlation_from_covariance(covar: &Array2<f64>) -> Array2<f64> {
    let n = covar.nrows();
    Array2::from_shape_fn((n, n), |(i, j)| {
        if i == j {
            return 1.0;
        }
        let denom = (covar[[i, i]] * covar[[j, j]]).sqrt();
        if denom > 0.0 {
            covar[[i, j]] / denom
        } else {
            0.0
        }
    })
}
