//! Fit data: independent variables, observations and weights.
//!
//! A [`Dataset`] is validated once when it is built, so the solver never
//! sees sequences of different lengths. Weights are always normalized to sum
//! to one; uniform weights are used when none are given.

use crate::error::{FitError, Result};
use ndarray::Array1;
use std::collections::HashMap;

/// Named independent-variable sequences as handed to a model.
pub type Variables = HashMap<String, Array1<f64>>;

/// Validated data for one fit.
#[derive(Debug, Clone)]
pub struct Dataset {
    /// Independent variables, each of length `ndata`
    x: Variables,
    /// Observations
    y: Array1<f64>,
    /// Normalized weights, summing to one
    weights: Array1<f64>,
}

impl Dataset {
    /// Build a dataset from independent variables, observations and optional weights.
    ///
    /// # Arguments
    ///
    /// * `x` - Independent variables; every entry must have the length of `y`
    /// * `y` - Observed values
    /// * `weights` - Optional per-point weights; uniform if `None`
    ///
    /// # Returns
    ///
    /// * The validated dataset with normalized weights, or an error describing
    ///   the first inconsistency found
    ///
    /// # Examples
    ///
    /// ```
    /// use lsqfit_rs::data::{Dataset, Variables};
    /// use ndarray::array;
    ///
    /// let x: Variables = [("t".to_string(), array![0.0, 1.0, 2.0, 3.0])].into();
    /// let data = Dataset::new(x, array![1.0, 3.0, 5.0, 7.0], None).unwrap();
    /// assert_eq!(data.ndata(), 4);
    /// assert_eq!(data.weights()[0], 0.25);
    /// ```
    pub fn new(x: Variables, y: Array1<f64>, weights: Option<Array1<f64>>) -> Result<Self> {
        let n = y.len();
        if n == 0 {
            return Err(FitError::EmptyData);
        }

        for (name, values) in &x {
            if values.len() != n {
                return Err(FitError::DimensionMismatch(format!(
                    "x_data['{}'] has {} points but y_data has {}",
                    name,
                    values.len(),
                    n
                )));
            }
        }

        let weights = normalize_weights(weights, n)?;

        Ok(Self { x, y, weights })
    }

    /// Number of data points
    pub fn ndata(&self) -> usize {
        self.y.len()
    }

    /// Independent variables
    pub fn x(&self) -> &Variables {
        &self.x
    }

    /// Observed values
    pub fn y(&self) -> &Array1<f64> {
        &self.y
    }

    /// Normalized weights
    pub fn weights(&self) -> &Array1<f64> {
        &self.weights
    }

    /// Unweighted arithmetic mean of the observations
    pub fn y_mean(&self) -> f64 {
        self.y.sum() / self.ndata() as f64
    }
}

/// Substitute uniform weights if none are given and scale them to sum to one.
fn normalize_weights(weights: Option<Array1<f64>>, n: usize) -> Result<Array1<f64>> {
    let weights = weights.unwrap_or_else(|| Array1::ones(n));

    if weights.len() != n {
        return Err(FitError::DimensionMismatch(format!(
            "weights have {} points but y_data has {}",
            weights.len(),
            n
        )));
    }
    if let Some(bad) = weights.iter().find(|w| !w.is_finite() || **w < 0.0) {
        return Err(FitError::InvalidWeights(format!(
            "weights must be finite and non-negative, found {}",
            bad
        )));
    }

    let total = weights.sum();
    if total <= 0.0 || !total.is_finite() {
        return Err(FitError::InvalidWeights(format!(
            "weights must have a positive finite sum, found {}",
            total
        )));
    }

    Ok(weights / total)
}
