//! Finite difference methods for numerical differentiation.
//!
//! Used for models that do not provide analytic partial derivatives. The
//! model is never evaluated outside the bounds of a parameter: near a limit
//! the step is cut at the limit and the difference becomes one-sided.

use crate::data::Variables;
use crate::error::{FitError, Result};
use crate::model::Model;
use crate::parameters::{Bounds, ParamValues};
use ndarray::{Array1, Array2};

/// Default relative step size for central differences, about the cube root
/// of machine epsilon.
const DEFAULT_EPSILON: f64 = 6.055_454_452_393_343e-6;

/// Compute the model Jacobian using finite differences.
///
/// `J[i,j] = df(x_i)/dp_j`, with columns in the order of `names`. Each
/// parameter is stepped to `p - h` and `p + h`, with either end moved onto
/// the limit of `bounds[j]` when it would cross it.
///
/// # Arguments
///
/// * `model` - The model to differentiate
/// * `x` - The independent variables
/// * `params` - The parameter values at which to evaluate the Jacobian
/// * `names` - The parameters to differentiate with respect to
/// * `bounds` - The bounds of each parameter in `names`
/// * `epsilon` - The relative step size (optional)
///
/// # Returns
///
/// * `Result<Array2<f64>>` - The Jacobian matrix
pub fn jacobian<M: Model + ?Sized>(
    model: &M,
    x: &Variables,
    params: &ParamValues,
    names: &[&str],
    bounds: &[Bounds],
    epsilon: Option<f64>,
) -> Result<Array2<f64>> {
    if bounds.len() != names.len() {
        return Err(FitError::DimensionMismatch(format!(
            "got bounds for {} parameters but {} names",
            bounds.len(),
            names.len()
        )));
    }

    let eps = epsilon.unwrap_or(DEFAULT_EPSILON);
    let n_residuals = model.eval(x, params)?.len();

    let mut jac = Array2::zeros((n_residuals, names.len()));
    let mut perturbed = params.clone();

    for (j, (name, bound)) in names.iter().zip(bounds).enumerate() {
        let value = *params
            .get(*name)
            .ok_or_else(|| FitError::ValueNotFound(name.to_string()))?;

        // Adapt the step to the parameter scale
        let h = eps * value.abs().max(1.0);
        let upper = (value + h).min(bound.max);
        let lower = (value - h).max(bound.min);
        if !(upper > lower) {
            return Err(FitError::FunctionEvaluation(format!(
                "cannot step '{}' = {} inside [{}, {}]",
                name, value, bound.min, bound.max
            )));
        }

        perturbed.insert(name.to_string(), upper);
        let forward = model.eval(x, &perturbed)?;
        perturbed.insert(name.to_string(), lower);
        let backward = model.eval(x, &perturbed)?;
        perturbed.insert(name.to_string(), value);

        check_length(&forward, &backward, n_residuals, name)?;

        // Forward and backward outputs are identical for parameters the
        // model does not use, which leaves the column exactly zero.
        let column = (&forward - &backward) / (upper - lower);
        jac.column_mut(j).assign(&column);
    }

    Ok(jac)
}

/// Central-difference Jacobian of a vector function of unconstrained variables.
///
/// `f` is evaluated at `point` shifted by `+h` and `-h` along each
/// coordinate in turn, with `h = epsilon * max(1, |point[j]|)`.
pub fn jacobian_unconstrained<F>(
    point: &[f64],
    n_outputs: usize,
    epsilon: Option<f64>,
    mut f: F,
) -> Result<Array2<f64>>
where
    F: FnMut(&[f64]) -> Result<Array1<f64>>,
{
    let eps = epsilon.unwrap_or(DEFAULT_EPSILON);
    let mut jac = Array2::zeros((n_outputs, point.len()));
    let mut shifted = point.to_vec();

    for (j, &value) in point.iter().enumerate() {
        let h = eps * value.abs().max(1.0);

        shifted[j] = value + h;
        let forward = f(&shifted)?;
        shifted[j] = value - h;
        let backward = f(&shifted)?;
        shifted[j] = value;

        check_length(&forward, &backward, n_outputs, &j.to_string())?;
        jac.column_mut(j).assign(&((&forward - &backward) / (2.0 * h)));
    }

    Ok(jac)
}

fn check_length(forward: &Array1<f64>, backward: &Array1<f64>, n: usize, name: &str) -> Result<()> {
    if forward.len() != n || backward.len() != n {
        return Err(FitError::DimensionMismatch(format!(
            "model output length changed while differentiating '{}'",
            name
        )));
    }
    Ok(())
}
