//! Model trait and basic model implementations.
//!
//! A model maps named independent variables and named parameter values to a
//! predicted sequence of observations. Any closure with the signature
//! `Fn(&Variables, &ParamValues) -> Array1<f64>` is a model. Models that know
//! their partial derivatives can provide them through [`FnModel`] or by
//! implementing [`Model::jacobian`]; all others are differentiated
//! numerically.

use crate::data::Variables;
use crate::error::{FitError, Result};
use crate::parameters::ParamValues;
use ndarray::{Array1, Array2};

/// A trait representing a model that can be fit to data.
pub trait Model {
    /// Evaluates the model.
    ///
    /// # Arguments
    ///
    /// * `x` - The independent variables
    /// * `params` - The parameter values, keyed by name
    ///
    /// # Returns
    ///
    /// * The model's predicted values, one per data point
    fn eval(&self, x: &Variables, params: &ParamValues) -> Result<Array1<f64>>;

    /// Calculates the Jacobian matrix of the model with respect to its parameters.
    ///
    /// `J[i,j] = df(x_i)/dp_j`, where the columns follow the order of `names`.
    ///
    /// Only called when [`Model::has_custom_jacobian`] returns `true`.
    fn jacobian(&self, _x: &Variables, _params: &ParamValues, _names: &[&str]) -> Result<Array2<f64>> {
        Err(FitError::NotImplemented(
            "Model does not provide an analytic Jacobian".to_string(),
        ))
    }

    /// Returns whether this model has a custom Jacobian implementation.
    fn has_custom_jacobian(&self) -> bool {
        false
    }
}

impl<F> Model for F
where
    F: Fn(&Variables, &ParamValues) -> Array1<f64>,
{
    fn eval(&self, x: &Variables, params: &ParamValues) -> Result<Array1<f64>> {
        Ok(self(x, params))
    }
}

type EvalFn = dyn Fn(&Variables, &ParamValues) -> Result<Array1<f64>> + Send + Sync;
type PartialFn = dyn Fn(&Variables, &ParamValues) -> Array1<f64> + Send + Sync;

/// A model assembled from closures, optionally with analytic partial derivatives.
///
/// # Examples
///
/// ```
/// use lsqfit_rs::model::{FnModel, Model};
/// use lsqfit_rs::data::Variables;
/// use lsqfit_rs::parameters::ParamValues;
/// use ndarray::{array, Array1};
///
/// let line = FnModel::new(|x: &Variables, p: &ParamValues| Ok(p["a"] * &x["t"] + p["b"]))
///     .with_partial("a", |x: &Variables, _: &ParamValues| x["t"].clone())
///     .with_partial("b", |x: &Variables, _: &ParamValues| Array1::ones(x["t"].len()));
///
/// let x: Variables = [("t".to_string(), array![0.0, 1.0])].into();
/// let p: ParamValues = [("a".to_string(), 2.0), ("b".to_string(), 1.0)].into();
/// assert_eq!(line.eval(&x, &p).unwrap(), array![1.0, 3.0]);
/// assert!(line.has_custom_jacobian());
/// ```
pub struct FnModel {
    /// The function to evaluate the model
    eval_func: Box<EvalFn>,
    /// Partial derivatives keyed by parameter name
    partials: Vec<(String, Box<PartialFn>)>,
}

impl FnModel {
    /// Create a new model from its evaluation function
    pub fn new<F>(eval_func: F) -> Self
    where
        F: Fn(&Variables, &ParamValues) -> Result<Array1<f64>> + Send + Sync + 'static,
    {
        Self {
            eval_func: Box::new(eval_func),
            partials: Vec::new(),
        }
    }

    /// Add the partial derivative of the model with respect to one parameter.
    ///
    /// Once any partial derivative is given the model reports a custom
    /// Jacobian, so every fitted parameter the model depends on must get
    /// one. Parameters without a partial derivative get a zero column.
    pub fn with_partial<F>(mut self, name: &str, partial: F) -> Self
    where
        F: Fn(&Variables, &ParamValues) -> Array1<f64> + Send + Sync + 'static,
    {
        self.partials.push((name.to_string(), Box::new(partial)));
        self
    }
}

impl std::fmt::Debug for FnModel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let names: Vec<&str> = self.partials.iter().map(|(n, _)| n.as_str()).collect();
        f.debug_struct("FnModel")
            .field("eval_func", &"/* omitted */")
            .field("partials", &names)
            .finish()
    }
}

impl Model for FnModel {
    fn eval(&self, x: &Variables, params: &ParamValues) -> Result<Array1<f64>> {
        (self.eval_func)(x, params)
    }

    fn jacobian(&self, x: &Variables, params: &ParamValues, names: &[&str]) -> Result<Array2<f64>> {
        let columns: Vec<Option<Array1<f64>>> = names
            .iter()
            .map(|name| {
                self.partials
                    .iter()
                    .find(|(n, _)| n == name)
                    .map(|(_, partial)| partial(x, params))
            })
            .collect();

        let nrows = match columns.iter().flatten().next() {
            Some(col) => col.len(),
            None => self.eval(x, params)?.len(),
        };

        let mut jac = Array2::zeros((nrows, names.len()));
        for (j, column) in columns.into_iter().enumerate() {
            let Some(column) = column else { continue };
            if column.len() != nrows {
                return Err(FitError::DimensionMismatch(format!(
                    "partial derivative for '{}' has {} points, expected {}",
                    names[j],
                    column.len(),
                    nrows
                )));
            }
            jac.column_mut(j).assign(&column);
        }
        Ok(jac)
    }

    fn has_custom_jacobian(&self) -> bool {
        !self.partials.is_empty()
    }
}
