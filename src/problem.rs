//! The fitting problem in the form the external solver consumes.
//!
//! [`FitProblem`] implements the `LeastSquaresProblem` trait of the
//! `levenberg-marquardt` crate. The solver varies unbounded *internal*
//! parameters; the problem maps them through each parameter's
//! [`BoundsTransform`](crate::parameters::BoundsTransform) to the *external*
//! values the model sees, so bounds hold at every iterate.
//!
//! With normalized weights `w`, the residual vector handed to the solver is
//! `sqrt(w) * (f(x, p) - y)`, whose squared norm is the weighted sum of
//! squared residuals that the fit minimizes.

use crate::data::Dataset;
use crate::error::{FitError, Result};
use crate::model::Model;
use crate::parameters::{Bounds, BoundsTransform, ParamValues, ParameterError, ParameterSet};
use crate::utils::finite_difference;
use levenberg_marquardt::LeastSquaresProblem;
use nalgebra::storage::Owned;
use nalgebra::{DMatrix, DVector, Dyn, Matrix, Vector};
use ndarray::{Array1, Array2};
use serde::{Deserialize, Serialize};

/// Method for calculating the model Jacobian.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum DiffMethod {
    /// Use the model's analytic Jacobian if it has one, finite differences otherwise
    #[default]
    Auto,

    /// Always use finite differences
    FiniteDifference,
}

/// Model evaluation at the current parameters, shared by residuals and Jacobian.
#[derive(Debug, Clone)]
struct Evaluation {
    /// External parameter values keyed by name
    values: ParamValues,
    /// Model prediction
    prediction: Array1<f64>,
}

/// A weighted nonlinear least-squares problem over named, possibly bounded parameters.
pub struct FitProblem<'a, M: Model + ?Sized> {
    model: &'a M,
    data: &'a Dataset,
    params: &'a ParameterSet,
    transforms: Vec<BoundsTransform>,
    sqrt_weights: Array1<f64>,
    diff_method: DiffMethod,
    /// current internal parameters the solver operates on
    internal: DVector<f64>,
    /// evaluation at `internal`, `None` if the model could not be evaluated
    cached: Option<Evaluation>,
}

impl<'a, M: Model + ?Sized> FitProblem<'a, M> {
    /// Create the problem and seed it at the initial guesses.
    ///
    /// The model is evaluated once at the starting point so that a model
    /// whose output does not match the data length is rejected before the
    /// solver runs.
    ///
    /// # Arguments
    ///
    /// * `model` - The model to fit
    /// * `data` - The validated data
    /// * `params` - The parameters to fit, with their guesses and bounds
    /// * `diff_method` - How to obtain the model Jacobian
    pub fn new(
        model: &'a M,
        data: &'a Dataset,
        params: &'a ParameterSet,
        diff_method: DiffMethod,
    ) -> Result<Self> {
        if params.is_empty() {
            return Err(FitError::EmptyParameters);
        }

        let start = params
            .iter()
            .map(|p| {
                p.starting_internal_value().map_err(|e| match e {
                    ParameterError::NonFiniteValue { name } => {
                        FitError::NonFiniteGuess(name)
                    }
                    ParameterError::BoundsError(source) => {
                        FitError::InvalidBounds {
                            name: p.name().to_string(),
                            source,
                        }
                    }
                })
            })
            .collect::<Result<Vec<f64>>>()?;

        let mut problem = Self {
            model,
            data,
            params,
            transforms: params.iter().map(|p| p.transform()).collect(),
            sqrt_weights: data.weights().mapv(f64::sqrt),
            diff_method,
            internal: DVector::from_vec(start.clone()),
            cached: None,
        };

        // evaluate once eagerly to catch shape errors
        let evaluation = problem.evaluate(&start)?;
        if evaluation.prediction.len() != data.ndata() {
            return Err(FitError::DimensionMismatch(format!(
                "model returned {} values but y_data has {}",
                evaluation.prediction.len(),
                data.ndata()
            )));
        }
        problem.cached = Some(evaluation);

        tracing::debug!(
            nparams = params.len(),
            ndata = data.ndata(),
            ?diff_method,
            "constructed fit problem"
        );

        Ok(problem)
    }

    /// Map internal values to external values.
    fn to_external(&self, internal: &[f64]) -> Vec<f64> {
        self.transforms
            .iter()
            .zip(internal)
            .map(|(t, &u)| t.to_external(u))
            .collect()
    }

    fn evaluate(&self, internal: &[f64]) -> Result<Evaluation> {
        let values = self.params.values_by_name(&self.to_external(internal));
        let prediction = self.model.eval(self.data.x(), &values)?;
        Ok(Evaluation { values, prediction })
    }

    fn current(&self) -> Result<&Evaluation> {
        self.cached.as_ref().ok_or_else(|| {
            FitError::FunctionEvaluation(
                "model could not be evaluated at the current parameters".to_string(),
            )
        })
    }

    /// The parameters of this problem
    pub fn parameters(&self) -> &ParameterSet {
        self.params
    }

    /// The data of this problem
    pub fn data(&self) -> &Dataset {
        self.data
    }

    /// Current external (model-side) parameter values in registration order.
    pub fn external_values(&self) -> Vec<f64> {
        self.to_external(self.internal.as_slice())
    }

    /// Model prediction at the current parameters.
    pub fn prediction(&self) -> Result<&Array1<f64>> {
        Ok(&self.current()?.prediction)
    }

    /// Unweighted residuals `f(x, p) - y` at the current parameters.
    pub fn unweighted_residuals(&self) -> Result<Array1<f64>> {
        Ok(&self.current()?.prediction - self.data.y())
    }

    fn uses_model_jacobian(&self) -> bool {
        match self.diff_method {
            DiffMethod::Auto => self.model.has_custom_jacobian(),
            DiffMethod::FiniteDifference => false,
        }
    }

    /// Jacobian of the model with respect to the external parameters.
    ///
    /// Columns follow the registration order of the parameters. Finite
    /// differences never step a parameter past its bounds.
    pub fn model_jacobian(&self) -> Result<Array2<f64>> {
        let evaluation = self.current()?;
        let names = self.params.names();

        let jac = if self.uses_model_jacobian() {
            self.model
                .jacobian(self.data.x(), &evaluation.values, &names)?
        } else {
            let bounds: Vec<Bounds> = self.transforms.iter().map(|t| *t.bounds()).collect();
            finite_difference::jacobian(
                self.model,
                self.data.x(),
                &evaluation.values,
                &names,
                &bounds,
                None,
            )?
        };

        if jac.shape() != [self.data.ndata(), names.len()] {
            return Err(FitError::DimensionMismatch(format!(
                "Expected Jacobian of shape [{}, {}], got {:?}",
                self.data.ndata(),
                names.len(),
                jac.shape()
            )));
        }
        Ok(jac)
    }

    /// The `sqrt(w) * (f - y)` residuals as seen by the solver.
    fn weighted_residuals(&self) -> Result<DVector<f64>> {
        let evaluation = self.current()?;
        let r = (&evaluation.prediction - self.data.y()) * &self.sqrt_weights;
        Ok(DVector::from_iterator(r.len(), r.iter().copied()))
    }

    /// Whether the model output changes when one parameter moves by a finite step.
    ///
    /// The parameter at `index` is moved by `max(1, |p|)` up and down from its
    /// current value, or halfway to a limit that is closer than that. A model
    /// that cannot be evaluated at a moved point counts as depending on it.
    pub fn depends_on(&self, index: usize) -> bool {
        let (Ok(evaluation), Some(param)) = (self.current(), self.params.iter().nth(index)) else {
            return true;
        };
        let value = self.external_values()[index];
        let bounds = param.bounds();
        let step = value.abs().max(1.0);

        for target in [value + step, value - step] {
            let target = if target > bounds.max {
                value + (bounds.max - value) / 2.0
            } else if target < bounds.min {
                value + (bounds.min - value) / 2.0
            } else {
                target
            };
            if target == value {
                continue;
            }

            let mut moved = evaluation.values.clone();
            moved.insert(param.name().to_string(), target);
            match self.model.eval(self.data.x(), &moved) {
                Ok(prediction) if prediction == evaluation.prediction => {}
                _ => return true,
            }
        }

        tracing::debug!(parameter = %param.name(), "model output does not depend on parameter");
        false
    }

    /// Jacobian of the weighted residuals with respect to the internal parameters.
    ///
    /// Finite differences are taken in the internal coordinates, where every
    /// step maps to a feasible point.
    fn internal_jacobian(&self) -> Result<DMatrix<f64>> {
        self.current()?;
        if !self.uses_model_jacobian() {
            let jac = finite_difference::jacobian_unconstrained(
                self.internal.as_slice(),
                self.data.ndata(),
                None,
                |u| Ok(self.evaluate(u)?.prediction),
            )?;
            return Ok(DMatrix::from_fn(jac.nrows(), jac.ncols(), |i, j| {
                self.sqrt_weights[i] * jac[[i, j]]
            }));
        }

        let jac = self.model_jacobian()?;
        let chain: Vec<f64> = self
            .transforms
            .iter()
            .zip(self.internal.iter())
            .map(|(t, &u)| t.derivative(u))
            .collect();

        Ok(DMatrix::from_fn(jac.nrows(), jac.ncols(), |i, j| {
            self.sqrt_weights[i] * jac[[i, j]] * chain[j]
        }))
    }
}

impl<M: Model + ?Sized> std::fmt::Debug for FitProblem<'_, M> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FitProblem")
            .field("model", &"/* omitted */")
            .field("params", &self.params.names())
            .field("ndata", &self.data.ndata())
            .field("diff_method", &self.diff_method)
            .field("internal", &self.internal)
            .finish()
    }
}

impl<M: Model + ?Sized> LeastSquaresProblem<f64, Dyn, Dyn> for FitProblem<'_, M> {
    type ResidualStorage = Owned<f64, Dyn>;
    type JacobianStorage = Owned<f64, Dyn, Dyn>;
    type ParameterStorage = Owned<f64, Dyn>;

    /// Set the internal parameters and evaluate the model there.
    ///
    /// If the model fails or returns the wrong number of values the cached
    /// evaluation is cleared, which makes residuals and Jacobian return `None`
    /// and lets the solver terminate.
    fn set_params(&mut self, x: &Vector<f64, Dyn, Self::ParameterStorage>) {
        self.internal.copy_from(x);
        self.cached = match self.evaluate(self.internal.as_slice()) {
            Ok(evaluation) if evaluation.prediction.len() == self.data.ndata() => Some(evaluation),
            Ok(evaluation) => {
                tracing::debug!(
                    len = evaluation.prediction.len(),
                    "model returned the wrong number of values"
                );
                None
            }
            Err(err) => {
                tracing::debug!(error = %err, "model evaluation failed");
                None
            }
        };
    }

    fn params(&self) -> Vector<f64, Dyn, Self::ParameterStorage> {
        self.internal.clone_owned()
    }

    fn residuals(&self) -> Option<Vector<f64, Dyn, Self::ResidualStorage>> {
        self.weighted_residuals().ok()
    }

    fn jacobian(&self) -> Option<Matrix<f64, Dyn, Dyn, Self::JacobianStorage>> {
        match self.internal_jacobian() {
            Ok(jac) => Some(jac),
            Err(err) => {
                tracing::debug!(error = %err, "jacobian evaluation failed");
                None
            }
        }
    }
}
