//! The solution of a fit, detached from the problem it came from.

use crate::error::{FitError, Result};
use crate::model::Model;
use crate::problem::FitProblem;
use crate::solver::SolveReport;
use ndarray::{Array1, Array2};

/// The point a solver stopped at, with what is needed to read values off it.
#[derive(Debug, Clone)]
pub struct Solution {
    names: Vec<String>,
    values: Vec<f64>,
    /// Model Jacobian with respect to the external parameters at `values`
    jacobian: Option<Array2<f64>>,
    /// Unweighted residuals at `values`
    residuals: Option<Array1<f64>>,
    /// Whether the model output changes with each parameter
    dependent: Vec<bool>,
    report: SolveReport,
}

impl Solution {
    /// Capture the state of a solved problem.
    pub fn from_problem<M: Model + ?Sized>(problem: &FitProblem<'_, M>, report: SolveReport) -> Self {
        let jacobian = match problem.model_jacobian() {
            Ok(jac) => Some(jac),
            Err(err) => {
                tracing::debug!(error = %err, "no Jacobian at the solution");
                None
            }
        };

        let dependent = (0..problem.parameters().len())
            .map(|j| problem.depends_on(j))
            .collect();

        Self {
            names: problem
                .parameters()
                .names()
                .into_iter()
                .map(String::from)
                .collect(),
            values: problem.external_values(),
            jacobian,
            residuals: problem.unweighted_residuals().ok(),
            dependent,
            report,
        }
    }

    /// Value of one parameter at the solution.
    ///
    /// Fails with [`FitError::ValueNotFound`] when the parameter is not part
    /// of the problem, its value is not finite, or the model output does not
    /// change when the parameter moves. A parameter sitting at a stationary
    /// point of the model still has a value.
    pub fn value(&self, name: &str) -> Result<f64> {
        let index = self
            .names
            .iter()
            .position(|n| n == name)
            .ok_or_else(|| FitError::ValueNotFound(name.to_string()))?;

        let value = self.values[index];
        if !value.is_finite() || !self.dependent[index] {
            return Err(FitError::ValueNotFound(name.to_string()));
        }

        Ok(value)
    }

    /// Parameter names in registration order
    pub fn names(&self) -> &[String] {
        &self.names
    }

    /// Raw parameter values in registration order, including unresolved ones
    pub fn values(&self) -> &[f64] {
        &self.values
    }

    /// Model Jacobian at the solution, if it could be evaluated
    pub fn jacobian(&self) -> Option<&Array2<f64>> {
        self.jacobian.as_ref()
    }

    /// Unweighted residuals `f(x, p) - y` at the solution, if the model could be evaluated
    pub fn residuals(&self) -> Option<&Array1<f64>> {
        self.residuals.as_ref()
    }

    /// What the solver reported
    pub fn report(&self) -> &SolveReport {
        &self.report
    }
}
