//! Fitting a model to data.
//!
//! [`fit`] is the one-call entry point: it validates the inputs, builds a
//! [`FitProblem`], runs the solver and returns the solved parameter values,
//! optionally printing a short report. [`Fitter`] exposes the same operation
//! with the solver backend and the differentiation method as explicit
//! options, and returns a [`FitResult`] that also carries the fit
//! statistics.

use crate::data::{Dataset, Variables};
use crate::error::{FitError, Result};
use crate::model::Model;
use crate::parameters::{ParameterSet, SolvedParameters};
use crate::problem::{DiffMethod, FitProblem};
use crate::report::FitReport;
use crate::solution::Solution;
use crate::solver::{Backend, LevMarBackend, SolveReport};
use crate::statistics::{GoodnessOfFit, Uncertainties};
use ndarray::Array1;
use serde::Serialize;
use std::collections::HashMap;

/// Optional `(lower, upper)` bounds keyed by parameter name.
pub type ParamBounds = HashMap<String, (Option<f64>, Option<f64>)>;

/// Fit a model to data by weighted nonlinear least squares.
///
/// Minimizes `sum(w_i * (model(x, p)_i - y_i)^2)` over the parameters named in
/// `param_guesses`, starting from the guesses and keeping each bounded
/// parameter within its bounds. Bounds are closed: a solved value may equal a
/// limit, never cross it. Weights default to all ones and are always
/// normalized to sum to one.
///
/// # Arguments
///
/// * `model` - The model; any `Fn(&Variables, &ParamValues) -> Array1<f64>` works
/// * `x_data` - Named independent variables, each of the length of `y_data`
/// * `y_data` - Observed values
/// * `param_guesses` - Parameter names and initial guesses, in reporting order
/// * `param_bounds` - Optional bounds for some of the parameters
/// * `weights` - Optional per-point weights
/// * `verbose` - Print the solved parameters and the goodness of fit
///
/// # Returns
///
/// * The solved value of every guessed parameter, in the order of the guesses.
///   A parameter the model output does not depend on is `NaN`.
///
/// # Errors
///
/// Invalid inputs are reported before the solver runs. If the solver fails
/// the whole fit fails with [`FitError::SolverFailure`].
///
/// # Examples
///
/// ```
/// use lsqfit_rs::data::Variables;
/// use lsqfit_rs::fit::fit;
/// use lsqfit_rs::parameters::ParamValues;
/// use ndarray::array;
///
/// let x: Variables = [("t".to_string(), array![0.0, 1.0, 2.0, 3.0])].into();
/// let y = array![1.0, 3.0, 5.0, 7.0];
/// let line = |x: &Variables, p: &ParamValues| p["a"] * &x["t"] + p["b"];
///
/// let solved = fit(&line, &x, &y, &[("a", 0.0), ("b", 0.0)], None, None, false).unwrap();
/// assert!((solved["a"] - 2.0).abs() < 1e-6);
/// assert!((solved["b"] - 1.0).abs() < 1e-6);
/// ```
pub fn fit<M: Model + ?Sized>(
    model: &M,
    x_data: &Variables,
    y_data: &Array1<f64>,
    param_guesses: &[(&str, f64)],
    param_bounds: Option<&ParamBounds>,
    weights: Option<&Array1<f64>>,
    verbose: bool,
) -> Result<SolvedParameters> {
    let result = Fitter::new().verbose(verbose).fit(
        model,
        x_data,
        y_data,
        param_guesses,
        param_bounds,
        weights,
    )?;
    Ok(result.params)
}

/// Build the parameter set from guesses and optional bounds.
///
/// Every bound key must name a guessed parameter.
pub fn parameter_set(
    param_guesses: &[(&str, f64)],
    param_bounds: Option<&ParamBounds>,
) -> Result<ParameterSet> {
    let mut params = ParameterSet::from_guesses(param_guesses.iter().copied())?;

    if let Some(bounds) = param_bounds {
        // sorted so the first error reported does not depend on hash order
        let mut names: Vec<&String> = bounds.keys().collect();
        names.sort();
        for name in names {
            let (lower, upper) = bounds[name];
            params.set_bounds(name, lower, upper)?;
        }
    }

    Ok(params)
}

/// Everything known about a finished fit.
#[derive(Debug, Clone, Serialize)]
pub struct FitResult {
    /// Solved parameter values, `NaN` for unresolved parameters
    pub params: SolvedParameters,

    /// Goodness of fit at the solution
    pub goodness: GoodnessOfFit,

    /// Parameter uncertainties, if they could be estimated
    pub uncertainties: Option<Uncertainties>,

    /// What the solver reported
    pub solver: SolveReport,
}

impl FitResult {
    /// The human-readable report of this fit
    pub fn report(&self) -> FitReport<'_> {
        FitReport::new(&self.params, &self.goodness)
    }

    /// Serialize the result to pretty-printed JSON. `NaN` values become `null`.
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

/// Configurable fitter.
///
/// # Examples
///
/// ```
/// use lsqfit_rs::data::Variables;
/// use lsqfit_rs::fit::Fitter;
/// use lsqfit_rs::parameters::ParamValues;
/// use lsqfit_rs::problem::DiffMethod;
/// use lsqfit_rs::solver::{LevMarBackend, LevMarConfig};
/// use ndarray::array;
///
/// let fitter = Fitter::new()
///     .verbose(false)
///     .diff_method(DiffMethod::FiniteDifference)
///     .backend(LevMarBackend::with_config(LevMarConfig::new().with_patience(200)));
///
/// let x: Variables = [("t".to_string(), array![0.0, 1.0, 2.0])].into();
/// let model = |x: &Variables, p: &ParamValues| p["k"] * &x["t"];
/// let result = fitter
///     .fit(&model, &x, &array![0.0, 3.0, 6.0], &[("k", 1.0)], None, None)
///     .unwrap();
/// assert!((result.params["k"] - 3.0).abs() < 1e-8);
/// assert!(result.goodness.weighted_rms_error < 1e-8);
/// ```
#[derive(Debug, Clone)]
pub struct Fitter<B: Backend = LevMarBackend> {
    backend: B,
    verbose: bool,
    diff_method: DiffMethod,
}

impl Fitter<LevMarBackend> {
    /// Create a verbose fitter using the Levenberg-Marquardt backend
    pub fn new() -> Self {
        Self {
            backend: LevMarBackend::default(),
            verbose: true,
            diff_method: DiffMethod::default(),
        }
    }
}

impl Default for Fitter<LevMarBackend> {
    fn default() -> Self {
        Self::new()
    }
}

impl<B: Backend> Fitter<B> {
    /// Use a different solver backend
    pub fn backend<B2: Backend>(self, backend: B2) -> Fitter<B2> {
        Fitter {
            backend,
            verbose: self.verbose,
            diff_method: self.diff_method,
        }
    }

    /// Print a report after each fit
    pub fn verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }

    /// Choose how the model Jacobian is obtained
    pub fn diff_method(mut self, diff_method: DiffMethod) -> Self {
        self.diff_method = diff_method;
        self
    }

    /// The solver backend
    pub fn solver(&self) -> &B {
        &self.backend
    }

    /// Validate the inputs and fit. See [`fit`] for the arguments.
    pub fn fit<M: Model + ?Sized>(
        &self,
        model: &M,
        x_data: &Variables,
        y_data: &Array1<f64>,
        param_guesses: &[(&str, f64)],
        param_bounds: Option<&ParamBounds>,
        weights: Option<&Array1<f64>>,
    ) -> Result<FitResult> {
        let data = Dataset::new(x_data.clone(), y_data.clone(), weights.cloned())?;
        let params = parameter_set(param_guesses, param_bounds)?;
        self.fit_dataset(model, &data, &params)
    }

    /// Fit already validated data.
    pub fn fit_dataset<M: Model + ?Sized>(
        &self,
        model: &M,
        data: &Dataset,
        params: &ParameterSet,
    ) -> Result<FitResult> {
        let problem = FitProblem::new(model, data, params, self.diff_method)?;
        let (problem, report) = self.backend.minimize(problem);

        if !report.success {
            return Err(FitError::SolverFailure {
                backend: self.backend.name().to_string(),
                reason: report.message,
                evaluations: report.evaluations,
            });
        }

        let solution = Solution::from_problem(&problem, report);
        let solved = extract_values(&solution)?;

        let residuals = solution.residuals().ok_or_else(|| {
            FitError::FunctionEvaluation("model could not be evaluated at the solution".to_string())
        })?;
        if residuals.iter().any(|r| !r.is_finite()) {
            return Err(FitError::FunctionEvaluation(
                "model produced non-finite values at the solution".to_string(),
            ));
        }

        let nresolved = solved.iter().filter(|(_, v)| !v.is_nan()).count();
        let goodness = GoodnessOfFit::new(data, residuals, nresolved);
        let uncertainties = Uncertainties::new(&solution, data, &goodness);

        let result = FitResult {
            params: solved,
            goodness,
            uncertainties,
            solver: solution.report().clone(),
        };

        if self.verbose {
            result.report().print();
        }

        Ok(result)
    }

    /// Fit one model to many independent datasets in parallel.
    ///
    /// Every dataset gets its own problem, started from the same parameters.
    /// Results are returned in the order of `datasets`.
    #[cfg(feature = "parallel")]
    pub fn fit_many<M>(
        &self,
        model: &M,
        datasets: &[Dataset],
        params: &ParameterSet,
    ) -> Vec<Result<FitResult>>
    where
        M: Model + Sync + ?Sized,
        B: Sync,
    {
        use rayon::prelude::*;

        tracing::debug!(count = datasets.len(), "fitting datasets in parallel");
        datasets
            .par_iter()
            .map(|data| self.fit_dataset(model, data, params))
            .collect()
    }

    /// Fit one model to many independent datasets, one after the other.
    ///
    /// Every dataset gets its own problem, started from the same parameters.
    /// Results are returned in the order of `datasets`.
    #[cfg(not(feature = "parallel"))]
    pub fn fit_many<M: Model + ?Sized>(
        &self,
        model: &M,
        datasets: &[Dataset],
        params: &ParameterSet,
    ) -> Vec<Result<FitResult>> {
        datasets
            .iter()
            .map(|data| self.fit_dataset(model, data, params))
            .collect()
    }
}

/// Read every parameter off the solution, `NaN` for the unresolved ones.
fn extract_values(solution: &Solution) -> Result<SolvedParameters> {
    let mut solved = SolvedParameters::new();
    for name in solution.names() {
        let value = match solution.value(name) {
            Ok(value) => value,
            Err(FitError::ValueNotFound(_)) => {
                tracing::warn!(parameter = %name, "no value found for parameter, using NaN");
                f64::NAN
            }
            Err(err) => return Err(err),
        };
        solved.push(name, value);
    }
    Ok(solved)
}
