//! Solver backends.
//!
//! A [`Backend`] takes a [`FitProblem`] seeded at the initial guesses,
//! minimizes its weighted sum of squared residuals and hands the problem
//! back positioned at the solution, together with a [`SolveReport`].
//! The default backend, [`LevMarBackend`], drives the Levenberg-Marquardt
//! implementation of the `levenberg-marquardt` crate.

use crate::error::Result;
use crate::model::Model;
use crate::problem::FitProblem;
use levenberg_marquardt::LevenbergMarquardt;
use serde::{Deserialize, Serialize};

/// Outcome of a solver run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SolveReport {
    /// Whether the backend considers the problem solved
    pub success: bool,

    /// Termination reason in the backend's words
    pub message: String,

    /// Number of residual evaluations performed
    pub evaluations: usize,

    /// Final objective value, half the weighted sum of squared residuals
    pub objective: f64,
}

/// A nonlinear least-squares solver.
pub trait Backend {
    /// Short name of the backend, used in errors and logs
    fn name(&self) -> &str;

    /// Minimize the problem, starting from its current parameters.
    ///
    /// The returned problem is positioned at the best point found, whether or
    /// not the run succeeded.
    fn minimize<'a, M: Model + ?Sized>(
        &self,
        problem: FitProblem<'a, M>,
    ) -> (FitProblem<'a, M>, SolveReport);
}

impl<B: Backend + ?Sized> Backend for &B {
    fn name(&self) -> &str {
        (**self).name()
    }

    fn minimize<'a, M: Model + ?Sized>(
        &self,
        problem: FitProblem<'a, M>,
    ) -> (FitProblem<'a, M>, SolveReport) {
        (**self).minimize(problem)
    }
}

/// Configuration options for the Levenberg-Marquardt backend.
///
/// The defaults are those of the underlying MINPACK-style implementation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LevMarConfig {
    /// Relative tolerance on the reduction of the objective. Default: 30 * f64::EPSILON
    pub ftol: f64,

    /// Relative tolerance on the change of the parameters. Default: 30 * f64::EPSILON
    pub xtol: f64,

    /// Tolerance on the orthogonality of residuals and Jacobian columns. Default: 0.0
    pub gtol: f64,

    /// Factor for the initial step bound. Default: 100.0
    pub stepbound: f64,

    /// Evaluations allowed per parameter before giving up. Default: 100
    pub patience: usize,

    /// Rescale parameters by the Jacobian column norms. Default: true
    pub scale_diag: bool,
}

impl Default for LevMarConfig {
    fn default() -> Self {
        Self {
            ftol: 30.0 * f64::EPSILON,
            xtol: 30.0 * f64::EPSILON,
            gtol: 0.0,
            stepbound: 100.0,
            patience: 100,
            scale_diag: true,
        }
    }
}

impl LevMarConfig {
    /// Create a configuration with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a configuration from JSON. Missing fields keep their defaults.
    ///
    /// # Examples
    ///
    /// ```
    /// use lsqfit_rs::solver::LevMarConfig;
    ///
    /// let config = LevMarConfig::from_json(r#"{"patience": 500}"#).unwrap();
    /// assert_eq!(config.patience, 500);
    /// assert!(config.scale_diag);
    /// ```
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Set the objective tolerance
    pub fn with_ftol(mut self, ftol: f64) -> Self {
        self.ftol = ftol;
        self
    }

    /// Set the parameter tolerance
    pub fn with_xtol(mut self, xtol: f64) -> Self {
        self.xtol = xtol;
        self
    }

    /// Set the orthogonality tolerance
    pub fn with_gtol(mut self, gtol: f64) -> Self {
        self.gtol = gtol;
        self
    }

    /// Set the initial step bound factor
    pub fn with_stepbound(mut self, stepbound: f64) -> Self {
        self.stepbound = stepbound;
        self
    }

    /// Set the evaluation budget per parameter
    pub fn with_patience(mut self, patience: usize) -> Self {
        self.patience = patience;
        self
    }

    /// Enable or disable diagonal rescaling
    pub fn with_scale_diag(mut self, scale_diag: bool) -> Self {
        self.scale_diag = scale_diag;
        self
    }
}

/// Backend built on the `levenberg-marquardt` crate.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LevMarBackend {
    config: LevMarConfig,
}

impl LevMarBackend {
    /// Create a backend with default configuration
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a backend with the given configuration
    pub fn with_config(config: LevMarConfig) -> Self {
        Self { config }
    }

    /// The configuration of this backend
    pub fn config(&self) -> &LevMarConfig {
        &self.config
    }

    fn solver(&self) -> LevenbergMarquardt<f64> {
        // The builder asserts on negative tolerances, so clamp them here.
        LevenbergMarquardt::new()
            .with_ftol(self.config.ftol.max(0.0))
            .with_xtol(self.config.xtol.max(0.0))
            .with_gtol(self.config.gtol.max(0.0))
            .with_stepbound(if self.config.stepbound > 0.0 {
                self.config.stepbound
            } else {
                LevMarConfig::default().stepbound
            })
            .with_patience(self.config.patience.max(1))
            .with_scale_diag(self.config.scale_diag)
    }
}

impl Backend for LevMarBackend {
    fn name(&self) -> &str {
        "levenberg-marquardt"
    }

    fn minimize<'a, M: Model + ?Sized>(
        &self,
        problem: FitProblem<'a, M>,
    ) -> (FitProblem<'a, M>, SolveReport) {
        tracing::debug!(config = ?self.config, "starting Levenberg-Marquardt");

        let (problem, report) = self.solver().minimize(problem);
        let solve_report = SolveReport {
            success: report.termination.was_successful(),
            message: format!("{:?}", report.termination),
            evaluations: report.number_of_evaluations,
            objective: report.objective_function,
        };

        if solve_report.success {
            tracing::debug!(
                termination = %solve_report.message,
                evaluations = solve_report.evaluations,
                objective = solve_report.objective,
                "Levenberg-Marquardt converged"
            );
        } else {
            tracing::warn!(
                termination = %solve_report.message,
                evaluations = solve_report.evaluations,
                "Levenberg-Marquardt did not converge"
            );
        }

        (problem, solve_report)
    }
}
