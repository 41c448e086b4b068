//! Parameter definition and implementation
//!
//! This module provides the Parameter struct: a named scalar that the solver
//! varies, seeded at an initial guess and optionally restricted by bounds.

use crate::parameters::bounds::{Bounds, BoundsError, BoundsTransform};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors that can occur when working with parameters
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ParameterError {
    #[error("Initial value of parameter '{name}' is not finite")]
    NonFiniteValue { name: String },

    #[error("Bounds error: {0}")]
    BoundsError(#[from] BoundsError),
}

/// A fit parameter
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Parameter {
    /// Name of the parameter
    pub name: String,

    /// Initial guess the solver starts from
    init_value: f64,

    /// Minimum and maximum bounds for the parameter value
    bounds: Bounds,
}

impl Parameter {
    /// Create a new unbounded parameter with the given name and initial guess
    ///
    /// # Examples
    ///
    /// ```
    /// use lsqfit_rs::parameters::Parameter;
    ///
    /// let param = Parameter::new("amplitude", 10.0);
    /// assert_eq!(param.name(), "amplitude");
    /// assert_eq!(param.init_value(), 10.0);
    /// assert!(!param.bounds().is_bounded());
    /// ```
    pub fn new(name: &str, init_value: f64) -> Self {
        Self {
            name: name.to_string(),
            init_value,
            bounds: Bounds::unbounded(),
        }
    }

    /// Create a new parameter restricted to the given bounds
    pub fn with_bounds(name: &str, init_value: f64, bounds: Bounds) -> Self {
        Self {
            name: name.to_string(),
            init_value,
            bounds,
        }
    }

    /// Get the name of the parameter
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Get the initial guess
    pub fn init_value(&self) -> f64 {
        self.init_value
    }

    /// Get the bounds of the parameter
    pub fn bounds(&self) -> &Bounds {
        &self.bounds
    }

    /// Replace the bounds of the parameter
    pub fn set_bounds(&mut self, bounds: Bounds) {
        self.bounds = bounds;
    }

    /// The transformation between solver (internal) and model (external) values
    pub fn transform(&self) -> BoundsTransform {
        BoundsTransform::new(self.bounds)
    }

    /// The internal value the solver is seeded with.
    ///
    /// The initial guess is first moved strictly inside the bounds.
    pub fn starting_internal_value(&self) -> Result<f64, ParameterError> {
        if !self.init_value.is_finite() {
            return Err(ParameterError::NonFiniteValue {
                name: self.name.clone(),
            });
        }
        let start = self.bounds.push_inside(self.init_value);
        if start != self.init_value {
            tracing::debug!(
                parameter = %self.name,
                guess = self.init_value,
                start,
                "moved initial guess inside its bounds"
            );
        }
        Ok(self.transform().to_internal(start)?)
    }
}
