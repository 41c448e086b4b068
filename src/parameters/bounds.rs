//! Parameter bounds implementation
//!
//! This module provides box constraints on fit parameters. A bounded parameter
//! is handed to the solver through the Minuit-style parameter transformation:
//! the solver works on an unbounded internal value, and every internal value
//! maps to an external value that satisfies the bounds.

use serde::{Deserialize, Serialize};
use std::f64::{INFINITY, NEG_INFINITY};
use thiserror::Error;

/// Relative distance by which an initial guess is moved off a bound.
const BOUND_PUSH: f64 = 1e-2;

/// Fraction of a two-sided interval that limits the bound push.
const BOUND_FRAC: f64 = 1e-2;

/// Errors that can occur when working with parameter bounds
#[derive(Error, Debug, Clone, PartialEq)]
pub enum BoundsError {
    #[error("min ({min}) must be less than max ({max})")]
    InvalidBounds { min: f64, max: f64 },

    #[error("bound value {0} is NaN or points into the feasible side")]
    InvalidBoundValue(f64),

    #[error("parameter value {value} is outside bounds: [{min}, {max}]")]
    ValueOutsideBounds { value: f64, min: f64, max: f64 },

    #[error("infinite parameter value is not allowed")]
    InfiniteValue,
}

/// Represents the bounds constraints on a parameter.
///
/// An unbounded side is stored as an infinity of the matching sign.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bounds {
    /// Lower limit for the parameter
    pub min: f64,

    /// Upper limit for the parameter
    pub max: f64,
}

impl Serialize for Bounds {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        use serde::ser::SerializeStruct;

        let mut state = serializer.serialize_struct("Bounds", 2)?;
        state.serialize_field("min", &self.lower())?;
        state.serialize_field("max", &self.upper())?;
        state.end()
    }
}

impl<'de> Deserialize<'de> for Bounds {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        #[derive(Deserialize)]
        struct BoundsHelper {
            #[serde(default)]
            min: Option<f64>,

            #[serde(default)]
            max: Option<f64>,
        }

        let helper = BoundsHelper::deserialize(deserializer)?;
        Bounds::from_options(helper.min, helper.max).map_err(serde::de::Error::custom)
    }
}

impl Default for Bounds {
    fn default() -> Self {
        Self {
            min: NEG_INFINITY,
            max: INFINITY,
        }
    }
}

impl Bounds {
    /// Create bounds with both sides present.
    ///
    /// # Examples
    ///
    /// ```
    /// use lsqfit_rs::parameters::Bounds;
    ///
    /// let bounds = Bounds::new(0.0, 10.0).unwrap();
    /// assert_eq!(bounds.min, 0.0);
    /// assert_eq!(bounds.max, 10.0);
    /// assert!(Bounds::new(1.0, 1.0).is_err());
    /// ```
    pub fn new(min: f64, max: f64) -> Result<Self, BoundsError> {
        Self::from_options(Some(min), Some(max))
    }

    /// Create bounds from an optional lower and an optional upper limit.
    ///
    /// A `None` side leaves the parameter unconstrained on that side. Both
    /// limits are strict, so an empty or degenerate interval is rejected.
    pub fn from_options(min: Option<f64>, max: Option<f64>) -> Result<Self, BoundsError> {
        let min = min.unwrap_or(NEG_INFINITY);
        let max = max.unwrap_or(INFINITY);

        if min.is_nan() || min == INFINITY {
            return Err(BoundsError::InvalidBoundValue(min));
        }
        if max.is_nan() || max == NEG_INFINITY {
            return Err(BoundsError::InvalidBoundValue(max));
        }
        if min >= max {
            return Err(BoundsError::InvalidBounds { min, max });
        }

        Ok(Self { min, max })
    }

    /// Create an unbounded constraint (negative infinity to positive infinity)
    pub fn unbounded() -> Self {
        Self::default()
    }

    /// Create a bounds constraint with only a minimum value
    pub fn min_only(min: f64) -> Result<Self, BoundsError> {
        Self::from_options(Some(min), None)
    }

    /// Create a bounds constraint with only a maximum value
    pub fn max_only(max: f64) -> Result<Self, BoundsError> {
        Self::from_options(None, Some(max))
    }

    /// The lower limit, if there is one.
    pub fn lower(&self) -> Option<f64> {
        self.has_lower_bound().then_some(self.min)
    }

    /// The upper limit, if there is one.
    pub fn upper(&self) -> Option<f64> {
        self.has_upper_bound().then_some(self.max)
    }

    /// Check if a value is within the bounds (limits included)
    pub fn is_within_bounds(&self, value: f64) -> bool {
        value >= self.min && value <= self.max
    }

    /// Check if the parameter is bounded from below
    pub fn has_lower_bound(&self) -> bool {
        self.min.is_finite()
    }

    /// Check if the parameter is bounded from above
    pub fn has_upper_bound(&self) -> bool {
        self.max.is_finite()
    }

    /// Check if the parameter is bounded at all
    pub fn is_bounded(&self) -> bool {
        self.has_lower_bound() || self.has_upper_bound()
    }

    /// Move a starting value strictly inside the bounds.
    ///
    /// Values that already lie in the interior, away from the limits, are
    /// returned unchanged. A value on or beyond a limit is placed at a small
    /// distance inside it, so the solver starts from a feasible interior
    /// point where the bounds transformation has a nonzero slope.
    pub fn push_inside(&self, value: f64) -> f64 {
        let mut lo_push = if self.has_lower_bound() {
            BOUND_PUSH * self.min.abs().max(1.0)
        } else {
            0.0
        };
        let mut hi_push = if self.has_upper_bound() {
            BOUND_PUSH * self.max.abs().max(1.0)
        } else {
            0.0
        };
        if self.has_lower_bound() && self.has_upper_bound() {
            let range_push = BOUND_FRAC * (self.max - self.min);
            lo_push = lo_push.min(range_push);
            hi_push = hi_push.min(range_push);
        }

        let mut pushed = value;
        if self.has_lower_bound() && pushed < self.min + lo_push {
            pushed = self.min + lo_push;
        }
        if self.has_upper_bound() && pushed > self.max - hi_push {
            pushed = self.max - hi_push;
        }
        pushed
    }
}

/// Implements the Minuit-style parameter transformations for handling bounds constraints
///
/// This allows the optimizer to work with unbounded parameters internally, while the
/// external values are constrained to be within the specified bounds.
///
/// The bounds are closed. The two-sided map reaches `max` at `u = pi/2` and
/// `min` at `u = -pi/2`, and the one-sided maps reach their limit at `u = 0`,
/// so a fitted value may sit exactly on a limit. Starting values are moved
/// off the limits by [`Bounds::push_inside`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundsTransform {
    bounds: Bounds,
}

impl BoundsTransform {
    /// Create a new bounds transform
    pub fn new(bounds: Bounds) -> Self {
        Self { bounds }
    }

    /// The bounds this transform enforces
    pub fn bounds(&self) -> &Bounds {
        &self.bounds
    }

    /// Transform an internal parameter value to an external value
    ///
    /// # Arguments
    ///
    /// * `internal_value` - The internal parameter value
    ///
    /// # Returns
    ///
    /// The corresponding external value, within the bounds with the limits included
    pub fn to_external(&self, internal_value: f64) -> f64 {
        let b = &self.bounds;
        match (b.has_lower_bound(), b.has_upper_bound()) {
            (false, false) => internal_value,
            (true, false) => b.min - 1.0 + (internal_value * internal_value + 1.0).sqrt(),
            (false, true) => b.max + 1.0 - (internal_value * internal_value + 1.0).sqrt(),
            (true, true) => b.min + (internal_value.sin() + 1.0) * (b.max - b.min) / 2.0,
        }
    }

    /// Transform an external parameter value to an internal value
    ///
    /// # Arguments
    ///
    /// * `external_value` - The external parameter value
    ///
    /// # Returns
    ///
    /// The corresponding internal value, or an error if the external value is outside bounds
    pub fn to_internal(&self, external_value: f64) -> Result<f64, BoundsError> {
        if !external_value.is_finite() {
            return Err(BoundsError::InfiniteValue);
        }

        let b = &self.bounds;
        if !b.is_within_bounds(external_value) {
            return Err(BoundsError::ValueOutsideBounds {
                value: external_value,
                min: b.min,
                max: b.max,
            });
        }

        let internal = match (b.has_lower_bound(), b.has_upper_bound()) {
            (false, false) => external_value,
            (true, false) => ((external_value - b.min + 1.0).powi(2) - 1.0).sqrt(),
            (false, true) => ((b.max - external_value + 1.0).powi(2) - 1.0).sqrt(),
            (true, true) => {
                let scaled = 2.0 * (external_value - b.min) / (b.max - b.min) - 1.0;
                // Ensure scaled is in [-1, 1] for asin
                scaled.clamp(-1.0, 1.0).asin()
            }
        };
        Ok(internal)
    }

    /// Derivative of the external value with respect to the internal value.
    ///
    /// This is the chain-rule factor that turns a model Jacobian column
    /// (taken with respect to the external parameter) into the Jacobian
    /// column the solver sees.
    pub fn derivative(&self, internal_value: f64) -> f64 {
        let b = &self.bounds;
        match (b.has_lower_bound(), b.has_upper_bound()) {
            (false, false) => 1.0,
            (true, false) => internal_value / (internal_value * internal_value + 1.0).sqrt(),
            (false, true) => -internal_value / (internal_value * internal_value + 1.0).sqrt(),
            (true, true) => internal_value.cos() * (b.max - b.min) / 2.0,
        }
    }
}
