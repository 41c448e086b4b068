//! Parameter collections
//!
//! [`ParameterSet`] holds the parameters registered for one fit, in the order
//! their guesses were given. [`SolvedParameters`] holds the values extracted
//! from a solution, with the same names in the same order.

use crate::error::{FitError, Result};
use crate::parameters::bounds::Bounds;
use crate::parameters::parameter::Parameter;
use serde::ser::SerializeMap;
use serde::{Serialize, Serializer};
use std::collections::HashMap;
use std::ops::Index;

/// Named parameter values as handed to a model.
pub type ParamValues = HashMap<String, f64>;

/// An ordered collection of fit parameters
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ParameterSet {
    params: Vec<Parameter>,
}

impl ParameterSet {
    /// Create a new empty parameter set
    pub fn new() -> Self {
        Self { params: Vec::new() }
    }

    /// Create a parameter set from (name, initial guess) pairs.
    ///
    /// # Examples
    ///
    /// ```
    /// use lsqfit_rs::parameters::ParameterSet;
    ///
    /// let params = ParameterSet::from_guesses([("a", 0.0), ("b", 1.0)]).unwrap();
    /// assert_eq!(params.names(), vec!["a", "b"]);
    /// ```
    pub fn from_guesses<I, S>(guesses: I) -> Result<Self>
    where
        I: IntoIterator<Item = (S, f64)>,
        S: AsRef<str>,
    {
        let mut set = Self::new();
        for (name, guess) in guesses {
            set.add(Parameter::new(name.as_ref(), guess))?;
        }
        Ok(set)
    }

    /// Add a parameter. Names must be unique.
    pub fn add(&mut self, param: Parameter) -> Result<()> {
        if self.contains(param.name()) {
            return Err(FitError::DuplicateParameter(param.name.clone()));
        }
        self.params.push(param);
        Ok(())
    }

    /// Restrict an already registered parameter.
    ///
    /// `lower` and `upper` are optional, so one-sided bounds are expressed
    /// by leaving the other side as `None`.
    pub fn set_bounds(&mut self, name: &str, lower: Option<f64>, upper: Option<f64>) -> Result<()> {
        let bounds = Bounds::from_options(lower, upper).map_err(|source| FitError::InvalidBounds {
            name: name.to_string(),
            source,
        })?;
        let param = self
            .params
            .iter_mut()
            .find(|p| p.name() == name)
            .ok_or_else(|| FitError::UnknownBoundParameter(name.to_string()))?;
        param.set_bounds(bounds);
        Ok(())
    }

    /// Get a parameter by name
    pub fn get(&self, name: &str) -> Option<&Parameter> {
        self.params.iter().find(|p| p.name() == name)
    }

    /// Check whether a parameter with this name is registered
    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    /// Get the position of a parameter in the set
    pub fn index_of(&self, name: &str) -> Option<usize> {
        self.params.iter().position(|p| p.name() == name)
    }

    /// Number of parameters
    pub fn len(&self) -> usize {
        self.params.len()
    }

    /// Check whether the set is empty
    pub fn is_empty(&self) -> bool {
        self.params.is_empty()
    }

    /// Parameter names in registration order
    pub fn names(&self) -> Vec<&str> {
        self.params.iter().map(|p| p.name()).collect()
    }

    /// Iterate over the parameters in registration order
    pub fn iter(&self) -> impl Iterator<Item = &Parameter> {
        self.params.iter()
    }

    /// Map the given external values onto parameter names.
    pub fn values_by_name(&self, values: &[f64]) -> ParamValues {
        self.params
            .iter()
            .zip(values)
            .map(|(p, &v)| (p.name.clone(), v))
            .collect()
    }
}

/// Parameter values extracted from a solution.
///
/// A parameter whose value could not be extracted holds `NaN`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SolvedParameters {
    values: Vec<(String, f64)>,
}

impl SolvedParameters {
    /// Create an empty collection
    pub fn new() -> Self {
        Self { values: Vec::new() }
    }

    /// Append a solved value
    pub fn push(&mut self, name: &str, value: f64) {
        self.values.push((name.to_string(), value));
    }

    /// Get the solved value of a parameter
    pub fn get(&self, name: &str) -> Option<f64> {
        self.values
            .iter()
            .find(|(n, _)| n == name)
            .map(|&(_, v)| v)
    }

    /// Whether the parameter is present but has no value (`NaN`)
    pub fn is_missing(&self, name: &str) -> bool {
        self.get(name).is_some_and(f64::is_nan)
    }

    /// Number of parameters
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Check whether the collection is empty
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Parameter names in registration order
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.values.iter().map(|(n, _)| n.as_str())
    }

    /// Iterate over (name, value) pairs in registration order
    pub fn iter(&self) -> impl Iterator<Item = (&str, f64)> {
        self.values.iter().map(|(n, v)| (n.as_str(), *v))
    }

    /// Convert into a map keyed by parameter name
    pub fn to_map(&self) -> ParamValues {
        self.values.iter().cloned().collect()
    }
}

impl Index<&str> for SolvedParameters {
    type Output = f64;

    fn index(&self, name: &str) -> &f64 {
        self.values
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v)
            .unwrap_or_else(|| panic!("no parameter named '{name}'"))
    }
}

impl Serialize for SolvedParameters {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        // NaN has no JSON representation and is written as null
        let mut map = serializer.serialize_map(Some(self.values.len()))?;
        for (name, value) in &self.values {
            if value.is_nan() {
                map.serialize_entry(name, &Option::<f64>::None)?;
            } else {
                map.serialize_entry(name, value)?;
            }
        }
        map.end()
    }
}
