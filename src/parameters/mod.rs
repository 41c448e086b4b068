//! # Parameter System
//!
//! Named fit parameters, their initial guesses and their box constraints.
//!
//! ## Core Components
//!
//! - [`Parameter`]: a named parameter with an initial guess and bounds
//! - [`ParameterSet`]: the ordered parameters registered for one fit
//! - [`Bounds`] and [`BoundsTransform`]: box constraints and the transformation
//!   that keeps every solver iterate inside them
//! - [`SolvedParameters`]: the values extracted from a solution
//!
//! ## Example Usage
//!
//! ```rust
//! use lsqfit_rs::parameters::ParameterSet;
//!
//! let mut params = ParameterSet::from_guesses([("amplitude", 3.0), ("decay", 0.5)]).unwrap();
//!
//! // decay must stay positive, amplitude is free
//! params.set_bounds("decay", Some(0.0), None).unwrap();
//!
//! assert!(params.get("decay").unwrap().bounds().has_lower_bound());
//! assert!(!params.get("amplitude").unwrap().bounds().is_bounded());
//! ```

pub mod bounds;
pub mod parameter;
pub mod parameters;

// Re-export key types
pub use bounds::{Bounds, BoundsError, BoundsTransform};
pub use parameter::{Parameter, ParameterError};
pub use parameters::{ParamValues, ParameterSet, SolvedParameters};
