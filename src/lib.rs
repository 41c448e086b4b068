//! # lsqfit-rs
//!
//! `lsqfit-rs` fits models with named parameters to data by weighted
//! nonlinear least squares.
//!
//! The library provides:
//! - A one-call [`fit`] function and a configurable [`Fitter`]
//! - Named parameters with optional lower and/or upper bounds
//! - Weighted residuals with automatic weight normalization
//! - Goodness-of-fit statistics and parameter uncertainties
//! - Pluggable solver backends, Levenberg-Marquardt from the
//!   `levenberg-marquardt` crate by default
//!
//! ## Basic Usage
//!
//! ```
//! use lsqfit_rs::data::Variables;
//! use lsqfit_rs::parameters::ParamValues;
//! use ndarray::array;
//!
//! // y = a*t + b
//! let x: Variables = [("t".to_string(), array![0.0, 1.0, 2.0, 3.0])].into();
//! let y = array![1.0, 3.0, 5.0, 7.0];
//! let model = |x: &Variables, p: &ParamValues| p["a"] * &x["t"] + p["b"];
//!
//! let solved = lsqfit_rs::fit(&model, &x, &y, &[("a", 0.0), ("b", 0.0)], None, None, true)
//!     .unwrap();
//!
//! assert!((solved["a"] - 2.0).abs() < 1e-6);
//! assert!((solved["b"] - 1.0).abs() < 1e-6);
//! ```
//!
//! With `verbose` set this prints
//!
//! ```text
//!
//! Fit Parameters:
//!     a: 2.000000
//!     b: 1.000000
//!
//! Goodness of Fit:
//!     Weighted RMS error: 0.000000
//!     R^2: 1.000000
//! ```

// Public modules
pub mod data;
pub mod error;
pub mod fit;
pub mod model;
pub mod parameters;
pub mod problem;
pub mod report;
pub mod solution;
pub mod solver;
pub mod statistics;

mod utils;

// Re-exports for convenience
pub use data::{Dataset, Variables};
pub use error::{FitError, Result};
pub use fit::{fit, FitResult, Fitter, ParamBounds};
pub use model::{FnModel, Model};
pub use parameters::{ParamValues, SolvedParameters};
pub use problem::DiffMethod;
pub use solver::{Backend, LevMarBackend, LevMarConfig};

/// Version of the library
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
