//! Tests for the fit entry points
//!
//! These tests check the observable contract of `fit` and `Fitter`.

// Exact recovery and the documented worked example
mod recovery_tests;


// Box constraints on parameters
mod bounds_tests;
