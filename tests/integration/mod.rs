//! Integration tests for the lsqfit-rs library
//!
//! This module organizes all integration tests that test the library as a whole,
//! rather than individual components.

// Noisy measurements of physical models
pub mod real_world;

// Verbose reports and JSON export
pub mod reporting;
