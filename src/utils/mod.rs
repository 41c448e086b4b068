//! Utility functions and helpers for the lsqfit-rs library.

pub mod finite_difference;
