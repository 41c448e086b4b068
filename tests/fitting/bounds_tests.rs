use crate::test_helpers::{exp_decay, line, vars_t};
use approx::assert_relative_eq;
use lsqfit_rs::{FitError, Fitter, LevMarBackend, LevMarConfig, ParamBounds, ParamValues, Variables};
use ndarray::{array, Array1};
use std::cell::Cell;

/// Optima on a bound are approached slowly through the transform,
/// so give the solver more room than the defaults.
fn bounded_fitter() -> Fitter {
    Fitter::new().verbose(false).backend(LevMarBackend::with_config(
        LevMarConfig::new()
            .with_ftol(1e-12)
            .with_xtol(1e-12)
            .with_patience(1000),
    ))
}

fn bounds(entries: &[(&str, Option<f64>, Option<f64>)]) -> ParamBounds {
    entries
        .iter()
        .map(|&(name, lo, hi)| (name.to_string(), (lo, hi)))
        .collect()
}

#[test]
fn test_bound_excluding_optimum_is_respected() {
    let x = vars_t(array![0.0, 1.0, 2.0, 3.0]);
    let y = array![1.0, 3.0, 5.0, 7.0];
    let b = bounds(&[("a", Some(0.0), Some(1.5))]);

    let result = bounded_fitter()
        .fit(&line, &x, &y, &[("a", 1.0), ("b", 0.0)], Some(&b), None)
        .unwrap();

    let a = result.params["a"];
    assert!((0.0..=1.5).contains(&a), "a = {} left its bounds", a);
    assert_relative_eq!(a, 1.5, epsilon = 1e-4);
    assert!(result.goodness.weighted_rms_error > 0.0);
}

#[test]
fn test_model_undefined_below_bound_fits_at_the_bound() {
    let x = vars_t(array![0.0, 1.0, 2.0, 3.0]);
    let y = array![1.0, 1.0, 1.0, 1.0];
    let b = bounds(&[("a", Some(0.0), None)]);
    let lowest = Cell::new(f64::INFINITY);
    // sqrt(a) is NaN for a < 0
    let model = |x: &Variables, p: &ParamValues| {
        lowest.set(lowest.get().min(p["a"]));
        p["a"].sqrt() * &x["t"] + p["b"]
    };

    let result = Fitter::new()
        .verbose(false)
        .fit(&model, &x, &y, &[("a", 1.0), ("b", 0.0)], Some(&b), None)
        .unwrap();

    assert!(lowest.get() >= 0.0, "model evaluated at a = {}", lowest.get());
    let a = result.params["a"];
    assert!((0.0..1e-6).contains(&a), "a = {}", a);
    assert_relative_eq!(result.params["b"], 1.0, epsilon = 1e-4);
    assert!(result.solver.success);
}

#[test]
fn test_upper_bound_only() {
    let x = vars_t(array![0.0, 1.0, 2.0]);
    let y = array![4.0, 5.0, 6.0];
    let constant = |x: &Variables, p: &ParamValues| x["t"].mapv(|_| p["c"]);
    let b = bounds(&[("c", None, Some(3.0))]);

    let result = bounded_fitter()
        .fit(&constant, &x, &y, &[("c", 0.0)], Some(&b), None)
        .unwrap();

    let c = result.params["c"];
    assert!(c <= 3.0);
    assert_relative_eq!(c, 3.0, epsilon = 1e-4);
}

#[test]
fn test_inactive_bounds_do_not_move_the_optimum() {
    let t = Array1::<f64>::linspace(0.0, 6.0, 40);
    let y = t.mapv(|t| 2.0 * (-t / 1.5).exp() + 0.4);
    let x = vars_t(t);
    let b = bounds(&[("tau", Some(0.1), Some(10.0)), ("offset", Some(0.0), None)]);

    let result = bounded_fitter()
        .fit(
            &exp_decay,
            &x,
            &y,
            &[("amp", 1.0), ("tau", 1.0), ("offset", 0.1)],
            Some(&b),
            None,
        )
        .unwrap();

    assert_relative_eq!(result.params["amp"], 2.0, epsilon = 1e-6);
    assert_relative_eq!(result.params["tau"], 1.5, epsilon = 1e-6);
    assert_relative_eq!(result.params["offset"], 0.4, epsilon = 1e-6);
}

#[test]
fn test_partial_bounds_leave_other_parameters_free() {
    // the optimum of the free intercept is negative
    let x = vars_t(array![0.0, 1.0, 2.0, 3.0]);
    let y = array![-4.0, -1.0, 2.0, 5.0];
    let b = bounds(&[("a", Some(0.0), None)]);

    let result = bounded_fitter()
        .fit(&line, &x, &y, &[("a", 1.0), ("b", 0.0)], Some(&b), None)
        .unwrap();

    assert_relative_eq!(result.params["a"], 3.0, epsilon = 1e-6);
    assert_relative_eq!(result.params["b"], -4.0, epsilon = 1e-6);
}

#[test]
fn test_guess_outside_bounds_is_moved_inside() {
    let x = vars_t(array![0.0, 1.0, 2.0, 3.0]);
    let y = array![1.0, 3.0, 5.0, 7.0];
    let b = bounds(&[("a", Some(-1.0), Some(5.0))]);

    let result = bounded_fitter()
        .fit(&line, &x, &y, &[("a", 50.0), ("b", 0.0)], Some(&b), None)
        .unwrap();

    assert_relative_eq!(result.params["a"], 2.0, epsilon = 1e-6);
    assert_relative_eq!(result.params["b"], 1.0, epsilon = 1e-6);
}

#[test]
fn test_invalid_bounds_are_rejected() {
    let x = vars_t(array![0.0, 1.0]);
    let y = array![1.0, 3.0];
    let fitter = Fitter::new().verbose(false);

    let b = bounds(&[("a", Some(2.0), Some(1.0))]);
    let err = fitter
        .fit(&line, &x, &y, &[("a", 1.0), ("b", 0.0)], Some(&b), None)
        .unwrap_err();
    assert!(matches!(err, FitError::InvalidBounds { ref name, .. } if name == "a"));

    let b = bounds(&[("slope", Some(0.0), None)]);
    let err = fitter
        .fit(&line, &x, &y, &[("a", 1.0), ("b", 0.0)], Some(&b), None)
        .unwrap_err();
    assert!(matches!(err, FitError::UnknownBoundParameter(name) if name == "slope"));
}
