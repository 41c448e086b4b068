use crate::test_helpers::{line, vars_t};
use approx::assert_relative_eq;
use lsqfit_rs::{fit, DiffMethod, FitError, Fitter, FnModel, ParamValues, Variables};
use ndarray::{array, Array1};

#[test]
fn test_worked_example() {
    let x = vars_t(array![0.0, 1.0, 2.0, 3.0]);
    let y = array![1.0, 3.0, 5.0, 7.0];

    let result = Fitter::new()
        .verbose(false)
        .fit(&line, &x, &y, &[("a", 0.0), ("b", 0.0)], None, None)
        .unwrap();

    assert_relative_eq!(result.params["a"], 2.0, epsilon = 1e-6);
    assert_relative_eq!(result.params["b"], 1.0, epsilon = 1e-6);
    assert!(result.goodness.weighted_rms_error < 1e-6);
    assert_relative_eq!(result.goodness.r_squared, 1.0, epsilon = 1e-9);
}

#[test]
fn test_fit_function_returns_guess_order() {
    let x = vars_t(array![0.0, 1.0, 2.0, 3.0]);
    let y = array![1.0, 3.0, 5.0, 7.0];

    let solved = fit(&line, &x, &y, &[("b", 0.0), ("a", 0.0)], None, None, false).unwrap();
    assert_eq!(solved.names().collect::<Vec<_>>(), vec!["b", "a"]);
    assert_relative_eq!(solved["a"], 2.0, epsilon = 1e-6);
    assert_relative_eq!(solved["b"], 1.0, epsilon = 1e-6);
}

#[test]
fn test_exact_linear_recovery_from_poor_guesses() {
    let t = Array1::<f64>::linspace(-5.0, 5.0, 25);
    let y = t.mapv(|t| -3.25 * t + 12.5);
    let x = vars_t(t);

    let solved = fit(&line, &x, &y, &[("a", 100.0), ("b", -40.0)], None, None, false).unwrap();
    assert_relative_eq!(solved["a"], -3.25, epsilon = 1e-6);
    assert_relative_eq!(solved["b"], 12.5, epsilon = 1e-6);
}

#[test]
fn test_model_with_two_variables() {
    // z = a*u + b*v + c
    let u = array![0.0, 1.0, 0.0, 1.0, 2.0, 3.0];
    let v = array![0.0, 0.0, 1.0, 1.0, 5.0, -2.0];
    let y = 0.5 * &u - 1.5 * &v + 4.0;
    let x: Variables = [("u".to_string(), u), ("v".to_string(), v)].into();
    let model = |x: &Variables, p: &ParamValues| p["a"] * &x["u"] + p["b"] * &x["v"] + p["c"];

    let solved = fit(
        &model,
        &x,
        &y,
        &[("a", 1.0), ("b", 1.0), ("c", 1.0)],
        None,
        None,
        false,
    )
    .unwrap();
    assert_relative_eq!(solved["a"], 0.5, epsilon = 1e-6);
    assert_relative_eq!(solved["b"], -1.5, epsilon = 1e-6);
    assert_relative_eq!(solved["c"], 4.0, epsilon = 1e-6);
}

#[test]
fn test_model_without_independent_variables() {
    // fitting a constant: the least-squares value is the mean
    let y = array![2.0, 4.0, 9.0];
    let model = |_: &Variables, p: &ParamValues| Array1::from_elem(3, p["c"]);

    let solved = fit(&model, &Variables::new(), &y, &[("c", 0.0)], None, None, false).unwrap();
    assert_relative_eq!(solved["c"], 5.0, epsilon = 1e-6);
}

#[test]
fn test_analytic_and_numerical_jacobians_agree() {
    let t = Array1::<f64>::linspace(0.0, 4.0, 20);
    let y = t.mapv(|t| 3.0 * (-t / 1.3).exp());
    let x = vars_t(t);

    let model = FnModel::new(|x: &Variables, p: &ParamValues| {
        Ok(x["t"].mapv(|t| p["amp"] * (-t / p["tau"]).exp()))
    })
    .with_partial("amp", |x: &Variables, p: &ParamValues| {
        x["t"].mapv(|t| (-t / p["tau"]).exp())
    })
    .with_partial("tau", |x: &Variables, p: &ParamValues| {
        x["t"].mapv(|t| p["amp"] * t / p["tau"].powi(2) * (-t / p["tau"]).exp())
    });
    let guesses = [("amp", 1.0), ("tau", 1.0)];

    let analytic = Fitter::new()
        .verbose(false)
        .fit(&model, &x, &y, &guesses, None, None)
        .unwrap();
    let numeric = Fitter::new()
        .verbose(false)
        .diff_method(DiffMethod::FiniteDifference)
        .fit(&model, &x, &y, &guesses, None, None)
        .unwrap();

    for name in ["amp", "tau"] {
        assert_relative_eq!(analytic.params[name], numeric.params[name], epsilon = 1e-6);
    }
    assert_relative_eq!(analytic.params["amp"], 3.0, epsilon = 1e-6);
    assert_relative_eq!(analytic.params["tau"], 1.3, epsilon = 1e-6);
}

#[test]
fn test_failing_model_at_start_propagates() {
    let x = vars_t(array![0.0, 1.0]);
    let model = FnModel::new(|_: &Variables, _: &ParamValues| {
        Err(FitError::FunctionEvaluation("cannot evaluate".to_string()))
    });

    let err = fit(&model, &x, &array![1.0, 2.0], &[("a", 1.0)], None, None, false).unwrap_err();
    assert!(matches!(err, FitError::FunctionEvaluation(_)));
}
