//! Integration tests for reports and result export

use crate::test_helpers::{line, vars_t};
use lsqfit_rs::{Fitter, ParamValues, Variables};
use ndarray::{array, Array1};

#[test]
fn test_report_of_worked_example() {
    let x = vars_t(array![0.0, 1.0, 2.0, 3.0]);
    let y = array![1.0, 3.0, 5.0, 7.0];
    let result = Fitter::new()
        .verbose(false)
        .fit(&line, &x, &y, &[("a", 0.0), ("b", 0.0)], None, None)
        .unwrap();

    let text = result.report().to_string();
    assert_eq!(
        text,
        "\nFit Parameters:\n\ta: 2.000000\n\tb: 1.000000\n\nGoodness of Fit:\n\
         \tWeighted RMS error: 0.000000\n\tR^2: 1.000000"
    );
}

#[test]
fn test_report_with_many_parameters_lists_count() {
    // one level per group of three points
    let ngroups = 22;
    let group = Array1::from_iter((0..ngroups * 3).map(|i| (i / 3) as f64));
    let y = group.mapv(|g| 0.5 * g - 1.0);
    let x: Variables = [("group".to_string(), group)].into();
    let levels = |x: &Variables, p: &ParamValues| {
        x["group"].mapv(|g| p[&format!("level{}", g as usize)])
    };

    let names: Vec<String> = (0..ngroups).map(|g| format!("level{}", g)).collect();
    let guesses: Vec<(&str, f64)> = names.iter().map(|n| (n.as_str(), 0.0)).collect();

    let result = Fitter::new()
        .verbose(false)
        .fit(&levels, &x, &y, &guesses, None, None)
        .unwrap();

    assert!((result.params["level21"] - 9.5).abs() < 1e-6);
    let text = result.report().to_string();
    assert!(text.starts_with("\nFit Parameters:\n\t22 parameters solved for.\n"));
    assert!(!text.contains("level0"));
    assert!(text.contains("\tR^2: 1.000000"));
}

#[test]
fn test_json_export() {
    let x = vars_t(array![0.0, 1.0, 2.0, 3.0, 4.0]);
    let y = array![0.9, 3.1, 5.0, 7.2, 8.8];
    let result = Fitter::new()
        .verbose(false)
        .fit(&line, &x, &y, &[("a", 0.0), ("b", 0.0)], None, None)
        .unwrap();

    let json = result.to_json().unwrap();
    let value: serde_json::Value = serde_json::from_str(&json).unwrap();

    assert!(value["params"]["a"].is_number());
    assert!(value["goodness"]["r_squared"].as_f64().unwrap() > 0.99);
    assert_eq!(value["uncertainties"]["names"][0], "a");
    assert!(!value["uncertainties"]["covariance"].is_null());
    assert_eq!(value["solver"]["success"], true);
}
