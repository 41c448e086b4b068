//! Integration tests for real-world fitting problems
//!
//! Synthetic measurements with reproducible noise, fitted the way a user
//! would fit laboratory data.

use crate::test_helpers::{exp_decay, vars_t, with_noise};
use lsqfit_rs::{FitResult, Fitter, FnModel, ParamBounds, ParamValues, Variables};
use ndarray::Array1;

fn quiet() -> Fitter {
    Fitter::new().verbose(false)
}

/// True value lies within `k` standard errors of the estimate
fn within_sigma(result: &FitResult, name: &str, truth: f64, k: f64) -> bool {
    let unc = result.uncertainties.as_ref().expect("uncertainties");
    let sigma = unc.standard_error(name).expect("standard error");
    (result.params[name] - truth).abs() <= k * sigma
}

#[test]
fn test_radioactive_decay() {
    // counts = amp * exp(-t / tau) + background
    let t = Array1::<f64>::linspace(0.0, 10.0, 60);
    let clean = t.mapv(|t| 120.0 * (-t / 2.5).exp() + 8.0);
    let y = with_noise(&clean, 1.5, 2024);
    let x = vars_t(t);

    let result = quiet()
        .fit(
            &exp_decay,
            &x,
            &y,
            &[("amp", 50.0), ("tau", 1.0), ("offset", 0.0)],
            None,
            None,
        )
        .unwrap();

    assert!((result.params["amp"] - 120.0).abs() < 5.0);
    assert!((result.params["tau"] - 2.5).abs() < 0.25);
    assert!((result.params["offset"] - 8.0).abs() < 2.0);
    assert!(result.goodness.r_squared > 0.99);
    assert_eq!(result.goodness.nfree, 57);

    for (name, truth) in [("amp", 120.0), ("tau", 2.5), ("offset", 8.0)] {
        assert!(within_sigma(&result, name, truth, 5.0), "{} too far off", name);
    }

    // weighted RMS error is close to the noise level
    assert!((result.goodness.weighted_rms_error - 1.5).abs() < 0.5);
}

#[test]
fn test_gaussian_peak_with_bounds() {
    let gaussian = FnModel::new(|x: &Variables, p: &ParamValues| {
        Ok(x["energy"].mapv(|e| {
            p["height"] * (-(e - p["center"]).powi(2) / (2.0 * p["width"].powi(2))).exp()
        }))
    });

    let energy = Array1::<f64>::linspace(-5.0, 5.0, 101);
    let clean = energy.mapv(|e: f64| 4.0 * (-(e - 0.7).powi(2) / (2.0 * 0.9f64.powi(2))).exp());
    let y = with_noise(&clean, 0.05, 99);
    let x: Variables = [("energy".to_string(), energy)].into();

    // a negative width is the same peak; bounds pick the positive one
    let bounds: ParamBounds = [
        ("width".to_string(), (Some(0.01), Some(5.0))),
        ("height".to_string(), (Some(0.0), None)),
    ]
    .into();

    let result = quiet()
        .fit(
            &gaussian,
            &x,
            &y,
            &[("height", 1.0), ("center", 0.0), ("width", 2.0)],
            Some(&bounds),
            None,
        )
        .unwrap();

    assert!((result.params["height"] - 4.0).abs() < 0.1);
    assert!((result.params["center"] - 0.7).abs() < 0.05);
    assert!((result.params["width"] - 0.9).abs() < 0.05);
    assert!(result.params["width"] > 0.0);
    assert!(result.goodness.r_squared > 0.99);
}

#[test]
fn test_heteroscedastic_data_with_inverse_variance_weights() {
    // noise grows with t; weights 1/sigma^2 downweight the noisy tail
    let t = Array1::<f64>::linspace(0.0, 8.0, 80);
    let sigma = t.mapv(|t| 0.02 + 0.1 * t);
    let clean = t.mapv(|t| 3.0 * (-t / 2.0).exp() + 0.5);
    let noise = with_noise(&Array1::zeros(80), 1.0, 5);
    let y = &clean + &(&noise * &sigma);
    let weights = sigma.mapv(|s| 1.0 / (s * s));
    let x = vars_t(t);
    let guesses = [("amp", 1.0), ("tau", 1.0), ("offset", 0.0)];

    let weighted = quiet()
        .fit(&exp_decay, &x, &y, &guesses, None, Some(&weights))
        .unwrap();

    assert!((weighted.params["amp"] - 3.0).abs() < 0.1);
    assert!((weighted.params["tau"] - 2.0).abs() < 0.2);
    for (name, truth) in [("amp", 3.0), ("tau", 2.0), ("offset", 0.5)] {
        assert!(within_sigma(&weighted, name, truth, 5.0), "{} too far off", name);
    }
}
