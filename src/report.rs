//! Human-readable fit reports.

use crate::parameters::SolvedParameters;
use crate::statistics::GoodnessOfFit;
use std::fmt;

/// Above this many parameters only their count is listed.
pub const MAX_LISTED_PARAMETERS: usize = 20;

/// Text summary of a fit: the solved parameters and the goodness of fit.
///
/// # Examples
///
/// ```
/// use lsqfit_rs::data::{Dataset, Variables};
/// use lsqfit_rs::parameters::SolvedParameters;
/// use lsqfit_rs::report::FitReport;
/// use lsqfit_rs::statistics::GoodnessOfFit;
/// use ndarray::{array, Array1};
///
/// let x: Variables = [("t".to_string(), array![0.0, 1.0])].into();
/// let data = Dataset::new(x, array![1.0, 3.0], None).unwrap();
/// let goodness = GoodnessOfFit::new(&data, &Array1::zeros(2), 1);
///
/// let mut params = SolvedParameters::new();
/// params.push("a", 2.0);
///
/// let text = FitReport::new(&params, &goodness).to_string();
/// assert!(text.contains("\ta: 2.000000"));
/// assert!(text.contains("\tR^2: 1.000000"));
/// ```
#[derive(Debug, Clone, Copy)]
pub struct FitReport<'a> {
    params: &'a SolvedParameters,
    goodness: &'a GoodnessOfFit,
}

impl<'a> FitReport<'a> {
    /// Create a report
    pub fn new(params: &'a SolvedParameters, goodness: &'a GoodnessOfFit) -> Self {
        Self { params, goodness }
    }

    /// Write the report to stdout
    pub fn print(&self) {
        println!("{}", self);
    }
}

impl fmt::Display for FitReport<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "\nFit Parameters:")?;
        if self.params.len() > MAX_LISTED_PARAMETERS {
            writeln!(f, "\t{} parameters solved for.", self.params.len())?;
        } else {
            for (name, value) in self.params.iter() {
                writeln!(f, "\t{}: {:.6}", name, value)?;
            }
        }

        writeln!(f, "\nGoodness of Fit:")?;
        writeln!(
            f,
            "\tWeighted RMS error: {:.6}",
            self.goodness.weighted_rms_error
        )?;
        write!(f, "\tR^2: {:.6}", self.goodness.r_squared)
    }
}
