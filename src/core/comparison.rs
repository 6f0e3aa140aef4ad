use tracing::info;

use super::benefits::DeductionBenefit;
use super::engine::Calculator;
use super::error::{DataError, PolicyError, TaxCalcError};
use super::policy::{Assumptions, Policy, Reform};
use super::records::Population;

/// Baseline and reform results for the same population, row-aligned.
#[derive(Clone, Debug, PartialEq)]
pub struct Comparison {
    pub year: i32,
    pub baseline: Population,
    pub reform: Population,
}

impl Comparison {
    /// `reform - baseline` for one variable, in row order.
    pub fn difference(&self, name: &str) -> Result<Vec<f64>, DataError> {
        let baseline = self.baseline.column(name)?;
        let reform = self.reform.column(name)?;
        Ok(reform
            .iter()
            .zip(&baseline)
            .map(|(after, before)| after - before)
            .collect())
    }

    /// Weighted total change of one variable.
    pub fn weighted_change(&self, name: &str) -> Result<f64, DataError> {
        Ok(self.reform.weighted_total(name)? - self.baseline.weighted_total(name)?)
    }
}

/// Baseline and reform calculators for a tax year. Both policies start
/// from current law; `baseline` and `reform` provisions are applied to
/// their own copy.
pub fn build_calculators(
    year: i32,
    baseline: Option<&Reform>,
    reform: Option<&Reform>,
    assumptions: &Assumptions,
) -> Result<(Calculator, Calculator), PolicyError> {
    let mut current_law = Policy::current_law()?;
    if assumptions.has_growdiff() {
        current_law.apply_assumptions(assumptions)?;
    }

    let mut baseline_policy = current_law.clone();
    if let Some(provisions) = baseline {
        baseline_policy.implement_reform(provisions)?;
    }
    let mut reform_policy = current_law;
    if let Some(provisions) = reform {
        reform_policy.implement_reform(provisions)?;
    }

    Ok((
        Calculator::new(&baseline_policy, assumptions, year)?,
        Calculator::new(&reform_policy, assumptions, year)?,
    ))
}

/// Run both regimes on independent copies of `population`.
pub fn run_comparison<B, R>(
    baseline: &Calculator<B>,
    reform: &Calculator<R>,
    population: &Population,
) -> Result<Comparison, TaxCalcError>
where
    B: DeductionBenefit,
    R: DeductionBenefit,
{
    let expected = population.len();
    let (baseline_result, reform_result) = rayon::join(
        || {
            let mut units = population.clone();
            baseline.calc_all(&mut units);
            units
        },
        || {
            let mut units = population.clone();
            reform.calc_all(&mut units);
            units
        },
    );

    for result in [&baseline_result, &reform_result] {
        if result.len() != expected {
            return Err(DataError::RowCountMismatch {
                expected,
                actual: result.len(),
            }
            .into());
        }
    }

    info!(
        year = reform.year(),
        units = expected,
        "baseline and reform computed"
    );
    Ok(Comparison {
        year: reform.year(),
        baseline: baseline_result,
        reform: reform_result,
    })
}
