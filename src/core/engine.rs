use rayon::prelude::*;
use tracing::{debug, info};

use super::benefits::{
    DeductionBenefit, MarginalRateBenefit, benefit_limitation, benefit_programs, benefit_surtax,
};
use super::calcfunctions::{TaxComputation, final_stages, income_stages};
use super::error::PolicyError;
use super::policy::{Assumptions, BenefitValues, Policy, PolicyParams};
use super::records::Population;

#[derive(Clone, Debug)]
pub struct Calculator<B = MarginalRateBenefit> {
    params: PolicyParams,
    benefit_values: BenefitValues,
    measure: B,
}

impl Calculator<MarginalRateBenefit> {
    pub fn new(policy: &Policy, assumptions: &Assumptions, year: i32) -> Result<Self, PolicyError> {
        let params = policy.params_for_year(year)?;
        Ok(Self::from_params(params, assumptions.benefit_values(year)))
    }

    pub fn from_params(params: PolicyParams, benefit_values: BenefitValues) -> Self {
        Self {
            params,
            benefit_values,
            measure: MarginalRateBenefit,
        }
    }
}

impl<B: DeductionBenefit> Calculator<B> {
    pub fn with_measure<M: DeductionBenefit>(self, measure: M) -> Calculator<M> {
        Calculator {
            params: self.params,
            benefit_values: self.benefit_values,
            measure,
        }
    }

    pub fn year(&self) -> i32 {
        self.params.year
    }

    /// Compute every derived variable for every unit. Previous results are
    /// cleared first, so running twice gives identical output.
    pub fn calc_all(&self, population: &mut Population) {
        let params = &self.params;
        info!(year = params.year, units = population.len(), "calculating");

        population
            .units_mut()
            .par_iter_mut()
            .for_each(|unit| unit.clear_calculated());

        benefit_programs(params, &self.benefit_values, population);

        population.units_mut().par_iter_mut().for_each(|unit| {
            let comp = income_stages(params, unit);
            comp.write_to(unit);
        });
        debug!("income stages done");

        benefit_surtax(params, &self.measure, population);
        benefit_limitation(params, &self.measure, population);

        population.units_mut().par_iter_mut().for_each(|unit| {
            let comp = final_stages(params, unit, TaxComputation::from_unit(unit));
            comp.write_to(unit);
        });
        debug!("final stages done");
    }
}
