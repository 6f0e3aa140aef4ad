//! Passes that need the whole population: benefit program repeal and
//! valuation, and the two itemized-deduction benefit surtaxes. Each pass
//! reduces a column, then broadcasts the result back onto every unit.

use rayon::prelude::*;
use tracing::debug;

use super::policy::{BenefitValues, PolicyParams};
use super::records::{FilingUnit, Population};
use super::types::ItemizedSwitches;

/// Per-unit value of a set of itemized deductions.
pub trait DeductionBenefit: Sync {
    fn benefit(&self, params: &PolicyParams, unit: &FilingUnit, switches: ItemizedSwitches) -> f64;
}

/// Values the switched deductions at the unit's marginal income-tax rate.
#[derive(Copy, Clone, Debug, Default)]
pub struct MarginalRateBenefit;

impl DeductionBenefit for MarginalRateBenefit {
    fn benefit(&self, params: &PolicyParams, unit: &FilingUnit, switches: ItemizedSwitches) -> f64 {
        unit.mtr_inctax.max(0.0) * switched_deductions(params, unit, switches)
    }
}

/// Sum of the deduction categories selected by `switches`, after the
/// state/local and real-estate haircuts.
pub fn switched_deductions(params: &PolicyParams, unit: &FilingUnit, switches: ItemizedSwitches) -> f64 {
    let mut total = 0.0;
    if switches.medical {
        total += unit.c17000;
    }
    if switches.state_local {
        total += (1.0 - params.id_state_local_tax_hc) * unit.e18400_capped.max(0.0);
    }
    if switches.real_estate {
        total += (1.0 - params.id_real_estate_hc) * unit.e18500_capped;
    }
    if switches.casualty {
        total += unit.c20500;
    }
    if switches.misc {
        total += unit.c20800;
    }
    if switches.interest {
        total += unit.c19200;
    }
    if switches.charity {
        total += unit.c19700;
    }
    total
}

/// Zero repealed benefit programs and total the remaining benefits at cost
/// and at consumption value.
pub fn benefit_programs(params: &PolicyParams, values: &BenefitValues, population: &mut Population) {
    let repeal = params.ben_repeal;
    population.units_mut().par_iter_mut().for_each(|unit| {
        let columns: [(&mut f64, bool); 11] = [
            (&mut unit.housing_ben, repeal.housing),
            (&mut unit.ssi_ben, repeal.ssi),
            (&mut unit.snap_ben, repeal.snap),
            (&mut unit.tanf_ben, repeal.tanf),
            (&mut unit.vet_ben, repeal.vet),
            (&mut unit.wic_ben, repeal.wic),
            (&mut unit.mcare_ben, repeal.mcare),
            (&mut unit.mcaid_ben, repeal.mcaid),
            (&mut unit.e02400, repeal.oasdi),
            (&mut unit.e02300, repeal.ui),
            (&mut unit.other_ben, repeal.other),
        ];
        for (column, repealed) in columns {
            if repealed {
                *column = 0.0;
            }
        }

        unit.benefit_cost_total = unit.housing_ben
            + unit.ssi_ben
            + unit.snap_ben
            + unit.tanf_ben
            + unit.vet_ben
            + unit.wic_ben
            + unit.mcare_ben
            + unit.mcaid_ben
            + unit.e02400
            + unit.e02300
            + unit.other_ben;

        unit.benefit_value_total = unit.housing_ben * values.housing
            + unit.ssi_ben
            + unit.snap_ben * values.snap
            + unit.tanf_ben * values.tanf
            + unit.vet_ben * values.vet
            + unit.wic_ben * values.wic
            + unit.mcare_ben * values.mcare
            + unit.mcaid_ben * values.mcaid
            + unit.e02400
            + unit.e02300
            + unit.other_ben * values.other;
    });
}

fn benefit_column<B: DeductionBenefit>(
    params: &PolicyParams,
    measure: &B,
    population: &Population,
    switches: ItemizedSwitches,
) -> Vec<f64> {
    population
        .units()
        .par_iter()
        .map(|unit| measure.benefit(params, unit, switches))
        .collect()
}

fn add_surtax(population: &mut Population, amounts: &[f64]) {
    population
        .units_mut()
        .par_iter_mut()
        .zip(amounts.par_iter())
        .for_each(|(unit, amount)| {
            unit.iitax += amount;
            unit.combined += amount;
            unit.surtax += amount;
        });
}

/// Surtax on the benefit of itemized deductions above a fraction of AGI
/// plus an exemption.
pub fn benefit_surtax<B: DeductionBenefit>(params: &PolicyParams, measure: &B, population: &mut Population) {
    if params.id_benefit_surtax_crt == 1.0 {
        return;
    }
    let benefits = benefit_column(params, measure, population, params.id_benefit_surtax_switch);
    let surtaxes: Vec<f64> = population
        .units()
        .par_iter()
        .zip(benefits.par_iter())
        .map(|(unit, benefit)| {
            let dedem = params.id_benefit_surtax_crt * unit.c00100
                + params.id_benefit_surtax_em[unit.mars];
            params.id_benefit_surtax_trt * (benefit - dedem).max(0.0)
        })
        .collect();
    debug!(units = surtaxes.len(), "benefit surtax applied");
    add_surtax(population, &surtaxes);
}

/// Caps the benefit of itemized deductions at a fraction of the deductible
/// expenses, taxing the excess.
pub fn benefit_limitation<B: DeductionBenefit>(params: &PolicyParams, measure: &B, population: &mut Population) {
    if params.id_benefit_cap_rt == 1.0 {
        return;
    }
    let switches = params.id_benefit_cap_switch;
    let benefits = benefit_column(params, measure, population, switches);
    let excess: Vec<f64> = population
        .units()
        .par_iter()
        .zip(benefits.par_iter())
        .map(|(unit, benefit)| {
            let deduct_exps = switched_deductions(params, unit, switches);
            (benefit - params.id_benefit_cap_rt * deduct_exps).max(0.0)
        })
        .collect();
    debug!(units = excess.len(), "benefit limitation applied");
    add_surtax(population, &excess);
}
