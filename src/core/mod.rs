mod benefits;
mod calcfunctions;
mod comparison;
mod engine;
mod error;
mod policy;
mod records;
mod tables;
mod types;

pub use benefits::{
    DeductionBenefit, MarginalRateBenefit, benefit_limitation, benefit_programs, benefit_surtax,
    switched_deductions,
};
pub use calcfunctions::{
    TaxComputation, additional_medicare_tax, aftertax_income, ctc_new, ei_payroll_tax,
    expanded_income, fair_share_tax, final_stages, iitax, income_stages, lump_sum_tax,
    refundable_payroll_tax_credit,
};
pub use comparison::{Comparison, build_calculators, run_comparison};
pub use engine::Calculator;
pub use error::{DataError, PolicyError, TaxCalcError, ValidationReport};
pub use policy::{
    Assumptions, BENEFIT_VALUE_PARAMS, BenefitRepeal, BenefitValues, FIRST_BUDGET_YEAR,
    GrowthRates, Indexing, LAST_BUDGET_YEAR, ParamKind, ParamValue, Policy, PolicyParams, Reform,
};
pub use records::{FilingUnit, Population};
pub use tables::{DecileRow, DecileTable, NUM_DECILES, decile_table, weighted_deciles};
pub use types::{ByStatus, FilingStatus, ItemizedSwitches};
