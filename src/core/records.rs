use serde::{Deserialize, Serialize};

use super::error::DataError;
use super::types::FilingStatus;

macro_rules! filing_unit_schema {
    (
        codes { $($code:ident => $code_name:literal),* $(,)? }
        inputs { $($input:ident => $input_name:literal),* $(,)? }
        calculated { $($calc:ident => $calc_name:literal),* $(,)? }
    ) => {
        /// One tax-filing unit: raw inputs plus the fields the calculation
        /// pipeline writes. `MARS` is the one field a serialized record must carry.
        #[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
        pub struct FilingUnit {
            #[serde(rename = "RECID", default)]
            pub recid: i64,
            #[serde(rename = "MARS")]
            pub mars: FilingStatus,
            $(
                #[serde(rename = $code_name, default)]
                pub $code: i64,
            )*
            $(
                #[serde(rename = $input_name, default)]
                pub $input: f64,
            )*
            $(
                #[serde(rename = $calc_name, skip_deserializing)]
                pub $calc: f64,
            )*
        }

        impl FilingUnit {
            /// Integer-valued input variables (ids, codes and counts).
            pub const INTEGER_VARS: &'static [&'static str] =
                &["RECID", "MARS", $($code_name),*];

            /// Every variable that may appear in input data.
            pub const READ_VARS: &'static [&'static str] =
                &["RECID", "MARS", $($code_name,)* $($input_name),*];

            /// Variables written by the calculation pipeline.
            pub const CALC_VARS: &'static [&'static str] = &[$($calc_name),*];

            pub fn value(&self, name: &str) -> Option<f64> {
                match name {
                    "RECID" => Some(self.recid as f64),
                    "MARS" => Some(self.mars.code() as f64),
                    $($code_name => Some(self.$code as f64),)*
                    $($input_name => Some(self.$input),)*
                    $($calc_name => Some(self.$calc),)*
                    _ => None,
                }
            }

            pub fn set_integer(&mut self, name: &str, value: i64) -> Result<(), DataError> {
                match name {
                    "RECID" => self.recid = value,
                    "MARS" => {
                        self.mars = FilingStatus::from_code(value).ok_or(
                            DataError::InvalidFilingStatus {
                                recid: self.recid,
                                code: value,
                            },
                        )?;
                    }
                    $($code_name => self.$code = value,)*
                    _ => return Err(DataError::UnknownVariable(name.to_string())),
                }
                Ok(())
            }

            pub fn set_amount(&mut self, name: &str, value: f64) -> Result<(), DataError> {
                match name {
                    $($input_name => self.$input = value,)*
                    _ => return Err(DataError::UnknownVariable(name.to_string())),
                }
                Ok(())
            }

            /// Reset every pipeline output so a run starts from a clean slate.
            pub fn clear_calculated(&mut self) {
                $(self.$calc = 0.0;)*
            }
        }
    };
}

filing_unit_schema! {
    codes {
        dsi => "DSI",
        xtot => "XTOT",
        n24 => "n24",
        nu06 => "nu06",
        nu18 => "nu18",
        age_head => "age_head",
        age_spouse => "age_spouse",
    }
    inputs {
        s006 => "s006",
        e00200 => "e00200",
        e00200p => "e00200p",
        e00200s => "e00200s",
        pencon_p => "pencon_p",
        pencon_s => "pencon_s",
        e00900 => "e00900",
        e00900p => "e00900p",
        e00900s => "e00900s",
        e02100 => "e02100",
        e02100p => "e02100p",
        e02100s => "e02100s",
        k1bx14p => "k1bx14p",
        k1bx14s => "k1bx14s",
        e00300 => "e00300",
        e00400 => "e00400",
        e00600 => "e00600",
        e00700 => "e00700",
        e00800 => "e00800",
        e01100 => "e01100",
        e01200 => "e01200",
        e01400 => "e01400",
        e01500 => "e01500",
        e02000 => "e02000",
        p22250 => "p22250",
        p23250 => "p23250",
        cmbtp => "cmbtp",
        e02300 => "e02300",
        e02400 => "e02400",
        housing_ben => "housing_ben",
        ssi_ben => "ssi_ben",
        snap_ben => "snap_ben",
        tanf_ben => "tanf_ben",
        vet_ben => "vet_ben",
        wic_ben => "wic_ben",
        mcare_ben => "mcare_ben",
        mcaid_ben => "mcaid_ben",
        other_ben => "other_ben",
        c00100 => "c00100",
        c09200 => "c09200",
        c59660 => "c59660",
        c11070 => "c11070",
        c10960 => "c10960",
        c07180 => "c07180",
        personal_refundable_credit => "personal_refundable_credit",
        recovery_rebate_credit => "recovery_rebate_credit",
        c17000 => "c17000",
        e18400_capped => "e18400_capped",
        e18500_capped => "e18500_capped",
        c19200 => "c19200",
        c19700 => "c19700",
        c20500 => "c20500",
        c20800 => "c20800",
        mtr_inctax => "mtr_inctax",
    }
    calculated {
        sey => "sey",
        payrolltax => "payrolltax",
        ptax_was => "ptax_was",
        setax => "setax",
        c03260 => "c03260",
        ptax_oasdi => "ptax_oasdi",
        earned => "earned",
        earned_p => "earned_p",
        earned_s => "earned_s",
        was_plus_sey_p => "was_plus_sey_p",
        was_plus_sey_s => "was_plus_sey_s",
        ptax_amc => "ptax_amc",
        rptc_p => "rptc_p",
        rptc_s => "rptc_s",
        rptc => "rptc",
        ctc_new => "ctc_new",
        eitc => "eitc",
        refund => "refund",
        iitax => "iitax",
        combined => "combined",
        surtax => "surtax",
        fstax => "fstax",
        lumpsum_tax => "lumpsum_tax",
        benefit_cost_total => "benefit_cost_total",
        benefit_value_total => "benefit_value_total",
        expanded_income => "expanded_income",
        aftertax_income => "aftertax_income",
    }
}

impl FilingUnit {
    pub fn is_integer_var(name: &str) -> bool {
        Self::INTEGER_VARS.contains(&name)
    }

    pub fn is_known_var(name: &str) -> bool {
        Self::READ_VARS.contains(&name) || Self::CALC_VARS.contains(&name)
    }

    /// Number of adults on the return, a proxy used by per-person taxes.
    pub fn num_filers(&self) -> i64 {
        if self.mars == FilingStatus::Joint { 2 } else { 1 }
    }
}

/// The table of filing units one regime computes over. Row order is the
/// alignment key between baseline and reform results.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Population {
    units: Vec<FilingUnit>,
}

impl Population {
    pub fn new(units: Vec<FilingUnit>) -> Self {
        Self { units }
    }

    pub fn len(&self) -> usize {
        self.units.len()
    }

    pub fn is_empty(&self) -> bool {
        self.units.is_empty()
    }

    pub fn units(&self) -> &[FilingUnit] {
        &self.units
    }

    pub fn units_mut(&mut self) -> &mut [FilingUnit] {
        &mut self.units
    }

    /// One named variable for every unit, in row order.
    pub fn column(&self, name: &str) -> Result<Vec<f64>, DataError> {
        if !FilingUnit::is_known_var(name) {
            return Err(DataError::UnknownVariable(name.to_string()));
        }
        Ok(self
            .units
            .iter()
            .map(|unit| unit.value(name).unwrap_or(0.0))
            .collect())
    }

    /// Sum of `name` weighted by the sampling weight `s006`.
    pub fn weighted_total(&self, name: &str) -> Result<f64, DataError> {
        let column = self.column(name)?;
        Ok(self
            .units
            .iter()
            .zip(column)
            .map(|(unit, value)| unit.s006 * value)
            .sum())
    }
}
