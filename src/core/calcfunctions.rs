//! Per-unit tax rules. Every function is pure: it reads the resolved policy,
//! the unit's inputs and the previous stage's [`TaxComputation`] and returns
//! a new computation.

use super::policy::PolicyParams;
use super::records::FilingUnit;
use super::types::FilingStatus;

#[derive(Copy, Clone, Debug, Default, PartialEq)]
pub struct TaxComputation {
    pub sey: f64,
    pub payrolltax: f64,
    pub ptax_was: f64,
    pub setax: f64,
    /// OASDI tax on combined earnings above `SS_Earnings_thd`.
    pub ptax_extra_oasdi: f64,
    pub c03260: f64,
    pub ptax_oasdi: f64,
    pub earned: f64,
    pub earned_p: f64,
    pub earned_s: f64,
    pub was_plus_sey_p: f64,
    pub was_plus_sey_s: f64,
    pub ptax_amc: f64,
    pub rptc_p: f64,
    pub rptc_s: f64,
    pub rptc: f64,
    pub ctc_new: f64,
    pub eitc: f64,
    pub refund: f64,
    pub iitax: f64,
    pub combined: f64,
    pub surtax: f64,
    pub fstax: f64,
    pub lumpsum_tax: f64,
    pub expanded_income: f64,
    pub aftertax_income: f64,
}

impl TaxComputation {
    /// Picks up the values already stored on a unit, including adjustments
    /// made by population-level passes.
    pub fn from_unit(unit: &FilingUnit) -> Self {
        Self {
            sey: unit.sey,
            payrolltax: unit.payrolltax,
            ptax_was: unit.ptax_was,
            setax: unit.setax,
            ptax_extra_oasdi: 0.0,
            c03260: unit.c03260,
            ptax_oasdi: unit.ptax_oasdi,
            earned: unit.earned,
            earned_p: unit.earned_p,
            earned_s: unit.earned_s,
            was_plus_sey_p: unit.was_plus_sey_p,
            was_plus_sey_s: unit.was_plus_sey_s,
            ptax_amc: unit.ptax_amc,
            rptc_p: unit.rptc_p,
            rptc_s: unit.rptc_s,
            rptc: unit.rptc,
            ctc_new: unit.ctc_new,
            eitc: unit.eitc,
            refund: unit.refund,
            iitax: unit.iitax,
            combined: unit.combined,
            surtax: unit.surtax,
            fstax: unit.fstax,
            lumpsum_tax: unit.lumpsum_tax,
            expanded_income: unit.expanded_income,
            aftertax_income: unit.aftertax_income,
        }
    }

    pub fn write_to(&self, unit: &mut FilingUnit) {
        unit.sey = self.sey;
        unit.payrolltax = self.payrolltax;
        unit.ptax_was = self.ptax_was;
        unit.setax = self.setax;
        unit.c03260 = self.c03260;
        unit.ptax_oasdi = self.ptax_oasdi;
        unit.earned = self.earned;
        unit.earned_p = self.earned_p;
        unit.earned_s = self.earned_s;
        unit.was_plus_sey_p = self.was_plus_sey_p;
        unit.was_plus_sey_s = self.was_plus_sey_s;
        unit.ptax_amc = self.ptax_amc;
        unit.rptc_p = self.rptc_p;
        unit.rptc_s = self.rptc_s;
        unit.rptc = self.rptc;
        unit.ctc_new = self.ctc_new;
        unit.eitc = self.eitc;
        unit.refund = self.refund;
        unit.iitax = self.iitax;
        unit.combined = self.combined;
        unit.surtax = self.surtax;
        unit.fstax = self.fstax;
        unit.lumpsum_tax = self.lumpsum_tax;
        unit.expanded_income = self.expanded_income;
        unit.aftertax_income = self.aftertax_income;
    }
}

#[derive(Copy, Clone, Debug, Default)]
struct EarnerPayroll {
    ptax_ss_was: f64,
    ptax_mc_was: f64,
    setax_ss: f64,
    setax_mc: f64,
    was_plus_sey: f64,
    extra_oasdi: f64,
}

impl EarnerPayroll {
    fn setax(&self) -> f64 {
        self.setax_ss + self.setax_mc
    }
}

fn earner_payroll(params: &PolicyParams, wages: f64, pencon: f64, sey: f64) -> EarnerPayroll {
    let ss_rate = params.fica_ss_trt();
    let mc_rate = params.fica_mc_trt();

    let gross_was = wages + pencon;
    let txearn_was = params.ss_earnings_c.min(gross_was);

    let sey_frac = 1.0 - 0.5 * (ss_rate + mc_rate);
    let sey_net = sey * sey_frac;
    let txearn_sey = sey_net.max(0.0).min(params.ss_earnings_c - txearn_was);

    let was_plus_sey = gross_was + (sey * (1.0 - 0.5 * ss_rate)).max(0.0);
    let extra_oasdi = ss_rate * (was_plus_sey - params.ss_earnings_thd).max(0.0);

    EarnerPayroll {
        ptax_ss_was: ss_rate * txearn_was,
        ptax_mc_was: mc_rate * gross_was,
        setax_ss: ss_rate * txearn_sey,
        setax_mc: mc_rate * sey_net.max(0.0),
        was_plus_sey,
        extra_oasdi,
    }
}

/// OASDI and HI taxes on wages and self-employment income, the deductible
/// half of SECA and earned income.
pub fn ei_payroll_tax(params: &PolicyParams, unit: &FilingUnit) -> TaxComputation {
    let ss_rate = params.fica_ss_trt();
    let mc_rate = params.fica_mc_trt();

    let sey_p = unit.e00900p + unit.e02100p + unit.k1bx14p;
    let sey_s = unit.e00900s + unit.e02100s + unit.k1bx14s;
    let sey = sey_p + sey_s;

    let head = earner_payroll(params, unit.e00200p, unit.pencon_p, sey_p);
    let spouse = earner_payroll(params, unit.e00200s, unit.pencon_s, sey_s);

    let ptax_was = head.ptax_ss_was + head.ptax_mc_was + spouse.ptax_ss_was + spouse.ptax_mc_was;

    // SECA is all-or-nothing on the unit's combined net earnings.
    let sey_frac = 1.0 - 0.5 * (ss_rate + mc_rate);
    let setax = if sey * sey_frac > params.seca_earnings_thd {
        head.setax() + spouse.setax()
    } else {
        0.0
    };

    let extra = head.extra_oasdi + spouse.extra_oasdi;
    let payrolltax = ptax_was + setax + extra;
    let ptax_oasdi =
        head.ptax_ss_was + spouse.ptax_ss_was + head.setax_ss + spouse.setax_ss + extra;

    let deductible_share = (1.0 - params.ald_self_employment_tax_hc) * 0.5;
    let c03260 = deductible_share * setax;
    let earned = (unit.e00200p + unit.e00200s + sey - c03260).max(0.0);
    let earned_p = (unit.e00200p + sey_p - deductible_share * head.setax()).max(0.0);
    let earned_s = (unit.e00200s + sey_s - deductible_share * spouse.setax()).max(0.0);

    TaxComputation {
        sey,
        payrolltax,
        ptax_was,
        setax,
        ptax_extra_oasdi: extra,
        c03260,
        ptax_oasdi,
        earned,
        earned_p,
        earned_s,
        was_plus_sey_p: head.was_plus_sey,
        was_plus_sey_s: spouse.was_plus_sey,
        ..TaxComputation::default()
    }
}

/// Additional Medicare tax on wages and self-employment earnings above the
/// filing-status exclusion.
pub fn additional_medicare_tax(
    params: &PolicyParams,
    unit: &FilingUnit,
    prev: TaxComputation,
) -> TaxComputation {
    let exclusion = params.amedt_ec[unit.mars];
    let line8 = prev.sey.max(0.0) * (1.0 - 0.5 * (params.fica_mc_trt() + params.fica_ss_trt()));
    let line11 = (exclusion - unit.e00200).max(0.0);
    let ptax_amc = params.amedt_rt
        * ((unit.e00200 - exclusion).max(0.0) + (line8 - line11).max(0.0));
    TaxComputation {
        ptax_amc,
        payrolltax: prev.payrolltax + ptax_amc,
        ..prev
    }
}

pub fn refundable_payroll_tax_credit(params: &PolicyParams, prev: TaxComputation) -> TaxComputation {
    let rptc_p = (prev.was_plus_sey_p * params.rptc_rt).min(params.rptc_c);
    let rptc_s = (prev.was_plus_sey_s * params.rptc_rt).min(params.rptc_c);
    TaxComputation {
        rptc_p,
        rptc_s,
        rptc: rptc_p + rptc_s,
        ..prev
    }
}

fn ctc_children(params: &PolicyParams, unit: &FilingUnit) -> f64 {
    if !params.ctc_include17 {
        return unit.n24 as f64;
    }
    let head_is_minor = i64::from(unit.age_head < 18);
    let spouse_is_minor = i64::from(unit.mars == FilingStatus::Joint && unit.age_spouse < 18);
    let extra = (unit.nu18 - head_is_minor - spouse_is_minor - unit.n24).max(0);
    (unit.n24 + extra) as f64
}

pub fn ctc_new(params: &PolicyParams, unit: &FilingUnit, prev: TaxComputation) -> TaxComputation {
    let children = ctc_children(params, unit);
    if children <= 0.0 {
        return TaxComputation {
            ctc_new: 0.0,
            ..prev
        };
    }

    let mut credit = params.ctc_new_c * children + params.ctc_new_c_under6_bonus * unit.nu06 as f64;
    if !params.ctc_new_for_all {
        credit = credit.min(params.ctc_new_rt * unit.c00100.max(0.0));
    }

    let posagi = unit.c00100.max(0.0);
    let phaseout_start = params.ctc_new_ps[unit.mars];
    if posagi > phaseout_start {
        let reduced = (credit - params.ctc_new_prt * (posagi - phaseout_start)).max(0.0);
        credit = credit.min(reduced);
    }

    if credit > 0.0 && params.ctc_new_refund_limited {
        let refund = (credit - unit.c09200).max(0.0);
        let payroll = if params.ctc_new_refund_limited_all_payroll {
            prev.payrolltax
        } else {
            prev.ptax_oasdi
        };
        let limit = params.ctc_new_refund_limit_payroll_rt * payroll;
        credit = (credit - (refund - limit).max(0.0)).max(0.0);
    }

    TaxComputation {
        ctc_new: credit,
        ..prev
    }
}

/// Income tax after refundable credits and the combined liability.
pub fn iitax(params: &PolicyParams, unit: &FilingUnit, prev: TaxComputation) -> TaxComputation {
    let eitc = unit.c59660;
    let cdcc = if params.cdcc_refund { unit.c07180 } else { 0.0 };
    let refund = eitc
        + unit.c11070
        + unit.c10960
        + cdcc
        + unit.recovery_rebate_credit
        + unit.personal_refundable_credit
        + prev.ctc_new
        + prev.rptc;
    let iitax = unit.c09200 - refund;
    TaxComputation {
        eitc,
        refund,
        iitax,
        combined: iitax + prev.payrolltax,
        ..prev
    }
}

/// Minimum tax on high AGI, net of income tax and the employee share of
/// payroll taxes, phased in between the low and high thresholds.
pub fn fair_share_tax(params: &PolicyParams, unit: &FilingUnit, prev: TaxComputation) -> TaxComputation {
    let agi = unit.c00100;
    let lo = params.fst_agi_thd_lo[unit.mars];
    let hi = params.fst_agi_thd_hi[unit.mars];
    if params.fst_agi_trt <= 0.0 || agi < lo {
        return TaxComputation { fstax: 0.0, ..prev };
    }

    let employee_share = 0.5 * prev.ptax_was + 0.5 * prev.setax + prev.ptax_amc;
    let mut fstax = (agi * params.fst_agi_trt - prev.iitax - employee_share).max(0.0);
    let gap = (hi - lo).max(0.0);
    if gap > 0.0 && agi < hi {
        fstax *= (agi - lo) / gap;
    }

    TaxComputation {
        fstax,
        iitax: prev.iitax + fstax,
        combined: prev.combined + fstax,
        surtax: prev.surtax + fstax,
        ..prev
    }
}

pub fn lump_sum_tax(params: &PolicyParams, unit: &FilingUnit, prev: TaxComputation) -> TaxComputation {
    let lumpsum_tax = if params.lst == 0.0 || unit.dsi == 1 {
        0.0
    } else {
        params.lst * unit.num_filers().max(unit.xtot) as f64
    };
    TaxComputation {
        lumpsum_tax,
        combined: prev.combined + lumpsum_tax,
        ..prev
    }
}

pub fn expanded_income(unit: &FilingUnit, prev: TaxComputation) -> TaxComputation {
    let market_income = unit.e00200
        + unit.pencon_p
        + unit.pencon_s
        + unit.e00300
        + unit.e00400
        + unit.e00600
        + unit.e00700
        + unit.e00800
        + unit.e00900
        + unit.e01100
        + unit.e01200
        + unit.e01400
        + unit.e01500
        + unit.e02000
        + unit.e02100
        + unit.p22250
        + unit.p23250
        + unit.cmbtp;
    TaxComputation {
        expanded_income: market_income + 0.5 * prev.ptax_was + unit.benefit_value_total,
        ..prev
    }
}

pub fn aftertax_income(prev: TaxComputation) -> TaxComputation {
    TaxComputation {
        aftertax_income: prev.expanded_income - prev.combined,
        ..prev
    }
}

/// Payroll, credit and income-tax stages that run before the
/// population-level deduction passes.
pub fn income_stages(params: &PolicyParams, unit: &FilingUnit) -> TaxComputation {
    let comp = ei_payroll_tax(params, unit);
    let comp = additional_medicare_tax(params, unit, comp);
    let comp = refundable_payroll_tax_credit(params, comp);
    let comp = ctc_new(params, unit, comp);
    iitax(params, unit, comp)
}

pub fn final_stages(params: &PolicyParams, unit: &FilingUnit, prev: TaxComputation) -> TaxComputation {
    let comp = fair_share_tax(params, unit, prev);
    let comp = lump_sum_tax(params, unit, comp);
    let comp = expanded_income(unit, comp);
    aftertax_income(comp)
}
