use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, info};

use super::error::{PolicyError, ValidationReport};
use super::types::{ByStatus, ItemizedSwitches};

pub const FIRST_BUDGET_YEAR: i32 = 2013;
pub const LAST_BUDGET_YEAR: i32 = 2034;
const NUM_YEARS: usize = (LAST_BUDGET_YEAR - FIRST_BUDGET_YEAR + 1) as usize;

const CURRENT_LAW_JSON: &str = include_str!("current_law_policy.json");
const GROWTH_RATES_JSON: &str = include_str!("growth_rates.json");
const CPI_OFFSET_PARAM: &str = "parameter_indexing_CPI_offset";
const INDEXED_SUFFIX: &str = "-indexed";

pub const BENEFIT_VALUE_PARAMS: [&str; 8] = [
    "BEN_housing_value",
    "BEN_snap_value",
    "BEN_tanf_value",
    "BEN_vet_value",
    "BEN_wic_value",
    "BEN_mcare_value",
    "BEN_mcaid_value",
    "BEN_other_value",
];
const GROWDIFF_PARAMS: [&str; 2] = ["ACPIU", "AWAGE"];

#[derive(Copy, Clone, Debug, Eq, PartialEq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ParamKind {
    Scalar,
    Flag,
    ByStatus,
    Switches,
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Indexing {
    Price,
    Wage,
}

#[derive(Clone, Debug, PartialEq)]
pub enum ParamValue {
    Flag(bool),
    Scalar(f64),
    ByStatus(ByStatus),
    Switches(ItemizedSwitches),
}

impl ParamValue {
    fn grown(&self, rate: f64) -> ParamValue {
        match self {
            ParamValue::Scalar(value) => ParamValue::Scalar(round_cents(value * (1.0 + rate))),
            ParamValue::ByStatus(values) => ParamValue::ByStatus(ByStatus(
                values.0.map(|value| round_cents(value * (1.0 + rate))),
            )),
            other => other.clone(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct ParamDefinition {
    kind: ParamKind,
    #[serde(default)]
    indexed: Option<Indexing>,
    #[serde(default)]
    min: Option<f64>,
    #[serde(default)]
    max: Option<f64>,
    values: BTreeMap<String, Value>,
}

#[derive(Copy, Clone, Debug, PartialEq)]
struct ParamMeta {
    kind: ParamKind,
    indexed: Option<Indexing>,
    min: Option<f64>,
    max: Option<f64>,
}

impl ParamMeta {
    fn check_range(&self, label: &str, value: f64) -> Result<(), String> {
        if let Some(min) = self.min {
            if value < min {
                return Err(format!("{label} value {value} is below minimum {min}"));
            }
        }
        if let Some(max) = self.max {
            if value > max {
                return Err(format!("{label} value {value} is above maximum {max}"));
            }
        }
        Ok(())
    }
}

fn round_cents(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

fn year_index(year: i32) -> Result<usize, PolicyError> {
    if (FIRST_BUDGET_YEAR..=LAST_BUDGET_YEAR).contains(&year) {
        Ok((year - FIRST_BUDGET_YEAR) as usize)
    } else {
        Err(PolicyError::YearOutOfRange {
            year,
            first: FIRST_BUDGET_YEAR,
            last: LAST_BUDGET_YEAR,
        })
    }
}

fn parse_year(text: &str) -> Result<i32, String> {
    let year = text
        .trim()
        .parse::<i32>()
        .map_err(|_| format!("'{text}' is not a year"))?;
    if !(FIRST_BUDGET_YEAR..=LAST_BUDGET_YEAR).contains(&year) {
        return Err(format!(
            "year {year} is outside {FIRST_BUDGET_YEAR}..={LAST_BUDGET_YEAR}"
        ));
    }
    Ok(year)
}

fn parse_number(label: &str, raw: &Value) -> Result<f64, String> {
    raw.as_f64()
        .filter(|value| value.is_finite())
        .ok_or_else(|| format!("{label} must be a number, got {raw}"))
}

fn parse_value(name: &str, year: i32, meta: &ParamMeta, raw: &Value) -> Result<ParamValue, String> {
    let label = format!("{name}[{year}]");
    match meta.kind {
        ParamKind::Flag => raw
            .as_bool()
            .map(ParamValue::Flag)
            .ok_or_else(|| format!("{label} must be true or false, got {raw}")),
        ParamKind::Scalar => {
            let value = parse_number(&label, raw)?;
            meta.check_range(&label, value)?;
            Ok(ParamValue::Scalar(value))
        }
        ParamKind::ByStatus => {
            let items = raw
                .as_array()
                .filter(|items| items.len() == 5)
                .ok_or_else(|| {
                    format!("{label} must be a list of 5 numbers, one per filing status")
                })?;
            let mut values = [0.0; 5];
            for (slot, item) in values.iter_mut().zip(items) {
                let value = parse_number(&label, item)?;
                meta.check_range(&label, value)?;
                *slot = value;
            }
            Ok(ParamValue::ByStatus(ByStatus(values)))
        }
        ParamKind::Switches => {
            let items = raw
                .as_array()
                .filter(|items| items.len() == ItemizedSwitches::LEN)
                .ok_or_else(|| {
                    format!(
                        "{label} must be a list of {} true/false switches",
                        ItemizedSwitches::LEN
                    )
                })?;
            let mut flags = [false; ItemizedSwitches::LEN];
            for (slot, item) in flags.iter_mut().zip(items) {
                *slot = item
                    .as_bool()
                    .ok_or_else(|| format!("{label} switches must be true or false, got {item}"))?;
            }
            Ok(ParamValue::Switches(ItemizedSwitches::from_array(flags)))
        }
    }
}

fn latest_at<T: Copy>(by_year: &BTreeMap<i32, T>, year: i32) -> Option<T> {
    by_year.range(..=year).next_back().map(|(_, value)| *value)
}

/// Annual growth rates used to index policy parameters. Entry `i` is the
/// growth from budget year `FIRST_BUDGET_YEAR + i` to the next year.
#[derive(Clone, Debug, PartialEq)]
pub struct GrowthRates {
    price_inflation: Vec<f64>,
    wage_growth: Vec<f64>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct GrowthRatesFile {
    price_inflation: BTreeMap<String, f64>,
    wage_growth: BTreeMap<String, f64>,
}

impl GrowthRates {
    pub fn standard() -> Result<Self, PolicyError> {
        Self::from_json(GROWTH_RATES_JSON)
    }

    pub fn from_json(text: &str) -> Result<Self, PolicyError> {
        let file: GrowthRatesFile = serde_json::from_str(text).map_err(|source| {
            PolicyError::Json {
                what: "growth rates",
                source,
            }
        })?;
        let mut report = ValidationReport::new();
        let price_inflation = expand_rates("price_inflation", &file.price_inflation, &mut report);
        let wage_growth = expand_rates("wage_growth", &file.wage_growth, &mut report);
        report.into_result()?;
        Ok(Self {
            price_inflation,
            wage_growth,
        })
    }

    pub fn price_inflation(&self, year: i32) -> Result<f64, PolicyError> {
        Ok(self.price_inflation[year_index(year)?])
    }

    pub fn wage_growth(&self, year: i32) -> Result<f64, PolicyError> {
        Ok(self.wage_growth[year_index(year)?])
    }

    fn adjusted(&self, assumptions: &Assumptions) -> Self {
        let mut adjusted = self.clone();
        for idx in 0..NUM_YEARS {
            let year = FIRST_BUDGET_YEAR + idx as i32;
            adjusted.price_inflation[idx] += latest_at(&assumptions.growdiff_price, year).unwrap_or(0.0);
            adjusted.wage_growth[idx] += latest_at(&assumptions.growdiff_wage, year).unwrap_or(0.0);
        }
        adjusted
    }
}

fn expand_rates(name: &str, raw: &BTreeMap<String, f64>, report: &mut ValidationReport) -> Vec<f64> {
    let mut by_year = BTreeMap::new();
    for (year_text, rate) in raw {
        match parse_year(year_text) {
            Ok(year) => {
                by_year.insert(year, *rate);
            }
            Err(msg) => report.push(format!("{name}: {msg}")),
        }
    }
    if !by_year.contains_key(&FIRST_BUDGET_YEAR) {
        report.push(format!("{name} has no rate for {FIRST_BUDGET_YEAR}"));
    }
    (0..NUM_YEARS)
        .map(|idx| latest_at(&by_year, FIRST_BUDGET_YEAR + idx as i32).unwrap_or(0.0))
        .collect()
}

#[derive(Copy, Clone, Debug, PartialEq)]
pub struct BenefitValues {
    pub housing: f64,
    pub snap: f64,
    pub tanf: f64,
    pub vet: f64,
    pub wic: f64,
    pub mcare: f64,
    pub mcaid: f64,
    pub other: f64,
}

impl Default for BenefitValues {
    fn default() -> Self {
        Self {
            housing: 1.0,
            snap: 1.0,
            tanf: 1.0,
            vet: 1.0,
            wic: 1.0,
            mcare: 1.0,
            mcaid: 1.0,
            other: 1.0,
        }
    }
}

/// Economic assumptions: benefit consumption values and growth-rate
/// differences. Values persist from the year they are given.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Assumptions {
    consumption: BTreeMap<String, BTreeMap<i32, f64>>,
    growdiff_price: BTreeMap<i32, f64>,
    growdiff_wage: BTreeMap<i32, f64>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
struct AssumptionsFile {
    consumption: BTreeMap<String, BTreeMap<String, Value>>,
    growdiff: BTreeMap<String, BTreeMap<String, Value>>,
}

impl Assumptions {
    pub fn from_json(text: &str) -> Result<Self, PolicyError> {
        let value: Value = serde_json::from_str(text).map_err(|source| PolicyError::Json {
            what: "assumption",
            source,
        })?;
        Self::from_value(value)
    }

    pub fn from_value(value: Value) -> Result<Self, PolicyError> {
        let file: AssumptionsFile = serde_json::from_value(value).map_err(|source| {
            PolicyError::Json {
                what: "assumption",
                source,
            }
        })?;

        let mut report = ValidationReport::new();
        let mut assumptions = Assumptions::default();

        for (name, by_year) in &file.consumption {
            if !BENEFIT_VALUE_PARAMS.contains(&name.as_str()) {
                report.push(format!("{name} is not a known consumption parameter"));
                continue;
            }
            let meta = ParamMeta {
                kind: ParamKind::Scalar,
                indexed: None,
                min: Some(0.0),
                max: Some(1.0),
            };
            let parsed = parse_year_values(name, &meta, by_year, &mut report);
            assumptions.consumption.insert(name.clone(), parsed);
        }

        for (name, by_year) in &file.growdiff {
            let meta = ParamMeta {
                kind: ParamKind::Scalar,
                indexed: None,
                min: Some(-1.0),
                max: Some(1.0),
            };
            let parsed = parse_year_values(name, &meta, by_year, &mut report);
            match name.as_str() {
                "ACPIU" => assumptions.growdiff_price = parsed,
                "AWAGE" => assumptions.growdiff_wage = parsed,
                _ => report.push(format!(
                    "{name} is not a known growdiff parameter (expected one of {GROWDIFF_PARAMS:?})"
                )),
            }
        }

        report.into_result()?;
        Ok(assumptions)
    }

    pub fn benefit_values(&self, year: i32) -> BenefitValues {
        let lookup = |name: &str, default: f64| {
            self.consumption
                .get(name)
                .and_then(|by_year| latest_at(by_year, year))
                .unwrap_or(default)
        };
        let defaults = BenefitValues::default();
        BenefitValues {
            housing: lookup("BEN_housing_value", defaults.housing),
            snap: lookup("BEN_snap_value", defaults.snap),
            tanf: lookup("BEN_tanf_value", defaults.tanf),
            vet: lookup("BEN_vet_value", defaults.vet),
            wic: lookup("BEN_wic_value", defaults.wic),
            mcare: lookup("BEN_mcare_value", defaults.mcare),
            mcaid: lookup("BEN_mcaid_value", defaults.mcaid),
            other: lookup("BEN_other_value", defaults.other),
        }
    }

    pub fn has_growdiff(&self) -> bool {
        !self.growdiff_price.is_empty() || !self.growdiff_wage.is_empty()
    }
}

fn parse_year_values(
    name: &str,
    meta: &ParamMeta,
    by_year: &BTreeMap<String, Value>,
    report: &mut ValidationReport,
) -> BTreeMap<i32, f64> {
    let mut parsed = BTreeMap::new();
    for (year_text, raw) in by_year {
        let year = match parse_year(year_text) {
            Ok(year) => year,
            Err(msg) => {
                report.push(format!("{name}: {msg}"));
                continue;
            }
        };
        match parse_value(name, year, meta, raw) {
            Ok(ParamValue::Scalar(value)) => {
                parsed.insert(year, value);
            }
            Ok(_) => report.push(format!("{name}[{year}] must be a number")),
            Err(msg) => report.push(msg),
        }
    }
    parsed
}

/// A set of policy provisions: parameter name to year to value. A name with
/// the `-indexed` suffix switches indexing of that parameter on or off.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Reform {
    provisions: BTreeMap<String, BTreeMap<String, Value>>,
}

impl Reform {
    pub fn from_json(text: &str) -> Result<Self, PolicyError> {
        let value: Value = serde_json::from_str(text).map_err(|source| PolicyError::Json {
            what: "reform",
            source,
        })?;
        Self::from_value(value)
    }

    /// Accepts either the bare provision map or one wrapped in `{"policy": ...}`.
    pub fn from_value(value: Value) -> Result<Self, PolicyError> {
        let body = match value {
            Value::Object(mut map) if map.len() == 1 && map.contains_key("policy") => {
                map.remove("policy").unwrap_or(Value::Null)
            }
            other => other,
        };
        let provisions = serde_json::from_value(body).map_err(|source| PolicyError::Json {
            what: "reform",
            source,
        })?;
        Ok(Self { provisions })
    }

    pub fn with(mut self, name: &str, year: i32, value: Value) -> Self {
        self.provisions
            .entry(name.to_string())
            .or_default()
            .insert(year.to_string(), value);
        self
    }
}

#[derive(Clone, Debug)]
pub struct Policy {
    meta: BTreeMap<String, ParamMeta>,
    explicit: BTreeMap<String, BTreeMap<i32, ParamValue>>,
    index_toggles: BTreeMap<String, BTreeMap<i32, bool>>,
    base_growth: GrowthRates,
    growth: GrowthRates,
    resolved: BTreeMap<String, Vec<ParamValue>>,
}

enum Provision {
    Value(String, i32, ParamValue),
    Indexing(String, i32, bool),
}

impl Provision {
    fn year(&self) -> i32 {
        match self {
            Provision::Value(_, year, _) | Provision::Indexing(_, year, _) => *year,
        }
    }
}

impl Policy {
    pub fn current_law() -> Result<Self, PolicyError> {
        Self::from_json(CURRENT_LAW_JSON, GrowthRates::standard()?)
    }

    pub fn from_json(text: &str, growth: GrowthRates) -> Result<Self, PolicyError> {
        let definitions: BTreeMap<String, ParamDefinition> =
            serde_json::from_str(text).map_err(|source| PolicyError::Json {
                what: "policy",
                source,
            })?;

        let mut report = ValidationReport::new();
        let mut meta = BTreeMap::new();
        let mut explicit = BTreeMap::new();
        for (name, definition) in definitions {
            let param_meta = ParamMeta {
                kind: definition.kind,
                indexed: definition.indexed,
                min: definition.min,
                max: definition.max,
            };
            if definition.indexed.is_some()
                && !matches!(definition.kind, ParamKind::Scalar | ParamKind::ByStatus)
            {
                report.push(format!("{name} cannot be indexed: it is not an amount"));
            }
            let mut values = BTreeMap::new();
            for (year_text, raw) in &definition.values {
                let year = match parse_year(year_text) {
                    Ok(year) => year,
                    Err(msg) => {
                        report.push(format!("{name}: {msg}"));
                        continue;
                    }
                };
                match parse_value(&name, year, &param_meta, raw) {
                    Ok(value) => {
                        values.insert(year, value);
                    }
                    Err(msg) => report.push(msg),
                }
            }
            if !values.contains_key(&FIRST_BUDGET_YEAR) {
                report.push(format!(
                    "{name} has no value for the first budget year {FIRST_BUDGET_YEAR}"
                ));
            }
            meta.insert(name.clone(), param_meta);
            explicit.insert(name, values);
        }
        if !meta.contains_key(CPI_OFFSET_PARAM) {
            report.push(format!("{CPI_OFFSET_PARAM} must be defined"));
        }
        report.into_result()?;

        let mut policy = Self {
            meta,
            explicit,
            index_toggles: BTreeMap::new(),
            base_growth: growth.clone(),
            growth,
            resolved: BTreeMap::new(),
        };
        policy.rebuild()?;
        Ok(policy)
    }

    /// Validate every provision of `reform`, then apply them in year order.
    /// Nothing is applied when any provision is invalid.
    pub fn implement_reform(&mut self, reform: &Reform) -> Result<(), PolicyError> {
        let mut report = ValidationReport::new();
        let mut provisions = Vec::new();

        for (raw_name, by_year) in &reform.provisions {
            let (name, is_toggle) = match raw_name.strip_suffix(INDEXED_SUFFIX) {
                Some(base) => (base, true),
                None => (raw_name.as_str(), false),
            };
            let Some(meta) = self.meta.get(name) else {
                report.push(format!("{raw_name} is not a known policy parameter"));
                continue;
            };
            if is_toggle && meta.indexed.is_none() {
                report.push(format!("{name} is not an indexable parameter"));
                continue;
            }
            for (year_text, raw) in by_year {
                let year = match parse_year(year_text) {
                    Ok(year) => year,
                    Err(msg) => {
                        report.push(format!("{raw_name}: {msg}"));
                        continue;
                    }
                };
                if is_toggle {
                    match raw.as_bool() {
                        Some(on) => provisions.push(Provision::Indexing(name.to_string(), year, on)),
                        None => report.push(format!("{raw_name}[{year}] must be true or false")),
                    }
                } else {
                    match parse_value(name, year, meta, raw) {
                        Ok(value) => provisions.push(Provision::Value(name.to_string(), year, value)),
                        Err(msg) => report.push(msg),
                    }
                }
            }
        }

        report.into_result()?;

        provisions.sort_by_key(Provision::year);
        for provision in provisions {
            match provision {
                Provision::Value(name, year, value) => {
                    debug!(parameter = %name, year, "applying reform value");
                    let values = self.explicit.entry(name).or_default();
                    values.retain(|existing, _| *existing < year);
                    values.insert(year, value);
                }
                Provision::Indexing(name, year, on) => {
                    debug!(parameter = %name, year, on, "applying indexing switch");
                    if let Some(values) = self.explicit.get_mut(&name) {
                        values.retain(|existing, _| *existing <= year);
                    }
                    self.index_toggles.entry(name).or_default().insert(year, on);
                }
            }
        }
        self.rebuild()?;
        info!(provisions = reform.provisions.len(), "reform implemented");
        Ok(())
    }

    /// Re-index every parameter with the growth rates adjusted by `assumptions`.
    pub fn apply_assumptions(&mut self, assumptions: &Assumptions) -> Result<(), PolicyError> {
        self.growth = self.base_growth.adjusted(assumptions);
        self.rebuild()
    }

    pub fn value(&self, name: &str, year: i32) -> Option<&ParamValue> {
        let idx = year_index(year).ok()?;
        self.resolved.get(name).and_then(|values| values.get(idx))
    }

    pub fn params_for_year(&self, year: i32) -> Result<PolicyParams, PolicyError> {
        let idx = year_index(year)?;
        let view = YearView {
            policy: self,
            year,
            idx,
        };
        let params = PolicyParams::from_view(&view)?;
        debug!(year, "policy parameters resolved");
        Ok(params)
    }

    fn rebuild(&mut self) -> Result<(), PolicyError> {
        let offsets: Vec<f64> = self
            .expand(CPI_OFFSET_PARAM, &[])?
            .into_iter()
            .map(|value| match value {
                ParamValue::Scalar(offset) => offset,
                _ => 0.0,
            })
            .collect();

        let mut resolved = BTreeMap::new();
        for name in self.meta.keys() {
            resolved.insert(name.clone(), self.expand(name, &offsets)?);
        }
        self.resolved = resolved;
        Ok(())
    }

    fn expand(&self, name: &str, cpi_offsets: &[f64]) -> Result<Vec<ParamValue>, PolicyError> {
        let missing = |year| PolicyError::MissingParameter {
            name: name.to_string(),
            year,
        };
        let meta = self.meta.get(name).ok_or_else(|| missing(FIRST_BUDGET_YEAR))?;
        let explicit = self.explicit.get(name);
        let toggles = self.index_toggles.get(name);

        let mut out: Vec<ParamValue> = Vec::with_capacity(NUM_YEARS);
        for idx in 0..NUM_YEARS {
            let year = FIRST_BUDGET_YEAR + idx as i32;
            if let Some(value) = explicit.and_then(|values| values.get(&year)) {
                out.push(value.clone());
                continue;
            }
            let Some(prev) = out.last() else {
                return Err(missing(year));
            };
            let indexed = toggles
                .and_then(|switches| latest_at(switches, year))
                .unwrap_or(meta.indexed.is_some());
            let next = match meta.indexed {
                Some(Indexing::Price) if indexed => {
                    let offset = cpi_offsets.get(idx - 1).copied().unwrap_or(0.0);
                    prev.grown(self.growth.price_inflation[idx - 1] + offset)
                }
                Some(Indexing::Wage) if indexed => prev.grown(self.growth.wage_growth[idx - 1]),
                _ => prev.clone(),
            };
            out.push(next);
        }
        Ok(out)
    }
}

struct YearView<'a> {
    policy: &'a Policy,
    year: i32,
    idx: usize,
}

impl YearView<'_> {
    fn missing(&self, name: &str) -> PolicyError {
        PolicyError::MissingParameter {
            name: name.to_string(),
            year: self.year,
        }
    }

    fn get(&self, name: &str) -> Result<&ParamValue, PolicyError> {
        self.policy
            .resolved
            .get(name)
            .and_then(|values| values.get(self.idx))
            .ok_or_else(|| self.missing(name))
    }

    fn scalar(&self, name: &str) -> Result<f64, PolicyError> {
        match self.get(name)? {
            ParamValue::Scalar(value) => Ok(*value),
            _ => Err(self.missing(name)),
        }
    }

    fn flag(&self, name: &str) -> Result<bool, PolicyError> {
        match self.get(name)? {
            ParamValue::Flag(value) => Ok(*value),
            _ => Err(self.missing(name)),
        }
    }

    fn by_status(&self, name: &str) -> Result<ByStatus, PolicyError> {
        match self.get(name)? {
            ParamValue::ByStatus(values) => Ok(*values),
            _ => Err(self.missing(name)),
        }
    }

    fn switches(&self, name: &str) -> Result<ItemizedSwitches, PolicyError> {
        match self.get(name)? {
            ParamValue::Switches(values) => Ok(*values),
            _ => Err(self.missing(name)),
        }
    }
}

#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BenefitRepeal {
    pub housing: bool,
    pub ssi: bool,
    pub snap: bool,
    pub tanf: bool,
    pub vet: bool,
    pub wic: bool,
    pub mcare: bool,
    pub mcaid: bool,
    pub oasdi: bool,
    pub ui: bool,
    pub other: bool,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PolicyParams {
    pub year: i32,

    pub fica_ss_trt_employer: f64,
    pub fica_ss_trt_employee: f64,
    pub fica_mc_trt_employer: f64,
    pub fica_mc_trt_employee: f64,
    pub ss_earnings_c: f64,
    pub ss_earnings_thd: f64,
    pub seca_earnings_thd: f64,
    pub ald_self_employment_tax_hc: f64,

    pub amedt_ec: ByStatus,
    pub amedt_rt: f64,

    pub rptc_c: f64,
    pub rptc_rt: f64,

    pub ctc_new_c: f64,
    pub ctc_new_c_under6_bonus: f64,
    pub ctc_new_rt: f64,
    pub ctc_new_ps: ByStatus,
    pub ctc_new_prt: f64,
    pub ctc_new_for_all: bool,
    pub ctc_include17: bool,
    pub ctc_new_refund_limited: bool,
    pub ctc_new_refund_limit_payroll_rt: f64,
    pub ctc_new_refund_limited_all_payroll: bool,

    pub fst_agi_trt: f64,
    pub fst_agi_thd_lo: ByStatus,
    pub fst_agi_thd_hi: ByStatus,

    pub lst: f64,
    pub cdcc_refund: bool,

    pub ben_repeal: BenefitRepeal,

    pub id_benefit_surtax_crt: f64,
    pub id_benefit_surtax_trt: f64,
    pub id_benefit_surtax_em: ByStatus,
    pub id_benefit_surtax_switch: ItemizedSwitches,
    pub id_benefit_cap_rt: f64,
    pub id_benefit_cap_switch: ItemizedSwitches,
    pub id_state_local_tax_hc: f64,
    pub id_real_estate_hc: f64,
}

impl PolicyParams {
    pub fn fica_ss_trt(&self) -> f64 {
        self.fica_ss_trt_employer + self.fica_ss_trt_employee
    }

    pub fn fica_mc_trt(&self) -> f64 {
        self.fica_mc_trt_employer + self.fica_mc_trt_employee
    }

    fn from_view(at: &YearView<'_>) -> Result<Self, PolicyError> {
        Ok(Self {
            year: at.year,
            fica_ss_trt_employer: at.scalar("FICA_ss_trt_employer")?,
            fica_ss_trt_employee: at.scalar("FICA_ss_trt_employee")?,
            fica_mc_trt_employer: at.scalar("FICA_mc_trt_employer")?,
            fica_mc_trt_employee: at.scalar("FICA_mc_trt_employee")?,
            ss_earnings_c: at.scalar("SS_Earnings_c")?,
            ss_earnings_thd: at.scalar("SS_Earnings_thd")?,
            seca_earnings_thd: at.scalar("SECA_Earnings_thd")?,
            ald_self_employment_tax_hc: at.scalar("ALD_SelfEmploymentTax_hc")?,
            amedt_ec: at.by_status("AMEDT_ec")?,
            amedt_rt: at.scalar("AMEDT_rt")?,
            rptc_c: at.scalar("RPTC_c")?,
            rptc_rt: at.scalar("RPTC_rt")?,
            ctc_new_c: at.scalar("CTC_new_c")?,
            ctc_new_c_under6_bonus: at.scalar("CTC_new_c_under6_bonus")?,
            ctc_new_rt: at.scalar("CTC_new_rt")?,
            ctc_new_ps: at.by_status("CTC_new_ps")?,
            ctc_new_prt: at.scalar("CTC_new_prt")?,
            ctc_new_for_all: at.flag("CTC_new_for_all")?,
            ctc_include17: at.flag("CTC_include17")?,
            ctc_new_refund_limited: at.flag("CTC_new_refund_limited")?,
            ctc_new_refund_limit_payroll_rt: at.scalar("CTC_new_refund_limit_payroll_rt")?,
            ctc_new_refund_limited_all_payroll: at.flag("CTC_new_refund_limited_all_payroll")?,
            fst_agi_trt: at.scalar("FST_AGI_trt")?,
            fst_agi_thd_lo: at.by_status("FST_AGI_thd_lo")?,
            fst_agi_thd_hi: at.by_status("FST_AGI_thd_hi")?,
            lst: at.scalar("LST")?,
            cdcc_refund: at.flag("CDCC_refund")?,
            ben_repeal: BenefitRepeal {
                housing: at.flag("BEN_housing_repeal")?,
                ssi: at.flag("BEN_ssi_repeal")?,
                snap: at.flag("BEN_snap_repeal")?,
                tanf: at.flag("BEN_tanf_repeal")?,
                vet: at.flag("BEN_vet_repeal")?,
                wic: at.flag("BEN_wic_repeal")?,
                mcare: at.flag("BEN_mcare_repeal")?,
                mcaid: at.flag("BEN_mcaid_repeal")?,
                oasdi: at.flag("BEN_oasdi_repeal")?,
                ui: at.flag("BEN_ui_repeal")?,
                other: at.flag("BEN_other_repeal")?,
            },
            id_benefit_surtax_crt: at.scalar("ID_BenefitSurtax_crt")?,
            id_benefit_surtax_trt: at.scalar("ID_BenefitSurtax_trt")?,
            id_benefit_surtax_em: at.by_status("ID_BenefitSurtax_em")?,
            id_benefit_surtax_switch: at.switches("ID_BenefitSurtax_Switch")?,
            id_benefit_cap_rt: at.scalar("ID_BenefitCap_rt")?,
            id_benefit_cap_switch: at.switches("ID_BenefitCap_Switch")?,
            id_state_local_tax_hc: at.scalar("ID_StateLocalTax_hc")?,
            id_real_estate_hc: at.scalar("ID_RealEstate_hc")?,
        })
    }
}
