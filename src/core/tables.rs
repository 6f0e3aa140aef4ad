use serde::Serialize;

use super::comparison::Comparison;
use super::error::DataError;

pub const NUM_DECILES: usize = 10;

/// Weighted totals for one expanded-income decile, or for everyone.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DecileRow {
    pub label: String,
    pub weight: f64,
    pub baseline_iitax: f64,
    pub baseline_payrolltax: f64,
    pub baseline_combined: f64,
    pub reform_iitax: f64,
    pub reform_payrolltax: f64,
    pub reform_combined: f64,
    pub iitax_change: f64,
    pub payrolltax_change: f64,
    pub combined_change: f64,
}

impl DecileRow {
    fn labelled(label: String) -> Self {
        Self {
            label,
            ..Self::default()
        }
    }

    fn add(&mut self, weight: f64, baseline: [f64; 3], reform: [f64; 3]) {
        self.weight += weight;
        self.baseline_iitax += weight * baseline[0];
        self.baseline_payrolltax += weight * baseline[1];
        self.baseline_combined += weight * baseline[2];
        self.reform_iitax += weight * reform[0];
        self.reform_payrolltax += weight * reform[1];
        self.reform_combined += weight * reform[2];
        self.iitax_change = self.reform_iitax - self.baseline_iitax;
        self.payrolltax_change = self.reform_payrolltax - self.baseline_payrolltax;
        self.combined_change = self.reform_combined - self.baseline_combined;
    }
}

#[derive(Clone, Debug, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DecileTable {
    pub year: i32,
    pub rows: Vec<DecileRow>,
}

impl DecileTable {
    pub fn all(&self) -> Option<&DecileRow> {
        self.rows.last()
    }
}

/// Decile of every unit by weighted rank of `ranking`. A unit falls in the
/// decile that contains the cumulative weight through that unit.
pub fn weighted_deciles(ranking: &[f64], weights: &[f64]) -> Vec<usize> {
    let mut order: Vec<usize> = (0..ranking.len()).collect();
    order.sort_by(|&a, &b| ranking[a].total_cmp(&ranking[b]).then(a.cmp(&b)));

    let total: f64 = weights.iter().sum();
    let mut deciles = vec![0; ranking.len()];
    if total <= 0.0 {
        return deciles;
    }

    let mut cumulative = 0.0;
    for idx in order {
        cumulative += weights[idx];
        let position = (cumulative * NUM_DECILES as f64 / total).ceil() as usize;
        deciles[idx] = position.clamp(1, NUM_DECILES) - 1;
    }
    deciles
}

/// Weighted tax totals by baseline expanded-income decile plus an `ALL` row.
pub fn decile_table(comparison: &Comparison) -> Result<DecileTable, DataError> {
    let baseline = &comparison.baseline;
    let reform = &comparison.reform;
    if baseline.len() != reform.len() {
        return Err(DataError::RowCountMismatch {
            expected: baseline.len(),
            actual: reform.len(),
        });
    }

    let weights = baseline.column("s006")?;
    let ranking = baseline.column("expanded_income")?;
    let deciles = weighted_deciles(&ranking, &weights);

    let mut rows: Vec<DecileRow> = (0..NUM_DECILES)
        .map(|decile| DecileRow::labelled(decile.to_string()))
        .collect();
    let mut all = DecileRow::labelled("ALL".to_string());

    for ((before, after), decile) in baseline.units().iter().zip(reform.units()).zip(deciles) {
        let weight = before.s006;
        let baseline_values = [before.iitax, before.payrolltax, before.combined];
        let reform_values = [after.iitax, after.payrolltax, after.combined];
        rows[decile].add(weight, baseline_values, reform_values);
        all.add(weight, baseline_values, reform_values);
    }
    rows.push(all);

    Ok(DecileTable {
        year: comparison.year,
        rows,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::records::{FilingUnit, Population};

    const EPS: f64 = 1e-6;

    fn assert_approx(actual: f64, expected: f64) {
        assert!(
            (actual - expected).abs() <= EPS,
            "expected {expected}, got {actual}"
        );
    }

    #[test]
    fn equal_weights_split_evenly() {
        let ranking: Vec<f64> = (0..20).rev().map(f64::from).collect();
        let weights = vec![1.0; 20];
        let deciles = weighted_deciles(&ranking, &weights);
        assert_eq!(deciles[19], 0);
        assert_eq!(deciles[18], 0);
        assert_eq!(deciles[17], 1);
        assert_eq!(deciles[0], 9);
    }

    #[test]
    fn heavy_weight_spans_deciles() {
        let deciles = weighted_deciles(&[1.0, 2.0, 3.0], &[1.0, 8.0, 1.0]);
        assert_eq!(deciles, vec![0, 8, 9]);
    }

    #[test]
    fn zero_total_weight_puts_everyone_in_first_decile() {
        assert_eq!(weighted_deciles(&[5.0, 1.0], &[0.0, 0.0]), vec![0, 0]);
    }

    fn unit(weight: f64, income: f64, combined: f64) -> FilingUnit {
        FilingUnit {
            s006: weight,
            expanded_income: income,
            iitax: combined,
            combined,
            ..FilingUnit::default()
        }
    }

    #[test]
    fn table_sums_weighted_changes() {
        let baseline = Population::new(vec![unit(1.0, 10.0, 100.0), unit(3.0, 90.0, 200.0)]);
        let reform = Population::new(vec![unit(1.0, 10.0, 150.0), unit(3.0, 90.0, 180.0)]);
        let comparison = Comparison {
            year: 2024,
            baseline,
            reform,
        };
        let table = decile_table(&comparison).expect("aligned");
        assert_eq!(table.rows.len(), NUM_DECILES + 1);

        let first = &table.rows[2];
        assert_approx(first.weight, 1.0);
        assert_approx(first.combined_change, 50.0);

        let all = table.all().expect("has ALL row");
        assert_eq!(all.label, "ALL");
        assert_approx(all.weight, 4.0);
        assert_approx(all.baseline_combined, 700.0);
        assert_approx(all.reform_combined, 690.0);
        assert_approx(all.combined_change, -10.0);
        assert_approx(all.iitax_change, -10.0);
    }

    #[test]
    fn table_serializes_camel_case() {
        let table = DecileTable {
            year: 2024,
            rows: vec![DecileRow::labelled("ALL".to_string())],
        };
        let json = serde_json::to_string(&table).expect("serializes");
        assert!(json.contains("\"combinedChange\""));
        assert!(json.contains("\"baselinePayrolltax\""));
    }

    #[test]
    fn misaligned_results_are_rejected() {
        let comparison = Comparison {
            year: 2024,
            baseline: Population::new(vec![unit(1.0, 1.0, 1.0)]),
            reform: Population::default(),
        };
        assert!(matches!(
            decile_table(&comparison),
            Err(DataError::RowCountMismatch { expected: 1, actual: 0 })
        ));
    }
}
