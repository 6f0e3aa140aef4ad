//! Numeric CSV input and output for filing-unit records.

use std::collections::HashSet;
use std::fs::File;
use std::io::{BufRead, BufReader, Write};
use std::path::Path;

use tracing::debug;

use crate::core::{DataError, DecileTable, FilingUnit, Population};

/// Variables dumped when no custom list is given.
pub const DEFAULT_DUMP_VARS: &[&str] = &[
    "MARS", "XTOT", "s006", "e00200", "sey", "ptax_was", "setax", "ptax_amc", "payrolltax",
    "ptax_oasdi", "rptc", "ctc_new", "iitax", "surtax", "fstax", "lumpsum_tax", "combined",
    "benefit_value_total", "expanded_income", "aftertax_income",
];

/// Floating-point variables written at full precision.
const UNROUNDED_VARS: &[&str] = &["s006", "mtr_inctax"];

fn split_row(line: &str) -> Vec<String> {
    line.split(',')
        .map(|cell| cell.trim().trim_matches('"').to_string())
        .collect()
}

fn malformed(line: usize, column: &str, reason: impl Into<String>) -> DataError {
    DataError::Malformed {
        line,
        column: column.to_string(),
        reason: reason.into(),
    }
}

/// Read records from CSV text whose first row names the variables. Unknown
/// columns are skipped, missing ones stay zero.
pub fn read_records<R: BufRead>(reader: R) -> Result<Population, DataError> {
    let mut lines = reader.lines().enumerate();

    let header = loop {
        match lines.next() {
            Some((_, line)) => {
                let line = line?;
                if !line.trim().is_empty() {
                    break split_row(&line);
                }
            }
            None => return Err(DataError::MissingHeader),
        }
    };

    let mut seen = HashSet::new();
    let mut columns: Vec<Option<&str>> = Vec::with_capacity(header.len());
    for name in &header {
        if !seen.insert(name.as_str()) {
            return Err(malformed(1, name, "duplicate column"));
        }
        if FilingUnit::READ_VARS.contains(&name.as_str()) {
            columns.push(Some(name.as_str()));
        } else {
            debug!(column = %name, "ignoring column outside the input variable set");
            columns.push(None);
        }
    }

    let mut units = Vec::new();
    for (idx, line) in lines {
        let line_no = idx + 1;
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        let cells = split_row(&line);
        if cells.len() != header.len() {
            return Err(malformed(
                line_no,
                "*",
                format!("expected {} cells, found {}", header.len(), cells.len()),
            ));
        }

        let mut unit = FilingUnit::default();
        // MARS is validated against RECID, so set every other code first.
        let mut mars = None;
        for (column, cell) in columns.iter().zip(&cells) {
            let Some(name) = column else { continue };
            let value = if cell.is_empty() {
                0.0
            } else {
                cell.parse::<f64>()
                    .ok()
                    .filter(|value| value.is_finite())
                    .ok_or_else(|| malformed(line_no, name, format!("'{cell}' is not a number")))?
            };
            if FilingUnit::is_integer_var(name) {
                if value.fract() != 0.0 {
                    return Err(malformed(line_no, name, format!("'{cell}' is not an integer")));
                }
                if *name == "MARS" {
                    mars = Some(value as i64);
                } else {
                    unit.set_integer(name, value as i64)?;
                }
            } else {
                unit.set_amount(name, value)?;
            }
        }
        match mars {
            Some(code) => unit.set_integer("MARS", code)?,
            None => return Err(malformed(line_no, "MARS", "filing status is required")),
        }
        units.push(unit);
    }

    debug!(units = units.len(), "records read");
    Ok(Population::new(units))
}

pub fn read_records_file(path: &Path) -> Result<Population, DataError> {
    let file = File::open(path)?;
    read_records(BufReader::new(file))
}

/// Parse a whitespace-separated list of dump variables, rejecting names
/// outside the variable universe.
pub fn parse_dump_vars(text: &str) -> Result<Vec<String>, DataError> {
    let mut vars: Vec<String> = Vec::new();
    let mut unknown = Vec::new();
    for name in text.split_whitespace() {
        if !FilingUnit::is_known_var(name) {
            unknown.push(name);
        } else if !vars.iter().any(|existing| existing == name) {
            vars.push(name.to_string());
        }
    }
    if !unknown.is_empty() {
        return Err(DataError::UnknownVariable(unknown.join(", ")));
    }
    Ok(vars)
}

pub fn default_dump_vars() -> Vec<String> {
    DEFAULT_DUMP_VARS.iter().map(|name| name.to_string()).collect()
}

fn format_value(name: &str, value: f64) -> String {
    if FilingUnit::is_integer_var(name) {
        return format!("{}", value as i64);
    }
    if UNROUNDED_VARS.contains(&name) {
        return format!("{value}");
    }
    let rounded = (value * 100.0).round() / 100.0;
    if rounded == 0.0 {
        "0.00".to_string()
    } else {
        format!("{rounded:.2}")
    }
}

/// Write `RECID` plus `vars` for every unit.
pub fn write_dump<W: Write>(mut writer: W, population: &Population, vars: &[String]) -> Result<(), DataError> {
    let columns: Vec<&str> = vars
        .iter()
        .map(String::as_str)
        .filter(|name| *name != "RECID")
        .collect();
    for name in &columns {
        if !FilingUnit::is_known_var(name) {
            return Err(DataError::UnknownVariable(name.to_string()));
        }
    }

    let mut header = vec!["RECID"];
    header.extend(columns.iter().copied());
    writeln!(writer, "{}", header.join(","))?;

    for unit in population.units() {
        let mut row = vec![unit.recid.to_string()];
        for name in &columns {
            let value = unit.value(name).unwrap_or(0.0);
            row.push(format_value(name, value));
        }
        writeln!(writer, "{}", row.join(","))?;
    }
    writer.flush()?;
    Ok(())
}

/// One row per unit with the headline liabilities.
pub fn write_minimal_output<W: Write>(mut writer: W, population: &Population, year: i32) -> Result<(), DataError> {
    writeln!(writer, "RECID,YEAR,WEIGHT,INCTAX,LSTAX,PAYTAX")?;
    for unit in population.units() {
        writeln!(
            writer,
            "{},{},{},{},{},{}",
            unit.recid,
            year,
            format_value("s006", unit.s006),
            format_value("iitax", unit.iitax),
            format_value("lumpsum_tax", unit.lumpsum_tax),
            format_value("payrolltax", unit.payrolltax),
        )?;
    }
    writer.flush()?;
    Ok(())
}

pub fn write_decile_table<W: Write>(mut writer: W, table: &DecileTable) -> Result<(), DataError> {
    writeln!(
        writer,
        "decile,weight,baseline_iitax,baseline_payrolltax,baseline_combined,\
         reform_iitax,reform_payrolltax,reform_combined,\
         iitax_change,payrolltax_change,combined_change"
    )?;
    for row in &table.rows {
        let values = [
            row.baseline_iitax,
            row.baseline_payrolltax,
            row.baseline_combined,
            row.reform_iitax,
            row.reform_payrolltax,
            row.reform_combined,
            row.iitax_change,
            row.payrolltax_change,
            row.combined_change,
        ];
        let cells: Vec<String> = values.iter().map(|value| format_value("", *value)).collect();
        writeln!(writer, "{},{},{}", row.label, format_value("s006", row.weight), cells.join(","))?;
    }
    writer.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::FilingStatus;

    fn read(text: &str) -> Result<Population, DataError> {
        read_records(text.as_bytes())
    }

    #[test]
    fn reads_known_columns_and_ignores_others() {
        let population = read(
            "RECID,MARS,s006,e00200,e00200p,favorite_color,n24\n\
             1,2,1.5,50000,50000,7,2\n\
             \n\
             2,1,2.0,1234.5,1234.5,3,\n",
        )
        .expect("valid csv");

        assert_eq!(population.len(), 2);
        let first = &population.units()[0];
        assert_eq!(first.recid, 1);
        assert_eq!(first.mars, FilingStatus::Joint);
        assert_eq!(first.n24, 2);
        assert_eq!(first.e00200, 50_000.0);
        let second = &population.units()[1];
        assert_eq!(second.n24, 0);
        assert_eq!(second.e00200p, 1_234.5);
        assert_eq!(second.e00900, 0.0);
    }

    #[test]
    fn mars_is_validated_with_its_record_id() {
        let err = read("MARS,RECID\n6,42\n").expect_err("bad MARS");
        assert!(matches!(
            err,
            DataError::InvalidFilingStatus { recid: 42, code: 6 }
        ));
    }

    #[test]
    fn missing_mars_column_is_rejected() {
        let err = read("RECID,e00200\n1,100\n").expect_err("no MARS");
        assert!(matches!(err, DataError::Malformed { line: 2, .. }));
    }

    #[test]
    fn non_numeric_cell_reports_line_and_column() {
        let err = read("RECID,MARS,e00200\n1,1,100\n2,1,abc\n").expect_err("bad cell");
        match err {
            DataError::Malformed { line, column, .. } => {
                assert_eq!(line, 3);
                assert_eq!(column, "e00200");
            }
            other => panic!("unexpected error {other}"),
        }
    }

    #[test]
    fn fractional_integer_and_short_rows_are_rejected() {
        assert!(read("RECID,MARS,XTOT\n1,1,1.5\n").is_err());
        assert!(read("RECID,MARS,XTOT\n1,1\n").is_err());
        assert!(matches!(read(""), Err(DataError::MissingHeader)));
        assert!(read("RECID,MARS,RECID\n1,1,1\n").is_err());
    }

    #[test]
    fn dump_rounds_amounts_and_keeps_integers() {
        let population = Population::new(vec![FilingUnit {
            recid: 7,
            mars: FilingStatus::HeadOfHousehold,
            xtot: 3,
            s006: 1.23456,
            payrolltax: 1234.5678,
            iitax: -0.001,
            ..FilingUnit::default()
        }]);
        let vars = parse_dump_vars("MARS XTOT s006 payrolltax iitax").expect("known vars");
        let mut out = Vec::new();
        write_dump(&mut out, &population, &vars).expect("writes");
        let text = String::from_utf8(out).expect("utf8");
        assert_eq!(
            text,
            "RECID,MARS,XTOT,s006,payrolltax,iitax\n7,4,3,1.23456,1234.57,0.00\n"
        );
    }

    #[test]
    fn unknown_dump_variables_are_listed() {
        let err = parse_dump_vars("iitax bogus payrolltax other").expect_err("unknown vars");
        match err {
            DataError::UnknownVariable(names) => assert_eq!(names, "bogus, other"),
            other => panic!("unexpected error {other}"),
        }
        assert_eq!(
            parse_dump_vars("iitax iitax").expect("known"),
            vec!["iitax".to_string()]
        );
    }

    #[test]
    fn dumped_inputs_read_back() {
        let original = Population::new(vec![FilingUnit {
            recid: 3,
            mars: FilingStatus::Joint,
            n24: 1,
            e00200: 72_500.25,
            e00900p: -150.5,
            ..FilingUnit::default()
        }]);
        let vars = parse_dump_vars("MARS n24 e00200 e00900p").expect("known vars");
        let mut out = Vec::new();
        write_dump(&mut out, &original, &vars).expect("writes");
        let reread = read_records(out.as_slice()).expect("reads back");
        assert_eq!(reread, original);
    }

    #[test]
    fn minimal_output_has_fixed_columns() {
        let population = Population::new(vec![FilingUnit {
            recid: 1,
            s006: 2.5,
            iitax: 100.0,
            payrolltax: 50.0,
            ..FilingUnit::default()
        }]);
        let mut out = Vec::new();
        write_minimal_output(&mut out, &population, 2024).expect("writes");
        let text = String::from_utf8(out).expect("utf8");
        assert_eq!(
            text,
            "RECID,YEAR,WEIGHT,INCTAX,LSTAX,PAYTAX\n1,2024,2.5,100.00,0.00,50.00\n"
        );
    }
}
