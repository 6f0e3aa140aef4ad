pub mod records_io;

use axum::{
    Router,
    extract::{Json, Query},
    http::{HeaderValue, StatusCode, header},
    response::{IntoResponse, Response},
    routing::{get, post},
};
use clap::Parser;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::fs::{self, File};
use std::io::BufWriter;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use tokio::net::TcpListener;
use tracing::info;

use crate::core::{
    Assumptions, Comparison, DecileTable, FIRST_BUDGET_YEAR, FilingUnit, LAST_BUDGET_YEAR, Policy,
    PolicyParams, Population, Reform, build_calculators, decile_table, run_comparison,
};
use records_io::{
    default_dump_vars, parse_dump_vars, read_records_file, write_decile_table, write_dump,
    write_minimal_output,
};

#[derive(Parser, Debug, Clone)]
#[command(
    name = "taxcalc-payroll",
    about = "Payroll and individual tax liabilities for filing-unit records under baseline and reform policy"
)]
pub struct Cli {
    #[arg(help = "CSV file of filing-unit records with a header row of variable names")]
    input: PathBuf,
    #[arg(help = "Tax year to compute")]
    taxyear: i32,
    #[arg(long, help = "JSON policy file applied to current law for the baseline")]
    baseline: Option<PathBuf>,
    #[arg(long, help = "JSON policy file applied to current law for the reform")]
    reform: Option<PathBuf>,
    #[arg(long, help = "JSON economic assumption file")]
    assump: Option<PathBuf>,
    #[arg(long, default_value = ".", help = "Directory for output files")]
    outdir: PathBuf,
    #[arg(long, help = "Write every dump variable for each unit under the reform")]
    dump: bool,
    #[arg(long, help = "File listing dump variables; requires --dump")]
    dvars: Option<PathBuf>,
    #[arg(long, help = "Write the expanded-income decile table")]
    tables: bool,
}

#[derive(Debug)]
struct BatchRequest {
    input: PathBuf,
    year: i32,
    baseline: Option<Reform>,
    reform: Option<Reform>,
    assumptions: Assumptions,
    outdir: PathBuf,
    output_name: String,
    dump_vars: Option<Vec<String>>,
    tables: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchOutput {
    pub files: Vec<PathBuf>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CalculatePayload {
    tax_year: i32,
    #[serde(default)]
    reform: Option<Value>,
    #[serde(default)]
    baseline: Option<Value>,
    #[serde(default)]
    assump: Option<Value>,
    #[serde(default)]
    dump_vars: Option<Vec<String>>,
    records: Vec<FilingUnit>,
}

#[derive(Debug, Deserialize)]
struct ParametersQuery {
    year: i32,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct UnitResult {
    recid: i64,
    baseline: BTreeMap<String, f64>,
    reform: BTreeMap<String, f64>,
    change: BTreeMap<String, f64>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct CalculateResponse {
    tax_year: i32,
    units: Vec<UnitResult>,
    table: DecileTable,
}

#[derive(Debug, Serialize)]
struct ErrorResponse {
    error: String,
}

fn file_stem(path: &Path) -> String {
    path.file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .unwrap_or_else(|| "#".to_string())
}

fn output_name(input: &Path, year: i32, baseline: Option<&Path>, reform: Option<&Path>, assump: Option<&Path>) -> String {
    let part = |path: Option<&Path>| path.map(file_stem).unwrap_or_else(|| "#".to_string());
    format!(
        "{}-{:02}-{}-{}-{}",
        file_stem(input),
        year.rem_euclid(100),
        part(baseline),
        part(reform),
        part(assump)
    )
}

fn read_text(path: &Path, what: &str) -> Result<String, String> {
    fs::read_to_string(path).map_err(|e| format!("cannot read {what} file {}: {e}", path.display()))
}

fn build_request(cli: Cli) -> Result<BatchRequest, String> {
    if !(FIRST_BUDGET_YEAR..=LAST_BUDGET_YEAR).contains(&cli.taxyear) {
        return Err(format!(
            "TAXYEAR must be between {FIRST_BUDGET_YEAR} and {LAST_BUDGET_YEAR}"
        ));
    }

    if !cli.input.is_file() {
        return Err(format!("INPUT file {} does not exist", cli.input.display()));
    }

    if cli.dvars.is_some() && !cli.dump {
        return Err("--dvars requires --dump".to_string());
    }

    if !cli.outdir.is_dir() {
        return Err(format!("--outdir {} is not a directory", cli.outdir.display()));
    }

    let baseline = match &cli.baseline {
        Some(path) => Some(Reform::from_json(&read_text(path, "baseline")?).map_err(|e| e.to_string())?),
        None => None,
    };
    let reform = match &cli.reform {
        Some(path) => Some(Reform::from_json(&read_text(path, "reform")?).map_err(|e| e.to_string())?),
        None => None,
    };
    let assumptions = match &cli.assump {
        Some(path) => Assumptions::from_json(&read_text(path, "assumption")?).map_err(|e| e.to_string())?,
        None => Assumptions::default(),
    };

    let dump_vars = if cli.dump {
        match &cli.dvars {
            Some(path) => {
                let vars = parse_dump_vars(&read_text(path, "dump variable")?).map_err(|e| e.to_string())?;
                if vars.is_empty() {
                    return Err(format!("--dvars file {} names no variables", path.display()));
                }
                Some(vars)
            }
            None => Some(default_dump_vars()),
        }
    } else {
        None
    };

    let output_name = output_name(
        &cli.input,
        cli.taxyear,
        cli.baseline.as_deref(),
        cli.reform.as_deref(),
        cli.assump.as_deref(),
    );

    Ok(BatchRequest {
        input: cli.input,
        year: cli.taxyear,
        baseline,
        reform,
        assumptions,
        outdir: cli.outdir,
        output_name,
        dump_vars,
        tables: cli.tables,
    })
}

fn create_output(path: &Path) -> Result<BufWriter<File>, String> {
    File::create(path)
        .map(BufWriter::new)
        .map_err(|e| format!("cannot create {}: {e}", path.display()))
}

pub fn run_batch(cli: Cli) -> Result<BatchOutput, String> {
    let request = build_request(cli)?;

    let (baseline, reform) = build_calculators(
        request.year,
        request.baseline.as_ref(),
        request.reform.as_ref(),
        &request.assumptions,
    )
    .map_err(|e| e.to_string())?;
    let population = read_records_file(&request.input).map_err(|e| e.to_string())?;
    info!(units = population.len(), input = %request.input.display(), "records loaded");

    let comparison = run_comparison(&baseline, &reform, &population).map_err(|e| e.to_string())?;

    let mut files = Vec::new();
    let minimal_path = request.outdir.join(format!("{}.csv", request.output_name));
    write_minimal_output(create_output(&minimal_path)?, &comparison.reform, request.year)
        .map_err(|e| e.to_string())?;
    files.push(minimal_path);

    if let Some(vars) = &request.dump_vars {
        let dump_path = request.outdir.join(format!("{}-dump.csv", request.output_name));
        write_dump(create_output(&dump_path)?, &comparison.reform, vars).map_err(|e| e.to_string())?;
        files.push(dump_path);
    }

    if request.tables {
        let table = decile_table(&comparison).map_err(|e| e.to_string())?;
        let table_path = request.outdir.join(format!("{}-tab.csv", request.output_name));
        write_decile_table(create_output(&table_path)?, &table).map_err(|e| e.to_string())?;
        files.push(table_path);
    }

    for file in &files {
        info!(path = %file.display(), "wrote output");
    }
    Ok(BatchOutput { files })
}

pub async fn run_http_server(port: u16) -> std::io::Result<()> {
    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    let app = Router::new()
        .route("/api/calculate", post(calculate_handler))
        .route("/api/parameters", get(parameters_handler))
        .fallback(not_found_handler);

    let listener = TcpListener::bind(addr).await?;
    info!(%addr, "tax calculator HTTP API listening");

    axum::serve(listener, app).await
}

async fn not_found_handler() -> Response {
    error_response(StatusCode::NOT_FOUND, "Not found")
}

async fn calculate_handler(Json(payload): Json<Value>) -> Response {
    match calculate_from_value(payload) {
        Ok(response) => json_response(StatusCode::OK, response),
        Err(msg) => error_response(StatusCode::BAD_REQUEST, &msg),
    }
}

async fn parameters_handler(Query(query): Query<ParametersQuery>) -> Response {
    match current_law_parameters(query.year) {
        Ok(params) => json_response(StatusCode::OK, params),
        Err(msg) => error_response(StatusCode::BAD_REQUEST, &msg),
    }
}

fn json_response<T: Serialize>(status: StatusCode, body: T) -> Response {
    let mut response = (status, Json(body)).into_response();
    response
        .headers_mut()
        .insert(header::CACHE_CONTROL, HeaderValue::from_static("no-store"));
    response
}

fn error_response(status: StatusCode, msg: &str) -> Response {
    json_response(
        status,
        ErrorResponse {
            error: msg.to_string(),
        },
    )
}

fn current_law_parameters(year: i32) -> Result<PolicyParams, String> {
    let policy = Policy::current_law().map_err(|e| e.to_string())?;
    policy.params_for_year(year).map_err(|e| e.to_string())
}

fn calculate_from_value(value: Value) -> Result<CalculateResponse, String> {
    let payload = serde_json::from_value::<CalculatePayload>(value)
        .map_err(|e| format!("Invalid API JSON payload: {e}"))?;

    if payload.records.is_empty() {
        return Err("records must contain at least one filing unit".to_string());
    }

    let reform = payload
        .reform
        .map(Reform::from_value)
        .transpose()
        .map_err(|e| e.to_string())?;
    let baseline = payload
        .baseline
        .map(Reform::from_value)
        .transpose()
        .map_err(|e| e.to_string())?;
    let assumptions = match payload.assump {
        Some(value) => Assumptions::from_value(value).map_err(|e| e.to_string())?,
        None => Assumptions::default(),
    };
    let vars = match payload.dump_vars {
        Some(vars) => parse_dump_vars(&vars.join(" ")).map_err(|e| e.to_string())?,
        None => default_dump_vars(),
    };

    let (base_calc, reform_calc) =
        build_calculators(payload.tax_year, baseline.as_ref(), reform.as_ref(), &assumptions)
            .map_err(|e| e.to_string())?;
    let population = Population::new(payload.records);
    let comparison = run_comparison(&base_calc, &reform_calc, &population).map_err(|e| e.to_string())?;
    let table = decile_table(&comparison).map_err(|e| e.to_string())?;

    Ok(CalculateResponse {
        tax_year: payload.tax_year,
        units: unit_results(&comparison, &vars),
        table,
    })
}

fn unit_results(comparison: &Comparison, vars: &[String]) -> Vec<UnitResult> {
    comparison
        .baseline
        .units()
        .iter()
        .zip(comparison.reform.units())
        .map(|(before, after)| {
            let mut baseline = BTreeMap::new();
            let mut reform = BTreeMap::new();
            let mut change = BTreeMap::new();
            for name in vars {
                let old = before.value(name).unwrap_or(0.0);
                let new = after.value(name).unwrap_or(0.0);
                baseline.insert(name.clone(), old);
                reform.insert(name.clone(), new);
                change.insert(name.clone(), new - old);
            }
            UnitResult {
                recid: before.recid,
                baseline,
                reform,
                change,
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::time::{SystemTime, UNIX_EPOCH};

    const EPS: f64 = 1e-6;

    fn assert_approx(actual: f64, expected: f64) {
        assert!(
            (actual - expected).abs() <= EPS,
            "expected {expected}, got {actual}"
        );
    }

    fn scratch_dir(label: &str) -> PathBuf {
        let nanos = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|elapsed| elapsed.as_nanos())
            .unwrap_or(0);
        let dir = std::env::temp_dir().join(format!(
            "taxcalc-payroll-{label}-{}-{nanos}",
            std::process::id()
        ));
        fs::create_dir_all(&dir).expect("scratch dir");
        dir
    }

    fn sample_cli(dir: &Path) -> Cli {
        let input = dir.join("cases.csv");
        fs::write(
            &input,
            "RECID,MARS,s006,e00200,e00200p,c00100,c09200\n\
             1,1,10,40000,40000,40000,2500\n\
             2,2,5,150000,150000,150000,18000\n",
        )
        .expect("write input");
        Cli::try_parse_from([
            "taxcalc-payroll",
            input.to_str().expect("utf8 path"),
            "2024",
            "--outdir",
            dir.to_str().expect("utf8 path"),
        ])
        .expect("valid args")
    }

    #[test]
    fn cli_parses_flags() {
        let cli = Cli::try_parse_from([
            "taxcalc-payroll",
            "cases.csv",
            "2024",
            "--reform",
            "ref.json",
            "--dump",
            "--tables",
        ])
        .expect("valid args");
        assert_eq!(cli.taxyear, 2024);
        assert!(cli.dump);
        assert!(cli.tables);
        assert_eq!(cli.reform, Some(PathBuf::from("ref.json")));
        assert_eq!(cli.outdir, PathBuf::from("."));
    }

    #[test]
    fn output_name_marks_missing_files() {
        let name = output_name(
            Path::new("data/cases.csv"),
            2024,
            None,
            Some(Path::new("x/ref.json")),
            None,
        );
        assert_eq!(name, "cases-24-#-ref-#");
    }

    #[test]
    fn build_request_rejects_year_out_of_range() {
        let dir = scratch_dir("year");
        let mut cli = sample_cli(&dir);
        cli.taxyear = 2050;
        let err = build_request(cli).expect_err("year out of range");
        assert!(err.contains("TAXYEAR"));
    }

    #[test]
    fn build_request_rejects_dvars_without_dump() {
        let dir = scratch_dir("dvars");
        let mut cli = sample_cli(&dir);
        cli.dvars = Some(dir.join("vars.txt"));
        let err = build_request(cli).expect_err("dvars needs dump");
        assert!(err.contains("--dvars"));
    }

    #[test]
    fn run_batch_reports_every_reform_error() {
        let dir = scratch_dir("reform-errors");
        let reform_path = dir.join("bad.json");
        fs::write(
            &reform_path,
            r#"{"NOT_A_PARAM": {"2024": 1}, "AMEDT_rt": {"2024": 3.0}}"#,
        )
        .expect("write reform");
        let mut cli = sample_cli(&dir);
        cli.reform = Some(reform_path);
        let err = run_batch(cli).expect_err("invalid reform");
        assert!(err.contains("NOT_A_PARAM"));
        assert!(err.contains("AMEDT_rt"));
    }

    #[test]
    fn run_batch_writes_requested_outputs() {
        let dir = scratch_dir("batch");
        let reform_path = dir.join("ref.json");
        fs::write(&reform_path, r#"{"FICA_ss_trt_employee": {"2024": 0.072}}"#).expect("write reform");
        let vars_path = dir.join("vars.txt");
        fs::write(&vars_path, "payrolltax iitax\ncombined").expect("write dvars");

        let mut cli = sample_cli(&dir);
        cli.reform = Some(reform_path);
        cli.dump = true;
        cli.dvars = Some(vars_path);
        cli.tables = true;

        let output = run_batch(cli).expect("batch runs");
        assert_eq!(output.files.len(), 3);
        for file in &output.files {
            assert!(file.is_file(), "{} missing", file.display());
        }

        let minimal = fs::read_to_string(dir.join("cases-24-#-ref-#.csv")).expect("minimal output");
        assert!(minimal.starts_with("RECID,YEAR,WEIGHT,INCTAX,LSTAX,PAYTAX\n1,2024,10,"));

        let dump = fs::read_to_string(dir.join("cases-24-#-ref-#-dump.csv")).expect("dump output");
        let mut lines = dump.lines();
        assert_eq!(lines.next(), Some("RECID,payrolltax,iitax,combined"));
        assert_eq!(lines.next(), Some("1,6520.00,2500.00,9020.00"));

        let table = fs::read_to_string(dir.join("cases-24-#-ref-#-tab.csv")).expect("table output");
        assert_eq!(table.lines().count(), 12);
        assert!(table.lines().last().is_some_and(|line| line.starts_with("ALL,15,")));
    }

    #[test]
    fn calculate_payload_returns_unit_changes_and_table() {
        let payload = json!({
            "taxYear": 2024,
            "reform": {"FICA_ss_trt_employee": {"2024": 0.072}},
            "dumpVars": ["payrolltax", "combined"],
            "records": [
                {"RECID": 1, "MARS": 1, "s006": 1, "e00200": 50000, "e00200p": 50000},
                {"RECID": 2, "MARS": 2, "s006": 1, "e00200": 80000, "e00200p": 80000}
            ]
        });
        let response = calculate_from_value(payload).expect("valid payload");
        assert_eq!(response.tax_year, 2024);
        assert_eq!(response.units.len(), 2);
        assert_approx(response.units[0].change["payrolltax"], 500.0);
        assert_approx(response.units[1].change["combined"], 800.0);
        let all = response.table.all().expect("ALL row");
        assert_approx(all.payrolltax_change, 1_300.0);

        let json = serde_json::to_value(&response).expect("serializes");
        assert!(json.get("units").is_some());
        assert!(json["table"]["rows"][10]["combinedChange"].is_number());
    }

    #[test]
    fn calculate_payload_rejects_bad_input() {
        let bad_mars = json!({"taxYear": 2024, "records": [{"RECID": 1, "MARS": 9}]});
        let err = calculate_from_value(bad_mars).expect_err("bad MARS");
        assert!(err.contains("MARS"));

        let no_mars = json!({
            "taxYear": 2024,
            "records": [{"RECID": 1, "s006": 1, "e00200": 300000, "e00200p": 300000}]
        });
        let err = calculate_from_value(no_mars).expect_err("missing MARS");
        assert!(err.contains("MARS"));

        let empty = json!({"taxYear": 2024, "records": []});
        assert!(calculate_from_value(empty).is_err());

        let bad_year = json!({"taxYear": 1999, "records": [{"RECID": 1, "MARS": 1}]});
        let err = calculate_from_value(bad_year).expect_err("bad year");
        assert!(err.contains("1999"));

        let bad_vars = json!({"taxYear": 2024, "dumpVars": ["nope"], "records": [{"RECID": 1, "MARS": 1}]});
        let err = calculate_from_value(bad_vars).expect_err("bad dump var");
        assert!(err.contains("nope"));
    }

    #[test]
    fn current_law_parameters_serialize_camel_case() {
        let params = current_law_parameters(2024).expect("in range");
        let json = serde_json::to_value(&params).expect("serializes");
        assert_eq!(json["ssEarningsC"], json!(168_600.0));
        assert!(current_law_parameters(2040).is_err());
    }
}
