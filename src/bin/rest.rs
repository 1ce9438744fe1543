//! Rest CLI - Command-line interface for Better Rest
//!
//! Commands:
//! - estimate: Estimate a bedtime for one set of inputs
//! - sweep: Tabulate predictions across a range of sleep amounts
//! - model: Print the loaded model artifact
//! - doctor: Diagnose model loading and estimator health

use clap::{Args, Parser, Subcommand, ValueEnum};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use better_rest::types::{MAX_SLEEP_HOURS, MIN_SLEEP_HOURS};

const MAX_SWEEP_ROWS: usize = 10_000;
use better_rest::{
    BedtimeEstimator, CoffeeIntake, EstimateEncoder, EstimateError, EstimateRequest, InputError,
    LinearSleepModel, ModelError, SleepAmount, SleepModel, WakeTime, PRODUCER_NAME, REST_VERSION,
};

/// Rest - Estimate a bedtime from wake time, sleep goal and coffee intake
#[derive(Parser)]
#[command(name = "rest")]
#[command(version = REST_VERSION)]
#[command(about = "Estimate when to go to bed", long_about = None)]
struct Cli {
    /// Enable debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Args)]
struct ModelArgs {
    /// Model artifact (JSON); the bundled model is used when omitted
    #[arg(long, env = "BETTER_REST_MODEL")]
    model: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Estimate a bedtime
    Estimate {
        /// Desired wake time (HH:MM)
        #[arg(long, default_value = "08:00")]
        wake: WakeTime,

        /// Desired hours of sleep (4 to 12)
        #[arg(long, default_value = "8")]
        sleep: f64,

        /// Cups of coffee per day (0 to 20)
        #[arg(long, default_value = "1", allow_negative_numbers = true)]
        coffee: i64,

        /// Output format
        #[arg(long, default_value = "text")]
        format: OutputFormat,

        #[command(flatten)]
        model: ModelArgs,
    },

    /// Tabulate predictions across a range of sleep amounts
    Sweep {
        /// Desired wake time (HH:MM)
        #[arg(long, default_value = "08:00")]
        wake: WakeTime,

        /// Cups of coffee per day (0 to 20)
        #[arg(long, default_value = "1", allow_negative_numbers = true)]
        coffee: i64,

        /// First sleep amount (hours)
        #[arg(long, default_value = "4")]
        from: f64,

        /// Last sleep amount (hours)
        #[arg(long, default_value = "12")]
        to: f64,

        /// Step between sleep amounts (hours)
        #[arg(long, default_value = "0.25")]
        step: f64,

        /// Output as JSON
        #[arg(long)]
        json: bool,

        #[command(flatten)]
        model: ModelArgs,
    },

    /// Print the loaded model artifact
    Model {
        /// Output as JSON
        #[arg(long)]
        json: bool,

        #[command(flatten)]
        model: ModelArgs,
    },

    /// Diagnose model loading and estimator health
    Doctor {
        /// Output as JSON
        #[arg(long)]
        json: bool,

        #[command(flatten)]
        model: ModelArgs,
    },
}

#[derive(Clone, ValueEnum)]
enum OutputFormat {
    /// Human-readable summary
    Text,
    /// Compact JSON report
    Json,
    /// Pretty-printed JSON report
    JsonPretty,
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logger(cli.verbose);

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!(
                "{}",
                serde_json::to_string(&CliError::from(e))
                    .unwrap_or_else(|_| "Unknown error".to_string())
            );
            ExitCode::FAILURE
        }
    }
}

fn init_logger(verbose: bool) {
    let default_filter = if verbose {
        "better_rest=debug,rest=debug,warn"
    } else {
        "better_rest=warn,rest=info,warn"
    };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));

    tracing_subscriber::registry()
        .with(filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(false)
                .compact(),
        )
        .init();
}

fn run(cli: Cli) -> Result<(), RestCliError> {
    match cli.command {
        Commands::Estimate {
            wake,
            sleep,
            coffee,
            format,
            model,
        } => cmd_estimate(wake, sleep, coffee, format, model.model.as_deref()),

        Commands::Sweep {
            wake,
            coffee,
            from,
            to,
            step,
            json,
            model,
        } => cmd_sweep(wake, coffee, from, to, step, json, model.model.as_deref()),

        Commands::Model { json, model } => cmd_model(json, model.model.as_deref()),

        Commands::Doctor { json, model } => cmd_doctor(json, model.model.as_deref()),
    }
}

fn load_model(path: Option<&Path>) -> Result<LinearSleepModel, RestCliError> {
    let model = match path {
        Some(path) => LinearSleepModel::load(path)?,
        None => LinearSleepModel::bundled()?,
    };
    tracing::debug!(name = %model.name, version = %model.version, "using sleep model");
    Ok(model)
}

fn cmd_estimate(
    wake: WakeTime,
    sleep: f64,
    coffee: i64,
    format: OutputFormat,
    model_path: Option<&Path>,
) -> Result<(), RestCliError> {
    let request = EstimateRequest::new(wake, SleepAmount::new(sleep)?, CoffeeIntake::new(coffee)?);
    let estimator = BedtimeEstimator::new(load_model(model_path)?);
    let estimate = estimator.estimate(&request)?;

    match format {
        OutputFormat::Text => {
            println!("Wake up at:        {}", request.wake);
            println!("Desired sleep:     {}", request.sleep_amount.label());
            println!("Coffee:            {}", request.coffee.label());
            println!("Predicted sleep:   {:.2} hours", estimate.actual_sleep_hours);
            println!("Estimated bedtime: {}", estimate.display());
        }
        OutputFormat::Json | OutputFormat::JsonPretty => {
            let report =
                EstimateEncoder::new().encode(&request, &estimate, estimator.model_info());
            let output = if matches!(format, OutputFormat::JsonPretty) {
                serde_json::to_string_pretty(&report)?
            } else {
                serde_json::to_string(&report)?
            };
            println!("{}", output);
        }
    }

    Ok(())
}

fn cmd_sweep(
    wake: WakeTime,
    coffee: i64,
    from: f64,
    to: f64,
    step: f64,
    json: bool,
    model_path: Option<&Path>,
) -> Result<(), RestCliError> {
    let grid = sweep_grid(from, to, step)?;
    let coffee = CoffeeIntake::new(coffee)?;
    let estimator = BedtimeEstimator::new(load_model(model_path)?);

    let mut rows: Vec<SweepRow> = Vec::with_capacity(grid.len());
    for sleep_amount in grid {
        let estimate = estimator.estimate(&EstimateRequest::new(wake, sleep_amount, coffee))?;
        rows.push(SweepRow {
            sleep_amount_hours: sleep_amount.hours(),
            actual_sleep_hours: estimate.actual_sleep_hours,
            bedtime: estimate.display(),
        });
    }

    if json {
        println!("{}", serde_json::to_string_pretty(&rows)?);
    } else {
        println!("Wake {} with {}", wake, coffee.label());
        println!("{:>8}  {:>10}  {:>7}", "desired", "predicted", "bedtime");
        for row in &rows {
            println!(
                "{:>8.2}  {:>10.3}  {:>7}",
                row.sleep_amount_hours, row.actual_sleep_hours, row.bedtime
            );
        }
    }

    Ok(())
}

/// Sleep amounts from `from` to `to` inclusive, `step` hours apart
fn sweep_grid(from: f64, to: f64, step: f64) -> Result<Vec<SleepAmount>, RestCliError> {
    let start = SleepAmount::new(from)?;
    let end = SleepAmount::new(to)?;
    if !(step.is_finite() && step > 0.0) {
        return Err(RestCliError::InvalidSweep(format!(
            "step must be a positive number of hours, got {step}"
        )));
    }
    if start > end {
        return Err(RestCliError::InvalidSweep(format!(
            "--from ({from}) is after --to ({to})"
        )));
    }

    let count = ((end.hours() - start.hours()) / step + 1e-9).floor() + 1.0;
    if count > MAX_SWEEP_ROWS as f64 {
        return Err(RestCliError::InvalidSweep(format!(
            "step {step} gives more than {MAX_SWEEP_ROWS} rows"
        )));
    }

    (0..count as usize)
        .map(|index| {
            // Multiply rather than accumulate so the grid does not drift.
            let hours = start.hours() + step * index as f64;
            SleepAmount::new(hours.min(end.hours())).map_err(RestCliError::from)
        })
        .collect()
}

fn cmd_model(json: bool, model_path: Option<&Path>) -> Result<(), RestCliError> {
    let model = load_model(model_path)?;

    if json {
        println!("{}", model.to_json()?);
    } else {
        let source = model_path
            .map(|p| p.display().to_string())
            .unwrap_or_else(|| "bundled".to_string());
        println!("Model:   {} {}", model.name, model.version);
        println!("Source:  {}", source);
        println!();
        println!("actual_sleep = {}", model.intercept);
        println!("             + {} * wake_seconds", model.coeff_wake);
        println!("             + {} * estimated_sleep", model.coeff_estimated_sleep);
        println!("             + {} * coffee", model.coeff_coffee);
    }

    Ok(())
}

fn cmd_doctor(json: bool, model_path: Option<&Path>) -> Result<(), RestCliError> {
    let mut checks: Vec<DoctorCheck> = Vec::new();

    checks.push(DoctorCheck {
        name: "version".to_string(),
        status: CheckStatus::Ok,
        message: format!("{} {}", PRODUCER_NAME, REST_VERSION),
    });

    let model = match model_path {
        Some(path) => LinearSleepModel::load(path),
        None => LinearSleepModel::bundled(),
    };

    match model {
        Ok(model) => {
            checks.push(DoctorCheck {
                name: "model".to_string(),
                status: CheckStatus::Ok,
                message: format!("Loaded {} {}", model.name, model.version),
            });

            let estimator = BedtimeEstimator::new(model);
            let probe = EstimateRequest::default();
            checks.push(match estimator.estimate(&probe) {
                Ok(estimate) if estimate.actual_sleep_hours <= 0.0 => DoctorCheck {
                    name: "probe".to_string(),
                    status: CheckStatus::Warning,
                    message: format!(
                        "Model predicts {:.2} hours of sleep at the defaults",
                        estimate.actual_sleep_hours
                    ),
                },
                Ok(estimate) => DoctorCheck {
                    name: "probe".to_string(),
                    status: CheckStatus::Ok,
                    message: format!(
                        "wake {}, {}, {} -> bedtime {}",
                        probe.wake,
                        probe.sleep_amount.label(),
                        probe.coffee.label(),
                        estimate.display()
                    ),
                },
                Err(e) => DoctorCheck {
                    name: "probe".to_string(),
                    status: CheckStatus::Error,
                    message: e.to_string(),
                },
            });

            let bounds_ok = [MIN_SLEEP_HOURS, MAX_SLEEP_HOURS].iter().all(|&hours| {
                estimator
                    .model()
                    .predict(0.0, hours, 0.0)
                    .map(f64::is_finite)
                    .unwrap_or(false)
            });
            checks.push(DoctorCheck {
                name: "bounds".to_string(),
                status: if bounds_ok { CheckStatus::Ok } else { CheckStatus::Error },
                message: if bounds_ok {
                    "Finite predictions at the sleep amount bounds".to_string()
                } else {
                    "Non-finite prediction at a sleep amount bound".to_string()
                },
            });
        }
        Err(e) => {
            checks.push(DoctorCheck {
                name: "model".to_string(),
                status: CheckStatus::Error,
                message: e.to_string(),
            });
        }
    }

    let report = DoctorReport {
        producer: PRODUCER_NAME.to_string(),
        version: REST_VERSION.to_string(),
        checks,
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        println!("Rest Doctor Report");
        println!("==================");
        println!("Producer: {}", report.producer);
        println!("Version:  {}", report.version);
        println!("\nChecks:");

        for check in &report.checks {
            let status_icon = match check.status {
                CheckStatus::Ok => "[OK]",
                CheckStatus::Warning => "[WARN]",
                CheckStatus::Error => "[ERR]",
            };
            println!("  {} {}: {}", status_icon, check.name, check.message);
        }
    }

    let has_errors = report
        .checks
        .iter()
        .any(|c| matches!(c.status, CheckStatus::Error));
    if has_errors {
        Err(RestCliError::DoctorFailed)
    } else {
        Ok(())
    }
}

// Error types

#[derive(Debug)]
enum RestCliError {
    Model(ModelError),
    Estimate(EstimateError),
    Input(InputError),
    Json(serde_json::Error),
    InvalidSweep(String),
    DoctorFailed,
}

impl From<ModelError> for RestCliError {
    fn from(e: ModelError) -> Self {
        RestCliError::Model(e)
    }
}

impl From<EstimateError> for RestCliError {
    fn from(e: EstimateError) -> Self {
        RestCliError::Estimate(e)
    }
}

impl From<InputError> for RestCliError {
    fn from(e: InputError) -> Self {
        RestCliError::Input(e)
    }
}

impl From<serde_json::Error> for RestCliError {
    fn from(e: serde_json::Error) -> Self {
        RestCliError::Json(e)
    }
}

#[derive(serde::Serialize)]
struct CliError {
    code: String,
    message: String,
    hint: Option<String>,
}

impl From<RestCliError> for CliError {
    fn from(e: RestCliError) -> Self {
        match e {
            RestCliError::Model(e) => CliError {
                code: "MODEL_LOAD_ERROR".to_string(),
                message: e.to_string(),
                hint: Some("Run 'rest doctor' to check the model artifact".to_string()),
            },
            RestCliError::Estimate(e) => CliError {
                code: "MODEL_FAILURE".to_string(),
                message: e.description().to_string(),
                hint: Some("Run 'rest doctor' to check the model artifact".to_string()),
            },
            RestCliError::Input(e) => CliError {
                code: "INVALID_INPUT".to_string(),
                message: e.to_string(),
                hint: Some("Sleep must be 4-12 hours and coffee 0-20 cups".to_string()),
            },
            RestCliError::Json(e) => CliError {
                code: "JSON_ERROR".to_string(),
                message: e.to_string(),
                hint: None,
            },
            RestCliError::InvalidSweep(msg) => CliError {
                code: "INVALID_SWEEP".to_string(),
                message: msg,
                hint: Some("Check --from, --to and --step".to_string()),
            },
            RestCliError::DoctorFailed => CliError {
                code: "DOCTOR_FAILED".to_string(),
                message: "One or more health checks failed".to_string(),
                hint: Some("Review the doctor report for details".to_string()),
            },
        }
    }
}

// Report types

#[derive(serde::Serialize)]
struct SweepRow {
    sleep_amount_hours: f64,
    actual_sleep_hours: f64,
    bedtime: String,
}

#[derive(serde::Serialize)]
struct DoctorReport {
    producer: String,
    version: String,
    checks: Vec<DoctorCheck>,
}

#[derive(serde::Serialize)]
struct DoctorCheck {
    name: String,
    status: CheckStatus,
    message: String,
}

#[derive(serde::Serialize)]
enum CheckStatus {
    Ok,
    Warning,
    Error,
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn hours(grid: &[SleepAmount]) -> Vec<f64> {
        grid.iter().map(|amount| amount.hours()).collect()
    }

    #[test]
    fn test_sweep_grid_includes_end() {
        let grid = sweep_grid(4.0, 12.0, 0.25).unwrap();
        assert_eq!(grid.len(), 33);
        assert_eq!(grid[0].hours(), 4.0);
        assert_eq!(grid[32].hours(), 12.0);

        assert_eq!(hours(&sweep_grid(4.0, 12.0, 4.0).unwrap()), vec![4.0, 8.0, 12.0]);
        assert_eq!(hours(&sweep_grid(8.0, 8.0, 1.0).unwrap()), vec![8.0]);
    }

    #[test]
    fn test_sweep_grid_stops_before_overshooting() {
        assert_eq!(hours(&sweep_grid(4.0, 12.0, 3.0).unwrap()), vec![4.0, 7.0, 10.0]);
        assert_eq!(sweep_grid(4.0, 12.0, 0.1).unwrap().len(), 81);
    }

    #[test]
    fn test_sweep_grid_rejects_reversed_range() {
        let err = sweep_grid(10.0, 6.0, 1.0).unwrap_err();
        assert!(matches!(err, RestCliError::InvalidSweep(_)));
    }

    #[test]
    fn test_sweep_grid_rejects_bad_step() {
        for step in [0.0, -0.5, f64::NAN, f64::INFINITY] {
            let err = sweep_grid(4.0, 12.0, step).unwrap_err();
            assert!(matches!(err, RestCliError::InvalidSweep(_)), "step {step}");
        }
    }

    #[test]
    fn test_sweep_grid_caps_row_count() {
        let err = sweep_grid(4.0, 12.0, 1e-12).unwrap_err();
        assert!(matches!(err, RestCliError::InvalidSweep(_)));

        let err = sweep_grid(4.0, 12.0, f64::MIN_POSITIVE).unwrap_err();
        assert!(matches!(err, RestCliError::InvalidSweep(_)));

        assert_eq!(sweep_grid(4.0, 12.0, 8.0 / 9_999.0).unwrap().len(), MAX_SWEEP_ROWS);
    }

    #[test]
    fn test_sweep_grid_rejects_out_of_range_bounds() {
        let err = sweep_grid(3.0, 12.0, 1.0).unwrap_err();
        assert!(matches!(err, RestCliError::Input(_)));

        let err = sweep_grid(4.0, 12.5, 1.0).unwrap_err();
        assert!(matches!(err, RestCliError::Input(_)));
    }
}
