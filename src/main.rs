// src/main.rs

use clap::{Args, Parser, Subcommand};
use std::error::Error;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

use bode_sweep_analyzer::config::AppConfig;
use bode_sweep_analyzer::constants::DEFAULT_INPUT_FILE;
use bode_sweep_analyzer::data_analysis::frequency_response::FrequencyResponsePoint;
use bode_sweep_analyzer::data_analysis::sweep::{analyze_period, analyze_sweep, PeriodAnalysis};
use bode_sweep_analyzer::data_input::dataset::Dataset;
use bode_sweep_analyzer::data_input::log_parser::{parse_log_file, parse_period_input};
use bode_sweep_analyzer::error::BodeError;
use bode_sweep_analyzer::plot_functions::plot_bode::plot_bode_sweep;
use bode_sweep_analyzer::plot_functions::plot_period_fit::plot_period_fit;

#[derive(Parser)]
#[command(name = "bode_sweep_analyzer")]
#[command(version = bode_sweep_analyzer::crate_version())]
#[command(about = "Experimental Bode analysis of logged sinusoidal excitation tests", long_about = None)]
struct Cli {
    /// Increase log verbosity (-v info, -vv debug, -vvv trace). RUST_LOG takes precedence.
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// TOML file with [analysis] and [columns] settings
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(flatten)]
    overrides: AnalysisOverrides,

    /// Directory for the generated PNG files (defaults to the input file's directory)
    #[arg(long, global = true)]
    output_dir: Option<PathBuf>,

    /// Do not render any plot
    #[arg(long, global = true)]
    no_plot: bool,

    #[command(subcommand)]
    command: Commands,
}

/// Command line values that take precedence over the config file.
#[derive(Args)]
struct AnalysisOverrides {
    /// Trailing window of each period used for fitting (seconds)
    #[arg(long, global = true)]
    window: Option<f64>,

    /// Minimum output R² for an accepted point
    #[arg(long, global = true)]
    r2_min: Option<f64>,

    /// Minimum output amplitude for an accepted point
    #[arg(long, global = true)]
    amplitude_min: Option<f64>,

    /// Minimum number of samples in the analysis window
    #[arg(long, global = true)]
    min_samples: Option<usize>,
}

#[derive(Subcommand)]
enum Commands {
    /// Analyze every excitation period and render the Bode diagram
    Sweep {
        /// Logged CSV file (prompted for when omitted)
        input: Option<PathBuf>,
    },

    /// Analyze a single excitation period in detail
    Period {
        /// Logged CSV file (prompted for when omitted)
        input: Option<PathBuf>,

        /// Period to analyze in seconds; a decimal comma is accepted (prompted for when omitted)
        #[arg(short, long)]
        period: Option<String>,
    },
}

fn main() {
    let cli = Cli::parse();

    let level = match cli.verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(io::stderr)
        .init();

    if let Err(e) = run(cli) {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> Result<(), Box<dyn Error>> {
    let config = load_config(cli.config.as_deref(), &cli.overrides)?;
    debug!(?config, "effective configuration");

    let plot_dir = cli.output_dir.as_deref();
    let plots = !cli.no_plot;

    match cli.command {
        Commands::Sweep { input } => {
            let input = resolve_input(input)?;
            run_sweep(&input, &config, plots, plot_dir)
        }
        Commands::Period { input, period } => {
            let input = resolve_input(input)?;
            run_period(&input, period, &config, plots, plot_dir)
        }
    }
}

fn load_config(path: Option<&Path>, overrides: &AnalysisOverrides) -> Result<AppConfig, BodeError> {
    let mut config = match path {
        Some(path) => {
            info!("loading configuration from {}", path.display());
            AppConfig::load(path)?
        }
        None => AppConfig::default(),
    };

    if let Some(window) = overrides.window {
        config.analysis.window_s = window;
    }
    if let Some(r2_min) = overrides.r2_min {
        config.analysis.r2_min = r2_min;
    }
    if let Some(amplitude_min) = overrides.amplitude_min {
        config.analysis.amplitude_min = amplitude_min;
    }
    if let Some(min_samples) = overrides.min_samples {
        config.analysis.min_window_samples = min_samples;
    }

    config.validate()?;
    Ok(config)
}

fn prompt(message: &str) -> io::Result<String> {
    print!("{}", message);
    io::stdout().flush()?;
    let mut line = String::new();
    io::stdin().read_line(&mut line)?;
    Ok(line.trim().to_string())
}

/// Uses the given path or asks for one, stripping quotes left by drag-and-drop.
fn resolve_input(input: Option<PathBuf>) -> io::Result<PathBuf> {
    if let Some(path) = input {
        return Ok(path);
    }
    let answer = prompt(&format!("Enter the CSV file path [{}]: ", DEFAULT_INPUT_FILE))?;
    let answer = answer.trim_matches(|c| c == '"' || c == '\'').trim();
    if answer.is_empty() {
        Ok(PathBuf::from(DEFAULT_INPUT_FILE))
    } else {
        Ok(PathBuf::from(answer))
    }
}

/// `<dir>/<stem><suffix>`, where `dir` defaults to the input file's directory.
fn output_path(input: &Path, output_dir: Option<&Path>, suffix: &str) -> PathBuf {
    let stem = input.file_stem().unwrap_or_default().to_string_lossy();
    let dir = output_dir
        .map(Path::to_path_buf)
        .or_else(|| input.parent().map(Path::to_path_buf))
        .unwrap_or_default();
    dir.join(format!("{}{}", stem, suffix))
}

fn load_dataset(input: &Path, config: &AppConfig) -> Result<Dataset, BodeError> {
    let parsed = parse_log_file(input, &config.columns)?;
    info!(
        rows = parsed.rows.len(),
        skipped = parsed.skipped_rows,
        encoding = parsed.encoding.label(),
        "log loaded"
    );
    Ok(Dataset::new(parsed.rows))
}

fn format_periods(periods: &[f64]) -> String {
    periods
        .iter()
        .map(|p| format!("{}s", p))
        .collect::<Vec<_>>()
        .join(", ")
}

fn format_point_line(point: &FrequencyResponsePoint) -> String {
    let r = point.response();
    let metrics = format!(
        "T={:.2}s | Freq={:.4}Hz | R²={:.3} | Mag={:.2}dB | Phase={:.1}°",
        r.period_s, r.frequency_hz, r.output_r_squared, r.gain_db, r.phase_deg
    );
    if point.is_accepted() {
        format!("[OK] {}", metrics)
    } else {
        format!("[REJECTED] {} | {}", metrics, point.verdict())
    }
}

fn run_sweep(
    input: &Path,
    config: &AppConfig,
    plots: bool,
    plot_dir: Option<&Path>,
) -> Result<(), Box<dyn Error>> {
    let dataset = load_dataset(input, config)?;
    let groups = dataset.groups();

    println!("\n--- Frequency Sweep Analysis ---");
    println!(
        "Window: last {}s of each period | Thresholds: amplitude >= {}, R² >= {}",
        config.analysis.window_s, config.analysis.amplitude_min, config.analysis.r2_min
    );
    println!("Found {} excitation periods: {}", groups.len(), format_periods(&dataset.periods()));

    let table = analyze_sweep(&groups, &config.analysis);
    for point in &table {
        println!("  {}", format_point_line(point));
    }

    let skipped = groups.len() - table.len();
    println!(
        "\nSummary: {} accepted, {} rejected, {} skipped.",
        table.accepted().len(),
        table.rejected().len(),
        skipped
    );
    if skipped > 0 {
        println!("  (skipped periods had an invalid period, too few samples or no input excitation; run with -vv for details)");
    }

    if table.is_empty() {
        println!("No frequency response points could be computed.");
        return Ok(());
    }

    if plots {
        let path = output_path(input, plot_dir, "_bode.png");
        plot_bode_sweep(&table, &path, config.analysis.window_s).map_err(|e| BodeError::Plot {
            path: path.clone(),
            message: e.to_string(),
        })?;
        println!("  Generated Bode plot: {}", path.display());
    }

    Ok(())
}

fn select_period(period_arg: Option<String>) -> Result<f64, BodeError> {
    let raw = match period_arg {
        Some(raw) => raw,
        None => prompt("Enter the period to analyze (s): ").map_err(|source| BodeError::Io {
            path: PathBuf::from("<stdin>"),
            source,
        })?,
    };
    parse_period_input(&raw)
}

fn print_period_report(analysis: &PeriodAnalysis, window_s: f64) {
    let r = &analysis.response;
    println!("\n--- Results for T = {}s ({:.4} Hz) ---", r.period_s, r.frequency_hz);
    println!(
        "Samples in window: {} (last {}s of the period)",
        analysis.window.len(),
        window_s
    );
    for (name, fit) in [("Input ", &analysis.input_fit), ("Output", &analysis.output_fit)] {
        println!(
            "{}: amplitude={:.4} | phase={:.2}° | offset={:.4} | R²={:.4}",
            name,
            fit.amplitude(),
            fit.phase_rad().to_degrees(),
            fit.offset(),
            fit.r_squared()
        );
    }
    println!("Gain:  {:.2} dB", r.gain_db);
    println!("Phase: {:.2}°", r.phase_deg);
    println!("Delay: {:.3} s", r.delay_s);
}

fn run_period(
    input: &Path,
    period_arg: Option<String>,
    config: &AppConfig,
    plots: bool,
    plot_dir: Option<&Path>,
) -> Result<(), Box<dyn Error>> {
    let dataset = load_dataset(input, config)?;
    let available = dataset.periods();

    println!("\n--- Single Period Analysis ---");
    println!("Available periods: {}", format_periods(&available));

    let period = select_period(period_arg)?;
    let group = dataset
        .group_for_period(period)
        .ok_or_else(|| BodeError::UnknownPeriod {
            period,
            available: available.clone(),
        })?;

    let analysis = analyze_period(&group, &config.analysis).map_err(BodeError::from)?;
    print_period_report(&analysis, config.analysis.window_s);

    if plots {
        let path = output_path(input, plot_dir, &format!("_period_{}s.png", period));
        plot_period_fit(&analysis, &path).map_err(|e| BodeError::Plot {
            path: path.clone(),
            message: e.to_string(),
        })?;
        println!("  Generated time response plot: {}", path.display());
    }

    Ok(())
}
