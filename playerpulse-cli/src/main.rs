mod report;

use anyhow::{Context, Result};
use chrono::NaiveDate;
use clap::Parser;
use colored::Colorize;
use log::info;
use std::fs::{self, File};
use std::io::{BufWriter, Write, stdout};
use std::path::PathBuf;
use std::time::Instant;

use playerpulse_core::{SimulationConfig, clean_session_file, run};
use report::{ReportFormat, write_clean_report, write_run_report};

#[derive(Debug, Parser)]
#[command(name = "playerpulse", version)]
#[command(
    about = "Synthesize and clean user play sessions from daily game-popularity snapshots"
)]
struct Args {
    /// JSON configuration file; flags below override its values
    #[arg(long)]
    config: Option<PathBuf>,

    /// Directory holding the daily popularity CSV snapshots
    #[arg(long)]
    data_dir: Option<PathBuf>,

    /// Destination of the cleaned session dataset
    #[arg(long)]
    output: Option<PathBuf>,

    /// Size of the synthetic user pool
    #[arg(long)]
    num_users: Option<usize>,

    /// Number of sessions to synthesize
    #[arg(long)]
    sessions: Option<usize>,

    /// First day of the simulation window (YYYY-MM-DD)
    #[arg(long)]
    start_date: Option<NaiveDate>,

    /// Length of the simulation window in days
    #[arg(long)]
    days: Option<u32>,

    /// Random seed for reproducible output
    #[arg(long)]
    seed: Option<u64>,

    /// Parallel synthesis workers (output is reproducible per seed and worker count)
    #[arg(long)]
    workers: Option<usize>,

    /// Re-clean an existing raw session CSV instead of running the simulation
    #[arg(long)]
    clean_input: Option<PathBuf>,

    /// Run report format
    #[arg(long, value_enum, default_value_t = ReportFormat::Console)]
    report: ReportFormat,

    /// Optional path to write the run report instead of stdout
    #[arg(long)]
    report_output: Option<PathBuf>,

    /// Verbose output
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> Result<()> {
    let args = Args::parse();
    init_logging(args.verbose);

    let config = resolve_config(&args)?;
    if args.report == ReportFormat::Console && args.report_output.is_none() {
        announce_banner();
    }

    let start_time = Instant::now();
    let mut output_target = OutputTarget::new(args.report_output.clone())?;
    if let Some(input) = &args.clean_input {
        info!("Cleaning {}", input.display());
        let summary = clean_session_file(
            input,
            &config.output_path,
            Some(config.duration.bounds),
        )
        .with_context(|| format!("failed to clean {}", input.display()))?;
        info!(
            "Kept {} of {} rows in {}",
            summary.clean.rows_kept,
            summary.clean.rows_in,
            summary.output_path.display()
        );
        write_clean_report(
            output_target.writer(),
            args.report,
            &summary,
            start_time.elapsed(),
        )?;
    } else {
        info!(
            "Simulating {} sessions for {} users from {} (seed {})",
            config.target_session_count,
            config.num_users,
            config.data_dir.display(),
            config.seed
        );
        let summary = run(&config).context("session simulation failed")?;
        info!(
            "Wrote {} sessions to {}",
            summary.clean.rows_kept,
            summary.output_path.display()
        );
        write_run_report(
            output_target.writer(),
            args.report,
            &summary,
            start_time.elapsed(),
        )?;
    }
    output_target.flush_inner()?;
    Ok(())
}

fn init_logging(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_level))
        .init();
}

fn announce_banner() {
    println!("{}", "🎮 PlayerPulse Session Simulator".bright_cyan().bold());
    println!("{}", "================================".cyan());
}

fn resolve_config(args: &Args) -> Result<SimulationConfig> {
    let mut config = match &args.config {
        Some(path) => SimulationConfig::load(path)
            .with_context(|| format!("failed to load config {}", path.display()))?,
        None => SimulationConfig::default(),
    };
    apply_overrides(&mut config, args);
    config.validate().context("invalid configuration")?;
    if let Some(path) = &args.config {
        info!("Loaded configuration from {}", path.display());
    }
    Ok(config)
}

fn apply_overrides(config: &mut SimulationConfig, args: &Args) {
    if let Some(dir) = &args.data_dir {
        config.data_dir.clone_from(dir);
    }
    if let Some(path) = &args.output {
        config.output_path.clone_from(path);
    }
    if let Some(num_users) = args.num_users {
        config.num_users = num_users;
    }
    if let Some(sessions) = args.sessions {
        config.target_session_count = sessions;
    }
    if let Some(start_date) = args.start_date {
        config.start_date = start_date;
    }
    if let Some(days) = args.days {
        config.simulation_days = days;
    }
    if let Some(seed) = args.seed {
        config.seed = seed;
    }
    if let Some(workers) = args.workers {
        config.workers = workers;
    }
}

enum OutputTarget {
    Stdout(BufWriter<std::io::Stdout>),
    File(BufWriter<File>),
}

impl OutputTarget {
    fn new(path: Option<PathBuf>) -> Result<Self> {
        if let Some(path) = path {
            if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
                fs::create_dir_all(parent)
                    .with_context(|| format!("failed to create {}", parent.display()))?;
            }
            let file = File::create(&path)
                .with_context(|| format!("failed to create {}", path.display()))?;
            Ok(Self::File(BufWriter::new(file)))
        } else {
            Ok(Self::Stdout(BufWriter::new(stdout())))
        }
    }

    fn writer(&mut self) -> &mut dyn Write {
        match self {
            Self::Stdout(w) => w,
            Self::File(w) => w,
        }
    }

    fn flush_inner(&mut self) -> std::io::Result<()> {
        match self {
            Self::Stdout(w) => w.flush(),
            Self::File(w) => w.flush(),
        }
    }
}
