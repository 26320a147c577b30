use anyhow::Result;
use clap::ValueEnum;
use colored::Colorize;
use playerpulse_core::{CleanReport, CleanSummary, RunSummary, ScanReport};
use serde::Serialize;
use std::io::Write;
use std::time::Duration;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ReportFormat {
    /// Human-readable summary with colors
    Console,
    /// Pretty-printed JSON document
    Json,
}

#[derive(Debug, Serialize)]
struct Timed<'a, T: Serialize> {
    #[serde(flatten)]
    summary: &'a T,
    elapsed_ms: u128,
}

pub fn write_run_report(
    out: &mut dyn Write,
    format: ReportFormat,
    summary: &RunSummary,
    elapsed: Duration,
) -> Result<()> {
    match format {
        ReportFormat::Json => write_json(out, summary, elapsed),
        ReportFormat::Console => {
            writeln!(out)?;
            writeln!(out, "{}", "📊 Session Simulation Summary".bright_cyan().bold())?;
            writeln!(out, "{}", "=============================".cyan())?;
            write_scan_section(out, &summary.scan)?;
            writeln!(
                out,
                "Games ranked: {} (max rank {})",
                summary.games_ranked, summary.max_rank
            )?;
            if summary.unnamed_rows > 0 {
                writeln!(
                    out,
                    "Unnamed rows ignored: {}",
                    summary.unnamed_rows.to_string().yellow()
                )?;
            }
            writeln!(
                out,
                "Sessions generated: {} (seed {}, {} worker(s))",
                summary.sessions_generated, summary.seed, summary.workers
            )?;
            write_clean_section(out, &summary.clean)?;
            writeln!(out, "Output: {}", summary.output_path.display())?;
            writeln!(out, "Total time: {elapsed:?}")?;
            Ok(())
        }
    }
}

pub fn write_clean_report(
    out: &mut dyn Write,
    format: ReportFormat,
    summary: &CleanSummary,
    elapsed: Duration,
) -> Result<()> {
    match format {
        ReportFormat::Json => write_json(out, summary, elapsed),
        ReportFormat::Console => {
            writeln!(out)?;
            writeln!(out, "{}", "🧹 Session Cleaning Summary".bright_cyan().bold())?;
            writeln!(out, "{}", "===========================".cyan())?;
            writeln!(out, "Input: {}", summary.input_path.display())?;
            write_clean_section(out, &summary.clean)?;
            writeln!(out, "Output: {}", summary.output_path.display())?;
            writeln!(out, "Total time: {elapsed:?}")?;
            Ok(())
        }
    }
}

fn write_json<T: Serialize>(out: &mut dyn Write, summary: &T, elapsed: Duration) -> Result<()> {
    let timed = Timed {
        summary,
        elapsed_ms: elapsed.as_millis(),
    };
    serde_json::to_writer_pretty(&mut *out, &timed)?;
    writeln!(out)?;
    Ok(())
}

fn write_scan_section(out: &mut dyn Write, scan: &ScanReport) -> Result<()> {
    writeln!(
        out,
        "Input files: {} seen, {} used, {} skipped",
        scan.files_seen,
        scan.files_accepted.to_string().green(),
        scan.skipped.len().to_string().yellow()
    )?;
    for skipped in &scan.skipped {
        writeln!(
            out,
            "   • {}: {}",
            skipped.path.display(),
            skipped.reason.yellow()
        )?;
    }
    writeln!(out, "Rows read: {}", scan.rows_accepted)?;
    Ok(())
}

fn write_clean_section(out: &mut dyn Write, clean: &CleanReport) -> Result<()> {
    writeln!(
        out,
        "Sessions kept: {}/{}",
        clean.rows_kept.to_string().green(),
        clean.rows_in
    )?;
    let dropped = clean.rows_dropped();
    if dropped > 0 {
        writeln!(out, "Sessions dropped: {}", dropped.to_string().red())?;
        for (reason, count) in &clean.dropped {
            writeln!(out, "   • {reason:?}: {count}")?;
        }
    }
    Ok(())
}
