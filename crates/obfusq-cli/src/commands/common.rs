//! Shared helpers for CLI commands.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use clap::ValueEnum;
use console::{Term, style};
use indicatif::{ProgressBar, ProgressStyle};

use obfusq_adapter_sim::SimulatorBackend;
use obfusq_core::ObfuscatorConfig;
use obfusq_eval::{ValidationReport, Validator};
use obfusq_hal::Counts;
use obfusq_ir::Circuit;
use obfusq_qasm::Dialect;

/// Accuracy, in percent, below which a comparison counts as failed.
pub const ACCURACY_THRESHOLD: f64 = 95.0;

/// Output dialect selectable on the command line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputDialect {
    /// `OPENQASM 2.0`
    Qasm2,
    /// `OPENQASM 3.0`
    Qasm3,
}

impl From<OutputDialect> for Dialect {
    fn from(dialect: OutputDialect) -> Self {
        match dialect {
            OutputDialect::Qasm2 => Dialect::Qasm2,
            OutputDialect::Qasm3 => Dialect::Qasm3,
        }
    }
}

/// Load an `OpenQASM` 2 or 3 program and report which dialect matched.
pub fn load_circuit(path: &Path) -> Result<(Circuit, Dialect)> {
    if !path.exists() {
        anyhow::bail!("File not found: {}", path.display());
    }

    let source = fs::read_to_string(path)
        .with_context(|| format!("Failed to read file: {}", path.display()))?;

    obfusq_qasm::load(&source).with_context(|| format!("Failed to parse {}", path.display()))
}

/// Print `circuit` in `dialect` to `output`, or to stdout when absent.
pub fn write_circuit(circuit: &Circuit, dialect: Dialect, output: Option<&Path>) -> Result<()> {
    let text = obfusq_qasm::emit(circuit, dialect);
    match output {
        Some(path) => fs::write(path, text)
            .with_context(|| format!("Failed to write file: {}", path.display())),
        None => {
            print!("{text}");
            Ok(())
        }
    }
}

/// Default config location (`~/.obfusq/config.yaml`).
pub fn default_config_path() -> Option<PathBuf> {
    dirs::home_dir().map(|home| home.join(".obfusq").join("config.yaml"))
}

/// Load the config named on the command line, or the default one if present.
pub fn load_config(explicit: Option<&Path>) -> Result<ObfuscatorConfig> {
    match explicit {
        Some(path) => ObfuscatorConfig::from_file(path)
            .with_context(|| format!("Failed to load config: {}", path.display())),
        None => match default_config_path() {
            Some(path) => ObfuscatorConfig::load_or_default(&path)
                .with_context(|| format!("Failed to load config: {}", path.display())),
            None => Ok(ObfuscatorConfig::default()),
        },
    }
}

/// Run both programs on the simulator behind a spinner.
pub async fn run_validation(
    original: &Circuit,
    obfuscated: &Circuit,
    shots: u32,
    trials: u32,
) -> Result<ValidationReport> {
    let spinner = ProgressBar::new_spinner();
    spinner.set_style(
        ProgressStyle::default_spinner()
            .template("{spinner:.cyan} {msg}")
            .context("Invalid spinner template")?,
    );
    spinner.set_message(format!("Running {trials} trials of {shots} shots..."));
    spinner.enable_steady_tick(Duration::from_millis(100));

    let validator = Validator::new(SimulatorBackend::new())
        .with_shots(shots)
        .with_trials(trials);
    let report = validator.compare(original, obfuscated).await;
    spinner.finish_and_clear();

    report.context("Validation run failed")
}

/// Print a histogram as a table with bars, most frequent outcome first.
pub fn print_counts(term: &Term, title: &str, counts: &Counts) -> Result<()> {
    term.write_line(&format!(
        "\n  {} ({} shots):",
        style(title).bold(),
        counts.total_shots()
    ))?;

    let sorted = counts.sorted();
    let total = counts.total_shots().max(1) as f64;

    for (bitstring, count) in sorted.iter().take(16) {
        let prob = *count as f64 / total * 100.0;
        let bar_len = (prob / 2.0).round() as usize;
        let bar: String = "█".repeat(bar_len);

        term.write_line(&format!(
            "    {}: {:>6} ({:>5.2}%) {}",
            style(bitstring).cyan(),
            count,
            prob,
            style(bar).green()
        ))?;
    }

    if sorted.len() > 16 {
        term.write_line(&format!("    ... and {} more outcomes", sorted.len() - 16))?;
    }
    Ok(())
}

/// Print both histograms, the accuracy and the latency overhead.
pub fn print_validation(term: &Term, report: &ValidationReport) -> Result<()> {
    print_counts(term, "Original", &report.original_counts)?;
    print_counts(term, "Obfuscated", &report.obfuscated_counts)?;

    let marker = if report.passes(ACCURACY_THRESHOLD) {
        style("✓").green().bold()
    } else {
        style("✗").red().bold()
    };
    term.write_line(&format!(
        "\n{} Semantic accuracy: {} ({} trials on {})",
        marker,
        style(format!("{:.2}%", report.accuracy)).yellow(),
        report.trials,
        report.backend
    ))?;

    term.write_line(&format!(
        "  Latency: {:.2} ms original, {:.2} ms obfuscated",
        report.original_latency_ms, report.obfuscated_latency_ms
    ))?;
    if let Some(overhead) = report.latency_overhead() {
        term.write_line(&format!("  Overhead: {}", style(format!("{overhead:.2}x")).dim()))?;
    }
    Ok(())
}

/// Fail when a comparison falls short of the accuracy threshold.
pub fn ensure_accuracy(report: &ValidationReport) -> Result<()> {
    if !report.passes(ACCURACY_THRESHOLD) {
        anyhow::bail!(
            "Semantic accuracy {:.2}% is below {ACCURACY_THRESHOLD}%",
            report.accuracy
        );
    }
    Ok(())
}
