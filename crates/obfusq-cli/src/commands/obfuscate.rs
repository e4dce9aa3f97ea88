//! Obfuscate command implementation.
//!
//! Progress goes to stderr so the rewritten program can be piped from stdout.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use console::{Term, style};
use tracing::debug;

use obfusq_core::{Obfuscator, ObfuscatorConfig, Strategy};
use obfusq_eval::{ExportConfig, ObfuscationReport, export};
use obfusq_qasm::Dialect;

use super::common::{
    OutputDialect, ensure_accuracy, load_circuit, load_config, print_validation, run_validation,
    write_circuit,
};

/// Arguments of `obfusq obfuscate`.
#[derive(Debug, Clone)]
pub struct ObfuscateArgs {
    pub input: PathBuf,
    pub output: Option<PathBuf>,
    pub strategy: Option<String>,
    pub seed: Option<u64>,
    pub probability: Option<f64>,
    pub dialect: Option<OutputDialect>,
    pub validate: bool,
    pub shots: u32,
    pub trials: u32,
    pub report: Option<PathBuf>,
}

/// Apply command-line overrides on top of the file settings.
pub fn apply_overrides(mut config: ObfuscatorConfig, args: &ObfuscateArgs) -> Result<ObfuscatorConfig> {
    if let Some(name) = &args.strategy {
        config.strategy = name.parse::<Strategy>()?;
    }
    if let Some(seed) = args.seed {
        config.seed = Some(seed);
    }
    if let Some(probability) = args.probability {
        config.probability = probability;
    }
    config.options().validate()?;
    Ok(config)
}

/// Execute the obfuscate command.
pub async fn execute(config_path: Option<&Path>, args: &ObfuscateArgs) -> Result<()> {
    let term = Term::stderr();
    let config = apply_overrides(load_config(config_path)?, args)?;
    debug!(?config, "effective configuration");

    term.write_line(&format!(
        "{} Obfuscating {} with {}",
        style("→").cyan().bold(),
        style(args.input.display()).green(),
        style(config.strategy).yellow()
    ))?;

    let (circuit, input_dialect) = load_circuit(&args.input)?;
    term.write_line(&format!(
        "  Loaded ({}): {} qubits, {} ops, depth {}",
        input_dialect,
        circuit.num_qubits(),
        circuit.num_ops(),
        circuit.depth()
    ))?;

    let mut obfuscator =
        Obfuscator::from_config(&config).context("Failed to set up the obfuscator")?;
    let result = obfuscator
        .obfuscate(&circuit)
        .with_context(|| format!("Failed to obfuscate {}", args.input.display()))?;

    let stats = &result.stats;
    term.write_line(&format!(
        "  Obfuscated: {} ops, depth {} ({:.2}x growth)",
        stats.obfuscated_ops, stats.obfuscated_depth, stats.growth_factor
    ))?;

    let dialect = args.dialect.map_or(input_dialect, Dialect::from);
    write_circuit(&result.circuit, dialect, args.output.as_deref())?;
    if let Some(path) = &args.output {
        term.write_line(&format!(
            "{} Wrote {} ({})",
            style("✓").green().bold(),
            style(path.display()).green(),
            dialect
        ))?;
    }

    let validation = if args.validate {
        let report = run_validation(&circuit, &result.circuit, args.shots, args.trials).await?;
        print_validation(&term, &report)?;
        Some(report)
    } else {
        None
    };

    if let Some(path) = &args.report {
        let mut report = ObfuscationReport::new(result.stats.clone())
            .with_source(args.input.display().to_string())
            .with_seed(config.seed);
        if let Some(validation) = &validation {
            report = report.with_validation(validation.clone());
        }
        export::to_file(&report, path, &ExportConfig::default())
            .with_context(|| format!("Failed to write report: {}", path.display()))?;
        term.write_line(&format!(
            "{} Report written to {}",
            style("✓").green().bold(),
            style(path.display()).green()
        ))?;
    }

    if let Some(validation) = &validation {
        ensure_accuracy(validation)?;
    }
    Ok(())
}
