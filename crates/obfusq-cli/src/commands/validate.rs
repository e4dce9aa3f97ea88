//! Validate command implementation.

use std::path::Path;

use anyhow::Result;
use console::{Term, style};

use super::common::{ensure_accuracy, load_circuit, print_validation, run_validation};

/// Execute the validate command.
pub async fn execute(original: &Path, obfuscated: &Path, shots: u32, trials: u32) -> Result<()> {
    let term = Term::stdout();
    term.write_line(&format!(
        "{} Comparing {} with {} ({} shots, {} trials)",
        style("→").cyan().bold(),
        style(original.display()).green(),
        style(obfuscated.display()).green(),
        shots,
        trials
    ))?;

    let (original, _) = load_circuit(original)?;
    let (obfuscated, _) = load_circuit(obfuscated)?;

    if original.num_qubits() != obfuscated.num_qubits()
        || original.num_clbits() != obfuscated.num_clbits()
    {
        anyhow::bail!(
            "Register shapes differ: {}q/{}c vs {}q/{}c",
            original.num_qubits(),
            original.num_clbits(),
            obfuscated.num_qubits(),
            obfuscated.num_clbits()
        );
    }

    let report = run_validation(&original, &obfuscated, shots, trials).await?;
    print_validation(&term, &report)?;
    ensure_accuracy(&report)
}
