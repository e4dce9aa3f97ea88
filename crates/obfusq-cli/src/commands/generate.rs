//! Generate command implementation.

use std::path::Path;

use anyhow::{Context, Result};
use rand::SeedableRng;
use rand::rngs::StdRng;

use obfusq_ir::Circuit;
use obfusq_qasm::Dialect;

use super::common::write_circuit;

/// Build a random layered program ending in a full measurement.
pub fn random_program(qubits: u32, depth: u32, seed: Option<u64>) -> Result<Circuit> {
    if qubits == 0 {
        anyhow::bail!("A program needs at least one qubit");
    }
    let mut rng = seed.map_or_else(StdRng::from_entropy, StdRng::seed_from_u64);
    Circuit::random(qubits, depth, &mut rng).context("Failed to build random program")
}

/// Execute the generate command.
pub fn execute(qubits: u32, depth: u32, seed: Option<u64>, output: Option<&Path>) -> Result<()> {
    let circuit = random_program(qubits, depth, seed)?;
    write_circuit(&circuit, Dialect::Qasm3, output)?;

    if let Some(path) = output {
        eprintln!(
            "{} Wrote {} ({} qubits, {} ops)",
            console::style("✓").green().bold(),
            console::style(path.display()).green(),
            circuit.num_qubits(),
            circuit.num_ops()
        );
    }
    Ok(())
}
