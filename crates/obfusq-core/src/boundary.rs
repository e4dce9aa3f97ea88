//! The measurement boundary.
//!
//! Every strategy rewrites only the non-measurement part of a program.
//! Measurements are split off, the rewrite runs, and the measurements are
//! re-appended in their original relative order. The result is checked so
//! that no strategy can drop, add or reorder a measurement, or change the
//! register shape.

use obfusq_ir::{Circuit, Instruction, QubitId};
use rustc_hash::FxHashSet;
use tracing::warn;

use crate::error::{ObfResult, ObfuscationError};

/// Register sizes of the program being rewritten.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RewriteContext {
    num_qubits: u32,
    num_clbits: u32,
}

impl RewriteContext {
    /// The shape of a circuit.
    pub fn of(circuit: &Circuit) -> Self {
        Self {
            num_qubits: circuit.num_qubits() as u32,
            num_clbits: circuit.num_clbits() as u32,
        }
    }

    /// Size of the quantum register.
    pub fn num_qubits(&self) -> usize {
        self.num_qubits as usize
    }

    /// Size of the classical register.
    pub fn num_clbits(&self) -> usize {
        self.num_clbits as usize
    }

    /// Every qubit of the register, in index order.
    pub fn qubits(&self) -> impl Iterator<Item = QubitId> {
        (0..self.num_qubits).map(QubitId)
    }
}

/// Partition instructions into `(non_measurement, measurement)`, keeping
/// each side in program order.
pub fn split(instructions: &[Instruction]) -> (Vec<Instruction>, Vec<Instruction>) {
    instructions.iter().cloned().partition(|inst| !inst.is_measure())
}

/// Rewrite the non-measurement part of `circuit` and re-append its
/// measurements.
///
/// The output has the same name and register shape as the input. Fails with
/// [`ObfuscationError::MeasurementLost`] or [`ObfuscationError::ShapeChanged`]
/// if the rewrite disturbed the boundary.
pub fn preserve_boundary<F>(circuit: &Circuit, rewrite: F) -> ObfResult<Circuit>
where
    F: FnOnce(&[Instruction], &RewriteContext) -> ObfResult<Vec<Instruction>>,
{
    warn_on_mid_circuit_measurement(circuit);

    let ctx = RewriteContext::of(circuit);
    let (body, measurements) = split(circuit.instructions());
    let rewritten = rewrite(&body, &ctx)?;

    let output = Circuit::from_instructions(
        circuit.name(),
        ctx.num_qubits,
        ctx.num_clbits,
        rewritten.into_iter().chain(measurements),
    )?;
    verify_boundary(circuit, &output)?;
    Ok(output)
}

/// Check that `obfuscated` has the shape and measurement sequence of
/// `original`.
pub fn verify_boundary(original: &Circuit, obfuscated: &Circuit) -> ObfResult<()> {
    if original.num_qubits() != obfuscated.num_qubits()
        || original.num_clbits() != obfuscated.num_clbits()
    {
        return Err(ObfuscationError::ShapeChanged {
            expected_qubits: original.num_qubits(),
            expected_clbits: original.num_clbits(),
            found_qubits: obfuscated.num_qubits(),
            found_clbits: obfuscated.num_clbits(),
        });
    }

    let expected: Vec<&Instruction> = original.measurements().collect();
    let found: Vec<&Instruction> = obfuscated.measurements().collect();
    if expected != found {
        let found = if expected.len() == found.len() {
            expected.iter().zip(&found).filter(|(a, b)| a == b).count()
        } else {
            found.len()
        };
        return Err(ObfuscationError::MeasurementLost {
            expected: expected.len(),
            found,
        });
    }

    Ok(())
}

/// Warn when a measured qubit is touched again. Such a program is still
/// rewritten, but its measurements move to the end.
fn warn_on_mid_circuit_measurement(circuit: &Circuit) {
    let mut measured: FxHashSet<QubitId> = FxHashSet::default();
    for inst in circuit.instructions() {
        if inst.is_measure() {
            measured.extend(inst.qubits.iter().copied());
        } else if !inst.is_barrier() {
            if let Some(q) = inst.qubits.iter().find(|q| measured.contains(q)) {
                warn!(
                    circuit = circuit.name(),
                    qubit = q.0,
                    op = inst.name(),
                    "qubit is used after measurement; measurements will be moved to the end"
                );
                return;
            }
        }
    }
}
