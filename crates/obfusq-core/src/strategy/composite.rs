//! Composite encapsulation.

use obfusq_ir::{Circuit, CompositeGate, Instruction, StandardGate};
use rand::Rng;
use tracing::debug;

use super::StrategyOptions;
use crate::boundary::{RewriteContext, preserve_boundary};
use crate::error::ObfResult;
use crate::library::EquivalenceLibrary;

/// Name of the per-qubit camouflage unit opening the program.
pub const AUXILIARY_BLOCK: &str = "auxiliary";

/// Name of the per-qubit unit undoing the camouflage.
pub const RESTORE_BLOCK: &str = "restore";

/// Wrap gates in composite units under a misleading label.
///
/// The program is opened with one camouflage unit per qubit and closed with
/// its inverse. In between, each non-parameterized gate is wrapped with
/// probability `options.probability`. A program with nothing but measurements
/// is left alone.
pub fn encapsulate<R: Rng + ?Sized>(
    circuit: &Circuit,
    library: &EquivalenceLibrary,
    options: &StrategyOptions,
    rng: &mut R,
) -> ObfResult<Circuit> {
    options.validate()?;

    preserve_boundary(circuit, |ops, ctx| {
        if ops.is_empty() {
            return Ok(Vec::new());
        }

        let mut out = Vec::with_capacity(ops.len() + 2 * ctx.num_qubits());
        out.extend(per_qubit_blocks(AUXILIARY_BLOCK, library.camouflage(), ctx)?);

        let mut wrapped = 0usize;
        for inst in ops {
            if is_wrappable(inst) && rng.gen_bool(options.probability) {
                let (unit, operands) =
                    CompositeGate::wrap(options.label.as_str(), std::slice::from_ref(inst))?;
                out.push(Instruction::gate(unit, operands));
                wrapped += 1;
            } else {
                out.push(inst.clone());
            }
        }

        out.extend(per_qubit_blocks(RESTORE_BLOCK, &library.restore(), ctx)?);

        debug!(
            wrapped,
            total = ops.len(),
            label = %options.label,
            "encapsulated gates"
        );
        Ok(out)
    })
}

fn is_wrappable(inst: &Instruction) -> bool {
    inst.as_gate()
        .is_some_and(|gate| gate.as_standard().is_none_or(|g| !g.has_parameters()))
}

fn per_qubit_blocks(
    name: &str,
    gates: &[StandardGate],
    ctx: &RewriteContext,
) -> ObfResult<Vec<Instruction>> {
    let mut blocks = Vec::with_capacity(ctx.num_qubits());
    for q in ctx.qubits() {
        let run: Vec<Instruction> = gates
            .iter()
            .map(|g| Instruction::single_qubit_gate(g.clone(), q))
            .collect();
        let (unit, operands) = CompositeGate::wrap(name, &run)?;
        blocks.push(Instruction::gate(unit, operands));
    }
    Ok(blocks)
}
