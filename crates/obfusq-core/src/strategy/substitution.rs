//! Gate substitution.

use obfusq_ir::{Circuit, Instruction, StandardGate};
use rand::Rng;
use rand::seq::SliceRandom;
use tracing::debug;

use super::DecoyMode;
use crate::boundary::{RewriteContext, preserve_boundary};
use crate::error::ObfResult;
use crate::library::EquivalenceLibrary;

/// Replace every rewritable gate with a uniformly chosen alternative from its
/// equivalence rule.
///
/// Parameterized gates, composites, resets, barriers and kinds without a rule
/// pass through unchanged. Decoy blocks built by the same mechanism are placed
/// before and after the real instructions.
pub fn substitute<R: Rng + ?Sized>(
    circuit: &Circuit,
    library: &EquivalenceLibrary,
    decoys: DecoyMode,
    rng: &mut R,
) -> ObfResult<Circuit> {
    preserve_boundary(circuit, |ops, ctx| {
        let seed = decoy_seed(decoys, ctx);

        let mut out = Vec::with_capacity(ops.len() * 3);
        substitute_all(&seed, library, rng, &mut out);
        let real_start = out.len();
        let replaced = substitute_all(ops, library, rng, &mut out);
        let real_len = out.len() - real_start;
        substitute_all(&seed, library, rng, &mut out);

        debug!(
            replaced,
            passed_through = ops.len() - replaced,
            decoy_ops = out.len() - real_len,
            "substituted gates"
        );
        Ok(out)
    })
}

/// Rewrite `ops` into `out`, returning how many instructions were replaced.
fn substitute_all<R: Rng + ?Sized>(
    ops: &[Instruction],
    library: &EquivalenceLibrary,
    rng: &mut R,
    out: &mut Vec<Instruction>,
) -> usize {
    let mut replaced = 0;
    for inst in ops {
        let alternative = inst
            .as_standard()
            .filter(|gate| !gate.has_parameters())
            .and_then(|gate| library.rule(gate))
            .and_then(|rule| rule.alternatives.choose(rng));

        match alternative {
            Some(steps) => {
                out.extend(steps.iter().map(|step| {
                    Instruction::gate(
                        step.gate.clone(),
                        step.operands.iter().map(|&i| inst.qubits[i]),
                    )
                }));
                replaced += 1;
            }
            None => out.push(inst.clone()),
        }
    }
    replaced
}

fn decoy_seed(mode: DecoyMode, ctx: &RewriteContext) -> Vec<Instruction> {
    match mode {
        DecoyMode::Empty => Vec::new(),
        DecoyMode::SelfInversePairs => ctx
            .qubits()
            .flat_map(|q| {
                [
                    Instruction::single_qubit_gate(StandardGate::X, q),
                    Instruction::single_qubit_gate(StandardGate::X, q),
                ]
            })
            .collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use obfusq_ir::{ClbitId, QubitId};
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    #[test]
    fn test_substitution_replaces_ruled_gates() {
        let library = EquivalenceLibrary::builtin();
        let mut circuit = Circuit::with_size("c", 2, 2);
        circuit
            .x(QubitId(0))
            .unwrap()
            .cx(QubitId(0), QubitId(1))
            .unwrap()
            .measure(QubitId(0), ClbitId(0))
            .unwrap();

        let mut rng = StdRng::seed_from_u64(3);
        let out = substitute(&circuit, &library, DecoyMode::Empty, &mut rng).unwrap();

        // Every alternative of x and cx has at least two steps.
        assert!(out.num_ops() >= 5);
        assert!(out.instructions().last().unwrap().is_measure());
        assert_eq!(out.measurements().count(), 1);
    }

    #[test]
    fn test_parameterized_and_unruled_gates_pass_through() {
        let library = EquivalenceLibrary::builtin();
        let mut circuit = Circuit::with_size("c", 2, 0);
        circuit
            .rz(0.25, QubitId(0))
            .unwrap()
            .ch(QubitId(0), QubitId(1))
            .unwrap()
            .reset(QubitId(1))
            .unwrap();

        let mut rng = StdRng::seed_from_u64(0);
        let out = substitute(&circuit, &library, DecoyMode::Empty, &mut rng).unwrap();
        assert_eq!(out.instructions(), circuit.instructions());
    }

    #[test]
    fn test_operands_follow_control_and_target() {
        let library = EquivalenceLibrary::builtin();
        let mut circuit = Circuit::with_size("c", 3, 0);
        circuit.cy(QubitId(2), QubitId(0)).unwrap();

        let mut rng = StdRng::seed_from_u64(1);
        let out = substitute(&circuit, &library, DecoyMode::Empty, &mut rng).unwrap();

        // cy has the single alternative sdg(t) cx(c, t) s(t).
        let names: Vec<_> = out.instructions().iter().map(|i| i.name()).collect();
        assert_eq!(names, ["sdg", "cx", "s"]);
        assert_eq!(out.instructions()[0].qubits, vec![QubitId(0)]);
        assert_eq!(out.instructions()[1].qubits, vec![QubitId(2), QubitId(0)]);
    }

    #[test]
    fn test_default_decoys_are_empty() {
        let library = EquivalenceLibrary::builtin();
        let mut circuit = Circuit::with_size("c", 2, 0);
        circuit.reset(QubitId(0)).unwrap();

        let mut rng = StdRng::seed_from_u64(0);
        let out = substitute(&circuit, &library, DecoyMode::Empty, &mut rng).unwrap();
        assert_eq!(out.num_ops(), 1);

        let out = substitute(&circuit, &library, DecoyMode::SelfInversePairs, &mut rng).unwrap();
        assert!(out.num_ops() > 1);
        let reset_at = out.instructions().iter().position(|i| i.is_reset()).unwrap();
        assert!(reset_at > 0 && reset_at < out.num_ops() - 1);
    }
}
