//! Distributed identity padding.

use obfusq_ir::{Circuit, Instruction, QubitId};
use rand::Rng;
use rand::seq::SliceRandom;
use tracing::debug;

use crate::boundary::{RewriteContext, preserve_boundary};
use crate::error::ObfResult;
use crate::library::{EquivalenceLibrary, IdentitySequence, IdentityStep};

/// Surround the program with identity sequences.
///
/// Before and after the real instructions, every qubit receives the whole
/// identity catalog in a fresh random order. Sequences are never interleaved.
pub fn pad<R: Rng + ?Sized>(
    circuit: &Circuit,
    library: &EquivalenceLibrary,
    rng: &mut R,
) -> ObfResult<Circuit> {
    preserve_boundary(circuit, |ops, ctx| {
        let mut out = identity_padding(library, ctx, rng);
        let padding = out.len();
        out.extend_from_slice(ops);
        out.extend(identity_padding(library, ctx, rng));

        debug!(
            leading = padding,
            trailing = out.len() - padding - ops.len(),
            "padded program"
        );
        Ok(out)
    })
}

fn identity_padding<R: Rng + ?Sized>(
    library: &EquivalenceLibrary,
    ctx: &RewriteContext,
    rng: &mut R,
) -> Vec<Instruction> {
    let mut out = Vec::new();
    for qubit in ctx.qubits() {
        let mut order: Vec<&IdentitySequence> = library.identities().iter().collect();
        order.shuffle(rng);
        for seq in order {
            emit_sequence(seq, qubit, ctx, &mut out);
        }
    }
    out
}

fn emit_sequence(
    seq: &IdentitySequence,
    qubit: QubitId,
    ctx: &RewriteContext,
    out: &mut Vec<Instruction>,
) {
    for step in &seq.steps {
        match step {
            IdentityStep::OnQubit(gate) => {
                out.push(Instruction::single_qubit_gate(gate.clone(), qubit));
            }
            IdentityStep::AcrossPairs(gate) => {
                let pairs = (ctx.num_qubits() / 2) as u32;
                out.extend((0..pairs).map(|k| {
                    Instruction::two_qubit_gate(gate.clone(), QubitId(2 * k), QubitId(2 * k + 1))
                }));
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use obfusq_ir::{ClbitId, StandardGate};
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    #[test]
    fn test_bell_padding_keeps_measurements_last() {
        let library = EquivalenceLibrary::builtin();
        let circuit = Circuit::bell().unwrap();
        let mut rng = StdRng::seed_from_u64(11);

        let out = pad(&circuit, &library, &mut rng).unwrap();
        let n = out.num_ops();
        assert_eq!(out.instructions()[n - 2], Instruction::measure(QubitId(0), ClbitId(0)));
        assert_eq!(out.instructions()[n - 1], Instruction::measure(QubitId(1), ClbitId(1)));
        assert!(n - 2 > 2);
    }

    #[test]
    fn test_padding_size_is_fixed() {
        let library = EquivalenceLibrary::from_yaml(
            r"
identities:
  - name: hh
    steps: [h, h]
  - name: cx-ladder
    steps: [{ across_pairs: cx }, { across_pairs: cx }]
",
        )
        .unwrap();
        let mut circuit = Circuit::with_size("c", 3, 0);
        circuit.x(QubitId(2)).unwrap();
        let mut rng = StdRng::seed_from_u64(0);

        let out = pad(&circuit, &library, &mut rng).unwrap();
        // Per side: 3 qubits × (2 one-qubit steps + 2 ladder steps on one pair).
        assert_eq!(out.num_ops(), 2 * 3 * 4 + 1);
        assert_eq!(out.instructions()[12], Instruction::single_qubit_gate(StandardGate::X, QubitId(2)));
    }

    #[test]
    fn test_single_qubit_skips_pair_steps() {
        let library = EquivalenceLibrary::from_yaml(
            r"
identities:
  - name: cz-sandwich
    steps: [{ across_pairs: cz }, h, h, { across_pairs: cz }]
",
        )
        .unwrap();
        let mut circuit = Circuit::with_size("c", 1, 0);
        circuit.x(QubitId(0)).unwrap();
        let mut rng = StdRng::seed_from_u64(0);

        let out = pad(&circuit, &library, &mut rng).unwrap();
        assert!(out.instructions().iter().all(|i| i.qubits == vec![QubitId(0)]));
        assert_eq!(out.num_ops(), 5);
    }
}
