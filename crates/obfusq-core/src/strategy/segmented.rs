//! Segmented self-inverse injection.

use obfusq_ir::{Circuit, Instruction, QubitId};
use rand::Rng;
use rand::seq::SliceRandom;
use tracing::debug;

use crate::boundary::{RewriteContext, preserve_boundary};
use crate::error::ObfResult;
use crate::library::{EquivalenceLibrary, InjectionPair};

/// Segment length for a program body of `n` instructions.
pub fn segment_length(n: usize) -> usize {
    (n / 3).max(1)
}

/// Number of injection passes made over a body of `n` instructions.
///
/// A pass opens every segment after the first and closes every complete
/// segment, which gives `⌊(n-1)/L⌋ + ⌊n/L⌋` passes.
pub fn injection_passes(n: usize) -> usize {
    if n == 0 {
        return 0;
    }
    let len = segment_length(n);
    (n - 1) / len + n / len
}

/// Inject gate/inverse pairs between segments of the program.
///
/// The body is cut into segments of [`segment_length`] instructions. A pass is
/// made before each segment boundary and after each segment end. Multi-qubit
/// pairs land on randomly sampled distinct qubits and are skipped when the
/// register is too small.
pub fn inject<R: Rng + ?Sized>(
    circuit: &Circuit,
    library: &EquivalenceLibrary,
    rng: &mut R,
) -> ObfResult<Circuit> {
    preserve_boundary(circuit, |ops, ctx| {
        let len = segment_length(ops.len());
        let mut out = Vec::with_capacity(ops.len() * 2);
        let mut passes = 0usize;

        for (i, inst) in ops.iter().enumerate() {
            if i % len == 0 && i != 0 {
                injection_pass(library, ctx, rng, &mut out);
                passes += 1;
            }
            out.push(inst.clone());
            if i % len == len - 1 {
                injection_pass(library, ctx, rng, &mut out);
                passes += 1;
            }
        }

        debug!(
            segment_length = len,
            passes,
            injected = out.len() - ops.len(),
            "injected inverse pairs"
        );
        Ok(out)
    })
}

fn injection_pass<R: Rng + ?Sized>(
    library: &EquivalenceLibrary,
    ctx: &RewriteContext,
    rng: &mut R,
    out: &mut Vec<Instruction>,
) {
    let width = ctx.num_qubits();
    for qubit in ctx.qubits() {
        let mut order: Vec<&InjectionPair> = library.injections().iter().collect();
        order.shuffle(rng);

        for pair in order {
            let Some(inverse) = pair.inverse() else {
                continue;
            };
            let arity = pair.arity() as usize;
            let operands: Vec<QubitId> = if arity == 1 {
                vec![qubit]
            } else if arity <= width {
                rand::seq::index::sample(rng, width, arity)
                    .into_iter()
                    .map(|q| QubitId(q as u32))
                    .collect()
            } else {
                continue;
            };

            out.push(Instruction::gate(pair.gate.clone(), operands.iter().copied()));
            out.push(Instruction::gate(inverse, operands));
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
    fn test_pass_count_formula() {
        assert_eq!(injection_passes(0), 0);
        assert_eq!(injection_passes(1), 1);
        assert_eq!(injection_passes(2), 3);
        assert_eq!(injection_passes(3), 5);
        assert_eq!(injection_passes(6), 5);
        assert_eq!(injection_passes(7), 6);
        assert_eq!(injection_passes(9), 5);
        assert_eq!(injection_passes(10), 6);
    }

    #[test]
    fn test_segment_length_minimum() {
        assert_eq!(segment_length(0), 1);
        assert_eq!(segment_length(2), 1);
        assert_eq!(segment_length(9), 3);
    }

    #[test]
    fn test_oversized_pairs_are_skipped() {
        let library = EquivalenceLibrary::from_yaml("injections: [ccx, cx]").unwrap();
        let mut circuit = Circuit::with_size("c", 2, 1);
        circuit
            .h(QubitId(0))
            .unwrap()
            .measure(QubitId(0), ClbitId(0))
            .unwrap();
        let mut rng = StdRng::seed_from_u64(4);

        let out = inject(&circuit, &library, &mut rng).unwrap();
        // One pass, two qubits, one usable pair each.
        assert_eq!(out.num_ops(), 1 + 2 * 2 + 1);
        assert!(out.instructions().iter().all(|i| i.name() != "ccx"));
        let cx = out.instructions().iter().find(|i| i.name() == "cx").unwrap();
        assert_ne!(cx.qubits[0], cx.qubits[1]);
    }

    #[test]
    fn test_pairs_are_followed_by_inverse() {
        let library = EquivalenceLibrary::from_yaml("injections: [t]").unwrap();
        let mut circuit = Circuit::with_size("c", 1, 0);
        circuit.x(QubitId(0)).unwrap();
        let mut rng = StdRng::seed_from_u64(4);

        let out = inject(&circuit, &library, &mut rng).unwrap();
        assert_eq!(
            out.instructions()[1..],
            [
                Instruction::single_qubit_gate(StandardGate::T, QubitId(0)),
                Instruction::single_qubit_gate(StandardGate::Tdg, QubitId(0)),
            ]
        );
    }
}
