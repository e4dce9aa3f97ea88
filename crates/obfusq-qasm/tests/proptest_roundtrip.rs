//! Property-based tests for QASM round trips.
//!
//! circuit → QASM → circuit must preserve the register shape and the
//! flattened instruction stream in both dialects.

use obfusq_ir::{
    Circuit, CompositeGate, GateKind, Instruction, InstructionKind, QubitId, StandardGate,
};
use obfusq_qasm::{Dialect, emit, load, parse_qasm2, parse_qasm3};
use proptest::prelude::*;
use rand::SeedableRng;
use rand::rngs::StdRng;

/// Expand composites and split multi-qubit measurements so that programs
/// differing only in grouping compare equal.
fn flatten(circuit: &Circuit) -> Vec<Instruction> {
    let mut flat = Vec::new();
    for inst in circuit.instructions() {
        match &inst.kind {
            InstructionKind::Gate(gate) => match &gate.kind {
                GateKind::Composite(unit) => flat.extend(unit.expand(&inst.qubits)),
                GateKind::Standard(_) => flat.push(inst.clone()),
            },
            InstructionKind::Measure => {
                for (q, c) in inst.qubits.iter().zip(&inst.clbits) {
                    flat.push(Instruction::measure(*q, *c));
                }
            }
            _ => flat.push(inst.clone()),
        }
    }
    flat
}

/// Wrap every `chunk`-sized run of gates into a composite unit.
fn wrap_runs(circuit: &Circuit, chunk: usize) -> Circuit {
    let (gates, rest): (Vec<_>, Vec<_>) = circuit
        .instructions()
        .iter()
        .cloned()
        .partition(Instruction::is_gate);

    let mut wrapped = Circuit::with_size(
        "wrapped",
        circuit.num_qubits() as u32,
        circuit.num_clbits() as u32,
    );
    for run in gates.chunks(chunk) {
        let (unit, operands) = CompositeGate::wrap("block", run).unwrap();
        wrapped.gate(unit, operands).unwrap();
    }
    for inst in rest {
        wrapped.push(inst).unwrap();
    }
    wrapped
}

fn arb_program() -> impl Strategy<Value = Circuit> {
    (1_u32..=5, 0_u32..=6, any::<u64>()).prop_map(|(nq, depth, seed)| {
        let mut rng = StdRng::seed_from_u64(seed);
        Circuit::random(nq, depth, &mut rng).unwrap()
    })
}

proptest! {
    #[test]
    fn qasm3_roundtrip_preserves_program(circuit in arb_program()) {
        let qasm = emit(&circuit, Dialect::Qasm3);
        let parsed = parse_qasm3(&qasm).unwrap();

        prop_assert_eq!(parsed.num_qubits(), circuit.num_qubits());
        prop_assert_eq!(parsed.num_clbits(), circuit.num_clbits());
        prop_assert_eq!(flatten(&parsed), flatten(&circuit));
    }

    #[test]
    fn qasm2_roundtrip_preserves_program(circuit in arb_program()) {
        let qasm = emit(&circuit, Dialect::Qasm2);
        let (parsed, dialect) = load(&qasm).unwrap();

        prop_assert_eq!(dialect, Dialect::Qasm2);
        prop_assert_eq!(flatten(&parsed), flatten(&circuit));
    }

    #[test]
    fn composite_definitions_roundtrip(circuit in arb_program(), chunk in 1_usize..=4) {
        let wrapped = wrap_runs(&circuit, chunk);

        for dialect in [Dialect::Qasm2, Dialect::Qasm3] {
            let qasm = emit(&wrapped, dialect);
            let (parsed, _) = load(&qasm).unwrap();
            prop_assert_eq!(parsed.gate_count(), wrapped.gate_count());
            prop_assert_eq!(flatten(&parsed), flatten(&circuit));
        }
    }

    #[test]
    fn emission_is_deterministic(circuit in arb_program()) {
        prop_assert_eq!(
            emit(&circuit, Dialect::Qasm3),
            emit(&circuit, Dialect::Qasm3)
        );
    }

    #[test]
    fn empty_program_roundtrip(num_qubits in 1_u32..=10, num_clbits in 0_u32..=10) {
        let circuit = Circuit::with_size("empty", num_qubits, num_clbits);

        let parsed = parse_qasm2(&emit(&circuit, Dialect::Qasm2)).unwrap();
        prop_assert_eq!(parsed.num_qubits(), num_qubits as usize);
        prop_assert_eq!(parsed.num_clbits(), num_clbits as usize);
        prop_assert_eq!(parsed.num_ops(), 0);
    }
}

#[test]
fn rotation_angles_survive_roundtrip() {
    let mut circuit = Circuit::with_size("angles", 2, 0);
    circuit
        .rx(0.25, QubitId(0))
        .unwrap()
        .rz(-std::f64::consts::PI / 3.0, QubitId(1))
        .unwrap()
        .u(1.0, 2.0, 3.0, QubitId(0))
        .unwrap()
        .crz(0.75, QubitId(0), QubitId(1))
        .unwrap();

    for dialect in [Dialect::Qasm2, Dialect::Qasm3] {
        let (parsed, _) = load(&emit(&circuit, dialect)).unwrap();
        for (a, b) in parsed.instructions().iter().zip(circuit.instructions()) {
            let (ga, gb) = (a.as_standard().unwrap(), b.as_standard().unwrap());
            assert_eq!(ga.name(), gb.name());
            for (pa, pb) in ga.parameters().iter().zip(gb.parameters()) {
                assert!((pa.as_f64().unwrap() - pb.as_f64().unwrap()).abs() < 1e-12);
            }
        }
    }
}

#[test]
fn sxdg_roundtrips_through_qasm3_definition() {
    let mut circuit = Circuit::with_size("sxdg", 1, 0);
    circuit.sxdg(QubitId(0)).unwrap();

    let parsed = parse_qasm3(&emit(&circuit, Dialect::Qasm3)).unwrap();
    assert_eq!(
        parsed.instructions()[0].as_standard(),
        Some(&StandardGate::SXdg)
    );
}
