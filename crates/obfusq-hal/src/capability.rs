//! Backend capability introspection.
//!
//! [`Capabilities`] describe what a backend accepts: register size, shot
//! limits and the gate kinds it can execute. [`Capabilities::check`] is the
//! common admission test behind [`Backend::validate`](crate::Backend::validate).

use serde::{Deserialize, Serialize};

use obfusq_ir::{Circuit, GateKind, Instruction, InstructionKind};

use crate::error::{HalError, HalResult};

/// Hardware capabilities of an execution backend.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Capabilities {
    /// Name of the backend.
    pub name: String,
    /// Number of qubits available.
    pub num_qubits: u32,
    /// Supported gate set (QASM naming).
    pub gate_set: GateSet,
    /// Maximum number of shots per job.
    pub max_shots: u32,
    /// Whether this is a simulator.
    pub is_simulator: bool,
    /// Additional capability flags such as `"statevector"`.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub features: Vec<String>,
}

impl Capabilities {
    /// Create capabilities for a simulator.
    pub fn simulator(num_qubits: u32) -> Self {
        Self {
            name: "simulator".into(),
            num_qubits,
            gate_set: GateSet::universal(),
            max_shots: 1_000_000,
            is_simulator: true,
            features: vec!["statevector".into(), "mid_circuit_measurement".into()],
        }
    }

    /// Check whether a feature flag is present.
    pub fn has_feature(&self, feature: &str) -> bool {
        self.features.iter().any(|f| f == feature)
    }

    /// Admission test for a program and shot count.
    ///
    /// Fails with [`HalError::InvalidShots`] for zero or too many shots,
    /// [`HalError::CircuitTooLarge`] when the register exceeds the backend,
    /// and [`HalError::Unsupported`] for a gate outside the gate set.
    /// Composite units are checked through their bodies.
    pub fn check(&self, circuit: &Circuit, shots: u32) -> HalResult<()> {
        if shots == 0 {
            return Err(HalError::InvalidShots("shots must be positive".into()));
        }
        if shots > self.max_shots {
            return Err(HalError::InvalidShots(format!(
                "{shots} shots requested but {} allows at most {}",
                self.name, self.max_shots
            )));
        }
        if circuit.num_qubits() > self.num_qubits as usize {
            return Err(HalError::CircuitTooLarge(format!(
                "Circuit has {} qubits but {} only supports {}",
                circuit.num_qubits(),
                self.name,
                self.num_qubits
            )));
        }
        self.check_gates(circuit.instructions())
    }

    fn check_gates(&self, instructions: &[Instruction]) -> HalResult<()> {
        for inst in instructions {
            let InstructionKind::Gate(gate) = &inst.kind else {
                continue;
            };
            match &gate.kind {
                GateKind::Standard(g) if !self.gate_set.contains(g.name()) => {
                    return Err(HalError::Unsupported(format!(
                        "gate '{}' is not supported by {}",
                        g.name(),
                        self.name
                    )));
                }
                GateKind::Standard(_) => {}
                GateKind::Composite(unit) => self.check_gates(&unit.body)?,
            }
        }
        Ok(())
    }
}

/// Gate kinds a backend can execute, grouped by arity.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GateSet {
    /// Single-qubit gates supported.
    pub single_qubit: Vec<String>,
    /// Two-qubit gates supported.
    pub two_qubit: Vec<String>,
    /// Three-qubit gates supported.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub three_qubit: Vec<String>,
}

impl GateSet {
    /// Every standard gate kind.
    pub fn universal() -> Self {
        let names = |list: &[&str]| list.iter().map(|s| (*s).to_string()).collect();
        Self {
            single_qubit: names(&[
                "id", "x", "y", "z", "h", "s", "sdg", "t", "tdg", "sx", "sxdg", "rx", "ry", "rz",
                "p", "u",
            ]),
            two_qubit: names(&["cx", "cy", "cz", "ch", "swap", "crz", "cp"]),
            three_qubit: names(&["ccx", "cswap"]),
        }
    }

    /// Check if a gate is supported.
    pub fn contains(&self, gate: &str) -> bool {
        self.single_qubit
            .iter()
            .chain(&self.two_qubit)
            .chain(&self.three_qubit)
            .any(|g| g == gate)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use obfusq_ir::{CompositeGate, QubitId, StandardGate};

    #[test]
    fn test_simulator_capabilities() {
        let caps = Capabilities::simulator(20);
        assert!(caps.is_simulator);
        assert_eq!(caps.num_qubits, 20);
        assert!(caps.has_feature("statevector"));
        assert!(caps.gate_set.contains("cswap"));
        assert!(!caps.gate_set.contains("rxx"));
    }

    #[test]
    fn test_check_rejects_zero_shots() {
        let caps = Capabilities::simulator(4);
        let circuit = Circuit::bell().unwrap();
        assert!(matches!(
            caps.check(&circuit, 0),
            Err(HalError::InvalidShots(_))
        ));
        assert!(caps.check(&circuit, 1).is_ok());
    }

    #[test]
    fn test_check_rejects_large_circuit() {
        let caps = Capabilities::simulator(2);
        let circuit = Circuit::ghz(3).unwrap();
        assert!(matches!(
            caps.check(&circuit, 100),
            Err(HalError::CircuitTooLarge(_))
        ));
    }

    #[test]
    fn test_check_looks_inside_composites() {
        let mut caps = Capabilities::simulator(2);
        caps.gate_set.two_qubit.retain(|g| g != "cz");

        let run = [Instruction::two_qubit_gate(
            StandardGate::CZ,
            QubitId(0),
            QubitId(1),
        )];
        let (unit, operands) = CompositeGate::wrap("block", &run).unwrap();
        let mut circuit = Circuit::with_size("wrapped", 2, 0);
        circuit.gate(unit, operands).unwrap();

        assert!(matches!(
            caps.check(&circuit, 10),
            Err(HalError::Unsupported(_))
        ));
    }
}
