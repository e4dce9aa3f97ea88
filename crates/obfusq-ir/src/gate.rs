//! Gate kinds and composite units.

use serde::{Deserialize, Serialize};

use crate::error::{IrError, IrResult};
use crate::instruction::{Instruction, InstructionKind};
use crate::parameter::ParameterExpression;
use crate::qubit::QubitId;

/// The closed set of gate kinds with known semantics.
///
/// Every variant has a fixed arity. Rotation variants carry an opaque
/// [`ParameterExpression`]; all others are discrete and may be rewritten.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum StandardGate {
    // Single-qubit Pauli gates
    /// Identity gate.
    I,
    /// Pauli-X gate.
    X,
    /// Pauli-Y gate.
    Y,
    /// Pauli-Z gate.
    Z,

    // Single-qubit Clifford and T gates
    /// Hadamard gate.
    H,
    /// S gate (sqrt(Z)).
    S,
    /// S-dagger gate.
    Sdg,
    /// T gate (fourth root of Z).
    T,
    /// T-dagger gate.
    Tdg,
    /// sqrt(X) gate.
    SX,
    /// sqrt(X)-dagger gate.
    SXdg,

    // Single-qubit rotation gates
    /// Rotation around X axis.
    Rx(ParameterExpression),
    /// Rotation around Y axis.
    Ry(ParameterExpression),
    /// Rotation around Z axis.
    Rz(ParameterExpression),
    /// Phase gate.
    P(ParameterExpression),
    /// Universal single-qubit gate U(θ, φ, λ).
    U(
        ParameterExpression,
        ParameterExpression,
        ParameterExpression,
    ),

    // Two-qubit gates
    /// Controlled-X (CNOT) gate.
    CX,
    /// Controlled-Y gate.
    CY,
    /// Controlled-Z gate.
    CZ,
    /// Controlled-Hadamard gate.
    CH,
    /// SWAP gate.
    Swap,
    /// Controlled rotation around Z.
    CRz(ParameterExpression),
    /// Controlled phase gate.
    CP(ParameterExpression),

    // Three-qubit gates
    /// Toffoli gate (CCX).
    CCX,
    /// Fredkin gate (CSWAP).
    CSwap,
}

impl StandardGate {
    /// Get the name of this gate.
    #[inline]
    pub fn name(&self) -> &'static str {
        match self {
            StandardGate::I => "id",
            StandardGate::X => "x",
            StandardGate::Y => "y",
            StandardGate::Z => "z",
            StandardGate::H => "h",
            StandardGate::S => "s",
            StandardGate::Sdg => "sdg",
            StandardGate::T => "t",
            StandardGate::Tdg => "tdg",
            StandardGate::SX => "sx",
            StandardGate::SXdg => "sxdg",
            StandardGate::Rx(_) => "rx",
            StandardGate::Ry(_) => "ry",
            StandardGate::Rz(_) => "rz",
            StandardGate::P(_) => "p",
            StandardGate::U(_, _, _) => "u",
            StandardGate::CX => "cx",
            StandardGate::CY => "cy",
            StandardGate::CZ => "cz",
            StandardGate::CH => "ch",
            StandardGate::Swap => "swap",
            StandardGate::CRz(_) => "crz",
            StandardGate::CP(_) => "cp",
            StandardGate::CCX => "ccx",
            StandardGate::CSwap => "cswap",
        }
    }

    /// Look up a discrete (non-parameterized) gate kind by its QASM name.
    ///
    /// Rotation kinds need arguments and are not returned here.
    pub fn from_name(name: &str) -> Option<Self> {
        let gate = match name {
            "id" | "i" => StandardGate::I,
            "x" => StandardGate::X,
            "y" => StandardGate::Y,
            "z" => StandardGate::Z,
            "h" => StandardGate::H,
            "s" => StandardGate::S,
            "sdg" => StandardGate::Sdg,
            "t" => StandardGate::T,
            "tdg" => StandardGate::Tdg,
            "sx" => StandardGate::SX,
            "sxdg" => StandardGate::SXdg,
            "cx" | "cnot" => StandardGate::CX,
            "cy" => StandardGate::CY,
            "cz" => StandardGate::CZ,
            "ch" => StandardGate::CH,
            "swap" => StandardGate::Swap,
            "ccx" | "toffoli" => StandardGate::CCX,
            "cswap" | "fredkin" => StandardGate::CSwap,
            _ => return None,
        };
        Some(gate)
    }

    /// Get the number of qubits this gate operates on.
    #[inline]
    pub fn num_qubits(&self) -> u32 {
        match self {
            StandardGate::I
            | StandardGate::X
            | StandardGate::Y
            | StandardGate::Z
            | StandardGate::H
            | StandardGate::S
            | StandardGate::Sdg
            | StandardGate::T
            | StandardGate::Tdg
            | StandardGate::SX
            | StandardGate::SXdg
            | StandardGate::Rx(_)
            | StandardGate::Ry(_)
            | StandardGate::Rz(_)
            | StandardGate::P(_)
            | StandardGate::U(_, _, _) => 1,

            StandardGate::CX
            | StandardGate::CY
            | StandardGate::CZ
            | StandardGate::CH
            | StandardGate::Swap
            | StandardGate::CRz(_)
            | StandardGate::CP(_) => 2,

            StandardGate::CCX | StandardGate::CSwap => 3,
        }
    }

    /// Check if this gate carries continuous parameters.
    ///
    /// Such gates pass through every rewrite unchanged.
    #[inline]
    pub fn has_parameters(&self) -> bool {
        !self.parameters().is_empty()
    }

    /// Get parameters of this gate.
    pub fn parameters(&self) -> Vec<&ParameterExpression> {
        match self {
            StandardGate::Rx(p)
            | StandardGate::Ry(p)
            | StandardGate::Rz(p)
            | StandardGate::P(p)
            | StandardGate::CRz(p)
            | StandardGate::CP(p) => vec![p],

            StandardGate::U(a, b, c) => vec![a, b, c],

            _ => vec![],
        }
    }

    /// Get the named inverse of a discrete gate.
    ///
    /// Returns `None` for parameterized gates.
    pub fn inverse(&self) -> Option<StandardGate> {
        let inv = match self {
            StandardGate::S => StandardGate::Sdg,
            StandardGate::Sdg => StandardGate::S,
            StandardGate::T => StandardGate::Tdg,
            StandardGate::Tdg => StandardGate::T,
            StandardGate::SX => StandardGate::SXdg,
            StandardGate::SXdg => StandardGate::SX,
            g if g.is_self_inverse() => g.clone(),
            _ => return None,
        };
        Some(inv)
    }

    /// Check if applying this gate twice is the identity.
    pub fn is_self_inverse(&self) -> bool {
        matches!(
            self,
            StandardGate::I
                | StandardGate::X
                | StandardGate::Y
                | StandardGate::Z
                | StandardGate::H
                | StandardGate::CX
                | StandardGate::CY
                | StandardGate::CZ
                | StandardGate::CH
                | StandardGate::Swap
                | StandardGate::CCX
                | StandardGate::CSwap
        )
    }
}

/// A quantum gate, either standard or a composite unit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum GateKind {
    /// A standard gate with known semantics.
    Standard(StandardGate),
    /// A named grouping of other instructions.
    Composite(CompositeGate),
}

impl GateKind {
    /// Get the name of this gate.
    #[inline]
    pub fn name(&self) -> &str {
        match self {
            GateKind::Standard(g) => g.name(),
            GateKind::Composite(g) => &g.name,
        }
    }

    /// Get the number of qubits.
    #[inline]
    pub fn num_qubits(&self) -> u32 {
        match self {
            GateKind::Standard(g) => g.num_qubits(),
            GateKind::Composite(g) => g.num_qubits,
        }
    }
}

/// A named wrapper around a contiguous run of gate instructions.
///
/// The body addresses local qubits `0..num_qubits`; the instruction that
/// applies the composite supplies the concrete qubits. Applying it is
/// semantically identical to applying the body in order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompositeGate {
    /// The name of the unit.
    pub name: String,
    /// The number of qubits it operates on.
    pub num_qubits: u32,
    /// The wrapped instructions, over local qubit indices.
    pub body: Vec<Instruction>,
}

impl CompositeGate {
    /// Create a composite unit, validating its body.
    ///
    /// The body may contain only gate instructions whose qubits lie in
    /// `0..num_qubits`.
    pub fn new(name: impl Into<String>, num_qubits: u32, body: Vec<Instruction>) -> IrResult<Self> {
        let name = name.into();
        for inst in &body {
            if !inst.is_gate() {
                return Err(IrError::InvalidComposite {
                    name,
                    reason: format!("'{}' is not a gate", inst.name()),
                });
            }
            inst.validate(num_qubits, 0)?;
        }
        Ok(Self {
            name,
            num_qubits,
            body,
        })
    }

    /// Wrap a run of concrete instructions into a composite unit.
    ///
    /// Returns the unit together with the concrete qubits it must be applied
    /// to, in order of first appearance in the run.
    pub fn wrap(
        name: impl Into<String>,
        run: &[Instruction],
    ) -> IrResult<(Self, Vec<QubitId>)> {
        let mut operands: Vec<QubitId> = Vec::new();
        for inst in run {
            for q in &inst.qubits {
                if !operands.contains(q) {
                    operands.push(*q);
                }
            }
        }

        let body = run
            .iter()
            .map(|inst| {
                let mut local = inst.clone();
                for q in &mut local.qubits {
                    let pos = operands.iter().position(|o| o == q).unwrap_or_default();
                    *q = QubitId(pos as u32);
                }
                local
            })
            .collect();

        let unit = Self::new(name, operands.len() as u32, body)?;
        Ok((unit, operands))
    }

    /// Inline the body onto concrete qubits, recursively flattening nested
    /// composites.
    pub fn expand(&self, qubits: &[QubitId]) -> Vec<Instruction> {
        let mut flat = Vec::with_capacity(self.body.len());
        for inst in &self.body {
            let mapped: Vec<QubitId> = inst.qubits.iter().map(|q| qubits[q.index()]).collect();
            match &inst.kind {
                InstructionKind::Gate(Gate {
                    kind: GateKind::Composite(inner),
                    ..
                }) => flat.extend(inner.expand(&mapped)),
                _ => {
                    let mut concrete = inst.clone();
                    concrete.qubits = mapped;
                    flat.push(concrete);
                }
            }
        }
        flat
    }

    /// Number of standard gates after full expansion.
    pub fn flat_len(&self) -> usize {
        self.body
            .iter()
            .map(|inst| match &inst.kind {
                InstructionKind::Gate(Gate {
                    kind: GateKind::Composite(inner),
                    ..
                }) => inner.flat_len(),
                _ => 1,
            })
            .sum()
    }
}

/// A gate with associated metadata.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Gate {
    /// The kind of gate.
    pub kind: GateKind,
    /// Optional label for the gate.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
}

impl Gate {
    /// Create a new gate from a standard gate.
    pub fn standard(gate: StandardGate) -> Self {
        Self {
            kind: GateKind::Standard(gate),
            label: None,
        }
    }

    /// Create a new gate from a composite unit.
    pub fn composite(gate: CompositeGate) -> Self {
        Self {
            kind: GateKind::Composite(gate),
            label: None,
        }
    }

    /// Add a label to the gate.
    #[must_use]
    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    /// Get the name of this gate.
    pub fn name(&self) -> &str {
        self.kind.name()
    }

    /// Get the number of qubits.
    pub fn num_qubits(&self) -> u32 {
        self.kind.num_qubits()
    }

    /// The standard gate, if this is not a composite.
    pub fn as_standard(&self) -> Option<&StandardGate> {
        match &self.kind {
            GateKind::Standard(g) => Some(g),
            GateKind::Composite(_) => None,
        }
    }
}

impl From<StandardGate> for Gate {
    fn from(gate: StandardGate) -> Self {
        Gate::standard(gate)
    }
}

impl From<CompositeGate> for Gate {
    fn from(gate: CompositeGate) -> Self {
        Gate::composite(gate)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f64::consts::PI;

    #[test]
    fn test_standard_gate_properties() {
        assert_eq!(StandardGate::H.num_qubits(), 1);
        assert_eq!(StandardGate::CX.num_qubits(), 2);
        assert_eq!(StandardGate::CCX.num_qubits(), 3);

        assert!(!StandardGate::H.has_parameters());
        assert!(StandardGate::Rx(ParameterExpression::constant(PI)).has_parameters());
        assert!(StandardGate::CP(ParameterExpression::symbol("phi")).has_parameters());
    }

    #[test]
    fn test_from_name_roundtrips_discrete_gates() {
        for gate in [
            StandardGate::I,
            StandardGate::X,
            StandardGate::Y,
            StandardGate::Z,
            StandardGate::H,
            StandardGate::S,
            StandardGate::Sdg,
            StandardGate::T,
            StandardGate::Tdg,
            StandardGate::SX,
            StandardGate::SXdg,
            StandardGate::CX,
            StandardGate::CY,
            StandardGate::CZ,
            StandardGate::CH,
            StandardGate::Swap,
            StandardGate::CCX,
            StandardGate::CSwap,
        ] {
            assert_eq!(StandardGate::from_name(gate.name()), Some(gate));
        }
        assert_eq!(StandardGate::from_name("rx"), None);
        assert_eq!(StandardGate::from_name("FourierTransform"), None);
    }

    #[test]
    fn test_inverse_pairs() {
        assert_eq!(StandardGate::S.inverse(), Some(StandardGate::Sdg));
        assert_eq!(StandardGate::Tdg.inverse(), Some(StandardGate::T));
        assert_eq!(StandardGate::SX.inverse(), Some(StandardGate::SXdg));
        assert_eq!(StandardGate::CCX.inverse(), Some(StandardGate::CCX));
        assert_eq!(
            StandardGate::Rz(ParameterExpression::constant(0.3)).inverse(),
            None
        );
        assert!(!StandardGate::S.is_self_inverse());
        assert!(StandardGate::Swap.is_self_inverse());
    }

    #[test]
    fn test_wrap_maps_to_local_qubits() {
        let run = vec![
            Instruction::single_qubit_gate(StandardGate::H, QubitId(3)),
            Instruction::two_qubit_gate(StandardGate::CX, QubitId(3), QubitId(1)),
        ];
        let (unit, operands) = CompositeGate::wrap("FourierTransform", &run).unwrap();

        assert_eq!(operands, vec![QubitId(3), QubitId(1)]);
        assert_eq!(unit.num_qubits, 2);
        assert_eq!(unit.body[0].qubits, vec![QubitId(0)]);
        assert_eq!(unit.body[1].qubits, vec![QubitId(0), QubitId(1)]);
        assert_eq!(unit.expand(&operands), run);
    }

    #[test]
    fn test_nested_expand() {
        let inner = CompositeGate::new(
            "inner",
            1,
            vec![
                Instruction::single_qubit_gate(StandardGate::H, QubitId(0)),
                Instruction::single_qubit_gate(StandardGate::H, QubitId(0)),
            ],
        )
        .unwrap();
        let outer = CompositeGate::new(
            "outer",
            2,
            vec![
                Instruction::gate(inner, [QubitId(1)]),
                Instruction::two_qubit_gate(StandardGate::CZ, QubitId(0), QubitId(1)),
            ],
        )
        .unwrap();

        let flat = outer.expand(&[QubitId(4), QubitId(2)]);
        assert_eq!(flat.len(), 3);
        assert_eq!(outer.flat_len(), 3);
        assert_eq!(flat[0].qubits, vec![QubitId(2)]);
        assert_eq!(flat[2].qubits, vec![QubitId(4), QubitId(2)]);
    }

    #[test]
    fn test_composite_rejects_measurement() {
        let body = vec![Instruction::measure(QubitId(0), crate::ClbitId(0))];
        assert!(matches!(
            CompositeGate::new("bad", 1, body),
            Err(IrError::InvalidComposite { .. })
        ));
    }

    #[test]
    fn test_composite_rejects_out_of_range_body() {
        let body = vec![Instruction::single_qubit_gate(StandardGate::X, QubitId(2))];
        assert!(matches!(
            CompositeGate::new("bad", 1, body),
            Err(IrError::QubitNotFound { .. })
        ));
    }
}
