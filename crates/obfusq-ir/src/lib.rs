//! Obfusq Circuit Program Representation
//!
//! This crate provides the data structures every other Obfusq crate works
//! on: a linear, register-addressed quantum program.
//!
//! # Core Components
//!
//! - **Qubits and Classical Bits**: [`QubitId`], [`ClbitId`] are positional
//!   indices into fixed-size registers
//! - **Gates**: [`StandardGate`] for the closed set of known gate kinds and
//!   [`CompositeGate`] for named wrappers around a run of gates
//! - **Parameters**: [`ParameterExpression`] for rotation angles, opaque to
//!   every rewrite
//! - **Instructions**: [`Instruction`] combining a gate, measurement, reset
//!   or barrier with its operands
//! - **Circuit**: [`Circuit`] the validated program with a builder API
//!
//! # Example: Building a Bell State
//!
//! ```rust
//! use obfusq_ir::{Circuit, QubitId};
//!
//! let mut circuit = Circuit::with_size("bell_state", 2, 2);
//!
//! circuit.h(QubitId(0)).unwrap();
//! circuit.cx(QubitId(0), QubitId(1)).unwrap();
//! circuit.measure_all().unwrap();
//!
//! assert_eq!(circuit.num_qubits(), 2);
//! assert_eq!(circuit.depth(), 3);
//! ```
//!
//! # Example: Wrapping Gates in a Composite
//!
//! ```rust
//! use obfusq_ir::{Circuit, CompositeGate, Instruction, QubitId, StandardGate};
//!
//! let run = [
//!     Instruction::single_qubit_gate(StandardGate::H, QubitId(1)),
//!     Instruction::single_qubit_gate(StandardGate::H, QubitId(1)),
//! ];
//! let (unit, operands) = CompositeGate::wrap("auxiliary", &run).unwrap();
//!
//! let mut circuit = Circuit::with_size("wrapped", 2, 0);
//! circuit.gate(unit, operands).unwrap();
//! assert_eq!(circuit.gate_count(), 1);
//! ```

pub mod circuit;
pub mod error;
pub mod gate;
pub mod instruction;
pub mod parameter;
pub mod qubit;

pub use circuit::Circuit;
pub use error::{IrError, IrResult};
pub use gate::{CompositeGate, Gate, GateKind, StandardGate};
pub use instruction::{Instruction, InstructionKind};
pub use parameter::ParameterExpression;
pub use qubit::{ClbitId, QubitId};
