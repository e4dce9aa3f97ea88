//! `OpenQASM` 2 and 3 Ingestion and Serialization for Obfusq
//!
//! Programs arrive as `OpenQASM` text. [`load`] tries the legacy
//! `OpenQASM` 2 dialect first and falls back to `OpenQASM` 3, reporting
//! which one matched. The emitters print a [`Circuit`](obfusq_ir::Circuit)
//! back out in either dialect, including `gate` definitions for composite
//! units.
//!
//! # Supported Features
//!
//! | Feature | `OpenQASM` 2 | `OpenQASM` 3 |
//! |---------|--------------|--------------|
//! | Version header | `OPENQASM 2.0;` | `OPENQASM 3.0;` |
//! | Includes (ignored) | ✅ | ✅ |
//! | Registers | `qreg`/`creg` | `qubit`/`bit`, `qreg`/`creg` |
//! | Gate calls with broadcast | ✅ | ✅ |
//! | Measurements | `measure q -> c;` | `c = measure q;`, `measure q -> c;` |
//! | `reset`, `barrier` | ✅ | ✅ |
//! | `gate` definitions | ✅ | ✅ |
//! | `if`, `opaque`, loops, modifiers | rejected | rejected |
//!
//! # Example: Loading a Program
//!
//! ```rust
//! use obfusq_qasm::{Dialect, load};
//!
//! let qasm = r#"
//!     OPENQASM 2.0;
//!     include "qelib1.inc";
//!     qreg q[2];
//!     creg c[2];
//!     h q[0];
//!     cx q[0], q[1];
//!     measure q -> c;
//! "#;
//!
//! let (circuit, dialect) = load(qasm).unwrap();
//! assert_eq!(dialect, Dialect::Qasm2);
//! assert_eq!(circuit.num_qubits(), 2);
//! ```
//!
//! # Example: Round-Trip
//!
//! ```rust
//! use obfusq_ir::Circuit;
//! use obfusq_qasm::{emit_qasm3, parse_qasm3};
//!
//! let circuit = Circuit::bell().unwrap();
//! let qasm = emit_qasm3(&circuit);
//! assert!(qasm.contains("cx q[0], q[1];"));
//!
//! let reparsed = parse_qasm3(&qasm).unwrap();
//! assert_eq!(reparsed.instructions(), circuit.instructions());
//! ```
//!
//! # Supported Gates
//!
//! Single-qubit: `id`, `x`, `y`, `z`, `h`, `s`, `sdg`, `t`, `tdg`, `sx`, `sxdg`
//!
//! Parameterized: `rx(θ)`, `ry(θ)`, `rz(θ)`, `p(θ)`/`u1(λ)`/`phase(λ)`,
//! `u2(φ,λ)`, `u3(θ,φ,λ)`/`u`/`U`
//!
//! Two-qubit: `cx`/`CX`, `cy`, `cz`, `ch`, `swap`, `crz(θ)`, `cp(θ)`/`cu1`/`cphase`
//!
//! Three-qubit: `ccx` (Toffoli), `cswap` (Fredkin)

mod ast;
mod emitter;
mod error;
mod lexer;
mod parser;

pub use emitter::{emit, emit_qasm2, emit_qasm3};
pub use error::{ParseError, ParseResult};
pub use parser::{Dialect, load, parse, parse_qasm2, parse_qasm3};

/// AST types for callers that need the syntax tree.
pub mod syntax {
    pub use crate::ast::*;
}
