//! Error types for the obfuscation engine.

use std::path::PathBuf;

use obfusq_ir::IrError;
use thiserror::Error;

/// Errors that can occur while validating tables or rewriting a program.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ObfuscationError {
    /// A rule or identity step needs more qubits than its register provides.
    #[error("Arity mismatch in {context}: needs {required} qubits, register has {available}")]
    ArityMismatch {
        /// Which table entry is malformed.
        context: String,
        /// Qubits the step needs.
        required: u32,
        /// Qubits the argument register provides.
        available: u32,
    },

    /// A table entry is malformed in a way unrelated to arity.
    #[error("Invalid rule: {0}")]
    InvalidRule(String),

    /// No strategy with this name exists.
    #[error("Unknown strategy '{0}' (expected substitution, composite, padding or segmented)")]
    UnknownStrategy(String),

    /// Encapsulation probability outside `[0, 1]`.
    #[error("Probability {0} is outside [0, 1]")]
    InvalidProbability(f64),

    /// A rewrite dropped, added or reordered measurements.
    #[error("Measurements changed by rewrite: expected {expected}, found {found}")]
    MeasurementLost {
        /// Measurement instructions in the input.
        expected: usize,
        /// Matching measurement instructions in the output.
        found: usize,
    },

    /// A rewrite changed the register sizes.
    #[error(
        "Register shape changed: {expected_qubits}q/{expected_clbits}c became {found_qubits}q/{found_clbits}c"
    )]
    ShapeChanged {
        /// Input qubit count.
        expected_qubits: usize,
        /// Input classical bit count.
        expected_clbits: usize,
        /// Output qubit count.
        found_qubits: usize,
        /// Output classical bit count.
        found_clbits: usize,
    },

    /// Malformed YAML configuration or library.
    #[error("Configuration error: {0}")]
    Config(#[from] serde_yaml_ng::Error),

    /// A configuration or library file could not be read.
    #[error("Cannot read {path}: {source}")]
    Io {
        /// The file being read.
        path: PathBuf,
        /// The underlying error.
        source: std::io::Error,
    },

    /// The rewritten program failed IR validation.
    #[error("Invalid program: {0}")]
    Ir(#[from] IrError),
}

/// Result type for obfuscation operations.
pub type ObfResult<T> = Result<T, ObfuscationError>;
