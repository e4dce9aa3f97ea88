//! Abstract Syntax Tree shared by both `OpenQASM` dialects.

use serde::{Deserialize, Serialize};

/// A parsed QASM program.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Program {
    /// Version from the header (e.g., "2.0").
    pub version: String,
    /// Statements in the program.
    pub statements: Vec<Statement>,
}

/// A top-level statement.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Statement {
    /// Include statement. Ignored during lowering.
    Include(String),

    /// Quantum register: `qreg q[n];` or `qubit[n] q;`
    QuantumDecl { name: String, size: u32 },

    /// Classical register: `creg c[n];` or `bit[n] c;`
    ClassicalDecl { name: String, size: u32 },

    /// Gate application.
    Gate(GateCall),

    /// Measurement: `measure q -> c;` or `c = measure q;`
    Measure { qubits: Operand, bits: Operand },

    /// Reset: `reset q;`
    Reset { qubits: Operand },

    /// Barrier: `barrier q, r[0];` or `barrier;`
    Barrier { qubits: Vec<Operand> },

    /// Gate definition.
    GateDef(GateDef),
}

/// A gate call.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GateCall {
    /// Gate name.
    pub name: String,
    /// Gate parameters (angles).
    pub params: Vec<Expression>,
    /// Qubit arguments.
    pub args: Vec<Operand>,
    /// Source line, for error reporting.
    pub line: usize,
}

/// A `gate name(params) a, b { ... }` definition.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GateDef {
    /// Gate name.
    pub name: String,
    /// Formal parameter names.
    pub params: Vec<String>,
    /// Formal qubit names.
    pub qubits: Vec<String>,
    /// Body calls over the formal qubits. Barriers inside bodies are dropped.
    pub body: Vec<GateCall>,
}

/// Reference to a whole register or one of its elements.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Operand {
    /// Register (or formal qubit) name.
    pub register: String,
    /// Element index; `None` addresses the whole register.
    pub index: Option<u32>,
}

impl Operand {
    /// Reference a single element.
    pub fn element(register: impl Into<String>, index: u32) -> Self {
        Self {
            register: register.into(),
            index: Some(index),
        }
    }

    /// Reference an entire register.
    pub fn register(register: impl Into<String>) -> Self {
        Self {
            register: register.into(),
            index: None,
        }
    }
}

/// A parameter expression.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Expression {
    /// Integer literal.
    Int(u64),
    /// Float literal.
    Float(f64),
    /// Identifier (a formal parameter).
    Identifier(String),
    /// Pi constant.
    Pi,
    /// Tau constant (2π).
    Tau,
    /// Euler's number.
    Euler,
    /// Negation.
    Neg(Box<Expression>),
    /// Binary operation.
    BinOp {
        left: Box<Expression>,
        op: BinOp,
        right: Box<Expression>,
    },
    /// Function call, e.g. `sin(x)`.
    FnCall { name: String, args: Vec<Expression> },
    /// Parenthesized expression.
    Paren(Box<Expression>),
}

impl Expression {
    /// Try to evaluate as a constant f64.
    #[allow(clippy::cast_precision_loss)]
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Expression::Int(v) => Some(*v as f64),
            Expression::Float(v) => Some(*v),
            Expression::Pi => Some(std::f64::consts::PI),
            Expression::Tau => Some(std::f64::consts::TAU),
            Expression::Euler => Some(std::f64::consts::E),
            Expression::Neg(e) => e.as_f64().map(|v| -v),
            Expression::BinOp { left, op, right } => {
                let l = left.as_f64()?;
                let r = right.as_f64()?;
                Some(match op {
                    BinOp::Add => l + r,
                    BinOp::Sub => l - r,
                    BinOp::Mul => l * r,
                    BinOp::Div => l / r,
                    BinOp::Pow => l.powf(r),
                })
            }
            Expression::FnCall { name, args } => {
                let [arg] = args.as_slice() else {
                    return None;
                };
                let x = arg.as_f64()?;
                Some(match name.as_str() {
                    "sin" => x.sin(),
                    "cos" => x.cos(),
                    "tan" => x.tan(),
                    "exp" => x.exp(),
                    "ln" => x.ln(),
                    "sqrt" => x.sqrt(),
                    _ => return None,
                })
            }
            Expression::Paren(e) => e.as_f64(),
            Expression::Identifier(_) => None,
        }
    }
}

/// Arithmetic operators allowed in parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BinOp {
    Add,
    Sub,
    Mul,
    Div,
    Pow,
}
