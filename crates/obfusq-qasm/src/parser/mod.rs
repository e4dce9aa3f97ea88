//! Recursive-descent parser for `OpenQASM` 2 and 3.

mod expression;
mod lowering;
mod statement;

use std::fmt;

use obfusq_ir::Circuit;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::ast::Program;
use crate::error::{ParseError, ParseResult};
use crate::lexer::{SpannedToken, Token, tokenize};

pub(crate) use lowering::is_builtin_gate;
use lowering::lower_to_circuit;

/// The `OpenQASM` dialect a program is written in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Dialect {
    /// `OPENQASM 2.x` with `qreg`/`creg` and `measure q -> c`.
    Qasm2,
    /// `OPENQASM 3.x` with `qubit`/`bit` and `c = measure q`.
    Qasm3,
}

impl Dialect {
    fn major_version(self) -> u64 {
        match self {
            Dialect::Qasm2 => 2,
            Dialect::Qasm3 => 3,
        }
    }
}

impl fmt::Display for Dialect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Dialect::Qasm2 => write!(f, "qasm2"),
            Dialect::Qasm3 => write!(f, "qasm3"),
        }
    }
}

/// Parse an `OpenQASM` 2 source string into a Circuit.
pub fn parse_qasm2(source: &str) -> ParseResult<Circuit> {
    parse_dialect(source, Dialect::Qasm2)
}

/// Parse an `OpenQASM` 3 source string into a Circuit.
pub fn parse_qasm3(source: &str) -> ParseResult<Circuit> {
    parse_dialect(source, Dialect::Qasm3)
}

/// Load a program, trying the legacy dialect first.
///
/// `OpenQASM` 2 is attempted first; on any parse failure the source is
/// re-parsed as `OpenQASM` 3. When both fail, both errors are returned.
pub fn load(source: &str) -> ParseResult<(Circuit, Dialect)> {
    let qasm2 = match parse_qasm2(source) {
        Ok(circuit) => return Ok((circuit, Dialect::Qasm2)),
        Err(e) => e,
    };
    debug!(error = %qasm2, "OpenQASM 2 parse failed, falling back to OpenQASM 3");

    match parse_qasm3(source) {
        Ok(circuit) => Ok((circuit, Dialect::Qasm3)),
        Err(qasm3) => Err(ParseError::Unrecognized {
            qasm2: Box::new(qasm2),
            qasm3: Box::new(qasm3),
        }),
    }
}

/// Parse a source string in either dialect, discarding which one matched.
pub fn parse(source: &str) -> ParseResult<Circuit> {
    load(source).map(|(circuit, _)| circuit)
}

fn parse_dialect(source: &str, dialect: Dialect) -> ParseResult<Circuit> {
    let mut parser = Parser::new(source, dialect)?;
    let program = parser.parse_program()?;
    lower_to_circuit(&program)
}

/// Parser state.
pub(super) struct Parser {
    pub(super) tokens: Vec<SpannedToken>,
    pub(super) pos: usize,
    pub(super) dialect: Dialect,
}

#[allow(clippy::cast_possible_truncation)]
impl Parser {
    /// Create a new parser from source.
    fn new(source: &str, dialect: Dialect) -> ParseResult<Self> {
        let tokens = tokenize(source).map_err(|(position, message)| ParseError::LexerError {
            position,
            message,
        })?;

        Ok(Self {
            tokens,
            pos: 0,
            dialect,
        })
    }

    /// Line of the current token, or of the last one at end of input.
    pub(super) fn line(&self) -> usize {
        self.tokens
            .get(self.pos)
            .or_else(|| self.tokens.last())
            .map_or(1, |t| t.line)
    }

    /// Check if we've reached the end.
    pub(super) fn is_eof(&self) -> bool {
        self.pos >= self.tokens.len()
    }

    /// Peek at the current token.
    pub(super) fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos).map(|t| &t.token)
    }

    /// Advance and return the current token.
    pub(super) fn advance(&mut self) -> Option<Token> {
        let token = self.tokens.get(self.pos)?.token.clone();
        self.pos += 1;
        Some(token)
    }

    /// Expect a specific token.
    #[allow(clippy::needless_pass_by_value)]
    pub(super) fn expect(&mut self, expected: Token) -> ParseResult<()> {
        let line = self.line();
        let found = self
            .advance()
            .ok_or_else(|| ParseError::UnexpectedEof(format!("expected {expected}")))?;

        if std::mem::discriminant(&found) != std::mem::discriminant(&expected) {
            return Err(ParseError::UnexpectedToken {
                line,
                expected: expected.to_string(),
                found: found.to_string(),
            });
        }
        Ok(())
    }

    /// Check if current token matches.
    pub(super) fn check(&self, token: &Token) -> bool {
        self.peek()
            .is_some_and(|t| std::mem::discriminant(t) == std::mem::discriminant(token))
    }

    /// Consume token if it matches.
    pub(super) fn consume(&mut self, token: &Token) -> bool {
        if self.check(token) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    /// Build an error for a token the current dialect does not accept here.
    pub(super) fn unexpected(&self, expected: &str) -> ParseError {
        match self.peek() {
            Some(found) => ParseError::UnexpectedToken {
                line: self.line(),
                expected: expected.into(),
                found: found.to_string(),
            },
            None => ParseError::UnexpectedEof(expected.into()),
        }
    }

    /// Parse the entire program.
    fn parse_program(&mut self) -> ParseResult<Program> {
        self.expect(Token::OpenQasm)?;
        let version = self.parse_version()?;
        self.expect(Token::Semicolon)?;

        let mut statements = Vec::new();
        while !self.is_eof() {
            if let Some(stmt) = self.parse_statement()? {
                statements.push(stmt);
            }
        }

        Ok(Program {
            version,
            statements,
        })
    }

    /// Parse the version number and check it against the dialect.
    fn parse_version(&mut self) -> ParseResult<String> {
        let (version, major) = match self.advance() {
            Some(Token::FloatLiteral(v)) => (format!("{v:?}"), v.trunc() as u64),
            Some(Token::IntLiteral(v)) => (format!("{v}.0"), v),
            Some(other) => return Err(ParseError::InvalidVersion(other.to_string())),
            None => return Err(ParseError::UnexpectedEof("version number".into())),
        };

        if major != self.dialect.major_version() {
            return Err(ParseError::InvalidVersion(format!(
                "{version} is not {}",
                self.dialect
            )));
        }
        Ok(version)
    }

    /// Parse identifier list.
    pub(super) fn parse_identifier_list(&mut self) -> ParseResult<Vec<String>> {
        let mut ids = vec![self.parse_identifier()?];
        while self.consume(&Token::Comma) {
            ids.push(self.parse_identifier()?);
        }
        Ok(ids)
    }

    /// Parse an identifier.
    pub(super) fn parse_identifier(&mut self) -> ParseResult<String> {
        match self.peek() {
            Some(Token::Identifier(_)) => match self.advance() {
                Some(Token::Identifier(s)) => Ok(s),
                _ => Err(self.unexpected("identifier")),
            },
            _ => Err(self.unexpected("identifier")),
        }
    }

    /// Parse an integer literal as a `u32`.
    pub(super) fn parse_index(&mut self) -> ParseResult<u32> {
        match self.peek() {
            Some(Token::IntLiteral(v)) => {
                let v = *v;
                let index = u32::try_from(v).map_err(|_| {
                    ParseError::Generic(format!("index {v} exceeds the register limit"))
                })?;
                self.pos += 1;
                Ok(index)
            }
            _ => Err(self.unexpected("integer")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use obfusq_ir::{ClbitId, GateKind, InstructionKind, QubitId, StandardGate};

    #[test]
    fn test_parse_bell_qasm2() {
        let source = r#"
            OPENQASM 2.0;
            include "qelib1.inc";
            qreg q[2];
            creg c[2];
            h q[0];
            cx q[0], q[1];
            measure q -> c;
        "#;

        let circuit = parse_qasm2(source).unwrap();
        assert_eq!(circuit.num_qubits(), 2);
        assert_eq!(circuit.num_clbits(), 2);
        assert_eq!(circuit.gate_count(), 2);
        assert_eq!(circuit.measurements().count(), 2);
    }

    #[test]
    fn test_parse_bell_qasm3() {
        let source = r"
            OPENQASM 3.0;
            qubit[2] q;
            bit[2] c;
            h q[0];
            cx q[0], q[1];
            c = measure q;
        ";

        let circuit = parse_qasm3(source).unwrap();
        assert_eq!(circuit.num_qubits(), 2);
        assert_eq!(circuit.measurements().count(), 2);
    }

    #[test]
    fn test_qasm2_rejects_qasm3_syntax() {
        let source = "OPENQASM 2.0; qubit[1] q;";
        assert!(matches!(
            parse_qasm2(source),
            Err(ParseError::UnexpectedToken { .. })
        ));
    }

    #[test]
    fn test_version_must_match_dialect() {
        assert!(matches!(
            parse_qasm2("OPENQASM 3.0; qubit q;"),
            Err(ParseError::InvalidVersion(_))
        ));
        assert!(matches!(
            parse_qasm3("OPENQASM 2.0; qreg q[1];"),
            Err(ParseError::InvalidVersion(_))
        ));
    }

    #[test]
    fn test_load_prefers_qasm2() {
        let (_, dialect) = load("OPENQASM 2.0; qreg q[1]; x q[0];").unwrap();
        assert_eq!(dialect, Dialect::Qasm2);
    }

    #[test]
    fn test_load_falls_back_to_qasm3() {
        let (circuit, dialect) = load("OPENQASM 3; qubit[2] q; bit[2] c; c = measure q;").unwrap();
        assert_eq!(dialect, Dialect::Qasm3);
        assert_eq!(circuit.num_clbits(), 2);
    }

    #[test]
    fn test_load_reports_both_failures() {
        let err = load("not a program").unwrap_err();
        assert!(matches!(err, ParseError::Unrecognized { .. }));
    }

    #[test]
    fn test_qasm3_accepts_legacy_registers() {
        let circuit = parse_qasm3("OPENQASM 3.0; qreg q[2]; creg c[2]; measure q -> c;").unwrap();
        assert_eq!(circuit.measurements().count(), 2);
    }

    #[test]
    fn test_multiple_registers_flatten_in_order() {
        let source = r"
            OPENQASM 2.0;
            qreg a[2];
            qreg b[2];
            creg c[4];
            cx a[1], b[0];
            measure b[1] -> c[3];
        ";

        let circuit = parse_qasm2(source).unwrap();
        assert_eq!(circuit.num_qubits(), 4);
        let cx = &circuit.instructions()[0];
        assert_eq!(cx.qubits, vec![QubitId(1), QubitId(2)]);
        let m = &circuit.instructions()[1];
        assert_eq!(m.qubits, vec![QubitId(3)]);
        assert_eq!(m.clbits, vec![ClbitId(3)]);
    }

    #[test]
    fn test_broadcast_over_registers() {
        let source = r"
            OPENQASM 2.0;
            qreg a[3];
            qreg b[3];
            h a;
            cx a, b;
            cx a[0], b;
        ";

        let circuit = parse_qasm2(source).unwrap();
        assert_eq!(circuit.gate_count(), 9);
        assert_eq!(circuit.instructions()[4].qubits, vec![QubitId(1), QubitId(4)]);
        assert_eq!(circuit.instructions()[8].qubits, vec![QubitId(0), QubitId(5)]);
    }

    #[test]
    fn test_broadcast_size_mismatch() {
        let source = "OPENQASM 2.0; qreg a[2]; qreg b[3]; cx a, b;";
        assert!(matches!(
            parse_qasm2(source),
            Err(ParseError::WrongQubitCount { .. })
        ));
    }

    #[test]
    fn test_qelib_aliases() {
        let source = r"
            OPENQASM 2.0;
            qreg q[2];
            u1(pi/4) q[0];
            u2(0, pi) q[0];
            u3(pi, 0, pi) q[1];
            cu1(pi/2) q[0], q[1];
            CX q[0], q[1];
            U(0, 0, 0) q[0];
            id q[1];
        ";

        let circuit = parse_qasm2(source).unwrap();
        let kinds: Vec<&str> = circuit.instructions().iter().map(|i| i.name()).collect();
        assert_eq!(kinds, vec!["p", "u", "u", "cp", "cx", "u", "id"]);
    }

    #[test]
    fn test_gate_definition_becomes_composite() {
        let source = r"
            OPENQASM 2.0;
            qreg q[2];
            gate bell a, b { h a; cx a, b; }
            bell q[1], q[0];
        ";

        let circuit = parse_qasm2(source).unwrap();
        assert_eq!(circuit.num_ops(), 1);
        let InstructionKind::Gate(gate) = &circuit.instructions()[0].kind else {
            panic!("expected gate");
        };
        let GateKind::Composite(unit) = &gate.kind else {
            panic!("expected composite");
        };
        assert_eq!(unit.name, "bell");
        assert_eq!(unit.num_qubits, 2);
        let flat = unit.expand(&circuit.instructions()[0].qubits);
        assert_eq!(flat[1].qubits, vec![QubitId(1), QubitId(0)]);
    }

    #[test]
    fn test_parameterized_definition_binds_arguments() {
        let source = r"
            OPENQASM 2.0;
            qreg q[1];
            gate half(theta) a { rz(theta / 2) a; }
            half(pi) q[0];
        ";

        let circuit = parse_qasm2(source).unwrap();
        let gate = circuit.instructions()[0].as_gate().unwrap();
        let GateKind::Composite(unit) = &gate.kind else {
            panic!("expected composite");
        };
        let Some(StandardGate::Rz(angle)) = unit.body[0].as_standard() else {
            panic!("expected rz");
        };
        assert!((angle.as_f64().unwrap() - std::f64::consts::FRAC_PI_2).abs() < 1e-12);
    }

    #[test]
    fn test_builtin_named_definition_is_ignored() {
        let source = r"
            OPENQASM 2.0;
            qreg q[1];
            gate h a { x a; }
            h q[0];
        ";

        let circuit = parse_qasm2(source).unwrap();
        assert_eq!(
            circuit.instructions()[0].as_standard(),
            Some(&StandardGate::H)
        );
    }

    #[test]
    fn test_conditional_is_unsupported() {
        let source = "OPENQASM 2.0; qreg q[1]; creg c[1]; if (c == 1) x q[0];";
        assert!(matches!(
            parse_qasm2(source),
            Err(ParseError::Unsupported { .. })
        ));
    }

    #[test]
    fn test_opaque_is_unsupported() {
        let source = "OPENQASM 2.0; qreg q[1]; opaque magic a;";
        assert!(matches!(
            parse_qasm2(source),
            Err(ParseError::Unsupported { .. })
        ));
    }

    #[test]
    fn test_undefined_register() {
        let source = "OPENQASM 2.0; qreg q[1]; h r[0];";
        assert!(matches!(
            parse_qasm2(source),
            Err(ParseError::UndefinedIdentifier(_))
        ));
    }

    #[test]
    fn test_index_out_of_bounds() {
        let source = "OPENQASM 2.0; qreg q[2]; x q[2];";
        assert!(matches!(
            parse_qasm2(source),
            Err(ParseError::IndexOutOfBounds { index: 2, size: 2, .. })
        ));
    }

    #[test]
    fn test_unknown_gate() {
        let source = "OPENQASM 2.0; qreg q[1]; frobnicate q[0];";
        assert!(matches!(parse_qasm2(source), Err(ParseError::UnknownGate(_))));
    }

    #[test]
    fn test_reset_and_barrier() {
        let source = "OPENQASM 2.0; qreg q[2]; reset q; barrier q[0], q[1];";
        let circuit = parse_qasm2(source).unwrap();
        assert_eq!(circuit.num_ops(), 3);
        assert!(circuit.instructions()[0].is_reset());
        assert!(circuit.instructions()[2].is_barrier());
    }
}
