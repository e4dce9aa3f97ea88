//! Statement parsing.

use super::{Dialect, Parser};
use crate::ast::{GateCall, GateDef, Operand, Statement};
use crate::error::{ParseError, ParseResult};
use crate::lexer::Token;

impl Parser {
    /// Parse a statement. Returns `None` for an empty statement.
    pub(super) fn parse_statement(&mut self) -> ParseResult<Option<Statement>> {
        let token = self
            .peek()
            .cloned()
            .ok_or_else(|| ParseError::UnexpectedEof("statement".into()))?;

        let stmt = match token {
            Token::Semicolon => {
                self.advance();
                return Ok(None);
            }
            Token::Include => self.parse_include()?,
            Token::Qreg | Token::Creg => self.parse_legacy_decl()?,
            Token::Qubit | Token::Bit if self.dialect == Dialect::Qasm3 => self.parse_typed_decl()?,
            Token::Measure => self.parse_measure()?,
            Token::Reset => self.parse_reset()?,
            Token::Barrier => self.parse_barrier()?,
            Token::Gate => Statement::GateDef(self.parse_gate_def()?),
            Token::If | Token::Opaque | Token::For | Token::While | Token::Input | Token::Output => {
                return Err(self.unsupported(&token.to_string()));
            }
            Token::Identifier(_) | Token::GateU | Token::GateCX => {
                self.parse_identifier_statement()?
            }
            _ => return Err(self.unexpected("statement")),
        };
        Ok(Some(stmt))
    }

    fn unsupported(&self, construct: &str) -> ParseError {
        ParseError::Unsupported {
            line: self.line(),
            construct: construct.into(),
        }
    }

    /// Parse include statement.
    fn parse_include(&mut self) -> ParseResult<Statement> {
        self.expect(Token::Include)?;
        let path = match self.peek() {
            Some(Token::StringLiteral(s)) => s.clone(),
            _ => return Err(self.unexpected("string literal")),
        };
        self.advance();
        self.expect(Token::Semicolon)?;
        Ok(Statement::Include(path))
    }

    /// Parse `qreg name[n];` or `creg name[n];`.
    fn parse_legacy_decl(&mut self) -> ParseResult<Statement> {
        let quantum = self.check(&Token::Qreg);
        self.advance();

        let name = self.parse_identifier()?;
        self.expect(Token::LBracket)?;
        let size = self.parse_index()?;
        self.expect(Token::RBracket)?;
        self.expect(Token::Semicolon)?;

        Ok(if quantum {
            Statement::QuantumDecl { name, size }
        } else {
            Statement::ClassicalDecl { name, size }
        })
    }

    /// Parse `qubit[n] name;` or `bit name;`.
    fn parse_typed_decl(&mut self) -> ParseResult<Statement> {
        let quantum = self.check(&Token::Qubit);
        self.advance();

        let size = if self.consume(&Token::LBracket) {
            let size = self.parse_index()?;
            self.expect(Token::RBracket)?;
            size
        } else {
            1
        };

        let name = self.parse_identifier()?;
        if self.check(&Token::Eq) {
            return Err(self.unsupported("initialized declaration"));
        }
        self.expect(Token::Semicolon)?;

        Ok(if quantum {
            Statement::QuantumDecl { name, size }
        } else {
            Statement::ClassicalDecl { name, size }
        })
    }

    /// Parse `measure q -> c;`.
    fn parse_measure(&mut self) -> ParseResult<Statement> {
        self.expect(Token::Measure)?;
        let qubits = self.parse_operand()?;
        self.expect(Token::Arrow)?;
        let bits = self.parse_operand()?;
        self.expect(Token::Semicolon)?;
        Ok(Statement::Measure { qubits, bits })
    }

    /// Parse reset statement.
    fn parse_reset(&mut self) -> ParseResult<Statement> {
        self.expect(Token::Reset)?;
        let qubits = self.parse_operand()?;
        self.expect(Token::Semicolon)?;
        Ok(Statement::Reset { qubits })
    }

    /// Parse barrier statement.
    fn parse_barrier(&mut self) -> ParseResult<Statement> {
        self.expect(Token::Barrier)?;
        let qubits = if self.check(&Token::Semicolon) {
            vec![]
        } else {
            self.parse_operands()?
        };
        self.expect(Token::Semicolon)?;
        Ok(Statement::Barrier { qubits })
    }

    /// Parse gate definition.
    fn parse_gate_def(&mut self) -> ParseResult<GateDef> {
        self.expect(Token::Gate)?;
        let name = self.parse_gate_name()?;

        let params = if self.consume(&Token::LParen) {
            let p = if self.check(&Token::RParen) {
                vec![]
            } else {
                self.parse_identifier_list()?
            };
            self.expect(Token::RParen)?;
            p
        } else {
            vec![]
        };

        let qubits = self.parse_identifier_list()?;

        self.expect(Token::LBrace)?;
        let mut body = Vec::new();
        while !self.check(&Token::RBrace) {
            match self.peek() {
                Some(Token::Barrier) => {
                    // Barriers carry no semantics inside a unit.
                    self.parse_barrier()?;
                }
                Some(Token::Identifier(_) | Token::GateU | Token::GateCX) => {
                    let line = self.line();
                    let name = self.parse_gate_name()?;
                    body.push(self.parse_gate_call(name, line)?);
                }
                Some(Token::Measure | Token::Reset) => {
                    return Err(self.unsupported("non-unitary operation in gate body"));
                }
                _ => return Err(self.unexpected("gate call")),
            }
        }
        self.expect(Token::RBrace)?;

        Ok(GateDef {
            name,
            params,
            qubits,
            body,
        })
    }

    /// Parse a gate name, including the uppercase built-ins.
    fn parse_gate_name(&mut self) -> ParseResult<String> {
        match self.peek() {
            Some(Token::GateU) => {
                self.advance();
                Ok("U".into())
            }
            Some(Token::GateCX) => {
                self.advance();
                Ok("CX".into())
            }
            _ => self.parse_identifier(),
        }
    }

    /// Parse a statement starting with a name: a gate call, or in
    /// `OpenQASM` 3 a measurement assignment.
    fn parse_identifier_statement(&mut self) -> ParseResult<Statement> {
        let line = self.line();
        let name = self.parse_gate_name()?;

        if self.check(&Token::Eq) || self.check(&Token::LBracket) {
            if self.dialect == Dialect::Qasm2 {
                return Err(self.unexpected("gate arguments"));
            }
            return self.parse_assignment(name);
        }
        if self.check(&Token::At) {
            return Err(self.unsupported("gate modifier"));
        }

        Ok(Statement::Gate(self.parse_gate_call(name, line)?))
    }

    /// Parse `c = measure q;` or `c[i] = measure q[j];`.
    fn parse_assignment(&mut self, target: String) -> ParseResult<Statement> {
        let index = if self.consume(&Token::LBracket) {
            let idx = self.parse_index()?;
            self.expect(Token::RBracket)?;
            Some(idx)
        } else {
            None
        };

        self.expect(Token::Eq)?;

        if !self.consume(&Token::Measure) {
            return Err(self.unsupported("classical assignment"));
        }
        let qubits = self.parse_operand()?;
        self.expect(Token::Semicolon)?;

        Ok(Statement::Measure {
            qubits,
            bits: Operand {
                register: target,
                index,
            },
        })
    }

    /// Parse the rest of a gate call after its name.
    fn parse_gate_call(&mut self, name: String, line: usize) -> ParseResult<GateCall> {
        let params = if self.consume(&Token::LParen) {
            let p = self.parse_expression_list()?;
            self.expect(Token::RParen)?;
            p
        } else {
            vec![]
        };

        let args = self.parse_operands()?;
        self.expect(Token::Semicolon)?;

        Ok(GateCall {
            name,
            params,
            args,
            line,
        })
    }

    /// Parse a comma-separated operand list.
    fn parse_operands(&mut self) -> ParseResult<Vec<Operand>> {
        let mut refs = vec![self.parse_operand()?];
        while self.consume(&Token::Comma) {
            refs.push(self.parse_operand()?);
        }
        Ok(refs)
    }

    /// Parse `name` or `name[i]`.
    fn parse_operand(&mut self) -> ParseResult<Operand> {
        let register = self.parse_identifier()?;

        let index = if self.consume(&Token::LBracket) {
            let index = self.parse_index()?;
            self.expect(Token::RBracket)?;
            Some(index)
        } else {
            None
        };

        Ok(Operand { register, index })
    }
}
