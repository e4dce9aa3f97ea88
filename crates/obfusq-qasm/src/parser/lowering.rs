//! AST-to-Circuit lowering.

use obfusq_ir::{
    Circuit, ClbitId, CompositeGate, Gate, Instruction, ParameterExpression, QubitId,
    StandardGate,
};
use rustc_hash::FxHashMap;
use tracing::debug;

use crate::ast::{BinOp, Expression, GateCall, GateDef, Operand, Program, Statement};
use crate::error::{ParseError, ParseResult};

/// Names with built-in semantics, including the qelib1 aliases.
const PARAMETERIZED_BUILTINS: &[&str] = &[
    "rx", "ry", "rz", "p", "phase", "u1", "u2", "u3", "u", "U", "crz", "cp", "cu1", "cphase",
];

/// Check whether a gate name has built-in semantics.
pub(crate) fn is_builtin_gate(name: &str) -> bool {
    name == "CX" || StandardGate::from_name(name).is_some() || PARAMETERIZED_BUILTINS.contains(&name)
}

/// Lower an AST Program to a Circuit.
pub(super) fn lower_to_circuit(program: &Program) -> ParseResult<Circuit> {
    let mut lowerer = Lowerer::new();
    for stmt in &program.statements {
        lowerer.lower_statement(stmt)?;
    }
    Ok(lowerer.circuit)
}

/// Binding of formal parameter names to values inside a gate body.
type Bindings<'a> = &'a [(String, ParameterExpression)];

/// Lowers AST to Circuit.
struct Lowerer {
    /// Qubit registers: name -> (start, size).
    qregs: FxHashMap<String, (u32, u32)>,
    /// Classical registers: name -> (start, size).
    cregs: FxHashMap<String, (u32, u32)>,
    /// User gate definitions by name.
    defs: FxHashMap<String, GateDef>,
    /// The program under construction.
    circuit: Circuit,
}

impl Lowerer {
    fn new() -> Self {
        Self {
            qregs: FxHashMap::default(),
            cregs: FxHashMap::default(),
            defs: FxHashMap::default(),
            circuit: Circuit::new("circuit"),
        }
    }

    fn declare(&mut self, name: &str, quantum: bool, size: u32) -> ParseResult<()> {
        if self.qregs.contains_key(name) || self.cregs.contains_key(name) {
            return Err(ParseError::DuplicateDeclaration(name.into()));
        }
        if quantum {
            let start = self.circuit.num_qubits() as u32;
            self.circuit.add_qreg(size);
            self.qregs.insert(name.into(), (start, size));
        } else {
            let start = self.circuit.num_clbits() as u32;
            self.circuit.add_creg(size);
            self.cregs.insert(name.into(), (start, size));
        }
        Ok(())
    }

    fn lower_statement(&mut self, stmt: &Statement) -> ParseResult<()> {
        match stmt {
            Statement::Include(path) => {
                debug!(path, "ignoring include");
                Ok(())
            }

            Statement::QuantumDecl { name, size } => self.declare(name, true, *size),
            Statement::ClassicalDecl { name, size } => self.declare(name, false, *size),

            Statement::Gate(call) => self.lower_gate_call(call),

            Statement::Measure { qubits, bits } => {
                let q_ids = resolve(&self.qregs, qubits)?;
                let c_ids: Vec<ClbitId> = resolve(&self.cregs, bits)?
                    .into_iter()
                    .map(ClbitId)
                    .collect();
                if q_ids.len() != c_ids.len() {
                    return Err(obfusq_ir::IrError::ClbitCountMismatch {
                        qubits: q_ids.len(),
                        clbits: c_ids.len(),
                    }
                    .into());
                }
                for (q, c) in q_ids.into_iter().zip(c_ids) {
                    self.circuit.measure(QubitId(q), c)?;
                }
                Ok(())
            }

            Statement::Reset { qubits } => {
                for q in resolve(&self.qregs, qubits)? {
                    self.circuit.reset(QubitId(q))?;
                }
                Ok(())
            }

            Statement::Barrier { qubits } => {
                let ids: Vec<QubitId> = if qubits.is_empty() {
                    (0..self.circuit.num_qubits() as u32).map(QubitId).collect()
                } else {
                    let mut ids = Vec::new();
                    for op in qubits {
                        ids.extend(resolve(&self.qregs, op)?.into_iter().map(QubitId));
                    }
                    ids
                };
                self.circuit.barrier(ids)?;
                Ok(())
            }

            Statement::GateDef(def) => self.define(def),
        }
    }

    fn define(&mut self, def: &GateDef) -> ParseResult<()> {
        if is_builtin_gate(&def.name) {
            debug!(gate = %def.name, "definition shadows a built-in gate, keeping built-in");
            return Ok(());
        }
        if self.defs.contains_key(&def.name) {
            return Err(ParseError::DuplicateDeclaration(def.name.clone()));
        }
        // Bodies may only call gates known at this point, which rules out recursion.
        for call in &def.body {
            if !is_builtin_gate(&call.name) && !self.defs.contains_key(&call.name) {
                return Err(ParseError::UnknownGate(call.name.clone()));
            }
        }
        self.defs.insert(def.name.clone(), def.clone());
        Ok(())
    }

    fn lower_gate_call(&mut self, call: &GateCall) -> ParseResult<()> {
        let params = call
            .params
            .iter()
            .map(|e| expr_to_param(e, &[]))
            .collect::<ParseResult<Vec<_>>>()?;
        let gate = self.instantiate(&call.name, params)?;
        check_qubit_count(&gate, call.args.len())?;

        let args = call
            .args
            .iter()
            .map(|op| resolve(&self.qregs, op))
            .collect::<ParseResult<Vec<_>>>()?;

        // Whole-register arguments broadcast; single qubits repeat.
        let width = args.iter().map(Vec::len).max().unwrap_or(1);
        if let Some(bad) = args.iter().find(|a| a.len() != 1 && a.len() != width) {
            return Err(ParseError::WrongQubitCount {
                gate: call.name.clone(),
                expected: width,
                got: bad.len(),
            });
        }

        for i in 0..width {
            let qubits = args
                .iter()
                .map(|a| QubitId(if a.len() == 1 { a[0] } else { a[i] }));
            self.circuit.push(Instruction::gate(gate.clone(), qubits))?;
        }
        Ok(())
    }

    /// Resolve a gate name and concrete parameters to a gate.
    fn instantiate(&self, name: &str, params: Vec<ParameterExpression>) -> ParseResult<Gate> {
        if let Some(gate) = builtin_gate(name, params.clone())? {
            return Ok(Gate::standard(gate));
        }
        let def = self
            .defs
            .get(name)
            .ok_or_else(|| ParseError::UnknownGate(name.into()))?;

        if def.params.len() != params.len() {
            return Err(ParseError::WrongParameterCount {
                gate: name.into(),
                expected: def.params.len(),
                got: params.len(),
            });
        }
        let bindings: Vec<(String, ParameterExpression)> =
            def.params.iter().cloned().zip(params).collect();

        let mut body = Vec::with_capacity(def.body.len());
        for call in &def.body {
            let params = call
                .params
                .iter()
                .map(|e| expr_to_param(e, &bindings))
                .collect::<ParseResult<Vec<_>>>()?;
            let gate = self.instantiate(&call.name, params)?;
            check_qubit_count(&gate, call.args.len())?;

            let mut locals = Vec::with_capacity(call.args.len());
            for arg in &call.args {
                if arg.index.is_some() {
                    return Err(ParseError::Generic(format!(
                        "indexed operand '{}' inside gate '{name}'",
                        arg.register
                    )));
                }
                let pos = def
                    .qubits
                    .iter()
                    .position(|q| *q == arg.register)
                    .ok_or_else(|| ParseError::UndefinedIdentifier(arg.register.clone()))?;
                locals.push(QubitId(pos as u32));
            }
            body.push(Instruction::gate(gate, locals));
        }

        let unit = CompositeGate::new(name, def.qubits.len() as u32, body)?;
        Ok(Gate::composite(unit))
    }
}

/// Build a built-in gate, or `None` if the name is not built in.
fn builtin_gate(
    name: &str,
    params: Vec<ParameterExpression>,
) -> ParseResult<Option<StandardGate>> {
    let expected = match name {
        "rx" | "ry" | "rz" | "p" | "phase" | "u1" | "crz" | "cp" | "cu1" | "cphase" => 1,
        "u2" => 2,
        "u3" | "u" | "U" => 3,
        "CX" => 0,
        other => match StandardGate::from_name(other) {
            Some(_) => 0,
            None => return Ok(None),
        },
    };
    if params.len() != expected {
        return Err(ParseError::WrongParameterCount {
            gate: name.into(),
            expected,
            got: params.len(),
        });
    }

    let mut params = params.into_iter();
    let mut next = || params.next().unwrap_or(ParameterExpression::Constant(0.0));
    let gate = match name {
        "rx" => StandardGate::Rx(next()),
        "ry" => StandardGate::Ry(next()),
        "rz" => StandardGate::Rz(next()),
        "p" | "phase" | "u1" => StandardGate::P(next()),
        "u2" => {
            let phi = next();
            let lambda = next();
            StandardGate::U(
                ParameterExpression::Div(
                    Box::new(ParameterExpression::Pi),
                    Box::new(ParameterExpression::Constant(2.0)),
                ),
                phi,
                lambda,
            )
        }
        "u3" | "u" | "U" => {
            let theta = next();
            let phi = next();
            let lambda = next();
            StandardGate::U(theta, phi, lambda)
        }
        "crz" => StandardGate::CRz(next()),
        "cp" | "cu1" | "cphase" => StandardGate::CP(next()),
        "CX" => StandardGate::CX,
        other => match StandardGate::from_name(other) {
            Some(gate) => gate,
            None => return Ok(None),
        },
    };
    Ok(Some(gate))
}

/// Resolve an operand to register-absolute indices.
fn resolve(regs: &FxHashMap<String, (u32, u32)>, op: &Operand) -> ParseResult<Vec<u32>> {
    let (start, size) = *regs
        .get(&op.register)
        .ok_or_else(|| ParseError::UndefinedIdentifier(op.register.clone()))?;

    match op.index {
        Some(idx) if idx >= size => Err(ParseError::IndexOutOfBounds {
            register: op.register.clone(),
            index: idx as usize,
            size: size as usize,
        }),
        Some(idx) => Ok(vec![start + idx]),
        None => Ok((start..start + size).collect()),
    }
}

fn check_qubit_count(gate: &Gate, got: usize) -> ParseResult<()> {
    let expected = gate.num_qubits() as usize;
    if got == expected {
        Ok(())
    } else {
        Err(ParseError::WrongQubitCount {
            gate: gate.name().into(),
            expected,
            got,
        })
    }
}

/// Convert an AST expression to a `ParameterExpression`, substituting bound
/// formal parameters.
#[allow(clippy::cast_precision_loss)]
fn expr_to_param(expr: &Expression, bindings: Bindings<'_>) -> ParseResult<ParameterExpression> {
    Ok(match expr {
        Expression::Int(v) => ParameterExpression::Constant(*v as f64),
        Expression::Float(v) => ParameterExpression::Constant(*v),
        Expression::Pi => ParameterExpression::Pi,
        Expression::Tau => ParameterExpression::Constant(std::f64::consts::TAU),
        Expression::Euler => ParameterExpression::Constant(std::f64::consts::E),
        Expression::Identifier(name) => bindings
            .iter()
            .find(|(formal, _)| formal == name)
            .map_or_else(|| ParameterExpression::Symbol(name.clone()), |(_, v)| v.clone()),
        Expression::Neg(e) => ParameterExpression::Neg(Box::new(expr_to_param(e, bindings)?)),
        Expression::Paren(e) => expr_to_param(e, bindings)?,
        Expression::BinOp { left, op, right } => {
            let l = Box::new(expr_to_param(left, bindings)?);
            let r = Box::new(expr_to_param(right, bindings)?);
            match op {
                BinOp::Add => ParameterExpression::Add(l, r),
                BinOp::Sub => ParameterExpression::Sub(l, r),
                BinOp::Mul => ParameterExpression::Mul(l, r),
                BinOp::Div => ParameterExpression::Div(l, r),
                BinOp::Pow => match (l.as_f64(), r.as_f64()) {
                    (Some(base), Some(exp)) => ParameterExpression::Constant(base.powf(exp)),
                    _ => return Err(ParseError::Generic("symbolic exponent".into())),
                },
            }
        }
        Expression::FnCall { name, args } => {
            let [arg] = args.as_slice() else {
                return Err(ParseError::Generic(format!(
                    "function {name} takes one argument"
                )));
            };
            let value = expr_to_param(arg, bindings)?.as_f64().ok_or_else(|| {
                ParseError::Generic(format!("cannot evaluate {name} of a symbolic argument"))
            })?;
            let call = Expression::FnCall {
                name: name.clone(),
                args: vec![Expression::Float(value)],
            };
            let result = call
                .as_f64()
                .ok_or_else(|| ParseError::Generic(format!("unknown function: {name}")))?;
            ParameterExpression::Constant(result)
        }
    })
}
