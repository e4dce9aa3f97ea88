//! `OpenQASM` emitter for serializing circuits in either dialect.

use std::fmt::Write as _;

use obfusq_ir::{
    Circuit, CompositeGate, GateKind, Instruction, InstructionKind, ParameterExpression,
    QubitId, StandardGate,
};

use crate::parser::{Dialect, is_builtin_gate};

/// Emit a circuit as `OpenQASM` 3.0 source code.
pub fn emit_qasm3(circuit: &Circuit) -> String {
    emit(circuit, Dialect::Qasm3)
}

/// Emit a circuit as `OpenQASM` 2.0 source code.
///
/// Register declarations use `qreg q[n];` / `creg c[n];` and measurements
/// use `measure q[i] -> c[i];`.
pub fn emit_qasm2(circuit: &Circuit) -> String {
    emit(circuit, Dialect::Qasm2)
}

/// Emit a circuit in the given dialect.
///
/// The output always declares a single `q` and a single `c` register.
/// Composite units become `gate` definitions placed ahead of their first
/// use, nested units first.
pub fn emit(circuit: &Circuit, dialect: Dialect) -> String {
    let mut emitter = Emitter::new(dialect);
    emitter.emit_circuit(circuit)
}

struct Emitter {
    dialect: Dialect,
    /// Gate definitions, in dependency order.
    definitions: String,
    /// Units already defined, with their emitted names.
    defined: Vec<(CompositeGate, String)>,
    needs_sxdg: bool,
    body: String,
}

impl Emitter {
    fn new(dialect: Dialect) -> Self {
        Self {
            dialect,
            definitions: String::new(),
            defined: Vec::new(),
            needs_sxdg: false,
            body: String::new(),
        }
    }

    fn emit_circuit(&mut self, circuit: &Circuit) -> String {
        for inst in circuit.instructions() {
            let line = self.instruction_line(inst);
            self.body.push_str(&line);
        }

        let mut out = String::new();
        match self.dialect {
            Dialect::Qasm2 => {
                out.push_str("OPENQASM 2.0;\ninclude \"qelib1.inc\";\n");
            }
            Dialect::Qasm3 => {
                out.push_str("OPENQASM 3.0;\ninclude \"stdgates.inc\";\n");
            }
        }
        out.push('\n');

        if self.needs_sxdg {
            // stdgates.inc has no sxdg.
            out.push_str("gate sxdg a { h a; sdg a; h a; }\n");
        }
        out.push_str(&self.definitions);
        if self.needs_sxdg || !self.definitions.is_empty() {
            out.push('\n');
        }

        let num_qubits = circuit.num_qubits();
        let num_clbits = circuit.num_clbits();
        match self.dialect {
            Dialect::Qasm2 => {
                if num_qubits > 0 {
                    let _ = writeln!(out, "qreg q[{num_qubits}];");
                }
                if num_clbits > 0 {
                    let _ = writeln!(out, "creg c[{num_clbits}];");
                }
            }
            Dialect::Qasm3 => {
                if num_qubits > 0 {
                    let _ = writeln!(out, "qubit[{num_qubits}] q;");
                }
                if num_clbits > 0 {
                    let _ = writeln!(out, "bit[{num_clbits}] c;");
                }
            }
        }
        if num_qubits > 0 || num_clbits > 0 {
            out.push('\n');
        }

        out.push_str(&self.body);
        out
    }

    fn instruction_line(&mut self, inst: &Instruction) -> String {
        match &inst.kind {
            InstructionKind::Gate(gate) => {
                let call = self.gate_call(&gate.kind);
                let qubits = join(inst.qubits.iter().map(|q| format!("q[{}]", q.0)));
                format!("{call} {qubits};\n")
            }
            InstructionKind::Measure => {
                let mut lines = String::new();
                for (q, c) in inst.qubits.iter().zip(&inst.clbits) {
                    let _ = match self.dialect {
                        Dialect::Qasm2 => writeln!(lines, "measure q[{}] -> c[{}];", q.0, c.0),
                        Dialect::Qasm3 => writeln!(lines, "c[{}] = measure q[{}];", c.0, q.0),
                    };
                }
                lines
            }
            InstructionKind::Reset => {
                let mut lines = String::new();
                for q in &inst.qubits {
                    let _ = writeln!(lines, "reset q[{}];", q.0);
                }
                lines
            }
            InstructionKind::Barrier => {
                let qubits = join(inst.qubits.iter().map(|q| format!("q[{}]", q.0)));
                if qubits.is_empty() {
                    "barrier;\n".into()
                } else {
                    format!("barrier {qubits};\n")
                }
            }
        }
    }

    /// Gate name with its parameter list, defining composites on first use.
    fn gate_call(&mut self, kind: &GateKind) -> String {
        match kind {
            GateKind::Standard(gate) => {
                if matches!(gate, StandardGate::SXdg) && self.dialect == Dialect::Qasm3 {
                    self.needs_sxdg = true;
                }
                let name = self.standard_name(gate);
                let params = gate.parameters();
                if params.is_empty() {
                    name.into()
                } else {
                    let params = join(params.into_iter().map(format_param));
                    format!("{name}({params})")
                }
            }
            GateKind::Composite(unit) => self.define(unit),
        }
    }

    fn standard_name(&self, gate: &StandardGate) -> &'static str {
        match (gate, self.dialect) {
            (StandardGate::U(..), _) => "u3",
            (StandardGate::P(_), Dialect::Qasm2) => "u1",
            (StandardGate::CP(_), Dialect::Qasm2) => "cu1",
            _ => gate.name(),
        }
    }

    /// Emit a definition for `unit` unless an identical one exists, and
    /// return the name to call it by.
    fn define(&mut self, unit: &CompositeGate) -> String {
        if let Some((_, name)) = self.defined.iter().find(|(u, _)| u == unit) {
            return name.clone();
        }

        // Nested units must be defined first.
        let mut lines = Vec::with_capacity(unit.body.len());
        for inst in &unit.body {
            let Some(gate) = inst.as_gate() else { continue };
            let call = self.gate_call(&gate.kind);
            let args = join(inst.qubits.iter().map(|q| formal(*q)));
            lines.push(format!("  {call} {args};"));
        }

        let name = self.unique_name(&unit.name);
        let formals = join((0..unit.num_qubits).map(|i| formal(QubitId(i))));
        let _ = writeln!(self.definitions, "gate {name} {formals} {{");
        for line in lines {
            let _ = writeln!(self.definitions, "{line}");
        }
        let _ = writeln!(self.definitions, "}}");

        self.defined.push((unit.clone(), name.clone()));
        name
    }

    fn unique_name(&self, base: &str) -> String {
        let taken = |name: &str| {
            is_builtin_gate(name) || name == "sxdg" || self.defined.iter().any(|(_, n)| n == name)
        };
        if !taken(base) {
            return base.to_string();
        }
        (1..)
            .map(|i| format!("{base}_{i}"))
            .find(|name| !taken(name))
            .unwrap_or_else(|| base.to_string())
    }
}

fn formal(q: QubitId) -> String {
    format!("a{}", q.0)
}

fn join(items: impl Iterator<Item = String>) -> String {
    items.collect::<Vec<_>>().join(", ")
}

/// Format a parameter, recognizing small rational multiples of pi.
fn format_param(param: &ParameterExpression) -> String {
    match param {
        ParameterExpression::Constant(v) => format_constant(*v),
        ParameterExpression::Symbol(name) => name.clone(),
        ParameterExpression::Pi => "pi".into(),
        ParameterExpression::Neg(e) => format!("-({})", format_param(e)),
        ParameterExpression::Add(a, b) => format!("({} + {})", format_param(a), format_param(b)),
        ParameterExpression::Sub(a, b) => format!("({} - {})", format_param(a), format_param(b)),
        ParameterExpression::Mul(a, b) => format!("({} * {})", format_param(a), format_param(b)),
        ParameterExpression::Div(a, b) => format!("({} / {})", format_param(a), format_param(b)),
    }
}

#[allow(clippy::cast_precision_loss)]
fn format_constant(v: f64) -> String {
    use std::f64::consts::PI;

    if v == 0.0 {
        return "0".into();
    }
    for den in [1_i64, 2, 3, 4, 6, 8] {
        for num in 1_i64..=16 {
            for num in [num, -num] {
                if (v - num as f64 * PI / den as f64).abs() < 1e-12 {
                    let sign = if num < 0 { "-" } else { "" };
                    let scaled = match num.abs() {
                        1 => "pi".to_string(),
                        n => format!("{n}*pi"),
                    };
                    return if den == 1 {
                        format!("{sign}{scaled}")
                    } else {
                        format!("{sign}{scaled}/{den}")
                    };
                }
            }
        }
    }
    format!("{v}")
}

#[cfg(test)]
mod tests {
    use super::*;
    use obfusq_ir::ClbitId;
    use std::f64::consts::PI;

    #[test]
    fn test_emit_bell_qasm3() {
        let circuit = Circuit::bell().unwrap();
        let qasm = emit_qasm3(&circuit);

        assert!(qasm.starts_with("OPENQASM 3.0;"));
        assert!(qasm.contains("qubit[2] q;"));
        assert!(qasm.contains("bit[2] c;"));
        assert!(qasm.contains("h q[0];"));
        assert!(qasm.contains("cx q[0], q[1];"));
        assert!(qasm.contains("c[1] = measure q[1];"));
    }

    #[test]
    fn test_emit_bell_qasm2() {
        let circuit = Circuit::bell().unwrap();
        let qasm = emit_qasm2(&circuit);

        assert!(qasm.starts_with("OPENQASM 2.0;"));
        assert!(qasm.contains("include \"qelib1.inc\";"));
        assert!(qasm.contains("qreg q[2];"));
        assert!(qasm.contains("creg c[2];"));
        assert!(qasm.contains("measure q[0] -> c[0];"));
    }

    #[test]
    fn test_emit_parameters() {
        let mut circuit = Circuit::with_size("test", 2, 0);
        circuit
            .rx(PI / 2.0, QubitId(0))
            .unwrap()
            .rz(-3.0 * PI / 4.0, QubitId(0))
            .unwrap()
            .ry(0.123, QubitId(1))
            .unwrap()
            .p(PI, QubitId(1))
            .unwrap()
            .cp(PI / 8.0, QubitId(0), QubitId(1))
            .unwrap();

        let qasm = emit_qasm2(&circuit);
        assert!(qasm.contains("rx(pi/2) q[0];"));
        assert!(qasm.contains("rz(-3*pi/4) q[0];"));
        assert!(qasm.contains("ry(0.123) q[1];"));
        assert!(qasm.contains("u1(pi) q[1];"));
        assert!(qasm.contains("cu1(pi/8) q[0], q[1];"));

        let qasm = emit_qasm3(&circuit);
        assert!(qasm.contains("p(pi) q[1];"));
        assert!(qasm.contains("cp(pi/8) q[0], q[1];"));
    }

    #[test]
    fn test_emit_sxdg_definition_in_qasm3() {
        let mut circuit = Circuit::with_size("test", 1, 0);
        circuit.sxdg(QubitId(0)).unwrap();

        assert!(emit_qasm3(&circuit).contains("gate sxdg a { h a; sdg a; h a; }"));
        assert!(!emit_qasm2(&circuit).contains("gate sxdg"));
    }

    #[test]
    fn test_emit_composites_with_clashing_names() {
        let (first, ops_a) = CompositeGate::wrap(
            "FourierTransform",
            &[Instruction::single_qubit_gate(StandardGate::H, QubitId(0))],
        )
        .unwrap();
        let (second, ops_b) = CompositeGate::wrap(
            "FourierTransform",
            &[Instruction::two_qubit_gate(StandardGate::CX, QubitId(0), QubitId(1))],
        )
        .unwrap();

        let mut circuit = Circuit::with_size("test", 2, 0);
        circuit
            .gate(first.clone(), ops_a.clone())
            .unwrap()
            .gate(second, ops_b)
            .unwrap()
            .gate(first, ops_a)
            .unwrap();

        let qasm = emit_qasm2(&circuit);
        assert_eq!(qasm.matches("gate FourierTransform a0 {").count(), 1);
        assert_eq!(qasm.matches("gate FourierTransform_1 a0, a1 {").count(), 1);
        assert_eq!(qasm.matches("FourierTransform q[0];").count(), 2);
        assert!(qasm.contains("FourierTransform_1 q[0], q[1];"));
    }

    #[test]
    fn test_emit_nested_composite_defined_first() {
        let (inner, inner_ops) = CompositeGate::wrap(
            "inner",
            &[Instruction::single_qubit_gate(StandardGate::X, QubitId(0))],
        )
        .unwrap();
        let (outer, outer_ops) = CompositeGate::wrap(
            "outer",
            &[
                Instruction::gate(inner, inner_ops),
                Instruction::single_qubit_gate(StandardGate::Z, QubitId(0)),
            ],
        )
        .unwrap();

        let mut circuit = Circuit::with_size("test", 1, 1);
        circuit
            .gate(outer, outer_ops)
            .unwrap()
            .measure(QubitId(0), ClbitId(0))
            .unwrap();

        let qasm = emit_qasm3(&circuit);
        let inner_at = qasm.find("gate inner").unwrap();
        let outer_at = qasm.find("gate outer").unwrap();
        assert!(inner_at < outer_at);
        assert!(qasm.contains("  inner a0;"));
    }

    #[test]
    fn test_emit_label_colliding_with_builtin() {
        let (unit, ops) = CompositeGate::wrap(
            "h",
            &[Instruction::single_qubit_gate(StandardGate::X, QubitId(0))],
        )
        .unwrap();
        let mut circuit = Circuit::with_size("test", 1, 0);
        circuit.gate(unit, ops).unwrap();

        let qasm = emit_qasm2(&circuit);
        assert!(qasm.contains("gate h_1 a0 {"));
        assert!(qasm.contains("h_1 q[0];"));
    }

    #[test]
    fn test_format_constant() {
        assert_eq!(format_constant(0.0), "0");
        assert_eq!(format_constant(PI), "pi");
        assert_eq!(format_constant(-PI / 2.0), "-pi/2");
        assert_eq!(format_constant(2.0 * PI / 3.0), "2*pi/3");
        assert_eq!(format_constant(0.5), "0.5");
    }
}
