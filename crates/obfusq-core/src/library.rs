//! The equivalence library.
//!
//! Four static tables drive every rewrite:
//!
//! - [`EquivalenceRule`]s: alternative gate sequences that realize a gate
//!   kind, used by substitution
//! - [`IdentitySequence`]s: sequences that compose to the identity, used by
//!   padding
//! - [`InjectionPair`]s: a gate followed by its inverse, used by segmented
//!   injection
//! - the camouflage block wrapped by composite encapsulation
//!
//! Every built-in entry holds up to global phase. The tests in
//! `tests/library_correctness.rs` check each one on the statevector
//! simulator.
//!
//! # YAML format
//!
//! A custom library replaces any subset of the built-in tables. Gates are
//! named by their QASM names; a bare name applies the gate to the target's
//! leading qubits, a `{ gate, on }` map places it explicitly.
//!
//! ```yaml
//! rules:
//!   - target: x
//!     alternatives:
//!       - [h, z, h]
//!   - target: cx
//!     alternatives:
//!       - [{ gate: h, on: [1] }, cz, { gate: h, on: [1] }]
//! identities:
//!   - name: hh
//!     steps: [h, h]
//!   - name: cx-ladder
//!     steps: [{ across_pairs: cx }, { across_pairs: cx }]
//! injections: [h, s, cx]
//! camouflage: [h, h, z, x, z, x]
//! ```

use std::mem::{Discriminant, discriminant};
use std::path::Path;
use std::sync::{Arc, LazyLock};

use rustc_hash::FxHashMap;
use serde::Deserialize;
use tracing::debug;

use obfusq_ir::StandardGate;

use crate::error::{ObfResult, ObfuscationError};

/// One gate of an alternative, placed on indices into the target's
/// qubit arguments.
#[derive(Debug, Clone, PartialEq)]
pub struct GateStep {
    /// The gate to apply.
    pub gate: StandardGate,
    /// Indices into the rewritten instruction's qubit list.
    pub operands: Vec<usize>,
}

impl GateStep {
    /// Create a step.
    pub fn new(gate: StandardGate, operands: impl Into<Vec<usize>>) -> Self {
        Self {
            gate,
            operands: operands.into(),
        }
    }
}

/// Interchangeable realizations of one gate kind.
#[derive(Debug, Clone, PartialEq)]
pub struct EquivalenceRule {
    /// The gate kind being replaced.
    pub target: StandardGate,
    /// Sequences realizing the same unitary up to global phase.
    pub alternatives: Vec<Vec<GateStep>>,
}

/// One step of an identity sequence.
#[derive(Debug, Clone, PartialEq)]
pub enum IdentityStep {
    /// A one-qubit gate on the qubit being padded.
    OnQubit(StandardGate),
    /// A self-inverse two-qubit gate on every pair `(0,1), (2,3), …`.
    AcrossPairs(StandardGate),
}

/// A named gate sequence that composes to the identity.
#[derive(Debug, Clone, PartialEq)]
pub struct IdentitySequence {
    /// Name of the sequence.
    pub name: String,
    /// Steps in application order.
    pub steps: Vec<IdentityStep>,
}

/// A gate that is injected together with its inverse.
#[derive(Debug, Clone, PartialEq)]
pub struct InjectionPair {
    /// The gate applied first.
    pub gate: StandardGate,
}

impl InjectionPair {
    /// The gate applied second.
    pub fn inverse(&self) -> Option<StandardGate> {
        self.gate.inverse()
    }

    /// Number of qubits the pair acts on.
    pub fn arity(&self) -> u32 {
        self.gate.num_qubits()
    }
}

/// The rewrite tables.
#[derive(Debug, Clone)]
pub struct EquivalenceLibrary {
    rules: Vec<EquivalenceRule>,
    index: FxHashMap<Discriminant<StandardGate>, usize>,
    identities: Vec<IdentitySequence>,
    injections: Vec<InjectionPair>,
    camouflage: Vec<StandardGate>,
}

static BUILTIN: LazyLock<Arc<EquivalenceLibrary>> = LazyLock::new(|| {
    Arc::new(EquivalenceLibrary::from_parts(
        builtin_rules(),
        builtin_identities(),
        builtin_injections(),
        builtin_camouflage(),
    ))
});

impl EquivalenceLibrary {
    /// The built-in tables, shared process-wide.
    pub fn builtin() -> Arc<Self> {
        Arc::clone(&BUILTIN)
    }

    /// Build and validate a library from explicit tables.
    pub fn new(
        rules: Vec<EquivalenceRule>,
        identities: Vec<IdentitySequence>,
        injections: Vec<InjectionPair>,
        camouflage: Vec<StandardGate>,
    ) -> ObfResult<Self> {
        let library = Self::from_parts(rules, identities, injections, camouflage);
        library.validate()?;
        Ok(library)
    }

    fn from_parts(
        rules: Vec<EquivalenceRule>,
        identities: Vec<IdentitySequence>,
        injections: Vec<InjectionPair>,
        camouflage: Vec<StandardGate>,
    ) -> Self {
        let mut index = FxHashMap::default();
        for (i, rule) in rules.iter().enumerate() {
            index.entry(discriminant(&rule.target)).or_insert(i);
        }
        Self {
            rules,
            index,
            identities,
            injections,
            camouflage,
        }
    }

    /// Parse a YAML library. Omitted tables keep their built-in contents.
    pub fn from_yaml(text: &str) -> ObfResult<Self> {
        let doc: LibraryDocument = serde_yaml_ng::from_str(text)?;
        let builtin = Self::builtin();

        let rules = match doc.rules {
            Some(rules) => rules
                .into_iter()
                .map(RuleDocument::resolve)
                .collect::<ObfResult<_>>()?,
            None => builtin.rules.clone(),
        };
        let identities = match doc.identities {
            Some(seqs) => seqs
                .into_iter()
                .map(IdentityDocument::resolve)
                .collect::<ObfResult<_>>()?,
            None => builtin.identities.clone(),
        };
        let injections = match doc.injections {
            Some(names) => names
                .iter()
                .map(|name| Ok(InjectionPair { gate: gate(name)? }))
                .collect::<ObfResult<_>>()?,
            None => builtin.injections.clone(),
        };
        let camouflage = match doc.camouflage {
            Some(names) => names.iter().map(|n| gate(n)).collect::<ObfResult<_>>()?,
            None => builtin.camouflage.clone(),
        };

        let library = Self::new(rules, identities, injections, camouflage)?;
        debug!(
            rules = library.rules.len(),
            identities = library.identities.len(),
            injections = library.injections.len(),
            "loaded custom library"
        );
        Ok(library)
    }

    /// Read and parse a YAML library file.
    pub fn from_file(path: impl AsRef<Path>) -> ObfResult<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| ObfuscationError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_yaml(&text)
    }

    /// The rule for a gate kind, if any.
    pub fn rule(&self, gate: &StandardGate) -> Option<&EquivalenceRule> {
        self.index
            .get(&discriminant(gate))
            .map(|&i| &self.rules[i])
    }

    /// All equivalence rules.
    pub fn rules(&self) -> &[EquivalenceRule] {
        &self.rules
    }

    /// The identity catalog.
    pub fn identities(&self) -> &[IdentitySequence] {
        &self.identities
    }

    /// The injection catalog.
    pub fn injections(&self) -> &[InjectionPair] {
        &self.injections
    }

    /// The camouflage block.
    pub fn camouflage(&self) -> &[StandardGate] {
        &self.camouflage
    }

    /// The exact inverse of the camouflage block: reversed, each step
    /// inverted.
    pub fn restore(&self) -> Vec<StandardGate> {
        self.camouflage
            .iter()
            .rev()
            .filter_map(StandardGate::inverse)
            .collect()
    }

    /// Check every table entry.
    ///
    /// Fails with [`ObfuscationError::ArityMismatch`] when a step needs more
    /// qubits than its argument register provides, and with
    /// [`ObfuscationError::InvalidRule`] for parameterized kinds, duplicate
    /// operands, duplicate targets, empty entries or pair kinds that are not
    /// self-inverse.
    pub fn validate(&self) -> ObfResult<()> {
        for (i, rule) in self.rules.iter().enumerate() {
            let name = rule.target.name();
            discrete(&rule.target, &format!("rule target '{name}'"))?;
            if self.index.get(&discriminant(&rule.target)) != Some(&i) {
                return Err(invalid(format!("duplicate rule for '{name}'")));
            }
            if rule.alternatives.is_empty() {
                return Err(invalid(format!("rule for '{name}' has no alternatives")));
            }

            let arity = rule.target.num_qubits();
            for (k, alternative) in rule.alternatives.iter().enumerate() {
                let context = format!("rule '{name}' alternative {k}");
                if alternative.is_empty() {
                    return Err(invalid(format!("{context} is empty")));
                }
                for step in alternative {
                    check_step(step, arity, &context)?;
                }
            }
        }

        for seq in &self.identities {
            let context = format!("identity '{}'", seq.name);
            if seq.steps.is_empty() {
                return Err(invalid(format!("{context} is empty")));
            }
            for step in &seq.steps {
                match step {
                    IdentityStep::OnQubit(g) => {
                        discrete(g, &context)?;
                        require_arity(g, 1, &context)?;
                    }
                    IdentityStep::AcrossPairs(g) => {
                        discrete(g, &context)?;
                        require_arity(g, 2, &context)?;
                        if !g.is_self_inverse() {
                            return Err(invalid(format!(
                                "{context}: '{}' is not self-inverse",
                                g.name()
                            )));
                        }
                    }
                }
            }
        }

        for pair in &self.injections {
            discrete(&pair.gate, "injection pair")?;
        }

        if self.camouflage.is_empty() {
            return Err(invalid("camouflage block is empty".into()));
        }
        for g in &self.camouflage {
            discrete(g, "camouflage block")?;
            require_arity(g, 1, "camouflage block")?;
        }

        Ok(())
    }
}

fn invalid(msg: String) -> ObfuscationError {
    ObfuscationError::InvalidRule(msg)
}

fn discrete(gate: &StandardGate, context: &str) -> ObfResult<()> {
    if gate.has_parameters() || gate.inverse().is_none() {
        return Err(invalid(format!(
            "{context}: '{}' is parameterized",
            gate.name()
        )));
    }
    Ok(())
}

fn require_arity(gate: &StandardGate, available: u32, context: &str) -> ObfResult<()> {
    if gate.num_qubits() != available {
        return Err(ObfuscationError::ArityMismatch {
            context: format!("{context} step '{}'", gate.name()),
            required: gate.num_qubits(),
            available,
        });
    }
    Ok(())
}

fn check_step(step: &GateStep, arity: u32, context: &str) -> ObfResult<()> {
    discrete(&step.gate, context)?;

    let needed = step.gate.num_qubits();
    if step.operands.len() as u32 != needed {
        return Err(ObfuscationError::ArityMismatch {
            context: format!("{context} step '{}'", step.gate.name()),
            required: needed,
            available: step.operands.len() as u32,
        });
    }
    if let Some(&op) = step.operands.iter().find(|&&op| op as u32 >= arity) {
        return Err(ObfuscationError::ArityMismatch {
            context: format!("{context} step '{}'", step.gate.name()),
            required: op as u32 + 1,
            available: arity,
        });
    }
    for (i, op) in step.operands.iter().enumerate() {
        if step.operands[..i].contains(op) {
            return Err(invalid(format!(
                "{context}: step '{}' repeats operand {op}",
                step.gate.name()
            )));
        }
    }
    Ok(())
}

fn gate(name: &str) -> ObfResult<StandardGate> {
    StandardGate::from_name(name).ok_or_else(|| invalid(format!("unknown gate '{name}'")))
}

// =============================================================================
// YAML documents
// =============================================================================

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct LibraryDocument {
    rules: Option<Vec<RuleDocument>>,
    identities: Option<Vec<IdentityDocument>>,
    injections: Option<Vec<String>>,
    camouflage: Option<Vec<String>>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RuleDocument {
    target: String,
    alternatives: Vec<Vec<StepDocument>>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum StepDocument {
    Bare(String),
    Placed { gate: String, on: Vec<usize> },
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct IdentityDocument {
    name: String,
    steps: Vec<IdentityStepDocument>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum IdentityStepDocument {
    OnQubit(String),
    AcrossPairs { across_pairs: String },
}

impl RuleDocument {
    fn resolve(self) -> ObfResult<EquivalenceRule> {
        let target = gate(&self.target)?;
        let alternatives = self
            .alternatives
            .into_iter()
            .map(|alt| alt.into_iter().map(StepDocument::resolve).collect())
            .collect::<ObfResult<_>>()?;
        Ok(EquivalenceRule {
            target,
            alternatives,
        })
    }
}

impl StepDocument {
    fn resolve(self) -> ObfResult<GateStep> {
        match self {
            StepDocument::Bare(name) => {
                let g = gate(&name)?;
                let operands: Vec<usize> = (0..g.num_qubits() as usize).collect();
                Ok(GateStep::new(g, operands))
            }
            StepDocument::Placed { gate: name, on } => Ok(GateStep::new(gate(&name)?, on)),
        }
    }
}

impl IdentityDocument {
    fn resolve(self) -> ObfResult<IdentitySequence> {
        let steps = self
            .steps
            .into_iter()
            .map(|step| match step {
                IdentityStepDocument::OnQubit(name) => Ok(IdentityStep::OnQubit(gate(&name)?)),
                IdentityStepDocument::AcrossPairs { across_pairs } => {
                    Ok(IdentityStep::AcrossPairs(gate(&across_pairs)?))
                }
            })
            .collect::<ObfResult<_>>()?;
        Ok(IdentitySequence {
            name: self.name,
            steps,
        })
    }
}

// =============================================================================
// Built-in tables
// =============================================================================

/// A one-qubit alternative.
fn local(gates: &[StandardGate]) -> Vec<GateStep> {
    gates.iter().map(|g| GateStep::new(g.clone(), [0])).collect()
}

fn rule(target: StandardGate, alternatives: Vec<Vec<GateStep>>) -> EquivalenceRule {
    EquivalenceRule {
        target,
        alternatives,
    }
}

fn builtin_rules() -> Vec<EquivalenceRule> {
    use StandardGate::{CX, CY, CZ, H, S, SX, SXdg, Sdg, Swap, T, Tdg, X, Y, Z};

    let on = |gate: StandardGate, ops: &[usize]| GateStep::new(gate, ops);

    vec![
        rule(
            X,
            vec![
                local(&[H, Z, H]),
                local(&[Sdg, Y, S]),
                local(&[Y, Z]),
                local(&[Z, Y]),
                local(&[SX, SX]),
                local(&[H, S, S, H]),
                local(&[Z, H, Z, H, Z]),
            ],
        ),
        rule(
            Z,
            vec![
                local(&[H, X, H]),
                local(&[S, S]),
                local(&[T, T, T, T]),
                local(&[X, H, X, H, X]),
                local(&[Sdg, Sdg]),
                local(&[X, Y]),
            ],
        ),
        rule(
            Y,
            vec![
                local(&[X, Z]),
                local(&[Z, X]),
                local(&[S, X, Sdg]),
                local(&[Sdg, X, S]),
            ],
        ),
        rule(
            S,
            vec![
                local(&[T, T]),
                local(&[Z, T, Z, T]),
                local(&[Z, Sdg]),
                local(&[Sdg, Z]),
            ],
        ),
        rule(
            Sdg,
            vec![local(&[Tdg, Tdg]), local(&[Z, S]), local(&[S, Z])],
        ),
        rule(T, vec![local(&[S, Tdg]), local(&[Tdg, S])]),
        rule(Tdg, vec![local(&[Sdg, T]), local(&[T, Sdg])]),
        rule(H, vec![local(&[S, SX, S]), local(&[Sdg, SXdg, Sdg])]),
        rule(SX, vec![local(&[H, S, H]), local(&[Sdg, H, Sdg])]),
        rule(SXdg, vec![local(&[H, Sdg, H]), local(&[S, H, S])]),
        rule(
            CX,
            vec![
                vec![on(H, &[1]), on(CZ, &[0, 1]), on(H, &[1])],
                vec![
                    on(H, &[0]),
                    on(H, &[1]),
                    on(CX, &[1, 0]),
                    on(H, &[0]),
                    on(H, &[1]),
                ],
            ],
        ),
        rule(
            CZ,
            vec![
                vec![on(H, &[1]), on(CX, &[0, 1]), on(H, &[1])],
                vec![on(H, &[0]), on(CX, &[1, 0]), on(H, &[0])],
                vec![on(CZ, &[1, 0])],
            ],
        ),
        rule(CY, vec![vec![on(Sdg, &[1]), on(CX, &[0, 1]), on(S, &[1])]]),
        rule(
            Swap,
            vec![
                vec![on(CX, &[0, 1]), on(CX, &[1, 0]), on(CX, &[0, 1])],
                vec![on(CX, &[1, 0]), on(CX, &[0, 1]), on(CX, &[1, 0])],
                vec![on(Swap, &[1, 0])],
            ],
        ),
    ]
}

fn builtin_identities() -> Vec<IdentitySequence> {
    use IdentityStep::{AcrossPairs, OnQubit};
    use StandardGate::{CX, CZ, H, S, SX, Sdg, Swap, T, Tdg, X, Y, Z};

    let seq = |name: &str, steps: Vec<IdentityStep>| IdentitySequence {
        name: name.into(),
        steps,
    };
    let local = |gates: &[StandardGate]| -> Vec<IdentityStep> {
        gates.iter().cloned().map(OnQubit).collect()
    };

    vec![
        seq("hh", local(&[H, H])),
        seq("xyz", local(&[X, Y, Z])),
        seq("ssz", local(&[S, S, Z])),
        seq("ttsdg", local(&[T, T, Sdg])),
        seq("hzhx", local(&[H, Z, H, X])),
        seq("shshsh", local(&[S, H, S, H, S, H])),
        seq("yxyx", local(&[Y, X, Y, X])),
        seq("tztdgz", local(&[T, Z, Tdg, Z])),
        seq("sxsxx", local(&[SX, SX, X])),
        seq("hsshx", local(&[H, S, S, H, X])),
        seq("sdgysx", local(&[Sdg, Y, S, X])),
        seq("hxhz", local(&[H, X, H, Z])),
        seq("ttttz", local(&[T, T, T, T, Z])),
        seq("cx-ladder", vec![AcrossPairs(CX), AcrossPairs(CX)]),
        seq("swap-ladder", vec![AcrossPairs(Swap), AcrossPairs(Swap)]),
        seq(
            "cz-sandwich",
            vec![AcrossPairs(CZ), OnQubit(H), OnQubit(H), AcrossPairs(CZ)],
        ),
    ]
}

fn builtin_injections() -> Vec<InjectionPair> {
    use StandardGate::{CCX, CX, CY, CZ, H, S, T, X, Z};

    [H, X, Z, S, T, CX, CZ, CY, CCX]
        .into_iter()
        .map(|gate| InjectionPair { gate })
        .collect()
}

fn builtin_camouflage() -> Vec<StandardGate> {
    use StandardGate::{H, X, Z};
    vec![H, H, Z, X, Z, X]
}
