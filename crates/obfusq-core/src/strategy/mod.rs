//! Rewrite strategies.
//!
//! Each strategy is a pure function from a program and a random source to a
//! new program with the same measurement statistics. All of them go through
//! [`preserve_boundary`](crate::boundary::preserve_boundary), so only the
//! non-measurement part is ever touched.

mod composite;
mod padding;
mod segmented;
mod substitution;

pub use composite::{AUXILIARY_BLOCK, RESTORE_BLOCK, encapsulate};
pub use padding::pad;
pub use segmented::{inject, injection_passes, segment_length};
pub use substitution::substitute;

use std::fmt;
use std::str::FromStr;

use obfusq_ir::Circuit;
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::error::{ObfResult, ObfuscationError};
use crate::library::EquivalenceLibrary;

/// The available rewrite strategies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum Strategy {
    /// Replace each gate with a randomly chosen equivalent sequence.
    #[default]
    Substitution,
    /// Wrap gates in misleadingly named composite units between a camouflage
    /// block and its inverse.
    Composite,
    /// Surround the program with shuffled identity sequences on every qubit.
    Padding,
    /// Inject gate/inverse pairs at regular intervals through the program.
    Segmented,
}

impl Strategy {
    /// Every strategy, in presentation order.
    pub const ALL: [Strategy; 4] = [
        Strategy::Substitution,
        Strategy::Composite,
        Strategy::Padding,
        Strategy::Segmented,
    ];

    /// The canonical external name.
    pub fn name(self) -> &'static str {
        match self {
            Strategy::Substitution => "substitution",
            Strategy::Composite => "composite",
            Strategy::Padding => "padding",
            Strategy::Segmented => "segmented",
        }
    }

    /// Alternative external name accepted by [`FromStr`].
    pub fn alias(self) -> Option<&'static str> {
        match self {
            Strategy::Substitution => Some("cloaked"),
            Strategy::Composite => None,
            Strategy::Padding => Some("delayed"),
            Strategy::Segmented => Some("inverse"),
        }
    }

    /// One-line description for listings.
    pub fn description(self) -> &'static str {
        match self {
            Strategy::Substitution => "replace gates with equivalent gate sequences",
            Strategy::Composite => "wrap gates in misleadingly labelled composite units",
            Strategy::Padding => "pad every qubit with shuffled identity sequences",
            Strategy::Segmented => "inject gate/inverse pairs between program segments",
        }
    }

    /// Run this strategy on `circuit`.
    pub fn apply<R: Rng + ?Sized>(
        self,
        circuit: &Circuit,
        library: &EquivalenceLibrary,
        options: &StrategyOptions,
        rng: &mut R,
    ) -> ObfResult<Circuit> {
        match self {
            Strategy::Substitution => substitute(circuit, library, options.decoys, rng),
            Strategy::Composite => encapsulate(circuit, library, options, rng),
            Strategy::Padding => pad(circuit, library, rng),
            Strategy::Segmented => inject(circuit, library, rng),
        }
    }
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Strategy {
    type Err = ObfuscationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim();
        Strategy::ALL
            .into_iter()
            .find(|strategy| {
                wanted.eq_ignore_ascii_case(strategy.name())
                    || strategy
                        .alias()
                        .is_some_and(|alias| wanted.eq_ignore_ascii_case(alias))
            })
            .ok_or_else(|| ObfuscationError::UnknownStrategy(s.to_string()))
    }
}

impl TryFrom<String> for Strategy {
    type Error = ObfuscationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Strategy> for String {
    fn from(strategy: Strategy) -> Self {
        strategy.name().to_string()
    }
}

/// How substitution builds its decoy blocks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DecoyMode {
    /// No decoys.
    #[default]
    Empty,
    /// Seed every qubit with `x x` and substitute it, giving identity decoys
    /// that do not look like one.
    SelfInversePairs,
}

/// Knobs shared by the strategies.
#[derive(Debug, Clone, PartialEq)]
pub struct StrategyOptions {
    /// Probability that composite encapsulation wraps a given gate.
    pub probability: f64,
    /// Name given to wrapped gates.
    pub label: String,
    /// Decoy construction for substitution.
    pub decoys: DecoyMode,
}

impl Default for StrategyOptions {
    fn default() -> Self {
        Self {
            probability: 0.5,
            label: "FourierTransform".to_string(),
            decoys: DecoyMode::Empty,
        }
    }
}

impl StrategyOptions {
    /// Reject a probability outside `[0, 1]`.
    pub fn validate(&self) -> ObfResult<()> {
        if !(0.0..=1.0).contains(&self.probability) {
            return Err(ObfuscationError::InvalidProbability(self.probability));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_names_and_aliases() {
        assert_eq!("substitution".parse::<Strategy>().unwrap(), Strategy::Substitution);
        assert_eq!("Cloaked".parse::<Strategy>().unwrap(), Strategy::Substitution);
        assert_eq!("COMPOSITE".parse::<Strategy>().unwrap(), Strategy::Composite);
        assert_eq!("delayed".parse::<Strategy>().unwrap(), Strategy::Padding);
        assert_eq!(" inverse ".parse::<Strategy>().unwrap(), Strategy::Segmented);
        assert!(matches!(
            "scramble".parse::<Strategy>(),
            Err(ObfuscationError::UnknownStrategy(_))
        ));
    }

    #[test]
    fn test_display_round_trips() {
        for strategy in Strategy::ALL {
            assert_eq!(strategy.to_string().parse::<Strategy>().unwrap(), strategy);
        }
    }

    #[test]
    fn test_serde_uses_names() {
        let yaml = serde_yaml_ng::to_string(&Strategy::Padding).unwrap();
        assert_eq!(yaml.trim(), "padding");
        let parsed: Strategy = serde_yaml_ng::from_str("Delayed").unwrap();
        assert_eq!(parsed, Strategy::Padding);
        assert!(serde_yaml_ng::from_str::<Strategy>("nope").is_err());
    }

    #[test]
    fn test_options_validate_probability() {
        let mut options = StrategyOptions::default();
        assert!(options.validate().is_ok());
        options.probability = 1.5;
        assert!(matches!(
            options.validate(),
            Err(ObfuscationError::InvalidProbability(p)) if p == 1.5
        ));
        options.probability = f64::NAN;
        assert!(options.validate().is_err());
    }
}
