//! Obfuscator configuration.
//!
//! Settings are read from a YAML file. Every field is optional and falls back
//! to its default; command-line flags are applied on top by the caller.
//!
//! ```yaml
//! strategy: composite
//! seed: 42
//! probability: 0.75
//! label: QuantumPhaseEstimation
//! decoys: self_inverse_pairs
//! library: ./my-library.yaml
//! ```

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{ObfResult, ObfuscationError};
use crate::strategy::{DecoyMode, Strategy, StrategyOptions};

/// Settings for building an [`Obfuscator`](crate::Obfuscator).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ObfuscatorConfig {
    /// Strategy to run.
    #[serde(default)]
    pub strategy: Strategy,

    /// Seed for reproducible output. Entropy-seeded when absent.
    #[serde(default)]
    pub seed: Option<u64>,

    /// Wrap probability for composite encapsulation.
    #[serde(default = "default_probability")]
    pub probability: f64,

    /// Label given to encapsulated gates.
    #[serde(default = "default_label")]
    pub label: String,

    /// Decoy construction for substitution.
    #[serde(default)]
    pub decoys: DecoyMode,

    /// Custom equivalence library. Relative paths resolve against the
    /// directory of the config file.
    #[serde(default)]
    pub library: Option<PathBuf>,
}

fn default_probability() -> f64 {
    0.5
}

fn default_label() -> String {
    "FourierTransform".to_string()
}

impl Default for ObfuscatorConfig {
    fn default() -> Self {
        Self {
            strategy: Strategy::default(),
            seed: None,
            probability: default_probability(),
            label: default_label(),
            decoys: DecoyMode::default(),
            library: None,
        }
    }
}

impl ObfuscatorConfig {
    /// Parse a YAML document.
    pub fn from_yaml(text: &str) -> ObfResult<Self> {
        let config: Self = serde_yaml_ng::from_str(text)?;
        config.options().validate()?;
        Ok(config)
    }

    /// Load configuration from a YAML file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> ObfResult<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| ObfuscationError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let mut config = Self::from_yaml(&text)?;

        if let (Some(library), Some(dir)) = (&config.library, path.parent()) {
            if library.is_relative() {
                config.library = Some(dir.join(library));
            }
        }
        debug!(path = %path.display(), strategy = %config.strategy, "loaded config");
        Ok(config)
    }

    /// Load `path` if it exists, otherwise use the defaults.
    pub fn load_or_default<P: AsRef<Path>>(path: P) -> ObfResult<Self> {
        let path = path.as_ref();
        if path.exists() {
            Self::from_file(path)
        } else {
            Ok(Self::default())
        }
    }

    /// The strategy knobs carried by this config.
    pub fn options(&self) -> StrategyOptions {
        StrategyOptions {
            probability: self.probability,
            label: self.label.clone(),
            decoys: self.decoys,
        }
    }
}
