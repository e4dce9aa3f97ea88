//! CLI command implementations.

pub mod common;
pub mod generate;
pub mod obfuscate;
pub mod strategies;
pub mod validate;
pub mod version;
